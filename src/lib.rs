//! # Block-Merge Solver Library
//!
//! This library models a block-merging puzzle and searches its state space.
//! A rectangular grid holds obstacles and movable parts; a part slides until
//! something stops it, and a part that runs into another part fuses with it.
//! The puzzle is solved once a single part remains.
//!
//! It is used by two binaries:
//! - `ai_solver`: Loads a layout file (or generates a seeded random board),
//!   runs one search strategy and prints the solution path.
//! - `strategy_evaluator`: Runs every strategy over a batch of random boards
//!   and compares how much work each one needed.
//!
//! ## Modules
//! - `engine`: The board (`Board`), its parts (`Part`), cells, directions and
//!   operators, and the slide-and-merge transition rule.
//! - `heuristics`: The two cost estimates used by greedy and A* search.
//! - `node`: Immutable search-tree nodes with shared parent links.
//! - `solver`: Search strategies, the frontier and the `Search` engine.
//! - `utils`: Parsing boards from text layouts.

pub mod engine;
pub mod heuristics;
pub mod node;
pub mod solver;
pub mod utils;
