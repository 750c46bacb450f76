//! Core model for the block-merging puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `Tile`: Describes a cell when a board is being built (empty, obstacle or block).
//! - `Cell`: What a cell of a live board holds (empty, obstacle or a reference to a `Part`).
//! - `Part`: A rigid group of cells that slides as one unit.
//! - `Board`: The grid and its parts, with the slide-and-merge transition rule
//!   and the stabilization pass that fuses touching parts.
//! - `Direction` / `Operator`: The actions the search engine may try on a board.
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::trace;

/// A `(row, column)` position on a board, 0-based from the top-left corner.
pub type Coord = (usize, usize);

/// Identity of a part within one board.
///
/// Ids are handed out in row-major order when a board is built. When two parts
/// merge, the surviving part keeps its id and the absorbed id disappears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub usize);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Describes a cell of a board that is about to be built.
///
/// Every `Block` becomes its own one-cell part; touching blocks are fused
/// together as soon as the board is assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Nothing here; parts may slide through.
    Empty,
    /// A fixed wall that stops any part.
    Obstacle,
    /// One cell of a movable part.
    Block,
}

impl Tile {
    /// Converts the tile to its layout character.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockmerge_solver::engine::Tile;
    /// assert_eq!(Tile::Block.to_char(), 'O');
    /// assert_eq!(Tile::Obstacle.to_char(), 'X');
    /// assert_eq!(Tile::Empty.to_char(), ' ');
    /// ```
    pub fn to_char(&self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Obstacle => 'X',
            Tile::Block => 'O',
        }
    }
}

// Three empties, one obstacle and one block per five draws.
fn generate_random_tile(rng: &mut impl Rng) -> Tile {
    match rng.gen_range(0..5u8) {
        0..=2 => Tile::Empty,
        3 => Tile::Obstacle,
        4 => Tile::Block,
        _ => unreachable!("Generated value out of range"),
    }
}

/// Contents of one cell of a live board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Obstacle,
    /// The cell belongs to the part with this id.
    Part(PartId),
}

impl Cell {
    /// Character used when rendering the board. Part cells are labelled with
    /// their id in base 36.
    pub fn to_char(&self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Obstacle => 'X',
            Cell::Part(id) => char::from_digit((id.0 % 36) as u32, 36).unwrap_or('O'),
        }
    }
}

/// One of the four directions a part can slide in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in canonical order. Operators are generated in this order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// `(row, column)` offset of a single unit step in this direction.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::East => 'E',
            Direction::South => 'S',
            Direction::West => 'W',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A candidate action: slide `part` towards `direction`.
///
/// An operator only names the action. Whether it does anything is decided by
/// [`Board::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Operator {
    pub part: PartId,
    pub direction: Direction,
}

impl Operator {
    pub fn new(part: PartId, direction: Direction) -> Self {
        Operator { part, direction }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part {} {}", self.part, self.direction)
    }
}

/// A rigid group of cells that slides as one unit.
///
/// Parts order by cell count first, so the minimum of a board's parts is its
/// smallest part. Ties are broken by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Part {
    id: PartId,
    cells: BTreeSet<Coord>,
}

impl Part {
    fn single(id: PartId, coord: Coord) -> Self {
        Part {
            id,
            cells: BTreeSet::from([coord]),
        }
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    /// The coordinates this part occupies, in row-major order.
    pub fn cells(&self) -> &BTreeSet<Coord> {
        &self.cells
    }

    /// Number of cells in the part.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false` for a part owned by a board; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }
}

impl Ord for Part {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.cells.cmp(&other.cells))
    }
}

impl PartialOrd for Part {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The board produced by a successful move, together with what the move cost.
#[derive(Clone, Debug)]
pub struct Transition {
    pub board: Board,
    /// Cells in the moved part before the move, times the unit steps it took.
    pub cost: u32,
}

// Outcome of probing the cells one unit step ahead of a footprint.
enum Probe {
    Clear(Vec<Coord>),
    Boundary,
    Obstacle,
    Contact(BTreeSet<PartId>),
}

/// A puzzle state: a rectangular grid of cells and the parts living on it.
///
/// Two invariants hold for every board handed out by this module:
/// - the cells partition: each coordinate of each part maps back to that part
///   in the cell map, and no other cell references a part;
/// - the board is stable: no two distinct parts occupy orthogonally adjacent cells.
///
/// Equality is structural. Two boards are equal when they have the same
/// dimensions, the same obstacles and the same set of part footprints,
/// regardless of which ids the parts carry or the order they are stored in.
#[derive(Clone, Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    parts: Vec<Part>,
}

impl Board {
    /// Builds a board from a rectangular grid of tiles.
    ///
    /// Each `Tile::Block` becomes its own one-cell part, numbered in row-major
    /// order from 0. The board is then stabilized, so touching blocks come out
    /// as a single part.
    ///
    /// # Panics
    /// Panics if `tiles` has no rows or no columns, or if the rows differ in length.
    /// Fallible construction from text lives in [`crate::utils`].
    ///
    /// # Examples
    /// ```
    /// use blockmerge_solver::engine::{Board, Tile};
    /// let board = Board::from_tiles(&[
    ///     vec![Tile::Block, Tile::Block, Tile::Empty],
    ///     vec![Tile::Empty, Tile::Obstacle, Tile::Block],
    /// ]);
    /// assert_eq!(board.part_count(), 2);
    /// assert_eq!(board.rows(), 2);
    /// assert_eq!(board.cols(), 3);
    /// ```
    pub fn from_tiles(tiles: &[Vec<Tile>]) -> Self {
        let rows = tiles.len();
        let cols = tiles.first().map_or(0, Vec::len);
        assert!(
            rows > 0 && cols > 0,
            "A board needs at least one row and one column"
        );
        assert!(
            tiles.iter().all(|row| row.len() == cols),
            "Board rows must all have the same width"
        );

        let mut cells = Vec::with_capacity(rows * cols);
        let mut parts = Vec::new();
        for (r, row) in tiles.iter().enumerate() {
            for (c, tile) in row.iter().enumerate() {
                let cell = match tile {
                    Tile::Empty => Cell::Empty,
                    Tile::Obstacle => Cell::Obstacle,
                    Tile::Block => {
                        let id = PartId(parts.len());
                        parts.push(Part::single(id, (r, c)));
                        Cell::Part(id)
                    }
                };
                cells.push(cell);
            }
        }

        let mut board = Board {
            rows,
            cols,
            cells,
            parts,
        };
        board.stabilize();
        board.assert_consistent();
        board
    }

    /// Generates a random board of the given size using `rng`.
    ///
    /// Every cell is independently empty with probability 3/5, an obstacle with
    /// probability 1/5 and a block with probability 1/5. The result is stabilized.
    pub fn new_random(rows: usize, cols: usize, rng: &mut impl Rng) -> Self {
        let mut tiles = vec![vec![Tile::Empty; cols]; rows];
        for row in tiles.iter_mut() {
            for tile in row.iter_mut() {
                *tile = generate_random_tile(rng);
            }
        }
        Board::from_tiles(&tiles)
    }

    /// Generates a reproducible random board: the same seed always yields the same board.
    pub fn new_random_with_seed(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Board::new_random(rows, cols, &mut rng)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the contents of the cell at `coord`.
    ///
    /// # Panics
    /// Panics if `coord` lies outside the board.
    pub fn cell(&self, (r, c): Coord) -> Cell {
        assert!(r < self.rows && c < self.cols, "Cell ({}, {}) is off the board", r, c);
        self.cells[r * self.cols + c]
    }

    fn cell_mut(&mut self, (r, c): Coord) -> &mut Cell {
        &mut self.cells[r * self.cols + c]
    }

    /// The parts currently on the board, in collection order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|part| part.id == id)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Goal predicate: exactly one part remains.
    pub fn is_solved(&self) -> bool {
        self.parts.len() == 1
    }

    /// The part with the fewest cells (lowest id on ties), or `None` on a board without parts.
    pub fn smallest_part(&self) -> Option<&Part> {
        self.parts.iter().min()
    }

    /// Returns `true` when no two distinct parts touch orthogonally.
    pub fn is_stable(&self) -> bool {
        self.find_adjacent_pair().is_none()
    }

    /// Enumerates every `(part, direction)` pair on the board.
    ///
    /// Parts come in collection order and, for each part, directions in
    /// `Direction::ALL` order. Operators that would not move anything are
    /// included; [`Board::apply`] filters them out.
    pub fn operators(&self) -> Vec<Operator> {
        self.parts
            .iter()
            .flat_map(|part| {
                Direction::ALL
                    .into_iter()
                    .map(move |direction| Operator::new(part.id, direction))
            })
            .collect()
    }

    /// Counts the unit steps part `id` would slide towards `direction` before
    /// something stops it, without changing the board.
    ///
    /// Returns 0 for an unknown id or a part that cannot move at all.
    pub fn slide_distance(&self, id: PartId, direction: Direction) -> usize {
        let Some(part) = self.part(id) else {
            return 0;
        };
        let mut footprint: Vec<Coord> = part.cells.iter().copied().collect();
        let mut steps = 0;
        while let Probe::Clear(next) = self.probe(id, &footprint, direction) {
            footprint = next;
            steps += 1;
        }
        steps
    }

    /// Slides part `id` towards `direction` and returns the resulting board.
    ///
    /// The part advances in lock-step, one unit at a time, until a probed cell
    /// is off the board or an obstacle (the part stays where it is), or belongs
    /// to another part (the part stays and absorbs every part it touched). The
    /// new board is then stabilized.
    ///
    /// `self` is never modified; the result lives in a fresh copy.
    ///
    /// # Returns
    /// * `Some(Transition)` with cost `|part| * steps` when the part moved at least one step.
    /// * `None` when the part cannot move in that direction, or `id` is not on the board.
    ///
    /// # Examples
    /// ```
    /// use blockmerge_solver::engine::{Direction, PartId};
    /// use blockmerge_solver::utils::board_from_str_array;
    ///
    /// let board = board_from_str_array(&["O O"]).unwrap();
    /// let moved = board.apply(PartId(0), Direction::East).unwrap();
    /// assert_eq!(moved.cost, 1);
    /// assert!(moved.board.is_solved());
    /// assert!(board.apply(PartId(0), Direction::West).is_none());
    /// ```
    pub fn apply(&self, id: PartId, direction: Direction) -> Option<Transition> {
        let part = self.part(id)?;
        let size = part.len();
        let mut footprint: Vec<Coord> = part.cells.iter().copied().collect();
        let mut steps = 0usize;

        let contacts = loop {
            match self.probe(id, &footprint, direction) {
                Probe::Clear(next) => {
                    footprint = next;
                    steps += 1;
                }
                Probe::Contact(others) => break others,
                Probe::Boundary | Probe::Obstacle => break BTreeSet::new(),
            }
        };

        if steps == 0 {
            return None;
        }

        let mut board = self.clone();
        board.relocate(id, footprint);
        for other in contacts {
            board.merge(id, other);
        }
        board.stabilize();
        if cfg!(debug_assertions) {
            board.assert_consistent();
        }

        Some(Transition {
            board,
            cost: (size * steps) as u32,
        })
    }

    /// Panics unless the cell map and the part collection agree with each other.
    ///
    /// Runs at construction and, in debug builds, after every transition.
    pub fn assert_consistent(&self) {
        let mut owned = 0;
        for part in &self.parts {
            assert!(!part.cells.is_empty(), "Part {} has no cells", part.id);
            for &coord in &part.cells {
                assert_eq!(
                    self.cell(coord),
                    Cell::Part(part.id),
                    "Cell {:?} does not point back to part {}",
                    coord,
                    part.id
                );
            }
            owned += part.len();
        }
        let referenced = self
            .cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Part(_)))
            .count();
        assert_eq!(
            owned, referenced,
            "Cell map references part cells that no part owns"
        );
    }

    fn offset(&self, (r, c): Coord, direction: Direction) -> Option<Coord> {
        let (dr, dc) = direction.delta();
        let nr = r.checked_add_signed(dr)?;
        let nc = c.checked_add_signed(dc)?;
        (nr < self.rows && nc < self.cols).then_some((nr, nc))
    }

    // Looks one unit step ahead of `footprint`. Cells of part `id` itself count
    // as clear since the part vacates them as it moves.
    fn probe(&self, id: PartId, footprint: &[Coord], direction: Direction) -> Probe {
        let mut next = Vec::with_capacity(footprint.len());
        let mut blocked = false;
        let mut contacts = BTreeSet::new();

        for &coord in footprint {
            let Some(ahead) = self.offset(coord, direction) else {
                return Probe::Boundary;
            };
            match self.cell(ahead) {
                Cell::Obstacle => blocked = true,
                Cell::Part(other) if other != id => {
                    contacts.insert(other);
                }
                _ => {}
            }
            next.push(ahead);
        }

        if blocked {
            Probe::Obstacle
        } else if !contacts.is_empty() {
            Probe::Contact(contacts)
        } else {
            Probe::Clear(next)
        }
    }

    fn index_of(&self, id: PartId) -> usize {
        self.parts
            .iter()
            .position(|part| part.id == id)
            .expect("Part id must belong to this board")
    }

    // Moves part `id` onto `footprint`, which must only cover empty cells or the
    // part's own cells.
    fn relocate(&mut self, id: PartId, footprint: Vec<Coord>) {
        let idx = self.index_of(id);
        let old = std::mem::take(&mut self.parts[idx].cells);
        for coord in old {
            *self.cell_mut(coord) = Cell::Empty;
        }
        for &coord in &footprint {
            debug_assert_eq!(self.cell(coord), Cell::Empty);
            *self.cell_mut(coord) = Cell::Part(id);
        }
        self.parts[idx].cells = footprint.into_iter().collect();
    }

    // Folds `absorbed` into `survivor`. The absorbed part leaves the collection
    // and its cells are rewritten to point at the survivor.
    fn merge(&mut self, survivor: PartId, absorbed: PartId) {
        assert_ne!(survivor, absorbed, "A part cannot merge with itself");
        let absorbed_part = self.parts.remove(self.index_of(absorbed));
        for &coord in &absorbed_part.cells {
            *self.cell_mut(coord) = Cell::Part(survivor);
        }
        let idx = self.index_of(survivor);
        self.parts[idx].cells.extend(absorbed_part.cells);
        trace!(%survivor, %absorbed, size = self.parts[idx].len(), "merged parts");
    }

    // Merges touching parts until none remain. Returns the number of merges.
    fn stabilize(&mut self) -> usize {
        let mut merges = 0;
        while let Some((survivor, absorbed)) = self.find_adjacent_pair() {
            self.merge(survivor, absorbed);
            merges += 1;
        }
        merges
    }

    fn find_adjacent_pair(&self) -> Option<(PartId, PartId)> {
        for part in &self.parts {
            for &coord in &part.cells {
                for direction in Direction::ALL {
                    if let Some(neighbor) = self.offset(coord, direction) {
                        if let Cell::Part(other) = self.cell(neighbor) {
                            if other != part.id {
                                return Some((part.id, other));
                            }
                        }
                    }
                }
            }
        }
        None
    }

    fn obstacle_mask(&self) -> impl Iterator<Item = bool> + '_ {
        self.cells.iter().map(|cell| *cell == Cell::Obstacle)
    }

    fn footprints(&self) -> Vec<&BTreeSet<Coord>> {
        let mut footprints: Vec<_> = self.parts.iter().map(|part| &part.cells).collect();
        footprints.sort_unstable();
        footprints
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.parts.len() == other.parts.len()
            && self.obstacle_mask().eq(other.obstacle_mask())
            && self.footprints() == other.footprints()
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.cols.hash(state);
        for obstacle in self.obstacle_mask() {
            obstacle.hash(state);
        }
        self.footprints().hash(state);
    }
}

impl fmt::Display for Board {
    /// Draws the board framed by rules, one character per cell separated by spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", " _".repeat(self.cols))?;
        for r in 0..self.rows {
            let row: Vec<String> = (0..self.cols)
                .map(|c| self.cell((r, c)).to_char().to_string())
                .collect();
            writeln!(f, "|{}|", row.join(" "))?;
        }
        write!(f, "{}", " -".repeat(self.cols))
    }
}
