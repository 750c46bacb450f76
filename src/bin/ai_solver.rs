use blockmerge_solver::engine::Board;
use blockmerge_solver::heuristics::Heuristic;
use blockmerge_solver::node::path_of;
use blockmerge_solver::solver::{Search, SearchResult, Strategy};
use blockmerge_solver::utils::board_from_file;
use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Bf,
    Df,
    Id,
    Greedy,
    Astar,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    SmallestPart,
    NearestNeighbor,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::SmallestPart => Heuristic::SmallestPart,
            HeuristicArg::NearestNeighbor => Heuristic::NearestNeighbor,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Search strategy
    #[clap(short, long, value_enum, default_value_t = StrategyArg::Bf)]
    strategy: StrategyArg,

    /// Heuristic used by the greedy and A* strategies
    #[clap(long, value_enum, default_value_t = HeuristicArg::SmallestPart)]
    heuristic: HeuristicArg,

    /// Give up after this many node expansions
    #[clap(long)]
    max_expansions: Option<usize>,

    /// Rows of the random board (ignored when a board file is given)
    #[clap(long, default_value_t = 4)]
    rows: usize,

    /// Columns of the random board (ignored when a board file is given)
    #[clap(long, default_value_t = 4)]
    cols: usize,

    /// Seed for the random board; picked at random when omitted
    #[clap(long)]
    seed: Option<u64>,

    /// Path to a board layout file ('O' = part cell, ' ' = empty, anything else = obstacle)
    board_file: Option<PathBuf>,
}

impl Args {
    fn strategy(&self) -> Strategy {
        let heuristic = Heuristic::from(self.heuristic);
        match self.strategy {
            StrategyArg::Bf => Strategy::BreadthFirst,
            StrategyArg::Df => Strategy::DepthFirst,
            StrategyArg::Id => Strategy::IterativeDeepening,
            StrategyArg::Greedy => Strategy::Greedy(heuristic),
            StrategyArg::Astar => Strategy::AStar(heuristic),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_board(args: &Args) -> Result<Board, Box<dyn Error>> {
    match &args.board_file {
        Some(path) => {
            let board = board_from_file(path)
                .map_err(|e| format!("Failed to read board from {}: {}", path.display(), e))?;
            println!("Loaded board from {}\n", path.display());
            Ok(board)
        }
        None => {
            if args.rows == 0 || args.cols == 0 {
                return Err("Random boards need at least one row and one column".into());
            }
            let seed = args.seed.unwrap_or_else(rand::random);
            println!(
                "Generated {}x{} random board (seed {})\n",
                args.rows, args.cols, seed
            );
            Ok(Board::new_random_with_seed(args.rows, args.cols, seed))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Args::parse();

    let board = load_board(&args)?;
    let strategy = args.strategy();
    println!("Initial board state:\n{}\n", board);
    println!("Parts: {}", board.part_count());
    println!("Searching with strategy {}...\n", strategy);

    let mut search = Search::new(board, strategy);
    let outcome = match args.max_expansions {
        Some(budget) => search.run_bounded(budget),
        None => Some(search.finish()),
    };
    let stats = *search.stats();

    match outcome {
        Some(SearchResult::Solved { goal }) => {
            println!("Solution found:\n");
            for (i, node) in path_of(&goal).iter().enumerate().skip(1) {
                if let Some(op) = node.operator() {
                    println!("  Move {}: {} (total cost {})", i, op, node.path_cost());
                }
            }
            println!("\nMoves: {}", goal.depth());
            println!("Total cost: {}\n", goal.path_cost());
            println!("Final board state:\n{}\n", goal.state());
        }
        Some(SearchResult::Failed) => {
            println!("No solution found.\n");
        }
        None => {
            println!(
                "Gave up after {} expansions without a result.\n",
                stats.expanded
            );
        }
    }
    println!(
        "Nodes popped: {}, expanded: {}, generated: {}, cycles pruned: {}, passes: {}",
        stats.popped, stats.expanded, stats.generated, stats.pruned_cycles, stats.passes
    );
    Ok(())
}
