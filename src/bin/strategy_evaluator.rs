use blockmerge_solver::engine::Board;
use blockmerge_solver::heuristics::Heuristic;
use blockmerge_solver::solver::{Search, SearchResult, Strategy};
use clap::Parser;
use std::error::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const STRATEGIES: [Strategy; 7] = [
    Strategy::BreadthFirst,
    Strategy::DepthFirst,
    Strategy::IterativeDeepening,
    Strategy::Greedy(Heuristic::SmallestPart),
    Strategy::Greedy(Heuristic::NearestNeighbor),
    Strategy::AStar(Heuristic::SmallestPart),
    Strategy::AStar(Heuristic::NearestNeighbor),
];

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of random boards to evaluate
    #[clap(long, default_value_t = 20)]
    boards: u64,

    /// Seed of the first board; board i uses start_seed + i
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    #[clap(long, default_value_t = 4)]
    rows: usize,

    #[clap(long, default_value_t = 4)]
    cols: usize,

    /// Expansion budget per search
    #[clap(long, default_value_t = 20_000)]
    max_expansions: usize,
}

#[derive(Default)]
struct Tally {
    solved: u32,
    failed: u32,
    gave_up: u32,
    expanded: usize,
    total_cost: u64,
    total_depth: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.rows == 0 || args.cols == 0 {
        return Err("Boards need at least one row and one column".into());
    }

    let mut tallies: Vec<(Strategy, Tally)> =
        STRATEGIES.iter().map(|&s| (s, Tally::default())).collect();

    println!(
        "Starting strategy evaluation for {} boards ({}x{}, budget {} expansions)...",
        args.boards, args.rows, args.cols, args.max_expansions
    );

    for board_idx in 0..args.boards {
        let seed = args.start_seed + board_idx;
        let board = Board::new_random_with_seed(args.rows, args.cols, seed);
        println!(
            "\nEvaluating Board {} (Seed: {}, Parts: {})",
            board_idx,
            seed,
            board.part_count()
        );

        for (strategy, tally) in tallies.iter_mut() {
            let mut search = Search::new(board.clone(), *strategy);
            let outcome = search.run_bounded(args.max_expansions);
            let expanded = search.stats().expanded;
            tally.expanded += expanded;

            match outcome {
                Some(SearchResult::Solved { goal }) => {
                    tally.solved += 1;
                    tally.total_cost += u64::from(goal.path_cost());
                    tally.total_depth += u64::from(goal.depth());
                    println!(
                        "  Strategy: {:<32} Solved  Cost: {:<5} Moves: {:<3} Expanded: {}",
                        strategy.to_string(),
                        goal.path_cost(),
                        goal.depth(),
                        expanded
                    );
                }
                Some(SearchResult::Failed) => {
                    tally.failed += 1;
                    println!(
                        "  Strategy: {:<32} Failed  Expanded: {}",
                        strategy.to_string(),
                        expanded
                    );
                }
                None => {
                    tally.gave_up += 1;
                    warn!(%strategy, seed, "expansion budget exhausted");
                    println!(
                        "  Strategy: {:<32} Budget  Expanded: {}",
                        strategy.to_string(),
                        expanded
                    );
                }
            }
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of boards evaluated: {}", args.boards);
    println!("\n--- Summary ---");
    for (strategy, tally) in &tallies {
        let runs = (tally.solved + tally.failed + tally.gave_up).max(1);
        let avg_expanded = tally.expanded as f64 / f64::from(runs);
        let (avg_cost, avg_depth) = if tally.solved > 0 {
            (
                tally.total_cost as f64 / f64::from(tally.solved),
                tally.total_depth as f64 / f64::from(tally.solved),
            )
        } else {
            (0.0, 0.0)
        };
        println!(
            "Strategy {:<32}: solved {:>3}, failed {:>3}, over budget {:>3}, avg expanded {:>9.1}, avg cost {:>6.2}, avg moves {:>5.2}",
            strategy.to_string(),
            tally.solved,
            tally.failed,
            tally.gave_up,
            avg_expanded,
            avg_cost,
            avg_depth
        );
    }
    Ok(())
}
