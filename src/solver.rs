use crate::engine::Board;
use crate::heuristics::Heuristic;
use crate::node::Node;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, trace};

/// How the search orders its frontier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Children go behind everything already waiting (FIFO).
    BreadthFirst,
    /// Children go in front of everything already waiting (LIFO).
    DepthFirst,
    /// Breadth-first passes limited to depth 0, 1, 2, ... each restarted from the root.
    IterativeDeepening,
    /// Lowest `h(node)` first, FIFO among equal keys.
    Greedy(Heuristic),
    /// Lowest `h(node) + path_cost` first, FIFO among equal keys.
    AStar(Heuristic),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::BreadthFirst => write!(f, "breadth-first"),
            Strategy::DepthFirst => write!(f, "depth-first"),
            Strategy::IterativeDeepening => write!(f, "iterative-deepening"),
            Strategy::Greedy(h) => write!(f, "greedy ({})", h),
            Strategy::AStar(h) => write!(f, "a-star ({})", h),
        }
    }
}

/// How a finished search ended.
#[derive(Clone, Debug)]
pub enum SearchResult {
    /// A node whose board has exactly one part. Its parent chain is the solution.
    Solved { goal: Rc<Node> },
    /// The frontier ran dry without reaching a goal.
    Failed,
}

impl SearchResult {
    pub fn goal(&self) -> Option<&Rc<Node>> {
        match self {
            SearchResult::Solved { goal } => Some(goal),
            SearchResult::Failed => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SearchResult::Solved { .. })
    }
}

/// Counters kept while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes taken off the frontier.
    pub popped: usize,
    /// Popped nodes whose successors were generated.
    pub expanded: usize,
    /// Successor nodes created.
    pub generated: usize,
    /// Popped nodes dropped because an ancestor already held the same board.
    pub pruned_cycles: usize,
    /// Times the frontier was seeded with a root (1 unless iterative deepening).
    pub passes: u32,
    /// Largest frontier size seen.
    pub max_frontier: usize,
}

// Pending nodes, ordered per strategy.
enum Frontier {
    Queue(VecDeque<Rc<Node>>),
    Stack(Vec<Rc<Node>>),
    Buckets {
        buckets: BTreeMap<u32, VecDeque<Rc<Node>>>,
        len: usize,
        heuristic: Heuristic,
        with_path_cost: bool,
    },
}

impl Frontier {
    fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::BreadthFirst | Strategy::IterativeDeepening => {
                Frontier::Queue(VecDeque::new())
            }
            Strategy::DepthFirst => Frontier::Stack(Vec::new()),
            Strategy::Greedy(heuristic) => Frontier::buckets(heuristic, false),
            Strategy::AStar(heuristic) => Frontier::buckets(heuristic, true),
        }
    }

    fn buckets(heuristic: Heuristic, with_path_cost: bool) -> Self {
        Frontier::Buckets {
            buckets: BTreeMap::new(),
            len: 0,
            heuristic,
            with_path_cost,
        }
    }

    // Adds a batch of siblings. Within the batch, generation order is kept:
    // the first child is popped first among its siblings.
    fn push_batch(&mut self, children: Vec<Rc<Node>>) {
        match self {
            Frontier::Queue(queue) => queue.extend(children),
            Frontier::Stack(stack) => stack.extend(children.into_iter().rev()),
            Frontier::Buckets {
                buckets,
                len,
                heuristic,
                with_path_cost,
            } => {
                for child in children {
                    let mut key = heuristic.evaluate(child.state());
                    if *with_path_cost {
                        key += child.path_cost();
                    }
                    buckets.entry(key).or_default().push_back(child);
                    *len += 1;
                }
            }
        }
    }

    fn pop(&mut self) -> Option<Rc<Node>> {
        match self {
            Frontier::Queue(queue) => queue.pop_front(),
            Frontier::Stack(stack) => stack.pop(),
            Frontier::Buckets { buckets, len, .. } => {
                let mut lowest = buckets.first_entry()?;
                let node = lowest.get_mut().pop_front();
                if lowest.get().is_empty() {
                    lowest.remove();
                }
                if node.is_some() {
                    *len -= 1;
                }
                node
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Frontier::Queue(queue) => queue.len(),
            Frontier::Stack(stack) => stack.len(),
            Frontier::Buckets { len, .. } => *len,
        }
    }
}

/// Generates every successor of `node`: one child per operator that moves its
/// part at least one step, in operator order.
pub fn expand(node: &Rc<Node>) -> Vec<Rc<Node>> {
    let state = node.state();
    state
        .operators()
        .into_iter()
        .filter_map(|op| {
            let transition = state.apply(op.part, op.direction)?;
            Some(Node::child(node, op, transition.board, transition.cost))
        })
        .collect()
}

/// One search run over the state graph of a board.
///
/// Creating a `Search` seeds the frontier with the root node. Each call to
/// [`Search::step`] pops one node: a goal ends the search, a node repeating
/// an ancestor's board is dropped, anything else is expanded. Callers that
/// want to bound the work can drive `step` themselves or use
/// [`Search::run_bounded`].
///
/// # Examples
/// ```
/// use blockmerge_solver::node::path_of;
/// use blockmerge_solver::solver::{Search, Strategy};
/// use blockmerge_solver::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["O O O"]).unwrap();
/// let result = Search::new(board, Strategy::BreadthFirst).finish();
/// let goal = result.goal().unwrap();
/// assert_eq!(goal.depth(), 2);
/// assert_eq!(path_of(goal).len(), 3);
/// ```
pub struct Search {
    initial: Board,
    strategy: Strategy,
    frontier: Frontier,
    depth_limit: Option<u32>,
    // Set when the current pass refused to expand a node because of the depth limit.
    cutoff: bool,
    outcome: Option<SearchResult>,
    stats: SearchStats,
}

impl Search {
    pub fn new(initial: Board, strategy: Strategy) -> Self {
        let depth_limit = match strategy {
            Strategy::IterativeDeepening => Some(0),
            _ => None,
        };
        let mut search = Search {
            frontier: Frontier::for_strategy(strategy),
            initial,
            strategy,
            depth_limit,
            cutoff: false,
            outcome: None,
            stats: SearchStats::default(),
        };
        search.seed();
        search
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Current depth limit when iterative deepening, `None` otherwise.
    pub fn depth_limit(&self) -> Option<u32> {
        self.depth_limit
    }

    /// The result, once the search has finished.
    pub fn outcome(&self) -> Option<&SearchResult> {
        self.outcome.as_ref()
    }

    /// Performs one iteration.
    ///
    /// # Returns
    /// * `None` while the search is still running.
    /// * `Some(SearchResult)` once it has succeeded or exhausted its frontier.
    ///   Further calls keep returning the same result.
    pub fn step(&mut self) -> Option<SearchResult> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }

        let Some(node) = self.frontier.pop() else {
            return self.frontier_exhausted();
        };
        self.stats.popped += 1;

        if node.is_goal() {
            info!(
                strategy = %self.strategy,
                depth = node.depth(),
                cost = node.path_cost(),
                expanded = self.stats.expanded,
                "goal reached"
            );
            return self.conclude(SearchResult::Solved { goal: node });
        }

        if node.repeats_ancestor_state() {
            self.stats.pruned_cycles += 1;
            trace!(depth = node.depth(), "dropped node repeating an ancestor");
            return None;
        }

        if let Some(limit) = self.depth_limit {
            if node.depth() >= limit {
                self.cutoff = true;
                return None;
            }
        }

        let children = expand(&node);
        self.stats.expanded += 1;
        self.stats.generated += children.len();
        debug!(
            depth = node.depth(),
            cost = node.path_cost(),
            children = children.len(),
            frontier = self.frontier.len(),
            "expanded node"
        );
        self.frontier.push_batch(children);
        self.stats.max_frontier = self.stats.max_frontier.max(self.frontier.len());
        None
    }

    /// Steps until the search finishes or `max_expansions` nodes have been expanded.
    ///
    /// Returns `None` if the budget ran out first; the search can be resumed.
    pub fn run_bounded(&mut self, max_expansions: usize) -> Option<SearchResult> {
        loop {
            if let Some(outcome) = self.step() {
                return Some(outcome);
            }
            if self.stats.expanded >= max_expansions {
                return None;
            }
        }
    }

    /// Steps until the search finishes.
    pub fn finish(&mut self) -> SearchResult {
        loop {
            if let Some(outcome) = self.step() {
                return outcome;
            }
        }
    }

    fn seed(&mut self) {
        self.frontier
            .push_batch(vec![Node::root(self.initial.clone())]);
        self.stats.passes += 1;
        self.stats.max_frontier = self.stats.max_frontier.max(self.frontier.len());
    }

    fn frontier_exhausted(&mut self) -> Option<SearchResult> {
        match self.depth_limit {
            // Something was left unexplored below the limit: go one level deeper.
            Some(limit) if self.cutoff => {
                self.depth_limit = Some(limit + 1);
                self.cutoff = false;
                debug!(limit = limit + 1, "starting deeper pass");
                self.seed();
                None
            }
            _ => {
                info!(
                    strategy = %self.strategy,
                    expanded = self.stats.expanded,
                    "search space exhausted without a solution"
                );
                self.conclude(SearchResult::Failed)
            }
        }
    }

    fn conclude(&mut self, outcome: SearchResult) -> Option<SearchResult> {
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }
}

/// Searches from `initial` with `strategy` until a goal is found or the frontier empties.
pub fn run(initial: Board, strategy: Strategy) -> SearchResult {
    Search::new(initial, strategy).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::path_of;
    use crate::utils::board_from_str_array;

    const ALL_STRATEGIES: [Strategy; 7] = [
        Strategy::BreadthFirst,
        Strategy::DepthFirst,
        Strategy::IterativeDeepening,
        Strategy::Greedy(Heuristic::SmallestPart),
        Strategy::Greedy(Heuristic::NearestNeighbor),
        Strategy::AStar(Heuristic::SmallestPart),
        Strategy::AStar(Heuristic::NearestNeighbor),
    ];

    // Replays the path and checks every link: the operator reproduces the
    // child's board and the cost difference matches the move's cost.
    fn assert_valid_path(goal: &Rc<Node>) {
        let path = path_of(goal);
        assert_eq!(path.len() as u32, goal.depth() + 1);
        assert!(path[0].parent().is_none());
        assert_eq!(path[0].path_cost(), 0);
        for pair in path.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let op = child.operator().unwrap();
            let replayed = parent.state().apply(op.part, op.direction).unwrap();
            assert_eq!(&replayed.board, child.state());
            assert_eq!(child.path_cost(), parent.path_cost() + replayed.cost);
            assert_eq!(child.depth(), parent.depth() + 1);
        }
        assert!(goal.is_goal());
    }

    #[test]
    fn test_solved_board_returns_root() {
        let board = board_from_str_array(&["OO", " O"]).unwrap();
        for strategy in ALL_STRATEGIES {
            let mut search = Search::new(board.clone(), strategy);
            let result = search.step().expect("first pop should hit the goal");
            let goal = result.goal().unwrap();
            assert_eq!(goal.depth(), 0);
            assert_eq!(goal.path_cost(), 0);
            assert_eq!(path_of(goal).len(), 1);
            assert_eq!(search.stats().expanded, 0);
        }
    }

    #[test]
    fn test_breadth_first_three_in_a_row() {
        let board = board_from_str_array(&["O O O"]).unwrap();
        let mut search = Search::new(board, Strategy::BreadthFirst);
        let result = search.run_bounded(1_000).unwrap();
        let goal = result.goal().unwrap();
        assert_valid_path(goal);
        assert_eq!(goal.depth(), 2);
        // Root plus its four children are expanded before the first depth-2 goal.
        assert_eq!(search.stats().expanded, 5);
        assert_eq!(goal.path_cost(), 3);
    }

    #[test]
    fn test_depth_first_follows_first_child() {
        let board = board_from_str_array(&["O O O"]).unwrap();
        let mut search = Search::new(board, Strategy::DepthFirst);
        let result = search.run_bounded(1_000).unwrap();
        let goal = result.goal().unwrap();
        assert_valid_path(goal);
        assert_eq!(goal.depth(), 2);
        assert_eq!(search.stats().expanded, 2);
    }

    #[test]
    fn test_iterative_deepening_matches_breadth_first() {
        let board = board_from_str_array(&["O O O"]).unwrap();
        let bfs = run(board.clone(), Strategy::BreadthFirst);
        let mut search = Search::new(board, Strategy::IterativeDeepening);
        let result = search.run_bounded(1_000).unwrap();
        let goal = result.goal().unwrap();
        assert_valid_path(goal);

        let bfs_goal = bfs.goal().unwrap();
        assert_eq!(goal.depth(), bfs_goal.depth());
        assert_eq!(goal.state(), bfs_goal.state());
        // Limits 0 and 1 fail; the goal turns up in the pass limited to depth 2.
        assert_eq!(search.depth_limit(), Some(2));
        assert_eq!(search.stats().passes, 3);
    }

    #[test]
    fn test_a_star_no_worse_than_breadth_first() {
        let board = board_from_str_array(&["O O O"]).unwrap();
        let mut bfs = Search::new(board.clone(), Strategy::BreadthFirst);
        let bfs_result = bfs.run_bounded(1_000).unwrap();
        let mut a_star = Search::new(board, Strategy::AStar(Heuristic::SmallestPart));
        let a_star_result = a_star.run_bounded(1_000).unwrap();

        let bfs_goal = bfs_result.goal().unwrap();
        let a_star_goal = a_star_result.goal().unwrap();
        assert_valid_path(a_star_goal);
        assert_eq!(a_star_goal.depth(), bfs_goal.depth());
        assert!(a_star.stats().expanded <= bfs.stats().expanded);
        assert!(a_star_goal.path_cost() <= bfs_goal.path_cost());
        assert_eq!(a_star_goal.path_cost(), 2);
    }

    #[test]
    fn test_every_strategy_solves_small_board() {
        let board = board_from_str_array(&["O  X", "    ", "X  O", " O  "]).unwrap();
        for strategy in ALL_STRATEGIES {
            let mut search = Search::new(board.clone(), strategy);
            let result = search
                .run_bounded(50_000)
                .unwrap_or_else(|| panic!("{} ran out of budget", strategy));
            let goal = result
                .goal()
                .unwrap_or_else(|| panic!("{} found no solution", strategy));
            assert_valid_path(goal);
        }
    }

    #[test]
    fn test_isolated_parts_fail() {
        let board = board_from_str_array(&["OXO"]).unwrap();
        for strategy in ALL_STRATEGIES {
            let result = run(board.clone(), strategy);
            assert!(!result.is_solved(), "{} claimed a solution", strategy);
        }
    }

    #[test]
    fn test_walled_off_parts_exhaust_with_cycles_pruned() {
        let board = board_from_str_array(&["OXO", " X "]).unwrap();
        for strategy in ALL_STRATEGIES {
            let mut search = Search::new(board.clone(), strategy);
            let result = search.run_bounded(10_000).unwrap();
            assert!(matches!(result, SearchResult::Failed), "{}", strategy);
            assert!(search.stats().pruned_cycles > 0, "{}", strategy);
        }
    }

    #[test]
    fn test_iterative_deepening_stops_when_nothing_was_cut_off() {
        let board = board_from_str_array(&["OXO"]).unwrap();
        let mut search = Search::new(board, Strategy::IterativeDeepening);
        let result = search.run_bounded(100).unwrap();
        assert!(!result.is_solved());
        // Limit 0 cuts off the root; limit 1 expands it and finds no successors.
        assert_eq!(search.stats().passes, 2);
        assert_eq!(search.stats().expanded, 1);
        assert_eq!(search.stats().generated, 0);
    }

    #[test]
    fn test_step_after_finish_repeats_outcome() {
        let board = board_from_str_array(&["O O"]).unwrap();
        let mut search = Search::new(board, Strategy::BreadthFirst);
        let first = search.run_bounded(100).unwrap();
        let again = search.step().unwrap();
        assert!(Rc::ptr_eq(first.goal().unwrap(), again.goal().unwrap()));
        assert!(search.outcome().is_some());
    }

    #[test]
    fn test_run_bounded_stops_at_budget() {
        let board = board_from_str_array(&["OXO", " X "]).unwrap();
        let mut search = Search::new(board, Strategy::BreadthFirst);
        assert!(search.run_bounded(1).is_none());
        assert_eq!(search.stats().expanded, 1);
        assert!(search.outcome().is_none());
        let result = search.run_bounded(10_000).unwrap();
        assert!(!result.is_solved());
    }

    #[test]
    fn test_greedy_pops_lowest_bucket_first() {
        let board = board_from_str_array(&["O O O"]).unwrap();
        let root = Node::root(board);
        let children = expand(&root);
        assert_eq!(children.len(), 4);

        let mut frontier = Frontier::for_strategy(Strategy::Greedy(Heuristic::NearestNeighbor));
        frontier.push_batch(children.clone());
        assert_eq!(frontier.len(), 4);
        let mut keys = Vec::new();
        while let Some(node) = frontier.pop() {
            keys.push(Heuristic::NearestNeighbor.evaluate(node.state()));
        }
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(frontier.len(), 0);
    }

    #[test]
    fn test_depth_first_stack_keeps_sibling_order() {
        let board = board_from_str_array(&["O O O"]).unwrap();
        let root = Node::root(board);
        let children = expand(&root);
        let mut frontier = Frontier::for_strategy(Strategy::DepthFirst);
        frontier.push_batch(children.clone());
        for child in &children {
            assert!(Rc::ptr_eq(child, &frontier.pop().unwrap()));
        }
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::BreadthFirst.to_string(), "breadth-first");
        assert_eq!(
            Strategy::AStar(Heuristic::SmallestPart).to_string(),
            "a-star (smallest-part)"
        );
    }
}
