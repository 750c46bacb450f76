//! Estimates of the cost still needed to reduce a board to a single part.
//!
//! Both estimates are pure functions of the board, never negative, and 0 on a
//! solved board. A board without any parts also evaluates to 0.
use crate::engine::{Board, Coord, Part};
use std::fmt;

/// Selects which estimate the informed strategies (greedy, A*) rank nodes by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// `h1`: see [`smallest_part_size`].
    SmallestPart,
    /// `h2`: see [`nearest_neighbor_distance`].
    NearestNeighbor,
}

impl Heuristic {
    pub fn evaluate(self, board: &Board) -> u32 {
        match self {
            Heuristic::SmallestPart => smallest_part_size(board),
            Heuristic::NearestNeighbor => nearest_neighbor_distance(board),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Heuristic::SmallestPart => "smallest-part",
            Heuristic::NearestNeighbor => "nearest-neighbor",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cell count of the smallest part, or 0 once a single part remains.
///
/// The smallest part has to take part in at least one more merge, and every
/// merge costs at least one unit per cell of the part that moves.
///
/// # Examples
/// ```
/// use blockmerge_solver::heuristics::smallest_part_size;
/// use blockmerge_solver::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["OO  O"]).unwrap();
/// assert_eq!(smallest_part_size(&board), 1);
/// ```
pub fn smallest_part_size(board: &Board) -> u32 {
    if board.part_count() <= 1 {
        return 0;
    }
    board.smallest_part().map_or(0, |part| part.len() as u32)
}

/// `(d - 1) * |smallest|`, where `d` is the shortest Manhattan distance between
/// a cell of the smallest part and a cell of any other part.
///
/// `d - 1` unit steps bring the smallest part next to its nearest neighbour and
/// each of those steps costs `|smallest|`.
pub fn nearest_neighbor_distance(board: &Board) -> u32 {
    if board.part_count() <= 1 {
        return 0;
    }
    let Some(smallest) = board.smallest_part() else {
        return 0;
    };
    let nearest = board
        .parts()
        .iter()
        .filter(|part| part.id() != smallest.id())
        .map(|part| min_distance(smallest, part))
        .min()
        .unwrap_or(1);
    (nearest.saturating_sub(1) * smallest.len()) as u32
}

fn manhattan(a: Coord, b: Coord) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

fn min_distance(a: &Part, b: &Part) -> usize {
    a.cells()
        .iter()
        .flat_map(|&x| b.cells().iter().map(move |&y| manhattan(x, y)))
        .min()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Board;
    use crate::utils::board_from_str_array;

    #[test]
    fn test_solved_board_scores_zero() {
        let board = board_from_str_array(&["OOO", "X O"]).unwrap();
        assert!(board.is_solved());
        assert_eq!(smallest_part_size(&board), 0);
        assert_eq!(nearest_neighbor_distance(&board), 0);
        assert_eq!(Heuristic::SmallestPart.evaluate(&board), 0);
        assert_eq!(Heuristic::NearestNeighbor.evaluate(&board), 0);
    }

    #[test]
    fn test_two_singles() {
        let board = board_from_str_array(&["O O"]).unwrap();
        assert_eq!(smallest_part_size(&board), 1);
        assert_eq!(nearest_neighbor_distance(&board), 1);
    }

    #[test]
    fn test_distance_scaled_by_smallest_part() {
        // Smallest part is the pair at columns 5-6, three columns away from the triple.
        let board = board_from_str_array(&["OOO  OO"]).unwrap();
        assert_eq!(smallest_part_size(&board), 2);
        assert_eq!(nearest_neighbor_distance(&board), 4);
    }

    #[test]
    fn test_nearest_neighbor_uses_closest_part() {
        let board = board_from_str_array(&["O   O", "     ", "  O  "]).unwrap();
        // Part at (0,0) is the smallest (lowest id); (2,2) and (0,4) are both 4 away.
        assert_eq!(nearest_neighbor_distance(&board), 3);
        let closer = board_from_str_array(&["O O  ", "     ", "    O"]).unwrap();
        assert_eq!(nearest_neighbor_distance(&closer), 1);
    }

    #[test]
    fn test_positive_exactly_when_unsolved() {
        for seed in 0..30 {
            let board = Board::new_random_with_seed(4, 4, seed);
            if board.part_count() == 0 {
                continue;
            }
            let h1 = smallest_part_size(&board);
            let h2 = nearest_neighbor_distance(&board);
            assert_eq!(h1 == 0, board.is_solved(), "h1 on seed {}", seed);
            // Stable boards keep parts at least 2 apart, so h2 is positive too.
            assert_eq!(h2 == 0, board.is_solved(), "h2 on seed {}", seed);
        }
    }

    #[test]
    fn test_heuristic_display() {
        assert_eq!(Heuristic::SmallestPart.to_string(), "smallest-part");
        assert_eq!(Heuristic::NearestNeighbor.to_string(), "nearest-neighbor");
    }
}
