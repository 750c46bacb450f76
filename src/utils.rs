use crate::engine::{Board, Tile};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Reasons a text layout cannot be turned into a `Board`.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to read layout: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout has no cells")]
    Empty,

    #[error("Row {row} has {found} cells (expected {expected})")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unrecognized character {ch:?} in row {row} col {col}")]
    UnrecognizedCharacter { ch: char, row: usize, col: usize },

    #[error("Layout contains no parts")]
    NoParts,
}

/// Maps a layout character to a tile.
///
/// `'O'` is a block and a space is empty. Any other printable character is an
/// obstacle; control characters are not accepted.
pub fn tile_from_char(ch: char) -> Option<Tile> {
    match ch {
        'O' => Some(Tile::Block),
        ' ' => Some(Tile::Empty),
        c if c.is_control() => None,
        _ => Some(Tile::Obstacle),
    }
}

/// Parses an array of string slices into a `Board` object.
///
/// Each string slice is one row, starting from row 0. All rows must have the
/// same number of characters.
///
/// # Returns
/// * `Ok(Board)` if parsing is successful. Adjacent blocks are already fused.
/// * `Err(LayoutError)` if the layout is empty, a row has a different width
///   than row 0, a control character appears, or there is no block at all.
///
/// # Examples
/// ```
/// use blockmerge_solver::engine::Cell;
/// use blockmerge_solver::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["O X", " OO"]).unwrap();
/// assert_eq!(board.part_count(), 2);
/// assert_eq!(board.cell((0, 2)), Cell::Obstacle);
///
/// assert!(board_from_str_array(&["O X", " O"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, LayoutError> {
    let width = s.first().map_or(0, |row| row.chars().count());
    if width == 0 {
        return Err(LayoutError::Empty);
    }

    let mut tiles = Vec::with_capacity(s.len());
    let mut blocks = 0;
    for (r, row_str) in s.iter().enumerate() {
        let found = row_str.chars().count();
        if found != width {
            return Err(LayoutError::RaggedRow {
                row: r,
                expected: width,
                found,
            });
        }

        let mut row = Vec::with_capacity(width);
        for (c, ch) in row_str.chars().enumerate() {
            let tile = tile_from_char(ch)
                .ok_or(LayoutError::UnrecognizedCharacter { ch, row: r, col: c })?;
            if tile == Tile::Block {
                blocks += 1;
            }
            row.push(tile);
        }
        tiles.push(row);
    }

    if blocks == 0 {
        return Err(LayoutError::NoParts);
    }
    Ok(Board::from_tiles(&tiles))
}

/// Parses a whole layout text, one row per line. Trailing blank lines are ignored.
pub fn board_from_layout(text: &str) -> Result<Board, LayoutError> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    board_from_str_array(&lines)
}

/// Reads and parses a layout file.
pub fn board_from_file(path: impl AsRef<Path>) -> Result<Board, LayoutError> {
    let content = fs::read_to_string(path)?;
    board_from_layout(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, PartId};

    #[test]
    fn test_board_from_str_array_valid() {
        let board = board_from_str_array(&["O  #", " X  ", "O  O"]).unwrap();
        assert_eq!(board.rows(), 3);
        assert_eq!(board.cols(), 4);
        assert_eq!(board.part_count(), 3);
        assert_eq!(board.cell((0, 0)), Cell::Part(PartId(0)));
        assert_eq!(board.cell((0, 3)), Cell::Obstacle);
        assert_eq!(board.cell((1, 1)), Cell::Obstacle);
        assert_eq!(board.cell((1, 0)), Cell::Empty);
    }

    #[test]
    fn test_board_from_str_array_ragged() {
        let result = board_from_str_array(&["O  ", "O"]);
        match result {
            Err(LayoutError::RaggedRow {
                row,
                expected,
                found,
            }) => {
                assert_eq!((row, expected, found), (1, 3, 1));
            }
            other => panic!("Expected a ragged row error, got {:?}", other),
        }
    }

    #[test]
    fn test_board_from_str_array_control_character() {
        let result = board_from_str_array(&["O\t "]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unrecognized character '\\t' in row 0 col 1"));
    }

    #[test]
    fn test_board_from_str_array_empty_input() {
        let board_str: [&str; 0] = [];
        assert!(matches!(
            board_from_str_array(&board_str),
            Err(LayoutError::Empty)
        ));
        assert!(matches!(board_from_str_array(&[""]), Err(LayoutError::Empty)));
    }

    #[test]
    fn test_board_from_str_array_without_parts() {
        assert!(matches!(
            board_from_str_array(&["X  ", "  X"]),
            Err(LayoutError::NoParts)
        ));
    }

    #[test]
    fn test_board_from_layout_ignores_trailing_lines() {
        let board = board_from_layout("O O\r\n X \r\n\n\n").unwrap();
        assert_eq!(board.rows(), 2);
        assert_eq!(board.cols(), 3);
        assert_eq!(board.part_count(), 2);
    }

    #[test]
    fn test_board_from_file_missing() {
        let result = board_from_file("definitely/not/a/layout.txt");
        assert!(matches!(result, Err(LayoutError::Io(_))));
    }
}
