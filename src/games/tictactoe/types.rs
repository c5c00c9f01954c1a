//! Core domain types for tic-tac-toe.

use std::str::FromStr;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::position::Position;

/// A player's symbol on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Mark {
    /// Mark X (moves first).
    X,
    /// Mark O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the occupying mark, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

impl From<Option<Mark>> for Square {
    fn from(cell: Option<Mark>) -> Self {
        cell.map_or(Square::Empty, Square::Occupied)
    }
}

/// Rejected board input.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// The board did not have exactly nine cells.
    #[display("Board must have exactly 9 cells, got {}", _0)]
    WrongLength(#[error(not(source))] usize),
    /// A cell held something other than empty, X or O.
    #[display("Invalid cell value '{}' at index {}", value, index)]
    InvalidCell {
        /// Index of the offending cell.
        index: usize,
        /// The rejected value.
        value: String,
    },
    /// Mark counts are further apart than alternating turns allow.
    #[display("Unbalanced board: {} X marks against {} O marks", x_count, o_count)]
    Unbalanced {
        /// Number of X marks.
        x_count: usize,
        /// Number of O marks.
        o_count: usize,
    },
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Builds a board from nine optional marks in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::WrongLength`] unless exactly nine cells are given.
    #[instrument(skip(cells), fields(len = cells.len()))]
    pub fn from_cells(cells: &[Option<Mark>]) -> Result<Self, BoardError> {
        let squares: [Option<Mark>; 9] = cells
            .try_into()
            .map_err(|_| BoardError::WrongLength(cells.len()))?;
        Ok(Self {
            squares: squares.map(Square::from),
        })
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares as a slice.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Counts the squares held by `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(mark))
            .count()
    }

    /// Checks that the mark counts differ by at most one.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unbalanced`] when turns could not have alternated.
    #[instrument(skip(self))]
    pub fn check_turn_balance(&self) -> Result<(), BoardError> {
        let x_count = self.count(Mark::X);
        let o_count = self.count(Mark::O);
        if x_count.abs_diff(o_count) > 1 {
            return Err(BoardError::Unbalanced { x_count, o_count });
        }
        Ok(())
    }

    /// Formats the board as a human-readable grid.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => (pos + 1).to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses nine cells such as `"XXX.OO..."`.
///
/// `X`/`O` in either case are marks; `.`, `-`, `_` and space are empty.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(BoardError::WrongLength(chars.len()));
        }

        let mut cells = Vec::with_capacity(9);
        for (index, c) in chars.into_iter().enumerate() {
            let cell = match c {
                'X' | 'x' => Some(Mark::X),
                'O' | 'o' => Some(Mark::O),
                '.' | '-' | '_' | ' ' => None,
                other => {
                    return Err(BoardError::InvalidCell {
                        index,
                        value: other.to_string(),
                    });
                }
            };
            cells.push(cell);
        }
        Self::from_cells(&cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board() {
        let board: Board = "XXX.OO...".parse().unwrap();
        assert_eq!(board.get(Position::TopLeft), Square::Occupied(Mark::X));
        assert_eq!(board.get(Position::MiddleLeft), Square::Empty);
        assert_eq!(board.get(Position::Center), Square::Occupied(Mark::O));
        assert_eq!(board.count(Mark::X), 3);
        assert_eq!(board.count(Mark::O), 2);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!("XO".parse::<Board>(), Err(BoardError::WrongLength(2)));
        assert_eq!(
            Board::from_cells(&[None; 10]),
            Err(BoardError::WrongLength(10))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_cell() {
        let err = "XXZ......".parse::<Board>().unwrap_err();
        assert_eq!(
            err,
            BoardError::InvalidCell {
                index: 2,
                value: "Z".to_string()
            }
        );
    }

    #[test]
    fn test_turn_balance() {
        let balanced: Board = "XOX.O....".parse().unwrap();
        assert!(balanced.check_turn_balance().is_ok());

        let unbalanced: Board = "XXX......".parse().unwrap();
        assert!(matches!(
            unbalanced.check_turn_balance(),
            Err(BoardError::Unbalanced {
                x_count: 3,
                o_count: 0
            })
        ));
    }

    #[test]
    fn test_display_grid() {
        let board: Board = "X...O....".parse().unwrap();
        assert_eq!(board.display(), "X|2|3\n-+-+-\n4|O|6\n-+-+-\n7|8|9");
    }
}
