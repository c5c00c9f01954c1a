//! Tic-tac-toe board, rules and move engine.

mod game;
mod position;
pub mod rules;
mod types;

pub use game::{Game, MoveError};
pub use position::Position;
pub use rules::{Evaluation, LINES, MatchOutcome, check_winner, evaluate, is_full, winning_line};
pub use types::{Board, BoardError, Mark, Square};
