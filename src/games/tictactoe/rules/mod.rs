//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](super::Board). Rules are kept apart from
//! the move engine so settlement code can evaluate boards it did not play.

pub mod draw;
pub mod evaluate;
pub mod win;

pub use draw::is_full;
pub use evaluate::{Evaluation, MatchOutcome, evaluate};
pub use win::{LINES, check_winner, winning_line};
