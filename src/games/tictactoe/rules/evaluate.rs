//! Board evaluation: win, draw or still in progress.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::super::{Board, Mark};
use super::{draw::is_full, win::winning_line};

/// Terminal result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// A mark completed a line.
    Win(Mark),
    /// Full board, no line.
    Draw,
}

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluation {
    /// Play continues.
    InProgress,
    /// The match is over.
    Finished(MatchOutcome),
}

impl Evaluation {
    /// Returns the outcome if the match is over.
    pub fn outcome(self) -> Option<MatchOutcome> {
        match self {
            Evaluation::InProgress => None,
            Evaluation::Finished(outcome) => Some(outcome),
        }
    }

    /// Returns true once a win or draw has been reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, Evaluation::Finished(_))
    }
}

/// Evaluates a board.
///
/// A completed line wins (first line in row, column, diagonal order); a full
/// board without one is a draw; anything else is still in progress.
#[instrument(skip(board))]
pub fn evaluate(board: &Board) -> Evaluation {
    let evaluation = if let Some((mark, line)) = winning_line(board) {
        debug!(?mark, ?line, "Winning line found");
        Evaluation::Finished(MatchOutcome::Win(mark))
    } else if is_full(board) {
        Evaluation::Finished(MatchOutcome::Draw)
    } else {
        Evaluation::InProgress
    };
    debug!(?evaluation, "Board evaluated");
    evaluation
}
