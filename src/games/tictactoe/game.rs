//! Move engine for tic-tac-toe.

use derive_more::{Display, Error};
use tracing::{debug, info, instrument};

use super::rules::{Evaluation, evaluate, winning_line};
use super::{Board, Mark, Position, Square};

/// Rejected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The match already reached a win or draw.
    #[display("Game is already over")]
    GameOver,
    /// The square is taken.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(#[error(not(source))] Position),
}

/// Tic-tac-toe game engine.
///
/// X always moves first and turns alternate. The board is frozen once a
/// terminal evaluation is reached.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    to_move: Mark,
    evaluation: Evaluation,
    history: Vec<Position>,
}

impl Game {
    /// Creates a new game.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            to_move: Mark::X,
            evaluation: Evaluation::InProgress,
            history: Vec::new(),
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the mark to move next.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Returns the current evaluation.
    pub fn evaluation(&self) -> Evaluation {
        self.evaluation
    }

    /// Returns the move history.
    pub fn history(&self) -> &[Position] {
        &self.history
    }

    /// Returns the completed line, if the game was won.
    pub fn winning_line(&self) -> Option<[Position; 3]> {
        winning_line(&self.board).map(|(_, line)| line)
    }

    /// Places the current mark at `pos` and re-evaluates the board.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::GameOver`] after a win or draw and
    /// [`MoveError::SquareOccupied`] if `pos` is taken.
    #[instrument(skip(self), fields(player = %self.to_move))]
    pub fn make_move(&mut self, pos: Position) -> Result<Evaluation, MoveError> {
        if self.evaluation.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if !self.board.is_empty(pos) {
            return Err(MoveError::SquareOccupied(pos));
        }

        self.board.set(pos, Square::Occupied(self.to_move));
        self.history.push(pos);
        self.to_move = self.to_move.opponent();
        self.evaluation = evaluate(&self.board);

        if let Evaluation::Finished(outcome) = self.evaluation {
            info!(?outcome, moves = self.history.len(), "Game finished");
        } else {
            debug!(next = %self.to_move, "Move applied");
        }
        Ok(self.evaluation)
    }

    /// Clears the board for a new game.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::MatchOutcome;
    use super::*;

    fn play(game: &mut Game, moves: &[usize]) -> Evaluation {
        let mut last = Evaluation::InProgress;
        for &idx in moves {
            let pos = Position::from_index(idx).unwrap();
            last = game.make_move(pos).unwrap();
        }
        last
    }

    #[test]
    fn test_alternating_turns() {
        let mut game = Game::new();
        assert_eq!(game.to_move(), Mark::X);
        play(&mut game, &[4]);
        assert_eq!(game.to_move(), Mark::O);
        assert_eq!(game.board().get(Position::Center), Square::Occupied(Mark::X));
    }

    #[test]
    fn test_occupied_square_rejected() {
        let mut game = Game::new();
        play(&mut game, &[0]);
        assert_eq!(
            game.make_move(Position::TopLeft),
            Err(MoveError::SquareOccupied(Position::TopLeft))
        );
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_x_wins_top_row() {
        let mut game = Game::new();
        let result = play(&mut game, &[0, 3, 1, 4, 2]);
        assert_eq!(result, Evaluation::Finished(MatchOutcome::Win(Mark::X)));
        assert_eq!(
            game.winning_line(),
            Some([Position::TopLeft, Position::TopCenter, Position::TopRight])
        );
        assert_eq!(game.make_move(Position::BottomRight), Err(MoveError::GameOver));
    }

    #[test]
    fn test_draw() {
        let mut game = Game::new();
        let result = play(&mut game, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(result, Evaluation::Finished(MatchOutcome::Draw));
        assert_eq!(game.winning_line(), None);
    }

    #[test]
    fn test_reset() {
        let mut game = Game::new();
        play(&mut game, &[0, 3, 1, 4, 2]);
        game.reset();
        assert_eq!(game.evaluation(), Evaluation::InProgress);
        assert!(game.history().is_empty());
        assert_eq!(game.to_move(), Mark::X);
    }
}
