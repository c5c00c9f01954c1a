//! Player sessions and locally played matches.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::db::Profile;
use crate::games::tictactoe::{Evaluation, Game, Mark, MoveError, Position};
use crate::profile_service::ProfileService;
use crate::progression::PlayerStats;
use crate::SettlementError;

/// An authenticated player.
///
/// Passed explicitly to every operation that acts on behalf of a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize, new)]
pub struct Session {
    user_id: i32,
    username: String,
}

impl From<&Profile> for Session {
    fn from(profile: &Profile) -> Self {
        Self::new(*profile.id(), profile.username().clone())
    }
}

/// What happened after one move.
#[derive(Debug, Clone)]
pub struct MoveReport {
    /// Board evaluation after the move.
    pub evaluation: Evaluation,
    /// Settlement of a finished match. `None` while the match continues or
    /// when no player is signed in.
    pub settlement: Option<Result<PlayerStats, SettlementError>>,
}

/// A hot-seat match on one device, settled for the signed-in player.
#[derive(Debug, Clone, Getters)]
pub struct LocalMatch {
    game: Game,
    local_mark: Mark,
    session: Option<Session>,
}

impl LocalMatch {
    /// Starts a match where the signed-in player (if any) holds `local_mark`.
    #[instrument]
    pub fn new(session: Option<Session>, local_mark: Mark) -> Self {
        Self {
            game: Game::new(),
            local_mark,
            session,
        }
    }

    /// Plays the next mark at `pos`.
    ///
    /// On a win or draw the match is settled through `service`. A failed
    /// settlement does not undo the move; it is logged and returned in the
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the move is illegal.
    #[instrument(skip(self, service))]
    pub async fn play(
        &mut self,
        pos: Position,
        service: &ProfileService,
    ) -> Result<MoveReport, MoveError> {
        let evaluation = self.game.make_move(pos)?;

        let settlement = match (evaluation, &self.session) {
            (Evaluation::Finished(outcome), Some(session)) => {
                let result = service
                    .settle_match(
                        Some(session),
                        outcome,
                        self.local_mark,
                        self.game.history().len(),
                    )
                    .await;
                if let Err(e) = &result {
                    warn!(error = %e, "Error updating game statistics");
                }
                Some(result)
            }
            (Evaluation::Finished(outcome), None) => {
                info!(?outcome, "Guest match finished, nothing to settle");
                None
            }
            (Evaluation::InProgress, _) => None,
        };

        Ok(MoveReport {
            evaluation,
            settlement,
        })
    }

    /// Clears the board for another match with the same players.
    pub fn new_game(&mut self) {
        self.game.reset();
    }
}
