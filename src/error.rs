//! Settlement error taxonomy.

use derive_more::{Display, Error};

use crate::db::DbError;
use crate::games::tictactoe::BoardError;

/// Why a game or redeem settlement failed.
#[derive(Debug, Clone, Display, Error)]
pub enum SettlementError {
    /// No redeem code with that string exists.
    #[display("Invalid code or code does not exist")]
    UnknownCode,
    /// The claimant already redeemed this code.
    #[display("You have already redeemed this code")]
    AlreadyRedeemed,
    /// Missing, empty or malformed input.
    #[display("Validation error: {}", _0)]
    Validation(#[error(not(source))] String),
    /// The store failed, timed out or was unreachable.
    #[display("Persistence error: {}", _0)]
    Persistence(DbError),
    /// No active session.
    #[display("You must be logged in to do that")]
    NotAuthenticated,
}

impl SettlementError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<DbError> for SettlementError {
    fn from(err: DbError) -> Self {
        Self::Persistence(err)
    }
}

impl From<BoardError> for SettlementError {
    fn from(err: BoardError) -> Self {
        Self::Validation(err.to_string())
    }
}
