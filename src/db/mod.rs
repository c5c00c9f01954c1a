//! Database persistence layer for profiles, game results and rewards.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

use diesel::{Connection, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, instrument};

pub use error::DbError;
pub use models::{
    AuditEvent, CodeRedemption, GameResult, Gift, NewGameResult, NewGift, NewProfile,
    NewRedeemCode, Profile, RedeemCodeRow,
};
pub use repository::{ClaimInsert, GameRepository};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies all pending schema migrations to the database at `db_path`.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or a migration fails.
#[instrument]
pub fn run_migrations(db_path: &str) -> Result<(), DbError> {
    let mut conn = SqliteConnection::establish(db_path)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::new(format!("Migrations failed: {}", e)))?;
    info!(count = applied.len(), "Migrations applied");
    Ok(())
}
