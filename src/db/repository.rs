//! Database repository for profiles, game results and rewards.

use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{BalancesChangeset, NewCodeRedemption, StatsChangeset};
use crate::db::{
    AuditEvent, CodeRedemption, DbError, GameResult, Gift, NewGift, NewProfile, NewRedeemCode,
    Profile, RedeemCodeRow, schema,
};
use crate::games::tictactoe::{Mark, MatchOutcome};
use crate::progression::{AggregatedStats, PlayerStats};
use crate::redeem::{Balances, RedeemCodeDefinition, RedemptionRecord, Reward, apply_reward};

/// How long a connection waits for another writer's lock, in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Result of trying to store a redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimInsert {
    /// The claim was committed together with these balances.
    Inserted(Balances),
    /// A claim for this user and code already exists; nothing was written.
    AlreadyClaimed,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Fails the surrounding transaction once `deadline` has passed.
fn check_deadline(op: &str, deadline: Instant) -> Result<(), DbError> {
    if Instant::now() > deadline {
        warn!(op, "Deadline passed before commit, rolling back");
        return Err(DbError::new(format!("{} passed its deadline before commit", op)));
    }
    Ok(())
}

/// Database repository for profile and reward operations.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository connected to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path must not be empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Returns the database path.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }

    /// Creates a new profile with zero stats, zero balances and tier Bronze.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the username is already taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_profile(&self, username: String) -> Result<Profile, DbError> {
        debug!(username = %username, "Creating profile");
        let mut conn = self.connection()?;

        let profile = diesel::insert_into(schema::profiles::table)
            .values(&NewProfile::new(username))
            .returning(Profile::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = profile.id(), username = %profile.username(), "Profile created");
        Ok(profile)
    }

    /// Gets a profile by username. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_profile_by_name(&self, username: &str) -> Result<Option<Profile>, DbError> {
        debug!(username = %username, "Looking up profile by name");
        let mut conn = self.connection()?;

        let profile = schema::profiles::table
            .filter(schema::profiles::username.eq(username))
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;

        if let Some(ref p) = profile {
            debug!(user_id = p.id(), "Profile found");
        } else {
            debug!("Profile not found");
        }

        Ok(profile)
    }

    /// Lists all profiles, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_profiles(&self) -> Result<Vec<Profile>, DbError> {
        let mut conn = self.connection()?;
        let profiles = schema::profiles::table
            .order(schema::profiles::username.asc())
            .select(Profile::as_select())
            .load(&mut conn)?;
        info!(count = profiles.len(), "Profiles loaded");
        Ok(profiles)
    }

    fn require_profile(conn: &mut SqliteConnection, user_id: i32) -> Result<Profile, DbError> {
        schema::profiles::table
            .find(user_id)
            .select(Profile::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::new(format!("Profile {} not found", user_id)))
    }

    /// Gets the stats of a player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the profile does not exist or a database error occurs.
    #[instrument(skip(self))]
    pub fn get_stats(&self, user_id: i32) -> Result<PlayerStats, DbError> {
        let mut conn = self.connection()?;
        Self::require_profile(&mut conn, user_id)?.stats()
    }

    /// Overwrites the stats of a player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the profile does not exist or a database error occurs.
    #[instrument(skip(self, stats), fields(points = stats.points_total(), tier = %stats.tier()))]
    pub fn update_stats(&self, user_id: i32, stats: &PlayerStats) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let updated = diesel::update(schema::profiles::table.find(user_id))
            .set(&StatsChangeset::new(stats, now()))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DbError::new(format!("Profile {} not found", user_id)));
        }
        info!(user_id, "Stats updated");
        Ok(())
    }

    /// Applies a finished match to the stored stats and returns them.
    ///
    /// The read and the write share one immediate transaction, so a gift or
    /// another settlement committed concurrently is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the profile does not exist, `deadline` passes
    /// before commit, or a database error occurs.
    #[instrument(skip(self, deadline))]
    pub fn settle_stats(
        &self,
        user_id: i32,
        outcome: MatchOutcome,
        local: Mark,
        deadline: Instant,
    ) -> Result<PlayerStats, DbError> {
        let mut conn = self.connection()?;
        let next = conn.immediate_transaction::<PlayerStats, DbError, _>(|conn| {
            let next = Self::require_profile(conn, user_id)?
                .stats()?
                .apply_outcome(outcome, local);
            diesel::update(schema::profiles::table.find(user_id))
                .set(&StatsChangeset::new(&next, now()))
                .execute(conn)?;
            check_deadline("settle_stats", deadline)?;
            Ok(next)
        })?;

        info!(points = next.points_total(), tier = %next.tier(), "Stats settled");
        Ok(next)
    }

    /// Gets the balances of a player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the profile does not exist or a database error occurs.
    #[instrument(skip(self))]
    pub fn get_balances(&self, user_id: i32) -> Result<Balances, DbError> {
        let mut conn = self.connection()?;
        Ok(Self::require_profile(&mut conn, user_id)?.balances())
    }

    /// Gets all game results for a player, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_game_history(&self, user_id: i32) -> Result<Vec<GameResult>, DbError> {
        let mut conn = self.connection()?;
        let results = schema::game_results::table
            .filter(schema::game_results::user_id.eq(user_id))
            .order((
                schema::game_results::created_at.desc(),
                schema::game_results::id.desc(),
            ))
            .select(GameResult::as_select())
            .load(&mut conn)?;
        debug!(count = results.len(), "Game history loaded");
        Ok(results)
    }

    /// Gets aggregated win/loss/draw counts for a player.
    ///
    /// Rows with an unknown result are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_aggregated_stats(&self, user_id: i32) -> Result<AggregatedStats, DbError> {
        let history = self.get_game_history(user_id)?;
        let outcomes = history.iter().filter_map(|row| match row.parse_outcome() {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(result_id = row.id(), error = %e, "Skipping unknown result");
                None
            }
        });
        let aggregated = AggregatedStats::from_outcomes(outcomes);

        info!(
            user_id,
            total = aggregated.total_games(),
            win_rate = %format!("{:.1}%", aggregated.win_rate()),
            "Aggregated stats computed"
        );
        Ok(aggregated)
    }

    /// Stores a new redeem code.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the code already exists or a database error occurs.
    #[instrument(skip(self, code), fields(code = %code.code(), kind = %code.kind()))]
    pub fn create_redeem_code(&self, code: &NewRedeemCode) -> Result<RedeemCodeDefinition, DbError> {
        let mut conn = self.connection()?;
        let row = diesel::insert_into(schema::redeem_codes::table)
            .values(code)
            .returning(RedeemCodeRow::as_returning())
            .get_result(&mut conn)?;
        info!(code_id = row.id(), "Redeem code created");
        row.to_definition()
    }

    /// Looks up a redeem code by its exact string.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or the stored row is malformed.
    #[instrument(skip(self))]
    pub fn find_code(&self, code: &str) -> Result<Option<RedeemCodeDefinition>, DbError> {
        let mut conn = self.connection()?;
        let row = schema::redeem_codes::table
            .filter(schema::redeem_codes::code.eq(code))
            .select(RedeemCodeRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.as_ref().map(RedeemCodeRow::to_definition).transpose()
    }

    /// Looks up the claim of `code_id` by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_claim(&self, user_id: i32, code_id: i32) -> Result<Option<RedemptionRecord>, DbError> {
        let mut conn = self.connection()?;
        let row = schema::code_redemptions::table
            .filter(schema::code_redemptions::user_id.eq(user_id))
            .filter(schema::code_redemptions::code_id.eq(code_id))
            .select(CodeRedemption::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(RedemptionRecord::from))
    }

    /// Lists every claim made by a player, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_claims(&self, user_id: i32) -> Result<Vec<RedemptionRecord>, DbError> {
        let mut conn = self.connection()?;
        let rows = schema::code_redemptions::table
            .filter(schema::code_redemptions::user_id.eq(user_id))
            .order(schema::code_redemptions::id.asc())
            .select(CodeRedemption::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(RedemptionRecord::from).collect())
    }

    /// Stores a claim and credits its reward in one transaction.
    ///
    /// The reward is applied to balances read inside the transaction, not to
    /// any earlier read. The unique `(user_id, code_id)` index decides races:
    /// the losing writer gets [`ClaimInsert::AlreadyClaimed`] and nothing is
    /// credited.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the profile does not exist, `deadline` passes
    /// before commit, or a database error occurs.
    #[instrument(skip(self, record, reward, deadline), fields(user_id = record.user_id(), code_id = record.code_id()))]
    pub fn insert_claim(
        &self,
        record: &RedemptionRecord,
        reward: &Reward,
        deadline: Instant,
    ) -> Result<ClaimInsert, DbError> {
        let mut conn = self.connection()?;
        let user_id = *record.user_id();

        let outcome = conn.immediate_transaction::<ClaimInsert, DbError, _>(|conn| {
            let inserted = diesel::insert_into(schema::code_redemptions::table)
                .values(&NewCodeRedemption::from(record))
                .execute(conn);

            match inserted {
                Ok(_) => {}
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    return Ok(ClaimInsert::AlreadyClaimed);
                }
                Err(e) => return Err(e.into()),
            }

            let prior = Self::require_profile(conn, user_id)?.balances();
            let balances = apply_reward(&prior, reward);
            diesel::update(schema::profiles::table.find(user_id))
                .set(&BalancesChangeset::new(&balances, now()))
                .execute(conn)?;
            check_deadline("insert_claim", deadline)?;
            Ok(ClaimInsert::Inserted(balances))
        })?;

        match &outcome {
            ClaimInsert::Inserted(balances) => info!(?balances, "Claim committed"),
            ClaimInsert::AlreadyClaimed => warn!("Duplicate claim rejected by store"),
        }
        Ok(outcome)
    }

    /// Credits a gift to a player and records it, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the profile does not exist, `deadline` passes
    /// before commit, or a database error occurs.
    #[instrument(skip(self, gift, deadline), fields(user_id = gift.user_id(), amount = gift.amount()))]
    pub fn apply_gift(&self, gift: &NewGift, deadline: Instant) -> Result<Balances, DbError> {
        let kind = gift.kind()?;
        let mut conn = self.connection()?;
        let user_id = *gift.user_id();
        let event = AuditEvent::Gift(gift.clone());

        let balances = conn.immediate_transaction::<Balances, DbError, _>(|conn| {
            let prior = Self::require_profile(conn, user_id)?.balances();
            let balances = kind.credit(prior, *gift.amount());

            diesel::update(schema::profiles::table.find(user_id))
                .set(&BalancesChangeset::new(&balances, now()))
                .execute(conn)?;
            Self::insert_event(conn, &event)?;
            check_deadline("apply_gift", deadline)?;
            Ok(balances)
        })?;

        info!(%kind, "Gift applied");
        Ok(balances)
    }

    /// Lists gifts received by a player, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_gifts(&self, user_id: i32) -> Result<Vec<Gift>, DbError> {
        let mut conn = self.connection()?;
        let gifts = schema::gifts::table
            .filter(schema::gifts::user_id.eq(user_id))
            .order(schema::gifts::id.desc())
            .select(Gift::as_select())
            .load(&mut conn)?;
        Ok(gifts)
    }

    /// Appends an audit row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, event), fields(kind = event.kind()))]
    pub fn append_event(&self, event: &AuditEvent) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        Self::insert_event(&mut conn, event)?;
        debug!("Audit event appended");
        Ok(())
    }

    fn insert_event(conn: &mut SqliteConnection, event: &AuditEvent) -> Result<(), DbError> {
        match event {
            AuditEvent::GameResult(result) => {
                diesel::insert_into(schema::game_results::table)
                    .values(result)
                    .execute(conn)?;
            }
            AuditEvent::Gift(gift) => {
                diesel::insert_into(schema::gifts::table)
                    .values(gift)
                    .execute(conn)?;
            }
        }
        Ok(())
    }
}
