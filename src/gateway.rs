//! Data-access boundary used by the settlement services.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::db::{AuditEvent, ClaimInsert, DbError, GameRepository, NewGift};
use crate::games::tictactoe::{Mark, MatchOutcome};
use crate::progression::PlayerStats;
use crate::redeem::{Balances, RedeemCodeDefinition, RedemptionRecord, Reward};

/// Store operations the settlement services rely on.
///
/// Implementations must reject a second claim for the same `(user, code)`
/// pair in [`insert_claim`](ProfileGateway::insert_claim), including under
/// concurrent callers. Writes that take a `deadline` must not commit after
/// it: the caller has already reported them as failed.
#[async_trait]
pub trait ProfileGateway: Send + Sync + std::fmt::Debug {
    /// Loads the balances of a player.
    async fn get_balances(&self, user_id: i32) -> Result<Balances, DbError>;

    /// Loads the stats of a player.
    async fn get_stats_by_user(&self, user_id: i32) -> Result<PlayerStats, DbError>;

    /// Persists new stats for a player.
    async fn update_stats(&self, user_id: i32, stats: PlayerStats) -> Result<(), DbError>;

    /// Applies a finished match to the stored stats and returns them.
    ///
    /// The default reads and writes in two calls, so a concurrent write to
    /// the same row can be lost in between. Stores with other writers
    /// override it with an atomic update.
    async fn settle_stats(
        &self,
        user_id: i32,
        outcome: MatchOutcome,
        local: Mark,
        deadline: Instant,
    ) -> Result<PlayerStats, DbError> {
        let next = self
            .get_stats_by_user(user_id)
            .await?
            .apply_outcome(outcome, local);
        if Instant::now() > deadline {
            return Err(DbError::new("settle_stats passed its deadline before commit"));
        }
        self.update_stats(user_id, next.clone()).await?;
        Ok(next)
    }

    /// Looks up a redeem code by its string.
    async fn get_code_definition(
        &self,
        code: &str,
    ) -> Result<Option<RedeemCodeDefinition>, DbError>;

    /// Looks up an existing claim.
    async fn get_claim(
        &self,
        user_id: i32,
        code_id: i32,
    ) -> Result<Option<RedemptionRecord>, DbError>;

    /// Writes a claim and credits `reward` to the balances stored at commit time.
    async fn insert_claim(
        &self,
        record: RedemptionRecord,
        reward: Reward,
        deadline: Instant,
    ) -> Result<ClaimInsert, DbError>;

    /// Appends an audit row.
    async fn append_event(&self, event: AuditEvent) -> Result<(), DbError>;

    /// Credits an administrative gift and records it.
    async fn apply_gift(&self, gift: NewGift, deadline: Instant) -> Result<Balances, DbError>;
}

/// Runs a blocking repository call off the async runtime.
///
/// Dropping the returned future does not stop the call; writes guard
/// themselves with their deadline.
async fn blocking<T, F>(repo: &GameRepository, f: F) -> Result<T, DbError>
where
    T: Send + 'static,
    F: FnOnce(&GameRepository) -> Result<T, DbError> + Send + 'static,
{
    let repo = repo.clone();
    tokio::task::spawn_blocking(move || f(&repo))
        .await
        .map_err(|e| DbError::new(format!("Database task failed: {}", e)))?
}

#[async_trait]
impl ProfileGateway for GameRepository {
    #[instrument(skip(self))]
    async fn get_balances(&self, user_id: i32) -> Result<Balances, DbError> {
        blocking(self, move |repo| repo.get_balances(user_id)).await
    }

    #[instrument(skip(self))]
    async fn get_stats_by_user(&self, user_id: i32) -> Result<PlayerStats, DbError> {
        blocking(self, move |repo| repo.get_stats(user_id)).await
    }

    #[instrument(skip(self, stats))]
    async fn update_stats(&self, user_id: i32, stats: PlayerStats) -> Result<(), DbError> {
        blocking(self, move |repo| repo.update_stats(user_id, &stats)).await
    }

    #[instrument(skip(self, deadline))]
    async fn settle_stats(
        &self,
        user_id: i32,
        outcome: MatchOutcome,
        local: Mark,
        deadline: Instant,
    ) -> Result<PlayerStats, DbError> {
        blocking(self, move |repo| {
            repo.settle_stats(user_id, outcome, local, deadline)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_code_definition(
        &self,
        code: &str,
    ) -> Result<Option<RedeemCodeDefinition>, DbError> {
        let code = code.to_string();
        blocking(self, move |repo| repo.find_code(&code)).await
    }

    #[instrument(skip(self))]
    async fn get_claim(
        &self,
        user_id: i32,
        code_id: i32,
    ) -> Result<Option<RedemptionRecord>, DbError> {
        blocking(self, move |repo| repo.find_claim(user_id, code_id)).await
    }

    #[instrument(skip(self, record, reward, deadline))]
    async fn insert_claim(
        &self,
        record: RedemptionRecord,
        reward: Reward,
        deadline: Instant,
    ) -> Result<ClaimInsert, DbError> {
        blocking(self, move |repo| repo.insert_claim(&record, &reward, deadline)).await
    }

    #[instrument(skip(self, event), fields(kind = event.kind()))]
    async fn append_event(&self, event: AuditEvent) -> Result<(), DbError> {
        debug!("Appending audit event");
        blocking(self, move |repo| repo.append_event(&event)).await
    }

    #[instrument(skip(self, gift, deadline))]
    async fn apply_gift(&self, gift: NewGift, deadline: Instant) -> Result<Balances, DbError> {
        blocking(self, move |repo| repo.apply_gift(&gift, deadline)).await
    }
}
