//! Settlement services at the store boundary.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::ArenaConfig;
use crate::db::{AuditEvent, ClaimInsert, DbError, GameRepository, NewGameResult, NewGift};
use crate::feed::{ProfileChange, ProfileFeed, ProfileUpdate};
use crate::games::tictactoe::{Mark, MatchOutcome};
use crate::gateway::ProfileGateway;
use crate::progression::{GameOutcome, PlayerStats};
use crate::redeem::{
    Balances, GiftKind, RedeemCodeDefinition, RedemptionHistory, RedemptionRecord, Settlement,
    describe_reward, normalize_code, redeem,
};
use crate::session::Session;
use crate::SettlementError;

/// A successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct Redemption {
    definition: RedeemCodeDefinition,
    settlement: Settlement,
}

impl Redemption {
    /// Player-facing description of the granted reward.
    pub fn description(&self) -> String {
        describe_reward(self.definition.reward())
    }
}

/// Turns finished matches, redeem codes and gifts into persisted changes.
///
/// Every store call is bounded by the configured timeout; expiry is reported
/// as [`SettlementError::Persistence`]. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ProfileService {
    gateway: Arc<dyn ProfileGateway>,
    feed: ProfileFeed,
    timeout: Duration,
}

impl ProfileService {
    /// Creates a service over `gateway`.
    #[instrument(skip(gateway, feed))]
    pub fn new(gateway: Arc<dyn ProfileGateway>, feed: ProfileFeed, timeout: Duration) -> Self {
        info!("Creating ProfileService");
        Self {
            gateway,
            feed,
            timeout,
        }
    }

    /// Creates a service over a SQLite repository using `config`.
    pub fn from_config(repository: GameRepository, config: &ArenaConfig) -> Self {
        Self::new(
            Arc::new(repository),
            ProfileFeed::new(*config.feed_capacity()),
            config.gateway_timeout(),
        )
    }

    /// Returns the profile change feed.
    pub fn feed(&self) -> &ProfileFeed {
        &self.feed
    }

    /// Runs one gateway call under the timeout.
    async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, SettlementError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| self.store_failure(op, e)),
            Err(_) => Err(self.timed_out(op)),
        }
    }

    /// Deadline handed to a write started now.
    fn write_deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }

    fn store_failure(&self, op: &'static str, err: DbError) -> SettlementError {
        warn!(op, error = %err, "Gateway call failed");
        SettlementError::Persistence(err)
    }

    fn timed_out(&self, op: &'static str) -> SettlementError {
        warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Gateway call timed out");
        SettlementError::Persistence(DbError::new(format!(
            "{} timed out after {} ms",
            op,
            self.timeout.as_millis()
        )))
    }

    /// Decides an `insert_claim` whose reply did not arrive in time.
    ///
    /// The write may have committed anyway, so the stored claim is the
    /// answer: our own record means the reward was granted, another record
    /// means someone else won the race.
    async fn reconcile_claim(
        &self,
        record: &RedemptionRecord,
    ) -> Result<ClaimInsert, SettlementError> {
        let user_id = *record.user_id();
        let code_id = *record.code_id();
        debug!(user_id, code_id, "Reconciling timed-out claim");

        let stored = self
            .call("get_claim", self.gateway.get_claim(user_id, code_id))
            .await?;
        match stored {
            Some(claim) if claim == *record => {
                let balances = self
                    .call("get_balances", self.gateway.get_balances(user_id))
                    .await?;
                info!("Claim committed despite timeout");
                Ok(ClaimInsert::Inserted(balances))
            }
            Some(_) => Ok(ClaimInsert::AlreadyClaimed),
            None => Err(self.timed_out("insert_claim")),
        }
    }

    /// Records a finished match for the session's player and returns the new stats.
    ///
    /// The result event is appended first, then the store applies the
    /// outcome to its current stats in one step. A failure leaves whatever
    /// was already written in place; the caller decides whether to report it.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotAuthenticated`] without a session, otherwise
    /// [`SettlementError::Persistence`] for any store failure.
    #[instrument(skip(self, session), fields(user_id = session.map(|s| *s.user_id())))]
    pub async fn settle_match(
        &self,
        session: Option<&Session>,
        outcome: MatchOutcome,
        local: Mark,
        moves_count: usize,
    ) -> Result<PlayerStats, SettlementError> {
        let session = session.ok_or(SettlementError::NotAuthenticated)?;
        let user_id = *session.user_id();
        let result = GameOutcome::for_mark(outcome, local);
        debug!(?result, "Settling match");

        let moves_count = i32::try_from(moves_count)
            .map_err(|_| SettlementError::validation("Move count out of range"))?;
        let event = AuditEvent::GameResult(NewGameResult::tictactoe(user_id, result, moves_count));
        self.call("append_event", self.gateway.append_event(event))
            .await?;

        let next = self
            .call(
                "settle_stats",
                self.gateway
                    .settle_stats(user_id, outcome, local, self.write_deadline()),
            )
            .await?;

        info!(
            points = next.points_total(),
            tier = %next.tier(),
            "Match settled"
        );
        self.feed.publish(ProfileUpdate {
            user_id,
            change: ProfileChange::Stats(next.clone()),
        });
        Ok(next)
    }

    /// Redeems `code` for the session's player.
    ///
    /// Every attempt, successful or not, is added to `history`.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::Validation`] for blank input
    /// - [`SettlementError::NotAuthenticated`] without a session
    /// - [`SettlementError::UnknownCode`] if no such code exists
    /// - [`SettlementError::AlreadyRedeemed`] if the player claimed it before
    /// - [`SettlementError::Persistence`] for any store failure
    #[instrument(skip(self, session, history), fields(user_id = session.map(|s| *s.user_id())))]
    pub async fn redeem_code(
        &self,
        session: Option<&Session>,
        code: &str,
        history: &mut RedemptionHistory,
    ) -> Result<Redemption, SettlementError> {
        let attempt = self.try_redeem(session, code).await;
        let at = Utc::now().naive_utc();
        match &attempt {
            Ok(redemption) => {
                info!(description = %redemption.description(), "Code redeemed");
                history.record_success(code.trim(), redemption.definition.kind(), at);
            }
            Err(e) => {
                warn!(error = %e, "Redemption failed");
                history.record_failure(code.trim(), e, at);
            }
        }
        attempt
    }

    async fn try_redeem(
        &self,
        session: Option<&Session>,
        code: &str,
    ) -> Result<Redemption, SettlementError> {
        let code = normalize_code(code)?;
        let session = session.ok_or(SettlementError::NotAuthenticated)?;
        let user_id = *session.user_id();

        let definition = self
            .call("get_code_definition", self.gateway.get_code_definition(code))
            .await?
            .ok_or(SettlementError::UnknownCode)?;
        let prior_claim = self
            .call("get_claim", self.gateway.get_claim(user_id, *definition.id()))
            .await?;
        let prior = self
            .call("get_balances", self.gateway.get_balances(user_id))
            .await?;

        let settlement = redeem(
            code,
            user_id,
            Some(&definition),
            &prior,
            prior_claim.as_ref(),
            Utc::now().naive_utc(),
        )?;

        let insert = self.gateway.insert_claim(
            settlement.record().clone(),
            definition.reward().clone(),
            self.write_deadline(),
        );
        let stored = match tokio::time::timeout(self.timeout, insert).await {
            Ok(result) => result.map_err(|e| self.store_failure("insert_claim", e))?,
            Err(_) => self.reconcile_claim(settlement.record()).await?,
        };
        let settlement = match stored {
            ClaimInsert::Inserted(balances) => settlement.with_new_balances(balances),
            ClaimInsert::AlreadyClaimed => return Err(SettlementError::AlreadyRedeemed),
        };

        self.feed.publish(ProfileUpdate {
            user_id,
            change: ProfileChange::Balances(settlement.new_balances().clone()),
        });
        Ok(Redemption {
            definition,
            settlement,
        })
    }

    /// Credits an administrative gift of `amount` to `user_id`.
    ///
    /// # Errors
    ///
    /// [`SettlementError::Validation`] for a non-positive amount or blank
    /// sender, otherwise [`SettlementError::Persistence`].
    #[instrument(skip(self))]
    pub async fn send_gift(
        &self,
        user_id: i32,
        kind: GiftKind,
        amount: i64,
        sent_by: &str,
    ) -> Result<Balances, SettlementError> {
        if amount <= 0 {
            return Err(SettlementError::validation(format!(
                "Gift amount must be positive, got {amount}"
            )));
        }
        if sent_by.trim().is_empty() {
            return Err(SettlementError::validation("Gift sender must not be empty"));
        }

        let gift = NewGift::new(user_id, kind, amount, sent_by.trim().to_string());
        let balances = self
            .call(
                "apply_gift",
                self.gateway.apply_gift(gift, self.write_deadline()),
            )
            .await?;

        info!(%kind, amount, "Gift sent");
        self.feed.publish(ProfileUpdate {
            user_id,
            change: ProfileChange::Balances(balances.clone()),
        });
        Ok(balances)
    }
}
