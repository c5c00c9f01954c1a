//! Shared fixtures for service-level tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use tictactoe_arena::{
    AuditEvent, Balances, ClaimInsert, DbError, GameRepository, GiftKind, Mark, MatchOutcome,
    NewGift, NewRedeemCode, PlayerStats, ProfileFeed, ProfileGateway, ProfileService,
    RedeemCodeDefinition, RedemptionRecord, Reward, Session, run_migrations,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
pub fn setup_test_db() -> (NamedTempFile, GameRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    run_migrations(&db_path).expect("Migrations failed");
    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    (db_file, repo)
}

/// A write deadline far enough out to never trigger.
pub fn far_deadline() -> Instant {
    Instant::now() + Duration::from_secs(30)
}

/// Service over `gateway` with a generous timeout.
pub fn service_over(gateway: Arc<dyn ProfileGateway>) -> ProfileService {
    service_with_timeout(gateway, Duration::from_secs(5))
}

/// Service over `gateway` with the given per-call timeout.
pub fn service_with_timeout(gateway: Arc<dyn ProfileGateway>, timeout: Duration) -> ProfileService {
    ProfileService::new(gateway, ProfileFeed::new(16), timeout)
}

/// Creates a profile and returns a session for it.
pub fn sign_up(repo: &GameRepository, username: &str) -> Session {
    let profile = repo
        .create_profile(username.to_string())
        .expect("Create profile failed");
    Session::from(&profile)
}

/// Stores a redeem code.
pub fn add_code(repo: &GameRepository, code: &str, reward: Reward) -> RedeemCodeDefinition {
    repo.create_redeem_code(&NewRedeemCode::new(code.to_string(), &reward))
        .expect("Create code failed")
}

/// Credits `amount` gold to `user_id` directly in the store.
pub fn gift_gold(repo: &GameRepository, user_id: i32, amount: i64) {
    repo.apply_gift(
        &NewGift::new(user_id, GiftKind::Gold, amount, "admin".to_string()),
        far_deadline(),
    )
    .expect("Gift failed");
}

/// Misbehavior injected by [`FlakyGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `settle_stats` fails.
    FailSettleStats,
    /// `insert_claim` fails without writing.
    FailInsertClaim,
    /// `get_balances` fails.
    FailGetBalances,
    /// Another writer credits this much gold right after `get_balances`.
    GiftAfterGetBalances(i64),
    /// `get_claim` never sees an existing claim.
    HideClaims,
    /// `insert_claim` commits, then its reply is delayed.
    SlowClaimReply(Duration),
    /// `insert_claim` blocks this long before it starts writing.
    LateClaimWrite(Duration),
}

/// Delegates to a real repository but misbehaves in one way.
#[derive(Debug)]
pub struct FlakyGateway {
    inner: GameRepository,
    fault: Fault,
    failures: AtomicUsize,
}

impl FlakyGateway {
    pub fn new(inner: GameRepository, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            failures: AtomicUsize::new(0),
        }
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn fail_if(&self, fault: Fault) -> Result<(), DbError> {
        if self.fault == fault {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(DbError::new("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileGateway for FlakyGateway {
    async fn get_balances(&self, user_id: i32) -> Result<Balances, DbError> {
        self.fail_if(Fault::FailGetBalances)?;
        let balances = ProfileGateway::get_balances(&self.inner, user_id).await?;
        if let Fault::GiftAfterGetBalances(amount) = self.fault {
            gift_gold(&self.inner, user_id, amount);
        }
        Ok(balances)
    }

    async fn get_stats_by_user(&self, user_id: i32) -> Result<PlayerStats, DbError> {
        ProfileGateway::get_stats_by_user(&self.inner, user_id).await
    }

    async fn update_stats(&self, user_id: i32, stats: PlayerStats) -> Result<(), DbError> {
        ProfileGateway::update_stats(&self.inner, user_id, stats).await
    }

    async fn settle_stats(
        &self,
        user_id: i32,
        outcome: MatchOutcome,
        local: Mark,
        deadline: Instant,
    ) -> Result<PlayerStats, DbError> {
        self.fail_if(Fault::FailSettleStats)?;
        ProfileGateway::settle_stats(&self.inner, user_id, outcome, local, deadline).await
    }

    async fn get_code_definition(
        &self,
        code: &str,
    ) -> Result<Option<RedeemCodeDefinition>, DbError> {
        ProfileGateway::get_code_definition(&self.inner, code).await
    }

    async fn get_claim(
        &self,
        user_id: i32,
        code_id: i32,
    ) -> Result<Option<RedemptionRecord>, DbError> {
        if self.fault == Fault::HideClaims {
            return Ok(None);
        }
        ProfileGateway::get_claim(&self.inner, user_id, code_id).await
    }

    async fn insert_claim(
        &self,
        record: RedemptionRecord,
        reward: Reward,
        deadline: Instant,
    ) -> Result<ClaimInsert, DbError> {
        self.fail_if(Fault::FailInsertClaim)?;
        match self.fault {
            Fault::SlowClaimReply(delay) => {
                let stored =
                    ProfileGateway::insert_claim(&self.inner, record, reward, deadline).await?;
                tokio::time::sleep(delay).await;
                Ok(stored)
            }
            Fault::LateClaimWrite(delay) => {
                let repo = self.inner.clone();
                tokio::task::spawn_blocking(move || {
                    std::thread::sleep(delay);
                    repo.insert_claim(&record, &reward, deadline)
                })
                .await
                .map_err(|e| DbError::new(e.to_string()))?
            }
            _ => ProfileGateway::insert_claim(&self.inner, record, reward, deadline).await,
        }
    }

    async fn append_event(&self, event: AuditEvent) -> Result<(), DbError> {
        ProfileGateway::append_event(&self.inner, event).await
    }

    async fn apply_gift(&self, gift: NewGift, deadline: Instant) -> Result<Balances, DbError> {
        ProfileGateway::apply_gift(&self.inner, gift, deadline).await
    }
}

/// Gateway whose every call hangs for `delay`.
///
/// Stats settle through the trait's default read-then-write.
#[derive(Debug)]
pub struct StalledGateway {
    pub delay: Duration,
}

impl StalledGateway {
    async fn stall<T>(&self) -> Result<T, DbError> {
        tokio::time::sleep(self.delay).await;
        Err(DbError::new("stalled call returned"))
    }
}

#[async_trait]
impl ProfileGateway for StalledGateway {
    async fn get_balances(&self, _user_id: i32) -> Result<Balances, DbError> {
        self.stall().await
    }

    async fn get_stats_by_user(&self, _user_id: i32) -> Result<PlayerStats, DbError> {
        self.stall().await
    }

    async fn update_stats(&self, _user_id: i32, _stats: PlayerStats) -> Result<(), DbError> {
        self.stall().await
    }

    async fn get_code_definition(
        &self,
        _code: &str,
    ) -> Result<Option<RedeemCodeDefinition>, DbError> {
        self.stall().await
    }

    async fn get_claim(
        &self,
        _user_id: i32,
        _code_id: i32,
    ) -> Result<Option<RedemptionRecord>, DbError> {
        self.stall().await
    }

    async fn insert_claim(
        &self,
        _record: RedemptionRecord,
        _reward: Reward,
        _deadline: Instant,
    ) -> Result<ClaimInsert, DbError> {
        self.stall().await
    }

    async fn append_event(&self, _event: AuditEvent) -> Result<(), DbError> {
        self.stall().await
    }

    async fn apply_gift(&self, _gift: NewGift, _deadline: Instant) -> Result<Balances, DbError> {
        self.stall().await
    }
}
