//! Tic-tac-toe arena library - match settlement, rank progression and rewards
//!
//! # Architecture
//!
//! - **Games**: board evaluation and the move engine (tic-tac-toe)
//! - **Progression**: points, win counts and rank tiers
//! - **Redeem**: reward codes, claim settlement and attempt history
//! - **Persistence**: SQLite store behind the [`ProfileGateway`] trait
//! - **Services**: [`ProfileService`] settles matches, codes and gifts with
//!   bounded store calls and publishes changes on a [`ProfileFeed`]
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_arena::{ArenaConfig, GameRepository, ProfileService, RedemptionHistory, Session};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ArenaConfig::default();
//! tictactoe_arena::run_migrations(config.database_path())?;
//! let repo = GameRepository::new(config.database_path().clone())?;
//! let profile = repo.create_profile("alice".to_string())?;
//!
//! let service = ProfileService::from_config(repo, &config);
//! let session = Session::from(&profile);
//! let mut history = RedemptionHistory::new();
//! let redemption = service.redeem_code(Some(&session), "WELCOME", &mut history).await?;
//! println!("{}", redemption.description());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod error;
mod feed;
mod games;
mod gateway;
mod profile_service;
mod progression;
mod redeem;
mod session;

// Crate-level exports - Configuration
pub use config::{ArenaConfig, ConfigError, DATABASE_PATH_ENV, GATEWAY_TIMEOUT_ENV};

// Crate-level exports - Errors
pub use error::SettlementError;

// Crate-level exports - Database
pub use db::{
    AuditEvent, ClaimInsert, CodeRedemption, DbError, GameRepository, GameResult, Gift,
    NewGameResult, NewGift, NewProfile, NewRedeemCode, Profile, RedeemCodeRow, run_migrations,
};

// Crate-level exports - Gateway and services
pub use feed::{ProfileChange, ProfileFeed, ProfileSubscription, ProfileUpdate};
pub use gateway::ProfileGateway;
pub use profile_service::{ProfileService, Redemption};
pub use session::{LocalMatch, MoveReport, Session};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{
    Board, BoardError, Evaluation, Game, LINES, Mark, MatchOutcome, MoveError, Position, Square,
    check_winner, evaluate, is_full, winning_line,
};

// Crate-level exports - Progression
pub use progression::{
    AggregatedStats, DRAW_POINTS, GameOutcome, InvalidOutcome, LOSS_POINTS, PlayerStats, Tier,
    WIN_POINTS, apply_outcome,
};

// Crate-level exports - Redeem codes
pub use redeem::{
    ALL_REWARDS_GEM_BONUS, ALL_REWARDS_VIP_TIER, AttemptStatus, Balances, DEFAULT_ALL_REWARDS_AMOUNT,
    DEFAULT_GOLD_AMOUNT, DEFAULT_JEWELS_AMOUNT, DEFAULT_VIP_TIER, GiftKind, HistoryEntry,
    RedeemCodeDefinition, RedemptionHistory, RedemptionRecord, Reward, RewardKind, Settlement,
    apply_reward, describe_reward, normalize_code, redeem, reward_for,
};
