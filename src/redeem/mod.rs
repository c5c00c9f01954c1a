//! Redeem codes: definitions, settlement and attempt history.

mod codes;
mod history;
mod settlement;
mod types;

pub use codes::{
    DEFAULT_ALL_REWARDS_AMOUNT, DEFAULT_GOLD_AMOUNT, DEFAULT_JEWELS_AMOUNT, DEFAULT_VIP_TIER,
    reward_for,
};
pub use history::{AttemptStatus, HistoryEntry, RedemptionHistory};
pub use settlement::{
    ALL_REWARDS_GEM_BONUS, ALL_REWARDS_VIP_TIER, Settlement, apply_reward, describe_reward,
    normalize_code, redeem,
};
pub use types::{
    Balances, GiftKind, RedeemCodeDefinition, RedemptionRecord, Reward, RewardKind,
};
