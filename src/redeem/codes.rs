//! Reward defaults for newly created redeem codes.

use tracing::{instrument, warn};

use super::types::{Reward, RewardKind};
use crate::SettlementError;

/// Default gold granted by a gold code.
pub const DEFAULT_GOLD_AMOUNT: i64 = 500;
/// Default gems granted by a jewels code.
pub const DEFAULT_JEWELS_AMOUNT: i64 = 100;
/// Default gold granted by an all-rewards code.
pub const DEFAULT_ALL_REWARDS_AMOUNT: i64 = 1000;
/// VIP tier granted by VIP pass codes.
pub const DEFAULT_VIP_TIER: &str = "permanent";

/// Builds the reward for a new code of `kind`, optionally overriding the amount.
///
/// # Errors
///
/// Returns [`SettlementError::Validation`] for a negative amount.
#[instrument]
pub fn reward_for(kind: RewardKind, amount: Option<i64>) -> Result<Reward, SettlementError> {
    if let Some(amount) = amount
        && amount < 0
    {
        return Err(SettlementError::validation(format!(
            "Reward amount must not be negative, got {amount}"
        )));
    }

    let reward = match kind {
        RewardKind::Gold => Reward::Gold {
            amount: amount.unwrap_or(DEFAULT_GOLD_AMOUNT),
        },
        RewardKind::Jewels => Reward::Jewels {
            amount: amount.unwrap_or(DEFAULT_JEWELS_AMOUNT),
        },
        RewardKind::VipPass => {
            if amount.is_some() {
                warn!("Ignoring amount for VIP pass code");
            }
            Reward::VipPass {
                vip_tier: Some(DEFAULT_VIP_TIER.to_string()),
            }
        }
        RewardKind::AllRewards => Reward::AllRewards {
            amount: amount.unwrap_or(DEFAULT_ALL_REWARDS_AMOUNT),
        },
    };
    Ok(reward)
}
