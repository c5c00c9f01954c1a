//! Pure redeem-code settlement.

use chrono::NaiveDateTime;
use derive_getters::{Dissolve, Getters};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::types::{Balances, RedeemCodeDefinition, RedemptionRecord, Reward};
use crate::SettlementError;

/// Gems granted by an all-rewards code, regardless of its definition.
pub const ALL_REWARDS_GEM_BONUS: i64 = 200;

/// VIP tier granted by an all-rewards code, regardless of its definition.
pub const ALL_REWARDS_VIP_TIER: &str = "gold";

/// Successful claim: balances to persist and the record proving the claim.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Dissolve, Serialize)]
pub struct Settlement {
    new_balances: Balances,
    record: RedemptionRecord,
}

impl Settlement {
    /// Replaces the computed balances with the ones the store committed.
    pub fn with_new_balances(mut self, new_balances: Balances) -> Self {
        self.new_balances = new_balances;
        self
    }
}

/// Normalizes user input into a code string.
///
/// # Errors
///
/// Returns [`SettlementError::Validation`] for empty or blank input.
pub fn normalize_code(code: &str) -> Result<&str, SettlementError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(SettlementError::validation("Please enter a redeem code"));
    }
    Ok(code)
}

/// Applies a reward to prior balances.
pub fn apply_reward(prior: &Balances, reward: &Reward) -> Balances {
    let balances = prior.clone();
    match reward {
        Reward::Gold { amount } => balances.with_points_added(*amount),
        Reward::Jewels { amount } => balances.with_gems_added(*amount),
        Reward::VipPass { vip_tier } => balances.with_vip(vip_tier.clone()),
        Reward::AllRewards { amount } => balances
            .with_points_added(*amount)
            .with_gems_added(ALL_REWARDS_GEM_BONUS)
            .with_vip(Some(ALL_REWARDS_VIP_TIER.to_string())),
    }
}

/// Settles one claim of `code` by `claimant_id`.
///
/// `definition` is the stored code (absent if unknown) and `prior_claim` the
/// existing redemption record for this claimant and code, if any. Nothing is
/// written here; the caller persists the returned [`Settlement`].
///
/// # Errors
///
/// - [`SettlementError::Validation`] for blank input
/// - [`SettlementError::UnknownCode`] when `definition` is `None`
/// - [`SettlementError::AlreadyRedeemed`] when `prior_claim` is this pair's record
#[instrument(skip(definition, prior, prior_claim), fields(found = definition.is_some()))]
pub fn redeem(
    code: &str,
    claimant_id: i32,
    definition: Option<&RedeemCodeDefinition>,
    prior: &Balances,
    prior_claim: Option<&RedemptionRecord>,
    now: NaiveDateTime,
) -> Result<Settlement, SettlementError> {
    normalize_code(code)?;

    let definition = definition.ok_or(SettlementError::UnknownCode)?;

    match prior_claim {
        Some(claim) if claim.matches(claimant_id, *definition.id()) => {
            warn!(code_id = definition.id(), "Code already redeemed by claimant");
            return Err(SettlementError::AlreadyRedeemed);
        }
        Some(claim) => {
            warn!(
                claim_user = claim.user_id(),
                claim_code = claim.code_id(),
                "Ignoring claim record for a different user or code"
            );
        }
        None => {}
    }

    let new_balances = apply_reward(prior, definition.reward());
    let record = RedemptionRecord::new(claimant_id, *definition.id(), now);
    debug!(kind = %definition.kind(), ?new_balances, "Reward computed");

    Ok(Settlement {
        new_balances,
        record,
    })
}

/// Player-facing description of what a reward granted.
pub fn describe_reward(reward: &Reward) -> String {
    match reward {
        Reward::Gold { amount } => format!("{amount} X Gold"),
        Reward::Jewels { amount } => format!("{amount} Red Gems"),
        Reward::VipPass { vip_tier } => {
            format!("VIP Pass ({})", vip_tier.as_deref().unwrap_or("standard"))
        }
        Reward::AllRewards { .. } => "All Rewards (Gold, Gems & VIP Pass)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 8)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn code(id: i32, reward: Reward) -> RedeemCodeDefinition {
        RedeemCodeDefinition::new(id, format!("CODE{id}"), reward)
    }

    #[test]
    fn test_gold_adds_points() {
        let def = code(1, Reward::Gold { amount: 500 });
        let prior = Balances::new(20, 7, false, None);
        let settlement = redeem("CODE1", 9, Some(&def), &prior, None, now()).unwrap();
        assert_eq!(settlement.new_balances(), &Balances::new(520, 7, false, None));
        assert_eq!(settlement.record(), &RedemptionRecord::new(9, 1, now()));
    }

    #[test]
    fn test_jewels_adds_gems() {
        let def = code(2, Reward::Jewels { amount: 100 });
        let prior = Balances::new(20, 7, false, None);
        let settlement = redeem("CODE2", 9, Some(&def), &prior, None, now()).unwrap();
        assert_eq!(settlement.new_balances(), &Balances::new(20, 107, false, None));
    }

    #[test]
    fn test_vip_pass_sets_tier_from_definition() {
        let def = code(
            3,
            Reward::VipPass {
                vip_tier: Some("permanent".to_string()),
            },
        );
        let settlement =
            redeem("CODE3", 9, Some(&def), &Balances::default(), None, now()).unwrap();
        assert_eq!(
            settlement.new_balances(),
            &Balances::new(0, 0, true, Some("permanent".to_string()))
        );
    }

    #[test]
    fn test_all_rewards_uses_fixed_bonus_and_tier() {
        let def = code(4, Reward::AllRewards { amount: 1000 });
        let settlement =
            redeem("CODE4", 9, Some(&def), &Balances::default(), None, now()).unwrap();
        assert_eq!(
            settlement.new_balances(),
            &Balances::new(1000, 200, true, Some("gold".to_string()))
        );
    }

    #[test]
    fn test_unknown_code() {
        let result = redeem("NOPE", 9, None, &Balances::default(), None, now());
        assert!(matches!(result, Err(SettlementError::UnknownCode)));
    }

    #[test]
    fn test_blank_code_is_validation_error() {
        let def = code(1, Reward::Gold { amount: 500 });
        let result = redeem("   ", 9, Some(&def), &Balances::default(), None, now());
        assert!(matches!(result, Err(SettlementError::Validation(_))));
    }

    #[test]
    fn test_prior_claim_rejected() {
        let def = code(1, Reward::Gold { amount: 500 });
        let claim = RedemptionRecord::new(9, 1, now());
        let result = redeem("CODE1", 9, Some(&def), &Balances::default(), Some(&claim), now());
        assert!(matches!(result, Err(SettlementError::AlreadyRedeemed)));
    }

    #[test]
    fn test_claim_by_other_user_does_not_block() {
        let def = code(1, Reward::Gold { amount: 500 });
        let claim = RedemptionRecord::new(10, 1, now());
        let result = redeem("CODE1", 9, Some(&def), &Balances::default(), Some(&claim), now());
        assert!(result.is_ok());
    }

    #[test]
    fn test_describe_reward() {
        assert_eq!(describe_reward(&Reward::Gold { amount: 500 }), "500 X Gold");
        assert_eq!(describe_reward(&Reward::Jewels { amount: 100 }), "100 Red Gems");
        assert_eq!(
            describe_reward(&Reward::VipPass {
                vip_tier: Some("permanent".to_string())
            }),
            "VIP Pass (permanent)"
        );
        assert_eq!(
            describe_reward(&Reward::AllRewards { amount: 1000 }),
            "All Rewards (Gold, Gems & VIP Pass)"
        );
    }
}
