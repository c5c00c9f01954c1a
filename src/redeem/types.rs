//! Reward definitions, balances and claim records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Kind of reward a redeem code grants, as stored in the `kind` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum RewardKind {
    /// Adds gold (points).
    #[strum(serialize = "gold")]
    #[serde(rename = "gold")]
    Gold,
    /// Adds red gems.
    #[strum(serialize = "jewels")]
    #[serde(rename = "jewels")]
    Jewels,
    /// Grants VIP status.
    #[strum(serialize = "vipPass")]
    #[serde(rename = "vipPass")]
    VipPass,
    /// Gold plus the fixed gem bonus plus gold-tier VIP.
    #[strum(serialize = "allRewards")]
    #[serde(rename = "allRewards")]
    AllRewards,
}

impl RewardKind {
    /// Player-facing name of the reward.
    pub fn label(self) -> &'static str {
        match self {
            RewardKind::Gold => "X Gold",
            RewardKind::Jewels => "Red Gems",
            RewardKind::VipPass => "VIP Pass",
            RewardKind::AllRewards => "All Rewards",
        }
    }
}

/// What a redeem code pays out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reward {
    /// Adds `amount` points.
    Gold {
        /// Points granted.
        amount: i64,
    },
    /// Adds `amount` gems.
    Jewels {
        /// Gems granted.
        amount: i64,
    },
    /// Sets VIP with the given tier label.
    VipPass {
        /// VIP tier label, if the code names one.
        vip_tier: Option<String>,
    },
    /// Adds `amount` points, the fixed gem bonus and gold-tier VIP.
    AllRewards {
        /// Points granted.
        amount: i64,
    },
}

impl Reward {
    /// Returns the stored kind of this reward.
    pub fn kind(&self) -> RewardKind {
        match self {
            Reward::Gold { .. } => RewardKind::Gold,
            Reward::Jewels { .. } => RewardKind::Jewels,
            Reward::VipPass { .. } => RewardKind::VipPass,
            Reward::AllRewards { .. } => RewardKind::AllRewards,
        }
    }

    /// Returns the numeric reward amount (0 for VIP passes).
    pub fn amount(&self) -> i64 {
        match self {
            Reward::Gold { amount } | Reward::Jewels { amount } | Reward::AllRewards { amount } => {
                *amount
            }
            Reward::VipPass { .. } => 0,
        }
    }
}

/// A redeem code as created by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct RedeemCodeDefinition {
    id: i32,
    code: String,
    reward: Reward,
}

impl RedeemCodeDefinition {
    /// Returns the reward kind.
    pub fn kind(&self) -> RewardKind {
        self.reward.kind()
    }

    /// Returns the numeric reward amount.
    pub fn reward_amount(&self) -> i64 {
        self.reward.amount()
    }

    /// Returns the VIP tier label carried by a VIP pass.
    pub fn vip_tier(&self) -> Option<&str> {
        match &self.reward {
            Reward::VipPass { vip_tier } => vip_tier.as_deref(),
            _ => None,
        }
    }

    /// True for codes that grant every reward.
    pub fn grants_all_rewards(&self) -> bool {
        matches!(self.reward, Reward::AllRewards { .. })
    }
}

/// Currency and VIP state of a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct Balances {
    points: i64,
    gems: i64,
    vip: bool,
    vip_tier: Option<String>,
}

impl Balances {
    /// Returns a copy with `points` added.
    pub fn with_points_added(mut self, points: i64) -> Self {
        self.points = self.points.saturating_add(points);
        self
    }

    /// Returns a copy with `gems` added.
    pub fn with_gems_added(mut self, gems: i64) -> Self {
        self.gems = self.gems.saturating_add(gems);
        self
    }

    /// Returns a copy with VIP set to `vip_tier`.
    pub fn with_vip(mut self, vip_tier: Option<String>) -> Self {
        self.vip = true;
        self.vip_tier = vip_tier;
        self
    }
}

/// Proof that a user claimed a code. One per (user, code) pair.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct RedemptionRecord {
    user_id: i32,
    code_id: i32,
    redeemed_at: NaiveDateTime,
}

impl RedemptionRecord {
    /// True if this record belongs to the given pair.
    pub fn matches(&self, user_id: i32, code_id: i32) -> bool {
        self.user_id == user_id && self.code_id == code_id
    }
}

/// Currency an administrator can gift.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GiftKind {
    /// Credits points.
    Gold,
    /// Credits gems.
    Gems,
}

impl GiftKind {
    /// Applies a gift of `amount` to `balances`.
    pub fn credit(self, balances: Balances, amount: i64) -> Balances {
        match self {
            GiftKind::Gold => balances.with_points_added(amount),
            GiftKind::Gems => balances.with_gems_added(amount),
        }
    }
}
