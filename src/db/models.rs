//! Database models and their conversions to domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::progression::{GameOutcome, PlayerStats, Tier};
use crate::redeem::{
    Balances, GiftKind, RedeemCodeDefinition, RedemptionRecord, Reward, RewardKind,
};

/// Player profile database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::profiles)]
pub struct Profile {
    id: i32,
    username: String,
    points: i64,
    gems: i64,
    games_played: i64,
    games_won: i64,
    rank: String,
    vip: bool,
    vip_type: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Profile {
    /// Extracts the player's stats.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored rank is not a known tier.
    #[instrument(skip(self), fields(user_id = self.id, rank = %self.rank))]
    pub fn stats(&self) -> Result<PlayerStats, DbError> {
        let tier: Tier = self
            .rank
            .parse()
            .map_err(|_| DbError::new(format!("Invalid rank: '{}'", self.rank)))?;
        Ok(PlayerStats::new(
            self.points,
            self.games_played,
            self.games_won,
            tier,
        ))
    }

    /// Extracts the player's balances.
    pub fn balances(&self) -> Balances {
        Balances::new(self.points, self.gems, self.vip, self.vip_type.clone())
    }
}

/// Insertable profile. Stats and balances start at their column defaults.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::profiles)]
pub struct NewProfile {
    username: String,
}

/// Stats columns written after a match.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::profiles)]
pub(crate) struct StatsChangeset {
    points: i64,
    games_played: i64,
    games_won: i64,
    rank: String,
    updated_at: NaiveDateTime,
}

impl StatsChangeset {
    pub(crate) fn new(stats: &PlayerStats, updated_at: NaiveDateTime) -> Self {
        Self {
            points: *stats.points_total(),
            games_played: *stats.games_played(),
            games_won: *stats.games_won(),
            rank: stats.tier().to_string(),
            updated_at,
        }
    }
}

/// Balance columns written after a redemption or gift.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::profiles)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BalancesChangeset {
    points: i64,
    gems: i64,
    vip: bool,
    vip_type: Option<String>,
    updated_at: NaiveDateTime,
}

impl BalancesChangeset {
    pub(crate) fn new(balances: &Balances, updated_at: NaiveDateTime) -> Self {
        Self {
            points: *balances.points(),
            gems: *balances.gems(),
            vip: *balances.vip(),
            vip_type: balances.vip_tier().clone(),
            updated_at,
        }
    }
}

/// Recorded game result.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::game_results)]
#[diesel(belongs_to(Profile, foreign_key = user_id))]
pub struct GameResult {
    id: i32,
    user_id: i32,
    game_type: String,
    result: String,
    moves_count: i32,
    created_at: NaiveDateTime,
}

impl GameResult {
    /// Parses the stored result string into a [`GameOutcome`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] for an unknown result value.
    pub fn parse_outcome(&self) -> Result<GameOutcome, DbError> {
        GameOutcome::from_db_string(&self.result).map_err(|e| DbError::new(e.to_string()))
    }
}

/// Insertable game result event.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::game_results)]
pub struct NewGameResult {
    user_id: i32,
    game_type: String,
    result: String,
    moves_count: i32,
}

impl NewGameResult {
    /// Builds a tic-tac-toe result event.
    pub fn tictactoe(user_id: i32, outcome: GameOutcome, moves_count: i32) -> Self {
        Self::new(
            user_id,
            "tic-tac-toe".to_string(),
            outcome.to_db_string().to_string(),
            moves_count,
        )
    }
}

/// Stored redeem code.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::redeem_codes)]
pub struct RedeemCodeRow {
    id: i32,
    code: String,
    kind: String,
    reward_amount: i64,
    is_vip: bool,
    vip_type: Option<String>,
    all_rewards: bool,
    created_at: NaiveDateTime,
}

impl RedeemCodeRow {
    /// Converts the loosely typed row into a [`RedeemCodeDefinition`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored kind is unknown.
    #[instrument(skip(self), fields(code_id = self.id, kind = %self.kind))]
    pub fn to_definition(&self) -> Result<RedeemCodeDefinition, DbError> {
        let kind: RewardKind = self
            .kind
            .parse()
            .map_err(|_| DbError::new(format!("Invalid reward kind: '{}'", self.kind)))?;

        let amount = self.reward_amount;
        let reward = match kind {
            RewardKind::Gold => Reward::Gold { amount },
            RewardKind::Jewels => Reward::Jewels { amount },
            RewardKind::VipPass => Reward::VipPass {
                vip_tier: self.vip_type.clone().filter(|t| !t.is_empty()),
            },
            RewardKind::AllRewards => Reward::AllRewards { amount },
        };
        Ok(RedeemCodeDefinition::new(self.id, self.code.clone(), reward))
    }
}

/// Insertable redeem code.
#[derive(Debug, Clone, Insertable, Getters)]
#[diesel(table_name = schema::redeem_codes)]
pub struct NewRedeemCode {
    code: String,
    kind: String,
    reward_amount: i64,
    is_vip: bool,
    vip_type: Option<String>,
    all_rewards: bool,
}

impl NewRedeemCode {
    /// Flattens a typed reward into the stored columns.
    pub fn new(code: String, reward: &Reward) -> Self {
        let vip_type = match reward {
            Reward::VipPass { vip_tier } => vip_tier.clone(),
            _ => None,
        };
        Self {
            code,
            kind: reward.kind().to_string(),
            reward_amount: reward.amount(),
            is_vip: matches!(reward, Reward::VipPass { .. }),
            vip_type,
            all_rewards: matches!(reward, Reward::AllRewards { .. }),
        }
    }
}

/// Stored redemption.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::code_redemptions)]
pub struct CodeRedemption {
    id: i32,
    user_id: i32,
    code_id: i32,
    redeemed_at: NaiveDateTime,
}

impl From<CodeRedemption> for RedemptionRecord {
    fn from(row: CodeRedemption) -> Self {
        RedemptionRecord::new(row.user_id, row.code_id, row.redeemed_at)
    }
}

/// Insertable redemption.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::code_redemptions)]
pub(crate) struct NewCodeRedemption {
    user_id: i32,
    code_id: i32,
    redeemed_at: NaiveDateTime,
}

impl From<&RedemptionRecord> for NewCodeRedemption {
    fn from(record: &RedemptionRecord) -> Self {
        Self {
            user_id: *record.user_id(),
            code_id: *record.code_id(),
            redeemed_at: *record.redeemed_at(),
        }
    }
}

/// Recorded administrative gift.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::gifts)]
pub struct Gift {
    id: i32,
    user_id: i32,
    gift_type: String,
    amount: i64,
    sent_by: String,
    created_at: NaiveDateTime,
}

/// Insertable gift transaction.
#[derive(Debug, Clone, Insertable, Getters)]
#[diesel(table_name = schema::gifts)]
pub struct NewGift {
    user_id: i32,
    gift_type: String,
    amount: i64,
    sent_by: String,
}

impl NewGift {
    /// Creates a gift of `amount` of `kind` for `user_id`.
    pub fn new(user_id: i32, kind: GiftKind, amount: i64, sent_by: String) -> Self {
        Self {
            user_id,
            gift_type: kind.to_string(),
            amount,
            sent_by,
        }
    }

    /// Parses the stored gift type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] for an unknown gift type.
    pub fn kind(&self) -> Result<GiftKind, DbError> {
        self.gift_type
            .parse()
            .map_err(|_| DbError::new(format!("Invalid gift type: '{}'", self.gift_type)))
    }
}

/// Append-only audit row written as a side effect of settlement.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A finished match.
    GameResult(NewGameResult),
    /// An administrative gift.
    Gift(NewGift),
}

impl AuditEvent {
    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::GameResult(_) => "game_result",
            AuditEvent::Gift(_) => "gift",
        }
    }
}
