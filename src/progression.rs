//! Points, win counts and rank tiers.
//!
//! Everything here is pure: callers load the prior [`PlayerStats`], apply a
//! finished match and hand the result to the persistence layer.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::games::tictactoe::{Mark, MatchOutcome};

/// Points awarded for winning a match.
pub const WIN_POINTS: i64 = 5;
/// Points awarded for a draw.
pub const DRAW_POINTS: i64 = 2;
/// Points awarded for a loss.
pub const LOSS_POINTS: i64 = 0;

/// Rank tier derived from cumulative points.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Tier {
    /// 0 points and up.
    #[default]
    Bronze,
    /// 100 points and up.
    Silver,
    /// 300 points and up.
    Gold,
    /// 600 points and up.
    Platinum,
    /// 1000 points and up.
    Diamond,
}

impl Tier {
    /// Inclusive lower bound of points for this tier.
    pub fn min_points(self) -> i64 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 100,
            Tier::Gold => 300,
            Tier::Platinum => 600,
            Tier::Diamond => 1000,
        }
    }

    /// Returns the tier for a cumulative points total.
    pub fn for_points(points: i64) -> Self {
        <Tier as strum::IntoEnumIterator>::iter()
            .rev()
            .find(|tier| points >= tier.min_points())
            .unwrap_or(Tier::Bronze)
    }

    /// Returns the next tier up, or `None` at the top.
    pub fn next(self) -> Option<Self> {
        match self {
            Tier::Bronze => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Platinum),
            Tier::Platinum => Some(Tier::Diamond),
            Tier::Diamond => None,
        }
    }
}

/// Match result from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The player won.
    Win,
    /// The player lost.
    Loss,
    /// Nobody won.
    Draw,
}

/// Unknown stored outcome string.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid outcome: '{}'", _0)]
pub struct InvalidOutcome(#[error(not(source))] pub String);

impl GameOutcome {
    /// Views a board outcome from the side of `local`.
    pub fn for_mark(outcome: MatchOutcome, local: Mark) -> Self {
        match outcome {
            MatchOutcome::Win(mark) if mark == local => Self::Win,
            MatchOutcome::Win(_) => Self::Loss,
            MatchOutcome::Draw => Self::Draw,
        }
    }

    /// Points this outcome is worth.
    pub fn points(self) -> i64 {
        match self {
            Self::Win => WIN_POINTS,
            Self::Loss => LOSS_POINTS,
            Self::Draw => DRAW_POINTS,
        }
    }

    /// Converts outcome to the string stored in the database.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    /// Parses outcome from the string stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOutcome`] if the string is not a valid outcome value.
    pub fn from_db_string(s: &str) -> Result<Self, InvalidOutcome> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "draw" => Ok(Self::Draw),
            _ => Err(InvalidOutcome(s.to_string())),
        }
    }
}

/// Cumulative statistics of one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct PlayerStats {
    points_total: i64,
    games_played: i64,
    games_won: i64,
    tier: Tier,
}

impl PlayerStats {
    /// Creates stats from stored values. The tier is taken as stored.
    pub fn new(points_total: i64, games_played: i64, games_won: i64, tier: Tier) -> Self {
        Self {
            points_total,
            games_played,
            games_won,
            tier,
        }
    }

    /// Points still needed to reach the next tier, or `None` at the top.
    pub fn points_to_next_tier(&self) -> Option<i64> {
        self.tier
            .next()
            .map(|next| (next.min_points() - self.points_total).max(0))
    }

    /// Applies a finished match for the player holding `local`.
    #[instrument(skip(self), fields(points = self.points_total, tier = %self.tier))]
    pub fn apply_outcome(&self, outcome: MatchOutcome, local: Mark) -> Self {
        apply_outcome(self, outcome, local)
    }
}

/// Computes a player's stats after a finished match.
///
/// Every match counts as played. A win by `local` adds [`WIN_POINTS`] and a
/// win; a draw adds [`DRAW_POINTS`]; a loss changes nothing else. The tier is
/// recomputed from the new total.
pub fn apply_outcome(prior: &PlayerStats, outcome: MatchOutcome, local: Mark) -> PlayerStats {
    let result = GameOutcome::for_mark(outcome, local);
    let points_total = prior.points_total.saturating_add(result.points());
    let games_won = match result {
        GameOutcome::Win => prior.games_won.saturating_add(1),
        GameOutcome::Loss | GameOutcome::Draw => prior.games_won,
    };

    let next = PlayerStats {
        points_total,
        games_played: prior.games_played.saturating_add(1),
        games_won,
        tier: Tier::for_points(points_total),
    };
    debug!(?result, points = next.points_total, tier = %next.tier, "Outcome applied");
    next
}

/// Aggregated win/loss/draw counts for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize)]
pub struct AggregatedStats {
    total_games: i64,
    wins: i64,
    losses: i64,
    draws: i64,
}

impl AggregatedStats {
    /// Tallies a list of outcomes.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = GameOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut agg, outcome| {
                agg.total_games += 1;
                match outcome {
                    GameOutcome::Win => agg.wins += 1,
                    GameOutcome::Loss => agg.losses += 1,
                    GameOutcome::Draw => agg.draws += 1,
                }
                agg
            })
    }

    /// Calculates win rate as a percentage (0.0–100.0).
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            (self.wins as f64 / self.total_games as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(points: i64, played: i64, won: i64) -> PlayerStats {
        PlayerStats::new(points, played, won, Tier::for_points(points))
    }

    #[test]
    fn test_win_adds_points_and_win() {
        let prior = stats(40, 10, 4);
        let next = apply_outcome(&prior, MatchOutcome::Win(Mark::X), Mark::X);
        assert_eq!(*next.points_total(), 45);
        assert_eq!(*next.games_won(), 5);
        assert_eq!(*next.games_played(), 11);
    }

    #[test]
    fn test_loss_only_counts_game() {
        let prior = stats(40, 10, 4);
        let next = apply_outcome(&prior, MatchOutcome::Win(Mark::O), Mark::X);
        assert_eq!(*next.points_total(), 40);
        assert_eq!(*next.games_won(), 4);
        assert_eq!(*next.games_played(), 11);
    }

    #[test]
    fn test_draw_adds_two_points() {
        let prior = stats(40, 10, 4);
        let next = apply_outcome(&prior, MatchOutcome::Draw, Mark::O);
        assert_eq!(*next.points_total(), 42);
        assert_eq!(*next.games_won(), 4);
        assert_eq!(*next.games_played(), 11);
    }

    #[test]
    fn test_local_mark_o_wins() {
        let next = PlayerStats::default().apply_outcome(MatchOutcome::Win(Mark::O), Mark::O);
        assert_eq!(*next.points_total(), WIN_POINTS);
        assert_eq!(*next.games_won(), 1);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::for_points(0), Tier::Bronze);
        assert_eq!(Tier::for_points(99), Tier::Bronze);
        assert_eq!(Tier::for_points(100), Tier::Silver);
        assert_eq!(Tier::for_points(299), Tier::Silver);
        assert_eq!(Tier::for_points(300), Tier::Gold);
        assert_eq!(Tier::for_points(600), Tier::Platinum);
        assert_eq!(Tier::for_points(999), Tier::Platinum);
        assert_eq!(Tier::for_points(1000), Tier::Diamond);
        assert_eq!(Tier::for_points(50_000), Tier::Diamond);
    }

    #[test]
    fn test_tier_never_drops_as_points_grow() {
        let mut previous = Tier::Bronze;
        for points in 0..1200 {
            let tier = Tier::for_points(points);
            assert!(tier >= previous, "tier dropped at {points}");
            previous = tier;
        }
    }

    #[test]
    fn test_win_crosses_tier_boundary() {
        let prior = stats(97, 30, 12);
        assert_eq!(*prior.tier(), Tier::Bronze);
        let next = apply_outcome(&prior, MatchOutcome::Win(Mark::X), Mark::X);
        assert_eq!(*next.tier(), Tier::Silver);
    }

    #[test]
    fn test_draw_recomputes_tier() {
        let prior = PlayerStats::new(299, 50, 20, Tier::Silver);
        let next = apply_outcome(&prior, MatchOutcome::Draw, Mark::X);
        assert_eq!(*next.tier(), Tier::Gold);
    }

    #[test]
    fn test_points_to_next_tier() {
        assert_eq!(stats(0, 0, 0).points_to_next_tier(), Some(100));
        assert_eq!(stats(250, 0, 0).points_to_next_tier(), Some(50));
        assert_eq!(stats(1500, 0, 0).points_to_next_tier(), None);
    }

    #[test]
    fn test_tier_parse_and_display() {
        assert_eq!("Platinum".parse::<Tier>(), Ok(Tier::Platinum));
        assert_eq!(Tier::Diamond.to_string(), "Diamond");
        assert!("Mithril".parse::<Tier>().is_err());
    }

    #[test]
    fn test_game_outcome_round_trip() {
        for outcome in [GameOutcome::Win, GameOutcome::Loss, GameOutcome::Draw] {
            let parsed = GameOutcome::from_db_string(outcome.to_db_string()).unwrap();
            assert_eq!(outcome, parsed);
        }
        assert!(GameOutcome::from_db_string("invalid").is_err());
    }

    #[test]
    fn test_aggregated_stats() {
        let agg = AggregatedStats::from_outcomes([
            GameOutcome::Win,
            GameOutcome::Win,
            GameOutcome::Loss,
            GameOutcome::Draw,
        ]);
        assert_eq!(*agg.total_games(), 4);
        assert_eq!(*agg.wins(), 2);
        assert_eq!(*agg.losses(), 1);
        assert_eq!(*agg.draws(), 1);
        assert!((agg.win_rate() - 50.0).abs() < 0.001);
        assert_eq!(AggregatedStats::default().win_rate(), 0.0);
    }
}
