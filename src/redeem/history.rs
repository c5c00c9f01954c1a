//! Client-visible log of redeem attempts.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use serde::Serialize;
use tracing::instrument;

use super::types::RewardKind;
use crate::SettlementError;

/// Terminal status of one redeem attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum AttemptStatus {
    /// The reward was granted.
    Redeemed,
    /// The attempt failed.
    Error,
}

/// One redeem attempt.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
pub struct HistoryEntry {
    code: String,
    kind: Option<RewardKind>,
    status: AttemptStatus,
    message: Option<String>,
    at: NaiveDateTime,
}

impl HistoryEntry {
    /// Label shown next to the code.
    pub fn kind_label(&self) -> &'static str {
        self.kind.map_or("Unknown", RewardKind::label)
    }
}

/// Redeem attempts of one session, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedemptionHistory {
    entries: Vec<HistoryEntry>,
}

impl RedemptionHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful attempt.
    #[instrument(skip(self))]
    pub fn record_success(&mut self, code: &str, kind: RewardKind, at: NaiveDateTime) {
        self.push(HistoryEntry {
            code: code.to_string(),
            kind: Some(kind),
            status: AttemptStatus::Redeemed,
            message: None,
            at,
        });
    }

    /// Records a failed attempt with the error shown to the user.
    #[instrument(skip(self))]
    pub fn record_failure(&mut self, code: &str, error: &SettlementError, at: NaiveDateTime) {
        self.push(HistoryEntry {
            code: code.to_string(),
            kind: None,
            status: AttemptStatus::Error,
            message: Some(error.to_string()),
            at,
        });
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    /// Number of recorded attempts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was attempted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 8)
            .and_then(|d| d.and_hms_opt(12, minute, 0))
            .unwrap()
    }

    #[test]
    fn test_newest_first() {
        let mut history = RedemptionHistory::new();
        history.record_success("GOLD500", RewardKind::Gold, at(0));
        history.record_failure("BOGUS", &SettlementError::UnknownCode, at(1));

        assert_eq!(history.len(), 2);
        let latest = history.latest().unwrap();
        assert_eq!(latest.code(), "BOGUS");
        assert_eq!(*latest.status(), AttemptStatus::Error);
        assert_eq!(latest.kind_label(), "Unknown");
        assert_eq!(
            latest.message().as_deref(),
            Some("Invalid code or code does not exist")
        );

        let first = &history.entries()[1];
        assert_eq!(*first.status(), AttemptStatus::Redeemed);
        assert_eq!(first.kind_label(), "X Gold");
    }
}
