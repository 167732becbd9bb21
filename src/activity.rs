/// Bounded history of successful commands.
///
/// Feeds the global activity view and per-identity transaction history. Entries
/// are appended after a command commits, outside any market lock.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;
use uuid::Uuid;

use crate::market_resolve::MarketId;

pub const DEFAULT_ACTIVITY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Create,
    Bet,
    Resolve,
    Claim,
}

impl ActivityKind {
    pub fn emoji(&self) -> &'static str {
        match self {
            ActivityKind::Create => "📊",
            ActivityKind::Bet => "🎯",
            ActivityKind::Resolve => "✅",
            ActivityKind::Claim => "💸",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub market_id: MarketId,
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    /// Side for bets, reported outcome for resolutions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<bool>,
    pub timestamp: u64,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, market_id: MarketId, identity: &str, timestamp: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            market_id,
            identity: identity.to_string(),
            amount: None,
            outcome: None,
            timestamp,
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_outcome(mut self, outcome: bool) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Restore previously persisted entries (oldest first)
    pub fn with_entries(capacity: usize, entries: Vec<ActivityEntry>) -> Self {
        let log = Self::new(capacity);
        for entry in entries {
            log.push(entry);
        }
        log
    }

    pub fn record(&self, entry: ActivityEntry) {
        info!(
            "{} {:?} | market {} | {}{}",
            entry.kind.emoji(),
            entry.kind,
            entry.market_id,
            entry.identity,
            entry.amount.map(|a| format!(" | {}", a)).unwrap_or_default(),
        );
        self.push(entry);
    }

    fn push(&self, entry: ActivityEntry) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Newest first, only entries for `identity`
    pub fn history(&self, identity: &str, limit: usize) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .iter()
            .rev()
            .filter(|e| e.identity == identity)
            .take(limit)
            .cloned()
            .collect()
    }

    /// All entries, oldest first
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_drops_oldest() {
        let log = ActivityLog::new(2);
        log.record(ActivityEntry::new(ActivityKind::Create, 1, "alice", 1));
        log.record(ActivityEntry::new(ActivityKind::Bet, 1, "bob", 2).with_amount(5));
        log.record(ActivityEntry::new(ActivityKind::Bet, 1, "carol", 3).with_amount(7));

        assert_eq!(log.len(), 2);
        let recent = log.recent(10);
        assert_eq!(recent[0].identity, "carol");
        assert_eq!(recent[1].identity, "bob");
    }

    #[test]
    fn test_history_filters_by_identity() {
        let log = ActivityLog::default();
        log.record(ActivityEntry::new(ActivityKind::Bet, 1, "bob", 1).with_amount(5).with_outcome(true));
        log.record(ActivityEntry::new(ActivityKind::Bet, 2, "carol", 2).with_amount(5));
        log.record(ActivityEntry::new(ActivityKind::Claim, 1, "bob", 3).with_amount(10));

        let history = log.history("bob", 10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, ActivityKind::Claim);
        assert_eq!(history[1].outcome, Some(true));
        assert_eq!(log.history("bob", 1).len(), 1);
    }

    #[test]
    fn test_with_entries_keeps_order() {
        let original = ActivityLog::new(10);
        original.record(ActivityEntry::new(ActivityKind::Create, 1, "alice", 1));
        original.record(ActivityEntry::new(ActivityKind::Resolve, 1, "alice", 2).with_outcome(false));

        let restored = ActivityLog::with_entries(10, original.entries());
        assert_eq!(restored.entries(), original.entries());
    }
}
