//! Session-scoped activity trail.
//!
//! Entries are prepended on every transition and never edited or removed.
//! Nothing here survives a restart: the log is rebuilt per session, which is
//! a documented property of the design, not an oversight.

use shared::domain::{ActivityKind, ActivityLogEntry};

/// Newest-first, append-only list of transition events.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<ActivityLogEntry>,
}

impl ActivityLog {
    /// The status-history panel shows at most this many entries; the full
    /// log view shows everything.
    pub const STATUS_HISTORY_LIMIT: usize = 4;

    pub fn record(&mut self, entry: ActivityLogEntry) {
        self.entries.insert(0, entry);
    }

    /// Full log, newest first.
    pub fn entries(&self) -> &[ActivityLogEntry] {
        &self.entries
    }

    /// The condensed status-history view: transition kinds only, capped to
    /// the most recent [`Self::STATUS_HISTORY_LIMIT`].
    pub fn status_history(&self) -> Vec<ActivityLogEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                matches!(
                    entry.kind,
                    ActivityKind::AgreementAdded
                        | ActivityKind::ClaimSubmitted
                        | ActivityKind::LenderResponse
                )
            })
            .take(Self::STATUS_HISTORY_LIMIT)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
