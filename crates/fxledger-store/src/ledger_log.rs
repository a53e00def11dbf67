//! Append-only audit trail.
//!
//! The log assigns each entry its id, timestamp and sequence number at
//! append time. Timestamps never decrease (a wall clock stepping backwards
//! is absorbed by reusing the previous timestamp) and the sequence breaks
//! ties, so `(timestamp, sequence)` is a total order matching insertion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxledger_types::{AccountId, LedgerEntry, NewLedgerEntry, Result};
use parking_lot::RwLock;

/// Durable, ordered audit log.
#[async_trait]
pub trait LedgerLog: Send + Sync {
    /// Append one event. Failures propagate so the caller can alert.
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry>;

    /// At most `limit` entries for `account`, most recent first.
    async fn query_by_account(&self, account: AccountId, limit: usize) -> Result<Vec<LedgerEntry>>;

    /// Every entry, oldest first.
    async fn query_all(&self) -> Result<Vec<LedgerEntry>>;
}

struct LogState {
    entries: Vec<LedgerEntry>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// In-process audit log.
pub struct InMemoryLedgerLog {
    state: RwLock<LogState>,
}

impl InMemoryLedgerLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LogState {
                entries: Vec::new(),
                last_timestamp: None,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl Default for InMemoryLedgerLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerLog for InMemoryLedgerLog {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        let mut state = self.state.write();
        let now = Utc::now();
        let timestamp = match state.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        let sequence = state.entries.len() as u64;
        let entry = entry.finalize(sequence, timestamp);
        state.last_timestamp = Some(timestamp);
        state.entries.push(entry.clone());

        tracing::debug!(
            entry = %entry.id,
            account = %entry.account_id,
            delta = entry.delta,
            reason = %entry.reason,
            "Ledger entry appended"
        );
        Ok(entry)
    }

    async fn query_by_account(&self, account: AccountId, limit: usize) -> Result<Vec<LedgerEntry>> {
        // Entries are stored in append order, so walking backwards yields
        // most-recent-first without sorting.
        Ok(self
            .state
            .read()
            .entries
            .iter()
            .rev()
            .filter(|e| e.account_id == account)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn query_all(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.state.read().entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use fxledger_types::LedgerReason;

    use super::*;

    fn give(account: u64, delta: i64) -> NewLedgerEntry {
        NewLedgerEntry::new(AccountId(account), delta, LedgerReason::Give, AccountId(999))
    }

    #[tokio::test]
    async fn append_assigns_sequence() {
        let log = InMemoryLedgerLog::new();
        let a = log.append(give(1, 10)).await.unwrap();
        let b = log.append(give(1, 20)).await.unwrap();
        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
        assert!(a.order_key() < b.order_key());
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn query_by_account_is_most_recent_first_and_bounded() {
        let log = InMemoryLedgerLog::new();
        for i in 0..30 {
            log.append(give(1, i)).await.unwrap();
            log.append(give(2, i)).await.unwrap();
        }
        let entries = log.query_by_account(AccountId(1), 20).await.unwrap();
        assert_eq!(entries.len(), 20);
        assert!(entries.iter().all(|e| e.account_id == AccountId(1)));
        assert_eq!(entries[0].delta, 29);
        for pair in entries.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
            assert!(pair[0].order_key() > pair[1].order_key());
        }
    }

    #[tokio::test]
    async fn query_unknown_account_is_empty() {
        let log = InMemoryLedgerLog::new();
        log.append(give(1, 5)).await.unwrap();
        assert!(log.query_by_account(AccountId(2), 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_all_is_ascending() {
        let log = InMemoryLedgerLog::new();
        for i in 0..10 {
            log.append(give(i % 3, 1)).await.unwrap();
        }
        let all = log.query_all().await.unwrap();
        assert_eq!(all.len(), 10);
        for pair in all.windows(2) {
            assert!(pair[0].order_key() < pair[1].order_key());
        }
    }
}
