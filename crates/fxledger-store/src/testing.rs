//! Store doubles that fail on purpose. **Never use in production.**

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fxledger_types::{
    Account, AccountId, DebitOutcome, DeltaPolicy, FxError, LedgerEntry, LogChannelConfig,
    NewLedgerEntry, Result, ValuationSnapshot,
};

use crate::{BalanceStore, LedgerLog, SettingsStore, ValuationHistory};

/// Every call fails with [`FxError::StoreUnavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineStore;

fn offline<T>() -> Result<T> {
    Err(FxError::StoreUnavailable {
        reason: "connection refused".into(),
    })
}

#[async_trait]
impl BalanceStore for OfflineStore {
    async fn get_or_create(&self, _account: AccountId) -> Result<i64> {
        offline()
    }

    async fn find(&self, _account: AccountId) -> Result<Option<i64>> {
        offline()
    }

    async fn apply_delta(&self, _account: AccountId, _delta: i64, _policy: DeltaPolicy) -> Result<i64> {
        offline()
    }

    async fn debit_if_sufficient(&self, _account: AccountId, _amount: i64) -> Result<DebitOutcome> {
        offline()
    }

    async fn set_balance(&self, _account: AccountId, _value: i64) -> Result<i64> {
        offline()
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        offline()
    }
}

#[async_trait]
impl LedgerLog for OfflineStore {
    async fn append(&self, _entry: NewLedgerEntry) -> Result<LedgerEntry> {
        offline()
    }

    async fn query_by_account(&self, _account: AccountId, _limit: usize) -> Result<Vec<LedgerEntry>> {
        offline()
    }

    async fn query_all(&self) -> Result<Vec<LedgerEntry>> {
        offline()
    }
}

#[async_trait]
impl ValuationHistory for OfflineStore {
    async fn append(&self, _snapshot: ValuationSnapshot) -> Result<ValuationSnapshot> {
        offline()
    }

    async fn snapshots(&self) -> Result<Vec<ValuationSnapshot>> {
        offline()
    }

    async fn latest(&self) -> Result<Option<ValuationSnapshot>> {
        offline()
    }
}

#[async_trait]
impl SettingsStore for OfflineStore {
    async fn log_channel(&self) -> Result<Option<LogChannelConfig>> {
        offline()
    }

    async fn set_log_channel(&self, _config: LogChannelConfig) -> Result<()> {
        offline()
    }
}

/// Ledger log that reads as empty but refuses every append. Counts the
/// refused appends.
#[derive(Debug, Default)]
pub struct AppendFailingLog {
    attempts: AtomicUsize,
}

impl AppendFailingLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerLog for AppendFailingLog {
    async fn append(&self, _entry: NewLedgerEntry) -> Result<LedgerEntry> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(FxError::StoreUnavailable {
            reason: "audit log write rejected".into(),
        })
    }

    async fn query_by_account(&self, _account: AccountId, _limit: usize) -> Result<Vec<LedgerEntry>> {
        Ok(Vec::new())
    }

    async fn query_all(&self) -> Result<Vec<LedgerEntry>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_reports_a_default_balance() {
        let err = BalanceStore::get_or_create(&OfflineStore, AccountId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FxError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn append_failing_log_counts_refusals() {
        use fxledger_types::LedgerReason;

        let log = AppendFailingLog::new();
        let entry = NewLedgerEntry::new(AccountId(1), 5, LedgerReason::Give, AccountId(2));
        let err = log.append(entry).await.unwrap_err();
        assert!(matches!(err, FxError::StoreUnavailable { .. }));
        assert_eq!(log.attempts(), 1);
        assert!(log.query_all().await.unwrap().is_empty());
    }
}
