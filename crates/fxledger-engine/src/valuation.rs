//! Valuation tracker for the "FX per active account" series.
//!
//! Recomputing is a full scan of the balance store, so mutations never do it
//! inline. They call [`ValuationTracker::mark_dirty`]; a debounced
//! background worker folds bursts of mutations into one recompute, and
//! [`ValuationTracker::series`] flushes whatever is still pending before it
//! reads the history. A mutation that completed before `series()` was
//! called is therefore always reflected in the returned series.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use fxledger_store::{BalanceStore, ValuationHistory};
use fxledger_types::{Result, ValuationSnapshot, value_per_active_account};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

pub struct ValuationTracker {
    balances: Arc<dyn BalanceStore>,
    history: Arc<dyn ValuationHistory>,
    dirty: AtomicBool,
    wake: Notify,
    /// Serializes "clear dirty flag + recompute" so a flush waits for an
    /// in-flight background recompute instead of racing past it.
    recompute_lock: Mutex<()>,
}

impl ValuationTracker {
    #[must_use]
    pub fn new(balances: Arc<dyn BalanceStore>, history: Arc<dyn ValuationHistory>) -> Self {
        Self {
            balances,
            history,
            dirty: AtomicBool::new(false),
            wake: Notify::new(),
            recompute_lock: Mutex::new(()),
        }
    }

    /// Scan all accounts, compute the value and append the snapshot.
    pub async fn recompute(&self) -> Result<ValuationSnapshot> {
        let _guard = self.recompute_lock.lock().await;
        self.recompute_locked().await
    }

    async fn recompute_locked(&self) -> Result<ValuationSnapshot> {
        let accounts = self.balances.accounts().await?;
        let value = value_per_active_account(&accounts);
        let snapshot = self
            .history
            .append(ValuationSnapshot::new(Utc::now(), value))
            .await?;
        tracing::debug!(
            value = %snapshot.value_per_active_account,
            accounts = accounts.len(),
            "Valuation snapshot recorded"
        );
        Ok(snapshot)
    }

    /// Record that balances changed. Cheap; never touches the stores.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Recompute now if a mutation is pending. Returns the new snapshot, or
    /// `None` if nothing was pending.
    pub async fn flush(&self) -> Result<Option<ValuationSnapshot>> {
        let _guard = self.recompute_lock.lock().await;
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(None);
        }
        match self.recompute_locked().await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                // Leave the work pending for the next flush.
                self.dirty.store(true, Ordering::Release);
                Err(err)
            }
        }
    }

    /// The full valuation series, oldest first, with pending work flushed.
    pub async fn series(&self) -> Result<Vec<ValuationSnapshot>> {
        self.flush().await?;
        self.history.snapshots().await
    }

    /// Start the debounced background recompute loop.
    ///
    /// After each wake-up the worker waits `debounce` so that a burst of
    /// mutations costs a single scan. Errors are logged and the work is left
    /// pending. Abort the returned handle to stop the worker.
    pub fn spawn_worker(self: &Arc<Self>, debounce: Duration) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tracker.wake.notified().await;
                if !debounce.is_zero() {
                    tokio::time::sleep(debounce).await;
                }
                if let Err(err) = tracker.flush().await {
                    tracing::error!(error = %err, "Background valuation recompute failed");
                }
            }
        })
    }
}
