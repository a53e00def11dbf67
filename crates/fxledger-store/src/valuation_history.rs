//! Append-only series of valuation snapshots, kept for charting.

use async_trait::async_trait;
use fxledger_types::{Result, ValuationSnapshot};
use parking_lot::RwLock;

#[async_trait]
pub trait ValuationHistory: Send + Sync {
    /// Append a snapshot. Timestamps earlier than the latest stored one are
    /// raised to it so the series stays non-decreasing.
    async fn append(&self, snapshot: ValuationSnapshot) -> Result<ValuationSnapshot>;

    /// The full series, oldest first.
    async fn snapshots(&self) -> Result<Vec<ValuationSnapshot>>;

    /// The most recent snapshot, if any.
    async fn latest(&self) -> Result<Option<ValuationSnapshot>>;
}

pub struct InMemoryValuationHistory {
    snapshots: RwLock<Vec<ValuationSnapshot>>,
}

impl InMemoryValuationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

impl Default for InMemoryValuationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValuationHistory for InMemoryValuationHistory {
    async fn append(&self, mut snapshot: ValuationSnapshot) -> Result<ValuationSnapshot> {
        let mut snapshots = self.snapshots.write();
        if let Some(last) = snapshots.last() {
            if snapshot.timestamp < last.timestamp {
                snapshot.timestamp = last.timestamp;
            }
        }
        snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn snapshots(&self) -> Result<Vec<ValuationSnapshot>> {
        Ok(self.snapshots.read().clone())
    }

    async fn latest(&self) -> Result<Option<ValuationSnapshot>> {
        Ok(self.snapshots.read().last().cloned())
    }
}
