//! Audit trail types.
//!
//! Every balance-affecting or administrative event produces exactly one
//! [`LedgerEntry`]. Entries are immutable once appended: the log assigns
//! the id, timestamp and sequence, callers only describe the event through
//! a [`NewLedgerEntry`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, EntryId, ValuationSnapshot};

/// Why the balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    Give,
    Remove,
    Reset,
    Redeem,
}

impl std::fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Give => write!(f, "give"),
            Self::Remove => write!(f, "remove"),
            Self::Reset => write!(f, "reset"),
            Self::Redeem => write!(f, "redeem"),
        }
    }
}

/// What a redemption was for. Only present on `redeem` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionMetadata {
    pub service: String,
    pub platform: String,
    pub link: String,
}

/// An event description handed to the log for appending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub account_id: AccountId,
    pub delta: i64,
    pub reason: LedgerReason,
    pub actor_id: AccountId,
    pub metadata: Option<RedemptionMetadata>,
}

impl NewLedgerEntry {
    #[must_use]
    pub fn new(account_id: AccountId, delta: i64, reason: LedgerReason, actor_id: AccountId) -> Self {
        Self {
            account_id,
            delta,
            reason,
            actor_id,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: RedemptionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Seal the description into an immutable entry.
    #[must_use]
    pub fn finalize(self, sequence: u64, timestamp: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new(),
            sequence,
            timestamp,
            account_id: self.account_id,
            delta: self.delta,
            reason: self.reason,
            actor_id: self.actor_id,
            metadata: self.metadata,
        }
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Position in the log; breaks timestamp ties by insertion order.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub account_id: AccountId,
    pub delta: i64,
    pub reason: LedgerReason,
    pub actor_id: AccountId,
    pub metadata: Option<RedemptionMetadata>,
}

impl LedgerEntry {
    /// Sort key: timestamp first, then insertion order.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}

/// The persisted `history` document shape.
///
/// The `history` collection holds both audit entries and valuation
/// snapshots. Snapshots never carry `user_id`/`reason`; audit entries
/// always do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<LedgerReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_per_invite: Option<Decimal>,
}

impl HistoryRecord {
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.user_id.is_none() && self.reason.is_none()
    }
}

impl From<&LedgerEntry> for HistoryRecord {
    fn from(entry: &LedgerEntry) -> Self {
        let (service, platform, link) = match &entry.metadata {
            Some(m) => (
                Some(m.service.clone()),
                Some(m.platform.clone()),
                Some(m.link.clone()),
            ),
            None => (None, None, None),
        };
        Self {
            timestamp: entry.timestamp,
            user_id: Some(entry.account_id),
            amount: Some(entry.delta),
            reason: Some(entry.reason),
            from_user: Some(entry.actor_id),
            service,
            platform,
            link,
            value_per_invite: None,
        }
    }
}

impl From<&ValuationSnapshot> for HistoryRecord {
    fn from(snapshot: &ValuationSnapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            user_id: None,
            amount: None,
            reason: None,
            from_user: None,
            service: None,
            platform: None,
            link: None,
            value_per_invite: Some(snapshot.value_per_active_account),
        }
    }
}
