//! Account balances and the policies that govern their mutation.

use serde::{Deserialize, Serialize};

use crate::{AccountId, FxError, Result};

/// A single account record: one integer FX balance per member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Stored as `fx` to match the persisted `accounts` collection.
    #[serde(rename = "fx")]
    pub balance: i64,
}

impl Account {
    /// A freshly referenced account: balance 0.
    #[must_use]
    pub fn new(id: AccountId) -> Self {
        Self { id, balance: 0 }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.balance > 0
    }
}

/// How [`DeltaPolicy::apply`] treats a result below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaPolicy {
    /// Keep the arithmetic result even if negative.
    AllowNegative,
    /// Floor the result at 0.
    ClampAtZero,
}

impl DeltaPolicy {
    /// Compute the balance that results from adding `delta` to `current`.
    ///
    /// Balances stay within `-i64::MAX..=i64::MAX`, so every balance can be
    /// negated.
    ///
    /// # Errors
    /// Returns [`FxError::BalanceOverflow`] if the result leaves that range.
    pub fn apply(self, account: AccountId, current: i64, delta: i64) -> Result<i64> {
        match (self, current.checked_add(delta)) {
            (Self::AllowNegative, Some(raw)) if raw != i64::MIN => Ok(raw),
            (Self::ClampAtZero, Some(raw)) => Ok(raw.max(0)),
            _ => Err(FxError::BalanceOverflow { account, delta }),
        }
    }
}

impl std::fmt::Display for DeltaPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllowNegative => write!(f, "ALLOW_NEGATIVE"),
            Self::ClampAtZero => write!(f, "CLAMP_AT_ZERO"),
        }
    }
}

/// Result of a conditional ("decrement iff sufficient") debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The debit was applied; carries the new balance.
    Debited { new_balance: i64 },
    /// Nothing changed; carries the balance that was too low.
    Insufficient { available: i64 },
}
