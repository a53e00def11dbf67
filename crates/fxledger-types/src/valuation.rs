//! Valuation snapshots: the average FX held per active account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, Account};

/// A point-in-time aggregate over all positive-balance accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub timestamp: DateTime<Utc>,
    pub value_per_active_account: Decimal,
}

impl ValuationSnapshot {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, value_per_active_account: Decimal) -> Self {
        Self {
            timestamp,
            value_per_active_account,
        }
    }
}

/// `sum(balance) / count(balance > 0)` over the given accounts, rounded to
/// [`constants::VALUATION_DECIMALS`] places. Zero when no account is active.
#[must_use]
pub fn value_per_active_account<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Decimal {
    let (sum, count) = accounts
        .into_iter()
        .filter(|a| a.is_active())
        .fold((Decimal::ZERO, 0u64), |(sum, count), a| {
            (sum + Decimal::from(a.balance), count + 1)
        });

    if count == 0 {
        return Decimal::ZERO;
    }
    (sum / Decimal::from(count)).round_dp(constants::VALUATION_DECIMALS)
}
