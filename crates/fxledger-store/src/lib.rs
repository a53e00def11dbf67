//! # fxledger-store
//!
//! **Storage layer** of the FX ledger: the only place balances and history
//! live.
//!
//! ## Architecture
//!
//! Each concern is a trait with an in-memory implementation:
//! 1. **BalanceStore**: account → balance, mutated only through atomic
//!    primitives (delta, conditional debit, absolute set)
//! 2. **LedgerLog**: append-only audit trail, timestamp + sequence ordered
//! 3. **ValuationHistory**: append-only valuation snapshots
//! 4. **SettingsStore**: operator settings (the log channel)
//!
//! The traits are `async` so a networked document store can implement them;
//! the in-memory versions hold a `parking_lot` lock for the duration of one
//! primitive and never across an await point.
//!
//! A store that cannot be reached reports
//! [`FxError::StoreUnavailable`](fxledger_types::FxError::StoreUnavailable);
//! it never pretends an account is empty.

pub mod balance;
pub mod ledger_log;
pub mod settings;
pub mod valuation_history;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use balance::{BalanceStore, InMemoryBalanceStore};
pub use ledger_log::{InMemoryLedgerLog, LedgerLog};
pub use settings::{InMemorySettingsStore, SettingsStore};
pub use valuation_history::{InMemoryValuationHistory, ValuationHistory};
