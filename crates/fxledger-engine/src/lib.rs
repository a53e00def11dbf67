//! # fxledger-engine
//!
//! **Command plane**: the FX commands a chat gateway dispatches, plus the
//! background valuation worker.
//!
//! ## Architecture
//!
//! ```text
//!  gateway ──► FxLedger ──► AccessControl (admin / history / log-admin gates)
//!                 │
//!                 ├──► BalanceStore ──► LedgerLog        (give, remove, reset)
//!                 ├──► RedemptionWorkflow                 (redeem)
//!                 │       lock ─► check ─► provision ─► debit ─► log
//!                 ├──► LeaderboardQuery                   (leaderboard)
//!                 ├──► ValuationTracker ◄── worker        (currency_rate)
//!                 └──► NotificationSink ──► MessageSender (best effort)
//! ```
//!
//! Every balance-affecting command:
//! 1. Checks the actor's capability before anything else
//! 2. Validates currency and amount
//! 3. Mutates the balance atomically at the store
//! 4. Appends exactly one ledger entry
//! 5. Marks the valuation dirty and forwards a summary to the log channel

pub mod access;
pub mod account_lock;
pub mod leaderboard;
pub mod ledger;
pub mod notify;
pub mod redemption;
pub mod telemetry;
pub mod valuation;

pub use access::AccessControl;
pub use account_lock::{AccountGuard, AccountLocks};
pub use leaderboard::{Leaderboard, LeaderboardQuery, LeaderboardRow};
pub use ledger::{
    BalanceChange, BalanceReport, Collaborators, FxLedger, HistoryReport, ResetReport, Stores,
};
pub use notify::NotificationSink;
pub use redemption::{RedemptionReceipt, RedemptionWorkflow};
pub use telemetry::{LogFormat, init_tracing};
pub use valuation::ValuationTracker;
