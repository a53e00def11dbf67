//! # fxledger-types
//!
//! Shared types, errors, and configuration for the **FX ledger**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`RoleId`], [`ChannelId`], [`EntryId`]
//! - **Actors**: [`ActorCapabilities`], [`Actor`]
//! - **Account model**: [`Account`], [`DeltaPolicy`], [`DebitOutcome`]
//! - **Audit model**: [`LedgerEntry`], [`NewLedgerEntry`], [`LedgerReason`], [`RedemptionMetadata`], [`HistoryRecord`]
//! - **Valuation model**: [`ValuationSnapshot`]
//! - **Redemption model**: [`RedemptionRequest`], [`RedemptionState`], [`ProvisionRequest`], [`ResourceHandle`]
//! - **Configuration**: [`LedgerConfig`], [`LogChannelConfig`]
//! - **Collaborators**: [`Provisioner`], [`MessageSender`]
//! - **Errors**: [`FxError`] with `FX_ERR_` prefix codes
//! - **Constants**: defaults and limits

pub mod account;
pub mod actor;
pub mod collaborator;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod ids;
pub mod redemption;
pub mod valuation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

// Re-export all primary types at crate root for ergonomic imports:
//   use fxledger_types::{AccountId, LedgerEntry, FxError, ...};

pub use account::*;
pub use actor::*;
pub use collaborator::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use ids::*;
pub use redemption::*;
pub use valuation::*;

// Constants are accessed via `fxledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
