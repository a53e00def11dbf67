//! Error types for the FX ledger.
//!
//! All errors use the `FX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access errors
//! - 2xx: Balance errors
//! - 3xx: Redemption errors
//! - 6xx: Store errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::AccountId;

/// Central error enum for all ledger operations.
#[derive(Debug, Error)]
pub enum FxError {
    // =================================================================
    // Access Errors (1xx)
    // =================================================================
    /// The actor lacks the capability the command requires.
    #[error("FX_ERR_100: Unauthorized: {actor} lacks {capability}")]
    Unauthorized {
        actor: AccountId,
        capability: &'static str,
    },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough balance to perform the operation.
    #[error("FX_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: i64, available: i64 },

    /// Amount must be strictly positive.
    #[error("FX_ERR_201: Invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    /// Currency code other than the ledger's own.
    #[error("FX_ERR_202: Invalid currency: {code}")]
    InvalidCurrency { code: String },

    /// Applying the delta would overflow the balance.
    #[error("FX_ERR_203: Balance overflow for {account} applying {delta}")]
    BalanceOverflow { account: AccountId, delta: i64 },

    // =================================================================
    // Redemption Errors (3xx)
    // =================================================================
    /// The redemption request is malformed.
    #[error("FX_ERR_300: Invalid redemption: {reason}")]
    InvalidRedemption { reason: String },

    /// The provisioning collaborator reported a failure.
    #[error("FX_ERR_301: Provisioning failed: {reason}")]
    ProvisioningFailed { reason: String },

    /// The provisioning collaborator did not answer in time.
    #[error("FX_ERR_302: Provisioning timed out after {timeout_ms}ms")]
    ProvisioningTimeout { timeout_ms: u64 },

    /// A setting the operation depends on has not been configured.
    #[error("FX_ERR_303: Missing configuration: {setting}")]
    MissingConfiguration { setting: &'static str },

    // =================================================================
    // Store Errors (6xx)
    // =================================================================
    /// The backing store could not be reached.
    #[error("FX_ERR_600: Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// The message delivery collaborator failed.
    #[error("FX_ERR_601: Delivery failed: {reason}")]
    DeliveryFailed { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FX_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FX_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("FX_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl FxError {
    /// Whether this error is a rejection the actor should simply be told
    /// about, as opposed to an operational failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::InsufficientBalance { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidCurrency { .. }
                | Self::InvalidRedemption { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FxError>;

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
