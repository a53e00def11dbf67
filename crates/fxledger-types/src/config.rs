//! Configuration types for the ledger and its operator settings.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, ChannelId, DeltaPolicy, FxError, Result, RoleId};

/// Static configuration of one ledger instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// The only currency code `give`/`remove` accept (case-insensitive).
    pub currency_code: String,
    /// FX debited by one redemption.
    pub redemption_cost: i64,
    /// Entries shown by `history`.
    pub history_limit: usize,
    /// Leaderboard size when none is requested.
    pub leaderboard_default: usize,
    /// Leaderboard size cap.
    pub leaderboard_max: usize,
    pub provisioning_timeout_ms: u64,
    pub notification_timeout_ms: u64,
    pub valuation_debounce_ms: u64,
    /// Policy for `give`. Amounts are positive, so this only matters for
    /// accounts that are already negative.
    pub give_policy: DeltaPolicy,
    /// Policy for `remove`.
    pub remove_policy: DeltaPolicy,
    /// Owner who can see every provisioned redemption resource.
    pub owner_id: Option<AccountId>,
    /// Where redemption resources are created.
    pub provisioning_destination: Option<u64>,
    /// Roles allowed to view a member's history.
    pub history_roles: BTreeSet<RoleId>,
    /// Roles allowed to set the log channel.
    pub log_admin_roles: BTreeSet<RoleId>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency_code: constants::CURRENCY_CODE.to_string(),
            redemption_cost: constants::DEFAULT_REDEMPTION_COST,
            history_limit: constants::DEFAULT_HISTORY_LIMIT,
            leaderboard_default: constants::DEFAULT_LEADERBOARD_SIZE,
            leaderboard_max: constants::MAX_LEADERBOARD_SIZE,
            provisioning_timeout_ms: constants::DEFAULT_PROVISIONING_TIMEOUT_MS,
            notification_timeout_ms: constants::DEFAULT_NOTIFICATION_TIMEOUT_MS,
            valuation_debounce_ms: constants::DEFAULT_VALUATION_DEBOUNCE_MS,
            give_policy: DeltaPolicy::AllowNegative,
            remove_policy: DeltaPolicy::ClampAtZero,
            owner_id: None,
            provisioning_destination: None,
            history_roles: BTreeSet::new(),
            log_admin_roles: BTreeSet::new(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON configuration document. Missing fields take
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FxError::Configuration(format!("invalid ledger config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no ledger can run with.
    ///
    /// # Errors
    /// Returns [`FxError::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.currency_code.trim().is_empty() {
            return Err(FxError::Configuration("currency_code must not be empty".into()));
        }
        if self.redemption_cost <= 0 {
            return Err(FxError::Configuration(format!(
                "redemption_cost must be positive, got {}",
                self.redemption_cost
            )));
        }
        if self.history_limit == 0 {
            return Err(FxError::Configuration("history_limit must be > 0".into()));
        }
        if self.leaderboard_default == 0 || self.leaderboard_default > self.leaderboard_max {
            return Err(FxError::Configuration(format!(
                "leaderboard_default must be in 1..={}, got {}",
                self.leaderboard_max, self.leaderboard_default
            )));
        }
        if self.provisioning_timeout_ms == 0 || self.notification_timeout_ms == 0 {
            return Err(FxError::Configuration("timeouts must be > 0".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn provisioning_timeout(&self) -> Duration {
        Duration::from_millis(self.provisioning_timeout_ms)
    }

    #[must_use]
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }

    #[must_use]
    pub fn valuation_debounce(&self) -> Duration {
        Duration::from_millis(self.valuation_debounce_ms)
    }

    /// Clamp a requested leaderboard size into `1..=leaderboard_max`.
    #[must_use]
    pub fn leaderboard_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.leaderboard_default)
            .clamp(1, self.leaderboard_max)
    }
}

/// Operator setting: where event summaries are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogChannelConfig {
    pub channel_id: ChannelId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = LedgerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.redemption_cost, 100);
        assert_eq!(cfg.history_limit, 20);
        assert_eq!(cfg.remove_policy, DeltaPolicy::ClampAtZero);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = LedgerConfig::from_json_str(
            r#"{ "owner_id": 5, "provisioning_destination": 900, "history_roles": [1, 2] }"#,
        )
        .unwrap();
        assert_eq!(cfg.owner_id, Some(AccountId(5)));
        assert_eq!(cfg.provisioning_destination, Some(900));
        assert!(cfg.history_roles.contains(&RoleId(2)));
        assert_eq!(cfg.leaderboard_max, 15);
    }

    #[test]
    fn rejects_zero_cost() {
        let err = LedgerConfig::from_json_str(r#"{ "redemption_cost": 0 }"#).unwrap_err();
        assert!(matches!(err, FxError::Configuration(_)));
    }

    #[test]
    fn rejects_default_above_max() {
        let cfg = LedgerConfig {
            leaderboard_default: 20,
            ..LedgerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = LedgerConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().starts_with("FX_ERR_902"));
    }

    #[test]
    fn leaderboard_size_is_clamped() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.leaderboard_size(None), 10);
        assert_eq!(cfg.leaderboard_size(Some(15)), 15);
        assert_eq!(cfg.leaderboard_size(Some(50)), 15);
        assert_eq!(cfg.leaderboard_size(Some(0)), 1);
    }
}
