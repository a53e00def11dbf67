//! System-wide constants for the FX ledger.

/// The ledger's single currency code.
pub const CURRENCY_CODE: &str = "FX";

/// Fixed cost of one redemption.
pub const DEFAULT_REDEMPTION_COST: i64 = 100;

/// Entries returned by the `history` command.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Rows returned by `leaderboard` when no size is given.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Largest leaderboard a caller may request.
pub const MAX_LEADERBOARD_SIZE: usize = 15;

/// Upper bound on one provisioning call, in milliseconds.
pub const DEFAULT_PROVISIONING_TIMEOUT_MS: u64 = 10_000;

/// Upper bound on one notification delivery, in milliseconds.
pub const DEFAULT_NOTIFICATION_TIMEOUT_MS: u64 = 5_000;

/// Quiet period before the background worker recomputes the valuation.
pub const DEFAULT_VALUATION_DEBOUNCE_MS: u64 = 500;

/// Decimal places kept on valuation snapshots.
pub const VALUATION_DECIMALS: u32 = 2;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
