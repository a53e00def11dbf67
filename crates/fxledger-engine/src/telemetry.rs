//! Tracing subscriber setup for hosts embedding the ledger.

use fxledger_types::constants::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global `fmt` subscriber. `RUST_LOG` overrides `default_filter`,
/// which itself falls back to [`DEFAULT_LOG_FILTER`].
///
/// Returns `false` if a global subscriber was already installed, which makes
/// the call safe to repeat from tests.
pub fn init_tracing(default_filter: Option<&str>, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_LOG_FILTER)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
