//! Operator settings: a singleton record holding the log channel.

use async_trait::async_trait;
use fxledger_types::{LogChannelConfig, Result};
use parking_lot::RwLock;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn log_channel(&self) -> Result<Option<LogChannelConfig>>;

    /// Replace the log channel setting.
    async fn set_log_channel(&self, config: LogChannelConfig) -> Result<()>;
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    log_channel: RwLock<Option<LogChannelConfig>>,
}

impl InMemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn log_channel(&self) -> Result<Option<LogChannelConfig>> {
        Ok(*self.log_channel.read())
    }

    async fn set_log_channel(&self, config: LogChannelConfig) -> Result<()> {
        *self.log_channel.write() = Some(config);
        Ok(())
    }
}
