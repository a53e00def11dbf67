//! Best-effort forwarding of event summaries to the operator's log channel.
//!
//! Nothing in here can fail a command: an unset channel, an unreachable
//! settings store, a delivery error and a delivery timeout all end in a log
//! line and a silent return.

use std::sync::Arc;
use std::time::Duration;

use fxledger_store::SettingsStore;
use fxledger_types::MessageSender;

pub struct NotificationSink {
    sender: Arc<dyn MessageSender>,
    settings: Arc<dyn SettingsStore>,
    timeout: Duration,
}

impl NotificationSink {
    #[must_use]
    pub fn new(
        sender: Arc<dyn MessageSender>,
        settings: Arc<dyn SettingsStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            sender,
            settings,
            timeout,
        }
    }

    /// Forward `message` to the configured log channel, if any.
    pub async fn emit(&self, message: &str) {
        let channel = match self.settings.log_channel().await {
            Ok(Some(config)) => config.channel_id,
            Ok(None) => {
                tracing::debug!("No log channel configured, notification dropped");
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not read log channel, notification dropped");
                return;
            }
        };

        match tokio::time::timeout(self.timeout, self.sender.send(channel, message)).await {
            Ok(Ok(())) => tracing::debug!(channel = %channel, "Notification delivered"),
            Ok(Err(err)) => {
                tracing::warn!(channel = %channel, error = %err, "Notification delivery failed");
            }
            Err(_) => tracing::warn!(
                channel = %channel,
                timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                "Notification delivery timed out"
            ),
        }
    }
}
