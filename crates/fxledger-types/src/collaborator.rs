//! Narrow interfaces to the hosting platform.
//!
//! The ledger calls out to exactly two external collaborators: one that
//! creates private resources for redemptions and one that delivers text to a
//! channel. Both are injected as trait objects so the core never depends on
//! a particular platform SDK.

use async_trait::async_trait;

use crate::{ChannelId, ProvisionRequest, ResourceHandle, Result};

/// Creates (and, for compensation, removes) private resources.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Create a resource visible only to `request.visible_to`.
    async fn provision_private_resource(&self, request: &ProvisionRequest) -> Result<ResourceHandle>;

    /// Remove a resource created by [`Provisioner::provision_private_resource`].
    async fn release(&self, handle: &ResourceHandle) -> Result<()>;
}

/// Delivers human-readable text to a channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, destination: ChannelId, text: &str) -> Result<()>;
}
