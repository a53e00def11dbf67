//! Test doubles for the platform collaborators. **Never use in production.**

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    ChannelId, FxError, MessageSender, ProvisionRequest, Provisioner, ResourceHandle, Result,
};

/// How a [`StubProvisioner`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionBehavior {
    Succeed,
    Fail,
    /// Sleep this long before succeeding.
    Delay(Duration),
}

/// Provisioner that records every call.
pub struct StubProvisioner {
    behavior: ProvisionBehavior,
    next_id: AtomicU64,
    requests: Mutex<Vec<ProvisionRequest>>,
    released: Mutex<Vec<ResourceHandle>>,
}

impl StubProvisioner {
    #[must_use]
    pub fn new(behavior: ProvisionBehavior) -> Self {
        Self {
            behavior,
            next_id: AtomicU64::new(1),
            requests: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(ProvisionBehavior::Succeed)
    }

    #[must_use]
    pub fn failing() -> Self {
        Self::new(ProvisionBehavior::Fail)
    }

    /// Number of provisioning calls received.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ProvisionRequest> {
        self.requests.lock().clone()
    }

    pub fn released(&self) -> Vec<ResourceHandle> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl Provisioner for StubProvisioner {
    async fn provision_private_resource(&self, request: &ProvisionRequest) -> Result<ResourceHandle> {
        self.requests.lock().push(request.clone());
        match self.behavior {
            ProvisionBehavior::Succeed => {}
            ProvisionBehavior::Fail => {
                return Err(FxError::ProvisioningFailed {
                    reason: "stub provisioner refused".into(),
                });
            }
            ProvisionBehavior::Delay(delay) => tokio::time::sleep(delay).await,
        }
        Ok(ResourceHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: request.name.clone(),
        })
    }

    async fn release(&self, handle: &ResourceHandle) -> Result<()> {
        self.released.lock().push(handle.clone());
        Ok(())
    }
}

/// Message sender that records deliveries, or fails every one of them.
pub struct RecordingSender {
    fail: bool,
    attempts: AtomicUsize,
    sent: Mutex<Vec<(ChannelId, String)>>,
}

impl RecordingSender {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail: false,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Successful deliveries, in order.
    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().clone()
    }

    /// Calls to `send`, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, destination: ChannelId, text: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FxError::DeliveryFailed {
                reason: format!("{destination} unreachable"),
            });
        }
        self.sent.lock().push((destination, text.to_string()));
        Ok(())
    }
}
