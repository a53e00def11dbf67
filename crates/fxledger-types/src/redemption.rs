//! Redemption model: exchanging FX for a provisioned private resource.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐ balance ≥ cost ┌────────────┐ provisioned ┌─────────────┐ debited ┌───────────┐
//!   │ REQUESTED ├───────────────▶│ AUTHORIZED ├────────────▶│ PROVISIONED ├────────▶│ COMMITTED │
//!   └─────┬─────┘                └─────┬──────┘             └──────┬──────┘         └───────────┘
//!         │ insufficient               │ provisioning failed       │ drained concurrently
//!         ▼                            ▼                           ▼
//!   ┌──────────┐                 ┌──────────┐                ┌──────────┐
//!   │ REJECTED │                 │ REJECTED │                │ REJECTED │
//!   └──────────┘                 └──────────┘                └──────────┘
//! ```
//!
//! Balance is only ever touched on the PROVISIONED → COMMITTED edge.

use serde::{Deserialize, Serialize};

use crate::{AccountId, FxError, RedemptionMetadata, Result};

/// What a member asked to redeem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub requester_id: AccountId,
    pub service: String,
    pub platform: String,
    pub link: String,
    pub cost: i64,
}

impl RedemptionRequest {
    #[must_use]
    pub fn new(
        requester_id: AccountId,
        service: impl Into<String>,
        platform: impl Into<String>,
        link: impl Into<String>,
        cost: i64,
    ) -> Self {
        Self {
            requester_id,
            service: service.into(),
            platform: platform.into(),
            link: link.into(),
            cost,
        }
    }

    /// Reject requests with blank fields before anything is checked.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("service", &self.service),
            ("platform", &self.platform),
            ("link", &self.link),
        ] {
            if value.trim().is_empty() {
                return Err(FxError::InvalidRedemption {
                    reason: format!("{field} must not be empty"),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn metadata(&self) -> RedemptionMetadata {
        RedemptionMetadata {
            service: self.service.clone(),
            platform: self.platform.clone(),
            link: self.link.clone(),
        }
    }

    /// Name for the private resource: `"{service}-{requester}"`, lower-cased,
    /// whitespace replaced by dashes.
    #[must_use]
    pub fn resource_name(&self) -> String {
        let service: String = self
            .service
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .collect();
        format!("{}-{}", service, self.requester_id.get()).to_lowercase()
    }
}

/// Lifecycle position of one redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedemptionState {
    Requested,
    Authorized,
    Provisioned,
    /// Terminal: balance debited and entry logged.
    Committed,
    /// Terminal: nothing debited, nothing logged.
    Rejected,
}

impl RedemptionState {
    /// Transitions only move forward; terminal states are final.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Requested, Self::Authorized | Self::Rejected)
                | (Self::Authorized, Self::Provisioned | Self::Rejected)
                | (Self::Provisioned, Self::Committed | Self::Rejected)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }
}

impl std::fmt::Display for RedemptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "REQUESTED"),
            Self::Authorized => write!(f, "AUTHORIZED"),
            Self::Provisioned => write!(f, "PROVISIONED"),
            Self::Committed => write!(f, "COMMITTED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Parameters for the external provisioning collaborator.
///
/// The resource must be visible to everyone in `visible_to` and hidden from
/// the default population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub name: String,
    /// Where the platform should create the resource (category, folder...).
    pub destination: u64,
    pub owner: AccountId,
    pub visible_to: Vec<AccountId>,
    pub metadata: RedemptionMetadata,
}

/// Opaque reference to a provisioned resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub id: u64,
    pub name: String,
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<#{}>", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_only() {
        use RedemptionState::*;
        assert!(Requested.can_transition_to(Authorized));
        assert!(Authorized.can_transition_to(Provisioned));
        assert!(Provisioned.can_transition_to(Committed));
        assert!(Provisioned.can_transition_to(Rejected));
        assert!(!Requested.can_transition_to(Committed));
        assert!(!Committed.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Authorized));
        assert!(Committed.is_terminal() && Rejected.is_terminal());
    }

    #[test]
    fn resource_name_is_slugged() {
        let req = RedemptionRequest::new(AccountId(77), "Server Boost", "Discord", "x", 100);
        assert_eq!(req.resource_name(), "server-boost-77");
    }

    #[test]
    fn blank_fields_are_rejected() {
        let req = RedemptionRequest::new(AccountId(1), "boost", "  ", "x", 100);
        let err = req.validate().unwrap_err();
        assert!(matches!(err, FxError::InvalidRedemption { .. }));
        assert!(err.to_string().contains("platform"));
    }
}
