//! Who is issuing a command.
//!
//! The ledger never inspects a platform member object directly. Anything
//! that can answer the two capability questions below can act on it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AccountId, RoleId};

/// Capability predicates the access layer needs from an identity.
pub trait ActorCapabilities {
    /// The account this actor owns (used for self-service commands).
    fn account_id(&self) -> AccountId;

    /// Whether the actor holds administrator permission on the platform.
    fn is_administrator(&self) -> bool;

    /// The roles the actor currently holds.
    fn roles(&self) -> &BTreeSet<RoleId>;

    /// `true` iff the actor's roles intersect `allowed`.
    fn has_authorized_role(&self, allowed: &BTreeSet<RoleId>) -> bool {
        !self.roles().is_disjoint(allowed)
    }
}

/// A resolved actor, as handed over by the gateway for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: AccountId,
    pub administrator: bool,
    pub roles: BTreeSet<RoleId>,
}

impl Actor {
    /// A member with no special permissions.
    #[must_use]
    pub fn member(id: AccountId) -> Self {
        Self {
            id,
            administrator: false,
            roles: BTreeSet::new(),
        }
    }

    /// A member holding administrator permission.
    #[must_use]
    pub fn administrator(id: AccountId) -> Self {
        Self {
            id,
            administrator: true,
            roles: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: RoleId) -> Self {
        self.roles.insert(role);
        self
    }
}

impl ActorCapabilities for Actor {
    fn account_id(&self) -> AccountId {
        self.id
    }

    fn is_administrator(&self) -> bool {
        self.administrator
    }

    fn roles(&self) -> &BTreeSet<RoleId> {
        &self.roles
    }
}
