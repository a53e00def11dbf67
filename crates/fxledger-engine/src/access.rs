//! Access control: the hard gate in front of every privileged command.
//!
//! Checks run before any store is touched. A failed check produces
//! [`FxError::Unauthorized`] and nothing else: no mutation, no log entry,
//! no notification.

use std::collections::BTreeSet;

use fxledger_types::{ActorCapabilities, FxError, LedgerConfig, Result, RoleId};

/// `true` if the actor holds administrator permission.
pub fn is_administrator(actor: &impl ActorCapabilities) -> bool {
    actor.is_administrator()
}

/// `true` iff the actor's roles intersect `allowed`.
pub fn has_authorized_role(actor: &impl ActorCapabilities, allowed: &BTreeSet<RoleId>) -> bool {
    actor.has_authorized_role(allowed)
}

/// Role sets granted privileged read/configuration access.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    history_roles: BTreeSet<RoleId>,
    log_admin_roles: BTreeSet<RoleId>,
}

impl AccessControl {
    #[must_use]
    pub fn new(history_roles: BTreeSet<RoleId>, log_admin_roles: BTreeSet<RoleId>) -> Self {
        Self {
            history_roles,
            log_admin_roles,
        }
    }

    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.history_roles.clone(), config.log_admin_roles.clone())
    }

    /// Gate for give / remove / reset.
    pub fn require_administrator(&self, actor: &impl ActorCapabilities) -> Result<()> {
        if is_administrator(actor) {
            return Ok(());
        }
        Err(Self::deny(actor, "administrator"))
    }

    /// Gate for viewing another member's history.
    pub fn require_history_access(&self, actor: &impl ActorCapabilities) -> Result<()> {
        if has_authorized_role(actor, &self.history_roles) {
            return Ok(());
        }
        Err(Self::deny(actor, "history role"))
    }

    /// Gate for configuring the log channel.
    pub fn require_log_admin(&self, actor: &impl ActorCapabilities) -> Result<()> {
        if has_authorized_role(actor, &self.log_admin_roles) {
            return Ok(());
        }
        Err(Self::deny(actor, "log admin role"))
    }

    fn deny(actor: &impl ActorCapabilities, capability: &'static str) -> FxError {
        tracing::warn!(actor = %actor.account_id(), capability, "Access denied");
        FxError::Unauthorized {
            actor: actor.account_id(),
            capability,
        }
    }
}

#[cfg(test)]
mod tests {
    use fxledger_types::{AccountId, Actor};

    use super::*;

    fn roles(ids: &[u64]) -> BTreeSet<RoleId> {
        ids.iter().copied().map(RoleId).collect()
    }

    #[test]
    fn administrator_gate() {
        let ac = AccessControl::default();
        assert!(ac.require_administrator(&Actor::administrator(AccountId(1))).is_ok());

        let err = ac.require_administrator(&Actor::member(AccountId(2))).unwrap_err();
        assert!(matches!(
            err,
            FxError::Unauthorized { actor: AccountId(2), capability: "administrator" }
        ));
    }

    #[test]
    fn history_gate_uses_role_intersection() {
        let ac = AccessControl::new(roles(&[10, 11]), roles(&[20]));
        let staff = Actor::member(AccountId(1)).with_role(RoleId(11));
        let plain = Actor::member(AccountId(2)).with_role(RoleId(20));

        assert!(ac.require_history_access(&staff).is_ok());
        assert!(ac.require_history_access(&plain).is_err());
    }

    #[test]
    fn administrator_is_not_implicitly_a_log_admin() {
        let ac = AccessControl::new(roles(&[]), roles(&[20]));
        let admin = Actor::administrator(AccountId(1));
        assert!(ac.require_log_admin(&admin).is_err());
        assert!(ac.require_log_admin(&admin.clone().with_role(RoleId(20))).is_ok());
    }

    #[test]
    fn free_predicates() {
        let actor = Actor::member(AccountId(1)).with_role(RoleId(3));
        assert!(!is_administrator(&actor));
        assert!(has_authorized_role(&actor, &roles(&[3])));
        assert!(!has_authorized_role(&actor, &roles(&[4])));
    }
}
