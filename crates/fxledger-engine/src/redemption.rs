//! Redemption workflow: exchange FX for a provisioned private resource.
//!
//! ## Flow
//!
//! ```text
//! lock(account)
//!   → REQUESTED   validate fields
//!   → AUTHORIZED  balance ≥ cost            (else REJECTED, nothing touched)
//!   → PROVISIONED provisioner, with timeout (else REJECTED, nothing touched)
//!   → COMMITTED   conditional debit → append `redeem` entry
//!                 → mark valuation dirty → best-effort notification
//! unlock(account)
//! ```
//!
//! The per-account lock spans the whole flow, so two attempts from an
//! account holding exactly one redemption's worth cannot both provision.
//! The debit itself is a conditional decrement, so an admin `remove` racing
//! the provisioning step cannot push the account below zero either; in that
//! case the fresh resource is released again and the attempt is rejected.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fxledger_store::{BalanceStore, LedgerLog};
use fxledger_types::{
    AccountId, ActorCapabilities, DebitOutcome, DeltaPolicy, FxError, LedgerConfig, LedgerEntry,
    LedgerReason, NewLedgerEntry, ProvisionRequest, Provisioner, RedemptionRequest,
    RedemptionState, ResourceHandle, Result,
};

use crate::account_lock::AccountLocks;
use crate::notify::NotificationSink;
use crate::valuation::ValuationTracker;

/// Proof of a committed redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionReceipt {
    pub request: RedemptionRequest,
    pub resource: ResourceHandle,
    pub new_balance: i64,
    pub entry: LedgerEntry,
}

impl fmt::Display for RedemptionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} redeemed {} FX for {} on {} ({}). Ticket {} opened, new balance {} FX.",
            self.request.requester_id,
            self.request.cost,
            self.request.service,
            self.request.platform,
            self.request.link,
            self.resource,
            self.new_balance
        )
    }
}

/// Where one attempt is in the state machine.
struct Attempt {
    account: AccountId,
    state: RedemptionState,
}

impl Attempt {
    fn new(account: AccountId) -> Self {
        Self {
            account,
            state: RedemptionState::Requested,
        }
    }

    fn advance(&mut self, next: RedemptionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal redemption transition {} -> {next}",
            self.state
        );
        tracing::debug!(account = %self.account, from = %self.state, to = %next, "Redemption transition");
        self.state = next;
    }

    fn reject(&mut self, err: FxError) -> FxError {
        self.advance(RedemptionState::Rejected);
        tracing::warn!(account = %self.account, error = %err, "Redemption rejected");
        err
    }
}

pub struct RedemptionWorkflow {
    balances: Arc<dyn BalanceStore>,
    log: Arc<dyn LedgerLog>,
    valuation: Arc<ValuationTracker>,
    notifications: Arc<NotificationSink>,
    provisioner: Arc<dyn Provisioner>,
    locks: AccountLocks,
    cost: i64,
    timeout: Duration,
    owner_id: Option<AccountId>,
    destination: Option<u64>,
}

impl RedemptionWorkflow {
    #[must_use]
    pub fn new(
        config: &LedgerConfig,
        balances: Arc<dyn BalanceStore>,
        log: Arc<dyn LedgerLog>,
        valuation: Arc<ValuationTracker>,
        notifications: Arc<NotificationSink>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            balances,
            log,
            valuation,
            notifications,
            provisioner,
            locks: AccountLocks::new(),
            cost: config.redemption_cost,
            timeout: config.provisioning_timeout(),
            owner_id: config.owner_id,
            destination: config.provisioning_destination,
        }
    }

    /// Run one redemption for `actor` to completion.
    ///
    /// # Errors
    /// - `InvalidRedemption` for blank fields
    /// - `InsufficientBalance` if the balance is below the cost
    /// - `MissingConfiguration` if no owner or destination is configured
    /// - `ProvisioningFailed` / `ProvisioningTimeout` from the provisioning step
    /// - `StoreUnavailable` from any store
    ///
    /// Every error leaves balance and log untouched.
    pub async fn redeem(
        &self,
        actor: &impl ActorCapabilities,
        service: &str,
        platform: &str,
        link: &str,
    ) -> Result<RedemptionReceipt> {
        let account = actor.account_id();
        let request = RedemptionRequest::new(account, service, platform, link, self.cost);
        request.validate()?;

        let _guard = self.locks.lock(account).await;
        let mut attempt = Attempt::new(account);

        // ── AUTHORIZE ────────────────────────────────────────────────────
        let available = self.balances.get_or_create(account).await?;
        if available < self.cost {
            return Err(attempt.reject(FxError::InsufficientBalance {
                needed: self.cost,
                available,
            }));
        }
        attempt.advance(RedemptionState::Authorized);

        // ── PROVISION ────────────────────────────────────────────────────
        let provision = self
            .provision_request(&request)
            .map_err(|e| attempt.reject(e))?;
        let resource = match tokio::time::timeout(
            self.timeout,
            self.provisioner.provision_private_resource(&provision),
        )
        .await
        {
            Ok(Ok(handle)) => handle,
            Ok(Err(err)) => {
                let err = match err {
                    FxError::ProvisioningFailed { .. } => err,
                    other => FxError::ProvisioningFailed {
                        reason: other.to_string(),
                    },
                };
                return Err(attempt.reject(err));
            }
            Err(_) => {
                return Err(attempt.reject(FxError::ProvisioningTimeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }));
            }
        };
        attempt.advance(RedemptionState::Provisioned);

        // ── COMMIT ───────────────────────────────────────────────────────
        let new_balance = match self.balances.debit_if_sufficient(account, self.cost).await {
            Ok(DebitOutcome::Debited { new_balance }) => new_balance,
            Ok(DebitOutcome::Insufficient { available }) => {
                self.release(&resource).await;
                return Err(attempt.reject(FxError::InsufficientBalance {
                    needed: self.cost,
                    available,
                }));
            }
            Err(err) => {
                self.release(&resource).await;
                return Err(attempt.reject(err));
            }
        };

        let entry = NewLedgerEntry::new(account, -self.cost, LedgerReason::Redeem, account)
            .with_metadata(request.metadata());
        let entry = match self.log.append(entry).await {
            Ok(entry) => entry,
            Err(err) => {
                // A debit without its entry must not survive.
                self.refund(account).await;
                self.release(&resource).await;
                return Err(attempt.reject(err));
            }
        };
        attempt.advance(RedemptionState::Committed);

        tracing::info!(
            account = %account,
            resource = %resource,
            service = %request.service,
            new_balance,
            "Redemption committed"
        );

        self.valuation.mark_dirty();
        let receipt = RedemptionReceipt {
            request,
            resource,
            new_balance,
            entry,
        };
        self.notifications.emit(&receipt.to_string()).await;
        Ok(receipt)
    }

    fn provision_request(&self, request: &RedemptionRequest) -> Result<ProvisionRequest> {
        let owner = self.owner_id.ok_or(FxError::MissingConfiguration {
            setting: "owner_id",
        })?;
        let destination = self.destination.ok_or(FxError::MissingConfiguration {
            setting: "provisioning_destination",
        })?;

        let mut visible_to = vec![request.requester_id];
        if owner != request.requester_id {
            visible_to.push(owner);
        }
        Ok(ProvisionRequest {
            name: request.resource_name(),
            destination,
            owner,
            visible_to,
            metadata: request.metadata(),
        })
    }

    async fn release(&self, resource: &ResourceHandle) {
        if let Err(err) = self.provisioner.release(resource).await {
            tracing::error!(resource = %resource, error = %err, "Failed to release provisioned resource");
        }
    }

    async fn refund(&self, account: AccountId) {
        if let Err(err) = self
            .balances
            .apply_delta(account, self.cost, DeltaPolicy::AllowNegative)
            .await
        {
            tracing::error!(account = %account, error = %err, "Failed to refund redemption debit");
        }
    }
}
