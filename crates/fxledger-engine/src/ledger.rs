//! The command surface: one method per command the gateway exposes.
//!
//! Every privileged command runs the access gate first, validates its
//! arguments second and only then touches a store. Balance-affecting
//! commands append exactly one ledger entry, mark the valuation dirty and
//! forward a summary to the log channel.

use std::fmt;
use std::sync::Arc;

use fxledger_store::{
    BalanceStore, InMemoryBalanceStore, InMemoryLedgerLog, InMemorySettingsStore,
    InMemoryValuationHistory, LedgerLog, SettingsStore, ValuationHistory,
};
use fxledger_types::constants::VERSION;
use fxledger_types::{
    AccountId, ActorCapabilities, ChannelId, FxError, LedgerConfig, LedgerEntry, LedgerReason,
    LogChannelConfig, MessageSender, NewLedgerEntry, Provisioner, Result, ValuationSnapshot,
};
use tokio::task::JoinHandle;

use crate::access::AccessControl;
use crate::leaderboard::{Leaderboard, LeaderboardQuery};
use crate::notify::NotificationSink;
use crate::redemption::{RedemptionReceipt, RedemptionWorkflow};
use crate::valuation::ValuationTracker;

/// Store handles the ledger is built on.
#[derive(Clone)]
pub struct Stores {
    pub balances: Arc<dyn BalanceStore>,
    pub log: Arc<dyn LedgerLog>,
    pub valuation_history: Arc<dyn ValuationHistory>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    /// Fresh in-process stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            balances: Arc::new(InMemoryBalanceStore::new()),
            log: Arc::new(InMemoryLedgerLog::new()),
            valuation_history: Arc::new(InMemoryValuationHistory::new()),
            settings: Arc::new(InMemorySettingsStore::new()),
        }
    }
}

/// Platform collaborators the ledger calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub provisioner: Arc<dyn Provisioner>,
    pub sender: Arc<dyn MessageSender>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Outcome of `give` / `remove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub actor: AccountId,
    pub target: AccountId,
    pub reason: LedgerReason,
    /// The amount requested, always positive.
    pub amount: i64,
    pub new_balance: i64,
    pub entry: LedgerEntry,
}

impl fmt::Display for BalanceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, prep) = match self.reason {
            LedgerReason::Give => ("gave", "to"),
            _ => ("removed", "from"),
        };
        write!(
            f,
            "{} {verb} {} FX {prep} {}. New balance: {} FX.",
            self.actor, self.amount, self.target, self.new_balance
        )
    }
}

/// Outcome of `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub actor: AccountId,
    pub target: AccountId,
    pub previous_balance: i64,
    pub entry: LedgerEntry,
}

impl fmt::Display for ResetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reset {} to 0 FX (was {} FX).",
            self.actor, self.target, self.previous_balance
        )
    }
}

/// Outcome of `fx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceReport {
    pub account: AccountId,
    pub balance: i64,
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} holds {} FX.", self.account, self.balance)
    }
}

/// Outcome of `history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReport {
    pub account: AccountId,
    /// Most recent first.
    pub entries: Vec<LedgerEntry>,
}

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No history for {}.", self.account);
        }
        write!(f, "History for {}:", self.account)?;
        for e in &self.entries {
            write!(
                f,
                "\n{} {} {:+} FX by {}",
                e.timestamp.format("%Y-%m-%d %H:%M"),
                e.reason,
                e.delta,
                e.actor_id
            )?;
            if let Some(meta) = &e.metadata {
                write!(f, " ({} on {})", meta.service, meta.platform)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FxLedger
// ---------------------------------------------------------------------------

pub struct FxLedger {
    config: LedgerConfig,
    access: AccessControl,
    balances: Arc<dyn BalanceStore>,
    log: Arc<dyn LedgerLog>,
    settings: Arc<dyn SettingsStore>,
    valuation: Arc<ValuationTracker>,
    leaderboard: LeaderboardQuery,
    notifications: Arc<NotificationSink>,
    redemption: RedemptionWorkflow,
}

impl FxLedger {
    /// Wire a ledger from validated configuration, stores and collaborators.
    pub fn new(config: LedgerConfig, stores: Stores, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let valuation = Arc::new(ValuationTracker::new(
            Arc::clone(&stores.balances),
            Arc::clone(&stores.valuation_history),
        ));
        let notifications = Arc::new(NotificationSink::new(
            collaborators.sender,
            Arc::clone(&stores.settings),
            config.notification_timeout(),
        ));
        let redemption = RedemptionWorkflow::new(
            &config,
            Arc::clone(&stores.balances),
            Arc::clone(&stores.log),
            Arc::clone(&valuation),
            Arc::clone(&notifications),
            collaborators.provisioner,
        );

        tracing::info!(
            version = VERSION,
            redemption_cost = config.redemption_cost,
            remove_policy = %config.remove_policy,
            "FX ledger ready"
        );
        Ok(Self {
            access: AccessControl::from_config(&config),
            leaderboard: LeaderboardQuery::new(Arc::clone(&stores.balances)),
            balances: stores.balances,
            log: stores.log,
            settings: stores.settings,
            valuation,
            notifications,
            redemption,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn valuation(&self) -> &Arc<ValuationTracker> {
        &self.valuation
    }

    /// Start the debounced valuation recompute loop.
    pub fn start_valuation_worker(&self) -> JoinHandle<()> {
        self.valuation.spawn_worker(self.config.valuation_debounce())
    }

    /// `give`: administrator credits `amount` to `target`.
    pub async fn give(
        &self,
        actor: &impl ActorCapabilities,
        currency: &str,
        amount: i64,
        target: AccountId,
    ) -> Result<BalanceChange> {
        self.access.require_administrator(actor)?;
        self.check_currency(currency)?;
        Self::check_amount(amount)?;

        let new_balance = self
            .balances
            .apply_delta(target, amount, self.config.give_policy)
            .await?;
        self.record_change(actor, target, LedgerReason::Give, amount, new_balance)
            .await
    }

    /// `remove`: administrator debits `amount` from `target`.
    pub async fn remove(
        &self,
        actor: &impl ActorCapabilities,
        currency: &str,
        amount: i64,
        target: AccountId,
    ) -> Result<BalanceChange> {
        self.access.require_administrator(actor)?;
        self.check_currency(currency)?;
        Self::check_amount(amount)?;

        let new_balance = self
            .balances
            .apply_delta(target, -amount, self.config.remove_policy)
            .await?;
        self.record_change(actor, target, LedgerReason::Remove, amount, new_balance)
            .await
    }

    /// `fx`: anyone reads a balance; defaults to the caller's own.
    pub async fn balance(
        &self,
        actor: &impl ActorCapabilities,
        target: Option<AccountId>,
    ) -> Result<BalanceReport> {
        let account = target.unwrap_or_else(|| actor.account_id());
        let balance = self.balances.get_or_create(account).await?;
        Ok(BalanceReport { account, balance })
    }

    /// `leaderboard`: top balances, size clamped to the configured range.
    pub async fn leaderboard(&self, size: Option<usize>) -> Result<Leaderboard> {
        let n = self.config.leaderboard_size(size);
        Ok(Leaderboard {
            rows: self.leaderboard.top_n(n).await?,
        })
    }

    /// `reset`: administrator sets `target` back to 0.
    pub async fn reset(&self, actor: &impl ActorCapabilities, target: AccountId) -> Result<ResetReport> {
        self.access.require_administrator(actor)?;

        let previous_balance = self.balances.set_balance(target, 0).await?;
        let delta = previous_balance
            .checked_neg()
            .ok_or(FxError::BalanceOverflow {
                account: target,
                delta: previous_balance,
            })?;
        let entry = self
            .append(NewLedgerEntry::new(
                target,
                delta,
                LedgerReason::Reset,
                actor.account_id(),
            ))
            .await?;
        tracing::info!(actor = %actor.account_id(), target = %target, previous_balance, "Balance reset");

        self.valuation.mark_dirty();
        let report = ResetReport {
            actor: actor.account_id(),
            target,
            previous_balance,
            entry,
        };
        self.notifications.emit(&report.to_string()).await;
        Ok(report)
    }

    /// `redeem`: spend the redemption cost on a private resource.
    pub async fn redeem(
        &self,
        actor: &impl ActorCapabilities,
        service: &str,
        platform: &str,
        link: &str,
    ) -> Result<RedemptionReceipt> {
        self.redemption.redeem(actor, service, platform, link).await
    }

    /// `history`: the most recent entries for `target`.
    pub async fn history(&self, actor: &impl ActorCapabilities, target: AccountId) -> Result<HistoryReport> {
        self.access.require_history_access(actor)?;
        let entries = self
            .log
            .query_by_account(target, self.config.history_limit)
            .await?;
        Ok(HistoryReport {
            account: target,
            entries,
        })
    }

    /// `logs`: point notifications at `channel`.
    pub async fn set_log_channel(
        &self,
        actor: &impl ActorCapabilities,
        channel: ChannelId,
    ) -> Result<LogChannelConfig> {
        self.access.require_log_admin(actor)?;
        let config = LogChannelConfig { channel_id: channel };
        self.settings.set_log_channel(config).await?;
        tracing::info!(actor = %actor.account_id(), channel = %channel, "Log channel configured");
        self.notifications
            .emit(&format!("FX events will be logged to {channel}."))
            .await;
        Ok(config)
    }

    /// `currency_rate`: the valuation series for charting, pending
    /// mutations included.
    pub async fn currency_rate(&self) -> Result<Vec<ValuationSnapshot>> {
        self.valuation.series().await
    }

    // -----------------------------------------------------------------------

    fn check_currency(&self, currency: &str) -> Result<()> {
        if currency.trim().eq_ignore_ascii_case(&self.config.currency_code) {
            Ok(())
        } else {
            Err(FxError::InvalidCurrency {
                code: currency.to_string(),
            })
        }
    }

    fn check_amount(amount: i64) -> Result<()> {
        if amount > 0 {
            Ok(())
        } else {
            Err(FxError::InvalidAmount { amount })
        }
    }

    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        let account = entry.account_id;
        self.log.append(entry).await.map_err(|err| {
            // The balance already moved; surface loudly so an operator can
            // reconcile.
            tracing::error!(account = %account, error = %err, "Ledger append failed after balance mutation");
            err
        })
    }

    async fn record_change(
        &self,
        actor: &impl ActorCapabilities,
        target: AccountId,
        reason: LedgerReason,
        amount: i64,
        new_balance: i64,
    ) -> Result<BalanceChange> {
        let delta = if reason == LedgerReason::Give { amount } else { -amount };
        let entry = self
            .append(NewLedgerEntry::new(target, delta, reason, actor.account_id()))
            .await?;
        tracing::info!(
            actor = %actor.account_id(),
            target = %target,
            reason = %reason,
            delta,
            new_balance,
            "Balance changed"
        );

        self.valuation.mark_dirty();
        let change = BalanceChange {
            actor: actor.account_id(),
            target,
            reason,
            amount,
            new_balance,
            entry,
        };
        self.notifications.emit(&change.to_string()).await;
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use fxledger_store::testing::AppendFailingLog;
    use fxledger_types::testing::{RecordingSender, StubProvisioner};
    use fxledger_types::{Actor, DeltaPolicy, RoleId};

    use super::*;

    fn ledger() -> (FxLedger, Arc<RecordingSender>) {
        ledger_with(LedgerConfig::default(), Stores::in_memory())
    }

    fn ledger_with(config: LedgerConfig, stores: Stores) -> (FxLedger, Arc<RecordingSender>) {
        let sender = Arc::new(RecordingSender::new());
        let ledger = FxLedger::new(
            config,
            stores,
            Collaborators {
                provisioner: Arc::new(StubProvisioner::succeeding()),
                sender: sender.clone(),
            },
        )
        .unwrap();
        (ledger, sender)
    }

    #[tokio::test]
    async fn currency_check_is_case_insensitive() {
        let (ledger, _) = ledger();
        let admin = Actor::administrator(AccountId(1));
        assert!(ledger.give(&admin, "fx", 5, AccountId(2)).await.is_ok());
        let err = ledger.give(&admin, "USD", 5, AccountId(2)).await.unwrap_err();
        assert!(matches!(err, FxError::InvalidCurrency { .. }));
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let (ledger, _) = ledger();
        let admin = Actor::administrator(AccountId(1));
        for amount in [0, -10] {
            let err = ledger.give(&admin, "FX", amount, AccountId(2)).await.unwrap_err();
            assert!(matches!(err, FxError::InvalidAmount { .. }));
            let err = ledger.remove(&admin, "FX", amount, AccountId(2)).await.unwrap_err();
            assert!(matches!(err, FxError::InvalidAmount { .. }));
        }
        assert!(ledger.log.query_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_logs_the_removed_amount() {
        let (ledger, _) = ledger();
        let admin = Actor::administrator(AccountId(1));
        ledger.give(&admin, "FX", 70, AccountId(2)).await.unwrap();
        let report = ledger.reset(&admin, AccountId(2)).await.unwrap();
        assert_eq!(report.previous_balance, 70);
        assert_eq!(report.entry.delta, -70);
        assert_eq!(report.entry.reason, LedgerReason::Reset);
        assert_eq!(ledger.balance(&admin, Some(AccountId(2))).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn reset_after_deepest_negative_balance() {
        let config = LedgerConfig {
            remove_policy: DeltaPolicy::AllowNegative,
            ..LedgerConfig::default()
        };
        let (ledger, _) = ledger_with(config, Stores::in_memory());
        let admin = Actor::administrator(AccountId(1));
        let target = AccountId(2);

        ledger.remove(&admin, "FX", i64::MAX, target).await.unwrap();
        let err = ledger.remove(&admin, "FX", 1, target).await.unwrap_err();
        assert!(matches!(err, FxError::BalanceOverflow { .. }));
        assert_eq!(ledger.balances.find(target).await.unwrap(), Some(-i64::MAX));

        let report = ledger.reset(&admin, target).await.unwrap();
        assert_eq!(report.previous_balance, -i64::MAX);
        assert_eq!(report.entry.delta, i64::MAX);
        assert_eq!(ledger.balances.find(target).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn audit_write_failure_propagates_after_mutation() {
        let log = Arc::new(AppendFailingLog::new());
        let stores = Stores {
            log: log.clone(),
            ..Stores::in_memory()
        };
        let (ledger, sender) = ledger_with(LedgerConfig::default(), stores);
        ledger
            .settings
            .set_log_channel(LogChannelConfig { channel_id: ChannelId(9) })
            .await
            .unwrap();
        let admin = Actor::administrator(AccountId(1));
        let target = AccountId(2);

        let err = ledger.give(&admin, "FX", 10, target).await.unwrap_err();
        assert!(matches!(err, FxError::StoreUnavailable { .. }));
        assert_eq!(ledger.balances.find(target).await.unwrap(), Some(10));

        let err = ledger.remove(&admin, "FX", 4, target).await.unwrap_err();
        assert!(matches!(err, FxError::StoreUnavailable { .. }));
        assert_eq!(ledger.balances.find(target).await.unwrap(), Some(6));

        let err = ledger.reset(&admin, target).await.unwrap_err();
        assert!(matches!(err, FxError::StoreUnavailable { .. }));
        assert_eq!(ledger.balances.find(target).await.unwrap(), Some(0));

        assert_eq!(log.attempts(), 3);
        assert!(!ledger.valuation.is_dirty());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn balance_defaults_to_self() {
        let (ledger, _) = ledger();
        let member = Actor::member(AccountId(8));
        let report = ledger.balance(&member, None).await.unwrap();
        assert_eq!(report, BalanceReport { account: AccountId(8), balance: 0 });
        assert_eq!(report.to_string(), "<@8> holds 0 FX.");
    }

    #[tokio::test]
    async fn log_channel_requires_role_and_routes_notifications() {
        let sender = Arc::new(RecordingSender::new());
        let config = LedgerConfig {
            log_admin_roles: [RoleId(20)].into_iter().collect(),
            ..LedgerConfig::default()
        };
        let ledger = FxLedger::new(
            config,
            Stores::in_memory(),
            Collaborators {
                provisioner: Arc::new(StubProvisioner::succeeding()),
                sender: sender.clone(),
            },
        )
        .unwrap();

        let admin = Actor::administrator(AccountId(1));
        let err = ledger.set_log_channel(&admin, ChannelId(3)).await.unwrap_err();
        assert!(matches!(err, FxError::Unauthorized { .. }));

        let staff = Actor::member(AccountId(2)).with_role(RoleId(20));
        ledger.set_log_channel(&staff, ChannelId(3)).await.unwrap();
        ledger.give(&admin, "FX", 10, AccountId(4)).await.unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(channel, _)| *channel == ChannelId(3)));
        assert_eq!(sent[1].1, "<@1> gave 10 FX to <@4>. New balance: 10 FX.");
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = LedgerConfig {
            redemption_cost: -1,
            ..LedgerConfig::default()
        };
        let result = FxLedger::new(
            config,
            Stores::in_memory(),
            Collaborators {
                provisioner: Arc::new(StubProvisioner::succeeding()),
                sender: Arc::new(RecordingSender::new()),
            },
        );
        assert!(matches!(result, Err(FxError::Configuration(_))));
    }

    #[tokio::test]
    async fn history_report_renders_entries() {
        let (ledger, _) = ledger();
        let admin = Actor::administrator(AccountId(1));
        ledger.give(&admin, "FX", 10, AccountId(2)).await.unwrap();
        let report = HistoryReport {
            account: AccountId(2),
            entries: ledger.log.query_by_account(AccountId(2), 20).await.unwrap(),
        };
        let text = report.to_string();
        assert!(text.starts_with("History for <@2>:"));
        assert!(text.contains("give +10 FX by <@1>"));
    }
}
