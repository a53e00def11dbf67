//! Account balances.
//!
//! Every mutation is a single atomic primitive against the store. Apart from
//! the absolute [`BalanceStore::set_balance`] used by resets there is no way
//! to write back a balance computed by the caller: a read followed by a
//! separate write loses updates when two commands touch the same account.

use std::collections::HashMap;

use async_trait::async_trait;
use fxledger_types::{Account, AccountId, DebitOutcome, DeltaPolicy, Result};
use parking_lot::RwLock;

/// Mapping from account to integer balance.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Current balance, creating the account at 0 if it has no record.
    ///
    /// Idempotent: concurrent first access by the same account creates one
    /// record, never two.
    async fn get_or_create(&self, account: AccountId) -> Result<i64>;

    /// Current balance without creating anything. `None` if the account has
    /// never been referenced.
    async fn find(&self, account: AccountId) -> Result<Option<i64>>;

    /// Atomically add `delta` under `policy` and return the new balance.
    /// Creates the account if needed.
    async fn apply_delta(&self, account: AccountId, delta: i64, policy: DeltaPolicy) -> Result<i64>;

    /// Atomically subtract `amount` iff the result stays ≥ 0.
    async fn debit_if_sufficient(&self, account: AccountId, amount: i64) -> Result<DebitOutcome>;

    /// Atomically overwrite the balance. Returns the balance it replaced
    /// (0 for a new account).
    async fn set_balance(&self, account: AccountId, value: i64) -> Result<i64>;

    /// Every account record, ordered by id.
    async fn accounts(&self) -> Result<Vec<Account>>;
}

/// In-process balance store.
pub struct InMemoryBalanceStore {
    balances: RwLock<HashMap<AccountId, i64>>,
}

impl InMemoryBalanceStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
        }
    }

    /// Number of account records.
    pub fn len(&self) -> usize {
        self.balances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.read().is_empty()
    }
}

impl Default for InMemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn get_or_create(&self, account: AccountId) -> Result<i64> {
        if let Some(balance) = self.balances.read().get(&account) {
            return Ok(*balance);
        }
        let mut balances = self.balances.write();
        let balance = *balances.entry(account).or_insert_with(|| {
            tracing::debug!(account = %account, "Account created");
            0
        });
        Ok(balance)
    }

    async fn find(&self, account: AccountId) -> Result<Option<i64>> {
        Ok(self.balances.read().get(&account).copied())
    }

    async fn apply_delta(&self, account: AccountId, delta: i64, policy: DeltaPolicy) -> Result<i64> {
        let mut balances = self.balances.write();
        let current = balances.get(&account).copied().unwrap_or(0);
        let next = policy.apply(account, current, delta)?;
        balances.insert(account, next);
        Ok(next)
    }

    async fn debit_if_sufficient(&self, account: AccountId, amount: i64) -> Result<DebitOutcome> {
        let mut balances = self.balances.write();
        let current = *balances.entry(account).or_insert(0);
        match current.checked_sub(amount) {
            Some(next) if next >= 0 => {
                balances.insert(account, next);
                Ok(DebitOutcome::Debited { new_balance: next })
            }
            _ => Ok(DebitOutcome::Insufficient { available: current }),
        }
    }

    async fn set_balance(&self, account: AccountId, value: i64) -> Result<i64> {
        Ok(self.balances.write().insert(account, value).unwrap_or(0))
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self
            .balances
            .read()
            .iter()
            .map(|(id, balance)| Account {
                id: *id,
                balance: *balance,
            })
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fxledger_types::FxError;
    use rand::Rng;

    use super::*;

    #[tokio::test]
    async fn first_reference_creates_at_zero() {
        let store = InMemoryBalanceStore::new();
        let a = AccountId(1);
        assert_eq!(store.find(a).await.unwrap(), None);
        assert_eq!(store.get_or_create(a).await.unwrap(), 0);
        assert_eq!(store.find(a).await.unwrap(), Some(0));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn clamp_at_zero_floors() {
        let store = InMemoryBalanceStore::new();
        let a = AccountId(1);
        store.apply_delta(a, 50, DeltaPolicy::AllowNegative).await.unwrap();
        let after = store.apply_delta(a, -80, DeltaPolicy::ClampAtZero).await.unwrap();
        assert_eq!(after, 0);
        assert_eq!(store.get_or_create(a).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn allow_negative_goes_below_zero() {
        let store = InMemoryBalanceStore::new();
        let a = AccountId(1);
        store.apply_delta(a, 50, DeltaPolicy::AllowNegative).await.unwrap();
        let after = store.apply_delta(a, -80, DeltaPolicy::AllowNegative).await.unwrap();
        assert_eq!(after, -30);
    }

    #[tokio::test]
    async fn random_deltas_match_policy_arithmetic() {
        let store = InMemoryBalanceStore::new();
        let mut rng = rand::thread_rng();
        for policy in [DeltaPolicy::AllowNegative, DeltaPolicy::ClampAtZero] {
            let a = AccountId(rng.r#gen());
            for _ in 0..200 {
                let delta: i64 = rng.gen_range(-500..=500);
                let previous = store.get_or_create(a).await.unwrap();
                let next = store.apply_delta(a, delta, policy).await.unwrap();
                let expected = match policy {
                    DeltaPolicy::AllowNegative => previous + delta,
                    DeltaPolicy::ClampAtZero => (previous + delta).max(0),
                };
                assert_eq!(next, expected);
                assert_eq!(store.get_or_create(a).await.unwrap(), expected);
            }
        }
    }

    #[tokio::test]
    async fn overflow_leaves_balance_untouched() {
        let store = InMemoryBalanceStore::new();
        let a = AccountId(1);
        store.set_balance(a, i64::MAX).await.unwrap();
        let err = store.apply_delta(a, 1, DeltaPolicy::AllowNegative).await.unwrap_err();
        assert!(matches!(err, FxError::BalanceOverflow { .. }));
        assert_eq!(store.find(a).await.unwrap(), Some(i64::MAX));
    }

    #[tokio::test]
    async fn conditional_debit() {
        let store = InMemoryBalanceStore::new();
        let a = AccountId(1);
        store.set_balance(a, 150).await.unwrap();

        let outcome = store.debit_if_sufficient(a, 100).await.unwrap();
        assert_eq!(outcome, DebitOutcome::Debited { new_balance: 50 });

        let outcome = store.debit_if_sufficient(a, 100).await.unwrap();
        assert_eq!(outcome, DebitOutcome::Insufficient { available: 50 });
        assert_eq!(store.find(a).await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn set_balance_returns_previous() {
        let store = InMemoryBalanceStore::new();
        let a = AccountId(1);
        assert_eq!(store.set_balance(a, 40).await.unwrap(), 0);
        assert_eq!(store.set_balance(a, 0).await.unwrap(), 40);
        assert_eq!(store.find(a).await.unwrap(), Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deltas_are_not_lost() {
        let store = Arc::new(InMemoryBalanceStore::new());
        let a = AccountId(1);
        let mut tasks = Vec::new();
        for _ in 0..100 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.apply_delta(a, 1, DeltaPolicy::AllowNegative).await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(store.get_or_create(a).await.unwrap(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_creates_one_record() {
        let store = Arc::new(InMemoryBalanceStore::new());
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move { store.get_or_create(AccountId(7)).await.unwrap() }));
        }
        for t in tasks {
            assert_eq!(t.await.unwrap(), 0);
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn accounts_sorted_by_id() {
        let store = InMemoryBalanceStore::new();
        store.set_balance(AccountId(3), 1).await.unwrap();
        store.set_balance(AccountId(1), 2).await.unwrap();
        store.set_balance(AccountId(2), 3).await.unwrap();
        let ids: Vec<u64> = store.accounts().await.unwrap().iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
