//! Per-account mutual exclusion for multi-step workflows.
//!
//! Single balance mutations are already atomic at the store. A redemption
//! however spans check → provision → debit, with an external await in the
//! middle; two attempts for the same account must not interleave there.
//! Attempts for different accounts never contend.
//!
//! Entries are dropped from the table when the last holder or waiter for an
//! account leaves, cancelled waiters included, so the table only holds
//! accounts with a workflow in flight.

use std::collections::HashMap;
use std::sync::Arc;

use fxledger_types::AccountId;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

type LockTable = Arc<Mutex<HashMap<AccountId, Slot>>>;

#[derive(Default)]
pub struct AccountLocks {
    table: LockTable,
}

impl AccountLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account`. Dropping the future before it
    /// resolves gives up the place in line.
    pub async fn lock(&self, account: AccountId) -> AccountGuard {
        let (lease, mutex) = Lease::acquire(&self.table, account);
        let guard = mutex.lock_owned().await;
        AccountGuard {
            _guard: guard,
            lease,
        }
    }

    /// Accounts with a workflow currently holding or waiting on the lock.
    pub fn in_flight(&self) -> usize {
        self.table.lock().len()
    }
}

/// One registered user of a slot. The slot leaves the table with its last
/// lease, whether that lease ends holding the lock or still waiting.
struct Lease {
    account: AccountId,
    table: LockTable,
}

impl Lease {
    fn acquire(table: &LockTable, account: AccountId) -> (Self, Arc<AsyncMutex<()>>) {
        let mut slots = table.lock();
        let slot = slots.entry(account).or_default();
        slot.users += 1;
        let mutex = Arc::clone(&slot.mutex);
        (
            Self {
                account,
                table: Arc::clone(table),
            },
            mutex,
        )
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut slots = self.table.lock();
        let idle = slots.get_mut(&self.account).is_some_and(|slot| {
            slot.users -= 1;
            slot.users == 0
        });
        if idle {
            slots.remove(&self.account);
        }
    }
}

/// Exclusive access to one account until dropped.
pub struct AccountGuard {
    // Field order matters: the mutex is released before the lease can
    // retire the slot.
    _guard: OwnedMutexGuard<()>,
    lease: Lease,
}

impl AccountGuard {
    #[must_use]
    pub fn account(&self) -> AccountId {
        self.lease.account
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_account_is_serialized() {
        let locks = Arc::new(AccountLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock(AccountId(1)).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn different_accounts_do_not_contend() {
        let locks = AccountLocks::new();
        let a = locks.lock(AccountId(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(AccountId(2)))
            .await
            .expect("second account must not block");
        assert_eq!(a.account(), AccountId(1));
        assert_eq!(b.account(), AccountId(2));
        assert_eq!(locks.in_flight(), 2);
        drop(a);
        drop(b);
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_slot_alive() {
        let locks = Arc::new(AccountLocks::new());
        let first = locks.lock(AccountId(1)).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.lock(AccountId(1)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);
        assert_eq!(locks.in_flight(), 1);
        waiter.await.unwrap();
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn abandoned_waiter_does_not_leak_slot() {
        let locks = AccountLocks::new();
        let holder = locks.lock(AccountId(1)).await;

        let mut waiter = Box::pin(locks.lock(AccountId(1)));
        let pending = tokio::time::timeout(Duration::from_millis(10), &mut waiter).await;
        assert!(pending.is_err());
        assert_eq!(locks.in_flight(), 1);

        // The holder leaves while the waiter is still queued, then the waiter
        // is dropped without ever acquiring.
        drop(holder);
        drop(waiter);
        assert_eq!(locks.in_flight(), 0);

        let again = locks.lock(AccountId(1)).await;
        assert_eq!(again.account(), AccountId(1));
    }
}
