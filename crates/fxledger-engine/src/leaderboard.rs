//! Ranked read over the balance store.

use std::fmt;
use std::sync::Arc;

use fxledger_store::BalanceStore;
use fxledger_types::{AccountId, Result};

/// One leaderboard row. `rank` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub account: AccountId,
    pub balance: i64,
}

pub struct LeaderboardQuery {
    balances: Arc<dyn BalanceStore>,
}

impl LeaderboardQuery {
    #[must_use]
    pub fn new(balances: Arc<dyn BalanceStore>) -> Self {
        Self { balances }
    }

    /// The `n` highest balances: descending by balance, ties by ascending
    /// account id. Accounts with a balance of 0 or less are never listed.
    pub async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardRow>> {
        let mut accounts = self.balances.accounts().await?;
        accounts.retain(|a| a.balance > 0);
        accounts.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.id.cmp(&b.id)));
        Ok(accounts
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, a)| LeaderboardRow {
                rank: i + 1,
                account: a.id,
                balance: a.balance,
            })
            .collect())
    }
}

/// Rendered leaderboard, one line per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    pub rows: Vec<LeaderboardRow>,
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "Nobody holds any FX yet.");
        }
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "#{} {}: {} FX", row.rank, row.account, row.balance)?;
        }
        Ok(())
    }
}
