//! In-memory ledger for tests and demos.

use std::collections::HashMap;

use bingohall_protocol::PlayerId;
use tokio::sync::RwLock;

use crate::{Ledger, LedgerError};

/// A [`Ledger`] backed by a map under an async lock.
///
/// Accounts must be opened (seeded) before they can be debited; crediting
/// an unknown player opens the account implicitly, so a settlement can
/// never be lost to a missing row.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: RwLock<HashMap<PlayerId, u64>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger with the given opening balances.
    pub fn with_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (PlayerId, u64)>,
    {
        Self {
            balances: RwLock::new(balances.into_iter().collect()),
        }
    }

    /// Opens (or overwrites) an account with the given balance.
    pub async fn seed(&self, player: PlayerId, amount: u64) {
        self.balances.write().await.insert(player, amount);
    }
}

impl Ledger for InMemoryLedger {
    async fn balance(&self, player: PlayerId) -> Result<u64, LedgerError> {
        self.balances
            .read()
            .await
            .get(&player)
            .copied()
            .ok_or(LedgerError::UnknownPlayer(player))
    }

    async fn debit(&self, player: PlayerId, amount: u64) -> Result<(), LedgerError> {
        let mut balances = self.balances.write().await;
        let balance = balances
            .get_mut(&player)
            .ok_or(LedgerError::UnknownPlayer(player))?;
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                player,
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        tracing::debug!(%player, amount, remaining = *balance, "debited");
        Ok(())
    }

    async fn credit(&self, player: PlayerId, amount: u64) -> Result<(), LedgerError> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(player).or_insert(0);
        *balance += amount;
        tracing::debug!(%player, amount, balance = *balance, "credited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[tokio::test]
    async fn test_debit_reduces_balance() {
        let ledger = InMemoryLedger::with_balances([(pid(1), 100)]);
        ledger.debit(pid(1), 30).await.unwrap();
        assert_eq!(ledger.balance(pid(1)).await.unwrap(), 70);
    }

    #[tokio::test]
    async fn test_debit_insufficient_leaves_balance_untouched() {
        let ledger = InMemoryLedger::with_balances([(pid(1), 10)]);
        let err = ledger.debit(pid(1), 30).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { needed: 30, available: 10, .. }
        ));
        assert_eq!(ledger.balance(pid(1)).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_debit_unknown_player() {
        let ledger = InMemoryLedger::new();
        let err = ledger.debit(pid(9), 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnknownPlayer(p) if p == pid(9)));
    }

    #[tokio::test]
    async fn test_credit_opens_account_implicitly() {
        let ledger = InMemoryLedger::new();
        ledger.credit(pid(2), 50).await.unwrap();
        assert_eq!(ledger.balance(pid(2)).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_seed_overwrites() {
        let ledger = InMemoryLedger::new();
        ledger.seed(pid(1), 5).await;
        ledger.seed(pid(1), 500).await;
        assert_eq!(ledger.balance(pid(1)).await.unwrap(), 500);
    }
}
