//! The [`Ledger`] trait: the seam between the game core and money.
//!
//! Bingohall does not persist wallets or transactions itself; that is
//! the job of an external ledger service. This trait is the whole of
//! the contract the core needs from it.

use bingohall_protocol::PlayerId;

use crate::LedgerError;

/// Read and move player balances.
///
/// # Trait bounds
///
/// - `Send + Sync`: shared across room actors and connection handlers.
/// - `'static`: lives as long as the server; implementations own their
///   connection pools or state.
///
/// Amounts are in the smallest currency unit (no floats anywhere near
/// money).
///
/// # Example
///
/// ```rust
/// use bingohall_ledger::{Ledger, LedgerError};
/// use bingohall_protocol::PlayerId;
///
/// /// A ledger that grants everyone an infinite balance.
/// /// Handy for local demos, obviously never for production.
/// struct HouseMoney;
///
/// impl Ledger for HouseMoney {
///     async fn balance(&self, _player: PlayerId) -> Result<u64, LedgerError> {
///         Ok(u64::MAX)
///     }
///     async fn debit(&self, _player: PlayerId, _amount: u64) -> Result<(), LedgerError> {
///         Ok(())
///     }
///     async fn credit(&self, _player: PlayerId, _amount: u64) -> Result<(), LedgerError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Ledger: Send + Sync + 'static {
    /// Returns the player's current balance.
    fn balance(
        &self,
        player: PlayerId,
    ) -> impl std::future::Future<Output = Result<u64, LedgerError>> + Send;

    /// Atomically removes `amount` from the player's balance.
    ///
    /// # Errors
    /// [`LedgerError::InsufficientBalance`] if the player cannot cover
    /// `amount`; the balance is left untouched in that case.
    fn debit(
        &self,
        player: PlayerId,
        amount: u64,
    ) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;

    /// Adds `amount` to the player's balance (prize or refund).
    fn credit(
        &self,
        player: PlayerId,
        amount: u64,
    ) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;
}
