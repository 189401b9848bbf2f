//! Error types for the ledger boundary.

use bingohall_protocol::PlayerId;

/// Errors that can occur during a ledger operation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The player's balance does not cover the requested debit.
    /// Surfaced to the player as a join rejection, never as a room fault.
    #[error("player {player} has {available}, needs {needed}")]
    InsufficientBalance {
        player: PlayerId,
        needed: u64,
        available: u64,
    },

    /// The player has no account on the ledger.
    #[error("no account for player {0}")]
    UnknownPlayer(PlayerId),

    /// The backing service could not be reached or errored internally.
    /// Settlement callers retry these out-of-band.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
