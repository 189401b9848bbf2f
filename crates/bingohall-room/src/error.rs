//! Error types for the room layer.
//!
//! Every variant is a per-command failure: it is returned to the caller
//! (and, where the contract says so, mirrored as an event to the
//! originating player) but never crosses the transport boundary as a
//! panic and never corrupts the room for other players.

use bingohall_ledger::LedgerError;
use bingohall_protocol::{CardId, PlayerId, RoomId, RoomPhase};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's phase forbids this operation, e.g. joining or
    /// selecting a card after the draw phase started.
    #[error("room {room_id} is closed for this action (phase: {phase})")]
    Closed { room_id: RoomId, phase: RoomPhase },

    /// All player slots for the room's mode are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player already has a seat (in this room or another).
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player has no seat in the room the operation targets.
    #[error("player {0} is not seated in a room")]
    NotSeated(PlayerId),

    /// The card id is outside the room's pool.
    #[error("card {0} does not exist in this room")]
    UnknownCard(CardId),

    /// The card is already owned by another player.
    #[error("card {0} is already taken")]
    CardUnavailable(CardId),

    /// The player already holds a card in this room (one card each).
    #[error("player {0} already holds a card")]
    AlreadySelected(PlayerId),

    /// Deselect of a card the player does not own.
    #[error("card {0} is not yours to release")]
    CardNotOwned(CardId),

    /// The win claim did not validate. Expected and frequent; play
    /// continues for everyone including the claimant.
    #[error("invalid claim: {0}")]
    InvalidClaim(String),

    /// The entry fee could not be covered. Checked before any room
    /// state is touched.
    #[error("insufficient balance: {0}")]
    InsufficientBalance(#[source] LedgerError),

    /// The ledger could not answer the affordability check.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[source] LedgerError),

    /// The room's command channel is gone (actor retired or crashed).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
