//! Wire protocol for Bingohall.
//!
//! This crate defines the contract between clients and the game core:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`CardId`]) — newtype ids
//!   that travel as plain numbers on the wire.
//! - **Commands and events** ([`ClientCommand`], [`ServerEvent`]) — what
//!   a client may ask for, and what a room broadcasts back.
//! - **Envelopes** ([`CommandEnvelope`], [`EventEnvelope`]) — sequence
//!   number and timestamp wrapped around each message.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages become
//!   bytes and back.
//!
//! The protocol layer knows nothing about connections, rooms, or money —
//! it only describes shapes. The transport adapter owns the framing; the
//! room core only ever produces [`ServerEvent`] values.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    CardId, ClientCommand, CommandEnvelope, EventEnvelope, GameMode, Line,
    PlayerId, Recipient, RoomId, RoomPhase, SelectedCard, ServerEvent,
    WinPattern, FREE_CELL,
};
