//! # Bingohall
//!
//! A multiplayer number-bingo room server. Many independent rooms run
//! concurrently; each takes its players through card selection, a
//! countdown, a live number-draw phase, and a win/settlement phase.
//!
//! Every room is one Tokio task, the single writer for that room's
//! phase, card ownership, drawn sequence, and prize pot. Player actions
//! arrive as serialized commands; results fan back out as events over
//! the player's own channel. Balances live behind the injected
//! [`Ledger`](bingohall_ledger::Ledger) boundary and are never awaited
//! on a room's critical path.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bingohall::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BingohallError> {
//!     let ledger = Arc::new(InMemoryLedger::new());
//!     let server = HallServer::<InMemoryLedger, JsonCodec>::builder()
//!         .bind("0.0.0.0:8080")
//!         .build(ledger)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::BingohallError;
pub use server::{HallServer, HallServerBuilder};

/// The common imports for wiring a server or a test client.
pub mod prelude {
    pub use crate::{BingohallError, HallServer, HallServerBuilder};

    pub use bingohall_ledger::{InMemoryLedger, Ledger, LedgerError};
    pub use bingohall_protocol::{
        CardId, ClientCommand, Codec, CommandEnvelope, EventEnvelope, GameMode,
        JsonCodec, Line, PlayerId, RoomId, RoomPhase, ServerEvent, WinPattern,
    };
    pub use bingohall_room::{
        Catalogue, EndReason, ModeConfig, RoomError, RoomManager, TargetPattern,
    };
}
