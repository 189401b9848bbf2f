//! Room lifecycle management for Bingohall.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! phase, card registry, drawn-number sequence, and prize pot. All
//! mutation is serialized through the actor's command channel, which is
//! the single-writer-per-room guarantee everything else leans on.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates/destroys rooms, routes player actions
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`CardRegistry`] / [`CardGrid`]: card ownership and grids
//! - [`validate_claim`] / [`TargetPattern`]: pure win validation
//! - [`ModeConfig`]: the per-mode catalogue (fees, caps, timers)

mod card;
mod config;
mod error;
mod manager;
mod room;
mod win;

pub use card::{CardGrid, CardRegistry, GRID_SIZE};
pub use config::{Catalogue, ModeConfig};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{
    DisconnectOutcome, EndReason, PlayerSender, RoomHandle, RoomInfo,
};
pub use win::{validate_claim, TargetPattern};
