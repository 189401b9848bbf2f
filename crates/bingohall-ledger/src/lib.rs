//! Balance and settlement boundary for Bingohall.
//!
//! The game core never talks to a database or a payment provider. It
//! talks to the [`Ledger`] trait:
//!
//! 1. **Affordability**: entry fees are debited *before* a join is
//!    routed to a room, so insufficient balance never touches room state.
//! 2. **Settlement**: prizes and refunds are credited from spawned
//!    tasks, never awaited inside a room's command loop.
//!
//! Deployments implement [`Ledger`] against their real wallet service;
//! tests and demos use [`InMemoryLedger`].

#![allow(async_fn_in_trait)]

mod error;
mod ledger;
mod memory;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use memory::InMemoryLedger;
