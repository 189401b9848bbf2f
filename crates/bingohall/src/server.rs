//! `HallServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → dispatcher → rooms,
//! with the ledger injected at build time.

use std::sync::Arc;
use std::time::Instant;

use bingohall_ledger::Ledger;
use bingohall_protocol::{Codec, JsonCodec};
use bingohall_room::{Catalogue, RoomManager};
use bingohall_transport::{Listener, WsListener};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::BingohallError;

/// Shared server state passed to each connection handler task.
///
/// The manager sits behind a `Mutex` that is held only around its own
/// map operations and handle sends, never across a room's work.
pub(crate) struct ServerState<L: Ledger, C: Codec> {
    pub(crate) rooms: Mutex<RoomManager<L>>,
    pub(crate) codec: C,
    /// Basis for event envelope timestamps.
    pub(crate) started_at: Instant,
}

/// Builder for configuring and starting a Bingohall server.
///
/// # Example
///
/// ```rust,ignore
/// use bingohall::prelude::*;
///
/// let ledger = Arc::new(InMemoryLedger::new());
/// let server = HallServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(ledger)
///     .await?;
/// server.run().await
/// ```
pub struct HallServerBuilder {
    bind_addr: String,
    catalogue: Catalogue,
}

impl HallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            catalogue: Catalogue::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Replaces the mode catalogue (fees, caps, timers per mode).
    pub fn catalogue(mut self, catalogue: Catalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    /// Builds the server around the given ledger.
    ///
    /// Uses `JsonCodec` and the WebSocket transport.
    pub async fn build<L: Ledger>(
        self,
        ledger: Arc<L>,
    ) -> Result<HallServer<L, JsonCodec>, BingohallError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::with_catalogue(ledger, self.catalogue)),
            codec: JsonCodec,
            started_at: Instant::now(),
        });

        Ok(HallServer { listener, state })
    }
}

impl Default for HallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Bingohall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HallServer<L: Ledger, C: Codec> {
    listener: WsListener,
    state: Arc<ServerState<L, C>>,
}

impl<L: Ledger, C: Codec> HallServer<L, C> {
    /// Creates a new builder.
    pub fn builder() -> HallServerBuilder {
        HallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop: one handler task per connection, until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), BingohallError> {
        tracing::info!("Bingohall server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
