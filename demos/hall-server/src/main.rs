//! Runnable demo server: ten players with house money, standard modes.
//!
//! ```text
//! cargo run -p hall-server -- 0.0.0.0:8080
//! RUST_LOG=bingohall=debug cargo run -p hall-server
//! ```

use std::sync::Arc;

use bingohall::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Demo wallet: players 1..=10 start with 1 000 each. A real
    // deployment implements `Ledger` against its wallet service instead.
    let ledger = Arc::new(InMemoryLedger::with_balances(
        (1..=10).map(|p| (PlayerId(p), 1_000u64)),
    ));

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());
    tracing::info!(%addr, "starting demo hall");

    let server = HallServerBuilder::new().bind(&addr).build(ledger).await?;
    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    /// Smoke test for the demo wiring: identify, create, get the room.
    #[tokio::test]
    async fn test_demo_wiring_smoke() {
        let ledger = Arc::new(InMemoryLedger::with_balances([(PlayerId(1), 100u64)]));
        let server = HallServerBuilder::new()
            .bind("127.0.0.1:0")
            .build(ledger)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();

        let send = |command: ClientCommand, seq: u64| {
            let env = CommandEnvelope { seq, timestamp: 0, command };
            Message::Binary(serde_json::to_vec(&env).unwrap().into())
        };

        ws.send(send(ClientCommand::Identify { player_id: PlayerId(1) }, 1))
            .await
            .unwrap();
        let msg = ws.next().await.unwrap().unwrap();
        let env: EventEnvelope = serde_json::from_slice(&msg.into_data()).unwrap();
        assert!(matches!(env.event, ServerEvent::Welcome { player_id } if player_id == PlayerId(1)));

        ws.send(send(ClientCommand::CreateGame { mode: GameMode::Blackout }, 2))
            .await
            .unwrap();
        let msg = ws.next().await.unwrap().unwrap();
        let env: EventEnvelope = serde_json::from_slice(&msg.into_data()).unwrap();
        assert!(matches!(
            env.event,
            ServerEvent::GameCreated { mode: GameMode::Blackout, .. }
        ));
    }
}
