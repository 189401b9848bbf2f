//! Per-connection handler: identify, command routing, event pump.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive `identify` → the connection gets a player identity
//!   2. Spawn the event pump (player channel → encoded envelopes → socket)
//!   3. Loop: decode command envelopes → route to the dispatcher
//!
//! Room events reach the client exclusively through the pump, which is
//! the connection's single socket writer, so the envelope sequence
//! numbers stay gapless no matter which room task produced an event.

use std::sync::Arc;
use std::time::Duration;

use bingohall_ledger::Ledger;
use bingohall_protocol::{
    ClientCommand, Codec, CommandEnvelope, PlayerId, ProtocolError, ServerEvent,
};
use bingohall_room::RoomError;
use bingohall_transport::{Connection, WsConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::BingohallError;

/// How long a fresh connection gets to identify itself.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that reports the disconnect when the handler exits.
///
/// Ensures the room sees the departure even if the handler errors or
/// panics. `Drop` is synchronous, so the async work is spawned.
struct DisconnectGuard<L: Ledger, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<L, C>>,
}

impl<L: Ledger, C: Codec> Drop for DisconnectGuard<L, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let outcome = state.rooms.lock().await.disconnect(player_id).await;
            tracing::debug!(%player_id, ?outcome, "disconnect processed");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<L: Ledger, C: Codec>(
    conn: WsConnection,
    state: Arc<ServerState<L, C>>,
) -> Result<(), BingohallError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: identify ---
    let player_id = await_identify(&conn, &state).await?;
    tracing::info!(%conn_id, %player_id, "player identified");

    // --- Step 2: event pump ---
    // Every event for this client funnels through one channel; the pump
    // is the sole socket writer and owns the envelope sequence.
    let (events_tx, events_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let pump = spawn_event_pump(conn.clone(), Arc::clone(&state), events_rx);

    let _ = events_tx.send(ServerEvent::Welcome { player_id });

    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    // --- Step 3: command loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let envelope: CommandEnvelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode command");
                let _ = events_tx.send(ServerEvent::CommandError {
                    code: 400,
                    message: format!("malformed command: {e}"),
                });
                continue;
            }
        };

        if handle_command(&state, player_id, envelope.command, &events_tx).await {
            break;
        }
    }

    // The guard fires the disconnect; the pump dies with its channel.
    pump.abort();
    Ok(())
}

/// Processes one command. Returns `true` when the connection should
/// close.
async fn handle_command<L: Ledger, C: Codec>(
    state: &Arc<ServerState<L, C>>,
    player_id: PlayerId,
    command: ClientCommand,
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> bool {
    match command {
        ClientCommand::Identify { .. } => {
            let _ = events_tx.send(ServerEvent::CommandError {
                code: 400,
                message: "already identified".into(),
            });
        }

        ClientCommand::CreateGame { mode } => {
            let room_id = state.rooms.lock().await.create_game(mode);
            let _ = events_tx.send(ServerEvent::GameCreated { room_id, mode });
        }

        ClientCommand::Join { room_id } => {
            let result = state
                .rooms
                .lock()
                .await
                .join_room(player_id, room_id, events_tx.clone())
                .await;
            if let Err(err) = result {
                let _ = events_tx.send(ServerEvent::CommandError {
                    code: error_code(&err),
                    message: err.to_string(),
                });
            }
        }

        ClientCommand::SelectCard { card_id } => {
            let result = state
                .rooms
                .lock()
                .await
                .select_card(player_id, card_id)
                .await;
            // Seated players were already told via card_select_error;
            // only dispatcher-level failures need a reply here.
            report_routing_error(result, events_tx, player_id, "select_card");
        }

        ClientCommand::DeselectCard { card_id } => {
            let result = state
                .rooms
                .lock()
                .await
                .deselect_card(player_id, card_id)
                .await;
            report_routing_error(result, events_tx, player_id, "deselect_card");
        }

        ClientCommand::StartCountdown => {
            match room_of(state, player_id).await {
                Some(room_id) => {
                    let result = state.rooms.lock().await.start_countdown(room_id).await;
                    if let Ok(false) = result {
                        tracing::debug!(%player_id, "start_countdown was a no-op");
                    }
                }
                None => send_not_seated(events_tx, player_id),
            }
        }

        ClientCommand::StartGame => {
            match room_of(state, player_id).await {
                Some(room_id) => {
                    let result = state.rooms.lock().await.start_game(room_id).await;
                    if let Ok(false) = result {
                        tracing::debug!(%player_id, "start_game was a no-op");
                    }
                }
                None => send_not_seated(events_tx, player_id),
            }
        }

        ClientCommand::ClaimWin { marked_numbers } => {
            let result = state
                .rooms
                .lock()
                .await
                .claim_win(player_id, marked_numbers)
                .await;
            match result {
                // The room broadcast game_won / invalid_claim already.
                Ok(pattern) => {
                    tracing::info!(%player_id, ?pattern, "claim validated");
                }
                Err(RoomError::InvalidClaim(reason)) => {
                    tracing::debug!(%player_id, %reason, "claim rejected");
                }
                Err(err) => {
                    let _ = events_tx.send(ServerEvent::CommandError {
                        code: error_code(&err),
                        message: err.to_string(),
                    });
                }
            }
        }

        ClientCommand::Disconnect => {
            tracing::info!(%player_id, "client said goodbye");
            return true;
        }
    }

    false
}

/// Receives `identify`, or rejects the connection.
async fn await_identify<L: Ledger, C: Codec>(
    conn: &WsConnection,
    state: &Arc<ServerState<L, C>>,
) -> Result<PlayerId, BingohallError> {
    let data = match tokio::time::timeout(IDENTIFY_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidCommand(
                "connection closed before identify".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidCommand("identify timed out".into()).into());
        }
    };

    let envelope: CommandEnvelope = state.codec.decode(&data)?;
    match envelope.command {
        ClientCommand::Identify { player_id } => Ok(player_id),
        other => {
            tracing::debug!(?other, "first command was not identify");
            Err(ProtocolError::InvalidCommand("first command must be identify".into()).into())
        }
    }
}

/// Spawns the task that drains the player's event channel onto the
/// socket, wrapping each event in an envelope.
fn spawn_event_pump<L: Ledger, C: Codec>(
    conn: WsConnection,
    state: Arc<ServerState<L, C>>,
    mut events_rx: mpsc::UnboundedReceiver<ServerEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut seq: u64 = 0;
        while let Some(event) = events_rx.recv().await {
            seq += 1;
            let envelope = bingohall_protocol::EventEnvelope {
                seq,
                timestamp: state.started_at.elapsed().as_millis() as u64,
                event,
            };
            let bytes = match state.codec.encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if conn.send(&bytes).await.is_err() {
                break;
            }
        }
    })
}

/// Surfaces routing failures that produced no room event.
fn report_routing_error(
    result: Result<(), RoomError>,
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
    player_id: PlayerId,
    action: &'static str,
) {
    match result {
        Ok(()) => {}
        Err(err @ (RoomError::NotSeated(_) | RoomError::NotFound(_) | RoomError::Unavailable(_))) => {
            let _ = events_tx.send(ServerEvent::CommandError {
                code: error_code(&err),
                message: err.to_string(),
            });
        }
        Err(err) => {
            tracing::debug!(%player_id, action, error = %err, "room rejected action");
        }
    }
}

async fn room_of<L: Ledger, C: Codec>(
    state: &Arc<ServerState<L, C>>,
    player_id: PlayerId,
) -> Option<bingohall_protocol::RoomId> {
    state.rooms.lock().await.player_room(&player_id)
}

fn send_not_seated(events_tx: &mpsc::UnboundedSender<ServerEvent>, player_id: PlayerId) {
    let _ = events_tx.send(ServerEvent::CommandError {
        code: 409,
        message: RoomError::NotSeated(player_id).to_string(),
    });
}

/// HTTP-style code for a room error.
fn error_code(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_) => 404,
        RoomError::InsufficientBalance(_) => 402,
        RoomError::LedgerUnavailable(_) | RoomError::Unavailable(_) => 503,
        RoomError::Closed { .. }
        | RoomError::RoomFull(_)
        | RoomError::AlreadyInRoom(_, _)
        | RoomError::NotSeated(_)
        | RoomError::AlreadySelected(_) => 409,
        RoomError::UnknownCard(_)
        | RoomError::CardUnavailable(_)
        | RoomError::CardNotOwned(_)
        | RoomError::InvalidClaim(_) => 400,
    }
}
