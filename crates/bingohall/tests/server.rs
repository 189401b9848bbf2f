//! End-to-end tests: a real server, real WebSocket clients, full games.

use std::sync::Arc;
use std::time::Duration;

use bingohall::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Client helpers
// =========================================================================

/// A catalogue fast enough for CI: 20 ms draws, deterministic order.
fn fast_catalogue() -> Catalogue {
    Catalogue::default().with(ModeConfig {
        entry_fee: 10,
        min_players: 2,
        max_players: 4,
        countdown: Duration::from_secs(60),
        draw_interval: Duration::from_millis(20),
        draw_seed: Some(7),
        ..ModeConfig::standard(GameMode::SingleLine)
    })
}

/// Starts a server whose ledger knows players 1..=4 with 100 each.
async fn start(catalogue: Catalogue) -> String {
    let ledger = Arc::new(InMemoryLedger::with_balances(
        (1..=4).map(|p| (PlayerId(p), 100u64)),
    ));
    let server = HallServerBuilder::new()
        .bind("127.0.0.1:0")
        .catalogue(catalogue)
        .build(ledger)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send_cmd(ws: &mut Ws, seq: u64, command: ClientCommand) {
    let envelope = CommandEnvelope { seq, timestamp: 0, command };
    let bytes = serde_json::to_vec(&envelope).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn recv_envelope(ws: &mut Ws) -> EventEnvelope {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("connection closed")
            .expect("websocket error");
        match msg {
            Message::Binary(data) => return serde_json::from_slice(&data).unwrap(),
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

/// Reads events until one matches, discarding the rest.
async fn wait_event(ws: &mut Ws, mut pred: impl FnMut(&ServerEvent) -> bool) -> ServerEvent {
    loop {
        let envelope = recv_envelope(ws).await;
        if pred(&envelope.event) {
            return envelope.event;
        }
    }
}

/// Connects and identifies, consuming the welcome.
async fn identified(addr: &str, id: u64) -> Ws {
    let mut ws = connect(addr).await;
    send_cmd(&mut ws, 1, ClientCommand::Identify { player_id: PlayerId(id) }).await;
    let env = recv_envelope(&mut ws).await;
    assert!(matches!(env.event, ServerEvent::Welcome { player_id } if player_id == PlayerId(id)));
    ws
}

/// Two identified players seated in a fresh single-line room, each
/// holding a card; returns the room id and player 1's board.
async fn seated_pair(addr: &str) -> (Ws, Ws, RoomId, [[u8; 5]; 5]) {
    let mut p1 = identified(addr, 1).await;
    let mut p2 = identified(addr, 2).await;

    send_cmd(&mut p1, 2, ClientCommand::CreateGame { mode: GameMode::SingleLine }).await;
    let ev = wait_event(&mut p1, |e| matches!(e, ServerEvent::GameCreated { .. })).await;
    let ServerEvent::GameCreated { room_id, .. } = ev else { unreachable!() };

    send_cmd(&mut p1, 3, ClientCommand::Join { room_id }).await;
    send_cmd(&mut p2, 2, ClientCommand::Join { room_id }).await;
    wait_event(&mut p2, |e| matches!(e, ServerEvent::SelectionState { .. })).await;

    send_cmd(&mut p1, 4, ClientCommand::SelectCard { card_id: CardId(1) }).await;
    let ev = wait_event(&mut p1, |e| {
        matches!(e, ServerEvent::CardSelectSuccess { card_id, .. } if *card_id == CardId(1))
    })
    .await;
    let ServerEvent::CardSelectSuccess { board, .. } = ev else { unreachable!() };

    send_cmd(&mut p2, 3, ClientCommand::SelectCard { card_id: CardId(2) }).await;
    wait_event(&mut p2, |e| {
        matches!(e, ServerEvent::CardSelectSuccess { card_id, .. } if *card_id == CardId(2))
    })
    .await;

    (p1, p2, room_id, board)
}

// =========================================================================
// Identify
// =========================================================================

#[tokio::test]
async fn test_identify_gets_welcome_with_seq_one() {
    let addr = start(fast_catalogue()).await;
    let mut ws = connect(&addr).await;

    send_cmd(&mut ws, 1, ClientCommand::Identify { player_id: PlayerId(1) }).await;
    let env = recv_envelope(&mut ws).await;
    assert_eq!(env.seq, 1);
    assert!(matches!(env.event, ServerEvent::Welcome { player_id } if player_id == PlayerId(1)));
}

#[tokio::test]
async fn test_first_command_must_be_identify() {
    let addr = start(fast_catalogue()).await;
    let mut ws = connect(&addr).await;

    send_cmd(&mut ws, 1, ClientCommand::CreateGame { mode: GameMode::SingleLine }).await;

    // The server drops the connection without a welcome.
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out");
    match msg {
        None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {}
        Some(Ok(other)) => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_command_gets_400() {
    let addr = start(fast_catalogue()).await;
    let mut ws = identified(&addr, 1).await;

    ws.send(Message::Binary(b"not json".to_vec().into())).await.unwrap();
    let ev = wait_event(&mut ws, |e| matches!(e, ServerEvent::CommandError { .. })).await;
    assert!(matches!(ev, ServerEvent::CommandError { code: 400, .. }));
}

// =========================================================================
// Lobby commands
// =========================================================================

#[tokio::test]
async fn test_join_unknown_room_gets_404() {
    let addr = start(fast_catalogue()).await;
    let mut ws = identified(&addr, 1).await;

    send_cmd(&mut ws, 2, ClientCommand::Join { room_id: RoomId(4040) }).await;
    let ev = wait_event(&mut ws, |e| matches!(e, ServerEvent::CommandError { .. })).await;
    assert!(matches!(ev, ServerEvent::CommandError { code: 404, .. }));
}

#[tokio::test]
async fn test_unfunded_player_cannot_join() {
    let addr = start(fast_catalogue()).await;
    let mut p1 = identified(&addr, 1).await;
    // Player 99 has no ledger account.
    let mut broke = identified(&addr, 99).await;

    send_cmd(&mut p1, 2, ClientCommand::CreateGame { mode: GameMode::SingleLine }).await;
    let ev = wait_event(&mut p1, |e| matches!(e, ServerEvent::GameCreated { .. })).await;
    let ServerEvent::GameCreated { room_id, .. } = ev else { unreachable!() };

    send_cmd(&mut broke, 2, ClientCommand::Join { room_id }).await;
    let ev = wait_event(&mut broke, |e| matches!(e, ServerEvent::CommandError { .. })).await;
    assert!(matches!(ev, ServerEvent::CommandError { code: 402, .. }));
}

#[tokio::test]
async fn test_action_without_a_seat_gets_409() {
    let addr = start(fast_catalogue()).await;
    let mut ws = identified(&addr, 1).await;

    send_cmd(&mut ws, 2, ClientCommand::SelectCard { card_id: CardId(1) }).await;
    let ev = wait_event(&mut ws, |e| matches!(e, ServerEvent::CommandError { .. })).await;
    assert!(matches!(ev, ServerEvent::CommandError { code: 409, .. }));
}

// =========================================================================
// Full games
// =========================================================================

#[tokio::test]
async fn test_selection_flow_is_broadcast() {
    let addr = start(fast_catalogue()).await;
    let (_p1, mut p2, _room, _board) = seated_pair(&addr).await;

    // Player 2 saw player 1's selection as well as its own.
    // (seated_pair already drained both; the countdown snapshot follows
    // once two holders exist.)
    let ev = wait_event(&mut p2, |e| {
        matches!(e, ServerEvent::SelectionState { status: RoomPhase::Countdown, .. })
    })
    .await;
    let ServerEvent::SelectionState { player_count, selected_cards, .. } = ev else {
        unreachable!()
    };
    assert_eq!(player_count, 2);
    assert_eq!(selected_cards.len(), 2);
}

#[tokio::test]
async fn test_full_game_with_row_winner() {
    let addr = start(fast_catalogue()).await;
    let (mut p1, mut p2, _room, board) = seated_pair(&addr).await;
    let top_row = board[0].to_vec();

    send_cmd(&mut p1, 5, ClientCommand::StartGame).await;
    wait_event(&mut p2, |e| matches!(e, ServerEvent::GameStarted { .. })).await;

    // Watch draws until the whole top row has been called.
    let mut history: Vec<u8> = Vec::new();
    while !top_row.iter().all(|n| history.contains(n)) {
        let ev = wait_event(&mut p1, |e| matches!(e, ServerEvent::NumberDrawn { .. })).await;
        if let ServerEvent::NumberDrawn { history: h, .. } = ev {
            history = h;
        }
    }

    send_cmd(&mut p1, 6, ClientCommand::ClaimWin { marked_numbers: top_row.clone() }).await;

    // Both clients hear the win with the pattern and the pot.
    for ws in [&mut p1, &mut p2] {
        let ev = wait_event(ws, |e| matches!(e, ServerEvent::GameWon { .. })).await;
        match ev {
            ServerEvent::GameWon { winner, prize, pattern, winning_board, .. } => {
                assert_eq!(winner, PlayerId(1));
                assert_eq!(prize, 20);
                assert_eq!(pattern, WinPattern::Line { line: Line::Row(0) });
                assert_eq!(winning_board, board);
            }
            other => panic!("expected GameWon, got {other:?}"),
        }
    }

    // A late claim is told no, whatever its content.
    send_cmd(&mut p2, 4, ClientCommand::ClaimWin { marked_numbers: history }).await;
    let ev = wait_event(&mut p2, |e| matches!(e, ServerEvent::InvalidClaim { .. })).await;
    assert!(matches!(ev, ServerEvent::InvalidClaim { .. }));
}

#[tokio::test]
async fn test_full_game_with_no_winner() {
    let catalogue = Catalogue::default().with(ModeConfig {
        entry_fee: 10,
        min_players: 2,
        max_players: 4,
        countdown: Duration::from_secs(60),
        draw_interval: Duration::from_millis(5),
        draw_seed: Some(11),
        ..ModeConfig::standard(GameMode::SingleLine)
    });
    let addr = start(catalogue).await;
    let (mut p1, _p2, _room, _board) = seated_pair(&addr).await;

    send_cmd(&mut p1, 5, ClientCommand::StartGame).await;

    // Nobody claims; 75 unique numbers fall, then the winnerless end.
    let mut drawn = Vec::new();
    loop {
        let ev = wait_event(&mut p1, |e| {
            matches!(e, ServerEvent::NumberDrawn { .. } | ServerEvent::GameEnded { .. })
        })
        .await;
        match ev {
            ServerEvent::NumberDrawn { number, .. } => {
                assert!(!drawn.contains(&number));
                drawn.push(number);
            }
            ServerEvent::GameEnded { winner } => {
                assert_eq!(winner, None);
                break;
            }
            _ => unreachable!(),
        }
    }
    assert_eq!(drawn.len(), 75);
}
