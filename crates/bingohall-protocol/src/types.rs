//! Core protocol types: identities, game modes, room phases, commands,
//! events, and the envelopes that carry them.
//!
//! Everything here is part of the wire contract. The serde attributes are
//! load-bearing: client SDKs parse these exact JSON shapes, so any change
//! to a tag or field name is a protocol break.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The value stored in a board cell that is the free space.
///
/// Card numbers are 1..=75, so 0 is never a real number. The center cell
/// of every card carries this value and always counts as marked.
pub const FREE_CELL: u8 = 0;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// `#[serde(transparent)]` makes this serialize as the bare number, so
/// `PlayerId(42)` is just `42` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one live bingo game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A card slot in a room's fixed pool (1..=pool size).
///
/// The id identifies the slot; the 5×5 grid behind it is generated by the
/// room when the card is first claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u16);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game modes and phases
// ---------------------------------------------------------------------------

/// The ruleset a room is created with.
///
/// Each mode maps to an entry fee, a target win pattern, and player caps
/// in the mode catalogue (owned by the room crate; fees are server
/// configuration, not protocol).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// One complete line (row, column, or diagonal) or all four corners.
    SingleLine,
    /// Two distinct complete lines.
    DoubleLine,
    /// Every cell on the card.
    Blackout,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleLine => write!(f, "single_line"),
            Self::DoubleLine => write!(f, "double_line"),
            Self::Blackout => write!(f, "blackout"),
        }
    }
}

/// The lifecycle phase of a room.
///
/// Transitions are one-directional with a single exception:
///
/// ```text
/// selecting → countdown → playing → ended
///     ↑__________|
/// ```
///
/// The backward edge fires only when the player count drops below the
/// room's minimum while the countdown is running. `ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    Selecting,
    Countdown,
    Playing,
    Ended,
}

impl RoomPhase {
    /// Whether new players may join in this phase.
    pub fn accepts_joins(&self) -> bool {
        matches!(self, Self::Selecting | Self::Countdown)
    }

    /// Whether card selection and deselection are open.
    pub fn accepts_selections(&self) -> bool {
        matches!(self, Self::Selecting | Self::Countdown)
    }

    /// Whether win claims are processed rather than rejected outright.
    pub fn accepts_claims(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Whether this is the terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    ///
    /// `ended` is reachable from every live phase (cancellation, fault,
    /// exhaustion); `countdown → selecting` is the only backward edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Selecting, Self::Countdown) => true,
            (Self::Selecting, Self::Playing) => true,
            (Self::Countdown, Self::Playing) => true,
            (Self::Countdown, Self::Selecting) => true,
            (Self::Selecting | Self::Countdown | Self::Playing, Self::Ended) => true,
            _ => false,
        }
    }
}

// Display mirrors the serde representation so log lines and wire values
// agree on the phase names.
impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selecting => write!(f, "selecting"),
            Self::Countdown => write!(f, "countdown"),
            Self::Playing => write!(f, "playing"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Win patterns
// ---------------------------------------------------------------------------

/// One complete line on a 5×5 card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Line {
    Row(u8),
    Column(u8),
    MainDiagonal,
    AntiDiagonal,
}

/// The pattern a validated claim matched, reported in `game_won` so
/// clients can display what actually won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WinPattern {
    Line { line: Line },
    FourCorners,
    DoubleLine { first: Line, second: Line },
    Blackout,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Addresses event fan-out inside a room.
///
/// The room core produces `(Recipient, ServerEvent)` pairs; the delivery
/// layer resolves them against the room's connected players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One specific player (errors, personal snapshots).
    Player(PlayerId),
    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Commands (client → server)
// ---------------------------------------------------------------------------

/// Everything a client may ask the server to do.
///
/// `identify` must be the first command on a connection; `create_game`
/// and `join` are dispatcher-level; the rest are routed to the room the
/// player is currently in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Claim an identity for this connection. Authentication proper sits
    /// in front of this boundary and is not part of the core.
    Identify { player_id: PlayerId },

    /// Create a new room with the given mode. Does not join it.
    CreateGame { mode: GameMode },

    /// Join an existing room (entry fee is debited on success).
    Join { room_id: RoomId },

    /// Claim an unowned card slot in the current room.
    SelectCard { card_id: CardId },

    /// Release a card slot the player owns.
    DeselectCard { card_id: CardId },

    /// Explicitly begin the pre-game countdown (admin/test action).
    StartCountdown,

    /// Explicitly begin the draw phase (admin/test action).
    StartGame,

    /// Assert that the player's card satisfies the room's win pattern.
    /// `marked_numbers` are the card numbers the client has daubed.
    ClaimWin { marked_numbers: Vec<u8> },

    /// Orderly goodbye; equivalent to dropping the connection.
    Disconnect,
}

// ---------------------------------------------------------------------------
// Events (server → client)
// ---------------------------------------------------------------------------

/// One entry of the selection snapshot: which card is held by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCard {
    pub card_id: CardId,
    pub player_id: PlayerId,
}

/// Everything a room (or the dispatcher) can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Reply to `identify`.
    Welcome { player_id: PlayerId },

    /// Reply to `create_game`.
    GameCreated { room_id: RoomId, mode: GameMode },

    /// Broadcast when a player takes a seat.
    PlayerJoined { player_id: PlayerId, count: usize },

    /// Broadcast when a card is claimed. `board` is the freshly generated
    /// grid (`FREE_CELL` at the center) so the claiming client can render
    /// its card without a second round trip.
    CardSelectSuccess {
        card_id: CardId,
        board: [[u8; 5]; 5],
        player_count: usize,
    },

    /// Sent to the requesting player only.
    CardSelectError { message: String },

    /// Broadcast when a card is released.
    CardDeselectSuccess { card_id: CardId, player_count: usize },

    /// Sent to the requesting player only.
    CardDeselectError { message: String },

    /// Full room snapshot: sent to a client joining mid-room and
    /// broadcast whenever the selection picture changes shape
    /// (countdown started or reverted).
    SelectionState {
        selected_cards: Vec<SelectedCard>,
        player_count: usize,
        status: RoomPhase,
        /// Seconds until the countdown expires, when in `countdown`.
        countdown_secs: Option<u64>,
        drawn_numbers: Vec<u8>,
    },

    /// Broadcast when the draw phase begins.
    GameStarted { game_id: RoomId },

    /// Broadcast for every draw. `history` is the full authoritative
    /// sequence including `number`, in draw order.
    NumberDrawn { number: u8, history: Vec<u8> },

    /// Broadcast when a claim validates. Terminal for the room.
    GameWon {
        winner: PlayerId,
        pattern: WinPattern,
        prize: u64,
        winning_board: [[u8; 5]; 5],
        marked_numbers: Vec<u8>,
    },

    /// Sent to the claiming player only; play continues.
    InvalidClaim { message: String },

    /// Broadcast on any non-win ending (`winner` is always `None` today;
    /// the field keeps the shape shared with future split-pot endings).
    GameEnded { winner: Option<PlayerId> },

    /// Dispatcher-level failure for the issuing client (unknown room,
    /// insufficient balance, malformed command). HTTP-style codes.
    CommandError { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Wrapper around every inbound command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Client-side auto-incrementing sequence number.
    pub seq: u64,
    /// Client clock, milliseconds. Informational only.
    #[serde(default)]
    pub timestamp: u64,
    pub command: ClientCommand,
}

/// Wrapper around every outbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Server-side per-connection sequence number.
    pub seq: u64,
    /// Milliseconds since the server started.
    pub timestamp: u64,
    pub event: ServerEvent,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is consumed by non-Rust clients, so these tests
    //! pin the exact JSON produced by the serde attributes.

    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&RoomId(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&CardId(13)).unwrap(), "13");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
        assert_eq!(CardId(99).to_string(), "C-99");
    }

    #[test]
    fn test_game_mode_snake_case() {
        let json = serde_json::to_string(&GameMode::SingleLine).unwrap();
        assert_eq!(json, "\"single_line\"");
        let json = serde_json::to_string(&GameMode::Blackout).unwrap();
        assert_eq!(json, "\"blackout\"");
    }

    #[test]
    fn test_room_phase_wire_names() {
        assert_eq!(serde_json::to_string(&RoomPhase::Selecting).unwrap(), "\"selecting\"");
        assert_eq!(serde_json::to_string(&RoomPhase::Ended).unwrap(), "\"ended\"");
        // Display must agree with the wire name.
        assert_eq!(RoomPhase::Countdown.to_string(), "countdown");
    }

    #[test]
    fn test_phase_transitions_forward_only() {
        use RoomPhase::*;
        assert!(Selecting.can_transition_to(Countdown));
        assert!(Countdown.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Ended));
        // Explicit start may skip the countdown.
        assert!(Selecting.can_transition_to(Playing));
        // Terminal is reachable from any live phase.
        assert!(Selecting.can_transition_to(Ended));
        assert!(Countdown.can_transition_to(Ended));
        // No resurrection, no rewind from playing.
        assert!(!Ended.can_transition_to(Selecting));
        assert!(!Ended.can_transition_to(Playing));
        assert!(!Playing.can_transition_to(Selecting));
        assert!(!Playing.can_transition_to(Countdown));
    }

    #[test]
    fn test_phase_revert_only_from_countdown() {
        use RoomPhase::*;
        assert!(Countdown.can_transition_to(Selecting));
        assert!(!Playing.can_transition_to(Selecting));
        assert!(!Selecting.can_transition_to(Selecting));
    }

    #[test]
    fn test_phase_predicates() {
        assert!(RoomPhase::Selecting.accepts_joins());
        assert!(RoomPhase::Countdown.accepts_joins());
        assert!(!RoomPhase::Playing.accepts_joins());
        assert!(RoomPhase::Playing.accepts_claims());
        assert!(!RoomPhase::Countdown.accepts_claims());
        assert!(RoomPhase::Ended.is_terminal());
    }

    #[test]
    fn test_command_json_format() {
        let cmd = ClientCommand::SelectCard { card_id: CardId(3) };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "select_card");
        assert_eq!(json["card_id"], 3);
    }

    #[test]
    fn test_claim_win_command_round_trip() {
        let cmd = ClientCommand::ClaimWin {
            marked_numbers: vec![4, 19, 33, 52, 67],
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_identify_command_json_format() {
        let cmd = ClientCommand::Identify { player_id: PlayerId(9) };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "identify");
        assert_eq!(json["player_id"], 9);
    }

    #[test]
    fn test_number_drawn_event_json_format() {
        let ev = ServerEvent::NumberDrawn { number: 42, history: vec![7, 42] };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "number_drawn");
        assert_eq!(json["number"], 42);
        assert_eq!(json["history"], serde_json::json!([7, 42]));
    }

    #[test]
    fn test_game_won_event_round_trip() {
        let ev = ServerEvent::GameWon {
            winner: PlayerId(1),
            pattern: WinPattern::Line { line: Line::Row(0) },
            prize: 200,
            winning_board: [[0u8; 5]; 5],
            marked_numbers: vec![4, 19, 33, 52, 67],
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_win_pattern_json_format() {
        let p = WinPattern::Line { line: Line::Row(1) };
        let json: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "line");
        assert_eq!(json["line"], serde_json::json!({ "row": 1 }));

        let p = WinPattern::FourCorners;
        let json: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "four_corners");
    }

    #[test]
    fn test_selection_state_event_json_format() {
        let ev = ServerEvent::SelectionState {
            selected_cards: vec![SelectedCard {
                card_id: CardId(3),
                player_id: PlayerId(1),
            }],
            player_count: 1,
            status: RoomPhase::Countdown,
            countdown_secs: Some(12),
            drawn_numbers: vec![],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "selection_state");
        assert_eq!(json["status"], "countdown");
        assert_eq!(json["countdown_secs"], 12);
        assert_eq!(json["selected_cards"][0]["card_id"], 3);
    }

    #[test]
    fn test_game_ended_null_winner() {
        let ev = ServerEvent::GameEnded { winner: None };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "game_ended");
        assert!(json["winner"].is_null());
    }

    #[test]
    fn test_command_envelope_timestamp_defaults() {
        // Clients may omit the timestamp; `#[serde(default)]` fills 0.
        let json = r#"{
            "seq": 1,
            "command": { "type": "start_game" }
        }"#;
        let env: CommandEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.timestamp, 0);
        assert_eq!(env.command, ClientCommand::StartGame);
    }

    #[test]
    fn test_event_envelope_round_trip() {
        let env = EventEnvelope {
            seq: 9,
            timestamp: 1500,
            event: ServerEvent::GameStarted { game_id: RoomId(4) },
        };
        let bytes = serde_json::to_vec(&env).unwrap();
        let decoded: EventEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(env, decoded);
    }

    #[test]
    fn test_recipient_round_trip() {
        for r in [
            Recipient::All,
            Recipient::Player(PlayerId(7)),
            Recipient::AllExcept(PlayerId(3)),
        ] {
            let bytes = serde_json::to_vec(&r).unwrap();
            let decoded: Recipient = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(r, decoded);
        }
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<CommandEnvelope, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_command_type_returns_error() {
        let unknown = r#"{"type": "teleport", "x": 1}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
