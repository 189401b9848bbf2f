//! Room actor: an isolated Tokio task that owns one bingo room.
//!
//! Each room runs in its own task and communicates with the outside
//! world through an mpsc command channel: no shared mutable state, just
//! message passing. That task is the single writer for everything the
//! room owns: phase, card ownership, the drawn sequence, and the pot.
//! Commands are processed strictly in arrival order, so a disconnect and
//! a win claim for the same player can never interleave.
//!
//! The actor loop is a `tokio::select!` over three sources: the command
//! channel, the countdown deadline, and the draw scheduler. The timer
//! futures pend while their phase is not active, and the `biased` order
//! lets queued commands (a win claim in particular) drain ahead of a
//! timer that became due in the same instant.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bingohall_draw::{DrawConfig, DrawOutcome, DrawScheduler};
use bingohall_ledger::Ledger;
use bingohall_protocol::{
    CardId, GameMode, PlayerId, Recipient, RoomId, RoomPhase, ServerEvent, WinPattern,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant as TokioInstant};

use crate::win::validate_claim;
use crate::{CardRegistry, ModeConfig, RoomError};

/// Channel sender for delivering room events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Why a room ended without a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The number pool ran out with no validated claim.
    NoWinner,
    /// An operator or the dispatcher cancelled the room.
    Cancelled,
    /// The draw sequence violated its own invariant; the room is ended
    /// rather than left half-drawn.
    DrawFault,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWinner => write!(f, "no_winner"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::DrawFault => write!(f, "draw_fault"),
        }
    }
}

/// What happened to a player's seat on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Pre-game disconnect: seat removed, card freed, fee refunded.
    SeatFreed,
    /// The game was running (or over): the seat and card are retained
    /// for settlement, only the connection flag drops.
    Retained,
    /// The player had no seat in this room.
    NotSeated,
}

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/response: the
/// caller awaits the typed result on the reply channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    SelectCard {
        player_id: PlayerId,
        card_id: CardId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    DeselectCard {
        player_id: PlayerId,
        card_id: CardId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    StartCountdown {
        reply: oneshot::Sender<bool>,
    },
    StartGame {
        reply: oneshot::Sender<bool>,
    },
    ClaimWin {
        player_id: PlayerId,
        marked_numbers: Vec<u8>,
        reply: oneshot::Sender<Result<WinPattern, RoomError>>,
    },
    EndGame {
        reason: EndReason,
        reply: oneshot::Sender<bool>,
    },
    Disconnect {
        player_id: PlayerId,
        reply: oneshot::Sender<DisconnectOutcome>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// A snapshot of room metadata (not the full game picture).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub mode: GameMode,
    pub phase: RoomPhase,
    /// Seated players (connected or not).
    pub player_count: usize,
    /// Players currently holding a card.
    pub card_count: usize,
    pub max_players: usize,
    /// Numbers drawn so far.
    pub drawn_count: usize,
    /// Accumulated prize pot.
    pub pot: u64,
    /// The validated winner, once the room has one.
    pub winner: Option<PlayerId>,
}

/// Handle to a running room actor. Cheap to clone; the manager holds one
/// per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Seats a player. Their entry fee must already be debited.
    pub async fn join(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join { player_id, sender, reply })
            .await?
    }

    /// Claims a card slot for the player.
    pub async fn select_card(
        &self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SelectCard { player_id, card_id, reply })
            .await?
    }

    /// Releases a card slot the player owns.
    pub async fn deselect_card(
        &self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::DeselectCard { player_id, card_id, reply })
            .await?
    }

    /// Explicitly starts the countdown. Idempotent; `false` if the phase
    /// did not allow it.
    pub async fn start_countdown(&self) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::StartCountdown { reply }).await
    }

    /// Explicitly starts the draw phase. Idempotent; `false` if the
    /// phase did not allow it.
    pub async fn start_game(&self) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::StartGame { reply }).await
    }

    /// Submits a win claim; resolves to the matched pattern on success.
    pub async fn claim_win(
        &self,
        player_id: PlayerId,
        marked_numbers: Vec<u8>,
    ) -> Result<WinPattern, RoomError> {
        self.request(|reply| RoomCommand::ClaimWin { player_id, marked_numbers, reply })
            .await?
    }

    /// Forces the room to end. `false` if it already had.
    pub async fn end_game(&self, reason: EndReason) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::EndGame { reason, reply }).await
    }

    /// Reports a player's connection as gone.
    pub async fn disconnect(
        &self,
        player_id: PlayerId,
    ) -> Result<DisconnectOutcome, RoomError> {
        self.request(|reply| RoomCommand::Disconnect { player_id, reply })
            .await
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down (fire-and-forget).
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Sends a command and awaits its oneshot reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// One seated player.
struct Seat {
    sender: PlayerSender,
    connected: bool,
    joined_at: Instant,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<L: Ledger> {
    room_id: RoomId,
    config: ModeConfig,
    phase: RoomPhase,
    seats: HashMap<PlayerId, Seat>,
    cards: CardRegistry,
    /// The authoritative drawn sequence, in draw order. Append-only.
    drawn: Vec<u8>,
    pot: u64,
    winner: Option<PlayerId>,
    countdown_deadline: Option<TokioInstant>,
    scheduler: DrawScheduler,
    ledger: Arc<L>,
    receiver: mpsc::Receiver<RoomCommand>,
    opened_at: Instant,
}

impl<L: Ledger> RoomActor<L> {
    /// Runs the actor loop until shutdown or retirement.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, mode = %self.config.mode, "room opened");

        loop {
            tokio::select! {
                biased;

                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd) {
                                break;
                            }
                        }
                        None => break,
                    }
                }

                // Pends while not in countdown (deadline is None).
                _ = deadline_expiry(self.countdown_deadline) => {
                    self.countdown_expired();
                }

                // Pends until armed by begin_playing, and again after
                // the terminal cancel.
                outcome = self.scheduler.wait_for_draw() => {
                    self.handle_draw(outcome);
                }
            }

            // Retire once the game is over and the last client is gone.
            if self.phase.is_terminal() && self.connected_count() == 0 {
                break;
            }
        }

        tracing::info!(
            room_id = %self.room_id,
            lifetime_secs = self.opened_at.elapsed().as_secs(),
            "room retired"
        );
    }

    /// Dispatches one command. Returns `true` on shutdown.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { player_id, sender, reply } => {
                let _ = reply.send(self.handle_join(player_id, sender));
            }
            RoomCommand::SelectCard { player_id, card_id, reply } => {
                let _ = reply.send(self.handle_select(player_id, card_id));
            }
            RoomCommand::DeselectCard { player_id, card_id, reply } => {
                let _ = reply.send(self.handle_deselect(player_id, card_id));
            }
            RoomCommand::StartCountdown { reply } => {
                let _ = reply.send(self.begin_countdown());
            }
            RoomCommand::StartGame { reply } => {
                let _ = reply.send(self.begin_playing());
            }
            RoomCommand::ClaimWin { player_id, marked_numbers, reply } => {
                let _ = reply.send(self.handle_claim(player_id, marked_numbers));
            }
            RoomCommand::EndGame { reason, reply } => {
                let _ = reply.send(self.finish(reason));
            }
            RoomCommand::Disconnect { player_id, reply } => {
                let _ = reply.send(self.handle_disconnect(player_id));
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                if !self.phase.is_terminal() {
                    self.finish(EndReason::Cancelled);
                }
                return true;
            }
        }
        false
    }

    // -----------------------------------------------------------------
    // Player lifecycle
    // -----------------------------------------------------------------

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if !self.phase.accepts_joins() {
            return Err(RoomError::Closed {
                room_id: self.room_id,
                phase: self.phase,
            });
        }
        if self.seats.contains_key(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        if self.seats.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }

        self.seats.insert(
            player_id,
            Seat {
                sender,
                connected: true,
                joined_at: Instant::now(),
            },
        );
        // The dispatcher debited the fee before routing the join.
        self.pot += self.config.entry_fee;

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.seats.len(),
            pot = self.pot,
            "player joined"
        );

        let snapshot = self.selection_snapshot();
        self.dispatch(vec![
            (
                Recipient::All,
                ServerEvent::PlayerJoined {
                    player_id,
                    count: self.seats.len(),
                },
            ),
            // Late joiners get the full picture in one event.
            (Recipient::Player(player_id), snapshot),
        ]);

        Ok(())
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) -> DisconnectOutcome {
        if !self.seats.contains_key(&player_id) {
            return DisconnectOutcome::NotSeated;
        }

        if self.phase.accepts_selections() {
            // Pre-game: the seat dissolves entirely and the fee goes back.
            let seat = self.seats.remove(&player_id);
            let freed = self.cards.release_card_of(player_id);
            self.pot = self.pot.saturating_sub(self.config.entry_fee);
            self.spawn_credit(player_id, self.config.entry_fee, "refund");

            tracing::info!(
                room_id = %self.room_id,
                %player_id,
                freed_card = freed.map(|c| c.0),
                players = self.seats.len(),
                seated_secs = seat.map(|s| s.joined_at.elapsed().as_secs()),
                "player left before start"
            );

            if let Some(card_id) = freed {
                self.dispatch(vec![(
                    Recipient::All,
                    ServerEvent::CardDeselectSuccess {
                        card_id,
                        player_count: self.cards.owned_count(),
                    },
                )]);
            }
            self.maybe_revert_countdown();
            DisconnectOutcome::SeatFreed
        } else {
            // Playing or ended: card ownership is retained for
            // settlement; selection is closed anyway.
            if let Some(seat) = self.seats.get_mut(&player_id) {
                seat.connected = false;
            }
            tracing::info!(
                room_id = %self.room_id,
                %player_id,
                phase = %self.phase,
                "player disconnected mid-game"
            );
            DisconnectOutcome::Retained
        }
    }

    // -----------------------------------------------------------------
    // Card selection
    // -----------------------------------------------------------------

    fn handle_select(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<(), RoomError> {
        if !self.seats.contains_key(&player_id) {
            return Err(RoomError::NotSeated(player_id));
        }
        if !self.phase.accepts_selections() {
            let err = RoomError::Closed {
                room_id: self.room_id,
                phase: self.phase,
            };
            self.send_to(
                player_id,
                ServerEvent::CardSelectError { message: err.to_string() },
            );
            return Err(err);
        }

        match self.cards.assign(card_id, player_id) {
            Ok(grid) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %player_id,
                    %card_id,
                    holders = self.cards.owned_count(),
                    "card selected"
                );
                self.dispatch(vec![(
                    Recipient::All,
                    ServerEvent::CardSelectSuccess {
                        card_id,
                        board: grid.cells(),
                        player_count: self.cards.owned_count(),
                    },
                )]);
                // Enough card holders arms the countdown automatically.
                if self.phase == RoomPhase::Selecting
                    && self.cards.owned_count() >= self.config.min_players
                {
                    self.begin_countdown();
                }
                Ok(())
            }
            Err(err) => {
                self.send_to(
                    player_id,
                    ServerEvent::CardSelectError { message: err.to_string() },
                );
                Err(err)
            }
        }
    }

    fn handle_deselect(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<(), RoomError> {
        if !self.seats.contains_key(&player_id) {
            return Err(RoomError::NotSeated(player_id));
        }
        if !self.phase.accepts_selections() {
            let err = RoomError::Closed {
                room_id: self.room_id,
                phase: self.phase,
            };
            self.send_to(
                player_id,
                ServerEvent::CardDeselectError { message: err.to_string() },
            );
            return Err(err);
        }
        if self.cards.owner_of(card_id) != Some(player_id) {
            let err = RoomError::CardNotOwned(card_id);
            self.send_to(
                player_id,
                ServerEvent::CardDeselectError { message: err.to_string() },
            );
            return Err(err);
        }

        self.cards.release(card_id);
        self.dispatch(vec![(
            Recipient::All,
            ServerEvent::CardDeselectSuccess {
                card_id,
                player_count: self.cards.owned_count(),
            },
        )]);
        self.maybe_revert_countdown();
        Ok(())
    }

    // -----------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------

    fn begin_countdown(&mut self) -> bool {
        if self.phase != RoomPhase::Selecting {
            return false;
        }
        debug_assert!(self.phase.can_transition_to(RoomPhase::Countdown));
        self.phase = RoomPhase::Countdown;
        self.countdown_deadline =
            Some(TokioInstant::now() + self.config.countdown);

        tracing::info!(
            room_id = %self.room_id,
            secs = self.config.countdown.as_secs(),
            "countdown started"
        );

        let snapshot = self.selection_snapshot();
        self.dispatch(vec![(Recipient::All, snapshot)]);
        true
    }

    /// The only backward transition: countdown → selecting, when the
    /// card-holder count falls under the mode minimum.
    fn maybe_revert_countdown(&mut self) {
        if self.phase != RoomPhase::Countdown
            || self.cards.owned_count() >= self.config.min_players
        {
            return;
        }
        debug_assert!(self.phase.can_transition_to(RoomPhase::Selecting));
        self.phase = RoomPhase::Selecting;
        self.countdown_deadline = None;

        tracing::info!(
            room_id = %self.room_id,
            holders = self.cards.owned_count(),
            min = self.config.min_players,
            "countdown reverted — not enough card holders"
        );

        let snapshot = self.selection_snapshot();
        self.dispatch(vec![(Recipient::All, snapshot)]);
    }

    fn countdown_expired(&mut self) {
        tracing::debug!(room_id = %self.room_id, "countdown expired");
        self.begin_playing();
    }

    fn begin_playing(&mut self) -> bool {
        if !matches!(self.phase, RoomPhase::Selecting | RoomPhase::Countdown) {
            return false;
        }
        debug_assert!(self.phase.can_transition_to(RoomPhase::Playing));
        if self.cards.owned_count() == 0 {
            tracing::warn!(
                room_id = %self.room_id,
                "game started with no card holders"
            );
        }
        self.phase = RoomPhase::Playing;
        self.countdown_deadline = None;
        let armed = self.scheduler.start();
        debug_assert!(armed, "scheduler must arm exactly once");

        tracing::info!(
            room_id = %self.room_id,
            players = self.seats.len(),
            holders = self.cards.owned_count(),
            pot = self.pot,
            "game started"
        );

        self.dispatch(vec![(
            Recipient::All,
            ServerEvent::GameStarted { game_id: self.room_id },
        )]);
        true
    }

    // -----------------------------------------------------------------
    // Draws
    // -----------------------------------------------------------------

    fn handle_draw(&mut self, outcome: DrawOutcome) {
        match outcome {
            DrawOutcome::Number(draw) => self.record_drawn(draw.number),
            DrawOutcome::Exhausted => {
                tracing::info!(
                    room_id = %self.room_id,
                    drawn = self.drawn.len(),
                    "number pool exhausted with no winner"
                );
                self.finish(EndReason::NoWinner);
            }
        }
    }

    /// Appends a drawn number. The scheduler already guarantees
    /// uniqueness; a duplicate here means the invariant broke, and the
    /// room is ended rather than left with a corrupt sequence.
    fn record_drawn(&mut self, number: u8) {
        if self.drawn.contains(&number) {
            tracing::error!(
                room_id = %self.room_id,
                number,
                "duplicate draw rejected — ending room"
            );
            self.finish(EndReason::DrawFault);
            return;
        }
        self.drawn.push(number);
        tracing::debug!(
            room_id = %self.room_id,
            number,
            total = self.drawn.len(),
            "number drawn"
        );
        self.dispatch(vec![(
            Recipient::All,
            ServerEvent::NumberDrawn {
                number,
                history: self.drawn.clone(),
            },
        )]);
    }

    // -----------------------------------------------------------------
    // Claims and endings
    // -----------------------------------------------------------------

    fn handle_claim(
        &mut self,
        player_id: PlayerId,
        marked_numbers: Vec<u8>,
    ) -> Result<WinPattern, RoomError> {
        if !self.phase.accepts_claims() {
            let message = if self.phase.is_terminal() {
                "game already ended".to_string()
            } else {
                format!("claims are not accepted while {}", self.phase)
            };
            return Err(self.reject_claim(player_id, message));
        }

        let Some(card_id) = self.cards.card_of(player_id) else {
            return Err(self.reject_claim(player_id, "you hold no card".to_string()));
        };
        let Some(grid) = self.cards.grid_of(card_id).copied() else {
            return Err(self.reject_claim(player_id, "card has no grid".to_string()));
        };

        let drawn_set: HashSet<u8> = self.drawn.iter().copied().collect();
        match validate_claim(&grid, &marked_numbers, &drawn_set, self.config.target) {
            Some(pattern) => {
                self.winner = Some(player_id);
                let prize = self.pot;
                self.conclude();

                tracing::info!(
                    room_id = %self.room_id,
                    %player_id,
                    %card_id,
                    prize,
                    ?pattern,
                    "game won"
                );

                self.dispatch(vec![(
                    Recipient::All,
                    ServerEvent::GameWon {
                        winner: player_id,
                        pattern: pattern.clone(),
                        prize,
                        winning_board: grid.cells(),
                        marked_numbers,
                    },
                )]);
                // Settlement never blocks the broadcast above.
                self.spawn_credit(player_id, prize, "prize");
                Ok(pattern)
            }
            None => Err(self.reject_claim(
                player_id,
                "marked cells do not complete the winning pattern".to_string(),
            )),
        }
    }

    fn reject_claim(&mut self, player_id: PlayerId, message: String) -> RoomError {
        tracing::debug!(room_id = %self.room_id, %player_id, %message, "claim rejected");
        self.send_to(player_id, ServerEvent::InvalidClaim { message: message.clone() });
        RoomError::InvalidClaim(message)
    }

    /// Forces a no-winner ending. `false` if the room already ended.
    fn finish(&mut self, reason: EndReason) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.conclude();
        tracing::info!(room_id = %self.room_id, %reason, "game ended without a winner");
        self.dispatch(vec![(Recipient::All, ServerEvent::GameEnded { winner: None })]);
        true
    }

    /// The single terminal transition: sets `ended` and cancels the
    /// scheduler. Callers guarantee the phase is not yet terminal, which
    /// makes the cancellation exactly-once.
    fn conclude(&mut self) {
        debug_assert!(self.phase.can_transition_to(RoomPhase::Ended));
        self.phase = RoomPhase::Ended;
        self.countdown_deadline = None;
        let newly_cancelled = self.scheduler.cancel();
        debug_assert!(
            newly_cancelled,
            "terminal transition must cancel the scheduler exactly once"
        );
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Credits a player off the actor's critical path. One retry for
    /// transient ledger failures, then an error log for out-of-band
    /// alerting; the game outcome is already broadcast either way.
    fn spawn_credit(&self, player_id: PlayerId, amount: u64, what: &'static str) {
        if amount == 0 {
            return;
        }
        let ledger = Arc::clone(&self.ledger);
        let room_id = self.room_id;
        tokio::spawn(async move {
            let first = match ledger.credit(player_id, amount).await {
                Ok(()) => return,
                Err(e) => e,
            };
            if first.is_retryable() {
                time::sleep(Duration::from_secs(1)).await;
                if ledger.credit(player_id, amount).await.is_ok() {
                    return;
                }
            }
            tracing::error!(
                %room_id,
                %player_id,
                amount,
                what,
                error = %first,
                "settlement failed — needs out-of-band reconciliation"
            );
        });
    }

    // -----------------------------------------------------------------
    // Events and snapshots
    // -----------------------------------------------------------------

    fn selection_snapshot(&self) -> ServerEvent {
        ServerEvent::SelectionState {
            selected_cards: self.cards.selections(),
            player_count: self.cards.owned_count(),
            status: self.phase,
            countdown_secs: self.countdown_deadline.map(|d| {
                d.saturating_duration_since(TokioInstant::now()).as_secs()
            }),
            drawn_numbers: self.drawn.clone(),
        }
    }

    /// Delivers events to their recipients.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for player_id in self.seats.keys() {
                        self.send_to(*player_id, event.clone());
                    }
                }
                Recipient::Player(player_id) => {
                    self.send_to(player_id, event);
                }
                Recipient::AllExcept(excluded) => {
                    for player_id in self.seats.keys() {
                        if *player_id != excluded {
                            self.send_to(*player_id, event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends one event to one player. Silently drops if the player's
    /// receiver is gone or the seat is marked disconnected.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(seat) = self.seats.get(&player_id) {
            if seat.connected {
                let _ = seat.sender.send(event);
            }
        }
    }

    fn connected_count(&self) -> usize {
        self.seats.values().filter(|s| s.connected).count()
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            mode: self.config.mode,
            phase: self.phase,
            player_count: self.seats.len(),
            card_count: self.cards.owned_count(),
            max_players: self.config.max_players,
            drawn_count: self.drawn.len(),
            pot: self.pot,
            winner: self.winner,
        }
    }
}

/// Sleeps until the countdown deadline, or forever when there is none.
async fn deadline_expiry(deadline: Option<TokioInstant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue: when it fills, senders wait,
/// which backpressures a flooding client instead of growing memory.
pub(crate) fn spawn_room<L: Ledger>(
    room_id: RoomId,
    config: ModeConfig,
    ledger: Arc<L>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let scheduler = DrawScheduler::new(DrawConfig {
        interval: config.draw_interval,
        seed: config.draw_seed,
        ..DrawConfig::default()
    });

    let actor = RoomActor {
        room_id,
        cards: CardRegistry::new(config.card_pool),
        config,
        phase: RoomPhase::Selecting,
        seats: HashMap::new(),
        drawn: Vec::new(),
        pot: 0,
        winner: None,
        countdown_deadline: None,
        scheduler,
        ledger,
        receiver: rx,
        opened_at: Instant::now(),
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
