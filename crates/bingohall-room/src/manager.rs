//! Room manager: creates rooms, tracks who sits where, and routes
//! player actions to the right room actor.
//!
//! The manager is the one logical authority per room id: every inbound
//! action funnels through it into the room's command channel, so no two
//! execution contexts ever mutate the same room. The manager's own maps
//! need only lightweight exclusion (callers wrap it in a mutex around
//! insertion/lookup); room internals are never touched under that lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bingohall_ledger::{Ledger, LedgerError};
use bingohall_protocol::{CardId, GameMode, PlayerId, RoomId, WinPattern};

use crate::room::spawn_room;
use crate::{
    Catalogue, DisconnectOutcome, EndReason, ModeConfig, PlayerSender, RoomError,
    RoomHandle, RoomInfo,
};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// A room the manager is responsible for.
struct ManagedRoom {
    handle: RoomHandle,
    entry_fee: u64,
}

/// Creates, tracks, and routes to rooms.
///
/// Generic over the [`Ledger`] so deployments inject their wallet
/// service and tests inject an in-memory one.
pub struct RoomManager<L: Ledger> {
    rooms: HashMap<RoomId, ManagedRoom>,
    /// Each player sits in at most one room at a time.
    player_rooms: HashMap<PlayerId, RoomId>,
    ledger: Arc<L>,
    catalogue: Catalogue,
}

impl<L: Ledger> RoomManager<L> {
    /// Creates an empty manager with the standard mode catalogue.
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_catalogue(ledger, Catalogue::default())
    }

    /// Creates an empty manager with an operator-supplied catalogue.
    pub fn with_catalogue(ledger: Arc<L>, catalogue: Catalogue) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            ledger,
            catalogue,
        }
    }

    /// The ledger rooms settle against.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Creates a room for a catalogue mode and returns its ID.
    pub fn create_game(&mut self, mode: GameMode) -> RoomId {
        self.create_game_with(self.catalogue.get(mode).clone())
    }

    /// Creates a room with explicit (possibly overridden) settings.
    pub fn create_game_with(&mut self, config: ModeConfig) -> RoomId {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let entry_fee = config.entry_fee;
        let handle = spawn_room(
            room_id,
            config,
            Arc::clone(&self.ledger),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id, ManagedRoom { handle, entry_fee });
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Seats a player in a room.
    ///
    /// The entry fee is debited *before* the join is routed: a player
    /// who cannot afford the fee is rejected without the room ever
    /// seeing them. If the room itself then rejects the join (full,
    /// closed), the fee is refunded off the caller's path.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }
        let room = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        self.ledger
            .debit(player_id, room.entry_fee)
            .await
            .map_err(|e| match e {
                LedgerError::InsufficientBalance { .. } | LedgerError::UnknownPlayer(_) => {
                    RoomError::InsufficientBalance(e)
                }
                LedgerError::Unavailable(_) => RoomError::LedgerUnavailable(e),
            })?;

        match room.handle.join(player_id, sender).await {
            Ok(()) => {
                self.player_rooms.insert(player_id, room_id);
                Ok(())
            }
            Err(err) => {
                // The seat never materialized; give the fee back.
                let ledger = Arc::clone(&self.ledger);
                let fee = room.entry_fee;
                tokio::spawn(async move {
                    if let Err(e) = ledger.credit(player_id, fee).await {
                        tracing::error!(
                            %player_id,
                            fee,
                            error = %e,
                            "join refund failed — needs reconciliation"
                        );
                    }
                });
                Err(err)
            }
        }
    }

    /// Routes a card selection to the player's room.
    pub async fn select_card(
        &self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<(), RoomError> {
        self.room_of(player_id)?
            .handle
            .select_card(player_id, card_id)
            .await
    }

    /// Routes a card release to the player's room.
    pub async fn deselect_card(
        &self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<(), RoomError> {
        self.room_of(player_id)?
            .handle
            .deselect_card(player_id, card_id)
            .await
    }

    /// Routes a win claim to the player's room.
    pub async fn claim_win(
        &self,
        player_id: PlayerId,
        marked_numbers: Vec<u8>,
    ) -> Result<WinPattern, RoomError> {
        self.room_of(player_id)?
            .handle
            .claim_win(player_id, marked_numbers)
            .await
    }

    /// Explicitly starts a room's countdown.
    pub async fn start_countdown(&self, room_id: RoomId) -> Result<bool, RoomError> {
        self.room(room_id)?.handle.start_countdown().await
    }

    /// Explicitly starts a room's draw phase.
    pub async fn start_game(&self, room_id: RoomId) -> Result<bool, RoomError> {
        self.room(room_id)?.handle.start_game().await
    }

    /// Forces a room to end.
    pub async fn end_game(
        &self,
        room_id: RoomId,
        reason: EndReason,
    ) -> Result<bool, RoomError> {
        self.room(room_id)?.handle.end_game(reason).await
    }

    /// Handles a dropped connection.
    ///
    /// Routed into the room as a serialized command like everything
    /// else, so it cannot interleave with an in-flight claim. The player
    /// index entry is dropped either way; the connection is gone.
    pub async fn disconnect(&mut self, player_id: PlayerId) -> DisconnectOutcome {
        let Some(room_id) = self.player_rooms.remove(&player_id) else {
            return DisconnectOutcome::NotSeated;
        };
        match self.rooms.get(&room_id) {
            Some(room) => room
                .handle
                .disconnect(player_id)
                .await
                .unwrap_or(DisconnectOutcome::NotSeated),
            None => DisconnectOutcome::NotSeated,
        }
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        self.room(room_id)?.handle.get_info().await
    }

    /// Lists rooms still accepting players.
    ///
    /// Rooms that fail to respond (retiring) are silently skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for room in self.rooms.values() {
            if let Ok(info) = room.handle.get_info().await {
                if info.phase.accepts_joins() && info.player_count < info.max_players {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Shuts a room down and clears its players from the index.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let room = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = room.handle.shutdown().await;
        self.player_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room a player currently sits in, if any.
    pub fn player_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player_id).copied()
    }

    /// Number of tracked rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All tracked room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    fn room(&self, room_id: RoomId) -> Result<&ManagedRoom, RoomError> {
        self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))
    }

    fn room_of(&self, player_id: PlayerId) -> Result<&ManagedRoom, RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotSeated(player_id))?;
        self.room(*room_id)
    }
}
