//! Per-mode room configuration and the standard mode catalogue.

use std::time::Duration;

use bingohall_protocol::GameMode;

use crate::win::TargetPattern;

/// Configuration for a room instance.
///
/// Rooms are created from [`ModeConfig::standard`] for one of the
/// catalogue modes; every field can be overridden before creation
/// (operators tune fees and caps, tests shrink the timers).
#[derive(Debug, Clone)]
pub struct ModeConfig {
    /// The mode this room plays.
    pub mode: GameMode,

    /// Entry fee debited per player at join, in the smallest currency
    /// unit. Accrues into the room's prize pot.
    pub entry_fee: u64,

    /// The pattern a claim must complete to win.
    pub target: TargetPattern,

    /// Players holding cards required before the countdown starts.
    pub min_players: usize,

    /// Maximum seats in the room, enforced at join.
    pub max_players: usize,

    /// Length of the pre-game countdown.
    pub countdown: Duration,

    /// Time between consecutive number draws.
    pub draw_interval: Duration,

    /// Size of the room's card pool (card ids 1..=card_pool).
    pub card_pool: u16,

    /// Fixed seed for the draw order. `None` (the default) draws from OS
    /// entropy; tests pin it.
    pub draw_seed: Option<u64>,
}

impl ModeConfig {
    /// The standard catalogue entry for a mode.
    pub fn standard(mode: GameMode) -> Self {
        let (entry_fee, target, max_players) = match mode {
            GameMode::SingleLine => (10, TargetPattern::LineOrCorners, 20),
            GameMode::DoubleLine => (25, TargetPattern::DoubleLine, 15),
            GameMode::Blackout => (50, TargetPattern::Blackout, 10),
        };
        Self {
            mode,
            entry_fee,
            target,
            max_players,
            min_players: 2,
            countdown: Duration::from_secs(30),
            draw_interval: Duration::from_secs(3),
            card_pool: 100,
            draw_seed: None,
        }
    }
}

/// The room settings the dispatcher creates rooms from, one entry per
/// mode.
///
/// Read-only to the core: operators build one at startup (from their
/// config source of choice) and hand it to the server; rooms copy their
/// settings out of it at creation time.
#[derive(Debug, Clone)]
pub struct Catalogue {
    single_line: ModeConfig,
    double_line: ModeConfig,
    blackout: ModeConfig,
}

impl Default for Catalogue {
    fn default() -> Self {
        Self {
            single_line: ModeConfig::standard(GameMode::SingleLine),
            double_line: ModeConfig::standard(GameMode::DoubleLine),
            blackout: ModeConfig::standard(GameMode::Blackout),
        }
    }
}

impl Catalogue {
    /// The settings for a mode.
    pub fn get(&self, mode: GameMode) -> &ModeConfig {
        match mode {
            GameMode::SingleLine => &self.single_line,
            GameMode::DoubleLine => &self.double_line,
            GameMode::Blackout => &self.blackout,
        }
    }

    /// Replaces the entry for `config.mode`, builder-style.
    pub fn with(mut self, config: ModeConfig) -> Self {
        match config.mode {
            GameMode::SingleLine => self.single_line = config,
            GameMode::DoubleLine => self.double_line = config,
            GameMode::Blackout => self.blackout = config,
        }
        self
    }
}
