//! Number-draw scheduler for Bingohall rooms.
//!
//! Once a room enters its playing phase it arms a [`DrawScheduler`],
//! which then produces unique numbers from a bounded pool at a fixed
//! cadence until the pool is exhausted or the room ends. The remaining
//! pool is always the complement of the numbers already drawn, so a
//! duplicate draw is impossible by construction; the room's own
//! duplicate check is purely defensive.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a room actor's
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         outcome = scheduler.wait_for_draw() => match outcome {
//!             DrawOutcome::Number(draw) => { /* record + broadcast */ }
//!             DrawOutcome::Exhausted => { /* end with no winner */ }
//!         }
//!     }
//! }
//! ```
//!
//! Before [`DrawScheduler::start`] is called — and after
//! [`DrawScheduler::cancel`] — `wait_for_draw` pends forever, so the
//! other `select!` branches keep running and no draw can leak into a
//! room that is not playing. All timing state lives in the struct, not
//! in the future, so the in-flight future can be dropped and recreated
//! on every loop iteration (which is exactly what `select!` does).

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a room's draw schedule.
#[derive(Debug, Clone)]
pub struct DrawConfig {
    /// Time between consecutive draws.
    pub interval: Duration,
    /// Upper bound of the number pool; draws come from `1..=pool_high`.
    pub pool_high: u8,
    /// Random delay (0–max ms) added to the *first* draw so rooms that
    /// start in the same instant don't all fire together.
    pub initial_jitter_ms: u64,
    /// Fixed RNG seed. `None` seeds from the OS; tests pin this for a
    /// reproducible draw order.
    pub seed: Option<u64>,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            pool_high: Self::MAX_POOL_HIGH,
            initial_jitter_ms: 250,
            seed: None,
        }
    }
}

impl DrawConfig {
    /// The full bingo range.
    pub const MAX_POOL_HIGH: u8 = 75;

    /// Create a config with a specific draw interval and defaults
    /// everywhere else.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`DrawScheduler::new`]:
    /// - `pool_high` is clamped to `1..=MAX_POOL_HIGH`.
    /// - a zero `interval` falls back to the default cadence.
    pub fn validated(mut self) -> Self {
        if self.pool_high == 0 || self.pool_high > Self::MAX_POOL_HIGH {
            warn!(
                pool_high = self.pool_high,
                max = Self::MAX_POOL_HIGH,
                "pool_high out of range — clamping"
            );
            self.pool_high = self.pool_high.clamp(1, Self::MAX_POOL_HIGH);
        }
        if self.interval.is_zero() {
            warn!("draw interval is zero — falling back to default");
            self.interval = Self::default().interval;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A single successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    /// The number drawn (unique for the scheduler's lifetime).
    pub number: u8,
    /// 1-based position of this draw in the sequence.
    pub sequence: u64,
    /// How many numbers are left in the pool after this draw.
    pub remaining: usize,
}

/// What [`DrawScheduler::wait_for_draw`] resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A fresh number was drawn.
    Number(Draw),
    /// The pool is empty. Fires one interval after the final draw, once,
    /// and the scheduler pends forever afterwards.
    Exhausted,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Draws unique random numbers at a fixed cadence. One per room.
pub struct DrawScheduler {
    config: DrawConfig,
    /// Numbers not yet drawn. Order is irrelevant; draws pick a random
    /// index and `swap_remove`.
    remaining: Vec<u8>,
    rng: StdRng,
    /// When the next draw fires. `None` while idle (not started,
    /// cancelled, or already exhausted).
    next_draw: Option<TokioInstant>,
    started: bool,
    cancelled: bool,
    drawn: u64,
}

impl DrawScheduler {
    /// Create an idle scheduler from config. Call [`start`](Self::start)
    /// to arm it.
    pub fn new(config: DrawConfig) -> Self {
        let config = config.validated();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            remaining: (1..=config.pool_high).collect(),
            rng,
            config,
            next_draw: None,
            started: false,
            cancelled: false,
            drawn: 0,
        }
    }

    /// Create a scheduler with a specific interval and default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(DrawConfig::with_interval(interval))
    }

    /// Removes the given numbers from the pool before starting.
    ///
    /// Used when a room is rebuilt from a persisted drawn sequence: the
    /// pool becomes the complement of what was already called.
    pub fn exclude(&mut self, drawn: &[u8]) {
        self.remaining.retain(|n| !drawn.contains(n));
    }

    /// Arms the scheduler. The first draw fires after one interval plus
    /// jitter. Returns `false` (and does nothing) if already started or
    /// cancelled.
    pub fn start(&mut self) -> bool {
        if self.started || self.cancelled {
            return false;
        }
        self.started = true;
        let jitter = if self.config.initial_jitter_ms > 0 {
            Duration::from_millis(self.rng.random_range(0..self.config.initial_jitter_ms))
        } else {
            Duration::ZERO
        };
        self.next_draw = Some(TokioInstant::now() + self.config.interval + jitter);
        debug!(
            interval_ms = self.config.interval.as_millis() as u64,
            pool = self.remaining.len(),
            "draw scheduler started"
        );
        true
    }

    /// Stops all future draws. Numbers already drawn are never retracted.
    ///
    /// Returns `true` only for the call that performed the cancellation,
    /// so callers can assert their exactly-once cleanup.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        self.next_draw = None;
        debug!(drawn = self.drawn, "draw scheduler cancelled");
        true
    }

    /// Waits until the next draw is due and performs it.
    ///
    /// Pends forever while idle (unarmed, cancelled, or post-exhaustion)
    /// — `select!` keeps servicing its other branches. Exhaustion is
    /// reported one interval *after* the final number so a claim racing
    /// the last draw still gets processed first.
    pub async fn wait_for_draw(&mut self) -> DrawOutcome {
        let next = match self.next_draw {
            Some(next) if self.started && !self.cancelled => next,
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        if self.remaining.is_empty() {
            self.next_draw = None;
            debug!(drawn = self.drawn, "pool exhausted");
            return DrawOutcome::Exhausted;
        }

        let idx = self.rng.random_range(0..self.remaining.len());
        let number = self.remaining.swap_remove(idx);
        self.drawn += 1;
        self.next_draw = Some(TokioInstant::now() + self.config.interval);

        trace!(number, sequence = self.drawn, remaining = self.remaining.len(), "number drawn");

        DrawOutcome::Number(Draw {
            number,
            sequence: self.drawn,
            remaining: self.remaining.len(),
        })
    }

    /// Whether [`start`](Self::start) has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Numbers drawn so far.
    pub fn drawn_count(&self) -> u64 {
        self.drawn
    }

    /// Numbers left in the pool.
    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// The configured draw interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
