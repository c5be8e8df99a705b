//! Trick State Machine
//!
//! ```text
//!   Idle ──(stick down)──► Preparing ──(clean flick)──► Executing ──(commit)──► Idle
//!                            │  ▲
//!          timeout / cancel  │  └─ stick down again while cancel is armed
//!                            ▼     (fresh preparation, old timers dropped)
//!                           Idle
//! ```
//!
//! All timers are tick countdowns owned by the phase they belong to, so
//! leaving a phase drops its timers with it.

use glam::Vec2;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::timer::Countdown;
use crate::game::config::TrickConfig;
use crate::game::sensor::GroundStatus;

/// Tricks the session can commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrickKind {
    /// Flick up (needs ground or coyote time)
    Ollie = 0,
    /// Flick right
    Kickflip = 1,
    /// Flick left
    PopShuvIt = 2,
}

/// Phase of the trick state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrickPhase {
    /// Waiting for the stick to be pressed down
    #[default]
    Idle,
    /// Stick was pressed down; waiting for a flick
    Preparing {
        /// Preparation expires when this fires
        timeout: Countdown,
        /// Armed while the stick rests in neutral
        cancel: Countdown,
    },
    /// Trick committed; returns to Idle when `commit` fires
    Executing { kind: TrickKind, commit: Countdown },
}

impl TrickPhase {
    fn tag(&self) -> u8 {
        match self {
            TrickPhase::Idle => 0,
            TrickPhase::Preparing { .. } => 1,
            TrickPhase::Executing { .. } => 2,
        }
    }
}

/// What happened during one advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrickOutcome {
    /// Trick committed this tick
    pub performed: Option<TrickKind>,
    /// The committed trick left from the ground
    pub takeoff: bool,
    /// Touched down; carries the combo that was running
    pub landed: Option<u32>,
}

/// Read a clean flick from the trick stick.
///
/// One component must exceed `threshold` while the other stays under
/// `cross_tolerance`. Diagonals and downward flicks give `None`.
pub fn classify_flick(look: Vec2, threshold: f32, cross_tolerance: f32) -> Option<TrickKind> {
    if look.x > threshold && look.y.abs() < cross_tolerance {
        Some(TrickKind::Kickflip)
    } else if look.x < -threshold && look.y.abs() < cross_tolerance {
        Some(TrickKind::PopShuvIt)
    } else if look.y > threshold && look.x.abs() < cross_tolerance {
        Some(TrickKind::Ollie)
    } else {
        None
    }
}

/// Per-skater trick session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrickSession {
    phase: TrickPhase,
    /// No new preparation while running
    cooldown: Countdown,
    /// Landing is ignored while running
    suppression: Countdown,
    /// Tricks since the last landing
    combo: u32,
    /// The running suppression window began with a takeoff
    launched: bool,
    /// Grounded state at the last observed tick outside suppression
    was_grounded: bool,
    config: TrickConfig,
    dt: f32,
}

impl TrickSession {
    /// Idle session. The body is assumed airborne until the first landing.
    pub fn new(config: TrickConfig, dt: f32) -> Self {
        Self {
            phase: TrickPhase::Idle,
            cooldown: Countdown::STOPPED,
            suppression: Countdown::STOPPED,
            combo: 0,
            launched: false,
            was_grounded: false,
            config,
            dt,
        }
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> TrickPhase {
        self.phase
    }

    /// Waiting for a flick?
    #[inline]
    pub fn is_preparing(&self) -> bool {
        matches!(self.phase, TrickPhase::Preparing { .. })
    }

    /// Inside the landing-suppression window after a trick.
    #[inline]
    pub fn in_flight(&self) -> bool {
        self.suppression.is_running()
    }

    /// Ground contact should be ignored: a takeoff trick is still leaving the ground.
    ///
    /// Air tricks defer the landing cue but never hide the ground itself.
    #[inline]
    pub fn ignores_contact(&self) -> bool {
        self.launched && self.in_flight()
    }

    /// Tricks performed since the last landing.
    #[inline]
    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Ticks until a new preparation is allowed.
    #[inline]
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown.remaining()
    }

    /// Ticks left to flick, while preparing.
    pub fn flick_deadline(&self) -> Option<u32> {
        match self.phase {
            TrickPhase::Preparing { timeout, .. } => Some(timeout.remaining()),
            _ => None,
        }
    }

    /// Generic trick button: ollie straight from Idle.
    ///
    /// Returns `true` when the ollie was committed (always a takeoff).
    pub fn try_button_takeoff(&mut self, grounded: bool) -> bool {
        if self.phase != TrickPhase::Idle || !grounded || self.blocked() {
            return false;
        }
        self.execute(TrickKind::Ollie, grounded);
        true
    }

    /// Advance one tick after the ground sensor and locomotion have run.
    pub fn advance(&mut self, look: Vec2, ground: &GroundStatus) -> TrickOutcome {
        let mut outcome = TrickOutcome::default();

        self.cooldown.advance();
        self.suppression.advance();

        if !self.in_flight() {
            if ground.is_grounded && !self.was_grounded {
                debug!(combo = self.combo, "landed");
                outcome.landed = Some(self.combo);
                self.combo = 0;
            }
            self.was_grounded = ground.is_grounded;
        }

        match self.phase {
            TrickPhase::Idle => {
                if self.pressed_down(look) && !self.blocked() {
                    self.prepare();
                }
            }
            TrickPhase::Preparing { mut timeout, mut cancel } => {
                let flick = self
                    .read_flick(look)
                    .filter(|kind| *kind != TrickKind::Ollie || ground.is_grounded);

                if timeout.advance() {
                    debug!("trick preparation timed out");
                    self.phase = TrickPhase::Idle;
                } else if self.pressed_down(look) && cancel.is_running() {
                    self.prepare();
                } else if let Some(kind) = flick {
                    // Read before the cancel moves, so its last tick still counts
                    outcome.performed = Some(kind);
                    outcome.takeoff = self.execute(kind, ground.is_grounded);
                } else if cancel.advance() {
                    debug!("trick preparation cancelled");
                    self.phase = TrickPhase::Idle;
                } else {
                    if look.length() < self.config.neutral_threshold && !cancel.is_running() {
                        cancel = Countdown::from_secs(self.config.cancel_delay, self.dt);
                    }
                    self.phase = TrickPhase::Preparing { timeout, cancel };
                }
            }
            TrickPhase::Executing { kind, mut commit } => {
                if commit.advance() {
                    self.phase = TrickPhase::Idle;
                } else {
                    self.phase = TrickPhase::Executing { kind, commit };
                }
            }
        }

        outcome
    }

    /// Feed phase, timers and combo into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.phase.tag());
        match self.phase {
            TrickPhase::Idle => {}
            TrickPhase::Preparing { timeout, cancel } => {
                hasher.update_u32(timeout.remaining());
                hasher.update_u32(cancel.remaining());
            }
            TrickPhase::Executing { kind, commit } => {
                hasher.update_u8(kind as u8);
                hasher.update_u32(commit.remaining());
            }
        }
        hasher.update_u32(self.cooldown.remaining());
        hasher.update_u32(self.suppression.remaining());
        hasher.update_u32(self.combo);
        hasher.update_bool(self.launched);
        hasher.update_bool(self.was_grounded);
    }

    fn blocked(&self) -> bool {
        self.cooldown.is_running() || self.in_flight()
    }

    fn pressed_down(&self, look: Vec2) -> bool {
        look.y < -self.config.press_threshold
    }

    fn read_flick(&self, look: Vec2) -> Option<TrickKind> {
        if look.length() <= self.config.flick_threshold {
            return None;
        }
        classify_flick(look, self.config.flick_threshold, self.config.flick_cross_tolerance)
    }

    /// Enter a fresh preparation, replacing any running timers.
    fn prepare(&mut self) {
        self.phase = TrickPhase::Preparing {
            timeout: Countdown::from_secs(self.config.prepare_timeout, self.dt),
            cancel: Countdown::STOPPED,
        };
        debug!("trick preparing");
    }

    /// Commit `kind`. Returns whether it left from the ground.
    fn execute(&mut self, kind: TrickKind, grounded: bool) -> bool {
        self.phase = TrickPhase::Executing {
            kind,
            commit: Countdown::from_secs(self.config.commit_delay, self.dt),
        };
        self.cooldown = Countdown::from_secs(self.config.cooldown, self.dt);
        self.suppression = Countdown::from_secs(self.config.landing_suppression, self.dt);
        self.combo += 1;
        self.launched = grounded;
        if grounded {
            self.was_grounded = false;
        }
        debug!(?kind, combo = self.combo, takeoff = grounded, "trick performed");
        grounded
    }
}

// =============================================================================
// TESTS
// =============================================================================
