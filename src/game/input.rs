//! Input Capture and Buffering
//!
//! Continuous axes (move, look, accelerate) are sampled every tick from
//! [`ControlState`]. Button presses become [`BufferedCommand`]s that wait in
//! the [`InputBuffer`] until a state-appropriate handler claims them or they
//! go stale.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Serialize, Deserialize};
use tracing::trace;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Discrete action intents that can be buffered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionKind {
    /// Start a powerslide
    Drift = 0,
    /// Hit the brakes
    Brake = 1,
    /// Spend the boost bonus as a kick
    Boost = 2,
    /// Short forward burst
    Dash = 3,
    /// Generic trick button (performs a takeoff trick)
    Trick = 4,
}

/// A queued action intent.
///
/// Immutable once created. Owned by the [`InputBuffer`] until a handler
/// claims it or it expires.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BufferedCommand {
    /// What was asked for
    pub kind: ActionKind,
    /// Move-axis value at the moment of the press
    pub direction: Vec2,
    /// Simulation time of the press (seconds)
    pub issued_at: f32,
}

impl BufferedCommand {
    /// Create a new command.
    pub fn new(kind: ActionKind, direction: Vec2, issued_at: f32) -> Self {
        Self {
            kind,
            direction,
            issued_at,
        }
    }

    /// Seconds since the command was issued.
    #[inline]
    pub fn age(&self, now: f32) -> f32 {
        now - self.issued_at
    }

    /// Has this command outlived `threshold`?
    #[inline]
    pub fn is_expired(&self, now: f32, threshold: f32) -> bool {
        self.age(now) >= threshold
    }
}

/// Continuous input, sampled every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Steering stick (x = right, y = forward)
    pub move_axis: Vec2,
    /// Trick stick (x = right, y = up)
    pub look_axis: Vec2,
    /// Thrust held
    pub accelerate: bool,
    /// Drift button held
    pub drift_held: bool,
    /// Brake button held
    pub brake_held: bool,
}

/// Kinds of timestamped input edges delivered by the platform layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEventKind {
    /// Steering stick moved
    Move(Vec2),
    /// Trick stick moved
    Look(Vec2),
    /// Analog accelerate trigger
    Accelerate(f32),
    /// Drift button pressed / released
    Drift(bool),
    /// Brake button pressed / released
    Brake(bool),
    /// Trick button pressed / released
    Trick(bool),
    /// Boost button pressed / released
    Boost(bool),
    /// Dash button pressed / released
    Dash(bool),
}

/// A timestamped input edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Simulation time of the edge (seconds)
    pub at: f32,
    /// What happened
    pub kind: InputEventKind,
}

impl InputEvent {
    /// Create an input event.
    pub const fn new(at: f32, kind: InputEventKind) -> Self {
        Self { at, kind }
    }
}

impl ControlState {
    /// Fold an input edge into the control state.
    ///
    /// Returns the command to buffer if the edge was a button press.
    pub fn apply(&mut self, event: &InputEvent, accelerate_deadzone: f32) -> Option<BufferedCommand> {
        let direction = self.move_axis;
        let at = event.at;
        let pressed = |kind: ActionKind, down: bool| {
            down.then(|| BufferedCommand::new(kind, direction, at))
        };

        match event.kind {
            InputEventKind::Move(axis) => {
                self.move_axis = clamp_axis(axis);
                None
            }
            InputEventKind::Look(axis) => {
                self.look_axis = clamp_axis(axis);
                None
            }
            InputEventKind::Accelerate(value) => {
                self.accelerate = value > accelerate_deadzone;
                None
            }
            InputEventKind::Drift(down) => {
                self.drift_held = down;
                pressed(ActionKind::Drift, down)
            }
            InputEventKind::Brake(down) => {
                self.brake_held = down;
                pressed(ActionKind::Brake, down)
            }
            InputEventKind::Trick(down) => pressed(ActionKind::Trick, down),
            InputEventKind::Boost(down) => pressed(ActionKind::Boost, down),
            InputEventKind::Dash(down) => pressed(ActionKind::Dash, down),
        }
    }
}

/// Clamp a stick reading into the unit disc; non-finite readings become neutral.
fn clamp_axis(axis: Vec2) -> Vec2 {
    if !axis.is_finite() {
        return Vec2::ZERO;
    }
    axis.clamp_length_max(1.0)
}

// =============================================================================
// INPUT BUFFER
// =============================================================================

/// Outcome of one drain pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Commands claimed by a handler
    pub handled: u32,
    /// Commands dropped for age
    pub expired: u32,
}

/// FIFO queue of buffered commands.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputBuffer {
    queue: VecDeque<BufferedCommand>,
    /// Seconds a command stays valid
    threshold: f32,
}

impl InputBuffer {
    /// Create an empty buffer.
    pub fn new(threshold: f32) -> Self {
        Self {
            queue: VecDeque::with_capacity(16),
            threshold,
        }
    }

    /// Expiry threshold in seconds.
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Append a command.
    pub fn enqueue(&mut self, kind: ActionKind, direction: Vec2, time: f32) {
        self.push(BufferedCommand::new(kind, direction, time));
    }

    /// Append an already-built command.
    pub fn push(&mut self, command: BufferedCommand) {
        self.queue.push_back(command);
    }

    /// Oldest queued command.
    pub fn peek_oldest(&self) -> Option<&BufferedCommand> {
        self.queue.front()
    }

    /// Remove and return the oldest command.
    pub fn dequeue(&mut self) -> Option<BufferedCommand> {
        self.queue.pop_front()
    }

    /// Number of queued commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Is the queue empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterate queued commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &BufferedCommand> {
        self.queue.iter()
    }

    /// Visit every queued command in FIFO order.
    ///
    /// Expired commands are dropped without reaching `handler`. Live ones are
    /// offered to `handler`; a `true` return claims (removes) the command, a
    /// `false` return leaves it queued for a later tick.
    pub fn drain<F>(&mut self, now: f32, mut handler: F) -> DrainReport
    where
        F: FnMut(&BufferedCommand) -> bool,
    {
        let threshold = self.threshold;
        let mut report = DrainReport::default();

        self.queue.retain(|command| {
            if command.is_expired(now, threshold) {
                trace!(kind = ?command.kind, age = command.age(now), "buffered command expired");
                report.expired += 1;
                return false;
            }
            if handler(command) {
                report.handled += 1;
                return false;
            }
            true
        });

        report
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
