//! Skater State
//!
//! [`Skater`] owns one rider's components: control state, input buffer,
//! ground sensor, locomotion, trick session and boost ledger. Collision
//! queries and event sinks are injected at construction.

use glam::{Quat, Vec3};
use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::math::horizontal_speed;
use crate::core::timer::SimClock;
use crate::game::boost::BoostLedger;
use crate::game::collision::GroundQuery;
use crate::game::config::{ConfigError, SkaterConfig};
use crate::game::events::{EventSink, SkaterEvent};
use crate::game::input::{ControlState, InputBuffer, InputEvent};
use crate::game::locomotion::{Locomotion, LocomotionState};
use crate::game::sensor::{GroundSensor, GroundStatus};
use crate::game::trick::{TrickPhase, TrickSession};

/// Errors raised while building a skater.
#[derive(Debug, thiserror::Error)]
pub enum SkaterError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Spawn position is NaN or infinite
    #[error("spawn position must be finite (got {0})")]
    InvalidSpawn(Vec3),
}

/// Read-only view handed to the frame pass between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks simulated so far
    pub tick: u32,
    /// Body position
    pub position: Vec3,
    /// Body orientation
    pub orientation: Quat,
    /// Body velocity
    pub velocity: Vec3,
    /// Speed in the XZ plane
    pub horizontal_speed: f32,
    /// Grounded (coyote window included)
    pub is_grounded: bool,
    /// Powersliding
    pub is_drifting: bool,
    /// Locomotion state
    pub locomotion: LocomotionState,
    /// Trick phase
    pub trick: TrickPhase,
    /// Tricks since the last landing
    pub combo: u32,
    /// Boost balance
    pub boost_points: f32,
}

/// One simulated skater.
pub struct Skater<G: GroundQuery> {
    pub(crate) config: SkaterConfig,
    pub(crate) clock: SimClock,
    pub(crate) controls: ControlState,
    pub(crate) buffer: InputBuffer,
    pub(crate) sensor: GroundSensor,
    pub(crate) locomotion: Locomotion,
    pub(crate) tricks: TrickSession,
    pub(crate) boost: BoostLedger,
    pub(crate) query: G,
    sinks: Vec<Box<dyn EventSink>>,
    pending_events: Vec<SkaterEvent>,
}

impl<G: GroundQuery> Skater<G> {
    /// Validate `config` and spawn a skater at rest at `spawn`.
    pub fn new(config: SkaterConfig, query: G, spawn: Vec3) -> Result<Self, SkaterError> {
        config.validate()?;
        if !spawn.is_finite() {
            return Err(SkaterError::InvalidSpawn(spawn));
        }

        let dt = config.dt();
        Ok(Self {
            clock: SimClock::new(config.tick_rate),
            controls: ControlState::default(),
            buffer: InputBuffer::new(config.input.buffer_threshold),
            sensor: GroundSensor::new(config.sensor.clone()),
            locomotion: Locomotion::new(config.locomotion.clone(), spawn),
            tricks: TrickSession::new(config.trick.clone(), dt),
            boost: BoostLedger::new(config.boost.clone()),
            query,
            sinks: Vec::new(),
            pending_events: Vec::new(),
            config,
        })
    }

    /// Register an event sink. Sinks are called in registration order.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Fold an input edge into the controls, buffering any button press.
    pub fn handle_input(&mut self, event: &InputEvent) {
        if let Some(command) = self.controls.apply(event, self.config.input.accelerate_deadzone) {
            self.buffer.push(command);
        }
    }

    /// Ticks simulated so far.
    #[inline]
    pub fn tick(&self) -> u32 {
        self.clock.tick
    }

    /// Simulation time of the next tick (seconds).
    #[inline]
    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Seconds per tick.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.clock.dt
    }

    /// Configuration in use.
    pub fn config(&self) -> &SkaterConfig {
        &self.config
    }

    /// Continuous controls.
    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    /// Pending buffered commands.
    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    /// Ground status from the last tick.
    pub fn ground(&self) -> &GroundStatus {
        self.sensor.status()
    }

    /// Locomotion controller.
    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    /// Trick session.
    pub fn tricks(&self) -> &TrickSession {
        &self.tricks
    }

    /// Boost ledger.
    pub fn boost(&self) -> &BoostLedger {
        &self.boost
    }

    /// Injected collision geometry.
    pub fn query(&self) -> &G {
        &self.query
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let motion = self.locomotion.motion();
        let state = self.locomotion.state();
        Snapshot {
            tick: self.clock.tick,
            position: motion.position,
            orientation: motion.orientation,
            velocity: motion.linear_velocity,
            horizontal_speed: horizontal_speed(motion.linear_velocity),
            is_grounded: self.sensor.status().is_grounded,
            is_drifting: state.is_drifting(),
            locomotion: state,
            trick: self.tricks.phase(),
            combo: self.tricks.combo(),
            boost_points: self.boost.points(),
        }
    }

    /// Hash of the simulation state, for determinism checks.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.clock.tick, |hasher| {
            let motion = self.locomotion.motion();
            hasher.update_vec3(motion.position);
            hasher.update_quat(motion.orientation);
            hasher.update_vec3(motion.linear_velocity);
            hasher.update_f32(motion.angular_intent);
            hasher.update_f32(self.locomotion.heading());

            let state = self.locomotion.state();
            hasher.update_u8(state.tag());
            if let LocomotionState::Drifting { direction, ticks } = state {
                hasher.update_f32(direction);
                hasher.update_u32(ticks);
            }

            let ground = self.sensor.status();
            hasher.update_bool(ground.is_grounded);
            hasher.update_bool(ground.has_contact);
            hasher.update_f32(ground.coyote_timer);
            hasher.update_vec3(ground.ground_normal);

            self.tricks.hash_into(hasher);
            hasher.update_f32(self.boost.points());

            hasher.update_u32(self.buffer.len() as u32);
            for command in self.buffer.iter() {
                hasher.update_u8(command.kind as u8);
                hasher.update_vec2(command.direction);
                hasher.update_f32(command.issued_at);
            }
        })
    }

    /// Record an event and deliver it to every sink.
    pub(crate) fn push_event(&mut self, event: SkaterEvent) {
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
        self.pending_events.push(event);
    }

    /// Take pending events (consumes them).
    pub(crate) fn take_events(&mut self) -> Vec<SkaterEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

impl<G: GroundQuery> std::fmt::Debug for Skater<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skater")
            .field("tick", &self.clock.tick)
            .field("locomotion", &self.locomotion.state())
            .field("trick", &self.tricks.phase())
            .field("boost", &self.boost.points())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
