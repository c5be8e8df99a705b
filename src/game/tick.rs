//! Simulation Tick
//!
//! One fixed step for one skater. The phase order is strict:
//!
//! 1. Drain the input buffer (handlers see last tick's ground status)
//! 2. Sense the ground
//! 3. Integrate locomotion
//! 4. Advance tricks, detect landings, credit boost
//! 5. Decay boost

use glam::Vec3;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::game::boost::BoostSource;
use crate::game::collision::GroundQuery;
use crate::game::config::SkaterConfig;
use crate::game::events::SkaterEvent;
use crate::game::input::{ActionKind, DrainReport, InputEvent};
use crate::game::locomotion::LocomotionState;
use crate::game::state::{Skater, SkaterError};
use crate::game::trick::TrickKind;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick that was simulated
    pub tick: u32,
    /// Events generated this tick
    pub events: Vec<SkaterEvent>,
    /// Buffered commands claimed this tick
    pub handled: u32,
    /// Buffered commands dropped for age this tick
    pub expired: u32,
}

/// Run one simulation tick.
///
/// `inputs` are the edges that arrived since the previous tick; they are
/// folded into the controls before anything else runs.
pub fn tick<G: GroundQuery>(skater: &mut Skater<G>, inputs: &[InputEvent]) -> TickResult {
    for event in inputs {
        skater.handle_input(event);
    }

    let tick = skater.clock.tick;
    let now = skater.clock.now();
    let dt = skater.clock.dt;

    // 1. Buffered commands
    let report = drain_commands(skater, tick, now);

    // 2. Ground
    let (position, orientation) = {
        let motion = skater.locomotion.motion();
        (motion.position, motion.orientation)
    };
    let launching = skater.tricks.ignores_contact();
    let ground = skater.sensor.sense(&skater.query, position, orientation, launching, dt);

    // 3. Locomotion
    let bonus = skater.boost.effective_speed_bonus();
    if let Some(duration) = skater.locomotion.step(&skater.controls, &ground, bonus, dt) {
        skater.push_event(SkaterEvent::drift_stopped(tick, duration));
        let added = skater.boost.apply_drift_bonus(duration);
        credit(skater, tick, BoostSource::Drift, added);
    }

    // 4. Tricks
    let outcome = skater.tricks.advance(skater.controls.look_axis, &ground);
    if let Some(kind) = outcome.performed {
        skater.push_event(SkaterEvent::trick_performed(tick, kind));
        if outcome.takeoff {
            takeoff(skater);
        }
    }
    if let Some(combo) = outcome.landed {
        skater.push_event(SkaterEvent::landed(tick, combo));
        let added = skater.boost.apply_trick_bonus(combo);
        credit(skater, tick, BoostSource::TrickCombo, added);
    }

    // 5. Boost decay
    skater.boost.decay(dt, ground.is_grounded);

    #[cfg(feature = "debug-tracing")]
    trace!(
        tick,
        position = ?skater.locomotion.motion().position,
        grounded = ground.is_grounded,
        state = ?skater.locomotion.state(),
        boost = skater.boost.points(),
        "tick"
    );

    skater.clock.advance();

    TickResult {
        tick,
        events: skater.take_events(),
        handled: report.handled,
        expired: report.expired,
    }
}

/// Offer every live buffered command to its handler.
fn drain_commands<G: GroundQuery>(skater: &mut Skater<G>, tick: u32, now: f32) -> DrainReport {
    let ground = *skater.sensor.status();
    let controls = skater.controls;
    let bonus = skater.boost.effective_speed_bonus();
    let has_points = skater.boost.points() > 0.0;
    let takeoff_impulse = skater.config.trick.takeoff_impulse;

    let locomotion = &mut skater.locomotion;
    let tricks = &mut skater.tricks;
    let sensor = &mut skater.sensor;
    let mut fired = Vec::new();

    let report = skater.buffer.drain(now, |command| match command.kind {
        ActionKind::Drift => {
            match locomotion.start_drift(command.direction.x, ground.is_grounded, controls.drift_held) {
                Some(direction) => {
                    fired.push(SkaterEvent::drift_started(tick, direction));
                    true
                }
                None => false,
            }
        }
        ActionKind::Brake => locomotion.start_brake(ground.is_grounded),
        ActionKind::Boost => {
            if !ground.is_grounded || !has_points {
                return false;
            }
            let cap = locomotion.max_speed(bonus);
            locomotion.apply_forward_impulse(bonus, cap);
            true
        }
        ActionKind::Dash => {
            if !ground.is_grounded || locomotion.state() != LocomotionState::Normal {
                return false;
            }
            let cap = locomotion.max_speed(bonus);
            locomotion.apply_forward_impulse(locomotion.dash_impulse(), cap);
            true
        }
        ActionKind::Trick => {
            if !tricks.try_button_takeoff(ground.is_grounded) {
                return false;
            }
            fired.push(SkaterEvent::trick_performed(tick, TrickKind::Ollie));
            locomotion.launch(takeoff_impulse);
            sensor.force_airborne();
            true
        }
    });

    for event in fired {
        skater.push_event(event);
    }
    report
}

/// Launch off the ground after a trick.
fn takeoff<G: GroundQuery>(skater: &mut Skater<G>) {
    skater.locomotion.launch(skater.config.trick.takeoff_impulse);
    skater.sensor.force_airborne();
}

/// Report a boost credit and apply its forward kick.
fn credit<G: GroundQuery>(skater: &mut Skater<G>, tick: u32, source: BoostSource, added: f32) {
    if added <= 0.0 {
        return;
    }
    skater.push_event(SkaterEvent::boost_credited(tick, source, added));

    let impulse = skater.boost.credit_impulse(added);
    if impulse > 0.0 {
        let cap = skater.locomotion.max_speed(skater.boost.effective_speed_bonus());
        skater.locomotion.apply_forward_impulse(impulse, cap);
    }
}

/// Replay a recorded input script from a fresh skater.
///
/// `script` must be sorted by time. Each tick receives the events stamped
/// at or before its start time (within half a tick).
pub fn replay_script<G: GroundQuery>(
    config: SkaterConfig,
    query: G,
    spawn: Vec3,
    script: &[InputEvent],
    tick_count: u32,
) -> Result<(Skater<G>, Vec<SkaterEvent>), SkaterError> {
    let mut skater = Skater::new(config, query, spawn)?;
    let mut all_events = Vec::new();
    let mut next = 0;

    for _ in 0..tick_count {
        let horizon = skater.now() + skater.dt() * 0.5;
        let start = next;
        while next < script.len() && script[next].at <= horizon {
            next += 1;
        }

        let result = tick(&mut skater, &script[start..next]);
        all_events.extend(result.events);
    }

    Ok((skater, all_events))
}

// =============================================================================
// TESTS
// =============================================================================
