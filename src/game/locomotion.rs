//! Locomotion State Machine
//!
//! Normal riding, braking and powerslides. Locomotion is the only writer of
//! [`MotionState`]: position, orientation and velocity all move here, once
//! per tick, after the ground sensor has run.

use glam::{Quat, Vec3};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::math::{
    align_up_to, clamp_horizontal, horizontal, horizontal_speed, smoothing, yaw_rotation,
    FORWARD, UP,
};
use crate::game::config::LocomotionConfig;
use crate::game::input::ControlState;
use crate::game::sensor::GroundStatus;

/// Stick deflection below which steering is ignored.
const STEER_DEADZONE: f32 = 0.01;

/// Locomotion state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum LocomotionState {
    /// Riding
    #[default]
    Normal,
    /// Decelerating to a stop
    Braking,
    /// Powerslide. `direction` is -1 (left) or +1 (right).
    Drifting { direction: f32, ticks: u32 },
}

impl LocomotionState {
    /// Is this a drift?
    #[inline]
    pub fn is_drifting(&self) -> bool {
        matches!(self, LocomotionState::Drifting { .. })
    }

    /// Stable numeric tag, used for hashing.
    pub fn tag(&self) -> u8 {
        match self {
            LocomotionState::Normal => 0,
            LocomotionState::Braking => 1,
            LocomotionState::Drifting { .. } => 2,
        }
    }
}

/// Kinematic state of the body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// World position of the body origin
    pub position: Vec3,
    /// Unit orientation
    pub orientation: Quat,
    /// Velocity (m/s)
    pub linear_velocity: Vec3,
    /// Yaw rate requested this tick (rad/s, positive turns left)
    pub angular_intent: f32,
}

impl MotionState {
    /// At rest at `position`, facing -Z.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_intent: 0.0,
        }
    }
}

/// Drift direction for a stick reading: left for negative x, right otherwise.
#[inline]
pub fn drift_direction(move_x: f32) -> f32 {
    if move_x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Locomotion controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Locomotion {
    state: LocomotionState,
    motion: MotionState,
    /// Yaw about world up (radians)
    heading: f32,
    /// Slope alignment applied on top of the heading
    alignment: Quat,
    config: LocomotionConfig,
}

impl Locomotion {
    /// Spawn at rest.
    pub fn new(config: LocomotionConfig, position: Vec3) -> Self {
        Self {
            state: LocomotionState::Normal,
            motion: MotionState::at(position),
            heading: 0.0,
            alignment: Quat::IDENTITY,
            config,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> LocomotionState {
        self.state
    }

    /// Current kinematics.
    #[inline]
    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// Yaw in radians.
    #[inline]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Horizontal forward direction.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        yaw_rotation(self.heading) * FORWARD
    }

    /// Speed cap for a given boost bonus.
    #[inline]
    pub fn max_speed(&self, boost_bonus: f32) -> f32 {
        self.config.base_max_speed + boost_bonus.max(0.0)
    }

    /// Forward impulse of a dash.
    #[inline]
    pub fn dash_impulse(&self) -> f32 {
        self.config.dash_impulse
    }

    /// Enter a drift. Only from Normal while grounded and with drift still held.
    ///
    /// Returns the locked direction on success.
    pub fn start_drift(&mut self, move_x: f32, grounded: bool, drift_held: bool) -> Option<f32> {
        if self.state != LocomotionState::Normal || !grounded || !drift_held {
            return None;
        }
        let direction = drift_direction(move_x);
        self.state = LocomotionState::Drifting { direction, ticks: 0 };
        debug!(direction, "drift started");
        Some(direction)
    }

    /// Start braking. Only from Normal while grounded.
    pub fn start_brake(&mut self, grounded: bool) -> bool {
        if self.state != LocomotionState::Normal || !grounded {
            return false;
        }
        self.state = LocomotionState::Braking;
        debug!(speed = horizontal_speed(self.motion.linear_velocity), "braking");
        true
    }

    /// Add a velocity change.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.motion.linear_velocity += impulse;
    }

    /// Push along the forward axis, then re-clamp to `cap`.
    pub fn apply_forward_impulse(&mut self, amount: f32, cap: f32) {
        let velocity = self.motion.linear_velocity + self.forward() * amount;
        self.motion.linear_velocity = clamp_horizontal(velocity, cap);
    }

    /// Leave the ground: cancel any downward motion and add `speed` upward.
    pub fn launch(&mut self, speed: f32) {
        let velocity = &mut self.motion.linear_velocity;
        velocity.y = velocity.y.max(0.0) + speed;
    }

    /// Advance one tick.
    ///
    /// Returns the drift duration in seconds when a drift ended this tick.
    pub fn step(
        &mut self,
        controls: &ControlState,
        ground: &GroundStatus,
        boost_bonus: f32,
        dt: f32,
    ) -> Option<f32> {
        let drift_ended = self.update_state(controls, ground, dt);

        match self.state {
            LocomotionState::Normal | LocomotionState::Drifting { .. } => {
                self.ride(controls, ground, dt);
            }
            LocomotionState::Braking => {
                self.brake(dt);
            }
        }

        self.vertical(ground, dt);
        self.align(ground, dt);

        let cap = self.max_speed(boost_bonus);
        self.motion.linear_velocity = clamp_horizontal(self.motion.linear_velocity, cap);

        self.heading += self.motion.angular_intent * dt;
        self.motion.position += self.motion.linear_velocity * dt;
        self.motion.orientation = (self.alignment * yaw_rotation(self.heading)).normalize();

        drift_ended
    }

    /// Exit transitions checked at the top of the tick.
    fn update_state(&mut self, controls: &ControlState, ground: &GroundStatus, dt: f32) -> Option<f32> {
        match self.state {
            LocomotionState::Drifting { ticks, .. } if !controls.drift_held => {
                let duration = ticks as f32 * dt;
                self.state = LocomotionState::Normal;
                debug!(duration, "drift stopped");
                Some(duration)
            }
            LocomotionState::Drifting { direction, ticks } => {
                self.state = LocomotionState::Drifting { direction, ticks: ticks + 1 };
                None
            }
            LocomotionState::Braking => {
                let speed = horizontal_speed(self.motion.linear_velocity);
                if speed < self.config.brake_stop_speed || !ground.has_contact {
                    self.state = LocomotionState::Normal;
                    debug!(speed, contact = ground.has_contact, "braking ended");
                }
                None
            }
            LocomotionState::Normal => None,
        }
    }

    /// Normal and drifting motion: steer, keep momentum on the forward axis, thrust.
    fn ride(&mut self, controls: &ControlState, ground: &GroundStatus, dt: f32) {
        let steer = controls.move_axis.x;
        let yaw_rate = if steer.abs() > STEER_DEADZONE {
            let (input, speed) = match self.state {
                LocomotionState::Drifting { direction, .. } => {
                    // Counter-steer falls to the band minimum
                    let band = (steer * direction)
                        .clamp(self.config.drift_band_min, self.config.drift_band_max);
                    (direction * band, self.config.drift_turn_speed)
                }
                _ => (steer, self.config.turn_speed),
            };
            // Stick right turns right, which is negative yaw
            -(input * speed).to_radians()
        } else {
            0.0
        };
        self.motion.angular_intent = yaw_rate;

        let forward = self.forward();
        let velocity = self.motion.linear_velocity;
        let along = horizontal(velocity).dot(forward);
        let mut projected = forward * along + UP * velocity.y;

        if controls.accelerate && ground.is_grounded {
            projected += forward * self.config.acceleration * dt;
        }
        self.motion.linear_velocity = projected;
    }

    /// Decelerate horizontally without reversing direction.
    fn brake(&mut self, dt: f32) {
        self.motion.angular_intent = 0.0;
        let velocity = self.motion.linear_velocity;
        let speed = horizontal_speed(velocity);
        let slowed = (speed - self.config.brake_force * dt).max(0.0);
        self.motion.linear_velocity = clamp_horizontal(velocity, slowed);
    }

    /// Gravity without contact; rest on the surface with it.
    fn vertical(&mut self, ground: &GroundStatus, dt: f32) {
        let velocity = &mut self.motion.linear_velocity;
        if !ground.has_contact {
            velocity.y -= self.config.gravity * dt;
            return;
        }
        if velocity.y <= 0.0 {
            velocity.y = 0.0;
            if let Some(distance) = ground.ground_distance {
                self.motion.position.y += self.config.ride_height - distance;
            }
        }
    }

    /// Tilt "up" toward the ground normal; relax to neutral on flat ground.
    fn align(&mut self, ground: &GroundStatus, dt: f32) {
        if !ground.is_grounded {
            return;
        }
        let target = align_up_to(ground.ground_normal);
        let t = smoothing(self.config.slope_align_speed, dt);
        self.alignment = self.alignment.slerp(target, t).normalize();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn riding() -> Locomotion {
        Locomotion::new(LocomotionConfig::default(), Vec3::new(0.0, 0.5, 0.0))
    }

    fn controls(move_x: f32, accelerate: bool) -> ControlState {
        ControlState {
            move_axis: Vec2::new(move_x, 0.0),
            accelerate,
            ..Default::default()
        }
    }

    fn airborne() -> GroundStatus {
        GroundStatus::airborne(0.2)
    }

    #[test]
    fn test_thrust_only_when_grounded() {
        let mut loco = riding();
        loco.step(&controls(0.0, true), &GroundStatus::GROUNDED, 0.0, DT);
        let v = loco.motion().linear_velocity;
        assert!(v.z < 0.0, "should move forward (-Z)");
        assert!((horizontal_speed(v) - 50.0 * DT).abs() < 1e-4);

        let mut loco = riding();
        loco.step(&controls(0.0, true), &airborne(), 0.0, DT);
        assert_eq!(horizontal_speed(loco.motion().linear_velocity), 0.0);
        assert!(loco.motion().linear_velocity.y < 0.0);
    }

    #[test]
    fn test_stick_right_turns_right() {
        let mut loco = riding();
        for _ in 0..30 {
            loco.step(&controls(1.0, true), &GroundStatus::GROUNDED, 0.0, DT);
        }
        assert!(loco.heading() < 0.0);
        assert!(loco.forward().x > 0.0);
        assert!(loco.motion().linear_velocity.x > 0.0);
    }

    #[test]
    fn test_tiny_steer_is_ignored() {
        let mut loco = riding();
        loco.step(&controls(0.005, false), &GroundStatus::GROUNDED, 0.0, DT);
        assert_eq!(loco.heading(), 0.0);
    }

    #[test]
    fn test_drift_band_locks_direction() {
        let mut loco = riding();
        let mut held = controls(-0.8, true);
        held.drift_held = true;
        assert_eq!(loco.start_drift(-0.8, true, true), Some(-1.0));

        // Into the drift: full deflection, turning left (positive yaw)
        loco.step(&held, &GroundStatus::GROUNDED, 0.0, DT);
        let expected = (0.8f32 * 200.0).to_radians();
        assert!((loco.motion().angular_intent - expected).abs() < 1e-4);

        // Counter-steer still turns left, at the band minimum
        held.move_axis.x = 0.8;
        loco.step(&held, &GroundStatus::GROUNDED, 0.0, DT);
        let minimum = (0.3f32 * 200.0).to_radians();
        assert!((loco.motion().angular_intent - minimum).abs() < 1e-4);

        // Small deflection into the drift is raised to the band minimum
        held.move_axis.x = -0.05;
        loco.step(&held, &GroundStatus::GROUNDED, 0.0, DT);
        assert!((loco.motion().angular_intent - minimum).abs() < 1e-4);
    }

    #[test]
    fn test_drift_counter_steer_right_drift() {
        let mut loco = riding();
        let mut held = controls(-1.0, true);
        held.drift_held = true;
        loco.start_drift(0.6, true, true);

        loco.step(&held, &GroundStatus::GROUNDED, 0.0, DT);
        let expected = -(0.3f32 * 200.0).to_radians();
        assert!((loco.motion().angular_intent - expected).abs() < 1e-4);
    }

    #[test]
    fn test_drift_needs_ground_and_held_button() {
        let mut loco = riding();
        assert_eq!(loco.start_drift(0.5, false, true), None);
        assert_eq!(loco.start_drift(0.5, true, false), None);
        assert_eq!(loco.start_drift(0.0, true, true), Some(1.0));
        // Already drifting
        assert_eq!(loco.start_drift(0.5, true, true), None);
        assert!(!loco.start_brake(true));
    }

    #[test]
    fn test_drift_release_reports_duration() {
        let mut loco = riding();
        let mut held = controls(0.5, true);
        held.drift_held = true;
        loco.start_drift(0.5, true, true);

        for _ in 0..90 {
            assert_eq!(loco.step(&held, &GroundStatus::GROUNDED, 0.0, DT), None);
        }
        held.drift_held = false;
        let duration = loco.step(&held, &GroundStatus::GROUNDED, 0.0, DT).unwrap();
        assert!((duration - 1.5).abs() < 1e-4);
        assert_eq!(loco.state(), LocomotionState::Normal);
    }

    #[test]
    fn test_brake_stops_without_overshoot() {
        let mut loco = riding();
        loco.apply_impulse(Vec3::new(0.0, 0.0, -10.0));
        assert!(loco.start_brake(true));

        let mut ticks = 0;
        while loco.state() == LocomotionState::Braking {
            loco.step(&controls(0.0, false), &GroundStatus::GROUNDED, 0.0, DT);
            // Never reverses
            assert!(loco.motion().linear_velocity.z <= 0.0);
            ticks += 1;
            assert!(ticks < 60);
        }
        assert!(horizontal_speed(loco.motion().linear_velocity) < 1.0 + 80.0 * DT);
    }

    #[test]
    fn test_brake_ends_when_contact_lost() {
        let mut loco = riding();
        loco.apply_impulse(Vec3::new(0.0, 0.0, -15.0));
        loco.start_brake(true);
        loco.step(&controls(0.0, false), &airborne(), 0.0, DT);
        assert_eq!(loco.state(), LocomotionState::Normal);
    }

    #[test]
    fn test_rests_on_ground_at_ride_height() {
        let mut loco = Locomotion::new(LocomotionConfig::default(), Vec3::new(0.0, 0.55, 0.0));
        let ground = GroundStatus {
            ground_distance: Some(0.55),
            ..GroundStatus::GROUNDED
        };
        loco.apply_impulse(Vec3::new(0.0, -2.0, 0.0));
        loco.step(&controls(0.0, false), &ground, 0.0, DT);
        assert!((loco.motion().position.y - 0.5).abs() < 1e-5);
        assert_eq!(loco.motion().linear_velocity.y, 0.0);
    }

    #[test]
    fn test_launch_keeps_upward_velocity_through_contact() {
        let mut loco = riding();
        loco.launch(6.0);
        loco.step(&controls(0.0, false), &GroundStatus::GROUNDED, 0.0, DT);
        assert_eq!(loco.motion().linear_velocity.y, 6.0);
    }

    #[test]
    fn test_slope_alignment() {
        let mut loco = riding();
        let slope = Vec3::new(0.0, 1.0, 0.5).normalize();
        let ground = GroundStatus {
            ground_normal: slope,
            ..GroundStatus::GROUNDED
        };
        for _ in 0..120 {
            loco.step(&controls(0.0, false), &ground, 0.0, DT);
        }
        let up = loco.motion().orientation * UP;
        assert!(up.dot(slope) > 0.999);

        // Back to flat
        for _ in 0..120 {
            loco.step(&controls(0.0, false), &GroundStatus::GROUNDED, 0.0, DT);
        }
        let up = loco.motion().orientation * UP;
        assert!(up.dot(UP) > 0.999);
    }

    #[test]
    fn test_forward_impulse_is_clamped() {
        let mut loco = riding();
        loco.apply_forward_impulse(100.0, 25.0);
        assert!((horizontal_speed(loco.motion().linear_velocity) - 25.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_speed_never_exceeds_cap(
            steps in proptest::collection::vec(
                (-1.0f32..1.0, any::<bool>(), any::<bool>(), -5.0f32..15.0, any::<bool>()),
                1..120,
            ),
        ) {
            let mut loco = riding();
            for (steer, accelerate, drift, bonus, grounded) in steps {
                let mut input = controls(steer, accelerate);
                input.drift_held = drift;
                if drift {
                    loco.start_drift(steer, grounded, true);
                }
                let ground = if grounded { GroundStatus::GROUNDED } else { airborne() };
                loco.step(&input, &ground, bonus, DT);

                let cap = 20.0 + bonus.max(0.0);
                prop_assert!(horizontal_speed(loco.motion().linear_velocity) <= cap + 1e-3);
                prop_assert!((loco.motion().orientation.length() - 1.0).abs() < 1e-3);
            }
        }
    }
}
