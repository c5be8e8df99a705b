//! Skater Configuration
//!
//! Every tunable of the core lives here. Defaults are the tuned arcade
//! values; a JSON file may override any subset of them.

use std::path::Path;

use glam::Vec3;
use serde::{Serialize, Deserialize};

use crate::game::collision::CollisionMask;

/// Configuration errors.
///
/// These are the only fatal conditions in the core; they are raised
/// before the first tick, never during one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Ground mask selects no layers
    #[error("ground mask selects no collision layers")]
    EmptyGroundMask,

    /// A tunable that must be strictly positive is not
    #[error("{field} must be positive and finite (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    /// A tunable that must be non-negative is not
    #[error("{field} must be non-negative and finite (got {value})")]
    Negative { field: &'static str, value: f32 },

    /// Drift tiers must increase in both duration and points
    #[error("drift tiers must be strictly increasing in duration and points")]
    UnorderedDriftTiers,

    /// Tick rate of zero
    #[error("tick rate must be at least 1 Hz")]
    ZeroTickRate,

    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Input buffer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Seconds a buffered command stays valid
    pub buffer_threshold: f32,
    /// Analog accelerate value above which thrust is on
    pub accelerate_deadzone: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            buffer_threshold: 0.2,
            accelerate_deadzone: 0.1,
        }
    }
}

/// Ground sensor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Half extents of the ground box test
    pub box_half_extents: Vec3,
    /// Body-local offset of the box centre
    pub box_offset: Vec3,
    /// Layers that count as ground
    pub ground_mask: CollisionMask,
    /// Grace period after losing contact (seconds)
    pub coyote_time: f32,
    /// Length of the downward alignment ray
    pub ray_length: f32,
    /// Normals at least this aligned with world up count as flat
    pub flat_cos: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            box_half_extents: Vec3::new(0.4, 0.1, 0.6),
            box_offset: Vec3::new(0.0, -0.5, 0.0),
            ground_mask: CollisionMask::GROUND,
            coyote_time: 0.2,
            ray_length: 1.0,
            flat_cos: 0.999,
        }
    }
}

/// Locomotion settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Forward thrust (m/s^2)
    pub acceleration: f32,
    /// Speed cap without boost (m/s)
    pub base_max_speed: f32,
    /// Turn rate in Normal state (deg/s)
    pub turn_speed: f32,
    /// Turn rate while drifting (deg/s)
    pub drift_turn_speed: f32,
    /// Lower bound of the drift turn band
    pub drift_band_min: f32,
    /// Upper bound of the drift turn band
    pub drift_band_max: f32,
    /// Braking deceleration (m/s^2)
    pub brake_force: f32,
    /// Horizontal speed under which braking ends (m/s)
    pub brake_stop_speed: f32,
    /// Gravity (m/s^2)
    pub gravity: f32,
    /// Distance from body origin to the ground while resting
    pub ride_height: f32,
    /// Rate at which "up" follows the ground normal (1/s)
    pub slope_align_speed: f32,
    /// Forward impulse of a dash (m/s)
    pub dash_impulse: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            acceleration: 50.0,
            base_max_speed: 20.0,
            turn_speed: 100.0,
            drift_turn_speed: 200.0,
            drift_band_min: 0.3,
            drift_band_max: 1.0,
            brake_force: 80.0,
            brake_stop_speed: 1.0,
            gravity: 9.81,
            ride_height: 0.5,
            slope_align_speed: 12.0,
            dash_impulse: 6.0,
        }
    }
}

/// Trick state machine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrickConfig {
    /// Look-axis Y below `-press_threshold` starts preparation
    pub press_threshold: f32,
    /// Look-axis magnitude above which a flick is read
    pub flick_threshold: f32,
    /// Off-axis component must stay below this for a clean flick
    pub flick_cross_tolerance: f32,
    /// Look-axis magnitude below which the stick is neutral
    pub neutral_threshold: f32,
    /// Preparation expires after this long (seconds)
    pub prepare_timeout: f32,
    /// Neutral stick cancels preparation after this long (seconds)
    pub cancel_delay: f32,
    /// No new preparation for this long after a trick (seconds)
    pub cooldown: f32,
    /// Trick animation commit time (seconds)
    pub commit_delay: f32,
    /// Landing is ignored for this long after a trick (seconds)
    pub landing_suppression: f32,
    /// Upward impulse of a trick performed from the ground (m/s)
    pub takeoff_impulse: f32,
}

impl Default for TrickConfig {
    fn default() -> Self {
        Self {
            press_threshold: 0.5,
            flick_threshold: 0.5,
            flick_cross_tolerance: 0.5,
            neutral_threshold: 0.5,
            prepare_timeout: 1.0,
            cancel_delay: 0.15,
            cooldown: 0.35,
            commit_delay: 0.02,
            landing_suppression: 0.15,
            takeoff_impulse: 6.0,
        }
    }
}

/// One drift bonus tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftTier {
    /// Minimum drift duration (seconds)
    pub min_duration: f32,
    /// Flat points granted
    pub points: f32,
}

/// Boost ledger settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Ledger capacity
    pub max_points: f32,
    /// Drift tiers, ascending
    pub drift_tiers: Vec<DriftTier>,
    /// Points per trick in a landed combo
    pub per_trick_points: f32,
    /// Decay per second on the ground
    pub grounded_decay: f32,
    /// Decay per second in the air
    pub airborne_decay: f32,
    /// Extra m/s of speed cap per point
    pub speed_per_point: f32,
    /// Forward impulse (m/s) per point at the moment of credit; 0 disables
    pub impulse_per_point: f32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            max_points: 100.0,
            drift_tiers: vec![
                DriftTier { min_duration: 1.0, points: 10.0 },
                DriftTier { min_duration: 2.0, points: 25.0 },
                DriftTier { min_duration: 3.0, points: 45.0 },
            ],
            per_trick_points: 15.0,
            grounded_decay: 8.0,
            airborne_decay: 2.0,
            speed_per_point: 0.1,
            impulse_per_point: 0.05,
        }
    }
}

// =============================================================================
// SKATER CONFIG
// =============================================================================

/// Complete configuration for one skater.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkaterConfig {
    /// Simulation rate (Hz)
    pub tick_rate: u32,
    /// Input buffering
    pub input: InputConfig,
    /// Ground sensing
    pub sensor: SensorConfig,
    /// Locomotion
    pub locomotion: LocomotionConfig,
    /// Tricks
    pub trick: TrickConfig,
    /// Boost
    pub boost: BoostConfig,
}

impl Default for SkaterConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::TICK_RATE,
            input: InputConfig::default(),
            sensor: SensorConfig::default(),
            locomotion: LocomotionConfig::default(),
            trick: TrickConfig::default(),
            boost: BoostConfig::default(),
        }
    }
}

impl SkaterConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Seconds per tick.
    #[inline]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Check every tunable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }

        positive("input.buffer_threshold", self.input.buffer_threshold)?;
        non_negative("input.accelerate_deadzone", self.input.accelerate_deadzone)?;

        let sensor = &self.sensor;
        if sensor.ground_mask.is_empty() {
            return Err(ConfigError::EmptyGroundMask);
        }
        positive("sensor.box_half_extents.x", sensor.box_half_extents.x)?;
        positive("sensor.box_half_extents.y", sensor.box_half_extents.y)?;
        positive("sensor.box_half_extents.z", sensor.box_half_extents.z)?;
        positive("sensor.coyote_time", sensor.coyote_time)?;
        positive("sensor.ray_length", sensor.ray_length)?;
        positive("sensor.flat_cos", sensor.flat_cos)?;

        let loco = &self.locomotion;
        positive("locomotion.acceleration", loco.acceleration)?;
        positive("locomotion.base_max_speed", loco.base_max_speed)?;
        non_negative("locomotion.turn_speed", loco.turn_speed)?;
        non_negative("locomotion.drift_turn_speed", loco.drift_turn_speed)?;
        non_negative("locomotion.drift_band_min", loco.drift_band_min)?;
        positive("locomotion.drift_band_max", loco.drift_band_max)?;
        if loco.drift_band_min > loco.drift_band_max {
            return Err(ConfigError::NotPositive {
                field: "locomotion.drift_band_max - drift_band_min",
                value: loco.drift_band_max - loco.drift_band_min,
            });
        }
        positive("locomotion.brake_force", loco.brake_force)?;
        non_negative("locomotion.brake_stop_speed", loco.brake_stop_speed)?;
        non_negative("locomotion.gravity", loco.gravity)?;
        non_negative("locomotion.ride_height", loco.ride_height)?;
        non_negative("locomotion.slope_align_speed", loco.slope_align_speed)?;
        non_negative("locomotion.dash_impulse", loco.dash_impulse)?;

        let trick = &self.trick;
        positive("trick.press_threshold", trick.press_threshold)?;
        positive("trick.flick_threshold", trick.flick_threshold)?;
        positive("trick.flick_cross_tolerance", trick.flick_cross_tolerance)?;
        positive("trick.neutral_threshold", trick.neutral_threshold)?;
        positive("trick.prepare_timeout", trick.prepare_timeout)?;
        positive("trick.cancel_delay", trick.cancel_delay)?;
        non_negative("trick.cooldown", trick.cooldown)?;
        positive("trick.commit_delay", trick.commit_delay)?;
        non_negative("trick.landing_suppression", trick.landing_suppression)?;
        non_negative("trick.takeoff_impulse", trick.takeoff_impulse)?;

        let boost = &self.boost;
        positive("boost.max_points", boost.max_points)?;
        non_negative("boost.per_trick_points", boost.per_trick_points)?;
        non_negative("boost.grounded_decay", boost.grounded_decay)?;
        non_negative("boost.airborne_decay", boost.airborne_decay)?;
        non_negative("boost.speed_per_point", boost.speed_per_point)?;
        non_negative("boost.impulse_per_point", boost.impulse_per_point)?;
        for tier in &boost.drift_tiers {
            positive("boost.drift_tiers.min_duration", tier.min_duration)?;
            non_negative("boost.drift_tiers.points", tier.points)?;
        }
        let ordered = boost.drift_tiers.windows(2).all(|pair| {
            pair[0].min_duration < pair[1].min_duration && pair[0].points < pair[1].points
        });
        if !ordered {
            return Err(ConfigError::UnorderedDriftTiers);
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
