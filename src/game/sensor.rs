//! Ground Sensor
//!
//! Box test under the body plus a short downward ray. Contact is
//! forgiven for `coyote_time` seconds after it is lost so that a trick
//! input still registers a few frames past a ledge.

use glam::{Quat, Vec3};
use serde::{Serialize, Deserialize};

use crate::core::math::{is_flat, sanitize_normal, UP};
use crate::game::collision::{BoxShape, GroundQuery};
use crate::game::config::SensorConfig;

/// Ground state for one tick.
///
/// `has_contact` implies `coyote_timer == 0`. Once contact is lost the timer
/// climbs to `coyote_time` and stops there; `is_grounded` is false exactly
/// when the timer sits at `coyote_time`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundStatus {
    /// Grounded, including the coyote grace period
    pub is_grounded: bool,
    /// Seconds since contact was lost, capped at the coyote threshold
    pub coyote_timer: f32,
    /// Surface normal for slope alignment (world up on flat ground)
    pub ground_normal: Vec3,
    /// Raw box-test result this tick
    pub has_contact: bool,
    /// Distance from the body origin to the surface, when in contact
    pub ground_distance: Option<f32>,
}

impl GroundStatus {
    /// Resting on flat ground.
    pub const GROUNDED: Self = Self {
        is_grounded: true,
        coyote_timer: 0.0,
        ground_normal: UP,
        has_contact: true,
        ground_distance: None,
    };

    /// Airborne with the grace period already spent.
    pub fn airborne(coyote_time: f32) -> Self {
        Self {
            is_grounded: false,
            coyote_timer: coyote_time,
            ground_normal: UP,
            has_contact: false,
            ground_distance: None,
        }
    }

    /// Inside the grace period: still grounded, but no contact.
    #[inline]
    pub fn in_coyote_window(&self) -> bool {
        self.is_grounded && !self.has_contact
    }
}

/// Per-tick ground sensor.
#[derive(Clone, Debug)]
pub struct GroundSensor {
    config: SensorConfig,
    status: GroundStatus,
}

impl GroundSensor {
    /// Create a sensor. Bodies start airborne until the first contact.
    pub fn new(config: SensorConfig) -> Self {
        let status = GroundStatus::airborne(config.coyote_time);
        Self { config, status }
    }

    /// Status from the most recent `sense`.
    #[inline]
    pub fn status(&self) -> &GroundStatus {
        &self.status
    }

    /// Coyote threshold in seconds.
    #[inline]
    pub fn coyote_time(&self) -> f32 {
        self.config.coyote_time
    }

    /// Contact box for a body at `position` / `orientation`.
    pub fn contact_box(&self, position: Vec3, orientation: Quat) -> BoxShape {
        BoxShape {
            center: position + orientation * self.config.box_offset,
            half_extents: self.config.box_half_extents,
            rotation: orientation,
        }
    }

    /// Refresh the ground status.
    ///
    /// While `launching` is set (a takeoff trick has just launched the body), contact
    /// is ignored so the body can leave the ground.
    pub fn sense<G: GroundQuery + ?Sized>(
        &mut self,
        query: &G,
        position: Vec3,
        orientation: Quat,
        launching: bool,
        dt: f32,
    ) -> GroundStatus {
        let mask = self.config.ground_mask;
        let shape = self.contact_box(position, orientation);
        let touching = query.test_ground_contact(&shape, mask);
        let has_contact = touching && !launching;

        let threshold = self.config.coyote_time;
        let (is_grounded, coyote_timer) = if has_contact {
            (true, 0.0)
        } else {
            let timer = (self.status.coyote_timer + dt).min(threshold);
            (timer < threshold, timer)
        };

        let hit = query
            .raycast(position, -UP, self.config.ray_length, mask)
            .and_then(|hit| sanitize_normal(hit.normal).map(|normal| (normal, hit.distance)));

        let ground_normal = match hit {
            Some((normal, _)) if !is_flat(normal, self.config.flat_cos) => normal,
            _ => UP,
        };
        let ground_distance = match hit {
            Some((_, distance)) if has_contact => Some(distance),
            _ => None,
        };

        self.status = GroundStatus {
            is_grounded,
            coyote_timer,
            ground_normal,
            has_contact,
            ground_distance,
        };
        self.status
    }

    /// Drop to airborne immediately, skipping the grace period.
    pub fn force_airborne(&mut self) {
        self.status.is_grounded = false;
        self.status.has_contact = false;
        self.status.coyote_timer = self.config.coyote_time;
        self.status.ground_distance = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::{CollisionMask, GroundSlab, RayHit, TrackGeometry};
    use glam::Vec2;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    /// Ground that answers whatever the test says.
    struct Scripted {
        contact: bool,
        normal: Vec3,
    }

    impl GroundQuery for Scripted {
        fn test_ground_contact(&self, _shape: &BoxShape, _mask: CollisionMask) -> bool {
            self.contact
        }

        fn raycast(&self, _origin: Vec3, _dir: Vec3, _max_dist: f32, _mask: CollisionMask) -> Option<RayHit> {
            self.contact.then_some(RayHit { normal: self.normal, distance: 0.5 })
        }
    }

    fn ground(contact: bool) -> Scripted {
        Scripted { contact, normal: UP }
    }

    #[test]
    fn test_starts_airborne() {
        let sensor = GroundSensor::new(SensorConfig::default());
        assert!(!sensor.status().is_grounded);
        assert_eq!(sensor.status().coyote_timer, sensor.coyote_time());
    }

    #[test]
    fn test_contact_grounds_and_resets_timer() {
        let mut sensor = GroundSensor::new(SensorConfig::default());
        let status = sensor.sense(&ground(true), Vec3::ZERO, Quat::IDENTITY, false, DT);

        assert!(status.is_grounded);
        assert!(status.has_contact);
        assert_eq!(status.coyote_timer, 0.0);
        assert_eq!(status.ground_distance, Some(0.5));
    }

    #[test]
    fn test_coyote_window() {
        let mut sensor = GroundSensor::new(SensorConfig::default());
        sensor.sense(&ground(true), Vec3::ZERO, Quat::IDENTITY, false, DT);

        // 0.2s at 60Hz is 12 ticks; the first 11 are inside the window
        for i in 1..12 {
            let status = sensor.sense(&ground(false), Vec3::ZERO, Quat::IDENTITY, false, DT);
            assert!(status.is_grounded, "tick {} should still be in the window", i);
            assert!(status.in_coyote_window());
        }

        // Float accumulation may need one extra tick to hit the cap
        let mut status = *sensor.status();
        for _ in 0..2 {
            status = sensor.sense(&ground(false), Vec3::ZERO, Quat::IDENTITY, false, DT);
        }
        assert!(!status.is_grounded);
        assert_eq!(status.coyote_timer, sensor.coyote_time());
    }

    #[test]
    fn test_launch_ignores_contact() {
        let mut sensor = GroundSensor::new(SensorConfig::default());
        sensor.sense(&ground(true), Vec3::ZERO, Quat::IDENTITY, false, DT);

        let status = sensor.sense(&ground(true), Vec3::ZERO, Quat::IDENTITY, true, DT);
        assert!(!status.has_contact);
        assert!(status.coyote_timer > 0.0);
    }

    #[test]
    fn test_force_airborne() {
        let mut sensor = GroundSensor::new(SensorConfig::default());
        sensor.sense(&ground(true), Vec3::ZERO, Quat::IDENTITY, false, DT);
        sensor.force_airborne();

        assert!(!sensor.status().is_grounded);
        assert_eq!(sensor.status().coyote_timer, sensor.coyote_time());

        // Next airborne tick stays clamped
        let status = sensor.sense(&ground(false), Vec3::ZERO, Quat::IDENTITY, false, DT);
        assert!(!status.is_grounded);
        assert_eq!(status.coyote_timer, sensor.coyote_time());
    }

    #[test]
    fn test_slope_normal_and_flat_reset() {
        let mut sensor = GroundSensor::new(SensorConfig::default());

        let slope = Vec3::new(0.0, 1.0, 0.4).normalize();
        let status = sensor.sense(&Scripted { contact: true, normal: slope }, Vec3::ZERO, Quat::IDENTITY, false, DT);
        assert!((status.ground_normal - slope).length() < 1e-5);

        // Noise-level tilt resets to neutral
        let almost_flat = Vec3::new(0.0, 1.0, 0.01).normalize();
        let status = sensor.sense(&Scripted { contact: true, normal: almost_flat }, Vec3::ZERO, Quat::IDENTITY, false, DT);
        assert_eq!(status.ground_normal, UP);

        // Garbage normal is treated as no hit
        let status = sensor.sense(&Scripted { contact: true, normal: Vec3::ZERO }, Vec3::ZERO, Quat::IDENTITY, false, DT);
        assert_eq!(status.ground_normal, UP);
        assert_eq!(status.ground_distance, None);
    }

    #[test]
    fn test_against_track_geometry() {
        let mut track = TrackGeometry::flat_floor(20.0);
        track.add(GroundSlab::flat(Vec3::new(0.0, 5.0, 0.0), Vec2::splat(1.0)));
        let mut sensor = GroundSensor::new(SensorConfig::default());

        // Body origin at ride height above the floor: box bottom touches it
        let status = sensor.sense(&track, Vec3::new(0.0, 0.5, 10.0), Quat::IDENTITY, false, DT);
        assert!(status.has_contact);

        // High above everything
        let status = sensor.sense(&track, Vec3::new(0.0, 3.0, 10.0), Quat::IDENTITY, false, DT);
        assert!(!status.has_contact);
    }

    proptest! {
        #[test]
        fn prop_coyote_timer_in_range(
            steps in proptest::collection::vec((any::<bool>(), any::<bool>(), 0.0f32..0.1), 1..200),
        ) {
            let mut sensor = GroundSensor::new(SensorConfig::default());
            let threshold = sensor.coyote_time();

            for (contact, launching, dt) in steps {
                let status = sensor.sense(&ground(contact), Vec3::ZERO, Quat::IDENTITY, launching, dt);

                prop_assert!(status.coyote_timer >= 0.0);
                prop_assert!(status.coyote_timer <= threshold);
                prop_assert_eq!(!status.is_grounded, status.coyote_timer == threshold);
                if status.has_contact {
                    prop_assert_eq!(status.coyote_timer, 0.0);
                    prop_assert!(status.is_grounded);
                }
            }
        }
    }
}
