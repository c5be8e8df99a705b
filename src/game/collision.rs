//! Collision Queries
//!
//! The core never owns level geometry. It asks a [`GroundQuery`] two
//! questions per tick: "does this box touch ground?" and "what is under me?".
//! [`TrackGeometry`] is a small static implementation made of flat slabs,
//! used by the demo binary and the tests.

use glam::{Quat, Vec2, Vec3};
use serde::{Serialize, Deserialize};

use crate::core::math::sanitize_normal;

/// Bitmask of collision layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    /// Matches nothing
    pub const NONE: Self = Self(0);
    /// Drivable ground
    pub const GROUND: Self = Self(1 << 0);
    /// Rails, ledges and other grindable props
    pub const PROPS: Self = Self(1 << 1);
    /// Matches everything
    pub const ALL: Self = Self(u32::MAX);

    /// Does this mask select no layers?
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Do the two masks share a layer?
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two masks.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Oriented box used for ground contact tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxShape {
    /// World-space centre
    pub center: Vec3,
    /// Half extents along the box's local axes
    pub half_extents: Vec3,
    /// World-space rotation
    pub rotation: Quat,
}

impl BoxShape {
    /// Radius of the box projected onto `axis` (unit length).
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        let x = self.rotation * Vec3::X;
        let y = self.rotation * Vec3::Y;
        let z = self.rotation * Vec3::Z;
        self.half_extents.x * x.dot(axis).abs()
            + self.half_extents.y * y.dot(axis).abs()
            + self.half_extents.z * z.dot(axis).abs()
    }
}

/// Result of a raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance along the ray
    pub distance: f32,
}

/// Collision queries the core consumes.
///
/// Implementations must be synchronous and cheap enough to run once per tick.
/// Invalid or missing geometry must answer "no contact" / `None`.
pub trait GroundQuery {
    /// Does `shape` overlap any collider on a layer in `mask`?
    fn test_ground_contact(&self, shape: &BoxShape, mask: CollisionMask) -> bool;

    /// First hit along `dir` (unit length) within `max_dist`.
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, mask: CollisionMask) -> Option<RayHit>;
}

impl<G: GroundQuery + ?Sized> GroundQuery for &G {
    fn test_ground_contact(&self, shape: &BoxShape, mask: CollisionMask) -> bool {
        (**self).test_ground_contact(shape, mask)
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, mask: CollisionMask) -> Option<RayHit> {
        (**self).raycast(origin, dir, max_dist, mask)
    }
}

// =============================================================================
// STATIC TRACK GEOMETRY
// =============================================================================

/// A flat rectangular piece of ground with zero thickness.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundSlab {
    /// Centre of the surface
    pub center: Vec3,
    /// Surface orientation; local +Y is the surface normal
    pub rotation: Quat,
    /// Half size along local X and Z
    pub half_size: Vec2,
    /// Layer this slab belongs to
    pub layer: CollisionMask,
}

impl GroundSlab {
    /// Horizontal slab at height `y`.
    pub fn flat(center: Vec3, half_size: Vec2) -> Self {
        Self {
            center,
            rotation: Quat::IDENTITY,
            half_size,
            layer: CollisionMask::GROUND,
        }
    }

    /// Slab pitched by `angle` radians about world X (a ramp rising toward -Z for positive angles).
    pub fn ramp(center: Vec3, half_size: Vec2, angle: f32) -> Self {
        Self {
            center,
            rotation: Quat::from_rotation_x(angle),
            half_size,
            layer: CollisionMask::GROUND,
        }
    }

    /// Surface normal.
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Is a point, projected onto the slab plane, inside its rectangle (grown by `margin`)?
    fn contains_projected(&self, point: Vec3, margin: Vec2) -> bool {
        let local = self.rotation.inverse() * (point - self.center);
        local.x.abs() <= self.half_size.x + margin.x
            && local.z.abs() <= self.half_size.y + margin.y
    }

    /// Box-vs-slab overlap (separating axis along the slab normal, footprint test in-plane).
    pub fn overlaps(&self, shape: &BoxShape) -> bool {
        let normal = self.normal();
        let distance = (shape.center - self.center).dot(normal);
        if distance.abs() > shape.projected_radius(normal) {
            return false;
        }
        let tangent_x = self.rotation * Vec3::X;
        let tangent_z = self.rotation * Vec3::Z;
        let margin = Vec2::new(shape.projected_radius(tangent_x), shape.projected_radius(tangent_z));
        self.contains_projected(shape.center, margin)
    }

    /// Ray-vs-slab intersection.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RayHit> {
        let normal = self.normal();
        let denom = dir.dot(normal);
        if denom.abs() <= f32::EPSILON {
            return None;
        }
        let distance = (self.center - origin).dot(normal) / denom;
        if !(0.0..=max_dist).contains(&distance) {
            return None;
        }
        let point = origin + dir * distance;
        if !self.contains_projected(point, Vec2::ZERO) {
            return None;
        }
        Some(RayHit { normal, distance })
    }
}

/// Static ground made of slabs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackGeometry {
    slabs: Vec<GroundSlab>,
}

impl TrackGeometry {
    /// Empty geometry (everything is airborne).
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry with a single large flat floor at height 0.
    pub fn flat_floor(half_size: f32) -> Self {
        let mut track = Self::new();
        track.add(GroundSlab::flat(Vec3::ZERO, Vec2::splat(half_size)));
        track
    }

    /// Add a slab.
    pub fn add(&mut self, slab: GroundSlab) -> &mut Self {
        self.slabs.push(slab);
        self
    }

    /// All slabs.
    pub fn slabs(&self) -> &[GroundSlab] {
        &self.slabs
    }
}

impl GroundQuery for TrackGeometry {
    fn test_ground_contact(&self, shape: &BoxShape, mask: CollisionMask) -> bool {
        if !shape.center.is_finite() {
            return false;
        }
        self.slabs
            .iter()
            .filter(|slab| slab.layer.intersects(mask))
            .any(|slab| slab.overlaps(shape))
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, mask: CollisionMask) -> Option<RayHit> {
        let dir = sanitize_normal(dir)?;
        self.slabs
            .iter()
            .filter(|slab| slab.layer.intersects(mask))
            .filter_map(|slab| slab.raycast(origin, dir, max_dist))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

// =============================================================================
// TESTS
// =============================================================================
