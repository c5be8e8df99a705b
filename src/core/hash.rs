//! State Hashing for Verification
//!
//! Provides deterministic hashing of simulation state so two runs of the
//! same input script can be compared bit for bit.

use glam::{Quat, Vec2, Vec3};
use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for simulation state.
///
/// Wraps SHA-256 with helpers for float and vector types.
/// Floats are hashed by bit pattern. Order of updates is critical.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for skater state.
    pub fn for_skater_state() -> Self {
        Self::new(b"POWERSLIDE_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f32 by bit pattern.
    #[inline]
    pub fn update_f32(&mut self, value: f32) {
        self.update_u32(value.to_bits());
    }

    /// Update with a Vec2.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f32(value.x);
        self.update_f32(value.y);
    }

    /// Update with a Vec3.
    #[inline]
    pub fn update_vec3(&mut self, value: Vec3) {
        self.update_f32(value.x);
        self.update_f32(value.y);
        self.update_f32(value.z);
    }

    /// Update with a Quat.
    #[inline]
    pub fn update_quat(&mut self, value: Quat) {
        self.update_f32(value.x);
        self.update_f32(value.y);
        self.update_f32(value.z);
        self.update_f32(value.w);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for a simulation tick.
///
/// The closure adds component-specific data after the tick counter.
pub fn compute_state_hash<F>(tick: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_skater_state();
    hasher.update_u32(tick);
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_skater_state();
            hasher.update_u32(100);
            hasher.update_f32(5.5);
            hasher.update_vec3(Vec3::new(1.0, 2.0, 3.0));
            hasher.update_quat(Quat::IDENTITY);
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_f32(1.0);
            h.update_f32(2.0);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_f32(2.0);
            h.update_f32(1.0);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_negative_zero_is_distinct() {
        // Bit-pattern hashing: -0.0 and 0.0 differ, which a replay must reproduce exactly
        let a = compute_state_hash(1, |h| h.update_f32(0.0));
        let b = compute_state_hash(1, |h| h.update_f32(-0.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_compute_state_hash_includes_tick() {
        let a = compute_state_hash(100, |h| h.update_vec2(Vec2::ONE));
        let b = compute_state_hash(101, |h| h.update_vec2(Vec2::ONE));
        assert_ne!(a, b);
    }
}
