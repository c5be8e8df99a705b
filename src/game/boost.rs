//! Boost Ledger
//!
//! Flat-point accumulator. Drifts and landed trick combos credit points,
//! time bleeds them off (faster on the ground than in the air), and the
//! current balance raises Locomotion's speed cap.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::config::{BoostConfig, DriftTier};

/// Where a credit came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostSource {
    /// End of a drift
    Drift,
    /// Landed trick combo
    TrickCombo,
}

/// Boost point balance. Always within `[0, max_points]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoostLedger {
    points: f32,
    config: BoostConfig,
}

impl BoostLedger {
    /// Empty ledger.
    pub fn new(config: BoostConfig) -> Self {
        Self { points: 0.0, config }
    }

    /// Current balance.
    #[inline]
    pub fn points(&self) -> f32 {
        self.points
    }

    /// Capacity.
    #[inline]
    pub fn max_points(&self) -> f32 {
        self.config.max_points
    }

    /// Flat grant for a drift of `duration` seconds.
    ///
    /// Step function over the configured tiers: the highest tier whose
    /// `min_duration` has been reached wins. Shorter drifts earn nothing.
    pub fn drift_tier_points(&self, duration: f32) -> f32 {
        self.config
            .drift_tiers
            .iter()
            .rev()
            .find(|tier| duration >= tier.min_duration)
            .map_or(0.0, |tier: &DriftTier| tier.points)
    }

    /// Credit the drift bonus. Returns the points actually added.
    pub fn apply_drift_bonus(&mut self, duration: f32) -> f32 {
        let grant = self.drift_tier_points(duration);
        let added = self.credit(grant);
        debug!(duration, grant, added, balance = self.points, "drift bonus");
        added
    }

    /// Credit a landed combo of `combo` tricks. Returns the points actually added.
    pub fn apply_trick_bonus(&mut self, combo: u32) -> f32 {
        let grant = self.config.per_trick_points * combo as f32;
        let added = self.credit(grant);
        debug!(combo, grant, added, balance = self.points, "trick bonus");
        added
    }

    /// Bleed off points over `dt` seconds.
    pub fn decay(&mut self, dt: f32, grounded: bool) {
        let rate = if grounded {
            self.config.grounded_decay
        } else {
            self.config.airborne_decay
        };
        self.points = (self.points - rate * dt.max(0.0)).max(0.0);
    }

    /// Extra speed cap granted by the current balance (m/s).
    #[inline]
    pub fn effective_speed_bonus(&self) -> f32 {
        self.points * self.config.speed_per_point
    }

    /// Forward impulse to apply for a credit of `added` points (m/s).
    #[inline]
    pub fn credit_impulse(&self, added: f32) -> f32 {
        added * self.config.impulse_per_point
    }

    /// Add `grant`, clamped to capacity. Returns the amount that fit.
    fn credit(&mut self, grant: f32) -> f32 {
        if grant.is_nan() || grant <= 0.0 {
            return 0.0;
        }
        let before = self.points;
        self.points = (self.points + grant).clamp(0.0, self.config.max_points);
        self.points - before
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger() -> BoostLedger {
        BoostLedger::new(BoostConfig::default())
    }

    #[test]
    fn test_drift_tiers_are_steps() {
        let config = BoostConfig::default();
        let mut ledger = ledger();
        assert_eq!(ledger.apply_drift_bonus(0.9), 0.0);

        let mut ledger_1 = BoostLedger::new(config.clone());
        assert_eq!(ledger_1.apply_drift_bonus(1.0), config.drift_tiers[0].points);

        let mut ledger_2 = BoostLedger::new(config.clone());
        assert_eq!(ledger_2.apply_drift_bonus(2.0), config.drift_tiers[1].points);

        let mut ledger_3 = BoostLedger::new(config.clone());
        assert_eq!(ledger_3.apply_drift_bonus(3.5), config.drift_tiers[2].points);

        // Not interpolated between tiers
        assert_eq!(ledger.drift_tier_points(1.99), config.drift_tiers[0].points);
        assert_eq!(ledger.drift_tier_points(10.0), config.drift_tiers[2].points);
    }

    #[test]
    fn test_trick_bonus_scales_with_combo() {
        let mut ledger = ledger();
        let per_trick = BoostConfig::default().per_trick_points;
        assert_eq!(ledger.apply_trick_bonus(2), 2.0 * per_trick);
        assert_eq!(ledger.points(), 2.0 * per_trick);
        assert_eq!(ledger.apply_trick_bonus(0), 0.0);
    }

    #[test]
    fn test_credit_clamps_to_max() {
        let mut ledger = ledger();
        for _ in 0..10 {
            ledger.apply_drift_bonus(5.0);
        }
        assert_eq!(ledger.points(), ledger.max_points());
        assert_eq!(ledger.apply_trick_bonus(3), 0.0);
    }

    #[test]
    fn test_decay_faster_on_ground() {
        let mut grounded = ledger();
        let mut airborne = ledger();
        grounded.apply_drift_bonus(3.0);
        airborne.apply_drift_bonus(3.0);

        grounded.decay(1.0, true);
        airborne.decay(1.0, false);
        assert!(grounded.points() < airborne.points());

        // Floors at zero
        grounded.decay(100.0, true);
        assert_eq!(grounded.points(), 0.0);
    }

    #[test]
    fn test_speed_bonus_is_linear() {
        let mut ledger = ledger();
        assert_eq!(ledger.effective_speed_bonus(), 0.0);
        ledger.apply_drift_bonus(2.0);
        let per_point = BoostConfig::default().speed_per_point;
        assert!((ledger.effective_speed_bonus() - ledger.points() * per_point).abs() < 1e-6);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Drift(f32),
        Trick(u32),
        Decay(f32, bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..10.0).prop_map(Op::Drift),
            (0u32..20).prop_map(Op::Trick),
            (0.0f32..5.0, any::<bool>()).prop_map(|(dt, g)| Op::Decay(dt, g)),
        ]
    }

    proptest! {
        #[test]
        fn prop_points_stay_in_range(ops in proptest::collection::vec(op(), 0..100)) {
            let mut ledger = ledger();
            for op in ops {
                match op {
                    Op::Drift(d) => { ledger.apply_drift_bonus(d); }
                    Op::Trick(c) => { ledger.apply_trick_bonus(c); }
                    Op::Decay(dt, g) => ledger.decay(dt, g),
                }
                prop_assert!(ledger.points() >= 0.0);
                prop_assert!(ledger.points() <= ledger.max_points());
            }
        }
    }
}
