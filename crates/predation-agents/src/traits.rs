//! Heritable per-individual traits.
//!
//! Prey carry a genome of behavioural probabilities, durations, zone radii,
//! and turning angles; predators carry their grouping zones and angles.
//! Seeded prey draw their traits from the initial distributions below,
//! truncated to the same bounds the mutation operator enforces. Children
//! receive a copy of their parent's traits, possibly mutated (see
//! [`crate::mutation`]).

use rand::Rng;
use rand::distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::mutation::truncated_normal;

/// Lower bound for duration traits (`tv`, `tm`).
pub const MIN_DURATION: f64 = 0.167;

/// Upper bound for duration traits (`tv`, `tm`).
pub const MAX_DURATION: f64 = 1.99;

/// Upper bound for zone radii.
pub const MAX_ZONE: f64 = 50.0;

/// Upper bound for angles in degrees.
pub const MAX_ANGLE: f64 = 360.0;

/// Heritable prey parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreyTraits {
    /// Probability of choosing to scan for predators, `pv`.
    pub vigilance: f64,
    /// Probability of continuing to move after moving, `pm`.
    pub move_persistence: f64,
    /// Probability of food scanning after eating, scanning, or idling, `pse`.
    pub scan_after_eat: f64,
    /// Probability of food scanning again after a food scan, `psn`.
    pub scan_after_scan: f64,
    /// Probability of food scanning after walking to food, `pmtf`.
    pub scan_after_move_to_food: f64,
    /// Vigilance scan duration, `tv`.
    pub scan_duration: f64,
    /// Field of view of a vigilance scan in degrees, `av`.
    pub scan_angle: f64,
    /// Maximum flee duration, `tp`.
    pub flee_duration: f64,
    /// Radius of the repulsion zone, `zr`.
    pub repulsion_zone: f64,
    /// Outer radius of the attraction zone, `za`. Never below `zr`.
    pub attraction_zone: f64,
    /// Tolerance angle when attracted, in degrees, `aa`.
    pub attraction_angle: f64,
    /// Tolerance angle when repelled, in degrees, `ar`.
    pub repulsion_angle: f64,
    /// Neighbours in the repulsion zone needed to trigger avoidance, `nr`.
    pub repulsion_tolerance: f64,
    /// Duration of a move, `tm`.
    pub move_duration: f64,
    /// Distance covered per move, `dm`.
    pub move_distance: f64,
    /// Random heading turn in degrees, either way, `am`.
    pub move_angle: f64,
}

impl Default for PreyTraits {
    /// The means of the initial distributions.
    fn default() -> Self {
        Self {
            vigilance: 0.5,
            move_persistence: 0.5,
            scan_after_eat: 0.5,
            scan_after_scan: 0.5,
            scan_after_move_to_food: 0.5,
            scan_duration: 1.0,
            scan_angle: 180.0,
            flee_duration: 10.0,
            repulsion_zone: 25.0,
            attraction_zone: 40.0,
            attraction_angle: 180.0,
            repulsion_angle: 180.0,
            repulsion_tolerance: 5.0,
            move_duration: 1.0,
            move_distance: 10.0,
            move_angle: 180.0,
        }
    }
}

impl PreyTraits {
    /// Draw traits for a seeded prey.
    pub fn sample_initial<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let duration = Uniform::new_inclusive(MIN_DURATION, MAX_DURATION).ok();
        let scan_duration = duration.as_ref().map_or(1.0, |d| d.sample(rng));
        let move_duration = duration.as_ref().map_or(1.0, |d| d.sample(rng));

        let repulsion_zone = truncated_normal(rng, 25.0, 10.0, 0.0, MAX_ZONE);
        Self {
            vigilance: truncated_normal(rng, 0.5, 0.2, 0.0, 1.0),
            move_persistence: truncated_normal(rng, 0.5, 0.2, 0.0, 1.0),
            scan_after_eat: truncated_normal(rng, 0.5, 0.2, 0.0, 1.0),
            scan_after_scan: truncated_normal(rng, 0.5, 0.2, 0.0, 1.0),
            scan_after_move_to_food: truncated_normal(rng, 0.5, 0.2, 0.0, 1.0),
            scan_duration,
            scan_angle: truncated_normal(rng, 180.0, 72.0, 0.0, MAX_ANGLE),
            flee_duration: truncated_normal(rng, 10.0, 5.0, 0.0, f64::INFINITY),
            repulsion_zone,
            attraction_zone: truncated_normal(rng, 40.0, 10.0, repulsion_zone, MAX_ZONE),
            attraction_angle: truncated_normal(rng, 180.0, 72.0, 0.0, MAX_ANGLE),
            repulsion_angle: truncated_normal(rng, 180.0, 72.0, 0.0, MAX_ANGLE),
            repulsion_tolerance: truncated_normal(rng, 5.0, 1.0, 0.0, f64::INFINITY),
            move_duration,
            move_distance: truncated_normal(rng, 10.0, 3.0, 0.0, f64::INFINITY),
            move_angle: truncated_normal(rng, 180.0, 72.0, 0.0, MAX_ANGLE),
        }
    }
}

/// Heritable predator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorTraits {
    /// Radius of the repulsion zone.
    pub repulsion_zone: f64,
    /// Outer radius of the attraction zone. Never below the repulsion zone.
    pub attraction_zone: f64,
    /// Tolerance angle when attracted, in degrees.
    pub attraction_angle: f64,
    /// Tolerance angle when repelled, in degrees.
    pub repulsion_angle: f64,
    /// Random heading turn in degrees, either way.
    pub move_angle: f64,
}

impl Default for PredatorTraits {
    fn default() -> Self {
        Self {
            repulsion_zone: 20.0,
            attraction_zone: 30.0,
            attraction_angle: 72.0,
            repulsion_angle: 72.0,
            move_angle: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn sampled_traits_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let t = PreyTraits::sample_initial(&mut rng);
            for p in [
                t.vigilance,
                t.move_persistence,
                t.scan_after_eat,
                t.scan_after_scan,
                t.scan_after_move_to_food,
            ] {
                assert!((0.0..=1.0).contains(&p));
            }
            assert!((MIN_DURATION..=MAX_DURATION).contains(&t.scan_duration));
            assert!((MIN_DURATION..=MAX_DURATION).contains(&t.move_duration));
            assert!(t.repulsion_zone <= t.attraction_zone);
            assert!(t.attraction_zone <= MAX_ZONE);
            assert!(t.flee_duration >= 0.0);
            assert!((0.0..=MAX_ANGLE).contains(&t.move_angle));
        }
    }

    #[test]
    fn sampling_is_deterministic_for_a_seed() {
        let a = PreyTraits::sample_initial(&mut ChaCha8Rng::seed_from_u64(3));
        let b = PreyTraits::sample_initial(&mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
