//! Death conditions shared by prey and predators.
//!
//! Deterministic conditions (energy exhausted, age exceeded) are checked
//! every tick. The stochastic death-rate draw is only rolled when the
//! caller says evolution is enabled.

use predation_types::DeathCause;
use rand::Rng;

use crate::config::per_tick_death_probability;

/// Check whether an animal meets a deterministic death condition.
///
/// Starvation takes precedence over old age when both hold.
pub fn check_death(energy: f64, min_energy: f64, age: u64, max_age: u64) -> Option<DeathCause> {
    if energy.is_nan() || energy <= min_energy {
        return Some(DeathCause::Starvation);
    }
    if age > max_age {
        return Some(DeathCause::OldAge);
    }
    None
}

/// Roll the per-tick random death for an annual `death_rate`.
pub fn roll_random_death<R: Rng + ?Sized>(death_rate: f64, rng: &mut R) -> bool {
    let p = per_tick_death_probability(death_rate);
    p > 0.0 && rng.random::<f64>() < p
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn alive_when_fed_and_young() {
        assert_eq!(check_death(10.0, 0.0, 5, 100), None);
    }

    #[test]
    fn starvation_at_minimum() {
        assert_eq!(check_death(0.0, 0.0, 5, 100), Some(DeathCause::Starvation));
        assert_eq!(check_death(f64::NAN, 0.0, 5, 100), Some(DeathCause::Starvation));
    }

    #[test]
    fn old_age_past_maximum() {
        assert_eq!(check_death(10.0, 0.0, 100, 100), None);
        assert_eq!(check_death(10.0, 0.0, 101, 100), Some(DeathCause::OldAge));
    }

    #[test]
    fn starvation_precedes_old_age() {
        assert_eq!(check_death(-1.0, 0.0, 200, 100), Some(DeathCause::Starvation));
    }

    #[test]
    fn zero_rate_never_kills() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!((0..10_000).all(|_| !roll_random_death(0.0, &mut rng)));
    }
}
