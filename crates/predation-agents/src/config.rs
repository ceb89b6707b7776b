//! Tunable parameters for prey, predators, and food.
//!
//! These structs correspond to the `prey`, `predator`, and `food` sections
//! of `predation-config.yaml`. Every field has a default so a partial YAML
//! section is valid; callers (the model, tests) can also build them in code
//! and override individual values.
//!
//! Heritable per-individual parameters live in [`crate::traits`]; the values
//! here are shared by every member of a species.

use serde::{Deserialize, Serialize};

use crate::traits::PredatorTraits;

/// Minutes in a year. One tick is one minute of simulated time.
pub const TICKS_PER_YEAR: f64 = 525_600.0;

/// Species-wide parameters for prey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreyConfig {
    /// Energy of a newly seeded prey (default: 100000).
    pub initial_energy: f64,

    /// Energy at or below which a prey starves (default: 0).
    pub min_energy: f64,

    /// Upper bound on prey energy, also the reproduction threshold
    /// (default: 100000).
    pub max_energy: f64,

    /// Metabolic cost per tick, `em` (default: 1).
    pub metabolism: f64,

    /// Age in ticks beyond which a prey dies (default: 10512000, twenty
    /// years of minutes).
    pub max_age: u64,

    /// Annual probability of a random death, applied only with evolution
    /// enabled (default: 0.1).
    pub death_rate: f64,

    /// Per-trait probability of mutation on reproduction (default: 0.05).
    pub mutation_rate: f64,

    /// Whether newly seeded prey start inside a safe cooldown (default: true).
    pub initially_safe: bool,

    /// Length of the safe cooldown in ticks (default: 10).
    pub waiting_time: u32,

    /// Time subtracted from the remaining flee duration when fleeing starts
    /// (default: 1).
    pub reaction_time: f64,

    /// Radius within which neighbours, food, and predators are noticed
    /// (default: 50).
    pub max_neighbour_awareness: f64,

    /// Outer radius of the alignment zone, `zl` (default: 25).
    pub alignment_zone: f64,

    /// Distance at which a food item can be eaten, `dr` (default: 0.9).
    pub reach: f64,

    /// Half-detection distance of the detection curve, `h` (default: 5).
    pub detection_half_distance: f64,

    /// Steepness exponent of the detection curve, `N` (default: 5).
    pub detection_exponent: i32,

    /// Reference scan duration normalising `tv` (default: 10).
    pub min_scan_time: f64,

    /// Duration of a food scan in ticks, `tf` (default: 3).
    pub food_scan_duration: f64,

    /// Fixed turn applied when the desired heading is outside the
    /// tolerance angle, in degrees (default: 10).
    pub turn_step: f64,
}

impl Default for PreyConfig {
    fn default() -> Self {
        Self {
            initial_energy: 100_000.0,
            min_energy: 0.0,
            max_energy: 100_000.0,
            metabolism: 1.0,
            max_age: 10_512_000,
            death_rate: 0.1,
            mutation_rate: 0.05,
            initially_safe: true,
            waiting_time: 10,
            reaction_time: 1.0,
            max_neighbour_awareness: 50.0,
            alignment_zone: 25.0,
            reach: 0.9,
            detection_half_distance: 5.0,
            detection_exponent: 5,
            min_scan_time: 10.0,
            food_scan_duration: 3.0,
            turn_step: 10.0,
        }
    }
}

/// Species-wide parameters for predators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorConfig {
    /// Energy of a newly seeded predator (default: 100000).
    pub initial_energy: f64,

    /// Energy at or below which a predator starves (default: 0).
    pub min_energy: f64,

    /// Upper bound on predator energy (default: 100000).
    pub max_energy: f64,

    /// Energy spent per tick (default: 1).
    pub energy_cost: f64,

    /// Age in ticks beyond which a predator dies (default: 10512000).
    pub max_age: u64,

    /// Annual probability of a random death (default: 0.1).
    pub death_rate: f64,

    /// Per-trait probability of mutation on reproduction (default: 0.05).
    pub mutation_rate: f64,

    /// Energy needed before a predator reproduces (default: 100000).
    pub reproduction_requirement: f64,

    /// Energy a parent pays per offspring (default: 50000).
    pub reproduction_cost: f64,

    /// Energy an offspring starts with (default: 50000).
    pub offspring_energy: f64,

    /// Outer radius of the alignment zone (default: 50).
    pub alignment: f64,

    /// Step length while searching (default: 2).
    pub max_speed: f64,

    /// Radius within which other predators are noticed (default: 50).
    pub max_neighbour_awareness: f64,

    /// Distance at which a chased prey is caught (default: 5).
    pub attack_distance: f64,

    /// Radius within which a scanning predator spots prey (default: 50).
    pub prey_detection_range: f64,

    /// Step length while chasing (default: 11.1).
    pub attack_speed: f64,

    /// Ticks spent searching before scanning (default: 3).
    pub search_duration: u32,

    /// Ticks spent scanning before giving up and searching again
    /// (default: 3).
    pub scan_duration: u32,

    /// Number of neighbours in the repulsion zone that triggers avoidance
    /// (default: 1).
    pub repulsion_tolerance: f64,

    /// Fixed turn applied outside the tolerance angle, in degrees
    /// (default: 10).
    pub turn_step: f64,

    /// Traits given to seeded predators.
    pub initial_traits: PredatorTraits,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            initial_energy: 100_000.0,
            min_energy: 0.0,
            max_energy: 100_000.0,
            energy_cost: 1.0,
            max_age: 10_512_000,
            death_rate: 0.1,
            mutation_rate: 0.05,
            reproduction_requirement: 100_000.0,
            reproduction_cost: 50_000.0,
            offspring_energy: 50_000.0,
            alignment: 50.0,
            max_speed: 2.0,
            max_neighbour_awareness: 50.0,
            attack_distance: 5.0,
            prey_detection_range: 50.0,
            attack_speed: 11.1,
            search_duration: 3,
            scan_duration: 3,
            repulsion_tolerance: 1.0,
            turn_step: 10.0,
            initial_traits: PredatorTraits::default(),
        }
    }
}

/// Parameters for food items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    /// Energy a prey gains from one item, `Er` (default: 2).
    pub energy_value: f64,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self { energy_value: 2.0 }
    }
}

/// Parameters for every species, bundled for the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Prey parameters.
    #[serde(default)]
    pub prey: PreyConfig,
    /// Predator parameters.
    #[serde(default)]
    pub predator: PredatorConfig,
    /// Food parameters.
    #[serde(default)]
    pub food: FoodConfig,
}

/// Per-tick probability of a random death for an annual `death_rate`.
pub fn per_tick_death_probability(death_rate: f64) -> f64 {
    if !death_rate.is_finite() || death_rate <= 0.0 {
        return 0.0;
    }
    (death_rate / TICKS_PER_YEAR).min(1.0)
}
