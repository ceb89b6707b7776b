//! The mutation operator applied to offspring traits.
//!
//! Each species declares an explicit table of [`MutationRule`]s, one per
//! heritable trait, iterated in a fixed order. With probability
//! `mutation_rate` a trait is resampled from a normal distribution centred
//! on its current value and truncated to the rule's bounds. A lower bound
//! may refer to another trait (the attraction zone may never fall below
//! the repulsion zone); those rules are listed after the trait they depend
//! on. The parent's traits are only read.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::traits::{MAX_ANGLE, MAX_DURATION, MAX_ZONE, MIN_DURATION, PredatorTraits, PreyTraits};

/// Rejection-sampling attempts before falling back to clamping.
const MAX_ATTEMPTS: u32 = 64;

/// Draw from `Normal(mean, sd)` truncated to `[lower, upper]`.
///
/// Uses rejection sampling; if no draw lands inside the bounds within a
/// fixed number of attempts, or the distribution cannot be built, the
/// clamped mean is returned instead. Bounds given in the wrong order are
/// swapped.
pub fn truncated_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    sd: f64,
    lower: f64,
    upper: f64,
) -> f64 {
    if lower.is_nan() || upper.is_nan() {
        return mean;
    }
    let (lower, upper) = if lower <= upper { (lower, upper) } else { (upper, lower) };
    let fallback = if mean.is_finite() {
        mean.clamp(lower, upper)
    } else {
        lower
    };
    let Ok(normal) = Normal::new(mean, sd) else {
        return fallback;
    };
    for _ in 0..MAX_ATTEMPTS {
        let x = normal.sample(rng);
        if (lower..=upper).contains(&x) {
            return x;
        }
    }
    fallback
}

/// Where a trait's lower bound comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LowerBound<G> {
    /// A constant.
    Fixed(f64),
    /// The current value of another trait of the same individual.
    Gene(G),
}

/// Bounds and spread for one mutable trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationRule<G> {
    /// The trait this rule applies to.
    pub gene: G,
    /// Lower bound.
    pub lower: LowerBound<G>,
    /// Upper bound.
    pub upper: f64,
    /// Standard deviation of the resampling distribution.
    pub sd: f64,
}

/// A set of named real-valued traits that can be mutated.
pub trait Genome: Clone {
    /// Names the individual traits.
    type Gene: Copy + core::fmt::Debug + 'static;

    /// The ordered mutation table.
    fn rules() -> &'static [MutationRule<Self::Gene>];

    /// Read a trait.
    fn gene(&self, gene: Self::Gene) -> f64;

    /// Overwrite a trait.
    fn set_gene(&mut self, gene: Self::Gene, value: f64);

    /// Restore cross-trait constraints after mutation.
    fn enforce_constraints(&mut self);
}

/// The result of mutating a parent's traits.
#[derive(Debug, Clone)]
pub struct Mutation<G: Genome> {
    /// The child's traits.
    pub child: G,
    /// Traits that were resampled, in table order.
    pub mutated: Vec<G::Gene>,
}

/// Produce a child genome from `parent`.
pub fn mutate<G: Genome, R: Rng + ?Sized>(parent: &G, mutation_rate: f64, rng: &mut R) -> Mutation<G> {
    let mut child = parent.clone();
    let mut mutated = Vec::new();
    for rule in G::rules() {
        if rng.random::<f64>() >= mutation_rate {
            continue;
        }
        let lower = match rule.lower {
            LowerBound::Fixed(v) => v,
            LowerBound::Gene(other) => child.gene(other),
        };
        let value = truncated_normal(rng, child.gene(rule.gene), rule.sd, lower, rule.upper);
        child.set_gene(rule.gene, value);
        mutated.push(rule.gene);
    }
    child.enforce_constraints();
    Mutation { child, mutated }
}

// ---------------------------------------------------------------------------
// Prey
// ---------------------------------------------------------------------------

/// Mutable prey traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreyGene {
    /// `pv`
    Vigilance,
    /// `pm`
    MovePersistence,
    /// `pse`
    ScanAfterEat,
    /// `psn`
    ScanAfterScan,
    /// `pmtf`
    ScanAfterMoveToFood,
    /// `tv`
    ScanDuration,
    /// `av`
    ScanAngle,
    /// `tp`
    FleeDuration,
    /// `zr`
    RepulsionZone,
    /// `za`
    AttractionZone,
    /// `aa`
    AttractionAngle,
    /// `ar`
    RepulsionAngle,
    /// `nr`
    RepulsionTolerance,
    /// `tm`
    MoveDuration,
    /// `dm`
    MoveDistance,
    /// `am`
    MoveAngle,
}

const fn rule<G>(gene: G, lower: f64, upper: f64, sd: f64) -> MutationRule<G> {
    MutationRule {
        gene,
        lower: LowerBound::Fixed(lower),
        upper,
        sd,
    }
}

/// Prey mutation table. `za` follows `zr` so its lower bound is current.
pub const PREY_RULES: [MutationRule<PreyGene>; 16] = [
    rule(PreyGene::Vigilance, 0.0, 1.0, 0.2),
    rule(PreyGene::MovePersistence, 0.0, 1.0, 0.2),
    rule(PreyGene::ScanAfterEat, 0.0, 1.0, 0.2),
    rule(PreyGene::ScanAfterScan, 0.0, 1.0, 0.2),
    rule(PreyGene::ScanAfterMoveToFood, 0.0, 1.0, 0.2),
    rule(PreyGene::ScanDuration, MIN_DURATION, MAX_DURATION, 0.4),
    rule(PreyGene::ScanAngle, 0.0, MAX_ANGLE, 72.0),
    rule(PreyGene::FleeDuration, 0.0, f64::INFINITY, 5.0),
    rule(PreyGene::RepulsionZone, 0.0, MAX_ZONE, 10.0),
    MutationRule {
        gene: PreyGene::AttractionZone,
        lower: LowerBound::Gene(PreyGene::RepulsionZone),
        upper: MAX_ZONE,
        sd: 10.0,
    },
    rule(PreyGene::AttractionAngle, 0.0, MAX_ANGLE, 72.0),
    rule(PreyGene::RepulsionAngle, 0.0, MAX_ANGLE, 72.0),
    rule(PreyGene::RepulsionTolerance, 0.0, f64::INFINITY, 1.0),
    rule(PreyGene::MoveDuration, MIN_DURATION, MAX_DURATION, 0.4),
    rule(PreyGene::MoveDistance, 0.0, f64::INFINITY, 3.0),
    rule(PreyGene::MoveAngle, 0.0, MAX_ANGLE, 72.0),
];

impl Genome for PreyTraits {
    type Gene = PreyGene;

    fn rules() -> &'static [MutationRule<PreyGene>] {
        &PREY_RULES
    }

    fn gene(&self, gene: PreyGene) -> f64 {
        match gene {
            PreyGene::Vigilance => self.vigilance,
            PreyGene::MovePersistence => self.move_persistence,
            PreyGene::ScanAfterEat => self.scan_after_eat,
            PreyGene::ScanAfterScan => self.scan_after_scan,
            PreyGene::ScanAfterMoveToFood => self.scan_after_move_to_food,
            PreyGene::ScanDuration => self.scan_duration,
            PreyGene::ScanAngle => self.scan_angle,
            PreyGene::FleeDuration => self.flee_duration,
            PreyGene::RepulsionZone => self.repulsion_zone,
            PreyGene::AttractionZone => self.attraction_zone,
            PreyGene::AttractionAngle => self.attraction_angle,
            PreyGene::RepulsionAngle => self.repulsion_angle,
            PreyGene::RepulsionTolerance => self.repulsion_tolerance,
            PreyGene::MoveDuration => self.move_duration,
            PreyGene::MoveDistance => self.move_distance,
            PreyGene::MoveAngle => self.move_angle,
        }
    }

    fn set_gene(&mut self, gene: PreyGene, value: f64) {
        let slot = match gene {
            PreyGene::Vigilance => &mut self.vigilance,
            PreyGene::MovePersistence => &mut self.move_persistence,
            PreyGene::ScanAfterEat => &mut self.scan_after_eat,
            PreyGene::ScanAfterScan => &mut self.scan_after_scan,
            PreyGene::ScanAfterMoveToFood => &mut self.scan_after_move_to_food,
            PreyGene::ScanDuration => &mut self.scan_duration,
            PreyGene::ScanAngle => &mut self.scan_angle,
            PreyGene::FleeDuration => &mut self.flee_duration,
            PreyGene::RepulsionZone => &mut self.repulsion_zone,
            PreyGene::AttractionZone => &mut self.attraction_zone,
            PreyGene::AttractionAngle => &mut self.attraction_angle,
            PreyGene::RepulsionAngle => &mut self.repulsion_angle,
            PreyGene::RepulsionTolerance => &mut self.repulsion_tolerance,
            PreyGene::MoveDuration => &mut self.move_duration,
            PreyGene::MoveDistance => &mut self.move_distance,
            PreyGene::MoveAngle => &mut self.move_angle,
        };
        *slot = value;
    }

    fn enforce_constraints(&mut self) {
        // zr may have grown past an unmutated za.
        if self.attraction_zone < self.repulsion_zone {
            self.attraction_zone = self.repulsion_zone;
        }
    }
}

// ---------------------------------------------------------------------------
// Predator
// ---------------------------------------------------------------------------

/// Mutable predator traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredatorGene {
    /// Repulsion zone radius.
    RepulsionZone,
    /// Attraction zone radius.
    AttractionZone,
    /// Attraction tolerance angle.
    AttractionAngle,
    /// Repulsion tolerance angle.
    RepulsionAngle,
    /// Heading noise width.
    MoveAngle,
}

/// Predator mutation table.
pub const PREDATOR_RULES: [MutationRule<PredatorGene>; 5] = [
    rule(PredatorGene::RepulsionZone, 0.0, MAX_ZONE, 10.0),
    MutationRule {
        gene: PredatorGene::AttractionZone,
        lower: LowerBound::Gene(PredatorGene::RepulsionZone),
        upper: MAX_ZONE,
        sd: 10.0,
    },
    rule(PredatorGene::AttractionAngle, 0.0, MAX_ANGLE, 72.0),
    rule(PredatorGene::RepulsionAngle, 0.0, MAX_ANGLE, 72.0),
    rule(PredatorGene::MoveAngle, 0.0, MAX_ANGLE, 72.0),
];

impl Genome for PredatorTraits {
    type Gene = PredatorGene;

    fn rules() -> &'static [MutationRule<PredatorGene>] {
        &PREDATOR_RULES
    }

    fn gene(&self, gene: PredatorGene) -> f64 {
        match gene {
            PredatorGene::RepulsionZone => self.repulsion_zone,
            PredatorGene::AttractionZone => self.attraction_zone,
            PredatorGene::AttractionAngle => self.attraction_angle,
            PredatorGene::RepulsionAngle => self.repulsion_angle,
            PredatorGene::MoveAngle => self.move_angle,
        }
    }

    fn set_gene(&mut self, gene: PredatorGene, value: f64) {
        let slot = match gene {
            PredatorGene::RepulsionZone => &mut self.repulsion_zone,
            PredatorGene::AttractionZone => &mut self.attraction_zone,
            PredatorGene::AttractionAngle => &mut self.attraction_angle,
            PredatorGene::RepulsionAngle => &mut self.repulsion_angle,
            PredatorGene::MoveAngle => &mut self.move_angle,
        };
        *slot = value;
    }

    fn enforce_constraints(&mut self) {
        if self.attraction_zone < self.repulsion_zone {
            self.attraction_zone = self.repulsion_zone;
        }
    }
}
