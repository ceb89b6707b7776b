//! Zone-based group steering shared by prey and predators.
//!
//! Neighbours closer than the repulsion radius `zr` repel. Beyond it a
//! neighbour aligns while `d < zl` and attracts while `d <= za`; the two
//! outer bands overlap, so a mate may both align and attract. When enough
//! neighbours crowd the repulsion zone the agent turns away from them;
//! otherwise it turns toward attracting neighbours while matching the
//! headings of aligned ones. The turn is limited by a tolerance angle and
//! finished with a random heading perturbation.

use predation_types::Vec2;
use rand::Rng;

/// A neighbour as seen by the steering agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMate {
    /// Shortest torus displacement from the steering agent to the mate.
    pub offset: Vec2,
    /// Length of `offset`.
    pub distance: f64,
    /// The mate's current heading.
    pub heading: Vec2,
}

/// Zone radii around a steering agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zones {
    /// Repulsion radius.
    pub repulsion: f64,
    /// Alignment outer radius, at least `repulsion`.
    pub alignment: f64,
    /// Attraction outer radius, at least `repulsion`.
    pub attraction: f64,
}

impl Zones {
    /// Build zones whose outer radii never fall inside the repulsion radius.
    pub const fn new(repulsion: f64, alignment: f64, attraction: f64) -> Self {
        let repulsion = repulsion.max(0.0);
        Self {
            repulsion,
            alignment: alignment.max(repulsion),
            attraction: attraction.max(repulsion),
        }
    }

    /// A neighbour at `distance` pushes the agent away.
    pub fn repels(&self, distance: f64) -> bool {
        distance < self.repulsion
    }

    /// A neighbour at `distance` contributes its heading.
    pub fn aligns(&self, distance: f64) -> bool {
        !self.repels(distance) && distance < self.alignment
    }

    /// A neighbour at `distance` pulls the agent toward it.
    pub fn attracts(&self, distance: f64) -> bool {
        !self.repels(distance) && distance <= self.attraction
    }

    /// Radius a neighbour query must cover.
    pub const fn query_radius(&self) -> f64 {
        self.alignment.max(self.attraction)
    }
}

/// Per-individual steering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerParams {
    /// Zone radii.
    pub zones: Zones,
    /// Repulsion-zone neighbours needed to trigger avoidance.
    pub repulsion_tolerance: f64,
    /// Tolerance angle in avoidance mode, degrees.
    pub repulsion_angle: f64,
    /// Tolerance angle in attraction mode, degrees.
    pub attraction_angle: f64,
    /// Fixed turn used outside the tolerance angle, degrees.
    pub turn_step: f64,
    /// Magnitude of the random heading perturbation, degrees.
    pub noise_angle: f64,
}

/// Which rule produced the desired heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerMode {
    /// Turning away from crowded neighbours.
    Avoid,
    /// Turning toward and aligning with the group.
    Cohere,
    /// No usable desired heading; the current heading was kept.
    Hold,
}

/// Outcome of one steering decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// New unit heading.
    pub heading: Vec2,
    /// Rule that was applied.
    pub mode: SteerMode,
    /// Neighbours in the repulsion zone.
    pub repelling: usize,
    /// Neighbours in the alignment zone.
    pub aligning: usize,
    /// Neighbours in the attraction zone.
    pub attracting: usize,
}

/// The desired heading before the turn limit and noise are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Desired {
    /// Rule that produced the heading.
    pub mode: SteerMode,
    /// Unit vector, or `None` if the contributions cancelled out.
    pub heading: Option<Vec2>,
    /// Neighbours in the repulsion zone.
    pub repelling: usize,
    /// Neighbours in the alignment zone.
    pub aligning: usize,
    /// Neighbours in the attraction zone.
    pub attracting: usize,
}

/// Classify `mates` and combine them into a desired heading.
pub fn desired_heading(mates: &[GroupMate], params: &SteerParams) -> Desired {
    let mut away = Vec2::ZERO;
    let mut toward = Vec2::ZERO;
    let (mut repelling, mut aligning, mut attracting) = (0_usize, 0_usize, 0_usize);

    for mate in mates {
        let unit = mate.offset.normalize();
        if params.zones.repels(mate.distance) {
            repelling = repelling.saturating_add(1);
            if let Some(u) = unit {
                away = away.add(u);
            }
            continue;
        }
        if params.zones.aligns(mate.distance) {
            aligning = aligning.saturating_add(1);
            if let Some(h) = mate.heading.normalize() {
                toward = toward.add(h);
            }
        }
        if params.zones.attracts(mate.distance) {
            attracting = attracting.saturating_add(1);
            if let Some(u) = unit {
                toward = toward.add(u);
            }
        }
    }

    let crowded = repelling > 0 && repelling as f64 >= params.repulsion_tolerance;
    let (mode, heading) = if crowded {
        (SteerMode::Avoid, away.negate().normalize())
    } else {
        (SteerMode::Cohere, toward.normalize())
    };
    Desired {
        mode,
        heading,
        repelling,
        aligning,
        attracting,
    }
}

/// Pick a new heading for an agent currently facing `heading`.
pub fn steer<R: Rng + ?Sized>(
    heading: Vec2,
    mates: &[GroupMate],
    params: &SteerParams,
    rng: &mut R,
) -> Steering {
    let desired = desired_heading(mates, params);
    let mut mode = desired.mode;

    let mut next = match (heading.normalize(), desired.heading) {
        (_, None) => {
            mode = SteerMode::Hold;
            heading.normalize().unwrap_or(Vec2::NORTH)
        }
        (None, Some(d)) => d,
        (Some(h), Some(d)) => {
            let tolerance = match mode {
                SteerMode::Avoid => params.repulsion_angle,
                SteerMode::Cohere | SteerMode::Hold => params.attraction_angle,
            };
            match h.angle_between_degrees(d) {
                Some(angle) if angle <= tolerance => d,
                Some(_) => h.turn_toward(d, params.turn_step),
                None => d,
            }
        }
    };

    let noise = params.noise_angle;
    if noise.is_finite() && noise > 0.0 {
        let turn = if rng.random_bool(0.5) { noise } else { -noise };
        next = next.rotate_degrees(turn);
    }

    Steering {
        heading: next.normalize().unwrap_or(Vec2::NORTH),
        mode,
        repelling: desired.repelling,
        aligning: desired.aligning,
        attracting: desired.attracting,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn params() -> SteerParams {
        SteerParams {
            zones: Zones::new(5.0, 10.0, 20.0),
            repulsion_tolerance: 1.0,
            repulsion_angle: 360.0,
            attraction_angle: 360.0,
            turn_step: 10.0,
            noise_angle: 0.0,
        }
    }

    fn mate(x: f64, y: f64, heading: Vec2) -> GroupMate {
        let offset = Vec2::new(x, y);
        GroupMate {
            offset,
            distance: offset.length(),
            heading,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn outer_radii_never_inside_repulsion() {
        let z = Zones::new(30.0, 20.0, 10.0);
        assert!(z.alignment >= z.repulsion && z.attraction >= z.repulsion);
        assert_eq!(Zones::new(-1.0, 5.0, 5.0).repulsion, 0.0);
    }

    #[test]
    fn zone_bands() {
        let z = Zones::new(5.0, 10.0, 20.0);
        assert!(z.repels(1.0) && !z.aligns(1.0) && !z.attracts(1.0));
        assert!(z.aligns(5.0) && z.attracts(5.0));
        assert!(!z.aligns(10.0) && z.attracts(10.0));
        assert!(z.attracts(20.0));
        assert!(!z.attracts(20.5) && !z.aligns(20.5));
        assert_eq!(z.query_radius(), 20.0);
    }

    #[test]
    fn attraction_reaches_past_wide_alignment() {
        // Alignment wider than attraction must not swallow the attraction band.
        let z = Zones::new(20.0, 50.0, 30.0);
        assert_eq!(z.query_radius(), 50.0);
        assert!(z.attracts(25.0) && z.aligns(25.0));
        assert!(z.aligns(40.0) && !z.attracts(40.0));
    }

    #[test]
    fn attraction_band_beyond_alignment_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let p = SteerParams {
            zones: Zones::new(20.0, 25.0, 45.0),
            ..params()
        };
        let s = steer(Vec2::NORTH, &[mate(35.0, 0.0, Vec2::NORTH)], &p, &mut rng);
        assert_eq!(s.mode, SteerMode::Cohere);
        assert_eq!((s.aligning, s.attracting), (0, 1));
        assert!(approx(s.heading.x, 1.0));
    }

    #[test]
    fn avoid_points_away() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let s = steer(Vec2::NORTH, &[mate(2.0, 0.0, Vec2::NORTH)], &params(), &mut rng);
        assert_eq!(s.mode, SteerMode::Avoid);
        assert!(approx(s.heading.x, -1.0));
    }

    #[test]
    fn cohere_points_toward_attracting_mate() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let s = steer(Vec2::NORTH, &[mate(15.0, 0.0, Vec2::NORTH)], &params(), &mut rng);
        assert_eq!(s.mode, SteerMode::Cohere);
        assert!(approx(s.heading.x, 1.0));
        assert_eq!(s.attracting, 1);
    }

    #[test]
    fn alignment_follows_mate_heading() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let p = SteerParams {
            zones: Zones::new(5.0, 10.0, 6.0),
            ..params()
        };
        let east = Vec2::new(1.0, 0.0);
        let s = steer(Vec2::NORTH, &[mate(0.0, 7.0, east)], &p, &mut rng);
        assert!(approx(s.heading.x, 1.0));
        assert_eq!((s.aligning, s.attracting), (1, 0));
    }

    #[test]
    fn tolerance_limits_turn() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let p = SteerParams {
            attraction_angle: 5.0,
            ..params()
        };
        let s = steer(Vec2::NORTH, &[mate(15.0, 0.0, Vec2::NORTH)], &p, &mut rng);
        let turned = Vec2::NORTH.angle_between_degrees(s.heading);
        assert!(turned.is_some_and(|a| approx(a, 10.0)));
    }

    #[test]
    fn no_neighbours_keeps_heading() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let s = steer(Vec2::NORTH, &[], &params(), &mut rng);
        assert_eq!(s.mode, SteerMode::Hold);
        assert!(approx(s.heading.y, 1.0));
    }

    #[test]
    fn coincident_neighbour_is_not_nan() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let s = steer(Vec2::NORTH, &[mate(0.0, 0.0, Vec2::NORTH)], &params(), &mut rng);
        assert!(s.heading.x.is_finite() && s.heading.y.is_finite());
        assert!(approx(s.heading.length(), 1.0));
    }

    #[test]
    fn noise_turns_by_full_angle_either_way() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let p = SteerParams {
            noise_angle: 20.0,
            ..params()
        };
        let (mut left, mut right) = (0, 0);
        for _ in 0..100 {
            let s = steer(Vec2::NORTH, &[], &p, &mut rng);
            let a = Vec2::NORTH.angle_between_degrees(s.heading);
            assert!(a.is_some_and(|a| (a - 20.0).abs() < 1e-6));
            if s.heading.x > 0.0 {
                right += 1;
            } else {
                left += 1;
            }
        }
        assert!(left > 0 && right > 0);
    }
}
