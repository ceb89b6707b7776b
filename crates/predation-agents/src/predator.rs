//! The predator state machine.
//!
//! Predators cycle `Searching -> Scanning -> Chasing -> Eating ->
//! Searching`. Searching moves with the pack for a fixed number of ticks;
//! scanning looks for the nearest catchable prey; chasing closes in on the
//! target's current position every tick and eats it once within attack
//! distance. A chase is abandoned as soon as the target is gone, dead, or
//! inside its safe cooldown.

use predation_types::{AgentId, AgentKind, DeathCause, PredatorState, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::PredatorConfig;
use crate::context::{PredatorBirth, StepContext, StepOutcome};
use crate::death;
use crate::error::AgentError;
use crate::grouping::{self, SteerParams, Zones};
use crate::mutation;
use crate::traits::PredatorTraits;

/// A predator animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predator {
    /// Unique id.
    pub id: AgentId,
    /// Position on the torus.
    pub position: Vec2,
    /// Unit heading.
    pub heading: Vec2,
    /// Current energy.
    pub energy: f64,
    /// Age in ticks.
    pub age: u64,
    /// Generation number.
    pub generation: u32,
    /// Current state.
    pub state: PredatorState,
    /// Ticks spent in the current state.
    pub activity_time: u32,
    /// Prey being chased or eaten.
    pub target: Option<AgentId>,
    /// Heritable parameters.
    pub traits: PredatorTraits,
}

impl Predator {
    /// Create a searching predator.
    pub fn new(
        id: AgentId,
        position: Vec2,
        heading: Vec2,
        energy: f64,
        traits: PredatorTraits,
        generation: u32,
    ) -> Self {
        Self {
            id,
            position,
            heading: heading.normalize().unwrap_or(Vec2::NORTH),
            energy,
            age: 0,
            generation,
            state: PredatorState::Searching,
            activity_time: 0,
            target: None,
            traits,
        }
    }

    /// Whether the predator is still in the simulation.
    pub fn is_alive(&self) -> bool {
        self.state != PredatorState::Dead
    }

    fn enter(&mut self, state: PredatorState) {
        self.state = state;
        self.activity_time = 0;
    }

    fn die(&mut self, cause: DeathCause) -> StepOutcome {
        debug!(agent_id = %self.id, cause = %cause, age = self.age, "predator died");
        self.state = PredatorState::Dead;
        StepOutcome::Died(cause)
    }

    /// Advance the predator by one tick.
    ///
    /// # Errors
    ///
    /// Returns an [`AgentError`] if a spatial operation fails or a
    /// neighbour has no registry record.
    pub fn step<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PredatorConfig,
        ctx: &mut C,
    ) -> Result<StepOutcome, AgentError> {
        if !self.is_alive() {
            return Ok(StepOutcome::Inactive);
        }

        let evolving = ctx.evolution_enabled();
        if evolving {
            if let Some(cause) = death::check_death(self.energy, cfg.min_energy, self.age, cfg.max_age) {
                return Ok(self.die(cause));
            }
            if death::roll_random_death(cfg.death_rate, ctx.rng()) {
                return Ok(self.die(DeathCause::Random));
            }
            let idle = matches!(self.state, PredatorState::Searching | PredatorState::Scanning);
            if idle && self.energy >= cfg.reproduction_requirement {
                self.reproduce(cfg, ctx);
            }
        }

        match self.state {
            PredatorState::Searching => {
                self.group_move(cfg, ctx)?;
                if self.activity_time >= cfg.search_duration {
                    self.enter(PredatorState::Scanning);
                }
            }
            PredatorState::Scanning => self.scan(cfg, ctx),
            PredatorState::Chasing => self.chase(cfg, ctx)?,
            PredatorState::Eating => self.eat(cfg, ctx),
            PredatorState::Dead => {}
        }

        self.activity_time = self.activity_time.saturating_add(1);
        self.age = self.age.saturating_add(1);
        self.energy -= cfg.energy_cost;
        if self.energy.is_nan() || self.energy <= cfg.min_energy {
            return Ok(self.die(DeathCause::Starvation));
        }
        Ok(StepOutcome::Alive)
    }

    /// Pay the reproduction cost for one offspring with mutated traits.
    pub fn reproduce<C: StepContext + ?Sized>(&mut self, cfg: &PredatorConfig, ctx: &mut C) {
        self.energy -= cfg.reproduction_cost;
        let traits = mutation::mutate(&self.traits, cfg.mutation_rate, ctx.rng()).child;
        debug!(agent_id = %self.id, energy = self.energy, "predator reproduced");
        ctx.request_predator_birth(PredatorBirth {
            parent: Some(self.id),
            position: self.position,
            heading: self.heading,
            energy: cfg.offspring_energy,
            traits,
            generation: self.generation.saturating_add(1),
        });
    }

    fn steer_params(&self, cfg: &PredatorConfig) -> SteerParams {
        SteerParams {
            zones: Zones::new(self.traits.repulsion_zone, cfg.alignment, self.traits.attraction_zone),
            repulsion_tolerance: cfg.repulsion_tolerance,
            repulsion_angle: self.traits.repulsion_angle,
            attraction_angle: self.traits.attraction_angle,
            turn_step: cfg.turn_step,
            noise_angle: self.traits.move_angle,
        }
    }

    fn group_move<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PredatorConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let params = self.steer_params(cfg);
        let radius = params.zones.query_radius().min(cfg.max_neighbour_awareness);
        let mates = ctx
            .group_mates(self.position, radius, AgentKind::Predator, self.id)
            .map_err(|neighbour| AgentError::MissingNeighbour {
                agent: self.id,
                neighbour,
            })?;
        let steering = grouping::steer(self.heading, &mates, &params, ctx.rng());
        self.heading = steering.heading;
        let target = self.position.add(self.heading.scale(cfg.max_speed));
        self.relocate(ctx, target)
    }

    fn relocate<C: StepContext + ?Sized>(&mut self, ctx: &mut C, target: Vec2) -> Result<(), AgentError> {
        self.position = ctx
            .relocate(self.id, target)
            .map_err(|source| AgentError::World {
                agent: self.id,
                source,
            })?;
        Ok(())
    }

    /// Nearest catchable prey in detection range; ties go to the lower id.
    fn nearest_catchable<C: StepContext + ?Sized>(&self, cfg: &PredatorConfig, ctx: &C) -> Option<AgentId> {
        ctx.world()
            .neighbours_within(
                self.position,
                cfg.prey_detection_range,
                Some(AgentKind::Prey),
                None,
            )
            .into_iter()
            .filter(|n| ctx.prey(n.id).is_some_and(|p| p.is_alive() && !p.is_safe))
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)))
            .map(|n| n.id)
    }

    fn scan<C: StepContext + ?Sized>(&mut self, cfg: &PredatorConfig, ctx: &mut C) {
        if let Some(prey) = self.nearest_catchable(cfg, ctx) {
            trace!(agent_id = %self.id, target = %prey, "predator spotted prey");
            self.target = Some(prey);
            self.enter(PredatorState::Chasing);
        } else if self.activity_time >= cfg.scan_duration {
            self.enter(PredatorState::Searching);
        }
    }

    /// The target's position if it can still be caught.
    fn target_position<C: StepContext + ?Sized>(&self, ctx: &C) -> Option<Vec2> {
        let id = self.target?;
        ctx.prey(id)
            .filter(|p| p.is_alive() && !p.is_safe && ctx.world().contains(id))
            .map(|p| p.position)
    }

    fn abandon(&mut self) {
        trace!(agent_id = %self.id, target = ?self.target, "predator abandoned chase");
        self.target = None;
        self.enter(PredatorState::Searching);
    }

    fn chase<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PredatorConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let Some(prey) = self.target_position(ctx) else {
            self.abandon();
            return Ok(());
        };
        let offset = ctx.world().delta(self.position, prey);
        let distance = offset.length();
        if distance > cfg.attack_distance {
            let step = cfg.attack_speed.min(distance);
            if let Some(direction) = offset.normalize() {
                self.heading = direction;
            }
            let target = self.position.add(self.heading.scale(step));
            self.relocate(ctx, target)?;
            if distance - step > cfg.attack_distance {
                return Ok(());
            }
        }
        self.state = PredatorState::Eating;
        self.eat(cfg, ctx);
        Ok(())
    }

    fn eat<C: StepContext + ?Sized>(&mut self, cfg: &PredatorConfig, ctx: &mut C) {
        let Some(prey) = self.target.take() else {
            self.enter(PredatorState::Searching);
            return;
        };
        match ctx.consume_prey(prey, self.id) {
            Some(gain) => {
                self.energy = (self.energy + gain).min(cfg.max_energy);
                debug!(agent_id = %self.id, prey = %prey, energy = self.energy, "predator ate prey");
            }
            None => trace!(agent_id = %self.id, prey = %prey, "prey already taken"),
        }
        self.enter(PredatorState::Searching);
    }
}
