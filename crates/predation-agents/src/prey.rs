//! The prey state machine.
//!
//! Each tick a prey, in order of precedence:
//!
//! 1. ages and pays its metabolic cost, dying if starved or too old;
//! 2. counts down its safe cooldown, reproducing or force-breeding while
//!    the cooldown is active;
//! 3. counts down its current action, falling back to `Nothing` when the
//!    action has run its course;
//! 4. flees if a predator was detected on its last scan;
//! 5. checks its group: counts neighbours, blends headings, and catches
//!    the alarm of freshly fleeing neighbours;
//! 6. performs the action for its current state.
//!
//! Entering an action sets its duration in ticks; the action then runs
//! once per tick until the duration is spent.

use core::f64::consts::PI;

use predation_types::{AgentId, AgentKind, DeathCause, PreyState, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::PreyConfig;
use crate::context::{PreyBirth, StepContext, StepOutcome};
use crate::death;
use crate::error::AgentError;
use crate::grouping::{self, SteerParams, Zones};
use crate::mutation;
use crate::traits::PreyTraits;

/// Whether a prey has a food target, and where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodTarget {
    /// No live target.
    None,
    /// A target within reach.
    InReach,
    /// A target further away.
    Distant,
}

/// Choose the next action of an idle prey.
///
/// `r` is a uniform draw in `[0, 1)` shared by every branch.
pub fn select_next_action(r: f64, traits: &PreyTraits, previous: PreyState, food: FoodTarget) -> PreyState {
    if r < traits.vigilance {
        return PreyState::Scanning;
    }
    match food {
        FoodTarget::InReach => return PreyState::Eating,
        FoodTarget::Distant => return PreyState::MoveToFood,
        FoodTarget::None => {}
    }
    let (p, stay) = match previous {
        PreyState::Moving => (traits.move_persistence, PreyState::Moving),
        PreyState::Fleeing => return PreyState::Scanning,
        PreyState::FoodScan => (traits.scan_after_scan, PreyState::FoodScan),
        PreyState::MoveToFood => (traits.scan_after_move_to_food, PreyState::FoodScan),
        PreyState::Eating | PreyState::Scanning | PreyState::Nothing | PreyState::Dead => {
            (traits.scan_after_eat, PreyState::FoodScan)
        }
    };
    if r < p {
        stay
    } else if stay == PreyState::Moving {
        PreyState::FoodScan
    } else {
        PreyState::Moving
    }
}

/// Probability that a scanning prey detects a predator at `distance`.
///
/// Follows `h^N / (d^N h^N) * (pi / av) * (tv / t_min)`; a predator at
/// distance zero is always detected and a zero field of view sees nothing.
pub fn detection_probability(distance: f64, traits: &PreyTraits, cfg: &PreyConfig) -> f64 {
    if distance <= 0.0 {
        return f64::INFINITY;
    }
    if traits.scan_angle <= 0.0 {
        return 0.0;
    }
    let h_n = cfg.detection_half_distance.powi(cfg.detection_exponent);
    let d_n = distance.powi(cfg.detection_exponent);
    let mut curve = h_n / (d_n * h_n);
    if !curve.is_finite() {
        curve = d_n.recip();
    }
    let time = if cfg.min_scan_time > 0.0 {
        traits.scan_duration / cfg.min_scan_time
    } else {
        traits.scan_duration
    };
    curve * (PI / traits.scan_angle) * time
}

/// Probability threshold for a forced birth: `(own / neighbours)^5`.
///
/// A draw above the threshold produces the birth. Without neighbour
/// energy the threshold is zero.
pub fn forced_birth_threshold(own_energy: f64, neighbour_energy: f64) -> f64 {
    if neighbour_energy <= 0.0 || !neighbour_energy.is_finite() {
        return 0.0;
    }
    (own_energy / neighbour_energy).powi(5)
}

/// Whole ticks an action of `duration` lasts; at least one.
fn ticks_for(duration: f64) -> f64 {
    if duration.is_finite() {
        duration.ceil().max(1.0)
    } else {
        1.0
    }
}

/// A prey animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prey {
    /// Unique id.
    pub id: AgentId,
    /// Position on the torus.
    pub position: Vec2,
    /// Unit heading.
    pub heading: Vec2,
    /// Current energy, never above the configured maximum after eating.
    pub energy: f64,
    /// Age in ticks.
    pub age: u64,
    /// Generation number; seeded prey are generation 0.
    pub generation: u32,
    /// Current state.
    pub state: PreyState,
    /// State archived when the last action ended.
    pub previous_state: PreyState,
    /// Ticks left in the current action.
    pub action_time_remaining: f64,
    /// Inside the post-flight safe cooldown.
    pub is_safe: bool,
    /// Ticks left in the safe cooldown.
    pub waiting_time: u32,
    /// Predator detected on the last scan, if any.
    pub detected_predator: Option<AgentId>,
    /// Targeted food item, if any.
    pub food_target: Option<AgentId>,
    /// Prey neighbours counted on the last group check.
    pub neighbours_in_zone: usize,
    /// Heritable parameters.
    pub traits: PreyTraits,
}

impl Prey {
    /// Create a prey in the `Nothing` state.
    pub fn new(
        id: AgentId,
        position: Vec2,
        heading: Vec2,
        energy: f64,
        traits: PreyTraits,
        generation: u32,
        cfg: &PreyConfig,
    ) -> Self {
        Self {
            id,
            position,
            heading: heading.normalize().unwrap_or(Vec2::NORTH),
            energy,
            age: 0,
            generation,
            state: PreyState::Nothing,
            previous_state: PreyState::Nothing,
            action_time_remaining: 0.0,
            is_safe: cfg.initially_safe,
            waiting_time: cfg.waiting_time,
            detected_predator: None,
            food_target: None,
            neighbours_in_zone: 0,
            traits,
        }
    }

    /// Whether the prey is still in the simulation.
    pub fn is_alive(&self) -> bool {
        self.state != PreyState::Dead
    }

    /// Whether the prey is currently vigilant.
    pub fn is_scanning(&self) -> bool {
        self.state == PreyState::Scanning
    }

    /// Mark the prey killed by a predator, returning its energy once.
    pub fn kill(&mut self) -> Option<f64> {
        if !self.is_alive() {
            return None;
        }
        self.state = PreyState::Dead;
        Some(self.energy)
    }

    /// Advance the prey by one tick.
    ///
    /// # Errors
    ///
    /// Returns an [`AgentError`] if a spatial operation fails or a
    /// neighbour has no registry record. The prey may have partially acted.
    pub fn step<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<StepOutcome, AgentError> {
        if !self.is_alive() {
            return Ok(StepOutcome::Inactive);
        }
        self.age = self.age.saturating_add(1);
        self.energy -= cfg.metabolism;
        if let Some(cause) = death::check_death(self.energy, cfg.min_energy, self.age, cfg.max_age) {
            return Ok(self.die(cause));
        }
        if ctx.evolution_enabled() && death::roll_random_death(cfg.death_rate, ctx.rng()) {
            return Ok(self.die(DeathCause::Random));
        }

        self.update_cooldown(cfg, ctx)?;

        self.action_time_remaining -= 1.0;
        if self.action_time_remaining < 0.0 {
            self.previous_state = self.state;
            self.state = PreyState::Nothing;
        }

        if self.detected_predator.is_some() {
            self.state = PreyState::Fleeing;
            self.flee(cfg);
            self.group_move(cfg, ctx)?;
        }

        self.check_group(cfg, ctx)?;
        self.dispatch(cfg, ctx)?;
        Ok(StepOutcome::Alive)
    }

    fn die(&mut self, cause: DeathCause) -> StepOutcome {
        debug!(agent_id = %self.id, cause = %cause, age = self.age, "prey died");
        self.state = PreyState::Dead;
        StepOutcome::Died(cause)
    }

    fn update_cooldown<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        if !self.is_safe {
            return Ok(());
        }
        self.waiting_time = self.waiting_time.saturating_sub(1);
        if self.waiting_time == 0 {
            self.is_safe = false;
            self.waiting_time = cfg.waiting_time;
            self.state = PreyState::Nothing;
            return Ok(());
        }

        let population = ctx.num_prey();
        let floor = ctx.reproduction_floor();
        if population > floor && self.energy >= cfg.max_energy {
            self.reproduce(cfg, ctx);
        } else if population < floor {
            self.force_birth(cfg, ctx)?;
        }
        Ok(())
    }

    fn inherited_traits<C: StepContext + ?Sized>(&self, cfg: &PreyConfig, ctx: &mut C) -> PreyTraits {
        if ctx.evolution_enabled() {
            mutation::mutate(&self.traits, cfg.mutation_rate, ctx.rng()).child
        } else {
            self.traits.clone()
        }
    }

    /// Pay half the maximum energy for one offspring.
    pub fn reproduce<C: StepContext + ?Sized>(&mut self, cfg: &PreyConfig, ctx: &mut C) {
        let half = cfg.max_energy / 2.0;
        self.energy -= half;
        let traits = self.inherited_traits(cfg, ctx);
        debug!(agent_id = %self.id, energy = self.energy, "prey reproduced");
        ctx.request_prey_birth(PreyBirth {
            parent: Some(self.id),
            position: self.position,
            heading: self.heading,
            energy: half,
            traits,
            generation: self.generation.saturating_add(1),
            forced: false,
        });
    }

    /// Possibly produce an offspring at no cost, weighted by the energy of
    /// the surrounding prey.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingNeighbour`] if a neighbour has no record.
    pub fn force_birth<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let neighbours = ctx.world().neighbours_within(
            self.position,
            cfg.max_neighbour_awareness,
            Some(AgentKind::Prey),
            Some(self.id),
        );
        let mut neighbour_energy = 0.0;
        for n in &neighbours {
            let mate = ctx.prey(n.id).ok_or(AgentError::MissingNeighbour {
                agent: self.id,
                neighbour: n.id,
            })?;
            neighbour_energy += mate.energy;
        }
        let threshold = forced_birth_threshold(self.energy, neighbour_energy);
        if ctx.rng().random::<f64>() <= threshold {
            return Ok(());
        }
        let traits = self.inherited_traits(cfg, ctx);
        debug!(agent_id = %self.id, neighbour_energy, "forced prey birth");
        ctx.request_prey_birth(PreyBirth {
            parent: Some(self.id),
            position: self.position,
            heading: self.heading,
            energy: cfg.max_energy / 2.0,
            traits,
            generation: self.generation.saturating_add(1),
            forced: true,
        });
        Ok(())
    }

    fn flee(&mut self, cfg: &PreyConfig) {
        trace!(agent_id = %self.id, predator = ?self.detected_predator, "prey fleeing");
        self.is_safe = true;
        self.detected_predator = None;
        // Flight stays visible to neighbours through the next tick.
        self.action_time_remaining = (self.action_time_remaining - cfg.reaction_time).max(1.0);
    }

    fn flee_ticks<C: StepContext + ?Sized>(&self, ctx: &mut C) -> f64 {
        ctx.rng().random::<f64>().mul_add(self.traits.flee_duration, 1.0)
    }

    fn steer_params(&self, cfg: &PreyConfig) -> SteerParams {
        SteerParams {
            zones: Zones::new(
                self.traits.repulsion_zone,
                cfg.alignment_zone,
                self.traits.attraction_zone,
            ),
            repulsion_tolerance: self.traits.repulsion_tolerance,
            repulsion_angle: self.traits.repulsion_angle,
            attraction_angle: self.traits.attraction_angle,
            turn_step: cfg.turn_step,
            noise_angle: self.traits.move_angle,
        }
    }

    fn group_move<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let params = self.steer_params(cfg);
        let mates = ctx
            .group_mates(self.position, params.zones.query_radius(), AgentKind::Prey, self.id)
            .map_err(|neighbour| AgentError::MissingNeighbour {
                agent: self.id,
                neighbour,
            })?;
        let steering = grouping::steer(self.heading, &mates, &params, ctx.rng());
        self.heading = steering.heading;
        let target = self.position.add(self.heading.scale(self.traits.move_distance));
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

    fn check_group<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let neighbours = ctx.world().neighbours_within(
            self.position,
            cfg.max_neighbour_awareness,
            Some(AgentKind::Prey),
            Some(self.id),
        );
        self.neighbours_in_zone = neighbours.len();

        let mut heading = self.heading;
        let mut alarm = false;
        for n in &neighbours {
            let mate = ctx.prey(n.id).ok_or(AgentError::MissingNeighbour {
                agent: self.id,
                neighbour: n.id,
            })?;
            heading = heading.add(mate.heading).scale(0.5);
            alarm |= mate.state == PreyState::Fleeing;
        }
        if let Some(h) = heading.normalize() {
            self.heading = h;
        }

        if alarm && !self.is_safe {
            self.state = PreyState::Fleeing;
            self.action_time_remaining = self.flee_ticks(ctx);
            self.flee(cfg);
            self.group_move(cfg, ctx)?;
        }
        Ok(())
    }

    fn dispatch<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        match self.state {
            PreyState::Moving => self.group_move(cfg, ctx),
            PreyState::FoodScan => self.food_scan(cfg, ctx),
            PreyState::MoveToFood => self.move_to_food(cfg, ctx),
            PreyState::Eating => {
                self.eat(cfg, ctx);
                Ok(())
            }
            PreyState::Scanning => {
                self.scan(cfg, ctx);
                Ok(())
            }
            PreyState::Fleeing => {
                if !self.is_safe {
                    self.flee(cfg);
                    self.group_move(cfg, ctx)?;
                }
                Ok(())
            }
            PreyState::Nothing => {
                self.choose_action(cfg, ctx);
                Ok(())
            }
            PreyState::Dead => Ok(()),
        }
    }

    /// Distance to the current food target, clearing a stale target.
    fn food_distance<C: StepContext + ?Sized>(&mut self, ctx: &C) -> Option<f64> {
        let food = self
            .food_target
            .and_then(|id| ctx.food(id))
            .filter(|f| !f.eaten);
        match food {
            Some(f) => Some(ctx.world().distance(self.position, f.position)),
            None => {
                self.food_target = None;
                None
            }
        }
    }

    fn step_length(&self, cfg: &PreyConfig) -> f64 {
        self.traits.move_distance.max(cfg.reach)
    }

    fn choose_action<C: StepContext + ?Sized>(&mut self, cfg: &PreyConfig, ctx: &mut C) {
        let distance = self.food_distance(ctx);
        let food = match distance {
            None => FoodTarget::None,
            Some(d) if d <= cfg.reach => FoodTarget::InReach,
            Some(_) => FoodTarget::Distant,
        };
        let r = ctx.rng().random::<f64>();
        let next = select_next_action(r, &self.traits, self.previous_state, food);
        self.state = next;
        self.action_time_remaining = match next {
            PreyState::Moving => ticks_for(self.traits.move_distance * self.traits.move_duration),
            PreyState::FoodScan => ticks_for(cfg.food_scan_duration),
            PreyState::MoveToFood => {
                ticks_for(distance.unwrap_or(0.0) / self.step_length(cfg))
            }
            PreyState::Scanning => ticks_for(self.traits.scan_duration),
            PreyState::Eating
            | PreyState::Fleeing
            | PreyState::Nothing
            | PreyState::Dead => 1.0,
        };
        trace!(agent_id = %self.id, state = %next, previous = %self.previous_state, "prey chose action");
    }

    fn food_scan<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let found = ctx.closest_of_kind_in_range(
            self.position,
            AgentKind::Food,
            cfg.max_neighbour_awareness,
            None,
        );
        let Some(item) = found else {
            return self.group_move(cfg, ctx);
        };
        self.food_target = Some(item.id);
        if item.distance <= cfg.reach {
            self.state = PreyState::Eating;
            self.action_time_remaining = 1.0;
        } else {
            self.state = PreyState::MoveToFood;
            self.action_time_remaining = ticks_for(item.distance / self.step_length(cfg));
        }
        Ok(())
    }

    fn move_to_food<C: StepContext + ?Sized>(
        &mut self,
        cfg: &PreyConfig,
        ctx: &mut C,
    ) -> Result<(), AgentError> {
        let Some(food) = self
            .food_target
            .and_then(|id| ctx.food(id))
            .filter(|f| !f.eaten)
            .map(|f| f.position)
        else {
            self.food_target = None;
            self.state = PreyState::Nothing;
            return Ok(());
        };

        let offset = ctx.world().delta(self.position, food);
        let distance = offset.length();
        if distance > cfg.reach {
            let step = self.step_length(cfg).min(distance);
            if let Some(direction) = offset.normalize() {
                self.heading = direction;
            }
            let target = self.position.add(self.heading.scale(step));
            self.relocate(ctx, target)?;
            if distance - step > cfg.reach {
                return Ok(());
            }
        }
        self.state = PreyState::Eating;
        self.action_time_remaining = 1.0;
        Ok(())
    }

    fn eat<C: StepContext + ?Sized>(&mut self, cfg: &PreyConfig, ctx: &mut C) {
        let Some(food) = self.food_target.take() else {
            return;
        };
        if let Some(gain) = ctx.consume_food(food, self.id) {
            self.energy = (self.energy + gain).min(cfg.max_energy);
            trace!(agent_id = %self.id, food = %food, energy = self.energy, "prey ate");
        }
    }

    fn scan<C: StepContext + ?Sized>(&mut self, cfg: &PreyConfig, ctx: &mut C) {
        let predators = ctx.world().neighbours_within(
            self.position,
            cfg.max_neighbour_awareness,
            Some(AgentKind::Predator),
            None,
        );
        for p in predators {
            let pd = detection_probability(p.distance, &self.traits, cfg);
            if ctx.rng().random::<f64>() < pd {
                debug!(agent_id = %self.id, predator = %p.id, distance = p.distance, "prey detected predator");
                self.detected_predator = Some(p.id);
                self.action_time_remaining = self.flee_ticks(ctx);
                return;
            }
        }
    }
}
