//! The model: agent registry, spatial index, and the services agents use.
//!
//! [`Model`] owns every agent and the [`TorusSpace`] they live in. During a
//! tick each agent is taken out of the registry and stepped against the
//! model through the [`StepContext`] trait; births it requests are queued
//! until the pass ends, and prey or food consumed by another agent are
//! marked dead, pulled from the spatial index at once, and swept from the
//! registry after the pass. The model holds the run's single seeded random
//! stream, so a fixed seed reproduces a run exactly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use predation_agents::{
    Agent, Food, Predator, PredatorBirth, PredatorTraits, Prey, PreyBirth, PreyTraits,
    SpeciesConfig, StepContext,
};
use predation_types::{AgentId, AgentKind, DeathCause, Vec2};
use predation_world::{TorusSpace, WorldError};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::SimClock;
use crate::collector::{DataCollector, EventTally, OverviewRow, TickRecord};
use crate::config::SimulationConfig;
use crate::population::PopulationTracker;

/// Errors that can occur while building or updating the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A spatial operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// No agent ids are left to allocate.
    #[error("agent id space exhausted")]
    IdExhausted,
}

/// A successful kill, logged with the predation risk it added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredationEvent {
    /// Tick of the kill.
    pub tick: u64,
    /// The predator that ate.
    pub predator: AgentId,
    /// The prey that was eaten.
    pub prey: AgentId,
    /// Energy transferred from the prey.
    pub energy: f64,
    /// Live predators at the time of the kill, added to the model's risk.
    pub risk_increment: f64,
}

/// The simulation model.
#[derive(Debug)]
pub struct Model {
    pub(crate) clock: SimClock,
    world: TorusSpace,
    pub(crate) agents: BTreeMap<AgentId, Agent>,
    pub(crate) rng: ChaCha8Rng,
    species: Arc<SpeciesConfig>,
    evolve: bool,
    reproduction_floor: usize,
    next_id: AgentId,
    population: PopulationTracker,
    prey_births: Vec<PreyBirth>,
    predator_births: Vec<PredatorBirth>,
    removals: BTreeSet<AgentId>,
    predation_risk: f64,
    tally: EventTally,
    predation_events: Vec<PredationEvent>,
    collector: DataCollector,
}

impl Model {
    /// Build a model with no agents.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::World`] if the configured dimensions are invalid.
    pub fn empty(config: &SimulationConfig) -> Result<Self, ModelError> {
        let world = TorusSpace::new(config.world.width, config.world.height)?;
        Ok(Self {
            clock: SimClock::new(),
            world,
            agents: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.world.seed),
            species: Arc::new(config.species()),
            evolve: config.scenario.evolve,
            reproduction_floor: usize::try_from(config.population.reproduction_floor)
                .unwrap_or(usize::MAX),
            next_id: AgentId::new(1),
            population: PopulationTracker::new(),
            prey_births: Vec::new(),
            predator_births: Vec::new(),
            removals: BTreeSet::new(),
            predation_risk: 0.0,
            tally: EventTally::default(),
            predation_events: Vec::new(),
            collector: DataCollector::new(),
        })
    }

    /// Build a model and seed food, prey, and predators at random positions.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the world cannot be built or an agent
    /// cannot be placed.
    pub fn new(config: &SimulationConfig) -> Result<Self, ModelError> {
        let mut model = Self::empty(config)?;

        let food = food_count(model.world.area(), config.population.food_density);
        for _ in 0..food {
            let pos = model.world.random_position(&mut model.rng);
            model.spawn_food_at(pos)?;
        }

        for _ in 0..config.population.initial_prey {
            let pos = model.world.random_position(&mut model.rng);
            let heading = random_heading(&mut model.rng);
            let traits = PreyTraits::sample_initial(&mut model.rng);
            let energy = model.species.prey.initial_energy;
            model.insert_prey(pos, heading, energy, traits, 0)?;
        }

        for _ in 0..config.population.initial_predators {
            let pos = model.world.random_position(&mut model.rng);
            let heading = random_heading(&mut model.rng);
            let traits = model.species.predator.initial_traits.clone();
            let energy = model.species.predator.initial_energy;
            model.insert_predator(pos, heading, energy, traits, 0)?;
        }

        model.refresh_population();
        info!(
            seed = config.world.seed,
            width = config.world.width,
            height = config.world.height,
            prey = model.population.count(AgentKind::Prey),
            predators = model.population.count(AgentKind::Predator),
            food = model.population.count(AgentKind::Food),
            evolve = model.evolve,
            attack_distance = model.species.predator.attack_distance,
            "Model initialized"
        );
        Ok(model)
    }

    fn allocate_id(&mut self) -> Result<AgentId, ModelError> {
        let id = self.next_id;
        self.next_id = id.checked_next().ok_or(ModelError::IdExhausted)?;
        Ok(id)
    }

    fn insert_prey(
        &mut self,
        position: Vec2,
        heading: Vec2,
        energy: f64,
        traits: PreyTraits,
        generation: u32,
    ) -> Result<AgentId, ModelError> {
        let id = self.allocate_id()?;
        let position = self.world.place(id, AgentKind::Prey, position)?;
        let prey = Prey::new(id, position, heading, energy, traits, generation, &self.species.prey);
        self.agents.insert(id, Agent::Prey(prey));
        self.population.record_birth(AgentKind::Prey);
        Ok(id)
    }

    fn insert_predator(
        &mut self,
        position: Vec2,
        heading: Vec2,
        energy: f64,
        traits: PredatorTraits,
        generation: u32,
    ) -> Result<AgentId, ModelError> {
        let id = self.allocate_id()?;
        let position = self.world.place(id, AgentKind::Predator, position)?;
        let predator = Predator::new(id, position, heading, energy, traits, generation);
        self.agents.insert(id, Agent::Predator(predator));
        self.population.record_birth(AgentKind::Predator);
        Ok(id)
    }

    /// Add a prey with default traits and the configured initial energy.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the prey cannot be placed.
    pub fn spawn_prey_at(&mut self, position: Vec2) -> Result<AgentId, ModelError> {
        self.spawn_prey_with(position, PreyTraits::default())
    }

    /// Add a prey with the given traits, facing north.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the prey cannot be placed.
    pub fn spawn_prey_with(&mut self, position: Vec2, traits: PreyTraits) -> Result<AgentId, ModelError> {
        let energy = self.species.prey.initial_energy;
        self.insert_prey(position, Vec2::NORTH, energy, traits, 0)
    }

    /// Add a predator with the configured initial traits and energy.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the predator cannot be placed.
    pub fn spawn_predator_at(&mut self, position: Vec2) -> Result<AgentId, ModelError> {
        let traits = self.species.predator.initial_traits.clone();
        let energy = self.species.predator.initial_energy;
        self.insert_predator(position, Vec2::NORTH, energy, traits, 0)
    }

    /// Add a food item with the configured energy value.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the item cannot be placed.
    pub fn spawn_food_at(&mut self, position: Vec2) -> Result<AgentId, ModelError> {
        let id = self.allocate_id()?;
        let position = self.world.place(id, AgentKind::Food, position)?;
        let food = Food::new(id, position, self.species.food.energy_value);
        self.agents.insert(id, Agent::Food(food));
        self.population.record_birth(AgentKind::Food);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Ticks completed.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The spatial index.
    pub const fn space(&self) -> &TorusSpace {
        &self.world
    }

    /// Species parameters in effect.
    pub fn species(&self) -> &SpeciesConfig {
        &self.species
    }

    /// A shared handle to the species parameters, held across a tick.
    pub(crate) fn species_handle(&self) -> Arc<SpeciesConfig> {
        Arc::clone(&self.species)
    }

    /// Whether evolution is enabled for this run.
    pub const fn evolves(&self) -> bool {
        self.evolve
    }

    /// Per-kind population.
    pub const fn population(&self) -> &PopulationTracker {
        &self.population
    }

    /// Predation risk accumulated over the run.
    pub const fn predation_risk(&self) -> f64 {
        self.predation_risk
    }

    /// Event totals over the run.
    pub const fn tally(&self) -> EventTally {
        self.tally
    }

    /// Every kill so far, in order.
    pub fn predation_events(&self) -> &[PredationEvent] {
        &self.predation_events
    }

    /// The per-tick samples.
    pub const fn collector(&self) -> &DataCollector {
        &self.collector
    }

    /// The averaged-per-tick overview series used by batch runs.
    pub fn global_overview(&self) -> Vec<OverviewRow> {
        self.collector.overview()
    }

    /// An agent record, dead or alive.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Every registered agent in ascending id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Live prey in ascending id order.
    pub fn live_prey(&self) -> impl Iterator<Item = &Prey> {
        self.agents
            .values()
            .filter_map(Agent::as_prey)
            .filter(|p| p.is_alive())
    }

    /// Live predators in ascending id order.
    pub fn live_predators(&self) -> impl Iterator<Item = &Predator> {
        self.agents
            .values()
            .filter_map(Agent::as_predator)
            .filter(|p| p.is_alive())
    }

    /// Mutable access to a prey record.
    pub fn prey_mut(&mut self, id: AgentId) -> Option<&mut Prey> {
        self.agents.get_mut(&id).and_then(Agent::as_prey_mut)
    }

    /// Mutable access to a predator record.
    pub fn predator_mut(&mut self, id: AgentId) -> Option<&mut Predator> {
        self.agents.get_mut(&id).and_then(Agent::as_predator_mut)
    }

    /// Agents consumed this tick and not yet swept.
    pub const fn pending_removals(&self) -> &BTreeSet<AgentId> {
        &self.removals
    }

    // -----------------------------------------------------------------------
    // Tick phases
    // -----------------------------------------------------------------------

    /// Sample the model into the collector.
    pub fn collect(&mut self) {
        let record = TickRecord::sample(self);
        self.collector.push(record);
    }

    /// Recount the population from the registry.
    pub fn refresh_population(&mut self) {
        self.population.refresh(&self.agents);
    }

    /// Live agents that act each tick, ascending.
    pub(crate) fn active_ids(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|(_, a)| a.is_active() && a.is_alive())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop an agent that died on its own step.
    pub(crate) fn bury(&mut self, agent: &Agent, cause: DeathCause) {
        self.world.remove(agent.id());
        self.population.record_death(agent.kind());
        self.tally.record_death(cause);
    }

    /// Insert every birth requested during the pass.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if a newborn cannot be placed.
    pub(crate) fn flush_births(&mut self) -> Result<usize, ModelError> {
        let tick = self.clock.tick();
        let prey = std::mem::take(&mut self.prey_births);
        let predators = std::mem::take(&mut self.predator_births);
        let born = prey.len().saturating_add(predators.len());

        for birth in prey {
            let id = self.insert_prey(
                birth.position,
                birth.heading,
                birth.energy,
                birth.traits,
                birth.generation,
            )?;
            if birth.forced {
                self.tally.forced_births = self.tally.forced_births.saturating_add(1);
            } else {
                self.tally.prey_births = self.tally.prey_births.saturating_add(1);
            }
            debug!(tick, agent_id = %id, parent = ?birth.parent, forced = birth.forced, "Prey born");
        }

        for birth in predators {
            let id = self.insert_predator(
                birth.position,
                birth.heading,
                birth.energy,
                birth.traits,
                birth.generation,
            )?;
            self.tally.predator_births = self.tally.predator_births.saturating_add(1);
            debug!(tick, agent_id = %id, parent = ?birth.parent, "Predator born");
        }
        Ok(born)
    }

    /// Remove every consumed agent from the registry.
    pub(crate) fn sweep_removals(&mut self) -> usize {
        let removals = std::mem::take(&mut self.removals);
        for id in &removals {
            self.agents.remove(id);
            self.world.remove(*id);
        }
        removals.len()
    }
}

impl StepContext for Model {
    fn world(&self) -> &TorusSpace {
        &self.world
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn prey(&self, id: AgentId) -> Option<&Prey> {
        self.agents.get(&id).and_then(Agent::as_prey)
    }

    fn predator(&self, id: AgentId) -> Option<&Predator> {
        self.agents.get(&id).and_then(Agent::as_predator)
    }

    fn food(&self, id: AgentId) -> Option<&Food> {
        self.agents.get(&id).and_then(Agent::as_food)
    }

    fn num_prey(&self) -> usize {
        self.population.count(AgentKind::Prey)
    }

    fn num_predators(&self) -> usize {
        self.population.count(AgentKind::Predator)
    }

    fn prey_ids(&self) -> Vec<AgentId> {
        self.population.ids(AgentKind::Prey).to_vec()
    }

    fn predator_ids(&self) -> Vec<AgentId> {
        self.population.ids(AgentKind::Predator).to_vec()
    }

    fn evolution_enabled(&self) -> bool {
        self.evolve
    }

    fn reproduction_floor(&self) -> usize {
        self.reproduction_floor
    }

    fn relocate(&mut self, id: AgentId, position: Vec2) -> Result<Vec2, WorldError> {
        self.world.move_to(id, position)
    }

    fn request_prey_birth(&mut self, birth: PreyBirth) {
        self.prey_births.push(birth);
    }

    fn request_predator_birth(&mut self, birth: PredatorBirth) {
        self.predator_births.push(birth);
    }

    fn consume_food(&mut self, food: AgentId, eater: AgentId) -> Option<f64> {
        let gain = self.agents.get_mut(&food)?.as_food_mut()?.consume()?;
        self.world.remove(food);
        self.removals.insert(food);
        self.population.record_death(AgentKind::Food);
        self.tally.food_eaten = self.tally.food_eaten.saturating_add(1);
        debug!(tick = self.clock.tick(), food = %food, eater = %eater, "Food eaten");
        Some(gain)
    }

    fn consume_prey(&mut self, prey: AgentId, predator: AgentId) -> Option<f64> {
        let energy = self.agents.get_mut(&prey)?.as_prey_mut()?.kill()?;
        self.world.remove(prey);
        self.removals.insert(prey);
        self.population.record_death(AgentKind::Prey);
        self.tally.record_death(DeathCause::Predation);

        let risk_increment = self.population.count(AgentKind::Predator) as f64;
        self.predation_risk += risk_increment;
        let tick = self.clock.tick();
        self.predation_events.push(PredationEvent {
            tick,
            predator,
            prey,
            energy,
            risk_increment,
        });
        debug!(tick, predator = %predator, prey = %prey, energy, risk_increment, "Prey eaten");
        Some(energy)
    }
}

/// Number of food items for an area and density.
// Non-negative and clamped to the u64 range before the cast.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn food_count(area: f64, density: f64) -> u64 {
    let items = (area * density).floor();
    if !items.is_finite() || items <= 0.0 {
        return 0;
    }
    items.min(u64::MAX as f64) as u64
}

fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle_degrees(rng.random_range(0.0..360.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.population.initial_prey = 8;
        config.population.initial_predators = 2;
        config.population.food_density = 0.01;
        config
    }

    #[test]
    fn new_seeds_every_population() {
        let model = Model::new(&config()).unwrap();
        assert_eq!(model.population().count(AgentKind::Prey), 8);
        assert_eq!(model.population().count(AgentKind::Predator), 2);
        assert_eq!(model.population().count(AgentKind::Food), 100);
        assert_eq!(model.space().len(), 110);
    }

    #[test]
    fn seeding_is_reproducible() {
        let a = Model::new(&config()).unwrap();
        let b = Model::new(&config()).unwrap();
        let pa: Vec<Vec2> = a.agents().map(Agent::position).collect();
        let pb: Vec<Vec2> = b.agents().map(Agent::position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut model = Model::empty(&config()).unwrap();
        let a = model.spawn_food_at(Vec2::new(1.0, 1.0)).unwrap();
        let b = model.spawn_prey_at(Vec2::new(2.0, 2.0)).unwrap();
        let c = model.spawn_predator_at(Vec2::new(3.0, 3.0)).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn spawn_wraps_position() {
        let mut model = Model::empty(&config()).unwrap();
        let id = model.spawn_prey_at(Vec2::new(105.0, -5.0)).unwrap();
        let pos = model.agent(id).unwrap().position();
        assert!((pos.x - 5.0).abs() < 1e-9);
        assert!((pos.y - 95.0).abs() < 1e-9);
    }

    #[test]
    fn food_is_consumed_once() {
        let mut model = Model::empty(&config()).unwrap();
        let food = model.spawn_food_at(Vec2::new(10.0, 10.0)).unwrap();
        let a = model.spawn_prey_at(Vec2::new(10.0, 10.5)).unwrap();
        let b = model.spawn_prey_at(Vec2::new(10.5, 10.0)).unwrap();

        assert_eq!(model.consume_food(food, a), Some(2.0));
        assert_eq!(model.consume_food(food, b), None);
        assert_eq!(model.pending_removals().len(), 1);
        assert!(!model.space().contains(food));
        assert_eq!(model.tally().food_eaten, 1);
        assert_eq!(model.population().count(AgentKind::Food), 0);

        assert_eq!(model.sweep_removals(), 1);
        assert!(model.agent(food).is_none());
        assert_eq!(model.consume_food(food, a), None);
    }

    #[test]
    fn prey_is_killed_once_and_risk_grows_by_predator_count() {
        let mut model = Model::empty(&config()).unwrap();
        let prey = model.spawn_prey_at(Vec2::new(10.0, 10.0)).unwrap();
        let p1 = model.spawn_predator_at(Vec2::new(12.0, 10.0)).unwrap();
        let p2 = model.spawn_predator_at(Vec2::new(8.0, 10.0)).unwrap();
        model.spawn_predator_at(Vec2::new(80.0, 80.0)).unwrap();

        let energy = model.species().prey.initial_energy;
        assert_eq!(model.consume_prey(prey, p1), Some(energy));
        assert_eq!(model.consume_prey(prey, p2), None);
        assert_eq!(model.predation_risk(), 3.0);
        assert_eq!(model.predation_events().len(), 1);
        assert_eq!(model.tally().kills, 1);
        assert_eq!(model.num_prey(), 0);
    }

    #[test]
    fn births_are_deferred_until_flush() {
        let mut model = Model::empty(&config()).unwrap();
        model.request_prey_birth(PreyBirth {
            parent: None,
            position: Vec2::new(4.0, 4.0),
            heading: Vec2::NORTH,
            energy: 50.0,
            traits: PreyTraits::default(),
            generation: 1,
            forced: true,
        });
        assert_eq!(model.num_prey(), 0);
        assert_eq!(model.flush_births().unwrap(), 1);
        assert_eq!(model.num_prey(), 1);
        assert_eq!(model.tally().forced_births, 1);
        let prey = model.live_prey().next().unwrap();
        assert_eq!(prey.generation, 1);
        assert_eq!(prey.energy, 50.0);
    }

    #[test]
    fn predation_event_serializes_flat() {
        let event = PredationEvent {
            tick: 12,
            predator: AgentId::new(3),
            prey: AgentId::new(9),
            energy: 250.0,
            risk_increment: 2.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["predator"], 3);
        assert_eq!(json["prey"], 9);
        assert_eq!(json["risk_increment"], 2.0);
        let back: PredationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn food_count_handles_degenerate_input() {
        assert_eq!(food_count(100.0, 0.535), 53);
        assert_eq!(food_count(100.0, -1.0), 0);
        assert_eq!(food_count(f64::NAN, 1.0), 0);
    }
}
