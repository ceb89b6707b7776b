//! An in-memory [`StepContext`] for unit tests.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::BTreeMap;

use predation_types::{AgentId, AgentKind, Vec2};
use predation_world::{TorusSpace, WorldError};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{PredatorConfig, PreyConfig};
use crate::context::{PredatorBirth, PreyBirth, StepContext};
use crate::food::Food;
use crate::predator::Predator;
use crate::prey::Prey;
use crate::traits::PreyTraits;

pub(crate) struct MockContext {
    pub world: TorusSpace,
    pub rng: ChaCha8Rng,
    pub prey: BTreeMap<AgentId, Prey>,
    pub predators: BTreeMap<AgentId, Predator>,
    pub food: BTreeMap<AgentId, Food>,
    pub prey_population: usize,
    pub floor: usize,
    pub evolve: bool,
    pub prey_births: Vec<PreyBirth>,
    pub predator_births: Vec<PredatorBirth>,
    pub food_consumed: Vec<AgentId>,
    pub prey_consumed: Vec<AgentId>,
    next_id: u64,
}

impl MockContext {
    pub fn new(size: f64) -> Self {
        Self {
            world: TorusSpace::new(size, size).unwrap(),
            rng: ChaCha8Rng::seed_from_u64(42),
            prey: BTreeMap::new(),
            predators: BTreeMap::new(),
            food: BTreeMap::new(),
            prey_population: 20,
            floor: 10,
            evolve: false,
            prey_births: Vec::new(),
            predator_births: Vec::new(),
            food_consumed: Vec::new(),
            prey_consumed: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_prey(&mut self, pos: Vec2, energy: f64, traits: PreyTraits, cfg: &PreyConfig) -> Prey {
        let id = self.next_id();
        self.world.place(id, AgentKind::Prey, pos).unwrap();
        let prey = Prey::new(id, pos, Vec2::NORTH, energy, traits, 0, cfg);
        self.prey.insert(id, prey.clone());
        prey
    }

    pub fn store_prey(&mut self, prey: Prey) {
        self.prey.insert(prey.id, prey);
    }

    pub fn add_predator(&mut self, pos: Vec2, energy: f64, cfg: &PredatorConfig) -> Predator {
        let id = self.next_id();
        self.world.place(id, AgentKind::Predator, pos).unwrap();
        let predator = Predator::new(id, pos, Vec2::NORTH, energy, cfg.initial_traits.clone(), 0);
        self.predators.insert(id, predator.clone());
        predator
    }

    pub fn add_food(&mut self, pos: Vec2, energy_value: f64) -> AgentId {
        let id = self.next_id();
        self.world.place(id, AgentKind::Food, pos).unwrap();
        self.food.insert(id, Food::new(id, pos, energy_value));
        id
    }
}

impl StepContext for MockContext {
    fn world(&self) -> &TorusSpace {
        &self.world
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn prey(&self, id: AgentId) -> Option<&Prey> {
        self.prey.get(&id)
    }

    fn predator(&self, id: AgentId) -> Option<&Predator> {
        self.predators.get(&id)
    }

    fn food(&self, id: AgentId) -> Option<&Food> {
        self.food.get(&id)
    }

    fn num_prey(&self) -> usize {
        self.prey_population
    }

    fn num_predators(&self) -> usize {
        self.predators.len()
    }

    fn prey_ids(&self) -> Vec<AgentId> {
        self.prey.keys().copied().collect()
    }

    fn predator_ids(&self) -> Vec<AgentId> {
        self.predators.keys().copied().collect()
    }

    fn evolution_enabled(&self) -> bool {
        self.evolve
    }

    fn reproduction_floor(&self) -> usize {
        self.floor
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

    fn consume_food(&mut self, food: AgentId, _eater: AgentId) -> Option<f64> {
        let gain = self.food.get_mut(&food)?.consume()?;
        self.world.remove(food);
        self.food_consumed.push(food);
        Some(gain)
    }

    fn consume_prey(&mut self, prey: AgentId, _predator: AgentId) -> Option<f64> {
        let gain = self.prey.get_mut(&prey)?.kill()?;
        self.world.remove(prey);
        self.prey_consumed.push(prey);
        Some(gain)
    }
}
