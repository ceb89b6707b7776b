//! Tick cycle: one discrete step of the Predation simulation.
//!
//! Each tick runs through these phases, in order:
//!
//! 1. **Collect** -- sample the model into the data collector before anyone
//!    acts.
//! 2. **Advance** -- move the clock forward one tick.
//! 3. **Act** -- step every live prey and predator once, in an order
//!    shuffled with the model's seeded RNG. Each agent is taken out of the
//!    registry while it acts. An agent that dies on its own step is removed
//!    at once; an agent consumed by another is skipped for the rest of the
//!    pass. A step that fails is logged and the agent is put back as it
//!    stands, so one faulty agent never aborts the tick.
//! 4. **Births** -- insert the offspring requested during the pass. They
//!    first act on the next tick.
//! 5. **Sweep** -- remove consumed prey and food from the registry.
//! 6. **Refresh** -- recount the population.
//!
//! The cycle is deterministic given the model's seed.

use predation_agents::StepOutcome;
use predation_types::AgentKind;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::clock::ClockError;
use crate::collector::EventTally;
use crate::model::{Model, ModelError};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Inserting offspring failed.
    #[error("model error: {source}")]
    Model {
        /// The underlying model error.
        #[from]
        source: ModelError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Live prey at end of tick.
    pub prey: usize,
    /// Live predators at end of tick.
    pub predators: usize,
    /// Uneaten food at end of tick.
    pub food: usize,
    /// Births, deaths, kills, and meals during this tick.
    pub events: EventTally,
    /// Agents inserted from birth requests.
    pub born: usize,
    /// Consumed agents swept from the registry.
    pub swept: usize,
    /// Agents whose step returned an error.
    pub failed_steps: usize,
    /// Predation risk accumulated over the run.
    pub predation_risk: f64,
}

impl TickSummary {
    /// No prey or predators remain.
    pub const fn is_extinct(&self) -> bool {
        self.prey == 0 && self.predators == 0
    }
}

/// Execute a single tick.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if the tick counter overflows or
/// [`TickError::Model`] if an offspring cannot be placed. Failures inside
/// individual agent steps are isolated and counted, never returned.
pub fn run_tick(model: &mut Model) -> Result<TickSummary, TickError> {
    // --- Phase 1: Collect ---
    model.collect();

    // --- Phase 2: Advance ---
    let tick = model.clock.advance()?;
    let before = model.tally();
    let species = model.species_handle();

    // --- Phase 3: Act ---
    let mut order = model.active_ids();
    order.shuffle(&mut model.rng);
    let mut failed_steps = 0_usize;

    for id in order {
        let Some(mut agent) = model.agents.remove(&id) else {
            continue;
        };
        if !agent.is_alive() {
            model.agents.insert(id, agent);
            continue;
        }
        match agent.step(&species, model) {
            Ok(StepOutcome::Died(cause)) => model.bury(&agent, cause),
            Ok(StepOutcome::Alive | StepOutcome::Inactive) => {
                model.agents.insert(id, agent);
            }
            Err(error) => {
                warn!(
                    tick,
                    agent_id = %id,
                    kind = %agent.kind(),
                    error = %error,
                    "Agent step failed, agent kept as is"
                );
                failed_steps = failed_steps.saturating_add(1);
                model.agents.insert(id, agent);
            }
        }
    }

    // --- Phase 4: Births ---
    let born = model.flush_births()?;

    // --- Phase 5: Sweep ---
    let swept = model.sweep_removals();

    // --- Phase 6: Refresh ---
    model.refresh_population();

    let population = model.population();
    let summary = TickSummary {
        tick,
        prey: population.count(AgentKind::Prey),
        predators: population.count(AgentKind::Predator),
        food: population.count(AgentKind::Food),
        events: model.tally().since(&before),
        born,
        swept,
        failed_steps,
        predation_risk: model.predation_risk(),
    };
    debug!(
        tick,
        prey = summary.prey,
        predators = summary.predators,
        food = summary.food,
        born,
        swept,
        kills = summary.events.kills,
        "Tick completed"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use predation_agents::PreyTraits;
    use predation_types::{AgentId, PredatorState, PreyState, Vec2};

    use super::*;
    use crate::config::SimulationConfig;

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.prey.initially_safe = false;
        config
    }

    fn still_traits() -> PreyTraits {
        PreyTraits {
            vigilance: 0.0,
            move_distance: 0.0,
            move_angle: 0.0,
            ..PreyTraits::default()
        }
    }

    #[test]
    fn tick_advances_clock_and_collects_first() {
        let mut model = Model::empty(&config()).unwrap();
        model.spawn_prey_at(Vec2::new(10.0, 10.0)).unwrap();
        let summary = run_tick(&mut model).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(model.collector().records().len(), 1);
        assert_eq!(model.collector().latest().unwrap().tick, 0);
    }

    #[test]
    fn multiple_ticks_run_without_error() {
        let mut model = Model::new(&config()).unwrap();
        for expected in 1..=10 {
            let summary = run_tick(&mut model).unwrap();
            assert_eq!(summary.tick, expected);
            assert_eq!(summary.failed_steps, 0);
        }
    }

    #[test]
    fn starving_prey_is_removed_immediately() {
        let mut model = Model::empty(&config()).unwrap();
        let id = model.spawn_prey_at(Vec2::new(10.0, 10.0)).unwrap();
        model.prey_mut(id).unwrap().energy = 0.5;
        let summary = run_tick(&mut model).unwrap();
        assert_eq!(summary.events.starvation, 1);
        assert_eq!(summary.prey, 0);
        assert!(model.agent(id).is_none());
        assert!(!model.space().contains(id));
    }

    #[test]
    fn predator_eats_adjacent_prey() {
        let mut model = Model::empty(&config()).unwrap();
        let prey = model.spawn_prey_with(Vec2::new(50.0, 50.0), still_traits()).unwrap();
        let predator = model.spawn_predator_at(Vec2::new(52.0, 50.0)).unwrap();
        {
            let p = model.predator_mut(predator).unwrap();
            p.state = PredatorState::Chasing;
            p.target = Some(prey);
            p.energy = 1_000.0;
        }
        let prey_energy = model.species().prey.initial_energy;
        let max = model.species().predator.max_energy;

        let summary = run_tick(&mut model).unwrap();
        assert_eq!(summary.events.kills, 1);
        assert_eq!(summary.swept, 1);
        assert_eq!(summary.prey, 0);
        assert!(model.agent(prey).is_none());
        let cost = model.species().predator.energy_cost;
        let p = model.live_predators().next().unwrap();
        assert_eq!(p.energy, (1_000.0 + prey_energy).min(max) - cost);
        assert_eq!(p.state, PredatorState::Searching);
        assert_eq!(summary.predation_risk, 1.0);
    }

    #[test]
    fn shared_target_is_eaten_once() {
        let mut model = Model::empty(&config()).unwrap();
        let prey = model.spawn_prey_with(Vec2::new(50.0, 50.0), still_traits()).unwrap();
        let hunters = [
            model.spawn_predator_at(Vec2::new(50.0, 51.0)).unwrap(),
            model.spawn_predator_at(Vec2::new(51.0, 50.0)).unwrap(),
        ];
        for id in hunters {
            let p = model.predator_mut(id).unwrap();
            p.state = PredatorState::Chasing;
            p.target = Some(prey);
            p.energy = 1_000.0;
        }
        let summary = run_tick(&mut model).unwrap();
        assert_eq!(summary.events.kills, 1);
        assert_eq!(model.predation_events().len(), 1);
        let fed = model.live_predators().filter(|p| p.energy > 1_000.0).count();
        assert_eq!(fed, 1);
        assert!(model.agent(prey).is_none());
    }

    #[test]
    fn births_appear_after_the_pass() {
        let mut model = Model::empty(&config()).unwrap();
        let max = model.species().prey.max_energy;
        let id = model.spawn_prey_with(Vec2::new(10.0, 10.0), still_traits()).unwrap();
        {
            let prey = model.prey_mut(id).unwrap();
            prey.is_safe = true;
            prey.waiting_time = 5;
            prey.energy = max + 10.0;
        }
        // Keep the population above the floor so the parent reproduces.
        for i in 0..10 {
            let x = 60.0 + f64::from(i);
            model.spawn_prey_with(Vec2::new(x, 80.0), still_traits()).unwrap();
        }
        let summary = run_tick(&mut model).unwrap();
        assert_eq!(summary.events.prey_births, 1);
        assert_eq!(summary.born, 1);
        assert_eq!(summary.prey, 12);
        let newborn = model.live_prey().max_by_key(|p| p.id).unwrap();
        assert_eq!(newborn.age, 0);
        assert_eq!(newborn.generation, 1);
        assert_eq!(newborn.state, PreyState::Nothing);
    }

    #[test]
    fn flight_spreads_regardless_of_activation_order() {
        for seed in 0..40 {
            let mut cfg = config();
            cfg.world.seed = seed;
            let mut model = Model::empty(&cfg).unwrap();
            let spotter = model.spawn_prey_with(Vec2::new(50.0, 50.0), still_traits()).unwrap();
            let neighbour = model.spawn_prey_with(Vec2::new(52.0, 50.0), still_traits()).unwrap();
            model.prey_mut(spotter).unwrap().detected_predator = Some(AgentId::new(9_999));
            for _ in 0..5 {
                run_tick(&mut model).unwrap();
            }
            let caught = model.live_prey().find(|p| p.id == neighbour).unwrap();
            assert!(caught.is_safe, "seed {seed}: neighbour never fled");
        }
    }

    #[test]
    fn extinction_is_reported() {
        let mut model = Model::empty(&config()).unwrap();
        let summary = run_tick(&mut model).unwrap();
        assert!(summary.is_extinct());
    }
}
