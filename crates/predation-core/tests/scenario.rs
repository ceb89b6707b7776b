//! End-to-end scenarios for the model and tick cycle.
//!
//! These drive whole ticks through the public API and check the properties
//! the model must keep regardless of activation order: reproducible runs,
//! single consumption of prey and food, ordered zones after mutation, and
//! torus wrap-around.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]

use predation_agents::mutation;
use predation_agents::prey::{FoodTarget, select_next_action};
use predation_agents::{Agent, PreyTraits, StepContext};
use predation_core::runner::{self, NoOpCallback, TickCallback};
use predation_core::tick::{self, TickSummary};
use predation_core::{Model, SimulationConfig};
use predation_types::{PredatorState, PreyState, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn base_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.prey.initially_safe = false;
    config.scenario.attack_distance = Some(5.0);
    config.scenario.evolve = false;
    config
}

fn unwary() -> PreyTraits {
    PreyTraits {
        vigilance: 0.0,
        move_distance: 2.0,
        ..PreyTraits::default()
    }
}

#[test]
fn fixed_seed_reproduces_the_run() {
    let mut config = base_config();
    config.population.initial_prey = 30;
    config.population.initial_predators = 4;
    config.population.food_density = 0.05;

    let mut a = Model::new(&config).unwrap();
    let mut b = Model::new(&config).unwrap();
    runner::run_simulation(&mut a, 100, &mut NoOpCallback).unwrap();
    runner::run_simulation(&mut b, 100, &mut NoOpCallback).unwrap();

    assert_eq!(a.collector().records(), b.collector().records());
    let agents_a: Vec<&Agent> = a.agents().collect();
    let agents_b: Vec<&Agent> = b.agents().collect();
    assert_eq!(agents_a, agents_b);
    assert_eq!(a.predation_events(), b.predation_events());
}

#[test]
fn different_seeds_diverge() {
    let mut config = base_config();
    config.population.initial_prey = 10;
    config.population.initial_predators = 1;
    config.population.food_density = 0.01;
    let a = Model::new(&config).unwrap();
    config.world.seed = config.world.seed.wrapping_add(1);
    let b = Model::new(&config).unwrap();
    let pa: Vec<Vec2> = a.agents().map(Agent::position).collect();
    let pb: Vec<Vec2> = b.agents().map(Agent::position).collect();
    assert_ne!(pa, pb);
}

#[test]
fn two_predators_on_one_prey_eat_once() {
    let mut model = Model::empty(&base_config()).unwrap();
    let prey = model.spawn_prey_with(Vec2::new(40.0, 40.0), unwary()).unwrap();
    let hunters = [
        model.spawn_predator_at(Vec2::new(42.0, 40.0)).unwrap(),
        model.spawn_predator_at(Vec2::new(40.0, 43.0)).unwrap(),
    ];
    for id in hunters {
        let p = model.predator_mut(id).unwrap();
        p.state = PredatorState::Chasing;
        p.target = Some(prey);
        p.energy = 2_000.0;
    }

    let summary = tick::run_tick(&mut model).unwrap();
    assert_eq!(summary.events.kills, 1);
    assert_eq!(summary.swept, 1);
    assert!(model.agent(prey).is_none());
    assert!(!model.space().contains(prey));
    assert!(model.pending_removals().is_empty());

    let event = model.predation_events().first().unwrap().clone();
    let max = model.species().predator.max_energy;
    let cost = model.species().predator.energy_cost;
    let eater = model
        .live_predators()
        .find(|p| p.id == event.predator)
        .unwrap();
    assert_eq!(eater.energy, (2_000.0 + event.energy).min(max) - cost);
    let other = model
        .live_predators()
        .find(|p| p.id != event.predator)
        .unwrap();
    assert_eq!(other.energy, 2_000.0 - cost);
    assert_eq!(other.state, PredatorState::Searching);
}

#[test]
fn shared_food_is_eaten_once() {
    let mut model = Model::empty(&base_config()).unwrap();
    let food = model.spawn_food_at(Vec2::new(20.0, 20.0)).unwrap();
    let eaters = [
        model.spawn_prey_with(Vec2::new(20.5, 20.0), unwary()).unwrap(),
        model.spawn_prey_with(Vec2::new(20.0, 20.5), unwary()).unwrap(),
    ];
    for id in eaters {
        let p = model.prey_mut(id).unwrap();
        p.food_target = Some(food);
        p.state = PreyState::Eating;
        p.action_time_remaining = 5.0;
        p.energy = 500.0;
    }

    let summary = tick::run_tick(&mut model).unwrap();
    assert_eq!(summary.events.food_eaten, 1);
    assert_eq!(summary.swept, 1);
    assert!(model.agent(food).is_none());

    let mut energies: Vec<f64> = model.live_prey().map(|p| p.energy).collect();
    energies.sort_by(f64::total_cmp);
    assert_eq!(energies, vec![499.0, 501.0]);
    assert!(model.live_prey().all(|p| p.food_target.is_none()));

    let summary = tick::run_tick(&mut model).unwrap();
    assert_eq!(summary.events.food_eaten, 0);
    assert_eq!(summary.swept, 0);
}

#[test]
fn mutation_keeps_zones_ordered() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut traits = PreyTraits::sample_initial(&mut rng);
    for _ in 0..2_000 {
        traits = mutation::mutate(&traits, 1.0, &mut rng).child;
        assert!(traits.repulsion_zone <= traits.attraction_zone);
        assert!((0.0..=50.0).contains(&traits.repulsion_zone));
        assert!(traits.attraction_zone <= 50.0);
    }
}

#[test]
fn evolving_population_keeps_zones_ordered() {
    let mut config = base_config();
    config.scenario.evolve = true;
    config.prey.mutation_rate = 1.0;
    config.population.initial_prey = 12;
    config.population.initial_predators = 0;
    config.population.food_density = 0.02;
    let mut model = Model::new(&config).unwrap();
    let max = model.species().prey.max_energy;
    let ids: Vec<_> = model.live_prey().map(|p| p.id).collect();
    for id in ids {
        let p = model.prey_mut(id).unwrap();
        p.is_safe = true;
        p.waiting_time = 50;
        p.energy = max + 100.0;
    }
    runner::run_simulation(&mut model, 5, &mut NoOpCallback).unwrap();
    assert!(model.tally().prey_births > 0);
    assert!(
        model
            .live_prey()
            .all(|p| p.traits.repulsion_zone <= p.traits.attraction_zone)
    );
}

#[test]
fn positions_wrap_around_the_torus() {
    let mut model = Model::empty(&base_config()).unwrap();
    let id = model.spawn_prey_at(Vec2::new(10.0, 10.0)).unwrap();
    let east = model.relocate(id, Vec2::new(105.0, 30.0)).unwrap();
    assert_eq!(east, Vec2::new(5.0, 30.0));
    let north = model.relocate(id, Vec2::new(30.0, 105.0)).unwrap();
    assert_eq!(north, Vec2::new(30.0, 5.0));
    let west = model.relocate(id, Vec2::new(-5.0, 30.0)).unwrap();
    assert_eq!(west, Vec2::new(95.0, 30.0));
}

#[test]
fn idle_prey_always_pick_a_real_action() {
    let traits = PreyTraits::default();
    for previous in PreyState::ALL {
        for food in [FoodTarget::None, FoodTarget::InReach, FoodTarget::Distant] {
            for step in 0..=100 {
                let r = f64::from(step) / 100.0;
                let next = select_next_action(r, &traits, previous, food);
                assert!(!matches!(next, PreyState::Nothing | PreyState::Dead));
            }
        }
    }
}

struct PopulationWatch {
    max_predators: usize,
    grew: bool,
}

impl TickCallback for PopulationWatch {
    fn on_tick(&mut self, summary: &TickSummary, _model: &Model) {
        if summary.predators > self.max_predators {
            self.grew = true;
        }
        self.max_predators = self.max_predators.max(summary.predators);
    }
}

#[test]
fn ten_prey_two_predators_fifty_ticks() {
    let mut model = Model::empty(&base_config()).unwrap();
    for i in 0..10 {
        let x = 40.0 + f64::from(i % 5) * 3.0;
        let y = 40.0 + f64::from(i / 5) * 3.0;
        model.spawn_prey_with(Vec2::new(x, y), unwary()).unwrap();
    }
    model.spawn_predator_at(Vec2::new(30.0, 30.0)).unwrap();
    model.spawn_predator_at(Vec2::new(60.0, 60.0)).unwrap();
    for i in 0..25 {
        let x = 5.0 + f64::from(i % 5) * 20.0;
        let y = 5.0 + f64::from(i / 5) * 20.0;
        model.spawn_food_at(Vec2::new(x, y)).unwrap();
    }
    model.refresh_population();

    let mut watch = PopulationWatch {
        max_predators: 2,
        grew: false,
    };
    let result = runner::run_simulation(&mut model, 50, &mut watch).unwrap();
    assert_eq!(result.total_ticks, 50);
    assert!(!watch.grew);

    let events = model.predation_events();
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.risk_increment == 2.0));
    assert_eq!(model.predation_risk(), 2.0 * events.len() as f64);

    let prey_left = model.live_prey().count();
    assert_eq!(prey_left + events.len(), 10);
}
