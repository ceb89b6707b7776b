//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], the top-level function that
//! drives the tick loop until one of these holds:
//!
//! - **Bounded simulation**: `max_ticks` ticks have run
//! - **Extinction**: no prey or predators remain
//!
//! The runner wraps the single-tick [`run_tick`] function and notifies a
//! [`TickCallback`] after every tick so the caller can write snapshots.
//!
//! [`run_tick`]: crate::tick::run_tick

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::Model;
use crate::tick::{self, TickError, TickSummary};

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick could not complete.
    #[error("tick error: {source}")]
    Tick {
        /// What went wrong inside the tick.
        #[from]
        source: TickError,
    },
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The configured number of ticks ran.
    MaxTicksReached,
    /// Every prey and predator died.
    Extinction,
}

/// How a run went.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Summary of the final tick; `None` when no tick ran.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this call.
    pub total_ticks: u64,
}

/// Observer notified once per completed tick.
pub trait TickCallback {
    /// Receives the tick's summary and the model as it stands after the tick.
    fn on_tick(&mut self, summary: &TickSummary, model: &Model);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _model: &Model) {}
}

/// Step `model` until `max_ticks` ticks have run or no animals are left.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] if a tick fails as a whole. Failures of
/// single agents are absorbed by the tick.
pub fn run_simulation(
    model: &mut Model,
    max_ticks: u64,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(max_ticks, start_tick = model.tick(), "Simulation starting");

    while total_ticks < max_ticks {
        let summary = tick::run_tick(model)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, model);

        if summary.is_extinct() {
            info!(tick = summary.tick, "No animals left -- extinction");
            return Ok(SimulationResult {
                end_reason: EndReason::Extinction,
                final_summary: Some(summary),
                total_ticks,
            });
        }
        last_summary = Some(summary);
    }

    Ok(SimulationResult {
        end_reason: EndReason::MaxTicksReached,
        final_summary: last_summary,
        total_ticks,
    })
}

/// Log how a run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_prey = result.final_summary.as_ref().map(|s| s.prey),
        final_predators = result.final_summary.as_ref().map(|s| s.predators),
        predation_risk = result.final_summary.as_ref().map(|s| s.predation_risk),
        "Simulation ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use predation_types::Vec2;

    use super::*;
    use crate::config::SimulationConfig;

    struct CountingCallback {
        ticks: Vec<u64>,
    }

    impl TickCallback for CountingCallback {
        fn on_tick(&mut self, summary: &TickSummary, _model: &Model) {
            self.ticks.push(summary.tick);
        }
    }

    fn populated() -> Model {
        let mut config = SimulationConfig::default();
        config.population.initial_prey = 5;
        config.population.initial_predators = 1;
        config.population.food_density = 0.01;
        Model::new(&config).unwrap()
    }

    #[test]
    fn stops_at_max_ticks() {
        let mut model = populated();
        let mut callback = CountingCallback { ticks: Vec::new() };
        let result = run_simulation(&mut model, 5, &mut callback).unwrap();
        assert_eq!(result.end_reason, EndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(callback.ticks, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.final_summary.unwrap().tick, 5);
    }

    #[test]
    fn zero_ticks_runs_nothing() {
        let mut model = populated();
        let result = run_simulation(&mut model, 0, &mut NoOpCallback).unwrap();
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(model.tick(), 0);
    }

    #[test]
    fn extinction_stops_early() {
        let mut config = SimulationConfig::default();
        config.prey.initially_safe = false;
        let mut model = Model::empty(&config).unwrap();
        let id = model.spawn_prey_at(Vec2::new(1.0, 1.0)).unwrap();
        model.prey_mut(id).unwrap().energy = 2.5;
        let result = run_simulation(&mut model, 100, &mut NoOpCallback).unwrap();
        assert_eq!(result.end_reason, EndReason::Extinction);
        assert_eq!(result.total_ticks, 3);
    }
}
