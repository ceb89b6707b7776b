//! Model, tick cycle, and orchestration for the Predation simulation.
//!
//! This crate owns the agent registry and drives it tick by tick: each tick
//! is sampled, every animal steps once in a seeded random order, births are
//! flushed and consumed agents swept. Around the tick it provides the run
//! loop, the data collector, and the batch sweep over attack distance and
//! evolution.
//!
//! # Modules
//!
//! - [`clock`] -- Simulation clock with a checked tick counter.
//! - [`collector`] -- Per-tick [`TickRecord`] samples and CSV output.
//! - [`config`] -- Configuration loading from `predation-config.yaml` into
//!   strongly-typed structs.
//! - [`experiment`] -- Batch sweeps averaged across repeated runs.
//! - [`model`] -- The [`Model`]: registry, spatial index, and the
//!   [`StepContext`] agents act through.
//! - [`population`] -- Per-kind population counts.
//! - [`runner`] -- The bounded run loop with tick callbacks.
//! - [`tick`] -- The single-tick cycle.
//!
//! [`TickRecord`]: collector::TickRecord
//! [`Model`]: model::Model
//! [`StepContext`]: predation_agents::StepContext

pub mod clock;
pub mod collector;
pub mod config;
pub mod experiment;
pub mod model;
pub mod population;
pub mod runner;
pub mod tick;

pub use collector::{DataCollector, EventTally, OverviewRow, TickRecord};
pub use config::{ConfigError, SimulationConfig};
pub use model::{Model, ModelError, PredationEvent};
pub use runner::{EndReason, NoOpCallback, RunnerError, SimulationResult, TickCallback};
pub use tick::{TickError, TickSummary};
