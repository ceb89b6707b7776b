//! Prey, predator, and food agents for the Predation simulation.
//!
//! This crate holds everything an individual agent does without owning the
//! world: the two animal state machines, zone-based group steering, the
//! heritable traits and their mutation, and death conditions. Agents reach
//! the rest of the model only through the [`StepContext`] trait, which the
//! `predation-core` scheduler implements.
//!
//! # Modules
//!
//! - [`agent`] -- The [`Agent`] registry entry dispatching on kind
//! - [`config`] -- Species-wide parameters ([`PreyConfig`], [`PredatorConfig`], [`FoodConfig`])
//! - [`context`] -- The [`StepContext`] trait, birth requests, and [`StepOutcome`]
//! - [`death`] -- Starvation, old age, and stochastic death checks
//! - [`error`] -- Error types for agent steps ([`AgentError`])
//! - [`food`] -- Passive food items
//! - [`grouping`] -- Repulsion / alignment / attraction zone steering
//! - [`mutation`] -- Truncated-normal mutation tables for offspring traits
//! - [`predator`] -- The predator state machine
//! - [`prey`] -- The prey state machine and next-action selection
//! - [`traits`] -- Heritable prey and predator traits

pub mod agent;
pub mod config;
pub mod context;
pub mod death;
pub mod error;
pub mod food;
pub mod grouping;
pub mod mutation;
pub mod predator;
pub mod prey;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use agent::Agent;
pub use config::{FoodConfig, PredatorConfig, PreyConfig, SpeciesConfig};
pub use context::{PredatorBirth, PreyBirth, StepContext, StepOutcome};
pub use error::AgentError;
pub use food::Food;
pub use predator::Predator;
pub use prey::Prey;
pub use traits::{PredatorTraits, PreyTraits};
