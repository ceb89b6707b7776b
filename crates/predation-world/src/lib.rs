//! Toroidal continuous space for the Predation simulation.
//!
//! This crate models the physical world: a rectangular domain whose
//! opposite edges are adjacent, holding the position of every prey,
//! predator, and food item. It answers the spatial questions agents ask
//! each tick (who is within this radius, which food is closest) using the
//! shortest displacement across the wrapped edges.
//!
//! # Modules
//!
//! - [`error`] -- Error types for spatial operations.
//! - [`space`] -- [`TorusSpace`]: placement, wrap-around, torus distance,
//!   and neighbour queries.

pub mod error;
pub mod space;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use space::{Neighbour, SpaceEntry, TorusSpace};
