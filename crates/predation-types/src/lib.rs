//! Shared type definitions for the Predation simulation.
//!
//! This crate is the single source of truth for the small vocabulary shared
//! by every other crate in the workspace: identifiers, agent kinds and
//! behavioural states, and 2D vector geometry.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrapper for agent identifiers
//! - [`enums`] -- Agent kinds, prey/predator states, and death causes
//! - [`geometry`] -- [`Vec2`] positions and headings with degenerate-case guards

pub mod enums;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, DeathCause, PredatorState, PreyState};
pub use geometry::Vec2;
pub use ids::AgentId;
