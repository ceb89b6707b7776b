//! Error types for the `predation-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use predation_types::AgentId;

/// Errors that can occur during spatial operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The torus dimensions are not finite and strictly positive.
    #[error("invalid world dimensions: {width} x {height}")]
    InvalidDimensions {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// An agent was not found in the spatial index.
    #[error("agent not placed in world: {0}")]
    AgentNotFound(AgentId),

    /// An agent was placed twice.
    #[error("agent already placed in world: {0}")]
    DuplicateAgent(AgentId),

    /// A position had a non-finite coordinate.
    #[error("non-finite position ({x}, {y}) for agent {agent}")]
    NonFinitePosition {
        /// The agent being placed or moved.
        agent: AgentId,
        /// Offending x coordinate.
        x: f64,
        /// Offending y coordinate.
        y: f64,
    },
}
