//! Error types for the predation-agents crate.
//!
//! Agent steps never panic: anything that goes wrong while an agent acts is
//! reported as an [`AgentError`] so the scheduler can isolate the failure
//! to that one agent and carry on with the tick.

use predation_types::AgentId;
use predation_world::WorldError;

/// Errors that can occur while an agent acts.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A spatial operation on the agent's own position failed.
    #[error("world operation failed for agent {agent}: {source}")]
    World {
        /// The agent that was acting.
        agent: AgentId,
        /// The underlying spatial error.
        source: WorldError,
    },

    /// A neighbour returned by a spatial query has no registry record.
    #[error("neighbour {neighbour} seen by {agent} is missing from the registry")]
    MissingNeighbour {
        /// The agent that was acting.
        agent: AgentId,
        /// The neighbour without a record.
        neighbour: AgentId,
    },
}
