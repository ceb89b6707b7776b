//! Enumeration types for the Predation simulation.
//!
//! Agent kinds, the behavioural states of the two animal state machines,
//! and the causes of death recorded by the data collector.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Agent kinds
// ---------------------------------------------------------------------------

/// The immutable type tag of an agent. Determines dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// A grazing animal that forages, groups, and flees.
    Prey,
    /// A hunting animal that searches, chases, and eats prey.
    Predator,
    /// A passive resource item eaten by prey.
    Food,
}

impl AgentKind {
    /// Every kind, in reporting order.
    pub const ALL: [Self; 3] = [Self::Prey, Self::Predator, Self::Food];
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Prey => write!(f, "prey"),
            Self::Predator => write!(f, "predator"),
            Self::Food => write!(f, "food"),
        }
    }
}

// ---------------------------------------------------------------------------
// Prey states
// ---------------------------------------------------------------------------

/// The current action of a prey agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreyState {
    /// Idle; a new action is chosen on the next dispatch.
    Nothing,
    /// Moving with the group.
    Moving,
    /// Looking for a food item nearby.
    FoodScan,
    /// Walking toward a targeted food item.
    MoveToFood,
    /// Consuming a food item within reach.
    Eating,
    /// Vigilance: scanning the surroundings for predators.
    Scanning,
    /// Escaping a detected predator.
    Fleeing,
    /// Terminal state; the agent is removed from the world.
    Dead,
}

impl PreyState {
    /// Every prey state.
    pub const ALL: [Self; 8] = [
        Self::Nothing,
        Self::Moving,
        Self::FoodScan,
        Self::MoveToFood,
        Self::Eating,
        Self::Scanning,
        Self::Fleeing,
        Self::Dead,
    ];
}

impl core::fmt::Display for PreyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Nothing => "nothing",
            Self::Moving => "moving",
            Self::FoodScan => "food_scan",
            Self::MoveToFood => "move_to_food",
            Self::Eating => "eating",
            Self::Scanning => "scanning",
            Self::Fleeing => "fleeing",
            Self::Dead => "dead",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Predator states
// ---------------------------------------------------------------------------

/// The current action of a predator agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredatorState {
    /// Roaming with the pack.
    Searching,
    /// Pursuing a target prey.
    Chasing,
    /// Looking for prey within detection range.
    Scanning,
    /// Consuming a caught prey (single tick).
    Eating,
    /// Terminal state; the agent is removed from the world.
    Dead,
}

impl core::fmt::Display for PredatorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Searching => "searching",
            Self::Chasing => "chasing",
            Self::Scanning => "scanning",
            Self::Eating => "eating",
            Self::Dead => "dead",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Death causes
// ---------------------------------------------------------------------------

/// The cause of an agent's death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Energy dropped to or below the minimum.
    Starvation,
    /// Age exceeded the configured maximum.
    OldAge,
    /// The stochastic death-rate draw fired.
    Random,
    /// Eaten by a predator.
    Predation,
}

impl DeathCause {
    /// Every cause, in reporting order.
    pub const ALL: [Self; 4] = [Self::Starvation, Self::OldAge, Self::Random, Self::Predation];
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::OldAge => write!(f, "old_age"),
            Self::Random => write!(f, "random"),
            Self::Predation => write!(f, "predation"),
        }
    }
}
