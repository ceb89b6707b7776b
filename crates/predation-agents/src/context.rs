//! The view of the model an agent acts through.
//!
//! While an agent steps it is taken out of the registry, so it holds
//! `&mut self` and reaches everyone else through a [`StepContext`]. Births
//! are requested rather than performed and take effect after the current
//! pass; consumption of food and prey is arbitrated by the context so each
//! item is consumed at most once.

use predation_types::{AgentId, AgentKind, DeathCause, Vec2};
use predation_world::{Neighbour, TorusSpace, WorldError};
use rand::RngCore;

use crate::food::Food;
use crate::grouping::GroupMate;
use crate::predator::Predator;
use crate::prey::Prey;
use crate::traits::{PredatorTraits, PreyTraits};

/// What happened to an agent during its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The agent acted and is still alive.
    Alive,
    /// The agent died during its step and must be removed at once.
    Died(DeathCause),
    /// The agent was already dead or is passive; nothing happened.
    Inactive,
}

/// A request to add a prey after the current pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PreyBirth {
    /// The parent, if any.
    pub parent: Option<AgentId>,
    /// Birth position (the parent's position).
    pub position: Vec2,
    /// Initial heading.
    pub heading: Vec2,
    /// Initial energy.
    pub energy: f64,
    /// Inherited traits.
    pub traits: PreyTraits,
    /// Generation number.
    pub generation: u32,
    /// Whether this birth was forced to keep the population above the floor.
    pub forced: bool,
}

/// A request to add a predator after the current pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PredatorBirth {
    /// The parent.
    pub parent: Option<AgentId>,
    /// Birth position (the parent's position).
    pub position: Vec2,
    /// Initial heading.
    pub heading: Vec2,
    /// Initial energy.
    pub energy: f64,
    /// Inherited traits.
    pub traits: PredatorTraits,
    /// Generation number.
    pub generation: u32,
}

/// Services the model provides to a stepping agent.
pub trait StepContext {
    /// The spatial index.
    fn world(&self) -> &TorusSpace;

    /// The model's single seeded random stream.
    fn rng(&mut self) -> &mut dyn RngCore;

    /// A live or consumed prey record.
    fn prey(&self, id: AgentId) -> Option<&Prey>;

    /// A predator record.
    fn predator(&self, id: AgentId) -> Option<&Predator>;

    /// A food record.
    fn food(&self, id: AgentId) -> Option<&Food>;

    /// Current prey population.
    fn num_prey(&self) -> usize;

    /// Current predator population.
    fn num_predators(&self) -> usize;

    /// Ids of every registered prey, ascending.
    fn prey_ids(&self) -> Vec<AgentId>;

    /// Ids of every registered predator, ascending.
    fn predator_ids(&self) -> Vec<AgentId>;

    /// Whether reproduction mutates traits and stochastic deaths apply.
    fn evolution_enabled(&self) -> bool;

    /// Prey population below which forced births occur.
    fn reproduction_floor(&self) -> usize;

    /// Move an agent to `position` (wrapped onto the torus).
    ///
    /// # Errors
    ///
    /// Returns the [`WorldError`] from the spatial index.
    fn relocate(&mut self, id: AgentId, position: Vec2) -> Result<Vec2, WorldError>;

    /// Queue a prey birth.
    fn request_prey_birth(&mut self, birth: PreyBirth);

    /// Queue a predator birth.
    fn request_predator_birth(&mut self, birth: PredatorBirth);

    /// Consume a food item on behalf of `eater`.
    ///
    /// Returns the item's energy, or `None` if it was already consumed.
    fn consume_food(&mut self, food: AgentId, eater: AgentId) -> Option<f64>;

    /// Kill a prey on behalf of `predator`.
    ///
    /// Returns the prey's energy, or `None` if it was already dead.
    fn consume_prey(&mut self, prey: AgentId, predator: AgentId) -> Option<f64>;

    /// The closest agent of `kind` within `range` of `center`.
    fn closest_of_kind_in_range(
        &self,
        center: Vec2,
        kind: AgentKind,
        range: f64,
        exclude: Option<AgentId>,
    ) -> Option<Neighbour> {
        self.world().closest_of_kind(center, kind, range, exclude)
    }

    /// Heading of a prey or predator.
    fn heading_of(&self, id: AgentId) -> Option<Vec2> {
        self.prey(id)
            .map(|p| p.heading)
            .or_else(|| self.predator(id).map(|p| p.heading))
    }

    /// Neighbours of `kind` around `center` as steering inputs.
    ///
    /// # Errors
    ///
    /// Returns the id of a neighbour that has no registry record.
    fn group_mates(
        &self,
        center: Vec2,
        radius: f64,
        kind: AgentKind,
        exclude: AgentId,
    ) -> Result<Vec<GroupMate>, AgentId> {
        self.world()
            .neighbours_within(center, radius, Some(kind), Some(exclude))
            .into_iter()
            .map(|n| {
                let heading = self.heading_of(n.id).ok_or(n.id)?;
                Ok(GroupMate {
                    offset: n.offset,
                    distance: n.distance,
                    heading,
                })
            })
            .collect()
    }
}
