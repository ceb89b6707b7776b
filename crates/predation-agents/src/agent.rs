//! The agent registry entry.
//!
//! Every agent is one of three kinds. The kind is fixed at creation and
//! determines which state machine runs when the agent is stepped.

use predation_types::{AgentId, AgentKind, Vec2};

use crate::config::SpeciesConfig;
use crate::context::{StepContext, StepOutcome};
use crate::error::AgentError;
use crate::food::Food;
use crate::predator::Predator;
use crate::prey::Prey;

/// A registered agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Agent {
    /// A prey animal.
    Prey(Prey),
    /// A predator.
    Predator(Predator),
    /// A food item.
    Food(Food),
}

impl Agent {
    /// Unique id.
    pub const fn id(&self) -> AgentId {
        match self {
            Self::Prey(p) => p.id,
            Self::Predator(p) => p.id,
            Self::Food(f) => f.id,
        }
    }

    /// Type tag.
    pub const fn kind(&self) -> AgentKind {
        match self {
            Self::Prey(_) => AgentKind::Prey,
            Self::Predator(_) => AgentKind::Predator,
            Self::Food(_) => AgentKind::Food,
        }
    }

    /// Current position.
    pub const fn position(&self) -> Vec2 {
        match self {
            Self::Prey(p) => p.position,
            Self::Predator(p) => p.position,
            Self::Food(f) => f.position,
        }
    }

    /// Whether the agent is still part of the simulation.
    pub fn is_alive(&self) -> bool {
        match self {
            Self::Prey(p) => p.is_alive(),
            Self::Predator(p) => p.is_alive(),
            Self::Food(f) => !f.eaten,
        }
    }

    /// Whether the agent acts on its own each tick.
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Food(_))
    }

    /// Prey view, if this is a prey.
    pub const fn as_prey(&self) -> Option<&Prey> {
        match self {
            Self::Prey(p) => Some(p),
            _ => None,
        }
    }

    /// Predator view, if this is a predator.
    pub const fn as_predator(&self) -> Option<&Predator> {
        match self {
            Self::Predator(p) => Some(p),
            _ => None,
        }
    }

    /// Food view, if this is a food item.
    pub const fn as_food(&self) -> Option<&Food> {
        match self {
            Self::Food(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable prey view.
    pub fn as_prey_mut(&mut self) -> Option<&mut Prey> {
        match self {
            Self::Prey(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable predator view.
    pub fn as_predator_mut(&mut self) -> Option<&mut Predator> {
        match self {
            Self::Predator(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable food view.
    pub fn as_food_mut(&mut self) -> Option<&mut Food> {
        match self {
            Self::Food(f) => Some(f),
            _ => None,
        }
    }

    /// Run the agent's state machine for one tick.
    ///
    /// # Errors
    ///
    /// Propagates the [`AgentError`] from the kind's step.
    pub fn step<C: StepContext + ?Sized>(
        &mut self,
        species: &SpeciesConfig,
        ctx: &mut C,
    ) -> Result<StepOutcome, AgentError> {
        match self {
            Self::Prey(p) => p.step(&species.prey, ctx),
            Self::Predator(p) => p.step(&species.predator, ctx),
            Self::Food(_) => Ok(StepOutcome::Inactive),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MockContext;

    #[test]
    fn food_is_passive() {
        let mut ctx = MockContext::new(50.0);
        let id = ctx.add_food(Vec2::new(1.0, 1.0), 2.0);
        let mut agent = Agent::Food(Food::new(id, Vec2::new(1.0, 1.0), 2.0));
        assert!(!agent.is_active());
        assert_eq!(agent.kind(), AgentKind::Food);
        let outcome = agent.step(&SpeciesConfig::default(), &mut ctx).unwrap();
        assert_eq!(outcome, StepOutcome::Inactive);
    }

    #[test]
    fn accessors_match_kind() {
        let mut ctx = MockContext::new(50.0);
        let cfg = SpeciesConfig::default();
        let p = ctx.add_predator(Vec2::new(3.0, 4.0), 10.0, &cfg.predator);
        let agent = Agent::Predator(p);
        assert!(agent.as_predator().is_some());
        assert!(agent.as_prey().is_none());
        assert!(agent.is_active());
        assert_eq!(agent.position(), Vec2::new(3.0, 4.0));
    }
}
