//! Passive food items eaten by prey.

use predation_types::{AgentId, Vec2};
use serde::{Deserialize, Serialize};

/// A food item. Immobile and without behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    /// Unique id.
    pub id: AgentId,
    /// Fixed position.
    pub position: Vec2,
    /// Energy granted to the prey that eats it.
    pub energy_value: f64,
    /// Set once a prey has eaten it; the item is swept at the end of the tick.
    pub eaten: bool,
}

impl Food {
    /// Create an uneaten item.
    pub const fn new(id: AgentId, position: Vec2, energy_value: f64) -> Self {
        Self {
            id,
            position,
            energy_value,
            eaten: false,
        }
    }

    /// Mark the item eaten, returning its energy the first time only.
    pub fn consume(&mut self) -> Option<f64> {
        if self.eaten {
            return None;
        }
        self.eaten = true;
        Some(self.energy_value)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn consumed_once() {
        let mut food = Food::new(AgentId::new(1), Vec2::ZERO, 2.0);
        assert_eq!(food.consume(), Some(2.0));
        assert_eq!(food.consume(), None);
        assert!(food.eaten);
    }
}
