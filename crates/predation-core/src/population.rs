//! Per-kind population counts and id lists.
//!
//! The tracker is rebuilt from the registry at the end of every tick and
//! adjusted in place when agents die or are born mid-tick, so population
//! gates read during a step always see deaths that already happened in the
//! same pass.

use std::collections::BTreeMap;

use predation_agents::Agent;
use predation_types::{AgentId, AgentKind};

/// Live agents per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTracker {
    counts: BTreeMap<AgentKind, usize>,
    ids: BTreeMap<AgentKind, Vec<AgentId>>,
}

impl PopulationTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recount live agents and rebuild the id lists from `registry`.
    pub fn refresh(&mut self, registry: &BTreeMap<AgentId, Agent>) {
        self.counts.clear();
        self.ids.clear();
        for (id, agent) in registry.iter().filter(|(_, a)| a.is_alive()) {
            let count = self.counts.entry(agent.kind()).or_insert(0);
            *count = count.saturating_add(1);
            self.ids.entry(agent.kind()).or_default().push(*id);
        }
    }

    /// Live agents of `kind`.
    pub fn count(&self, kind: AgentKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Live agents of every kind.
    pub fn total(&self) -> usize {
        self.counts
            .values()
            .fold(0_usize, |acc, n| acc.saturating_add(*n))
    }

    /// Ids of `kind` as of the last refresh, ascending.
    pub fn ids(&self, kind: AgentKind) -> &[AgentId] {
        self.ids.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// An agent of `kind` died mid-tick.
    pub fn record_death(&mut self, kind: AgentKind) {
        if let Some(count) = self.counts.get_mut(&kind) {
            *count = count.saturating_sub(1);
        }
    }

    /// An agent of `kind` was added mid-tick.
    pub fn record_birth(&mut self, kind: AgentKind) {
        let count = self.counts.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
    }
}
