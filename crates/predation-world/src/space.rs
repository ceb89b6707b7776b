//! The toroidal continuous space that every agent lives in.
//!
//! [`TorusSpace`] is the spatial index of the simulation: it records the
//! kind and position of each placed agent, wraps coordinates at the edges,
//! and answers radius and nearest-of-kind queries using the shortest
//! displacement across the torus.
//!
//! # Design Principles
//!
//! - Entries are held per kind in `BTreeMap`s keyed by [`AgentId`], so a
//!   kind-filtered query only visits that kind and every query returns its
//!   results in ascending ID order. Together with the seeded RNG this keeps
//!   runs reproducible.
//! - Positions are always stored wrapped into `[0, width) x [0, height)`.
//! - An empty query result is a normal outcome, never an error.

use std::collections::BTreeMap;

use predation_types::{AgentId, AgentKind, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// What the spatial index knows about one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceEntry {
    /// The agent's kind, used to filter queries.
    pub kind: AgentKind,
    /// The agent's wrapped position.
    pub position: Vec2,
}

/// A neighbour returned by a spatial query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// The neighbour's ID.
    pub id: AgentId,
    /// The neighbour's kind.
    pub kind: AgentKind,
    /// The neighbour's wrapped position.
    pub position: Vec2,
    /// Shortest torus displacement from the query centre to the neighbour.
    pub offset: Vec2,
    /// Length of `offset`.
    pub distance: f64,
}

/// A rectangular domain whose opposite edges are adjacent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorusSpace {
    /// Extent along x.
    width: f64,
    /// Extent along y.
    height: f64,
    /// Kind of every placed agent.
    kinds: BTreeMap<AgentId, AgentKind>,
    /// Wrapped positions, one layer per kind.
    layers: BTreeMap<AgentKind, BTreeMap<AgentId, Vec2>>,
}

impl TorusSpace {
    /// Create an empty torus of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] unless both dimensions are
    /// finite and strictly positive.
    pub fn new(width: f64, height: f64) -> Result<Self, WorldError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            kinds: BTreeMap::new(),
            layers: BTreeMap::new(),
        })
    }

    /// Extent along x.
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Extent along y.
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Total area of the domain.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Number of placed agents.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no agent is placed.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Whether `pos` lies outside `[0, width) x [0, height)`.
    pub fn out_of_bounds(&self, pos: Vec2) -> bool {
        !(0.0..self.width).contains(&pos.x) || !(0.0..self.height).contains(&pos.y)
    }

    /// Wrap `pos` into the domain.
    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        Vec2::new(wrap_coord(pos.x, self.width), wrap_coord(pos.y, self.height))
    }

    /// Shortest displacement from `from` to `to` across the torus.
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            wrapped_delta(to.x - from.x, self.width),
            wrapped_delta(to.y - from.y, self.height),
        )
    }

    /// Torus distance between two points.
    pub fn distance(&self, a: Vec2, b: Vec2) -> f64 {
        self.delta(a, b).length()
    }

    /// A uniformly random position in the domain.
    pub fn random_position(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }

    /// Place a new agent. The position is wrapped before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateAgent`] if the agent is already
    /// placed, or [`WorldError::NonFinitePosition`] for NaN/infinite input.
    pub fn place(&mut self, id: AgentId, kind: AgentKind, pos: Vec2) -> Result<Vec2, WorldError> {
        check_finite(id, pos)?;
        if self.kinds.contains_key(&id) {
            return Err(WorldError::DuplicateAgent(id));
        }
        let position = self.wrap(pos);
        self.kinds.insert(id, kind);
        self.layers.entry(kind).or_default().insert(id, position);
        Ok(position)
    }

    /// Move an existing agent, returning its wrapped position.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if the agent is not placed, or
    /// [`WorldError::NonFinitePosition`] for NaN/infinite input.
    pub fn move_to(&mut self, id: AgentId, pos: Vec2) -> Result<Vec2, WorldError> {
        check_finite(id, pos)?;
        let wrapped = self.wrap(pos);
        let kind = self.kinds.get(&id).ok_or(WorldError::AgentNotFound(id))?;
        let slot = self
            .layers
            .get_mut(kind)
            .and_then(|layer| layer.get_mut(&id))
            .ok_or(WorldError::AgentNotFound(id))?;
        *slot = wrapped;
        Ok(wrapped)
    }

    /// Remove an agent. Returns its last entry, or `None` if it was not
    /// placed (removing twice is harmless).
    pub fn remove(&mut self, id: AgentId) -> Option<SpaceEntry> {
        let kind = self.kinds.remove(&id)?;
        let position = self.layers.get_mut(&kind)?.remove(&id)?;
        Some(SpaceEntry { kind, position })
    }

    /// Whether the agent is currently placed.
    pub fn contains(&self, id: AgentId) -> bool {
        self.kinds.contains_key(&id)
    }

    /// All agents within `radius` of `center` (inclusive), in ascending ID
    /// order.
    ///
    /// `kind` restricts the result to one agent kind; `exclude` skips the
    /// querying agent itself.
    pub fn neighbours_within(
        &self,
        center: Vec2,
        radius: f64,
        kind: Option<AgentKind>,
        exclude: Option<AgentId>,
    ) -> Vec<Neighbour> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Vec::new();
        }
        let r_sq = radius * radius;
        let mut found: Vec<Neighbour> = self
            .layers
            .iter()
            .filter(|(k, _)| kind.is_none_or(|wanted| wanted == **k))
            .flat_map(|(k, layer)| layer.iter().map(move |(id, pos)| (*k, *id, *pos)))
            .filter(|(_, id, _)| Some(*id) != exclude)
            .filter_map(|(k, id, position)| {
                let offset = self.delta(center, position);
                let d_sq = offset.dot(offset);
                (d_sq <= r_sq).then(|| Neighbour {
                    id,
                    kind: k,
                    position,
                    offset,
                    distance: d_sq.sqrt(),
                })
            })
            .collect();
        if kind.is_none() {
            found.sort_by_key(|n| n.id);
        }
        found
    }

    /// The nearest agent of `kind` within `range`, ties broken by lower ID.
    pub fn closest_of_kind(
        &self,
        center: Vec2,
        kind: AgentKind,
        range: f64,
        exclude: Option<AgentId>,
    ) -> Option<Neighbour> {
        self.neighbours_within(center, range, Some(kind), exclude)
            .into_iter()
            .fold(None, |best: Option<Neighbour>, candidate| match best {
                Some(b) if b.distance <= candidate.distance => Some(b),
                _ => Some(candidate),
            })
    }
}

/// Reject NaN and infinite coordinates.
fn check_finite(agent: AgentId, pos: Vec2) -> Result<(), WorldError> {
    if pos.x.is_finite() && pos.y.is_finite() {
        Ok(())
    } else {
        Err(WorldError::NonFinitePosition {
            agent,
            x: pos.x,
            y: pos.y,
        })
    }
}

/// Wrap one coordinate into `[0, extent)`.
fn wrap_coord(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid of a tiny negative value can round up to `extent` itself.
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Shortest signed displacement along one periodic axis.
fn wrapped_delta(delta: f64, extent: f64) -> f64 {
    (delta + extent / 2.0).rem_euclid(extent) - extent / 2.0
}
