//! In-memory entity graph.
//!
//! Entities are kept in first-insertion order so that everything derived
//! from the graph (facility listing, tie-breaks) is deterministic.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of map element an entity was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    Way,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }
}

/// Stable entity identity. Node 7 and way 7 are different entities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    kind: EntityKind,
    raw: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    pub fn node(raw: impl Into<String>) -> Self {
        Self::new(EntityKind::Node, raw)
    }

    pub fn way(raw: impl Into<String>) -> Self {
        Self::new(EntityKind::Way, raw)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The id as it appears in the source extract.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityIdError(String);

impl fmt::Display for ParseEntityIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid entity id {:?}", self.0)
    }
}

impl std::error::Error for ParseEntityIdError {}

/// Accepts `node/<id>`, `way/<id>` or a bare id (treated as a node).
impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw) = match s.split_once('/') {
            Some(("node", raw)) => (EntityKind::Node, raw),
            Some(("way", raw)) => (EntityKind::Way, raw),
            Some(_) => return Err(ParseEntityIdError(s.to_string())),
            None => (EntityKind::Node, s),
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParseEntityIdError(s.to_string()));
        }
        Ok(Self::new(kind, raw))
    }
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns a coordinate only if both values are finite and in range.
    pub fn checked(lat: f64, lon: f64) -> Option<Self> {
        let coord = Self::new(lat, lon);
        coord.is_valid().then_some(coord)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// (lat, lon) tuple, the order used by [`Polyline`](crate::polyline::Polyline).
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub tags: HashMap<String, String>,
    /// Present only once a coordinate is known (inline or resolved).
    pub coord: Option<Coord>,
}

impl Entity {
    pub fn new(id: EntityId, tags: HashMap<String, String>) -> Self {
        Self {
            id,
            tags,
            coord: None,
        }
    }

    pub fn with_coord(mut self, coord: Coord) -> Self {
        self.coord = Some(coord);
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// An undirected edge stored with its endpoints in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge(EntityId, EntityId);

impl Edge {
    /// Returns `None` for a self-loop.
    pub fn new(a: EntityId, b: EntityId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self(a, b)),
            std::cmp::Ordering::Greater => Some(Self(b, a)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn endpoints(&self) -> (&EntityId, &EntityId) {
        (&self.0, &self.1)
    }

    fn other(&self, id: &EntityId) -> Option<&EntityId> {
        if &self.0 == id {
            Some(&self.1)
        } else if &self.1 == id {
            Some(&self.0)
        } else {
            None
        }
    }
}

/// Entities in insertion order plus a set of undirected edges.
///
/// Every edge endpoint references an entity in the graph; [`Graph::add_edge`]
/// refuses edges that would break this.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    edges: BTreeSet<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Entities in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Inserts an entity, or replaces the one with the same id in place.
    ///
    /// Returns `true` when an existing entity was replaced. A replaced
    /// entity keeps its original position in iteration order.
    pub fn upsert(&mut self, entity: Entity) -> bool {
        match self.index.get(&entity.id) {
            Some(&i) => {
                self.entities[i] = entity;
                true
            }
            None => {
                self.index.insert(entity.id.clone(), self.entities.len());
                self.entities.push(entity);
                false
            }
        }
    }

    pub fn set_coord(&mut self, id: &EntityId, coord: Coord) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                self.entities[i].coord = Some(coord);
                true
            }
            None => false,
        }
    }

    /// Adds an undirected edge between two existing entities.
    ///
    /// Returns `Err` with the first missing endpoint. Duplicate edges and
    /// self-loops are silently collapsed.
    pub fn add_edge(&mut self, a: &EntityId, b: &EntityId) -> Result<(), EntityId> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(id.clone());
            }
        }
        if let Some(edge) = Edge::new(a.clone(), b.clone()) {
            self.edges.insert(edge);
        }
        Ok(())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, a: &EntityId, b: &EntityId) -> bool {
        Edge::new(a.clone(), b.clone()).is_some_and(|edge| self.edges.contains(&edge))
    }

    /// Adjacent entities, in edge order.
    ///
    /// Scans every edge; fine for extract-sized graphs.
    pub fn neighbors<'a>(&'a self, id: &EntityId) -> impl Iterator<Item = &'a EntityId> + 'a {
        let id = id.clone();
        self.edges.iter().filter_map(move |edge| edge.other(&id))
    }
}
