//! Coordinate resolution with a per-session cache.
//!
//! Entities that already carry a coordinate are indexed directly. The rest
//! are looked up through a [`CoordinateLookup`]; failures are expected and
//! only leave the entity out of the [`PositionIndex`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::graph::{Coord, EntityId, Graph};
use crate::traits::CoordinateLookup;
use crate::workers::{self, Attempt, Deadline, Throttle};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum lookups in flight.
    pub concurrency: usize,
    /// Minimum gap between lookup starts, shared by all workers.
    pub request_spacing_ms: u64,
    /// Stop issuing lookups this long after the phase starts.
    ///
    /// Lookups already in flight are not cut short; each can still run for
    /// up to the lookup client's own `timeout_secs`.
    pub phase_timeout_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            request_spacing_ms: 250,
            phase_timeout_secs: None,
        }
    }
}

/// Known coordinates by entity. Entities without one are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionIndex {
    positions: HashMap<EntityId, Coord>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &EntityId) -> Option<Coord> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn insert(&mut self, id: EntityId, coord: Coord) {
        self.positions.insert(id, coord);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, Coord)> {
        self.positions.iter().map(|(id, coord)| (id, *coord))
    }
}

impl FromIterator<(EntityId, Coord)> for PositionIndex {
    fn from_iter<T: IntoIterator<Item = (EntityId, Coord)>>(iter: T) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Entities that already carried a coordinate.
    pub inline: usize,
    /// Lookups actually issued.
    pub looked_up: usize,
    /// Entities answered from the cache, successfully or not.
    pub cache_hits: usize,
    /// Lookups that produced a coordinate.
    pub resolved: usize,
    /// Entities left without a coordinate, in graph order.
    pub unresolved: Vec<EntityId>,
    /// Lookups never issued because the phase deadline passed.
    pub timed_out: usize,
}

impl ResolveReport {
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }
}

/// Resolves missing coordinates and remembers every answer by entity id.
///
/// Failed lookups are cached too, so a second [`resolve`](Self::resolve)
/// does not hammer the service for ids it cannot answer. Call
/// [`forget_failures`](Self::forget_failures) to retry them.
pub struct CoordinateResolver<L> {
    lookup: L,
    config: ResolverConfig,
    cache: Mutex<HashMap<EntityId, Option<Coord>>>,
}

impl<L: CoordinateLookup> CoordinateResolver<L> {
    pub fn new(lookup: L, config: ResolverConfig) -> Self {
        Self {
            lookup,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The cached answer for `id`: `Some(None)` is a cached failure.
    pub fn cached(&self, id: &EntityId) -> Option<Option<Coord>> {
        self.cache().get(id).copied()
    }

    pub fn forget_failures(&self) {
        self.cache().retain(|_, coord| coord.is_some());
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    /// Fills in coordinates on `graph` and returns the resulting index.
    pub fn resolve(&self, graph: &mut Graph) -> (PositionIndex, ResolveReport) {
        let mut positions = PositionIndex::new();
        let mut report = ResolveReport::default();
        let mut from_cache = Vec::new();
        let mut pending = Vec::new();

        for entity in graph.iter() {
            if let Some(coord) = entity.coord {
                positions.insert(entity.id.clone(), coord);
                report.inline += 1;
                continue;
            }
            match self.cached(&entity.id) {
                Some(answer) => {
                    report.cache_hits += 1;
                    if let Some(coord) = answer {
                        from_cache.push((entity.id.clone(), coord));
                    }
                }
                None => pending.push(entity.id.clone()),
            }
        }

        for (id, coord) in from_cache {
            graph.set_coord(&id, coord);
            positions.insert(id, coord);
        }

        debug!(pending = pending.len(), "looking up coordinates");
        let throttle = Throttle::new(Duration::from_millis(self.config.request_spacing_ms));
        let deadline = Deadline::after(self.config.phase_timeout_secs.map(Duration::from_secs));
        let attempts = workers::run_bounded(
            &pending,
            self.config.concurrency,
            &throttle,
            deadline,
            |id| self.lookup_one(id),
        );

        for (id, attempt) in pending.into_iter().zip(attempts) {
            match attempt {
                Attempt::Done(Some(coord)) => {
                    report.looked_up += 1;
                    report.resolved += 1;
                    graph.set_coord(&id, coord);
                    positions.insert(id, coord);
                }
                Attempt::Done(None) => report.looked_up += 1,
                Attempt::Skipped => report.timed_out += 1,
            }
        }

        report.unresolved = graph
            .iter()
            .filter(|entity| !positions.contains(&entity.id))
            .map(|entity| entity.id.clone())
            .collect();

        if report.timed_out > 0 {
            warn!(skipped = report.timed_out, "coordinate phase timed out, results are partial");
        }
        info!(
            entities = graph.len(),
            with_coordinates = positions.len(),
            unresolved = report.unresolved_count(),
            "coordinates resolved"
        );

        (positions, report)
    }

    fn lookup_one(&self, id: &EntityId) -> Option<Coord> {
        let answer = match self.lookup.lookup(id) {
            Ok(coord) if coord.is_valid() => Some(coord),
            Ok(coord) => {
                debug!(%id, lat = coord.lat, lon = coord.lon, "lookup returned an invalid coordinate");
                None
            }
            Err(err) => {
                debug!(%id, error = %err, "coordinate lookup failed");
                None
            }
        };
        self.cache().insert(id.clone(), answer);
        answer
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<EntityId, Option<Coord>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
