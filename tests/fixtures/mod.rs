//! Test fixtures for facility-tour.
//!
//! Provides:
//! - Las Vegas area hospitals with approximate coordinates
//! - In-memory coordinate lookup and routing doubles
//! - Builders for extract batches

pub mod las_vegas_hospitals;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use facility_tour::error::{LookupError, RoutingError};
use facility_tour::graph::{Coord, EntityId};
use facility_tour::ingest::{ExtractBatch, NodeRecord, WayRecord};
use facility_tour::polyline::Polyline;
use facility_tour::traits::{CoordinateLookup, RoutedPath, RoutingProvider};

/// Answers from a fixed table and counts every call.
pub struct TableLookup {
    coords: HashMap<EntityId, Coord>,
    calls: AtomicUsize,
}

impl TableLookup {
    pub fn new(coords: impl IntoIterator<Item = (EntityId, Coord)>) -> Self {
        Self {
            coords: coords.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CoordinateLookup for TableLookup {
    fn lookup(&self, id: &EntityId) -> Result<Coord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.coords.get(id).copied().ok_or(LookupError::NotFound)
    }
}

/// Returns a two-point path and counts calls.
#[derive(Default)]
pub struct DirectRouter {
    calls: AtomicUsize,
}

impl DirectRouter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingProvider for DirectRouter {
    fn route(&self, from: Coord, to: Coord) -> Result<RoutedPath, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RoutedPath {
            polyline: Polyline::new(vec![from.lat_lon(), to.lat_lon()]),
            distance_m: None,
        })
    }
}

/// Every request fails as if the service were down.
pub struct UnreachableRouter;

impl RoutingProvider for UnreachableRouter {
    fn route(&self, _: Coord, _: Coord) -> Result<RoutedPath, RoutingError> {
        Err(RoutingError::Status(502))
    }
}

pub fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn node(id: &str, pairs: &[(&str, &str)]) -> NodeRecord {
    NodeRecord {
        id: Some(id.to_string()),
        tags: tags(pairs),
        lat: None,
        lon: None,
    }
}

pub fn hospital(id: &str, name: &str) -> NodeRecord {
    node(id, &[("amenity", "hospital"), ("name", name)])
}

pub fn way(id: &str, refs: &[&str], pairs: &[(&str, &str)]) -> WayRecord {
    WayRecord {
        id: Some(id.to_string()),
        tags: tags(pairs),
        node_refs: refs.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn batch(nodes: Vec<NodeRecord>) -> ExtractBatch {
    ExtractBatch {
        nodes,
        ways: Vec::new(),
    }
}
