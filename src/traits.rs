//! Collaborator seams for the planner.
//!
//! The core never talks to the network directly. Coordinate lookup and road
//! routing are reached through these traits so that any transport (or an
//! in-memory fake) can be plugged in.

use crate::error::{LookupError, RoutingError};
use crate::graph::{Coord, EntityId};
use crate::polyline::Polyline;

/// Resolves a coordinate for an entity that does not carry one inline.
///
/// Implementations are called from worker threads and must be `Sync`.
/// A lookup must be idempotent: calling it twice for the same id is safe.
pub trait CoordinateLookup: Sync {
    fn lookup(&self, id: &EntityId) -> Result<Coord, LookupError>;
}

/// A road-network path between two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub polyline: Polyline,
    /// Road distance in meters, when the service reports one.
    pub distance_m: Option<f64>,
}

/// Provides road-network paths between pairs of coordinates.
pub trait RoutingProvider: Sync {
    fn route(&self, from: Coord, to: Coord) -> Result<RoutedPath, RoutingError>;
}

impl<T: CoordinateLookup + ?Sized> CoordinateLookup for &T {
    fn lookup(&self, id: &EntityId) -> Result<Coord, LookupError> {
        (**self).lookup(id)
    }
}

impl<T: RoutingProvider + ?Sized> RoutingProvider for &T {
    fn route(&self, from: Coord, to: Coord) -> Result<RoutedPath, RoutingError> {
        (**self).route(from, to)
    }
}
