//! Polyline representation for route geometries.
//!
//! Stores decoded (latitude, longitude) points. Wire formats that use a
//! different axis order are converted at the boundary.

use serde::{Deserialize, Serialize};

/// A road geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from (latitude, longitude) points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Builds a polyline from GeoJSON-ordered `[longitude, latitude]` positions.
    pub fn from_lon_lat(positions: &[[f64; 2]]) -> Self {
        Self {
            points: positions.iter().map(|&[lon, lat]| (lat, lon)).collect(),
        }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}
