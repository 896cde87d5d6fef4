//! facility-tour core
//!
//! Builds an entity graph from map extracts, resolves coordinates, selects
//! tagged facilities and plans a greedy nearest-neighbour tour over them.

pub mod config;
pub mod error;
pub mod facility;
pub mod graph;
pub mod haversine;
pub mod ingest;
pub mod osm_api;
pub mod osrm;
pub mod planner;
pub mod polyline;
pub mod resolver;
pub mod segments;
pub mod session;
pub mod traits;
pub mod workers;
