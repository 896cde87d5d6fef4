//! Error types for each planning stage.
//!
//! Network-sourced failures (`LookupError`, `RoutingError`) are recovered by
//! the stage that sees them and only surface in logs and reports. The others
//! are returned to the caller.

use std::io;

use thiserror::Error;

use crate::graph::EntityId;

/// Structural failure while assembling the graph.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("edge {from} -- {to} references unknown entity {missing}")]
    DanglingEdge {
        from: EntityId,
        to: EntityId,
        missing: EntityId,
    },
}

/// Coordinate lookup failure. Never fatal to a resolution batch.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lookup service returned status {0}")]
    Status(u16),
    #[error("entity not found")]
    NotFound,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("element carries no coordinate")]
    MissingCoordinate,
}

/// Routing failure. The segment falls back to straight-line distance.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no route between the requested points")]
    NoRoute,
}

/// A rejected planning request. Session state is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{0} is not a selectable facility")]
    InvalidStartSelection(EntityId),
    #[error("start facility {0} has no resolved coordinate")]
    UnresolvableStart(EntityId),
    #[error("no facility labelled {0:?}")]
    UnknownLabel(String),
    #[error(transparent)]
    Segment(#[from] SegmentError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("tour entity {0} has no position")]
    MissingPosition(EntityId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] io::Error),
    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
}
