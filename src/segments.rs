//! Per-hop distances and road geometry for a planned tour.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SegmentError;
use crate::graph::{Coord, EntityId};
use crate::haversine::haversine_km;
use crate::planner::Tour;
use crate::polyline::Polyline;
use crate::resolver::PositionIndex;
use crate::traits::RoutingProvider;
use crate::workers::{self, Attempt, Deadline, Throttle};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Maximum route requests in flight.
    pub concurrency: usize,
    /// Minimum gap between request starts, shared by all workers.
    pub request_spacing_ms: u64,
    /// Stop issuing route requests this long after the phase starts.
    ///
    /// Requests already in flight are not cut short; each can still run for
    /// up to the routing client's own `timeout_secs`.
    pub phase_timeout_secs: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            request_spacing_ms: 0,
            phase_timeout_secs: None,
        }
    }
}

/// One hop of a tour.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: EntityId,
    pub to: EntityId,
    /// Great-circle distance, always present.
    pub distance_km: f64,
    /// Road geometry, when the routing service answered.
    pub polyline: Option<Polyline>,
    pub road_distance_km: Option<f64>,
}

impl Segment {
    pub fn is_routed(&self) -> bool {
        self.polyline.is_some()
    }

    /// Route points, empty for an unrouted segment.
    pub fn points(&self) -> &[(f64, f64)] {
        self.polyline.as_ref().map(Polyline::points).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentSummary {
    pub segments: usize,
    pub routed: usize,
    pub straight_line_km: f64,
    /// Sum over routed segments that reported a road distance.
    pub road_km: f64,
}

impl SegmentSummary {
    pub fn of(segments: &[Segment]) -> Self {
        segments.iter().fold(Self::default(), |mut summary, segment| {
            summary.segments += 1;
            summary.straight_line_km += segment.distance_km;
            if segment.is_routed() {
                summary.routed += 1;
            }
            summary.road_km += segment.road_distance_km.unwrap_or(0.0);
            summary
        })
    }
}

struct Hop<'a> {
    from: &'a EntityId,
    to: &'a EntityId,
    from_coord: Coord,
    to_coord: Coord,
}

/// Computes one [`Segment`] per consecutive pair of `tour`, in tour order.
///
/// With a `router`, each hop is also routed over the road network. Routing
/// failures and deadline skips leave the segment with its straight-line
/// distance only.
pub fn compute_segments(
    tour: &Tour,
    positions: &PositionIndex,
    router: Option<&dyn RoutingProvider>,
    config: &RoutingConfig,
) -> Result<Vec<Segment>, SegmentError> {
    let position = |id: &EntityId| {
        positions
            .get(id)
            .ok_or_else(|| SegmentError::MissingPosition(id.clone()))
    };
    let hops = tour
        .pairs()
        .map(|(from, to)| {
            Ok::<_, SegmentError>(Hop {
                from,
                to,
                from_coord: position(from)?,
                to_coord: position(to)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let paths = match router {
        Some(router) => {
            let throttle = Throttle::new(Duration::from_millis(config.request_spacing_ms));
            let deadline = Deadline::after(config.phase_timeout_secs.map(Duration::from_secs));
            workers::run_bounded(&hops, config.concurrency, &throttle, deadline, |hop| {
                match router.route(hop.from_coord, hop.to_coord) {
                    Ok(path) => Some(path),
                    Err(err) => {
                        debug!(from = %hop.from, to = %hop.to, error = %err, "routing failed");
                        None
                    }
                }
            })
        }
        None => hops.iter().map(|_| Attempt::Done(None)).collect(),
    };

    let mut skipped = 0;
    let segments: Vec<Segment> = hops
        .iter()
        .zip(paths)
        .map(|(hop, attempt)| {
            let path = match attempt {
                Attempt::Done(path) => path,
                Attempt::Skipped => {
                    skipped += 1;
                    None
                }
            };
            let (polyline, road_distance_km) = match path {
                Some(path) => (Some(path.polyline), path.distance_m.map(|m| m / 1000.0)),
                None => (None, None),
            };
            Segment {
                from: hop.from.clone(),
                to: hop.to.clone(),
                distance_km: haversine_km(hop.from_coord, hop.to_coord),
                polyline,
                road_distance_km,
            }
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, "routing phase timed out, remaining segments are straight-line only");
    }
    let summary = SegmentSummary::of(&segments);
    info!(
        segments = summary.segments,
        routed = summary.routed,
        straight_line_km = summary.straight_line_km,
        "segments computed"
    );

    Ok(segments)
}
