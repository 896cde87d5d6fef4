//! One planning run: build, resolve and select once, then answer tour
//! requests against the prepared state.

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::{BuildError, PlanError};
use crate::facility::{select_facilities, FacilitySet};
use crate::graph::{Coord, EntityId, Graph};
use crate::ingest::{build_graph, BuildReport, ExtractBatch};
use crate::osrm::OsrmClient;
use crate::planner::{plan_tour, Tour};
use crate::resolver::{CoordinateResolver, PositionIndex, ResolveReport};
use crate::segments::{compute_segments, RoutingConfig, Segment};
use crate::traits::{CoordinateLookup, RoutingProvider};

/// A tour stop as handed to a rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: EntityId,
    pub label: String,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TourPlan {
    pub tour: Tour,
    pub segments: Vec<Segment>,
    pub waypoints: Vec<Waypoint>,
}

/// Prepared graph, positions and facilities for one run.
#[derive(Debug)]
pub struct PlanningSession {
    graph: Graph,
    build_report: BuildReport,
    positions: PositionIndex,
    resolve_report: ResolveReport,
    facilities: FacilitySet,
    routing: RoutingConfig,
    router: Option<OsrmClient>,
}

impl PlanningSession {
    /// Builds the graph from `batches`, resolves coordinates and selects
    /// facilities.
    ///
    /// The resolver is borrowed so its cache can outlive the session. When
    /// `config.osrm` is set, tours are routed through that OSRM instance; a
    /// client that cannot be built disables routing with a warning.
    pub fn prepare<I, L>(
        batches: I,
        resolver: &CoordinateResolver<L>,
        config: &PlannerConfig,
    ) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = ExtractBatch>,
        L: CoordinateLookup,
    {
        let (mut graph, build_report) = build_graph(batches, &config.graph)?;
        info!(total = graph.len(), "entities in graph");

        let (positions, resolve_report) = resolver.resolve(&mut graph);
        info!(with_coordinates = positions.len(), "entities with coordinates");

        let facilities = select_facilities(&graph, &config.facility);
        for (id, label) in facilities.iter() {
            info!(%id, %label, "facility");
        }

        let router = match config.routing_client() {
            Ok(router) => router,
            Err(err) => {
                warn!(error = %err, "OSRM client unavailable, segments will be straight-line only");
                None
            }
        };

        Ok(Self {
            graph,
            build_report,
            positions,
            resolve_report,
            facilities,
            routing: config.routing.clone(),
            router,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn build_report(&self) -> &BuildReport {
        &self.build_report
    }

    pub fn positions(&self) -> &PositionIndex {
        &self.positions
    }

    pub fn resolve_report(&self) -> &ResolveReport {
        &self.resolve_report
    }

    pub fn facilities(&self) -> &FacilitySet {
        &self.facilities
    }

    /// Whether a routing service was configured.
    pub fn routing_enabled(&self) -> bool {
        self.router.is_some()
    }

    /// Plans a tour from `start`, routed through the configured OSRM
    /// instance if there is one.
    pub fn plan_tour(&self, start: &EntityId) -> Result<TourPlan, PlanError> {
        self.plan(start, self.configured_router())
    }

    /// Plans a tour from `start` with straight-line segments only.
    pub fn plan_straight_line_tour(&self, start: &EntityId) -> Result<TourPlan, PlanError> {
        self.plan(start, None)
    }

    /// Like [`plan_tour`](Self::plan_tour), routing through `router` instead
    /// of the configured service.
    pub fn plan_tour_with_router(
        &self,
        start: &EntityId,
        router: &dyn RoutingProvider,
    ) -> Result<TourPlan, PlanError> {
        self.plan(start, Some(router))
    }

    /// Plans from the first facility whose label is `label`.
    ///
    /// `router` overrides the configured service; `None` uses it.
    pub fn plan_tour_by_label(
        &self,
        label: &str,
        router: Option<&dyn RoutingProvider>,
    ) -> Result<TourPlan, PlanError> {
        let start = self
            .facilities
            .find_by_label(label)
            .ok_or_else(|| PlanError::UnknownLabel(label.to_string()))?;
        self.plan(start, router.or(self.configured_router()))
    }

    fn configured_router(&self) -> Option<&dyn RoutingProvider> {
        self.router.as_ref().map(|client| client as &dyn RoutingProvider)
    }

    fn plan(
        &self,
        start: &EntityId,
        router: Option<&dyn RoutingProvider>,
    ) -> Result<TourPlan, PlanError> {
        let tour = plan_tour(start, &self.facilities, &self.positions)?;
        let segments = compute_segments(&tour, &self.positions, router, &self.routing)?;
        let waypoints = tour
            .ids()
            .iter()
            .filter_map(|id| {
                Some(Waypoint {
                    id: id.clone(),
                    label: self.facilities.label(id)?.to_string(),
                    coord: self.positions.get(id)?,
                })
            })
            .collect();

        info!(start = %start, stops = tour.len(), "tour planned");
        Ok(TourPlan {
            tour,
            segments,
            waypoints,
        })
    }
}
