//! Graph assembly from parsed map-extract records.
//!
//! Parsing the on-disk format is someone else's job; this module only sees
//! already-parsed node and way records, grouped per extract.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::graph::{Coord, Edge, Entity, EntityId, Graph};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeRecord {
    pub id: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WayRecord {
    pub id: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Member node ids, in way order.
    #[serde(default)]
    pub node_refs: Vec<String>,
}

/// Records parsed from one extract.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractBatch {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub ways: Vec<WayRecord>,
}

/// What happens when an id shows up in more than one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The later record replaces the earlier one wholesale.
    #[default]
    LastWins,
    /// The first record is kept, later ones are ignored.
    FirstWins,
}

/// What happens to way edges whose endpoints never appeared as nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingRefPolicy {
    /// Fail the build with [`BuildError::DanglingEdge`].
    #[default]
    Reject,
    /// Drop the edge and count it.
    Drop,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub merge: MergePolicy,
    pub dangling_refs: DanglingRefPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub batches: usize,
    pub nodes: usize,
    pub ways: usize,
    /// Records without a usable id.
    pub skipped_records: usize,
    /// Way member refs that were empty.
    pub skipped_refs: usize,
    /// Nodes whose inline coordinate was present but unusable.
    pub invalid_coordinates: usize,
    /// Records whose id was already present.
    pub overwritten: usize,
    pub edges: usize,
    pub dropped_edges: usize,
}

/// Accumulates batches into one graph.
///
/// Way edges are held back until [`GraphBuilder::finish`] so that a way may
/// reference nodes that arrive in a later batch.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
    config: GraphConfig,
    pending_edges: BTreeSet<Edge>,
    report: BuildReport,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn add_batch(&mut self, batch: ExtractBatch) {
        self.report.batches += 1;
        debug!(
            batch = self.report.batches,
            nodes = batch.nodes.len(),
            ways = batch.ways.len(),
            "adding extract batch"
        );

        for node in batch.nodes {
            self.add_node(node);
        }
        for way in batch.ways {
            self.add_way(way);
        }
    }

    fn add_node(&mut self, record: NodeRecord) {
        let Some(raw) = normalize_id(record.id.as_deref()) else {
            self.report.skipped_records += 1;
            return;
        };

        let mut entity = Entity::new(EntityId::node(raw), record.tags);
        match (record.lat, record.lon) {
            (Some(lat), Some(lon)) => match Coord::checked(lat, lon) {
                Some(coord) => entity = entity.with_coord(coord),
                None => {
                    debug!(id = %entity.id, lat, lon, "ignoring out-of-range inline coordinate");
                    self.report.invalid_coordinates += 1;
                }
            },
            (None, None) => {}
            _ => self.report.invalid_coordinates += 1,
        }

        self.report.nodes += 1;
        self.insert(entity);
    }

    fn add_way(&mut self, record: WayRecord) {
        let Some(raw) = normalize_id(record.id.as_deref()) else {
            self.report.skipped_records += 1;
            return;
        };

        let mut members = Vec::with_capacity(record.node_refs.len());
        for node_ref in &record.node_refs {
            match normalize_id(Some(node_ref)) {
                Some(raw) => members.push(EntityId::node(raw)),
                None => self.report.skipped_refs += 1,
            }
        }
        // Connectivity is between consecutive members; the way entity itself
        // gets no edges.
        for pair in members.windows(2) {
            if let Some(edge) = Edge::new(pair[0].clone(), pair[1].clone()) {
                self.pending_edges.insert(edge);
            }
        }

        self.report.ways += 1;
        self.insert(Entity::new(EntityId::way(raw), record.tags));
    }

    fn insert(&mut self, entity: Entity) {
        if self.graph.contains(&entity.id) {
            self.report.overwritten += 1;
            if self.config.merge == MergePolicy::FirstWins {
                return;
            }
        }
        self.graph.upsert(entity);
    }

    /// Resolves deferred edges and returns the merged graph.
    pub fn finish(mut self) -> Result<(Graph, BuildReport), BuildError> {
        for edge in std::mem::take(&mut self.pending_edges) {
            let (a, b) = edge.endpoints();
            if let Err(missing) = self.graph.add_edge(a, b) {
                match self.config.dangling_refs {
                    DanglingRefPolicy::Reject => {
                        return Err(BuildError::DanglingEdge {
                            from: a.clone(),
                            to: b.clone(),
                            missing,
                        });
                    }
                    DanglingRefPolicy::Drop => {
                        debug!(from = %a, to = %b, %missing, "dropping dangling edge");
                        self.report.dropped_edges += 1;
                    }
                }
            }
        }
        self.report.edges = self.graph.edge_count();

        if self.report.skipped_records > 0 {
            warn!(skipped = self.report.skipped_records, "skipped records without an id");
        }
        if self.report.dropped_edges > 0 {
            warn!(dropped = self.report.dropped_edges, "dropped edges to unknown nodes");
        }
        info!(
            entities = self.graph.len(),
            edges = self.report.edges,
            batches = self.report.batches,
            "graph assembled"
        );

        Ok((self.graph, self.report))
    }
}

/// Builds one graph out of several extracts, applied in the given order.
pub fn build_graph<I>(batches: I, config: &GraphConfig) -> Result<(Graph, BuildReport), BuildError>
where
    I: IntoIterator<Item = ExtractBatch>,
{
    let mut builder = GraphBuilder::new(config.clone());
    for batch in batches {
        builder.add_batch(batch);
    }
    builder.finish()
}

fn normalize_id(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|id| !id.is_empty())
}
