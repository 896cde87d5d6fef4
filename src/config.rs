//! Planner configuration, loadable from TOML.
//!
//! Every section is optional and falls back to its defaults. The `[osrm]`
//! section is the exception: leaving it out disables road routing.

use std::path::Path;

use serde::Deserialize;

pub use crate::facility::FacilityQuery;
pub use crate::ingest::{DanglingRefPolicy, GraphConfig, MergePolicy};
pub use crate::osm_api::OsmApiConfig;
pub use crate::osrm::OsrmConfig;
pub use crate::resolver::ResolverConfig;
pub use crate::segments::RoutingConfig;

use crate::error::ConfigError;
use crate::osm_api::OsmApiClient;
use crate::osrm::OsrmClient;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub graph: GraphConfig,
    pub facility: FacilityQuery,
    pub resolver: ResolverConfig,
    pub routing: RoutingConfig,
    pub osm_api: OsmApiConfig,
    pub osrm: Option<OsrmConfig>,
}

impl PlannerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn coordinate_client(&self) -> Result<OsmApiClient, reqwest::Error> {
        OsmApiClient::new(self.osm_api.clone())
    }

    /// `None` when routing is not configured.
    pub fn routing_client(&self) -> Result<Option<OsrmClient>, reqwest::Error> {
        self.osrm.clone().map(OsrmClient::new).transpose()
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<PlannerConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    PlannerConfig::from_toml_str(&contents)
}
