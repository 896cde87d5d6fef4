//! OSRM HTTP adapter for road-network routes.

use serde::Deserialize;

use crate::error::RoutingError;
use crate::graph::Coord;
use crate::polyline::Polyline;
use crate::traits::{RoutedPath, RoutingProvider};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, from: Coord, to: Coord) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?geometries=geojson&overview=full",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.lon,
            from.lat,
            to.lon,
            to.lat
        )
    }
}

impl RoutingProvider for OsrmClient {
    fn route(&self, from: Coord, to: Coord) -> Result<RoutedPath, RoutingError> {
        let response = self.client.get(self.route_url(from, to)).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let body = response
            .json::<OsrmRouteResponse>()
            .map_err(|err| RoutingError::Malformed(err.to_string()))?;
        path_from_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

fn path_from_response(body: OsrmRouteResponse) -> Result<RoutedPath, RoutingError> {
    match body.code.as_str() {
        "Ok" => {}
        "NoRoute" => return Err(RoutingError::NoRoute),
        other => return Err(RoutingError::Malformed(format!("response code {other}"))),
    }

    let route = body.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
    Ok(RoutedPath {
        polyline: Polyline::from_lon_lat(&route.geometry.coordinates),
        distance_m: route.distance,
    })
}
