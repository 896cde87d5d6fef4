//! OpenStreetMap API v0.6 adapter for coordinate lookups.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::LookupError;
use crate::graph::{Coord, EntityId};
use crate::traits::CoordinateLookup;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsmApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// The public API rejects anonymous clients.
    pub user_agent: String,
}

impl Default for OsmApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openstreetmap.org".to_string(),
            timeout_secs: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsmApiClient {
    config: OsmApiConfig,
    client: reqwest::blocking::Client,
}

impl OsmApiClient {
    pub fn new(config: OsmApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    fn element_url(&self, id: &EntityId) -> String {
        format!(
            "{}/api/0.6/{}/{}.json",
            self.config.base_url.trim_end_matches('/'),
            id.kind().as_str(),
            id.raw()
        )
    }
}

impl CoordinateLookup for OsmApiClient {
    fn lookup(&self, id: &EntityId) -> Result<Coord, LookupError> {
        let response = self.client.get(self.element_url(id)).send()?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => return Err(LookupError::NotFound),
            status if !status.is_success() => return Err(LookupError::Status(status.as_u16())),
            _ => {}
        }

        let body = response
            .json::<ElementResponse>()
            .map_err(|err| LookupError::Malformed(err.to_string()))?;
        coord_from_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct ElementResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    lat: Option<f64>,
    lon: Option<f64>,
}

fn coord_from_response(body: ElementResponse) -> Result<Coord, LookupError> {
    let element = body
        .elements
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::Malformed("response has no elements".to_string()))?;

    match (element.lat, element.lon) {
        (Some(lat), Some(lon)) => Coord::checked(lat, lon)
            .ok_or_else(|| LookupError::Malformed(format!("coordinate out of range: {lat}, {lon}"))),
        _ => Err(LookupError::MissingCoordinate),
    }
}
