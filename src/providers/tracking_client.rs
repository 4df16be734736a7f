// =============================================================================
// tracking_client.rs: THE LINE TO THE TRACKING API
// =============================================================================
//
// Thin async client over the vessel tracking REST API:
//
//   GET {base}/ports?name=...        port lookup by name
//   GET {base}/vessels?name=...      vessel listing filtered by name
//   GET {base}/vessels/{mmsi}        one vessel
//
// Authentication is an `api_key` query parameter. The only failure signal we
// read from the API is the HTTP status: anything outside 2xx becomes
// MaritimeError::Upstream carrying the code. No retries, no backoff. A
// failed call fails the query and the user sees why.
//
// The API has no area search. `vessels_in_area` is answered by the
// AreaSimulator, and the batch comes back stamped Synthetic.
// =============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{MaritimeError, Result};
use crate::models::{ApiVessel, PortRecord, VesselBatch, VesselRecord};
use crate::providers::{AreaSimulator, ShipDataProvider};

/// HTTP implementation of [`ShipDataProvider`].
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    simulator: AreaSimulator,
}

impl TrackingClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        info!(
            base_url = config.tracking_base_url.as_str(),
            has_api_key = config.tracking_api_key.is_some(),
            "Tracking client ready"
        );

        Ok(Self {
            http,
            base_url: config.tracking_base_url.clone(),
            api_key: config.tracking_api_key.clone(),
            simulator: AreaSimulator::from_seed(config.simulator_seed),
        })
    }

    /// GET `path` with the API key and `params`, returning the parsed JSON
    /// body. Non-success statuses become `Upstream`.
    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        // base_url always ends with '/', see config::parse_base_url.
        let url = format!("{}{}", self.base_url, path);

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        if let Some(key) = self.api_key.as_deref() {
            query.push(("api_key", key));
        }
        query.extend_from_slice(params);

        debug!(endpoint = path, "Tracking API request");

        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = path, error = %e, "Tracking API unreachable");
                MaritimeError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = path, status = %status, "Tracking API returned non-success status");
            return Err(MaritimeError::Upstream {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|source| MaritimeError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    async fn find_ports(&self, port_name: &str) -> Result<Vec<Value>> {
        let body = self.get_json("ports", &[("name", port_name)]).await?;
        Ok(into_items(body))
    }

    async fn list_vessels(&self, name: &str) -> Result<Vec<VesselRecord>> {
        let body = self.get_json("vessels", &[("name", name)]).await?;
        let items = into_items(body);
        let total = items.len();
        let vessels: Vec<VesselRecord> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match decode_vessel(item, "vessels") {
                Ok(vessel) => Some(vessel),
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed vessel record");
                    None
                }
            })
            .collect();

        if vessels.len() < total {
            debug!(kept = vessels.len(), skipped = total - vessels.len(), "Vessel listing partially decoded");
        }
        Ok(vessels)
    }

    async fn resolve_port(&self, port_name: &str) -> Result<PortRecord> {
        let port = self
            .find_ports(port_name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MaritimeError::NotFound(format!("no ports found with name: {port_name}")))?;
        Ok(PortRecord::from_json(port))
    }
}

#[async_trait]
impl ShipDataProvider for TrackingClient {
    async fn vessels_near_port(&self, port_name: &str) -> Result<VesselBatch> {
        let port = self.resolve_port(port_name).await?;

        // No "vessels at port" endpoint. Pull the broad listing and filter on
        // the name as asked or as the API spells it.
        let all = self.list_vessels("").await?;
        let total = all.len();
        let names: Vec<&str> = [port_name, port.name.as_str()]
            .into_iter()
            .filter(|n| !n.is_empty())
            .collect();
        let related: Vec<VesselRecord> = all
            .into_iter()
            .filter(|v| {
                names
                    .iter()
                    .any(|n| v.destination == *n || v.last_port.as_deref() == Some(*n))
            })
            .collect();

        info!(
            port = port.name.as_str(),
            scanned = total,
            matched = related.len(),
            "Vessels near port resolved"
        );

        Ok(VesselBatch::live(related))
    }

    async fn vessel_by_id(&self, id: &str) -> Result<VesselRecord> {
        let path = format!("vessels/{}", id.trim());
        let body = self.get_json(&path, &[]).await?;
        let item = into_items(body)
            .into_iter()
            .next()
            .ok_or_else(|| MaritimeError::NotFound(format!("no vessel with id {id}")))?;
        decode_vessel(item, &path)
    }

    async fn search_vessels(&self, query: &str, limit: usize) -> Result<VesselBatch> {
        let mut vessels = self.list_vessels(query).await?;
        vessels.truncate(limit);
        debug!(query = query, returned = vessels.len(), "Vessel search complete");
        Ok(VesselBatch::live(vessels))
    }

    async fn vessels_in_area(&self, latitude: f64, longitude: f64, radius: f64) -> VesselBatch {
        self.simulator.generate(latitude, longitude, radius)
    }

    async fn port_info(&self, port_name: &str) -> Result<PortRecord> {
        self.resolve_port(port_name).await
    }
}

/// Normalize a response body into a list of items. Arrays pass through, a
/// `{"data": [...]}` envelope is unwrapped, a bare object is a list of one,
/// null is empty.
fn into_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            Some(inner @ Value::Object(_)) => vec![inner],
            Some(other) => {
                map.insert("data".to_string(), other);
                vec![Value::Object(map)]
            }
            None if map.is_empty() => Vec::new(),
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}

fn decode_vessel(item: Value, endpoint: &str) -> Result<VesselRecord> {
    ApiVessel::from_json(item)
        .map(ApiVessel::into_record)
        .map_err(|source| MaritimeError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}
