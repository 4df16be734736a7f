// =============================================================================
// providers/mod.rs: WHERE VESSELS COME FROM
// =============================================================================
//
// One trait, two kinds of source behind it:
//
// - TrackingClient talks to the real tracking API over HTTP. It can look up
//   ports, look up a vessel by MMSI, and search vessels by name.
// - AreaSimulator makes vessels up. The tracking API has no "what is near
//   this point" endpoint, so area queries are answered with random vessels,
//   and every batch the simulator produces is stamped Synthetic with a
//   disclaimer. That stamp is the contract: nobody downstream gets to treat
//   simulated traffic as real.
//
// The executor, the region analysis and the chat session all take a
// `&dyn ShipDataProvider`, which is how the tests swap in fakes.
// =============================================================================

pub mod area_simulator;
pub mod tracking_client;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PortRecord, VesselBatch, VesselRecord};

pub use area_simulator::AreaSimulator;
pub use tracking_client::TrackingClient;

/// Everything the engine can ask about ships and ports.
#[async_trait]
pub trait ShipDataProvider: Send + Sync {
    /// Vessels whose destination or last port is exactly `port_name`.
    async fn vessels_near_port(&self, port_name: &str) -> Result<VesselBatch>;

    /// One vessel by its MMSI-equivalent identifier.
    async fn vessel_by_id(&self, id: &str) -> Result<VesselRecord>;

    /// Name-substring search, first `limit` results.
    async fn search_vessels(&self, query: &str, limit: usize) -> Result<VesselBatch>;

    /// Vessels around a point. Never fails; may be synthetic, check the
    /// batch provenance.
    async fn vessels_in_area(&self, latitude: f64, longitude: f64, radius: f64) -> VesselBatch;

    /// The first port matching `port_name`, verbatim.
    async fn port_info(&self, port_name: &str) -> Result<PortRecord>;
}
