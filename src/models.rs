// =============================================================================
// models.rs: VESSELS, PORTS, AND THE PAPERWORK IN BETWEEN
// =============================================================================
//
// Two layers live here. The domain types (VesselRecord, PortRecord,
// VesselBatch) are what the rest of the engine works with. The wire types
// (ApiVessel) are what the tracking API actually sends, with every field
// optional and half of them spelled two different ways depending on which
// endpoint you asked.
//
// Nothing in here is persisted. A record is born inside one query, handed to
// the aggregator or the narrative generator, and dropped when the answer is
// printed.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lookup;

/// The category vocabulary. The simulator only ever produces the six named
/// variants; the tracking API occasionally reports something else, which we
/// keep verbatim in `Other` instead of pretending it is cargo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum VesselCategory {
    Cargo,
    Tanker,
    Passenger,
    Fishing,
    Tug,
    PleasureCraft,
    Other(String),
}

impl VesselCategory {
    /// The fixed vocabulary, in display order.
    pub const ALL: [VesselCategory; 6] = [
        VesselCategory::Cargo,
        VesselCategory::Tanker,
        VesselCategory::Passenger,
        VesselCategory::Fishing,
        VesselCategory::Tug,
        VesselCategory::PleasureCraft,
    ];

    /// Map a raw type string from the API (or a user) onto the vocabulary.
    /// Unknown strings are kept as `Other`; empty ones become "Unknown".
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return VesselCategory::Other("Unknown".to_string());
        }
        lookup::find_category(trimmed).unwrap_or_else(|| VesselCategory::Other(trimmed.to_string()))
    }
}

impl fmt::Display for VesselCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VesselCategory::Cargo => write!(f, "Cargo"),
            VesselCategory::Tanker => write!(f, "Tanker"),
            VesselCategory::Passenger => write!(f, "Passenger"),
            VesselCategory::Fishing => write!(f, "Fishing"),
            VesselCategory::Tug => write!(f, "Tug"),
            VesselCategory::PleasureCraft => write!(f, "Pleasure Craft"),
            VesselCategory::Other(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<VesselCategory> for String {
    fn from(category: VesselCategory) -> Self {
        category.to_string()
    }
}

impl From<String> for VesselCategory {
    fn from(raw: String) -> Self {
        VesselCategory::from_raw(&raw)
    }
}

/// One vessel, as the rest of the engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselRecord {
    /// MMSI-equivalent numeric identifier, kept as a string.
    pub id: String,
    pub name: String,
    pub category: VesselCategory,
    /// Knots. `None` when the vessel is not reporting.
    pub speed: Option<f64>,
    /// Degrees in [0, 360). `None` when not reporting (AIS 511 included).
    pub heading: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub flag: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_port: Option<String>,
    /// Navigational status, e.g. "Moored" or "Under way using engine".
    pub status: String,
}

/// A port as returned by the tracking API. Name and coordinates are pulled
/// out for convenience; everything else rides along untouched in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortRecord {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub metadata: serde_json::Value,
}

impl PortRecord {
    /// Build from a raw JSON object. Tolerates the usual spelling variants
    /// (`name`/`port_name`, `lat`/`latitude`, `lon`/`lng`/`longitude`).
    pub fn from_json(raw: serde_json::Value) -> Self {
        let name = first_str(&raw, &["name", "port_name", "port"]).unwrap_or_default();
        let latitude = first_f64(&raw, &["lat", "latitude"]);
        let longitude = first_f64(&raw, &["lon", "lng", "longitude"]);
        PortRecord {
            name,
            latitude,
            longitude,
            metadata: raw,
        }
    }
}

/// A named point with a search radius (nautical miles).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCoordinate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

/// Where a batch of vessels came from. Synthetic batches always carry the
/// disclaimer so nobody mistakes dice rolls for AIS positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Synthetic { note: String },
}

/// Disclaimer attached to every simulated batch.
pub const SYNTHETIC_DATA_NOTE: &str = "Simulated data: the tracking API offers no area search, \
so these vessels were generated at random for demonstration and do not reflect real traffic.";

/// A list of vessels plus where they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselBatch {
    pub vessels: Vec<VesselRecord>,
    pub provenance: Provenance,
}

impl VesselBatch {
    pub fn live(vessels: Vec<VesselRecord>) -> Self {
        VesselBatch {
            vessels,
            provenance: Provenance::Live,
        }
    }

    pub fn synthetic(vessels: Vec<VesselRecord>) -> Self {
        VesselBatch {
            vessels,
            provenance: Provenance::Synthetic {
                note: SYNTHETIC_DATA_NOTE.to_string(),
            },
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.provenance, Provenance::Synthetic { .. })
    }

    /// The disclaimer, if this batch needs one.
    pub fn note(&self) -> Option<&str> {
        match &self.provenance {
            Provenance::Live => None,
            Provenance::Synthetic { note } => Some(note.as_str()),
        }
    }

    /// Keep only the vessels matching `predicate`. Provenance is preserved.
    pub fn retain(mut self, predicate: impl Fn(&VesselRecord) -> bool) -> Self {
        self.vessels.retain(|v| predicate(v));
        self
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A vessel as the tracking API sends it. Numbers sometimes arrive as
/// strings, names sometimes arrive under a different key, and some records
/// carry two spellings of the same field. Fields are read from the raw map
/// key by key, first spelling wins, so the only record we cannot read is one
/// that is not an object at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiVessel {
    pub mmsi: Option<String>,
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    /// Course over ground. Used when no true heading is reported.
    pub course: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub flag: Option<String>,
    pub destination: Option<String>,
    pub last_port: Option<String>,
    pub status: Option<String>,
}

impl ApiVessel {
    /// Read a vessel out of one listing item. Fails only when the item is not
    /// a JSON object.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_value(raw)?;
        let raw = serde_json::Value::Object(map);
        Ok(ApiVessel {
            mmsi: first_text(&raw, &["mmsi", "MMSI"]),
            name: first_text(&raw, &["name", "vessel_name", "vesselName", "NAME"]),
            r#type: first_text(&raw, &["type", "vtype", "vessel_type", "ship_type", "type_name"]),
            speed: first_f64(&raw, &["speed", "sog"]),
            heading: first_f64(&raw, &["heading"]),
            course: first_f64(&raw, &["course", "cog"]),
            lat: first_f64(&raw, &["lat", "latitude"]),
            lon: first_f64(&raw, &["lon", "lng", "longitude"]),
            flag: first_text(&raw, &["flag", "country", "flag_country"]),
            destination: first_text(&raw, &["destination", "dest"]),
            last_port: first_text(&raw, &["last_port", "lastPort", "last_port_name"]),
            status: first_text(&raw, &["status", "nav_status", "navigational_status"]),
        })
    }
}

/// AIS uses 511 for "heading not available".
const AIS_HEADING_UNAVAILABLE: f64 = 511.0;

impl ApiVessel {
    pub fn into_record(self) -> VesselRecord {
        let usable = |h: &f64| h.is_finite() && *h != AIS_HEADING_UNAVAILABLE;
        let heading = self
            .heading
            .filter(usable)
            .or(self.course.filter(usable))
            .map(|h| h.rem_euclid(360.0));

        VesselRecord {
            id: self.mmsi.unwrap_or_default(),
            name: self.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            category: VesselCategory::from_raw(self.r#type.as_deref().unwrap_or("")),
            speed: self.speed.filter(|s| s.is_finite() && *s >= 0.0),
            heading,
            latitude: self.lat,
            longitude: self.lon,
            flag: self.flag.unwrap_or_default(),
            destination: self.destination.unwrap_or_default(),
            last_port: self.last_port.filter(|p| !p.is_empty()),
            status: self.status.unwrap_or_default(),
        }
    }
}

fn json_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First key holding a string, or a number rendered as text.
fn first_text(raw: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| raw.get(*k)).find_map(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_str(raw: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find_map(|v| v.as_str().map(str::to_string))
}

fn first_f64(raw: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| raw.get(*k)).find_map(json_f64)
}
