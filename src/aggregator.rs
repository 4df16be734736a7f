// =============================================================================
// aggregator.rs: COUNTING HULLS
// =============================================================================
//
// Turns a pile of vessel records into the numbers a traffic report needs:
// how many ships, of which kinds, flying which flags, doing what, pointed
// where, and how fast on average.
//
// Pure function, no I/O. Every count map sums to the total. Missing flags and
// statuses are counted under "Unknown" so nothing silently falls out.
// =============================================================================

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::VesselRecord;

/// Below this many knots a vessel counts as stopped.
pub const STOPPED_SPEED_KNOTS: f64 = 1.0;

const UNKNOWN: &str = "Unknown";

/// The eight 45-degree compass sectors. N is centered on 0 degrees and
/// covers [337.5, 360) plus [0, 22.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HeadingSector {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl HeadingSector {
    const CLOCKWISE: [HeadingSector; 8] = [
        HeadingSector::N,
        HeadingSector::NE,
        HeadingSector::E,
        HeadingSector::SE,
        HeadingSector::S,
        HeadingSector::SW,
        HeadingSector::W,
        HeadingSector::NW,
    ];

    /// Bucket a heading in degrees. Values outside [0, 360) are wrapped
    /// first; non-finite headings have no sector.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let h = degrees.rem_euclid(360.0);
        if !(22.5..337.5).contains(&h) {
            return Some(HeadingSector::N);
        }
        let index = ((h - 22.5) / 45.0).floor() as usize + 1;
        Self::CLOCKWISE.get(index).copied()
    }
}

impl fmt::Display for HeadingSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Everything a traffic report says about a set of vessels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSummary {
    pub region: String,
    pub total: usize,
    pub categories: BTreeMap<String, usize>,
    pub statuses: BTreeMap<String, usize>,
    pub flags: BTreeMap<String, usize>,
    /// Only vessels reporting a heading are counted here.
    pub heading_sectors: BTreeMap<HeadingSector, usize>,
    /// Mean over vessels reporting a speed. 0 when none do.
    pub mean_speed: f64,
    /// Vessels reporting a speed under 1 knot.
    pub stopped: usize,
    pub generated_at: DateTime<Utc>,
}

impl AggregatedSummary {
    /// The most common category, ties broken alphabetically.
    pub fn dominant_category(&self) -> Option<(&str, usize)> {
        self.categories
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| (name.as_str(), *count))
    }
}

pub fn aggregate(region: &str, vessels: &[VesselRecord]) -> AggregatedSummary {
    let mut categories = BTreeMap::new();
    let mut statuses = BTreeMap::new();
    let mut flags = BTreeMap::new();
    let mut heading_sectors = BTreeMap::new();
    let mut speed_sum = 0.0;
    let mut speed_count = 0usize;
    let mut stopped = 0usize;

    for vessel in vessels {
        *categories.entry(vessel.category.to_string()).or_insert(0) += 1;
        *statuses.entry(or_unknown(&vessel.status)).or_insert(0) += 1;
        *flags.entry(or_unknown(&vessel.flag)).or_insert(0) += 1;

        if let Some(sector) = vessel.heading.and_then(HeadingSector::from_degrees) {
            *heading_sectors.entry(sector).or_insert(0) += 1;
        }

        if let Some(speed) = vessel.speed.filter(|s| s.is_finite()) {
            speed_sum += speed;
            speed_count += 1;
            if speed < STOPPED_SPEED_KNOTS {
                stopped += 1;
            }
        }
    }

    let mean_speed = if speed_count > 0 {
        speed_sum / speed_count as f64
    } else {
        0.0
    };

    AggregatedSummary {
        region: region.to_string(),
        total: vessels.len(),
        categories,
        statuses,
        flags,
        heading_sectors,
        mean_speed,
        stopped,
        generated_at: Utc::now(),
    }
}

fn or_unknown(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}
