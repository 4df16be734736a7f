// =============================================================================
// area_simulator.rs: THE DICE-ROLLING HARBOUR
// =============================================================================
//
// The tracking API cannot answer "which ships are near this point", so this
// module invents an answer. Each call produces between 5 and 15 vessels with
// a uniformly random category, flag, destination and status, a speed between
// 0 and 20 knots, a heading in [0, 360), and a position scattered around the
// requested center by up to radius/50 degrees in each axis.
//
// This is a demo substitute, not a data source. Every batch is returned as
// VesselBatch::synthetic, which stamps the disclaimer on it. Seed it for
// reproducible runs and tests.
// =============================================================================

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::models::{VesselBatch, VesselCategory, VesselRecord};

pub const MIN_VESSELS: usize = 5;
pub const MAX_VESSELS: usize = 15;
pub const MAX_SPEED_KNOTS: f64 = 20.0;

/// Degrees of jitter per nautical mile of radius.
const JITTER_DIVISOR: f64 = 50.0;

const FLAGS: &[&str] = &[
    "Panama",
    "Liberia",
    "Marshall Islands",
    "Malta",
    "Bahamas",
    "Singapore",
    "Brazil",
    "China",
    "Greece",
    "Norway",
];

const DESTINATIONS: &[&str] = &[
    "Santos",
    "Rio de Janeiro",
    "Paranaguá",
    "Rotterdam",
    "Singapore",
    "Shanghai",
    "Houston",
    "Hamburg",
    "Antwerp",
    "Los Angeles",
];

const STATUSES: &[&str] = &[
    "Under way using engine",
    "At anchor",
    "Moored",
    "Not under command",
    "Restricted manoeuvrability",
    "Engaged in fishing",
];

const NAME_FIRST: &[&str] = &[
    "Atlantic", "Pacific", "Ocean", "Southern", "Nordic", "Coral", "Golden", "Blue", "Iron", "Silver",
];

const NAME_SECOND: &[&str] = &[
    "Star", "Pioneer", "Spirit", "Voyager", "Horizon", "Trader", "Explorer", "Breeze", "Dawn", "Wave",
];

/// Generates synthetic vessel batches around a point.
pub struct AreaSimulator {
    rng: Mutex<StdRng>,
}

impl AreaSimulator {
    /// A simulator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A simulator that produces the same sequence of batches every run.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build from an optional configured seed.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    /// Roll a batch of vessels around (`latitude`, `longitude`).
    pub fn generate(&self, latitude: f64, longitude: f64, radius: f64) -> VesselBatch {
        let mut rng = self.rng.lock();

        let jitter = (radius / JITTER_DIVISOR).abs();
        let jitter = if jitter.is_finite() { jitter } else { 0.0 };

        let count = rng.gen_range(MIN_VESSELS..=MAX_VESSELS);
        let vessels: Vec<VesselRecord> = (0..count)
            .map(|_| {
                let category = pick(&mut *rng, &VesselCategory::ALL).clone();
                VesselRecord {
                    id: rng.gen_range(200_000_000u32..=775_999_999).to_string(),
                    name: format!("{} {}", pick(&mut *rng, NAME_FIRST), pick(&mut *rng, NAME_SECOND)),
                    category,
                    speed: Some(rng.gen_range(0.0..=MAX_SPEED_KNOTS)),
                    heading: Some(rng.gen_range(0.0..360.0)),
                    latitude: Some(latitude + rng.gen_range(-jitter..=jitter)),
                    longitude: Some(longitude + rng.gen_range(-jitter..=jitter)),
                    flag: pick(&mut *rng, FLAGS).to_string(),
                    destination: pick(&mut *rng, DESTINATIONS).to_string(),
                    last_port: None,
                    status: pick(&mut *rng, STATUSES).to_string(),
                }
            })
            .collect();

        debug!(
            latitude = latitude,
            longitude = longitude,
            radius = radius,
            count = vessels.len(),
            "Area simulator rolled a synthetic batch"
        );

        VesselBatch::synthetic(vessels)
    }
}

impl Default for AreaSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform pick from a non-empty table.
fn pick<'a, T>(rng: &mut StdRng, table: &'a [T]) -> &'a T {
    &table[rng.gen_range(0..table.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SYNTHETIC_DATA_NOTE;

    #[test]
    fn test_batch_size_and_ranges_hold_over_many_rolls() {
        let sim = AreaSimulator::with_seed(7);
        for _ in 0..200 {
            let batch = sim.generate(-23.96, -46.30, 40.0);
            assert!((MIN_VESSELS..=MAX_VESSELS).contains(&batch.len()));
            for v in &batch.vessels {
                let heading = v.heading.unwrap();
                let speed = v.speed.unwrap();
                assert!((0.0..360.0).contains(&heading));
                assert!((0.0..=MAX_SPEED_KNOTS).contains(&speed));
                assert!((v.latitude.unwrap() - -23.96).abs() <= 0.8 + 1e-9);
                assert!((v.longitude.unwrap() - -46.30).abs() <= 0.8 + 1e-9);
                assert!(VesselCategory::ALL.contains(&v.category));
                assert!(v.id.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn test_every_batch_carries_the_disclaimer() {
        let sim = AreaSimulator::with_seed(1);
        for _ in 0..20 {
            let batch = sim.generate(0.0, 0.0, 50.0);
            assert!(batch.is_synthetic());
            assert_eq!(batch.note(), Some(SYNTHETIC_DATA_NOTE));
        }
    }

    #[test]
    fn test_same_seed_same_batch() {
        let a = AreaSimulator::with_seed(42).generate(1.0, 2.0, 50.0);
        let b = AreaSimulator::with_seed(42).generate(1.0, 2.0, 50.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_radius_pins_position() {
        let batch = AreaSimulator::with_seed(3).generate(10.0, 20.0, 0.0);
        for v in &batch.vessels {
            assert_eq!(v.latitude, Some(10.0));
            assert_eq!(v.longitude, Some(20.0));
        }
    }
}
