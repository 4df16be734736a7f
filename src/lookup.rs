// =============================================================================
// lookup.rs: THE HARBOUR MASTER'S LITTLE BLACK BOOK
// =============================================================================
//
// Static tables that turn free text into something canonical:
//
// 1. Regions: "suez", "malacca", "guanabara" and friends map to a name,
//    a center point and a search radius.
// 2. Vessel categories: "petroleiro", "tanker" and "oil tanker" all mean
//    Tanker. Portuguese and English both welcome.
// 3. Flags: "liberian", "libéria" and "liberia" all mean Liberia.
//
// Each table is compiled once into an Aho-Corasick automaton. Matching is a
// case-insensitive substring search where the leftmost-longest keyword wins,
// so "canal do panamá" finds "panamá" and "oil tanker" finds "tanker".
// Non-ASCII letters are matched exactly; callers lowercase their input first.
// =============================================================================

use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::debug;

use crate::models::{RegionCoordinate, VesselCategory};

/// One predefined maritime region.
#[derive(Debug, Clone, Copy)]
pub struct RegionEntry {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in nautical miles.
    pub radius: f64,
}

impl RegionEntry {
    pub fn coordinate(&self) -> RegionCoordinate {
        RegionCoordinate {
            name: self.name.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            radius: self.radius,
        }
    }
}

/// The predefined regions the dashboard always offered, with the spellings
/// people actually type.
pub const REGIONS: &[RegionEntry] = &[
    RegionEntry {
        name: "Canal de Suez",
        keywords: &["suez"],
        latitude: 30.4276,
        longitude: 32.3439,
        radius: 80.0,
    },
    RegionEntry {
        name: "Estreito de Malaca",
        keywords: &["malaca", "malacca"],
        latitude: 1.7691,
        longitude: 101.0608,
        radius: 100.0,
    },
    RegionEntry {
        name: "Canal do Panamá",
        keywords: &["panamá", "panama"],
        latitude: 9.0800,
        longitude: -79.6800,
        radius: 70.0,
    },
    RegionEntry {
        name: "Porto de Santos",
        keywords: &["santos"],
        latitude: -23.9619,
        longitude: -46.3042,
        radius: 40.0,
    },
    RegionEntry {
        name: "Porto de Singapura",
        keywords: &["singapura", "singapore"],
        latitude: 1.2903,
        longitude: 103.8521,
        radius: 40.0,
    },
    RegionEntry {
        name: "Porto de Roterdã",
        keywords: &["roterdã", "roterda", "rotterdam"],
        latitude: 51.9244,
        longitude: 4.4777,
        radius: 40.0,
    },
    RegionEntry {
        name: "Estreito de Gibraltar",
        keywords: &["gibraltar"],
        latitude: 36.0000,
        longitude: -5.6000,
        radius: 50.0,
    },
    RegionEntry {
        name: "Baía de Guanabara",
        keywords: &["guanabara"],
        latitude: -22.8350,
        longitude: -43.2931,
        radius: 30.0,
    },
];

/// Category keywords. Order inside a row does not matter; leftmost-longest
/// matching decides between overlapping words.
static CATEGORY_KEYWORDS: &[(&str, VesselCategory)] = &[
    ("cargo", VesselCategory::Cargo),
    ("carga", VesselCategory::Cargo),
    ("cargueiro", VesselCategory::Cargo),
    ("container", VesselCategory::Cargo),
    ("contêiner", VesselCategory::Cargo),
    ("conteiner", VesselCategory::Cargo),
    ("porta-contêineres", VesselCategory::Cargo),
    ("graneleiro", VesselCategory::Cargo),
    ("bulk", VesselCategory::Cargo),
    ("tanker", VesselCategory::Tanker),
    ("petroleiro", VesselCategory::Tanker),
    ("navio-tanque", VesselCategory::Tanker),
    ("tanque", VesselCategory::Tanker),
    ("passenger", VesselCategory::Passenger),
    ("passageiro", VesselCategory::Passenger),
    ("cruzeiro", VesselCategory::Passenger),
    ("cruise", VesselCategory::Passenger),
    ("ferry", VesselCategory::Passenger),
    ("balsa", VesselCategory::Passenger),
    ("fishing", VesselCategory::Fishing),
    ("pesca", VesselCategory::Fishing),
    ("pesqueiro", VesselCategory::Fishing),
    ("tug", VesselCategory::Tug),
    ("rebocador", VesselCategory::Tug),
    ("pleasure", VesselCategory::PleasureCraft),
    ("recreio", VesselCategory::PleasureCraft),
    ("lazer", VesselCategory::PleasureCraft),
    ("iate", VesselCategory::PleasureCraft),
    ("yacht", VesselCategory::PleasureCraft),
    ("veleiro", VesselCategory::PleasureCraft),
    ("sailing", VesselCategory::PleasureCraft),
];

/// Flag keywords mapped to the flag names the simulator and the API use.
static FLAG_KEYWORDS: &[(&str, &str)] = &[
    ("panamá", "Panama"),
    ("panama", "Panama"),
    ("panamenha", "Panama"),
    ("panamanian", "Panama"),
    ("libéria", "Liberia"),
    ("liberia", "Liberia"),
    ("liberiana", "Liberia"),
    ("liberian", "Liberia"),
    ("marshall", "Marshall Islands"),
    ("malta", "Malta"),
    ("maltesa", "Malta"),
    ("maltese", "Malta"),
    ("bahamas", "Bahamas"),
    ("singapura", "Singapore"),
    ("singapore", "Singapore"),
    ("brasil", "Brazil"),
    ("brazil", "Brazil"),
    ("brasileira", "Brazil"),
    ("brazilian", "Brazil"),
    ("china", "China"),
    ("chinesa", "China"),
    ("chinese", "China"),
    ("grécia", "Greece"),
    ("grecia", "Greece"),
    ("greece", "Greece"),
    ("grega", "Greece"),
    ("greek", "Greece"),
    ("noruega", "Norway"),
    ("norway", "Norway"),
    ("norueguesa", "Norway"),
    ("norwegian", "Norway"),
];

fn build_automaton(keywords: impl IntoIterator<Item = &'static str>, what: &str) -> AhoCorasick {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(keywords)
        .unwrap_or_else(|e| panic!("failed to build {what} automaton: {e}"))
}

/// Flattened (keyword, region index) pairs, in automaton pattern order.
static REGION_KEYWORD_INDEX: LazyLock<Vec<usize>> = LazyLock::new(|| {
    REGIONS
        .iter()
        .enumerate()
        .flat_map(|(i, r)| r.keywords.iter().map(move |_| i))
        .collect()
});

static REGION_AUTOMATON: LazyLock<AhoCorasick> = LazyLock::new(|| {
    build_automaton(REGIONS.iter().flat_map(|r| r.keywords.iter().copied()), "region")
});

static CATEGORY_AUTOMATON: LazyLock<AhoCorasick> =
    LazyLock::new(|| build_automaton(CATEGORY_KEYWORDS.iter().map(|(k, _)| *k), "category"));

static FLAG_AUTOMATON: LazyLock<AhoCorasick> =
    LazyLock::new(|| build_automaton(FLAG_KEYWORDS.iter().map(|(k, _)| *k), "flag"));

/// Find the predefined region mentioned anywhere in `text`.
pub fn find_region(text: &str) -> Option<&'static RegionEntry> {
    let found = REGION_AUTOMATON.find(text)?;
    let region = REGIONS.get(*REGION_KEYWORD_INDEX.get(found.pattern().as_usize())?)?;
    debug!(text = text, region = region.name, "region keyword matched");
    Some(region)
}

/// Find the canonical category mentioned anywhere in `text`.
pub fn find_category(text: &str) -> Option<VesselCategory> {
    let found = CATEGORY_AUTOMATON.find(text)?;
    CATEGORY_KEYWORDS
        .get(found.pattern().as_usize())
        .map(|(_, category)| category.clone())
}

/// Find the canonical flag mentioned anywhere in `text`.
pub fn find_flag(text: &str) -> Option<&'static str> {
    let found = FLAG_AUTOMATON.find(text)?;
    FLAG_KEYWORDS.get(found.pattern().as_usize()).map(|(_, flag)| *flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_found_inside_longer_text() {
        let region = find_region("canal de suez").unwrap();
        assert_eq!(region.name, "Canal de Suez");
        assert_eq!(region.radius, 80.0);
    }

    #[test]
    fn test_region_language_variants() {
        assert_eq!(find_region("strait of malacca").unwrap().name, "Estreito de Malaca");
        assert_eq!(find_region("porto de roterdã").unwrap().name, "Porto de Roterdã");
        assert_eq!(find_region("ROTTERDAM").unwrap().name, "Porto de Roterdã");
    }

    #[test]
    fn test_unknown_region() {
        assert!(find_region("mar do norte").is_none());
        assert!(find_region("").is_none());
    }

    #[test]
    fn test_category_variants() {
        assert_eq!(find_category("cargo"), Some(VesselCategory::Cargo));
        assert_eq!(find_category("petroleiros"), Some(VesselCategory::Tanker));
        assert_eq!(find_category("Oil Tanker"), Some(VesselCategory::Tanker));
        assert_eq!(find_category("iates de recreio"), Some(VesselCategory::PleasureCraft));
        assert_eq!(find_category("rebocador"), Some(VesselCategory::Tug));
        assert_eq!(find_category("submarino"), None);
    }

    #[test]
    fn test_flag_variants() {
        assert_eq!(find_flag("liberian"), Some("Liberia"));
        assert_eq!(find_flag("do brasil"), Some("Brazil"));
        assert_eq!(find_flag("marshall islands"), Some("Marshall Islands"));
        assert_eq!(find_flag("atlantis"), None);
    }

    #[test]
    fn test_every_region_has_a_reachable_keyword() {
        for region in REGIONS {
            for keyword in region.keywords {
                assert_eq!(find_region(keyword).map(|r| r.name), Some(region.name));
            }
        }
    }
}
