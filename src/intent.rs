// =============================================================================
// intent.rs: WHAT DID THE CAPTAIN MEAN
// =============================================================================
//
// Free text in, one of seven intents out. This is not NLU. It is a list of
// regular expressions, tried top to bottom, and the first one that matches
// decides. The list is grouped by intent and the groups run in a fixed
// order:
//
//   port -> vessel name -> vessel id -> region -> vessel type -> flag
//
// so "buscar navio 123456789" is a name search even though it also contains
// a perfectly good MMSI. Anything the table doesn't recognize is `general`,
// and the narrative layer deals with it.
//
// Every rule has a name. The name is logged at debug level and every rule
// has its own test, so when someone asks "why did it think that" the answer
// is one grep away.
// =============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;

use crate::lookup;

/// The fixed set of things a question can be about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    PortInfo,
    VesselSearch,
    VesselById,
    ShipsInArea,
    VesselTypeSearch,
    FlagSearch,
    General,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::PortInfo => "port_info",
            IntentKind::VesselSearch => "vessel_search",
            IntentKind::VesselById => "vessel_by_id",
            IntentKind::ShipsInArea => "ships_in_area",
            IntentKind::VesselTypeSearch => "vessel_type_search",
            IntentKind::FlagSearch => "flag_search",
            IntentKind::General => "general",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value. Coordinates and radii are numbers, everything else is
/// text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

/// Parameter key used by port rules that ask for the ships at a port rather
/// than the port itself.
pub const SCOPE_VESSELS: &str = "vessels";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryIntent {
    pub kind: IntentKind,
    pub params: BTreeMap<String, ParamValue>,
}

impl QueryIntent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn general() -> Self {
        Self::new(IntentKind::General)
    }

    pub fn with_text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), ParamValue::Text(value.into()));
        self
    }

    pub fn with_number(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), ParamValue::Number(value));
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.params.get(key) {
            Some(ParamValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

// =============================================================================
// THE RULE TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleGroup {
    Port,
    VesselName,
    VesselId,
    Region,
    VesselType,
    Flag,
}

struct IntentRule {
    group: RuleGroup,
    name: &'static str,
    pattern: Regex,
    build: fn(&Captures) -> QueryIntent,
}

fn rule(group: RuleGroup, name: &'static str, pattern: &str, build: fn(&Captures) -> QueryIntent) -> IntentRule {
    IntentRule {
        group,
        name,
        pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("intent rule {name} does not compile: {e}")),
        build,
    }
}

/// A place name: starts with a letter, then letters, spaces, apostrophes
/// and hyphens.
const PLACE: &str = r"[\p{L}][\p{L}\s'-]*";
const SHIPS: &str = r"(?:navios|embarcações|embarcacoes|barcos|ships|vessels|boats)";
const SHIP: &str = r"(?:navio|embarcação|embarcacao|barco|ship|vessel|boat)";

static RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    vec![
        // ---- port --------------------------------------------------------
        rule(
            RuleGroup::Port,
            "ships_at_port",
            &format!(
                r"\b{SHIPS}\s+(?:n[oa]|em|at|in|near)\s+(?:o\s+|the\s+)?(?:porto\s+(?:de|do|da)|port\s+of)\s+(?P<port>{PLACE})"
            ),
            |c| port_intent(c).with_text("scope", SCOPE_VESSELS),
        ),
        rule(
            RuleGroup::Port,
            "porto_de",
            &format!(r"\bporto\s+(?:de|do|da)\s+(?P<port>{PLACE})"),
            port_intent,
        ),
        rule(
            RuleGroup::Port,
            "port_of",
            &format!(r"\bport\s+of\s+(?P<port>{PLACE})"),
            port_intent,
        ),
        // ---- vessel name -------------------------------------------------
        rule(
            RuleGroup::VesselName,
            "ship_named",
            &format!(r"\b{SHIP}\s+(?:chamad[oa]|de\s+nome|named|called)\s+(?P<name>.+)"),
            name_intent,
        ),
        rule(
            RuleGroup::VesselName,
            "search_ship",
            &format!(
                r"\b(?:buscar|busque|procurar|procure|pesquisar|pesquise|search\s+for|search|find|look\s+up)\s+(?:o\s+|a\s+|the\s+)?{SHIP}\s+(?P<name>.+)"
            ),
            name_intent,
        ),
        // ---- vessel id ---------------------------------------------------
        rule(
            RuleGroup::VesselId,
            "mmsi_or_imo",
            r"\b(?:mmsi|imo)\s*(?:n[ºo°.]?\s*)?[:#]?\s*(?P<id>\d{7,9})\b",
            id_intent,
        ),
        rule(RuleGroup::VesselId, "bare_mmsi", r"\b(?P<id>\d{9})\b", id_intent),
        // ---- region ------------------------------------------------------
        rule(
            RuleGroup::Region,
            "traffic_in_place",
            &format!(
                r"\b(?:{SHIPS}|tráfego|trafego|traffic)\s+(?:n[oa]s?|em|in|near|around|at|on)\s+(?:the\s+)?(?P<place>{PLACE})"
            ),
            region_intent,
        ),
        rule(
            RuleGroup::Region,
            "region_of",
            &format!(r"\b(?:região|regiao|área|area|region)\s+(?:d[oae]s?\s+|of\s+(?:the\s+)?)?(?P<place>{PLACE})"),
            region_intent,
        ),
        // ---- vessel type -------------------------------------------------
        rule(
            RuleGroup::VesselType,
            "ships_of_type",
            &format!(
                r"\b{SHIPS}\s+(?:d[oe]\s+|of\s+)?(?:tipo|type|categoria|category)\s+(?:de\s+|of\s+)?(?P<kind>{PLACE})"
            ),
            type_intent,
        ),
        rule(
            RuleGroup::VesselType,
            "type_of_ship",
            &format!(r"\b(?:tipo|type)\s+(?:de\s+)?{SHIP}s?\s+(?P<kind>{PLACE})"),
            type_intent,
        ),
        rule(
            RuleGroup::VesselType,
            "ships_for_purpose",
            &format!(
                r"\b{SHIPS}\s+(?:de\s+)?(?P<kind>carga|passageiros|pesca|recreio|cargo|passenger|fishing|tanker|tug|pleasure)\b"
            ),
            type_intent,
        ),
        rule(
            RuleGroup::VesselType,
            "type_noun",
            r"\b(?P<kind>petroleiros?|cargueiros?|rebocadores?|pesqueiros?|tankers?|tugs?|iates?|yachts?)\b",
            type_intent,
        ),
        // ---- flag --------------------------------------------------------
        rule(
            RuleGroup::Flag,
            "flag_of",
            &format!(r"\b(?:bandeira|flag)\s+(?:d[oae]s?\s+|of\s+(?:the\s+)?)?(?P<flag>{PLACE})"),
            flag_intent,
        ),
        rule(
            RuleGroup::Flag,
            "flagged",
            r"\b(?P<flag>\p{L}+)[\s-]flagged\b",
            flag_intent,
        ),
        rule(
            RuleGroup::Flag,
            "registered_in",
            &format!(r"\bregistrad[oa]s?\s+(?:n[oa]s?|em|in)\s+(?P<flag>{PLACE})"),
            flag_intent,
        ),
    ]
});

/// Classify a question, returning the intent and the name of the rule that
/// fired. Never fails; unrecognized text is `general` with no rule.
pub fn classify(text: &str) -> (QueryIntent, Option<&'static str>) {
    let normalized = text.trim().to_lowercase();

    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(&normalized) {
            let intent = (rule.build)(&caps);
            debug!(
                group = ?rule.group,
                rule = rule.name,
                intent = %intent.kind,
                "intent rule matched"
            );
            return (intent, Some(rule.name));
        }
    }

    debug!(text = normalized.as_str(), "no intent rule matched, treating as general");
    (QueryIntent::general(), None)
}

// =============================================================================
// INTENT CONSTRUCTORS
// =============================================================================

fn capture<'t>(caps: &'t Captures, name: &str) -> &'t str {
    caps.name(name).map(|m| clean(m.as_str())).unwrap_or_default()
}

/// Trim surrounding whitespace and trailing punctuation.
fn clean(raw: &str) -> &str {
    raw.trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace() || c == '¿' || c == '¡')
        .trim()
}

fn port_intent(caps: &Captures) -> QueryIntent {
    QueryIntent::new(IntentKind::PortInfo).with_text("port_name", capture(caps, "port"))
}

fn name_intent(caps: &Captures) -> QueryIntent {
    QueryIntent::new(IntentKind::VesselSearch).with_text("query", capture(caps, "name"))
}

fn id_intent(caps: &Captures) -> QueryIntent {
    QueryIntent::new(IntentKind::VesselById).with_text("id", capture(caps, "id"))
}

fn region_intent(caps: &Captures) -> QueryIntent {
    let place = capture(caps, "place");

    if let Some(region) = lookup::find_region(place) {
        return QueryIntent::new(IntentKind::ShipsInArea)
            .with_text("region", region.name)
            .with_number("lat", region.latitude)
            .with_number("lon", region.longitude)
            .with_number("radius", region.radius);
    }

    // Not a known region. Treat what's left as a port name, or give up.
    let port = strip_place_prefixes(place);
    if port.is_empty() {
        QueryIntent::general()
    } else {
        QueryIntent::new(IntentKind::PortInfo).with_text("port_name", port)
    }
}

fn type_intent(caps: &Captures) -> QueryIntent {
    let raw = capture(caps, "kind");
    let category = lookup::find_category(raw)
        .map(|c| c.to_string())
        .unwrap_or_else(|| raw.to_string());
    QueryIntent::new(IntentKind::VesselTypeSearch).with_text("category", category)
}

fn flag_intent(caps: &Captures) -> QueryIntent {
    let raw = capture(caps, "flag");
    let flag = lookup::find_flag(raw).unwrap_or(raw);
    QueryIntent::new(IntentKind::FlagSearch).with_text("flag", flag)
}

const LEADING_NOISE: &[&str] = &[
    "the ", "o ", "a ", "os ", "as ", "porto de ", "porto do ", "porto da ", "port of ",
];

fn strip_place_prefixes(place: &str) -> String {
    let mut rest = clean(place);
    'strip: loop {
        for prefix in LEADING_NOISE {
            if rest == prefix.trim_end() {
                return String::new();
            }
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped.trim_start();
                continue 'strip;
            }
        }
        return clean(rest).to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(text: &str) -> Option<&'static str> {
        classify(text).1
    }

    #[test]
    fn test_porto_de() {
        let intent = classify("porto de santos").0;
        assert_eq!(intent.kind, IntentKind::PortInfo);
        assert_eq!(intent.text("port_name"), Some("santos"));
        assert_eq!(intent.text("scope"), None);
        assert_eq!(rule_for("porto de santos"), Some("porto_de"));
    }

    #[test]
    fn test_port_of_strips_punctuation_and_case() {
        let intent = classify("  Tell me about the Port of Rotterdam?  ").0;
        assert_eq!(intent.kind, IntentKind::PortInfo);
        assert_eq!(intent.text("port_name"), Some("rotterdam"));
        assert_eq!(rule_for("port of rotterdam"), Some("port_of"));
    }

    #[test]
    fn test_ships_at_port_wants_vessels() {
        let intent = classify("Quais são os navios no porto de Santos!").0;
        assert_eq!(intent.kind, IntentKind::PortInfo);
        assert_eq!(intent.text("port_name"), Some("santos"));
        assert_eq!(intent.text("scope"), Some(SCOPE_VESSELS));
        assert_eq!(rule_for("ships at the port of santos"), Some("ships_at_port"));
    }

    #[test]
    fn test_ship_named() {
        let intent = classify("navio chamado Ever Given").0;
        assert_eq!(intent.kind, IntentKind::VesselSearch);
        assert_eq!(intent.text("query"), Some("ever given"));
        assert_eq!(rule_for("a vessel called nordic star"), Some("ship_named"));
    }

    #[test]
    fn test_search_ship() {
        let intent = classify("buscar o navio maersk alabama.").0;
        assert_eq!(intent.kind, IntentKind::VesselSearch);
        assert_eq!(intent.text("query"), Some("maersk alabama"));
        assert_eq!(rule_for("find ship coral wave"), Some("search_ship"));
    }

    #[test]
    fn test_mmsi() {
        let intent = classify("mmsi 123456789").0;
        assert_eq!(intent.kind, IntentKind::VesselById);
        assert_eq!(intent.text("id"), Some("123456789"));
        assert_eq!(rule_for("IMO: 9811000"), Some("mmsi_or_imo"));
        assert_eq!(classify("imo nº 9811000").0.text("id"), Some("9811000"));
    }

    #[test]
    fn test_bare_mmsi() {
        let intent = classify("o que é 710000001?").0;
        assert_eq!(intent.kind, IntentKind::VesselById);
        assert_eq!(intent.text("id"), Some("710000001"));
        assert_eq!(rule_for("710000001"), Some("bare_mmsi"));
        // Eight digits alone are not an MMSI.
        assert_eq!(classify("12345678").0.kind, IntentKind::General);
    }

    #[test]
    fn test_name_rule_beats_id_rule() {
        let intent = classify("buscar navio 123456789").0;
        assert_eq!(intent.kind, IntentKind::VesselSearch);
        assert_eq!(intent.text("query"), Some("123456789"));
    }

    #[test]
    fn test_traffic_in_known_region() {
        let intent = classify("navios no canal de suez").0;
        assert_eq!(intent.kind, IntentKind::ShipsInArea);
        assert_eq!(intent.text("region"), Some("Canal de Suez"));
        assert_eq!(intent.number("lat"), Some(30.4276));
        assert_eq!(intent.number("radius"), Some(80.0));
        assert_eq!(rule_for("traffic in the strait of malacca"), Some("traffic_in_place"));
    }

    #[test]
    fn test_region_of() {
        let intent = classify("como está a região de gibraltar").0;
        assert_eq!(intent.kind, IntentKind::ShipsInArea);
        assert_eq!(intent.text("region"), Some("Estreito de Gibraltar"));
        assert_eq!(rule_for("area of the guanabara bay"), Some("region_of"));
    }

    #[test]
    fn test_unknown_region_falls_back_to_port() {
        let intent = classify("ships near the north sea").0;
        assert_eq!(intent.kind, IntentKind::PortInfo);
        assert_eq!(intent.text("port_name"), Some("north sea"));

        let intent = classify("tráfego em paranaguá").0;
        assert_eq!(intent.kind, IntentKind::PortInfo);
        assert_eq!(intent.text("port_name"), Some("paranaguá"));
    }

    #[test]
    fn test_region_fallback_strips_articles() {
        assert_eq!(strip_place_prefixes("the port of itajaí"), "itajaí");
        assert_eq!(strip_place_prefixes("o porto de itajaí"), "itajaí");
        assert_eq!(strip_place_prefixes("a "), "");
    }

    #[test]
    fn test_ships_of_type() {
        let intent = classify("navios tipo cargo").0;
        assert_eq!(intent.kind, IntentKind::VesselTypeSearch);
        assert_eq!(intent.text("category"), Some("Cargo"));
        assert_eq!(rule_for("vessels of type passenger"), Some("ships_of_type"));
    }

    #[test]
    fn test_unknown_type_kept_raw() {
        let intent = classify("ships of type dredger").0;
        assert_eq!(intent.kind, IntentKind::VesselTypeSearch);
        assert_eq!(intent.text("category"), Some("dredger"));
    }

    #[test]
    fn test_type_of_ship() {
        assert_eq!(rule_for("tipo de navio petroleiro"), Some("type_of_ship"));
        assert_eq!(classify("tipo de navio petroleiro").0.text("category"), Some("Tanker"));
    }

    #[test]
    fn test_ships_for_purpose() {
        let intent = classify("embarcações de pesca").0;
        assert_eq!(intent.kind, IntentKind::VesselTypeSearch);
        assert_eq!(intent.text("category"), Some("Fishing"));
        assert_eq!(rule_for("navios de passageiros"), Some("ships_for_purpose"));
    }

    #[test]
    fn test_type_noun() {
        let intent = classify("mostre os petroleiros").0;
        assert_eq!(intent.kind, IntentKind::VesselTypeSearch);
        assert_eq!(intent.text("category"), Some("Tanker"));
        assert_eq!(rule_for("any yachts?"), Some("type_noun"));
    }

    #[test]
    fn test_flag_of() {
        let intent = classify("navios com bandeira da libéria").0;
        assert_eq!(intent.kind, IntentKind::FlagSearch);
        assert_eq!(intent.text("flag"), Some("Liberia"));
        assert_eq!(rule_for("flag of malta"), Some("flag_of"));
    }

    #[test]
    fn test_flagged() {
        let intent = classify("Panama-flagged boats").0;
        assert_eq!(intent.kind, IntentKind::FlagSearch);
        assert_eq!(intent.text("flag"), Some("Panama"));
        assert_eq!(rule_for("greek flagged"), Some("flagged"));
    }

    #[test]
    fn test_registered_in() {
        let intent = classify("registrados na noruega").0;
        assert_eq!(intent.kind, IntentKind::FlagSearch);
        assert_eq!(intent.text("flag"), Some("Norway"));
        assert_eq!(rule_for("registrado em atlantis"), Some("registered_in"));
        assert_eq!(classify("registrado em atlantis").0.text("flag"), Some("atlantis"));
    }

    #[test]
    fn test_general() {
        let intent = classify("xyzzy plugh").0;
        assert_eq!(intent.kind, IntentKind::General);
        assert!(intent.params.is_empty());
        assert_eq!(rule_for("xyzzy plugh"), None);
        assert_eq!(classify("").0.kind, IntentKind::General);
    }

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(RULES.len(), 16);
        let names: std::collections::HashSet<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn test_intent_serializes_snake_case() {
        let json = serde_json::to_value(classify("mmsi 123456789").0).unwrap();
        assert_eq!(json["kind"], "vessel_by_id");
        assert_eq!(json["params"]["id"], "123456789");
    }
}
