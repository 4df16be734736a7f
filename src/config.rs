// =============================================================================
// config.rs: THE CHART TABLE
// =============================================================================
//
// Every endpoint, key and knob the engine uses lives here. Nothing else in
// the crate reads the environment. Components receive the values they need
// through their constructors, so a test can point the whole pipeline at a
// stub server without touching a single env var.
//
// All values can be overridden via environment variables prefixed with
// SHIP_TRAFFIC_. The two credentials keep the names the dashboard always used
// (MY_SHIP_TRACKING_API_KEY and GOOGLE_API_KEY) because that is what people
// already have in their .env files.
// =============================================================================

use std::env;
use std::time::Duration;

use url::Url;

/// Engine configuration. Read once at startup, then shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // TRACKING API
    // =========================================================================

    /// Base URL of the vessel tracking API. Endpoints (`ports`, `vessels`,
    /// `vessels/{id}`) are joined onto it.
    /// Default: https://api.myshiptracking.com/v1
    pub tracking_base_url: Url,

    /// API key sent as the `api_key` query parameter. Not validated here:
    /// a missing key shows up as an upstream error on the first call.
    pub tracking_api_key: Option<String>,

    // =========================================================================
    // GENERATIVE LANGUAGE SERVICE
    // =========================================================================

    /// Base URL of the Gemini REST API.
    pub genai_base_url: Url,

    /// Model name, interpolated into `models/{model}:generateContent`.
    pub genai_model: String,

    /// Key for the generative service. When absent every narrative degrades
    /// to the deterministic fallback text.
    pub genai_api_key: Option<String>,

    // =========================================================================
    // HTTP
    // =========================================================================

    /// Per-request timeout for both HTTP clients.
    pub http_timeout: Duration,

    /// User-Agent header. Be polite, say who you are.
    pub user_agent: String,

    // =========================================================================
    // QUERY DEFAULTS
    // =========================================================================

    /// How many results a name search keeps. First N, no ranking.
    pub search_limit: usize,

    /// Radius (nautical miles) used when an area query does not carry one,
    /// and for the type/flag filters that run over the simulator.
    pub default_area_radius: f64,

    /// Seed for the area simulator. `None` means a fresh entropy seed per run.
    pub simulator_seed: Option<u64>,
}

impl Default for Config {
    /// Defaults without touching the environment.
    fn default() -> Self {
        Config {
            tracking_base_url: builtin_url("https://api.myshiptracking.com/v1/"),
            tracking_api_key: None,
            genai_base_url: builtin_url("https://generativelanguage.googleapis.com/v1beta/"),
            genai_model: "gemini-pro".to_string(),
            genai_api_key: None,
            http_timeout: Duration::from_secs(15),
            user_agent: "ShipTrafficEngine/0.1 (maritime-traffic-assistant)".to_string(),
            search_limit: 10,
            default_area_radius: 50.0,
            simulator_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// A `.env` file is loaded first when present. Unparseable numbers and
    /// URLs fall back to the defaults rather than aborting startup.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Config::default();

        Config {
            tracking_base_url: parse_base_url(&env_or_default(
                "SHIP_TRAFFIC_TRACKING_BASE_URL",
                defaults.tracking_base_url.as_str(),
            ))
            .unwrap_or(defaults.tracking_base_url),
            tracking_api_key: env_non_empty("MY_SHIP_TRACKING_API_KEY"),

            genai_base_url: parse_base_url(&env_or_default(
                "SHIP_TRAFFIC_GENAI_BASE_URL",
                defaults.genai_base_url.as_str(),
            ))
            .unwrap_or(defaults.genai_base_url),
            genai_model: env_or_default("SHIP_TRAFFIC_GENAI_MODEL", &defaults.genai_model),
            genai_api_key: env_non_empty("GOOGLE_API_KEY"),

            http_timeout: Duration::from_secs(
                env_or_default("SHIP_TRAFFIC_HTTP_TIMEOUT_SECS", "15").parse().unwrap_or(15),
            ),
            user_agent: env_or_default("SHIP_TRAFFIC_USER_AGENT", &defaults.user_agent),

            search_limit: env_or_default("SHIP_TRAFFIC_SEARCH_LIMIT", "10")
                .parse()
                .unwrap_or(defaults.search_limit),
            default_area_radius: env_or_default("SHIP_TRAFFIC_AREA_RADIUS", "50")
                .parse()
                .unwrap_or(defaults.default_area_radius),
            simulator_seed: env::var("SHIP_TRAFFIC_SIMULATOR_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Whether logs should be emitted as JSON lines instead of human text.
    pub fn json_logs() -> bool {
        env_or_default("SHIP_TRAFFIC_LOG_FORMAT", "text").eq_ignore_ascii_case("json")
    }
}

/// Parse a base URL and make sure it ends with a slash, so `Url::join`
/// appends path segments instead of replacing the last one.
pub fn parse_base_url(raw: &str) -> Option<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).ok()
}

fn builtin_url(raw: &'static str) -> Url {
    Url::parse(raw).expect("built-in base URL must parse")
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
