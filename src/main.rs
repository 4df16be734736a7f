// ███████╗██╗  ██╗██╗██████╗
// ██╔════╝██║  ██║██║██╔══██╗
// ███████╗███████║██║██████╔╝
// ╚════██║██╔══██║██║██╔═══╝
// ███████║██║  ██║██║██║
// ╚══════╝╚═╝  ╚═╝╚═╝╚═╝
//
// T R A F F I C   E N G I N E
//
// Ask where the ships are, in Portuguese or English, and get an answer
// written by a language model from whatever the tracking API (or, for area
// questions, the dice) had to say.

mod aggregator;
mod analysis;
mod chat;
mod config;
mod error;
mod executor;
mod intent;
mod llm;
mod lookup;
mod metrics;
mod models;
mod narrative;
mod providers;
#[cfg(test)]
mod test_support;

use std::io::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::analysis::{analyze_region, AreaSelection, RegionReport};
use crate::chat::{ChatCommand, ChatSession, HELP_TEXT};
use crate::config::Config;
use crate::llm::{GeminiClient, LanguageModel};
use crate::metrics::MetricsCollector;
use crate::models::RegionCoordinate;
use crate::providers::{ShipDataProvider, TrackingClient};

fn print_banner() {
    let banner = r#"
    ╔══════════════════════════════════════════════════════════════╗
    ║                                                              ║
    ║        ⚓  S H I P   T R A F F I C   E N G I N E  ⚓         ║
    ║                                                              ║
    ║   Data:      vessel tracking API (ports, vessels, MMSI)      ║
    ║   Areas:     simulated, and always labeled as such           ║
    ║   Reports:   generative language model, with a fallback      ║
    ║                                                              ║
    ║   "Fair winds, following seas, and no surprises at Suez."    ║
    ║                                                              ║
    ╚══════════════════════════════════════════════════════════════╝
    "#;
    println!("{}", banner);
}

/// Logs go to stderr so stdout carries only answers.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn cli() -> Command {
    Command::new("ship_traffic_engine")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Maritime traffic assistant: ports, vessels and regional traffic reports")
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("print structured JSON instead of text"),
        )
        .subcommand(Command::new("chat").about("interactive question loop (default)"))
        .subcommand(
            Command::new("ask").about("answer one question and exit").arg(
                Arg::new("question")
                    .required(true)
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .help("the question, e.g. \"navios no porto de Santos\""),
            ),
        )
        .subcommand(
            Command::new("region")
                .about("traffic report for a predefined region or custom coordinates")
                .arg(
                    Arg::new("name")
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .help("region name, or a label when --lat/--lon are given"),
                )
                .arg(
                    Arg::new("lat")
                        .long("lat")
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .requires("lon")
                        .help("latitude in decimal degrees"),
                )
                .arg(
                    Arg::new("lon")
                        .long("lon")
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .requires("lat")
                        .help("longitude in decimal degrees"),
                )
                .arg(
                    Arg::new("radius")
                        .long("radius")
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .requires("lat")
                        .help("radius in nautical miles, 1 to 500"),
                ),
        )
        .subcommand(Command::new("regions").about("list the predefined regions"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let json = matches.get_flag("json");

    let config = Config::from_env();
    init_tracing(Config::json_logs());

    info!("🚢 SHIP TRAFFIC ENGINE initializing...");
    info!(
        tracking = config.tracking_base_url.as_str(),
        model = config.genai_model.as_str(),
        seeded = config.simulator_seed.is_some(),
        "✅ Configuration loaded"
    );
    if config.genai_api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set, every answer will use the fallback text");
    }

    let provider: Arc<dyn ShipDataProvider> =
        Arc::new(TrackingClient::new(&config).context("building the tracking API client")?);
    let model: Arc<dyn LanguageModel> =
        Arc::new(GeminiClient::new(&config).context("building the language model client")?);
    let metrics = Arc::new(MetricsCollector::new());

    match matches.subcommand() {
        Some(("ask", sub)) => {
            let question = joined(sub, "question").unwrap_or_default();
            let mut session = ChatSession::new(provider, model, Arc::clone(&metrics), &config);
            let turn = session.ask(&question).await;
            if json {
                println!("{}", serde_json::to_string_pretty(turn)?);
            } else {
                println!("{}", turn.reply);
            }
        }
        Some(("region", sub)) => {
            let selection = area_selection(sub, &config)?;
            let report = analyze_region(&selection, provider.as_ref(), model.as_ref()).await;
            metrics.increment_region_reports();
            if report.degraded {
                metrics.increment_degraded();
            }
            if report.data_note.is_some() {
                metrics.increment_synthetic();
            }
            print_report(&report, json)?;
        }
        Some(("regions", _)) => print_regions(json)?,
        _ => {
            let session = ChatSession::new(provider, model, Arc::clone(&metrics), &config);
            run_chat(session, &metrics, json).await?;
        }
    }

    info!(stats = ?metrics.snapshot(), "💤 SHIP TRAFFIC ENGINE: OFFLINE");
    Ok(())
}

async fn run_chat(mut session: ChatSession, metrics: &MetricsCollector, json: bool) -> anyhow::Result<()> {
    print_banner();
    println!("{HELP_TEXT}\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("⚓ > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                warn!("🛑 Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{HELP_TEXT}"),
            ChatCommand::History => {
                if json {
                    println!("{}", serde_json::to_string_pretty(session.transcript())?);
                } else {
                    println!("{}", session.render_history());
                }
            }
            ChatCommand::Stats => println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?),
            ChatCommand::Regions => print_regions(json)?,
            ChatCommand::Unknown(command) => println!("Unknown command {command}. Try /help."),
            ChatCommand::Ask(question) => {
                let turn = session.ask(&question).await;
                if json {
                    println!("{}", serde_json::to_string_pretty(turn)?);
                } else {
                    println!("\n{}\n", turn.reply);
                }
            }
        }
    }

    info!(turns = session.transcript().len(), "Chat session closed");
    Ok(())
}

fn joined(matches: &ArgMatches, id: &str) -> Option<String> {
    let words: Vec<&str> = matches.get_many::<String>(id)?.map(String::as_str).collect();
    let text = words.join(" ");
    (!text.trim().is_empty()).then_some(text)
}

/// Accepted search radius for custom coordinates.
const RADIUS_RANGE_NM: std::ops::RangeInclusive<f64> = 1.0..=500.0;

fn area_selection(sub: &ArgMatches, config: &Config) -> anyhow::Result<AreaSelection> {
    let label = joined(sub, "name");
    let lat = sub.get_one::<f64>("lat").copied();
    let lon = sub.get_one::<f64>("lon").copied();

    match (lat, lon, label) {
        (Some(latitude), Some(longitude), label) => {
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                bail!("coordinates out of range: latitude {latitude}, longitude {longitude}");
            }
            let radius = sub
                .get_one::<f64>("radius")
                .copied()
                .unwrap_or(config.default_area_radius);
            if !RADIUS_RANGE_NM.contains(&radius) {
                bail!(
                    "radius out of range: {radius} (expected {} to {} nautical miles)",
                    RADIUS_RANGE_NM.start(),
                    RADIUS_RANGE_NM.end()
                );
            }
            let label = label.unwrap_or_else(|| format!("Area at {latitude:.4}, {longitude:.4}"));
            Ok(AreaSelection::Custom {
                coordinate: RegionCoordinate {
                    name: label.clone(),
                    latitude,
                    longitude,
                    radius,
                },
                label,
            })
        }
        (_, _, Some(name)) => Ok(AreaSelection::Named(name)),
        _ => bail!("give a region name, or --lat and --lon (see `regions` for the predefined list)"),
    }
}

fn print_report(report: &RegionReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Traffic analysis: {}", report.region);
    if let Some(c) = &report.coordinates {
        println!("Coordinates: lat {}, lon {} (radius {} nm)", c.latitude, c.longitude, c.radius);
    }
    if let Some(summary) = &report.summary {
        println!(
            "Vessels: {}   Stopped: {}   Mean speed: {:.2} kn",
            summary.total, summary.stopped, summary.mean_speed
        );
        for (category, count) in &summary.categories {
            println!("  {category:<16} {count}");
        }
    }
    if let Some(note) = &report.data_note {
        println!("\n{note}");
    }
    println!("\n{}", report.analysis);
    Ok(())
}

fn print_regions(json: bool) -> anyhow::Result<()> {
    if json {
        let regions: Vec<RegionCoordinate> = lookup::REGIONS.iter().map(|r| r.coordinate()).collect();
        println!("{}", serde_json::to_string_pretty(&regions)?);
        return Ok(());
    }
    for region in lookup::REGIONS {
        println!(
            "{:<24} lat {:>9.4}  lon {:>9.4}  radius {:>4} nm",
            region.name, region.latitude, region.longitude, region.radius
        );
    }
    Ok(())
}
