// =============================================================================
// narrative.rs: TURNING NUMBERS INTO SENTENCES
// =============================================================================
//
// Picks a prompt template for a query result, fills it in, and asks the
// language model to write the answer. Five templates:
//
//   vessel-list     a batch of vessels (first 5 listed, total always given)
//   port-detail     one port record
//   vessel-detail   one vessel record
//   no-data         nothing fetched, or nothing found
//   traffic-report  aggregated statistics for a region
//
// Every prompt starts with the same preamble keeping the model on maritime
// topics. Synthetic batches carry their disclaimer into the prompt so the
// model can pass it on.
//
// When the model fails, the answer is a deterministic text built from the
// same data, flagged as degraded. It is never empty and, when there were
// vessels, it names them.
// =============================================================================

use std::fmt::Write as _;

use serde::Serialize;
use tracing::warn;

use crate::aggregator::AggregatedSummary;
use crate::executor::QueryResult;
use crate::llm::LanguageModel;
use crate::models::{PortRecord, RegionCoordinate, VesselBatch, VesselRecord};

/// Listings in prompts and fallbacks stop after this many vessels.
pub const MAX_LISTED_VESSELS: usize = 5;

const SYSTEM_PREAMBLE: &str = "You are a maritime traffic assistant. Only discuss ships, ports, \
shipping routes and maritime traffic; politely decline anything else. Base your answer strictly \
on the data provided below and say so when the data is insufficient. If the data is marked as \
simulated, tell the user. Answer in the same language as the question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    VesselList,
    PortDetail,
    VesselDetail,
    NoData,
    TrafficReport,
}

/// Generated (or fallback) answer text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub text: String,
    pub template: PromptTemplate,
    /// True when the language model failed and `text` is the fallback.
    pub degraded: bool,
}

/// Inputs for a traffic report.
#[derive(Debug, Clone, Copy)]
pub struct TrafficReportInput<'a> {
    pub coordinate: &'a RegionCoordinate,
    /// Where the coordinates came from, e.g. "predefined region table".
    pub location_source: &'a str,
    pub summary: &'a AggregatedSummary,
    pub provenance_note: Option<&'a str>,
}

pub fn template_for(result: &QueryResult) -> PromptTemplate {
    match result {
        QueryResult::Vessels(batch) if !batch.is_empty() => PromptTemplate::VesselList,
        QueryResult::Vessel(_) => PromptTemplate::VesselDetail,
        QueryResult::Port(_) => PromptTemplate::PortDetail,
        _ => PromptTemplate::NoData,
    }
}

/// Build the prompt for `question` over `result`.
pub fn build_prompt(question: &str, result: &QueryResult) -> (PromptTemplate, String) {
    let template = template_for(result);
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{SYSTEM_PREAMBLE}\n");
    let _ = writeln!(prompt, "User question: {}\n", question.trim());

    match result {
        QueryResult::Vessels(batch) if !batch.is_empty() => {
            let _ = writeln!(prompt, "Vessel data ({} vessels in total):", batch.len());
            write_vessel_lines(&mut prompt, batch, true);
            if batch.len() > MAX_LISTED_VESSELS {
                let _ = writeln!(prompt, "(only the first {MAX_LISTED_VESSELS} are listed)");
            }
            if let Some(note) = batch.note() {
                let _ = writeln!(prompt, "\nNote: {note}");
            }
            let _ = writeln!(
                prompt,
                "\nSummarize these vessels for the user: how many there are, what kinds, where they are headed."
            );
        }
        QueryResult::Vessel(vessel) => {
            let _ = writeln!(prompt, "Vessel record:");
            write_vessel_detail(&mut prompt, vessel);
            let _ = writeln!(prompt, "\nDescribe this vessel and what it is currently doing.");
        }
        QueryResult::Port(port) => {
            let _ = writeln!(prompt, "Port record:");
            write_port_detail(&mut prompt, port);
            let _ = writeln!(prompt, "\nDescribe this port for the user using the record above.");
        }
        QueryResult::Vessels(_) | QueryResult::NoData => {
            let _ = writeln!(
                prompt,
                "No vessel or port data was retrieved for this question. Answer from general maritime \
knowledge if the question allows it, otherwise suggest asking about a port, a vessel name, \
an MMSI or a known maritime region."
            );
        }
        QueryResult::Failed { message, .. } => {
            let _ = writeln!(
                prompt,
                "The data lookup failed ({message}). Explain briefly that the data is unavailable right now."
            );
        }
    }

    (template, prompt)
}

/// Deterministic answer used when the language model is unavailable.
pub fn fallback_text(result: &QueryResult) -> String {
    let mut text = String::new();
    match result {
        QueryResult::Vessels(batch) if !batch.is_empty() => {
            let _ = writeln!(text, "Found {} vessel(s):", batch.len());
            write_vessel_lines(&mut text, batch, false);
            if batch.len() > MAX_LISTED_VESSELS {
                let _ = writeln!(text, "...and {} more.", batch.len() - MAX_LISTED_VESSELS);
            }
            if let Some(note) = batch.note() {
                let _ = writeln!(text, "Note: {note}");
            }
        }
        QueryResult::Vessel(vessel) => {
            let _ = writeln!(text, "Vessel details:");
            write_vessel_detail(&mut text, vessel);
        }
        QueryResult::Port(port) => {
            let _ = writeln!(text, "Port details:");
            write_port_detail(&mut text, port);
        }
        QueryResult::Failed { message, .. } => {
            let _ = writeln!(text, "The data could not be retrieved: {message}");
        }
        QueryResult::Vessels(_) | QueryResult::NoData => {
            let _ = writeln!(
                text,
                "No vessel or port data was found for this question. Try asking about a port \
(\"porto de Santos\"), a vessel name, an MMSI, or a region such as the Suez Canal."
            );
        }
    }
    text.trim_end().to_string()
}

pub fn build_traffic_report_prompt(input: &TrafficReportInput<'_>) -> String {
    let TrafficReportInput {
        coordinate,
        location_source,
        summary,
        provenance_note,
    } = *input;

    let mut prompt = String::new();
    let _ = writeln!(prompt, "{SYSTEM_PREAMBLE}\n");
    let _ = writeln!(prompt, "Maritime traffic analysis for region: {}", coordinate.name);
    let _ = writeln!(prompt, "Location source: {location_source}");
    let _ = writeln!(
        prompt,
        "Coordinates: latitude {}, longitude {}",
        coordinate.latitude, coordinate.longitude
    );
    let _ = writeln!(prompt, "Analysis radius: {} nautical miles\n", coordinate.radius);
    let _ = writeln!(prompt, "Collected data:");
    let _ = writeln!(prompt, "- Total vessels in the area: {}", summary.total);
    let _ = writeln!(prompt, "- Stopped or very slow vessels (< 1 knot): {}", summary.stopped);
    let _ = writeln!(prompt, "- Mean speed: {:.2} knots", summary.mean_speed);
    let _ = writeln!(prompt, "- Vessel types: {}", counts_line(summary.categories.iter()));
    let _ = writeln!(prompt, "- Navigational status: {}", counts_line(summary.statuses.iter()));
    let _ = writeln!(prompt, "- Flags: {}", counts_line(summary.flags.iter()));
    let _ = writeln!(prompt, "- Headings: {}", counts_line(summary.heading_sectors.iter()));
    if let Some(note) = provenance_note {
        let _ = writeln!(prompt, "\nNote: {note}");
    }
    let _ = writeln!(prompt, "\nBased on this data:");
    let _ = writeln!(prompt, "1. Give a detailed analysis of the current maritime traffic in this region.");
    let _ = writeln!(prompt, "2. Say whether there is congestion and rate the traffic level (low, medium, high).");
    let _ = writeln!(prompt, "3. Assess whether using this route right now is advisable.");
    let _ = writeln!(prompt, "4. Identify possible problems or bottlenecks in the region.");
    let _ = writeln!(prompt, "5. Suggest alternative routes if congestion is significant.");
    prompt
}

pub fn traffic_report_fallback(input: &TrafficReportInput<'_>) -> String {
    let summary = input.summary;
    let mut text = format!(
        "{}: {} vessel(s) within {} nautical miles, {} stopped, mean speed {:.2} knots.",
        input.coordinate.name, summary.total, input.coordinate.radius, summary.stopped, summary.mean_speed
    );
    if let Some((category, count)) = summary.dominant_category() {
        let _ = write!(text, " Most common type: {category} ({count}).");
    }
    if let Some(note) = input.provenance_note {
        let _ = write!(text, "\nNote: {note}");
    }
    text
}

/// Wraps a language model and always returns something printable.
pub struct NarrativeGenerator<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> NarrativeGenerator<'a> {
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    pub async fn narrate(&self, question: &str, result: &QueryResult) -> Narrative {
        let (template, prompt) = build_prompt(question, result);
        self.complete(template, &prompt, || fallback_text(result)).await
    }

    pub async fn traffic_report(&self, input: &TrafficReportInput<'_>) -> Narrative {
        let prompt = build_traffic_report_prompt(input);
        self.complete(PromptTemplate::TrafficReport, &prompt, || traffic_report_fallback(input))
            .await
    }

    async fn complete(&self, template: PromptTemplate, prompt: &str, fallback: impl FnOnce() -> String) -> Narrative {
        match self.model.generate_content(prompt).await {
            Ok(text) => Narrative {
                text: text.trim().to_string(),
                template,
                degraded: false,
            },
            Err(e) => {
                warn!(template = ?template, error = %e, "Language model unavailable, using fallback text");
                Narrative {
                    text: fallback(),
                    template,
                    degraded: true,
                }
            }
        }
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

fn write_vessel_lines(out: &mut String, batch: &VesselBatch, with_motion: bool) {
    for v in batch.vessels.iter().take(MAX_LISTED_VESSELS) {
        let _ = write!(
            out,
            "- {} (MMSI {}): {}, flag {}, destination {}",
            or_unknown(&v.name),
            or_unknown(&v.id),
            v.category,
            or_unknown(&v.flag),
            or_unknown(&v.destination),
        );
        if with_motion {
            let _ = write!(
                out,
                ", speed {}, heading {}, status {}",
                optional_number(v.speed, " kn"),
                optional_number(v.heading, "°"),
                or_unknown(&v.status),
            );
        }
        out.push('\n');
    }
}

fn write_vessel_detail(out: &mut String, v: &VesselRecord) {
    let _ = writeln!(out, "- Name: {}", or_unknown(&v.name));
    let _ = writeln!(out, "- MMSI: {}", or_unknown(&v.id));
    let _ = writeln!(out, "- Type: {}", v.category);
    let _ = writeln!(out, "- Flag: {}", or_unknown(&v.flag));
    let _ = writeln!(out, "- Status: {}", or_unknown(&v.status));
    let _ = writeln!(out, "- Speed: {}", optional_number(v.speed, " kn"));
    let _ = writeln!(out, "- Heading: {}", optional_number(v.heading, "°"));
    if let (Some(lat), Some(lon)) = (v.latitude, v.longitude) {
        let _ = writeln!(out, "- Position: {lat:.4}, {lon:.4}");
    }
    let _ = writeln!(out, "- Destination: {}", or_unknown(&v.destination));
    if let Some(last_port) = &v.last_port {
        let _ = writeln!(out, "- Last port: {last_port}");
    }
}

fn write_port_detail(out: &mut String, port: &PortRecord) {
    let _ = writeln!(out, "- Name: {}", or_unknown(&port.name));
    match (port.latitude, port.longitude) {
        (Some(lat), Some(lon)) => {
            let _ = writeln!(out, "- Coordinates: {lat:.4}, {lon:.4}");
        }
        _ => {
            let _ = writeln!(out, "- Coordinates: unknown");
        }
    }
    if let Some(fields) = port.metadata.as_object() {
        for (key, value) in fields {
            if matches!(key.as_str(), "name" | "port_name" | "port" | "lat" | "latitude" | "lon" | "lng" | "longitude") {
                continue;
            }
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let _ = writeln!(out, "- {key}: {rendered}");
        }
    }
}

fn optional_number(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(n) => format!("{n:.1}{unit}"),
        None => "not reported".to_string(),
    }
}

fn counts_line<'a, K: std::fmt::Display>(counts: impl Iterator<Item = (K, &'a usize)>) -> String {
    let parts: Vec<String> = counts.map(|(k, n)| format!("{k}: {n}")).collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}
