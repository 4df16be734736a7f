// =============================================================================
// analysis.rs: THE HARBOUR MASTER'S REPORT
// =============================================================================
//
// Region traffic analysis: pick an area (one of the predefined regions, or
// your own coordinates with a label), count what's in it, and ask the
// language model whether you'd want to sail through it right now.
//
// The area query is always answered by the simulator, so the report says so.
// An unknown region name is not an error: the report comes back without
// data and tells the user how to ask properly.
// =============================================================================

use serde::Serialize;
use tracing::info;

use crate::aggregator::{aggregate, AggregatedSummary};
use crate::llm::LanguageModel;
use crate::lookup;
use crate::models::RegionCoordinate;
use crate::narrative::{NarrativeGenerator, TrafficReportInput};
use crate::providers::ShipDataProvider;

pub const UNKNOWN_REGION_GUIDANCE: &str = "This region is not in the predefined table. Provide \
explicit coordinates (latitude and longitude) or pick one of the predefined regions.";

/// What the user asked to analyze.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaSelection {
    /// A region name, resolved through the predefined table.
    Named(String),
    /// User-supplied coordinates; `label` is only for display.
    Custom { label: String, coordinate: RegionCoordinate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Predefined,
    UserSupplied,
}

impl LocationSource {
    fn describe(&self) -> &'static str {
        match self {
            LocationSource::Predefined => "predefined region table",
            LocationSource::UserSupplied => "coordinates supplied by the user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<RegionCoordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_source: Option<LocationSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AggregatedSummary>,
    /// Disclaimer carried over from a synthetic batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_note: Option<String>,
    pub analysis: String,
    pub degraded: bool,
}

/// Resolve a selection into coordinates, or `None` for an unknown name.
pub fn resolve(selection: &AreaSelection) -> Option<(RegionCoordinate, LocationSource)> {
    match selection {
        AreaSelection::Named(name) => {
            lookup::find_region(&name.trim().to_lowercase()).map(|r| (r.coordinate(), LocationSource::Predefined))
        }
        AreaSelection::Custom { label, coordinate } => {
            let mut coordinate = coordinate.clone();
            if !label.trim().is_empty() {
                coordinate.name = label.trim().to_string();
            }
            Some((coordinate, LocationSource::UserSupplied))
        }
    }
}

pub async fn analyze_region(
    selection: &AreaSelection,
    provider: &dyn ShipDataProvider,
    model: &dyn LanguageModel,
) -> RegionReport {
    let Some((coordinate, source)) = resolve(selection) else {
        let region = match selection {
            AreaSelection::Named(name) => name.clone(),
            AreaSelection::Custom { label, .. } => label.clone(),
        };
        info!(region = region.as_str(), "Region not in table, no analysis run");
        return RegionReport {
            region,
            coordinates: None,
            location_source: None,
            summary: None,
            data_note: None,
            analysis: UNKNOWN_REGION_GUIDANCE.to_string(),
            degraded: false,
        };
    };

    let batch = provider
        .vessels_in_area(coordinate.latitude, coordinate.longitude, coordinate.radius)
        .await;
    let summary = aggregate(&coordinate.name, &batch.vessels);

    info!(
        region = coordinate.name.as_str(),
        source = ?source,
        vessels = summary.total,
        stopped = summary.stopped,
        mean_speed = summary.mean_speed,
        "Region traffic aggregated"
    );

    let input = TrafficReportInput {
        coordinate: &coordinate,
        location_source: source.describe(),
        summary: &summary,
        provenance_note: batch.note(),
    };
    let narrative = NarrativeGenerator::new(model).traffic_report(&input).await;

    RegionReport {
        region: coordinate.name.clone(),
        data_note: batch.note().map(str::to_string),
        coordinates: Some(coordinate),
        location_source: Some(source),
        summary: Some(summary),
        analysis: narrative.text,
        degraded: narrative.degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MaritimeError, Result};
    use crate::executor::tests::FakeProvider;
    use crate::models::SYNTHETIC_DATA_NOTE;
    use async_trait::async_trait;

    struct CannedModel(Option<&'static str>);

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate_content(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| MaritimeError::Service("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unknown_region_has_no_data() {
        let provider = FakeProvider::default();
        let report = analyze_region(
            &AreaSelection::Named("Mar do Norte".to_string()),
            &provider,
            &CannedModel(Some("unused")),
        )
        .await;

        assert!(report.summary.is_none());
        assert_eq!(report.region, "Mar do Norte");
        assert_eq!(report.analysis, UNKNOWN_REGION_GUIDANCE);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_known_region_summary_matches_batch() {
        let provider = FakeProvider::default();
        let report = analyze_region(
            &AreaSelection::Named("Canal de Suez".to_string()),
            &provider,
            &CannedModel(Some("Moderate traffic.")),
        )
        .await;

        let summary = report.summary.as_ref().unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(report.region, "Canal de Suez");
        assert_eq!(report.location_source, Some(LocationSource::Predefined));
        assert_eq!(report.coordinates.as_ref().map(|c| c.radius), Some(80.0));
        assert_eq!(report.data_note.as_deref(), Some(SYNTHETIC_DATA_NOTE));
        assert_eq!(report.analysis, "Moderate traffic.");
        assert!(!report.degraded);
        assert_eq!(provider.calls(), vec!["area:30.4276:32.3439:80"]);
    }

    #[tokio::test]
    async fn test_custom_coordinates_degrade_gracefully() {
        let provider = FakeProvider::default();
        let selection = AreaSelection::Custom {
            label: "Off Cabo Frio".to_string(),
            coordinate: RegionCoordinate {
                name: String::new(),
                latitude: -23.0,
                longitude: -42.0,
                radius: 25.0,
            },
        };
        let report = analyze_region(&selection, &provider, &CannedModel(None)).await;

        assert_eq!(report.region, "Off Cabo Frio");
        assert_eq!(report.location_source, Some(LocationSource::UserSupplied));
        assert!(report.degraded);
        assert!(report.analysis.contains("Off Cabo Frio: 3 vessel(s)"));
        assert_eq!(provider.calls(), vec!["area:-23:-42:25"]);
    }

    #[test]
    fn test_named_resolution_is_case_insensitive() {
        let (coordinate, source) = resolve(&AreaSelection::Named("PORTO DE SANTOS".to_string())).unwrap();
        assert_eq!(coordinate.name, "Porto de Santos");
        assert_eq!(source, LocationSource::Predefined);
    }
}
