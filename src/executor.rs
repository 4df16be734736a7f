// =============================================================================
// executor.rs: ONE INTENT, ONE CALL
// =============================================================================
//
// Dispatch table from intent to provider operation. Each intent triggers at
// most one provider call:
//
//   port_info           -> port_info, or vessels_near_port when scope=vessels
//   vessel_search       -> search_vessels(query, search_limit)
//   vessel_by_id        -> vessel_by_id
//   ships_in_area       -> vessels_in_area(lat, lon, radius)
//   vessel_type_search  -> vessels_in_area(0, 0, default radius) + filter
//   flag_search         -> vessels_in_area(0, 0, default radius) + filter
//   general             -> nothing
//
// The type and flag searches never see real data: the tracking API can't
// filter by either, so they filter a simulated batch, and the batch keeps
// its Synthetic stamp.
//
// Errors stop here. Whatever the provider throws comes out as a
// QueryResult::Failed value with a kind, a message and (for upstream
// failures) the HTTP status.
// =============================================================================

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ErrorKind, MaritimeError};
use crate::intent::{IntentKind, QueryIntent, SCOPE_VESSELS};
use crate::models::{PortRecord, VesselBatch, VesselRecord};
use crate::providers::ShipDataProvider;

/// What an executed intent produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QueryResult {
    Vessels(VesselBatch),
    Vessel(VesselRecord),
    Port(PortRecord),
    /// Nothing was fetched (general questions, missing parameters).
    NoData,
    Failed {
        kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}

impl QueryResult {
    pub fn failed(err: &MaritimeError) -> Self {
        QueryResult::Failed {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryResult::Failed { .. })
    }

    pub fn batch(&self) -> Option<&VesselBatch> {
        match self {
            QueryResult::Vessels(batch) => Some(batch),
            _ => None,
        }
    }
}

pub struct QueryExecutor<'a> {
    provider: &'a dyn ShipDataProvider,
    search_limit: usize,
    default_radius: f64,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(provider: &'a dyn ShipDataProvider, search_limit: usize, default_radius: f64) -> Self {
        Self {
            provider,
            search_limit,
            default_radius,
        }
    }

    pub async fn execute(&self, intent: &QueryIntent) -> QueryResult {
        match self.dispatch(intent).await {
            Ok(result) => result,
            Err(e) => {
                warn!(intent = %intent.kind, error = %e, kind = ?e.kind(), "query failed");
                QueryResult::failed(&e)
            }
        }
    }

    async fn dispatch(&self, intent: &QueryIntent) -> Result<QueryResult, MaritimeError> {
        let result = match intent.kind {
            IntentKind::PortInfo => {
                let Some(port) = non_empty(intent.text("port_name")) else {
                    return Ok(QueryResult::NoData);
                };
                if intent.text("scope") == Some(SCOPE_VESSELS) {
                    QueryResult::Vessels(self.provider.vessels_near_port(port).await?)
                } else {
                    QueryResult::Port(self.provider.port_info(port).await?)
                }
            }
            IntentKind::VesselSearch => {
                let Some(query) = non_empty(intent.text("query")) else {
                    return Ok(QueryResult::NoData);
                };
                QueryResult::Vessels(self.provider.search_vessels(query, self.search_limit).await?)
            }
            IntentKind::VesselById => {
                let Some(id) = non_empty(intent.text("id")) else {
                    return Ok(QueryResult::NoData);
                };
                QueryResult::Vessel(self.provider.vessel_by_id(id).await?)
            }
            IntentKind::ShipsInArea => {
                let (Some(lat), Some(lon)) = (intent.number("lat"), intent.number("lon")) else {
                    return Ok(QueryResult::NoData);
                };
                let radius = intent.number("radius").unwrap_or(self.default_radius);
                QueryResult::Vessels(self.provider.vessels_in_area(lat, lon, radius).await)
            }
            IntentKind::VesselTypeSearch => {
                let wanted = intent.text("category").unwrap_or_default().to_lowercase();
                let batch = self.provider.vessels_in_area(0.0, 0.0, self.default_radius).await;
                QueryResult::Vessels(batch.retain(|v| v.category.to_string().to_lowercase().contains(&wanted)))
            }
            IntentKind::FlagSearch => {
                let wanted = intent.text("flag").unwrap_or_default().to_lowercase();
                let batch = self.provider.vessels_in_area(0.0, 0.0, self.default_radius).await;
                QueryResult::Vessels(batch.retain(|v| v.flag.to_lowercase().contains(&wanted)))
            }
            IntentKind::General => QueryResult::NoData,
        };

        if let QueryResult::Vessels(batch) = &result {
            info!(
                intent = %intent.kind,
                vessels = batch.len(),
                synthetic = batch.is_synthetic(),
                "query executed"
            );
        }

        Ok(result)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::{VesselCategory, SYNTHETIC_DATA_NOTE};
    use crate::intent::classify;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    pub(crate) fn sample_vessel(id: &str, name: &str, category: VesselCategory, flag: &str) -> VesselRecord {
        VesselRecord {
            id: id.to_string(),
            name: name.to_string(),
            category,
            speed: Some(8.0),
            heading: Some(45.0),
            latitude: Some(0.0),
            longitude: Some(0.0),
            flag: flag.to_string(),
            destination: "Santos".to_string(),
            last_port: None,
            status: "Under way using engine".to_string(),
        }
    }

    /// Canned provider that records every call it receives.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub calls: Mutex<Vec<String>>,
        pub fail_with_status: Option<u16>,
    }

    impl FakeProvider {
        pub(crate) fn failing(status: u16) -> Self {
            Self {
                fail_with_status: Some(status),
                ..Self::default()
            }
        }

        fn record(&self, call: String) -> Result<()> {
            self.calls.lock().push(call);
            match self.fail_with_status {
                Some(status) => Err(MaritimeError::Upstream {
                    endpoint: "fake".to_string(),
                    status,
                }),
                None => Ok(()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ShipDataProvider for FakeProvider {
        async fn vessels_near_port(&self, port_name: &str) -> Result<VesselBatch> {
            self.record(format!("near_port:{port_name}"))?;
            Ok(VesselBatch::live(vec![sample_vessel("1", "HARBOUR QUEEN", VesselCategory::Cargo, "Brazil")]))
        }

        async fn vessel_by_id(&self, id: &str) -> Result<VesselRecord> {
            self.record(format!("by_id:{id}"))?;
            if id == "000000000" {
                return Err(MaritimeError::NotFound(format!("no vessel with id {id}")));
            }
            Ok(sample_vessel(id, "CORAL WAVE", VesselCategory::Tanker, "Liberia"))
        }

        async fn search_vessels(&self, query: &str, limit: usize) -> Result<VesselBatch> {
            self.record(format!("search:{query}:{limit}"))?;
            Ok(VesselBatch::live(vec![sample_vessel("2", "NORDIC STAR", VesselCategory::Cargo, "Norway")]))
        }

        async fn vessels_in_area(&self, latitude: f64, longitude: f64, radius: f64) -> VesselBatch {
            self.calls.lock().push(format!("area:{latitude}:{longitude}:{radius}"));
            VesselBatch::synthetic(vec![
                sample_vessel("3", "GOLDEN DAWN", VesselCategory::Tanker, "Panama"),
                sample_vessel("4", "IRON SPIRIT", VesselCategory::Cargo, "Liberia"),
                sample_vessel("5", "BLUE BREEZE", VesselCategory::PleasureCraft, "Malta"),
            ])
        }

        async fn port_info(&self, port_name: &str) -> Result<PortRecord> {
            self.record(format!("port:{port_name}"))?;
            Ok(PortRecord::from_json(serde_json::json!({"name": port_name, "lat": -23.96, "lon": -46.3})))
        }
    }

    fn executor(provider: &FakeProvider) -> QueryExecutor<'_> {
        QueryExecutor::new(provider, 10, 50.0)
    }

    #[tokio::test]
    async fn test_port_info_dispatch() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("porto de santos").0).await;
        assert!(matches!(result, QueryResult::Port(ref p) if p.name == "santos"));
        assert_eq!(provider.calls(), vec!["port:santos"]);
    }

    #[tokio::test]
    async fn test_ships_at_port_lists_vessels() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("navios no porto de santos").0).await;
        assert_eq!(result.batch().map(|b| b.len()), Some(1));
        assert_eq!(provider.calls(), vec!["near_port:santos"]);
    }

    #[tokio::test]
    async fn test_search_passes_limit() {
        let provider = FakeProvider::default();
        executor(&provider).execute(&classify("find ship nordic star").0).await;
        assert_eq!(provider.calls(), vec!["search:nordic star:10"]);
    }

    #[tokio::test]
    async fn test_area_uses_intent_coordinates() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("navios no canal de suez").0).await;
        assert_eq!(provider.calls(), vec!["area:30.4276:32.3439:80"]);
        assert!(result.batch().unwrap().is_synthetic());
    }

    #[tokio::test]
    async fn test_type_search_filters_synthetic_batch() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("navios tipo petroleiro").0).await;
        let batch = result.batch().unwrap();
        assert_eq!(provider.calls(), vec!["area:0:0:50"]);
        assert_eq!(batch.len(), 1);
        assert!(batch.vessels.iter().all(|v| v.category == VesselCategory::Tanker));
        assert_eq!(batch.note(), Some(SYNTHETIC_DATA_NOTE));
    }

    #[tokio::test]
    async fn test_flag_search_filters_synthetic_batch() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("bandeira da libéria").0).await;
        let batch = result.batch().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.vessels[0].flag, "Liberia");
        assert!(batch.is_synthetic());
    }

    #[tokio::test]
    async fn test_general_fetches_nothing() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("xyzzy plugh").0).await;
        assert_eq!(result, QueryResult::NoData);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_value() {
        let provider = FakeProvider::failing(503);
        let result = executor(&provider).execute(&classify("porto de santos").0).await;
        match result {
            QueryResult::Failed { kind, status, message } => {
                assert_eq!(kind, ErrorKind::Upstream);
                assert_eq!(status, Some(503));
                assert!(message.contains("503"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_becomes_value() {
        let provider = FakeProvider::default();
        let result = executor(&provider).execute(&classify("mmsi 000000000").0).await;
        assert!(matches!(result, QueryResult::Failed { kind: ErrorKind::NotFound, status: None, .. }));
    }

    #[test]
    fn test_failed_result_serializes_with_kind() {
        let err = MaritimeError::Upstream {
            endpoint: "ports".to_string(),
            status: 401,
        };
        let json = serde_json::to_value(QueryResult::failed(&err)).unwrap();
        assert_eq!(json["result"], "failed");
        assert_eq!(json["kind"], "upstream");
        assert_eq!(json["status"], 401);
    }
}
