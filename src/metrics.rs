// ═══════════════════════════════════════════════════════════════
// METRICS COLLECTOR - What happened this session, in numbers
// ═══════════════════════════════════════════════════════════════
//
// Atomic counters for the session: questions per intent, failures per
// kind, how often the language model let us down, how many batches of
// make-believe vessels we handed out. `/stats` prints a snapshot, and
// the one-shot commands log one at exit.
//
// No server, no exporter. One process, one user, one snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::error::ErrorKind;
use crate::executor::QueryResult;
use crate::intent::IntentKind;
use crate::models::VesselBatch;

/// The metrics snapshot - what gets serialized to JSON
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_queries: u64,
    pub port_info_queries: u64,
    pub vessel_search_queries: u64,
    pub vessel_by_id_queries: u64,
    pub ships_in_area_queries: u64,
    pub vessel_type_queries: u64,
    pub flag_queries: u64,
    pub general_queries: u64,
    pub region_reports: u64,
    pub upstream_errors: u64,
    pub not_found_errors: u64,
    pub transport_errors: u64,
    pub decode_errors: u64,
    pub degraded_narratives: u64,
    pub synthetic_batches: u64,
    pub uptime_seconds: u64,
    pub queries_per_minute: f64,
}

/// Thread-safe atomic metrics collector
pub struct MetricsCollector {
    port_info: AtomicU64,
    vessel_search: AtomicU64,
    vessel_by_id: AtomicU64,
    ships_in_area: AtomicU64,
    vessel_type: AtomicU64,
    flag: AtomicU64,
    general: AtomicU64,
    region_reports: AtomicU64,
    upstream_errors: AtomicU64,
    not_found_errors: AtomicU64,
    transport_errors: AtomicU64,
    decode_errors: AtomicU64,
    degraded_narratives: AtomicU64,
    synthetic_batches: AtomicU64,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            port_info: AtomicU64::new(0),
            vessel_search: AtomicU64::new(0),
            vessel_by_id: AtomicU64::new(0),
            ships_in_area: AtomicU64::new(0),
            vessel_type: AtomicU64::new(0),
            flag: AtomicU64::new(0),
            general: AtomicU64::new(0),
            region_reports: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
            not_found_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            degraded_narratives: AtomicU64::new(0),
            synthetic_batches: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_intent(&self, kind: IntentKind) {
        let counter = match kind {
            IntentKind::PortInfo => &self.port_info,
            IntentKind::VesselSearch => &self.vessel_search,
            IntentKind::VesselById => &self.vessel_by_id,
            IntentKind::ShipsInArea => &self.ships_in_area,
            IntentKind::VesselTypeSearch => &self.vessel_type,
            IntentKind::FlagSearch => &self.flag,
            IntentKind::General => &self.general,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_error(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::Upstream => &self.upstream_errors,
            ErrorKind::NotFound => &self.not_found_errors,
            ErrorKind::Transport => &self.transport_errors,
            ErrorKind::Decode => &self.decode_errors,
            // Service failures surface as degraded narratives instead.
            ErrorKind::Service => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_region_reports(&self) {
        self.region_reports.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_degraded(&self) {
        self.degraded_narratives.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_synthetic(&self) {
        self.synthetic_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Count whatever a query result says about itself: its failure kind,
    /// or whether it served synthetic vessels.
    pub fn record_result(&self, result: &QueryResult) {
        if let QueryResult::Failed { kind, .. } = result {
            self.increment_error(*kind);
        }
        if result.batch().is_some_and(VesselBatch::is_synthetic) {
            self.increment_synthetic();
        }
    }

    /// Take a snapshot of all metrics (lock-free reads)
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let per_intent = [
            load(&self.port_info),
            load(&self.vessel_search),
            load(&self.vessel_by_id),
            load(&self.ships_in_area),
            load(&self.vessel_type),
            load(&self.flag),
            load(&self.general),
        ];
        let total: u64 = per_intent.iter().sum();
        let uptime = self.start_time.elapsed().as_secs();
        let queries_per_minute = if uptime > 0 {
            (total as f64 / uptime as f64) * 60.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_queries: total,
            port_info_queries: per_intent[0],
            vessel_search_queries: per_intent[1],
            vessel_by_id_queries: per_intent[2],
            ships_in_area_queries: per_intent[3],
            vessel_type_queries: per_intent[4],
            flag_queries: per_intent[5],
            general_queries: per_intent[6],
            region_reports: load(&self.region_reports),
            upstream_errors: load(&self.upstream_errors),
            not_found_errors: load(&self.not_found_errors),
            transport_errors: load(&self.transport_errors),
            decode_errors: load(&self.decode_errors),
            degraded_narratives: load(&self.degraded_narratives),
            synthetic_batches: load(&self.synthetic_batches),
            uptime_seconds: uptime,
            queries_per_minute,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_counts_sum_to_total() {
        let metrics = MetricsCollector::new();
        metrics.increment_intent(IntentKind::PortInfo);
        metrics.increment_intent(IntentKind::PortInfo);
        metrics.increment_intent(IntentKind::General);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_queries, 3);
        assert_eq!(snap.port_info_queries, 2);
        assert_eq!(snap.general_queries, 1);
    }

    #[test]
    fn test_record_result() {
        let metrics = MetricsCollector::new();
        metrics.record_result(&QueryResult::Failed {
            kind: ErrorKind::Upstream,
            message: "HTTP 500".to_string(),
            status: Some(500),
        });
        metrics.record_result(&QueryResult::Vessels(VesselBatch::synthetic(vec![])));
        metrics.record_result(&QueryResult::Vessels(VesselBatch::live(vec![])));
        metrics.record_result(&QueryResult::NoData);

        let snap = metrics.snapshot();
        assert_eq!(snap.upstream_errors, 1);
        assert_eq!(snap.synthetic_batches, 1);
        assert_eq!(snap.not_found_errors, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(MetricsCollector::new().snapshot()).unwrap();
        assert_eq!(json["total_queries"], 0);
        assert!(json.get("degraded_narratives").is_some());
    }
}
