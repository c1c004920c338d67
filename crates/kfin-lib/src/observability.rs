//! Structured logging for cost reporting events
//!
//! Every event carries a stable `event` field so JSON log output can be
//! filtered without parsing messages.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::ReportData;
use crate::pricing::{PricingError, PricingResolution};
use crate::stats::StatsError;

/// Structured logger for reporting events
///
/// Tagged with the cluster the session is inspecting.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    cluster: String,
}

impl StructuredLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Log the rates chosen for this session
    pub fn log_pricing_resolved(&self, resolution: &PricingResolution) {
        info!(
            event = "pricing_resolved",
            cluster = %self.cluster,
            source = %resolution.source_label,
            cpu_per_core_hour = resolution.rates.cpu_per_core_hour,
            mem_per_gb_hour = resolution.rates.mem_per_gb_hour,
            "Resolved usage pricing"
        );
    }

    /// Log an oracle failure that was replaced by configured rates
    pub fn log_pricing_fallback(&self, error: &PricingError, fallback_label: &str) {
        warn!(
            event = "pricing_fallback",
            cluster = %self.cluster,
            error = %error,
            fallback = %fallback_label,
            "Pricing oracle failed, using fallback rates"
        );
    }

    /// Log a completed stats range query
    pub fn log_stats_query(&self, base_url: &str, series: usize, elapsed: Duration) {
        debug!(
            event = "stats_query",
            cluster = %self.cluster,
            base_url = %base_url,
            series = series,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stats query completed"
        );
    }

    /// Log a failed stats range query
    pub fn log_stats_query_failed(&self, base_url: &str, error: &StatsError) {
        warn!(
            event = "stats_query_failed",
            cluster = %self.cluster,
            base_url = %base_url,
            error = %error,
            "Stats query failed"
        );
    }

    /// Log the totals of a freshly built report
    pub fn log_report_built(&self, report: &ReportData) {
        info!(
            event = "report_built",
            cluster = %self.cluster,
            context = %report.context_name,
            nodes = report.node_costs.len(),
            workloads = report.workload_costs.len(),
            grand_total = report.grand_total,
            pricing_source = %report.pricing_source_label,
            stats_ready = report.stats_freshness.ready,
            "Cost report built"
        );
    }

    /// Log command startup
    pub fn log_startup(&self, version: &str, command: &str) {
        info!(
            event = "kfin_started",
            cluster = %self.cluster,
            version = %version,
            command = %command,
            "kfin started"
        );
    }

    /// Log command shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "kfin_shutdown",
            cluster = %self.cluster,
            reason = %reason,
            "kfin shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::UsageRates;

    #[test]
    fn test_logger_keeps_cluster() {
        let logger = StructuredLogger::new("prod-east");
        assert_eq!(logger.cluster(), "prod-east");
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = StructuredLogger::new("test");
        let resolution = PricingResolution::new(
            UsageRates {
                cpu_per_core_hour: 0.03,
                mem_per_gb_hour: 0.004,
            },
            "oracle",
        );

        logger.log_pricing_resolved(&resolution);
        logger.log_pricing_fallback(&PricingError::InvalidOutput("x".to_string()), "config");
        logger.log_stats_query("http://prometheus:9090", 1, Duration::from_millis(12));
        logger.log_stats_query_failed("http://prometheus:9090", &StatsError::NoDataPoints);
        logger.log_startup("0.1.0", "tui");
        logger.log_shutdown("quit");
    }
}
