//! Data freshness of the stats backend
//!
//! The dashboard shows how much scrape history backs the usage numbers. A
//! single probe query over the lookback window decides the confidence level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{coverage_stats, series_point_stats, StatsClient, DEFAULT_CPU_QUERY};
use crate::config::StatsConfig;
use crate::observability::StructuredLogger;

const PROBE_STEP: Duration = Duration::from_secs(300);

/// Confidence in usage figures given the observed history span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl Confidence {
    pub fn classify(observed: Duration) -> Self {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;

        match observed.as_secs() {
            s if s < 30 * MINUTE => Self::VeryLow,
            s if s < 2 * HOUR => Self::Low,
            s if s < 6 * HOUR => Self::Moderate,
            _ => Self::High,
        }
    }

    /// Display label including a short qualifier
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very low (early scrape history)",
            Self::Low => "Low (still warming up)",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

/// Result of the freshness probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsFreshness {
    pub ready: bool,
    /// Why the probe is not ready; empty when ready
    pub note: String,
    pub base_url: String,
    pub lookback: Duration,
    pub observed: Duration,
    pub sample_count: usize,
    pub last_sample_at: Option<DateTime<Utc>>,
}

impl StatsFreshness {
    pub fn unavailable(base_url: impl Into<String>, lookback: Duration, note: impl Into<String>) -> Self {
        Self {
            ready: false,
            note: note.into(),
            base_url: base_url.into(),
            lookback,
            ..Self::default()
        }
    }

    /// Confidence level, only meaningful when ready
    pub fn confidence(&self) -> Option<Confidence> {
        self.ready.then(|| Confidence::classify(self.observed))
    }
}

/// Probe how much history the stats backend holds for the default CPU query
///
/// Never fails; every problem is reported through the `note` field.
pub async fn probe_freshness(
    config: &StatsConfig,
    now: DateTime<Utc>,
    logger: &StructuredLogger,
) -> StatsFreshness {
    let lookback = config.lookback();
    let base_url = config.base_url.trim();

    if base_url.is_empty() {
        return StatsFreshness::unavailable("", lookback, "No Prometheus endpoint configured");
    }

    let client = match StatsClient::new(base_url, config.query_timeout()) {
        Ok(client) => client,
        Err(e) => {
            return StatsFreshness::unavailable(base_url, lookback, format!("Stats client error: {}", e))
        }
    };

    let start = now - chrono::Duration::seconds(lookback.as_secs() as i64);
    let started = Instant::now();
    let series = match client
        .query_range(DEFAULT_CPU_QUERY, start, now, PROBE_STEP)
        .await
    {
        Ok(series) => series,
        Err(e) => {
            logger.log_stats_query_failed(client.base_url(), &e);
            return StatsFreshness::unavailable(
                client.base_url(),
                lookback,
                format!("Stats query failed: {}", e),
            );
        }
    };
    logger.log_stats_query(client.base_url(), series.len(), started.elapsed());

    let coverage = coverage_stats(&series);
    if !coverage.has_points {
        return StatsFreshness::unavailable(
            client.base_url(),
            lookback,
            "No Prometheus datapoints returned",
        );
    }

    StatsFreshness {
        ready: true,
        note: String::new(),
        base_url: client.base_url().to_string(),
        lookback,
        observed: coverage.observed_duration,
        sample_count: series_point_stats(&series).total_points,
        last_sample_at: coverage.latest,
    }
}

/// Compact duration such as `45m`, `2h` or `2h30m`
pub fn format_short_duration(d: Duration) -> String {
    let total_minutes = d.as_secs() / 60;
    if total_minutes == 0 {
        return "0m".to_string();
    }

    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
