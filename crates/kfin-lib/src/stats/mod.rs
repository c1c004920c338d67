//! Historical usage statistics from a Prometheus-compatible API
//!
//! This module provides:
//! - A range-query client with an inspectable URL builder
//! - Reducers turning matrix responses into averages and coverage metadata
//! - Freshness classification used by the dashboard's detail view

mod client;
mod freshness;
mod reduce;


pub use client::{MatrixSeries, QueryRangeData, QueryRangeResponse, StatsClient, TimeSeriesPoint};
pub use freshness::{format_short_duration, probe_freshness, Confidence, StatsFreshness};
pub use reduce::{
    average_series_value, coverage_stats, series_point_stats, CoverageStats, SeriesPointStats,
};

use thiserror::Error;

/// Cluster-wide CPU usage in cores
pub const DEFAULT_CPU_QUERY: &str =
    r#"sum(rate(container_cpu_usage_seconds_total{container!="",pod!=""}[5m]))"#;

/// Cluster-wide working set memory in bytes
pub const DEFAULT_MEMORY_QUERY: &str =
    r#"sum(container_memory_working_set_bytes{container!="",pod!=""})"#;

/// Errors raised by the stats client and reducers
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid stats base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("request stats API: {0}")]
    Transport(String),

    #[error("stats API returned {status}: {body}")]
    NonSuccessStatus { status: u16, body: String },

    #[error("decode response: {0}")]
    Decode(String),

    #[error("stats query failed ({error_type}): {error}")]
    QueryRejected { error_type: String, error: String },

    #[error("no datapoints in query response")]
    NoDataPoints,
}
