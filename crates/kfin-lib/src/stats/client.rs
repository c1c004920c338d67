//! Range-query client for the stats backend

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use super::StatsError;

/// One `[timestamp, "value"]` sample with both halves well-formed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp_unix: i64,
    pub value: f64,
}

/// One series of a matrix result
///
/// Samples are kept as raw JSON so that malformed entries can be skipped
/// individually instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixSeries {
    #[serde(rename = "metric", default)]
    pub labels: HashMap<String, String>,
    #[serde(rename = "values", default)]
    pub samples: Vec<Vec<serde_json::Value>>,
}

impl MatrixSeries {
    /// Build a series from `(timestamp, value)` pairs in wire format
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = (i64, &'a str)>) -> Self {
        Self {
            labels: HashMap::new(),
            samples: samples
                .into_iter()
                .map(|(ts, value)| vec![serde_json::json!(ts), serde_json::json!(value)])
                .collect(),
        }
    }

    /// Sample timestamps, skipping entries without a numeric timestamp
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.samples
            .iter()
            .filter_map(|sample| sample.first().and_then(serde_json::Value::as_f64))
            .map(|ts| ts as i64)
    }

    /// Sample values, skipping entries whose value is not a numeric string
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|sample| sample_value(sample))
    }

    /// Samples where both timestamp and value are usable
    pub fn points(&self) -> impl Iterator<Item = TimeSeriesPoint> + '_ {
        self.samples.iter().filter_map(|sample| {
            let ts = sample.first().and_then(serde_json::Value::as_f64)?;
            let value = sample_value(sample)?;
            Some(TimeSeriesPoint {
                timestamp_unix: ts as i64,
                value,
            })
        })
    }
}

fn sample_value(sample: &[serde_json::Value]) -> Option<f64> {
    sample
        .get(1)
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| raw.parse::<f64>().ok())
}

/// Body of `/api/v1/query_range`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRangeResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: QueryRangeData,
    #[serde(rename = "errorType", default)]
    pub error_type: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRangeData {
    #[serde(rename = "resultType", default)]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<MatrixSeries>,
}

/// Client for a Prometheus-compatible stats API
pub struct StatsClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl StatsClient {
    /// Create a new client; an empty or unparsable base URL is rejected
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StatsError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StatsError::InvalidBaseUrl(
                "stats base URL is empty".to_string(),
            ));
        }
        Url::parse(&base_url)
            .map_err(|e| StatsError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatsError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the range-query URL without sending anything
    pub fn query_range_url(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<Url, StatsError> {
        let mut url = Url::parse(&format!("{}/api/v1/query_range", self.base_url))
            .map_err(|e| StatsError::InvalidBaseUrl(format!("build query URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("start", &start.timestamp().to_string())
            .append_pair("end", &end.timestamp().to_string())
            .append_pair("step", &step.as_secs().to_string());

        Ok(url)
    }

    /// Execute a range query and return the matrix series
    pub async fn query_range(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<Vec<MatrixSeries>, StatsError> {
        let url = self.query_range_url(query, start, end, step)?;
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StatsError::NonSuccessStatus {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let parsed: QueryRangeResponse =
            serde_json::from_slice(&body).map_err(|e| StatsError::Decode(e.to_string()))?;

        if parsed.status != "success" {
            return Err(StatsError::QueryRejected {
                error_type: parsed.error_type,
                error: parsed.error,
            });
        }

        debug!(
            query = %query,
            series = parsed.data.result.len(),
            result_type = %parsed.data.result_type,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stats range query completed"
        );

        Ok(parsed.data.result)
    }

    fn transport_error(&self, e: reqwest::Error) -> StatsError {
        if e.is_timeout() {
            StatsError::Transport(format!("timed out after {:?}", self.timeout))
        } else {
            StatsError::Transport(e.to_string())
        }
    }
}
