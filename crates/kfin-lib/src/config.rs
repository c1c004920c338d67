//! Pricing and stats configuration
//!
//! Settings are read from a YAML file and then overridden from the environment
//! (`KFIN_PRICING__ELECTRICITY_RATE=0.2`). A missing file is not an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::pricing::UsageRates;

const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOOKBACK_HOURS: u64 = 24;

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Pricing constants used by the cost model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Amortized hardware cost per GB of node memory per month
    pub hardware_monthly_per_gb: f64,
    /// $/kWh
    pub electricity_rate: f64,
    /// Average draw per node in watts
    pub watts_per_node: f64,
    /// Flat monthly price by `node.kubernetes.io/instance-type`
    pub instance_monthly_by_type: HashMap<String, f64>,
    #[serde(alias = "eks")]
    pub control_plane: ControlPlanePricing,
    #[serde(alias = "mcp")]
    pub oracle: OracleConfig,
    /// Usage-based cloud rates, also the static fallback for the oracle
    pub cloud: CloudRates,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            hardware_monthly_per_gb: 0.26,
            electricity_rate: 0.12,
            watts_per_node: 15.0,
            instance_monthly_by_type: HashMap::new(),
            control_plane: ControlPlanePricing::default(),
            oracle: OracleConfig::default(),
            cloud: CloudRates::default(),
        }
    }
}

/// Managed control plane surcharge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlanePricing {
    pub control_plane_per_hour: f64,
}

impl Default for ControlPlanePricing {
    fn default() -> Self {
        Self {
            control_plane_per_hour: 0.10,
        }
    }
}

/// External pricing oracle command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            timeout_seconds: DEFAULT_ORACLE_TIMEOUT_SECS,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// $/core-hour and $/GB-hour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudRates {
    pub cpu_per_hour: f64,
    pub mem_per_gb_hour: f64,
}

impl Default for CloudRates {
    fn default() -> Self {
        Self {
            cpu_per_hour: 0.025,
            mem_per_gb_hour: 0.006,
        }
    }
}

impl From<&CloudRates> for UsageRates {
    fn from(rates: &CloudRates) -> Self {
        UsageRates {
            cpu_per_core_hour: rates.cpu_per_hour,
            mem_per_gb_hour: rates.mem_per_gb_hour,
        }
    }
}

/// Prometheus-compatible stats backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub base_url: String,
    pub query_timeout_seconds: u64,
    pub default_lookback_hours: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            query_timeout_seconds: DEFAULT_QUERY_TIMEOUT_SECS,
            default_lookback_hours: DEFAULT_LOOKBACK_HOURS,
        }
    }
}

impl StatsConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.default_lookback_hours.saturating_mul(3600))
    }
}

impl Settings {
    /// Load settings from an optional YAML file plus `KFIN_*` environment overrides
    ///
    /// Invalid content is logged and replaced by defaults so that a broken file
    /// never prevents the dashboard from starting.
    pub fn load(path: Option<&Path>) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Invalid configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Load settings, reporting parse errors to the caller
    pub fn try_load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(false),
            );
        }
        let raw = builder
            .add_source(
                config::Environment::with_prefix("KFIN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?;

        let settings: Settings = raw
            .try_deserialize()
            .context("Failed to parse configuration")?;
        Ok(settings.normalized())
    }

    /// Replace non-positive timeouts and lookback windows with defaults
    pub fn normalized(mut self) -> Self {
        if self.stats.query_timeout_seconds == 0 {
            self.stats.query_timeout_seconds = DEFAULT_QUERY_TIMEOUT_SECS;
        }
        if self.stats.default_lookback_hours == 0 {
            self.stats.default_lookback_hours = DEFAULT_LOOKBACK_HOURS;
        }
        if self.pricing.oracle.timeout_seconds == 0 {
            self.pricing.oracle.timeout_seconds = DEFAULT_ORACLE_TIMEOUT_SECS;
        }
        self.pricing.oracle.command = self.pricing.oracle.command.trim().to_string();
        self.stats.base_url = self.stats.base_url.trim().to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pricing.hardware_monthly_per_gb, 0.26);
        assert_eq!(settings.pricing.electricity_rate, 0.12);
        assert_eq!(settings.pricing.watts_per_node, 15.0);
        assert_eq!(settings.pricing.control_plane.control_plane_per_hour, 0.10);
        assert_eq!(settings.pricing.cloud.cpu_per_hour, 0.025);
        assert_eq!(settings.pricing.cloud.mem_per_gb_hour, 0.006);
        assert_eq!(settings.stats.query_timeout(), Duration::from_secs(15));
        assert_eq!(settings.stats.lookback(), Duration::from_secs(24 * 3600));
        assert_eq!(settings.pricing.oracle.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_yaml_overrides_defaults() {
        let file = write_config(
            r#"
pricing:
  electricity_rate: 0.30
  instance_monthly_by_type:
    m5.large: 120.0
  mcp:
    command: " /usr/local/bin/price-oracle "
    args: ["--region", "us-east-1"]
stats:
  base_url: http://prometheus:9090
  query_timeout_seconds: 0
"#,
        );

        let settings = Settings::try_load(Some(file.path())).unwrap();
        assert_eq!(settings.pricing.electricity_rate, 0.30);
        assert_eq!(settings.pricing.hardware_monthly_per_gb, 0.26);
        assert_eq!(
            settings.pricing.instance_monthly_by_type.get("m5.large"),
            Some(&120.0)
        );
        assert_eq!(settings.pricing.oracle.command, "/usr/local/bin/price-oracle");
        assert_eq!(settings.pricing.oracle.args, vec!["--region", "us-east-1"]);
        assert_eq!(settings.stats.base_url, "http://prometheus:9090");
        assert_eq!(settings.stats.query_timeout_seconds, 15);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/kfin/config.yaml")));
        assert_eq!(settings.pricing.watts_per_node, 15.0);
        assert!(settings.stats.base_url.is_empty());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config("stats:\n  default_lookback_hours: 12\n");
        std::env::set_var("KFIN_STATS__DEFAULT_LOOKBACK_HOURS", "48");
        let result = Settings::try_load(Some(file.path()));
        std::env::remove_var("KFIN_STATS__DEFAULT_LOOKBACK_HOURS");

        let settings = result.unwrap();
        assert_eq!(settings.stats.default_lookback_hours, 48);
    }

    #[test]
    fn test_huge_lookback_saturates() {
        let stats = StatsConfig {
            default_lookback_hours: u64::MAX,
            ..StatsConfig::default()
        };
        assert_eq!(stats.lookback(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let file = write_config("pricing: [not, a, map]\n");
        let settings = Settings::load(Some(file.path()));
        assert_eq!(settings.pricing.electricity_rate, 0.12);
    }
}
