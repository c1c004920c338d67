//! Usage-based pricing resolution
//!
//! Rates come either from configured constants or from an external oracle
//! command. [`resolve_pricing`] prefers the oracle when one is configured and
//! silently falls back to the configured constants when it misbehaves.

mod oracle;
mod static_rates;

pub use oracle::{parse_rates_output, OracleProvider};
pub use static_rates::StaticProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::PricingConfig;
use crate::observability::StructuredLogger;

/// Dollar cost per CPU core-hour and per GB-hour of memory
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageRates {
    pub cpu_per_core_hour: f64,
    pub mem_per_gb_hour: f64,
}

/// Errors raised while resolving pricing rates
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("pricing oracle unavailable: {reason} (output: {output})")]
    OracleUnavailable { reason: String, output: String },

    #[error("failed to parse pricing oracle output as JSON: {0}")]
    InvalidOutput(String),

    #[error("pricing oracle returned non-positive rates: cpu_per_hour={cpu_per_hour:.6} mem_per_gb_hour={mem_per_gb_hour:.6}")]
    NonPositiveRate {
        cpu_per_hour: f64,
        mem_per_gb_hour: f64,
    },

    #[error("invalid pricing source: {0}")]
    InvalidSource(String),
}

/// A source of usage-based rates
#[async_trait]
pub trait PricingProvider: Send + Sync {
    /// Resolve the current rates
    async fn resolve(&self) -> Result<UsageRates, PricingError>;

    /// Short label shown next to the rates ("config", "oracle")
    fn source_label(&self) -> &'static str;
}

/// Rates together with the label of the source that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResolution {
    pub rates: UsageRates,
    pub source_label: String,
}

impl PricingResolution {
    pub fn new(rates: UsageRates, source_label: impl Into<String>) -> Self {
        Self {
            rates,
            source_label: source_label.into(),
        }
    }

    /// Resolution backed only by the configured constants
    pub fn from_config(config: &PricingConfig) -> Self {
        let provider = StaticProvider::from_config(config);
        Self::new(provider.rates(), provider.source_label())
    }
}

/// Pricing source selected explicitly by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingSourceKind {
    Config,
    Oracle,
}

impl std::str::FromStr for PricingSourceKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "config" => Ok(Self::Config),
            "oracle" | "mcp" => Ok(Self::Oracle),
            other => Err(PricingError::InvalidSource(format!(
                "{:?} (expected: config or oracle)",
                other
            ))),
        }
    }
}

/// Build a provider for an explicitly selected source
///
/// Unlike [`resolve_pricing`], the caller gets the provider itself and sees its
/// failures. An oracle without a command is rejected up front.
pub fn build_provider(
    kind: PricingSourceKind,
    config: &PricingConfig,
    command: &str,
    args: &[String],
    timeout: Duration,
) -> Result<Box<dyn PricingProvider>, PricingError> {
    match kind {
        PricingSourceKind::Config => Ok(Box::new(StaticProvider::from_config(config))),
        PricingSourceKind::Oracle => {
            let command = command.trim();
            if command.is_empty() {
                return Err(PricingError::InvalidSource(
                    "oracle pricing requires a command (--pricing-command or pricing.oracle.command)"
                        .to_string(),
                ));
            }
            Ok(Box::new(
                OracleProvider::new(command, args.to_vec()).with_timeout(timeout),
            ))
        }
    }
}

/// Resolve the rates used for this session
///
/// Tries the oracle when a command is configured; any failure is logged and
/// replaced by the configured constants. Never fails.
pub async fn resolve_pricing(config: &PricingConfig, logger: &StructuredLogger) -> PricingResolution {
    let fallback = StaticProvider::from_config(config);

    if config.oracle.command.trim().is_empty() {
        let resolution = PricingResolution::new(fallback.rates(), fallback.source_label());
        logger.log_pricing_resolved(&resolution);
        return resolution;
    }

    let oracle = OracleProvider::new(&config.oracle.command, config.oracle.args.clone())
        .with_timeout(config.oracle.timeout());

    let resolution = match oracle.resolve().await {
        Ok(rates) => PricingResolution::new(rates, oracle.source_label()),
        Err(e) => {
            logger.log_pricing_fallback(&e, fallback.source_label());
            PricingResolution::new(fallback.rates(), fallback.source_label())
        }
    };
    logger.log_pricing_resolved(&resolution);
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CloudRates, OracleConfig};

    fn config_with_oracle(command: &str, args: &[&str]) -> PricingConfig {
        PricingConfig {
            cloud: CloudRates {
                cpu_per_hour: 0.02,
                mem_per_gb_hour: 0.005,
            },
            oracle: OracleConfig {
                command: command.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                timeout_seconds: 5,
            },
            ..PricingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_without_oracle_uses_config() {
        let config = config_with_oracle("", &[]);
        let resolution = resolve_pricing(&config, &StructuredLogger::new("test")).await;

        assert_eq!(resolution.source_label, "config");
        assert_eq!(resolution.rates.cpu_per_core_hour, 0.02);
        assert_eq!(resolution.rates.mem_per_gb_hour, 0.005);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_with_oracle() {
        let config = config_with_oracle(
            "sh",
            &["-c", r#"echo '{"cpu_per_hour":0.031,"mem_per_gb_hour":0.004}'"#],
        );
        let resolution = resolve_pricing(&config, &StructuredLogger::new("test")).await;

        assert_eq!(resolution.source_label, "oracle");
        assert_eq!(resolution.rates.cpu_per_core_hour, 0.031);
        assert_eq!(resolution.rates.mem_per_gb_hour, 0.004);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_falls_back_on_oracle_failure() {
        let config = config_with_oracle("sh", &["-c", "echo boom >&2; exit 3"]);
        let resolution = resolve_pricing(&config, &StructuredLogger::new("test")).await;

        assert_eq!(resolution.source_label, "config");
        assert_eq!(resolution.rates.cpu_per_core_hour, 0.02);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_when_command_missing() {
        let config = config_with_oracle("/nonexistent/kfin-price-oracle", &[]);
        let resolution = resolve_pricing(&config, &StructuredLogger::new("test")).await;

        assert_eq!(resolution.source_label, "config");
        assert_eq!(resolution.rates.mem_per_gb_hour, 0.005);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_falls_back_on_zero_rates() {
        let config = config_with_oracle(
            "sh",
            &["-c", r#"echo '{"cpu_per_hour":0,"mem_per_gb_hour":0}'"#],
        );
        let resolution = resolve_pricing(&config, &StructuredLogger::new("test")).await;

        assert_eq!(resolution.source_label, "config");
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("config".parse::<PricingSourceKind>().unwrap(), PricingSourceKind::Config);
        assert_eq!("".parse::<PricingSourceKind>().unwrap(), PricingSourceKind::Config);
        assert_eq!(" Oracle ".parse::<PricingSourceKind>().unwrap(), PricingSourceKind::Oracle);
        assert_eq!("mcp".parse::<PricingSourceKind>().unwrap(), PricingSourceKind::Oracle);
        assert!(matches!(
            "nope".parse::<PricingSourceKind>(),
            Err(PricingError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_build_provider_config_source() {
        let config = PricingConfig::default();
        let provider =
            build_provider(PricingSourceKind::Config, &config, "", &[], Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.source_label(), "config");
    }

    #[test]
    fn test_build_provider_oracle_requires_command() {
        let config = PricingConfig::default();
        let result =
            build_provider(PricingSourceKind::Oracle, &config, "  ", &[], Duration::from_secs(1));
        assert!(matches!(result, Err(PricingError::InvalidSource(_))));
    }

    #[test]
    fn test_build_provider_oracle_with_command() {
        let config = PricingConfig::default();
        let args = vec![r#"{"cpu_per_hour":0.01,"mem_per_gb_hour":0.001}"#.to_string()];
        let provider = build_provider(
            PricingSourceKind::Oracle,
            &config,
            "/bin/echo",
            &args,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(provider.source_label(), "oracle");
    }
}
