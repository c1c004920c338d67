//! External pricing oracle
//!
//! Runs a command that prints rates as JSON, e.g.
//! `{"cpu_per_hour":0.031,"mem_per_gb_hour":0.004}`. Wrappers are allowed to
//! log diagnostics before the final JSON line.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{PricingError, PricingProvider, UsageRates};

/// Default time budget for one oracle invocation
const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire shape printed by the oracle; absent fields read as zero
#[derive(Debug, Deserialize)]
struct OracleRates {
    #[serde(default)]
    cpu_per_hour: f64,
    #[serde(default)]
    mem_per_gb_hour: f64,
}

/// Provider that shells out to a pricing command
#[derive(Debug, Clone)]
pub struct OracleProvider {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl OracleProvider {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into().trim().to_string(),
            args,
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Set the time budget for the invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command and return its stdout and stderr
    async fn run(&self) -> Result<(String, String), PricingError> {
        if self.command.is_empty() {
            return Err(PricingError::OracleUnavailable {
                reason: "pricing command is empty".to_string(),
                output: String::new(),
            });
        }

        debug!(command = %self.command, args = ?self.args, timeout = ?self.timeout, "Running pricing oracle");

        let child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PricingError::OracleUnavailable {
                reason: format!("failed to start {}: {}", self.command, e),
                output: String::new(),
            })?;

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PricingError::OracleUnavailable {
                    reason: format!("failed to run {}: {}", self.command, e),
                    output: String::new(),
                })
            }
            Err(_) => {
                return Err(PricingError::OracleUnavailable {
                    reason: format!("{} timed out after {:?}", self.command, self.timeout),
                    output: String::new(),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(PricingError::OracleUnavailable {
                reason: format!("{} exited with {}", self.command, output.status),
                output: format!("{}{}", stdout, stderr).trim().to_string(),
            });
        }

        Ok((stdout, stderr))
    }
}

#[async_trait]
impl PricingProvider for OracleProvider {
    async fn resolve(&self) -> Result<UsageRates, PricingError> {
        let (stdout, stderr) = self.run().await?;
        // Diagnostics on stderr must not shadow rates printed on stdout.
        match parse_rates_output(&stdout) {
            Err(PricingError::InvalidOutput(_)) if !stderr.trim().is_empty() => {
                parse_rates_output(&format!("{}{}", stdout, stderr))
            }
            result => result,
        }
    }

    fn source_label(&self) -> &'static str {
        "oracle"
    }
}

/// Parse oracle output into rates
///
/// The whole output is tried first; failing that, non-empty lines are tried
/// from the last one backwards. Both rates must be strictly positive.
pub fn parse_rates_output(raw: &str) -> Result<UsageRates, PricingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PricingError::InvalidOutput(
            "pricing command produced empty output".to_string(),
        ));
    }

    let parsed = serde_json::from_str::<OracleRates>(raw)
        .ok()
        .or_else(|| {
            raw.lines()
                .rev()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .find_map(|line| serde_json::from_str::<OracleRates>(line).ok())
        })
        .ok_or_else(|| PricingError::InvalidOutput(raw.to_string()))?;

    if parsed.cpu_per_hour <= 0.0 || parsed.mem_per_gb_hour <= 0.0 {
        return Err(PricingError::NonPositiveRate {
            cpu_per_hour: parsed.cpu_per_hour,
            mem_per_gb_hour: parsed.mem_per_gb_hour,
        });
    }

    Ok(UsageRates {
        cpu_per_core_hour: parsed.cpu_per_hour,
        mem_per_gb_hour: parsed.mem_per_gb_hour,
    })
}
