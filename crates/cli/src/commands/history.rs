//! Usage-based cost estimate from historical stats

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use kfin_lib::config::OracleConfig;
use kfin_lib::cost::usage_based_monthly;
use kfin_lib::pricing::{build_provider, PricingProvider, PricingSourceKind};
use kfin_lib::stats::{
    average_series_value, series_point_stats, MatrixSeries, StatsClient, DEFAULT_CPU_QUERY,
    DEFAULT_MEMORY_QUERY,
};
use kfin_lib::{Settings, StructuredLogger, UsageRates};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::output::{format_currency, print_json, OutputFormat};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Flags of the history command
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub hours: Option<u64>,
    pub step: String,
    pub debug: bool,
    pub pricing_source: String,
    pub pricing_command: Option<String>,
    pub pricing_args: Vec<String>,
}

/// JSON shape of the history output
#[derive(Debug, Serialize)]
struct HistorySummary {
    endpoint: String,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    hours: u64,
    step_seconds: u64,
    avg_cpu_cores: f64,
    cpu_samples: usize,
    avg_memory_gb: f64,
    memory_samples: usize,
    pricing_source: String,
    rates: UsageRates,
    cpu_monthly: f64,
    memory_monthly: f64,
    total_monthly: f64,
}

/// Run the history command
pub async fn run(settings: &Settings, options: HistoryOptions, format: OutputFormat) -> Result<()> {
    let base_url = settings.stats.base_url.trim();
    if base_url.is_empty() {
        bail!("stats.base_url is empty; set it in config.yaml or KFIN_STATS__BASE_URL");
    }

    let hours = options.hours.unwrap_or(settings.stats.default_lookback_hours);
    if hours == 0 {
        bail!("--hours must be greater than zero");
    }
    let step = parse_step(&options.step)?;

    let logger = StructuredLogger::new(base_url);
    logger.log_startup(env!("CARGO_PKG_VERSION"), "history");

    let kind: PricingSourceKind = options.pricing_source.parse()?;
    let (command, args) = oracle_invocation(
        &settings.pricing.oracle,
        options.pricing_command,
        options.pricing_args,
    );
    let provider = build_provider(
        kind,
        &settings.pricing,
        &command,
        &args,
        settings.pricing.oracle.timeout(),
    )?;
    let rates = provider
        .resolve()
        .await
        .with_context(|| format!("Failed to resolve {} pricing", provider.source_label()))?;

    let client = StatsClient::new(base_url, settings.stats.query_timeout())?;
    let end = Utc::now();
    let start = lookback_start(end, hours)?;

    let cpu_series = query(&client, &logger, "CPU", DEFAULT_CPU_QUERY, start, end, step).await?;
    let memory_series =
        query(&client, &logger, "memory", DEFAULT_MEMORY_QUERY, start, end, step).await?;

    let (avg_cpu, cpu_samples) =
        average_series_value(&cpu_series).context("No CPU usage data in the window")?;
    let (avg_memory_bytes, memory_samples) =
        average_series_value(&memory_series).context("No memory usage data in the window")?;

    let cost = usage_based_monthly(avg_cpu, avg_memory_bytes, rates);
    let summary = HistorySummary {
        endpoint: client.base_url().to_string(),
        window_start: start,
        window_end: end,
        hours,
        step_seconds: step.as_secs(),
        avg_cpu_cores: avg_cpu,
        cpu_samples,
        avg_memory_gb: avg_memory_bytes / BYTES_PER_GB,
        memory_samples,
        pricing_source: provider.source_label().to_string(),
        rates,
        cpu_monthly: cost.cpu_monthly,
        memory_monthly: cost.mem_monthly,
        total_monthly: cost.total(),
    };

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => {
            print_summary(&summary, &options.step);
            if options.debug {
                print_debug(&client, &summary, &cpu_series, &memory_series, step)?;
            }
            print_estimate(&summary);
        }
    }

    logger.log_shutdown("history complete");
    Ok(())
}

/// Parse a step such as `30s`, `5m` or `1h`
pub fn parse_step(raw: &str) -> Result<Duration> {
    let step = humantime::parse_duration(raw.trim())
        .with_context(|| format!("Invalid --step {:?} (expected e.g. 1m, 5m, 15m)", raw))?;
    if step.as_secs() == 0 {
        bail!("--step must be at least one second");
    }
    Ok(step)
}

/// Command and arguments for the oracle; flags override the configured values
fn oracle_invocation(
    config: &OracleConfig,
    command: Option<String>,
    args: Vec<String>,
) -> (String, Vec<String>) {
    let command = command
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| config.command.clone());
    let args = if args.is_empty() {
        config.args.clone()
    } else {
        args
    };
    (command, args)
}

async fn query(
    client: &StatsClient,
    logger: &StructuredLogger,
    what: &str,
    promql: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<Vec<MatrixSeries>> {
    let started = Instant::now();
    match client.query_range(promql, start, end, step).await {
        Ok(series) => {
            logger.log_stats_query(client.base_url(), series.len(), started.elapsed());
            Ok(series)
        }
        Err(e) => {
            logger.log_stats_query_failed(client.base_url(), &e);
            Err(e).with_context(|| format!("{} usage query failed", what))
        }
    }
}

fn print_summary(summary: &HistorySummary, step: &str) {
    println!("{}", "Historical Usage Summary".bold());
    println!("{}", "=".repeat(50));
    println!("Endpoint: {}", summary.endpoint.cyan());
    println!(
        "Window:   {} -> {} ({}h)",
        summary.window_start.to_rfc3339(),
        summary.window_end.to_rfc3339(),
        summary.hours
    );
    println!("Step:     {}", step.trim());
    println!();
    println!(
        "Avg CPU usage: {:.3} cores ({} samples)",
        summary.avg_cpu_cores, summary.cpu_samples
    );
    println!(
        "Avg Memory usage: {:.3} GB ({} samples)",
        summary.avg_memory_gb, summary.memory_samples
    );
}

fn print_debug(
    client: &StatsClient,
    summary: &HistorySummary,
    cpu_series: &[MatrixSeries],
    memory_series: &[MatrixSeries],
    step: Duration,
) -> Result<()> {
    let cpu_url =
        client.query_range_url(DEFAULT_CPU_QUERY, summary.window_start, summary.window_end, step)?;
    let memory_url = client.query_range_url(
        DEFAULT_MEMORY_QUERY,
        summary.window_start,
        summary.window_end,
        step,
    )?;

    println!();
    println!("{}", "Debug".bold());
    println!("CPU query URL:    {}", cpu_url);
    println!("Memory query URL: {}", memory_url);
    for (label, series) in [("CPU", cpu_series), ("Memory", memory_series)] {
        let stats = series_point_stats(series);
        println!(
            "{} series: {} (points total={}, min={}, max={})",
            label, stats.series, stats.total_points, stats.min_points, stats.max_points
        );
    }
    println!(
        "Pricing source: {} (cpu_per_hour={:.6}, mem_per_gb_hour={:.6})",
        summary.pricing_source, summary.rates.cpu_per_core_hour, summary.rates.mem_per_gb_hour
    );
    Ok(())
}

fn print_estimate(summary: &HistorySummary) {
    println!();
    println!("{}", "Estimated monthly usage-based cost (cloud pricing)".bold());
    println!("CPU:    {}", format_currency(summary.cpu_monthly));
    println!("Memory: {}", format_currency(summary.memory_monthly));
    println!(
        "{} {}",
        "Total: ".bold(),
        format_currency(summary.total_monthly).green().bold()
    );
}

/// Start of a window of `hours` ending at `end`
fn lookback_start(end: DateTime<Utc>, hours: u64) -> Result<DateTime<Utc>> {
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .and_then(|window| end.checked_sub_signed(window))
        .with_context(|| format!("--hours {} is out of range", hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step() {
        assert_eq!(parse_step("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_step(" 30s ").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_step("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_step("0s").is_err());
        assert!(parse_step("soon").is_err());
        assert!(parse_step("").is_err());
    }

    #[test]
    fn test_lookback_start() {
        let end = Utc::now();
        assert_eq!(
            lookback_start(end, 24).unwrap(),
            end - chrono::Duration::try_hours(24).unwrap()
        );
        assert!(lookback_start(end, u64::MAX).is_err());
        assert!(lookback_start(end, i64::MAX as u64).is_err());
        assert!(lookback_start(end, 10_000_000_000).is_err());
    }

    #[test]
    fn test_oracle_invocation_defaults_to_config() {
        let config = OracleConfig {
            command: "pricing-oracle".to_string(),
            args: vec!["--region".to_string(), "us-east-1".to_string()],
            timeout_seconds: 10,
        };

        let (command, args) = oracle_invocation(&config, None, Vec::new());
        assert_eq!(command, "pricing-oracle");
        assert_eq!(args, vec!["--region", "us-east-1"]);

        let (command, args) = oracle_invocation(
            &config,
            Some("other-oracle".to_string()),
            vec!["--spot".to_string()],
        );
        assert_eq!(command, "other-oracle");
        assert_eq!(args, vec!["--spot"]);
    }

    #[tokio::test]
    async fn test_empty_base_url_is_rejected() {
        let settings = Settings::default();
        let options = HistoryOptions {
            hours: Some(1),
            step: "5m".to_string(),
            debug: false,
            pricing_source: "config".to_string(),
            pricing_command: None,
            pricing_args: Vec::new(),
        };

        let err = run(&settings, options, OutputFormat::Table)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stats.base_url is empty"));
    }
}
