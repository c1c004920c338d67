//! Interactive dashboard command

use anyhow::Result;
use chrono::Utc;
use kfin_lib::stats::probe_freshness;
use kfin_lib::{build_report, resolve_pricing, Settings, StructuredLogger};

use crate::config::KubeTarget;
use crate::inventory;
use crate::tui;

/// Gather everything up front, then hand the finished report to the terminal UI
pub async fn run(settings: &Settings, kube: &KubeTarget) -> Result<()> {
    let context = kube.cluster_context();
    let logger = StructuredLogger::new(&context.cluster_name);
    logger.log_startup(env!("CARGO_PKG_VERSION"), "tui");

    let client = inventory::connect(kube).await?;
    let inventory = inventory::collect(&client).await?;
    let pricing = resolve_pricing(&settings.pricing, &logger).await;

    let now = Utc::now();
    let freshness = probe_freshness(&settings.stats, now, &logger).await;
    let report = build_report(
        &inventory,
        &pricing,
        &settings.pricing,
        freshness,
        context,
        now,
    );
    logger.log_report_built(&report);

    tui::run(report).await?;

    logger.log_shutdown("dashboard closed");
    Ok(())
}
