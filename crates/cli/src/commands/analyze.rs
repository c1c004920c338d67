//! Static cost analysis of the current cluster

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use kfin_lib::{
    build_report, resolve_pricing, Inventory, ReportData, Settings, StatsFreshness,
    StructuredLogger,
};
use tabled::{settings::Style, Table, Tabled};

use crate::config::KubeTarget;
use crate::inventory;
use crate::output::{
    clip, format_bytes, format_cpu, format_currency, print_heading, print_json, OutputFormat,
};

const NAME_WIDTH: usize = 40;

/// Row for the workload cost table
#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "POD")]
    pod: String,
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(rename = "CPU REQ")]
    cpu: String,
    #[tabled(rename = "MEM REQ")]
    memory: String,
    #[tabled(rename = "MONTHLY $")]
    monthly: String,
}

/// Run the analyze command
pub async fn run(settings: &Settings, kube: &KubeTarget, format: OutputFormat) -> Result<()> {
    let context = kube.cluster_context();
    let logger = StructuredLogger::new(&context.cluster_name);
    logger.log_startup(env!("CARGO_PKG_VERSION"), "analyze");

    let client = inventory::connect(kube).await?;
    let inventory = inventory::collect(&client).await?;
    let pricing = resolve_pricing(&settings.pricing, &logger).await;

    let freshness = StatsFreshness::unavailable(
        settings.stats.base_url.trim(),
        settings.stats.lookback(),
        "Not probed by analyze",
    );
    let report = build_report(
        &inventory,
        &pricing,
        &settings.pricing,
        freshness,
        context,
        Utc::now(),
    );
    logger.log_report_built(&report);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&inventory, &report),
    }

    logger.log_shutdown("analyze complete");
    Ok(())
}

fn print_report(inventory: &Inventory, report: &ReportData) {
    print_heading("Monthly Cost Summary");
    println!(
        "Hardware (amortized):   {}",
        format_currency(report.hardware_total)
    );
    println!(
        "Electricity:            {}",
        format_currency(report.electricity_total)
    );
    println!(
        "EKS control plane:      {}",
        format_currency(report.control_plane_total)
    );
    println!(
        "{}                  {}",
        "Total:".bold(),
        format_currency(report.grand_total).green().bold()
    );
    println!(
        "Pod pricing source: {} (cpu_per_hour={:.6}, mem_per_gb_hour={:.6})",
        report.pricing_source_label.cyan(),
        report.usage_rates.cpu_per_core_hour,
        report.usage_rates.mem_per_gb_hour
    );
    println!();

    print_workload_table(inventory, report);
    println!();

    print_heading("Node Hardware Costs (monthly)");
    if report.node_costs.is_empty() {
        println!("{}", "No nodes found".yellow());
    }
    for node in &report.node_costs {
        let name = if node.used_instance_override {
            format!("{} ({})", node.name, node.instance_type)
        } else {
            node.name.clone()
        };
        println!(
            "{}: {} (hardware) + {} (electricity) = {}/month",
            name,
            format_currency(node.hardware_monthly),
            format_currency(node.electricity_monthly),
            format_currency(node.total).bold()
        );
    }
}

/// Workload table with zero-cost rows hidden and a TOTAL row
///
/// Workload costs are built in inventory order, so the two can be zipped to
/// recover the numeric requests for the totals.
fn print_workload_table(inventory: &Inventory, report: &ReportData) {
    let mut rows = Vec::new();
    let mut cpu_total = 0_i64;
    let mut memory_total = 0_i64;
    let mut cost_total = 0.0;

    for (request, cost) in inventory.workloads.iter().zip(&report.workload_costs) {
        if cost.monthly_cost <= 0.0 {
            continue;
        }
        cpu_total += request.cpu_millicores;
        memory_total += request.memory_bytes;
        cost_total += cost.monthly_cost;

        rows.push(WorkloadRow {
            pod: clip(&cost.name, NAME_WIDTH),
            namespace: clip(&cost.namespace, NAME_WIDTH),
            cpu: cost.cpu_request.clone(),
            memory: cost.mem_request.clone(),
            monthly: format_currency(cost.monthly_cost),
        });
    }

    if rows.is_empty() {
        println!("{}", "No workloads with resource requests found".yellow());
        return;
    }

    rows.push(WorkloadRow {
        pod: "TOTAL".to_string(),
        namespace: String::new(),
        cpu: format_cpu(cpu_total),
        memory: format_bytes(memory_total),
        monthly: format_currency(cost_total),
    });

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}
