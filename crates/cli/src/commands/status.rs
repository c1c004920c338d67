//! Cluster status command

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::config::KubeTarget;
use crate::inventory;
use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};

#[derive(Debug, Serialize)]
struct ClusterStatus {
    context: String,
    cluster: String,
    nodes: usize,
    pods: usize,
}

/// Show node and pod counts
pub async fn run(kube: &KubeTarget, format: OutputFormat) -> Result<()> {
    let context = kube.cluster_context();
    let client = inventory::connect(kube).await?;
    let nodes = inventory::list_nodes(&client).await?;
    let pods = inventory::list_pods(&client).await?;

    let status = ClusterStatus {
        context: context.context_name,
        cluster: context.cluster_name,
        nodes: nodes.len(),
        pods: pods.len(),
    };

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            println!("{}", "Cluster Status".bold());
            println!("{}", "=".repeat(50));
            println!("Context:    {}", status.context.cyan());
            println!("Cluster:    {}", status.cluster.cyan());
            println!("Nodes:      {}", status.nodes);
            println!("Total Pods: {}", status.pods);
            println!();

            if status.nodes == 0 {
                print_warning("No nodes visible with the current credentials");
            } else {
                print_success("Ready for cost analysis.");
            }
            print_info("Run 'kfin analyze' to get started.");
        }
    }

    Ok(())
}
