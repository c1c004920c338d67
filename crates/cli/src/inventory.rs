//! Cluster inventory from the Kubernetes API

use anyhow::{bail, Context, Result};
use k8s_openapi::api::core::v1::{Container, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kfin_lib::cost::INSTANCE_TYPE_LABEL;
use kfin_lib::{ContainerRequest, Inventory, NodeRecord};
use kube::api::ListParams;
use kube::{Api, Client, Config};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::KubeTarget;

/// Connect to the cluster selected by `target`
pub async fn connect(target: &KubeTarget) -> Result<Client> {
    let config = match target.read_kubeconfig() {
        Ok(kubeconfig) => Config::from_custom_kubeconfig(kubeconfig, &target.options())
            .await
            .context("Failed to load kubeconfig")?,
        Err(e) if target.kubeconfig.is_none() && target.context.is_none() => {
            debug!(error = %format!("{:#}", e), "No kubeconfig, trying in-cluster config");
            Config::infer()
                .await
                .context("Failed to load kubeconfig or in-cluster configuration")?
        }
        Err(e) => return Err(e),
    };

    Client::try_from(config).context("Failed to create kubernetes client")
}

pub async fn list_nodes(client: &Client) -> Result<Vec<Node>> {
    let api: Api<Node> = Api::all(client.clone());
    let nodes = api
        .list(&ListParams::default())
        .await
        .context("Failed to list nodes")?;
    Ok(nodes.items)
}

pub async fn list_pods(client: &Client) -> Result<Vec<Pod>> {
    let api: Api<Pod> = Api::all(client.clone());
    let pods = api
        .list(&ListParams::default())
        .await
        .context("Failed to list pods")?;
    Ok(pods.items)
}

/// Snapshot nodes and container requests across all namespaces
pub async fn collect(client: &Client) -> Result<Inventory> {
    let pods = list_pods(client).await?;
    let nodes = list_nodes(client).await?;

    let inventory = Inventory {
        nodes: nodes.iter().map(node_record).collect(),
        workloads: pods.iter().flat_map(container_requests).collect(),
    };

    info!(
        pods = pods.len(),
        containers = inventory.workloads.len(),
        nodes = inventory.nodes.len(),
        "Collected cluster inventory"
    );
    Ok(inventory)
}

pub fn node_record(node: &Node) -> NodeRecord {
    let labels: std::collections::HashMap<String, String> = node
        .metadata
        .labels
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let instance_type = labels.get(INSTANCE_TYPE_LABEL).cloned().unwrap_or_default();

    let memory_capacity_bytes = node
        .status
        .as_ref()
        .and_then(|status| status.capacity.as_ref())
        .and_then(|capacity| capacity.get("memory"))
        .and_then(|q| parse_memory_bytes(&q.0).ok())
        .unwrap_or(0);

    NodeRecord {
        name: node.metadata.name.clone().unwrap_or_default(),
        labels,
        provider_id: node
            .spec
            .as_ref()
            .and_then(|spec| spec.provider_id.clone())
            .unwrap_or_default(),
        memory_capacity_bytes,
        instance_type,
    }
}

/// One request per container of the pod, unrequested containers included
pub fn container_requests(pod: &Pod) -> Vec<ContainerRequest> {
    let pod_name = pod.metadata.name.clone().unwrap_or_default();
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();

    pod.spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|container| {
            let requests = container_request_map(container);
            let cpu = requests.and_then(|r| r.get("cpu"));
            let memory = requests.and_then(|r| r.get("memory"));

            ContainerRequest {
                pod_name: pod_name.clone(),
                container_name: container.name.clone(),
                namespace: namespace.clone(),
                cpu_millicores: cpu.and_then(|q| parse_cpu_millicores(&q.0).ok()).unwrap_or(0),
                memory_bytes: memory.and_then(|q| parse_memory_bytes(&q.0).ok()).unwrap_or(0),
                cpu_request: display_quantity(cpu),
                memory_request: display_quantity(memory),
            }
        })
        .collect()
}

fn container_request_map(container: &Container) -> Option<&BTreeMap<String, Quantity>> {
    container
        .resources
        .as_ref()
        .and_then(|resources| resources.requests.as_ref())
}

fn display_quantity(quantity: Option<&Quantity>) -> String {
    quantity
        .map(|q| q.0.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "0".to_string())
}

/// Parse a Kubernetes quantity into its numeric value
///
/// Supports plain and exponent notation plus decimal (`m`, `k`, `M`, ...) and
/// binary (`Ki`, `Mi`, ...) suffixes.
pub fn parse_quantity(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty quantity");
    }

    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(raw.len());
    let (number, suffix) = raw.split_at(split);

    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024.0_f64.powi(2),
        "Gi" => 1024.0_f64.powi(3),
        "Ti" => 1024.0_f64.powi(4),
        "Pi" => 1024.0_f64.powi(5),
        "Ei" => 1024.0_f64.powi(6),
        s if s.starts_with(['e', 'E']) => {
            let exponent: i32 = s[1..]
                .parse()
                .with_context(|| format!("invalid exponent in quantity {:?}", raw))?;
            10f64.powi(exponent)
        }
        other => bail!("unknown suffix {:?} in quantity {:?}", other, raw),
    };

    let value: f64 = number
        .parse()
        .with_context(|| format!("invalid number in quantity {:?}", raw))?;
    Ok(value * multiplier)
}

/// CPU quantity in millicores, rounded up like the API server does
pub fn parse_cpu_millicores(raw: &str) -> Result<i64> {
    Ok((parse_quantity(raw)? * 1000.0).ceil() as i64)
}

/// Memory quantity in bytes, rounded up
pub fn parse_memory_bytes(raw: &str) -> Result<i64> {
    Ok(parse_quantity(raw)?.ceil() as i64)
}
