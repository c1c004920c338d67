//! Core data models for cost reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::pricing::UsageRates;
use crate::stats::StatsFreshness;

/// Node snapshot taken from the cluster inventory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub provider_id: String,
    pub memory_capacity_bytes: i64,
    pub instance_type: String,
}

/// Resource requests declared by a single container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerRequest {
    pub pod_name: String,
    pub container_name: String,
    pub namespace: String,
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
    /// Request as written in the pod spec, e.g. "250m"
    pub cpu_request: String,
    /// Request as written in the pod spec, e.g. "512Mi"
    pub memory_request: String,
}

/// Point-in-time cluster inventory consumed by one aggregation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub nodes: Vec<NodeRecord>,
    pub workloads: Vec<ContainerRequest>,
}

/// Monthly cost attributed to one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCost {
    pub name: String,
    pub instance_type: String,
    pub memory_gb: f64,
    pub hardware_monthly: f64,
    pub electricity_monthly: f64,
    pub total: f64,
    pub used_instance_override: bool,
}

/// Monthly cost attributed to one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadCost {
    pub name: String,
    pub namespace: String,
    pub cpu_request: String,
    pub mem_request: String,
    pub monthly_cost: f64,
}

/// Kubeconfig context the report was taken from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterContext {
    pub context_name: String,
    pub cluster_name: String,
}

impl Default for ClusterContext {
    fn default() -> Self {
        Self {
            context_name: "unknown".to_string(),
            cluster_name: "unknown".to_string(),
        }
    }
}

/// Aggregated cost report shared by every renderer
///
/// Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub workload_costs: Vec<WorkloadCost>,
    pub node_costs: Vec<NodeCost>,
    pub hardware_total: f64,
    pub electricity_total: f64,
    pub control_plane_total: f64,
    pub grand_total: f64,
    pub workload_total: f64,
    pub pricing_source_label: String,
    pub usage_rates: UsageRates,
    pub stats_freshness: StatsFreshness,
    pub context_name: String,
    pub cluster_name: String,
    pub generated_at: DateTime<Utc>,
}
