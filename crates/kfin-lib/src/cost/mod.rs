//! Cost aggregation
//!
//! Turns an inventory snapshot plus resolved rates into a [`ReportData`].
//! Everything here is pure; the report is built once and never mutated.

mod ranking;

pub use ranking::{namespace_summaries, top_n_by_cost, NamespaceSummary};

use chrono::{DateTime, Utc};

use crate::config::PricingConfig;
use crate::models::{ClusterContext, Inventory, NodeCost, NodeRecord, ReportData, WorkloadCost};
use crate::pricing::{PricingResolution, UsageRates};
use crate::stats::StatsFreshness;

/// Hours in an average month
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Label carrying the cloud instance type of a node
pub const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MANAGED_LABEL_PREFIX: &str = "eks.amazonaws.com/";
const MANAGED_PROVIDER_PREFIX: &str = "aws://";

/// Monthly usage-based cost split into CPU and memory
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageCost {
    pub cpu_monthly: f64,
    pub mem_monthly: f64,
}

impl UsageCost {
    pub fn total(&self) -> f64 {
        self.cpu_monthly + self.mem_monthly
    }
}

/// Monthly cost of running `cores` CPU cores and `mem_bytes` of memory
pub fn usage_based_monthly(cores: f64, mem_bytes: f64, rates: UsageRates) -> UsageCost {
    UsageCost {
        cpu_monthly: cores * HOURS_PER_MONTH * rates.cpu_per_core_hour,
        mem_monthly: mem_bytes / BYTES_PER_GIB * HOURS_PER_MONTH * rates.mem_per_gb_hour,
    }
}

/// Monthly cost of a container's requests
pub fn workload_monthly_cost(cpu_millicores: i64, memory_bytes: i64, rates: UsageRates) -> f64 {
    usage_based_monthly(cpu_millicores as f64 / 1000.0, memory_bytes as f64, rates).total()
}

/// Electricity cost of one node per month
pub fn node_electricity_monthly(config: &PricingConfig) -> f64 {
    config.watts_per_node / 1000.0 * HOURS_PER_MONTH * config.electricity_rate
}

/// Hardware and electricity cost of one node
pub fn node_cost(node: &NodeRecord, config: &PricingConfig) -> NodeCost {
    let memory_gb = node.memory_capacity_bytes as f64 / BYTES_PER_GIB;

    let flat_price = if node.instance_type.is_empty() {
        None
    } else {
        config
            .instance_monthly_by_type
            .get(&node.instance_type)
            .copied()
            .filter(|price| *price > 0.0)
    };

    let (hardware_monthly, used_instance_override) = match flat_price {
        Some(price) => (price, true),
        None => (memory_gb * config.hardware_monthly_per_gb, false),
    };
    let electricity_monthly = node_electricity_monthly(config);

    NodeCost {
        name: node.name.clone(),
        instance_type: node.instance_type.clone(),
        memory_gb,
        hardware_monthly,
        electricity_monthly,
        total: hardware_monthly + electricity_monthly,
        used_instance_override,
    }
}

/// Best-effort detection of a managed (EKS) control plane
pub fn is_managed_control_plane(nodes: &[NodeRecord]) -> bool {
    nodes.iter().any(|node| {
        node.labels
            .keys()
            .any(|key| key.starts_with(MANAGED_LABEL_PREFIX))
            || node.provider_id.starts_with(MANAGED_PROVIDER_PREFIX)
    })
}

/// Build the immutable report consumed by every renderer
pub fn build_report(
    inventory: &Inventory,
    pricing: &PricingResolution,
    config: &PricingConfig,
    stats_freshness: StatsFreshness,
    context: ClusterContext,
    generated_at: DateTime<Utc>,
) -> ReportData {
    let workload_costs: Vec<WorkloadCost> = inventory
        .workloads
        .iter()
        .map(|w| WorkloadCost {
            name: w.container_name.clone(),
            namespace: w.namespace.clone(),
            cpu_request: w.cpu_request.clone(),
            mem_request: w.memory_request.clone(),
            monthly_cost: workload_monthly_cost(w.cpu_millicores, w.memory_bytes, pricing.rates),
        })
        .collect();

    let node_costs: Vec<NodeCost> = inventory
        .nodes
        .iter()
        .map(|n| node_cost(n, config))
        .collect();

    let hardware_total: f64 = node_costs.iter().map(|n| n.hardware_monthly).sum();
    let electricity_total: f64 = node_costs.iter().map(|n| n.electricity_monthly).sum();
    let control_plane_total = if is_managed_control_plane(&inventory.nodes) {
        HOURS_PER_MONTH * config.control_plane.control_plane_per_hour
    } else {
        0.0
    };
    let workload_total = workload_costs.iter().map(|w| w.monthly_cost).sum();

    ReportData {
        workload_costs,
        node_costs,
        hardware_total,
        electricity_total,
        control_plane_total,
        grand_total: hardware_total + electricity_total + control_plane_total,
        workload_total,
        pricing_source_label: pricing.source_label.clone(),
        usage_rates: pricing.rates,
        stats_freshness,
        context_name: context.context_name,
        cluster_name: context.cluster_name,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlPlanePricing;
    use crate::models::ContainerRequest;
    use std::collections::HashMap;

    const GIB: i64 = 1024 * 1024 * 1024;

    fn rates() -> PricingResolution {
        PricingResolution::new(
            UsageRates {
                cpu_per_core_hour: 0.025,
                mem_per_gb_hour: 0.006,
            },
            "config",
        )
    }

    fn node(name: &str, memory_gib: i64, instance_type: &str) -> NodeRecord {
        NodeRecord {
            name: name.to_string(),
            memory_capacity_bytes: memory_gib * GIB,
            instance_type: instance_type.to_string(),
            ..NodeRecord::default()
        }
    }

    fn workload(name: &str, namespace: &str, cpu_m: i64, mem_bytes: i64) -> ContainerRequest {
        ContainerRequest {
            pod_name: format!("{}-pod", name),
            container_name: name.to_string(),
            namespace: namespace.to_string(),
            cpu_millicores: cpu_m,
            memory_bytes: mem_bytes,
            cpu_request: format!("{}m", cpu_m),
            memory_request: format!("{}", mem_bytes),
        }
    }

    fn sample_inventory() -> Inventory {
        Inventory {
            nodes: vec![
                node("node-a", 16, "m5.large"),
                node("node-b", 32, ""),
                node("node-c", 8, "t3.small"),
            ],
            workloads: vec![
                workload("api", "prod", 500, GIB),
                workload("worker", "prod", 2000, 4 * GIB),
                workload("sidecar", "kube-system", 0, 0),
                workload("cache", "data", 250, 512 * 1024 * 1024),
            ],
        }
    }

    fn build(inventory: &Inventory, config: &PricingConfig) -> ReportData {
        build_report(
            inventory,
            &rates(),
            config,
            StatsFreshness::default(),
            ClusterContext::default(),
            Utc::now(),
        )
    }

    #[test]
    fn test_workload_cost_formula() {
        let cost = workload_monthly_cost(1000, GIB, rates().rates);
        assert!((cost - (730.0 * 0.025 + 730.0 * 0.006)).abs() < 1e-9);
        assert_eq!(workload_monthly_cost(0, 0, rates().rates), 0.0);
    }

    #[test]
    fn test_usage_based_monthly_split() {
        let cost = usage_based_monthly(2.0, 4.0 * GIB as f64, rates().rates);
        assert!((cost.cpu_monthly - 36.5).abs() < 1e-9);
        assert!((cost.mem_monthly - 17.52).abs() < 1e-9);
        assert!((cost.total() - 54.02).abs() < 1e-9);
    }

    #[test]
    fn test_node_cost_uses_memory_by_default() {
        let config = PricingConfig::default();
        let cost = node_cost(&node("n", 16, ""), &config);

        assert!(!cost.used_instance_override);
        assert!((cost.memory_gb - 16.0).abs() < 1e-9);
        assert!((cost.hardware_monthly - 16.0 * 0.26).abs() < 1e-9);
        assert!((cost.electricity_monthly - 15.0 / 1000.0 * 730.0 * 0.12).abs() < 1e-9);
        assert!((cost.total - (cost.hardware_monthly + cost.electricity_monthly)).abs() < 1e-12);
    }

    #[test]
    fn test_instance_override_used_verbatim() {
        let config = PricingConfig {
            instance_monthly_by_type: HashMap::from([("m5.large".to_string(), 120.0)]),
            ..PricingConfig::default()
        };
        let cost = node_cost(&node("n", 16, "m5.large"), &config);

        assert!(cost.used_instance_override);
        assert_eq!(cost.hardware_monthly, 120.0);
        assert_eq!(cost.instance_type, "m5.large");
    }

    #[test]
    fn test_non_positive_override_ignored() {
        let config = PricingConfig {
            instance_monthly_by_type: HashMap::from([("m5.large".to_string(), 0.0)]),
            ..PricingConfig::default()
        };
        let cost = node_cost(&node("n", 4, "m5.large"), &config);

        assert!(!cost.used_instance_override);
        assert!((cost.hardware_monthly - 4.0 * 0.26).abs() < 1e-9);
    }

    #[test]
    fn test_managed_control_plane_detection() {
        let mut labelled = node("a", 1, "");
        labelled
            .labels
            .insert("eks.amazonaws.com/nodegroup".to_string(), "ng-1".to_string());
        assert!(is_managed_control_plane(&[node("x", 1, ""), labelled]));

        let mut aws = node("b", 1, "");
        aws.provider_id = "aws:///us-east-1a/i-0abc".to_string();
        assert!(is_managed_control_plane(&[aws]));

        let mut gce = node("c", 1, "");
        gce.provider_id = "gce://project/zone/vm".to_string();
        assert!(!is_managed_control_plane(&[gce]));
        assert!(!is_managed_control_plane(&[]));
    }

    #[test]
    fn test_report_totals_foot() {
        let config = PricingConfig {
            instance_monthly_by_type: HashMap::from([("m5.large".to_string(), 120.0)]),
            ..PricingConfig::default()
        };
        let report = build(&sample_inventory(), &config);

        let node_sum: f64 = report.node_costs.iter().map(|n| n.total).sum();
        assert!((node_sum - (report.hardware_total + report.electricity_total)).abs() < 1e-9);

        let workload_sum: f64 = report.workload_costs.iter().map(|w| w.monthly_cost).sum();
        assert!((workload_sum - report.workload_total).abs() < 1e-9);

        assert_eq!(
            report.grand_total,
            report.hardware_total + report.electricity_total + report.control_plane_total
        );
        assert_eq!(report.control_plane_total, 0.0);
        assert_eq!(report.node_costs[0].hardware_monthly, 120.0);
    }

    #[test]
    fn test_zero_request_workload_kept_in_report() {
        let report = build(&sample_inventory(), &PricingConfig::default());

        assert_eq!(report.workload_costs.len(), 4);
        let sidecar = report
            .workload_costs
            .iter()
            .find(|w| w.name == "sidecar")
            .unwrap();
        assert_eq!(sidecar.monthly_cost, 0.0);

        let ranked = top_n_by_cost(&report.workload_costs, |w| w.monthly_cost, 8);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|w| w.name != "sidecar"));
    }

    #[test]
    fn test_control_plane_surcharge_applied_once() {
        let mut inventory = sample_inventory();
        for n in &mut inventory.nodes {
            n.provider_id = format!("aws:///us-east-1a/{}", n.name);
        }
        let config = PricingConfig {
            control_plane: ControlPlanePricing {
                control_plane_per_hour: 0.10,
            },
            ..PricingConfig::default()
        };
        let report = build(&inventory, &config);

        assert!((report.control_plane_total - 73.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_carries_metadata() {
        let context = ClusterContext {
            context_name: "prod".to_string(),
            cluster_name: "prod-east".to_string(),
        };
        let generated_at = Utc::now();
        let report = build_report(
            &Inventory::default(),
            &rates(),
            &PricingConfig::default(),
            StatsFreshness::default(),
            context,
            generated_at,
        );

        assert_eq!(report.context_name, "prod");
        assert_eq!(report.cluster_name, "prod-east");
        assert_eq!(report.pricing_source_label, "config");
        assert_eq!(report.usage_rates, rates().rates);
        assert_eq!(report.generated_at, generated_at);
        assert_eq!(report.grand_total, 0.0);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = build(&sample_inventory(), &PricingConfig::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["workload_costs"].as_array().unwrap().len(), 4);
        assert_eq!(json["pricing_source_label"], "config");
        assert!(json["stats_freshness"]["ready"].is_boolean());
    }
}
