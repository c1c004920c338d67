//! Ranked and grouped views over workload costs

use std::collections::BTreeMap;

use crate::models::WorkloadCost;

/// Cost of one namespace
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceSummary {
    pub name: String,
    pub workload_count: usize,
    pub monthly_cost: f64,
}

/// Highest-cost items first, dropping anything that costs nothing
///
/// The sort is stable, so ties keep their input order.
pub fn top_n_by_cost<T, F>(items: &[T], cost: F, n: usize) -> Vec<&T>
where
    F: Fn(&T) -> f64,
{
    let mut ranked: Vec<&T> = items.iter().filter(|item| cost(*item) > 0.0).collect();
    ranked.sort_by(|a, b| cost(*b).total_cmp(&cost(*a)));
    ranked.truncate(n);
    ranked
}

/// Per-namespace totals in alphabetical order
pub fn namespace_summaries(workloads: &[WorkloadCost]) -> Vec<NamespaceSummary> {
    let mut grouped: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for workload in workloads {
        let entry = grouped.entry(workload.namespace.as_str()).or_default();
        entry.0 += 1;
        entry.1 += workload.monthly_cost;
    }

    grouped
        .into_iter()
        .map(|(name, (workload_count, monthly_cost))| NamespaceSummary {
            name: name.to_string(),
            workload_count,
            monthly_cost,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(name: &str, namespace: &str, monthly_cost: f64) -> WorkloadCost {
        WorkloadCost {
            name: name.to_string(),
            namespace: namespace.to_string(),
            cpu_request: "0".to_string(),
            mem_request: "0".to_string(),
            monthly_cost,
        }
    }

    #[test]
    fn test_top_n_orders_descending() {
        let items = vec![cost("a", "x", 5.0), cost("b", "x", 50.0), cost("c", "x", 20.0)];
        let names: Vec<&str> = top_n_by_cost(&items, |w| w.monthly_cost, 8)
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_top_n_drops_zero_and_truncates() {
        let items: Vec<WorkloadCost> = (0..12)
            .map(|i| cost(&format!("w{}", i), "x", i as f64))
            .collect();
        let ranked = top_n_by_cost(&items, |w| w.monthly_cost, 8);

        assert_eq!(ranked.len(), 8);
        assert_eq!(ranked[0].name, "w11");
        assert!(ranked.iter().all(|w| w.monthly_cost > 0.0));
    }

    #[test]
    fn test_top_n_ties_keep_input_order() {
        let items = vec![cost("first", "x", 10.0), cost("second", "x", 10.0), cost("third", "x", 10.0)];
        let names: Vec<&str> = top_n_by_cost(&items, |w| w.monthly_cost, 8)
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_namespace_summaries_grouped_alphabetically() {
        let items = vec![
            cost("api", "prod", 30.0),
            cost("dns", "kube-system", 0.0),
            cost("worker", "prod", 12.5),
            cost("etl", "data", 7.0),
        ];
        let summaries = namespace_summaries(&items);

        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["data", "kube-system", "prod"]);
        assert_eq!(summaries[2].workload_count, 2);
        assert!((summaries[2].monthly_cost - 42.5).abs() < 1e-9);
        assert_eq!(summaries[1].monthly_cost, 0.0);
    }
}
