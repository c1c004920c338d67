//! Read-only projections of a report used by the dashboard

use crate::cost::{namespace_summaries, top_n_by_cost, NamespaceSummary};
use crate::models::{ReportData, WorkloadCost};

use super::detail::{workload_detail, WorkloadDetail};
use super::TableId;

/// Rows shown in each ranked table
pub const TOP_N: usize = 8;

/// Everything the state machine and renderer derive from a report
///
/// Built once per report; the report itself is never modified.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub report: &'a ReportData,
    pub top_workloads: Vec<&'a WorkloadCost>,
    pub top_namespaces: Vec<NamespaceSummary>,
    /// Every namespace, alphabetical; indexes the namespace sub-pages
    pub namespaces: Vec<NamespaceSummary>,
    details: Vec<WorkloadDetail>,
}

impl<'a> DashboardView<'a> {
    pub fn new(report: &'a ReportData) -> Self {
        let top_workloads = top_n_by_cost(&report.workload_costs, |w| w.monthly_cost, TOP_N);
        let namespaces = namespace_summaries(&report.workload_costs);
        let top_namespaces = top_n_by_cost(&namespaces, |ns| ns.monthly_cost, TOP_N)
            .into_iter()
            .cloned()
            .collect();
        let details = top_workloads
            .iter()
            .map(|w| workload_detail(w, &report.stats_freshness, report.generated_at))
            .collect();

        Self {
            report,
            top_workloads,
            top_namespaces,
            namespaces,
            details,
        }
    }

    /// Number of selectable rows in a table
    pub fn row_count(&self, table: TableId) -> usize {
        match table {
            TableId::TopWorkloads => self.top_workloads.len(),
            TableId::TopNamespaces => self.top_namespaces.len(),
        }
    }

    /// Overlay content for a row of the top-workloads table
    pub fn workload_detail(&self, row: usize) -> Option<&WorkloadDetail> {
        self.details.get(row)
    }

    /// Position of a namespace in [`Self::namespaces`]
    pub fn namespace_index(&self, name: &str) -> Option<usize> {
        self.namespaces.iter().position(|ns| ns.name == name)
    }

    /// Non-zero workloads of a namespace, most expensive first
    pub fn namespace_workloads(&self, index: usize) -> Vec<&'a WorkloadCost> {
        let Some(namespace) = self.namespaces.get(index) else {
            return Vec::new();
        };
        let report: &'a ReportData = self.report;
        let mut ranked: Vec<&'a WorkloadCost> = report
            .workload_costs
            .iter()
            .filter(|w| w.namespace == namespace.name && w.monthly_cost > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.monthly_cost.total_cmp(&a.monthly_cost));
        ranked
    }
}
