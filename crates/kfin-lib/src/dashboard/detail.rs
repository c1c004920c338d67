//! Text building blocks shared by the dashboard renderer
//!
//! Everything returns plain strings tagged with a [`Tone`]; the terminal
//! layer decides how a tone is colored.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::{ReportData, WorkloadCost};
use crate::stats::{format_short_duration, Confidence, StatsFreshness};

const COST_BAR_WIDTH: usize = 18;

/// Semantic color of a piece of dashboard text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Value,
    Heading,
    Muted,
    Good,
    Caution,
    Bad,
}

/// One line of a text block
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub text: String,
    pub tone: Tone,
}

impl DetailLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }

    pub fn blank() -> Self {
        Self::plain("")
    }
}

/// Content of the workload detail overlay, built when it is opened
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadDetail {
    pub title: String,
    pub lines: Vec<DetailLine>,
}

/// Cluster size bucket by monthly spend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostTier {
    Small,
    Medium,
    Large,
}

impl CostTier {
    pub fn for_total(monthly: f64) -> Self {
        if monthly >= 3000.0 {
            Self::Large
        } else if monthly >= 1000.0 {
            Self::Medium
        } else {
            Self::Small
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Small => "SMALL",
            Self::Medium => "MEDIUM",
            Self::Large => "LARGE",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Small => Tone::Good,
            Self::Medium => Tone::Caution,
            Self::Large => Tone::Bad,
        }
    }
}

/// One-letter cost marker shown in ranked tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBadge {
    Cheap,
    Moderate,
    High,
}

impl CostBadge {
    pub fn for_cost(monthly: f64) -> Self {
        if monthly >= 50.0 {
            Self::High
        } else if monthly >= 10.0 {
            Self::Moderate
        } else {
            Self::Cheap
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Self::Cheap => 'C',
            Self::Moderate => 'M',
            Self::High => 'H',
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Cheap => Tone::Good,
            Self::Moderate => Tone::Caution,
            Self::High => Tone::Bad,
        }
    }
}

impl Confidence {
    pub fn tone(&self) -> Tone {
        match self {
            Confidence::VeryLow => Tone::Bad,
            Confidence::Low | Confidence::Moderate => Tone::Caution,
            Confidence::High => Tone::Good,
        }
    }
}

/// Fixed-width bar such as `||||||............`
pub fn cost_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * COST_BAR_WIDTH as f64) as i64;
    let filled = filled.clamp(0, COST_BAR_WIDTH as i64) as usize;

    let mut bar = "|".repeat(filled);
    bar.push_str(&".".repeat(COST_BAR_WIDTH - filled));
    bar
}

/// Share of `part` in `total` as a percentage; zero when the total is zero
pub fn share_percent(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Cut `s` to `max` characters, marking the cut with `...` when there is room
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// `$12.34`
pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Top status line of the dashboard
pub fn header_line(report: &ReportData) -> String {
    format!(
        "kFin | Context: {} | Cluster: {} | Nodes:{} | Monthly:{} | Rates:{}",
        truncate(&report.context_name, 28),
        truncate(&report.cluster_name, 28),
        report.node_costs.len(),
        format_money(report.grand_total),
        truncate(&report.pricing_source_label, 12),
    )
}

/// "Cluster Snapshot" block of the overview page
pub fn snapshot_lines(report: &ReportData, namespace_count: usize) -> Vec<DetailLine> {
    let tier = CostTier::for_total(report.grand_total);
    vec![
        DetailLine::plain(format!("Workloads:   {}", report.workload_costs.len())),
        DetailLine::plain(format!("Nodes:       {}", report.node_costs.len())),
        DetailLine::plain(format!("Namespaces:  {}", namespace_count)),
        DetailLine::plain(format!("Monthly:     {}", format_money(report.grand_total))),
        DetailLine::plain(format!("Daily:       {}", format_money(report.grand_total / 30.0))),
        DetailLine::new(format!("Cost Tier:   {}", tier.label()), tier.tone()),
    ]
}

/// "Cost Breakdown" block of the overview page
pub fn breakdown_lines(report: &ReportData) -> Vec<DetailLine> {
    let hardware = share_percent(report.hardware_total, report.grand_total);
    let electricity = share_percent(report.electricity_total, report.grand_total);
    let control_plane = share_percent(report.control_plane_total, report.grand_total);

    vec![
        DetailLine::plain(format!(
            "Hardware:      {} ({:.1}%)",
            format_money(report.hardware_total),
            hardware
        )),
        DetailLine::plain(format!(
            "Electricity:   {} ({:.1}%)",
            format_money(report.electricity_total),
            electricity
        )),
        DetailLine::plain(format!(
            "Control Plane: {} ({:.1}%)",
            format_money(report.control_plane_total),
            control_plane
        )),
        DetailLine::plain("Allocation:"),
        DetailLine::new(format!("H {}", cost_bar(hardware)), Tone::Good),
        DetailLine::new(format!("E {}", cost_bar(electricity)), Tone::Caution),
        DetailLine::new(format!("C {}", cost_bar(control_plane)), Tone::Heading),
    ]
}

/// Age of the newest sample, rounded to the minute
pub fn last_seen(last_sample_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = last_sample_at else {
        return "now".to_string();
    };
    let age_secs = (now - at).num_seconds();
    let minutes = (age_secs + 30).div_euclid(60);
    if minutes <= 0 {
        return "now".to_string();
    }
    format!("{} ago", format_short_duration(Duration::from_secs(minutes as u64 * 60)))
}

/// Build the overlay shown for a workload
///
/// `now` is the report's generation time so that the overlay is a pure
/// function of the report.
pub fn workload_detail(
    workload: &WorkloadCost,
    freshness: &StatsFreshness,
    now: DateTime<Utc>,
) -> WorkloadDetail {
    let mut lines = vec![
        DetailLine::new(format!("Pod:        {}", workload.name), Tone::Value),
        DetailLine::new(format!("Namespace:  {}", workload.namespace), Tone::Value),
        DetailLine::new(format!("CPU Req:    {}", workload.cpu_request), Tone::Value),
        DetailLine::new(format!("Mem Req:    {}", workload.mem_request), Tone::Value),
        DetailLine::new(
            format!("Monthly:    {}", format_money(workload.monthly_cost)),
            Tone::Value,
        ),
        DetailLine::blank(),
        DetailLine::new("Prometheus Data Freshness", Tone::Heading),
    ];

    match freshness.confidence() {
        None => {
            lines.push(DetailLine::new(
                format!("Status:     Unavailable ({})", truncate(&freshness.note, 64)),
                Tone::Caution,
            ));
            lines.push(DetailLine::blank());
            lines.push(DetailLine::new(
                "Tip: configure stats.base_url to show scrape-history confidence here.",
                Tone::Muted,
            ));
        }
        Some(confidence) => {
            lines.push(DetailLine::plain(format!(
                "Source:     {}",
                truncate(&freshness.base_url, 56)
            )));
            lines.push(DetailLine::plain(format!(
                "Coverage:   {} observed of {} lookback",
                format_short_duration(freshness.observed),
                format_short_duration(freshness.lookback)
            )));
            lines.push(DetailLine::plain(format!(
                "Samples:    {} points",
                freshness.sample_count
            )));
            lines.push(DetailLine::plain(format!(
                "Last Seen:  {}",
                last_seen(freshness.last_sample_at, now)
            )));
            lines.push(DetailLine::new(
                format!("Confidence: {}", confidence.label()),
                confidence.tone(),
            ));
        }
    }

    lines.push(DetailLine::blank());
    lines.push(DetailLine::new("Esc/Enter to close", Tone::Muted));

    WorkloadDetail {
        title: "Pod Details".to_string(),
        lines,
    }
}
