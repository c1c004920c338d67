//! Stateless drawing of the dashboard

use kfin_lib::dashboard::{
    breakdown_lines, format_money, header_line, snapshot_lines, truncate, CostBadge,
    DashboardState, DashboardView, DetailLine, Page, TableId, Tone,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

const LOGO: [&str; 5] = [
    r" _    _____ ___ _   _ ",
    r"| | _|  ___|_ _| \ | |",
    r"| |/ / |_   | ||  \| |",
    r"|   <|  _|  | || . ` |",
    r"|_|\_\_|   |___|_|\__|",
];

const FOOTER_HINT: &str =
    "[1] Overview [2] Namespaces [3] Nodes | Left/Right: Cycle NS Esc: Back : Command";

pub fn draw(frame: &mut Frame, state: &DashboardState, view: &DashboardView<'_>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(LOGO.len() as u16 + 2),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_header(frame, layout[0], state, view);
    frame.render_widget(
        Paragraph::new(page_title(state, view)).style(tone_style(Tone::Heading)),
        layout[1],
    );

    match state.current_page {
        Page::Overview => draw_overview(frame, layout[2], state, view),
        Page::Namespaces => draw_namespace(frame, layout[2], state, view),
        Page::Nodes => draw_nodes(frame, layout[2], view),
    }

    frame.render_widget(footer(state), layout[3]);

    if let Some(detail) = &state.modal {
        let area = centered_rect(70, 60, frame.size());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", detail.title))
            .border_style(tone_style(Tone::Heading));
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(styled_lines(&detail.lines)).block(block), area);
    }
}

/// Title line above the page body
pub fn page_title(state: &DashboardState, view: &DashboardView<'_>) -> String {
    match state.current_page {
        Page::Overview => {
            "OVERVIEW | Tab/Left/Right switch tables, Up/Down move row, Enter pod details"
                .to_string()
        }
        Page::Nodes => "NODES | Cluster monthly hardware + electricity by node".to_string(),
        Page::Namespaces => match view.namespaces.get(state.active_namespace) {
            Some(ns) => format!(
                "NAMESPACES > {} | Pods:{} Cost:{}",
                ns.name,
                ns.workload_count,
                format_money(ns.monthly_cost)
            ),
            None => "NAMESPACES | No namespaces".to_string(),
        },
    }
}

/// Bottom line: notice, command buffer or key hints
pub fn footer_text(state: &DashboardState) -> String {
    if state.command_mode {
        format!("Command {} (Enter to run, Esc to cancel)", state.command_buffer)
    } else if let Some(notice) = &state.notice {
        notice.clone()
    } else {
        FOOTER_HINT.to_string()
    }
}

fn footer(state: &DashboardState) -> Paragraph<'static> {
    let tone = if state.command_mode {
        Tone::Value
    } else if state.notice.is_some() {
        Tone::Bad
    } else {
        Tone::Muted
    };
    Paragraph::new(footer_text(state)).style(tone_style(tone))
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DashboardState, view: &DashboardView<'_>) {
    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(*l, tone_style(Tone::Heading))))
        .collect();
    lines.push(Line::from(Span::styled(
        header_line(view.report),
        tone_style(Tone::Value),
    )));

    let mut nav = Vec::new();
    for page in Page::ALL {
        let label = format!("[{}] {}", page.key(), page.title());
        let style = if page == state.current_page {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            tone_style(Tone::Muted)
        };
        nav.push(Span::styled(label, style));
        nav.push(Span::raw("  "));
    }
    lines.push(Line::from(nav));

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_overview(frame: &mut Frame, area: Rect, state: &DashboardState, view: &DashboardView<'_>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(5)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let snapshot = snapshot_lines(view.report, view.namespaces.len());
    frame.render_widget(
        Paragraph::new(styled_lines(&snapshot)).block(titled_block(" Cluster Snapshot ", false)),
        top[0],
    );
    frame.render_widget(
        Paragraph::new(styled_lines(&breakdown_lines(view.report)))
            .block(titled_block(" Cost Breakdown ", false)),
        top[1],
    );

    let workload_rows: Vec<Row> = view
        .top_workloads
        .iter()
        .map(|w| {
            Row::new(vec![
                Cell::from(truncate(&w.name, 28)),
                Cell::from(truncate(&w.namespace, 16)),
                cost_cell(w.monthly_cost),
            ])
        })
        .collect();
    draw_ranked_table(
        frame,
        bottom[0],
        state,
        TableId::TopWorkloads,
        "Top Pods By Monthly Cost",
        ["POD", "NS", "COST"],
        workload_rows,
        [Constraint::Min(20), Constraint::Length(17), Constraint::Length(14)],
    );

    let namespace_rows: Vec<Row> = view
        .top_namespaces
        .iter()
        .map(|ns| {
            Row::new(vec![
                Cell::from(truncate(&ns.name, 28)),
                Cell::from(ns.workload_count.to_string()),
                cost_cell(ns.monthly_cost),
            ])
        })
        .collect();
    draw_ranked_table(
        frame,
        bottom[1],
        state,
        TableId::TopNamespaces,
        "Top Namespaces By Monthly Cost",
        ["NAMESPACE", "PODS", "COST"],
        namespace_rows,
        [Constraint::Min(12), Constraint::Length(6), Constraint::Length(14)],
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_ranked_table(
    frame: &mut Frame,
    area: Rect,
    state: &DashboardState,
    table: TableId,
    title: &str,
    header: [&'static str; 3],
    rows: Vec<Row>,
    widths: [Constraint; 3],
) {
    let active = state.active_table == table;
    let title = if active {
        format!(" * {} ", title)
    } else {
        format!(" {} ", title)
    };

    let mut table_state = TableState::default();
    if !rows.is_empty() {
        table_state.select(Some(state.selected_row(table).min(rows.len() - 1)));
    }

    let highlight = if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let widget = Table::new(rows, widths)
        .header(header_row(&header))
        .block(titled_block(&title, active))
        .highlight_style(highlight)
        .highlight_symbol("> ");
    frame.render_stateful_widget(widget, area, &mut table_state);
}

fn draw_namespace(frame: &mut Frame, area: Rect, state: &DashboardState, view: &DashboardView<'_>) {
    let workloads = view.namespace_workloads(state.active_namespace);
    let block = titled_block(" Pods ", true);

    if workloads.is_empty() {
        frame.render_widget(
            Paragraph::new("No non-zero cost pods in this namespace")
                .style(tone_style(Tone::Muted))
                .block(block),
            area,
        );
        return;
    }

    let total: f64 = workloads.iter().map(|w| w.monthly_cost).sum();
    let mut rows: Vec<Row> = workloads
        .iter()
        .map(|w| {
            Row::new(vec![
                Cell::from(truncate(&w.name, 40)),
                Cell::from(w.cpu_request.clone()),
                Cell::from(w.mem_request.clone()),
                cost_cell(w.monthly_cost),
            ])
        })
        .collect();
    rows.push(total_row(vec![
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        format_money(total),
    ]));

    let widget = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["NAME", "CPU", "MEM", "COST"]))
    .block(block);
    frame.render_widget(widget, area);
}

fn draw_nodes(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let report = view.report;
    let mut rows: Vec<Row> = report
        .node_costs
        .iter()
        .map(|n| {
            Row::new(vec![
                Cell::from(truncate(&n.name, 40)),
                Cell::from(format!("{:.1}GB", n.memory_gb)),
                Cell::from(format_money(n.hardware_monthly)),
                Cell::from(format_money(n.electricity_monthly)),
                Cell::from(format_money(n.total)),
            ])
        })
        .collect();

    let memory_total: f64 = report.node_costs.iter().map(|n| n.memory_gb).sum();
    rows.push(total_row(vec![
        "TOTAL".to_string(),
        format!("{:.1}GB", memory_total),
        format_money(report.hardware_total),
        format_money(report.electricity_total),
        format_money(report.hardware_total + report.electricity_total),
    ]));

    let widget = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["NODE", "MEMORY", "HARDWARE", "ELECTRICITY", "TOTAL"]))
    .block(titled_block(" Nodes ", true));
    frame.render_widget(widget, area);
}

fn header_row(labels: &[&'static str]) -> Row<'static> {
    Row::new(labels.iter().map(|l| Cell::from(*l))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

fn total_row(cells: Vec<String>) -> Row<'static> {
    Row::new(cells).style(Style::default().add_modifier(Modifier::BOLD))
}

/// `H $123.45`, colored by badge
fn cost_cell(monthly: f64) -> Cell<'static> {
    let badge = CostBadge::for_cost(monthly);
    Cell::from(format!("{} {}", badge.letter(), format_money(monthly)))
        .style(tone_style(badge.tone()))
}

fn titled_block(title: &str, active: bool) -> Block<'static> {
    let border = if active { Tone::Value } else { Tone::Muted };
    Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(tone_style(border))
}

fn styled_lines(lines: &[DetailLine]) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|l| Line::from(Span::styled(l.text.clone(), tone_style(l.tone))))
        .collect()
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Plain => Style::default(),
        Tone::Value => Style::default().fg(Color::Cyan),
        Tone::Heading => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        Tone::Muted => Style::default().fg(Color::DarkGray),
        Tone::Good => Style::default().fg(Color::Green),
        Tone::Caution => Style::default().fg(Color::Yellow),
        Tone::Bad => Style::default().fg(Color::Red),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kfin_lib::dashboard::{transition, InputEvent};
    use kfin_lib::{NodeCost, ReportData, StatsFreshness, UsageRates, WorkloadCost};
    use ratatui::{backend::TestBackend, Terminal};

    fn report() -> ReportData {
        let workload = |name: &str, namespace: &str, monthly_cost: f64| WorkloadCost {
            name: name.to_string(),
            namespace: namespace.to_string(),
            cpu_request: "500m".to_string(),
            mem_request: "1Gi".to_string(),
            monthly_cost,
        };
        ReportData {
            workload_costs: vec![
                workload("api", "prod", 42.5),
                workload("worker", "prod", 12.0),
                workload("sidecar", "prod", 0.0),
                workload("cron", "batch", 3.25),
            ],
            node_costs: vec![NodeCost {
                name: "node-a".to_string(),
                instance_type: "m5.large".to_string(),
                memory_gb: 16.0,
                hardware_monthly: 120.0,
                electricity_monthly: 1.31,
                total: 121.31,
                used_instance_override: true,
            }],
            hardware_total: 120.0,
            electricity_total: 1.31,
            control_plane_total: 73.0,
            grand_total: 194.31,
            workload_total: 57.75,
            pricing_source_label: "config".to_string(),
            usage_rates: UsageRates {
                cpu_per_core_hour: 0.025,
                mem_per_gb_hour: 0.006,
            },
            stats_freshness: StatsFreshness::default(),
            context_name: "prod".to_string(),
            cluster_name: "prod-east".to_string(),
            generated_at: Utc::now(),
        }
    }

    fn render(state: &DashboardState, view: &DashboardView<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|frame| draw(frame, state, view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_overview_renders_tables() {
        let report = report();
        let view = DashboardView::new(&report);
        let screen = render(&DashboardState::new(), &view);

        assert!(screen.contains("* Top Pods By Monthly Cost"));
        assert!(screen.contains("Top Namespaces By Monthly Cost"));
        assert!(screen.contains("M $42.50"));
        assert!(screen.contains("C $3.25"));
        assert!(!screen.contains("sidecar"));
        assert!(screen.contains("Cluster Snapshot"));
    }

    #[test]
    fn test_nodes_page_has_total_row() {
        let report = report();
        let view = DashboardView::new(&report);
        let state = transition(DashboardState::new(), InputEvent::Char('3'), &view);
        let screen = render(&state, &view);

        assert!(screen.contains("NODES | Cluster monthly hardware + electricity by node"));
        assert!(screen.contains("16.0GB"));
        assert!(screen.contains("$121.31"));
        assert!(screen.contains("TOTAL"));
    }

    #[test]
    fn test_namespace_title() {
        let report = report();
        let view = DashboardView::new(&report);
        let state = transition(DashboardState::new(), InputEvent::Char('2'), &view);

        assert_eq!(page_title(&state, &view), "NAMESPACES > batch | Pods:1 Cost:$3.25");
    }

    #[test]
    fn test_modal_is_drawn_over_page() {
        let report = report();
        let view = DashboardView::new(&report);
        let state = transition(DashboardState::new(), InputEvent::Enter, &view);
        let screen = render(&state, &view);

        assert!(screen.contains("Pod Details"));
        assert!(screen.contains("Pod:        api"));
        assert!(screen.contains("Esc/Enter to close"));
    }

    #[test]
    fn test_footer_modes() {
        let report = report();
        let view = DashboardView::new(&report);

        assert_eq!(footer_text(&DashboardState::new()), FOOTER_HINT);

        let state = transition(DashboardState::new(), InputEvent::Char(':'), &view);
        let state = transition(state, InputEvent::Char('x'), &view);
        assert_eq!(footer_text(&state), "Command :x (Enter to run, Esc to cancel)");

        let state = transition(state, InputEvent::Enter, &view);
        assert!(footer_text(&state).starts_with("Unknown command: :x"));
    }
}
