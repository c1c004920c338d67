//! Interactive dashboard state machine
//!
//! The dashboard is driven by [`transition`], a pure function from the current
//! state and one input event to the next state. Rendering reads the state and
//! a [`DashboardView`] and never changes either.

mod detail;
mod view;


pub use detail::{
    breakdown_lines, cost_bar, format_money, header_line, last_seen, share_percent,
    snapshot_lines, truncate, workload_detail, CostBadge, CostTier, DetailLine, Tone,
    WorkloadDetail,
};
pub use view::{DashboardView, TOP_N};

use std::collections::HashMap;

/// Top-level pages, selected with the digit keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Overview,
    Namespaces,
    Nodes,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Overview, Page::Namespaces, Page::Nodes];

    fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Overview),
            '2' => Some(Self::Namespaces),
            '3' => Some(Self::Nodes),
            _ => None,
        }
    }

    pub fn key(&self) -> char {
        match self {
            Self::Overview => '1',
            Self::Namespaces => '2',
            Self::Nodes => '3',
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Namespaces => "Namespaces",
            Self::Nodes => "Nodes",
        }
    }
}

/// Selectable tables on the overview page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    TopWorkloads,
    TopNamespaces,
}

impl TableId {
    fn toggled(self) -> Self {
        match self {
            Self::TopWorkloads => Self::TopNamespaces,
            Self::TopNamespaces => Self::TopWorkloads,
        }
    }
}

/// Terminal-independent input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Enter,
    Escape,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    /// Ctrl-C
    Interrupt,
}

/// Complete UI state owned by the event loop
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub current_page: Page,
    pub page_history: Vec<Page>,
    pub active_table: TableId,
    pub modal: Option<WorkloadDetail>,
    pub command_mode: bool,
    pub command_buffer: String,
    /// Zero-based selected row per table
    pub table_selection: HashMap<TableId, usize>,
    /// Index into [`DashboardView::namespaces`]
    pub active_namespace: usize,
    /// One-shot message shown in the footer until the next event
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            current_page: Page::Overview,
            page_history: Vec::new(),
            active_table: TableId::TopWorkloads,
            modal: None,
            command_mode: false,
            command_buffer: String::new(),
            table_selection: HashMap::from([(TableId::TopWorkloads, 0), (TableId::TopNamespaces, 0)]),
            active_namespace: 0,
            notice: None,
            should_quit: false,
        }
    }

    pub fn selected_row(&self, table: TableId) -> usize {
        self.table_selection.get(&table).copied().unwrap_or(0)
    }

    fn switch_to(&mut self, page: Page) {
        if self.current_page != page {
            self.page_history.push(self.current_page);
            self.current_page = page;
        }
    }

    fn move_selection(&mut self, rows: usize, forward: bool) {
        if rows == 0 {
            return;
        }
        let current = self.selected_row(self.active_table).min(rows - 1);
        let next = if forward {
            (current + 1) % rows
        } else {
            (current + rows - 1) % rows
        };
        self.table_selection.insert(self.active_table, next);
    }
}

/// Compute the state that follows `event`
pub fn transition(
    mut state: DashboardState,
    event: InputEvent,
    view: &DashboardView<'_>,
) -> DashboardState {
    if event == InputEvent::Interrupt {
        state.should_quit = true;
        return state;
    }

    state.notice = None;

    if state.modal.is_some() {
        if matches!(event, InputEvent::Escape | InputEvent::Enter) {
            state.modal = None;
        }
        return state;
    }

    if state.command_mode {
        handle_command_input(&mut state, event);
        return state;
    }

    match event {
        InputEvent::Escape => {
            if let Some(previous) = state.page_history.pop() {
                state.current_page = previous;
            }
        }
        InputEvent::Char(':') => {
            state.command_mode = true;
            state.command_buffer = ":".to_string();
        }
        InputEvent::Char(c) => {
            if let Some(page) = Page::from_key(c) {
                state.switch_to(page);
            }
        }
        _ => match state.current_page {
            Page::Overview => handle_overview_input(&mut state, event, view),
            Page::Namespaces => handle_namespace_input(&mut state, event, view),
            Page::Nodes => {}
        },
    }

    state
}

fn handle_command_input(state: &mut DashboardState, event: InputEvent) {
    match event {
        InputEvent::Escape => {
            state.command_mode = false;
            state.command_buffer.clear();
        }
        InputEvent::Enter => {
            let command = state.command_buffer.trim().to_string();
            state.command_mode = false;
            state.command_buffer.clear();
            match command.as_str() {
                ":q" | ":quit" => state.should_quit = true,
                "" | ":" => {}
                other => {
                    state.notice = Some(format!(
                        "Unknown command: {} (supported: :q, :quit)",
                        other
                    ))
                }
            }
        }
        InputEvent::Backspace => {
            if state.command_buffer.chars().count() > 1 {
                state.command_buffer.pop();
            }
        }
        InputEvent::Char(c) => state.command_buffer.push(c),
        _ => {}
    }
}

fn handle_overview_input(state: &mut DashboardState, event: InputEvent, view: &DashboardView<'_>) {
    match event {
        InputEvent::Tab | InputEvent::Left | InputEvent::Right => {
            state.active_table = state.active_table.toggled();
        }
        InputEvent::Down => state.move_selection(view.row_count(state.active_table), true),
        InputEvent::Up => state.move_selection(view.row_count(state.active_table), false),
        InputEvent::Enter => {
            let row = state.selected_row(state.active_table);
            match state.active_table {
                TableId::TopWorkloads => {
                    if let Some(detail) = view.workload_detail(row) {
                        state.modal = Some(detail.clone());
                    }
                }
                TableId::TopNamespaces => {
                    let index = view
                        .top_namespaces
                        .get(row)
                        .and_then(|ns| view.namespace_index(&ns.name));
                    if let Some(index) = index {
                        state.active_namespace = index;
                        state.switch_to(Page::Namespaces);
                    }
                }
            }
        }
        _ => {}
    }
}

fn handle_namespace_input(state: &mut DashboardState, event: InputEvent, view: &DashboardView<'_>) {
    let count = view.namespaces.len();
    if count == 0 {
        return;
    }
    match event {
        InputEvent::Right => state.active_namespace = (state.active_namespace + 1) % count,
        InputEvent::Left => state.active_namespace = (state.active_namespace + count - 1) % count,
        _ => {}
    }
}
