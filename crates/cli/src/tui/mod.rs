//! Terminal front end for the dashboard state machine
//!
//! The loop only reads keys and redraws; the report is complete before the
//! terminal is taken over.

mod render;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kfin_lib::dashboard::{transition, DashboardState, DashboardView, InputEvent};
use kfin_lib::ReportData;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tracing::debug;

/// Run the dashboard until the user quits
pub async fn run(report: ReportData) -> Result<()> {
    tokio::task::spawn_blocking(move || run_blocking(&report)).await?
}

fn run_blocking(report: &ReportData) -> Result<()> {
    let view = DashboardView::new(report);
    let mut terminal = setup_terminal()?;

    let loop_result: Result<()> = (|| -> Result<()> {
        let mut state = DashboardState::new();
        loop {
            terminal.draw(|frame| render::draw(frame, &state, &view))?;

            if let Event::Key(key) = event::read()? {
                let Some(input) = map_key(key) else {
                    continue;
                };
                state = transition(state, input, &view);
                if state.should_quit {
                    debug!("Dashboard quit requested");
                    break Ok(());
                }
            }
        }
    })();

    let restore_result = restore_terminal(terminal);

    match (loop_result, restore_result) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(loop_err), Ok(())) => Err(loop_err),
        (Ok(()), Err(restore_err)) => Err(restore_err),
        (Err(loop_err), Err(restore_err)) => Err(loop_err.context(restore_err.to_string())),
    }
}

/// Translate a terminal key press into a dashboard input
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(InputEvent::Interrupt),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(c) => Some(InputEvent::Char(c)),
        KeyCode::Enter => Some(InputEvent::Enter),
        KeyCode::Esc => Some(InputEvent::Escape),
        KeyCode::Tab | KeyCode::BackTab => Some(InputEvent::Tab),
        KeyCode::Up => Some(InputEvent::Up),
        KeyCode::Down => Some(InputEvent::Down),
        KeyCode::Left => Some(InputEvent::Left),
        KeyCode::Right => Some(InputEvent::Right),
        KeyCode::Backspace => Some(InputEvent::Backspace),
        _ => None,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}
