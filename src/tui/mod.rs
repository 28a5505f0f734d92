// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard and mouse input, timer ticks, async task results)
// - Routing mouse input through the document to the popover containers

pub mod app;
pub mod components;
pub mod document;
pub mod layout;
pub mod popover;
pub mod theme;
pub mod views;

use crate::bootstrap::Mounted;
use crate::config::Config;
use crate::dashboard::{Action, DashboardStore};
use crate::logging::LogBuffer;
use crate::store::TaskReceiver;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use document::EventKind;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// Run the TUI until the user quits
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// whether the loop ended cleanly or not.
pub async fn run_tui(mounted: Mounted, config: &Config, log_buffer: LogBuffer) -> Result<()> {
    let Mounted {
        store,
        mut tasks,
        devtools,
    } = mounted;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(store, devtools, config, log_buffer);
    // Charts start out loading
    app.refresh_all();

    let tick = Duration::from_millis(config.tick_ms);
    let result = run_event_loop(&mut terminal, &mut app, &mut tasks, tick).await;

    restore_terminal();
    terminal.show_cursor().context("Failed to show cursor")?;

    if result.is_err() {
        if let Some(snapshot) = app.devtools.snapshot() {
            tracing::error!("Dashboard state at failure: {}", snapshot);
        }
    }
    result
}

/// Put the terminal back the way we found it
///
/// Best effort: used on the normal exit path and from the panic hook, where
/// there is nobody left to report an error to.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Main event loop
///
/// Waits on three sources with `tokio::select!`:
/// 1. Terminal input (keys, mouse)
/// 2. Timer ticks (spinner, toast expiry, periodic refresh)
/// 3. Completed async tasks, dispatched back into the store
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tasks: &mut TaskReceiver<Action>,
    tick: Duration,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(tick);

    loop {
        app.sync_if_changed();
        terminal
            .draw(|f| views::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            input = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            } => {
                match input {
                    Some(Event::Key(key_event)) => handle_key_event(app, key_event),
                    Some(Event::Mouse(mouse_event)) => handle_mouse_event(app, mouse_event),
                    _ => {}
                }
            }

            _ = tick_interval.tick() => {
                app.on_tick();
            }

            Some(action) = tasks.recv() => {
                dispatch_task_result(&app.store, action);
                // Batch whatever else finished meanwhile into the same frame
                tasks.drain_into(&app.store);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn dispatch_task_result(store: &DashboardStore, action: Action) {
    tracing::trace!("Task finished: {:?}", action);
    store.dispatch(action);
}

/// Handle keyboard input
fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    if key_event.kind != KeyEventKind::Press {
        return;
    }

    match key_event.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.should_quit = true,
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Char('e') | KeyCode::Char('E') => app.toggle_edit_mode(),
        KeyCode::Char('r') | KeyCode::Char('R') => {
            app.refresh_all();
            app.show_toast("Refreshing all charts");
        }
        KeyCode::Esc => app.toast = None,
        _ => {}
    }
}

/// Map terminal mouse input onto document pointer events
///
/// A button press is a click and a held-button move is a drag. Everything
/// else (release, scroll, plain moves) is ignored.
fn handle_mouse_event(app: &mut App, mouse_event: MouseEvent) {
    let kind = match mouse_event.kind {
        MouseEventKind::Down(_) => EventKind::Click,
        MouseEventKind::Drag(_) => EventKind::Drag,
        _ => return,
    };
    app.handle_pointer(kind, mouse_event.column, mouse_event.row);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{create_dashboard_store, load_bootstrap_data, BootstrapSource};
    use crossterm::event::{KeyEventState, MouseButton};
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;

    fn demo_app(config: &Config) -> App {
        let data = load_bootstrap_data(&BootstrapSource::Demo, config).unwrap();
        let mounted = create_dashboard_store(&data, false).unwrap();
        App::new(mounted.store, mounted.devtools, config, LogBuffer::new())
    }

    /// Draw one frame and return the screen as text, one line per row
    fn draw(terminal: &mut Terminal<TestBackend>, app: &mut App) -> String {
        app.sync_panels();
        terminal.draw(|f| views::draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mouse(kind: MouseEventKind, rect: Rect) -> MouseEvent {
        MouseEvent {
            kind,
            column: rect.x + rect.width / 2,
            row: rect.y + rect.height / 2,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn click(app: &mut App, rect: Rect) {
        handle_mouse_event(app, mouse(MouseEventKind::Down(MouseButton::Left), rect));
    }

    /// Click the middle of a chart panel as last drawn
    fn click_chart(app: &mut App, slice_id: u64) {
        let rect = root_bounds(app, slice_id);
        click(app, rect);
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn root_bounds(app: &App, slice_id: u64) -> Rect {
        let panel = app.panel(slice_id).expect("panel");
        app.document.bounds(panel.root).expect("bounds")
    }

    #[test]
    fn draws_title_and_charts() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        let screen = draw(&mut terminal, &mut app);

        assert!(screen.contains("World Bank Data"));
        assert!(screen.contains("World Population"));
        assert!(screen.contains("6 chart(s)"));
        assert!(screen.contains("Logs"));
        assert!(!screen.contains("Force refresh"));
    }

    #[test]
    fn click_opens_menu_and_outside_click_closes_it() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, &mut app);

        click_chart(&mut app, 14);
        assert_eq!(app.store.state().focused_chart, Some(14));
        assert_eq!(app.document.listener_count(), 2);

        let screen = draw(&mut terminal, &mut app);
        assert!(screen.contains("Force refresh"));
        assert!(!screen.contains("Remove chart"));

        // Title bar is outside every chart
        click(&mut app, Rect::new(0, 0, 120, 3));
        assert_eq!(app.store.state().focused_chart, None);
        assert_eq!(app.document.listener_count(), 0);
        assert!(!draw(&mut terminal, &mut app).contains("Force refresh"));
    }

    #[test]
    fn clicking_another_chart_moves_focus() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, &mut app);

        click_chart(&mut app, 12);
        click_chart(&mut app, 16);

        assert_eq!(app.store.state().focused_chart, Some(16));
        assert!(!app.panel(12).unwrap().popover.is_focused());
        assert!(app.panel(16).unwrap().popover.is_focused());
        // Only the focused container listens at document level
        assert_eq!(app.document.listener_count(), 2);
    }

    #[test]
    fn drag_outside_releases_focus() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, &mut app);

        click_chart(&mut app, 13);
        let drag = mouse(MouseEventKind::Drag(MouseButton::Left), root_bounds(&app, 17));
        handle_mouse_event(&mut app, drag);

        assert_eq!(app.store.state().focused_chart, None);
        // A drag never focuses a container on its own
        assert!(!app.panel(17).unwrap().popover.is_focused());
    }

    #[test]
    fn menu_entry_runs_its_command_and_keeps_focus() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, &mut app);

        // The demo dashboard opens with this chart's description expanded
        assert!(app.store.state().is_expanded(13));
        click_chart(&mut app, 13);
        assert!(draw(&mut terminal, &mut app).contains("Collapse description"));

        let entry = {
            let panel = app.panel(13).unwrap();
            let first = panel.menu_entries(&app.document)[0];
            app.document.bounds(first).unwrap()
        };
        click(&mut app, entry);

        assert!(!app.store.state().is_expanded(13));
        assert_eq!(app.store.state().focused_chart, Some(13));
        let screen = draw(&mut terminal, &mut app);
        assert!(screen.contains("Expand description"));
    }

    #[test]
    fn disable_click_ignores_chart_clicks() {
        let mut config = Config::default();
        config.popover.disable_click = true;
        let mut app = demo_app(&config);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, &mut app);

        click_chart(&mut app, 14);

        assert_eq!(app.store.state().focused_chart, None);
        assert_eq!(app.document.listener_count(), 0);
    }

    #[test]
    fn store_changes_from_tasks_resync_panels() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, &mut app);
        let before = app.panels.len();

        // Dispatched straight to the store, as a finished task would
        app.store.dispatch(Action::SetEditMode(true));
        app.store.dispatch(Action::RemoveSlice(14));
        assert_eq!(app.panels.len(), before);

        app.sync_if_changed();
        assert_eq!(app.panels.len(), before - 1);
        assert!(app.panel(14).is_none());
    }

    #[test]
    fn edit_mode_adds_remove_entry() {
        let mut app = demo_app(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        handle_key_event(&mut app, key(KeyCode::Char('e')));
        assert!(app.store.state().edit_mode);
        assert!(draw(&mut terminal, &mut app).contains("#1 SetEditMode(true)"));

        click_chart(&mut app, 14);
        let screen = draw(&mut terminal, &mut app);
        assert!(screen.contains("[editing]"));
        assert!(screen.contains("Remove chart"));

        let remove = {
            let panel = app.panel(14).unwrap();
            let entries = panel.menu_entries(&app.document);
            app.document.bounds(*entries.last().unwrap()).unwrap()
        };
        click(&mut app, remove);

        assert!(app.panel(14).is_none());
        assert!(!app.store.state().slice_ids.contains(&14));
        // The removed container took its listeners with it
        assert_eq!(app.document.listener_count(), 0);
        assert!(app.toast.is_some());
    }

    #[test]
    fn quit_and_escape_keys() {
        let mut app = demo_app(&Config::default());
        app.show_toast("hello");

        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(app.toast.is_none());

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn refresh_results_come_back_through_the_task_channel() {
        let config = Config::default();
        let data = load_bootstrap_data(&BootstrapSource::Demo, &config).unwrap();
        let Mounted {
            store,
            mut tasks,
            devtools,
        } = create_dashboard_store(&data, false).unwrap();
        let mut app = App::new(store, devtools, &config, LogBuffer::new());

        app.execute(app::MenuCommand::Refresh(14));
        let action = tasks.recv().await.expect("refresh result");
        dispatch_task_result(&app.store, action);

        let state = app.store.state();
        assert_eq!(state.charts[&14].rows, Some(25));
    }
}
