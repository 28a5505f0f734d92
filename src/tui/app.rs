// App state for the TUI
//
// The store owns dashboard state. The App owns everything that only matters
// for drawing and input: the document tree used for hit testing, one popover
// container per chart, the theme, and transient UI bits like the toast.

use super::components::Toast;
use super::document::{Document, EventKind, ListenerId, NodeId};
use super::popover::{FocusTransition, PopoverOptions, WithPopoverMenu};
use super::theme::Theme;
use crate::config::Config;
use crate::dashboard::actions::{refresh_all, refresh_chart};
use crate::dashboard::{Action, DashboardState, DashboardStore};
use crate::logging::LogBuffer;
use crate::store::{DevToolsHandle, SubscriptionId};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Spinner frames for charts that are loading
const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];

/// Command behind a popover menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Show or hide the chart description
    ToggleDescription { slice_id: u64, expanded: bool },
    Refresh(u64),
    /// Edit mode only
    Remove(u64),
}

impl MenuCommand {
    pub fn label(&self) -> &'static str {
        match self {
            MenuCommand::ToggleDescription { expanded: true, .. } => "Collapse description",
            MenuCommand::ToggleDescription { expanded: false, .. } => "Expand description",
            MenuCommand::Refresh(_) => "Force refresh",
            MenuCommand::Remove(_) => "Remove chart",
        }
    }

    /// Menu for one chart given the current state
    pub fn for_chart(state: &DashboardState, slice_id: u64) -> Vec<MenuCommand> {
        let mut commands = Vec::new();

        let has_description = state
            .slices
            .get(&slice_id)
            .is_some_and(|s| s.description.is_some());
        if has_description {
            commands.push(MenuCommand::ToggleDescription {
                slice_id,
                expanded: state.is_expanded(slice_id),
            });
        }
        commands.push(MenuCommand::Refresh(slice_id));
        if state.edit_mode {
            commands.push(MenuCommand::Remove(slice_id));
        }
        commands
    }
}

/// What a popover container holds: the chart body, or a menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelNode {
    Chart(u64),
    Command(MenuCommand),
}

/// A chart on screen with its popover container
pub struct ChartPanel {
    pub slice_id: u64,
    /// Panel root element; the container is mounted here
    pub root: NodeId,
    /// Menu overlay element, child of `root` so menu clicks count as inside
    pub menu: NodeId,
    pub popover: WithPopoverMenu<PanelNode>,
}

impl ChartPanel {
    /// Menu entry elements, one per menu item, in order
    pub fn menu_entries(&self, document: &Document) -> Vec<NodeId> {
        document.children(self.menu)
    }
}

/// Main application state
pub struct App {
    pub store: DashboardStore,
    pub devtools: DevToolsHandle,
    pub document: Document,
    pub theme: Theme,
    pub log_buffer: LogBuffer,
    pub panels: Vec<ChartPanel>,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    disable_click: bool,
    frame: usize,
    last_auto_refresh: Instant,
    /// Set by the store subscription whenever an action was reduced
    state_changed: Rc<Cell<bool>>,
    subscription: SubscriptionId,
}

impl App {
    pub fn new(
        store: DashboardStore,
        devtools: DevToolsHandle,
        config: &Config,
        log_buffer: LogBuffer,
    ) -> Self {
        let state_changed = Rc::new(Cell::new(false));
        let flag = state_changed.clone();
        let subscription = store.subscribe(move || flag.set(true));

        let mut app = Self {
            store,
            devtools,
            document: Document::new(),
            theme: Theme::named(&config.theme),
            log_buffer,
            panels: Vec::new(),
            toast: None,
            should_quit: false,
            disable_click: config.popover.disable_click,
            frame: 0,
            last_auto_refresh: Instant::now(),
            state_changed,
            subscription,
        };
        app.sync_panels();
        app
    }

    // ─── Panels ─────────────────────────────────────────────────────

    /// Bring containers in line with the store
    ///
    /// Creates a container for each new chart, drops containers for removed
    /// charts (which releases their document listeners) and refreshes menus.
    pub fn sync_panels(&mut self) {
        let (slice_ids, menus): (Vec<u64>, Vec<Vec<MenuCommand>>) = {
            let state = self.store.state();
            let ids: Vec<u64> = state.ordered_slices().map(|s| s.id).collect();
            let menus = ids
                .iter()
                .map(|id| MenuCommand::for_chart(&state, *id))
                .collect();
            (ids, menus)
        };

        let document = self.document.clone();
        self.panels.retain(|panel| {
            let keep = slice_ids.contains(&panel.slice_id);
            if !keep {
                tracing::debug!("Dropping panel for chart {}", panel.slice_id);
                document.remove_element(panel.root);
            }
            keep
        });

        let mut panels = std::mem::take(&mut self.panels);
        let mut ordered = Vec::with_capacity(slice_ids.len());
        for (slice_id, menu) in slice_ids.iter().zip(menus) {
            let mut panel = match panels.iter().position(|p| p.slice_id == *slice_id) {
                Some(index) => panels.swap_remove(index),
                None => self.create_panel(*slice_id),
            };
            panel.popover.set_menu_items(menu.into_iter().map(PanelNode::Command).collect());
            ordered.push(panel);
        }
        self.panels = ordered;
    }

    fn create_panel(&self, slice_id: u64) -> ChartPanel {
        let root = self.document.create_element(None);
        let menu = self.document.create_element(Some(root));
        self.document.set_visible(menu, false);
        self.document.set_z(menu, 1);

        let store = self.store.clone();
        let mut popover = WithPopoverMenu::new(
            &self.document,
            ListenerId(slice_id),
            PopoverOptions {
                children: vec![PanelNode::Chart(slice_id)],
                disable_click: self.disable_click,
                on_change_focus: Some(Box::new(move |focused| {
                    store.dispatch(Action::ChartFocusChanged { slice_id, focused });
                })),
                ..Default::default()
            },
        );
        popover.mount(root);

        ChartPanel {
            slice_id,
            root,
            menu,
            popover,
        }
    }

    /// Resync panels if any action was reduced since the last sync
    pub fn sync_if_changed(&mut self) {
        if self.state_changed.replace(false) {
            self.sync_panels();
        }
    }

    #[cfg(test)]
    pub fn panel(&self, slice_id: u64) -> Option<&ChartPanel> {
        self.panels.iter().find(|p| p.slice_id == slice_id)
    }

    // ─── Input ──────────────────────────────────────────────────────

    /// Deliver a pointer event at a terminal cell
    ///
    /// Every container on the route sees the event, in route order. A click
    /// on a menu entry then runs that entry's command.
    pub fn handle_pointer(&mut self, kind: EventKind, column: u16, row: u16) {
        let event = self.document.pointer_event(kind, column, row);

        for step in self.document.route(&event) {
            let Some(panel) = self
                .panels
                .iter_mut()
                .find(|p| p.popover.id() == step.listener)
            else {
                continue;
            };
            if panel.popover.handle_event(&event) != FocusTransition::Unchanged {
                tracing::debug!(
                    listeners = self.document.listener_count(),
                    "Chart {} {} by {} ({:?})",
                    panel.slice_id,
                    if panel.popover.is_focused() { "focused" } else { "unfocused" },
                    kind.as_str(),
                    step.phase
                );
            }
        }

        if kind == EventKind::Click {
            if let Some(command) = self.command_at(event.target) {
                self.execute(command);
            }
        }
    }

    /// Command of the visible menu entry at `target`
    fn command_at(&self, target: Option<NodeId>) -> Option<MenuCommand> {
        let target = target?;
        self.panels.iter().find_map(|panel| {
            let view = panel.popover.render();
            let entries = view.menu?;
            let elements = panel.menu_entries(&self.document);
            let index = elements.iter().position(|e| *e == target)?;
            let entry = entries.get(index)?;
            match entry.node {
                PanelNode::Command(command) => {
                    tracing::trace!("Hit {} of chart {}", entry.key, panel.slice_id);
                    Some(*command)
                }
                PanelNode::Chart(_) => None,
            }
        })
    }

    pub fn execute(&mut self, command: MenuCommand) {
        tracing::info!("Menu command: {:?}", command);
        match command {
            MenuCommand::ToggleDescription { slice_id, .. } => {
                self.store.dispatch(Action::ToggleExpandSlice(slice_id));
            }
            MenuCommand::Refresh(slice_id) => {
                self.store.dispatch_thunk(refresh_chart(slice_id));
            }
            MenuCommand::Remove(slice_id) => {
                self.store.dispatch(Action::RemoveSlice(slice_id));
                self.show_toast("Chart removed (unsaved)");
            }
        }
        self.sync_if_changed();
    }

    pub fn toggle_edit_mode(&mut self) {
        let (can_edit, editing) = {
            let state = self.store.state();
            (state.info.can_edit, state.edit_mode)
        };
        if !can_edit {
            self.show_toast("No permission to edit this dashboard");
            return;
        }
        self.store.dispatch(Action::SetEditMode(!editing));
        self.sync_if_changed();
        self.show_toast(if editing { "Edit mode off" } else { "Edit mode on" });
    }

    pub fn refresh_all(&mut self) {
        self.store.dispatch_thunk(refresh_all());
        self.last_auto_refresh = Instant::now();
    }

    /// Charts that take part in periodic refresh
    fn auto_refresh_targets(&self) -> Option<(Duration, Vec<u64>)> {
        let state = self.store.state();
        if state.refresh_frequency == 0 {
            return None;
        }
        let ids = state
            .slice_ids
            .iter()
            .copied()
            .filter(|id| !state.timed_refresh_immune_slices.contains(id))
            .collect();
        Some((Duration::from_secs(state.refresh_frequency), ids))
    }

    // ─── Timers ─────────────────────────────────────────────────────

    pub fn on_tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);

        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        if let Some((period, ids)) = self.auto_refresh_targets() {
            if self.last_auto_refresh.elapsed() >= period {
                tracing::debug!("Periodic refresh of {} chart(s)", ids.len());
                for id in ids {
                    self.store.dispatch_thunk(refresh_chart(id));
                }
                self.last_auto_refresh = Instant::now();
            }
        }
    }

    pub fn spinner_char(&self) -> char {
        SPINNER[self.frame % SPINNER.len()]
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}
