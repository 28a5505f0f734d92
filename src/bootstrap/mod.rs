// Bootstrap - from host page to a running dashboard
//
// The startup sequence is linear and fail-fast:
//
//   app_setup()            config template, tracing, panic hook
//   load_bootstrap_data()  locate the app element, read + decode its attribute, parse JSON
//   create_dashboard_store() initial state, store with thunk + devtools
//   tui::run_tui()         render the dashboard bound to the store
//
// Any failure aborts startup with a descriptive error. There is nothing
// sensible to fall back to without a payload.

pub mod page;

use crate::config::Config;
use crate::dashboard::{
    get_initial_state, root_reducer, Action, BootstrapData, DashboardState, DashboardStore,
};
use crate::logging::{self, LogBuffer};
use crate::store::{
    apply_middleware, compose, create_store, init_enhancer, thunk, DevToolsHandle, Middleware,
    TaskReceiver,
};
use anyhow::{Context, Result};
use page::HostPage;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Once;

/// Where the bootstrap payload comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapSource {
    /// HTML host page with the payload in an element attribute
    Page(PathBuf),
    /// Raw JSON payload
    Json(PathBuf),
    /// Built-in demo page
    Demo,
}

impl fmt::Display for BootstrapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapSource::Page(path) => write!(f, "page {}", path.display()),
            BootstrapSource::Json(path) => write!(f, "json {}", path.display()),
            BootstrapSource::Demo => write!(f, "demo page"),
        }
    }
}

/// Ways the host page can fail to provide a payload
#[derive(Debug)]
pub enum BootstrapError {
    MissingElement { id: String },
    MissingAttribute { id: String, attribute: String },
    InvalidJson(serde_json::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::MissingElement { id } => {
                write!(f, "no element with id \"{}\" in host page", id)
            }
            BootstrapError::MissingAttribute { id, attribute } => {
                write!(f, "element \"{}\" has no {} attribute", id, attribute)
            }
            BootstrapError::InvalidJson(e) => write!(f, "bootstrap payload is not valid: {}", e),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

/// Keeps setup resources alive for the life of the program
pub struct SetupGuard {
    pub log_buffer: LogBuffer,
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Run the environment setup hooks
///
/// The terminal-restoring panic hook is only needed in TUI mode. Headless
/// output goes to stdout, where escape codes would corrupt it.
pub fn app_setup(config: &Config, tui: bool) -> SetupGuard {
    Config::ensure_config_exists();
    let (log_buffer, file_guard) = logging::init(&config.logging, tui);
    install_terminal_hooks(tui);
    SetupGuard {
        log_buffer,
        _file_guard: file_guard,
    }
}

static PANIC_HOOK: Once = Once::new();

fn install_terminal_hooks(tui: bool) {
    if tui {
        install_panic_hook();
    }
}

/// Restore the terminal before the default panic output is printed
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            crate::tui::restore_terminal();
            previous(info);
        }));
    });
}

/// Extract the bootstrap payload from host page HTML
pub fn extract_payload(
    html: &str,
    element_id: &str,
    attribute: &str,
) -> std::result::Result<BootstrapData, BootstrapError> {
    let page = HostPage::new(html);
    let element = page
        .element_by_id(element_id)
        .ok_or_else(|| BootstrapError::MissingElement {
            id: element_id.to_string(),
        })?;
    let raw = element
        .attribute(attribute)
        .ok_or_else(|| BootstrapError::MissingAttribute {
            id: element_id.to_string(),
            attribute: attribute.to_string(),
        })?;
    serde_json::from_str(raw).map_err(BootstrapError::InvalidJson)
}

/// Read and parse the bootstrap payload
pub fn load_bootstrap_data(source: &BootstrapSource, config: &Config) -> Result<BootstrapData> {
    let settings = &config.bootstrap;
    tracing::info!("Loading bootstrap payload from {}", source);

    match source {
        BootstrapSource::Page(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read host page {}", path.display()))?;
            extract_payload(&html, &settings.element_id, &settings.attribute)
                .with_context(|| format!("Failed to bootstrap from {}", path.display()))
        }
        BootstrapSource::Json(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload {}", path.display()))?;
            serde_json::from_str(&json)
                .map_err(BootstrapError::InvalidJson)
                .with_context(|| format!("Failed to bootstrap from {}", path.display()))
        }
        BootstrapSource::Demo => {
            extract_payload(crate::demo::DEMO_PAGE, "app", "data-bootstrap")
                .context("Demo page is broken")
        }
    }
}

/// A store ready to be rendered
pub struct Mounted {
    pub store: DashboardStore,
    pub tasks: TaskReceiver<Action>,
    pub devtools: DevToolsHandle,
}

/// Build the dashboard store from a payload
///
/// With `persist`, devtools keeps a JSON snapshot of the state after every
/// action so a failure can report what the dashboard looked like.
pub fn create_dashboard_store(data: &BootstrapData, persist: bool) -> Result<Mounted> {
    let initial_state = get_initial_state(data)?;

    let (thunk_middleware, tasks) = thunk::<Action>();
    let (devtools_enhancer, devtools) = init_enhancer::<DashboardState, Action>(persist);
    let store = create_store(
        root_reducer,
        initial_state,
        Some(compose(vec![
            apply_middleware(vec![Rc::new(thunk_middleware) as Rc<dyn Middleware<DashboardState, Action>>]),
            devtools_enhancer,
        ])),
    );

    Ok(Mounted {
        store,
        tasks,
        devtools,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="app" data-bootstrap="{&quot;dashboard_data&quot;: {&quot;id&quot;: 4, &quot;dashboard_title&quot;: &quot;World &amp; Co&quot;}}"></div>
    </body></html>"#;

    #[test]
    fn extracts_payload_from_page() {
        let data = extract_payload(PAGE, "app", "data-bootstrap").unwrap();
        assert_eq!(data.dashboard_data.id, 4);
        assert_eq!(data.dashboard_data.dashboard_title, "World & Co");
    }

    #[test]
    fn missing_element_is_reported() {
        let err = extract_payload(PAGE, "root", "data-bootstrap").unwrap_err();
        assert!(matches!(err, BootstrapError::MissingElement { ref id } if id == "root"));
        assert!(err.to_string().contains("\"root\""));
    }

    #[test]
    fn missing_attribute_is_reported() {
        let err = extract_payload(PAGE, "app", "data-payload").unwrap_err();
        assert!(matches!(err, BootstrapError::MissingAttribute { .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        let page = r#"<div id="app" data-bootstrap="{oops"></div>"#;
        let err = extract_payload(page, "app", "data-bootstrap").unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidJson(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn demo_page_bootstraps() {
        let data = load_bootstrap_data(&BootstrapSource::Demo, &Config::default()).unwrap();
        let mounted = create_dashboard_store(&data, false).unwrap();

        let state = mounted.store.state();
        assert!(!state.slice_ids.is_empty());
        assert_eq!(state.focused_chart, None);
    }

    #[test]
    fn missing_page_file_fails() {
        let source = BootstrapSource::Page(PathBuf::from("/nonexistent/superdash/page.html"));
        let err = load_bootstrap_data(&source, &Config::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read host page"));
    }

    #[test]
    fn store_records_dispatched_actions() {
        let data = load_bootstrap_data(&BootstrapSource::Demo, &Config::default()).unwrap();
        let mounted = create_dashboard_store(&data, false).unwrap();
        let first = mounted.store.state().slice_ids[0];

        mounted.store.dispatch(Action::ToggleExpandSlice(first));

        assert!(mounted.store.state().is_expanded(first));
        assert_eq!(mounted.devtools.dispatched(), 1);
    }

    #[test]
    fn persisted_store_snapshots_state() {
        let data = load_bootstrap_data(&BootstrapSource::Demo, &Config::default()).unwrap();
        let mounted = create_dashboard_store(&data, true).unwrap();
        assert_eq!(mounted.devtools.snapshot(), None);

        mounted.store.dispatch(Action::SetEditMode(true));

        let snapshot = mounted.devtools.snapshot().expect("snapshot after dispatch");
        let state: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(state["edit_mode"], true);
        assert_eq!(state["info"]["title"], "World Bank Data");
    }

    #[test]
    fn headless_setup_leaves_panic_hook_alone() {
        install_terminal_hooks(false);

        assert!(!PANIC_HOOK.is_completed());
    }
}
