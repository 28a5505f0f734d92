//! Development enhancer - action log and optional state snapshots
//!
//! Every plain action is logged at debug level and kept in a bounded history
//! that the TUI can show. With `persist` on, the state is also serialized
//! after each action so the last known state survives a crash report.

use super::{Dispatched, Enhancer, Middleware, Next, Store};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Maximum number of actions kept in history
const MAX_HISTORY: usize = 200;

#[derive(Debug, Default)]
struct DevToolsState {
    history: VecDeque<String>,
    snapshot: Option<String>,
    dispatched: u64,
}

/// Read access to what the enhancer recorded
#[derive(Debug, Clone, Default)]
pub struct DevToolsHandle {
    state: Rc<RefCell<DevToolsState>>,
}

impl DevToolsHandle {
    /// Recorded actions, oldest first
    #[cfg(test)]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.iter().cloned().collect()
    }

    /// Most recent action, if any
    pub fn last_action(&self) -> Option<String> {
        self.state.borrow().history.back().cloned()
    }

    /// Total actions seen (not capped by history size)
    pub fn dispatched(&self) -> u64 {
        self.state.borrow().dispatched
    }

    /// Last persisted state as JSON (only with `persist`)
    pub fn snapshot(&self) -> Option<String> {
        self.state.borrow().snapshot.clone()
    }
}

struct DevTools {
    persist: bool,
    handle: DevToolsHandle,
}

impl<S, A> Middleware<S, A> for DevTools
where
    S: Serialize + 'static,
    A: std::fmt::Debug + 'static,
{
    fn name(&self) -> &'static str {
        "devtools"
    }

    fn handle(&self, store: &Store<S, A>, item: Dispatched<S, A>, next: Next<'_, S, A>) {
        let action = match item {
            Dispatched::Action(action) => action,
            other => return next.run(other),
        };

        let label = format!("{:?}", action);
        tracing::debug!(action = %label, "dispatch");
        {
            let mut state = self.handle.state.borrow_mut();
            if state.history.len() >= MAX_HISTORY {
                state.history.pop_front();
            }
            state.history.push_back(label);
            state.dispatched += 1;
        }

        next.run(Dispatched::Action(action));

        if self.persist {
            match serde_json::to_string(&*store.state()) {
                Ok(json) => self.handle.state.borrow_mut().snapshot = Some(json),
                Err(e) => tracing::warn!("Failed to snapshot state: {}", e),
            }
        }
    }
}

/// Create the development enhancer
///
/// Returns the enhancer together with a handle to its recordings.
pub fn init_enhancer<S, A>(persist: bool) -> (Enhancer<S, A>, DevToolsHandle)
where
    S: Serialize + 'static,
    A: std::fmt::Debug + 'static,
{
    let handle = DevToolsHandle::default();
    let devtools = DevTools {
        persist,
        handle: handle.clone(),
    };
    let enhancer: Enhancer<S, A> = Box::new(move |builder| builder.wrap(Rc::new(devtools)));
    (enhancer, handle)
}
