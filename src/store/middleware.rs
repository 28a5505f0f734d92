//! Middleware chain and the thunk middleware
//!
//! Middleware sees every dispatched item before the reducer does. It can pass
//! the item on with [`Next::run`], swallow it, or dispatch something else.

use super::{Dispatched, Enhancer, Store};
use std::rc::Rc;
use tokio::sync::mpsc;

/// A link in the dispatch chain
pub trait Middleware<S, A> {
    /// Short name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Handle one dispatched item; call `next.run(item)` to pass it on
    fn handle(&self, store: &Store<S, A>, item: Dispatched<S, A>, next: Next<'_, S, A>);
}

/// The rest of the chain after the current middleware
pub struct Next<'a, S, A> {
    store: &'a Store<S, A>,
    chain: &'a [Rc<dyn Middleware<S, A>>],
}

impl<'a, S: 'static, A: 'static> Next<'a, S, A> {
    pub(super) fn new(store: &'a Store<S, A>, chain: &'a [Rc<dyn Middleware<S, A>>]) -> Self {
        Self { store, chain }
    }

    /// Hand the item to the next middleware, or to the reducer at the end
    pub fn run(self, item: Dispatched<S, A>) {
        match self.chain.split_first() {
            Some((first, rest)) => first.handle(self.store, item, Next::new(self.store, rest)),
            None => self.store.reduce(item),
        }
    }
}

/// Enhancer that wraps the store with `middleware`, first element outermost
pub fn apply_middleware<S: 'static, A: 'static>(
    middleware: Vec<Rc<dyn Middleware<S, A>>>,
) -> Enhancer<S, A> {
    Box::new(move |builder| {
        middleware
            .into_iter()
            .rev()
            .fold(builder, |builder, m| builder.wrap(m))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Thunk middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Runs `Thunk` items in place and spawns `Task` items on tokio
///
/// Task results come back through a channel. The UI loop owns the
/// [`TaskReceiver`] and dispatches whatever arrives, which keeps all state
/// changes on the UI task.
pub struct ThunkMiddleware<A> {
    results: mpsc::UnboundedSender<A>,
}

/// Receiving end for completed async tasks
pub struct TaskReceiver<A> {
    results: mpsc::UnboundedReceiver<A>,
}

/// Create the thunk middleware and the receiver for its task results
pub fn thunk<A>() -> (ThunkMiddleware<A>, TaskReceiver<A>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ThunkMiddleware { results: tx }, TaskReceiver { results: rx })
}

impl<S: 'static, A: Send + 'static> Middleware<S, A> for ThunkMiddleware<A> {
    fn name(&self) -> &'static str {
        "thunk"
    }

    fn handle(&self, store: &Store<S, A>, item: Dispatched<S, A>, next: Next<'_, S, A>) {
        match item {
            Dispatched::Thunk(thunk) => thunk(store),
            Dispatched::Task(task) => {
                let results = self.results.clone();
                tokio::spawn(async move {
                    let action = task.await;
                    // Receiver gone means the UI is shutting down
                    let _ = results.send(action);
                });
            }
            action @ Dispatched::Action(_) => next.run(action),
        }
    }
}

impl<A: 'static> TaskReceiver<A> {
    /// Wait for the next completed task
    pub async fn recv(&mut self) -> Option<A> {
        self.results.recv().await
    }

    /// Dispatch every result that is already available; returns how many
    pub fn drain_into<S: 'static>(&mut self, store: &Store<S, A>) -> usize {
        let mut count = 0;
        while let Ok(action) = self.results.try_recv() {
            store.dispatch(action);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_store;
    use std::time::Duration;

    #[derive(Debug)]
    enum Msg {
        Set(u32),
        Loaded(u32),
    }

    fn reducer(state: &mut Vec<String>, msg: &Msg) {
        state.push(format!("{:?}", msg));
    }

    #[test]
    fn thunks_can_read_state_and_dispatch() {
        let (middleware, _tasks) = thunk::<Msg>();
        let store = create_store(
            reducer,
            Vec::new(),
            Some(apply_middleware(vec![
                Rc::new(middleware) as Rc<dyn Middleware<Vec<String>, Msg>>
            ])),
        );

        store.dispatch_thunk(|store| {
            store.dispatch(Msg::Set(1));
            let seen = store.state().len() as u32;
            store.dispatch(Msg::Set(seen + 1));
        });

        assert_eq!(*store.state(), vec!["Set(1)", "Set(2)"]);
    }

    #[tokio::test]
    async fn tasks_come_back_through_the_receiver() {
        let (middleware, mut tasks) = thunk::<Msg>();
        let store = create_store(
            reducer,
            Vec::new(),
            Some(apply_middleware(vec![
                Rc::new(middleware) as Rc<dyn Middleware<Vec<String>, Msg>>
            ])),
        );

        store.dispatch_task(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Msg::Loaded(7)
        });
        // Nothing reduced until the UI loop hands the result back
        assert!(store.state().is_empty());

        let action = tasks.recv().await.expect("task result");
        store.dispatch(action);
        assert_eq!(*store.state(), vec!["Loaded(7)"]);
        assert_eq!(tasks.drain_into(&store), 0);
    }
}
