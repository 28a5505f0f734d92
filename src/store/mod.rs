//! Store - single state container for the dashboard
//!
//! A small reducer/middleware/enhancer store. The dashboard state lives in
//! one place, changes only through dispatched actions, and views read it back
//! on every frame.
//!
//! ```text
//!   dispatch(item)
//!        │
//!        ▼
//!   middleware[0] ──▶ middleware[1] ──▶ ... ──▶ reducer(&mut state, &action)
//!   (thunk: runs                                        │
//!    closures, spawns                                   ▼
//!    async tasks)                                  subscribers()
//! ```
//!
//! Enhancers get the store builder before the store exists and may wrap it
//! with more middleware. Each enhancer wraps *outside* whatever was applied
//! before it, so with `compose(vec![a, b])` the middleware from `a` sees
//! items first.

mod devtools;
mod middleware;

pub use devtools::{init_enhancer, DevToolsHandle};
pub use middleware::{apply_middleware, thunk, Middleware, Next, TaskReceiver};

use futures::future::BoxFuture;
use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::rc::Rc;

/// Pure state transition
pub type Reducer<S, A> = fn(&mut S, &A);

/// Store enhancer: transforms the builder before the store is created
pub type Enhancer<S, A> = Box<dyn FnOnce(StoreBuilder<S, A>) -> StoreBuilder<S, A>>;

/// Anything that can be handed to [`Store::dispatch_item`]
pub enum Dispatched<S, A> {
    /// Plain action, reaches the reducer
    Action(A),
    /// Synchronous closure with access to the store (needs thunk middleware)
    Thunk(Box<dyn FnOnce(&Store<S, A>)>),
    /// Async work that resolves to an action (needs thunk middleware)
    Task(BoxFuture<'static, A>),
}

impl<S, A: std::fmt::Debug> std::fmt::Debug for Dispatched<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatched::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Dispatched::Thunk(_) => f.write_str("Thunk"),
            Dispatched::Task(_) => f.write_str("Task"),
        }
    }
}

/// Handle returned by [`Store::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct StoreInner<S, A> {
    state: RefCell<S>,
    reducer: Reducer<S, A>,
    middleware: Vec<Rc<dyn Middleware<S, A>>>,
    subscribers: RefCell<Vec<(SubscriptionId, Rc<dyn Fn()>)>>,
    next_subscription: Cell<u64>,
    reducing: Cell<bool>,
}

/// Shared store handle
///
/// Clones refer to the same state. The store lives on the UI task.
pub struct Store<S, A> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: 'static, A: 'static> Store<S, A> {
    /// Current state
    ///
    /// Drop the returned guard before dispatching.
    pub fn state(&self) -> Ref<'_, S> {
        self.inner.state.borrow()
    }

    /// Dispatch a plain action
    pub fn dispatch(&self, action: A) {
        self.dispatch_item(Dispatched::Action(action));
    }

    /// Dispatch a closure that may read state and dispatch further items
    pub fn dispatch_thunk(&self, thunk: impl FnOnce(&Store<S, A>) + 'static) {
        self.dispatch_item(Dispatched::Thunk(Box::new(thunk)));
    }

    /// Dispatch async work; its resulting action is dispatched when it completes
    pub fn dispatch_task(&self, task: impl Future<Output = A> + Send + 'static) {
        self.dispatch_item(Dispatched::Task(Box::pin(task)));
    }

    /// Run an item through the middleware chain
    pub fn dispatch_item(&self, item: Dispatched<S, A>) {
        Next::new(self, &self.inner.middleware).run(item);
    }

    /// Register a listener called after every reduced action
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|(sub, _)| *sub != id);
    }

    /// Final link of the chain
    fn reduce(&self, item: Dispatched<S, A>) {
        let action = match item {
            Dispatched::Action(action) => action,
            Dispatched::Thunk(_) | Dispatched::Task(_) => {
                tracing::error!("Non-action reached the reducer; is the thunk middleware applied?");
                return;
            }
        };

        if self.inner.reducing.replace(true) {
            panic!("Reducers may not dispatch actions");
        }
        {
            let mut state = self.inner.state.borrow_mut();
            (self.inner.reducer)(&mut *state, &action);
        }
        self.inner.reducing.set(false);

        // Snapshot so listeners can subscribe/unsubscribe while being notified
        let listeners: Vec<_> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

/// Store under construction
pub struct StoreBuilder<S, A> {
    reducer: Reducer<S, A>,
    state: S,
    middleware: Vec<Rc<dyn Middleware<S, A>>>,
}

impl<S: 'static, A: 'static> StoreBuilder<S, A> {
    pub fn new(reducer: Reducer<S, A>, state: S) -> Self {
        Self {
            reducer,
            state,
            middleware: Vec::new(),
        }
    }

    /// Wrap the current chain; `middleware` sees items before everything already applied
    pub fn wrap(mut self, middleware: Rc<dyn Middleware<S, A>>) -> Self {
        self.middleware.insert(0, middleware);
        self
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    pub fn build(self) -> Store<S, A> {
        tracing::debug!(middleware = ?self.middleware_names(), "Store created");
        Store {
            inner: Rc::new(StoreInner {
                state: RefCell::new(self.state),
                reducer: self.reducer,
                middleware: self.middleware,
                subscribers: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
                reducing: Cell::new(false),
            }),
        }
    }
}

/// Create a store, optionally enhanced
pub fn create_store<S: 'static, A: 'static>(
    reducer: Reducer<S, A>,
    initial_state: S,
    enhancer: Option<Enhancer<S, A>>,
) -> Store<S, A> {
    let builder = StoreBuilder::new(reducer, initial_state);
    match enhancer {
        Some(enhance) => enhance(builder).build(),
        None => builder.build(),
    }
}

/// Combine enhancers; the first one ends up outermost
pub fn compose<S: 'static, A: 'static>(enhancers: Vec<Enhancer<S, A>>) -> Enhancer<S, A> {
    Box::new(move |builder| {
        enhancers
            .into_iter()
            .rev()
            .fold(builder, |builder, enhance| enhance(builder))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Counter {
        Add(i64),
        Reset,
    }

    fn counter(state: &mut i64, action: &Counter) {
        match action {
            Counter::Add(n) => *state += n,
            Counter::Reset => *state = 0,
        }
    }

    /// Records names of items it sees, to check chain order
    struct Recorder {
        name: &'static str,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Middleware<i64, Counter> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, _store: &Store<i64, Counter>, item: Dispatched<i64, Counter>, next: Next<'_, i64, Counter>) {
            self.seen
                .borrow_mut()
                .push(format!("{}:{:?}", self.name, item));
            next.run(item);
        }
    }

    fn recording(name: &'static str, seen: &Rc<RefCell<Vec<String>>>) -> Rc<dyn Middleware<i64, Counter>> {
        Rc::new(Recorder {
            name,
            seen: seen.clone(),
        })
    }

    #[test]
    fn plain_store_reduces_actions() {
        let store = create_store(counter, 1, None);
        store.dispatch(Counter::Add(4));
        assert_eq!(*store.state(), 5);
        store.dispatch(Counter::Reset);
        assert_eq!(*store.state(), 0);
    }

    #[test]
    fn thunk_without_middleware_is_dropped() {
        let store = create_store(counter, 0, None);
        store.dispatch_thunk(|s| s.dispatch(Counter::Add(1)));
        assert_eq!(*store.state(), 0);
    }

    #[test]
    fn subscribers_run_after_each_action() {
        let store = create_store(counter, 0, None);
        let observed = Rc::new(RefCell::new(Vec::new()));

        let reader = store.clone();
        let sink = observed.clone();
        let id = store.subscribe(move || sink.borrow_mut().push(*reader.state()));

        store.dispatch(Counter::Add(2));
        store.dispatch(Counter::Add(3));
        store.unsubscribe(id);
        store.dispatch(Counter::Add(4));

        assert_eq!(*observed.borrow(), vec![2, 5]);
    }

    #[test]
    fn compose_puts_first_enhancer_outermost() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let enhancer = compose(vec![
            apply_middleware(vec![recording("outer", &seen)]),
            apply_middleware(vec![recording("inner", &seen)]),
        ]);
        let store = create_store(counter, 0, Some(enhancer));

        store.dispatch(Counter::Add(1));

        assert_eq!(
            *seen.borrow(),
            vec!["outer:Action(Add(1))", "inner:Action(Add(1))"]
        );
        assert_eq!(*store.state(), 1);
    }

    #[test]
    fn apply_middleware_keeps_argument_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let builder = apply_middleware(vec![recording("a", &seen), recording("b", &seen)])(
            StoreBuilder::new(counter, 0),
        );
        assert_eq!(builder.middleware_names(), vec!["a", "b"]);
    }

    #[test]
    fn dispatch_from_subscriber_is_allowed() {
        let store = create_store(counter, 0, None);
        let inner = store.clone();
        store.subscribe(move || {
            if *inner.state() == 1 {
                inner.dispatch(Counter::Add(10));
            }
        });

        store.dispatch(Counter::Add(1));
        assert_eq!(*store.state(), 11);
    }
}
