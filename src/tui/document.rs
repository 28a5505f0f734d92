//! Document model - element tree, hit testing and event routing
//!
//! The terminal has no DOM, so the TUI keeps a small element tree of its own.
//! Views register an element for everything that needs to be hit-tested
//! (panels, popover menu entries) and update its bounds every frame.
//!
//! Mouse input is resolved to a target element with [`Document::hit_test`],
//! then [`Document::route`] produces the delivery order:
//!
//! ```text
//!   capture   document-level capture listeners (registration order)
//!      │
//!   target    click handler on the hit element
//!      │
//!   bubble    click handlers on each ancestor, then non-capture
//!             document listeners
//! ```
//!
//! The capture list is snapshotted before delivery, so a listener added by a
//! handler during routing only sees the *next* event.

use ratatui::layout::{Position, Rect};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Handle to an element in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Identity of an event listener
///
/// Owners pick their own id. Registering the same (kind, id, capture)
/// triple twice is a no-op, like `addEventListener` with the same function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Pointer event types the document routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Drag,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Drag => "drag",
        }
    }
}

/// A pointer event resolved against the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: EventKind,
    pub column: u16,
    pub row: u16,
    /// Deepest element under the pointer, `None` for empty document space
    pub target: Option<NodeId>,
}

/// Delivery phase of a routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Target,
    Bubble,
}

/// One step of a routed event: which listener runs, and in which phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub phase: Phase,
    pub listener: ListenerId,
    /// Element the handler is attached to (`None` for document listeners)
    pub node: Option<NodeId>,
}

#[derive(Debug)]
struct Element {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bounds: Rect,
    visible: bool,
    z: u16,
    click_handler: Option<ListenerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    kind: EventKind,
    listener: ListenerId,
    capture: bool,
}

#[derive(Debug, Default)]
struct DocumentInner {
    next_node: u64,
    elements: HashMap<NodeId, Element>,
    listeners: Vec<Registration>,
}

/// Shared handle to the document
///
/// Cloning is cheap and every clone refers to the same tree. The document
/// lives on the UI task only.
#[derive(Debug, Clone, Default)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Element tree ───────────────────────────────────────────────

    /// Create an element under `parent` (or at the root)
    pub fn create_element(&self, parent: Option<NodeId>) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        inner.next_node += 1;
        let id = NodeId(inner.next_node);

        inner.elements.insert(
            id,
            Element {
                parent,
                children: Vec::new(),
                bounds: Rect::default(),
                visible: true,
                z: 0,
                click_handler: None,
            },
        );
        if let Some(parent) = parent.and_then(|p| inner.elements.get_mut(&p)) {
            parent.children.push(id);
        }
        id
    }

    /// Remove an element and its whole subtree
    ///
    /// Click handlers attached to removed elements go with them. Document
    /// listeners are not tied to elements and stay registered.
    pub fn remove_element(&self, id: NodeId) {
        let mut inner = self.inner.borrow_mut();

        let parent = match inner.elements.get(&id) {
            Some(element) => element.parent,
            None => return,
        };
        if let Some(parent) = parent {
            if let Some(parent) = inner.elements.get_mut(&parent) {
                parent.children.retain(|c| *c != id);
            }
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(removed) = inner.elements.remove(&next) {
                pending.extend(removed.children);
            }
        }
    }

    #[cfg(test)]
    pub fn exists(&self, id: NodeId) -> bool {
        self.inner.borrow().elements.contains_key(&id)
    }

    #[cfg(test)]
    pub fn element_count(&self) -> usize {
        self.inner.borrow().elements.len()
    }

    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .elements
            .get(&parent)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    /// Make `parent` have exactly `count` children, creating or removing from the end
    pub fn ensure_children(&self, parent: NodeId, count: usize) -> Vec<NodeId> {
        let existing = self.children(parent);

        if existing.len() > count {
            for surplus in &existing[count..] {
                self.remove_element(*surplus);
            }
        } else {
            for _ in existing.len()..count {
                self.create_element(Some(parent));
            }
        }
        self.children(parent)
    }

    pub fn set_bounds(&self, id: NodeId, bounds: Rect) {
        if let Some(element) = self.inner.borrow_mut().elements.get_mut(&id) {
            element.bounds = bounds;
        }
    }

    #[cfg(test)]
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.inner.borrow().elements.get(&id).map(|e| e.bounds)
    }

    pub fn set_visible(&self, id: NodeId, visible: bool) {
        if let Some(element) = self.inner.borrow_mut().elements.get_mut(&id) {
            element.visible = visible;
        }
    }

    /// Stacking layer; higher layers win hit tests over lower ones
    pub fn set_z(&self, id: NodeId, z: u16) {
        if let Some(element) = self.inner.borrow_mut().elements.get_mut(&id) {
            element.z = z;
        }
    }

    /// Whether `node` is `ancestor` or one of its descendants
    ///
    /// Mirrors `Node.contains`: an element contains itself, and a missing
    /// node is contained by nothing.
    pub fn contains(&self, ancestor: NodeId, node: Option<NodeId>) -> bool {
        let inner = self.inner.borrow();
        let mut current = node;

        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = inner.elements.get(&id).and_then(|e| e.parent);
        }
        false
    }

    /// Deepest rendered element under the given cell
    ///
    /// Candidates are ranked by (z, depth, creation order). An element is
    /// rendered only if it and all of its ancestors are visible.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let point = Position::new(column, row);

        inner
            .elements
            .iter()
            .filter(|(_, e)| e.bounds.contains(point))
            .filter_map(|(id, e)| {
                let depth = inner.rendered_depth(*id)?;
                Some((e.z, depth, *id))
            })
            .max()
            .map(|(_, _, id)| id)
    }

    /// Build a pointer event with its target resolved by hit testing
    pub fn pointer_event(&self, kind: EventKind, column: u16, row: u16) -> PointerEvent {
        PointerEvent {
            kind,
            column,
            row,
            target: self.hit_test(column, row),
        }
    }

    // ─── Listeners ──────────────────────────────────────────────────

    /// Register a document-level listener. Returns false if already present.
    pub fn add_event_listener(&self, kind: EventKind, listener: ListenerId, capture: bool) -> bool {
        let registration = Registration {
            kind,
            listener,
            capture,
        };
        let mut inner = self.inner.borrow_mut();

        if inner.listeners.contains(&registration) {
            return false;
        }
        inner.listeners.push(registration);
        true
    }

    /// Remove a document-level listener. Returns false if it was not registered.
    pub fn remove_event_listener(
        &self,
        kind: EventKind,
        listener: ListenerId,
        capture: bool,
    ) -> bool {
        let registration = Registration {
            kind,
            listener,
            capture,
        };
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();

        inner.listeners.retain(|r| *r != registration);
        inner.listeners.len() != before
    }

    #[cfg(test)]
    pub fn has_event_listener(&self, kind: EventKind, listener: ListenerId, capture: bool) -> bool {
        self.inner.borrow().listeners.contains(&Registration {
            kind,
            listener,
            capture,
        })
    }

    /// Number of document-level listeners currently registered
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Attach (or clear) the bubbling click handler of an element
    pub fn set_click_handler(&self, node: NodeId, handler: Option<ListenerId>) {
        if let Some(element) = self.inner.borrow_mut().elements.get_mut(&node) {
            element.click_handler = handler;
        }
    }

    #[cfg(test)]
    pub fn click_handler(&self, node: NodeId) -> Option<ListenerId> {
        self.inner
            .borrow()
            .elements
            .get(&node)
            .and_then(|e| e.click_handler)
    }

    /// Compute the delivery order for an event
    pub fn route(&self, event: &PointerEvent) -> Vec<Dispatch> {
        let inner = self.inner.borrow();
        let mut route: Vec<Dispatch> = inner
            .listeners
            .iter()
            .filter(|r| r.capture && r.kind == event.kind)
            .map(|r| Dispatch {
                phase: Phase::Capture,
                listener: r.listener,
                node: None,
            })
            .collect();

        // Element handlers only exist for clicks
        if event.kind == EventKind::Click {
            let mut current = event.target;
            let mut phase = Phase::Target;

            while let Some(id) = current {
                let Some(element) = inner.elements.get(&id) else {
                    break;
                };
                if let Some(listener) = element.click_handler {
                    route.push(Dispatch {
                        phase,
                        listener,
                        node: Some(id),
                    });
                }
                phase = Phase::Bubble;
                current = element.parent;
            }
        }

        route.extend(
            inner
                .listeners
                .iter()
                .filter(|r| !r.capture && r.kind == event.kind)
                .map(|r| Dispatch {
                    phase: Phase::Bubble,
                    listener: r.listener,
                    node: None,
                }),
        );
        route
    }
}

impl DocumentInner {
    /// Depth of a rendered element, `None` if it or an ancestor is hidden
    fn rendered_depth(&self, id: NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut current = Some(id);

        while let Some(next) = current {
            let element = self.elements.get(&next)?;
            if !element.visible {
                return None;
            }
            depth += 1;
            current = element.parent;
        }
        Some(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_walks_ancestors() {
        let doc = Document::new();
        let root = doc.create_element(None);
        let child = doc.create_element(Some(root));
        let grandchild = doc.create_element(Some(child));
        let other = doc.create_element(None);

        assert!(doc.contains(root, Some(root)));
        assert!(doc.contains(root, Some(grandchild)));
        assert!(!doc.contains(child, Some(root)));
        assert!(!doc.contains(root, Some(other)));
        assert!(!doc.contains(root, None));
    }

    #[test]
    fn hit_test_prefers_deepest_then_highest_layer() {
        let doc = Document::new();
        let panel = doc.create_element(None);
        doc.set_bounds(panel, Rect::new(0, 0, 20, 10));
        let body = doc.create_element(Some(panel));
        doc.set_bounds(body, Rect::new(1, 1, 18, 8));

        assert_eq!(doc.hit_test(2, 2), Some(body));
        assert_eq!(doc.hit_test(0, 0), Some(panel));
        assert_eq!(doc.hit_test(30, 30), None);

        // Overlay from another panel on a higher layer wins despite being shallower
        let overlay = doc.create_element(None);
        doc.set_bounds(overlay, Rect::new(2, 2, 5, 3));
        doc.set_z(overlay, 1);
        assert_eq!(doc.hit_test(3, 3), Some(overlay));
    }

    #[test]
    fn hidden_subtrees_are_not_hit() {
        let doc = Document::new();
        let panel = doc.create_element(None);
        doc.set_bounds(panel, Rect::new(0, 0, 10, 10));
        let menu = doc.create_element(Some(panel));
        doc.set_bounds(menu, Rect::new(0, 0, 5, 5));
        let entry = doc.create_element(Some(menu));
        doc.set_bounds(entry, Rect::new(0, 0, 5, 1));

        doc.set_visible(menu, false);
        assert_eq!(doc.hit_test(1, 0), Some(panel));

        doc.set_visible(menu, true);
        assert_eq!(doc.hit_test(1, 0), Some(entry));
    }

    #[test]
    fn listeners_are_deduplicated_and_removal_is_idempotent() {
        let doc = Document::new();
        let id = ListenerId(7);

        assert!(doc.add_event_listener(EventKind::Click, id, true));
        assert!(!doc.add_event_listener(EventKind::Click, id, true));
        // Capture and bubble registrations are distinct
        assert!(doc.add_event_listener(EventKind::Click, id, false));
        assert_eq!(doc.listener_count(), 2);

        assert!(doc.remove_event_listener(EventKind::Click, id, true));
        assert!(!doc.remove_event_listener(EventKind::Click, id, true));
        assert!(!doc.remove_event_listener(EventKind::Drag, id, true));
        assert_eq!(doc.listener_count(), 1);
    }

    #[test]
    fn route_orders_capture_target_bubble() {
        let doc = Document::new();
        let outer = doc.create_element(None);
        let inner = doc.create_element(Some(outer));
        doc.set_click_handler(outer, Some(ListenerId(1)));
        doc.set_click_handler(inner, Some(ListenerId(2)));
        doc.add_event_listener(EventKind::Click, ListenerId(3), false);
        doc.add_event_listener(EventKind::Click, ListenerId(4), true);
        doc.add_event_listener(EventKind::Drag, ListenerId(5), true);

        let event = PointerEvent {
            kind: EventKind::Click,
            column: 0,
            row: 0,
            target: Some(inner),
        };
        let route = doc.route(&event);
        let order: Vec<_> = route.iter().map(|d| (d.phase, d.listener.0)).collect();

        assert_eq!(
            order,
            vec![
                (Phase::Capture, 4),
                (Phase::Target, 2),
                (Phase::Bubble, 1),
                (Phase::Bubble, 3),
            ]
        );
    }

    #[test]
    fn drag_skips_element_click_handlers() {
        let doc = Document::new();
        let panel = doc.create_element(None);
        doc.set_click_handler(panel, Some(ListenerId(1)));
        doc.add_event_listener(EventKind::Drag, ListenerId(2), true);

        let event = PointerEvent {
            kind: EventKind::Drag,
            column: 0,
            row: 0,
            target: Some(panel),
        };
        let route = doc.route(&event);

        assert_eq!(route.len(), 1);
        assert_eq!(route[0].listener, ListenerId(2));
    }

    #[test]
    fn ensure_children_grows_and_shrinks() {
        let doc = Document::new();
        let menu = doc.create_element(None);

        let first = doc.ensure_children(menu, 3);
        assert_eq!(first.len(), 3);

        let shrunk = doc.ensure_children(menu, 1);
        assert_eq!(shrunk, vec![first[0]]);
        assert!(!doc.exists(first[2]));

        let grown = doc.ensure_children(menu, 2);
        assert_eq!(grown[0], first[0]);
        assert_eq!(grown.len(), 2);
    }

    #[test]
    fn remove_element_drops_subtree() {
        let doc = Document::new();
        let root = doc.create_element(None);
        let child = doc.create_element(Some(root));
        doc.create_element(Some(child));

        doc.remove_element(child);

        assert_eq!(doc.element_count(), 1);
        assert!(doc.children(root).is_empty());
    }
}
