//! Popover menu container with click-driven focus tracking
//!
//! `WithPopoverMenu` wraps a panel's content and shows a popover menu while the
//! panel is "focused". Focus here means the container currently owns
//! outside-click detection. It has nothing to do with keyboard focus.
//!
//! # State machine
//!
//! ```text
//!                 should_focus == true
//!   UNFOCUSED ─────────────────────────────▶ FOCUSED
//!       ▲         add capture listeners          │
//!       │         on_change_focus(true)          │
//!       │                                        │
//!       └────────────────────────────────────────┘
//!                 should_focus == false
//!                 remove capture listeners
//!                 on_change_focus(false)
//! ```
//!
//! Every other combination is a no-op and fires no callback.
//!
//! Document-level capture listeners for `click` and `drag` exist only while
//! the container is focused, so the number of global listeners tracks the
//! number of focused containers rather than the number of containers.
//!
//! A bubbling click on the container root runs the same handler (unless
//! `disable_click` is set). This is how an unfocused container becomes
//! focused: it has no capture listener to see the click with.

use super::document::{Document, EventKind, ListenerId, NodeId, PointerEvent};

/// Root class of every container
pub const CLASS_NAME: &str = "with-popover-menu";
/// Extra class while focused
pub const FOCUSED_CLASS_NAME: &str = "with-popover-menu--focused";

/// Decides whether an event counts as "inside" the container
pub type ShouldFocus = Box<dyn Fn(&PointerEvent, &BoundingElement<'_>) -> bool>;

/// Notified on every focus transition
pub type OnChangeFocus = Box<dyn FnMut(bool)>;

/// Non-owning view of the container's rendered root element
pub struct BoundingElement<'a> {
    document: &'a Document,
    node: Option<NodeId>,
}

impl BoundingElement<'_> {
    /// Whether `target` is the root element or inside it
    ///
    /// Before mount there is no element, so nothing is inside.
    pub fn contains(&self, target: Option<NodeId>) -> bool {
        match self.node {
            Some(node) => self.document.contains(node, target),
            None => false,
        }
    }
}

/// Default focus predicate: the event target is inside the bounding element
pub fn target_inside(event: &PointerEvent, container: &BoundingElement<'_>) -> bool {
    container.contains(event.target)
}

/// Result of feeding an event to the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTransition {
    Gained,
    Lost,
    Unchanged,
}

/// Construction options
pub struct PopoverOptions<N> {
    pub children: Vec<N>,
    /// Ignore bubbling clicks on the root element
    pub disable_click: bool,
    pub menu_items: Vec<N>,
    pub on_change_focus: Option<OnChangeFocus>,
    pub is_focused: bool,
    pub should_focus: ShouldFocus,
}

impl<N> Default for PopoverOptions<N> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            disable_click: false,
            menu_items: Vec::new(),
            on_change_focus: None,
            is_focused: false,
            should_focus: Box::new(target_inside),
        }
    }
}

/// A rendered menu entry
#[derive(Debug, PartialEq, Eq)]
pub struct MenuEntry<'a, N> {
    /// Stable identity derived from position: `menu-item-{index}`
    pub key: String,
    pub index: usize,
    pub node: &'a N,
}

/// Render output of the container
#[derive(Debug)]
pub struct PopoverView<'a, N> {
    pub class_name: String,
    pub children: &'a [N],
    /// `None` unless focused with at least one menu item
    pub menu: Option<Vec<MenuEntry<'a, N>>>,
}

impl<N> PopoverView<'_, N> {
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name.split_whitespace().any(|c| c == class)
    }
}

/// Focus-tracking container with a popover menu
pub struct WithPopoverMenu<N> {
    id: ListenerId,
    document: Document,
    container: Option<NodeId>,
    focused: bool,
    children: Vec<N>,
    menu_items: Vec<N>,
    disable_click: bool,
    on_change_focus: Option<OnChangeFocus>,
    should_focus: ShouldFocus,
}

impl<N> WithPopoverMenu<N> {
    /// Create a container bound to `document`
    ///
    /// `id` must be unique among the document's listeners. Nothing is
    /// registered until [`mount`](Self::mount).
    pub fn new(document: &Document, id: ListenerId, options: PopoverOptions<N>) -> Self {
        Self {
            id,
            document: document.clone(),
            container: None,
            focused: options.is_focused,
            children: options.children,
            menu_items: options.menu_items,
            disable_click: options.disable_click,
            on_change_focus: options.on_change_focus,
            should_focus: options.should_focus,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Attach to a rendered root element
    ///
    /// Installs the root click handler and, for a container created focused,
    /// the document listeners.
    pub fn mount(&mut self, node: NodeId) {
        if let Some(previous) = self.container.replace(node) {
            if previous != node {
                self.document.set_click_handler(previous, None);
            }
        }
        self.sync_click_handler();
        if self.focused {
            self.attach_listeners();
        }
    }

    /// Detach from the document
    ///
    /// Removes both listeners whatever the current state. Safe to call more
    /// than once.
    pub fn unmount(&mut self) {
        self.detach_listeners();
        if let Some(node) = self.container.take() {
            self.document.set_click_handler(node, None);
        }
    }

    /// Handle a click or drag delivered by the document
    pub fn handle_event(&mut self, event: &PointerEvent) -> FocusTransition {
        let should_focus = (self.should_focus)(event, &self.bounding_element());

        if should_focus && !self.focused {
            // Capture later clicks anywhere so an outside click can release focus
            self.attach_listeners();
            self.focused = true;
            tracing::trace!(listener = self.id.0, "popover focused");
            if let Some(on_change_focus) = self.on_change_focus.as_mut() {
                on_change_focus(true);
            }
            FocusTransition::Gained
        } else if !should_focus && self.focused {
            self.detach_listeners();
            self.focused = false;
            tracing::trace!(listener = self.id.0, "popover unfocused");
            if let Some(on_change_focus) = self.on_change_focus.as_mut() {
                on_change_focus(false);
            }
            FocusTransition::Lost
        } else {
            FocusTransition::Unchanged
        }
    }

    /// Apply an externally requested focus flag
    ///
    /// Only `true` is mirrored: it registers the listeners and adopts the
    /// focused state without firing `on_change_focus`. A request for `false`
    /// while focused is ignored; only an outside event releases focus.
    pub fn set_is_focused(&mut self, is_focused: bool) {
        if is_focused && !self.focused {
            self.attach_listeners();
            self.focused = true;
        }
    }

    pub fn set_menu_items(&mut self, menu_items: Vec<N>) {
        self.menu_items = menu_items;
    }

    #[cfg(test)]
    pub fn set_disable_click(&mut self, disable_click: bool) {
        self.disable_click = disable_click;
        self.sync_click_handler();
    }

    pub fn bounding_element(&self) -> BoundingElement<'_> {
        BoundingElement {
            document: &self.document,
            node: self.container,
        }
    }

    /// Describe what should be drawn
    pub fn render(&self) -> PopoverView<'_, N> {
        let class_name = if self.focused {
            format!("{} {}", CLASS_NAME, FOCUSED_CLASS_NAME)
        } else {
            CLASS_NAME.to_string()
        };

        let menu = (self.focused && !self.menu_items.is_empty()).then(|| {
            self.menu_items
                .iter()
                .enumerate()
                .map(|(index, node)| MenuEntry {
                    key: format!("menu-item-{}", index),
                    index,
                    node,
                })
                .collect()
        });

        PopoverView {
            class_name,
            children: &self.children,
            menu,
        }
    }

    fn sync_click_handler(&self) {
        if let Some(node) = self.container {
            let handler = (!self.disable_click).then_some(self.id);
            self.document.set_click_handler(node, handler);
        }
    }

    fn attach_listeners(&self) {
        self.document
            .add_event_listener(EventKind::Click, self.id, true);
        self.document
            .add_event_listener(EventKind::Drag, self.id, true);
    }

    fn detach_listeners(&self) {
        self.document
            .remove_event_listener(EventKind::Click, self.id, true);
        self.document
            .remove_event_listener(EventKind::Drag, self.id, true);
    }
}

impl<N> Drop for WithPopoverMenu<N> {
    fn drop(&mut self) {
        self.unmount();
    }
}
