//! Capabilities a host runtime provides to embedded widgets.
//!
//! ## Overview
//!
//! A widget never owns the document it lives in. Everything it needs from the
//! environment is expressed as three traits:
//!
//! - [`Document`]: element lookup, attributes, styles, geometry and event
//!   listeners.
//! - [`Timers`]: deferred, cancellable tasks.
//! - [`EnvironmentWatcher`]: size and presence observation for an element.
//!
//! [`Host`] is implemented for every type providing all three, so widgets can
//! hold a single `Arc<dyn Host>`.
//!
//! Implementations must not call back into listeners, timer tasks or watcher
//! callbacks while holding internal locks: widgets re-enter the host from those
//! callbacks. Writes such as [`Document::set_style`] may report a resize to
//! watchers before returning. A task handed to [`Timers::set_timeout`] never
//! runs before that call returns.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use crate::{
    event::{EventKind, HostEvent, Observation},
    geometry::Rect,
    prop::{Callback, CallbackWith},
};

/// Opaque handle to an element of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wraps a host-specific raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The host-specific raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Process-unique identity of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle returned by [`Document::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle returned by [`Timers::set_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Handle returned by [`EnvironmentWatcher::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// A single element; bubbling events from descendants reach it too.
    Element(ElementId),
    /// The document itself, reached last by every bubbling event.
    Document,
}

/// An event listener.
pub type Listener = CallbackWith<HostEvent>;

/// Element tree access.
pub trait Document: Send + Sync {
    /// Identity of this document.
    fn id(&self) -> DocumentId;

    /// All connected elements matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<ElementId>;

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId>;

    /// Creates an element and appends it to `parent`.
    fn create_element(&self, parent: ElementId, tag: &str) -> ElementId;

    /// Reads an attribute.
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// Writes an attribute.
    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    /// Whether `element` carries `class`.
    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Adds or removes `class`.
    fn toggle_class(&self, element: ElementId, class: &str, enabled: bool);

    /// Replaces the text content.
    fn set_text(&self, element: ElementId, text: &str);

    /// Writes an inline style property.
    fn set_style(&self, element: ElementId, property: &str, value: &str);

    /// The element's current bounding box in document coordinates.
    fn bounding_rect(&self, element: ElementId) -> Rect;

    /// Whether the element is connected and not hidden.
    fn is_rendered(&self, element: ElementId) -> bool;

    /// Registers a listener.
    fn add_listener(&self, target: EventTarget, kind: EventKind, listener: Listener)
    -> ListenerId;

    /// Removes a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Delivers `event` to its target and, if it bubbles, to the target's
    /// ancestors and the document.
    fn dispatch(&self, event: HostEvent);
}

/// Deferred task execution.
pub trait Timers: Send + Sync {
    /// Runs `task` once after `delay` unless cleared first.
    fn set_timeout(&self, delay: Duration, task: Callback) -> TimerId;

    /// Cancels a pending task. Clearing an unknown or fired id is a no-op.
    fn clear_timeout(&self, id: TimerId);
}

/// Size and presence observation.
pub trait EnvironmentWatcher: Send + Sync {
    /// Invokes `on_change` whenever `element` is resized or removed.
    fn observe(&self, element: ElementId, on_change: CallbackWith<Observation>) -> WatchId;

    /// Ends an observation. Unknown ids are ignored.
    fn unobserve(&self, id: WatchId);
}

/// Everything a widget needs from its environment.
pub trait Host: Document + Timers + EnvironmentWatcher {}

impl<T> Host for T where T: Document + Timers + EnvironmentWatcher + ?Sized {}
