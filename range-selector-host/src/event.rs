//! Input and notification events exchanged with the host document.
//!
//! Mouse and touch input share [`PointerEvent`]; the [`PointerKind`] only
//! records where it came from. Keyboard input carries the logical [`Key`].

use crate::{document::ElementId, geometry::Rect};

/// Source device of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    /// Mouse or pen.
    #[default]
    Mouse,
    /// Touch contact.
    Touch,
}

/// Phase of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// Button pressed or finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released or finger lifted.
    Up,
    /// The platform aborted the gesture.
    Cancel,
}

/// A pointer or touch event. Only the horizontal document coordinate is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub kind: PointerKind,
    pub x: f64,
    /// Element the pointer was over when the event fired.
    pub target: ElementId,
}

/// Logical keys the widget reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    /// Any other key, by its logical name.
    Other(String),
}

/// A key press delivered to the focused element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub target: ElementId,
}

/// A completed click or tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub x: f64,
    pub target: ElementId,
}

/// A named application event carrying a `(from, to)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    pub name: String,
    pub target: ElementId,
    pub detail: (f64, f64),
    /// Whether the event propagates to ancestors after `target`.
    pub bubbles: bool,
}

impl CustomEvent {
    /// Creates a bubbling event.
    pub fn bubbling(name: impl Into<String>, target: ElementId, detail: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            target,
            detail,
            bubbles: true,
        }
    }
}

/// Every event a host dispatches to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
    Click(ClickEvent),
    Custom(CustomEvent),
}

impl HostEvent {
    /// The listener kind this event is delivered to.
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Pointer(event) => match event.phase {
                PointerPhase::Down => EventKind::PointerDown,
                PointerPhase::Move => EventKind::PointerMove,
                PointerPhase::Up => EventKind::PointerUp,
                PointerPhase::Cancel => EventKind::PointerCancel,
            },
            HostEvent::Key(_) => EventKind::KeyDown,
            HostEvent::Click(_) => EventKind::Click,
            HostEvent::Custom(event) => EventKind::Custom(event.name.clone()),
        }
    }

    /// The element the event was fired at.
    pub fn target(&self) -> ElementId {
        match self {
            HostEvent::Pointer(event) => event.target,
            HostEvent::Key(event) => event.target,
            HostEvent::Click(event) => event.target,
            HostEvent::Custom(event) => event.target,
        }
    }

    /// Whether the event propagates to ancestors of its target.
    pub fn bubbles(&self) -> bool {
        match self {
            HostEvent::Custom(event) => event.bubbles,
            _ => true,
        }
    }
}

/// Listener registration key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    KeyDown,
    Click,
    Custom(String),
}

/// What an environment watcher observed about an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The element's box changed; carries the new box.
    Resized(Rect),
    /// The element is no longer part of the document.
    Removed,
}
