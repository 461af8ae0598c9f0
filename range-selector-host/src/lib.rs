//! Host document capabilities for embedded widgets.
//!
//! A widget such as the range selector does not own a window or a DOM. It is
//! handed an `Arc<dyn Host>` and uses it to look up elements, write
//! attributes and styles, measure boxes, listen to input, schedule deferred
//! work and observe its container.
//!
//! # Capabilities
//!
//! - [`Document`]: element tree, attributes, styles, geometry, listeners.
//! - [`Timers`]: cancellable deferred tasks.
//! - [`EnvironmentWatcher`]: size and presence observation.
//!
//! # Testing
//!
//! With the `testing` feature enabled, [`MemoryDocument`] implements all three
//! capabilities in memory with a virtual clock.

pub mod document;
pub mod event;
pub mod geometry;
pub mod logging;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod prop;

pub use document::{
    Document, DocumentId, ElementId, EnvironmentWatcher, EventTarget, Host, Listener, ListenerId,
    TimerId, Timers, WatchId,
};
pub use event::{
    ClickEvent, CustomEvent, EventKind, HostEvent, Key, KeyEvent, Observation, PointerEvent,
    PointerKind, PointerPhase,
};
pub use geometry::Rect;
pub use logging::init_tracing;
#[cfg(any(test, feature = "testing"))]
pub use logging::init_test_tracing;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryDocument;
pub use prop::{Callback, CallbackWith};
