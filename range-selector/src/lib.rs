//! Dual-handle range selector for embedded host documents.
//!
//! # Usage
//!
//! Hand a host (anything implementing [`range_selector_host::Host`]) and a
//! [`RangeSelectorArgs`] to [`RangeSelector::build`] to generate the widget
//! inside a container, or to [`RangeSelector::attach`] to adopt markup that
//! is already there. Users then move the two handles by dragging, clicking
//! the track or using the arrow, Home and End keys; the application moves
//! them through the setters on [`RangeSelector`].
//!
//! Settled changes are debounced and reported once, both to the configured
//! callback and as a bubbling [`RANGE_CHANGE_EVENT`] on the container.
//!
//! # Errors
//!
//! Structural and configuration problems are reported as [`Error`]. Moving a
//! single handle never fails hard; refused values come back as a
//! [`Rejection`] and leave the widget unchanged.

pub mod args;
pub mod error;
pub mod range_selector;

pub use args::{ChangeGuard, DEFAULT_LABEL, Formatter, RangeSelectorArgs};
pub use error::{Error, Rejection};
pub use range_selector::{
    Handle, InteractionState, LabelLayout, Notify, RANGE_CHANGE_EVENT, RangeBounds,
    RangeSelector, RangeUpdate, SelectedRange,
};
