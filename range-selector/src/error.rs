//! Failure types.
//!
//! Structural and configuration problems are fatal and surface as [`Error`].
//! Single-value setters never fail hard: they report a [`Rejection`] and leave
//! the widget in its last valid state.

use thiserror::Error;

/// Fatal errors. Raising one never mutates widget state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },
    #[error("selector `{selector}` did not match any element")]
    SelectorNotFound { selector: String },
    #[error("selector `{selector}` matched {count} elements, expected exactly one")]
    AmbiguousSelector { selector: String, count: usize },
    #[error("the element matched by `{selector}` already has a range selector bound")]
    AlreadyBound { selector: String },
    #[error("range selector markup is missing its {0} element")]
    MissingElement(&'static str),
    #[error("bounds must satisfy min < max (min = {min}, max = {max})")]
    InvalidBounds { min: f64, max: f64 },
    #[error("min {min} is greater than the selected from value {from}")]
    MinAboveFrom { min: f64, from: f64 },
    #[error("max {max} is smaller than the selected to value {to}")]
    MaxBelowTo { max: f64, to: f64 },
    #[error("range must satisfy {min} <= from < to <= {max} (from = {from}, to = {to})")]
    InvalidRange { min: f64, max: f64, from: f64, to: f64 },
    #[error("the range selector has been destroyed")]
    Destroyed,
}

/// Why a single-value setter refused a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The value lies outside `[min, max]` or is not finite.
    #[error("value is outside the selectable bounds")]
    OutOfRange,
    /// The value would cross the other handle.
    #[error("value would break the from < to ordering")]
    Ordering,
    /// A `before_*_change` guard returned `false`.
    #[error("change vetoed by guard")]
    Vetoed,
    /// The widget was torn down.
    #[error("the range selector has been destroyed")]
    Destroyed,
}
