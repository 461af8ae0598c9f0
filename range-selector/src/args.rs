//! Configuration for [`crate::RangeSelector`].

use std::time::Duration;

use derive_setters::Setters;
use range_selector_host::CallbackWith;

use crate::{
    error::Error,
    range_selector::model::{RangeBounds, SelectedRange},
};

/// Formats a value for labels and `aria-valuetext`.
pub type Formatter = CallbackWith<f64, String>;

/// Veto hook receiving the proposed `(from, to)` pair.
pub type ChangeGuard = CallbackWith<(f64, f64), bool>;

/// Accessible name used when none is configured.
pub const DEFAULT_LABEL: &str = "Range selector";

/// Arguments for binding a range selector.
///
/// ```
/// use std::time::Duration;
/// use range_selector::RangeSelectorArgs;
///
/// let args = RangeSelectorArgs::default()
///     .selector("#price")
///     .min(0.0)
///     .max(500.0)
///     .from(50.0)
///     .to(250.0)
///     .step(10.0)
///     .delay(Duration::from_millis(200))
///     .formatter(|v| format!("${v}"))
///     .on_change(|(from, to)| println!("{from}..{to}"));
/// assert_eq!(args.label, "Range selector");
/// ```
#[derive(Clone, PartialEq, Setters)]
pub struct RangeSelectorArgs {
    /// Selector resolving to exactly one container element.
    #[setters(into)]
    pub selector: String,
    /// Lower bound of the track.
    pub min: f64,
    /// Upper bound of the track.
    pub max: f64,
    /// Initial value of the lower handle.
    pub from: f64,
    /// Initial value of the upper handle.
    pub to: f64,
    /// Granularity of pointer and keyboard movement.
    pub step: f64,
    /// Called with the settled `(from, to)` pair after `delay`.
    #[setters(skip)]
    pub callback: CallbackWith<(f64, f64)>,
    /// Debounce window for notifications.
    pub delay: Duration,
    #[setters(skip)]
    pub formatter: Formatter,
    /// Accessible name of the group.
    #[setters(into)]
    pub label: String,
    #[setters(skip)]
    pub before_from_change: Option<ChangeGuard>,
    #[setters(skip)]
    pub before_to_change: Option<ChangeGuard>,
}

impl RangeSelectorArgs {
    /// Sets the change callback.
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn((f64, f64)) + Send + Sync + 'static,
    {
        self.callback = CallbackWith::new(callback);
        self
    }

    /// Sets the change callback from a shared handle.
    pub fn on_change_shared(mut self, callback: impl Into<CallbackWith<(f64, f64)>>) -> Self {
        self.callback = callback.into();
        self
    }

    /// Sets the value formatter.
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(f64) -> String + Send + Sync + 'static,
    {
        self.formatter = CallbackWith::new(formatter);
        self
    }

    /// Registers a guard consulted before the lower handle moves.
    pub fn before_from_change<F>(mut self, guard: F) -> Self
    where
        F: Fn((f64, f64)) -> bool + Send + Sync + 'static,
    {
        self.before_from_change = Some(CallbackWith::new(guard));
        self
    }

    /// Registers a guard consulted before the upper handle moves.
    pub fn before_to_change<F>(mut self, guard: F) -> Self
    where
        F: Fn((f64, f64)) -> bool + Send + Sync + 'static,
    {
        self.before_to_change = Some(CallbackWith::new(guard));
        self
    }

    pub(crate) fn bounds(&self) -> RangeBounds {
        RangeBounds {
            min: self.min,
            max: self.max,
            step: self.step,
        }
    }

    pub(crate) fn range(&self) -> SelectedRange {
        SelectedRange {
            from: self.from,
            to: self.to,
        }
    }

    /// Checks options that do not depend on existing markup.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.selector.trim().is_empty() {
            return Err(Error::InvalidOption {
                option: "selector",
                reason: "must not be empty".to_string(),
            });
        }
        for (option, value) in [
            ("min", self.min),
            ("max", self.max),
            ("from", self.from),
            ("to", self.to),
            ("step", self.step),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidOption {
                    option,
                    reason: format!("must be a finite number, got {value}"),
                });
            }
        }
        if self.step <= 0.0 {
            return Err(Error::InvalidOption {
                option: "step",
                reason: format!("must be positive, got {}", self.step),
            });
        }
        Ok(())
    }
}

impl Default for RangeSelectorArgs {
    fn default() -> Self {
        Self {
            selector: String::new(),
            min: 0.0,
            max: 100.0,
            from: 0.0,
            to: 100.0,
            step: 1.0,
            callback: CallbackWith::new(|_| {}),
            delay: Duration::ZERO,
            formatter: CallbackWith::new(|value: f64| value.to_string()),
            label: DEFAULT_LABEL.to_string(),
            before_from_change: None,
            before_to_change: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RangeSelectorArgs;
    use crate::error::Error;

    #[test]
    fn defaults_format_with_display() {
        let args = RangeSelectorArgs::default();
        assert_eq!(args.formatter.call(20.0), "20");
        assert_eq!(args.formatter.call(2.5), "2.5");
    }

    #[test]
    fn empty_selector_is_rejected() {
        let err = RangeSelectorArgs::default().validate().unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "selector", .. }));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let err = RangeSelectorArgs::default()
            .selector("#slot")
            .max(f64::INFINITY)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "max", .. }));

        let err = RangeSelectorArgs::default()
            .selector("#slot")
            .step(-1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { option: "step", .. }));
    }
}
