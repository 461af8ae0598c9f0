use derive_setters::Setters;

use crate::error::{Error, Rejection};

/// Which of the two handles an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// The lower handle.
    From,
    /// The upper handle.
    To,
}

impl Handle {
    /// The opposite handle.
    pub fn other(self) -> Self {
        match self {
            Handle::From => Handle::To,
            Handle::To => Handle::From,
        }
    }
}

/// The selectable interval and its granularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl RangeBounds {
    /// `max - min`.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `value` is finite and inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Position of `value` along the track, `0.0..=100.0` for in-range values.
    pub fn percent(&self, value: f64) -> f64 {
        (value - self.min) * 100.0 / self.span()
    }

    /// Rounds `value` to the nearest `min + k * step`.
    pub fn snap(&self, value: f64) -> f64 {
        ((value - self.min) / self.step).round() * self.step + self.min
    }
}

/// The selected sub-range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedRange {
    pub from: f64,
    pub to: f64,
}

impl SelectedRange {
    /// Value of one handle.
    pub fn value(&self, handle: Handle) -> f64 {
        match handle {
            Handle::From => self.from,
            Handle::To => self.to,
        }
    }

    /// Returns a copy with one handle replaced.
    pub fn with(&self, handle: Handle, value: f64) -> Self {
        match handle {
            Handle::From => Self { from: value, ..*self },
            Handle::To => Self { to: value, ..*self },
        }
    }
}

/// Partial bulk update for [`crate::RangeSelector::update`].
///
/// Fields left as `None` keep their current value.
///
/// ```
/// use range_selector::RangeUpdate;
///
/// let update = RangeUpdate::new().min(10.0).max(90.0);
/// assert_eq!(update.min, Some(10.0));
/// assert_eq!(update.from, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Setters)]
#[setters(strip_option)]
pub struct RangeUpdate {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub from: Option<f64>,
    pub to: Option<f64>,
}

impl RangeUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome of proposing a new value for one handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Proposal {
    /// The value can be committed as this range.
    Accept(SelectedRange),
    /// The value is refused without side effects.
    Reject(Rejection),
    /// The value crosses the other handle. The handle should instead be
    /// written to the carried value, and the original call still fails.
    Correct(f64),
}

/// Checks `min < max` and `min <= from < to <= max`.
pub(crate) fn validate_state(bounds: &RangeBounds, range: &SelectedRange) -> Result<(), Error> {
    // Negated comparisons so NaN fails too.
    if !(bounds.min < bounds.max) {
        return Err(Error::InvalidBounds {
            min: bounds.min,
            max: bounds.max,
        });
    }
    let ordered =
        bounds.min <= range.from && range.from < range.to && range.to <= bounds.max;
    if !ordered {
        return Err(Error::InvalidRange {
            min: bounds.min,
            max: bounds.max,
            from: range.from,
            to: range.to,
        });
    }
    Ok(())
}

/// Bounds plus selection, always satisfying the ordering invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ValueModel {
    bounds: RangeBounds,
    range: SelectedRange,
}

impl ValueModel {
    pub fn new(bounds: RangeBounds, range: SelectedRange) -> Result<Self, Error> {
        if !(bounds.step > 0.0) || !bounds.step.is_finite() {
            return Err(Error::InvalidOption {
                option: "step",
                reason: format!("must be a positive number, got {}", bounds.step),
            });
        }
        validate_state(&bounds, &range)?;
        Ok(Self { bounds, range })
    }

    pub fn bounds(&self) -> RangeBounds {
        self.bounds
    }

    pub fn range(&self) -> SelectedRange {
        self.range
    }

    /// Decides what writing `value` to `handle` would do.
    pub fn propose(&self, handle: Handle, value: f64) -> Proposal {
        if !self.bounds.contains(value) {
            return Proposal::Reject(Rejection::OutOfRange);
        }
        match handle {
            Handle::From if value >= self.range.to => {
                Proposal::Correct(self.range.to - self.bounds.step)
            }
            Handle::To if value <= self.range.from => {
                Proposal::Correct(self.range.from + self.bounds.step)
            }
            _ => Proposal::Accept(self.range.with(handle, value)),
        }
    }

    /// Stores a range previously returned by [`ValueModel::propose`].
    pub fn commit(&mut self, range: SelectedRange) {
        debug_assert!(validate_state(&self.bounds, &range).is_ok());
        self.range = range;
    }

    pub fn propose_min(&self, min: f64) -> Result<RangeBounds, Error> {
        if !(min < self.bounds.max) {
            return Err(Error::InvalidBounds {
                min,
                max: self.bounds.max,
            });
        }
        if min > self.range.from {
            return Err(Error::MinAboveFrom {
                min,
                from: self.range.from,
            });
        }
        Ok(RangeBounds { min, ..self.bounds })
    }

    pub fn propose_max(&self, max: f64) -> Result<RangeBounds, Error> {
        if !(self.bounds.min < max) {
            return Err(Error::InvalidBounds {
                min: self.bounds.min,
                max,
            });
        }
        if max < self.range.to {
            return Err(Error::MaxBelowTo {
                max,
                to: self.range.to,
            });
        }
        Ok(RangeBounds { max, ..self.bounds })
    }

    /// Stores bounds previously returned by `propose_min`/`propose_max`.
    pub fn commit_bounds(&mut self, bounds: RangeBounds) {
        debug_assert!(validate_state(&bounds, &self.range).is_ok());
        self.bounds = bounds;
    }

    /// Merges `update` over the current state and validates the result as a
    /// whole.
    pub fn propose_update(&self, update: &RangeUpdate) -> Result<ValueModel, Error> {
        let bounds = RangeBounds {
            min: update.min.unwrap_or(self.bounds.min),
            max: update.max.unwrap_or(self.bounds.max),
            step: self.bounds.step,
        };
        let range = SelectedRange {
            from: update.from.unwrap_or(self.range.from),
            to: update.to.unwrap_or(self.range.to),
        };
        validate_state(&bounds, &range)?;
        Ok(ValueModel { bounds, range })
    }

    pub fn replace(&mut self, next: ValueModel) {
        *self = next;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        Handle, Proposal, RangeBounds, RangeUpdate, SelectedRange, ValueModel, validate_state,
    };
    use crate::error::{Error, Rejection};

    fn model(min: f64, max: f64, step: f64, from: f64, to: f64) -> ValueModel {
        ValueModel::new(RangeBounds { min, max, step }, SelectedRange { from, to })
            .expect("valid model")
    }

    #[test]
    fn from_crossing_to_requests_correction() {
        let model = model(0.0, 100.0, 5.0, 20.0, 80.0);
        assert_eq!(model.propose(Handle::From, 85.0), Proposal::Correct(75.0));
        assert_eq!(model.propose(Handle::From, 80.0), Proposal::Correct(75.0));
        assert_eq!(model.propose(Handle::To, 20.0), Proposal::Correct(25.0));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let model = model(0.0, 100.0, 5.0, 20.0, 80.0);
        assert_eq!(
            model.propose(Handle::From, -1.0),
            Proposal::Reject(Rejection::OutOfRange)
        );
        assert_eq!(
            model.propose(Handle::To, 100.5),
            Proposal::Reject(Rejection::OutOfRange)
        );
        assert_eq!(
            model.propose(Handle::To, f64::NAN),
            Proposal::Reject(Rejection::OutOfRange)
        );
    }

    #[test]
    fn accepted_values_keep_the_other_handle() {
        let model = model(0.0, 100.0, 5.0, 20.0, 80.0);
        assert_eq!(
            model.propose(Handle::From, 0.0),
            Proposal::Accept(SelectedRange { from: 0.0, to: 80.0 })
        );
        assert_eq!(
            model.propose(Handle::To, 100.0),
            Proposal::Accept(SelectedRange { from: 20.0, to: 100.0 })
        );
    }

    #[test]
    fn bounds_cannot_cut_into_the_selection() {
        let model = model(0.0, 100.0, 1.0, 20.0, 60.0);
        assert_eq!(
            model.propose_max(50.0),
            Err(Error::MaxBelowTo { max: 50.0, to: 60.0 })
        );
        assert_eq!(
            model.propose_min(25.0),
            Err(Error::MinAboveFrom { min: 25.0, from: 20.0 })
        );
        assert!(matches!(
            model.propose_min(100.0),
            Err(Error::InvalidBounds { .. })
        ));
        assert_eq!(model.propose_max(60.0).map(|b| b.max), Ok(60.0));
    }

    #[test]
    fn update_validates_the_merged_state() {
        let model = model(0.0, 100.0, 1.0, 5.0, 80.0);
        let err = model
            .propose_update(&RangeUpdate::new().min(10.0).max(90.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange { from, .. } if from == 5.0));

        let next = model
            .propose_update(&RangeUpdate::new().min(10.0).max(90.0).from(10.0))
            .expect("valid update");
        assert_eq!(next.bounds().min, 10.0);
        assert_eq!(next.range(), SelectedRange { from: 10.0, to: 80.0 });
    }

    #[test]
    fn snapping_rounds_to_step_multiples_from_min() {
        let bounds = RangeBounds {
            min: 10.0,
            max: 110.0,
            step: 5.0,
        };
        assert_eq!(bounds.snap(62.4), 60.0);
        assert_eq!(bounds.snap(62.6), 65.0);
        assert_eq!(bounds.percent(60.0), 50.0);
    }

    #[test]
    fn zero_step_is_invalid() {
        let result = ValueModel::new(
            RangeBounds {
                min: 0.0,
                max: 10.0,
                step: 0.0,
            },
            SelectedRange { from: 1.0, to: 2.0 },
        );
        assert!(matches!(
            result,
            Err(Error::InvalidOption { option: "step", .. })
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(Handle, f64),
        Min(f64),
        Max(f64),
        Update(RangeUpdate),
    }

    fn op() -> impl Strategy<Value = Op> {
        let value = -20.0..120.0f64;
        prop_oneof![
            (any::<bool>(), value.clone()).prop_map(|(from, v)| {
                Op::Set(if from { Handle::From } else { Handle::To }, v)
            }),
            value.clone().prop_map(Op::Min),
            value.clone().prop_map(Op::Max),
            (
                proptest::option::of(value.clone()),
                proptest::option::of(value.clone()),
                proptest::option::of(value.clone()),
                proptest::option::of(value),
            )
                .prop_map(|(min, max, from, to)| Op::Update(RangeUpdate {
                    min,
                    max,
                    from,
                    to
                })),
        ]
    }

    proptest! {
        #[test]
        fn every_operation_preserves_ordering(ops in proptest::collection::vec(op(), 1..40)) {
            let mut model = model(0.0, 100.0, 1.0, 20.0, 80.0);
            for op in ops {
                match op {
                    Op::Set(handle, value) => match model.propose(handle, value) {
                        Proposal::Accept(range) => model.commit(range),
                        Proposal::Correct(corrected) => {
                            if let Proposal::Accept(range) = model.propose(handle, corrected) {
                                model.commit(range);
                            }
                        }
                        Proposal::Reject(_) => {}
                    },
                    Op::Min(min) => {
                        if let Ok(bounds) = model.propose_min(min) {
                            model.commit_bounds(bounds);
                        }
                    }
                    Op::Max(max) => {
                        if let Ok(bounds) = model.propose_max(max) {
                            model.commit_bounds(bounds);
                        }
                    }
                    Op::Update(update) => {
                        let before = model;
                        match model.propose_update(&update) {
                            Ok(next) => model.replace(next),
                            Err(_) => prop_assert_eq!(model, before),
                        }
                    }
                }
                prop_assert!(validate_state(&model.bounds(), &model.range()).is_ok());
            }
        }

        #[test]
        fn set_round_trips_exactly_inside_the_open_interval(value in 0.0..100.0f64) {
            let model = model(0.0, 100.0, 1.0, 0.0, 100.0);
            let from_model = {
                let mut m = model;
                if let Proposal::Accept(range) = m.propose(Handle::From, value) {
                    m.commit(range);
                }
                m
            };
            prop_assert_eq!(from_model.range().from, value);
        }
    }
}
