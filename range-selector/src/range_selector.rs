//! A dual-handle selector for a sub-range of a bounded numeric interval.
//!
//! ## Usage
//!
//! Bind to a container element of a host document, then read or move the
//! handles programmatically while users drag, click or key them.
//!
//! ```
//! use std::time::Duration;
//!
//! use range_selector::{RangeSelector, RangeSelectorArgs};
//! use range_selector_host::MemoryDocument;
//!
//! let document = MemoryDocument::new();
//! document.append_with_id(document.body(), "div", "price");
//!
//! let selector = RangeSelector::build(
//!     document.clone(),
//!     RangeSelectorArgs::default()
//!         .selector("#price")
//!         .from(20.0)
//!         .to(80.0)
//!         .step(5.0)
//!         .on_change(|(from, to)| println!("selected {from}..{to}")),
//! )?;
//!
//! selector.set_from(30.0)?;
//! assert_eq!(selector.from(), 30.0);
//!
//! // Crossing the other handle fails, but leaves the handle one step away.
//! assert!(selector.set_from(85.0).is_err());
//! assert_eq!(selector.from(), 75.0);
//!
//! document.advance(Duration::ZERO);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Every state visible through the public API satisfies `min < max` and
//! `min <= from < to <= max`.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use range_selector_host::{
    Callback, CallbackWith, CustomEvent, ElementId, Host, HostEvent, Key, PointerKind,
};
use tracing::{debug, trace};

use crate::{
    args::{ChangeGuard, Formatter, RangeSelectorArgs},
    error::{Error, Rejection},
};

use interaction::{InteractionController, key_target, nearest_handle, pointer_value};
use layout::GeometryCache;
use lifecycle::{BindMode, Bindings};
use markup::{DisplayText, Elements};
use model::{Proposal, ValueModel};
use registry::RegistryKey;
use scheduler::CallbackScheduler;

pub use interaction::InteractionState;
pub use layout::LabelLayout;
pub use model::{Handle, RangeBounds, RangeUpdate, SelectedRange};

pub(crate) mod interaction;
pub(crate) mod layout;
pub(crate) mod lifecycle;
pub(crate) mod markup;
pub(crate) mod model;
pub(crate) mod registry;
pub(crate) mod scheduler;

/// Name of the bubbling event dispatched on the container when a change
/// settles. Its detail is the `(from, to)` pair.
pub const RANGE_CHANGE_EVENT: &str = "range-change";

/// Whether a successful mutation schedules a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notify {
    /// Re-arm the debounce timer.
    #[default]
    Schedule,
    /// Leave the timer alone.
    Suppress,
}

struct State {
    model: ValueModel,
    geometry: GeometryCache,
    labels: LabelLayout,
    interaction: InteractionController,
    scheduler: CallbackScheduler,
    bindings: Bindings,
    destroyed: bool,
    /// Bumped on every committed value change.
    revision: u64,
}

/// Instance data shared by the public handle and the host callbacks.
///
/// `state` is never locked while user code runs or while the host dispatches
/// events.
pub(crate) struct Shared {
    host: Arc<dyn Host>,
    key: RegistryKey,
    elements: Elements,
    callback: CallbackWith<(f64, f64)>,
    formatter: Formatter,
    before_from_change: Option<ChangeGuard>,
    before_to_change: Option<ChangeGuard>,
    state: Mutex<State>,
    self_ref: Weak<Shared>,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("key", &self.key)
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}

fn ensure_finite(option: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidOption {
            option,
            reason: format!("must be a finite number, got {value}"),
        })
    }
}

impl Shared {
    fn guard(&self, handle: Handle) -> Option<&ChangeGuard> {
        match handle {
            Handle::From => self.before_from_change.as_ref(),
            Handle::To => self.before_to_change.as_ref(),
        }
    }

    fn set_value(&self, handle: Handle, value: f64, notify: Notify) -> Result<(), Rejection> {
        let proposal = {
            let state = self.state.lock();
            if state.destroyed {
                return Err(Rejection::Destroyed);
            }
            state.model.propose(handle, value)
        };
        let range = match proposal {
            Proposal::Accept(range) => range,
            Proposal::Reject(rejection) => return Err(rejection),
            Proposal::Correct(corrected) => {
                debug!("{handle:?} value {value} crosses the other handle; writing {corrected}");
                if let Err(rejection) = self.set_value(handle, corrected, notify) {
                    debug!("Corrective write of {corrected} refused: {rejection}");
                }
                return Err(Rejection::Ordering);
            }
        };

        if let Some(guard) = self.guard(handle)
            && !guard.call((range.from, range.to))
        {
            debug!("{handle:?} change to {value} vetoed");
            return Err(Rejection::Vetoed);
        }

        {
            let mut state = self.state.lock();
            if state.destroyed {
                return Err(Rejection::Destroyed);
            }
            // The guard ran unlocked and may have moved the other handle.
            match state.model.propose(handle, value) {
                Proposal::Accept(range) => state.model.commit(range),
                Proposal::Reject(rejection) => return Err(rejection),
                Proposal::Correct(_) => return Err(Rejection::Ordering),
            }
            state.revision += 1;
        }
        self.refresh();
        self.notify(notify);
        Ok(())
    }

    fn change_bounds<F>(&self, notify: Notify, propose: F) -> Result<(), Error>
    where
        F: FnOnce(&ValueModel) -> Result<ValueModel, Error>,
    {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return Err(Error::Destroyed);
            }
            let next = propose(&state.model)?;
            state.model.replace(next);
            state.revision += 1;
        }
        self.refresh();
        self.notify(notify);
        Ok(())
    }

    /// Re-renders attributes, label text and positions from the model.
    fn refresh(&self) {
        let (bounds, range, revision) = {
            let state = self.state.lock();
            if state.destroyed {
                return;
            }
            (state.model.bounds(), state.model.range(), state.revision)
        };
        let text = DisplayText::format(&self.formatter, &bounds, &range);

        let geometry = {
            let state = self.state.lock();
            // A formatter that changed the values already refreshed for them.
            if state.destroyed || state.revision != revision {
                return;
            }
            state.geometry
        };
        markup::write_state(&*self.host, &self.elements, &bounds, &range, &text);
        let labels = layout::render(&*self.host, &self.elements, &geometry, &bounds, &range);

        {
            let mut state = self.state.lock();
            if state.destroyed || state.revision != revision {
                return;
            }
            if state.geometry == geometry {
                state.labels = labels;
                return;
            }
        }
        // The host resized while we were writing; our positions are stale.
        self.refresh();
    }

    fn delivery(&self) -> Callback {
        let owner = self.self_ref.clone();
        Callback::new(move || {
            if let Some(shared) = owner.upgrade() {
                shared.deliver();
            }
        })
    }

    fn notify(&self, notify: Notify) {
        if notify == Notify::Suppress {
            return;
        }
        let deliver = self.delivery();
        let mut state = self.state.lock();
        if state.destroyed {
            return;
        }
        if state.scheduler.schedule(&*self.host, deliver) {
            debug!("Scheduled change notification");
        }
    }

    fn deliver(&self) {
        let range = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.scheduler.fired();
            state.model.range()
        };
        debug!("Delivering range {}..{}", range.from, range.to);
        self.callback.call((range.from, range.to));
        self.host.dispatch(HostEvent::Custom(CustomEvent::bubbling(
            RANGE_CHANGE_EVENT,
            self.elements.container,
            (range.from, range.to),
        )));
    }

    fn begin_drag(&self, handle: Handle, kind: PointerKind) {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.interaction.begin(handle);
            state.scheduler.suspend(&*self.host);
        }
        markup::raise_handle(&*self.host, &self.elements, handle);
        debug!("Started {kind:?} drag of {handle:?}");
    }

    fn drag_to(&self, x: f64) {
        let (handle, value) = {
            let state = self.state.lock();
            let Some(handle) = state.interaction.dragging_handle() else {
                return;
            };
            let value = pointer_value(x, &state.geometry.track, &state.model.bounds());
            (handle, value)
        };
        trace!("Dragging {handle:?} to {value}");
        if let Err(rejection) = self.set_value(handle, value, Notify::Suppress) {
            trace!("Drag position {value} refused: {rejection}");
        }
    }

    fn end_drag(&self) {
        let deliver = self.delivery();
        let mut state = self.state.lock();
        if state.destroyed || !state.interaction.end() {
            return;
        }
        state.scheduler.resume(&*self.host, deliver);
        debug!("Drag ended");
    }

    fn click_track(&self, x: f64, target: ElementId) {
        if self.elements.is_handle_part(target) {
            return;
        }
        let (handle, value) = {
            let state = self.state.lock();
            if state.destroyed {
                return;
            }
            let candidate = pointer_value(x, &state.geometry.track, &state.model.bounds());
            (nearest_handle(candidate, &state.model.range()), candidate)
        };
        if let Err(rejection) = self.set_value(handle, value, Notify::Schedule) {
            debug!("Track click at {value} refused: {rejection}");
        }
    }

    fn step_by_key(&self, handle: Handle, key: &Key) {
        let target = {
            let state = self.state.lock();
            if state.destroyed {
                return;
            }
            key_target(key, handle, &state.model.bounds(), &state.model.range())
        };
        let Some(value) = target else {
            return;
        };
        if let Err(rejection) = self.set_value(handle, value, Notify::Schedule) {
            debug!("{key:?} on {handle:?} refused: {rejection}");
        }
    }
}

/// Handle to a bound range selector.
///
/// Clones share one instance. Dropping the last clone tears the instance
/// down, as does [`RangeSelector::destroy`] or removal of the container from
/// the document.
#[derive(Clone)]
pub struct RangeSelector {
    shared: Arc<Shared>,
}

impl RangeSelector {
    /// Generates the widget structure inside the element matched by
    /// `args.selector` and binds to it.
    pub fn build(host: Arc<dyn Host>, args: RangeSelectorArgs) -> Result<Self, Error> {
        lifecycle::bind(host, args, BindMode::Build).map(|shared| Self { shared })
    }

    /// Binds to a structure already present inside the element matched by
    /// `args.selector`.
    ///
    /// Bounds, step and values are read from `aria-valuemin`,
    /// `aria-valuemax` and `aria-valuenow` on the handles and `data-step` on
    /// the group, each falling back to `args`.
    pub fn attach(host: Arc<dyn Host>, args: RangeSelectorArgs) -> Result<Self, Error> {
        lifecycle::bind(host, args, BindMode::Attach).map(|shared| Self { shared })
    }

    /// The live selector bound to `container`, if any.
    pub fn lookup(host: &dyn Host, container: ElementId) -> Option<Self> {
        let key = RegistryKey {
            document: host.id(),
            container,
        };
        registry::lookup(key)
            .filter(|shared| !shared.state.lock().destroyed)
            .map(|shared| Self { shared })
    }

    pub fn from(&self) -> f64 {
        self.range().from
    }

    pub fn to(&self) -> f64 {
        self.range().to
    }

    pub fn min(&self) -> f64 {
        self.bounds().min
    }

    pub fn max(&self) -> f64 {
        self.bounds().max
    }

    pub fn step(&self) -> f64 {
        self.bounds().step
    }

    /// The selected `(from, to)` pair.
    pub fn range(&self) -> SelectedRange {
        self.shared.state.lock().model.range()
    }

    pub fn bounds(&self) -> RangeBounds {
        self.shared.state.lock().model.bounds()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.shared.state.lock().interaction.state()
    }

    /// Label offsets from the most recent layout pass.
    pub fn label_layout(&self) -> LabelLayout {
        self.shared.state.lock().labels
    }

    /// The element the selector is bound to.
    pub fn container(&self) -> ElementId {
        self.shared.elements.container
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.lock().destroyed
    }

    /// Moves the lower handle and schedules a notification.
    ///
    /// A value at or above `to` is refused with [`Rejection::Ordering`], but
    /// the handle is first moved to `to - step` if that value is acceptable.
    pub fn set_from(&self, value: f64) -> Result<&Self, Rejection> {
        self.set_from_with(value, Notify::Schedule)
    }

    pub fn set_from_with(&self, value: f64, notify: Notify) -> Result<&Self, Rejection> {
        self.shared
            .set_value(Handle::From, value, notify)
            .map(|()| self)
    }

    /// Moves the upper handle and schedules a notification.
    ///
    /// A value at or below `from` is refused with [`Rejection::Ordering`],
    /// but the handle is first moved to `from + step` if that value is
    /// acceptable.
    pub fn set_to(&self, value: f64) -> Result<&Self, Rejection> {
        self.set_to_with(value, Notify::Schedule)
    }

    pub fn set_to_with(&self, value: f64, notify: Notify) -> Result<&Self, Rejection> {
        self.shared.set_value(Handle::To, value, notify).map(|()| self)
    }

    /// Changes the lower bound. It must stay below `max` and at or below
    /// `from`.
    pub fn set_min(&self, min: f64) -> Result<&Self, Error> {
        self.set_min_with(min, Notify::Schedule)
    }

    pub fn set_min_with(&self, min: f64, notify: Notify) -> Result<&Self, Error> {
        ensure_finite("min", min)?;
        self.shared.change_bounds(notify, |model| {
            let bounds = model.propose_min(min)?;
            let mut next = *model;
            next.commit_bounds(bounds);
            Ok(next)
        })?;
        Ok(self)
    }

    /// Changes the upper bound. It must stay above `min` and at or above
    /// `to`.
    pub fn set_max(&self, max: f64) -> Result<&Self, Error> {
        self.set_max_with(max, Notify::Schedule)
    }

    pub fn set_max_with(&self, max: f64, notify: Notify) -> Result<&Self, Error> {
        ensure_finite("max", max)?;
        self.shared.change_bounds(notify, |model| {
            let bounds = model.propose_max(max)?;
            let mut next = *model;
            next.commit_bounds(bounds);
            Ok(next)
        })?;
        Ok(self)
    }

    /// Applies several fields at once. The merged state is validated as a
    /// whole; on error nothing changes.
    pub fn update(&self, update: RangeUpdate) -> Result<&Self, Error> {
        self.update_with(update, Notify::Schedule)
    }

    pub fn update_with(&self, update: RangeUpdate, notify: Notify) -> Result<&Self, Error> {
        for (option, value) in [
            ("min", update.min),
            ("max", update.max),
            ("from", update.from),
            ("to", update.to),
        ] {
            if let Some(value) = value {
                ensure_finite(option, value)?;
            }
        }
        self.shared
            .change_bounds(notify, |model| model.propose_update(&update))?;
        Ok(self)
    }

    /// Detaches every listener, cancels any pending notification and
    /// releases the container. Calling it again does nothing.
    pub fn destroy(&self) {
        self.shared.teardown();
    }
}

impl PartialEq for RangeSelector {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for RangeSelector {}

impl fmt::Debug for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("RangeSelector")
            .field("container", &self.shared.elements.container)
            .field("bounds", &state.model.bounds())
            .field("range", &state.model.range())
            .field("interaction", &state.interaction.state())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}
