use range_selector_host::{Key, Rect};

use super::model::{Handle, RangeBounds, SelectedRange};

/// Pointer interaction state of a range selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// No drag in progress.
    #[default]
    Idle,
    /// The lower handle follows the pointer.
    DraggingFrom,
    /// The upper handle follows the pointer.
    DraggingTo,
}

impl InteractionState {
    /// The handle being dragged, if any.
    pub fn dragging_handle(self) -> Option<Handle> {
        match self {
            InteractionState::Idle => None,
            InteractionState::DraggingFrom => Some(Handle::From),
            InteractionState::DraggingTo => Some(Handle::To),
        }
    }
}

/// Tracks which handle, if any, is being dragged.
#[derive(Debug, Default)]
pub(crate) struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Starts dragging `handle`. A drag already in progress is replaced.
    pub fn begin(&mut self, handle: Handle) {
        self.state = match handle {
            Handle::From => InteractionState::DraggingFrom,
            Handle::To => InteractionState::DraggingTo,
        };
    }

    /// Ends the drag. Returns whether one was in progress.
    pub fn end(&mut self) -> bool {
        std::mem::take(&mut self.state) != InteractionState::Idle
    }

    pub fn dragging_handle(&self) -> Option<Handle> {
        self.state.dragging_handle()
    }
}

/// Converts a pointer x coordinate into a snapped value.
///
/// The position is clamped to the track first, so the result is always a
/// step multiple within `[min, max]` unless the last step overshoots `max`.
pub(crate) fn pointer_value(x: f64, track: &Rect, bounds: &RangeBounds) -> f64 {
    let fraction = if track.width > 0.0 {
        ((x - track.left) / track.width).clamp(0.0, 1.0)
    } else {
        0.0
    };
    bounds.snap(bounds.min + fraction * bounds.span())
}

/// The handle a track click should move. The lower handle wins ties.
pub(crate) fn nearest_handle(candidate: f64, range: &SelectedRange) -> Handle {
    let from_distance = (candidate - range.from).abs();
    let to_distance = (candidate - range.to).abs();
    if from_distance <= to_distance {
        Handle::From
    } else {
        Handle::To
    }
}

/// The value a key press on `handle` asks for, if the key moves it at all.
pub(crate) fn key_target(
    key: &Key,
    handle: Handle,
    bounds: &RangeBounds,
    range: &SelectedRange,
) -> Option<f64> {
    let current = range.value(handle);
    match key {
        Key::ArrowLeft | Key::ArrowDown => {
            let next = current - bounds.step;
            (next >= bounds.min).then_some(next)
        }
        Key::ArrowRight | Key::ArrowUp => {
            let next = current + bounds.step;
            (next <= bounds.max).then_some(next)
        }
        Key::Home => Some(bounds.min),
        Key::End => Some(bounds.max),
        Key::Other(_) => None,
    }
}
