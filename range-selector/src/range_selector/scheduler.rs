use std::time::Duration;

use range_selector_host::{Callback, Host, TimerId};
use tracing::trace;

/// Debounces change notifications.
///
/// At most one timer is pending. Every call to [`CallbackScheduler::schedule`]
/// replaces it, so only the last change of a burst is delivered. While
/// suspended (a handle is being dragged) nothing is armed at all.
#[derive(Debug)]
pub(crate) struct CallbackScheduler {
    delay: Duration,
    pending: Option<TimerId>,
    suspended: bool,
}

impl CallbackScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            suspended: false,
        }
    }

    /// Re-arms the timer with `deliver`. Returns whether a timer was armed.
    pub fn schedule(&mut self, host: &dyn Host, deliver: Callback) -> bool {
        self.cancel(host);
        if self.suspended {
            trace!("Notification suppressed while dragging");
            return false;
        }
        self.pending = Some(host.set_timeout(self.delay, deliver));
        true
    }

    /// Cancels any pending timer and stops arming new ones.
    pub fn suspend(&mut self, host: &dyn Host) {
        self.cancel(host);
        self.suspended = true;
    }

    /// Lifts suspension and arms the timer so the settled value is
    /// delivered.
    pub fn resume(&mut self, host: &dyn Host, deliver: Callback) -> bool {
        self.suspended = false;
        self.schedule(host, deliver)
    }

    pub fn cancel(&mut self, host: &dyn Host) {
        if let Some(id) = self.pending.take() {
            host.clear_timeout(id);
        }
    }

    /// Marks the pending timer as fired.
    pub fn fired(&mut self) {
        self.pending = None;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use range_selector_host::{Callback, MemoryDocument};

    use super::CallbackScheduler;

    fn counting() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let callback = Callback::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn rescheduling_replaces_the_pending_timer() {
        let document = MemoryDocument::new();
        let mut scheduler = CallbackScheduler::new(Duration::from_millis(100));
        let (count, deliver) = counting();

        for _ in 0..5 {
            assert!(scheduler.schedule(&*document, deliver.clone()));
            document.advance(Duration::from_millis(40));
        }
        assert_eq!(document.pending_timers(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        document.advance(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn suspension_blocks_arming_until_resumed() {
        let document = MemoryDocument::new();
        let mut scheduler = CallbackScheduler::new(Duration::ZERO);
        let (count, deliver) = counting();

        scheduler.schedule(&*document, deliver.clone());
        scheduler.suspend(&*document);
        assert_eq!(document.pending_timers(), 0);
        assert!(!scheduler.schedule(&*document, deliver.clone()));
        assert!(scheduler.is_suspended());

        document.advance(Duration::from_millis(10));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(scheduler.resume(&*document, deliver));
        assert!(scheduler.is_pending());
        document.advance(Duration::ZERO);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_is_safe_without_a_pending_timer() {
        let document = MemoryDocument::new();
        let mut scheduler = CallbackScheduler::new(Duration::from_millis(5));
        scheduler.cancel(&*document);
        assert!(!scheduler.is_pending());
    }
}
