//! Binding a selector to its container and tearing it down again.
//!
//! Every listener and watcher closure holds a `Weak` reference, so the host
//! never keeps a selector alive. Teardown runs on explicit `destroy`, on
//! container removal and when the last handle is dropped, whichever comes
//! first; later calls are no-ops.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use range_selector_host::{
    CallbackWith, ElementId, EventKind, EventTarget, Host, HostEvent, Listener, ListenerId,
    Observation, WatchId,
};
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::{
    Shared, State,
    interaction::InteractionController,
    layout::{GeometryCache, LabelLayout},
    markup,
    model::{Handle, ValueModel},
    registry::{self, RegistryKey},
    scheduler::CallbackScheduler,
};
use crate::{args::RangeSelectorArgs, error::Error};

/// How the element structure is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindMode {
    /// Generate the structure inside the container.
    Build,
    /// Use a structure already present in the container.
    Attach,
}

/// Host registrations owned by one selector.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    listeners: SmallVec<[ListenerId; 8]>,
    watch: Option<WatchId>,
}

fn resolve(host: &dyn Host, selector: &str) -> Result<ElementId, Error> {
    let matches = host.query_selector_all(selector);
    match matches.as_slice() {
        [container] => Ok(*container),
        [] => Err(Error::SelectorNotFound {
            selector: selector.to_string(),
        }),
        _ => Err(Error::AmbiguousSelector {
            selector: selector.to_string(),
            count: matches.len(),
        }),
    }
}

/// Resolves the container, prepares its structure and wires up input.
pub(crate) fn bind(
    host: Arc<dyn Host>,
    args: RangeSelectorArgs,
    mode: BindMode,
) -> Result<Arc<Shared>, Error> {
    args.validate()?;
    let container = resolve(&*host, &args.selector)?;
    let key = RegistryKey {
        document: host.id(),
        container,
    };
    if registry::is_bound(key) {
        warn!("Refusing to bind `{}` twice", args.selector);
        return Err(Error::AlreadyBound {
            selector: args.selector,
        });
    }

    let (elements, model) = match mode {
        BindMode::Build => {
            let model = ValueModel::new(args.bounds(), args.range())?;
            (markup::generate(&*host, container, &args.label), model)
        }
        BindMode::Attach => {
            let elements = markup::locate(&*host, container)?;
            let (bounds, range) =
                markup::read_initial(&*host, &elements, args.bounds(), args.range());
            (elements, ValueModel::new(bounds, range)?)
        }
    };
    let geometry = GeometryCache::capture(&*host, &elements);

    let shared = Arc::new_cyclic(|self_ref| Shared {
        host,
        key,
        elements,
        callback: args.callback,
        formatter: args.formatter,
        before_from_change: args.before_from_change,
        before_to_change: args.before_to_change,
        state: Mutex::new(State {
            model,
            geometry,
            labels: LabelLayout::default(),
            interaction: InteractionController::default(),
            scheduler: CallbackScheduler::new(args.delay),
            bindings: Bindings::default(),
            destroyed: false,
            revision: 0,
        }),
        self_ref: self_ref.clone(),
    });

    let bindings = shared.connect();
    shared.state.lock().bindings = bindings;
    if !registry::insert(key, &shared) {
        shared.teardown();
        return Err(Error::AlreadyBound {
            selector: args.selector,
        });
    }
    shared.refresh();

    let range = shared.state.lock().model.range();
    debug!(
        "Bound range selector to `{}` ({mode:?}) with {}..{}",
        args.selector, range.from, range.to
    );
    Ok(shared)
}

/// Wraps `handler` into a listener that does nothing once the selector is
/// gone.
fn listener<F>(owner: &Weak<Shared>, handler: F) -> Listener
where
    F: Fn(&Shared, HostEvent) + Send + Sync + 'static,
{
    let owner = owner.clone();
    CallbackWith::new(move |event| {
        if let Some(shared) = owner.upgrade() {
            handler(shared.as_ref(), event);
        }
    })
}

impl Shared {
    fn connect(&self) -> Bindings {
        let host = &*self.host;
        let owner = &self.self_ref;
        let mut bindings = Bindings::default();

        for handle in [Handle::From, Handle::To] {
            let target = EventTarget::Element(self.elements.handle(handle));
            bindings.listeners.push(host.add_listener(
                target,
                EventKind::PointerDown,
                listener(owner, move |shared, event| {
                    if let HostEvent::Pointer(pointer) = event {
                        shared.begin_drag(handle, pointer.kind);
                    }
                }),
            ));
            bindings.listeners.push(host.add_listener(
                target,
                EventKind::KeyDown,
                listener(owner, move |shared, event| {
                    if let HostEvent::Key(key) = event {
                        shared.step_by_key(handle, &key.key);
                    }
                }),
            ));
        }

        bindings.listeners.push(host.add_listener(
            EventTarget::Element(self.elements.track),
            EventKind::Click,
            listener(owner, |shared, event| {
                if let HostEvent::Click(click) = event {
                    shared.click_track(click.x, click.target);
                }
            }),
        ));

        bindings.listeners.push(host.add_listener(
            EventTarget::Document,
            EventKind::PointerMove,
            listener(owner, |shared, event| {
                if let HostEvent::Pointer(pointer) = event {
                    shared.drag_to(pointer.x);
                }
            }),
        ));
        for kind in [EventKind::PointerUp, EventKind::PointerCancel] {
            bindings.listeners.push(host.add_listener(
                EventTarget::Document,
                kind,
                listener(owner, |shared, _| shared.end_drag()),
            ));
        }

        let watcher = owner.clone();
        bindings.watch = Some(host.observe(
            self.elements.container,
            CallbackWith::new(move |observation: Observation| {
                let Some(shared) = watcher.upgrade() else {
                    return;
                };
                match observation {
                    Observation::Resized(_) => shared.recapture_geometry(),
                    Observation::Removed => {
                        debug!("Container removed from the document");
                        shared.teardown();
                    }
                }
            }),
        ));

        bindings
    }

    fn recapture_geometry(&self) {
        if self.state.lock().destroyed {
            return;
        }
        let geometry = GeometryCache::capture(&*self.host, &self.elements);
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.geometry = geometry;
        }
        self.refresh();
    }

    /// Releases every host registration. Idempotent.
    pub(crate) fn teardown(&self) {
        let bindings = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.scheduler.cancel(&*self.host);
            state.interaction.end();
            std::mem::take(&mut state.bindings)
        };

        for id in &bindings.listeners {
            self.host.remove_listener(*id);
        }
        if let Some(watch) = bindings.watch {
            self.host.unobserve(watch);
        }
        registry::remove(self.key, &self.self_ref);
        debug!(
            "Tore down range selector on {:?}; released {} listeners",
            self.elements.container,
            bindings.listeners.len()
        );
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use range_selector_host::{Document, Host, MemoryDocument};

    use super::{BindMode, bind};
    use crate::{args::RangeSelectorArgs, error::Error, range_selector::markup::class};

    fn args() -> RangeSelectorArgs {
        RangeSelectorArgs::default()
            .selector("#slot")
            .from(20.0)
            .to(80.0)
    }

    #[test]
    fn unresolved_and_ambiguous_selectors_fail() {
        let document = MemoryDocument::new();
        let host: Arc<dyn Host> = document.clone();

        let err = bind(host.clone(), args(), BindMode::Build).unwrap_err();
        assert!(matches!(err, Error::SelectorNotFound { .. }));

        document.append_with_id(document.body(), "div", "slot");
        document.append_with_id(document.body(), "div", "slot");
        let err = bind(host, args(), BindMode::Build).unwrap_err();
        assert_eq!(
            err,
            Error::AmbiguousSelector {
                selector: "#slot".into(),
                count: 2
            }
        );
    }

    #[test]
    fn invalid_configuration_leaves_the_container_untouched() {
        let document = MemoryDocument::new();
        let slot = document.append_with_id(document.body(), "div", "slot");

        let err = bind(document.clone(), args().from(90.0), BindMode::Build).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
        assert!(document.children(slot).is_empty());
        assert_eq!(document.listener_count(), 0);
    }

    #[test]
    fn binding_registers_listeners_and_an_observer() {
        let document = MemoryDocument::new();
        document.append_with_id(document.body(), "div", "slot");

        let shared = bind(document.clone(), args(), BindMode::Build).expect("bind");
        assert_eq!(document.listener_count(), 8);
        assert_eq!(document.watch_count(), 1);

        let elements = shared.elements;
        assert!(document.has_class(elements.group, class::GROUP));
        assert_eq!(
            document.attribute(elements.handle_from, "aria-valuenow").as_deref(),
            Some("20")
        );

        shared.teardown();
        shared.teardown();
        assert_eq!(document.listener_count(), 0);
        assert_eq!(document.removed_listener_count(), 8);
        assert_eq!(document.watch_count(), 0);
    }

    #[test]
    fn teardown_frees_the_container_for_a_new_binding() {
        let document = MemoryDocument::new();
        document.append_with_id(document.body(), "div", "slot");

        let first = bind(document.clone(), args(), BindMode::Build).expect("bind");
        assert!(matches!(
            bind(document.clone(), args(), BindMode::Attach),
            Err(Error::AlreadyBound { .. })
        ));

        drop(first);
        assert_eq!(document.listener_count(), 0);
        bind(document.clone(), args(), BindMode::Attach).expect("rebind over existing markup");
    }
}
