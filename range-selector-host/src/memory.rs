//! In-memory host document with a virtual clock.
//!
//! ## Usage
//!
//! Drive widgets deterministically in tests: build an element tree, assign
//! boxes, fire input events and advance time explicitly.
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use range_selector_host::{Document, MemoryDocument, Rect};
//!
//! let document = MemoryDocument::new();
//! let slot = document.append_with_id(document.body(), "div", "price");
//! document.set_rect(slot, Rect::new(0.0, 0.0, 300.0, 40.0));
//! assert_eq!(document.query_selector_all("#price"), vec![slot]);
//! document.advance(Duration::from_millis(16));
//! ```
//!
//! Elements without an explicit box but with text are measured as
//! `glyph_width` per character, which is enough for label layout tests.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    document::{
        Document, DocumentId, ElementId, EnvironmentWatcher, EventTarget, Listener, ListenerId,
        TimerId, Timers, WatchId,
    },
    event::{
        ClickEvent, EventKind, HostEvent, Key, KeyEvent, Observation, PointerEvent, PointerKind,
        PointerPhase,
    },
    geometry::Rect,
    prop::{Callback, CallbackWith},
};

const DEFAULT_GLYPH_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 16.0;

#[derive(Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: SmallVec<[String; 4]>,
    attributes: HashMap<String, String>,
    styles: HashMap<String, String>,
    text: String,
    rect: Option<Rect>,
    connected: bool,
    hidden: bool,
}

struct ListenerEntry {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    listener: Listener,
}

struct TimerEntry {
    id: TimerId,
    due: Duration,
    task: Callback,
}

struct WatchEntry {
    id: WatchId,
    element: ElementId,
    on_change: CallbackWith<Observation>,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<ElementId, Node>,
    next_element: u64,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
    removed_listeners: usize,
    timers: Vec<TimerEntry>,
    next_timer: u64,
    now: Duration,
    watches: Vec<WatchEntry>,
    next_watch: u64,
}

impl Inner {
    fn insert_node(&mut self, parent: Option<ElementId>, tag: &str) -> ElementId {
        self.next_element += 1;
        let id = ElementId::new(self.next_element);
        let connected = match parent {
            Some(parent) => self.nodes.get(&parent).is_some_and(|p| p.connected),
            None => true,
        };
        self.nodes.insert(
            id,
            Node {
                tag: tag.to_ascii_lowercase(),
                parent,
                connected,
                ..Node::default()
            },
        );
        if let Some(parent) = parent
            && let Some(node) = self.nodes.get_mut(&parent)
        {
            node.children.push(id);
        }
        id
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = match self.nodes.get(&root) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn ancestors_inclusive(&self, element: ElementId) -> Vec<ElementId> {
        let mut path = Vec::new();
        let mut current = Some(element);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                break;
            };
            path.push(id);
            current = node.parent;
        }
        path
    }

    fn matches(&self, element: ElementId, selector: &SimpleSelector) -> bool {
        let Some(node) = self.nodes.get(&element) else {
            return false;
        };
        if let Some(tag) = &selector.tag
            && &node.tag != tag
        {
            return false;
        }
        if let Some(id) = &selector.id
            && node.attributes.get("id") != Some(id)
        {
            return false;
        }
        selector
            .classes
            .iter()
            .all(|class| node.classes.iter().any(|c| c == class))
    }

    fn listeners_for(&self, event: &HostEvent) -> Vec<(ListenerId, Listener)> {
        let kind = event.kind();
        let target = event.target();
        let path = if event.bubbles() {
            self.ancestors_inclusive(target)
        } else {
            vec![target]
        };
        let mut out = Vec::new();
        for element in &path {
            out.extend(
                self.listeners
                    .iter()
                    .filter(|entry| {
                        entry.target == EventTarget::Element(*element) && entry.kind == kind
                    })
                    .map(|entry| (entry.id, entry.listener.clone())),
            );
        }
        let reaches_document =
            event.bubbles() && self.nodes.get(&target).is_some_and(|node| node.connected);
        if reaches_document {
            out.extend(
                self.listeners
                    .iter()
                    .filter(|entry| entry.target == EventTarget::Document && entry.kind == kind)
                    .map(|entry| (entry.id, entry.listener.clone())),
            );
        }
        out
    }
}

#[derive(Default)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl SimpleSelector {
    /// Parses `tag`, `#id`, `.class` and compounds such as `div.a.b`.
    fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() || selector.contains(char::is_whitespace) {
            return None;
        }
        let mut parsed = SimpleSelector::default();
        let tag_end = selector.find(['.', '#']).unwrap_or(selector.len());
        if tag_end > 0 {
            parsed.tag = Some(selector[..tag_end].to_ascii_lowercase());
        }
        let mut rest = &selector[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[marker.len_utf8()..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match marker {
                '.' => parsed.classes.push(name.to_string()),
                '#' => parsed.id = Some(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(parsed)
    }
}

/// A document held entirely in memory.
pub struct MemoryDocument {
    id: DocumentId,
    body: ElementId,
    glyph_width: f64,
    inner: Mutex<Inner>,
}

impl MemoryDocument {
    /// Creates an empty document containing only `<body>`.
    pub fn new() -> Arc<Self> {
        Self::with_glyph_width(DEFAULT_GLYPH_WIDTH)
    }

    /// Creates an empty document measuring text at `glyph_width` per char.
    pub fn with_glyph_width(glyph_width: f64) -> Arc<Self> {
        let mut inner = Inner::default();
        let body = inner.insert_node(None, "body");
        Arc::new(Self {
            id: DocumentId::next(),
            body,
            glyph_width,
            inner: Mutex::new(inner),
        })
    }

    /// The `<body>` element.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Appends a new element to `parent`.
    pub fn append(&self, parent: ElementId, tag: &str) -> ElementId {
        self.inner.lock().insert_node(Some(parent), tag)
    }

    /// Appends a new element carrying an `id` attribute.
    pub fn append_with_id(&self, parent: ElementId, tag: &str, id: &str) -> ElementId {
        let element = self.append(parent, tag);
        self.set_attribute(element, "id", id);
        element
    }

    /// Assigns a fixed bounding box without notifying watchers.
    pub fn set_rect(&self, element: ElementId, rect: Rect) {
        if let Some(node) = self.inner.lock().nodes.get_mut(&element) {
            node.rect = Some(rect);
        }
    }

    /// Assigns a new bounding box and notifies watchers of `element`.
    pub fn resize(&self, element: ElementId, rect: Rect) {
        let watchers: Vec<_> = {
            let mut inner = self.inner.lock();
            if let Some(node) = inner.nodes.get_mut(&element) {
                node.rect = Some(rect);
            }
            inner
                .watches
                .iter()
                .filter(|watch| watch.element == element)
                .map(|watch| watch.on_change.clone())
                .collect()
        };
        for on_change in watchers {
            on_change.call(Observation::Resized(rect));
        }
    }

    /// Detaches `element` and its subtree, notifying watchers inside it.
    pub fn remove(&self, element: ElementId) {
        let watchers: Vec<_> = {
            let mut inner = self.inner.lock();
            let mut subtree = inner.descendants(element);
            subtree.push(element);
            for id in &subtree {
                if let Some(node) = inner.nodes.get_mut(id) {
                    node.connected = false;
                }
            }
            let parent = inner.nodes.get_mut(&element).and_then(|node| node.parent.take());
            if let Some(parent) = parent
                && let Some(node) = inner.nodes.get_mut(&parent)
            {
                node.children.retain(|child| *child != element);
            }
            inner
                .watches
                .iter()
                .filter(|watch| subtree.contains(&watch.element))
                .map(|watch| watch.on_change.clone())
                .collect()
        };
        trace!("Removed element {element:?}; notifying {} watchers", watchers.len());
        for on_change in watchers {
            on_change.call(Observation::Removed);
        }
    }

    /// Hides or shows an element without detaching it.
    pub fn set_hidden(&self, element: ElementId, hidden: bool) {
        if let Some(node) = self.inner.lock().nodes.get_mut(&element) {
            node.hidden = hidden;
        }
    }

    /// Text content of `element`.
    pub fn text(&self, element: ElementId) -> String {
        self.inner
            .lock()
            .nodes
            .get(&element)
            .map(|node| node.text.clone())
            .unwrap_or_default()
    }

    /// Inline style property of `element`.
    pub fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.inner
            .lock()
            .nodes
            .get(&element)
            .and_then(|node| node.styles.get(property).cloned())
    }

    /// Direct children of `element`.
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.inner
            .lock()
            .nodes
            .get(&element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Fires a pointer event.
    pub fn pointer(&self, phase: PointerPhase, kind: PointerKind, target: ElementId, x: f64) {
        self.dispatch(HostEvent::Pointer(PointerEvent {
            phase,
            kind,
            x,
            target,
        }));
    }

    /// Presses the mouse over `target`.
    pub fn pointer_down(&self, target: ElementId, x: f64) {
        self.pointer(PointerPhase::Down, PointerKind::Mouse, target, x);
    }

    /// Moves the mouse; the event targets `<body>`.
    pub fn pointer_move(&self, x: f64) {
        self.pointer(PointerPhase::Move, PointerKind::Mouse, self.body, x);
    }

    /// Releases the mouse; the event targets `<body>`.
    pub fn pointer_up(&self, x: f64) {
        self.pointer(PointerPhase::Up, PointerKind::Mouse, self.body, x);
    }

    /// Fires a click at `target`.
    pub fn click(&self, target: ElementId, x: f64) {
        self.dispatch(HostEvent::Click(ClickEvent { x, target }));
    }

    /// Fires a key press at `target`.
    pub fn key_down(&self, target: ElementId, key: Key) {
        self.dispatch(HostEvent::Key(KeyEvent { key, target }));
    }

    /// Advances the virtual clock, running every task that falls due.
    pub fn advance(&self, by: Duration) {
        let deadline = self.inner.lock().now + by;
        loop {
            let task = {
                let mut inner = self.inner.lock();
                let next = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= deadline)
                    .min_by_key(|(_, timer)| (timer.due, timer.id.0))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => {
                        let timer = inner.timers.remove(index);
                        inner.now = inner.now.max(timer.due);
                        timer.task
                    }
                    None => break,
                }
            };
            task.call();
        }
        self.inner.lock().now = deadline;
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Number of tasks waiting to run.
    pub fn pending_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Number of successful [`Document::remove_listener`] calls so far.
    pub fn removed_listener_count(&self) -> usize {
        self.inner.lock().removed_listeners
    }

    /// Number of active observations.
    pub fn watch_count(&self) -> usize {
        self.inner.lock().watches.len()
    }
}

impl Document for MemoryDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(selector) = SimpleSelector::parse(selector) else {
            return Vec::new();
        };
        let inner = self.inner.lock();
        let mut candidates = vec![self.body];
        candidates.extend(inner.descendants(self.body));
        candidates
            .into_iter()
            .filter(|id| inner.matches(*id, &selector))
            .collect()
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let Some(selector) = SimpleSelector::parse(selector) else {
            return Vec::new();
        };
        let inner = self.inner.lock();
        inner
            .descendants(root)
            .into_iter()
            .filter(|id| inner.matches(*id, &selector))
            .collect()
    }

    fn create_element(&self, parent: ElementId, tag: &str) -> ElementId {
        self.append(parent, tag)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let inner = self.inner.lock();
        let node = inner.nodes.get(&element)?;
        if name == "class" {
            return Some(node.classes.join(" "));
        }
        node.attributes.get(name).cloned()
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        let mut inner = self.inner.lock();
        let Some(node) = inner.nodes.get_mut(&element) else {
            return;
        };
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.inner
            .lock()
            .nodes
            .get(&element)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    fn toggle_class(&self, element: ElementId, class: &str, enabled: bool) {
        let mut inner = self.inner.lock();
        let Some(node) = inner.nodes.get_mut(&element) else {
            return;
        };
        let present = node.classes.iter().any(|c| c == class);
        if enabled && !present {
            node.classes.push(class.to_string());
        } else if !enabled && present {
            node.classes.retain(|c| c != class);
        }
    }

    fn set_text(&self, element: ElementId, text: &str) {
        if let Some(node) = self.inner.lock().nodes.get_mut(&element) {
            node.text = text.to_string();
        }
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.inner.lock().nodes.get_mut(&element) {
            node.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        let inner = self.inner.lock();
        let Some(node) = inner.nodes.get(&element) else {
            return Rect::ZERO;
        };
        if let Some(rect) = node.rect {
            return rect;
        }
        if node.text.is_empty() {
            return Rect::ZERO;
        }
        let width = node.text.chars().count() as f64 * self.glyph_width;
        Rect::new(0.0, 0.0, width, LINE_HEIGHT)
    }

    fn is_rendered(&self, element: ElementId) -> bool {
        let inner = self.inner.lock();
        let connected = inner.nodes.get(&element).is_some_and(|node| node.connected);
        connected
            && inner
                .ancestors_inclusive(element)
                .iter()
                .all(|id| inner.nodes.get(id).is_some_and(|node| !node.hidden))
    }

    fn add_listener(
        &self,
        target: EventTarget,
        kind: EventKind,
        listener: Listener,
    ) -> ListenerId {
        let mut inner = self.inner.lock();
        inner.next_listener += 1;
        let id = ListenerId(inner.next_listener);
        inner.listeners.push(ListenerEntry {
            id,
            target,
            kind,
            listener,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|entry| entry.id != id);
        let removed = inner.listeners.len() != before;
        if removed {
            inner.removed_listeners += 1;
        }
        removed
    }

    fn dispatch(&self, event: HostEvent) {
        let listeners = self.inner.lock().listeners_for(&event);
        for (id, listener) in listeners {
            // A listener earlier in the path may have removed this one.
            let registered = self
                .inner
                .lock()
                .listeners
                .iter()
                .any(|entry| entry.id == id);
            if registered {
                listener.call(event.clone());
            }
        }
    }
}

impl Timers for MemoryDocument {
    fn set_timeout(&self, delay: Duration, task: Callback) -> TimerId {
        let mut inner = self.inner.lock();
        inner.next_timer += 1;
        let id = TimerId(inner.next_timer);
        let due = inner.now + delay;
        inner.timers.push(TimerEntry { id, due, task });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.inner.lock().timers.retain(|timer| timer.id != id);
    }
}

impl EnvironmentWatcher for MemoryDocument {
    fn observe(&self, element: ElementId, on_change: CallbackWith<Observation>) -> WatchId {
        let mut inner = self.inner.lock();
        inner.next_watch += 1;
        let id = WatchId(inner.next_watch);
        inner.watches.push(WatchEntry {
            id,
            element,
            on_change,
        });
        id
    }

    fn unobserve(&self, id: WatchId) {
        self.inner.lock().watches.retain(|watch| watch.id != id);
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

    use parking_lot::Mutex;

    use super::MemoryDocument;
    use crate::{
        document::{Document, EnvironmentWatcher, EventTarget, Timers},
        event::{EventKind, HostEvent, Observation},
        geometry::Rect,
        prop::{Callback, CallbackWith},
    };

    #[test]
    fn selectors_match_tags_ids_and_classes() {
        let document = MemoryDocument::new();
        let slot = document.append_with_id(document.body(), "div", "slot");
        let inner = document.append(slot, "span");
        document.toggle_class(inner, "label", true);
        document.toggle_class(inner, "label--from", true);

        assert_eq!(document.query_selector_all("#slot"), vec![slot]);
        assert_eq!(document.query_selector_all("span.label.label--from"), vec![inner]);
        assert_eq!(document.query_within(slot, ".label"), vec![inner]);
        assert!(document.query_selector_all("div .label").is_empty());
        assert!(document.query_selector_all("#").is_empty());
    }

    #[test]
    fn timers_run_in_due_order_and_can_be_cleared() {
        let document = MemoryDocument::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (delay, tag) in [(30, "late"), (10, "early"), (20, "cleared")] {
            let order = Arc::clone(&order);
            let id = document.set_timeout(
                Duration::from_millis(delay),
                Callback::new(move || order.lock().push(tag)),
            );
            if tag == "cleared" {
                document.clear_timeout(id);
            }
        }

        document.advance(Duration::from_millis(15));
        assert_eq!(*order.lock(), vec!["early"]);
        document.advance(Duration::from_millis(15));
        assert_eq!(*order.lock(), vec!["early", "late"]);
        assert_eq!(document.pending_timers(), 0);
        assert_eq!(document.now(), Duration::from_millis(30));
    }

    #[test]
    fn events_bubble_to_ancestors_then_document() {
        let document = MemoryDocument::new();
        let outer = document.append(document.body(), "div");
        let inner = document.append(outer, "button");
        let order = Arc::new(Mutex::new(Vec::new()));

        for (target, tag) in [
            (EventTarget::Document, "document"),
            (EventTarget::Element(outer), "outer"),
            (EventTarget::Element(inner), "inner"),
        ] {
            let order = Arc::clone(&order);
            document.add_listener(
                target,
                EventKind::Click,
                CallbackWith::new(move |_event: HostEvent| order.lock().push(tag)),
            );
        }

        document.click(inner, 5.0);
        assert_eq!(*order.lock(), vec!["inner", "outer", "document"]);
    }

    #[test]
    fn removal_notifies_watchers_inside_the_subtree() {
        let document = MemoryDocument::new();
        let outer = document.append(document.body(), "div");
        let inner = document.append(outer, "div");
        let removed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&removed);
        document.observe(
            inner,
            CallbackWith::new(move |observation: Observation| {
                if observation == Observation::Removed {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );

        document.remove(outer);

        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(!document.is_rendered(inner));
        assert!(document.query_selector_all("div").is_empty());
    }

    #[test]
    fn text_is_measured_per_glyph() {
        let document = MemoryDocument::with_glyph_width(10.0);
        let label = document.append(document.body(), "span");
        document.set_text(label, "42.5");
        assert_eq!(document.bounding_rect(label).width, 40.0);

        document.set_rect(label, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(document.bounding_rect(label), Rect::new(1.0, 2.0, 3.0, 4.0));
    }
}
