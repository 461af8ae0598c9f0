use range_selector_host::{ElementId, Host};
use tracing::warn;

use super::model::{Handle, RangeBounds, SelectedRange};
use crate::{args::Formatter, error::Error};

/// Class names identifying the structural elements.
pub(crate) mod class {
    pub const GROUP: &str = "range-selector";
    pub const TRACK: &str = "range-selector__track";
    pub const BAR: &str = "range-selector__bar";
    pub const HANDLE: &str = "range-selector__handle";
    pub const HANDLE_FROM: &str = "range-selector__handle--from";
    pub const HANDLE_TO: &str = "range-selector__handle--to";
    pub const LABEL: &str = "range-selector__label";
    pub const LABEL_FROM: &str = "range-selector__label--from";
    pub const LABEL_TO: &str = "range-selector__label--to";
    pub const LABEL_MIN: &str = "range-selector__label--min";
    pub const LABEL_MAX: &str = "range-selector__label--max";
    pub const COLLIDED: &str = "range-selector--collided";
}

const STEP_ATTRIBUTE: &str = "data-step";

/// The elements a bound widget reads from and writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Elements {
    pub container: ElementId,
    pub group: ElementId,
    pub track: ElementId,
    pub bar: ElementId,
    pub handle_from: ElementId,
    pub handle_to: ElementId,
    pub label_from: ElementId,
    pub label_to: ElementId,
    pub label_min: ElementId,
    pub label_max: ElementId,
}

impl Elements {
    pub fn handle(&self, handle: Handle) -> ElementId {
        match handle {
            Handle::From => self.handle_from,
            Handle::To => self.handle_to,
        }
    }

    /// Whether `element` is a handle or a value label riding on one.
    pub fn is_handle_part(&self, element: ElementId) -> bool {
        [
            self.handle_from,
            self.handle_to,
            self.label_from,
            self.label_to,
        ]
        .contains(&element)
    }
}

fn element(host: &dyn Host, parent: ElementId, tag: &str, classes: &[&str]) -> ElementId {
    let element = host.create_element(parent, tag);
    host.set_attribute(element, "class", &classes.join(" "));
    element
}

fn handle(host: &dyn Host, parent: ElementId, modifier: &str) -> ElementId {
    let handle = element(host, parent, "div", &[class::HANDLE, modifier]);
    host.set_attribute(handle, "role", "slider");
    host.set_attribute(handle, "tabindex", "0");
    host.set_attribute(handle, "aria-orientation", "horizontal");
    handle
}

/// Creates the widget structure inside `container`.
pub(crate) fn generate(host: &dyn Host, container: ElementId, label: &str) -> Elements {
    let group = element(host, container, "div", &[class::GROUP]);
    host.set_attribute(group, "role", "group");
    host.set_attribute(group, "aria-label", label);

    let label_min = element(host, group, "span", &[class::LABEL, class::LABEL_MIN]);
    let label_max = element(host, group, "span", &[class::LABEL, class::LABEL_MAX]);
    let track = element(host, group, "div", &[class::TRACK]);
    let bar = element(host, track, "div", &[class::BAR]);
    let handle_from = handle(host, track, class::HANDLE_FROM);
    let handle_to = handle(host, track, class::HANDLE_TO);
    let label_from = element(host, track, "span", &[class::LABEL, class::LABEL_FROM]);
    let label_to = element(host, track, "span", &[class::LABEL, class::LABEL_TO]);

    Elements {
        container,
        group,
        track,
        bar,
        handle_from,
        handle_to,
        label_from,
        label_to,
        label_min,
        label_max,
    }
}

fn first(
    host: &dyn Host,
    root: ElementId,
    class: &str,
    name: &'static str,
) -> Result<ElementId, Error> {
    host.query_within(root, &format!(".{class}"))
        .into_iter()
        .next()
        .ok_or(Error::MissingElement(name))
}

/// Finds an existing structure inside `container`.
pub(crate) fn locate(host: &dyn Host, container: ElementId) -> Result<Elements, Error> {
    let group = if host.has_class(container, class::GROUP) {
        container
    } else {
        first(host, container, class::GROUP, "group")?
    };
    Ok(Elements {
        container,
        group,
        track: first(host, group, class::TRACK, "track")?,
        bar: first(host, group, class::BAR, "bar")?,
        handle_from: first(host, group, class::HANDLE_FROM, "from handle")?,
        handle_to: first(host, group, class::HANDLE_TO, "to handle")?,
        label_from: first(host, group, class::LABEL_FROM, "from label")?,
        label_to: first(host, group, class::LABEL_TO, "to label")?,
        label_min: first(host, group, class::LABEL_MIN, "min label")?,
        label_max: first(host, group, class::LABEL_MAX, "max label")?,
    })
}

fn number(host: &dyn Host, element: ElementId, name: &str) -> Option<f64> {
    let raw = host.attribute(element, name)?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!("Ignoring non-numeric {name}=\"{raw}\" on {element:?}");
            None
        }
    }
}

/// Reads bounds and values from existing markup, falling back to the
/// configured ones per attribute.
pub(crate) fn read_initial(
    host: &dyn Host,
    elements: &Elements,
    bounds: RangeBounds,
    range: SelectedRange,
) -> (RangeBounds, SelectedRange) {
    let bounds = RangeBounds {
        min: number(host, elements.handle_from, "aria-valuemin").unwrap_or(bounds.min),
        max: number(host, elements.handle_to, "aria-valuemax").unwrap_or(bounds.max),
        step: number(host, elements.group, STEP_ATTRIBUTE).unwrap_or(bounds.step),
    };
    let range = SelectedRange {
        from: number(host, elements.handle_from, "aria-valuenow").unwrap_or(range.from),
        to: number(host, elements.handle_to, "aria-valuenow").unwrap_or(range.to),
    };
    (bounds, range)
}

/// Formatted values for one render.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DisplayText {
    pub from: String,
    pub to: String,
    pub min: String,
    pub max: String,
}

impl DisplayText {
    pub fn format(formatter: &Formatter, bounds: &RangeBounds, range: &SelectedRange) -> Self {
        Self {
            from: formatter.call(range.from),
            to: formatter.call(range.to),
            min: formatter.call(bounds.min),
            max: formatter.call(bounds.max),
        }
    }
}

/// Synchronizes accessibility attributes and label text with the model.
pub(crate) fn write_state(
    host: &dyn Host,
    elements: &Elements,
    bounds: &RangeBounds,
    range: &SelectedRange,
    text: &DisplayText,
) {
    host.set_attribute(elements.group, STEP_ATTRIBUTE, &bounds.step.to_string());
    for (handle, value, value_text) in [
        (elements.handle_from, range.from, &text.from),
        (elements.handle_to, range.to, &text.to),
    ] {
        host.set_attribute(handle, "aria-orientation", "horizontal");
        host.set_attribute(handle, "aria-valuemin", &bounds.min.to_string());
        host.set_attribute(handle, "aria-valuemax", &bounds.max.to_string());
        host.set_attribute(handle, "aria-valuenow", &value.to_string());
        host.set_attribute(handle, "aria-valuetext", value_text);
    }
    host.set_text(elements.label_from, &text.from);
    host.set_text(elements.label_to, &text.to);
    host.set_text(elements.label_min, &text.min);
    host.set_text(elements.label_max, &text.max);
}

/// Stacks the active handle above the other one.
pub(crate) fn raise_handle(host: &dyn Host, elements: &Elements, active: Handle) {
    host.set_style(elements.handle(active), "z-index", "2");
    host.set_style(elements.handle(active.other()), "z-index", "1");
}

#[cfg(test)]
mod tests {
    use range_selector_host::{Document, MemoryDocument};

    use super::{class, generate, locate, read_initial};
    use crate::{
        error::Error,
        range_selector::model::{RangeBounds, SelectedRange},
    };

    #[test]
    fn generated_markup_can_be_located_again() {
        let document = MemoryDocument::new();
        let container = document.append_with_id(document.body(), "div", "slot");

        let generated = generate(&*document, container, "Price");
        let located = locate(&*document, container).expect("complete markup");

        assert_eq!(generated, located);
        assert_eq!(
            document.attribute(generated.group, "aria-label").as_deref(),
            Some("Price")
        );
        assert_eq!(
            document.attribute(generated.handle_to, "role").as_deref(),
            Some("slider")
        );
    }

    #[test]
    fn missing_pieces_are_named() {
        let document = MemoryDocument::new();
        let container = document.append(document.body(), "div");
        let group = document.append(container, "div");
        document.toggle_class(group, class::GROUP, true);
        let track = document.append(group, "div");
        document.toggle_class(track, class::TRACK, true);

        assert_eq!(locate(&*document, container), Err(Error::MissingElement("bar")));
    }

    #[test]
    fn attributes_override_configuration() {
        let document = MemoryDocument::new();
        let container = document.append(document.body(), "div");
        let elements = generate(&*document, container, "Range");
        document.set_attribute(elements.handle_from, "aria-valuemin", "10");
        document.set_attribute(elements.handle_from, "aria-valuenow", "15");
        document.set_attribute(elements.handle_to, "aria-valuenow", "not a number");

        let (bounds, range) = read_initial(
            &*document,
            &elements,
            RangeBounds {
                min: 0.0,
                max: 100.0,
                step: 5.0,
            },
            SelectedRange {
                from: 20.0,
                to: 80.0,
            },
        );

        assert_eq!(bounds.min, 10.0);
        assert_eq!(bounds.max, 100.0);
        assert_eq!(range, SelectedRange { from: 15.0, to: 80.0 });
    }
}
