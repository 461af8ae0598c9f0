use range_selector_host::{Host, Rect};

use super::{
    markup::{Elements, class},
    model::{RangeBounds, SelectedRange},
};

/// Boxes measured at bind time and on every observed resize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct GeometryCache {
    pub container: Rect,
    pub track: Rect,
}

impl GeometryCache {
    pub fn capture(host: &dyn Host, elements: &Elements) -> Self {
        Self {
            container: host.bounding_rect(elements.container),
            track: host.bounding_rect(elements.track),
        }
    }

    /// Track start in container coordinates.
    fn track_start(&self) -> f64 {
        self.track.relative_to(&self.container).left
    }
}

/// Horizontal label corrections, in pixels, applied on top of each label's
/// nominal position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelLayout {
    pub from_offset: f64,
    pub to_offset: f64,
    pub min_offset: f64,
    pub max_offset: f64,
    /// The value labels had to be pushed apart. Presentation only.
    pub collided: bool,
}

/// Everything label resolution needs, in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LabelMetrics {
    pub container_width: f64,
    pub track_start: f64,
    pub track_width: f64,
    pub from_percent: f64,
    pub to_percent: f64,
    pub from_width: f64,
    pub to_width: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Both value labels are rendered.
    pub values_rendered: bool,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    left: f64,
    width: f64,
}

impl Span {
    fn centered(center: f64, width: f64, offset: f64) -> Self {
        Self {
            left: center - width / 2.0 + offset,
            width,
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }
}

impl LabelMetrics {
    fn anchor(&self, percent: f64) -> f64 {
        self.track_start + self.track_width * percent / 100.0
    }

    fn from_span(&self, layout: &LabelLayout) -> Span {
        Span::centered(
            self.anchor(self.from_percent),
            self.from_width,
            layout.from_offset,
        )
    }

    fn to_span(&self, layout: &LabelLayout) -> Span {
        Span::centered(self.anchor(self.to_percent), self.to_width, layout.to_offset)
    }
}

/// Resolves label offsets.
///
/// Value labels are corrected in a fixed order, re-measuring between passes:
/// center collision, then right overflow of the "to" label, then left
/// overflow of the "from" label. Static bound labels are clamped to the
/// container independently.
pub(crate) fn resolve_labels(metrics: &LabelMetrics) -> LabelLayout {
    let mut layout = LabelLayout::default();
    clamp_static_labels(metrics, &mut layout);

    if !metrics.values_rendered {
        return layout;
    }

    let (from, to) = (metrics.from_span(&layout), metrics.to_span(&layout));
    if from.right() > to.left {
        let half = (from.right() - to.left) / 2.0;
        layout.from_offset -= half;
        layout.to_offset += half;
        layout.collided = true;
    }

    let to = metrics.to_span(&layout);
    if to.right() > metrics.container_width {
        layout.to_offset -= to.right() - metrics.container_width;
        let (from, to) = (metrics.from_span(&layout), metrics.to_span(&layout));
        if from.right() > to.left {
            layout.from_offset -= from.right() - to.left;
            layout.collided = true;
        }
    }

    let from = metrics.from_span(&layout);
    if from.left < 0.0 {
        layout.from_offset -= from.left;
        let (from, to) = (metrics.from_span(&layout), metrics.to_span(&layout));
        if from.right() > to.left {
            layout.to_offset += from.right() - to.left;
            layout.collided = true;
        }
    }

    layout
}

fn clamp_static_labels(metrics: &LabelMetrics, layout: &mut LabelLayout) {
    let min_left = metrics.anchor(0.0) - metrics.min_width / 2.0;
    if min_left < 0.0 {
        layout.min_offset = -min_left;
    }
    let max_right = metrics.anchor(100.0) + metrics.max_width / 2.0;
    if max_right > metrics.container_width {
        layout.max_offset = metrics.container_width - max_right;
    }
}

/// Positions handles, bar and labels for the current values and returns the
/// resolved label layout.
pub(crate) fn render(
    host: &dyn Host,
    elements: &Elements,
    geometry: &GeometryCache,
    bounds: &RangeBounds,
    range: &SelectedRange,
) -> LabelLayout {
    let from_percent = bounds.percent(range.from);
    let to_percent = bounds.percent(range.to);

    for (element, percent) in [
        (elements.handle_from, from_percent),
        (elements.label_from, from_percent),
        (elements.handle_to, to_percent),
        (elements.label_to, to_percent),
    ] {
        host.set_style(element, "left", &percent_css(percent));
    }
    host.set_style(elements.bar, "left", &percent_css(from_percent));
    host.set_style(elements.bar, "width", &percent_css(to_percent - from_percent));

    let metrics = LabelMetrics {
        container_width: geometry.container.width,
        track_start: geometry.track_start(),
        track_width: geometry.track.width,
        from_percent,
        to_percent,
        from_width: host.bounding_rect(elements.label_from).width,
        to_width: host.bounding_rect(elements.label_to).width,
        min_width: host.bounding_rect(elements.label_min).width,
        max_width: host.bounding_rect(elements.label_max).width,
        values_rendered: host.is_rendered(elements.label_from)
            && host.is_rendered(elements.label_to),
    };
    let layout = resolve_labels(&metrics);

    for (element, offset) in [
        (elements.label_from, layout.from_offset),
        (elements.label_to, layout.to_offset),
        (elements.label_min, layout.min_offset),
        (elements.label_max, layout.max_offset),
    ] {
        host.set_style(element, "transform", &translate_css(offset));
    }
    host.toggle_class(elements.group, class::COLLIDED, layout.collided);

    layout
}

fn percent_css(percent: f64) -> String {
    format!("{percent}%")
}

fn translate_css(offset: f64) -> String {
    format!("translateX({offset}px)")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{LabelLayout, LabelMetrics, resolve_labels};

    const EPSILON: f64 = 1e-9;

    fn metrics(from_percent: f64, to_percent: f64, label_width: f64) -> LabelMetrics {
        LabelMetrics {
            container_width: 300.0,
            track_start: 0.0,
            track_width: 300.0,
            from_percent,
            to_percent,
            from_width: label_width,
            to_width: label_width,
            min_width: 16.0,
            max_width: 24.0,
            values_rendered: true,
        }
    }

    #[test]
    fn distant_labels_stay_put() {
        let layout = resolve_labels(&metrics(20.0, 80.0, 40.0));
        assert_eq!(layout.from_offset, 0.0);
        assert_eq!(layout.to_offset, 0.0);
        assert!(!layout.collided);
    }

    #[test]
    fn overlapping_labels_split_the_overlap() {
        // Centers at 135 and 165, 48px wide: 18px overlap.
        let layout = resolve_labels(&metrics(45.0, 55.0, 48.0));
        assert_eq!(layout.from_offset, -9.0);
        assert_eq!(layout.to_offset, 9.0);
        assert!(layout.collided);
    }

    #[test]
    fn right_overflow_pushes_both_labels_left() {
        // Centers at 285 and 300, 40px wide.
        let layout = resolve_labels(&metrics(95.0, 100.0, 40.0));
        let to_right = 300.0 - 20.0 + layout.to_offset + 40.0;
        let from_right = 285.0 - 20.0 + layout.from_offset + 40.0;
        let to_left = 300.0 - 20.0 + layout.to_offset;
        assert!((to_right - 300.0).abs() < EPSILON);
        assert!(from_right <= to_left + EPSILON);
        assert!(layout.collided);
    }

    #[test]
    fn left_overflow_pushes_from_right_without_collision() {
        // From centered at 0 overflows by 20px; to is far away.
        let layout = resolve_labels(&metrics(0.0, 90.0, 40.0));
        assert_eq!(layout.from_offset, 20.0);
        assert_eq!(layout.to_offset, 0.0);
        assert!(!layout.collided);
    }

    #[test]
    fn hidden_value_labels_skip_collision_resolution() {
        let mut input = metrics(45.0, 55.0, 48.0);
        input.values_rendered = false;
        let layout = resolve_labels(&input);
        assert_eq!(layout.from_offset, 0.0);
        assert_eq!(layout.to_offset, 0.0);
        assert!(!layout.collided);
    }

    #[test]
    fn static_labels_are_clamped_to_the_container() {
        let layout = resolve_labels(&metrics(20.0, 80.0, 40.0));
        assert_eq!(
            layout,
            LabelLayout {
                min_offset: 8.0,
                max_offset: -12.0,
                ..LabelLayout::default()
            }
        );

        let mut inset = metrics(20.0, 80.0, 40.0);
        inset.track_start = 20.0;
        inset.track_width = 260.0;
        let layout = resolve_labels(&inset);
        assert_eq!(layout.min_offset, 0.0);
        assert_eq!(layout.max_offset, 0.0);
    }

    proptest! {
        #[test]
        fn resolved_labels_fit_and_never_overlap(
            container_width in 100.0..1000.0f64,
            a in 0.0..=100.0f64,
            b in 0.0..=100.0f64,
            from_share in 0.05..0.5f64,
            to_share in 0.05..0.5f64,
        ) {
            let (from_percent, to_percent) = if a <= b { (a, b) } else { (b, a) };
            let input = LabelMetrics {
                container_width,
                track_start: 0.0,
                track_width: container_width,
                from_percent,
                to_percent,
                from_width: container_width * from_share,
                to_width: container_width * to_share,
                min_width: 10.0,
                max_width: 10.0,
                values_rendered: true,
            };
            let layout = resolve_labels(&input);

            let from_left = input.track_width * from_percent / 100.0
                - input.from_width / 2.0
                + layout.from_offset;
            let from_right = from_left + input.from_width;
            let to_left = input.track_width * to_percent / 100.0
                - input.to_width / 2.0
                + layout.to_offset;
            let to_right = to_left + input.to_width;

            prop_assert!(from_left >= -EPSILON);
            prop_assert!(to_right <= container_width + EPSILON);
            prop_assert!(from_right <= to_left + EPSILON);
        }
    }
}
