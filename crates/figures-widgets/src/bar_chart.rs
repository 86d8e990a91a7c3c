//! Time-bucket bar charts: `bar_chart` and the grouped `barbar_chart`.

use figures_core::{
    apply_zoom, compute_domains, value_domain, Choreography, ColorScale, DomainKind, Element,
    Figure, FigureError, FigureSpec, Geometry, GestureEvent, KeyRule, KeyedLayer, LinearScale,
    Margin, Point, PositionDomain, Rect, RenderSurface, Shape, Size, TimeScale, TitleLayer,
    ZoomBehavior, DEFAULT_DURATION, DEFAULT_MAX_ZOOM,
};
use std::time::Duration;

/// Number of y-axis ticks.
const Y_TICKS: usize = 4;
/// Number of x-axis ticks at zoom factor 1.
const X_TICKS_PER_ZOOM: f64 = 6.0;
/// Opacity of the finer bars at zoom 1 and at full zoom.
const OPACITY_RANGE: [f64; 2] = [0.6, 0.9];

/// One labelled axis tick, offset within the plot area.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub offset: f64,
    pub label: String,
}

/// Axes of the last render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisModel {
    /// Time ticks along the bottom edge, inside the visible plot
    pub x: Vec<AxisTick>,
    /// Value ticks along the left edge
    pub y: Vec<AxisTick>,
    /// Y-axis caption, empty when the refresh carries none
    pub ylabel: String,
}

/// Scales of one bar chart refresh.
#[derive(Debug, Clone)]
pub struct BarScales {
    pub x: TimeScale,
    pub y: LinearScale,
    /// Fill of the enclosing bars
    pub fill: ColorScale,
    /// Zoom factor the scales were built for
    pub zoom: f64,
}

/// Bars over time buckets, zoomable along the time axis.
///
/// The grouped variant draws coarse enclosing bars from
/// [`FigureSpec::grouped_elements`] beneath the fine bars. The y domain then
/// follows the enclosing bars and the two layers cross-fade with the zoom.
#[derive(Debug)]
pub struct BarChart {
    grouped: bool,
    size: Size,
    margin: Margin,
    plot: Size,
    key: KeyRule,
    zoom: ZoomBehavior,
    title: TitleLayer,
    enclosing: KeyedLayer,
    bars: KeyedLayer,
    axes: AxisModel,
}

impl BarChart {
    /// Plain bar chart.
    #[must_use]
    pub fn new(size: Size, margin: Margin) -> Self {
        Self::build(false, size, margin)
    }

    /// Bar chart with enclosing bars.
    #[must_use]
    pub fn grouped(size: Size, margin: Margin) -> Self {
        Self::build(true, size, margin)
    }

    fn build(grouped: bool, size: Size, margin: Margin) -> Self {
        let plot = margin.inner(size);
        let mut title = TitleLayer::new();
        title.place(margin.left, margin.top, plot.width);
        Self {
            grouped,
            size,
            margin,
            plot,
            key: KeyRule::Timestamp,
            zoom: ZoomBehavior::new(Rect::from_size(plot), DEFAULT_MAX_ZOOM),
            title,
            enclosing: KeyedLayer::new("barbars", DEFAULT_DURATION).with_base_class("barbar"),
            bars: KeyedLayer::new("bars", DEFAULT_DURATION).with_base_class("bar"),
            axes: AxisModel::default(),
        }
    }

    /// Set the largest zoom factor.
    #[must_use]
    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.zoom = ZoomBehavior::new(Rect::from_size(self.plot), max_zoom);
        self
    }

    /// Set the duration of bar transitions.
    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.enclosing = KeyedLayer::new("barbars", duration).with_base_class("barbar");
        self.bars = KeyedLayer::new("bars", duration).with_base_class("bar");
        self
    }

    /// Set how bars are matched across refreshes.
    #[must_use]
    pub const fn with_key(mut self, key: KeyRule) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub const fn is_grouped(&self) -> bool {
        self.grouped
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn zoom(&self) -> &ZoomBehavior {
        &self.zoom
    }

    #[must_use]
    pub const fn axes(&self) -> &AxisModel {
        &self.axes
    }

    #[must_use]
    pub const fn bars(&self) -> &KeyedLayer {
        &self.bars
    }

    #[must_use]
    pub const fn enclosing_bars(&self) -> &KeyedLayer {
        &self.enclosing
    }

    fn origin(&self) -> Point {
        Point::new(self.margin.left, self.margin.top)
    }

    /// Opacity of the fine bars, and of the enclosing bars, at zoom `k`.
    fn opacities(&self, k: f64) -> (f64, f64) {
        let max_zoom = self.zoom.max_zoom();
        let fine = LinearScale::new([1.0, max_zoom], OPACITY_RANGE).scale(k);
        let coarse = LinearScale::new([max_zoom, 1.0], OPACITY_RANGE).scale(k);
        (fine, coarse)
    }

    fn build_axes(&self, spec: &FigureSpec, scales: &BarScales) -> AxisModel {
        let count = (X_TICKS_PER_ZOOM * scales.zoom).round() as usize;
        let x = scales
            .x
            .ticks(count)
            .into_iter()
            .map(|t| (scales.x.scale(t), t))
            .filter(|(offset, _)| (0.0..=self.plot.width).contains(offset))
            .map(|(offset, t)| AxisTick {
                offset,
                label: TimeScale::format_tick(t),
            })
            .collect();
        let y = scales
            .y
            .ticks(Y_TICKS)
            .into_iter()
            .map(|v| AxisTick {
                offset: scales.y.scale(v),
                label: format_value(v),
            })
            .collect();
        AxisModel {
            x,
            y,
            ylabel: spec.ylabel.clone().unwrap_or_default(),
        }
    }
}

/// Check every record carries a complete time bucket.
fn require_buckets(elements: &[Element]) -> Result<(), FigureError> {
    for (index, element) in elements.iter().enumerate() {
        if element.timestamp.is_none() {
            return Err(FigureError::MissingField {
                index,
                field: "timestamp",
            });
        }
        if element.timestep.is_none() {
            return Err(FigureError::MissingField {
                index,
                field: "timestep",
            });
        }
    }
    Ok(())
}

/// Axis label of a value tick.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.6}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl Figure for BarChart {
    type Scales = BarScales;

    fn ident(&self) -> &'static str {
        if self.grouped {
            "barbar_chart"
        } else {
            "bar_chart"
        }
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface) {
        self.title.setup(surface);
        if self.grouped {
            self.enclosing.setup(surface);
        }
        self.bars.setup(surface);
    }

    fn compute_domains(&self, spec: &FigureSpec) -> Result<BarScales, FigureError> {
        require_buckets(&spec.elements)?;
        let domains = compute_domains(&spec.elements, &DomainKind::Time)?;
        let value = if self.grouped {
            require_buckets(&spec.grouped_elements)?;
            value_domain(&spec.grouped_elements)
        } else {
            domains.value
        };
        let transform = self.zoom.transform();
        let range = apply_zoom([0.0, self.plot.width], &transform);
        let x = match domains.position {
            PositionDomain::Time { start, end } => TimeScale::new([start, end], range),
            _ => TimeScale::new([0.0, 0.0], range),
        };
        Ok(BarScales {
            x,
            y: LinearScale::new(value, [self.plot.height, 0.0]).rounded(),
            fill: ColorScale::traffic_light(value[1]),
            zoom: transform.k,
        })
    }

    fn render(
        &mut self,
        spec: &FigureSpec,
        scales: &BarScales,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        let key = self.key;
        let title = self.title.plan(spec)?;
        let enclosing = if self.grouped {
            Some(
                self.enclosing
                    .plan(spec.grouped_elements.clone(), |i, e| key.extract(i, e))?,
            )
        } else {
            None
        };
        let bars = self
            .bars
            .plan(spec.elements.clone(), |i, e| key.extract(i, e))?;

        let (fine, coarse) = self.opacities(scales.zoom);
        let origin = self.origin();
        let baseline = self.plot.height;

        self.title.render(title, now, surface);
        if let Some(plan) = enclosing {
            let placement = BarPlacement {
                scales,
                origin,
                baseline,
                opacity: coarse,
                filled: true,
            };
            self.enclosing.render(plan, &placement, now, surface);
        }
        let placement = BarPlacement {
            scales,
            origin,
            baseline,
            opacity: if self.grouped { fine } else { 1.0 },
            filled: false,
        };
        self.bars.render(bars, &placement, now, surface);
        self.axes = self.build_axes(spec, scales);
        Ok(())
    }

    fn resize(&mut self, size: Size, now: Duration, surface: &mut dyn RenderSurface) {
        self.size = size;
        self.plot = self.margin.inner(size);
        self.zoom.set_extent(Rect::from_size(self.plot));
        self.title
            .place(self.margin.left, self.margin.top, self.plot.width);

        let bottom = self.margin.top + self.plot.height;
        let collapse = |_: &Element, current: &Geometry| {
            let r = current.as_rect().copied().unwrap_or_default();
            Geometry {
                shape: Shape::Rect(Rect::new(r.x, bottom, r.width, 0.0)),
                ..current.clone()
            }
        };
        self.enclosing.snap_all(now, surface, collapse);
        self.bars.snap_all(now, surface, collapse);
    }

    fn on_gesture(&mut self, event: GestureEvent) -> bool {
        let before = self.zoom.transform();
        self.zoom.on_gesture(event) != before
    }

    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        let enclosing = self.enclosing.tick(now, surface);
        let bars = self.bars.tick(now, surface);
        enclosing || bars
    }
}

/// Bars grow from the baseline. Horizontal placement follows the zoom at
/// once; value changes animate.
struct BarPlacement<'a> {
    scales: &'a BarScales,
    origin: Point,
    baseline: f64,
    opacity: f64,
    filled: bool,
}

impl Choreography for BarPlacement<'_> {
    fn target(&self, datum: &Element, _index: usize) -> Geometry {
        let start = datum.timestamp.unwrap_or_default();
        let end = start + datum.timestep.unwrap_or_default();
        let x0 = self.scales.x.scale(start);
        let x1 = self.scales.x.scale(end);
        let top = self.scales.y.scale(datum.value);
        let rect = Rect::new(
            self.origin.x + x0,
            self.origin.y + top,
            x1 - x0,
            self.baseline - top,
        );
        let geometry = Geometry::rect(rect).with_opacity(self.opacity);
        if self.filled {
            geometry.with_fill(self.scales.fill.color(datum.value))
        } else {
            geometry
        }
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        let r = target.as_rect().copied().unwrap_or_default();
        Geometry {
            shape: Shape::Rect(Rect::new(r.x, self.origin.y + self.baseline, r.width, 0.0)),
            ..target.clone()
        }
    }

    fn snap(&self, current: &Geometry, target: &Geometry) -> Geometry {
        match (current.as_rect(), target.as_rect()) {
            (Some(c), Some(t)) => Geometry {
                shape: Shape::Rect(Rect::new(t.x, c.y, t.width, c.height)),
                fill: current.fill,
                opacity: target.opacity,
            },
            _ => target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figures_core::{FigureHost, Paint, RecordingSurface, TextAnchor, ZoomTransform};

    const HOUR: f64 = 3600.0;
    const DAY: f64 = 86_400.0;

    fn margin() -> Margin {
        Margin {
            top: 20.0,
            right: 20.0,
            bottom: 50.0,
            left: 40.0,
        }
    }

    fn chart() -> BarChart {
        // Plot area 400 x 200.
        BarChart::new(Size::new(460.0, 270.0), margin())
    }

    fn hourly(first: i64, count: i64, value: f64) -> Vec<Element> {
        (first..first + count)
            .map(|h| Element::bucket(DAY + h as f64 * HOUR, HOUR, value))
            .collect()
    }

    fn rect_of(surface: &RecordingSurface, layer: &str, i: usize) -> Rect {
        let node = surface.layer(layer)[i];
        *surface.node(node).unwrap().geometry.as_rect().unwrap()
    }

    #[test]
    fn test_bars_fill_plot_after_transition() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        host.refresh(FigureSpec::new(hourly(0, 4, 10.0)), Duration::ZERO, &mut surface)
            .unwrap();

        // Entering bars sit on the baseline with their final width.
        let r = rect_of(&surface, "bars", 0);
        assert_eq!(r, Rect::new(40.0, 220.0, 100.0, 0.0));

        assert!(!host.tick(Duration::from_millis(1000), &mut surface));
        let r = rect_of(&surface, "bars", 3);
        assert_eq!(r, Rect::new(340.0, 20.0, 100.0, 200.0));
        let node = surface.layer("bars")[3];
        assert!(surface.node(node).unwrap().classes.contains("bar"));
    }

    #[test]
    fn test_update_moves_horizontally_at_once() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        host.refresh(FigureSpec::new(hourly(0, 4, 10.0)), Duration::ZERO, &mut surface)
            .unwrap();
        host.tick(Duration::from_secs(1), &mut surface);

        // Window slides by one hour; the bar for hour 1 is now first.
        host.refresh(
            FigureSpec::new(hourly(1, 4, 5.0)),
            Duration::from_secs(1),
            &mut surface,
        )
        .unwrap();
        let kept = host.figure().bars().elements().identities()[0].clone();
        let node = host.figure().bars().elements().get(&kept).unwrap().node;
        let r = *surface.node(node).unwrap().geometry.as_rect().unwrap();
        assert_eq!(r.x, 40.0);
        assert_eq!(r.height, 200.0);

        host.tick(Duration::from_secs(2), &mut surface);
        let r = *surface.node(node).unwrap().geometry.as_rect().unwrap();
        assert_eq!(r.height, 200.0);
        assert_eq!(surface.layer("bars").len(), 4);
    }

    #[test]
    fn test_missing_timestep_aborts_refresh() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        let mut elements = hourly(0, 3, 1.0);
        elements[2].timestep = None;
        let err = host
            .refresh(FigureSpec::new(elements), Duration::ZERO, &mut surface)
            .unwrap_err();
        assert!(matches!(
            err,
            FigureError::MissingField {
                index: 2,
                field: "timestep"
            }
        ));
        assert_eq!(surface.node_count(), 0);
    }

    #[test]
    fn test_axes_follow_zoom() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        let spec = FigureSpec {
            ylabel: Some("load".into()),
            ..FigureSpec::new(hourly(0, 24, 8.0))
        };
        host.refresh(spec, Duration::ZERO, &mut surface).unwrap();
        let axes = host.figure().axes().clone();
        assert_eq!(axes.ylabel, "load");
        // 3-hourly ticks from midnight to midnight.
        assert_eq!(axes.x.len(), 9);
        assert_eq!(axes.x[0].label, "02 Jan");
        assert_eq!(axes.x[1].label, "03:00");
        assert_eq!(axes.x[8].label, "03 Jan");
        assert_eq!(axes.y.first().map(|t| t.label.as_str()), Some("0"));
        assert_eq!(axes.y.first().map(|t| t.offset), Some(200.0));

        host.on_gesture(
            GestureEvent::Transform(ZoomTransform::new(0.0, 0.0, 4.0)),
            Duration::ZERO,
            &mut surface,
        )
        .unwrap();
        // Hourly ticks, only the first six hours are visible.
        let zoomed = host.figure().axes();
        assert_eq!(zoomed.x[1].label, "01:00");
        assert_eq!(zoomed.x.len(), 7);
        assert!(zoomed.x.iter().all(|t| (0.0..=400.0).contains(&t.offset)));
    }

    #[test]
    fn test_zoom_widens_bars_and_keeps_nodes() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        host.refresh(FigureSpec::new(hourly(0, 4, 10.0)), Duration::ZERO, &mut surface)
            .unwrap();
        let nodes = surface.layer("bars").to_vec();
        host.on_gesture(
            GestureEvent::Transform(ZoomTransform::new(0.0, 0.0, 2.0)),
            Duration::ZERO,
            &mut surface,
        )
        .unwrap();
        assert_eq!(surface.layer("bars"), nodes.as_slice());
        assert_eq!(rect_of(&surface, "bars", 1).width, 200.0);
    }

    #[test]
    fn test_resize_snaps_bars_to_new_baseline() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        host.refresh(FigureSpec::new(hourly(0, 2, 10.0)), Duration::ZERO, &mut surface)
            .unwrap();
        host.tick(Duration::from_millis(500), &mut surface);
        host.resize(Size::new(260.0, 170.0), Duration::from_millis(500), &mut surface)
            .unwrap();

        // Plot is now 200 x 100; bars restart from the new baseline.
        let r = rect_of(&surface, "bars", 0);
        assert_eq!(r, Rect::new(40.0, 120.0, 100.0, 0.0));
        host.tick(Duration::from_millis(1500), &mut surface);
        assert_eq!(rect_of(&surface, "bars", 0), Rect::new(40.0, 20.0, 100.0, 100.0));
    }

    #[test]
    fn test_title_is_centered_over_plot() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(chart());
        host.refresh(
            FigureSpec::new(hourly(0, 1, 1.0)).with_title("CPU"),
            Duration::ZERO,
            &mut surface,
        )
        .unwrap();
        let node = surface.layer("title")[0];
        match &surface.node(node).unwrap().geometry.shape {
            Shape::Text {
                position, anchor, ..
            } => {
                assert_eq!(*position, Point::new(240.0, 10.0));
                assert_eq!(*anchor, TextAnchor::Middle);
            }
            other => panic!("unexpected title shape {other:?}"),
        }
    }

    #[test]
    fn test_grouped_bars_share_domain_and_crossfade() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(BarChart::grouped(Size::new(460.0, 270.0), margin()));
        let spec = FigureSpec {
            grouped_elements: vec![Element::bucket(DAY, 4.0 * HOUR, 100.0)],
            ..FigureSpec::new(hourly(0, 4, 50.0))
        };
        host.refresh(spec, Duration::ZERO, &mut surface).unwrap();
        host.tick(Duration::from_secs(1), &mut surface);

        assert_eq!(surface.layer_names(), vec!["title", "barbars", "bars"]);
        let coarse = rect_of(&surface, "barbars", 0);
        assert_eq!(coarse, Rect::new(40.0, 20.0, 400.0, 200.0));
        // Fine bars are scaled against the enclosing maximum.
        assert_eq!(rect_of(&surface, "bars", 0).height, 100.0);

        let enclosing = surface.node(surface.layer("barbars")[0]).unwrap();
        assert!(enclosing.classes.contains("barbar"));
        assert_eq!(enclosing.geometry.fill, Some(Paint::Solid(figures_core::Color::RED)));
        assert!((enclosing.geometry.opacity - 0.9).abs() < 1e-9);
        let fine = surface.node(surface.layer("bars")[0]).unwrap();
        assert!((fine.geometry.opacity - 0.6).abs() < 1e-9);

        host.on_gesture(
            GestureEvent::Transform(ZoomTransform::new(0.0, 0.0, 12.0)),
            Duration::from_secs(1),
            &mut surface,
        )
        .unwrap();
        let fine = surface.node(surface.layer("bars")[0]).unwrap();
        assert!((fine.geometry.opacity - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(20.0), "20");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(-1.5), "-1.5");
    }
}
