//! Donut chart with outside labels and leader lines.

use figures_core::{
    ArcShape, Choreography, Color, Element, Figure, FigureError, FigureSpec, Geometry, KeyRule,
    KeyedLayer, OrdinalColors, Point, RenderSurface, Shape, Size, TextAnchor, TitleLayer,
    DEFAULT_DURATION, PIE_PALETTE,
};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::time::Duration;

const INNER_RADIUS: f64 = 0.4;
const OUTER_RADIUS: f64 = 0.8;
const LABEL_RADIUS: f64 = 0.9;
const LINE_END: f64 = 0.95;

/// Slice angles of one refresh, in incoming order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PieLayout {
    pub arcs: Vec<ArcShape>,
    pub total: f64,
}

impl PieLayout {
    /// Lay values out clockwise from 12 o'clock without sorting.
    ///
    /// Negative and non-finite values get an empty slice. All slices are
    /// empty when the values sum to zero.
    #[must_use]
    pub fn compute(elements: &[Element], radius: f64) -> Self {
        let weight = |e: &Element| {
            if e.value.is_finite() {
                e.value.max(0.0)
            } else {
                0.0
            }
        };
        let total: f64 = elements.iter().map(weight).sum();
        let mut angle = 0.0;
        let arcs = elements
            .iter()
            .map(|e| {
                let sweep = if total > 0.0 {
                    weight(e) / total * TAU
                } else {
                    0.0
                };
                let arc = ArcShape {
                    start_angle: angle,
                    end_angle: angle + sweep,
                    inner_radius: radius * INNER_RADIUS,
                    outer_radius: radius * OUTER_RADIUS,
                };
                angle += sweep;
                arc
            })
            .collect();
        Self { arcs, total }
    }
}

/// Donut chart keyed by label.
#[derive(Debug)]
pub struct PieChart {
    size: Size,
    key: KeyRule,
    show_percentage: bool,
    colors: OrdinalColors,
    title: TitleLayer,
    slices: KeyedLayer,
    labels: KeyedLayer,
    lines: KeyedLayer,
}

impl PieChart {
    #[must_use]
    pub fn new(size: Size) -> Self {
        let mut title = TitleLayer::new();
        title.place(0.0, 20.0, size.width);
        Self {
            size,
            key: KeyRule::Label,
            show_percentage: false,
            colors: OrdinalColors::new(&PIE_PALETTE),
            title,
            slices: KeyedLayer::new("slices", DEFAULT_DURATION).with_base_class("slice"),
            labels: KeyedLayer::new("labels", DEFAULT_DURATION),
            lines: KeyedLayer::new("lines", DEFAULT_DURATION),
        }
    }

    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.slices = KeyedLayer::new("slices", duration).with_base_class("slice");
        self.labels = KeyedLayer::new("labels", duration);
        self.lines = KeyedLayer::new("lines", duration);
        self
    }

    #[must_use]
    pub const fn with_key(mut self, key: KeyRule) -> Self {
        self.key = key;
        self
    }

    /// Always append percentages to labels, whatever the display options say.
    #[must_use]
    pub const fn with_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.size.width.min(self.size.height) / 2.0
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    #[must_use]
    pub const fn slices(&self) -> &KeyedLayer {
        &self.slices
    }
}

impl Figure for PieChart {
    type Scales = PieLayout;

    fn ident(&self) -> &'static str {
        "pie_chart"
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface) {
        self.title.setup(surface);
        self.slices.setup(surface);
        self.labels.setup(surface);
        self.lines.setup(surface);
    }

    fn compute_domains(&self, spec: &FigureSpec) -> Result<PieLayout, FigureError> {
        Ok(PieLayout::compute(&spec.elements, self.radius()))
    }

    fn render(
        &mut self,
        spec: &FigureSpec,
        layout: &PieLayout,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        let key = self.key;
        let title = self.title.plan(spec)?;
        let slices = self
            .slices
            .plan(spec.elements.clone(), |i, e| key.extract(i, e))?;
        let labels = self
            .labels
            .plan(spec.elements.clone(), |i, e| key.extract(i, e))?;
        let lines = self
            .lines
            .plan(spec.elements.clone(), |i, e| key.extract(i, e))?;

        let mut fills = HashMap::new();
        for element in &spec.elements {
            let label = element.label.clone().unwrap_or_default();
            let color = self.colors.color(&label);
            fills.insert(label, color);
        }
        let placement = SlicePlacement {
            layout,
            center: self.center(),
            radius: self.radius(),
            fills,
            percentage: self.show_percentage || spec.display_options.show_percentage,
        };

        self.title.render(title, now, surface);
        self.slices.render(slices, &placement, now, surface);
        self.labels.render(labels, &LabelPlacement(&placement), now, surface);
        self.lines.render(lines, &LinePlacement(&placement), now, surface);
        Ok(())
    }

    fn resize(&mut self, size: Size, _now: Duration, _surface: &mut dyn RenderSurface) {
        self.size = size;
        self.title.place(0.0, 20.0, size.width);
    }

    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        let slices = self.slices.tick(now, surface);
        let labels = self.labels.tick(now, surface);
        let lines = self.lines.tick(now, surface);
        slices || labels || lines
    }
}

struct SlicePlacement<'a> {
    layout: &'a PieLayout,
    center: Point,
    radius: f64,
    fills: HashMap<String, Color>,
    percentage: bool,
}

impl SlicePlacement<'_> {
    fn arc(&self, index: usize) -> ArcShape {
        self.layout.arcs.get(index).copied().unwrap_or_default()
    }

    /// Point on the label circle at the arc's mid angle.
    fn outer_centroid(&self, arc: &ArcShape) -> Point {
        let ring = ArcShape {
            inner_radius: self.radius * LABEL_RADIUS,
            outer_radius: self.radius * LABEL_RADIUS,
            ..*arc
        };
        ring.centroid()
    }

    fn side(arc: &ArcShape) -> f64 {
        if arc.faces_right() {
            1.0
        } else {
            -1.0
        }
    }

    fn text(&self, datum: &Element) -> String {
        let label = datum.label.clone().unwrap_or_default();
        if self.percentage && self.layout.total > 0.0 {
            format!("{label} ({:.2} %)", 100.0 * datum.value / self.layout.total)
        } else {
            label
        }
    }

    fn offset(&self, p: Point) -> Point {
        Point::new(self.center.x + p.x, self.center.y + p.y)
    }
}

impl Choreography for SlicePlacement<'_> {
    fn target(&self, datum: &Element, index: usize) -> Geometry {
        let fill = self
            .fills
            .get(datum.label.as_deref().unwrap_or_default())
            .copied()
            .unwrap_or(Color::GREY);
        Geometry::new(Shape::Arc(self.arc(index))).with_fill(fill)
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }

    /// Slices close towards their middle.
    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        match &current.shape {
            Shape::Arc(arc) => {
                let mid = arc.mid_angle();
                Geometry {
                    shape: Shape::Arc(ArcShape {
                        start_angle: mid,
                        end_angle: mid,
                        ..*arc
                    }),
                    ..current.clone()
                }
            }
            _ => current.clone(),
        }
    }
}

struct LabelPlacement<'a, 'b>(&'a SlicePlacement<'b>);

impl Choreography for LabelPlacement<'_, '_> {
    fn target(&self, datum: &Element, index: usize) -> Geometry {
        let p = self.0;
        let arc = p.arc(index);
        let side = SlicePlacement::side(&arc);
        let y = p.outer_centroid(&arc).y;
        Geometry::new(Shape::Text {
            position: p.offset(Point::new(p.radius * side, y)),
            anchor: if side > 0.0 {
                TextAnchor::Start
            } else {
                TextAnchor::End
            },
            content: p.text(datum),
        })
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}

struct LinePlacement<'a, 'b>(&'a SlicePlacement<'b>);

impl Choreography for LinePlacement<'_, '_> {
    fn target(&self, _datum: &Element, index: usize) -> Geometry {
        let p = self.0;
        let arc = p.arc(index);
        let bend = p.outer_centroid(&arc);
        let end = Point::new(p.radius * LINE_END * SlicePlacement::side(&arc), bend.y);
        Geometry::new(Shape::Polyline(vec![
            p.offset(arc.centroid()),
            p.offset(bend),
            p.offset(end),
        ]))
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}
