//! Optional figure title, joined like any other keyed layer.

use crate::animation::Choreography;
use crate::diff::JoinPlan;
use crate::error::FigureError;
use crate::geometry::Point;
use crate::layer::KeyedLayer;
use crate::scene::{Geometry, RenderSurface, Shape, TextAnchor};
use crate::spec::{Element, FigureSpec, KeyRule};
use std::time::Duration;

/// Distance of the title baseline above the plot area.
const TITLE_OFFSET: f64 = 10.0;

/// Zero or one centered title text node.
#[derive(Debug)]
pub struct TitleLayer {
    layer: KeyedLayer,
    position: Point,
}

impl Default for TitleLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleLayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layer: KeyedLayer::new("title", Duration::ZERO).with_base_class("title"),
            position: Point::ORIGIN,
        }
    }

    /// Center the title above a plot whose top edge spans `left..left+width`.
    pub fn place(&mut self, left: f64, top: f64, width: f64) {
        self.position = Point::new(left + width / 2.0, top - TITLE_OFFSET);
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub const fn layer(&self) -> &KeyedLayer {
        &self.layer
    }

    pub fn setup(&self, surface: &mut dyn RenderSurface) {
        self.layer.setup(surface);
    }

    /// Plan the title of `spec`. Never fails for a well-formed spec.
    pub fn plan(&self, spec: &FigureSpec) -> Result<JoinPlan, FigureError> {
        let titles = spec
            .title
            .iter()
            .map(|t| Element::default().with_label(t.clone()))
            .collect();
        self.layer
            .plan(titles, |i, e| KeyRule::Position.extract(i, e))
    }

    pub fn render(&mut self, plan: JoinPlan, now: Duration, surface: &mut dyn RenderSurface) {
        let placement = Placement(self.position);
        self.layer.render(plan, &placement, now, surface);
        // A removed title disappears at once.
        self.layer.tick(now, surface);
    }
}

struct Placement(Point);

impl Choreography for Placement {
    fn target(&self, datum: &Element, _index: usize) -> Geometry {
        Geometry::new(Shape::Text {
            position: self.0,
            anchor: TextAnchor::Middle,
            content: datum.label.clone().unwrap_or_default(),
        })
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }
}
