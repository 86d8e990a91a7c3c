//! A keyed layer: one named group of visual elements with its own join,
//! transitions, classes and interactions.

use crate::animation::{Choreography, TransitionScheduler};
use crate::diff::{JoinPlan, KeyedElements, VisualElement};
use crate::error::FigureError;
use crate::scene::{ClassDelta, Geometry, Interaction, RenderSurface};
use crate::spec::{Element, Identity};
use std::collections::BTreeSet;
use std::time::Duration;

/// Keyed group of visual elements rendered into one surface layer.
#[derive(Debug)]
pub struct KeyedLayer {
    base_class: Option<&'static str>,
    elements: KeyedElements,
    transitions: TransitionScheduler,
}

impl KeyedLayer {
    /// Create a layer with the given transition duration.
    #[must_use]
    pub fn new(name: &'static str, duration: Duration) -> Self {
        Self {
            base_class: None,
            elements: KeyedElements::new(name),
            transitions: TransitionScheduler::new(duration),
        }
    }

    /// Class applied to every element besides its record's own classes.
    #[must_use]
    pub const fn with_base_class(mut self, class: &'static str) -> Self {
        self.base_class = Some(class);
        self
    }

    /// Layer name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.elements.layer()
    }

    /// Live elements.
    #[must_use]
    pub const fn elements(&self) -> &KeyedElements {
        &self.elements
    }

    /// Transition scheduler of this layer.
    #[must_use]
    pub const fn transitions(&self) -> &TransitionScheduler {
        &self.transitions
    }

    /// Register the layer on the surface.
    pub fn setup<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        surface.add_layer(self.name());
    }

    /// Validate incoming records without touching the layer.
    pub fn plan<F>(&self, incoming: Vec<Element>, key_fn: F) -> Result<JoinPlan, FigureError>
    where
        F: FnMut(usize, &Element) -> Result<Identity, FigureError>,
    {
        self.elements.plan(incoming, key_fn)
    }

    /// Join a validated plan and start its transitions.
    pub fn render<C, S>(&mut self, plan: JoinPlan, choreography: &C, now: Duration, surface: &mut S)
    where
        C: Choreography + ?Sized,
        S: RenderSurface + ?Sized,
    {
        let mut rec = self.elements.apply(plan);
        self.transitions
            .animate(now, &mut self.elements, &mut rec, choreography, surface);

        let base = self.base_class;
        for joined in rec.entering.iter().chain(&rec.updating) {
            if let Some(element) = self.elements.get_mut(&joined.identity) {
                sync_presentation(element, base, surface);
            }
        }
    }

    /// Advance running transitions. Returns whether anything still animates.
    pub fn tick<S: RenderSurface + ?Sized>(&mut self, now: Duration, surface: &mut S) -> bool {
        self.transitions.tick(now, &mut self.elements, surface)
    }

    /// Cancel all transitions, leaving elements where they are.
    pub fn interrupt<S: RenderSurface + ?Sized>(&mut self, now: Duration, surface: &mut S) {
        self.transitions.interrupt(now, &mut self.elements, surface);
    }

    /// Cancel all transitions and move every element to the geometry `place`
    /// computes from its record and current geometry.
    pub fn snap_all<S, F>(&mut self, now: Duration, surface: &mut S, mut place: F)
    where
        S: RenderSurface + ?Sized,
        F: FnMut(&Element, &Geometry) -> Geometry,
    {
        self.interrupt(now, surface);
        for element in self.elements.iter_mut() {
            let geometry = place(&element.datum, element.motion.current());
            if geometry != *element.motion.current() {
                surface.update(element.node, &geometry);
                element.motion.jump(geometry);
            }
        }
    }
}

fn sync_presentation<S>(element: &mut VisualElement, base: Option<&'static str>, surface: &mut S)
where
    S: RenderSurface + ?Sized,
{
    let wanted: BTreeSet<String> = base
        .map(str::to_string)
        .into_iter()
        .chain(element.datum.classes.iter().cloned())
        .collect();
    let delta = ClassDelta::between(&element.classes, &wanted);
    if !delta.is_empty() {
        surface.set_classes(element.node, &delta);
        element.classes = wanted;
    }

    let interaction = Interaction {
        tooltip: element.datum.tooltip.clone(),
        url: element.datum.url.clone(),
    };
    if interaction != element.interaction {
        surface.attach(element.node, &interaction);
        element.interaction = interaction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::scene::{RecordingSurface, SurfaceOp};
    use crate::spec::KeyRule;

    struct Fade;

    impl Choreography for Fade {
        fn target(&self, _datum: &Element, index: usize) -> Geometry {
            Geometry::rect(Rect::new(0.0, index as f64 * 20.0, 100.0, 20.0))
        }

        fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
            target.clone().with_opacity(0.0)
        }
    }

    fn render(layer: &mut KeyedLayer, surface: &mut RecordingSurface, data: Vec<Element>) {
        let plan = layer
            .plan(data, |i, e| KeyRule::Key.extract(i, e))
            .unwrap();
        layer.render(plan, &Fade, Duration::ZERO, surface);
    }

    #[test]
    fn test_classes_diffed_not_reapplied() {
        let mut surface = RecordingSurface::new();
        let mut layer = KeyedLayer::new("rows", Duration::ZERO).with_base_class("row");
        layer.setup(&mut surface);

        render(
            &mut layer,
            &mut surface,
            vec![Element::keyed("a", 1.0).with_class("crit")],
        );
        let node = layer.elements().get(&Identity::text("a")).unwrap().node;
        let classes = &surface.node(node).unwrap().classes;
        assert!(classes.contains("row") && classes.contains("crit"));

        surface.take_ops();
        render(
            &mut layer,
            &mut surface,
            vec![Element::keyed("a", 2.0).with_class("crit")],
        );
        assert!(!surface
            .ops()
            .iter()
            .any(|op| matches!(op, SurfaceOp::Classes { .. })));

        render(
            &mut layer,
            &mut surface,
            vec![Element::keyed("a", 2.0).with_class("ok")],
        );
        let classes = &surface.node(node).unwrap().classes;
        assert!(classes.contains("ok") && !classes.contains("crit"));
    }

    #[test]
    fn test_interaction_attached_on_change_only() {
        let mut surface = RecordingSurface::new();
        let mut layer = KeyedLayer::new("rows", Duration::ZERO);
        render(
            &mut layer,
            &mut surface,
            vec![Element::keyed("a", 1.0).with_tooltip("one").with_url("/a")],
        );
        let attaches = |s: &RecordingSurface| {
            s.ops()
                .iter()
                .filter(|op| matches!(op, SurfaceOp::Attach { .. }))
                .count()
        };
        assert_eq!(attaches(&surface), 1);

        render(
            &mut layer,
            &mut surface,
            vec![Element::keyed("a", 1.0).with_tooltip("one").with_url("/a")],
        );
        assert_eq!(attaches(&surface), 1);

        render(
            &mut layer,
            &mut surface,
            vec![Element::keyed("a", 1.0).with_tooltip("two").with_url("/a")],
        );
        assert_eq!(attaches(&surface), 2);
    }

    #[test]
    fn test_snap_all_moves_elements() {
        let mut surface = RecordingSurface::new();
        let mut layer = KeyedLayer::new("rows", Duration::from_millis(1000));
        render(&mut layer, &mut surface, vec![Element::keyed("a", 1.0)]);
        layer.snap_all(Duration::from_millis(10), &mut surface, |_, g| {
            g.clone().with_opacity(0.25)
        });
        let a = layer.elements().get(&Identity::text("a")).unwrap();
        assert!(!a.motion.is_animating());
        assert_eq!(surface.node(a.node).unwrap().geometry.opacity, 0.25);
    }

    #[test]
    fn test_zero_duration_exit_removed_on_tick() {
        let mut surface = RecordingSurface::new();
        let mut layer = KeyedLayer::new("rows", Duration::ZERO);
        render(&mut layer, &mut surface, vec![Element::keyed("a", 1.0)]);
        render(&mut layer, &mut surface, vec![]);
        assert_eq!(surface.node_count(), 1);
        assert!(!layer.tick(Duration::ZERO, &mut surface));
        assert_eq!(surface.node_count(), 0);
    }
}
