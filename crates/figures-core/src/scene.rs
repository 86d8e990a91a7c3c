//! Retained scene model and the rendering-surface seam.
//!
//! Figures never draw directly. They describe every visual element as a
//! [`Geometry`] and hand create/update/remove mutations to a
//! [`RenderSurface`]. The host supplies the real backend; [`RecordingSurface`]
//! keeps an in-memory scene and a log of every mutation, which is what the
//! tests and the CLI render into.

use crate::color::Color;
use crate::geometry::{Point, Rect};
use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

/// Handle of one visual element on the surface.
///
/// The layer name is part of the handle so serials only need to be unique
/// within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Layer the node lives in
    pub layer: &'static str,
    /// Serial number within the layer
    pub serial: u64,
}

impl NodeId {
    /// Create a node handle.
    #[must_use]
    pub const fn new(layer: &'static str, serial: u64) -> Self {
        Self { layer, serial }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.layer, self.serial)
    }
}

/// Horizontal anchoring of a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// Annular sector. Angles are radians, 0 at twelve o'clock, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcShape {
    pub start_angle: f64,
    pub end_angle: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl ArcShape {
    /// Angle halfway between start and end.
    #[must_use]
    pub fn mid_angle(&self) -> f64 {
        self.start_angle + (self.end_angle - self.start_angle) / 2.0
    }

    /// Centroid of the sector, relative to the pie center.
    #[must_use]
    pub fn centroid(&self) -> Point {
        let r = (self.inner_radius + self.outer_radius) / 2.0;
        let a = self.mid_angle() - FRAC_PI_2;
        Point::new(a.cos() * r, a.sin() * r)
    }

    /// Whether the sector's middle lies on the right half of the circle.
    #[must_use]
    pub fn faces_right(&self) -> bool {
        self.mid_angle() < PI
    }
}

/// Horizontal link band between two node sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkBand {
    pub source: Point,
    pub target: Point,
    pub width: f64,
}

/// Shape of a visual element.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Arc(ArcShape),
    Link(LinkBand),
    Polyline(Vec<Point>),
    Text {
        position: Point,
        anchor: TextAnchor,
        content: String,
    },
}

impl Default for Shape {
    fn default() -> Self {
        Self::Rect(Rect::default())
    }
}

impl Shape {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        match (self, other) {
            (Self::Rect(a), Self::Rect(b)) => Self::Rect(a.lerp(b, t)),
            (Self::Arc(a), Self::Arc(b)) => Self::Arc(ArcShape {
                start_angle: lerp(a.start_angle, b.start_angle, t),
                end_angle: lerp(a.end_angle, b.end_angle, t),
                inner_radius: lerp(a.inner_radius, b.inner_radius, t),
                outer_radius: lerp(a.outer_radius, b.outer_radius, t),
            }),
            (Self::Link(a), Self::Link(b)) => Self::Link(LinkBand {
                source: a.source.lerp(&b.source, t),
                target: a.target.lerp(&b.target, t),
                width: lerp(a.width, b.width, t),
            }),
            (Self::Polyline(a), Self::Polyline(b)) if a.len() == b.len() => {
                Self::Polyline(a.iter().zip(b).map(|(p, q)| p.lerp(q, t)).collect())
            }
            (
                Self::Text { position: a, .. },
                Self::Text {
                    position: b,
                    anchor,
                    content,
                },
            ) => Self::Text {
                position: a.lerp(b, t),
                anchor: *anchor,
                content: content.clone(),
            },
            // Shapes of different kinds cannot be blended.
            _ => other.clone(),
        }
    }
}

/// Fill or stroke paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Left-to-right gradient, used for flow links.
    Gradient { from: Color, to: Color },
}

impl Paint {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t as f32;
        match (self, other) {
            (Self::Solid(a), Self::Solid(b)) => Self::Solid(a.lerp(b, t)),
            (Self::Gradient { from: a0, to: a1 }, Self::Gradient { from: b0, to: b1 }) => {
                Self::Gradient {
                    from: a0.lerp(b0, t),
                    to: a1.lerp(b1, t),
                }
            }
            _ => *other,
        }
    }
}

/// Every animatable attribute of one visual element.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub shape: Shape,
    pub fill: Option<Paint>,
    pub opacity: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            fill: None,
            opacity: 1.0,
        }
    }
}

impl Geometry {
    /// Geometry with the given shape, no fill and full opacity.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Rectangle geometry.
    #[must_use]
    pub fn rect(rect: Rect) -> Self {
        Self::new(Shape::Rect(rect))
    }

    /// Set a solid fill.
    #[must_use]
    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(Paint::Solid(color));
        self
    }

    /// Set an arbitrary paint.
    #[must_use]
    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.fill = Some(paint);
        self
    }

    /// Set opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Rectangle of this geometry, if it is one.
    #[must_use]
    pub const fn as_rect(&self) -> Option<&Rect> {
        match &self.shape {
            Shape::Rect(r) => Some(r),
            _ => None,
        }
    }

    /// Interpolate every attribute towards `other`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        if t >= 1.0 {
            return other.clone();
        }
        let fill = match (&self.fill, &other.fill) {
            (Some(a), Some(b)) => Some(a.lerp(b, t)),
            (_, b) => *b,
        };
        Self {
            shape: self.shape.lerp(&other.shape, t),
            fill,
            opacity: lerp(self.opacity, other.opacity, t),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

/// Hover and click behavior attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Interaction {
    pub tooltip: Option<String>,
    pub url: Option<String>,
}

impl Interaction {
    /// Whether there is nothing to attach.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tooltip.is_none() && self.url.is_none()
    }
}

/// Classes to add to and remove from one node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ClassDelta {
    /// Compute the delta that turns `current` into `wanted`.
    #[must_use]
    pub fn between(current: &BTreeSet<String>, wanted: &BTreeSet<String>) -> Self {
        Self {
            added: wanted.difference(current).cloned().collect(),
            removed: current.difference(wanted).cloned().collect(),
        }
    }

    /// Whether nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Retained-mode rendering backend.
pub trait RenderSurface {
    /// Register a layer. Layers paint in registration order.
    fn add_layer(&mut self, layer: &'static str);

    /// Create a node at `index` within its layer.
    fn create(&mut self, node: NodeId, index: usize, geometry: &Geometry);

    /// Replace a node's attributes.
    fn update(&mut self, node: NodeId, geometry: &Geometry);

    /// Apply a class delta to a node.
    fn set_classes(&mut self, node: NodeId, delta: &ClassDelta);

    /// Attach tooltip and link behavior to a node.
    fn attach(&mut self, node: NodeId, interaction: &Interaction);

    /// Put the listed nodes first in their layer, in the given order.
    fn reorder(&mut self, layer: &'static str, order: &[NodeId]);

    /// Destroy a node.
    fn remove(&mut self, node: NodeId);
}

/// One mutation seen by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    AddLayer(&'static str),
    Create { node: NodeId, index: usize },
    Update { node: NodeId },
    Classes { node: NodeId, delta: ClassDelta },
    Attach { node: NodeId },
    Reorder { layer: &'static str },
    Remove { node: NodeId },
}

/// A node as retained by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneNode {
    pub geometry: Geometry,
    pub classes: BTreeSet<String>,
    pub interaction: Interaction,
}

/// In-memory [`RenderSurface`] that retains the scene and logs mutations.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    layers: Vec<(&'static str, Vec<NodeId>)>,
    nodes: HashMap<NodeId, SceneNode>,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Take the recorded mutations, leaving the scene intact.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    /// Look up a retained node.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&node)
    }

    /// Total number of nodes across all layers.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Layer names in paint order.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|(name, _)| *name).collect()
    }

    /// Nodes of a layer in paint order.
    #[must_use]
    pub fn layer(&self, layer: &str) -> &[NodeId] {
        self.layers
            .iter()
            .find(|(name, _)| *name == layer)
            .map_or(&[], |(_, nodes)| nodes.as_slice())
    }

    fn layer_mut(&mut self, layer: &'static str) -> &mut Vec<NodeId> {
        if let Some(pos) = self.layers.iter().position(|(name, _)| *name == layer) {
            &mut self.layers[pos].1
        } else {
            self.layers.push((layer, Vec::new()));
            let last = self.layers.len() - 1;
            &mut self.layers[last].1
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn add_layer(&mut self, layer: &'static str) {
        if !self.layers.iter().any(|(name, _)| *name == layer) {
            self.layers.push((layer, Vec::new()));
            self.ops.push(SurfaceOp::AddLayer(layer));
        }
    }

    fn create(&mut self, node: NodeId, index: usize, geometry: &Geometry) {
        let nodes = self.layer_mut(node.layer);
        let index = index.min(nodes.len());
        nodes.insert(index, node);
        self.nodes.insert(
            node,
            SceneNode {
                geometry: geometry.clone(),
                ..SceneNode::default()
            },
        );
        self.ops.push(SurfaceOp::Create { node, index });
    }

    fn update(&mut self, node: NodeId, geometry: &Geometry) {
        if let Some(scene_node) = self.nodes.get_mut(&node) {
            scene_node.geometry = geometry.clone();
            self.ops.push(SurfaceOp::Update { node });
        }
    }

    fn set_classes(&mut self, node: NodeId, delta: &ClassDelta) {
        if let Some(scene_node) = self.nodes.get_mut(&node) {
            for class in &delta.removed {
                scene_node.classes.remove(class);
            }
            scene_node.classes.extend(delta.added.iter().cloned());
            self.ops.push(SurfaceOp::Classes {
                node,
                delta: delta.clone(),
            });
        }
    }

    fn attach(&mut self, node: NodeId, interaction: &Interaction) {
        if let Some(scene_node) = self.nodes.get_mut(&node) {
            scene_node.interaction = interaction.clone();
            self.ops.push(SurfaceOp::Attach { node });
        }
    }

    fn reorder(&mut self, layer: &'static str, order: &[NodeId]) {
        let nodes = self.layer_mut(layer);
        let rest: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|n| !order.contains(n))
            .collect();
        nodes.clear();
        nodes.extend(order.iter().copied());
        nodes.extend(rest);
        self.ops.push(SurfaceOp::Reorder { layer });
    }

    fn remove(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_some() {
            self.layer_mut(node.layer).retain(|n| *n != node);
            self.ops.push(SurfaceOp::Remove { node });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(serial: u64) -> NodeId {
        NodeId::new("bars", serial)
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(bar(7).to_string(), "bars#7");
    }

    #[test]
    fn test_arc_centroid_right_half() {
        let arc = ArcShape {
            start_angle: 0.0,
            end_angle: PI,
            inner_radius: 40.0,
            outer_radius: 80.0,
        };
        let c = arc.centroid();
        assert!((c.x - 60.0).abs() < 1e-9);
        assert!(c.y.abs() < 1e-9);
        assert!(arc.faces_right());
    }

    #[test]
    fn test_arc_left_half() {
        let arc = ArcShape {
            start_angle: PI,
            end_angle: 2.0 * PI,
            inner_radius: 40.0,
            outer_radius: 80.0,
        };
        let c = arc.centroid();
        assert!((c.x + 60.0).abs() < 1e-9);
        assert!(!arc.faces_right());
    }

    #[test]
    fn test_geometry_lerp_rect_and_opacity() {
        let a = Geometry::rect(Rect::new(0.0, 100.0, 10.0, 0.0)).with_opacity(0.0);
        let b = Geometry::rect(Rect::new(0.0, 0.0, 10.0, 100.0)).with_opacity(1.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.as_rect(), Some(&Rect::new(0.0, 50.0, 10.0, 50.0)));
        assert!((mid.opacity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_lerp_mismatched_shapes_takes_target() {
        let a = Geometry::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = Geometry::new(Shape::Polyline(vec![Point::ORIGIN]));
        assert_eq!(a.lerp(&b, 0.2).shape, b.shape);
    }

    #[test]
    fn test_geometry_lerp_complete_is_target() {
        let a = Geometry::rect(Rect::default()).with_fill(Color::GREEN);
        let b = Geometry::rect(Rect::new(1.0, 1.0, 1.0, 1.0)).with_fill(Color::RED);
        assert_eq!(a.lerp(&b, 1.0), b);
    }

    #[test]
    fn test_class_delta_between() {
        let current: BTreeSet<String> = ["bar", "old"].iter().map(ToString::to_string).collect();
        let wanted: BTreeSet<String> = ["bar", "new"].iter().map(ToString::to_string).collect();
        let delta = ClassDelta::between(&current, &wanted);
        assert_eq!(delta.added, vec!["new".to_string()]);
        assert_eq!(delta.removed, vec!["old".to_string()]);
        assert!(ClassDelta::between(&wanted, &wanted).is_empty());
    }

    #[test]
    fn test_recording_surface_create_update_remove() {
        let mut surface = RecordingSurface::new();
        surface.add_layer("bars");
        surface.create(bar(0), 0, &Geometry::default());
        surface.create(bar(1), 0, &Geometry::default());
        assert_eq!(surface.layer("bars"), &[bar(1), bar(0)]);

        let moved = Geometry::rect(Rect::new(5.0, 5.0, 5.0, 5.0));
        surface.update(bar(0), &moved);
        assert_eq!(surface.node(bar(0)).map(|n| &n.geometry), Some(&moved));

        surface.remove(bar(1));
        assert_eq!(surface.layer("bars"), &[bar(0)]);
        assert_eq!(surface.node_count(), 1);
        assert!(matches!(surface.ops().last(), Some(SurfaceOp::Remove { .. })));
    }

    #[test]
    fn test_recording_surface_ignores_unknown_nodes() {
        let mut surface = RecordingSurface::new();
        surface.update(bar(9), &Geometry::default());
        surface.remove(bar(9));
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_recording_surface_reorder_keeps_unlisted_last() {
        let mut surface = RecordingSurface::new();
        for i in 0..3 {
            surface.create(bar(i), i as usize, &Geometry::default());
        }
        surface.reorder("bars", &[bar(2), bar(0)]);
        assert_eq!(surface.layer("bars"), &[bar(2), bar(0), bar(1)]);
    }

    #[test]
    fn test_recording_surface_layers_in_registration_order() {
        let mut surface = RecordingSurface::new();
        surface.add_layer("barbars");
        surface.add_layer("bars");
        surface.add_layer("barbars");
        assert_eq!(surface.layer_names(), vec!["barbars", "bars"]);
        assert_eq!(surface.take_ops().len(), 2);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_recording_surface_classes_and_attach() {
        let mut surface = RecordingSurface::new();
        surface.create(bar(0), 0, &Geometry::default());
        surface.set_classes(
            bar(0),
            &ClassDelta {
                added: vec!["bar".into(), "critical".into()],
                removed: vec![],
            },
        );
        surface.attach(
            bar(0),
            &Interaction {
                tooltip: Some("42".into()),
                url: None,
            },
        );
        let node = surface.node(bar(0)).unwrap();
        assert!(node.classes.contains("critical"));
        assert_eq!(node.interaction.tooltip.as_deref(), Some("42"));
    }
}
