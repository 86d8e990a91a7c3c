//! Flow (sankey) diagram over an externally computed layout.
//!
//! The figure only animates what a [`FlowLayoutEngine`] produced. A simple
//! column engine, [`ColumnLayout`], is provided for callers without one.

use figures_core::{
    Choreography, Color, Element, Figure, FigureError, FigureSpec, FlowRecord, Geometry,
    Identity, KeyRule, KeyedLayer, LinkBand, OrdinalColors, Paint, Point, Rect, RenderSurface,
    Shape, Size, TextAnchor, TitleLayer, CATEGORY10, DENSE_DURATION,
};
use figures_yaml::EdgeColor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Distance between a node and its label.
const LABEL_GAP: f64 = 6.0;

/// Column assignment of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeAlign {
    Left,
    Right,
    Center,
    /// Like `Left`, with sinks pushed to the last column
    #[default]
    Justify,
}

/// Parameters handed to a layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSettings {
    pub extent: Rect,
    pub node_width: f64,
    pub node_padding: f64,
    pub align: NodeAlign,
}

impl FlowSettings {
    /// Defaults for a figure of `size`: 15px nodes, 10px padding, a 1px
    /// horizontal and 5px vertical inset.
    #[must_use]
    pub fn for_size(size: Size) -> Self {
        Self {
            extent: Rect::from_points(
                Point::new(1.0, 5.0),
                Point::new(size.width - 1.0, size.height - 5.0),
            ),
            node_width: 15.0,
            node_padding: 10.0,
            align: NodeAlign::Justify,
        }
    }
}

/// A positioned node.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    pub name: String,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// A positioned link. `y0` is the band centre at the source, `y1` at the target.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: f64,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Output of a layout engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowLayout {
    /// Distinct node names in first-seen order
    pub nodes: Vec<FlowNode>,
    /// One entry per input record, in input order
    pub links: Vec<FlowLink>,
}

impl FlowLayout {
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Computes node and link positions of a flow diagram.
pub trait FlowLayoutEngine: fmt::Debug {
    /// Lay out `records`.
    ///
    /// Nodes must be the distinct names of the records in first-seen order
    /// and links must follow the record order.
    fn layout(&self, records: &[FlowRecord], settings: &FlowSettings)
        -> Result<FlowLayout, FigureError>;
}

/// Distinct node names in first-seen order.
#[must_use]
pub fn node_names(records: &[FlowRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in records.iter().flat_map(|r| [&r.source, &r.target]) {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Column layout: nodes placed by depth, stacked by value, links ordered
/// along node sides. Rejects cyclic flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnLayout;

impl FlowLayoutEngine for ColumnLayout {
    fn layout(
        &self,
        records: &[FlowRecord],
        settings: &FlowSettings,
    ) -> Result<FlowLayout, FigureError> {
        let names = node_names(records);
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let n = names.len();
        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        for (l, record) in records.iter().enumerate() {
            let (s, t) = (index[record.source.as_str()], index[record.target.as_str()]);
            if s == t {
                return Err(FigureError::Layout(format!("self loop at '{}'", record.source)));
            }
            outgoing[s].push(l);
            incoming[t].push(l);
        }

        let depth = longest_paths(n, records, &index, &incoming, false)?;
        let height = longest_paths(n, records, &index, &outgoing, true)?;
        let max_depth = depth.iter().copied().max().unwrap_or(0);
        let column: Vec<usize> = (0..n)
            .map(|i| match settings.align {
                NodeAlign::Left => depth[i],
                NodeAlign::Right => max_depth.saturating_sub(height[i]),
                NodeAlign::Justify => {
                    if outgoing[i].is_empty() {
                        max_depth
                    } else {
                        depth[i]
                    }
                }
                NodeAlign::Center => {
                    if !incoming[i].is_empty() {
                        depth[i]
                    } else {
                        outgoing[i]
                            .iter()
                            .map(|&l| depth[index[records[l].target.as_str()]])
                            .min()
                            .map_or(0, |d| d.saturating_sub(1))
                    }
                }
            })
            .collect();

        let value = |links: &[usize]| links.iter().map(|&l| records[l].value.max(0.0)).sum::<f64>();
        let node_value: Vec<f64> = (0..n)
            .map(|i| value(&incoming[i]).max(value(&outgoing[i])))
            .collect();

        let columns = column.iter().copied().max().map_or(0, |c| c + 1);
        let mut members = vec![Vec::new(); columns];
        for (i, &c) in column.iter().enumerate() {
            members[c].push(i);
        }

        let extent = settings.extent;
        let padding = settings.node_padding;
        let ky = members
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| {
                let total: f64 = m.iter().map(|&i| node_value[i]).sum();
                let free = extent.height - (m.len() as f64 - 1.0) * padding;
                if total > 0.0 {
                    free / total
                } else {
                    f64::INFINITY
                }
            })
            .fold(f64::INFINITY, f64::min);
        let ky = if ky.is_finite() { ky.max(0.0) } else { 0.0 };
        let kx = if columns > 1 {
            (extent.width - settings.node_width) / (columns - 1) as f64
        } else {
            0.0
        };

        let mut nodes: Vec<FlowNode> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let x0 = extent.x + column[i] as f64 * kx;
                FlowNode {
                    name: name.clone(),
                    x0,
                    x1: x0 + settings.node_width,
                    y0: 0.0,
                    y1: 0.0,
                }
            })
            .collect();
        for m in &members {
            let mut y = extent.y;
            for &i in m {
                nodes[i].y0 = y;
                nodes[i].y1 = y + node_value[i] * ky;
                y = nodes[i].y1 + padding;
            }
            // Spread the remaining space evenly around the column.
            let spare = (extent.bottom() - y + padding) / (m.len() as f64 + 1.0);
            for (k, &i) in m.iter().enumerate() {
                let shift = spare * (k as f64 + 1.0);
                nodes[i].y0 += shift;
                nodes[i].y1 += shift;
            }
        }

        let mut links: Vec<FlowLink> = records
            .iter()
            .map(|r| FlowLink {
                source: r.source.clone(),
                target: r.target.clone(),
                value: r.value,
                width: r.value.max(0.0) * ky,
                y0: 0.0,
                y1: 0.0,
            })
            .collect();
        for i in 0..n {
            let mut out = outgoing[i].clone();
            out.sort_by(|&a, &b| {
                let ya = nodes[index[records[a].target.as_str()]].y0;
                let yb = nodes[index[records[b].target.as_str()]].y0;
                ya.total_cmp(&yb)
            });
            let mut y = nodes[i].y0;
            for l in out {
                links[l].y0 = y + links[l].width / 2.0;
                y += links[l].width;
            }

            let mut inc = incoming[i].clone();
            inc.sort_by(|&a, &b| {
                let ya = nodes[index[records[a].source.as_str()]].y0;
                let yb = nodes[index[records[b].source.as_str()]].y0;
                ya.total_cmp(&yb)
            });
            let mut y = nodes[i].y0;
            for l in inc {
                links[l].y1 = y + links[l].width / 2.0;
                y += links[l].width;
            }
        }

        Ok(FlowLayout { nodes, links })
    }
}

/// Longest path, in links, from any source (or to any sink when `reverse`).
fn longest_paths(
    n: usize,
    records: &[FlowRecord],
    index: &HashMap<&str, usize>,
    towards: &[Vec<usize>],
    reverse: bool,
) -> Result<Vec<usize>, FigureError> {
    let mut pending: Vec<usize> = towards.iter().map(Vec::len).collect();
    let mut dependents = vec![Vec::new(); n];
    for record in records {
        let (s, t) = (index[record.source.as_str()], index[record.target.as_str()]);
        let (from, to) = if reverse { (t, s) } else { (s, t) };
        dependents[from].push(to);
    }
    let mut ready: Vec<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut length = vec![0usize; n];
    let mut done = 0;
    while let Some(i) = ready.pop() {
        done += 1;
        for &next in &dependents[i] {
            length[next] = length[next].max(length[i] + 1);
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.push(next);
            }
        }
    }
    if done < n {
        return Err(FigureError::Layout("circular flow".to_string()));
    }
    Ok(length)
}

/// Flow diagram keyed by node name and by link endpoints.
#[derive(Debug)]
pub struct FlowDiagram {
    size: Size,
    align: NodeAlign,
    edge_color: EdgeColor,
    engine: Box<dyn FlowLayoutEngine>,
    colors: OrdinalColors,
    title: TitleLayer,
    nodes: KeyedLayer,
    links: KeyedLayer,
    labels: KeyedLayer,
}

impl FlowDiagram {
    /// Diagram laid out by [`ColumnLayout`].
    #[must_use]
    pub fn new(size: Size) -> Self {
        let mut title = TitleLayer::new();
        title.place(0.0, 20.0, size.width);
        Self {
            size,
            align: NodeAlign::default(),
            edge_color: EdgeColor::default(),
            engine: Box::new(ColumnLayout),
            colors: OrdinalColors::new(&CATEGORY10),
            title,
            nodes: KeyedLayer::new("nodes", DENSE_DURATION).with_base_class("node"),
            links: KeyedLayer::new("links", DENSE_DURATION).with_base_class("link"),
            labels: KeyedLayer::new("node_labels", DENSE_DURATION),
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Box<dyn FlowLayoutEngine>) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.nodes = KeyedLayer::new("nodes", duration).with_base_class("node");
        self.links = KeyedLayer::new("links", duration).with_base_class("link");
        self.labels = KeyedLayer::new("node_labels", duration);
        self
    }

    #[must_use]
    pub const fn with_edge_color(mut self, edge_color: EdgeColor) -> Self {
        self.edge_color = edge_color;
        self
    }

    #[must_use]
    pub const fn with_align(mut self, align: NodeAlign) -> Self {
        self.align = align;
        self
    }

    /// Change link colouring; applies from the next render.
    pub fn set_edge_color(&mut self, edge_color: EdgeColor) {
        self.edge_color = edge_color;
    }

    pub fn set_align(&mut self, align: NodeAlign) {
        self.align = align;
    }

    #[must_use]
    pub const fn edge_color(&self) -> EdgeColor {
        self.edge_color
    }

    #[must_use]
    pub const fn nodes(&self) -> &KeyedLayer {
        &self.nodes
    }

    #[must_use]
    pub const fn links(&self) -> &KeyedLayer {
        &self.links
    }
}

/// Palette key of a node: its name up to the first space.
fn color_key(name: &str) -> &str {
    name.split(' ').next().unwrap_or(name)
}

fn link_key(source: &str, target: &str) -> String {
    format!("{source} → {target}")
}

impl Figure for FlowDiagram {
    type Scales = FlowLayout;

    fn ident(&self) -> &'static str {
        "sankey_diagram"
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface) {
        self.title.setup(surface);
        self.nodes.setup(surface);
        self.links.setup(surface);
        self.labels.setup(surface);
    }

    fn compute_domains(&self, spec: &FigureSpec) -> Result<FlowLayout, FigureError> {
        let settings = FlowSettings {
            align: self.align,
            ..FlowSettings::for_size(self.size)
        };
        let layout = self.engine.layout(&spec.links, &settings)?;
        log::debug!(
            "sankey_diagram: {} nodes, {} links laid out",
            layout.nodes.len(),
            layout.links.len()
        );
        if layout.links.len() != spec.links.len() {
            return Err(FigureError::Layout(format!(
                "{} links laid out for {} records",
                layout.links.len(),
                spec.links.len()
            )));
        }
        Ok(layout)
    }

    fn render(
        &mut self,
        spec: &FigureSpec,
        layout: &FlowLayout,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        let node_records: Vec<Element> = layout
            .nodes
            .iter()
            .map(|n| Element::default().with_label(n.name.clone()))
            .collect();
        let link_records: Vec<Element> = layout
            .links
            .iter()
            .map(|l| {
                let key = link_key(&l.source, &l.target);
                Element {
                    key: Some(Identity::text(key.clone())),
                    value: l.value,
                    tooltip: Some(format!("{key}\n{}", l.value)),
                    ..Element::default()
                }
            })
            .collect();

        let title = self.title.plan(spec)?;
        let nodes = self
            .nodes
            .plan(node_records.clone(), |i, e| KeyRule::Label.extract(i, e))?;
        let labels = self
            .labels
            .plan(node_records, |i, e| KeyRule::Label.extract(i, e))?;
        let links = self
            .links
            .plan(link_records, |i, e| KeyRule::Key.extract(i, e))?;

        let mut fills = HashMap::new();
        for node in &layout.nodes {
            let color = self.colors.color(color_key(&node.name));
            fills.insert(node.name.clone(), color);
        }
        let placement = FlowPlacement {
            layout,
            fills,
            edge_color: self.edge_color,
            middle: self.size.width / 2.0,
        };

        self.title.render(title, now, surface);
        self.nodes.render(nodes, &placement, now, surface);
        self.links.render(links, &LinkPlacement(&placement), now, surface);
        self.labels
            .render(labels, &NodeLabelPlacement(&placement), now, surface);
        Ok(())
    }

    fn resize(&mut self, size: Size, _now: Duration, _surface: &mut dyn RenderSurface) {
        self.size = size;
        self.title.place(0.0, 20.0, size.width);
    }

    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        let nodes = self.nodes.tick(now, surface);
        let links = self.links.tick(now, surface);
        let labels = self.labels.tick(now, surface);
        nodes || links || labels
    }
}

struct FlowPlacement<'a> {
    layout: &'a FlowLayout,
    fills: HashMap<String, Color>,
    edge_color: EdgeColor,
    middle: f64,
}

impl FlowPlacement<'_> {
    fn node(&self, index: usize) -> Option<&FlowNode> {
        self.layout.nodes.get(index)
    }

    fn fill(&self, name: &str) -> Color {
        self.fills.get(name).copied().unwrap_or(Color::GREY)
    }
}

/// Node rectangles grow from their vertical centre.
impl Choreography for FlowPlacement<'_> {
    fn target(&self, _datum: &Element, index: usize) -> Geometry {
        self.node(index).map_or_else(Geometry::default, |n| {
            Geometry::rect(Rect::new(n.x0, n.y0, n.x1 - n.x0, n.y1 - n.y0))
                .with_fill(self.fill(&n.name))
        })
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        let r = target.as_rect().copied().unwrap_or_default();
        Geometry {
            shape: Shape::Rect(Rect::new(r.x, r.y + r.height / 2.0, r.width, 0.0)),
            ..target.clone()
        }
    }
}

struct LinkPlacement<'a, 'b>(&'a FlowPlacement<'b>);

impl Choreography for LinkPlacement<'_, '_> {
    fn target(&self, _datum: &Element, index: usize) -> Geometry {
        let p = self.0;
        let Some(link) = p.layout.links.get(index) else {
            return Geometry::default();
        };
        let (Some(source), Some(target)) = (p.layout.node(&link.source), p.layout.node(&link.target))
        else {
            return Geometry::default();
        };
        let paint = match p.edge_color {
            EdgeColor::None => Paint::Solid(Color::GREY),
            EdgeColor::Input => Paint::Solid(p.fill(&link.source)),
            EdgeColor::Output => Paint::Solid(p.fill(&link.target)),
            EdgeColor::Path => Paint::Gradient {
                from: p.fill(&link.source),
                to: p.fill(&link.target),
            },
        };
        Geometry::new(Shape::Link(LinkBand {
            source: Point::new(source.x1, link.y0),
            target: Point::new(target.x0, link.y1),
            width: link.width.max(1.0),
        }))
        .with_paint(paint)
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}

struct NodeLabelPlacement<'a, 'b>(&'a FlowPlacement<'b>);

impl Choreography for NodeLabelPlacement<'_, '_> {
    fn target(&self, _datum: &Element, index: usize) -> Geometry {
        let p = self.0;
        p.node(index).map_or_else(Geometry::default, |n| {
            let left_half = n.x0 < p.middle;
            Geometry::new(Shape::Text {
                position: Point::new(
                    if left_half { n.x1 + LABEL_GAP } else { n.x0 - LABEL_GAP },
                    (n.y0 + n.y1) / 2.0,
                ),
                anchor: if left_half {
                    TextAnchor::Start
                } else {
                    TextAnchor::End
                },
                content: n.name.clone(),
            })
        })
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figures_core::{FigureHost, RecordingSurface, SceneNode};
    use proptest::prelude::*;

    fn flows() -> Vec<FlowRecord> {
        vec![
            FlowRecord::new("Coal imports", "Coal", 10.0),
            FlowRecord::new("Coal reserves", "Coal", 30.0),
            FlowRecord::new("Coal", "Solid", 40.0),
        ]
    }

    fn settings() -> FlowSettings {
        FlowSettings::for_size(Size::new(402.0, 110.0))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn node_of<'a>(surface: &'a RecordingSurface, layer: &str, i: usize) -> &'a SceneNode {
        surface.node(surface.layer(layer)[i]).unwrap()
    }

    #[test]
    fn test_node_names_first_seen() {
        assert_eq!(
            node_names(&flows()),
            vec!["Coal imports", "Coal", "Coal reserves", "Solid"]
        );
    }

    #[test]
    fn test_column_layout() {
        let layout = ColumnLayout.layout(&flows(), &settings()).unwrap();
        let coal = layout.node("Coal").unwrap();
        let solid = layout.node("Solid").unwrap();
        let imports = layout.node("Coal imports").unwrap();
        // Three columns over an extent 400 wide.
        assert!(close(imports.x0, 1.0));
        assert!(close(coal.x0, 1.0 + (400.0 - 15.0) / 2.0));
        assert!(close(solid.x1, 401.0));

        // The first column is the tightest: 100px minus one gap for 40 units.
        let ky = 90.0 / 40.0;
        assert!(close(layout.links[2].width, 40.0 * ky));
        assert!(close(coal.y1 - coal.y0, 40.0 * ky));
        // Incoming bands stack along the target side in source order.
        assert!(close(layout.links[0].y1, coal.y0 + 10.0 * ky / 2.0));
        assert!(close(layout.links[1].y1, coal.y0 + 10.0 * ky + 30.0 * ky / 2.0));
    }

    #[test]
    fn test_alignment_moves_sources() {
        let records = vec![
            FlowRecord::new("a", "b", 1.0),
            FlowRecord::new("b", "c", 1.0),
            FlowRecord::new("x", "c", 1.0),
        ];
        let column = |align| {
            let layout = ColumnLayout
                .layout(&records, &FlowSettings { align, ..settings() })
                .unwrap();
            layout.node("x").unwrap().x0
        };
        assert!(close(column(NodeAlign::Left), 1.0));
        assert!(column(NodeAlign::Right) > 1.0);
        assert!(column(NodeAlign::Center) > 1.0);
    }

    #[test]
    fn test_cycle_is_layout_error() {
        let records = vec![FlowRecord::new("a", "b", 1.0), FlowRecord::new("b", "a", 1.0)];
        let err = ColumnLayout.layout(&records, &settings()).unwrap_err();
        assert!(matches!(err, FigureError::Layout(_)));
    }

    #[test]
    fn test_nodes_grow_from_center() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(FlowDiagram::new(Size::new(402.0, 110.0)));
        let spec = FigureSpec {
            links: flows(),
            ..FigureSpec::default()
        };
        host.refresh(spec, Duration::ZERO, &mut surface).unwrap();

        let layout = ColumnLayout.layout(&flows(), &settings()).unwrap();
        let coal = layout.node("Coal").unwrap();
        let start = *node_of(&surface, "nodes", 1).geometry.as_rect().unwrap();
        assert!(close(start.y, (coal.y0 + coal.y1) / 2.0));
        assert_eq!(start.height, 0.0);

        host.tick(Duration::from_millis(1800), &mut surface);
        let end = *node_of(&surface, "nodes", 1).geometry.as_rect().unwrap();
        assert!(close(end.height, coal.y1 - coal.y0));
        // "Coal imports" and "Coal reserves" share a colour with "Coal".
        let fill = node_of(&surface, "nodes", 0).geometry.fill;
        assert_eq!(fill, node_of(&surface, "nodes", 2).geometry.fill);
        assert_eq!(fill, Some(Paint::Solid(CATEGORY10[0])));
        assert_eq!(
            node_of(&surface, "nodes", 3).geometry.fill,
            Some(Paint::Solid(CATEGORY10[1]))
        );
    }

    #[test]
    fn test_links_and_labels() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(FlowDiagram::new(Size::new(402.0, 110.0)));
        let spec = FigureSpec {
            links: flows(),
            ..FigureSpec::default()
        };
        host.refresh(spec, Duration::ZERO, &mut surface).unwrap();

        let link = node_of(&surface, "links", 0);
        assert_eq!(
            link.interaction.tooltip.as_deref(),
            Some("Coal imports → Coal\n10")
        );
        assert!(matches!(link.geometry.fill, Some(Paint::Gradient { .. })));
        let Shape::Link(band) = &link.geometry.shape else {
            panic!("link is not a band");
        };
        assert!(band.width >= 1.0);
        assert!(band.source.x < band.target.x);

        let Shape::Text { anchor, position, .. } = &node_of(&surface, "node_labels", 0).geometry.shape
        else {
            panic!("label is not text");
        };
        assert_eq!(*anchor, TextAnchor::Start);
        assert!(close(position.x, 1.0 + 15.0 + 6.0));
        let Shape::Text { anchor, .. } = &node_of(&surface, "node_labels", 3).geometry.shape else {
            panic!("label is not text");
        };
        assert_eq!(*anchor, TextAnchor::End);
    }

    #[test]
    fn test_edge_color_modes() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(
            FlowDiagram::new(Size::new(402.0, 110.0))
                .with_edge_color(EdgeColor::Output)
                .with_transition(Duration::ZERO),
        );
        let spec = FigureSpec {
            links: flows(),
            ..FigureSpec::default()
        };
        host.refresh(spec, Duration::ZERO, &mut surface).unwrap();
        let coal = node_of(&surface, "nodes", 1).geometry.fill;
        assert_eq!(node_of(&surface, "links", 0).geometry.fill, coal);

        host.figure_mut().set_edge_color(EdgeColor::None);
        host.resize(Size::new(402.0, 110.0), Duration::ZERO, &mut surface)
            .unwrap();
        assert_eq!(
            node_of(&surface, "links", 0).geometry.fill,
            Some(Paint::Solid(Color::GREY))
        );
    }

    #[test]
    fn test_duplicate_link_aborts_refresh() {
        let mut surface = RecordingSurface::new();
        let mut host = FigureHost::new(FlowDiagram::new(Size::new(402.0, 110.0)));
        let mut links = flows();
        links.push(FlowRecord::new("Coal", "Solid", 1.0));
        let err = host
            .refresh(
                FigureSpec {
                    links,
                    ..FigureSpec::default()
                },
                Duration::ZERO,
                &mut surface,
            )
            .unwrap_err();
        assert!(matches!(err, FigureError::DuplicateIdentity { .. }));
        assert_eq!(surface.node_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_layout_stays_in_extent(
            edges in prop::collection::vec((0usize..6, 1usize..4, 0.0f64..100.0), 1..12),
        ) {
            // Edges only point to higher-numbered nodes, so the flow is acyclic.
            let mut records: Vec<FlowRecord> = Vec::new();
            for (from, step, value) in edges {
                let (source, target) = (format!("n{from}"), format!("n{}", from + step));
                if !records.iter().any(|r| r.source == source && r.target == target) {
                    records.push(FlowRecord::new(source, target, value));
                }
            }
            let settings = settings();
            let layout = ColumnLayout.layout(&records, &settings).unwrap();
            prop_assert_eq!(layout.nodes.len(), node_names(&records).len());
            prop_assert_eq!(layout.links.len(), records.len());
            let e = settings.extent;
            for node in &layout.nodes {
                prop_assert!(node.x0 >= e.x - 1e-9 && node.x1 <= e.right() + 1e-9);
                prop_assert!(node.y0 >= e.y - 1e-9 && node.y1 <= e.bottom() + 1e-9);
                prop_assert!(node.y0 <= node.y1);
            }
        }
    }
}
