//! Heat maps over a named grid: `heat_map` and the self-arranging `heat_bucket`.

use figures_core::{
    bucket_grid, compute_domains, BandScale, Choreography, ColorScale, DomainKind, Element,
    Figure, FigureError, FigureSpec, Geometry, KeyRule, KeyedLayer, Margin, Point,
    PositionDomain, Rect, RenderSurface, Shape, Size, TitleLayer, DENSE_DURATION, INFERNO,
};
use std::time::Duration;

const BAND_PADDING: f64 = 0.05;
const BLOCK_OPACITY: f64 = 0.8;
/// Value range spread over the palette.
const COLOR_DOMAIN: [f64; 2] = [1.0, 100.0];

/// How records are placed into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridArrangement {
    /// Records name their own `x` and `y` cells
    #[default]
    Explicit,
    /// Records fill a near-square grid row by row
    Bucketed,
}

/// Scales of one heat map refresh.
#[derive(Debug, Clone)]
pub struct HeatScales {
    pub x: BandScale,
    pub y: BandScale,
    pub color: ColorScale,
}

/// Grid of coloured blocks keyed by label.
#[derive(Debug)]
pub struct HeatMap {
    arrangement: GridArrangement,
    size: Size,
    margin: Margin,
    plot: Size,
    key: KeyRule,
    title: TitleLayer,
    blocks: KeyedLayer,
}

impl HeatMap {
    /// Heat map whose records carry their cells.
    #[must_use]
    pub fn new(size: Size, margin: Margin) -> Self {
        Self::build(GridArrangement::Explicit, size, margin)
    }

    /// Heat map that lays records out itself.
    #[must_use]
    pub fn bucketed(size: Size, margin: Margin) -> Self {
        Self::build(GridArrangement::Bucketed, size, margin)
    }

    fn build(arrangement: GridArrangement, size: Size, margin: Margin) -> Self {
        let plot = margin.inner(size);
        let mut title = TitleLayer::new();
        title.place(margin.left, margin.top, plot.width);
        Self {
            arrangement,
            size,
            margin,
            plot,
            key: KeyRule::Label,
            title,
            blocks: KeyedLayer::new("blocks", DENSE_DURATION).with_base_class("block"),
        }
    }

    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.blocks = KeyedLayer::new("blocks", duration).with_base_class("block");
        self
    }

    #[must_use]
    pub const fn with_key(mut self, key: KeyRule) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub const fn arrangement(&self) -> GridArrangement {
        self.arrangement
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn blocks(&self) -> &KeyedLayer {
        &self.blocks
    }
}

impl Figure for HeatMap {
    type Scales = HeatScales;

    fn ident(&self) -> &'static str {
        match self.arrangement {
            GridArrangement::Explicit => "heat_map",
            GridArrangement::Bucketed => "heat_bucket",
        }
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface) {
        self.title.setup(surface);
        self.blocks.setup(surface);
    }

    /// Bucketed maps synthesise a grid only when the refresh names no axes.
    fn arrange(&self, mut spec: FigureSpec) -> FigureSpec {
        if self.arrangement == GridArrangement::Bucketed
            && spec.x_axis.is_none()
            && spec.y_axis.is_none()
        {
            let (columns, rows) = bucket_grid(&mut spec.elements);
            spec.x_axis = Some(columns);
            spec.y_axis = Some(rows);
        }
        spec
    }

    fn compute_domains(&self, spec: &FigureSpec) -> Result<HeatScales, FigureError> {
        for (index, element) in spec.elements.iter().enumerate() {
            if element.x.is_none() {
                return Err(FigureError::MissingField { index, field: "x" });
            }
            if element.y.is_none() {
                return Err(FigureError::MissingField { index, field: "y" });
            }
        }
        let kind = DomainKind::Grid {
            columns: spec.x_axis.clone(),
            rows: spec.y_axis.clone(),
        };
        let (columns, rows) = match compute_domains(&spec.elements, &kind)?.position {
            PositionDomain::Grid { columns, rows } => (columns, rows),
            _ => (Vec::new(), Vec::new()),
        };
        Ok(HeatScales {
            x: BandScale::new(columns, [0.0, self.plot.width], BAND_PADDING),
            y: BandScale::new(rows, [self.plot.height, 0.0], BAND_PADDING),
            color: ColorScale::sequential(&INFERNO, COLOR_DOMAIN[0], COLOR_DOMAIN[1]),
        })
    }

    fn render(
        &mut self,
        spec: &FigureSpec,
        scales: &HeatScales,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        let key = self.key;
        let title = self.title.plan(spec)?;
        let blocks = self
            .blocks
            .plan(spec.elements.clone(), |i, e| key.extract(i, e))?;

        self.title.render(title, now, surface);
        let placement = BlockPlacement {
            scales,
            origin: Point::new(self.margin.left, self.margin.top),
        };
        self.blocks.render(blocks, &placement, now, surface);
        Ok(())
    }

    fn resize(&mut self, size: Size, _now: Duration, _surface: &mut dyn RenderSurface) {
        self.size = size;
        self.plot = self.margin.inner(size);
        self.title
            .place(self.margin.left, self.margin.top, self.plot.width);
    }

    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        self.blocks.tick(now, surface)
    }
}

/// Blocks grow out of and shrink into the centre of their cell. Colour
/// changes apply at once.
struct BlockPlacement<'a> {
    scales: &'a HeatScales,
    origin: Point,
}

impl BlockPlacement<'_> {
    /// Cell of `datum`, or an empty cell at the plot origin when either
    /// coordinate is not part of the grid.
    fn cell(&self, datum: &Element) -> Rect {
        let x = datum.x.as_deref().and_then(|x| self.scales.x.scale(x));
        let y = datum.y.as_deref().and_then(|y| self.scales.y.scale(y));
        match (x, y) {
            (Some(x), Some(y)) => Rect::new(
                self.origin.x + x,
                self.origin.y + y,
                self.scales.x.bandwidth(),
                self.scales.y.bandwidth(),
            ),
            _ => Rect::new(self.origin.x, self.origin.y, 0.0, 0.0),
        }
    }
}

impl Choreography for BlockPlacement<'_> {
    fn target(&self, datum: &Element, _index: usize) -> Geometry {
        Geometry::rect(self.cell(datum))
            .with_fill(self.scales.color.color(datum.value))
            .with_opacity(BLOCK_OPACITY)
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        let r = target.as_rect().copied().unwrap_or_default();
        Geometry {
            shape: Shape::Rect(r.collapsed_to_center()),
            ..target.clone()
        }
    }

    fn exit(&self, datum: &Element, current: &Geometry) -> Geometry {
        Geometry {
            shape: Shape::Rect(self.cell(datum).collapsed_to_center()),
            ..current.clone()
        }
    }

    fn snap(&self, current: &Geometry, target: &Geometry) -> Geometry {
        Geometry {
            fill: target.fill,
            ..current.clone()
        }
    }
}
