//! Cell table: a `table` figure whose headers, rows and cells arrive
//! ready-made in the refresh.
//!
//! Rows are joined by position, so a shorter refresh fades out the trailing
//! rows. Cells are joined by their row and cell index and fade in on enter.

use crate::table::ROW_HEIGHT;
use figures_core::{
    Choreography, Element, Figure, FigureError, FigureSpec, Geometry, Identity, KeyRule,
    KeyedLayer, Point, Rect, RenderSurface, Shape, Size, TableRow, TextAnchor, TitleLayer,
    DEFAULT_DURATION,
};
use std::time::Duration;

/// Fade of entering headers and cells.
const CELL_FADE: Duration = Duration::from_millis(250);
/// Space above the table, holding the title.
const TABLE_TOP: f64 = ROW_HEIGHT;
const CELL_PADDING: f64 = 4.0;
/// Distance of the text baseline above the bottom of its row.
const BASELINE_INSET: f64 = 5.0;

/// Position of one cell in the table grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellSlot {
    /// Body row the cell starts in
    pub row: usize,
    /// Grid column the cell starts in
    pub column: usize,
    pub colspan: usize,
    pub rowspan: usize,
}

/// Grid positions of every cell of one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableGrid {
    /// Grid columns, at least one per header
    pub columns: usize,
    /// 1 when the table has a header row
    pub header_rows: usize,
    /// Slots of each body row's cells, in cell order
    pub slots: Vec<Vec<CellSlot>>,
}

impl TableGrid {
    /// Place cells left to right, skipping columns still covered by a
    /// `rowspan` from an earlier row.
    ///
    /// Spans of zero count as one. Row spans stop at the last row.
    #[must_use]
    pub fn layout(headers: &[String], rows: &[TableRow]) -> Self {
        let mut covered: Vec<Vec<bool>> = vec![Vec::new(); rows.len()];
        let mut columns = headers.len();
        let mut slots = Vec::with_capacity(rows.len());

        for (r, row) in rows.iter().enumerate() {
            let mut column = 0;
            let mut placed = Vec::with_capacity(row.cells.len());
            for cell in &row.cells {
                while covered[r].get(column).copied().unwrap_or(false) {
                    column += 1;
                }
                let colspan = cell.colspan.unwrap_or(1).max(1);
                let rowspan = cell.rowspan.unwrap_or(1).clamp(1, rows.len() - r);
                for line in &mut covered[r..r + rowspan] {
                    if line.len() < column + colspan {
                        line.resize(column + colspan, false);
                    }
                    line[column..column + colspan].fill(true);
                }
                placed.push(CellSlot {
                    row: r,
                    column,
                    colspan,
                    rowspan,
                });
                column += colspan;
                columns = columns.max(column);
            }
            slots.push(placed);
        }

        Self {
            columns,
            header_rows: usize::from(!headers.is_empty()),
            slots,
        }
    }

    /// Width of one grid column when the table spans `width`.
    #[must_use]
    pub fn column_width(&self, width: f64) -> f64 {
        if self.columns == 0 {
            width
        } else {
            width / self.columns as f64
        }
    }

    /// Top edge of body row `row`.
    #[must_use]
    pub fn row_top(&self, row: usize) -> f64 {
        TABLE_TOP + (self.header_rows + row) as f64 * ROW_HEIGHT
    }
}

/// Identity of the cell at `cell` within row `row`.
#[must_use]
pub fn cell_identity(row: usize, cell: usize) -> Identity {
    Identity::text(format!("{row}:{cell}"))
}

/// Table rendering the rows it is given, one text node per cell.
#[derive(Debug)]
pub struct CellTable {
    size: Size,
    title: TitleLayer,
    headers: KeyedLayer,
    rows: KeyedLayer,
    cells: KeyedLayer,
}

impl CellTable {
    #[must_use]
    pub fn new(size: Size) -> Self {
        let mut title = TitleLayer::new();
        title.place(0.0, TABLE_TOP, size.width);
        Self {
            size,
            title,
            headers: KeyedLayer::new("headers", CELL_FADE).with_base_class("header"),
            rows: KeyedLayer::new("rows", DEFAULT_DURATION).with_base_class("row"),
            cells: KeyedLayer::new("cells", CELL_FADE).with_base_class("cell"),
        }
    }

    /// Duration of the row fade-out.
    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.rows = KeyedLayer::new("rows", duration).with_base_class("row");
        self
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn rows(&self) -> &KeyedLayer {
        &self.rows
    }

    #[must_use]
    pub const fn cells(&self) -> &KeyedLayer {
        &self.cells
    }
}

fn header_records(headers: &[String]) -> Vec<Element> {
    headers
        .iter()
        .map(|h| Element::default().with_label(h.clone()))
        .collect()
}

fn row_records(rows: &[TableRow]) -> Vec<Element> {
    rows.iter()
        .map(|row| Element {
            classes: row.classes.clone(),
            ..Element::default()
        })
        .collect()
}

fn cell_records(rows: &[TableRow]) -> Vec<Element> {
    rows.iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.cells.iter().enumerate().map(move |(c, cell)| Element {
                key: Some(cell_identity(r, c)),
                label: cell.content.clone(),
                classes: cell.classes.clone(),
                ..Element::default()
            })
        })
        .collect()
}

impl Figure for CellTable {
    type Scales = TableGrid;

    fn ident(&self) -> &'static str {
        "table"
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface) {
        self.title.setup(surface);
        self.headers.setup(surface);
        self.rows.setup(surface);
        self.cells.setup(surface);
    }

    fn compute_domains(&self, spec: &FigureSpec) -> Result<TableGrid, FigureError> {
        Ok(TableGrid::layout(&spec.headers, &spec.rows))
    }

    fn render(
        &mut self,
        spec: &FigureSpec,
        grid: &TableGrid,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        let title = self.title.plan(spec)?;
        let headers = self.headers.plan(header_records(&spec.headers), |i, e| {
            KeyRule::Position.extract(i, e)
        })?;
        let rows = self
            .rows
            .plan(row_records(&spec.rows), |i, e| KeyRule::Position.extract(i, e))?;
        let cells = self
            .cells
            .plan(cell_records(&spec.rows), |i, e| KeyRule::Key.extract(i, e))?;
        log::debug!(
            "table: {} rows over {} columns",
            spec.rows.len(),
            grid.columns
        );

        let placement = CellPlacement {
            grid,
            width: self.size.width,
            slots: grid.slots.iter().flatten().copied().collect(),
        };
        self.title.render(title, now, surface);
        self.headers
            .render(headers, &HeaderPlacement(&placement), now, surface);
        self.rows.render(rows, &RowPlacement(&placement), now, surface);
        self.cells.render(cells, &placement, now, surface);
        Ok(())
    }

    fn resize(&mut self, size: Size, _now: Duration, _surface: &mut dyn RenderSurface) {
        self.size = size;
        self.title.place(0.0, TABLE_TOP, size.width);
    }

    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        let headers = self.headers.tick(now, surface);
        let rows = self.rows.tick(now, surface);
        let cells = self.cells.tick(now, surface);
        headers || rows || cells
    }
}

/// Cells fade in and out at their grid slot.
struct CellPlacement<'a> {
    grid: &'a TableGrid,
    width: f64,
    /// Slots in incoming cell order
    slots: Vec<CellSlot>,
}

impl CellPlacement<'_> {
    fn text(&self, column: usize, top: f64, content: String) -> Geometry {
        let x = column as f64 * self.grid.column_width(self.width) + CELL_PADDING;
        Geometry::new(Shape::Text {
            position: Point::new(x, top + ROW_HEIGHT - BASELINE_INSET),
            anchor: TextAnchor::Start,
            content,
        })
    }
}

impl Choreography for CellPlacement<'_> {
    fn target(&self, datum: &Element, index: usize) -> Geometry {
        let slot = self.slots.get(index).copied().unwrap_or_default();
        self.text(
            slot.column,
            self.grid.row_top(slot.row),
            datum.label.clone().unwrap_or_default(),
        )
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone().with_opacity(0.0)
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}

struct HeaderPlacement<'a>(&'a CellPlacement<'a>);

impl Choreography for HeaderPlacement<'_> {
    fn target(&self, datum: &Element, index: usize) -> Geometry {
        self.0
            .text(index, TABLE_TOP, datum.label.clone().unwrap_or_default())
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone().with_opacity(0.0)
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}

/// Row bands appear at once and fade out when the table shrinks.
struct RowPlacement<'a>(&'a CellPlacement<'a>);

impl Choreography for RowPlacement<'_> {
    fn target(&self, _datum: &Element, index: usize) -> Geometry {
        Geometry::rect(Rect::new(
            0.0,
            self.0.grid.row_top(index),
            self.0.width,
            ROW_HEIGHT,
        ))
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone()
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}
