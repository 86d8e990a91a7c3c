//! Paginated table over a filtering index.

use figures_core::{
    Choreography, Element, Figure, FigureError, FigureSpec, FilterIndex, Geometry, KeyRule,
    KeyedLayer, MemoryIndex, PageLabel, Point, RenderSurface, Shape, Size, TextAnchor,
    WindowedQuery, DEFAULT_DURATION, DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Height of one table row.
pub const ROW_HEIGHT: f64 = 20.0;

/// A column rendered from each row record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableColumn {
    Key,
    Label,
    Value,
    Timestamp,
    Tooltip,
}

impl TableColumn {
    /// Cell text of `record`; empty when the field is absent.
    #[must_use]
    pub fn cell(self, record: &Element) -> String {
        match self {
            Self::Key => record.key.as_ref().map(ToString::to_string).unwrap_or_default(),
            Self::Label => record.label.clone().unwrap_or_default(),
            Self::Value => record.value.to_string(),
            Self::Timestamp => record.timestamp.map(|t| t.to_string()).unwrap_or_default(),
            Self::Tooltip => record.tooltip.clone().unwrap_or_default(),
        }
    }
}

/// Table showing one page of records at a time.
///
/// Each refresh replaces the records of the backing index. Paging moves the
/// window without new data.
#[derive(Debug)]
pub struct PaginatedTable<I = MemoryIndex<Element>> {
    query: WindowedQuery<I>,
    key: KeyRule,
    columns: Vec<TableColumn>,
    rows: KeyedLayer,
}

impl PaginatedTable {
    /// Table over an in-memory index sorted by value, largest first.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self::with_index(MemoryIndex::new(Vec::new()).sorted_by(|e: &Element| e.value), page_size)
    }

    /// Keep only rows matching `predicate`.
    pub fn set_filter(&mut self, predicate: impl Fn(&Element) -> bool + 'static) {
        self.query.index_mut().set_filter(predicate);
        self.query.recompute();
    }

    pub fn clear_filter(&mut self) {
        self.query.index_mut().clear_filter();
        self.query.recompute();
    }
}

impl<I: FilterIndex<Record = Element>> PaginatedTable<I> {
    /// Table over an external index.
    #[must_use]
    pub fn with_index(index: I, page_size: usize) -> Self {
        Self {
            query: WindowedQuery::new(index, page_size),
            key: KeyRule::Key,
            columns: vec![TableColumn::Key, TableColumn::Label, TableColumn::Value],
            rows: KeyedLayer::new("rows", DEFAULT_DURATION).with_base_class("row"),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: KeyRule) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<TableColumn>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.rows = KeyedLayer::new("rows", duration).with_base_class("row");
        self
    }

    #[must_use]
    pub const fn query(&self) -> &WindowedQuery<I> {
        &self.query
    }

    #[must_use]
    pub const fn rows(&self) -> &KeyedLayer {
        &self.rows
    }

    #[must_use]
    pub const fn page_label(&self) -> PageLabel {
        self.query.page_label()
    }

    #[must_use]
    pub const fn next_enabled(&self) -> bool {
        self.query.next_enabled()
    }

    #[must_use]
    pub const fn last_enabled(&self) -> bool {
        self.query.last_enabled()
    }

    /// Show the following page.
    pub fn next(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> Result<(), FigureError> {
        self.query.next();
        self.show_page(now, surface)
    }

    /// Show the preceding page.
    pub fn last(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> Result<(), FigureError> {
        self.query.last();
        self.show_page(now, surface)
    }

    /// Reconcile the rows of the current window.
    pub fn show_page(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> Result<(), FigureError> {
        let key = self.key;
        let plan = self.rows.plan(self.query.rows(), |i, e| key.extract(i, e))?;
        log::debug!("dc_table: {}", self.query.page_label());
        self.rows.render(
            plan,
            &RowPlacement {
                columns: &self.columns,
            },
            now,
            surface,
        );
        Ok(())
    }
}

/// Hands the refreshed records to the index.
pub trait ReplaceRecords {
    fn replace_records(&mut self, records: Vec<Element>);
}

impl ReplaceRecords for MemoryIndex<Element> {
    fn replace_records(&mut self, records: Vec<Element>) {
        self.replace(records);
    }
}

impl<I> Figure for PaginatedTable<I>
where
    I: FilterIndex<Record = Element> + ReplaceRecords,
{
    type Scales = ();

    fn ident(&self) -> &'static str {
        "dc_table"
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface) {
        self.rows.setup(surface);
    }

    fn compute_domains(&self, _spec: &FigureSpec) -> Result<(), FigureError> {
        Ok(())
    }

    fn render(
        &mut self,
        spec: &FigureSpec,
        _scales: &(),
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        // Identities are checked over the whole refresh before the index changes.
        let key = self.key;
        self.rows.plan(spec.elements.clone(), |i, e| key.extract(i, e))?;

        self.query.index_mut().replace_records(spec.elements.clone());
        self.query.recompute();
        self.show_page(now, surface)
    }

    fn resize(&mut self, _size: Size, _now: Duration, _surface: &mut dyn RenderSurface) {}

    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        self.rows.tick(now, surface)
    }
}

struct RowPlacement<'a> {
    columns: &'a [TableColumn],
}

/// Rows stack top-down and fade in and out in place.
impl Choreography for RowPlacement<'_> {
    fn target(&self, datum: &Element, index: usize) -> Geometry {
        let content = self
            .columns
            .iter()
            .map(|c| c.cell(datum))
            .collect::<Vec<_>>()
            .join("\t");
        Geometry::new(Shape::Text {
            position: Point::new(0.0, (index as f64 + 1.0) * ROW_HEIGHT),
            anchor: TextAnchor::Start,
            content,
        })
    }

    fn enter(&self, _datum: &Element, target: &Geometry) -> Geometry {
        target.clone().with_opacity(0.0)
    }

    fn exit(&self, _datum: &Element, current: &Geometry) -> Geometry {
        current.clone().with_opacity(0.0)
    }
}

impl Default for PaginatedTable {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
