//! Windowed queries over a live filtering index.
//!
//! The window offset is moved freely by [`WindowedQuery::advance`]; clamping
//! happens only when the window is recomputed against the current filtered
//! size.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Size and slice queries of an external filtering index.
pub trait FilterIndex {
    type Record;

    /// Records passing the active filters.
    fn filtered_count(&self) -> usize;

    /// All records, ignoring filters.
    fn total_count(&self) -> usize;

    /// Up to `limit` filtered records starting at `offset`, in index order.
    fn slice(&self, offset: usize, limit: usize) -> Vec<Self::Record>;
}

type Predicate<T> = Box<dyn Fn(&T) -> bool>;
type SortKey<T> = Box<dyn Fn(&T) -> f64>;

/// In-memory [`FilterIndex`] with an optional filter and a descending sort key.
pub struct MemoryIndex<T> {
    records: Vec<T>,
    filter: Option<Predicate<T>>,
    sort_key: Option<SortKey<T>>,
}

impl<T> fmt::Debug for MemoryIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("records", &self.records.len())
            .field("filtered", &self.filter.is_some())
            .field("sorted", &self.sort_key.is_some())
            .finish()
    }
}

impl<T> Default for MemoryIndex<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> MemoryIndex<T> {
    #[must_use]
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            filter: None,
            sort_key: None,
        }
    }

    /// Order filtered records by `key`, largest first.
    #[must_use]
    pub fn sorted_by(mut self, key: impl Fn(&T) -> f64 + 'static) -> Self {
        self.sort_key = Some(Box::new(key));
        self
    }

    /// Keep only records matching `predicate`.
    pub fn set_filter(&mut self, predicate: impl Fn(&T) -> bool + 'static) {
        self.filter = Some(Box::new(predicate));
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Replace all records.
    pub fn replace(&mut self, records: Vec<T>) {
        self.records = records;
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    fn matches(&self, record: &T) -> bool {
        self.filter.as_ref().is_none_or(|f| f(record))
    }
}

impl<T: Clone> FilterIndex for MemoryIndex<T> {
    type Record = T;

    fn filtered_count(&self) -> usize {
        self.records.iter().filter(|r| self.matches(r)).count()
    }

    fn total_count(&self) -> usize {
        self.records.len()
    }

    fn slice(&self, offset: usize, limit: usize) -> Vec<T> {
        let mut hits: Vec<&T> = self.records.iter().filter(|r| self.matches(r)).collect();
        if let Some(key) = &self.sort_key {
            hits.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
        }
        hits.into_iter().skip(offset).take(limit).cloned().collect()
    }
}

/// Raw window position. The offset may point anywhere until recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub page_size: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Window {
    /// Clamp the window against `filtered_size`.
    ///
    /// An offset at or past the end snaps to the start of the last page, and
    /// the result is never negative.
    #[must_use]
    pub fn clamp(self, filtered_size: usize) -> Self {
        let page = self.page_size.max(1) as i64;
        let size = filtered_size as i64;
        let mut offset = self.offset;
        if offset >= size {
            offset = (size - 1).div_euclid(page) * page;
        }
        Self {
            offset: offset.max(0),
            page_size: self.page_size,
        }
    }
}

/// Result of one window recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub offset: usize,
    pub page_size: usize,
    pub filtered_size: usize,
    pub total_size: usize,
    /// Rows delivered downstream: `[offset, min(offset + page_size, filtered_size))`
    pub range: Range<usize>,
}

impl WindowState {
    /// Whether a following page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.offset + self.page_size < self.filtered_size
    }

    /// Whether a preceding page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.offset >= self.page_size
    }

    /// Human-readable position of the window.
    #[must_use]
    pub const fn label(&self) -> PageLabel {
        let end = self.range.end;
        PageLabel {
            begin: if end == 0 { self.offset } else { self.offset + 1 },
            end,
            size: self.filtered_size,
            total: self.total_size,
        }
    }
}

/// One-based, inclusive page position, e.g. "Showing 21 - 40 of 45".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLabel {
    pub begin: usize,
    pub end: usize,
    /// Filtered record count
    pub size: usize,
    /// Unfiltered record count
    pub total: usize,
}

impl fmt::Display for PageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {} - {} of {}", self.begin, self.end, self.size)?;
        if self.size != self.total {
            write!(f, " (filtered Total: {} )", self.total)?;
        }
        Ok(())
    }
}

/// A paging window bound to exactly one index.
#[derive(Debug)]
pub struct WindowedQuery<I> {
    index: I,
    window: Window,
    state: WindowState,
}

impl<I: FilterIndex> WindowedQuery<I> {
    /// Bind `index` with the given page size and compute the first window.
    #[must_use]
    pub fn new(index: I, page_size: usize) -> Self {
        let mut query = Self {
            index,
            window: Window {
                offset: 0,
                page_size: page_size.max(1),
            },
            state: WindowState {
                offset: 0,
                page_size: page_size.max(1),
                filtered_size: 0,
                total_size: 0,
                range: 0..0,
            },
        };
        query.recompute();
        query
    }

    #[must_use]
    pub const fn index(&self) -> &I {
        &self.index
    }

    /// Mutable access to the index. Call [`Self::recompute`] afterwards.
    pub fn index_mut(&mut self) -> &mut I {
        &mut self.index
    }

    #[must_use]
    pub const fn window(&self) -> Window {
        self.window
    }

    /// State of the last recompute.
    #[must_use]
    pub const fn state(&self) -> &WindowState {
        &self.state
    }

    /// Re-clamp the window against the index and derive a fresh state.
    pub fn recompute(&mut self) -> &WindowState {
        let filtered_size = self.index.filtered_count();
        self.window = self.window.clamp(filtered_size);
        let offset = self.window.offset as usize;
        let end = (offset + self.window.page_size).min(filtered_size);
        self.state = WindowState {
            offset,
            page_size: self.window.page_size,
            filtered_size,
            total_size: self.index.total_count(),
            range: offset..end.max(offset),
        };
        log::debug!(
            "window recomputed: rows {:?} of {} (total {})",
            self.state.range,
            filtered_size,
            self.state.total_size
        );
        &self.state
    }

    /// Move the offset by `by` rows and recompute.
    pub fn advance(&mut self, by: i64) -> &WindowState {
        self.window.offset += by;
        self.recompute()
    }

    /// Forward one page.
    pub fn next(&mut self) -> &WindowState {
        self.advance(self.window.page_size as i64)
    }

    /// Back one page. Kept under its historical name; it does not jump to
    /// the final page.
    pub fn last(&mut self) -> &WindowState {
        self.advance(-(self.window.page_size as i64))
    }

    /// Whether the "next" control should be enabled.
    #[must_use]
    pub const fn next_enabled(&self) -> bool {
        self.state.has_next()
    }

    /// Whether the "last" control should be enabled.
    #[must_use]
    pub const fn last_enabled(&self) -> bool {
        self.state.has_previous()
    }

    #[must_use]
    pub const fn page_label(&self) -> PageLabel {
        self.state.label()
    }

    /// Records of the current window.
    #[must_use]
    pub fn rows(&self) -> Vec<I::Record> {
        self.index
            .slice(self.state.range.start, self.state.range.len())
    }
}
