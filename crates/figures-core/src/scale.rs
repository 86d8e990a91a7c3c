//! Scales mapping data space to visual space, and per-refresh domain
//! computation.
//!
//! Domains are recomputed from scratch on every refresh and never consider the
//! active zoom; zooming is applied to ranges by [`crate::zoom`].

use crate::color::Color;
use crate::error::FigureError;
use crate::spec::Element;
use chrono::{DateTime, Timelike, Utc};

/// Continuous linear scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
    round: bool,
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new([0.0, 1.0], [0.0, 1.0])
    }
}

impl LinearScale {
    /// Create a scale.
    #[must_use]
    pub const fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self {
            domain,
            range,
            round: false,
        }
    }

    /// Round outputs to whole pixels.
    #[must_use]
    pub const fn rounded(mut self) -> Self {
        self.round = true;
        self
    }

    #[must_use]
    pub const fn domain(&self) -> [f64; 2] {
        self.domain
    }

    #[must_use]
    pub const fn range(&self) -> [f64; 2] {
        self.range
    }

    /// Map a domain value into the range.
    ///
    /// A degenerate domain maps everything onto the start of the range.
    #[must_use]
    pub fn scale(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 || !span.is_finite() {
            0.0
        } else {
            (value - d0) / span
        };
        let out = (r1 - r0).mul_add(t, r0);
        if self.round {
            out.round()
        } else {
            out
        }
    }

    /// Map a range value back into the domain.
    #[must_use]
    pub fn invert(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return d0;
        }
        (d1 - d0).mul_add((value - r0) / span, d0)
    }

    /// Roughly `count` evenly spaced, human-friendly values inside the domain.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(self.domain[0], self.domain[1], count)
    }
}

fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -(10f64.powf(-power)) / factor
    }
}

/// Ticks at multiples of 1, 2 or 5 times a power of ten.
fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let (lo, hi) = if stop < start {
        (stop, start)
    } else {
        (start, stop)
    };
    let inc = tick_increment(lo, hi, count);
    let mut ticks: Vec<f64> = if inc > 0.0 {
        let first = (lo / inc).ceil() as i64;
        let last = (hi / inc).floor() as i64;
        (first..=last).map(|i| i as f64 * inc).collect()
    } else {
        let inv = -inc;
        let first = (lo * inv).ceil() as i64;
        let last = (hi * inv).floor() as i64;
        (first..=last).map(|i| i as f64 / inv).collect()
    };
    if stop < start {
        ticks.reverse();
    }
    ticks
}

/// Candidate tick intervals in seconds.
const TIME_INTERVALS: [i64; 17] = [
    1, 5, 15, 30, 60, 300, 900, 1800, 3_600, 10_800, 21_600, 43_200, 86_400, 172_800, 604_800,
    2_592_000, 31_536_000,
];

/// Linear scale over Unix seconds with calendar-aligned ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    /// Create a scale from a `[start, end]` second domain.
    #[must_use]
    pub const fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self {
            inner: LinearScale::new(domain, range),
        }
    }

    #[must_use]
    pub const fn domain(&self) -> [f64; 2] {
        self.inner.domain()
    }

    #[must_use]
    pub const fn range(&self) -> [f64; 2] {
        self.inner.range()
    }

    /// Map a Unix timestamp into the range.
    #[must_use]
    pub fn scale(&self, seconds: f64) -> f64 {
        self.inner.scale(seconds)
    }

    /// Map a range value back to Unix seconds.
    #[must_use]
    pub fn invert(&self, value: f64) -> f64 {
        self.inner.invert(value)
    }

    /// Interval closest to producing `count` ticks over the domain.
    #[must_use]
    pub fn tick_interval(&self, count: usize) -> i64 {
        let [t0, t1] = self.domain();
        let target = (t1 - t0).abs() / count.max(1) as f64;
        let i = TIME_INTERVALS.partition_point(|&s| (s as f64) <= target);
        if i == 0 {
            return TIME_INTERVALS[0];
        }
        if i == TIME_INTERVALS.len() {
            return TIME_INTERVALS[i - 1];
        }
        let below = TIME_INTERVALS[i - 1] as f64;
        let above = TIME_INTERVALS[i] as f64;
        if target / below < above / target {
            TIME_INTERVALS[i - 1]
        } else {
            TIME_INTERVALS[i]
        }
    }

    /// Tick timestamps aligned to multiples of the chosen interval.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [t0, t1] = self.domain();
        if count == 0 || !t0.is_finite() || !t1.is_finite() {
            return Vec::new();
        }
        let (lo, hi) = if t1 < t0 { (t1, t0) } else { (t0, t1) };
        let step = self.tick_interval(count);
        let first = (lo / step as f64).ceil() as i64;
        let last = (hi / step as f64).floor() as i64;
        (first..=last).map(|i| (i * step) as f64).collect()
    }

    /// Axis label: day and month at midnight UTC, otherwise hours and minutes.
    #[must_use]
    pub fn format_tick(seconds: f64) -> String {
        let Some(at) = DateTime::<Utc>::from_timestamp(seconds.floor() as i64, 0) else {
            return String::new();
        };
        if at.hour() == 0 && at.minute() == 0 {
            at.format("%d %b").to_string()
        } else {
            at.format("%H:%M").to_string()
        }
    }
}

/// Discrete scale dividing a range into equal bands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BandScale {
    domain: Vec<String>,
    range: [f64; 2],
    padding: f64,
    step: f64,
    bandwidth: f64,
    offsets: Vec<f64>,
}

impl BandScale {
    /// Create a band scale with equal inner and outer padding.
    #[must_use]
    pub fn new(domain: Vec<String>, range: [f64; 2], padding: f64) -> Self {
        let mut scale = Self {
            domain,
            range,
            padding: padding.clamp(0.0, 1.0),
            step: 0.0,
            bandwidth: 0.0,
            offsets: Vec::new(),
        };
        scale.rescale();
        scale
    }

    fn rescale(&mut self) {
        let n = self.domain.len() as f64;
        let [r0, r1] = self.range;
        let reverse = r1 < r0;
        let (start, stop) = if reverse { (r1, r0) } else { (r0, r1) };
        let p = self.padding;
        self.step = (stop - start) / (n - p + p * 2.0).max(1.0);
        self.bandwidth = self.step * (1.0 - p);
        let first = start + (self.step.mul_add(-(n - p), stop - start)) * 0.5;
        self.offsets = (0..self.domain.len())
            .map(|i| self.step.mul_add(i as f64, first))
            .collect();
        if reverse {
            self.offsets.reverse();
        }
    }

    #[must_use]
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Width of one band.
    #[must_use]
    pub const fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Distance between the starts of adjacent bands.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Start of the band for `value`, if it is part of the domain.
    #[must_use]
    pub fn scale(&self, value: &str) -> Option<f64> {
        self.domain
            .iter()
            .position(|d| d == value)
            .map(|i| self.offsets[i])
    }
}

/// Piecewise-linear color interpolation between sorted stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    stops: Vec<(f64, Color)>,
}

impl ColorScale {
    /// Create a scale from `(value, color)` stops in ascending value order.
    #[must_use]
    pub const fn new(stops: Vec<(f64, Color)>) -> Self {
        Self { stops }
    }

    /// Green-yellow-red ramp over `[0, 40, max]`.
    ///
    /// The middle stop never exceeds `max` so the stops stay ordered.
    #[must_use]
    pub fn traffic_light(max: f64) -> Self {
        let max = max.max(0.0);
        Self::new(vec![
            (0.0, Color::GREEN),
            (40.0f64.min(max), Color::YELLOW),
            (max, Color::RED),
        ])
    }

    /// Evenly spaced palette stops spread over `[lo, hi]`.
    #[must_use]
    pub fn sequential(palette: &[Color], lo: f64, hi: f64) -> Self {
        let last = palette.len().saturating_sub(1).max(1) as f64;
        Self::new(
            palette
                .iter()
                .enumerate()
                .map(|(i, c)| ((hi - lo).mul_add(i as f64 / last, lo), *c))
                .collect(),
        )
    }

    /// Color of `value`, clamped to the outer stops.
    #[must_use]
    pub fn color(&self, value: f64) -> Color {
        let Some(&(first_value, first_color)) = self.stops.first() else {
            return Color::BLACK;
        };
        if value.is_nan() || value <= first_value {
            return first_color;
        }
        if let Some(&(last_value, last_color)) = self.stops.last() {
            if value >= last_value {
                return last_color;
            }
        }
        for pair in self.stops.windows(2) {
            let (lo, lo_color) = pair[0];
            let (hi, hi_color) = pair[1];
            if value <= hi {
                let span = hi - lo;
                let t = if span > 0.0 { (value - lo) / span } else { 1.0 };
                return lo_color.lerp(&hi_color, t as f32);
            }
        }
        first_color
    }
}

/// Ordinal palette assigning colors to keys in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalColors {
    palette: &'static [Color],
    seen: Vec<String>,
}

impl OrdinalColors {
    #[must_use]
    pub const fn new(palette: &'static [Color]) -> Self {
        Self {
            palette,
            seen: Vec::new(),
        }
    }

    /// Color of `key`, registering it on first use.
    pub fn color(&mut self, key: &str) -> Color {
        let index = if let Some(i) = self.seen.iter().position(|k| k == key) {
            i
        } else {
            self.seen.push(key.to_string());
            self.seen.len() - 1
        };
        if self.palette.is_empty() {
            return Color::BLACK;
        }
        self.palette[index % self.palette.len()]
    }
}

/// Which position domain a figure derives from its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainKind {
    /// Magnitudes only
    Magnitude,
    /// Time buckets in ascending order
    Time,
    /// Named grid cells
    Grid {
        columns: Option<Vec<String>>,
        rows: Option<Vec<String>>,
    },
}

/// Position domain derived from one refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionDomain {
    /// No records, or a figure without positions
    Empty,
    /// `[first.timestamp, last.timestamp + last.timestep]`
    Time { start: f64, end: f64 },
    /// Column and row names of a grid
    Grid {
        columns: Vec<String>,
        rows: Vec<String>,
    },
}

/// Domains of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Domains {
    pub value: [f64; 2],
    pub position: PositionDomain,
}

impl Domains {
    /// Reject domains derived from no data.
    ///
    /// Figures render empty data as an empty scene; this is for callers that
    /// treat it as an error instead.
    pub fn non_empty(self) -> Result<Self, FigureError> {
        let degenerate = self.value[0] == self.value[1];
        let positionless = match &self.position {
            PositionDomain::Empty => true,
            PositionDomain::Time { start, end } => start == end,
            PositionDomain::Grid { columns, rows } => columns.is_empty() || rows.is_empty(),
        };
        if degenerate && positionless {
            Err(FigureError::EmptyDomain)
        } else {
            Ok(self)
        }
    }
}

/// `[0, max(value)]`, or `[0, 0]` for no records.
#[must_use]
pub fn value_domain(elements: &[Element]) -> [f64; 2] {
    let max = elements
        .iter()
        .map(|e| e.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
    [0.0, max.unwrap_or(0.0).max(0.0)]
}

/// Recompute the domains of one refresh.
///
/// Time records are expected in ascending timestamp order and are not sorted.
pub fn compute_domains(elements: &[Element], kind: &DomainKind) -> Result<Domains, FigureError> {
    let value = value_domain(elements);
    let position = match kind {
        DomainKind::Magnitude => PositionDomain::Empty,
        DomainKind::Time => match (elements.first(), elements.last()) {
            (Some(first), Some(last)) => {
                let last_index = elements.len() - 1;
                let start = first.timestamp.ok_or(FigureError::MissingField {
                    index: 0,
                    field: "timestamp",
                })?;
                let last_start = last.timestamp.ok_or(FigureError::MissingField {
                    index: last_index,
                    field: "timestamp",
                })?;
                let step = last.timestep.ok_or(FigureError::MissingField {
                    index: last_index,
                    field: "timestep",
                })?;
                PositionDomain::Time {
                    start,
                    end: last_start + step,
                }
            }
            _ => PositionDomain::Empty,
        },
        DomainKind::Grid { columns, rows } => PositionDomain::Grid {
            columns: columns
                .clone()
                .unwrap_or_else(|| distinct(elements, |e| e.x.as_deref())),
            rows: rows
                .clone()
                .unwrap_or_else(|| distinct(elements, |e| e.y.as_deref())),
        },
    };
    Ok(Domains { value, position })
}

fn distinct<'a, F>(elements: &'a [Element], field: F) -> Vec<String>
where
    F: Fn(&'a Element) -> Option<&'a str>,
{
    let mut names: Vec<String> = Vec::new();
    for name in elements.iter().filter_map(field) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Columns per row of a synthetic grid holding `count` cells.
#[must_use]
pub fn bucket_columns(count: usize) -> usize {
    (count as f64).sqrt().ceil() as usize + 1
}

/// Place records row-major into a synthetic grid.
///
/// Cell names are `X{column}` and `Y{row}`. Returns the column and row names.
pub fn bucket_grid(elements: &mut [Element]) -> (Vec<String>, Vec<String>) {
    let width = bucket_columns(elements.len());
    for (i, element) in elements.iter_mut().enumerate() {
        element.x = Some(format!("X{}", i % width));
        element.y = Some(format!("Y{}", i / width));
    }
    let rows = elements.len().div_ceil(width);
    (
        (0..width).map(|c| format!("X{c}")).collect(),
        (0..rows).map(|r| format!("Y{r}")).collect(),
    )
}
