//! Persistent pan/zoom state and its composition with data-driven scales.
//!
//! The transform is applied to pixel ranges, never to domains. A refresh
//! recomputes domains from the data and reuses the current transform, so new
//! data never resets the zoom level.

use crate::geometry::{Point, Rect};

/// Default upper bound of the zoom factor.
pub const DEFAULT_MAX_ZOOM: f64 = 12.0;

/// Wheel delta to zoom exponent factor.
const WHEEL_SENSITIVITY: f64 = 0.002;

/// Affine pan/zoom transform: `screen = data * k + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    /// No pan, no zoom.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    #[must_use]
    pub const fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    #[must_use]
    pub fn apply_x(&self, x: f64) -> f64 {
        x.mul_add(self.k, self.x)
    }

    #[must_use]
    pub fn apply_y(&self, y: f64) -> f64 {
        y.mul_add(self.k, self.y)
    }

    #[must_use]
    pub fn invert_x(&self, x: f64) -> f64 {
        (x - self.x) / self.k
    }

    #[must_use]
    pub fn invert_y(&self, y: f64) -> f64 {
        (y - self.y) / self.k
    }

    #[must_use]
    pub fn invert(&self, p: Point) -> Point {
        Point::new(self.invert_x(p.x), self.invert_y(p.y))
    }

    /// Translate by `(dx, dy)` in unscaled units.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.k.mul_add(dx, self.x), self.k.mul_add(dy, self.y), self.k)
    }

    /// Change the zoom factor keeping the data point under `anchor` fixed.
    #[must_use]
    pub fn scale_about(&self, anchor: Point, k: f64) -> Self {
        let p0 = self.invert(anchor);
        Self::new(p0.x.mul_add(-k, anchor.x), p0.y.mul_add(-k, anchor.y), k)
    }
}

/// Compose a pixel range with a transform along x.
#[must_use]
pub fn apply_zoom(range: [f64; 2], transform: &ZoomTransform) -> [f64; 2] {
    [transform.apply_x(range[0]), transform.apply_x(range[1])]
}

/// Interactive input driving a [`ZoomBehavior`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Mouse wheel at a position; positive `delta_y` zooms out
    Wheel { position: Point, delta_y: f64 },
    /// Drag by a pixel delta
    Pan { delta: Point },
    /// Pinch by a relative scale around a center
    Pinch { center: Point, scale: f64 },
    /// Double tap zooms in twofold
    DoubleTap { position: Point },
    /// Programmatic transform request
    Transform(ZoomTransform),
    /// Back to identity
    Reset,
}

/// Zoom state of one figure, clamped to a scale extent and a pan extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomBehavior {
    scale_extent: [f64; 2],
    extent: Rect,
    translate_extent: Rect,
    transform: ZoomTransform,
}

impl ZoomBehavior {
    /// Zoom over `extent` with factors in `[1, max_zoom]`.
    ///
    /// The viewport may not be panned outside `extent`.
    #[must_use]
    pub fn new(extent: Rect, max_zoom: f64) -> Self {
        Self {
            scale_extent: [1.0, max_zoom.max(1.0)],
            extent,
            translate_extent: extent,
            transform: ZoomTransform::IDENTITY,
        }
    }

    /// Use a pan extent different from the viewport.
    #[must_use]
    pub fn with_translate_extent(mut self, translate_extent: Rect) -> Self {
        self.translate_extent = translate_extent;
        self.transform = self.constrain(self.transform);
        self
    }

    #[must_use]
    pub const fn transform(&self) -> ZoomTransform {
        self.transform
    }

    #[must_use]
    pub const fn max_zoom(&self) -> f64 {
        self.scale_extent[1]
    }

    /// Viewport and pan extent changed, e.g. after a resize.
    pub fn set_extent(&mut self, extent: Rect) {
        self.extent = extent;
        self.translate_extent = extent;
        self.transform = self.constrain(self.transform);
    }

    /// Apply a gesture and return the resulting transform.
    ///
    /// Requests beyond the scale or pan extent are clamped silently.
    pub fn on_gesture(&mut self, event: GestureEvent) -> ZoomTransform {
        let t = self.transform;
        let next = match event {
            GestureEvent::Wheel { position, delta_y } => {
                let k = t.k * (-delta_y * WHEEL_SENSITIVITY).exp2();
                t.scale_about(position, self.clamp_k(k))
            }
            GestureEvent::Pan { delta } => {
                ZoomTransform::new(t.x + delta.x, t.y + delta.y, t.k)
            }
            GestureEvent::Pinch { center, scale } => t.scale_about(center, self.clamp_k(t.k * scale)),
            GestureEvent::DoubleTap { position } => t.scale_about(position, self.clamp_k(t.k * 2.0)),
            GestureEvent::Transform(requested) => {
                ZoomTransform::new(requested.x, requested.y, self.clamp_k(requested.k))
            }
            GestureEvent::Reset => ZoomTransform::IDENTITY,
        };
        let next = self.constrain(next);
        if next != self.transform {
            log::info!(
                "zoom changed to k={:.3} x={:.1} y={:.1}",
                next.k,
                next.x,
                next.y
            );
        }
        self.transform = next;
        next
    }

    fn clamp_k(&self, k: f64) -> f64 {
        if k.is_nan() {
            return self.transform.k;
        }
        k.clamp(self.scale_extent[0], self.scale_extent[1])
    }

    /// Shift `t` so the viewport stays inside the pan extent.
    fn constrain(&self, t: ZoomTransform) -> ZoomTransform {
        let e = self.extent;
        let te = self.translate_extent;
        let dx0 = t.invert_x(e.x) - te.x;
        let dx1 = t.invert_x(e.right()) - te.right();
        let dy0 = t.invert_y(e.y) - te.y;
        let dy1 = t.invert_y(e.bottom()) - te.bottom();
        t.translate(settle(dx0, dx1), settle(dy0, dy1))
    }
}

fn settle(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else {
        let low = d0.min(0.0);
        if low == 0.0 {
            d1.max(0.0)
        } else {
            low
        }
    }
}
