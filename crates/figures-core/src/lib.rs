//! Incremental keyed-diff rendering engine for dashboard figures.
//!
//! This crate provides the machinery shared by every figure variant:
//! - Data model: [`FigureSpec`], [`Element`], [`Identity`], [`KeyRule`]
//! - Keyed reconciliation: [`reconcile`], [`KeyedElements`], [`Reconciliation`]
//! - Scales and domains: [`LinearScale`], [`TimeScale`], [`BandScale`], [`compute_domains`]
//! - Pan/zoom: [`ZoomBehavior`], [`ZoomTransform`], [`GestureEvent`]
//! - Transitions: [`TransitionScheduler`], [`Motion`], [`Choreography`]
//! - Paging over a filtering index: [`WindowedQuery`], [`FilterIndex`], [`MemoryIndex`]
//! - The rendering seam: [`RenderSurface`], [`RecordingSurface`]
//! - The refresh contract: [`Figure`], [`FigureHost`]

mod color;
mod error;
mod geometry;

pub mod animation;
pub mod diff;
pub mod figure;
pub mod layer;
pub mod scale;
pub mod scene;
pub mod spec;
pub mod title;
pub mod window;
pub mod zoom;

pub use animation::{
    Choreography, Easing, Motion, Transition, TransitionScheduler, DEFAULT_DURATION,
    DENSE_DURATION,
};
pub use color::{Color, ColorParseError, CATEGORY10, INFERNO, PIE_PALETTE};
pub use diff::{reconcile, JoinPlan, Joined, KeyedElements, Reconciliation, VisualElement};
pub use error::FigureError;
pub use figure::{Figure, FigureHost};
pub use geometry::{Margin, Point, Rect, Size};
pub use layer::KeyedLayer;
pub use scale::{
    bucket_columns, bucket_grid, compute_domains, value_domain, BandScale, ColorScale, DomainKind,
    Domains, LinearScale, OrdinalColors, PositionDomain, TimeScale,
};
pub use scene::{
    ArcShape, ClassDelta, Geometry, Interaction, LinkBand, NodeId, Paint, RecordingSurface,
    RenderSurface, SceneNode, Shape, SurfaceOp, TextAnchor,
};
pub use spec::{
    DisplayOptions, Element, FigureSpec, FlowRecord, Identity, KeyRule, TableCell, TableRow,
};
pub use title::TitleLayer;
pub use window::{
    FilterIndex, MemoryIndex, PageLabel, Window, WindowState, WindowedQuery, DEFAULT_PAGE_SIZE,
};
pub use zoom::{apply_zoom, GestureEvent, ZoomBehavior, ZoomTransform, DEFAULT_MAX_ZOOM};
