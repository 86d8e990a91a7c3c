//! The figure capability interface and the refresh host driving it.

use crate::error::FigureError;
use crate::geometry::Size;
use crate::scene::RenderSurface;
use crate::spec::FigureSpec;
use crate::zoom::GestureEvent;
use std::time::Duration;

/// One widget variant.
///
/// A refresh runs `arrange`, then `compute_domains`, then `render`. Variants
/// override only the stages they change.
pub trait Figure {
    /// Scales derived from one refresh.
    type Scales;

    /// Registry name of the variant, e.g. `bar_chart`.
    fn ident(&self) -> &'static str;

    /// Create layer scaffolding. Called once before the first render.
    fn setup(&mut self, surface: &mut dyn RenderSurface);

    /// Rearrange the incoming spec before domains are computed.
    fn arrange(&self, spec: FigureSpec) -> FigureSpec {
        spec
    }

    /// Recompute scales from the delivered data and the current view state.
    fn compute_domains(&self, spec: &FigureSpec) -> Result<Self::Scales, FigureError>;

    /// Reconcile the delivered data against the visual elements and start transitions.
    ///
    /// Must not mutate the surface unless it succeeds as a whole.
    fn render(
        &mut self,
        spec: &FigureSpec,
        scales: &Self::Scales,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError>;

    /// Adapt to a new outer size.
    fn resize(&mut self, size: Size, now: Duration, surface: &mut dyn RenderSurface);

    /// Apply an interactive gesture. Returns whether the view changed.
    fn on_gesture(&mut self, _event: GestureEvent) -> bool {
        false
    }

    /// Advance transitions. Returns whether anything still animates.
    fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool;
}

/// Drives one figure through refreshes, gestures and resizes.
///
/// Keeps the last successfully rendered spec so gestures and resizes can
/// re-render without new data. A failing refresh leaves the figure showing
/// the previous state.
#[derive(Debug)]
pub struct FigureHost<F> {
    figure: F,
    data: Option<FigureSpec>,
    initialized: bool,
    failures: u64,
}

impl<F: Figure> FigureHost<F> {
    #[must_use]
    pub const fn new(figure: F) -> Self {
        Self {
            figure,
            data: None,
            initialized: false,
            failures: 0,
        }
    }

    #[must_use]
    pub const fn figure(&self) -> &F {
        &self.figure
    }

    pub fn figure_mut(&mut self) -> &mut F {
        &mut self.figure
    }

    /// Spec of the last successful refresh, after arranging.
    #[must_use]
    pub const fn data(&self) -> Option<&FigureSpec> {
        self.data.as_ref()
    }

    /// Number of refreshes that failed.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    /// Run one-time setup if it has not happened yet.
    pub fn setup(&mut self, surface: &mut dyn RenderSurface) {
        if !self.initialized {
            self.figure.setup(surface);
            self.initialized = true;
        }
    }

    /// Render a freshly delivered spec.
    pub fn refresh(
        &mut self,
        spec: FigureSpec,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        self.setup(surface);
        let spec = self.figure.arrange(spec);
        match self.draw(&spec, now, surface) {
            Ok(()) => {
                self.data = Some(spec);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Decode and render a spec in its JSON wire form.
    pub fn refresh_json(
        &mut self,
        json: &str,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        match FigureSpec::from_json(json) {
            Ok(spec) => self.refresh(spec, now, surface),
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Apply a gesture and re-render the cached spec if the view changed.
    pub fn on_gesture(
        &mut self,
        event: GestureEvent,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<bool, FigureError> {
        if !self.figure.on_gesture(event) {
            return Ok(false);
        }
        self.redraw(now, surface)?;
        Ok(true)
    }

    /// Adapt to a new size and re-render the cached spec.
    pub fn resize(
        &mut self,
        size: Size,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        self.setup(surface);
        log::info!(
            "{}: resized to {}x{}",
            self.figure.ident(),
            size.width,
            size.height
        );
        self.figure.resize(size, now, surface);
        self.redraw(now, surface)
    }

    /// Advance transitions.
    pub fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        self.figure.tick(now, surface)
    }

    fn redraw(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> Result<(), FigureError> {
        let Some(spec) = self.data.take() else {
            return Ok(());
        };
        let result = self.draw(&spec, now, surface);
        self.data = Some(spec);
        result.map_err(|err| self.reject(err))
    }

    fn draw(
        &mut self,
        spec: &FigureSpec,
        now: Duration,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), FigureError> {
        let scales = self.figure.compute_domains(spec)?;
        self.figure.render(spec, &scales, now, surface)
    }

    fn reject(&mut self, err: FigureError) -> FigureError {
        self.failures += 1;
        log::warn!(
            "{}: refresh aborted, keeping previous state: {err}",
            self.figure.ident()
        );
        err
    }
}
