//! Transition scheduling for reconciled visual elements.
//!
//! Every [`VisualElement`] carries its own [`Motion`]: the geometry currently
//! shown plus at most one running [`Transition`]. Starting a new transition
//! samples the running one first, so rapid refreshes interrupt rather than
//! queue. Time is a monotonic [`Duration`] supplied by the host.

use crate::diff::{KeyedElements, Reconciliation, VisualElement};
use crate::scene::{Geometry, RenderSurface};
use crate::spec::Element;
use std::time::Duration;

/// Default transition length of most figures.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(1000);

/// Transition length of density and flow figures.
pub const DENSE_DURATION: Duration = Duration::from_millis(1800);

/// Easing function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Linear interpolation (no easing)
    Linear,
    /// Cubic ease in
    CubicIn,
    /// Cubic ease out
    CubicOut,
    /// Cubic ease in and out
    #[default]
    CubicInOut,
}

impl Easing {
    /// Apply easing function to a normalized time value (0.0 to 1.0).
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicIn => t * t * t,
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0f64).mul_add(t, 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// One running interpolation between two geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: Geometry,
    pub to: Geometry,
    pub start: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Transition {
    /// Progress from 0.0 to 1.0 at `now`.
    #[must_use]
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Interpolated geometry at `now`.
    #[must_use]
    pub fn sample(&self, now: Duration) -> Geometry {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.to.clone();
        }
        self.from.lerp(&self.to, self.easing.apply(t))
    }

    /// Whether the transition has reached its end at `now`.
    #[must_use]
    pub fn is_complete(&self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Animation state of one visual element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Motion {
    current: Geometry,
    transition: Option<Transition>,
}

impl Motion {
    /// Motion resting at `geometry`.
    #[must_use]
    pub const fn at(geometry: Geometry) -> Self {
        Self {
            current: geometry,
            transition: None,
        }
    }

    /// Geometry last pushed to the surface.
    #[must_use]
    pub const fn current(&self) -> &Geometry {
        &self.current
    }

    /// Geometry the element is heading to.
    #[must_use]
    pub fn target(&self) -> &Geometry {
        self.transition.as_ref().map_or(&self.current, |t| &t.to)
    }

    /// Whether a transition is running.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Geometry at `now` without advancing.
    #[must_use]
    pub fn sample(&self, now: Duration) -> Geometry {
        self.transition
            .as_ref()
            .map_or_else(|| self.current.clone(), |t| t.sample(now))
    }

    /// Cancel any running transition and rest at `geometry`.
    pub fn jump(&mut self, geometry: Geometry) {
        self.transition = None;
        self.current = geometry;
    }

    /// Interrupt any running transition and head for `to`, starting at `from`.
    pub fn retarget_from(
        &mut self,
        now: Duration,
        from: Geometry,
        to: Geometry,
        duration: Duration,
        easing: Easing,
    ) {
        if duration.is_zero() {
            self.jump(to);
            return;
        }
        self.current = from.clone();
        self.transition = Some(Transition {
            from,
            to,
            start: now,
            duration,
            easing,
        });
    }

    /// Interrupt any running transition and head for `to` from where it is now.
    pub fn retarget(&mut self, now: Duration, to: Geometry, duration: Duration, easing: Easing) {
        let from = self.sample(now);
        self.retarget_from(now, from, to, duration, easing);
    }

    /// Advance to `now`. Returns the new geometry when it moved.
    pub fn advance(&mut self, now: Duration) -> Option<Geometry> {
        let transition = self.transition.as_ref()?;
        let geometry = transition.sample(now);
        if transition.is_complete(now) {
            self.transition = None;
        }
        if geometry == self.current {
            return None;
        }
        self.current = geometry.clone();
        Some(geometry)
    }
}

/// Per-figure geometry rules for entering, updating and exiting elements.
pub trait Choreography {
    /// Final geometry of the record at `index`.
    fn target(&self, datum: &Element, index: usize) -> Geometry;

    /// Degenerate geometry an entering element starts from.
    fn enter(&self, datum: &Element, target: &Geometry) -> Geometry;

    /// Degenerate geometry an exiting element ends at.
    fn exit(&self, datum: &Element, current: &Geometry) -> Geometry {
        self.enter(datum, current)
    }

    /// Geometry an updating element jumps to before its transition starts.
    ///
    /// Attributes that must not animate are taken from `target` here.
    fn snap(&self, current: &Geometry, _target: &Geometry) -> Geometry {
        current.clone()
    }
}

/// Drives transitions of one layer: exit, then enter, then update.
#[derive(Debug)]
pub struct TransitionScheduler {
    duration: Duration,
    easing: Easing,
    retiring: Vec<VisualElement>,
}

impl Default for TransitionScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl TransitionScheduler {
    /// Create a scheduler with a fixed duration.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            easing: Easing::CubicInOut,
            retiring: Vec::new(),
        }
    }

    /// Set easing function.
    #[must_use]
    pub const fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Transition duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Exited elements still animating towards removal.
    #[must_use]
    pub fn retiring(&self) -> &[VisualElement] {
        &self.retiring
    }

    /// Start the transitions of one reconcile.
    pub fn animate<C, S>(
        &mut self,
        now: Duration,
        elements: &mut KeyedElements,
        reconciliation: &mut Reconciliation,
        choreography: &C,
        surface: &mut S,
    ) where
        C: Choreography + ?Sized,
        S: RenderSurface + ?Sized,
    {
        for mut gone in reconciliation.exiting.drain(..) {
            let from = gone.motion.sample(now);
            let to = choreography.exit(&gone.datum, &from);
            gone.motion
                .retarget_from(now, from, to, self.duration, self.easing);
            self.retiring.push(gone);
        }

        for joined in &reconciliation.entering {
            let Some(element) = elements.get_mut(&joined.identity) else {
                continue;
            };
            let target = choreography.target(&element.datum, joined.index);
            if self.duration.is_zero() {
                surface.create(element.node, joined.index, &target);
                element.motion = Motion::at(target);
                continue;
            }
            let initial = choreography.enter(&element.datum, &target);
            surface.create(element.node, joined.index, &initial);
            element.motion = Motion::at(initial.clone());
            element
                .motion
                .retarget_from(now, initial, target, self.duration, self.easing);
        }

        for joined in &reconciliation.updating {
            let Some(element) = elements.get_mut(&joined.identity) else {
                continue;
            };
            let target = choreography.target(&element.datum, joined.index);
            let sampled = element.motion.sample(now);
            if self.duration.is_zero() {
                if target != *element.motion.current() {
                    surface.update(element.node, &target);
                }
                element.motion.jump(target);
                continue;
            }
            let from = choreography.snap(&sampled, &target);
            if from != *element.motion.current() {
                surface.update(element.node, &from);
            }
            element
                .motion
                .retarget_from(now, from, target, self.duration, self.easing);
        }

        if !reconciliation.entering.is_empty() || reconciliation.reordered {
            surface.reorder(elements.layer(), &elements.nodes_in_order());
        }
    }

    /// Push the geometry of every running transition at `now`.
    ///
    /// Exited elements are removed once their transition completed. Returns
    /// whether anything is still animating.
    pub fn tick<S>(&mut self, now: Duration, elements: &mut KeyedElements, surface: &mut S) -> bool
    where
        S: RenderSurface + ?Sized,
    {
        let mut frames = 0usize;
        for element in elements.iter_mut() {
            if let Some(geometry) = element.motion.advance(now) {
                surface.update(element.node, &geometry);
                frames += 1;
            }
        }

        self.retiring.retain_mut(|gone| {
            if let Some(geometry) = gone.motion.advance(now) {
                surface.update(gone.node, &geometry);
                frames += 1;
            }
            if gone.motion.is_animating() {
                true
            } else {
                surface.remove(gone.node);
                false
            }
        });

        let animating =
            !self.retiring.is_empty() || elements.iter().any(|e| e.motion.is_animating());
        log::trace!(
            "layer '{}': {frames} frames at {now:?}, animating={animating}",
            elements.layer()
        );
        animating
    }

    /// Cancel every running transition.
    ///
    /// Live elements rest where they currently are; exited elements are
    /// removed at once since their exit was cancelled.
    pub fn interrupt<S>(&mut self, now: Duration, elements: &mut KeyedElements, surface: &mut S)
    where
        S: RenderSurface + ?Sized,
    {
        for element in elements.iter_mut() {
            let here = element.motion.sample(now);
            if here != *element.motion.current() {
                surface.update(element.node, &here);
            }
            element.motion.jump(here);
        }
        for gone in self.retiring.drain(..) {
            surface.remove(gone.node);
        }
    }
}
