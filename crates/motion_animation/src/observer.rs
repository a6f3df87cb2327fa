//! Viewport visibility observer
//!
//! Models a viewport-intersection primitive geometrically. The host supplies
//! the target's bounds through a [`TargetRef`] (which may be filled in after
//! setup) and feeds the viewport rectangle on every update. The observer
//! computes the visible fraction of the target against the viewport expanded
//! by the root margin and reports a transition whenever the element crosses
//! the threshold.
//!
//! The observer only reports transitions; deciding what to animate is up to
//! the caller.

use motion_core::{Margins, Rect, TriggerConfig};
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;

/// Updates without an attached target before the observer logs a warning
const ATTACH_WARN_AFTER: u32 = 60;

/// Late-bound reference to an element's bounds
///
/// Clones share the same slot, so the host can keep one and set the bounds
/// once layout has run.
#[derive(Clone, Debug, Default)]
pub struct TargetRef {
    rect: Rc<Cell<Option<Rect>>>,
}

impl TargetRef {
    /// An empty reference, not yet attached
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(rect: Rect) -> Self {
        let target = Self::new();
        target.set(rect);
        target
    }

    pub fn set(&self, rect: Rect) {
        self.rect.set(Some(rect));
    }

    pub fn detach(&self) {
        self.rect.set(None);
    }

    pub fn get(&self) -> Option<Rect> {
        self.rect.get()
    }

    pub fn is_attached(&self) -> bool {
        self.rect.get().is_some()
    }
}

/// Threshold and margin settings for an observer
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    thresholds: SmallVec<[f32; 4]>,
    pub root_margin: Margins,
    pub trigger_once: bool,
}

impl ObserverOptions {
    /// Thresholds are clamped to `[0, 1]`, sorted and deduplicated; an
    /// empty or non-finite list falls back to 0.
    pub fn new(thresholds: impl IntoIterator<Item = f32>, root_margin: Margins, trigger_once: bool) -> Self {
        let mut thresholds: SmallVec<[f32; 4]> = thresholds
            .into_iter()
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, 1.0))
            .collect();
        thresholds.sort_by(f32::total_cmp);
        thresholds.dedup();
        if thresholds.is_empty() {
            thresholds.push(0.0);
        }
        Self {
            thresholds,
            root_margin,
            trigger_once,
        }
    }

    pub fn from_config(config: &TriggerConfig) -> Self {
        Self::new([config.threshold], config.margins(), config.trigger_once)
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    /// Visible fraction at which the element counts as visible
    pub fn min_threshold(&self) -> f32 {
        self.thresholds.first().copied().unwrap_or(0.0)
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self::from_config(&TriggerConfig::default())
    }
}

/// Observation lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObserverStatus {
    /// Waiting for the target to attach
    Pending,
    Observing,
    /// Torn down after a one-shot trigger
    Disconnected,
}

/// Tracks whether one target is in view
#[derive(Debug)]
pub struct VisibilityObserver {
    target: TargetRef,
    options: ObserverOptions,
    status: ObserverStatus,
    visible: bool,
    ratio: f32,
    attach_attempts: u32,
}

impl VisibilityObserver {
    pub fn new(target: TargetRef, options: ObserverOptions) -> Self {
        let status = if target.is_attached() {
            ObserverStatus::Observing
        } else {
            ObserverStatus::Pending
        };
        Self {
            target,
            options,
            status,
            visible: false,
            ratio: 0.0,
            attach_attempts: 0,
        }
    }

    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    pub fn status(&self) -> ObserverStatus {
        self.status
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Visible fraction of the target as of the last update
    pub fn intersection_ratio(&self) -> f32 {
        self.ratio
    }

    /// Updates spent waiting for the target to attach
    pub fn attach_attempts(&self) -> u32 {
        self.attach_attempts
    }

    /// Feed the current viewport
    ///
    /// Returns `Some(visible)` when visibility changed.
    pub fn update(&mut self, viewport: Rect) -> Option<bool> {
        match self.status {
            ObserverStatus::Disconnected => return None,
            ObserverStatus::Pending => {
                if !self.target.is_attached() {
                    self.attach_attempts += 1;
                    if self.attach_attempts == ATTACH_WARN_AFTER {
                        tracing::warn!(
                            attempts = self.attach_attempts,
                            "visibility target still not attached"
                        );
                    }
                    return None;
                }
                tracing::debug!(attempts = self.attach_attempts, "visibility target attached");
                self.status = ObserverStatus::Observing;
            }
            ObserverStatus::Observing => {}
        }

        let Some(target) = self.target.get() else {
            // Detached while observing: wait for it to come back
            self.status = ObserverStatus::Pending;
            self.attach_attempts = 0;
            self.ratio = 0.0;
            return self.transition(false);
        };

        let root = viewport.inflate(&self.options.root_margin);
        let intersection = target.intersection(&root);
        let intersecting = match intersection {
            Some(area) => area.area() > 0.0 || target.is_empty(),
            None => false,
        };
        self.ratio = match intersection {
            Some(_) if target.is_empty() => 1.0,
            Some(area) => (area.area() / target.area()).clamp(0.0, 1.0),
            None => 0.0,
        };

        let threshold = self.options.min_threshold();
        let now_visible = intersecting && (threshold <= 0.0 || self.ratio >= threshold);
        let change = self.transition(now_visible);

        if change == Some(true) && self.options.trigger_once {
            tracing::debug!("visibility observer disconnected after first trigger");
            self.status = ObserverStatus::Disconnected;
        }
        change
    }

    fn transition(&mut self, visible: bool) -> Option<bool> {
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(visible)
    }

    /// Stop observing
    pub fn disconnect(&mut self) {
        self.status = ObserverStatus::Disconnected;
    }

    /// Forget the last result and observe again
    pub fn reset(&mut self) {
        self.visible = false;
        self.ratio = 0.0;
        self.attach_attempts = 0;
        self.status = if self.target.is_attached() {
            ObserverStatus::Observing
        } else {
            ObserverStatus::Pending
        };
    }
}
