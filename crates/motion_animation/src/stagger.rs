//! Stagger orchestration
//!
//! One observer watches a container; when it first becomes visible a single
//! shared flag flips and N precomputed item descriptors switch from their
//! hidden to their visible variant. Each item carries its own delay:
//!
//! ```text
//! delay(i) = base_delay + effective_index(i) * stagger_delay
//! ```
//!
//! where the effective index depends on the stagger direction and is capped
//! by an optional limit.

use crate::engine::ResolvedMotion;
use crate::observer::{ObserverOptions, TargetRef, VisibilityObserver};
use motion_core::{Rect, VisualState};
use serde::{Deserialize, Serialize};

/// Order in which staggered items start
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StaggerDirection {
    /// Animate first to last
    #[default]
    Forward,
    /// Animate last to first
    Reverse,
    /// Animate from center outward
    FromCenter,
}

/// Delay layout and shared motion for a group of N items
#[derive(Clone, Debug, PartialEq)]
pub struct StaggerPlan {
    pub count: usize,
    /// Delay between each item's start (ms)
    pub stagger_delay_ms: u32,
    /// Delay before the first item starts (ms)
    pub base_delay_ms: u32,
    pub direction: StaggerDirection,
    /// Optional: limit stagger to first N steps
    pub limit: Option<usize>,
    /// Motion shared by every item
    pub motion: ResolvedMotion,
}

impl StaggerPlan {
    /// The motion's own delay becomes the base delay
    pub fn new(count: usize, stagger_delay_ms: u32, motion: ResolvedMotion) -> Self {
        Self {
            count,
            stagger_delay_ms,
            base_delay_ms: motion.delay_ms,
            direction: StaggerDirection::Forward,
            limit: None,
            motion,
        }
    }

    pub fn with_base_delay(mut self, base_delay_ms: u32) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Stagger from last to first
    pub fn reverse(mut self) -> Self {
        self.direction = StaggerDirection::Reverse;
        self
    }

    /// Stagger from center outward
    pub fn from_center(mut self) -> Self {
        self.direction = StaggerDirection::FromCenter;
        self
    }

    /// Limit stagger to first N steps
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Calculate delay for a specific item index
    pub fn delay_for_index(&self, index: usize) -> u32 {
        let total = self.count;
        let effective_index = match self.direction {
            StaggerDirection::Forward => index,
            StaggerDirection::Reverse => total.saturating_sub(1).saturating_sub(index),
            StaggerDirection::FromCenter => {
                let center = total / 2;
                center.abs_diff(index)
            }
        };

        let capped_index = match self.limit {
            Some(limit) => effective_index.min(limit),
            None => effective_index,
        };

        let step = u32::try_from(capped_index).unwrap_or(u32::MAX);
        self.base_delay_ms
            .saturating_add(self.stagger_delay_ms.saturating_mul(step))
    }

    /// Time from trigger until the last item finishes
    pub fn total_duration_ms(&self) -> u32 {
        (0..self.count)
            .map(|index| self.delay_for_index(index))
            .max()
            .map(|delay| delay.saturating_add(self.motion.duration_ms))
            .unwrap_or(0)
    }

    /// Build every item descriptor from its index
    pub fn items(&self) -> Vec<StaggerItem> {
        let hidden = self.motion.hidden_state();
        let visible = self.motion.visible_state();
        (0..self.count)
            .map(|index| {
                let delay_ms = self.delay_for_index(index);
                let with_delay = |state: &VisualState| {
                    let mut state = state.clone();
                    state.vars.delay_ms = delay_ms;
                    state
                };
                StaggerItem {
                    index,
                    delay_ms,
                    duration_ms: self.motion.duration_ms,
                    easing: self.motion.easing.to_css(),
                    hidden: with_delay(&hidden),
                    visible: with_delay(&visible),
                }
            })
            .collect()
    }
}

/// Per-item transition descriptor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StaggerItem {
    pub index: usize,
    pub delay_ms: u32,
    pub duration_ms: u32,
    /// CSS timing function
    pub easing: String,
    pub hidden: VisualState,
    pub visible: VisualState,
}

impl StaggerItem {
    pub fn variant(&self, visible: bool) -> &VisualState {
        if visible {
            &self.visible
        } else {
            &self.hidden
        }
    }
}

/// Drives N staggered items from a single observer
pub struct StaggerOrchestrator {
    plan: StaggerPlan,
    items: Vec<StaggerItem>,
    observer: VisibilityObserver,
    visible: bool,
}

impl StaggerOrchestrator {
    pub fn new(plan: StaggerPlan, target: TargetRef, options: ObserverOptions) -> Self {
        let items = plan.items();
        Self {
            plan,
            items,
            observer: VisibilityObserver::new(target, options),
            visible: false,
        }
    }

    pub fn plan(&self) -> &StaggerPlan {
        &self.plan
    }

    pub fn observer(&self) -> &VisibilityObserver {
        &self.observer
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Change the item count and rebuild every descriptor
    pub fn set_count(&mut self, count: usize) {
        self.plan.count = count;
        self.items = self.plan.items();
        tracing::debug!(count, "stagger items rebuilt");
    }

    /// Feed the container's viewport; returns the new shared visibility on change
    pub fn update_viewport(&mut self, viewport: Rect) -> Option<bool> {
        let change = self.observer.update(viewport)?;
        if change == self.visible {
            return None;
        }
        self.visible = change;
        Some(change)
    }

    /// Show every item without waiting for the observer
    pub fn trigger(&mut self) {
        self.visible = true;
    }

    /// Hide every item and observe again
    pub fn reset(&mut self) {
        self.visible = false;
        self.observer.reset();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn items(&self) -> &[StaggerItem] {
        &self.items
    }

    /// Target state of every item under the shared flag
    pub fn current_variants(&self) -> Vec<&VisualState> {
        self.items
            .iter()
            .map(|item| item.variant(self.visible))
            .collect()
    }

    /// Interpolated state of every item `elapsed_ms` after becoming visible
    pub fn sample_at(&self, elapsed_ms: f64) -> Vec<VisualState> {
        let duration = f64::from(self.plan.motion.duration_ms);
        self.items
            .iter()
            .map(|item| {
                if !self.visible {
                    return item.hidden.clone();
                }
                let local = elapsed_ms - f64::from(item.delay_ms);
                let t = if duration <= 0.0 {
                    if local >= 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    (local / duration).clamp(0.0, 1.0)
                };
                let mut state = self.plan.motion.sample(t as f32);
                state.vars.delay_ms = item.delay_ms;
                state
            })
            .collect()
    }
}
