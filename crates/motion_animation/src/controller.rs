//! Frame-driven motion controllers
//!
//! Controllers wire the pieces together for one element:
//!
//! ```text
//! VisibilityObserver ─▶ start() ─▶ delay timer ─▶ MotionPlayer / SpringGroup
//!                                                       │ each frame
//!                                                       ▼
//!                            MotionRuntimeState + MotionStore ─▶ listeners
//! ```
//!
//! [`MotionController`] runs timed motions through the playback state
//! machine; [`SpringController`] runs the same properties through springs.
//! Each controller owns one callback chain on the [`FrameScheduler`]. Pausing,
//! stopping and resetting cancel pending frames and timers synchronously.
//! Listeners and store writes run after the controller's state is released,
//! so listeners may call back into the controller.
//!
//! [`FrameScheduler`]: crate::scheduler::FrameScheduler

use crate::clock::Clock;
use crate::descriptor::MotionDescriptor;
use crate::engine::{Property, ResolvedMotion};
use crate::observer::{ObserverOptions, TargetRef, VisibilityObserver};
use crate::player::{MotionPlayer, PlaybackState};
use crate::scheduler::{FrameId, SchedulerHandle, TimerId};
use crate::spring::{SpringConfig, SpringGroup};
use motion_core::{MotionConfig, MotionStore, MotionValues, MotionVars, Rect, VisualState};
use serde::Serialize;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Per-element state exposed to consumers each frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionRuntimeState {
    pub is_visible: bool,
    pub is_animating: bool,
    /// Normalized progress in `[0, 1]`
    pub progress: f32,
    pub visual: VisualState,
}

impl MotionRuntimeState {
    fn new(visual: VisualState) -> Self {
        Self {
            is_visible: false,
            is_animating: false,
            progress: 0.0,
            visual,
        }
    }
}

type UpdateListener = Rc<dyn Fn(&MotionRuntimeState)>;
type EventListener = Rc<dyn Fn()>;

/// Scheduled work that must be cancelled on stop/reset
#[derive(Debug, Default)]
struct PendingWork {
    frame: Option<FrameId>,
    delay: Option<TimerId>,
}

impl PendingWork {
    fn cancel(&mut self, scheduler: &SchedulerHandle) {
        if let Some(id) = self.frame.take() {
            scheduler.cancel_frame(id);
        }
        if let Some(id) = self.delay.take() {
            scheduler.cancel_timer(id);
        }
    }

    fn is_empty(&self) -> bool {
        self.frame.is_none() && self.delay.is_none()
    }
}

/// Where a controller publishes its state
struct Outputs {
    id: String,
    store: Option<MotionStore>,
    on_update: SmallVec<[UpdateListener; 2]>,
    on_complete: SmallVec<[EventListener; 2]>,
}

impl Outputs {
    fn new(id: String) -> Self {
        Self {
            id,
            store: None,
            on_update: SmallVec::new(),
            on_complete: SmallVec::new(),
        }
    }

    fn notification(
        &self,
        runtime: &MotionRuntimeState,
        values: MotionValues,
        completed: bool,
    ) -> Notification {
        Notification {
            id: self.id.clone(),
            store: self.store.clone(),
            runtime: runtime.clone(),
            values,
            update: self.on_update.clone(),
            complete: if completed {
                self.on_complete.clone()
            } else {
                SmallVec::new()
            },
        }
    }

    fn visibility_target(&self) -> Option<(MotionStore, String)> {
        self.store.clone().map(|store| (store, self.id.clone()))
    }

    /// Register the element and return its current values for publishing
    fn attach_store(&mut self, store: MotionStore, runtime: &MotionRuntimeState) -> MotionValues {
        store.initialize_element(&self.id);
        self.store = Some(store);
        MotionValues::from(&runtime.visual).with_progress(runtime.progress)
    }
}

/// Everything to publish once the controller borrow is released
struct Notification {
    id: String,
    store: Option<MotionStore>,
    runtime: MotionRuntimeState,
    values: MotionValues,
    update: SmallVec<[UpdateListener; 2]>,
    complete: SmallVec<[EventListener; 2]>,
}

impl Notification {
    fn deliver(self) {
        if let Some(store) = &self.store {
            store.update_motion_values(&self.id, &self.values);
        }
        for listener in &self.update {
            listener(&self.runtime);
        }
        for listener in &self.complete {
            listener();
        }
    }
}

// ============================================================================
// Timed motion
// ============================================================================

struct MotionInner {
    motion: ResolvedMotion,
    player: MotionPlayer,
    runtime: MotionRuntimeState,
    observer: Option<VisibilityObserver>,
    options: ObserverOptions,
    auto_start: bool,
    /// Playing the exit variant instead of the entrance
    exiting: bool,
    pending: PendingWork,
    outputs: Outputs,
}

impl MotionInner {
    /// Recompute runtime state from the player
    fn refresh(&mut self) {
        let t = self.player.normalized_progress();
        self.runtime.progress = t;
        self.runtime.visual = if self.exiting {
            self.motion.sample_exit(t)
        } else {
            self.motion.sample(t)
        };
        self.runtime.is_animating = self.player.is_playing();
    }

    fn notification(&self, completed: bool) -> Notification {
        let values = MotionValues::from(&self.runtime.visual).with_progress(self.runtime.progress);
        self.outputs.notification(&self.runtime, values, completed)
    }
}

/// Drives a timed entrance motion for one element
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct MotionController {
    inner: Rc<RefCell<MotionInner>>,
    scheduler: SchedulerHandle,
}

impl MotionController {
    pub fn new(
        id: impl Into<String>,
        descriptor: &MotionDescriptor,
        config: &MotionConfig,
        scheduler: SchedulerHandle,
    ) -> Self {
        let motion = descriptor.resolve(config);
        let clock: Rc<dyn Clock> = Rc::new(scheduler.clone());
        // The delay runs on a scheduler timer, not inside the player
        let player = MotionPlayer::new(motion.player_config().with_delay(0), clock);
        let runtime = MotionRuntimeState::new(motion.hidden_state());

        let inner = MotionInner {
            options: descriptor.observer_options(config),
            auto_start: descriptor.auto_start(config),
            motion,
            player,
            runtime,
            observer: None,
            exiting: false,
            pending: PendingWork::default(),
            outputs: Outputs::new(id.into()),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
            scheduler,
        }
    }

    /// Publish values and visibility to a central store
    ///
    /// The element's entry is created if needed and immediately receives the
    /// full current visual state.
    pub fn with_store(self, store: MotionStore) -> Self {
        let values = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            inner.outputs.attach_store(store.clone(), &inner.runtime)
        };
        store.update_motion_values(&self.id(), &values);
        self
    }

    fn upgrade(weak: &Weak<RefCell<MotionInner>>, scheduler: &SchedulerHandle) -> Option<Self> {
        weak.upgrade().map(|inner| Self {
            inner,
            scheduler: scheduler.clone(),
        })
    }

    /// Watch a target for visibility
    pub fn observe(&self, target: TargetRef) {
        let mut inner = self.inner.borrow_mut();
        inner.observer = Some(VisibilityObserver::new(target, inner.options.clone()));
    }

    pub fn id(&self) -> String {
        self.inner.borrow().outputs.id.clone()
    }

    pub fn state(&self) -> MotionRuntimeState {
        self.inner.borrow().runtime.clone()
    }

    pub fn visual(&self) -> VisualState {
        self.inner.borrow().runtime.visual.clone()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.inner.borrow().player.state()
    }

    pub fn motion(&self) -> ResolvedMotion {
        self.inner.borrow().motion.clone()
    }

    /// Whether the exit variant is active
    pub fn is_exiting(&self) -> bool {
        self.inner.borrow().exiting
    }

    /// Whether a delay timer or frame callback is scheduled
    pub fn has_pending_work(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }

    pub fn on_update<F>(&self, listener: F)
    where
        F: Fn(&MotionRuntimeState) + 'static,
    {
        self.inner.borrow_mut().outputs.on_update.push(Rc::new(listener));
    }

    /// Called once each time the entrance or exit completes
    pub fn on_complete<F>(&self, listener: F)
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().outputs.on_complete.push(Rc::new(listener));
    }

    fn ensure_frame(&self, inner: &mut MotionInner) {
        if inner.pending.frame.is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let scheduler = self.scheduler.clone();
        inner.pending.frame = self.scheduler.request_frame(move |_| {
            if let Some(controller) = Self::upgrade(&weak, &scheduler) {
                controller.on_frame();
            }
        });
    }

    fn on_frame(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.frame = None;
            if !inner.player.is_playing() {
                return;
            }
            inner.player.tick();
            inner.refresh();
            if inner.player.is_playing() {
                self.ensure_frame(&mut inner);
            }
            inner.notification(inner.player.is_completed())
        };
        notification.deliver();
    }

    /// Start the entrance after its configured delay
    ///
    /// An active exit is abandoned. No-op while already waiting or playing.
    pub fn start(&self) {
        let delay = {
            let mut inner = self.inner.borrow_mut();
            if inner.exiting {
                inner.pending.cancel(&self.scheduler);
                inner.player.stop();
                inner.exiting = false;
                inner.refresh();
            }
            if inner.pending.delay.is_some() || inner.player.is_playing() {
                return;
            }
            inner.motion.delay_ms
        };
        if delay == 0 {
            self.play();
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        let scheduler = self.scheduler.clone();
        let timer = self.scheduler.set_timeout(f64::from(delay), move |_| {
            if let Some(controller) = Self::upgrade(&weak, &scheduler) {
                controller.inner.borrow_mut().pending.delay = None;
                controller.play();
            }
        });
        tracing::debug!(delay, "motion start scheduled");
        self.inner.borrow_mut().pending.delay = timer;
    }

    /// Play or resume immediately
    pub fn play(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            if inner.pending.delay.is_some() || inner.player.is_playing() {
                return;
            }
            inner.player.play();
            if !inner.player.is_playing() {
                return;
            }
            inner.refresh();
            self.ensure_frame(&mut inner);
            inner.notification(false)
        };
        notification.deliver();
    }

    /// Pause playback and cancel the pending frame
    pub fn pause(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            if !inner.player.is_playing() {
                return;
            }
            inner.player.pause();
            if let Some(id) = inner.pending.frame.take() {
                self.scheduler.cancel_frame(id);
            }
            inner.refresh();
            inner.notification(inner.player.is_completed())
        };
        notification.deliver();
    }

    /// Cancel pending work and return to the hidden state
    pub fn stop(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.cancel(&self.scheduler);
            inner.exiting = false;
            inner.player.stop();
            inner.refresh();
            inner.notification(false)
        };
        notification.deliver();
    }

    /// Stop, restore the configured direction and re-arm the trigger
    ///
    /// Besides the playback reset, the observer starts over and the element
    /// is marked not visible in the runtime state and the store, so a
    /// trigger-once element can fire again. Repeated calls leave the same
    /// state.
    pub fn reset(&self) {
        let (notification, store) = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.cancel(&self.scheduler);
            inner.exiting = false;
            inner.player.reset();
            if let Some(observer) = inner.observer.as_mut() {
                observer.reset();
            }
            inner.runtime.is_visible = false;
            inner.refresh();
            (inner.notification(false), inner.outputs.visibility_target())
        };
        if let Some((store, id)) = store {
            store.set_internal_visibility(&id, false);
            store.set_triggered_visibility(&id, false);
        }
        notification.deliver();
    }

    /// Animate out from the current entrance position to hidden
    ///
    /// Uses the exit variant of the motion and skips the entrance delay. The
    /// exit starts at the mirrored position of the entrance. An element that
    /// never started entering is just stopped.
    pub fn exit(&self) {
        let entered = {
            let inner = self.inner.borrow();
            if inner.exiting {
                return;
            }
            inner.player.normalized_progress()
        };
        if entered <= 0.0 {
            self.stop();
            return;
        }

        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.cancel(&self.scheduler);
            inner.player.stop();
            inner.exiting = true;
            inner.player.seek((1.0 - entered) * 100.0);
            inner.player.play();
            inner.refresh();
            if inner.player.is_playing() {
                self.ensure_frame(&mut inner);
            }
            inner.notification(inner.player.is_completed())
        };
        tracing::debug!(from = entered, "motion exit started");
        notification.deliver();
    }

    pub fn reverse(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.player.reverse();
            inner.refresh();
            if inner.player.is_playing() {
                self.ensure_frame(&mut inner);
            }
            inner.notification(false)
        };
        notification.deliver();
    }

    /// Jump to `percent` in `[0, 100]`
    pub fn seek(&self, percent: f32) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.player.seek(percent);
            inner.refresh();
            inner.notification(false)
        };
        notification.deliver();
    }

    /// Feed the viewport to the observer
    ///
    /// Becoming visible starts the motion when auto-start is on. Leaving the
    /// viewport plays the exit when the trigger is repeatable, so the
    /// entrance replays on the next entry. Returns the visibility change, if
    /// any.
    pub fn update_viewport(&self, viewport: Rect) -> Option<bool> {
        let (visible, auto_start, once, store) = {
            let mut inner = self.inner.borrow_mut();
            let visible = inner.observer.as_mut()?.update(viewport)?;
            inner.runtime.is_visible = visible;
            (
                visible,
                inner.auto_start,
                inner.options.trigger_once,
                inner.outputs.visibility_target(),
            )
        };
        if let Some((store, id)) = store {
            store.set_internal_visibility(&id, visible);
        }

        if visible && auto_start {
            self.start();
        } else if !visible && !once {
            self.exit();
        } else {
            let notification = self.inner.borrow().notification(false);
            notification.deliver();
        }
        Some(visible)
    }

    /// Mark the element visible manually and start the motion
    pub fn trigger(&self) {
        let store = {
            let mut inner = self.inner.borrow_mut();
            inner.runtime.is_visible = true;
            inner.outputs.visibility_target()
        };
        if let Some((store, id)) = store {
            store.set_triggered_visibility(&id, true);
        }
        self.start();
    }
}

// ============================================================================
// Spring motion
// ============================================================================

struct SpringInner {
    group: SpringGroup<Property>,
    motion: ResolvedMotion,
    runtime: MotionRuntimeState,
    observer: Option<VisibilityObserver>,
    options: ObserverOptions,
    auto_start: bool,
    pending: PendingWork,
    outputs: Outputs,
}

impl SpringInner {
    fn refresh(&mut self) {
        let mut visual = VisualState::visible();
        for (property, value) in self.group.values() {
            property.write(&mut visual, value);
        }
        let progress = self.group.progress();
        visual.vars = MotionVars {
            delay_ms: self.motion.delay_ms,
            duration_ms: 0,
            easing: "spring".into(),
            progress,
        };
        self.runtime.progress = progress;
        self.runtime.visual = visual;
        self.runtime.is_animating = !self.group.is_at_rest();
    }

    fn notification(&self, completed: bool) -> Notification {
        let values = MotionValues::from(&self.runtime.visual).with_progress(self.runtime.progress);
        self.outputs.notification(&self.runtime, values, completed)
    }

    /// Springs at rest report full progress; override after snapping
    fn set_progress(&mut self, progress: f32) {
        self.runtime.progress = progress;
        self.runtime.visual.vars.progress = progress;
    }

    fn snap_to_start(&mut self) {
        for (property, value) in &self.motion.properties {
            self.group.snap(property, value.start());
        }
    }
}

/// Drives an element's properties with spring physics
///
/// Springs start at the motion's hidden values; [`SpringController::start`]
/// pulls them to the visible values. The rest listener fires once per motion.
#[derive(Clone)]
pub struct SpringController {
    inner: Rc<RefCell<SpringInner>>,
    scheduler: SchedulerHandle,
}

impl SpringController {
    pub fn new(
        id: impl Into<String>,
        descriptor: &MotionDescriptor,
        spring: SpringConfig,
        config: &MotionConfig,
        scheduler: SchedulerHandle,
    ) -> Self {
        let motion = descriptor.resolve(config);
        let mut group = SpringGroup::new(spring);
        for (property, value) in &motion.properties {
            group.insert(*property, value.start());
        }

        let mut inner = SpringInner {
            options: descriptor.observer_options(config),
            auto_start: descriptor.auto_start(config),
            group,
            motion,
            runtime: MotionRuntimeState::new(VisualState::hidden()),
            observer: None,
            pending: PendingWork::default(),
            outputs: Outputs::new(id.into()),
        };
        inner.refresh();
        inner.set_progress(0.0);
        Self {
            inner: Rc::new(RefCell::new(inner)),
            scheduler,
        }
    }

    pub fn with_store(self, store: MotionStore) -> Self {
        let values = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            inner.outputs.attach_store(store.clone(), &inner.runtime)
        };
        store.update_motion_values(&self.id(), &values);
        self
    }

    fn upgrade(weak: &Weak<RefCell<SpringInner>>, scheduler: &SchedulerHandle) -> Option<Self> {
        weak.upgrade().map(|inner| Self {
            inner,
            scheduler: scheduler.clone(),
        })
    }

    pub fn observe(&self, target: TargetRef) {
        let mut inner = self.inner.borrow_mut();
        inner.observer = Some(VisibilityObserver::new(target, inner.options.clone()));
    }

    pub fn id(&self) -> String {
        self.inner.borrow().outputs.id.clone()
    }

    pub fn state(&self) -> MotionRuntimeState {
        self.inner.borrow().runtime.clone()
    }

    pub fn visual(&self) -> VisualState {
        self.inner.borrow().runtime.visual.clone()
    }

    pub fn value(&self, property: Property) -> Option<f32> {
        self.inner.borrow().group.value(&property)
    }

    pub fn is_at_rest(&self) -> bool {
        self.inner.borrow().group.is_at_rest()
    }

    pub fn has_pending_work(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }

    pub fn on_update<F>(&self, listener: F)
    where
        F: Fn(&MotionRuntimeState) + 'static,
    {
        self.inner.borrow_mut().outputs.on_update.push(Rc::new(listener));
    }

    /// Called once each time the springs come to rest
    pub fn on_rest<F>(&self, listener: F)
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().outputs.on_complete.push(Rc::new(listener));
    }

    fn ensure_frame(&self, inner: &mut SpringInner) {
        if inner.pending.frame.is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let scheduler = self.scheduler.clone();
        inner.pending.frame = self.scheduler.request_frame(move |_| {
            if let Some(controller) = Self::upgrade(&weak, &scheduler) {
                controller.on_frame();
            }
        });
    }

    fn on_frame(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.frame = None;
            let rested = inner.group.step();
            inner.refresh();
            if !inner.group.is_at_rest() {
                self.ensure_frame(&mut inner);
            }
            inner.notification(rested)
        };
        notification.deliver();
    }

    /// Pull every property toward the given targets
    pub fn animate_to<I>(&self, targets: I)
    where
        I: IntoIterator<Item = (Property, f32)>,
    {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            for (property, target) in targets {
                inner.group.set_target(property, target);
            }
            if inner.group.is_at_rest() {
                return;
            }
            inner.refresh();
            self.ensure_frame(&mut inner);
            inner.notification(false)
        };
        notification.deliver();
    }

    /// Spring to the visible values
    pub fn start(&self) {
        let targets: Vec<(Property, f32)> = self
            .inner
            .borrow()
            .motion
            .properties
            .iter()
            .map(|(property, value)| (*property, value.end()))
            .collect();
        self.animate_to(targets);
    }

    /// Halt the springs where they are
    pub fn stop(&self) {
        let notification = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.cancel(&self.scheduler);
            let progress = inner.runtime.progress;
            let current: Vec<(Property, f32)> = inner
                .group
                .values()
                .map(|(property, value)| (*property, value))
                .collect();
            for (property, value) in current {
                inner.group.snap(&property, value);
            }
            inner.refresh();
            inner.set_progress(progress);
            inner.notification(false)
        };
        notification.deliver();
    }

    /// Snap back to the hidden values and observe again
    pub fn reset(&self) {
        let (notification, store) = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.cancel(&self.scheduler);
            inner.snap_to_start();
            if let Some(observer) = inner.observer.as_mut() {
                observer.reset();
            }
            inner.runtime.is_visible = false;
            inner.refresh();
            inner.set_progress(0.0);
            (inner.notification(false), inner.outputs.visibility_target())
        };
        if let Some((store, id)) = store {
            store.set_internal_visibility(&id, false);
            store.set_triggered_visibility(&id, false);
        }
        notification.deliver();
    }

    /// Feed the viewport to the observer; see [`MotionController::update_viewport`]
    pub fn update_viewport(&self, viewport: Rect) -> Option<bool> {
        let (visible, auto_start, once, store) = {
            let mut inner = self.inner.borrow_mut();
            let visible = inner.observer.as_mut()?.update(viewport)?;
            inner.runtime.is_visible = visible;
            (
                visible,
                inner.auto_start,
                inner.options.trigger_once,
                inner.outputs.visibility_target(),
            )
        };
        if let Some((store, id)) = store {
            store.set_internal_visibility(&id, visible);
        }

        if visible && auto_start {
            self.start();
        } else if !visible && !once {
            let targets: Vec<(Property, f32)> = self
                .inner
                .borrow()
                .motion
                .properties
                .iter()
                .map(|(property, value)| (*property, value.start()))
                .collect();
            self.animate_to(targets);
        } else {
            let notification = self.inner.borrow().notification(false);
            notification.deliver();
        }
        Some(visible)
    }

    pub fn trigger(&self) {
        let store = {
            let mut inner = self.inner.borrow_mut();
            inner.runtime.is_visible = true;
            inner.outputs.visibility_target()
        };
        if let Some((store, id)) = store {
            store.set_triggered_visibility(&id, true);
        }
        self.start();
    }
}
