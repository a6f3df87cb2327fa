//! Frame recording for headless simulation

use motion_animation::MotionRuntimeState;
use motion_core::VisualState;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// One emitted frame
#[derive(Debug, Serialize)]
pub struct Frame {
    pub time_ms: f64,
    pub is_visible: bool,
    pub is_animating: bool,
    pub progress: f32,
    pub opacity: f32,
    pub transform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Present only with `--full`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualState>,
}

impl Frame {
    pub fn new(time_ms: f64, state: &MotionRuntimeState, full: bool) -> Self {
        Self {
            time_ms,
            is_visible: state.is_visible,
            is_animating: state.is_animating,
            progress: state.progress,
            opacity: state.visual.opacity,
            transform: state.visual.transform_css(),
            filter: state.visual.filter_css(),
            visual: full.then(|| state.visual.clone()),
        }
    }
}

/// Shared sink filled from controller listeners
#[derive(Clone, Default)]
pub struct Recorder {
    frames: Rc<RefCell<Vec<Frame>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, frame: Frame) {
        self.frames.borrow_mut().push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn take(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.frames.borrow_mut())
    }
}
