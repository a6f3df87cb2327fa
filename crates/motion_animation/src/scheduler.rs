//! Frame scheduler
//!
//! A cooperative, single-threaded task queue standing in for the host's
//! animation-frame and timer primitives. Every registration returns an id
//! that cancels it:
//!
//! - [`SchedulerHandle::request_frame`] runs a callback on the next frame
//! - [`SchedulerHandle::set_timeout`] runs a callback once its delay elapses
//!
//! The host (or a simulation loop) owns the [`FrameScheduler`] and calls
//! [`FrameScheduler::run_frame`] with the current timestamp. Within a frame,
//! due timers run first, in due-time then registration order, followed by the
//! frame callbacks that were registered before the frame began. Callbacks
//! registered while a frame runs wait for the next frame.
//!
//! Components hold a [`SchedulerHandle`], a weak reference that does not keep
//! the scheduler alive.

use crate::clock::Clock;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Handle to a pending frame callback
    pub struct FrameId;
    /// Handle to a pending timer
    pub struct TimerId;
}

/// Callback invoked with the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

struct PendingFrame {
    seq: u64,
    callback: FrameCallback,
}

struct PendingTimer {
    seq: u64,
    due: f64,
    callback: FrameCallback,
}

/// Internal state of the scheduler
struct SchedulerInner {
    frames: SlotMap<FrameId, PendingFrame>,
    timers: SlotMap<TimerId, PendingTimer>,
    now: f64,
    frame_count: u64,
    next_seq: u64,
}

impl SchedulerInner {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Owner of the frame and timer queues
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                frames: SlotMap::with_key(),
                timers: SlotMap::with_key(),
                now: 0.0,
                frame_count: 0,
                next_seq: 0,
            })),
        }
    }

    /// Get a handle for registering callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Run one frame at timestamp `now`
    ///
    /// Returns the number of callbacks that ran.
    pub fn run_frame(&self, now: f64) -> usize {
        let frame_start_seq = {
            let mut inner = self.inner.borrow_mut();
            inner.now = now;
            inner.frame_count += 1;
            inner.next_seq
        };

        let mut ran = 0;

        // Due timers, earliest first. The borrow is released before each
        // callback so callbacks can register or cancel work.
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let due = inner
                    .timers
                    .iter()
                    .filter(|(_, t)| t.due <= now && t.seq < frame_start_seq)
                    .min_by(|(_, a), (_, b)| {
                        a.due
                            .partial_cmp(&b.due)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a.seq.cmp(&b.seq))
                    })
                    .map(|(id, _)| id);
                due.and_then(|id| inner.timers.remove(id))
            };
            match next {
                Some(timer) => {
                    (timer.callback)(now);
                    ran += 1;
                }
                None => break,
            }
        }

        // Frame callbacks registered before this frame began
        let mut order: Vec<(u64, FrameId)> = self
            .inner
            .borrow()
            .frames
            .iter()
            .filter(|(_, f)| f.seq < frame_start_seq)
            .map(|(id, f)| (f.seq, id))
            .collect();
        order.sort_unstable_by_key(|(seq, _)| *seq);

        for (_, id) in order {
            // An earlier callback may have cancelled this one
            let pending = self.inner.borrow_mut().frames.remove(id);
            if let Some(pending) = pending {
                (pending.callback)(now);
                ran += 1;
            }
        }

        ran
    }

    /// Advance frames at a fixed interval until nothing is pending
    ///
    /// Starts one interval after the current time. Stops after `max_frames`
    /// frames. Returns the number of frames run.
    pub fn run_until_idle(&self, frame_ms: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while self.has_pending() && frames < max_frames {
            let now = self.now() + frame_ms;
            self.run_frame(now);
            frames += 1;
        }
        frames
    }

    /// Timestamp of the most recent frame
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame_count
    }

    pub fn has_pending(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.frames.is_empty() || !inner.timers.is_empty()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the frame scheduler
///
/// Registration methods return `None` once the scheduler is gone.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Run `callback` on the next frame
    pub fn request_frame<F>(&self, callback: F) -> Option<FrameId>
    where
        F: FnOnce(f64) + 'static,
    {
        self.inner.upgrade().map(|inner| {
            let mut inner = inner.borrow_mut();
            let seq = inner.next_seq();
            inner.frames.insert(PendingFrame {
                seq,
                callback: Box::new(callback),
            })
        })
    }

    /// Cancel a pending frame callback
    ///
    /// Returns `false` if it already ran or was cancelled.
    pub fn cancel_frame(&self, id: FrameId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().frames.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Run `callback` on the first frame at least `delay_ms` from now
    pub fn set_timeout<F>(&self, delay_ms: f64, callback: F) -> Option<TimerId>
    where
        F: FnOnce(f64) + 'static,
    {
        self.inner.upgrade().map(|inner| {
            let mut inner = inner.borrow_mut();
            let seq = inner.next_seq();
            let due = inner.now + delay_ms.max(0.0);
            inner.timers.insert(PendingTimer {
                seq,
                due,
                callback: Box::new(callback),
            })
        })
    }

    /// Cancel a pending timer
    ///
    /// Returns `false` if it already fired or was cancelled.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().timers.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Timestamp of the most recent frame, 0 if the scheduler is gone
    pub fn now(&self) -> f64 {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().now)
            .unwrap_or(0.0)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl Clock for SchedulerHandle {
    fn now_ms(&self) -> f64 {
        self.now()
    }
}
