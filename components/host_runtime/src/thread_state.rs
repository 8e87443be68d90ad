//! Per-thread current-frame stack.
//!
//! Every driver thread has a [`ThreadState`] holding the frames currently
//! executing on it, innermost last. A generator body runs on its own fiber
//! thread, so on each resume the body adopts its driver's state with
//! [`ThreadState::install`]; diagnostics taken inside the body then read the
//! driver's stack with the generator's frame on top.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use core_types::StackFrame;
use log::warn;
use parking_lot::Mutex;

use crate::frame::Frame;

static NEXT_STATE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: RefCell<Option<Arc<ThreadState>>> = const { RefCell::new(None) };
}

/// Current-frame stack of one logical thread of execution.
#[derive(Debug)]
pub struct ThreadState {
    id: u64,
    frames: Mutex<Vec<Arc<Frame>>>,
}

impl ThreadState {
    /// Create an empty, uninstalled state
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            frames: Mutex::new(Vec::with_capacity(16)),
        })
    }

    /// State installed on the calling thread, created on first use
    pub fn current() -> Arc<ThreadState> {
        CURRENT.with(|current| {
            current
                .borrow_mut()
                .get_or_insert_with(ThreadState::new)
                .clone()
        })
    }

    /// Make `state` the calling thread's current state.
    ///
    /// Returns the previously installed state, if any.
    pub fn install(state: Arc<ThreadState>) -> Option<Arc<ThreadState>> {
        CURRENT.with(|current| current.borrow_mut().replace(state))
    }

    /// Unique id of this state
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Push a frame and mark it executing
    pub fn push_frame(&self, frame: Arc<Frame>) {
        frame.set_executing(true);
        self.frames.lock().push(frame);
    }

    /// Pop the innermost frame and mark it inactive
    pub fn pop_frame(&self) -> Option<Arc<Frame>> {
        let frame = self.frames.lock().pop();
        if let Some(frame) = &frame {
            frame.set_executing(false);
        }
        frame
    }

    /// Innermost executing frame
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        self.frames.lock().last().cloned()
    }

    /// Number of executing frames
    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    /// Trace of the executing frames, innermost first
    pub fn capture_trace(&self) -> Vec<StackFrame> {
        self.frames
            .lock()
            .iter()
            .rev()
            .map(|frame| frame.snapshot())
            .collect()
    }

    /// Push `frame` for the lifetime of the returned guard
    pub fn enter(self: &Arc<Self>, frame: Arc<Frame>) -> FrameGuard {
        self.push_frame(frame.clone());
        FrameGuard {
            state: self.clone(),
            frame,
        }
    }
}

/// Pops its frame when dropped.
#[derive(Debug)]
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct FrameGuard {
    state: Arc<ThreadState>,
    frame: Arc<Frame>,
}

impl FrameGuard {
    /// State the frame was pushed on
    pub fn state(&self) -> &Arc<ThreadState> {
        &self.state
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        match self.state.pop_frame() {
            Some(top) if Arc::ptr_eq(&top, &self.frame) => {}
            Some(top) => {
                warn!(
                    "frame stack out of balance: popped '{}' while leaving '{}'",
                    top.code().name(),
                    self.frame.code().name()
                );
                self.frame.set_executing(false);
            }
            None => {
                warn!("frame stack empty while leaving '{}'", self.frame.code().name());
                self.frame.set_executing(false);
            }
        }
    }
}
