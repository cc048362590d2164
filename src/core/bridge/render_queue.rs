//=========================================================================
// Render Queue
//=========================================================================
//
// Cross-thread operation queue feeding the render thread.
//
// Architecture:
//   script threads ──RenderHandle::run/call──> [unbounded MPSC] ──drain()──> GameState
//
// A single channel preserves per-sender FIFO order, so operations from
// one script thread run in the order they were enqueued. `drain` runs
// only what was queued when the frame started; anything enqueued while
// draining waits for the next frame, which keeps each frame's operation
// set fixed.
//
// Handles share the session interrupt: once shutdown begins, submitting
// fails with `SessionError::Interrupted` instead of queueing work that
// will never run.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::promise::{promise, Interrupt};
use crate::core::GameState;
use crate::error::{SessionError, SessionResult};

//=== RenderTask ==========================================================

/// Closure executed on the render thread with exclusive state access.
pub type RenderTask = Box<dyn FnOnce(&mut GameState) + Send + 'static>;

//=== RenderThread ========================================================

/// Identity of the render thread, shared with every handle.
///
/// Bound on the first frame. Used to reject blocking calls issued from
/// the render thread itself, which would deadlock.
#[derive(Debug, Clone, Default)]
pub(crate) struct RenderThread {
    id: Arc<OnceLock<ThreadId>>,
}

impl RenderThread {
    /// Records the calling thread as the render thread.
    ///
    /// # Panics
    ///
    /// Panics if a different thread was already bound.
    pub(crate) fn bind_current(&self) {
        let current = thread::current().id();
        let bound = *self.id.get_or_init(|| current);
        assert_eq!(
            bound, current,
            "GameCoordinator::frame called from a second thread"
        );
    }

    pub(crate) fn is_current(&self) -> bool {
        self.id.get() == Some(&thread::current().id())
    }

    /// Panics if called on the render thread.
    pub(crate) fn assert_not_current(&self, operation: &str) {
        assert!(
            !self.is_current(),
            "{} is a blocking script call and must not run on the render thread",
            operation
        );
    }
}

//=== RenderQueue =========================================================

/// Render-thread end of the operation queue.
pub struct RenderQueue {
    sender: Sender<RenderTask>,
    receiver: Receiver<RenderTask>,
    thread: RenderThread,
    interrupt: Interrupt,
}

impl RenderQueue {
    /// Queue length above which a frame logs a backlog warning.
    const BACKLOG_WARNING: usize = 256;

    /// Creates an empty queue whose handles stop accepting work once
    /// `interrupt` fires.
    pub fn new(interrupt: Interrupt) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            thread: RenderThread::default(),
            interrupt,
        }
    }

    /// Creates a handle script threads use to submit work.
    pub fn handle(&self) -> RenderHandle {
        RenderHandle {
            sender: self.sender.clone(),
            thread: self.thread.clone(),
            interrupt: self.interrupt.clone(),
        }
    }

    /// Number of operations waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub(crate) fn render_thread(&self) -> &RenderThread {
        &self.thread
    }

    /// Runs every operation that was queued when the call started.
    ///
    /// Returns the number of operations executed.
    pub fn drain(&self, state: &mut GameState) -> usize {
        let pending = self.receiver.len();
        if pending > Self::BACKLOG_WARNING {
            warn!(target: "render", "Operation backlog: {} queued this frame", pending);
        }

        let mut executed = 0;
        while executed < pending {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task(state);
                    executed += 1;
                }
                Err(_) => break,
            }
        }

        if executed > 0 {
            trace!(target: "render", "Drained {} queued operations", executed);
        }
        executed
    }

    /// Drops every queued operation without running it.
    ///
    /// Callers blocked on a dropped operation observe
    /// [`SessionError::Cancelled`].
    pub fn cancel_pending(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

//=== RenderHandle ========================================================

/// Script-thread end of the operation queue. Cheap to clone.
#[derive(Clone)]
pub struct RenderHandle {
    sender: Sender<RenderTask>,
    thread: RenderThread,
    interrupt: Interrupt,
}

impl RenderHandle {
    /// Enqueues `op` and returns immediately.
    ///
    /// # Errors
    ///
    /// [`SessionError::Interrupted`] once the session is shutting down,
    /// [`SessionError::Cancelled`] if the render side is gone.
    pub fn run<F>(&self, op: F) -> SessionResult<()>
    where
        F: FnOnce(&mut GameState) + Send + 'static,
    {
        if self.interrupt.is_triggered() {
            return Err(SessionError::Interrupted);
        }
        self.sender
            .send(Box::new(op))
            .map_err(|_| SessionError::Cancelled)
    }

    /// Enqueues `op`, blocks until the render thread has run it, and
    /// returns its result.
    ///
    /// If the wait is interrupted the operation may still run later; its
    /// result is discarded.
    ///
    /// # Panics
    ///
    /// Panics when called from the render thread.
    pub fn call<F, R>(&self, op: F) -> SessionResult<R>
    where
        F: FnOnce(&mut GameState) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.thread.assert_not_current("call_on_render_thread");

        let (completer, result) = promise();
        self.run(move |state| {
            let _ = completer.complete(op(state));
        })?;
        result.wait_interruptible(&self.interrupt)
    }

    pub(crate) fn render_thread(&self) -> &RenderThread {
        &self.thread
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
