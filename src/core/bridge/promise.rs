//=========================================================================
// Promise / Completer
//=========================================================================
//
// One-shot cross-thread result delivery.
//
// Architecture:
//   producer: Completer<T> ──complete(v)──> [bounded(1)] ──> Promise<T>: consumer
//
// Exactly one value can travel from a completer to its promise. Dropping
// the completer without completing cancels the promise. There is no way
// to cancel from the consumer side: a waiting thread is released only by
// a value, a dropped completer, or the session-wide `Interrupt`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};

//=== Internal Dependencies ===============================================

use crate::error::{SessionError, SessionResult};

//=== Constructor =========================================================

/// Creates a connected completer/promise pair.
pub fn promise<T>() -> (Completer<T>, Promise<T>) {
    let (tx, rx) = bounded(1);
    (Completer { tx }, Promise { rx })
}

//=== Completer ===========================================================

/// Producer half of a one-shot result.
#[derive(Debug)]
pub struct Completer<T> {
    tx: Sender<T>,
}

impl<T> Completer<T> {
    /// Delivers the value.
    ///
    /// Returns the value back if the promise was already dropped, so the
    /// producer can release anything the value owns.
    pub fn complete(self, value: T) -> Result<(), T> {
        self.tx.send(value).map_err(|e| e.into_inner())
    }
}

//=== PromiseState ========================================================

/// Non-blocking view of a promise.
#[derive(Debug, PartialEq, Eq)]
pub enum PromiseState<T> {
    /// No value yet.
    Pending,
    /// The value arrived.
    Ready(T),
    /// The completer was dropped without a value.
    Cancelled,
}

//=== Promise =============================================================

/// Consumer half of a one-shot result.
#[derive(Debug)]
pub struct Promise<T> {
    rx: Receiver<T>,
}

impl<T> Promise<T> {
    /// A promise that already holds its value.
    pub fn resolved(value: T) -> Self {
        let (completer, promise) = promise();
        // The receiver is alive and the buffer is empty, so this cannot fail.
        let _ = completer.complete(value);
        promise
    }

    /// Blocks until the value arrives or the completer is dropped.
    pub fn wait(self) -> SessionResult<T> {
        self.rx.recv().map_err(|_| SessionError::Cancelled)
    }

    /// Blocks like [`Promise::wait`], but also returns
    /// [`SessionError::Interrupted`] when the session shuts down.
    ///
    /// A value that is already available wins over a pending interrupt.
    pub fn wait_interruptible(self, interrupt: &Interrupt) -> SessionResult<T> {
        match self.rx.try_recv() {
            Ok(value) => return Ok(value),
            Err(TryRecvError::Disconnected) => return Err(SessionError::Cancelled),
            Err(TryRecvError::Empty) => {}
        }

        select! {
            recv(self.rx) -> value => value.map_err(|_| SessionError::Cancelled),
            recv(interrupt.rx) -> _ => Err(SessionError::Interrupted),
        }
    }

    /// Checks for the value without blocking.
    pub fn poll(&mut self) -> PromiseState<T> {
        match self.rx.try_recv() {
            Ok(value) => PromiseState::Ready(value),
            Err(TryRecvError::Empty) => PromiseState::Pending,
            Err(TryRecvError::Disconnected) => PromiseState::Cancelled,
        }
    }
}

//=== Interrupt ===========================================================

/// Uninhabited message type: the interrupt channel only ever disconnects.
#[derive(Debug)]
enum Never {}

/// Session-wide shutdown signal observed by blocked script threads.
///
/// Cloned into every `ScriptContext`. Fires once, when the owning
/// [`InterruptTrigger`] is fired or dropped.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: Receiver<Never>,
}

/// Owner side of an [`Interrupt`].
#[derive(Debug)]
pub struct InterruptTrigger {
    tx: Option<Sender<Never>>,
}

/// Creates a connected trigger/interrupt pair.
pub fn interrupt() -> (InterruptTrigger, Interrupt) {
    let (tx, rx) = bounded(0);
    (InterruptTrigger { tx: Some(tx) }, Interrupt { rx })
}

impl InterruptTrigger {
    /// Releases every thread blocked on the paired [`Interrupt`].
    pub fn fire(&mut self) {
        self.tx.take();
    }

    /// True once [`InterruptTrigger::fire`] has been called.
    pub fn is_fired(&self) -> bool {
        self.tx.is_none()
    }
}

impl Interrupt {
    /// True once the session has begun shutting down.
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleeps for `duration` unless the session shuts down first.
    pub fn sleep(&self, duration: Duration) -> SessionResult<()> {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => Ok(()),
            _ => Err(SessionError::Interrupted),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
