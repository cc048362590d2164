//=========================================================================
// Input
//
// Keyboard state, UI bindings and the input stack.
//
// Responsibilities:
// - Track held and freshly pressed keys per frame (`StateTracker`)
// - Translate key presses into UI actions (`UiBindings`)
// - Route each frame's actions to the topmost receiver holding focus
//   (`InputStack`)
//
// Notes:
// The input stack is shared with script threads, which push and remove
// window receivers while the render thread dispatches. Receivers are
// invoked outside the stack lock.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod bindings;
pub mod event;
pub mod state_tracker;

//=== Re-exports ==========================================================

pub use bindings::UiBindings;
pub use event::{InputEvent, KeyCode, Modifiers};
pub use state_tracker::StateTracker;

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;

//=== UiAction ============================================================

/// Abstract UI command produced by [`UiBindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiAction {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Cancel,
}

//=== UiInput =============================================================

/// Actions triggered during one frame, in key-press order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiInput {
    actions: Vec<UiAction>,
}

impl UiInput {
    /// No actions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Input holding exactly `actions`.
    pub fn from_actions(actions: impl IntoIterator<Item = UiAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    pub fn push(&mut self, action: UiAction) {
        if !self.actions.contains(&action) {
            self.actions.push(action);
        }
    }

    /// True if `action` fired this frame.
    pub fn pressed(&self, action: UiAction) -> bool {
        self.actions.contains(&action)
    }

    pub fn actions(&self) -> &[UiAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

//=== ReceiverId ==========================================================

/// Process-unique identity of an input receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(u64);

impl ReceiverId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

//=== InputReceiver =======================================================

/// Something that can take focus on the input stack.
///
/// Called from the render thread. Implementations use interior
/// mutability because the stack hands out shared references.
pub trait InputReceiver: Send + Sync {
    fn receiver_id(&self) -> ReceiverId;

    /// Receivers that return `false` are transparent: dispatch looks past
    /// them to the receiver below.
    fn holds_focus(&self) -> bool {
        true
    }

    /// Whether a focused receiver takes input right now. Input for a
    /// focused receiver that returns `false` is dropped, not passed down.
    fn accepts_input(&self) -> bool {
        true
    }

    fn handle_input(&self, input: &UiInput);
}

//=== InputStack ==========================================================

/// Ordered receivers; the topmost one holding focus gets each frame's
/// actions.
#[derive(Default)]
pub struct InputStack {
    receivers: Mutex<Vec<Arc<dyn InputReceiver>>>,
}

impl InputStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `receiver` on top.
    pub fn push(&self, receiver: Arc<dyn InputReceiver>) {
        self.receivers.lock().push(receiver);
    }

    /// Removes the receiver with `id`. Returns `false` if it was absent.
    pub fn remove(&self, id: ReceiverId) -> bool {
        let mut receivers = self.receivers.lock();
        let before = receivers.len();
        receivers.retain(|r| r.receiver_id() != id);
        receivers.len() != before
    }

    pub fn contains(&self, id: ReceiverId) -> bool {
        self.receivers.lock().iter().any(|r| r.receiver_id() == id)
    }

    pub fn len(&self) -> usize {
        self.receivers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.lock().is_empty()
    }

    /// The topmost receiver holding focus.
    pub fn focused(&self) -> Option<Arc<dyn InputReceiver>> {
        self.receivers
            .lock()
            .iter()
            .rev()
            .find(|r| r.holds_focus())
            .cloned()
    }

    /// Delivers `input` to the focused receiver, if it accepts input.
    ///
    /// Returns the id of the receiver that handled it. Empty input is not
    /// delivered.
    pub fn dispatch(&self, input: &UiInput) -> Option<ReceiverId> {
        if input.is_empty() {
            return None;
        }

        let target = self.focused()?;
        if !target.accepts_input() {
            trace!(target: "input", "Dropping {:?}: {:?} not ready", input.actions(), target.receiver_id());
            return None;
        }

        trace!(target: "input", "Dispatching {:?} to {:?}", input.actions(), target.receiver_id());
        target.handle_input(input);
        Some(target.receiver_id())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct Recorder {
        id: ReceiverId,
        focus: AtomicBool,
        ready: AtomicBool,
        hits: Mutex<Vec<UiAction>>,
    }

    impl Recorder {
        fn new(focus: bool) -> Arc<Self> {
            Self::with_ready(focus, true)
        }

        fn with_ready(focus: bool, ready: bool) -> Arc<Self> {
            Arc::new(Self {
                id: ReceiverId::next(),
                focus: AtomicBool::new(focus),
                ready: AtomicBool::new(ready),
                hits: Mutex::new(Vec::new()),
            })
        }
    }

    impl InputReceiver for Recorder {
        fn receiver_id(&self) -> ReceiverId {
            self.id
        }

        fn holds_focus(&self) -> bool {
            self.focus.load(Ordering::SeqCst)
        }

        fn accepts_input(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        fn handle_input(&self, input: &UiInput) {
            self.hits.lock().extend_from_slice(input.actions());
        }
    }

    #[test]
    fn topmost_receiver_gets_input() {
        let stack = InputStack::new();
        let bottom = Recorder::new(true);
        let top = Recorder::new(true);
        stack.push(bottom.clone());
        stack.push(top.clone());

        let handled = stack.dispatch(&UiInput::from_actions([UiAction::Confirm]));

        assert_eq!(handled, Some(top.id));
        assert_eq!(*top.hits.lock(), vec![UiAction::Confirm]);
        assert!(bottom.hits.lock().is_empty());
    }

    #[test]
    fn unfocused_receivers_are_skipped() {
        let stack = InputStack::new();
        let bottom = Recorder::new(true);
        let top = Recorder::new(false);
        stack.push(bottom.clone());
        stack.push(top.clone());

        assert_eq!(stack.dispatch(&UiInput::from_actions([UiAction::Up])), Some(bottom.id));
    }

    #[test]
    fn focused_receiver_that_is_not_ready_swallows_input() {
        let stack = InputStack::new();
        let bottom = Recorder::new(true);
        let top = Recorder::with_ready(true, false);
        stack.push(bottom.clone());
        stack.push(top.clone());

        assert_eq!(stack.dispatch(&UiInput::from_actions([UiAction::Confirm])), None);
        assert!(bottom.hits.lock().is_empty());
        assert!(top.hits.lock().is_empty());
        assert_eq!(stack.focused().map(|r| r.receiver_id()), Some(top.id));
    }

    #[test]
    fn empty_input_is_not_delivered() {
        let stack = InputStack::new();
        let recorder = Recorder::new(true);
        stack.push(recorder.clone());

        assert_eq!(stack.dispatch(&UiInput::none()), None);
        assert!(recorder.hits.lock().is_empty());
    }

    #[test]
    fn remove_by_id() {
        let stack = InputStack::new();
        let recorder = Recorder::new(true);
        stack.push(recorder.clone());

        assert!(stack.remove(recorder.id));
        assert!(!stack.remove(recorder.id));
        assert!(stack.is_empty());
    }

    #[test]
    fn duplicate_actions_collapse() {
        let mut input = UiInput::none();
        input.push(UiAction::Confirm);
        input.push(UiAction::Confirm);
        assert_eq!(input.actions(), &[UiAction::Confirm]);
    }
}
