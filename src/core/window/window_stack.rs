//=========================================================================
// Window Stack
//=========================================================================
//
// Ordered set of open windows, bottom to top.
//
// Script threads open and close windows; the render thread animates them
// every frame. Opening or closing a window also pushes or removes it on
// the input stack. Both locks are taken in the order windows → input.
//
// Focus: the topmost window that is still opening or active holds focus
// on the input stack. It gets the frame's input once active; until then
// input is dropped. Every window animates every frame, so windows below
// the focus keep running their own open and close animations.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use super::{WindowId, WindowRecord};
use crate::core::input::InputStack;

//=== WindowStack =========================================================

#[derive(Default)]
pub struct WindowStack {
    windows: Mutex<Vec<Arc<WindowRecord>>>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `window` on top of both stacks.
    pub fn open(&self, window: Arc<WindowRecord>, input: &InputStack) {
        let mut windows = self.windows.lock();
        debug!(target: "script", "Opening window {:?} (depth {})", window.id(), windows.len());
        input.push(window.clone());
        windows.push(window);
    }

    /// Removes the window from both stacks. Returns `false` if it was not
    /// open.
    pub fn close(&self, id: WindowId, input: &InputStack) -> bool {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|w| w.id() != id);
        input.remove(id);
        windows.len() != before
    }

    /// Advances every window's animation.
    pub fn animate(&self, delta: Duration) {
        for window in self.snapshot() {
            window.animate(delta);
        }
    }

    /// Windows bottom to top.
    pub fn snapshot(&self) -> Vec<Arc<WindowRecord>> {
        self.windows.lock().clone()
    }

    pub fn top(&self) -> Option<Arc<WindowRecord>> {
        self.windows.lock().last().cloned()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.lock().iter().any(|w| w.id() == id)
    }

    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.lock().is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{InputReceiver, UiAction, UiInput};
    use crate::core::window::{WindowPhase, WindowResult};
    use crate::core::world::Rect;

    const OPEN: Duration = Duration::from_millis(100);

    fn text() -> Arc<WindowRecord> {
        WindowRecord::text(vec!["line".into()], Rect::default(), OPEN).0
    }

    #[test]
    fn open_and_close_touch_both_stacks() {
        let windows = WindowStack::new();
        let input = InputStack::new();
        let window = text();
        let id = window.id();

        windows.open(window, &input);
        assert!(windows.contains(id));
        assert!(input.contains(id));

        assert!(windows.close(id, &input));
        assert!(!windows.contains(id));
        assert!(!input.contains(id));
        assert!(!windows.close(id, &input));
    }

    #[test]
    fn only_topmost_active_window_receives_input() {
        let windows = WindowStack::new();
        let input = InputStack::new();
        let lower = text();
        let upper = text();
        windows.open(lower.clone(), &input);
        windows.open(upper.clone(), &input);
        windows.animate(OPEN);

        input.dispatch(&UiInput::from_actions([UiAction::Confirm]));

        assert_eq!(upper.phase(), WindowPhase::Closing);
        assert_eq!(lower.phase(), WindowPhase::Active);
    }

    #[test]
    fn focus_moves_down_as_soon_as_top_starts_closing() {
        let windows = WindowStack::new();
        let input = InputStack::new();
        let lower = text();
        let upper = text();
        windows.open(lower.clone(), &input);
        windows.open(upper.clone(), &input);
        windows.animate(OPEN);

        upper.resolve(WindowResult::Acknowledged);
        assert_eq!(input.focused().map(|r| r.receiver_id()), Some(lower.id()));

        // The closing window no longer accepts input, so it falls through.
        input.dispatch(&UiInput::from_actions([UiAction::Confirm]));
        assert_eq!(lower.phase(), WindowPhase::Closing);
    }

    #[test]
    fn opening_window_shields_active_window_below() {
        let windows = WindowStack::new();
        let input = InputStack::new();
        let lower = text();
        windows.open(lower.clone(), &input);
        windows.animate(OPEN);
        assert_eq!(lower.phase(), WindowPhase::Active);

        let upper = text();
        windows.open(upper.clone(), &input);
        windows.animate(Duration::from_millis(16));
        assert_eq!(input.focused().map(|r| r.receiver_id()), Some(upper.id()));

        let handled = input.dispatch(&UiInput::from_actions([UiAction::Confirm]));

        assert_eq!(handled, None);
        assert_eq!(upper.phase(), WindowPhase::Opening);
        assert_eq!(lower.phase(), WindowPhase::Active);

        windows.animate(OPEN);
        assert_eq!(
            input.dispatch(&UiInput::from_actions([UiAction::Confirm])),
            Some(upper.id())
        );
        assert_eq!(upper.phase(), WindowPhase::Closing);
        assert_eq!(lower.phase(), WindowPhase::Active);
    }

    #[test]
    fn lower_windows_keep_animating() {
        let windows = WindowStack::new();
        let input = InputStack::new();
        let lower = text();
        windows.open(lower.clone(), &input);
        let upper = text();
        windows.open(upper, &input);

        windows.animate(Duration::from_millis(50));
        assert!(lower.openness() > 0.0);
    }

    #[test]
    fn empty_stack_updates_cleanly() {
        let windows = WindowStack::new();
        windows.animate(OPEN);
        assert!(windows.is_empty());
    }
}
