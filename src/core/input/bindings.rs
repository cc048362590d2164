//=========================================================================
// UI Bindings
//=========================================================================
//
// Maps keys to UI actions.
//
// Architecture:
//   StateTracker (keys pressed this frame) → HashMap<KeyCode, UiAction> → UiInput
//
// Several keys may share an action. Resolution is per frame and only
// looks at fresh presses, so holding Confirm never re-confirms.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

//=== Internal Dependencies ===============================================

use super::event::KeyCode;
use super::state_tracker::StateTracker;
use super::{UiAction, UiInput};

//=== UiBindings ==========================================================

/// Key → action table.
#[derive(Debug, Clone)]
pub struct UiBindings {
    keys: HashMap<KeyCode, UiAction>,
}

impl UiBindings {
    /// Creates a table with no bindings.
    pub fn empty() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    //--- Binding API ------------------------------------------------------

    /// Binds `key` to `action`, replacing any previous binding of that key.
    pub fn bind(&mut self, key: KeyCode, action: UiAction) {
        self.keys.insert(key, action);
    }

    /// Removes the binding for `key`.
    pub fn unbind(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    /// Action bound to `key`, if any.
    pub fn action_for(&self, key: KeyCode) -> Option<UiAction> {
        self.keys.get(&key).copied()
    }

    //--- Resolution -------------------------------------------------------

    /// Actions triggered by keys pressed this frame.
    pub fn resolve(&self, tracker: &StateTracker) -> UiInput {
        let mut input = UiInput::none();
        for key in tracker.keys_pressed() {
            if let Some(action) = self.action_for(*key) {
                input.push(action);
            }
        }
        input
    }
}

impl Default for UiBindings {
    /// Arrows navigate, Enter/Space/Z confirm, Escape/X cancel.
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(KeyCode::ArrowUp, UiAction::Up);
        bindings.bind(KeyCode::ArrowDown, UiAction::Down);
        bindings.bind(KeyCode::ArrowLeft, UiAction::Left);
        bindings.bind(KeyCode::ArrowRight, UiAction::Right);
        bindings.bind(KeyCode::Enter, UiAction::Confirm);
        bindings.bind(KeyCode::Space, UiAction::Confirm);
        bindings.bind(KeyCode::KeyZ, UiAction::Confirm);
        bindings.bind(KeyCode::Escape, UiAction::Cancel);
        bindings.bind(KeyCode::KeyX, UiAction::Cancel);
        bindings
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
