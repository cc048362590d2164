//=========================================================================
// State Tracker
//=========================================================================
//
// Keyboard state with per-frame deltas.
//
// Architecture:
//   InputEvent → process_events() → HashSet (keys held) → query
//
// Frame lifecycle: process_events() → query → end_frame()
//
// Events buffered by the platform are folded in before the frame's update;
// the update pipeline reads pressed keys, then `end_frame` drops the deltas
// so a press is seen by exactly one frame.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

//=== Internal Dependencies ===============================================

use super::event::{InputEvent, KeyCode, Modifiers};

//=== StateTracker ========================================================

/// Tracks keys held and keys pressed or released since the last frame.
#[derive(Debug, Default)]
pub struct StateTracker {
    //--- Persistent State (survives frame boundary) ----------------------
    keys_down: HashSet<KeyCode>,
    modifiers: Modifiers,

    //--- Frame Deltas (reset by end_frame()) -----------------------------
    keys_pressed_this_frame: HashSet<KeyCode>,
    keys_released_this_frame: HashSet<KeyCode>,
}

impl StateTracker {
    /// Creates a tracker with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Frame Processing -------------------------------------------------

    /// Folds platform events into the current frame.
    pub fn process_events(&mut self, events: &[InputEvent]) {
        for event in events {
            self.process_event(event);
        }
    }

    /// Drops this frame's pressed/released sets. Held keys persist.
    pub fn end_frame(&mut self) {
        self.keys_pressed_this_frame.clear();
        self.keys_released_this_frame.clear();
    }

    //--- Internal Helpers -------------------------------------------------

    fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { key, modifiers } => {
                self.modifiers = *modifiers;
                // OS key repeat does not count as a new press
                if self.keys_down.insert(*key) {
                    self.keys_pressed_this_frame.insert(*key);
                }
            }

            InputEvent::KeyUp { key, modifiers } => {
                self.modifiers = *modifiers;
                if self.keys_down.remove(key) {
                    self.keys_released_this_frame.insert(*key);
                }
            }
        }
    }

    //=====================================================================
    // Query API
    //=====================================================================

    /// Returns `true` if key transitioned UP → DOWN this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed_this_frame.contains(&key)
    }

    /// Returns `true` while key is held.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns `true` if key transitioned DOWN → UP this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released_this_frame.contains(&key)
    }

    /// Modifier state from the most recent key event.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Iterator over keys pressed this frame.
    pub fn keys_pressed(&self) -> impl Iterator<Item = &KeyCode> {
        self.keys_pressed_this_frame.iter()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
