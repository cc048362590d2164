//=========================================================================
// Input Processor
//=========================================================================
//
// Converts winit keyboard events into engine InputEvents.
//
// Architecture:
//   Winit Events → InputProcessor → InputEvent (engine type) → InputBuffer
//
// Modifier state from ModifiersChanged is cached and stamped onto every
// subsequent key event. Keys with no engine KeyCode are filtered out
// (returns None). OS key repeat arrives as repeated presses and is left
// to the buffer's dedup.
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode as WinitKeyCode, ModifiersState, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::input::{InputEvent, KeyCode, Modifiers};

//=== InputProcessor ======================================================

pub(crate) struct InputProcessor {
    current_modifiers: Modifiers,
}

impl InputProcessor {
    pub(crate) fn new() -> Self {
        Self {
            current_modifiers: Modifiers::NONE,
        }
    }

    //--- Modifier State Management ----------------------------------------

    /// Updates cached modifier state (applied to subsequent events).
    pub(crate) fn update_modifiers(&mut self, modifiers_state: ModifiersState) {
        self.current_modifiers = Modifiers::from(modifiers_state);
    }

    #[cfg(test)]
    pub(crate) fn current_modifiers(&self) -> Modifiers {
        self.current_modifiers
    }

    //--- Event Processing -------------------------------------------------

    /// Converts a winit KeyEvent (filters unmapped keys).
    pub(crate) fn process_key_event(&self, key_event: &KeyEvent) -> Option<InputEvent> {
        let key_code = match key_event.physical_key {
            PhysicalKey::Code(code) => KeyCode::from(code),
            _ => return None,
        };

        self.key_input_event(key_code, key_event.state)
    }

    fn key_input_event(&self, key: KeyCode, state: ElementState) -> Option<InputEvent> {
        if matches!(key, KeyCode::Unidentified) {
            return None;
        }

        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown {
                key,
                modifiers: self.current_modifiers,
            },
            ElementState::Released => InputEvent::KeyUp {
                key,
                modifiers: self.current_modifiers,
            },
        })
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Winit normalizes platform keys (macOS Cmd → Ctrl, Option → Alt).
impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
        }
    }
}

impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;

        match code {
            ArrowUp => KeyCode::ArrowUp,
            ArrowDown => KeyCode::ArrowDown,
            ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight,

            KeyA => KeyCode::KeyA,
            KeyC => KeyCode::KeyC,
            KeyD => KeyCode::KeyD,
            KeyS => KeyCode::KeyS,
            KeyW => KeyCode::KeyW,
            KeyX => KeyCode::KeyX,
            KeyZ => KeyCode::KeyZ,

            Space => KeyCode::Space,
            Enter | NumpadEnter => KeyCode::Enter,
            Escape => KeyCode::Escape,
            Backspace => KeyCode::Backspace,

            _ => KeyCode::Unidentified,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
