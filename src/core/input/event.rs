//=========================================================================
// Input Event Types
//
// Platform-neutral keyboard events.
//
// The platform layer (winit) converts OS events into these types and
// buffers them until the frame boundary. The render thread folds them
// into the `StateTracker`, and `UiBindings` turns pressed keys into UI
// actions for whichever receiver is on top of the input stack.
//
// Event Flow:
// ```text
// Platform Layer (Winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    StateTracker (pressed / released this frame)
//         ↓
//    UiBindings → UiInput → InputStack top
// ```
//
//=========================================================================

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Only keys a dialogue-driven game binds by default are listed; the
/// platform layer reports everything else as `Unidentified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Letters used by classic console layouts --------------------------

    KeyA, KeyC, KeyD, KeyS, KeyW, KeyX, KeyZ,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Backspace,

    /// Fallback for keys not explicitly mapped by the input layer.
    Unidentified,
}

//=== Modifiers ===========================================================

/// Modifier key state (Shift, Ctrl, Alt).
///
/// Left and right variants are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// True if any modifier is held.
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

//=== InputEvent ==========================================================

/// Low-level keyboard event from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Key pressed down (OS key repeat arrives as repeated `KeyDown`).
    KeyDown { key: KeyCode, modifiers: Modifiers },

    /// Key released.
    KeyUp { key: KeyCode, modifiers: Modifiers },
}

impl InputEvent {
    /// Shorthand for an unmodified key press.
    pub fn press(key: KeyCode) -> Self {
        Self::KeyDown {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Shorthand for an unmodified key release.
    pub fn release(key: KeyCode) -> Self {
        Self::KeyUp {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Key this event refers to.
    pub fn key(&self) -> KeyCode {
        match *self {
            Self::KeyDown { key, .. } | Self::KeyUp { key, .. } => key,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
