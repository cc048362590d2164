//=========================================================================
// Input Buffer
//
// Collects keyboard events between frame boundaries.
//
// Responsibilities:
// - Store incoming platform events in arrival order
// - Drop consecutive duplicates (OS key repeat floods)
// - Hand the frame's events to the coordinator via `drain()`
//
// Notes:
// Storage is kept across frames; `drain()` empties without releasing
// capacity.
//=========================================================================

//=== Internal Modules ====================================================

use crate::core::input::InputEvent;

//=== InputBuffer =========================================================

pub(crate) struct InputBuffer {
    events: Vec<InputEvent>,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        const BASE_CAPACITY: usize = 64;

        Self {
            events: Vec::with_capacity(BASE_CAPACITY),
        }
    }

    /// Appends an event unless it repeats the previous one.
    pub(crate) fn push(&mut self, event: InputEvent) {
        if self.events.last() != Some(&event) {
            self.events.push(event);
        }
    }

    /// Returns this frame's events and empties the buffer.
    pub(crate) fn drain(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::KeyCode;

    #[test]
    fn consecutive_duplicates_are_dropped() {
        let mut buffer = InputBuffer::new();
        buffer.push(InputEvent::press(KeyCode::ArrowDown));
        buffer.push(InputEvent::press(KeyCode::ArrowDown));
        buffer.push(InputEvent::release(KeyCode::ArrowDown));
        buffer.push(InputEvent::press(KeyCode::ArrowDown));
        assert_eq!(buffer.drain().len(), 3);
    }

    #[test]
    fn drain_keeps_order_and_empties() {
        let mut buffer = InputBuffer::new();
        buffer.push(InputEvent::press(KeyCode::KeyZ));
        buffer.push(InputEvent::release(KeyCode::KeyZ));

        let events = buffer.drain();
        assert_eq!(
            events,
            vec![InputEvent::press(KeyCode::KeyZ), InputEvent::release(KeyCode::KeyZ)]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_does_not_deallocate() {
        let mut buffer = InputBuffer::new();
        for _ in 0..100 {
            buffer.push(InputEvent::press(KeyCode::Space));
            buffer.push(InputEvent::release(KeyCode::Space));
        }
        let capacity = buffer.events.capacity();

        buffer.drain();
        assert_eq!(buffer.events.capacity(), capacity);
    }
}
