//=========================================================================
// Resource Slot
//=========================================================================
//
// Holds zero or one live resource.
//
// Installing a new value disposes the current one first, so at most one
// instance per slot is ever live and every instance that enters a slot
// is disposed exactly once: when it is replaced, cleared, or taken out
// and disposed by the caller.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::warn;

//=== Internal Dependencies ===============================================

use super::Disposable;

//=== ResourceSlot ========================================================

/// Single-occupancy owner of a [`Disposable`].
#[derive(Debug)]
pub struct ResourceSlot<T: Disposable> {
    value: Option<T>,
    label: &'static str,
}

impl<T: Disposable> ResourceSlot<T> {
    /// Empty slot. `label` names the slot in log output.
    pub fn new(label: &'static str) -> Self {
        Self { value: None, label }
    }

    /// Replaces the contents, disposing the old value before installing
    /// the new one. `None` just clears.
    pub fn set(&mut self, value: Option<T>) {
        self.clear();
        self.value = value;
    }

    /// Disposes and removes the current value, if any.
    pub fn clear(&mut self) {
        if let Some(mut old) = self.value.take() {
            old.dispose();
        }
    }

    /// Removes the value without disposing it. The caller owns disposal.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl<T: Disposable> Drop for ResourceSlot<T> {
    fn drop(&mut self) {
        if self.value.is_some() {
            warn!(target: "render", "Resource slot '{}' dropped while still holding a live resource", self.label);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    struct Tracked {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Disposable for Tracked {
        fn dispose(&mut self) {
            self.log.lock().push(self.name);
        }
    }

    fn tracked(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Tracked {
        Tracked {
            name,
            log: Arc::clone(log),
        }
    }

    #[test]
    fn set_disposes_previous_value() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut slot = ResourceSlot::new("test");

        slot.set(Some(tracked("a", &log)));
        assert!(log.lock().is_empty());

        slot.set(Some(tracked("b", &log)));
        assert_eq!(*log.lock(), vec!["a"]);

        slot.clear();
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert!(slot.is_empty());
    }

    #[test]
    fn disposals_match_non_empty_sets() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut slot = ResourceSlot::new("test");

        slot.set(Some(tracked("a", &log)));
        slot.set(None);
        slot.set(None);
        slot.set(Some(tracked("b", &log)));
        slot.set(Some(tracked("c", &log)));
        slot.clear();
        slot.clear();

        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn take_hands_over_without_disposing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut slot = ResourceSlot::new("test");
        slot.set(Some(tracked("a", &log)));

        let mut taken = slot.take().unwrap();
        assert!(log.lock().is_empty());
        taken.dispose();
        assert_eq!(*log.lock(), vec!["a"]);
    }
}
