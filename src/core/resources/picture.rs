//=========================================================================
// Picture Slots
//=========================================================================
//
// Fixed table of on-screen pictures.
//
// Each slot owns at most one loaded texture. Showing a picture in an
// occupied slot disposes the old texture before the new one is
// installed. Out-of-range slot indices are logged and ignored.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{Disposable, ResourceBackend, ResourceSlot, Texture};
use crate::core::world::{PictureRecord, Rect};

//=== Picture =============================================================

/// A loaded picture and where it is drawn.
pub struct Picture {
    record: PictureRecord,
    texture: Box<dyn Texture>,
}

impl Picture {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn geometry(&self) -> Rect {
        self.record.geometry
    }

    pub fn record(&self) -> &PictureRecord {
        &self.record
    }

    pub fn texture(&self) -> &dyn Texture {
        self.texture.as_ref()
    }
}

impl Disposable for Picture {
    fn dispose(&mut self) {
        self.texture.dispose();
    }
}

//=== PictureSlots ========================================================

pub struct PictureSlots {
    slots: Vec<ResourceSlot<Picture>>,
}

impl PictureSlots {
    /// Creates `count` empty slots.
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| ResourceSlot::new("picture")).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Loads `name` into `slot`, replacing whatever was shown there.
    ///
    /// Returns `false` if `slot` is out of range.
    pub fn show(
        &mut self,
        slot: usize,
        name: &str,
        geometry: Rect,
        backend: &mut dyn ResourceBackend,
    ) -> bool {
        let Some(target) = self.slots.get_mut(slot) else {
            warn!(target: "render", "show_picture: slot {} out of range (0..{})", slot, self.slots.len());
            return false;
        };

        // Release the old texture before the new one is loaded.
        target.clear();
        let texture = backend.load_texture(name);
        target.set(Some(Picture {
            record: PictureRecord {
                name: name.to_owned(),
                geometry,
            },
            texture,
        }));
        debug!(target: "render", "Picture '{}' shown in slot {}", name, slot);
        true
    }

    /// Disposes the picture in `slot`. Returns `false` if out of range.
    pub fn hide(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(target) => {
                target.clear();
                true
            }
            None => {
                warn!(target: "render", "hide_picture: slot {} out of range (0..{})", slot, self.slots.len());
                false
            }
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Picture> {
        self.slots.get(slot).and_then(ResourceSlot::get)
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Picture)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.get().map(|p| (i, p)))
    }

    /// Disposes every picture.
    pub fn clear_all(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
