//=========================================================================
// Persistent World State
//=========================================================================
//
// Long-lived game facts that survive map changes and go into save files:
// camera location, per-event state integers and picture slot records.
//
// Plain data only. The render thread is the single writer; scripts reach
// it through the coordinator. Saved as RON.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::error::PersistError;

//=== Rect ================================================================

/// Screen-space rectangle in pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

//=== CameraLocation ======================================================

/// Map and tile the camera is looking at.
///
/// An empty `map` means no map is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraLocation {
    pub map: String,
    pub x: i32,
    pub y: i32,
}

impl CameraLocation {
    pub fn new(map: impl Into<String>, x: i32, y: i32) -> Self {
        Self { map: map.into(), x, y }
    }

    /// The "no map loaded" location.
    pub fn nowhere() -> Self {
        Self::default()
    }

    /// True if this location denotes no map.
    pub fn is_nowhere(&self) -> bool {
        self.map.is_empty()
    }
}

//=== EventStateStore =====================================================

/// `(map, event) → state` table used to branch event behavior.
///
/// Unset entries read as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventStateStore {
    maps: HashMap<String, HashMap<String, i32>>,
}

impl EventStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, map: &str, event: &str) -> i32 {
        self.maps
            .get(map)
            .and_then(|events| events.get(event))
            .copied()
            .unwrap_or(0)
    }

    /// Stores a state, returning the previous one.
    pub fn set(&mut self, map: &str, event: &str, state: i32) -> i32 {
        self.maps
            .entry(map.to_owned())
            .or_default()
            .insert(event.to_owned(), state)
            .unwrap_or(0)
    }

    /// Number of explicitly stored entries.
    pub fn len(&self) -> usize {
        self.maps.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//=== PictureRecord =======================================================

/// What a picture slot shows, by name. The loaded texture lives in the
/// render-side slot; this is the saveable description of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureRecord {
    pub name: String,
    pub geometry: Rect,
}

//=== PersistentState =====================================================

/// Everything that goes into a save file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistentState {
    pub camera: CameraLocation,
    pub event_states: EventStateStore,
    pub pictures: Vec<Option<PictureRecord>>,
}

impl PersistentState {
    /// Empty state with `picture_slots` empty picture records.
    pub fn new(picture_slots: usize) -> Self {
        Self {
            camera: CameraLocation::nowhere(),
            event_states: EventStateStore::new(),
            pictures: vec![None; picture_slots],
        }
    }

    /// Serializes to a RON string.
    pub fn to_ron(&self) -> Result<String, PersistError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Parses a RON string.
    pub fn from_ron(text: &str) -> Result<Self, PersistError> {
        Ok(ron::from_str(text)?)
    }

    /// Writes the state to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        fs::write(path, self.to_ron()?)?;
        info!(target: "render", "Saved session state to {}", path.display());
        Ok(())
    }

    /// Reads a state previously written by [`PersistentState::save`].
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let state = Self::from_ron(&fs::read_to_string(path)?)?;
        info!(target: "render", "Loaded session state from {}", path.display());
        Ok(state)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_event_state_reads_zero() {
        let store = EventStateStore::new();
        assert_eq!(store.get("map1", "door"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn set_returns_previous_state() {
        let mut store = EventStateStore::new();
        assert_eq!(store.set("map1", "door", 2), 0);
        assert_eq!(store.set("map1", "door", 3), 2);
        assert_eq!(store.get("map1", "door"), 3);
        assert_eq!(store.get("map2", "door"), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn nowhere_is_the_default_location() {
        assert!(CameraLocation::default().is_nowhere());
        assert!(!CameraLocation::new("town", 3, 4).is_nowhere());
    }

    #[test]
    fn save_and_load_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot1.ron");

        let mut state = PersistentState::new(4);
        state.camera = CameraLocation::new("town", 12, -3);
        state.event_states.set("town", "chest", 1);
        state.pictures[2] = Some(PictureRecord {
            name: "portrait".into(),
            geometry: Rect::new(10.0, 20.0, 64.0, 64.0),
        });

        state.save(&path).unwrap();
        let loaded = PersistentState::load(&path).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn malformed_save_is_rejected() {
        let err = PersistentState::from_ron("(camera: 12").unwrap_err();
        assert!(matches!(err, PersistError::Decode(_)));
    }

    #[test]
    fn missing_save_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PersistentState::load(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }
}
