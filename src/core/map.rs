//=========================================================================
// Map Data
//=========================================================================
//
// Static map description and the loaded bundle the camera points at.
//
// `MapData` is plain serde data shared (via `Arc`) between the bundle
// and the NPCs spawned from its events. `MapBundle` adds the native
// tileset texture and is the unit the map slot disposes.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::resources::{Disposable, Texture};
use crate::error::MapLoadError;

//=== SpriteRef ===========================================================

/// Frame `index` of sprite sheet `sheet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRef {
    pub sheet: String,
    pub index: u32,
}

impl SpriteRef {
    pub fn new(sheet: impl Into<String>, index: u32) -> Self {
        Self {
            sheet: sheet.into(),
            index,
        }
    }
}

//=== EventPage ===========================================================

/// How an event looks while its state selects this page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub sprite: Option<SpriteRef>,
}

//=== EventDefinition =====================================================

/// A map event: a named, placed object whose look depends on its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub pages: Vec<EventPage>,
}

impl EventDefinition {
    /// Page selected by `state`.
    ///
    /// Negative states select the first page; states past the end select
    /// the last one.
    pub fn page(&self, state: i32) -> Option<&EventPage> {
        let last = self.pages.len().checked_sub(1)?;
        let index = usize::try_from(state).unwrap_or(0).min(last);
        self.pages.get(index)
    }
}

//=== MapData =============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub tileset: String,
    /// Row-major tile indices, `width * height` long.
    #[serde(default)]
    pub tiles: Vec<u32>,
    #[serde(default)]
    pub events: Vec<EventDefinition>,
}

impl MapData {
    /// Parses a RON map file, checking that the tile grid matches the
    /// declared size.
    pub fn from_ron(name: &str, text: &str) -> Result<Self, MapLoadError> {
        let data: Self = ron::from_str(text).map_err(|e| MapLoadError::Corrupt {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<(), MapLoadError> {
        let expected = self.width as usize * self.height as usize;
        if !self.tiles.is_empty() && self.tiles.len() != expected {
            return Err(MapLoadError::Corrupt {
                name: self.name.clone(),
                reason: format!(
                    "{} tiles for a {}x{} map",
                    self.tiles.len(),
                    self.width,
                    self.height
                ),
            });
        }
        Ok(())
    }

    pub fn event(&self, name: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|e| e.name == name)
    }
}

//=== MapBundle ===========================================================

/// A loaded map: data plus its native tileset.
pub struct MapBundle {
    data: Arc<MapData>,
    tileset: Box<dyn Texture>,
}

impl MapBundle {
    pub fn new(data: MapData, tileset: Box<dyn Texture>) -> Self {
        Self {
            data: Arc::new(data),
            tileset,
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn data(&self) -> &Arc<MapData> {
        &self.data
    }

    pub fn tileset(&self) -> &dyn Texture {
        self.tileset.as_ref()
    }
}

impl Disposable for MapBundle {
    fn dispose(&mut self) {
        self.tileset.dispose();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn door() -> EventDefinition {
        EventDefinition {
            name: "door".into(),
            x: 1,
            y: 2,
            pages: vec![
                EventPage { sprite: Some(SpriteRef::new("door", 0)) },
                EventPage { sprite: Some(SpriteRef::new("door", 1)) },
            ],
        }
    }

    #[test]
    fn page_selection_clamps() {
        let event = door();
        assert_eq!(event.page(-4).unwrap().sprite.as_ref().unwrap().index, 0);
        assert_eq!(event.page(1).unwrap().sprite.as_ref().unwrap().index, 1);
        assert_eq!(event.page(9).unwrap().sprite.as_ref().unwrap().index, 1);
    }

    #[test]
    fn event_without_pages_has_no_page() {
        let mut event = door();
        event.pages.clear();
        assert!(event.page(0).is_none());
    }

    #[test]
    fn parses_map_file() {
        let text = r#"(
            name: "town",
            width: 2,
            height: 2,
            tileset: "town_tiles",
            tiles: [0, 1, 1, 0],
            events: [(name: "sign", x: 1, y: 0, pages: [(sprite: None)])],
        )"#;

        let map = MapData::from_ron("town", text).unwrap();
        assert_eq!(map.tiles.len(), 4);
        assert_eq!(map.event("sign").unwrap().x, 1);
    }

    #[test]
    fn mismatched_tile_grid_is_corrupt() {
        let text = r#"(name: "bad", width: 3, height: 3, tiles: [0, 0])"#;
        let err = MapData::from_ron("bad", text).unwrap_err();
        assert!(matches!(err, MapLoadError::Corrupt { .. }));
    }

    #[test]
    fn unparsable_map_is_corrupt() {
        let err = MapData::from_ron("junk", "not ron at all").unwrap_err();
        assert!(matches!(err, MapLoadError::Corrupt { ref name, .. } if name == "junk"));
    }
}
