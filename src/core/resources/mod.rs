//=========================================================================
// Resources
//
// Native resource ownership for the render thread.
//
// Responsibilities:
// - Define what a disposable resource is (`Disposable`)
// - Hold at most one live instance per slot, disposing the old one before
//   a replacement is installed (`ResourceSlot`)
// - Describe the loading collaborator (`ResourceBackend`)
// - Picture and music slot tables built on top of `ResourceSlot`
//
// Notes:
// Disposal is always explicit. Dropping a live resource does not release
// it; slots log a warning when that happens.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod music;
pub mod picture;
pub mod slot;

//=== Re-exports ==========================================================

pub use music::{MusicSlots, MusicState};
pub use picture::{Picture, PictureSlots};
pub use slot::ResourceSlot;

//=== External Dependencies ===============================================

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::bridge::Promise;
use crate::core::map::MapBundle;
use crate::error::MapLoadError;

//=== Disposable ==========================================================

/// A resource holding native memory that must be released exactly once.
pub trait Disposable {
    fn dispose(&mut self);
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
    fn dispose(&mut self) {
        (**self).dispose();
    }
}

//=== Texture =============================================================

/// GPU texture handle owned by the render thread.
pub trait Texture: Disposable + Send {
    /// Pixel size.
    fn size(&self) -> (u32, u32);
}

//=== AudioTrack ==========================================================

/// Streaming audio handle.
pub trait AudioTrack: Disposable + Send {
    fn play(&mut self, looping: bool);
    fn stop(&mut self);
    /// Volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
}

//=== MusicSpec ===========================================================

/// Which track to play and at what volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSpec {
    pub name: String,
    pub volume: f32,
}

impl MusicSpec {
    pub fn new(name: impl Into<String>, volume: f32) -> Self {
        Self {
            name: name.into(),
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

//=== ResourceBackend =====================================================

/// Loads resources from the project on behalf of the render thread.
///
/// All methods are called on the render thread.
pub trait ResourceBackend: Send {
    /// Loads a texture by name.
    ///
    /// Never fails: a missing or unreadable texture yields an empty
    /// placeholder such as [`NullTexture`].
    fn load_texture(&mut self, name: &str) -> Box<dyn Texture>;

    /// Starts loading a music track.
    ///
    /// The track may arrive on a later frame. If the returned promise is
    /// dropped before completion, `Completer::complete` hands the track
    /// back and the backend must dispose it.
    fn load_music(&mut self, spec: &MusicSpec) -> Promise<Box<dyn AudioTrack>>;

    /// Loads a map and its tileset.
    fn load_map(&mut self, name: &str) -> Result<MapBundle, MapLoadError>;
}

//=== Placeholders ========================================================

/// Empty texture used where loading failed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTexture;

impl Disposable for NullTexture {
    fn dispose(&mut self) {}
}

impl Texture for NullTexture {
    fn size(&self) -> (u32, u32) {
        (0, 0)
    }
}

/// Silent track used where loading failed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrack;

impl Disposable for NullTrack {
    fn dispose(&mut self) {}
}

impl AudioTrack for NullTrack {
    fn play(&mut self, _looping: bool) {}
    fn stop(&mut self) {}
    fn set_volume(&mut self, _volume: f32) {}
}

//=========================================================================
// Unit Tests
//=========================================================================
