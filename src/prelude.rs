//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use stagehand::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Session facade
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::platform::FrameRenderer;
pub use crate::config::SessionConfig;

// Coordinator
pub use crate::core::bridge::ScriptContext;
pub use crate::core::{GameCoordinator, GameState};

// Screen content
pub use crate::core::map::{MapBundle, MapData, SpriteRef};
pub use crate::core::resources::{AudioTrack, Disposable, MusicSpec, ResourceBackend, Texture};
pub use crate::core::window::{Justification, WindowResult};
pub use crate::core::world::{CameraLocation, Rect};

// Input
pub use crate::core::input::{KeyCode, UiAction, UiBindings};

// Errors
pub use crate::error::{MapLoadError, SessionError, SessionResult};
