//=========================================================================
// Session Configuration
//=========================================================================
//
// Tunables for a session, loadable from TOML.
//
// Every field has a default, so a config file only lists what it
// changes. `EngineBuilder` setters override individual fields after
// loading.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::world::Rect;
use crate::error::ConfigError;

//=== SessionConfig =======================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Window title.
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Frame pacing target.
    pub target_fps: f64,
    /// Number of picture slots.
    pub picture_slots: usize,
    /// Where `show_text` windows appear when no geometry is given.
    pub text_window: Rect,
    /// Length of window open and close animations.
    pub window_open_ms: u64,
    /// Player walking speed, tiles per second.
    pub player_speed: f32,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title: "Stagehand".to_owned(),
            window_width: 640,
            window_height: 480,
            target_fps: 60.0,
            picture_slots: 16,
            text_window: Rect::new(16.0, 320.0, 608.0, 144.0),
            window_open_ms: 150,
            player_speed: 4.0,
            log_filter: None,
        }
    }
}

impl SessionConfig {
    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn window_open_time(&self) -> Duration {
        Duration::from_millis(self.window_open_ms)
    }

    /// Target duration of one frame.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
