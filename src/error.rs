//=========================================================================
// Error Types
//=========================================================================
//
// Every failure a caller of this crate can observe.
//
// Script-facing failures (`SessionError`) are returned from the blocking
// primitives on `ScriptContext`. Resource loads are lenient and never
// appear here; map loads, persistence and configuration have their own
// enums so callers can match on them precisely.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== SessionError ========================================================

/// Failure surfaced to a script thread by a coordinator call.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The render side dropped the operation before producing a result.
    ///
    /// Happens when the coordinator shuts down with work still queued, or
    /// when a window is discarded without ever being resolved.
    #[error("operation cancelled: the render thread dropped it before completion")]
    Cancelled,

    /// The session is shutting down; a blocking wait was interrupted.
    #[error("wait interrupted: the session is shutting down")]
    Interrupted,

    /// Switching the camera to a new map failed; no map is loaded now.
    #[error(transparent)]
    MapLoad(#[from] MapLoadError),
}

/// Result type for script-facing operations.
pub type SessionResult<T> = Result<T, SessionError>;

//=== MapLoadError ========================================================

/// Failure reported by a [`crate::core::resources::ResourceBackend`] while
/// loading a map bundle.
#[derive(Debug, Error)]
pub enum MapLoadError {
    /// No map with that name exists.
    #[error("map `{0}` not found")]
    NotFound(String),

    /// The map exists but its data could not be decoded.
    #[error("map `{name}` is corrupt: {reason}")]
    Corrupt {
        /// Map identifier.
        name: String,
        /// Decoder message.
        reason: String,
    },

    /// Reading the map failed at the OS level.
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),
}

//=== PersistError ========================================================

/// Save/load failure for [`crate::core::world::PersistentState`].
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save file is malformed: {0}")]
    Decode(#[from] ron::error::SpannedError),

    #[error("failed to encode save data: {0}")]
    Encode(#[from] ron::Error),
}

//=== ConfigError =========================================================

/// Failure while reading a [`crate::config::SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is malformed: {0}")]
    Parse(#[from] toml::de::Error),
}

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
///
/// These are typically fatal: if the event loop can't be created, the
/// session cannot run.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to create event loop (rare, indicates OS-level issue).
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(#[source] winit::error::EventLoopError),

    /// Event loop execution error.
    #[error("event loop error: {0}")]
    EventLoopExecution(#[source] winit::error::EventLoopError),
}

//=========================================================================
// Unit Tests
//=========================================================================
