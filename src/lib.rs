//=========================================================================
// Stagehand Library Root
//
// Render-thread state coordinator for script-driven game sessions.
//
// Responsibilities:
// - Expose the session facade (`Engine`, `EngineBuilder`)
// - Expose `core` for hosts that drive `GameCoordinator` themselves
// - Keep the winit integration (`platform`) private
//
// Typical usage:
// ```no_run
// use stagehand::prelude::*;
//
// # fn backend() -> Box<dyn ResourceBackend> { unimplemented!() }
// # struct Renderer;
// # impl FrameRenderer for Renderer { fn render(&mut self, _: &GameState) {} }
// let mut engine = EngineBuilder::new().build(backend());
// engine.spawn_script("main", |ctx| ctx.show_text(vec!["Hi".into()]));
// engine.run(Renderer);
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` holds the winit event loop and is not part of the public
// API beyond the `FrameRenderer` hook.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use config::SessionConfig;
pub use core::bridge::ScriptContext;
pub use core::{GameCoordinator, GameState};
pub use engine::{Engine, EngineBuilder};
pub use error::{ConfigError, MapLoadError, PersistError, PlatformError, SessionError, SessionResult};
pub use platform::FrameRenderer;
