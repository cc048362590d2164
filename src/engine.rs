//=========================================================================
// Stagehand Engine
//
// Main entry point: builds the coordinator, starts script threads and
// runs the window loop.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_config()           ├─ init()          (render-thread setup)
//         ├─ with_title()            ├─ spawn_script()  (registers a script)
//         ├─ with_target_fps()       └─ run()
//         ├─ with_window_size()          ├─ starts script threads
//         └─ with_picture_slots()        ├─ runs platform (blocks)
//                                        ├─ shuts the session down
//                                        └─ joins script threads
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread::{self, JoinHandle};

use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use crate::config::SessionConfig;
use crate::core::bridge::ScriptContext;
use crate::core::resources::ResourceBackend;
use crate::core::{GameCoordinator, GameState};
use crate::error::{SessionError, SessionResult};
use crate::logging::{init_logging, LoggingConfig};
use crate::platform::{FrameRenderer, Platform};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// Starts from [`SessionConfig::default`]; setters override single fields.
///
/// # Examples
///
/// ```no_run
/// use stagehand::{EngineBuilder, FrameRenderer, GameState};
/// use stagehand::core::resources::ResourceBackend;
///
/// # fn backend() -> Box<dyn ResourceBackend> { unimplemented!() }
/// struct Null;
/// impl FrameRenderer for Null {
///     fn render(&mut self, _state: &GameState) {}
/// }
///
/// let mut engine = EngineBuilder::new()
///     .with_title("Demo")
///     .with_target_fps(30.0)
///     .build(backend());
///
/// engine.spawn_script("intro", |ctx| {
///     ctx.show_text(vec!["Hello.".into()])?;
///     Ok(())
/// });
/// engine.run(Null);
/// ```
pub struct EngineBuilder {
    config: SessionConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Replaces the whole configuration, e.g. one loaded from TOML.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Sets the frame pacing target.
    ///
    /// Default: 60.0
    ///
    /// # Panics
    ///
    /// Panics if `fps <= 0.0`.
    pub fn with_target_fps(mut self, fps: f64) -> Self {
        assert!(fps > 0.0, "Target FPS must be positive, got {}", fps);
        self.config.target_fps = fps;
        self
    }

    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "Window size must be non-zero, got {}x{}",
            width,
            height
        );
        self.config.window_width = width;
        self.config.window_height = height;
        self
    }

    /// Sets the number of picture slots.
    ///
    /// # Panics
    ///
    /// Panics if `count == 0`.
    pub fn with_picture_slots(mut self, count: usize) -> Self {
        assert!(count > 0, "Picture slot count must be positive");
        self.config.picture_slots = count;
        self
    }

    /// Builds the engine. Initializes logging from the config's filter.
    pub fn build(self, backend: Box<dyn ResourceBackend>) -> Engine {
        init_logging(LoggingConfig::with_filter(self.config.log_filter.clone()));

        info!(
            "Building engine ({} @ {} fps, {} picture slots)",
            self.config.title, self.config.target_fps, self.config.picture_slots
        );

        Engine {
            coordinator: GameCoordinator::new(self.config, backend),
            scripts: Vec::new(),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

type ScriptFn = Box<dyn FnOnce(ScriptContext) -> SessionResult<()> + Send + 'static>;

struct ScriptEntry {
    name: String,
    body: ScriptFn,
}

/// Session runtime.
///
/// The thread calling [`Engine::run`] becomes the render thread. Scripts
/// registered with [`Engine::spawn_script`] each get their own thread
/// and a [`ScriptContext`].
pub struct Engine {
    coordinator: GameCoordinator,
    scripts: Vec<ScriptEntry>,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// Render-thread setup before the loop starts (initial map, player
    /// position, input bindings, restored save data).
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut GameState),
    {
        info!("Initializing session state");
        init_fn(self.coordinator.state_mut());
        self
    }

    /// A context for script threads the caller manages itself.
    pub fn script_context(&self) -> ScriptContext {
        self.coordinator.script_context()
    }

    /// Registers a script to start on its own thread when [`Engine::run`]
    /// begins.
    pub fn spawn_script<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: FnOnce(ScriptContext) -> SessionResult<()> + Send + 'static,
    {
        self.scripts.push(ScriptEntry {
            name: name.into(),
            body: Box::new(body),
        });
    }

    //--- Execution --------------------------------------------------------

    /// Runs the session and blocks until the window closes.
    ///
    /// # Lifecycle
    ///
    /// 1. Starts every registered script thread
    /// 2. Runs the platform event loop (blocks here)
    /// 3. Shuts the coordinator down, interrupting blocked scripts
    /// 4. Joins script threads
    pub fn run<R: FrameRenderer>(self, renderer: R) {
        let Engine { coordinator, scripts } = self;

        //--- 1. Start scripts ---------------------------------------------
        let handles: Vec<(String, JoinHandle<SessionResult<()>>)> = scripts
            .into_iter()
            .filter_map(|entry| spawn_script_thread(&coordinator, entry))
            .collect();
        info!("{} script thread(s) started", handles.len());

        //--- 2. Platform loop ---------------------------------------------
        let mut platform = Platform::new(coordinator, renderer);
        if let Err(e) = platform.run() {
            error!("Platform error: {}", e);
        }
        info!("Platform event loop exited");

        //--- 3. Shutdown ----------------------------------------------------
        let mut coordinator = platform.into_coordinator();
        coordinator.shutdown();

        //--- 4. Join scripts ----------------------------------------------
        join_scripts(handles);

        info!("Engine shutdown complete");
    }
}

//=== Script Threads ======================================================

fn spawn_script_thread(
    coordinator: &GameCoordinator,
    entry: ScriptEntry,
) -> Option<(String, JoinHandle<SessionResult<()>>)> {
    let ScriptEntry { name, body } = entry;
    let ctx = coordinator.script_context();

    match thread::Builder::new()
        .name(format!("script:{}", name))
        .spawn(move || body(ctx))
    {
        Ok(handle) => Some((name, handle)),
        Err(e) => {
            error!(target: "script", "Failed to start script '{}': {}", name, e);
            None
        }
    }
}

fn join_scripts(handles: Vec<(String, JoinHandle<SessionResult<()>>)>) {
    for (name, handle) in handles {
        match handle.join() {
            Ok(Ok(())) => info!(target: "script", "Script '{}' finished", name),
            Ok(Err(SessionError::Interrupted | SessionError::Cancelled)) => {
                info!(target: "script", "Script '{}' stopped by shutdown", name)
            }
            Ok(Err(e)) => error!(target: "script", "Script '{}' failed: {}", name, e),
            Err(_) => warn!(target: "script", "Script '{}' panicked", name),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
