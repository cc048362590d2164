//=========================================================================
// Script Context
//=========================================================================
//
// The API script threads use to drive the session.
//
// Architecture:
//   fire-and-forget   set_transition, set_event_state, show/hide_picture,
//                     play/stop_music ──run()──> queue
//   round trip        call_on_render_thread, get_event_state, set_player_*,
//                     walk_player_to, set_camera_location
//                     ──call()──> queue ──result──> caller
//   multi-frame       show_choices / show_text* ──WindowStack──> frames ──result
//   local             sleep
//
// Blocking calls panic on the render thread. Every call returns
// `SessionError::Interrupted` once the session starts shutting down.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use log::debug;

//=== Internal Dependencies ===============================================

use super::promise::{Interrupt, Promise};
use super::render_queue::RenderHandle;
use crate::core::input::InputStack;
use crate::core::map::SpriteRef;
use crate::core::resources::MusicSpec;
use crate::core::window::{Justification, WindowRecord, WindowResult, WindowStack};
use crate::core::world::{CameraLocation, Rect};
use crate::core::GameState;
use crate::error::{SessionError, SessionResult};

//=== ScriptContext =======================================================

/// Script-thread handle to a running session. Cheap to clone.
#[derive(Clone)]
pub struct ScriptContext {
    render: RenderHandle,
    interrupt: Interrupt,
    windows: Arc<WindowStack>,
    input: Arc<InputStack>,
    text_geometry: Rect,
    window_open_time: Duration,
}

impl ScriptContext {
    pub(crate) fn new(
        render: RenderHandle,
        interrupt: Interrupt,
        windows: Arc<WindowStack>,
        input: Arc<InputStack>,
        text_geometry: Rect,
        window_open_time: Duration,
    ) -> Self {
        Self {
            render,
            interrupt,
            windows,
            input,
            text_geometry,
            window_open_time,
        }
    }

    /// True once the session has begun shutting down.
    pub fn is_shutting_down(&self) -> bool {
        self.interrupt.is_triggered()
    }

    //=====================================================================
    // Primitives
    //=====================================================================

    /// Queues `op` for the render thread and returns immediately.
    ///
    /// Operations queued from one thread run in queue order.
    pub fn run_on_render_thread<F>(&self, op: F) -> SessionResult<()>
    where
        F: FnOnce(&mut GameState) + Send + 'static,
    {
        self.render.run(op)
    }

    /// Queues `op`, blocks until it has run, and returns its result.
    ///
    /// # Panics
    ///
    /// Panics when called from the render thread.
    pub fn call_on_render_thread<F, R>(&self, op: F) -> SessionResult<R>
    where
        F: FnOnce(&mut GameState) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.render.call(op)
    }

    /// Blocks this script thread for `duration`.
    ///
    /// # Panics
    ///
    /// Panics when called from the render thread.
    pub fn sleep(&self, duration: Duration) -> SessionResult<()> {
        self.render.render_thread().assert_not_current("sleep");
        self.interrupt.sleep(duration)
    }

    //=====================================================================
    // Fire-and-forget mutators
    //=====================================================================

    pub fn set_transition(&self, start_alpha: f32, end_alpha: f32, duration: Duration) -> SessionResult<()> {
        self.run_on_render_thread(move |state| state.set_transition(start_alpha, end_alpha, duration))
    }

    pub fn show_picture(&self, slot: usize, name: impl Into<String>, geometry: Rect) -> SessionResult<()> {
        let name = name.into();
        self.run_on_render_thread(move |state| state.show_picture(slot, &name, geometry))
    }

    pub fn hide_picture(&self, slot: usize) -> SessionResult<()> {
        self.run_on_render_thread(move |state| state.hide_picture(slot))
    }

    pub fn play_music(&self, slot: usize, spec: MusicSpec, looping: bool, fade: Duration) -> SessionResult<()> {
        self.run_on_render_thread(move |state| state.play_music(slot, spec, looping, fade))
    }

    pub fn stop_music(&self, slot: usize, fade: Duration) -> SessionResult<()> {
        self.run_on_render_thread(move |state| state.stop_music(slot, fade))
    }

    pub fn set_event_state(&self, map: impl Into<String>, event: impl Into<String>, value: i32) -> SessionResult<()> {
        let (map, event) = (map.into(), event.into());
        self.run_on_render_thread(move |state| state.set_event_state(&map, &event, value))
    }

    //=====================================================================
    // Round trips
    //=====================================================================

    /// Changes the player's sprite; returns once the render thread has
    /// applied it.
    pub fn set_player_sprite(&self, sprite: Option<SpriteRef>) -> SessionResult<()> {
        self.call_on_render_thread(move |state| state.set_player_sprite(sprite))
    }

    /// Places the player on a tile; returns once the player is there.
    pub fn set_player_location(&self, x: i32, y: i32) -> SessionResult<()> {
        self.call_on_render_thread(move |state| state.set_player_location(x, y))
    }

    /// Starts a walk towards a tile. Returns once the walk has begun, not
    /// when it ends.
    pub fn walk_player_to(&self, x: i32, y: i32) -> SessionResult<()> {
        self.call_on_render_thread(move |state| state.walk_player_to(x, y))
    }

    /// Moves the camera and waits for the map to load.
    ///
    /// # Errors
    ///
    /// [`SessionError::MapLoad`] if the map failed to load; the session is
    /// then left with no map.
    pub fn set_camera_location(&self, location: CameraLocation) -> SessionResult<()> {
        self.call_on_render_thread(move |state| state.set_camera_location(location))?
            .map_err(SessionError::from)
    }

    pub fn get_event_state(&self, map: impl Into<String>, event: impl Into<String>) -> SessionResult<i32> {
        let (map, event) = (map.into(), event.into());
        self.call_on_render_thread(move |state| state.event_state(&map, &event))
    }

    //=====================================================================
    // Windows
    //=====================================================================

    /// Shows a choice window and blocks until a choice is made.
    ///
    /// # Panics
    ///
    /// Panics when called from the render thread.
    pub fn show_choices(
        &self,
        choices: Vec<String>,
        geometry: Rect,
        justification: Justification,
    ) -> SessionResult<usize> {
        self.show_choices_with_cancel(choices, geometry, justification, None)
    }

    /// Like [`ScriptContext::show_choices`], but Cancel picks `cancel`.
    pub fn show_choices_with_cancel(
        &self,
        choices: Vec<String>,
        geometry: Rect,
        justification: Justification,
        cancel: Option<usize>,
    ) -> SessionResult<usize> {
        self.render.render_thread().assert_not_current("show_choices");
        let (window, result) =
            WindowRecord::choices(choices, geometry, justification, cancel, self.window_open_time);

        match self.show_window(window, result)? {
            WindowResult::Selected(index) => Ok(index),
            // resolve() never lets a text result reach a choice window.
            WindowResult::Acknowledged => Err(SessionError::Cancelled),
        }
    }

    /// Shows a text window at `geometry` and blocks until it is dismissed.
    ///
    /// # Panics
    ///
    /// Panics when called from the render thread.
    pub fn show_text_with_position(&self, lines: Vec<String>, geometry: Rect) -> SessionResult<()> {
        self.render.render_thread().assert_not_current("show_text");
        let (window, result) = WindowRecord::text(lines, geometry, self.window_open_time);
        self.show_window(window, result).map(|_| ())
    }

    /// Shows a text window at the configured default position.
    pub fn show_text(&self, lines: Vec<String>) -> SessionResult<()> {
        self.show_text_with_position(lines, self.text_geometry)
    }

    /// Opens `window`, waits for its result, then removes it from both
    /// stacks whether or not the wait succeeded.
    fn show_window(&self, window: Arc<WindowRecord>, result: Promise<WindowResult>) -> SessionResult<WindowResult> {
        let id = window.id();
        self.windows.open(window, &self.input);

        let outcome = result.wait_interruptible(&self.interrupt);

        self.windows.close(id, &self.input);
        debug!(target: "script", "Window {:?} finished: {:?}", id, outcome);
        outcome
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
