//=========================================================================
// Platform Subsystem
//
// Runs the winit event loop on the render thread and drives the
// coordinator one frame per redraw.
//
// Architecture:
// ```text
//  Render (main) Thread:
//  ┌──────────────────────────────────────┐
//  │  Winit Event Loop                    │
//  │   ↓                                  │
//  │  InputProcessor                      │
//  │   ├─ Converts Winit keys             │
//  │   └─ Tracks modifiers                │
//  │   ↓                                  │
//  │  InputBuffer                         │
//  │   ↓                                  │
//  │  RedrawRequested (frame boundary)    │
//  │   ├─ push_input(buffered events)     │
//  │   ├─ GameCoordinator::frame(dt)      │  ← script ops drained here
//  │   └─ FrameRenderer::render(state)    │
//  │   ↓                                  │
//  │  about_to_wait: pace to target fps   │
//  └──────────────────────────────────────┘
// ```
//
// The coordinator lives inside the platform for the whole loop, so
// every state mutation happens on this thread. Script threads only
// reach it through the operation queue.
//
// Responsibilities:
// - Create and manage the OS window
// - Convert Winit types → engine InputEvents
// - Buffer input until the frame boundary
// - Step the coordinator and hand the result to the renderer
// - Shut the session down when the window closes
//
//=========================================================================

//=== Submodules ==========================================================

mod frame_clock;
mod input_buffer;
mod input_processor;

//=== External Crates =====================================================

use std::time::{Duration, Instant};

use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

//=== Internal Imports ====================================================

use crate::core::{GameCoordinator, GameState};
use crate::error::PlatformError;
use frame_clock::FrameClock;
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== FrameRenderer =======================================================

/// Draws the session after each frame.
///
/// Implementations only read `GameState`; everything they need (map,
/// entities, pictures, windows, screen alpha) is exposed through its
/// accessors. Called on the render thread.
pub trait FrameRenderer {
    /// Called once the OS window exists, and again after a mobile resume.
    fn resumed(&mut self, _window: &Window) {}

    /// Draws one frame.
    fn render(&mut self, state: &GameState);
}

//=== Platform ============================================================

/// Window owner and frame driver.
///
/// Not `Send`: it must stay on the thread that runs the event loop,
/// which is also the coordinator's render thread.
pub(crate) struct Platform<R: FrameRenderer> {
    /// OS window handle (None until `resumed()` called).
    window: Option<Window>,

    coordinator: GameCoordinator,
    renderer: R,

    buffer: InputBuffer,
    input_processor: InputProcessor,

    clock: FrameClock,
    frame_budget: Duration,
    next_frame: Instant,
}

impl<R: FrameRenderer> Platform<R> {
    //--- Construction -----------------------------------------------------

    /// Does not create the window yet; that happens lazily in `resumed()`.
    pub(crate) fn new(coordinator: GameCoordinator, renderer: R) -> Self {
        let frame_budget = coordinator.config().frame_budget();
        info!(target: "platform", "Platform initialized (frame budget {:?})", frame_budget);

        Self {
            window: None,
            coordinator,
            renderer,
            buffer: InputBuffer::new(),
            input_processor: InputProcessor::new(),
            clock: FrameClock::new(),
            frame_budget,
            next_frame: Instant::now(),
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the event loop until the window closes.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop cannot be created or
    /// fails while running.
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS Winit requirement).
    pub(crate) fn run(&mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;

        event_loop
            .run_app(self)
            .map_err(PlatformError::EventLoopExecution)
    }

    /// Gives the coordinator back after the loop has exited.
    pub(crate) fn into_coordinator(self) -> GameCoordinator {
        self.coordinator
    }

    //--- Frame ------------------------------------------------------------

    /// One frame: buffered input, coordinator step, render.
    fn step(&mut self, delta: Duration) {
        let events = self.buffer.drain();
        if !events.is_empty() {
            trace!(target: "platform::input", "Flushing {} input events", events.len());
            self.coordinator.push_input(&events);
        }

        let executed = self.coordinator.frame(delta);
        if executed > 0 {
            trace!(target: "platform", "Frame ran {} script operations", executed);
        }

        self.renderer.render(self.coordinator.state());
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        self.coordinator.shutdown();
        event_loop.exit();
    }

    //--- Test Accessors ---------------------------------------------------

    #[cfg(test)]
    pub(crate) fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }
}

//=== Winit Integration ===================================================

impl<R: FrameRenderer> ApplicationHandler for Platform<R> {
    /// Creates the window if it doesn't exist yet. On mobile, this may be
    /// called multiple times (suspend/resume cycle).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            self.renderer.resumed(window);
            return;
        }

        let config = self.coordinator.config();
        let attrs = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                self.renderer.resumed(&window);
                window.request_redraw();
                self.window = Some(window);
                self.clock.reset();
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.close(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.close(event_loop);
            }

            WindowEvent::ModifiersChanged(state) => {
                trace!(target: "platform::input", "Modifiers changed: {:?}", state);
                self.input_processor.update_modifiers(state.state());
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if let Some(event) = self.input_processor.process_key_event(key_event) {
                    self.buffer.push(event);
                } else {
                    trace!(target: "platform::input", "Unmapped key ignored");
                }
            }

            WindowEvent::RedrawRequested => {
                if self.coordinator.is_shut_down() {
                    return;
                }
                let delta = self.clock.tick();
                trace!(target: "platform", "Frame {} (dt {:?})", self.clock.frame_index(), delta);
                self.step(delta);
                self.next_frame = self.clock.last_tick() + self.frame_budget;
            }

            _ => {}
        }
    }

    /// Paces redraws to the configured frame budget.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };

        if Instant::now() >= self.next_frame {
            window.request_redraw();
            event_loop.set_control_flow(ControlFlow::Wait);
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
