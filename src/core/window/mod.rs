//=========================================================================
// Windows
//
// Text and choice windows opened by blocking script calls.
//
// Lifecycle:
//   Opening ──openness reaches 1──> Active ──confirm / resolve()──> Closing
//   Closing ──openness reaches 0──> Closed (result delivered)
//
// A window's result is delivered exactly once, when its closing animation
// finishes. The script thread that opened the window waits on the paired
// promise and removes the window from both stacks afterwards, so a Closed
// window stays on both stacks until that thread resumes. It holds no
// focus and takes no input meanwhile.
//
// Focus: an Opening or Active window holds focus. Input reaching an
// Opening window is dropped rather than passed to the window below.
//
// Records are shared between the render thread (animation, input) and the
// opening script thread, so mutable state lives behind a mutex.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod window_stack;

//=== Re-exports ==========================================================

pub use window_stack::WindowStack;

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use crate::core::bridge::{promise, Completer, Promise};
use crate::core::input::{InputReceiver, ReceiverId, UiAction, UiInput};
use crate::core::world::Rect;

//=== Types ===============================================================

/// Windows are identified by their input-stack identity.
pub type WindowId = ReceiverId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Opening,
    Active,
    Closing,
    Closed,
}

/// Horizontal alignment of choice labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowContent {
    Text {
        lines: Vec<String>,
    },
    Choices {
        choices: Vec<String>,
        justification: Justification,
        /// Choice returned when the player cancels. `None` disables cancel.
        cancel: Option<usize>,
    },
}

/// What a closed window hands back to its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowResult {
    /// A text window was dismissed.
    Acknowledged,
    /// A choice window closed on this index.
    Selected(usize),
}

//=== WindowRecord ========================================================

struct WindowInner {
    phase: WindowPhase,
    openness: f32,
    cursor: usize,
    pending: Option<WindowResult>,
    completer: Option<Completer<WindowResult>>,
}

pub struct WindowRecord {
    id: WindowId,
    content: WindowContent,
    geometry: Rect,
    /// Duration of the open and close animations.
    open_time: Duration,
    inner: Mutex<WindowInner>,
}

impl WindowRecord {
    /// A text window and the promise of its dismissal.
    pub fn text(lines: Vec<String>, geometry: Rect, open_time: Duration) -> (Arc<Self>, Promise<WindowResult>) {
        Self::build(WindowContent::Text { lines }, geometry, open_time)
    }

    /// A choice window and the promise of the chosen index.
    pub fn choices(
        choices: Vec<String>,
        geometry: Rect,
        justification: Justification,
        cancel: Option<usize>,
        open_time: Duration,
    ) -> (Arc<Self>, Promise<WindowResult>) {
        let cancel = cancel.filter(|&i| i < choices.len());
        Self::build(
            WindowContent::Choices {
                choices,
                justification,
                cancel,
            },
            geometry,
            open_time,
        )
    }

    fn build(content: WindowContent, geometry: Rect, open_time: Duration) -> (Arc<Self>, Promise<WindowResult>) {
        let (completer, result) = promise();
        let record = Arc::new(Self {
            id: ReceiverId::next(),
            content,
            geometry,
            open_time,
            inner: Mutex::new(WindowInner {
                phase: WindowPhase::Opening,
                openness: 0.0,
                cursor: 0,
                pending: None,
                completer: Some(completer),
            }),
        });
        (record, result)
    }

    //--- Queries ----------------------------------------------------------

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn content(&self) -> &WindowContent {
        &self.content
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn phase(&self) -> WindowPhase {
        self.inner.lock().phase
    }

    /// Open fraction in `[0, 1]`, for drawing.
    pub fn openness(&self) -> f32 {
        self.inner.lock().openness
    }

    /// Highlighted choice.
    pub fn cursor(&self) -> usize {
        self.inner.lock().cursor
    }

    /// True while the window holds focus (opening or active).
    pub fn is_interactive(&self) -> bool {
        matches!(self.phase(), WindowPhase::Opening | WindowPhase::Active)
    }

    //--- Commands ---------------------------------------------------------

    /// Closes the window with `result`, as if the player had picked it.
    ///
    /// Accepted only while opening or active, and only for a result that
    /// fits the content: `Acknowledged` for text, an in-range
    /// `Selected` for choices.
    pub fn resolve(&self, result: WindowResult) -> bool {
        let fits = match (&self.content, result) {
            (WindowContent::Text { .. }, WindowResult::Acknowledged) => true,
            (WindowContent::Choices { choices, .. }, WindowResult::Selected(i)) => i < choices.len(),
            _ => false,
        };
        if !fits {
            return false;
        }

        let mut inner = self.inner.lock();
        if !matches!(inner.phase, WindowPhase::Opening | WindowPhase::Active) {
            return false;
        }
        inner.pending = Some(result);
        inner.phase = WindowPhase::Closing;
        debug!(target: "render", "Window {:?} closing with {:?}", self.id, result);
        true
    }

    /// Advances the open or close animation. Delivers the result when the
    /// close finishes.
    pub fn animate(&self, delta: Duration) {
        let mut inner = self.inner.lock();
        let step = if self.open_time.is_zero() {
            1.0
        } else {
            delta.as_secs_f32() / self.open_time.as_secs_f32()
        };

        match inner.phase {
            WindowPhase::Opening => {
                inner.openness = (inner.openness + step).min(1.0);
                if inner.openness >= 1.0 {
                    inner.phase = WindowPhase::Active;
                }
            }
            WindowPhase::Closing => {
                inner.openness = (inner.openness - step).max(0.0);
                if inner.openness <= 0.0 {
                    inner.phase = WindowPhase::Closed;
                    if let (Some(completer), Some(result)) = (inner.completer.take(), inner.pending.take()) {
                        // The script may already have given up waiting.
                        let _ = completer.complete(result);
                    }
                }
            }
            WindowPhase::Active | WindowPhase::Closed => {}
        }
    }

    fn handle_choice_input(&self, input: &UiInput, count: usize, cancel: Option<usize>) {
        if count == 0 {
            return;
        }

        let confirmed = {
            let mut inner = self.inner.lock();
            if input.pressed(UiAction::Up) {
                inner.cursor = (inner.cursor + count - 1) % count;
            }
            if input.pressed(UiAction::Down) {
                inner.cursor = (inner.cursor + 1) % count;
            }
            inner.cursor
        };

        if input.pressed(UiAction::Confirm) {
            self.resolve(WindowResult::Selected(confirmed));
        } else if let (true, Some(index)) = (input.pressed(UiAction::Cancel), cancel) {
            self.resolve(WindowResult::Selected(index));
        }
    }
}

impl InputReceiver for WindowRecord {
    fn receiver_id(&self) -> ReceiverId {
        self.id
    }

    fn holds_focus(&self) -> bool {
        self.is_interactive()
    }

    fn accepts_input(&self) -> bool {
        self.phase() == WindowPhase::Active
    }

    fn handle_input(&self, input: &UiInput) {
        match &self.content {
            WindowContent::Text { .. } => {
                if input.pressed(UiAction::Confirm) {
                    self.resolve(WindowResult::Acknowledged);
                }
            }
            WindowContent::Choices { choices, cancel, .. } => {
                self.handle_choice_input(input, choices.len(), *cancel);
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
