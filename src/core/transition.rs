//=========================================================================
// Screen Transition
//=========================================================================
//
// Full-screen alpha fade driven by a tween.
//
// At most one transition runs at a time. Starting a new one cancels the
// running tween. Once the tween finishes the transition is cleared and
// the screen keeps the end alpha.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== Internal Dependencies ===============================================

use crate::core::tween::{Tween, TweenId, TweenManager};

//=== Transition ==========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    start_alpha: f32,
    end_alpha: f32,
    duration: Duration,
    tween: TweenId,
}

impl Transition {
    /// Registers the fade tween and returns the running transition.
    pub fn start(tweens: &mut TweenManager, start_alpha: f32, end_alpha: f32, duration: Duration) -> Self {
        let start_alpha = start_alpha.clamp(0.0, 1.0);
        let end_alpha = end_alpha.clamp(0.0, 1.0);
        Self {
            start_alpha,
            end_alpha,
            duration,
            tween: tweens.add(Tween::new(start_alpha, end_alpha, duration)),
        }
    }

    pub fn start_alpha(&self) -> f32 {
        self.start_alpha
    }

    pub fn end_alpha(&self) -> f32 {
        self.end_alpha
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Current overlay alpha.
    pub fn alpha(&self, tweens: &TweenManager) -> f32 {
        tweens.value(self.tween).unwrap_or(self.end_alpha)
    }

    pub fn is_done(&self, tweens: &TweenManager) -> bool {
        tweens.is_finished(self.tween)
    }

    /// Removes the tween.
    pub fn cancel(self, tweens: &mut TweenManager) {
        tweens.remove(self.tween);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
