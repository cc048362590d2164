//=========================================================================
// Tween Manager
//=========================================================================
//
// Time-driven scalar interpolation (fades, volume ramps).
//
// Architecture:
//   owner ──add()──> TweenManager ──update(delta)──> value(id) ──> owner
//
// The manager only advances time. Owners (music slots, the screen
// transition) read values back after `update` and remove their tween
// once it reports finished. Finished tweens hold their end value until
// removed, so an owner never misses the final step.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::time::Duration;

//=== Easing ==============================================================

/// Easing curve applied to normalized tween progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant rate.
    #[default]
    Linear,
    /// Fast start, soft landing.
    QuadOut,
    /// Soft start, fast finish.
    QuadIn,
}

impl Easing {
    /// Maps `t` in `[0, 1]` onto the curve. Input is clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadIn => t * t,
        }
    }
}

//=== Tween ===============================================================

/// A single interpolation from `from` to `to` over `duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Tween {
    /// Creates a linear tween.
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing: Easing::Linear,
        }
    }

    /// Replaces the easing curve.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Current interpolated value.
    pub fn value(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    /// True once elapsed time reaches the duration. Zero-length tweens are
    /// finished from the start.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Value the tween settles on.
    pub fn target(&self) -> f32 {
        self.to
    }

    fn advance(&mut self, delta: Duration) {
        self.elapsed = (self.elapsed + delta).min(self.duration);
    }
}

//=== TweenId =============================================================

/// Handle to a tween owned by a [`TweenManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

//=== TweenManager ========================================================

/// Owns every active tween and advances them once per frame.
#[derive(Debug, Default)]
pub struct TweenManager {
    tweens: HashMap<TweenId, Tween>,
    next_id: u64,
}

impl TweenManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tween and returns its handle.
    pub fn add(&mut self, tween: Tween) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.tweens.insert(id, tween);
        id
    }

    /// Advances every tween by `delta`.
    pub fn update(&mut self, delta: Duration) {
        for tween in self.tweens.values_mut() {
            tween.advance(delta);
        }
    }

    /// Current value of a tween, or `None` if it was removed.
    pub fn value(&self, id: TweenId) -> Option<f32> {
        self.tweens.get(&id).map(Tween::value)
    }

    /// True if the tween finished or no longer exists.
    pub fn is_finished(&self, id: TweenId) -> bool {
        self.tweens.get(&id).map_or(true, Tween::is_finished)
    }

    /// Removes a tween, returning it if it was still registered.
    pub fn remove(&mut self, id: TweenId) -> Option<Tween> {
        self.tweens.remove(&id)
    }

    /// Number of registered tweens.
    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    /// True if no tweens are registered.
    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Drops every tween.
    pub fn clear(&mut self) {
        self.tweens.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
