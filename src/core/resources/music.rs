//=========================================================================
// Music Slots
//=========================================================================
//
// Background music channels with fade-in and fade-out.
//
// Architecture:
//   play() ──load_music()──> Loading(promise)
//            poll_loads() ──ready──> FadingIn(tween 0 → volume) ──> Playing
//   stop() ──────────────────────────> FadingOut(tween v → 0) ──> Idle (disposed)
//
// The track held by a slot is disposed before its replacement starts
// loading. A load that is superseded before it arrives becomes an orphan
// and is disposed as soon as it does arrive, so it never plays.
//
// Per frame: `poll_loads` runs before the tween manager advances and
// `update` runs right after it, so a fade that starts this frame already
// moves this frame.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::mem;
use std::time::Duration;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{AudioTrack, Disposable, MusicSpec, ResourceBackend, ResourceSlot};
use crate::core::bridge::{Promise, PromiseState};
use crate::core::tween::{Tween, TweenId, TweenManager};

//=== Music ===============================================================

/// A playing track and the spec it was started from.
pub struct Music {
    spec: MusicSpec,
    track: Box<dyn AudioTrack>,
}

impl Music {
    pub fn spec(&self) -> &MusicSpec {
        &self.spec
    }
}

impl Disposable for Music {
    fn dispose(&mut self) {
        self.track.stop();
        self.track.dispose();
    }
}

//=== MusicState ==========================================================

/// Observable phase of a music slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicState {
    Idle,
    Loading,
    FadingIn,
    Playing,
    FadingOut,
}

//=== Slot internals ======================================================

type PendingTrack = Promise<Box<dyn AudioTrack>>;

enum Phase {
    Idle,
    Loading {
        pending: PendingTrack,
        spec: MusicSpec,
        looping: bool,
        fade: Duration,
    },
    FadingIn(TweenId),
    Playing,
    FadingOut(TweenId),
}

struct MusicSlot {
    music: ResourceSlot<Music>,
    phase: Phase,
    volume: f32,
}

impl MusicSlot {
    fn new() -> Self {
        Self {
            music: ResourceSlot::new("music"),
            phase: Phase::Idle,
            volume: 0.0,
        }
    }

    /// Drops the current track and any in-flight work. Pending loads move
    /// to `orphans`.
    fn release(&mut self, tweens: &mut TweenManager, orphans: &mut Vec<PendingTrack>) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading { pending, .. } => orphans.push(pending),
            Phase::FadingIn(id) | Phase::FadingOut(id) => {
                tweens.remove(id);
            }
            Phase::Idle | Phase::Playing => {}
        }
        self.music.clear();
        self.volume = 0.0;
    }

    fn apply_volume(&mut self, tweens: &TweenManager, id: TweenId) {
        if let Some(volume) = tweens.value(id) {
            self.volume = volume;
            if let Some(music) = self.music.get_mut() {
                music.track.set_volume(volume);
            }
        }
    }

    fn state(&self) -> MusicState {
        match self.phase {
            Phase::Idle => MusicState::Idle,
            Phase::Loading { .. } => MusicState::Loading,
            Phase::FadingIn(_) => MusicState::FadingIn,
            Phase::Playing => MusicState::Playing,
            Phase::FadingOut(_) => MusicState::FadingOut,
        }
    }
}

//=== MusicSlots ==========================================================

pub struct MusicSlots {
    slots: Vec<MusicSlot>,
    orphans: Vec<PendingTrack>,
}

impl MusicSlots {
    /// Number of independent music channels.
    pub const CHANNELS: usize = 8;

    pub fn new() -> Self {
        Self {
            slots: (0..Self::CHANNELS).map(|_| MusicSlot::new()).collect(),
            orphans: Vec::new(),
        }
    }

    //--- Commands ---------------------------------------------------------

    /// Replaces whatever `slot` plays with `spec`, fading in over `fade`
    /// once the track has loaded. Returns `false` if `slot` is out of range.
    pub fn play(
        &mut self,
        slot: usize,
        spec: MusicSpec,
        looping: bool,
        fade: Duration,
        backend: &mut dyn ResourceBackend,
        tweens: &mut TweenManager,
    ) -> bool {
        let Some(target) = self.slots.get_mut(slot) else {
            warn!(target: "render", "play_music: slot {} out of range (0..{})", slot, Self::CHANNELS);
            return false;
        };

        target.release(tweens, &mut self.orphans);
        debug!(target: "render", "Music slot {} loading '{}'", slot, spec.name);
        target.phase = Phase::Loading {
            pending: backend.load_music(&spec),
            spec,
            looping,
            fade,
        };
        true
    }

    /// Stops `slot`, fading out over `fade`. A zero fade disposes the
    /// track immediately. Returns `false` if `slot` is out of range.
    pub fn stop(&mut self, slot: usize, fade: Duration, tweens: &mut TweenManager) -> bool {
        let Some(target) = self.slots.get_mut(slot) else {
            warn!(target: "render", "stop_music: slot {} out of range (0..{})", slot, Self::CHANNELS);
            return false;
        };

        match mem::replace(&mut target.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Loading { pending, .. } => self.orphans.push(pending),
            Phase::FadingIn(id) | Phase::FadingOut(id) => {
                tweens.remove(id);
                Self::begin_fade_out(target, fade, tweens);
            }
            Phase::Playing => Self::begin_fade_out(target, fade, tweens),
        }
        true
    }

    fn begin_fade_out(target: &mut MusicSlot, fade: Duration, tweens: &mut TweenManager) {
        if fade.is_zero() {
            target.music.clear();
            target.volume = 0.0;
            return;
        }
        let id = tweens.add(Tween::new(target.volume, 0.0, fade));
        target.phase = Phase::FadingOut(id);
    }

    //--- Frame steps ------------------------------------------------------

    /// Starts tracks whose loads completed and disposes orphaned ones.
    ///
    /// Runs before the tween manager advances.
    pub fn poll_loads(&mut self, tweens: &mut TweenManager) {
        self.reap_orphans();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let polled = match &mut slot.phase {
                Phase::Loading { pending, .. } => pending.poll(),
                _ => continue,
            };

            match polled {
                PromiseState::Pending => {}
                PromiseState::Cancelled => {
                    warn!(target: "render", "Music slot {}: load was abandoned by the backend", index);
                    slot.phase = Phase::Idle;
                }
                PromiseState::Ready(mut track) => {
                    if let Phase::Loading { spec, looping, fade, .. } =
                        mem::replace(&mut slot.phase, Phase::Idle)
                    {
                        track.set_volume(0.0);
                        track.play(looping);
                        let fade_in = tweens.add(Tween::new(0.0, spec.volume, fade));
                        debug!(target: "render", "Music slot {} playing '{}'", index, spec.name);
                        slot.volume = 0.0;
                        slot.music.set(Some(Music { spec, track }));
                        slot.phase = Phase::FadingIn(fade_in);
                    }
                }
            }
        }
    }

    /// Applies fade volumes and settles finished fades.
    ///
    /// Runs right after the tween manager advances.
    pub fn update(&mut self, tweens: &mut TweenManager) {
        for slot in &mut self.slots {
            match slot.phase {
                Phase::FadingIn(id) => {
                    slot.apply_volume(tweens, id);
                    if tweens.is_finished(id) {
                        tweens.remove(id);
                        slot.phase = Phase::Playing;
                    }
                }
                Phase::FadingOut(id) => {
                    slot.apply_volume(tweens, id);
                    if tweens.is_finished(id) {
                        tweens.remove(id);
                        slot.music.clear();
                        slot.volume = 0.0;
                        slot.phase = Phase::Idle;
                    }
                }
                Phase::Idle | Phase::Loading { .. } | Phase::Playing => {}
            }
        }
    }

    fn reap_orphans(&mut self) {
        self.orphans.retain_mut(|pending| match pending.poll() {
            PromiseState::Pending => true,
            PromiseState::Ready(mut track) => {
                track.stop();
                track.dispose();
                false
            }
            PromiseState::Cancelled => false,
        });
    }

    /// Disposes every track. Loads still in flight are abandoned; the
    /// backend disposes them when they complete.
    pub fn shutdown(&mut self, tweens: &mut TweenManager) {
        let mut orphans = mem::take(&mut self.orphans);
        for slot in &mut self.slots {
            slot.release(tweens, &mut orphans);
        }
        self.orphans = orphans;
        self.reap_orphans();
        self.orphans.clear();
    }

    //--- Queries ----------------------------------------------------------

    pub fn state(&self, slot: usize) -> Option<MusicState> {
        self.slots.get(slot).map(MusicSlot::state)
    }

    /// Current volume of `slot`.
    pub fn volume(&self, slot: usize) -> Option<f32> {
        self.slots.get(slot).map(|s| s.volume)
    }

    /// Spec of the track currently held by `slot`.
    pub fn current(&self, slot: usize) -> Option<&MusicSpec> {
        self.slots
            .get(slot)
            .and_then(|s| s.music.get())
            .map(Music::spec)
    }

    /// Superseded loads still waiting to be disposed.
    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }
}

impl Default for MusicSlots {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{ledger, FakeBackend};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// One frame of the music pipeline.
    fn frame(music: &mut MusicSlots, tweens: &mut TweenManager, delta: Duration) {
        music.poll_loads(tweens);
        tweens.update(delta);
        music.update(tweens);
    }

    #[test]
    fn fade_in_starts_silent_and_reaches_target() {
        let ledger = ledger();
        let mut backend = FakeBackend::new(&ledger);
        let mut tweens = TweenManager::new();
        let mut music = MusicSlots::new();

        music.play(0, MusicSpec::new("town", 0.8), true, ms(400), &mut backend, &mut tweens);
        assert_eq!(music.state(0), Some(MusicState::Loading));

        frame(&mut music, &mut tweens, ms(100));
        assert_eq!(music.state(0), Some(MusicState::FadingIn));
        let early = music.volume(0).unwrap();
        assert!(early > 0.0 && early < 0.8, "volume after 100ms was {}", early);

        for _ in 0..3 {
            frame(&mut music, &mut tweens, ms(100));
        }
        assert_eq!(music.state(0), Some(MusicState::Playing));
        assert_eq!(music.volume(0), Some(0.8));

        let log = ledger.lock();
        let volumes = &log.volumes["town"];
        assert_eq!(volumes.first(), Some(&0.0));
        assert_eq!(volumes.last(), Some(&0.8));
        assert_eq!(log.playing, vec!["town"]);
        drop(log);

        music.shutdown(&mut tweens);
        assert!(tweens.is_empty());
    }

    #[test]
    fn replacement_disposes_old_track_before_loading_new_one() {
        let ledger = ledger();
        let mut backend = FakeBackend::new(&ledger);
        let mut tweens = TweenManager::new();
        let mut music = MusicSlots::new();

        music.play(2, MusicSpec::new("old", 1.0), true, Duration::ZERO, &mut backend, &mut tweens);
        frame(&mut music, &mut tweens, ms(16));
        assert_eq!(music.state(2), Some(MusicState::Playing));

        music.play(2, MusicSpec::new("new", 1.0), true, Duration::ZERO, &mut backend, &mut tweens);
        {
            let log = ledger.lock();
            assert_eq!(log.tracks_disposed, vec!["old"]);
            assert_eq!(log.events, vec!["track:old", "dispose-track:old", "track:new"]);
        }

        frame(&mut music, &mut tweens, ms(16));
        assert_eq!(music.current(2).map(|s| s.name.as_str()), Some("new"));

        music.shutdown(&mut tweens);
        assert_eq!(ledger.lock().tracks_disposed, vec!["old", "new"]);
    }

    #[test]
    fn superseded_load_is_disposed_on_arrival_and_never_plays() {
        let ledger = ledger();
        let mut backend = FakeBackend::new(&ledger).deferring_music();
        let mut tweens = TweenManager::new();
        let mut music = MusicSlots::new();

        music.play(0, MusicSpec::new("slow", 1.0), true, ms(100), &mut backend, &mut tweens);
        music.play(0, MusicSpec::new("fast", 1.0), true, ms(100), &mut backend, &mut tweens);
        assert_eq!(music.orphan_count(), 1);

        ledger.complete_music("slow");
        ledger.complete_music("fast");
        frame(&mut music, &mut tweens, ms(16));

        let log = ledger.lock();
        assert_eq!(log.tracks_disposed, vec!["slow"]);
        assert_eq!(log.playing, vec!["fast"]);
        drop(log);
        assert_eq!(music.orphan_count(), 0);

        music.shutdown(&mut tweens);
    }

    #[test]
    fn stop_fades_out_then_disposes() {
        let ledger = ledger();
        let mut backend = FakeBackend::new(&ledger);
        let mut tweens = TweenManager::new();
        let mut music = MusicSlots::new();

        music.play(1, MusicSpec::new("cave", 0.5), false, Duration::ZERO, &mut backend, &mut tweens);
        frame(&mut music, &mut tweens, ms(16));

        music.stop(1, ms(200), &mut tweens);
        assert_eq!(music.state(1), Some(MusicState::FadingOut));
        frame(&mut music, &mut tweens, ms(100));
        assert!(ledger.lock().tracks_disposed.is_empty());

        frame(&mut music, &mut tweens, ms(100));
        assert_eq!(music.state(1), Some(MusicState::Idle));
        assert_eq!(ledger.lock().tracks_disposed, vec!["cave"]);
        assert!(tweens.is_empty());
    }

    #[test]
    fn stop_without_fade_disposes_immediately() {
        let ledger = ledger();
        let mut backend = FakeBackend::new(&ledger);
        let mut tweens = TweenManager::new();
        let mut music = MusicSlots::new();

        music.play(0, MusicSpec::new("boss", 1.0), true, ms(500), &mut backend, &mut tweens);
        frame(&mut music, &mut tweens, ms(16));
        music.stop(0, Duration::ZERO, &mut tweens);

        assert_eq!(music.state(0), Some(MusicState::Idle));
        assert_eq!(ledger.lock().tracks_disposed, vec!["boss"]);
        assert!(tweens.is_empty());
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let ledger = ledger();
        let mut backend = FakeBackend::new(&ledger);
        let mut tweens = TweenManager::new();
        let mut music = MusicSlots::new();

        assert!(!music.play(MusicSlots::CHANNELS, MusicSpec::new("x", 1.0), true, ms(1), &mut backend, &mut tweens));
        assert!(!music.stop(99, ms(1), &mut tweens));
        assert!(ledger.lock().tracks_loaded.is_empty());
    }
}
