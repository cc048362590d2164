//=========================================================================
// Core
//
// Render-thread session state and the coordinator that drives it.
//
// Responsibilities:
// - Own the `GameState` and the render end of the operation queue
// - Run one frame: drain queued script operations, then update
// - Hand out `ScriptContext`s to script threads
// - Shut down: interrupt scripts, drop queued work, dispose resources
//
// Notes:
// The coordinator is created and owned explicitly by whoever runs the
// render loop (normally `Engine`). There is no global instance.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod bridge;
pub mod entity;
pub mod game_state;
pub mod input;
pub mod map;
pub mod resources;
pub mod transition;
pub mod tween;
pub mod window;
pub mod world;

//=== Re-exports ==========================================================

pub use game_state::GameState;

//=== External Dependencies ===============================================

use std::time::Duration;

use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::config::SessionConfig;
use bridge::{interrupt, Interrupt, InterruptTrigger, RenderQueue, ScriptContext};
use input::InputEvent;
use resources::ResourceBackend;

//=== GameCoordinator =====================================================

pub struct GameCoordinator {
    state: GameState,
    queue: RenderQueue,
    trigger: InterruptTrigger,
    interrupt: Interrupt,
    config: SessionConfig,
}

impl GameCoordinator {
    pub fn new(config: SessionConfig, backend: Box<dyn ResourceBackend>) -> Self {
        let (trigger, interrupt) = interrupt();
        Self {
            state: GameState::new(&config, backend),
            queue: RenderQueue::new(interrupt.clone()),
            trigger,
            interrupt,
            config,
        }
    }

    /// A handle for a new script thread.
    pub fn script_context(&self) -> ScriptContext {
        ScriptContext::new(
            self.queue.handle(),
            self.interrupt.clone(),
            self.state.windows().clone(),
            self.state.input_stack().clone(),
            self.config.text_window,
            self.config.window_open_time(),
        )
    }

    /// Feeds platform input to the next frame.
    pub fn push_input(&mut self, events: &[InputEvent]) {
        self.state.process_input(events);
    }

    /// Runs one frame: queued operations first, in FIFO order, then the
    /// update pipeline.
    ///
    /// The first call binds the render thread; later calls must come from
    /// the same thread. Returns the number of operations executed.
    ///
    /// # Panics
    ///
    /// Panics when called from a thread other than the first caller.
    pub fn frame(&mut self, delta: Duration) -> usize {
        if self.is_shut_down() {
            warn!(target: "render", "frame() after shutdown ignored");
            return 0;
        }

        self.queue.render_thread().bind_current();
        let executed = self.queue.drain(&mut self.state);
        self.state.update(delta);
        executed
    }

    /// Ends the session.
    ///
    /// Blocked scripts return `SessionError::Interrupted`, queued
    /// operations are dropped, and every resource is disposed. Safe to
    /// call more than once.
    pub fn shutdown(&mut self) {
        if self.is_shut_down() {
            return;
        }

        self.trigger.fire();
        let dropped = self.queue.cancel_pending();
        if dropped > 0 {
            warn!(target: "render", "Dropped {} queued operations at shutdown", dropped);
        }
        self.state.shutdown();
        info!(target: "render", "Session shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.trigger.is_fired()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for the render thread.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Operations waiting for the next frame.
    pub fn pending_operations(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::core::resources::MusicSpec;
    use crate::error::{SessionError, SessionResult};
    use crate::core::test_support::{pump_until, test_coordinator, FRAME};
    use crate::core::world::{CameraLocation, Rect};

    #[test]
    fn operations_from_one_script_run_in_order() {
        let (mut coordinator, _ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let script = thread::spawn(move || {
            for i in 0..100 {
                let sink = Arc::clone(&sink);
                ctx.run_on_render_thread(move |_| sink.lock().push(i)).unwrap();
            }
        });
        script.join().unwrap();
        coordinator.frame(FRAME);

        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
        coordinator.shutdown();
    }

    #[test]
    fn queued_work_runs_before_update() {
        let (mut coordinator, _ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        ctx.set_transition(0.0, 1.0, Duration::from_millis(16)).unwrap();
        assert_eq!(coordinator.pending_operations(), 1);

        assert_eq!(coordinator.frame(FRAME), 1);
        // The fade was queued and advanced in the same frame.
        assert_eq!(coordinator.state().screen_alpha(), 1.0);
        assert!(coordinator.state().transition().is_none());
    }

    #[test]
    fn music_replacement_through_script_api() {
        let (mut coordinator, ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        ctx.play_music(0, MusicSpec::new("first", 1.0), true, Duration::ZERO).unwrap();
        coordinator.frame(FRAME);
        ctx.play_music(0, MusicSpec::new("second", 0.5), true, Duration::from_millis(32)).unwrap();
        coordinator.frame(FRAME);

        {
            let log = ledger.lock();
            assert_eq!(log.tracks_disposed, vec!["first"]);
            let dispose_first = log.events.iter().position(|e| e == "dispose-track:first");
            let load_second = log.events.iter().position(|e| e == "track:second");
            assert!(dispose_first < load_second);
            assert_eq!(log.volumes["second"].first(), Some(&0.0));
        }

        coordinator.frame(FRAME);
        assert_eq!(coordinator.state().music().volume(0), Some(0.5));
        coordinator.shutdown();
    }

    #[test]
    fn shutdown_disposes_each_resource_once_and_drops_queue() {
        let (mut coordinator, ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        ctx.show_picture(0, "a", Rect::default()).unwrap();
        ctx.show_picture(0, "b", Rect::default()).unwrap();
        ctx.show_picture(3, "c", Rect::default()).unwrap();
        coordinator.frame(FRAME);
        coordinator.state_mut().set_camera_location(CameraLocation::new("town", 1, 1)).unwrap();

        ctx.hide_picture(3).unwrap();
        coordinator.shutdown();
        coordinator.shutdown();

        let log = ledger.lock();
        assert_eq!(log.textures_loaded.len(), 3);
        assert_eq!(log.textures_disposed.len(), 3);
        assert_eq!(log.maps_disposed, vec!["town"]);
        assert!(coordinator.is_shut_down());
        assert_eq!(coordinator.pending_operations(), 0);
    }

    #[test]
    fn fire_and_forget_fails_after_shutdown() {
        let (mut coordinator, _ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        coordinator.shutdown();

        assert!(ctx.is_shutting_down());
        for _ in 0..10_000 {
            assert!(matches!(ctx.hide_picture(0), Err(SessionError::Interrupted)));
        }
        assert!(matches!(
            ctx.run_on_render_thread(|_| {}),
            Err(SessionError::Interrupted)
        ));
        assert_eq!(coordinator.pending_operations(), 0);
        assert_eq!(coordinator.frame(FRAME), 0);
    }

    #[test]
    fn looping_script_stops_at_shutdown() {
        let (mut coordinator, _ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let script = thread::spawn(move || -> SessionResult<()> {
            loop {
                let counter = Arc::clone(&counter);
                ctx.run_on_render_thread(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })?;
                thread::yield_now();
            }
        });

        pump_until(&mut coordinator, || ran.load(Ordering::SeqCst) > 0);
        coordinator.shutdown();

        assert!(matches!(script.join().unwrap(), Err(SessionError::Interrupted)));
    }

    #[test]
    fn script_drives_a_full_scene() {
        let (mut coordinator, ledger) = test_coordinator();
        let ctx = coordinator.script_context();
        let script = thread::spawn(move || -> crate::error::SessionResult<usize> {
            ctx.set_camera_location(CameraLocation::new("town", 2, 2))?;
            ctx.set_player_location(2, 2)?;
            ctx.set_transition(1.0, 0.0, Duration::from_millis(50))?;
            ctx.show_text(vec!["Welcome.".into()])?;
            let answer = ctx.show_choices_with_cancel(
                vec!["Open".into(), "Leave".into()],
                Rect::default(),
                crate::core::window::Justification::Center,
                Some(1),
            )?;
            ctx.set_event_state("town", "door", 1)?;
            Ok(answer)
        });

        let windows = Arc::clone(coordinator.state().windows());
        for expected in [
            crate::core::window::WindowResult::Acknowledged,
            crate::core::window::WindowResult::Selected(0),
        ] {
            pump_until(&mut coordinator, || {
                windows.top().is_some_and(|w| w.resolve(expected))
            });
        }
        pump_until(&mut coordinator, || script.is_finished());
        coordinator.frame(FRAME);

        assert_eq!(script.join().unwrap().unwrap(), 0);
        let door = coordinator.state().entities().npc("door").unwrap();
        assert_eq!(door.visual_refreshes(), 1);
        assert_eq!(coordinator.state().screen_alpha(), 0.0);
        assert!(windows.is_empty());

        coordinator.shutdown();
        assert_eq!(ledger.lock().maps_disposed, vec!["town"]);
    }
}

//=========================================================================
// Test Support
//=========================================================================

#[cfg(test)]
pub(crate) mod test_support {
    //! Fake backend that records every load and disposal.

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use parking_lot::{Mutex, MutexGuard};

    use super::resources::{AudioTrack, Disposable, MusicSpec, ResourceBackend, Texture};
    use super::bridge::{promise, Completer, Promise};
    use super::map::{EventDefinition, EventPage, MapBundle, MapData, SpriteRef};
    use super::{GameCoordinator, GameState};
    use crate::config::SessionConfig;
    use crate::error::MapLoadError;

    /// One 60 Hz frame.
    pub const FRAME: Duration = Duration::from_millis(16);

    //--- Ledger -----------------------------------------------------------

    #[derive(Default)]
    pub struct LedgerLog {
        pub textures_loaded: Vec<String>,
        pub textures_disposed: Vec<String>,
        pub tracks_loaded: Vec<String>,
        pub tracks_disposed: Vec<String>,
        pub maps_loaded: Vec<String>,
        pub maps_disposed: Vec<String>,
        /// Tracks that started playing, in order.
        pub playing: Vec<String>,
        /// Every volume each track was set to.
        pub volumes: HashMap<String, Vec<f32>>,
        /// Loads and disposals of every kind, in order.
        pub events: Vec<String>,
        deferred: Vec<(String, Completer<Box<dyn AudioTrack>>)>,
    }

    #[derive(Clone, Default)]
    pub struct Ledger(Arc<Mutex<LedgerLog>>);

    impl Ledger {
        pub fn lock(&self) -> MutexGuard<'_, LedgerLog> {
            self.0.lock()
        }

        /// Completes a deferred music load.
        pub fn complete_music(&self, name: &str) {
            let completer = {
                let mut log = self.lock();
                let index = log
                    .deferred
                    .iter()
                    .position(|(n, _)| n == name)
                    .unwrap_or_else(|| panic!("no deferred load for '{}'", name));
                log.deferred.remove(index).1
            };
            let track: Box<dyn AudioTrack> = Box::new(FakeTrack::new(name, self));
            if let Err(mut track) = completer.complete(track) {
                track.dispose();
            }
        }
    }

    pub fn ledger() -> Ledger {
        Ledger::default()
    }

    //--- Fake resources ---------------------------------------------------

    #[derive(Clone, Copy)]
    enum TextureKind {
        Picture,
        Tileset,
    }

    struct FakeTexture {
        name: String,
        kind: TextureKind,
        ledger: Ledger,
        disposed: bool,
    }

    impl Disposable for FakeTexture {
        fn dispose(&mut self) {
            assert!(!self.disposed, "texture '{}' disposed twice", self.name);
            self.disposed = true;
            let mut log = self.ledger.lock();
            match self.kind {
                TextureKind::Picture => {
                    log.textures_disposed.push(self.name.clone());
                    log.events.push(format!("dispose-texture:{}", self.name));
                }
                TextureKind::Tileset => {
                    log.maps_disposed.push(self.name.clone());
                    log.events.push(format!("dispose-map:{}", self.name));
                }
            }
        }
    }

    impl Texture for FakeTexture {
        fn size(&self) -> (u32, u32) {
            (16, 16)
        }
    }

    struct FakeTrack {
        name: String,
        ledger: Ledger,
        disposed: bool,
    }

    impl FakeTrack {
        fn new(name: &str, ledger: &Ledger) -> Self {
            Self {
                name: name.to_owned(),
                ledger: ledger.clone(),
                disposed: false,
            }
        }
    }

    impl Disposable for FakeTrack {
        fn dispose(&mut self) {
            assert!(!self.disposed, "track '{}' disposed twice", self.name);
            self.disposed = true;
            let mut log = self.ledger.lock();
            log.tracks_disposed.push(self.name.clone());
            log.events.push(format!("dispose-track:{}", self.name));
        }
    }

    impl AudioTrack for FakeTrack {
        fn play(&mut self, _looping: bool) {
            self.ledger.lock().playing.push(self.name.clone());
        }

        fn stop(&mut self) {}

        fn set_volume(&mut self, volume: f32) {
            self.ledger
                .lock()
                .volumes
                .entry(self.name.clone())
                .or_default()
                .push(volume);
        }
    }

    //--- FakeBackend ------------------------------------------------------

    pub struct FakeBackend {
        ledger: Ledger,
        defer_music: bool,
    }

    impl FakeBackend {
        pub fn new(ledger: &Ledger) -> Self {
            Self {
                ledger: ledger.clone(),
                defer_music: false,
            }
        }

        /// Music loads stay pending until [`Ledger::complete_music`].
        pub fn deferring_music(mut self) -> Self {
            self.defer_music = true;
            self
        }
    }

    impl ResourceBackend for FakeBackend {
        fn load_texture(&mut self, name: &str) -> Box<dyn Texture> {
            let mut log = self.ledger.lock();
            log.textures_loaded.push(name.to_owned());
            log.events.push(format!("texture:{}", name));
            Box::new(FakeTexture {
                name: name.to_owned(),
                kind: TextureKind::Picture,
                ledger: self.ledger.clone(),
                disposed: false,
            })
        }

        fn load_music(&mut self, spec: &MusicSpec) -> Promise<Box<dyn AudioTrack>> {
            {
                let mut log = self.ledger.lock();
                log.tracks_loaded.push(spec.name.clone());
                log.events.push(format!("track:{}", spec.name));
            }

            if self.defer_music {
                let (completer, pending) = promise();
                self.ledger.lock().deferred.push((spec.name.clone(), completer));
                pending
            } else {
                let track: Box<dyn AudioTrack> = Box::new(FakeTrack::new(&spec.name, &self.ledger));
                Promise::resolved(track)
            }
        }

        fn load_map(&mut self, name: &str) -> Result<MapBundle, MapLoadError> {
            if !matches!(name, "town" | "cave") {
                return Err(MapLoadError::NotFound(name.to_owned()));
            }
            let mut log = self.ledger.lock();
            log.maps_loaded.push(name.to_owned());
            log.events.push(format!("map:{}", name));
            Ok(MapBundle::new(
                sample_map(name),
                Box::new(FakeTexture {
                    name: name.to_owned(),
                    kind: TextureKind::Tileset,
                    ledger: self.ledger.clone(),
                    disposed: false,
                }),
            ))
        }
    }

    //--- Fixtures ---------------------------------------------------------

    /// Map with a two-page "door" and a one-page "guard".
    pub fn sample_map(name: &str) -> MapData {
        MapData {
            name: name.to_owned(),
            width: 8,
            height: 8,
            tileset: format!("{}_tiles", name),
            tiles: vec![0; 64],
            events: vec![
                EventDefinition {
                    name: "door".into(),
                    x: 4,
                    y: 1,
                    pages: vec![
                        EventPage { sprite: Some(SpriteRef::new("door", 0)) },
                        EventPage { sprite: Some(SpriteRef::new("door", 1)) },
                    ],
                },
                EventDefinition {
                    name: "guard".into(),
                    x: 6,
                    y: 3,
                    pages: vec![EventPage { sprite: Some(SpriteRef::new("guard", 0)) }],
                },
            ],
        }
    }

    pub fn test_state_with_ledger() -> (GameState, Ledger) {
        let ledger = ledger();
        let state = GameState::new(&SessionConfig::default(), Box::new(FakeBackend::new(&ledger)));
        (state, ledger)
    }

    pub fn test_state() -> GameState {
        test_state_with_ledger().0
    }

    pub fn test_coordinator() -> (GameCoordinator, Ledger) {
        let ledger = ledger();
        let coordinator = GameCoordinator::new(SessionConfig::default(), Box::new(FakeBackend::new(&ledger)));
        (coordinator, ledger)
    }

    /// Runs frames until `done` holds.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub fn pump_until(coordinator: &mut GameCoordinator, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached within 5s");
            coordinator.frame(FRAME);
            thread::sleep(Duration::from_millis(1));
        }
    }
}
