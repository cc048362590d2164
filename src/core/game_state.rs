//=========================================================================
// Game State
//=========================================================================
//
// Everything the render thread owns for one session.
//
// Architecture:
//   GameCoordinator::frame()
//     ├─ RenderQueue::drain()     script operations, FIFO
//     └─ GameState::update()
//          1. tweens (music loads polled before, fade volumes applied after)
//          2. entities
//          3. windows (input to the focused receiver, then animation)
//          4. screen transition
//          5. camera follows a moving player
//
// All mutation happens on the render thread. Script threads only reach
// this type through `RenderHandle::run/call`, plus the two shared stacks
// (`WindowStack`, `InputStack`) which carry their own locks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use crate::config::SessionConfig;
use crate::core::entity::{EntitySet, Player};
use crate::core::input::{InputEvent, InputStack, StateTracker, UiBindings};
use crate::core::map::{MapBundle, SpriteRef};
use crate::core::resources::{MusicSlots, MusicSpec, PictureSlots, ResourceBackend, ResourceSlot};
use crate::core::transition::Transition;
use crate::core::tween::TweenManager;
use crate::core::window::WindowStack;
use crate::core::world::{CameraLocation, PersistentState, PictureRecord, Rect};
use crate::error::MapLoadError;

//=== GameState ===========================================================

pub struct GameState {
    backend: Box<dyn ResourceBackend>,
    persistent: PersistentState,

    //--- Native resources -------------------------------------------------
    map: ResourceSlot<MapBundle>,
    pictures: PictureSlots,
    music: MusicSlots,

    //--- Simulation -------------------------------------------------------
    entities: EntitySet,
    tweens: TweenManager,
    transition: Option<Transition>,
    screen_alpha: f32,

    //--- UI ---------------------------------------------------------------
    windows: Arc<WindowStack>,
    input_stack: Arc<InputStack>,
    input: StateTracker,
    bindings: UiBindings,

    frame_count: u64,
}

impl GameState {
    pub fn new(config: &SessionConfig, backend: Box<dyn ResourceBackend>) -> Self {
        Self {
            backend,
            persistent: PersistentState::new(config.picture_slots),
            map: ResourceSlot::new("map"),
            pictures: PictureSlots::new(config.picture_slots),
            music: MusicSlots::new(),
            entities: EntitySet::new(config.player_speed),
            tweens: TweenManager::new(),
            transition: None,
            screen_alpha: 0.0,
            windows: Arc::new(WindowStack::new()),
            input_stack: Arc::new(InputStack::new()),
            input: StateTracker::new(),
            bindings: UiBindings::default(),
            frame_count: 0,
        }
    }

    //=====================================================================
    // Frame
    //=====================================================================

    /// Folds platform input into the current frame.
    pub fn process_input(&mut self, events: &[InputEvent]) {
        self.input.process_events(events);
    }

    /// Advances the session by `delta`.
    pub fn update(&mut self, delta: Duration) {
        self.frame_count += 1;

        // 1. Tweens
        self.music.poll_loads(&mut self.tweens);
        self.tweens.update(delta);
        self.music.update(&mut self.tweens);

        // 2. Entities
        let player_was_moving = self.entities.player().is_moving();
        self.entities.update(delta);

        // 3. Windows
        let ui = self.bindings.resolve(&self.input);
        self.input_stack.dispatch(&ui);
        self.windows.animate(delta);

        // 4. Transition
        self.update_transition();

        // 5. Camera, including the frame the player arrives
        if player_was_moving {
            let (x, y) = self.entities.player().tile();
            self.persistent.camera.x = x;
            self.persistent.camera.y = y;
        }

        self.input.end_frame();
    }

    fn update_transition(&mut self) {
        let Some(transition) = &self.transition else {
            return;
        };
        self.screen_alpha = transition.alpha(&self.tweens);
        if transition.is_done(&self.tweens) {
            if let Some(done) = self.transition.take() {
                done.cancel(&mut self.tweens);
            }
        }
    }

    //=====================================================================
    // Player
    //=====================================================================

    pub fn set_player_sprite(&mut self, sprite: Option<SpriteRef>) {
        self.entities.player_mut().set_sprite(sprite);
    }

    pub fn set_player_location(&mut self, x: i32, y: i32) {
        self.entities.player_mut().set_location(x, y);
    }

    /// Starts the player walking toward a tile.
    pub fn walk_player_to(&mut self, x: i32, y: i32) {
        self.entities.player_mut().walk_to(x, y);
    }

    //=====================================================================
    // Camera / Map
    //=====================================================================

    /// Moves the camera, loading `location.map` if one is named.
    ///
    /// The current bundle is disposed and the NPC list cleared before the
    /// new map loads. On failure the session is left with no map and the
    /// camera at [`CameraLocation::nowhere`].
    pub fn set_camera_location(&mut self, location: CameraLocation) -> Result<(), MapLoadError> {
        self.map.clear();
        self.entities.clear_npcs();

        if location.is_nowhere() {
            debug!(target: "render", "Camera cleared");
            self.persistent.camera = location;
            return Ok(());
        }

        match self.backend.load_map(&location.map) {
            Ok(bundle) => {
                self.entities.rebuild(bundle.data(), &self.persistent.event_states);
                info!(
                    target: "render",
                    "Camera moved to '{}' ({}, {}) with {} NPCs",
                    location.map,
                    location.x,
                    location.y,
                    self.entities.npcs().len()
                );
                self.map.set(Some(bundle));
                self.persistent.camera = location;
                Ok(())
            }
            Err(err) => {
                error!(target: "render", "Failed to load map '{}': {}", location.map, err);
                self.persistent.camera = CameraLocation::nowhere();
                Err(err)
            }
        }
    }

    //=====================================================================
    // Screen
    //=====================================================================

    /// Starts a screen fade, replacing any fade in progress.
    pub fn set_transition(&mut self, start_alpha: f32, end_alpha: f32, duration: Duration) {
        if let Some(previous) = self.transition.take() {
            previous.cancel(&mut self.tweens);
        }
        let transition = Transition::start(&mut self.tweens, start_alpha, end_alpha, duration);
        self.screen_alpha = transition.start_alpha();
        self.transition = Some(transition);
    }

    pub fn show_picture(&mut self, slot: usize, name: &str, geometry: Rect) {
        if self.pictures.show(slot, name, geometry, self.backend.as_mut()) {
            self.record_picture(slot, Some(PictureRecord {
                name: name.to_owned(),
                geometry,
            }));
        }
    }

    pub fn hide_picture(&mut self, slot: usize) {
        if self.pictures.hide(slot) {
            self.record_picture(slot, None);
        }
    }

    fn record_picture(&mut self, slot: usize, record: Option<PictureRecord>) {
        let records = &mut self.persistent.pictures;
        if records.len() <= slot {
            records.resize(slot + 1, None);
        }
        records[slot] = record;
    }

    //=====================================================================
    // Music
    //=====================================================================

    pub fn play_music(&mut self, slot: usize, spec: MusicSpec, looping: bool, fade: Duration) {
        self.music
            .play(slot, spec, looping, fade, self.backend.as_mut(), &mut self.tweens);
    }

    pub fn stop_music(&mut self, slot: usize, fade: Duration) {
        self.music.stop(slot, fade, &mut self.tweens);
    }

    //=====================================================================
    // Event States
    //=====================================================================

    pub fn event_state(&self, map: &str, event: &str) -> i32 {
        self.persistent.event_states.get(map, event)
    }

    /// Stores an event state and, if `map` is the current map, refreshes
    /// the matching NPC.
    pub fn set_event_state(&mut self, map: &str, event: &str, state: i32) {
        self.persistent.event_states.set(map, event, state);

        if self.persistent.camera.map == map && self.map.get().is_some() {
            if let Some(npc) = self.entities.npc_mut(event) {
                npc.refresh_visual_state(state);
            }
        }
    }

    //=====================================================================
    // Save / Restore
    //=====================================================================

    /// Replaces the persistent state with `saved` and rebuilds what it
    /// describes: camera map and pictures.
    pub fn restore(&mut self, saved: PersistentState) -> Result<(), MapLoadError> {
        let camera = saved.camera.clone();
        let pictures = saved.pictures.clone();
        self.persistent = saved;
        self.persistent.pictures.resize(self.pictures.len(), None);

        self.pictures.clear_all();
        for (slot, record) in pictures.into_iter().enumerate() {
            match record {
                Some(record) if slot < self.pictures.len() => {
                    self.show_picture(slot, &record.name, record.geometry)
                }
                Some(record) => {
                    warn!(target: "render", "Dropping saved picture '{}' in slot {}", record.name, slot)
                }
                None => {}
            }
        }

        self.set_camera_location(camera)
    }

    /// Disposes every native resource the session holds.
    pub fn shutdown(&mut self) {
        if let Some(transition) = self.transition.take() {
            transition.cancel(&mut self.tweens);
        }
        self.music.shutdown(&mut self.tweens);
        self.pictures.clear_all();
        self.map.clear();
        self.entities.clear_npcs();
        self.tweens.clear();
        info!(target: "render", "Session resources released after {} frames", self.frame_count);
    }

    //=====================================================================
    // Accessors
    //=====================================================================

    pub fn persistent(&self) -> &PersistentState {
        &self.persistent
    }

    pub fn persistent_mut(&mut self) -> &mut PersistentState {
        &mut self.persistent
    }

    pub fn camera(&self) -> &CameraLocation {
        &self.persistent.camera
    }

    pub fn map(&self) -> Option<&MapBundle> {
        self.map.get()
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn player(&self) -> &Player {
        self.entities.player()
    }

    pub fn pictures(&self) -> &PictureSlots {
        &self.pictures
    }

    pub fn music(&self) -> &MusicSlots {
        &self.music
    }

    pub fn tweens(&self) -> &TweenManager {
        &self.tweens
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Overlay alpha for the screen fade.
    pub fn screen_alpha(&self) -> f32 {
        self.screen_alpha
    }

    pub fn windows(&self) -> &Arc<WindowStack> {
        &self.windows
    }

    pub fn input_stack(&self) -> &Arc<InputStack> {
        &self.input_stack
    }

    pub fn bindings_mut(&mut self) -> &mut UiBindings {
        &mut self.bindings
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
