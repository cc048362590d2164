//=========================================================================
// Entities
//=========================================================================
//
// The player and the NPCs spawned from the current map's events.
//
// Positions are in tiles. The player walks toward a target tile at a
// fixed speed; NPCs stand on their event's tile and show the sprite of
// the page their event state selects.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::map::{EventDefinition, MapData, SpriteRef};
use crate::core::world::EventStateStore;

//=== Player ==============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    x: f32,
    y: f32,
    target: Option<(f32, f32)>,
    /// Tiles per second.
    speed: f32,
    sprite: Option<SpriteRef>,
}

impl Player {
    pub fn new(speed: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            target: None,
            speed,
            sprite: None,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Nearest tile to the current position.
    pub fn tile(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    /// Teleports to a tile, cancelling any walk in progress.
    pub fn set_location(&mut self, x: i32, y: i32) {
        self.x = x as f32;
        self.y = y as f32;
        self.target = None;
    }

    /// Starts walking toward a tile.
    pub fn walk_to(&mut self, x: i32, y: i32) {
        let target = (x as f32, y as f32);
        if target != (self.x, self.y) {
            self.target = Some(target);
        }
    }

    pub fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    pub fn sprite(&self) -> Option<&SpriteRef> {
        self.sprite.as_ref()
    }

    pub fn set_sprite(&mut self, sprite: Option<SpriteRef>) {
        self.sprite = sprite;
    }

    pub fn update(&mut self, delta: Duration) {
        let Some((tx, ty)) = self.target else {
            return;
        };

        let (dx, dy) = (tx - self.x, ty - self.y);
        let distance = (dx * dx + dy * dy).sqrt();
        let step = self.speed * delta.as_secs_f32();

        if step >= distance {
            self.x = tx;
            self.y = ty;
            self.target = None;
        } else {
            self.x += dx / distance * step;
            self.y += dy / distance * step;
        }
    }
}

//=== NonPlayer ===========================================================

/// An NPC backed by one event of the current map.
#[derive(Debug, Clone)]
pub struct NonPlayer {
    map: Arc<MapData>,
    event_index: usize,
    state: i32,
    sprite: Option<SpriteRef>,
    anim_time: Duration,
    refreshes: u32,
}

impl NonPlayer {
    fn spawn(map: Arc<MapData>, event_index: usize, state: i32) -> Self {
        let mut npc = Self {
            map,
            event_index,
            state,
            sprite: None,
            anim_time: Duration::ZERO,
            refreshes: 0,
        };
        npc.sprite = npc.sprite_for(state);
        npc
    }

    /// The map event this NPC was spawned from.
    pub fn event(&self) -> &EventDefinition {
        &self.map.events[self.event_index]
    }

    pub fn name(&self) -> &str {
        &self.event().name
    }

    pub fn tile(&self) -> (i32, i32) {
        let event = self.event();
        (event.x, event.y)
    }

    pub fn state(&self) -> i32 {
        self.state
    }

    pub fn sprite(&self) -> Option<&SpriteRef> {
        self.sprite.as_ref()
    }

    /// Time since spawn, for sprite animation.
    pub fn anim_time(&self) -> Duration {
        self.anim_time
    }

    /// Re-selects the sprite after an event state change.
    pub fn refresh_visual_state(&mut self, state: i32) {
        self.state = state;
        self.sprite = self.sprite_for(state);
        self.refreshes += 1;
        trace!(target: "render", "NPC '{}' refreshed for state {}", self.name(), state);
    }

    /// How many times [`NonPlayer::refresh_visual_state`] ran.
    pub fn visual_refreshes(&self) -> u32 {
        self.refreshes
    }

    pub fn update(&mut self, delta: Duration) {
        self.anim_time += delta;
    }

    fn sprite_for(&self, state: i32) -> Option<SpriteRef> {
        self.event().page(state).and_then(|page| page.sprite.clone())
    }
}

//=== EntitySet ===========================================================

#[derive(Debug)]
pub struct EntitySet {
    player: Player,
    npcs: Vec<NonPlayer>,
}

impl EntitySet {
    pub fn new(player_speed: f32) -> Self {
        Self {
            player: Player::new(player_speed),
            npcs: Vec::new(),
        }
    }

    /// Replaces the NPC list with one NPC per event of `map`.
    pub fn rebuild(&mut self, map: &Arc<MapData>, states: &EventStateStore) {
        self.npcs = map
            .events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                NonPlayer::spawn(Arc::clone(map), index, states.get(&map.name, &event.name))
            })
            .collect();
    }

    pub fn clear_npcs(&mut self) {
        self.npcs.clear();
    }

    pub fn update(&mut self, delta: Duration) {
        self.player.update(delta);
        for npc in &mut self.npcs {
            npc.update(delta);
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn npcs(&self) -> &[NonPlayer] {
        &self.npcs
    }

    pub fn npc(&self, name: &str) -> Option<&NonPlayer> {
        self.npcs.iter().find(|n| n.name() == name)
    }

    pub fn npc_mut(&mut self, name: &str) -> Option<&mut NonPlayer> {
        self.npcs.iter_mut().find(|n| n.name() == name)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
