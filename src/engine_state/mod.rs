//! # Engine State Module
//!
//! The simulation context of the dungeon. Everything the game knows lives in
//! one [`EngineState`]: the voxel grid, the entity store, the event bus, the
//! deferred task queue and the camera. There are no globals.
//!
//! ## Key Components
//!
//! * `camera_state` - Follow camera, steering and projection
//! * `commands` - Typed-command lexicon, interpreter and effects
//! * `entities` - Entity store, components and events
//! * `rendering` - Level mesh, baked lighting and the per-frame draw list
//! * `systems` - Physics, mob AI, particles and floating text
//! * `task_management` - Tick-keyed queue of deferred tasks
//! * `voxels` - Voxel grid, tiles and level population
//!
//! ## Tick Order
//!
//! 1. player input (steering, typed letters)
//! 2. physics
//! 3. camera follow and steering thrust
//! 4. mob AI
//! 5. particles
//! 6. letter landings, buffer fades, floating text expiry
//! 7. deferred tasks that came due, skipping those whose entities are gone
//! 8. event dispatch
//! 9. exit tile check
//! 10. reaping of removed entities
//!
//! ## Example
//!
//! ```
//! use voxel_dungeon::{config::GameConfig, engine_state::{voxels::level::DungeonLayout, EngineState}};
//!
//! let mut state = EngineState::new(GameConfig::default(), 7);
//! let mut rng = fastrand::Rng::with_seed(7);
//! let dungeon = DungeonLayout::scatter(25, 25, 6, &mut rng);
//! state.load_level(&dungeon).unwrap();
//!
//! for _ in 0..60 {
//!     state.tick();
//! }
//! assert!(state.hud().is_some());
//! ```

use std::collections::HashSet;

use cgmath::{Matrix4, Point3, Vector3};
use winit::{event::MouseButton, keyboard::KeyCode};

use camera_state::CameraState;
use commands::interpreter;
use entities::{
    components::*,
    events::{EventBus, EventKind, GameEvent},
    ComponentKind, EntityId, EntityStore, DOOR_TAG, ITEM_TAG, MOB_TAG, PLAYER_TAG,
};
use rendering::{
    billboard_pose, lighting::PointLight, DrawItem, DrawList, Material, MeshHandle, Vertex,
    ATLAS_TEXTURE, DOOR_TEXTURE, FONT_TEXTURE, ITEM_TEXTURE, MOB_TEXTURE,
};
use systems::{ai, particles, physics, text};
use task_management::{task::Task, TaskManager};
use voxels::{
    grid::{world_to_cell, VoxelGrid},
    level::{find_free_tile, populate_grid, DungeonGraph, LevelMap},
};

use crate::{
    application_state::input_state::ProcessedInputState,
    config::{CombatConfig, GameConfig},
    core::{dice::Dice, facing},
    error::LevelError,
};

pub mod camera_state;
pub mod commands;
pub mod entities;
pub mod rendering;
pub mod systems;
pub mod task_management;
pub mod voxels;

/// Viewport assumed until the host reports a real size.
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);
/// Words the player knows at the start of a run.
pub const STARTING_WORDS: [&str; 4] = ["hit", "open", "close", "take"];
/// Words a mob responds to.
pub const MOB_WORDS: [&str; 2] = ["hit", "zap"];
/// Words a door responds to.
pub const DOOR_WORDS: [&str; 2] = ["open", "close"];
/// Words an item responds to.
pub const ITEM_WORDS: [&str; 1] = ["take"];
/// Items placed on levels, cycled in order: name and words granted.
pub const ITEM_TABLE: [(&str, &[&str]); 1] = [("wand", &["zap"])];
/// Height of room lights and typed letters.
pub const HEAD_HEIGHT: f32 = 3.0;
/// Launch speed of a typed letter along the aim direction.
pub const LETTER_SPEED: f32 = 0.8;
/// Yaw spread between consecutive letters of a burst.
pub const LETTER_FAN: f32 = 0.01;
/// Height above its holder at which a text buffer is drawn.
pub const BUFFER_HEIGHT: f32 = 1.5;
/// Ticks per frame of the two-frame mob animation.
pub const MOB_FRAME_TICKS: u64 = 35;

const FALLBACK_DICE: Dice = Dice {
    count: 1,
    sides: 4,
    modifier: 0,
};

/// Dice parsed once from the combat config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatDice {
    /// Rolled by `hit`
    pub weapon: Dice,
    /// Rolled by `zap`
    pub zap: Dice,
    /// Rolled by mob attacks
    pub mob_attack: Dice,
}

impl CombatDice {
    /// Parses every notation in `combat`, replacing bad ones with `1d4`.
    pub fn from_config(combat: &CombatConfig) -> Self {
        let parse = |notation: &str| match notation.parse::<Dice>() {
            Ok(dice) => dice,
            Err(err) => {
                log::warn!("{}; using {}", err, FALLBACK_DICE);
                FALLBACK_DICE
            }
        };
        CombatDice {
            weapon: parse(&combat.player_weapon_dice),
            zap: parse(&combat.zap_dice),
            mob_attack: parse(&combat.mob_attack_dice),
        }
    }
}

/// A timed banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Id used to expire the banner
    pub id: u64,
    /// Banner text
    pub text: String,
}

/// Everything the HUD shows, read from the player entity.
#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    /// Health meter
    pub health: Meter,
    /// Mana meter
    pub mana: Meter,
    /// Character level
    pub level: u32,
    /// Progress to the next level in `[0, 1]`
    pub xp_fraction: f32,
    /// Dungeon depth, starting at 1
    pub depth: u32,
    /// Words the player can type
    pub known_words: Vec<String>,
    /// Carried item names
    pub inventory: Vec<String>,
    /// Live banners, oldest first
    pub notifications: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
struct LetterBurst {
    count: u32,
    last_tick: u64,
}

/// Player components carried from one level to the next.
#[derive(Debug, Default)]
struct PlayerSnapshot {
    health: Option<Health>,
    mana: Option<Mana>,
    experience: Option<Experience>,
    inventory: Option<Inventory>,
    lexicon: Option<Lexicon>,
}

/// The whole simulation.
#[derive(Debug)]
pub struct EngineState {
    /// Tunables
    pub config: GameConfig,
    /// Dice parsed from the config
    pub dice: CombatDice,
    /// Level geometry and solidity
    pub grid: VoxelGrid,
    /// How the current dungeon maps onto the grid
    pub level: Option<LevelMap>,
    /// Room lights of the current level
    pub lights: Vec<PointLight>,
    /// Every entity
    pub entities: EntityStore,
    /// Pending events and handler table
    pub events: EventBus,
    /// Deferred tasks
    pub task_manager: TaskManager,
    /// Camera following the player
    pub camera_state: CameraState,
    /// Current player actions derived from input
    pub player_actions: PlayerAction,
    /// Random source for every gameplay roll
    pub rng: fastrand::Rng,
    /// Ticks since the state was created
    pub tick: u64,
    /// Levels loaded so far
    pub depth: u32,
    /// The player entity, once a level is loaded
    pub player: Option<EntityId>,
    /// Live banners
    pub notifications: Vec<Notification>,
    /// Set once the player has died
    pub game_over: bool,
    next_notification: u64,
    letter_burst: LetterBurst,
    level_advance_requested: bool,
}

impl EngineState {
    /// Creates an empty state. Call [`EngineState::load_level`] before playing.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let grid = VoxelGrid::new(
            config.world.grid_width,
            config.world.grid_height,
            config.world.grid_depth,
        );
        let (width, height) = DEFAULT_VIEWPORT;
        Self {
            dice: CombatDice::from_config(&config.combat),
            config,
            grid,
            level: None,
            lights: Vec::new(),
            entities: EntityStore::new(),
            events: EventBus::new(),
            task_manager: TaskManager::new(),
            camera_state: CameraState::new(width, height),
            player_actions: PlayerAction::default(),
            rng: fastrand::Rng::with_seed(seed),
            tick: 0,
            depth: 0,
            player: None,
            notifications: Vec::new(),
            game_over: false,
            next_notification: 0,
            letter_burst: LetterBurst::default(),
            level_advance_requested: false,
        }
    }

    /// Adjusts the projection to a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera_state.projection.resize(width, height);
    }

    /// Replaces the current level with `dungeon`.
    ///
    /// Every entity is dropped; the player is respawned in the initial room
    /// keeping its health, mana, experience, inventory and words.
    ///
    /// # Errors
    /// Returns a [`LevelError`] if the dungeon does not fit the grid or has
    /// no rooms. The previous level is left untouched in that case.
    pub fn load_level(&mut self, dungeon: &dyn DungeonGraph) -> Result<(), LevelError> {
        let mut next_grid = VoxelGrid::new(self.grid.width(), self.grid.height(), self.grid.depth());
        let map = populate_grid(&mut next_grid, dungeon)?;

        let snapshot = self.player_snapshot();
        self.entities.remove_all();
        for id in self.entities.reap() {
            self.events.forget(id);
        }
        self.events.clear();
        self.task_manager.clear();
        self.notifications.clear();
        self.letter_burst = LetterBurst::default();
        self.level_advance_requested = false;

        self.grid = next_grid;
        self.grid.generate_geometry();

        let spawning = self.config.spawning.clone();
        let light_start = web_time::Instant::now();
        self.lights = dungeon
            .rooms()
            .iter()
            .map(|room| {
                let intensity =
                    spawning.light_intensity_min + self.rng.f32() * spawning.light_intensity_spread;
                PointLight::new(map.tile_to_world(room.center(), HEAD_HEIGHT), intensity)
            })
            .collect();
        rendering::lighting::bake_lights(&mut self.grid, &self.lights);
        let light_time = light_start.elapsed();

        let start = dungeon.rooms()[dungeon.initial_room()].center();
        let player = self.spawn_player(map.tile_to_world(start, HEAD_HEIGHT));
        self.restore_player(player, snapshot);
        self.camera_state.camera.yaw = cgmath::Rad(0.0);
        self.camera_state.camera.pitch = cgmath::Rad(0.0);

        let mut occupied: Vec<[usize; 2]> = vec![start];
        let mut door_tiles = HashSet::new();
        for room in dungeon.rooms() {
            for exit in &room.exits {
                if door_tiles.insert(*exit) {
                    self.spawn_door(map.tile_to_world(*exit, HEAD_HEIGHT));
                    occupied.push(*exit);
                }
            }
        }

        let tries = spawning.max_free_tile_tries;
        for _ in 0..spawning.mobs_per_level {
            match find_free_tile(dungeon, &mut self.rng, tries, |tile| occupied.contains(&tile)) {
                Some(tile) => {
                    self.spawn_mob(map.tile_to_world(tile, HEAD_HEIGHT));
                    occupied.push(tile);
                }
                None => log::debug!("No room left for a mob"),
            }
        }
        for n in 0..spawning.items_per_level {
            let (name, verbs) = ITEM_TABLE[n % ITEM_TABLE.len()];
            match find_free_tile(dungeon, &mut self.rng, tries, |tile| occupied.contains(&tile)) {
                Some(tile) => {
                    self.spawn_item(map.tile_to_world(tile, HEAD_HEIGHT), name, verbs);
                    occupied.push(tile);
                }
                None => log::debug!("No room left for a {}", name),
            }
        }

        self.level = Some(map);
        self.depth += 1;
        log::info!(
            "Loaded level {}: {} rooms, {} faces, {} lights baked in {:?}, {} entities",
            self.depth,
            dungeon.rooms().len(),
            self.grid.mesh().face_count(),
            self.lights.len(),
            light_time,
            self.entities.len()
        );
        Ok(())
    }

    fn player_snapshot(&self) -> PlayerSnapshot {
        let Some(player) = self.player else {
            return PlayerSnapshot::default();
        };
        PlayerSnapshot {
            health: self.entities.get::<Health>(player).copied(),
            mana: self.entities.get::<Mana>(player).copied(),
            experience: self.entities.get::<Experience>(player).copied(),
            inventory: self.entities.get::<Inventory>(player).cloned(),
            lexicon: self.entities.get::<Lexicon>(player).cloned(),
        }
    }

    fn restore_player(&mut self, player: EntityId, snapshot: PlayerSnapshot) {
        if let Some(health) = snapshot.health {
            self.entities.add_component(player, health);
        }
        if let Some(mana) = snapshot.mana {
            self.entities.add_component(player, mana);
        }
        if let Some(experience) = snapshot.experience {
            self.entities.add_component(player, experience);
        }
        if let Some(inventory) = snapshot.inventory {
            self.entities.add_component(player, inventory);
        }
        if let Some(lexicon) = snapshot.lexicon {
            self.entities.add_component(player, lexicon);
        }
    }

    /// Spawns the player and makes it the camera's target.
    pub fn spawn_player(&mut self, at: Point3<f32>) -> EntityId {
        let combat = &self.config.combat;
        let player = self.entities.create_entity();
        self.entities.add_component(player, Physics::at(at));
        self.entities.add_component(player, PhysicsCone { radius: 1.0 });
        self.entities.add_component(player, Health::new(combat.player_health));
        self.entities.add_component(player, Mana::new(combat.player_mana));
        self.entities.add_component(player, Experience::new(combat.xp_first_level));
        self.entities.add_component(player, Inventory::default());
        self.entities.add_component(player, Lexicon::new(&STARTING_WORDS));
        self.entities.add_component(player, CameraController);
        self.entities.add_tag(player, PLAYER_TAG);
        self.events.on(player, EventKind::Died, on_player_died);
        self.events.on(player, EventKind::LevelUp, on_level_up);
        self.player = Some(player);
        player
    }

    /// Spawns a hostile mob.
    pub fn spawn_mob(&mut self, at: Point3<f32>) -> EntityId {
        let combat = &self.config.combat;
        let ai = MobAi {
            attack_dice: self.dice.mob_attack,
            attack_range: combat.mob_attack_range,
            acceleration: combat.mob_acceleration,
            sight_range: combat.mob_sight_range,
            cooldown_ticks: combat.mob_attack_cooldown_ticks,
            cooldown: 0,
            xp_value: combat.mob_xp_value,
        };
        let health = Health::new(combat.mob_health);

        let mob = self.entities.create_entity();
        self.entities.add_component(mob, Physics::at(at).with_size(2.0, 2.0, 2.0));
        self.entities.add_component(mob, PhysicsCone { radius: 1.0 });
        self.entities.add_component(mob, health);
        self.entities.add_component(mob, ai);
        self.entities.add_component(mob, TextHolder::default());
        self.entities.add_component(mob, Lexicon::new(&MOB_WORDS));
        self.entities.add_tag(mob, MOB_TAG);
        self.events.on(mob, EventKind::Damaged, on_mob_damaged);
        self.events.on(mob, EventKind::Died, on_mob_died);
        mob
    }

    /// Spawns a closed door.
    pub fn spawn_door(&mut self, at: Point3<f32>) -> EntityId {
        let door = self.entities.create_entity();
        self.entities
            .add_component(door, Physics::at(at).with_size(2.0, 2.0, 4.0).immovable());
        self.entities.add_component(door, PhysicsCone { radius: 1.0 });
        self.entities.add_component(door, Door { open: false });
        self.entities.add_component(door, TextHolder::default());
        self.entities.add_component(door, Lexicon::new(&DOOR_WORDS));
        self.entities.add_tag(door, DOOR_TAG);
        door
    }

    /// Spawns a pickup granting `verbs`.
    pub fn spawn_item(&mut self, at: Point3<f32>, name: &str, verbs: &[&str]) -> EntityId {
        let item = self.entities.create_entity();
        self.entities.add_component(item, Physics::at(at).with_size(1.0, 1.0, 1.0));
        self.entities.add_component(
            item,
            Item {
                name: name.to_string(),
                verbs: verbs.iter().map(|verb| verb.to_string()).collect(),
            },
        );
        self.entities.add_component(item, TextHolder::default());
        self.entities.add_component(item, Lexicon::new(&ITEM_WORDS));
        self.entities.add_tag(item, ITEM_TAG);
        self.events.on(item, EventKind::PickedUp, on_item_picked_up);
        item
    }

    /// Spawns a particle burst.
    pub fn spawn_particles(&mut self, preset: &ParticlePreset, at: Point3<f32>) -> EntityId {
        let effect = ParticleEffect::burst(preset, at, &mut self.rng);
        let id = self.entities.create_entity();
        self.entities.add_component(id, effect);
        id
    }

    fn spawn_floating_text(&mut self, text: String, color: [f32; 4], body: Physics) -> EntityId {
        let expire_tick = Some(self.tick + self.config.timing.letter_lifetime_ticks);
        let id = self.entities.create_entity();
        self.entities.add_component(
            id,
            Text3D {
                text,
                color,
                expire_tick,
            },
        );
        self.entities
            .add_component(id, Physics { friction: 0.3, ..body.with_size(0.2, 0.2, 0.8) });
        id
    }

    /// Fires a typed letter from the player along the aim direction.
    ///
    /// Consecutive letters fan out slightly; the fan restarts after the
    /// burst window passes without typing.
    pub fn type_letter(&mut self, letter: char) -> Option<EntityId> {
        if self.game_over {
            return None;
        }
        let player = self.player?;
        let body = *self.entities.get::<Physics>(player)?;

        if self.tick.saturating_sub(self.letter_burst.last_tick) > self.config.timing.letter_burst_window_ticks {
            self.letter_burst.count = 0;
        }
        self.letter_burst.count += 1;
        self.letter_burst.last_tick = self.tick;

        let camera = &self.camera_state.camera;
        let yaw = camera.yaw.0 - 0.05 + self.letter_burst.count as f32 * LETTER_FAN;
        let aim = facing(yaw);
        let side = facing(yaw + std::f32::consts::FRAC_PI_2);
        let mut pos = body.pos + aim + side * 0.1;
        pos.y = HEAD_HEIGHT;
        let mut vel = body.vel + aim * LETTER_SPEED;
        vel.y = body.vel.y - camera.pitch.0.sin() * LETTER_SPEED + 0.1;

        let id = self.spawn_floating_text(
            letter.to_string(),
            [1.0, 1.0, 1.0, 1.0],
            Physics { vel, ..Physics::at(pos) },
        );
        self.entities.add_component(
            id,
            TextProjectile {
                shooter: player,
                letter,
            },
        );
        Some(id)
    }

    fn spawn_damage_number(&mut self, target: EntityId, amount: i32) {
        let Some(origin) = self.entities.get::<Physics>(target).map(|body| body.pos) else {
            return;
        };
        let mut jitter = || (self.rng.f32() - 0.5) * 0.05;
        let mut vel = Vector3::new(jitter(), 0.15, jitter());
        vel += self.camera_state.camera.facing() * 0.05;

        self.spawn_floating_text(
            amount.to_string(),
            [0.8, 0.1, 0.1, 1.0],
            Physics {
                vel,
                ..Physics::at(Point3::new(origin.x, 2.5, origin.z))
            },
        );
    }

    /// Applies damage to an entity's health.
    ///
    /// Emits `Damaged` for every hit that lands and `Died` on the hit that
    /// empties the meter.
    pub fn damage(&mut self, target: EntityId, amount: i32, attacker: Option<EntityId>) -> DamageOutcome {
        let Some(health) = self.entities.get_mut::<Health>(target) else {
            return DamageOutcome::Ignored;
        };
        let outcome = health.damage(amount);
        if outcome != DamageOutcome::Ignored {
            self.events.emit(target, GameEvent::Damaged { amount, attacker });
        }
        if outcome == DamageOutcome::Killed {
            self.events.emit(target, GameEvent::Died { attacker });
        }
        outcome
    }

    /// Adds experience and emits `LevelUp` for every level crossed.
    pub fn award_xp(&mut self, entity: EntityId, amount: u32) {
        let Some(experience) = self.entities.get_mut::<Experience>(entity) else {
            return;
        };
        let before = experience.level;
        let gained = experience.gain(amount);
        for level in before + 1..=before + gained {
            self.events.emit(entity, GameEvent::LevelUp { level });
        }
    }

    /// Posts a banner that expires after the notification lifetime.
    pub fn notify(&mut self, text: &str) -> u64 {
        let id = self.next_notification;
        self.next_notification += 1;
        self.notifications.push(Notification {
            id,
            text: text.to_string(),
        });
        self.task_manager.publish_task(
            self.tick,
            self.config.timing.notification_ticks,
            Task::ExpireNotification { id },
        );
        id
    }

    /// Advances the simulation one fixed step.
    pub fn tick(&mut self) {
        self.tick += 1;

        self.process_input();
        physics::update_physics(self);
        self.update_camera();
        ai::update_mob_ai(self);
        particles::update_particles(self);
        text::update_letters(self);
        text::update_text_holders(self);
        text::expire_text(self);
        self.run_due_tasks();
        self.dispatch_events();
        self.check_exit();

        for id in self.entities.reap() {
            self.events.forget(id);
        }
    }

    fn process_input(&mut self) {
        self.camera_state.intake_actions(&self.player_actions);
        self.player_actions.rotate_view = None;
        for letter in std::mem::take(&mut self.player_actions.typed) {
            self.type_letter(letter);
        }
    }

    fn update_camera(&mut self) {
        let Some(player) = self.player else {
            return;
        };
        if !self.entities.has::<CameraController>(player) {
            return;
        }
        if let Some(body) = self.entities.get_mut::<Physics>(player) {
            self.camera_state.update(body);
        }
    }

    fn run_due_tasks(&mut self) {
        if self.task_manager.is_empty() {
            return;
        }
        for task in self.task_manager.take_due(self.tick) {
            if !task.entities().iter().all(|id| self.entities.is_alive(*id)) {
                log::debug!("Skipping {:?}: entity gone", task);
                continue;
            }
            match task {
                Task::ResolveCommand {
                    actor,
                    target,
                    command,
                } => interpreter::resolve_command(self, actor, target, command),
                Task::RejectWord { target } => interpreter::reject_word(self, target),
                Task::ExpireNotification { id } => self.notifications.retain(|n| n.id != id),
            }
        }
    }

    /// Delivers every pending event, including ones raised by handlers.
    pub fn dispatch_events(&mut self) {
        while let Some((entity, event)) = self.events.pop() {
            if !self.entities.contains(entity) {
                continue;
            }
            for handler in self.events.handlers(entity, event.kind()) {
                handler(self, entity, &event);
            }
        }
    }

    fn check_exit(&mut self) {
        if self.level_advance_requested || self.game_over {
            return;
        }
        let (Some(level), Some(player)) = (&self.level, self.player) else {
            return;
        };
        let Some(body) = self.entities.get::<Physics>(player) else {
            return;
        };
        let (x, _, z) = world_to_cell(body.pos);
        if level.is_exit(x, z) {
            log::info!("Player reached the exit of level {}", self.depth);
            self.level_advance_requested = true;
        }
    }

    /// Whether the player stands on the exit and the host should load the next level.
    pub fn wants_level_advance(&self) -> bool {
        self.level_advance_requested
    }

    /// The level mesh as vertex and index slices.
    pub fn level_mesh(&self) -> (&[Vertex], &[u32]) {
        let mesh = self.grid.mesh();
        (&mesh.vertices, &mesh.indices)
    }

    /// HUD readout, or `None` before a player exists.
    pub fn hud(&self) -> Option<HudState> {
        let player = self.player?;
        let health = self.entities.get::<Health>(player)?.0;
        let mana = self.entities.get::<Mana>(player).map(|mana| mana.0).unwrap_or(Meter::new(0));
        let experience = self
            .entities
            .get::<Experience>(player)
            .copied()
            .unwrap_or(Experience::new(1));
        Some(HudState {
            health,
            mana,
            level: experience.level,
            xp_fraction: experience.fraction(),
            depth: self.depth,
            known_words: self
                .entities
                .get::<Lexicon>(player)
                .map(|lexicon| lexicon.words.clone())
                .unwrap_or_default(),
            inventory: self
                .entities
                .get::<Inventory>(player)
                .map(|inventory| inventory.items.clone())
                .unwrap_or_default(),
            notifications: self.notifications.iter().map(|n| n.text.clone()).collect(),
        })
    }

    /// Every drawable of the frame, the level first.
    ///
    /// The level item's geometry is [`EngineState::level_mesh`].
    pub fn draw_list(&self) -> DrawList {
        let yaw = self.camera_state.camera.yaw;
        let mut items = vec![DrawItem {
            pose: Matrix4::from_scale(1.0),
            mesh: MeshHandle::Level,
            material: Material::plain(ATLAS_TEXTURE),
        }];
        let body_of = |id: EntityId| self.entities.get::<Physics>(id);

        let frame = if self.tick % (MOB_FRAME_TICKS * 2) < MOB_FRAME_TICKS { 0.0 } else { 0.5 };
        for id in self.entities.query(&[ComponentKind::MobAi, ComponentKind::Physics]) {
            let Some(body) = body_of(id) else { continue };
            items.push(DrawItem {
                pose: billboard_pose(body.pos, yaw, body.width, body.height),
                mesh: MeshHandle::Billboard,
                material: Material::plain(MOB_TEXTURE).framed([frame, 0.0, frame + 0.5, 1.0]),
            });
        }

        for id in self.entities.query(&[ComponentKind::Door, ComponentKind::Physics]) {
            let (Some(body), Some(door)) = (body_of(id), self.entities.get::<Door>(id)) else {
                continue;
            };
            let alpha = if door.open { 0.25 } else { 1.0 };
            items.push(DrawItem {
                pose: billboard_pose(body.pos, yaw, body.width, body.height),
                mesh: MeshHandle::Billboard,
                material: Material::plain(DOOR_TEXTURE).tinted([1.0, 1.0, 1.0, alpha]),
            });
        }

        for id in self.entities.query(&[ComponentKind::Item, ComponentKind::Physics]) {
            let Some(body) = body_of(id) else { continue };
            items.push(DrawItem {
                pose: billboard_pose(body.pos, yaw, body.width, body.height),
                mesh: MeshHandle::Billboard,
                material: Material::plain(ITEM_TEXTURE),
            });
        }

        for id in self.entities.query(&[ComponentKind::Text3D, ComponentKind::Physics]) {
            let (Some(body), Some(text)) = (body_of(id), self.entities.get::<Text3D>(id)) else {
                continue;
            };
            items.push(DrawItem {
                pose: billboard_pose(body.pos, yaw, 1.0, 1.0),
                mesh: MeshHandle::Glyphs(text.text.clone()),
                material: Material::plain(FONT_TEXTURE).tinted(text.color),
            });
        }

        for id in self.entities.query(&[ComponentKind::TextHolder, ComponentKind::Physics]) {
            let (Some(body), Some(holder)) = (body_of(id), self.entities.get::<TextHolder>(id)) else {
                continue;
            };
            if holder.text.is_empty() {
                continue;
            }
            let [r, g, b] = holder.color;
            let above = Point3::new(body.pos.x, body.pos.y + BUFFER_HEIGHT, body.pos.z);
            items.push(DrawItem {
                pose: billboard_pose(above, yaw, 1.0, 1.0),
                mesh: MeshHandle::Glyphs(holder.text.clone()),
                material: Material::plain(FONT_TEXTURE).tinted([r, g, b, holder.alpha]),
            });
        }

        for id in self.entities.query(&[ComponentKind::ParticleEffect]) {
            let Some(effect) = self.entities.get::<ParticleEffect>(id) else {
                continue;
            };
            for particle in &effect.particles {
                items.push(DrawItem {
                    pose: Matrix4::from_translation(Vector3::new(particle.pos.x, particle.pos.y, particle.pos.z))
                        * Matrix4::from_scale(0.05),
                    mesh: MeshHandle::Particle,
                    material: Material::plain(FONT_TEXTURE).tinted(effect.color),
                });
            }
        }

        DrawList {
            camera: self.camera_state.uniform(),
            items,
        }
    }

    /// Replaces the held-key state with this frame's input.
    ///
    /// Typed letters and pointer motion add up until the next tick consumes them.
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        let mut player_action = translate_processed_input(&input);
        let mut typed = std::mem::take(&mut self.player_actions.typed);
        typed.append(&mut player_action.typed);
        player_action.typed = typed;
        player_action.rotate_view = match (self.player_actions.rotate_view, player_action.rotate_view) {
            (Some((x0, y0)), Some((x1, y1))) => Some((x0 + x1, y0 + y1)),
            (earlier, later) => later.or(earlier),
        };
        self.player_actions = player_action;
    }
}

/// Translates the processed input state into player actions.
///
/// Arrow keys steer so that every letter stays free for typing.
fn translate_processed_input(input: &ProcessedInputState) -> PlayerAction {
    let mut player_action = PlayerAction {
        move_forward: input.get_key_state(KeyCode::ArrowUp).is_active(),
        move_backward: input.get_key_state(KeyCode::ArrowDown).is_active(),
        turn_left: input.get_key_state(KeyCode::ArrowLeft).is_active(),
        turn_right: input.get_key_state(KeyCode::ArrowRight).is_active(),
        ..Default::default()
    };

    // Mouse rotation - active if left button is pressed or held & mouse has moved
    if input.get_mouse_delta().is_some() && input.get_mouse_button_state(MouseButton::Left).is_active() {
        player_action.rotate_view = input.mouse_delta;
    }

    player_action.typed = input
        .typed
        .iter()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_lowercase())
        .collect();

    player_action
}

/// Represents player actions derived from input
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlayerAction {
    /// Thrust along the facing direction
    pub move_forward: bool,
    /// Thrust against the facing direction
    pub move_backward: bool,
    /// Turn left
    pub turn_left: bool,
    /// Turn right
    pub turn_right: bool,
    /// Pointer delta, `Some` while dragging
    pub rotate_view: Option<(f64, f64)>,
    /// Letters typed since the last tick
    pub typed: Vec<char>,
}

fn on_mob_damaged(state: &mut EngineState, mob: EntityId, event: &GameEvent) {
    if let GameEvent::Damaged { amount, .. } = event {
        state.spawn_damage_number(mob, *amount);
    }
}

fn on_mob_died(state: &mut EngineState, mob: EntityId, event: &GameEvent) {
    let GameEvent::Died { attacker } = event else {
        return;
    };
    if let Some(at) = state.entities.get::<Physics>(mob).map(|body| body.pos) {
        state.spawn_particles(&BLOOD_PARTICLES, at);
    }
    let xp = state.entities.get::<MobAi>(mob).map_or(0, |ai| ai.xp_value);
    if let Some(attacker) = attacker {
        state.award_xp(*attacker, xp);
    }
    log::debug!("{} died", mob);
    state.entities.remove(mob);
}

fn on_player_died(state: &mut EngineState, _player: EntityId, _event: &GameEvent) {
    log::info!("Player died on level {}", state.depth);
    state.game_over = true;
    state.notify("You died");
}

fn on_level_up(state: &mut EngineState, player: EntityId, event: &GameEvent) {
    let GameEvent::LevelUp { level } = event else {
        return;
    };
    let extra = state.config.combat.health_per_level;
    if let Some(health) = state.entities.get_mut::<Health>(player) {
        health.raise_max(extra);
    }
    if let Some(mana) = state.entities.get_mut::<Mana>(player) {
        mana.amount = mana.max;
    }
    log::info!("Reached level {}", level);
    state.notify(&format!("Level {}!", level));
}

fn on_item_picked_up(_state: &mut EngineState, item: EntityId, event: &GameEvent) {
    if let GameEvent::PickedUp { item: name, by } = event {
        log::info!("{} picked up {} ({})", by, name, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{application_state::input_state::RawInputState, engine_state::voxels::level::DungeonLayout};

    fn two_rooms() -> DungeonLayout {
        let mut layout = DungeonLayout::new(25, 25);
        layout.carve_room([1, 1], [3, 3]);
        layout.carve_room([10, 10], [5, 5]);
        layout.connect(0, 1);
        layout
    }

    fn dragging(delta: (f64, f64)) -> ProcessedInputState {
        ProcessedInputState {
            mouse_button_states: [(MouseButton::Left, RawInputState::Held)].into_iter().collect(),
            mouse_delta: Some(delta),
            ..Default::default()
        }
    }

    #[test]
    fn pointer_motion_adds_up_between_ticks() {
        let mut state = EngineState::new(GameConfig::default(), 4);
        state.set_input_commands(dragging((1.0, 0.5)));
        state.set_input_commands(dragging((2.0, -1.0)));
        state.set_input_commands(ProcessedInputState::default());
        assert_eq!(state.player_actions.rotate_view, Some((3.0, -0.5)));

        state.tick();
        assert_eq!(state.player_actions.rotate_view, None);
    }

    #[test]
    fn loading_a_level_places_the_cast() {
        let mut state = EngineState::new(GameConfig::default(), 11);
        state.load_level(&two_rooms()).unwrap();

        assert_eq!(state.depth, 1);
        assert_eq!(state.entities.query_tag(PLAYER_TAG).len(), 1);
        assert_eq!(state.entities.query_tag(DOOR_TAG).len(), 2);
        assert!(state.entities.query_tag(MOB_TAG).len() <= state.config.spawning.mobs_per_level);
        assert_eq!(state.lights.len(), 2);
        assert!(state.grid.mesh().face_count() > 0);
        assert!(state.level.as_ref().is_some_and(|level| level.exit_cell.is_some()));
    }

    #[test]
    fn a_bad_dungeon_leaves_the_old_level() {
        let mut state = EngineState::new(GameConfig::default(), 11);
        state.load_level(&two_rooms()).unwrap();
        let faces = state.grid.mesh().face_count();

        let err = state.load_level(&DungeonLayout::new(100, 100)).unwrap_err();
        assert!(matches!(err, LevelError::DungeonTooLarge { .. }));
        assert_eq!(state.grid.mesh().face_count(), faces);
        assert_eq!(state.depth, 1);
    }

    struct StartOutside(DungeonLayout);

    impl DungeonGraph for StartOutside {
        fn size(&self) -> [usize; 2] {
            self.0.size()
        }

        fn rooms(&self) -> &[voxels::level::Room] {
            self.0.rooms()
        }

        fn initial_room(&self) -> usize {
            self.0.rooms().len() + 3
        }

        fn is_wall(&self, x: usize, z: usize) -> bool {
            self.0.is_wall(x, z)
        }
    }

    #[test]
    fn a_graph_with_a_missing_start_room_is_an_error() {
        let mut state = EngineState::new(GameConfig::default(), 11);
        let err = state.load_level(&StartOutside(two_rooms())).unwrap_err();
        assert!(matches!(err, LevelError::InitialRoomOutOfRange { room_count: 2, .. }));
        assert_eq!(state.depth, 0);
        assert!(state.player.is_none());
    }

    #[test]
    fn the_player_keeps_progress_between_levels() {
        let mut state = EngineState::new(GameConfig::default(), 11);
        state.load_level(&two_rooms()).unwrap();
        let first = state.player.unwrap();
        state.entities.get_mut::<Lexicon>(first).unwrap().grant("zap");

        state.load_level(&two_rooms()).unwrap();
        let second = state.player.unwrap();
        assert_ne!(first, second);
        assert!(state.entities.get::<Lexicon>(second).unwrap().knows("zap"));
        assert_eq!(state.depth, 2);
    }

    #[test]
    fn killing_a_mob_awards_experience_and_removes_it() {
        let mut state = EngineState::new(GameConfig::default(), 5);
        let player = state.spawn_player(Point3::new(0.0, 3.0, 0.0));
        let mob = state.spawn_mob(Point3::new(20.0, 2.0, 20.0));

        assert_eq!(state.damage(mob, 100, Some(player)), DamageOutcome::Killed);
        assert_eq!(state.damage(mob, 100, Some(player)), DamageOutcome::Ignored);
        state.dispatch_events();

        assert!(!state.entities.is_alive(mob));
        let xp = state.entities.get::<Experience>(player).unwrap().xp;
        assert_eq!(xp, state.config.combat.mob_xp_value);
        assert_eq!(state.entities.query_tag(MOB_TAG).len(), 0);
        assert_eq!(state.entities.query(&[ComponentKind::Text3D]).len(), 1);
    }

    #[test]
    fn levelling_up_raises_max_health() {
        let mut state = EngineState::new(GameConfig::default(), 5);
        let player = state.spawn_player(Point3::new(0.0, 3.0, 0.0));
        let first = state.config.combat.xp_first_level;
        state.damage(player, 5, None);

        state.award_xp(player, first);
        state.dispatch_events();

        let health = state.entities.get::<Health>(player).unwrap();
        let expected = state.config.combat.player_health + state.config.combat.health_per_level;
        assert_eq!((health.amount, health.max), (expected, expected));
        assert_eq!(state.hud().unwrap().level, 2);
        assert_eq!(state.notifications.len(), 1);
    }

    #[test]
    fn commands_on_removed_targets_do_nothing() {
        let mut state = EngineState::new(GameConfig::default(), 5);
        let player = state.spawn_player(Point3::new(0.0, 3.0, 0.0));
        let mob = state.spawn_mob(Point3::new(3.0, 3.0, 0.0));

        for letter in "hit".chars() {
            interpreter::deliver_letter(&mut state, player, mob, letter);
        }
        assert!(!state.task_manager.is_empty());
        state.entities.remove(mob);

        for _ in 0..=state.config.timing.command_delay_ticks {
            state.tick();
        }
        assert!(state.task_manager.is_empty());
        assert!(!state.entities.contains(mob));
        assert_eq!(state.camera_state.camera.shake_vel, Vector3::new(0.0, 0.0, 0.0));
        assert!(state.entities.query(&[ComponentKind::Text3D]).is_empty());
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn notifications_expire() {
        let mut state = EngineState::new(GameConfig::default(), 5);
        state.notify("hello");
        for _ in 0..state.config.timing.notification_ticks {
            assert_eq!(state.notifications.len(), 1);
            state.tick();
        }
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn letters_fly_from_the_player_and_expire() {
        let mut state = EngineState::new(GameConfig::default(), 5);
        state.spawn_player(Point3::new(20.0, 3.0, 20.0));
        let letter = state.type_letter('h').unwrap();
        assert!(state.entities.has::<TextProjectile>(letter));

        for _ in 0..=state.config.timing.letter_lifetime_ticks {
            state.tick();
        }
        assert!(!state.entities.contains(letter));
    }
}
