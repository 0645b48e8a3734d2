use cgmath::{Point3, Vector3};

use voxel_dungeon::{
    application_state::input_state::ProcessedInputState,
    config::GameConfig,
    engine_state::{
        entities::{
            components::{Physics, TextProjectile},
            ComponentKind, DOOR_TAG, MOB_TAG, PLAYER_TAG,
        },
        rendering::MeshHandle,
        voxels::level::DungeonLayout,
        EngineState,
    },
};

fn quiet_config() -> GameConfig {
    GameConfig::from_json(r#"{ "spawning": { "mobs_per_level": 0, "items_per_level": 0 } }"#).unwrap()
}

fn two_rooms() -> DungeonLayout {
    let mut layout = DungeonLayout::new(25, 25);
    layout.carve_room([1, 1], [3, 3]);
    layout.carve_room([12, 12], [5, 5]);
    layout.connect(0, 1);
    layout
}

#[test]
fn a_scattered_level_runs_for_a_few_seconds() {
    let mut state = EngineState::new(GameConfig::default(), 42);
    let mut rng = fastrand::Rng::with_seed(42);
    let dungeon = DungeonLayout::scatter(25, 25, 8, &mut rng);
    state.load_level(&dungeon).unwrap();

    for _ in 0..300 {
        state.tick();
    }

    let hud = state.hud().unwrap();
    assert_eq!(hud.depth, 1);
    assert!(hud.health.max >= state.config.combat.player_health);
    assert!(hud.known_words.iter().any(|word| word == "open"));

    let (vertices, indices) = state.level_mesh();
    assert!(!vertices.is_empty());
    assert_eq!(indices.len() % 6, 0);

    let player = state.player.unwrap();
    let body = state.entities.get::<Physics>(player).unwrap();
    assert!(body.pos.y >= state.config.world.ground_level);
    assert!(body.pos.y <= state.config.world.ceiling_level);

    let frame = state.draw_list();
    assert_eq!(frame.items.first().map(|item| &item.mesh), Some(&MeshHandle::Level));
    let matrix: [[f32; 4]; 4] = frame.camera.view_proj().into();
    assert!(matrix.iter().flatten().all(|value| value.is_finite()));
}

#[test]
fn typed_input_becomes_lowercase_letters() {
    let mut state = EngineState::new(quiet_config(), 3);
    state.load_level(&two_rooms()).unwrap();

    state.set_input_commands(ProcessedInputState {
        typed: vec!['H', '1', 'i', ' '],
        ..Default::default()
    });
    state.tick();

    let mut letters: Vec<char> = state
        .entities
        .query(&[ComponentKind::TextProjectile])
        .into_iter()
        .filter_map(|id| state.entities.get::<TextProjectile>(id).map(|p| p.letter))
        .collect();
    letters.sort_unstable();
    assert_eq!(letters, vec!['h', 'i']);

    let glyphs = state
        .draw_list()
        .items
        .into_iter()
        .filter(|item| matches!(&item.mesh, MeshHandle::Glyphs(text) if text == "h" || text == "i"))
        .count();
    assert_eq!(glyphs, 2);

    state.tick();
    assert_eq!(state.entities.query(&[ComponentKind::TextProjectile]).len(), 2);
}

#[test]
fn standing_on_the_exit_advances_the_level() {
    let mut state = EngineState::new(quiet_config(), 9);
    state.load_level(&two_rooms()).unwrap();
    assert_eq!(state.entities.query_tag(DOOR_TAG).len(), 2);
    assert!(!state.wants_level_advance());

    let [x, z] = state.level.as_ref().and_then(|level| level.exit_cell).unwrap();
    let player = state.player.unwrap();
    if let Some(body) = state.entities.get_mut::<Physics>(player) {
        body.pos = Point3::new(x as f32 * 2.0, 3.0, z as f32 * 2.0);
        body.vel = Vector3::new(0.0, 0.0, 0.0);
    }
    state.tick();
    assert!(state.wants_level_advance());

    state.load_level(&two_rooms()).unwrap();
    assert!(!state.wants_level_advance());
    assert_eq!(state.hud().unwrap().depth, 2);
    assert_eq!(state.entities.query_tag(PLAYER_TAG).len(), 1);
    assert!(state.entities.query_tag(MOB_TAG).is_empty());
}
