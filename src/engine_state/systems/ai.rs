//! # Mob AI and Melee
//!
//! Mobs chase the player while they can see them and swing once their
//! cooldown allows when in range. Sight is a unit-step ray through the grid
//! that closed doors also block.

use cgmath::{InnerSpace, MetricSpace, Point3};

use crate::{
    core::{dice::Dice, horizontal_direction, horizontal_distance},
    engine_state::{
        entities::{
            components::{Door, MobAi, Physics, STRIKE_PARTICLES},
            ComponentKind, EntityId, PLAYER_TAG,
        },
        voxels::grid::VoxelGrid,
        EngineState,
    },
};

/// Longest sight ray, in unit steps.
pub const MAX_SIGHT_STEPS: usize = 100;
/// Horizontal distance from a ray sample within which a closed door blocks it.
pub const DOOR_BLOCK_RADIUS: f32 = 1.5;
/// Camera kick when the player strikes.
pub const PLAYER_LUNGE: f32 = 0.5;
/// Camera kick when the player is struck.
pub const PLAYER_JOLT: f32 = 0.3;
/// Velocity given to a struck body along the strike.
pub const STRIKE_PUSHBACK: f32 = 0.1;

/// Whether a ray from `from` reaches `to` without passing through a solid
/// cell or near a closed door.
///
/// The ray advances one world unit per step and gives up after
/// [`MAX_SIGHT_STEPS`].
pub fn line_of_sight(
    grid: &VoxelGrid,
    closed_doors: &[Point3<f32>],
    from: Point3<f32>,
    to: Point3<f32>,
) -> bool {
    let delta = to - from;
    let distance = delta.magnitude();
    if distance < 1.0 {
        return true;
    }
    let step = delta / distance;

    let mut sample = from;
    for _ in 0..MAX_SIGHT_STEPS {
        sample += step;
        if sample.distance(to) < 1.0 {
            return true;
        }
        if grid.is_solid_at(sample) {
            return false;
        }
        if closed_doors
            .iter()
            .any(|door| horizontal_distance(*door, sample) < DOOR_BLOCK_RADIUS)
        {
            return false;
        }
    }
    false
}

/// Positions of every closed door, except the ones listed in `ignore`.
fn closed_doors(state: &EngineState, ignore: &[EntityId]) -> Vec<Point3<f32>> {
    state
        .entities
        .query(&[ComponentKind::Door, ComponentKind::Physics])
        .into_iter()
        .filter(|id| !ignore.contains(id))
        .filter(|id| state.entities.get::<Door>(*id).is_some_and(|door| !door.open))
        .filter_map(|id| state.entities.get::<Physics>(id).map(|body| body.pos))
        .collect()
}

/// Whether entity `from` can see entity `to`.
pub fn can_see(state: &EngineState, from: EntityId, to: EntityId) -> bool {
    let (Some(a), Some(b)) = (
        state.entities.get::<Physics>(from),
        state.entities.get::<Physics>(to),
    ) else {
        return false;
    };
    let doors = closed_doors(state, &[from, to]);
    line_of_sight(&state.grid, &doors, a.pos, b.pos)
}

/// Steers and attacks with every mob.
pub fn update_mob_ai(state: &mut EngineState) {
    if state.game_over {
        return;
    }
    let Some(player) = state.entities.first_tagged(PLAYER_TAG) else {
        return;
    };
    let Some(player_pos) = state.entities.get::<Physics>(player).map(|body| body.pos) else {
        return;
    };

    for mob in state.entities.query(&[ComponentKind::MobAi, ComponentKind::Physics]) {
        let Some(ai) = state.entities.get_mut::<MobAi>(mob) else {
            continue;
        };
        ai.cooldown = ai.cooldown.saturating_sub(1);
        let ai = ai.clone();

        let Some(mob_pos) = state.entities.get::<Physics>(mob).map(|body| body.pos) else {
            continue;
        };
        let distance = horizontal_distance(mob_pos, player_pos);
        if distance > ai.sight_range || !can_see(state, mob, player) {
            continue;
        }

        if distance > ai.attack_range {
            if let (Some(direction), Some(body)) = (
                horizontal_direction(mob_pos, player_pos),
                state.entities.get_mut::<Physics>(mob),
            ) {
                body.vel += direction * ai.acceleration;
            }
        } else if ai.cooldown == 0 {
            if let Some(ai) = state.entities.get_mut::<MobAi>(mob) {
                ai.cooldown = ai.cooldown_ticks;
            }
            melee(state, mob, player, &ai.attack_dice);
        }
    }
}

/// One melee blow from `attacker` to `target`.
///
/// Rolls the dice, kicks the camera if the player is involved, pushes the
/// target back along the strike, throws strike sparks and applies damage.
/// Returns the damage rolled, or `None` if either entity has no body.
pub fn melee(state: &mut EngineState, attacker: EntityId, target: EntityId, dice: &Dice) -> Option<i32> {
    let from = state.entities.get::<Physics>(attacker)?.pos;
    let to = state.entities.get::<Physics>(target)?.pos;
    let direction = horizontal_direction(from, to).unwrap_or_else(|| state.camera_state.camera.facing());

    let amount = dice.roll(&mut state.rng);

    if state.entities.has_tag(attacker, PLAYER_TAG) {
        let facing = state.camera_state.camera.facing();
        state.camera_state.camera.lunge(facing, PLAYER_LUNGE);
    }
    if state.entities.has_tag(target, PLAYER_TAG) {
        state.camera_state.camera.lunge(direction, PLAYER_JOLT);
    }

    if let Some(body) = state.entities.get_mut::<Physics>(target) {
        body.vel += direction * STRIKE_PUSHBACK;
    }
    state.spawn_particles(&STRIKE_PARTICLES, to);

    log::debug!("{} strikes {} for {}", attacker, target, amount);
    state.damage(target, amount, Some(attacker));
    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{grid::cell_center, tile::TileKey};

    /// A corridor one cell wide running along x at z = 1.
    fn corridor() -> VoxelGrid {
        let mut grid = VoxelGrid::new(12, 4, 3);
        for z in 0..3 {
            for x in 0..12 {
                grid.set(x, 0, z, Some(TileKey::FLOOR));
                if z != 1 {
                    grid.set(x, 1, z, Some(TileKey::WALL));
                    grid.set(x, 2, z, Some(TileKey::WALL));
                }
                grid.set(x, 3, z, Some(TileKey::CEILING));
            }
        }
        grid
    }

    #[test]
    fn sight_runs_down_an_open_corridor() {
        let grid = corridor();
        let from = cell_center(0, 1, 1);
        let to = cell_center(11, 1, 1);
        assert!(line_of_sight(&grid, &[], from, to));
    }

    #[test]
    fn a_solid_cell_blocks_sight() {
        let mut grid = corridor();
        grid.set(6, 1, 1, Some(TileKey::WALL));
        let from = cell_center(0, 1, 1);
        let to = cell_center(11, 1, 1);
        assert!(!line_of_sight(&grid, &[], from, to));
    }

    #[test]
    fn a_closed_door_blocks_sight() {
        let grid = corridor();
        let from = cell_center(0, 1, 1);
        let to = cell_center(11, 1, 1);
        assert!(!line_of_sight(&grid, &[cell_center(5, 1, 1)], from, to));
    }

    #[test]
    fn rays_longer_than_the_step_limit_fail() {
        let grid = VoxelGrid::new(80, 1, 1);
        let from = cell_center(0, 5, 0);
        let to = cell_center(79, 5, 0);
        assert!(!line_of_sight(&grid, &[], from, to));
    }
}
