//! # Physics
//!
//! One explicit Euler step per body per tick:
//!
//! 1. gravity
//! 2. cone repulsion against every other cone body
//! 3. per-axis wall test at the collision layer, bouncing the blocked axis
//! 4. immovable bodies drop all velocity
//! 5. integration
//! 6. floor and ceiling clamp, with ground friction on floor contact
//!
//! There is no sub-stepping, so a fast enough body can tunnel through a wall.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::{
    config::{PhysicsConfig, WorldConfig},
    engine_state::{
        entities::{
            components::{Door, Physics, PhysicsCone},
            ComponentKind, EntityId, EntityStore,
        },
        voxels::grid::{world_to_cell, VoxelGrid},
        EngineState,
    },
};

#[derive(Debug, Clone, Copy)]
struct ConeBody {
    id: EntityId,
    pos: Point3<f32>,
    vel: Vector3<f32>,
    radius: f32,
    mass: f32,
    movable: bool,
}

/// Advances every physics body one tick.
pub fn update_physics(state: &mut EngineState) {
    let cones = cone_snapshot(&state.entities);

    for id in state.entities.query(&[ComponentKind::Physics]) {
        let own_cone = cones.iter().find(|cone| cone.id == id).copied();
        let Some(body) = state.entities.get_mut::<Physics>(id) else {
            continue;
        };

        body.vel.y -= state.config.physics.gravity * body.gravity_scale;

        if let Some(own) = own_cone {
            body.vel += cone_push(&own, &cones, &state.config.physics);
        }

        step_body(body, &state.grid, &state.config.physics, &state.config.world);
    }
}

/// Cone bodies as they were at the start of the tick. Open doors are left out.
fn cone_snapshot(entities: &EntityStore) -> Vec<ConeBody> {
    entities
        .query(&[ComponentKind::Physics, ComponentKind::PhysicsCone])
        .into_iter()
        .filter(|id| !entities.get::<Door>(*id).is_some_and(|door| door.open))
        .filter_map(|id| {
            let body = entities.get::<Physics>(id)?;
            let cone = entities.get::<PhysicsCone>(id)?;
            Some(ConeBody {
                id,
                pos: body.pos,
                vel: body.vel,
                radius: cone.radius,
                mass: body.mass,
                movable: body.movable,
            })
        })
        .collect()
}

/// Velocity change of `own` from every overlapping cone.
///
/// Overlap pushes the bodies apart in the xz plane, split by mass so the
/// lighter body takes the larger share. An immovable partner takes none.
fn cone_push(own: &ConeBody, cones: &[ConeBody], physics: &PhysicsConfig) -> Vector3<f32> {
    let mut push = Vector3::new(0.0, 0.0, 0.0);
    if !own.movable {
        return push;
    }

    for other in cones.iter().filter(|other| other.id != own.id) {
        let offset = Vector3::new(own.pos.x - other.pos.x, 0.0, own.pos.z - other.pos.z);
        let distance = offset.magnitude();
        let overlap = own.radius + other.radius - distance;
        if overlap <= 0.0 {
            continue;
        }

        let normal = if distance > f32::EPSILON {
            offset / distance
        } else {
            // Coincident centres: separate along the id order.
            if own.id < other.id {
                Vector3::unit_x()
            } else {
                -Vector3::unit_x()
            }
        };

        let share = if other.movable {
            other.mass / (own.mass + other.mass).max(f32::EPSILON)
        } else {
            1.0
        };

        let approaching = (other.vel - own.vel).dot(normal).max(0.0);
        push += normal * (overlap * physics.cone_stiffness + approaching * physics.cone_restitution) * share;
    }
    push
}

/// Wall test, integration and floor/ceiling clamp for one body.
pub fn step_body(body: &mut Physics, grid: &VoxelGrid, physics: &PhysicsConfig, world: &WorldConfig) {
    let (cell_x, _, cell_z) = world_to_cell(body.pos);
    let (next_x, _, _) = world_to_cell(body.pos + Vector3::new(body.vel.x, 0.0, 0.0));
    let (_, _, next_z) = world_to_cell(body.pos + Vector3::new(0.0, 0.0, body.vel.z));

    if grid.is_solid(next_x, world.collision_layer, cell_z) {
        body.vel.x *= physics.wall_bounce;
    }
    if grid.is_solid(cell_x, world.collision_layer, next_z) {
        body.vel.z *= physics.wall_bounce;
    }

    if !body.movable {
        body.vel = Vector3::new(0.0, 0.0, 0.0);
    }

    body.pos += body.vel;

    let half_height = body.height / 2.0;
    if body.pos.y - half_height <= world.ground_level {
        body.vel.y *= physics.floor_bounce;
        body.pos.y = world.ground_level + half_height;
        body.vel.x *= body.friction;
        body.vel.z *= body.friction;
    }
    if body.pos.y >= world.ceiling_level {
        body.vel.y *= physics.floor_bounce;
        body.pos.y = world.ceiling_level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GameConfig, engine_state::voxels::tile::TileKey};

    fn walled_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new(5, 3, 5);
        for z in 0..5 {
            for x in 0..5 {
                grid.set(x, 0, z, Some(TileKey::FLOOR));
            }
        }
        for z in 0..5 {
            grid.set(3, 1, z, Some(TileKey::WALL));
        }
        grid
    }

    #[test]
    fn walls_bounce_the_blocked_axis() {
        let config = GameConfig::default();
        let grid = walled_grid();
        let mut body = Physics::at(Point3::new(4.5, 3.0, 4.0)).with_size(1.0, 1.0, 1.0);
        body.vel = Vector3::new(1.0, 0.0, 0.25);

        step_body(&mut body, &grid, &config.physics, &config.world);

        assert!((body.vel.x - -0.3).abs() < 1e-6);
        assert!((body.vel.z - 0.25).abs() < 1e-6);
        assert!((body.pos.x - 4.2).abs() < 1e-5);
    }

    #[test]
    fn floor_contact_clamps_and_applies_friction() {
        let config = GameConfig::default();
        let grid = walled_grid();
        let mut body = Physics::at(Point3::new(2.0, 1.6, 2.0)).with_size(1.0, 1.0, 2.0);
        body.vel = Vector3::new(0.1, -0.5, 0.0);

        step_body(&mut body, &grid, &config.physics, &config.world);

        assert_eq!(body.pos.y, config.world.ground_level + 1.0);
        assert!((body.vel.y - 0.15).abs() < 1e-6);
        assert!((body.vel.x - 0.1 * body.friction).abs() < 1e-6);
    }

    #[test]
    fn immovable_bodies_keep_no_velocity() {
        let config = GameConfig::default();
        let grid = walled_grid();
        let mut body = Physics::at(Point3::new(2.0, 3.0, 2.0)).immovable();
        body.vel = Vector3::new(0.5, 0.0, 0.5);

        step_body(&mut body, &grid, &config.physics, &config.world);

        assert_eq!(body.vel, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!((body.pos.x, body.pos.z), (2.0, 2.0));
    }

    #[test]
    fn overlapping_cones_push_apart_by_mass() {
        let physics = PhysicsConfig::default();
        let mut store = EntityStore::new();
        let a = store.create_entity();
        let b = store.create_entity();
        let light = ConeBody {
            id: a,
            pos: Point3::new(0.0, 0.0, 0.0),
            vel: Vector3::new(0.0, 0.0, 0.0),
            radius: 1.0,
            mass: 1.0,
            movable: true,
        };
        let heavy = ConeBody {
            id: b,
            pos: Point3::new(1.0, 0.0, 0.0),
            mass: 3.0,
            ..light
        };
        let cones = [light, heavy];

        let light_push = cone_push(&light, &cones, &physics);
        let heavy_push = cone_push(&heavy, &cones, &physics);
        assert!(light_push.x < 0.0 && heavy_push.x > 0.0);
        assert!((light_push.x.abs() - 3.0 * heavy_push.x.abs()).abs() < 1e-6);
    }
}
