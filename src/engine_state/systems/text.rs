//! # Floating Text
//!
//! Typed letters fly as physics bodies until they come within reach of an
//! entity that accepts text. Buffers fade after resolving, and floating text
//! expires on its own tick.

use crate::{
    core::horizontal_distance,
    engine_state::{
        commands::interpreter::deliver_letter,
        entities::{
            components::{Physics, Text3D, TextHolder, TextProjectile, HIT_PARTICLES},
            ComponentKind,
        },
        EngineState,
    },
};

/// Horizontal distance at which a letter lands on a text holder.
pub const LETTER_HIT_RADIUS: f32 = 1.0;
/// Share of a landing letter's velocity passed to the holder.
pub const LETTER_NUDGE: f32 = 0.01;

/// Lands letters on text holders and hands them to the interpreter.
///
/// A letter lands on the first holder in creation order within
/// [`LETTER_HIT_RADIUS`] that is not its own shooter.
pub fn update_letters(state: &mut EngineState) {
    let holders = state
        .entities
        .query(&[ComponentKind::TextHolder, ComponentKind::Physics]);

    for letter_id in state
        .entities
        .query(&[ComponentKind::TextProjectile, ComponentKind::Physics])
    {
        let (Some(projectile), Some(body)) = (
            state.entities.get::<TextProjectile>(letter_id).copied(),
            state.entities.get::<Physics>(letter_id).copied(),
        ) else {
            continue;
        };

        let hit = holders.iter().copied().find(|holder| {
            *holder != projectile.shooter
                && state.entities.is_alive(*holder)
                && state
                    .entities
                    .get::<Physics>(*holder)
                    .is_some_and(|target| horizontal_distance(target.pos, body.pos) < LETTER_HIT_RADIUS)
        });
        let Some(target) = hit else {
            continue;
        };

        if let Some(target_body) = state.entities.get_mut::<Physics>(target) {
            target_body.vel.x += body.vel.x * LETTER_NUDGE;
            target_body.vel.z += body.vel.z * LETTER_NUDGE;
        }
        state.spawn_particles(&HIT_PARTICLES, body.pos);
        state.entities.remove(letter_id);

        deliver_letter(state, projectile.shooter, target, projectile.letter);
    }
}

/// Advances buffer fades.
pub fn update_text_holders(state: &mut EngineState) {
    let fade = state.config.timing.fade_per_tick;
    for id in state.entities.query(&[ComponentKind::TextHolder]) {
        if let Some(holder) = state.entities.get_mut::<TextHolder>(id) {
            holder.update(fade);
        }
    }
}

/// Removes floating text whose time is up.
pub fn expire_text(state: &mut EngineState) {
    let now = state.tick;
    for id in state.entities.query(&[ComponentKind::Text3D]) {
        let expired = state
            .entities
            .get::<Text3D>(id)
            .and_then(|text| text.expire_tick)
            .is_some_and(|tick| now >= tick);
        if expired {
            state.entities.remove(id);
        }
    }
}
