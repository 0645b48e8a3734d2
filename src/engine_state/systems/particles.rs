//! Particle bursts.

use cgmath::Vector3;

use crate::engine_state::{
    entities::{components::ParticleEffect, ComponentKind},
    EngineState,
};

/// Downward pull on a spark per tick.
pub const PARTICLE_GRAVITY: f32 = 0.003;

/// Moves every spark, fades every effect and removes spent effects.
pub fn update_particles(state: &mut EngineState) {
    for id in state.entities.query(&[ComponentKind::ParticleEffect]) {
        let Some(effect) = state.entities.get_mut::<ParticleEffect>(id) else {
            continue;
        };
        if advance(effect) {
            state.entities.remove(id);
        }
    }
}

/// One tick of an effect. Returns `true` once it has faded out.
fn advance(effect: &mut ParticleEffect) -> bool {
    for particle in &mut effect.particles {
        particle.pos += particle.vel;
        particle.vel -= Vector3::unit_y() * PARTICLE_GRAVITY;
    }
    effect.color[3] -= effect.fade_rate;
    effect.color[3] <= 0.0
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::entities::components::{Particle, HIT_PARTICLES};

    #[test]
    fn sparks_fall_and_effects_fade_out() {
        let mut effect = ParticleEffect {
            particles: vec![Particle {
                pos: Point3::new(0.0, 1.0, 0.0),
                vel: Vector3::new(0.0, 0.0, 0.0),
            }],
            color: [1.0, 1.0, 1.0, 1.0],
            fade_rate: 0.25,
        };
        assert!(!advance(&mut effect));
        assert!(!advance(&mut effect));
        assert!(effect.particles[0].pos.y < 1.0);
        assert!(!advance(&mut effect));
        assert!(advance(&mut effect));
    }

    #[test]
    fn bursts_spawn_the_preset_count() {
        let mut rng = fastrand::Rng::with_seed(7);
        let effect = ParticleEffect::burst(&HIT_PARTICLES, Point3::new(1.0, 2.0, 3.0), &mut rng);
        assert_eq!(effect.particles.len(), HIT_PARTICLES.count);
        assert!(effect.particles.iter().all(|p| p.pos == Point3::new(1.0, 2.0, 3.0)));
    }
}
