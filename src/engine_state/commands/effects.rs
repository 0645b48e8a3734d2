//! Effects run by matched commands.
//!
//! Every effect reports whether it did anything; the interpreter colors the
//! target's buffer by that result.

use cgmath::MetricSpace;

use crate::engine_state::{
    entities::{
        components::{Door, Health, Inventory, Item, Lexicon, Mana, Physics, STRIKE_PARTICLES},
        events::GameEvent,
        EntityId,
    },
    systems::ai::{can_see, melee, PLAYER_LUNGE},
    EngineState,
};

use super::Command;

/// Runs `command` from `actor` on `target`.
pub fn apply(state: &mut EngineState, command: Command, actor: EntityId, target: EntityId) -> bool {
    match command {
        Command::Hit => hit(state, actor, target),
        Command::Zap => zap(state, actor, target),
        Command::Open => set_door(state, target, true),
        Command::Close => set_door(state, target, false),
        Command::Take => take(state, actor, target),
    }
}

fn distance(state: &EngineState, a: EntityId, b: EntityId) -> Option<f32> {
    let a = state.entities.get::<Physics>(a)?.pos;
    let b = state.entities.get::<Physics>(b)?.pos;
    Some(a.distance(b))
}

/// The swing always kicks the camera; it only lands within reach.
fn hit(state: &mut EngineState, actor: EntityId, target: EntityId) -> bool {
    let facing = state.camera_state.camera.facing();
    state.camera_state.camera.lunge(facing, PLAYER_LUNGE);

    if !state.entities.has::<Health>(target) {
        return false;
    }
    match distance(state, actor, target) {
        Some(d) if d <= state.config.combat.player_reach => {
            let dice = state.dice.weapon;
            melee(state, actor, target, &dice).is_some()
        }
        _ => false,
    }
}

fn zap(state: &mut EngineState, actor: EntityId, target: EntityId) -> bool {
    if !state.entities.has::<Health>(target) || !can_see(state, actor, target) {
        return false;
    }
    let cost = state.config.combat.zap_mana_cost;
    let paid = state
        .entities
        .get_mut::<Mana>(actor)
        .is_some_and(|mana| mana.spend(cost));
    if !paid {
        state.notify("Not enough mana");
        return false;
    }

    let amount = state.dice.zap.roll(&mut state.rng);
    if let Some(at) = state.entities.get::<Physics>(target).map(|body| body.pos) {
        state.spawn_particles(&STRIKE_PARTICLES, at);
    }
    state.damage(target, amount, Some(actor));
    true
}

fn set_door(state: &mut EngineState, target: EntityId, open: bool) -> bool {
    match state.entities.get_mut::<Door>(target) {
        Some(door) if door.open != open => {
            door.open = open;
            true
        }
        _ => false,
    }
}

fn take(state: &mut EngineState, actor: EntityId, target: EntityId) -> bool {
    if !state.entities.is_alive(target) {
        return false;
    }
    let Some(item) = state.entities.get::<Item>(target).cloned() else {
        return false;
    };

    match state.entities.get_mut::<Inventory>(actor) {
        Some(inventory) => inventory.items.push(item.name.clone()),
        None => return false,
    }
    if let Some(lexicon) = state.entities.get_mut::<Lexicon>(actor) {
        for verb in &item.verbs {
            lexicon.grant(verb);
        }
    }

    state.events.emit(
        target,
        GameEvent::PickedUp {
            item: item.name.clone(),
            by: actor,
        },
    );
    state.entities.remove(target);
    state.notify(&format!("Picked up {}", item.name));
    true
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn doors_only_toggle_into_the_other_state() {
        let mut state = EngineState::new(GameConfig::default(), 3);
        let door = state.spawn_door(Point3::new(0.0, 3.0, 0.0));
        assert!(!apply(&mut state, Command::Close, door, door));
        assert!(apply(&mut state, Command::Open, door, door));
        assert!(!apply(&mut state, Command::Open, door, door));
        assert!(apply(&mut state, Command::Close, door, door));
    }

    #[test]
    fn taking_an_item_teaches_its_verbs() {
        let mut state = EngineState::new(GameConfig::default(), 3);
        let player = state.spawn_player(Point3::new(0.0, 3.0, 0.0));
        let wand = state.spawn_item(Point3::new(2.0, 3.0, 0.0), "wand", &["zap"]);

        assert!(apply(&mut state, Command::Take, player, wand));
        assert!(!state.entities.is_alive(wand));
        let known = state.entities.get::<Lexicon>(player).cloned().unwrap_or_default();
        assert!(known.knows("zap"));
        let inventory = state.entities.get::<Inventory>(player).cloned().unwrap_or_default();
        assert_eq!(inventory.items, vec!["wand".to_string()]);
        assert!(!apply(&mut state, Command::Take, player, wand));
    }

    #[test]
    fn hits_only_land_within_reach() {
        let mut state = EngineState::new(GameConfig::default(), 3);
        let player = state.spawn_player(Point3::new(0.0, 3.0, 0.0));
        let far = state.spawn_mob(Point3::new(20.0, 3.0, 0.0));
        let near = state.spawn_mob(Point3::new(3.0, 3.0, 0.0));

        assert!(!apply(&mut state, Command::Hit, player, far));
        assert!(apply(&mut state, Command::Hit, player, near));
        let health = state.entities.get::<Health>(near).map(|h| h.amount);
        assert!(health < Some(state.config.combat.mob_health));
        assert_eq!(
            state.entities.get::<Health>(far).map(|h| h.amount),
            Some(state.config.combat.mob_health)
        );
    }

    #[test]
    fn zap_spends_mana_and_stops_when_empty() {
        let mut state = EngineState::new(GameConfig::default(), 3);
        let player = state.spawn_player(Point3::new(0.0, 3.0, 0.0));
        let mob = state.spawn_mob(Point3::new(6.0, 3.0, 0.0));
        if let Some(health) = state.entities.get_mut::<Health>(mob) {
            health.raise_max(1000);
        }

        let casts = state.config.combat.player_mana / state.config.combat.zap_mana_cost;
        for _ in 0..casts {
            assert!(apply(&mut state, Command::Zap, player, mob));
        }
        assert!(!apply(&mut state, Command::Zap, player, mob));
        assert_eq!(state.entities.get::<Mana>(player).map(|m| m.amount), Some(0));
    }
}
