//! Letter delivery and command resolution for text buffers.

use crate::engine_state::{
    entities::{
        components::{Lexicon, TextHolder, FAILURE_COLOR, INVALID_COLOR, SUCCESS_COLOR},
        EntityId,
    },
    task_management::task::Task,
    EngineState,
};

use super::{check_lexicon, effects, Command, LexiconMatch};

/// What happened to a delivered letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterOutcome {
    /// The target has no buffer or its buffer is locked.
    Dropped,
    /// The buffer is a prefix of a word and stays open.
    Pending,
    /// The buffer matched a word; its effect is scheduled.
    Matched(Command),
    /// The buffer matches nothing; a rejection is scheduled.
    Rejected,
}

/// Words `target` responds to that `actor` also knows.
///
/// An actor without a lexicon of its own is not restricted.
pub fn effective_words(state: &EngineState, actor: EntityId, target: EntityId) -> Vec<String> {
    let Some(target_words) = state.entities.get::<Lexicon>(target) else {
        return Vec::new();
    };
    match state.entities.get::<Lexicon>(actor) {
        Some(known) => target_words
            .words
            .iter()
            .filter(|word| known.knows(word))
            .cloned()
            .collect(),
        None => target_words.words.clone(),
    }
}

/// Appends `letter` to the target's buffer and matches the result.
pub fn deliver_letter(state: &mut EngineState, actor: EntityId, target: EntityId, letter: char) -> LetterOutcome {
    let words = effective_words(state, actor, target);

    let Some(holder) = state.entities.get_mut::<TextHolder>(target) else {
        return LetterOutcome::Dropped;
    };
    if !holder.push(letter) {
        log::debug!("{} dropped letter {:?}: buffer locked", target, letter);
        return LetterOutcome::Dropped;
    }

    match check_lexicon(&words, &holder.text) {
        LexiconMatch::Prefix => LetterOutcome::Pending,
        LexiconMatch::Command(command) => {
            holder.locked = true;
            log::debug!("{} matched {:?} on {}", actor, holder.text, target);
            let delay = state.config.timing.command_delay_ticks;
            state.task_manager.publish_task(
                state.tick,
                delay,
                Task::ResolveCommand {
                    actor,
                    target,
                    command,
                },
            );
            LetterOutcome::Matched(command)
        }
        LexiconMatch::Invalid => {
            holder.locked = true;
            log::debug!("{} rejected {:?}", target, holder.text);
            let delay = state.config.timing.reject_delay_ticks;
            state
                .task_manager
                .publish_task(state.tick, delay, Task::RejectWord { target });
            LetterOutcome::Rejected
        }
    }
}

/// Runs a matched command and colors the buffer by its result.
pub fn resolve_command(state: &mut EngineState, actor: EntityId, target: EntityId, command: Command) {
    let succeeded = effects::apply(state, command, actor, target);
    log::debug!("{:?} by {} on {}: {}", command, actor, target, succeeded);

    if let Some(holder) = state.entities.get_mut::<TextHolder>(target) {
        holder.color = if succeeded { SUCCESS_COLOR } else { FAILURE_COLOR };
        holder.fade_out();
    }
}

/// Colors an unmatched buffer red and fades it.
pub fn reject_word(state: &mut EngineState, target: EntityId) {
    if let Some(holder) = state.entities.get_mut::<TextHolder>(target) {
        holder.color = INVALID_COLOR;
        holder.fade_out();
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::{
        config::GameConfig,
        engine_state::entities::components::{Door, Physics},
    };

    fn door_scene() -> (EngineState, EntityId, EntityId) {
        let mut state = EngineState::new(GameConfig::default(), 1);
        let player = state.entities.create_entity();
        let door = state.spawn_door(Point3::new(6.0, 3.0, 6.0));
        (state, player, door)
    }

    fn holder(state: &EngineState, id: EntityId) -> TextHolder {
        state.entities.get::<TextHolder>(id).cloned().unwrap_or_default()
    }

    #[test]
    fn typing_open_opens_the_door() {
        let (mut state, player, door) = door_scene();

        assert_eq!(deliver_letter(&mut state, player, door, 'o'), LetterOutcome::Pending);
        assert_eq!(deliver_letter(&mut state, player, door, 'p'), LetterOutcome::Pending);
        assert!(!holder(&state, door).locked);

        assert_eq!(deliver_letter(&mut state, player, door, 'e'), LetterOutcome::Pending);
        assert_eq!(
            deliver_letter(&mut state, player, door, 'n'),
            LetterOutcome::Matched(Command::Open)
        );
        assert!(holder(&state, door).locked);
        assert_eq!(deliver_letter(&mut state, player, door, 'x'), LetterOutcome::Dropped);
        assert_eq!(holder(&state, door).text, "open");

        for _ in 0..state.config.timing.command_delay_ticks {
            assert!(!state.entities.get::<Door>(door).is_some_and(|d| d.open));
            state.tick();
        }
        assert!(state.entities.get::<Door>(door).is_some_and(|d| d.open));
        let after = holder(&state, door);
        assert_eq!(after.color, SUCCESS_COLOR);
        assert!(after.fading);

        for _ in 0..100 {
            state.tick();
        }
        assert_eq!(holder(&state, door), TextHolder::default());
    }

    #[test]
    fn opening_an_open_door_fails_gray() {
        let (mut state, player, door) = door_scene();
        if let Some(d) = state.entities.get_mut::<Door>(door) {
            d.open = true;
        }
        for letter in "open".chars() {
            deliver_letter(&mut state, player, door, letter);
        }
        for _ in 0..state.config.timing.command_delay_ticks {
            state.tick();
        }
        assert_eq!(holder(&state, door).color, FAILURE_COLOR);
    }

    #[test]
    fn unknown_words_are_rejected_red() {
        let (mut state, player, door) = door_scene();
        assert_eq!(deliver_letter(&mut state, player, door, 'q'), LetterOutcome::Rejected);
        assert!(holder(&state, door).locked);
        for _ in 0..state.config.timing.reject_delay_ticks {
            state.tick();
        }
        let after = holder(&state, door);
        assert_eq!(after.color, INVALID_COLOR);
        assert!(state.entities.get::<Door>(door).is_some_and(|d| !d.open));
    }

    #[test]
    fn actors_only_use_words_they_know() {
        let (mut state, player, door) = door_scene();
        state.entities.add_component(player, Lexicon::new(&["close"]));
        assert_eq!(effective_words(&state, player, door), vec!["close".to_string()]);
        assert_eq!(deliver_letter(&mut state, player, door, 'o'), LetterOutcome::Rejected);
    }

    #[test]
    fn entities_without_buffers_drop_letters() {
        let (mut state, player, _) = door_scene();
        let rock = state.entities.create_entity();
        state.entities.add_component(rock, Physics::default());
        assert_eq!(deliver_letter(&mut state, player, rock, 'a'), LetterOutcome::Dropped);
    }
}
