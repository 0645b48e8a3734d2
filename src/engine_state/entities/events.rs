//! # Entity Events
//!
//! The only channel systems use to tell each other something happened to an
//! entity. Events are queued while systems run and dispatched once per tick
//! to the handlers registered for the (entity, event kind) pair, so no
//! handler ever runs in the middle of another system's pass.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

use super::EntityId;
use crate::engine_state::EngineState;

/// Something that happened to an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Health dropped by `amount`.
    Damaged {
        /// Damage dealt
        amount: i32,
        /// Who dealt it
        attacker: Option<EntityId>,
    },
    /// Health reached zero. Fired once per entity.
    Died {
        /// Who dealt the killing blow
        attacker: Option<EntityId>,
    },
    /// Experience crossed a level threshold.
    LevelUp {
        /// Level reached
        level: u32,
    },
    /// An item was taken.
    PickedUp {
        /// Item name
        item: String,
        /// Entity that took it
        by: EntityId,
    },
}

/// Discriminant of a [`GameEvent`], used to key handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`GameEvent::Damaged`]
    Damaged,
    /// [`GameEvent::Died`]
    Died,
    /// [`GameEvent::LevelUp`]
    LevelUp,
    /// [`GameEvent::PickedUp`]
    PickedUp,
}

impl GameEvent {
    /// The event's kind.
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::Damaged { .. } => EventKind::Damaged,
            GameEvent::Died { .. } => EventKind::Died,
            GameEvent::LevelUp { .. } => EventKind::LevelUp,
            GameEvent::PickedUp { .. } => EventKind::PickedUp,
        }
    }
}

/// A function run when an entity receives an event.
pub type EventHandler = fn(&mut EngineState, EntityId, &GameEvent);

/// Queue of pending events plus the per-entity handler table.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<(EntityId, GameEvent)>,
    handlers: HashMap<(EntityId, EventKind), Vec<EventHandler>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("queue", &self.queue)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one kind of event on one entity.
    pub fn on(&mut self, entity: EntityId, kind: EventKind, handler: EventHandler) {
        self.handlers.entry((entity, kind)).or_default().push(handler);
    }

    /// Queues an event for the next dispatch.
    pub fn emit(&mut self, entity: EntityId, event: GameEvent) {
        self.queue.push_back((entity, event));
    }

    /// Removes the oldest pending event.
    pub fn pop(&mut self) -> Option<(EntityId, GameEvent)> {
        self.queue.pop_front()
    }

    /// Handlers registered for an entity and event kind.
    pub fn handlers(&self, entity: EntityId, kind: EventKind) -> Vec<EventHandler> {
        self.handlers
            .get(&(entity, kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Drops every handler and pending event of a removed entity.
    pub fn forget(&mut self, entity: EntityId) {
        self.handlers.retain(|(owner, _), _| *owner != entity);
        self.queue.retain(|(owner, _)| *owner != entity);
    }

    /// Drops all handlers and pending events.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn note_first(state: &mut EngineState, _: EntityId, _: &GameEvent) {
        state.notify("first");
    }

    fn note_second(state: &mut EngineState, _: EntityId, _: &GameEvent) {
        state.notify("second");
    }

    fn chain_level_up(state: &mut EngineState, entity: EntityId, _: &GameEvent) {
        state.notify("damaged");
        state.events.emit(entity, GameEvent::LevelUp { level: 2 });
    }

    fn note_level_up(state: &mut EngineState, _: EntityId, event: &GameEvent) {
        if let GameEvent::LevelUp { level } = event {
            state.notify(&format!("level {}", level));
        }
    }

    fn notes(state: &EngineState) -> Vec<&str> {
        state.notifications.iter().map(|n| n.text.as_str()).collect()
    }

    fn hurt() -> GameEvent {
        GameEvent::Damaged {
            amount: 1,
            attacker: None,
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut state = EngineState::new(GameConfig::default(), 1);
        let id = state.entities.create_entity();
        state.events.on(id, EventKind::Damaged, note_first);
        state.events.on(id, EventKind::Damaged, note_second);
        state.events.on(id, EventKind::Died, note_level_up);

        state.events.emit(id, hurt());
        state.dispatch_events();
        assert_eq!(notes(&state), vec!["first", "second"]);
        assert!(state.events.pop().is_none());
    }

    #[test]
    fn events_raised_by_handlers_are_dispatched_after() {
        let mut state = EngineState::new(GameConfig::default(), 1);
        let id = state.entities.create_entity();
        state.events.on(id, EventKind::Damaged, chain_level_up);
        state.events.on(id, EventKind::LevelUp, note_level_up);
        state.events.on(id, EventKind::Damaged, note_second);

        state.events.emit(id, hurt());
        state.dispatch_events();
        assert_eq!(notes(&state), vec!["damaged", "second", "level 2"]);
    }

    #[test]
    fn forget_drops_handlers_and_queued_events() {
        let mut bus = EventBus::new();
        let mut state = EngineState::new(GameConfig::default(), 1);
        let gone = state.entities.create_entity();
        let kept = state.entities.create_entity();
        bus.on(gone, EventKind::Damaged, note_first);
        bus.on(kept, EventKind::Damaged, note_first);
        bus.emit(gone, hurt());
        bus.emit(kept, hurt());

        bus.forget(gone);
        assert!(bus.handlers(gone, EventKind::Damaged).is_empty());
        assert_eq!(bus.handlers(kept, EventKind::Damaged).len(), 1);
        assert_eq!(bus.pop().map(|(id, _)| id), Some(kept));
        assert!(bus.pop().is_none());
    }

    #[test]
    fn reaped_entities_receive_nothing() {
        let mut state = EngineState::new(GameConfig::default(), 1);
        let id = state.entities.create_entity();
        state.events.on(id, EventKind::Damaged, note_first);
        state.entities.remove(id);
        state.entities.reap();

        state.events.emit(id, hurt());
        state.dispatch_events();
        assert!(state.notifications.is_empty());
        assert!(state.events.pop().is_none());
    }
}
