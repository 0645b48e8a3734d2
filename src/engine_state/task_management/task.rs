//! # Deferred Tasks
//!
//! A `Task` is a continuation scheduled for a later tick: resolving a typed
//! command after its reading delay, rejecting an invalid word, expiring a
//! notification banner.
//!
//! ## Task Lifecycle
//! 1. A `Task` is scheduled via `TaskManager::publish_task()`
//! 2. When its tick arrives, `TaskManager::take_due()` hands it back
//! 3. The engine checks [`Task::entities`] are all still alive
//! 4. Live tasks run; tasks whose entities are gone are dropped
//!
//! Tasks only hold entity ids, never references, so a task outliving its
//! entity is harmless.

use crate::engine_state::{commands::Command, entities::EntityId};

/// A unit of deferred gameplay work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Run a matched command's effect and color the target's buffer by its result.
    ResolveCommand {
        /// Entity that typed the word
        actor: EntityId,
        /// Entity whose buffer holds the word
        target: EntityId,
        /// Effect to run
        command: Command,
    },
    /// Color an unmatched buffer red and fade it out.
    RejectWord {
        /// Entity whose buffer holds the word
        target: EntityId,
    },
    /// Remove a notification banner.
    ExpireNotification {
        /// Banner id
        id: u64,
    },
}

impl Task {
    /// Entities that must still be alive for the task to run.
    pub fn entities(&self) -> Vec<EntityId> {
        match self {
            Task::ResolveCommand { actor, target, .. } => vec![*actor, *target],
            Task::RejectWord { target } => vec![*target],
            Task::ExpireNotification { .. } => Vec::new(),
        }
    }
}
