//! # Systems
//!
//! Per-tick passes over the entity store. Each system takes the whole
//! [`EngineState`](super::EngineState), walks a query snapshot and reports
//! anything other systems care about through the event bus.
//!
//! Run order is fixed by [`EngineState::tick`](super::EngineState::tick).

pub mod ai;
pub mod particles;
pub mod physics;
pub mod text;
