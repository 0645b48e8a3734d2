#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Dungeon
//!
//! A first-person voxel dungeon crawler core. Players act by typing words at
//! entities: letters fly out of the player's head, land in the text buffer of
//! whatever they hit, and a completed word from the target's lexicon runs its
//! command.
//!
//! ## Key Modules
//!
//! * `application_state` - Window, input devices and the fixed-step host loop
//! * `config` - Tunable game parameters loaded from JSON
//! * `core` - Dice notation and small geometry helpers
//! * `engine_state` - The simulation: voxel grid, entities, systems and commands
//! * `error` - Error types of the fallible operations
//!
//! ## Architecture
//!
//! The crate separates:
//! * The host (window events, timing, level transitions)
//! * The simulation context, advanced one fixed tick at a time
//! * A renderer boundary made of a level mesh, a draw list and a HUD readout
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_dungeon::run();
//! }
//! ```

use application_state::ApplicationState;

use winit::event_loop::EventLoop;

use log::info;

pub mod application_state;
pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

/// Starts logging, opens the window and runs the game until it is closed.
///
/// Set `RUST_LOG` to choose the log level and `VOXEL_DUNGEON_CONFIG` to point
/// at a JSON config file.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {}", err);
            return;
        }
    };

    let mut state = ApplicationState::default();

    if let Err(err) = event_loop.run_app(&mut state) {
        log::error!("Event loop stopped with an error: {}", err);
    }
}
