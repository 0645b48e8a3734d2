//! # Voxel Dungeon Entry Point
//!
//! The native binary. It calls into the library's `run()` function to open
//! the window and start the game.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    voxel_dungeon::run();
}
