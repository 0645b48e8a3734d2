//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Window creation
//! - Input handling
//! - Fixed-step simulation timing
//! - Level transitions
//!
//! The host owns no GPU resources. Each redraw it asks the engine for a
//! [`DrawList`](crate::engine_state::rendering::DrawList) and the HUD readout,
//! which a rendering backend consumes.

pub mod input_manager;
pub mod input_state;

use std::sync::Arc;

use input_manager::InputManager;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::GameConfig,
    engine_state::{voxels::level::DungeonLayout, EngineState},
};

/// Title of the host window.
pub const WINDOW_TITLE: &str = "Voxel Dungeon";

/// Rooms requested from the dungeon layout for every level.
pub const ROOMS_PER_LEVEL: usize = 8;

/// Upper bound on simulation steps run for a single frame.
const MAX_TICKS_PER_FRAME: u32 = 5;

/// The main application state container that manages the application's lifecycle.
///
/// The running state is created the first time the application is resumed.
#[derive(Default)]
pub struct ApplicationState {
    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    /// The dungeon simulation
    pub engine_state: EngineState,

    /// Handle to the application window
    pub window: Arc<Window>,

    /// Manages input state and event processing
    pub input_manager: InputManager,

    /// Source of dungeon layouts for each new level
    pub layout_rng: fastrand::Rng,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,

    /// Wall time not yet consumed by simulation steps
    pub accumulated: web_time::Duration,

    /// Frame counter for the once-a-second FPS report
    pub frame_timer: FrameTimer,
}

/// Counts frames and reports the rate once a second.
#[derive(Debug)]
pub struct FrameTimer {
    frames: u32,
    window_start: web_time::Instant,
}

impl FrameTimer {
    /// Starts counting from `now`.
    pub fn new(now: web_time::Instant) -> Self {
        Self {
            frames: 0,
            window_start: now,
        }
    }

    /// Records a frame and returns the frame rate when a full second has passed.
    pub fn frame(&mut self, now: web_time::Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now - self.window_start;
        if elapsed.as_secs_f64() < 1.0 {
            return None;
        }
        let fps = f64::from(self.frames) / elapsed.as_secs_f64();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

impl InitializedApplicationState {
    fn step_duration(&self) -> web_time::Duration {
        let rate = self.engine_state.config.timing.ticks_per_second.max(1);
        web_time::Duration::from_secs_f64(1.0 / f64::from(rate))
    }

    /// Loads a freshly scattered dungeon into the engine.
    fn load_next_level(&mut self) {
        let world = &self.engine_state.config.world;
        let dungeon = DungeonLayout::scatter(
            world.dungeon_width,
            world.dungeon_depth,
            ROOMS_PER_LEVEL,
            &mut self.layout_rng,
        );
        if let Err(err) = self.engine_state.load_level(&dungeon) {
            log::error!("Failed to load level: {}", err);
        }
    }

    /// Runs every simulation step the elapsed wall time covers.
    fn advance(&mut self, now: web_time::Instant) {
        self.accumulated += now - self.last_wait_time;
        self.last_wait_time = now;

        let step = self.step_duration();
        let mut ticks = 0;
        while self.accumulated >= step && ticks < MAX_TICKS_PER_FRAME {
            self.engine_state.tick();
            self.accumulated -= step;
            ticks += 1;

            if self.engine_state.wants_level_advance() {
                log::info!("Advancing past level {}", self.engine_state.depth);
                self.load_next_level();
            }
        }
        if ticks == MAX_TICKS_PER_FRAME {
            // Drop the backlog instead of spiralling.
            self.accumulated = web_time::Duration::ZERO;
        }
    }

    fn render(&mut self) {
        let frame = self.engine_state.draw_list();
        let (vertices, indices) = self.engine_state.level_mesh();
        log::trace!(
            "Frame: {} draw items, level mesh {} vertices / {} indices, {} tasks waiting",
            frame.items.len(),
            vertices.len(),
            indices.len(),
            self.engine_state.task_manager.len()
        );
        if let Some(hud) = self.engine_state.hud() {
            log::trace!("HUD: {:?}", hud);
        }

        if let Some(fps) = self.frame_timer.frame(web_time::Instant::now()) {
            log::info!("FPS: {:.1}", fps);
        }
    }
}

impl ApplicationState {
    /// Creates the window and the engine, and loads the first level.
    fn initialize_application_state(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes().with_title(WINDOW_TITLE);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        let seed = fastrand::u64(..);
        log::info!("Starting dungeon with seed {}", seed);
        let mut engine_state = EngineState::new(GameConfig::from_env(), seed);
        let size = window.inner_size();
        engine_state.resize(size.width, size.height);

        let now = web_time::Instant::now();
        let mut state = InitializedApplicationState {
            engine_state,
            window,
            input_manager: InputManager::new(),
            layout_rng: fastrand::Rng::with_seed(seed),
            last_wait_time: now,
            accumulated: web_time::Duration::ZERO,
            frame_timer: FrameTimer::new(now),
        };
        state.load_next_level();
        self.state = Some(state);
    }
}

impl ApplicationHandler for ApplicationState {
    /// Handles window-related events such as resize, focus changes, and input events.
    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.input_manager.intake_input(&event);

        match event {
            WindowEvent::Resized(size) => {
                state.engine_state.resize(size.width, size.height);
            }
            WindowEvent::Focused(is_focused) => {
                if !is_focused {
                    state.input_manager.release_all();
                }
            }
            WindowEvent::RedrawRequested => {
                state.render();
            }
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            _ => (),
        }
    }

    /// Handles device-level input events such as mouse motion.
    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.input_manager.intake_mouse_motion(delta);
            }
        }
    }

    /// Creates the running state the first time the application is resumed.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            self.initialize_application_state(event_loop);
        }
    }

    /// Feeds input to the engine, runs due simulation steps and requests a redraw.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            let processed_input = state.input_manager.get_and_reset_processed_input();
            state.engine_state.set_input_commands(processed_input);

            state.advance(web_time::Instant::now());
            state.window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timer_reports_once_a_second() {
        let start = web_time::Instant::now();
        let mut timer = FrameTimer::new(start);
        for n in 1..60 {
            let at = start + web_time::Duration::from_millis(n * 16);
            assert_eq!(timer.frame(at), None);
        }
        let fps = timer.frame(start + web_time::Duration::from_secs(1));
        assert!(fps.is_some_and(|fps| (fps - 60.0).abs() < 1e-6));
        assert_eq!(timer.frame(start + web_time::Duration::from_millis(1016)), None);
    }
}
