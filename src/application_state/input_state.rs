//! # Input State
//!
//! Per-frame snapshots of the steering keys, mouse buttons, pointer motion
//! and typed text, as handed from the input manager to the engine.

use std::collections::HashMap;
use winit::{event::MouseButton, keyboard::KeyCode};

/// Edge-aware state of one key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawInputState {
    /// Up this frame and the last
    #[default]
    NotPressed,
    /// Went down this frame
    Pressed,
    /// Down this frame and the last
    Held,
    /// Went up this frame
    Released,
}

impl RawInputState {
    /// Whether the input is down, newly or not
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Whether the input went down this frame
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Derives the state from last frame's and this frame's raw down flags
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// One frame of input as the engine consumes it.
#[derive(Debug, Default)]
pub struct ProcessedInputState {
    /// Steering keys
    pub keyboard_states: HashMap<KeyCode, RawInputState>,

    /// Mouse buttons
    pub mouse_button_states: HashMap<MouseButton, RawInputState>,

    /// Mouse movement delta since the last frame (x, y)
    pub mouse_delta: Option<(f64, f64)>,

    /// Characters typed since the last frame, in order
    pub typed: Vec<char>,
}

impl ProcessedInputState {
    /// State of `key`, `NotPressed` if untracked
    pub fn get_key_state(&self, key: KeyCode) -> RawInputState {
        self.keyboard_states.get(&key).copied().unwrap_or_default()
    }

    /// State of `button`, `NotPressed` if untracked
    pub fn get_mouse_button_state(&self, button: MouseButton) -> RawInputState {
        self.mouse_button_states.get(&button).copied().unwrap_or_default()
    }

    /// Pointer motion accumulated over the frame
    pub fn get_mouse_delta(&self) -> Option<(f64, f64)> {
        self.mouse_delta
    }
}

/// Raw mouse button flags and accumulated motion.
#[derive(Debug, Default)]
pub struct MouseInput {
    /// Button flags of the previous frame
    pub mouse_button_inputs_old: HashMap<MouseButton, bool>,
    /// Button flags of this frame
    pub mouse_button_inputs_new: HashMap<MouseButton, bool>,

    /// Mouse movement delta since the last frame (x, y)
    pub mouse_delta: Option<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_the_previous_frame() {
        assert_eq!(RawInputState::from_raw_states(false, true), RawInputState::Pressed);
        assert_eq!(RawInputState::from_raw_states(true, true), RawInputState::Held);
        assert_eq!(RawInputState::from_raw_states(true, false), RawInputState::Released);
        assert!(RawInputState::Held.is_active());
        assert!(!RawInputState::Released.is_active());
        assert!(RawInputState::Pressed.is_just_pressed());
    }

    #[test]
    fn untracked_keys_read_as_not_pressed() {
        let input = ProcessedInputState::default();
        assert_eq!(input.get_key_state(KeyCode::ArrowUp), RawInputState::NotPressed);
        assert_eq!(input.get_mouse_button_state(MouseButton::Left), RawInputState::NotPressed);
    }
}
