//! Frame-coherent keyboard state.
//!
//! Keys are tracked by physical code so the fly controls sit in the same
//! place on every layout.

use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::PhysicalKey;

/// Minimal description of a key event.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    /// The physical key involved.
    pub key: PhysicalKey,
    /// Whether the key was pressed or released.
    pub state: ElementState,
    /// Whether this is an auto-repeat event.
    pub repeat: bool,
}

/// Held keys plus the keys that went down during the current frame.
///
/// Forward events with [`process_event`](Self::process_event), query, then
/// call [`clear_transients`](Self::clear_transients) once the frame is done.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<PhysicalKey>,
    just_pressed: HashSet<PhysicalKey>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    /// Applies a key transition. Auto-repeat is ignored.
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        if event.repeat {
            return;
        }
        match event.state {
            ElementState::Pressed => {
                if self.pressed.insert(event.key) {
                    self.just_pressed.insert(event.key);
                }
            }
            ElementState::Released => {
                self.pressed.remove(&event.key);
            }
        }
    }

    #[must_use]
    pub fn is_pressed(&self, key: PhysicalKey) -> bool {
        self.pressed.contains(&key)
    }

    /// True only during the frame the key went down.
    #[must_use]
    pub fn just_pressed(&self, key: PhysicalKey) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Drops every held key, e.g. when the window loses focus and release
    /// events would otherwise be missed.
    pub fn release_all(&mut self) {
        self.pressed.clear();
        self.just_pressed.clear();
    }

    pub fn clear_transients(&mut self) {
        self.just_pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    fn raw(code: KeyCode, state: ElementState, repeat: bool) -> RawKeyEvent {
        RawKeyEvent {
            key: PhysicalKey::Code(code),
            state,
            repeat,
        }
    }

    #[test]
    fn test_initial_state_no_keys_pressed() {
        let kb = KeyboardState::new();
        for code in [KeyCode::KeyW, KeyCode::KeyZ, KeyCode::Escape] {
            let pk = PhysicalKey::Code(code);
            assert!(!kb.is_pressed(pk));
            assert!(!kb.just_pressed(pk));
        }
    }

    #[test]
    fn test_press_then_release() {
        let mut kb = KeyboardState::new();
        let pk = PhysicalKey::Code(KeyCode::KeyW);
        kb.process_raw(raw(KeyCode::KeyW, ElementState::Pressed, false));
        assert!(kb.is_pressed(pk));
        assert!(kb.just_pressed(pk));

        kb.process_raw(raw(KeyCode::KeyW, ElementState::Released, false));
        assert!(!kb.is_pressed(pk));
    }

    #[test]
    fn test_just_pressed_lasts_one_frame() {
        let mut kb = KeyboardState::new();
        let pk = PhysicalKey::Code(KeyCode::KeyP);
        kb.process_raw(raw(KeyCode::KeyP, ElementState::Pressed, false));
        kb.clear_transients();
        assert!(!kb.just_pressed(pk));
        assert!(kb.is_pressed(pk));
    }

    #[test]
    fn test_repeat_does_not_retrigger() {
        let mut kb = KeyboardState::new();
        let pk = PhysicalKey::Code(KeyCode::KeyA);
        kb.process_raw(raw(KeyCode::KeyA, ElementState::Pressed, false));
        kb.clear_transients();
        kb.process_raw(raw(KeyCode::KeyA, ElementState::Pressed, true));
        assert!(!kb.just_pressed(pk));
        assert!(kb.is_pressed(pk));
    }

    #[test]
    fn test_release_all_clears_held_keys() {
        let mut kb = KeyboardState::new();
        kb.process_raw(raw(KeyCode::KeyW, ElementState::Pressed, false));
        kb.process_raw(raw(KeyCode::KeyE, ElementState::Pressed, false));
        kb.release_all();
        assert!(!kb.is_pressed(PhysicalKey::Code(KeyCode::KeyW)));
        assert!(!kb.is_pressed(PhysicalKey::Code(KeyCode::KeyE)));
    }
}
