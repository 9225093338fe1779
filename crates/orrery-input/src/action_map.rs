//! Maps camera and simulation actions to physical keys.
//!
//! [`InputMap`] holds the bindings; [`ActionState`] is resolved from the
//! keyboard once per frame and is what the camera controller consumes.

use std::collections::HashMap;

use crate::keyboard::KeyboardState;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Actions the viewer responds to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Action {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Narrow the field of view.
    ZoomIn,
    /// Widen the field of view.
    ZoomOut,
    /// Freeze or resume the simulation clock.
    TogglePause,
    /// Close the viewer.
    Exit,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::MoveForward,
        Action::MoveBack,
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::ZoomIn,
        Action::ZoomOut,
        Action::TogglePause,
        Action::Exit,
    ];
}

/// Binding table from [`Action`] to any number of keys (OR logic).
#[derive(Debug, Clone)]
pub struct InputMap {
    bindings: HashMap<Action, Vec<KeyCode>>,
}

impl Default for InputMap {
    fn default() -> Self {
        Self::fly_camera()
    }
}

impl InputMap {
    /// WASD to move, E/Q up and down, Z/X zoom, P pause, Escape quit.
    #[must_use]
    pub fn fly_camera() -> Self {
        let bindings = HashMap::from([
            (Action::MoveForward, vec![KeyCode::KeyW]),
            (Action::MoveBack, vec![KeyCode::KeyS]),
            (Action::MoveLeft, vec![KeyCode::KeyA]),
            (Action::MoveRight, vec![KeyCode::KeyD]),
            (Action::MoveUp, vec![KeyCode::KeyE]),
            (Action::MoveDown, vec![KeyCode::KeyQ]),
            (Action::ZoomIn, vec![KeyCode::KeyZ]),
            (Action::ZoomOut, vec![KeyCode::KeyX]),
            (Action::TogglePause, vec![KeyCode::KeyP]),
            (Action::Exit, vec![KeyCode::Escape]),
        ]);
        Self { bindings }
    }

    #[must_use]
    pub fn bindings(&self, action: Action) -> &[KeyCode] {
        self.bindings.get(&action).map_or(&[], Vec::as_slice)
    }

    /// Resolve which actions are held and which started this frame.
    #[must_use]
    pub fn resolve(&self, keyboard: &KeyboardState) -> ActionState {
        let mut state = ActionState::default();
        for action in Action::ALL {
            for &code in self.bindings(action) {
                let key = PhysicalKey::Code(code);
                if keyboard.is_pressed(key) {
                    state.active.push(action);
                }
                if keyboard.just_pressed(key) {
                    state.triggered.push(action);
                }
            }
        }
        state
    }
}

/// Per-frame snapshot of resolved actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionState {
    active: Vec<Action>,
    triggered: Vec<Action>,
}

impl ActionState {
    /// Whether any key bound to `action` is held.
    #[must_use]
    pub fn is_active(&self, action: Action) -> bool {
        self.active.contains(&action)
    }

    /// Whether a key bound to `action` went down this frame.
    #[must_use]
    pub fn just_triggered(&self, action: Action) -> bool {
        self.triggered.contains(&action)
    }

    /// `+1`, `-1` or `0` depending on which of two opposing actions is held.
    #[must_use]
    pub fn axis(&self, positive: Action, negative: Action) -> f32 {
        let mut value = 0.0;
        if self.is_active(positive) {
            value += 1.0;
        }
        if self.is_active(negative) {
            value -= 1.0;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::RawKeyEvent;
    use winit::event::ElementState;

    fn press_key(kb: &mut KeyboardState, code: KeyCode) {
        kb.process_raw(RawKeyEvent {
            key: PhysicalKey::Code(code),
            state: ElementState::Pressed,
            repeat: false,
        });
    }

    #[test]
    fn test_every_action_has_a_default_binding() {
        let map = InputMap::fly_camera();
        for action in Action::ALL {
            assert!(!map.bindings(action).is_empty(), "{action:?} unbound");
        }
    }

    #[test]
    fn test_held_key_resolves_to_action() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        press_key(&mut kb, KeyCode::KeyW);
        let state = map.resolve(&kb);
        assert!(state.is_active(Action::MoveForward));
        assert!(!state.is_active(Action::MoveBack));
    }

    #[test]
    fn test_opposing_keys_cancel_on_axis() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        press_key(&mut kb, KeyCode::KeyA);
        press_key(&mut kb, KeyCode::KeyD);
        let state = map.resolve(&kb);
        assert_eq!(state.axis(Action::MoveRight, Action::MoveLeft), 0.0);

        let mut kb = KeyboardState::new();
        press_key(&mut kb, KeyCode::KeyZ);
        let state = map.resolve(&kb);
        assert_eq!(state.axis(Action::ZoomIn, Action::ZoomOut), 1.0);
    }

    #[test]
    fn test_trigger_only_on_first_frame() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        press_key(&mut kb, KeyCode::KeyP);
        assert!(map.resolve(&kb).just_triggered(Action::TogglePause));
        kb.clear_transients();
        let state = map.resolve(&kb);
        assert!(!state.just_triggered(Action::TogglePause));
        assert!(state.is_active(Action::TogglePause));
    }
}
