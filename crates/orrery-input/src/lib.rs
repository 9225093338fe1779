//! Input state for the viewer: keyboard and mouse trackers fed from winit
//! events, and the key map that turns them into camera actions.

pub mod action_map;
pub mod keyboard;
pub mod mouse;

pub use action_map::{Action, ActionState, InputMap};
pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
