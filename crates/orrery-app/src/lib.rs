//! The orrery viewer: a free-flying camera over an animated solar system.
//!
//! [`window::run`] owns the event loop. Each redraw resolves input, lets the
//! [`Orchestrator`] plan the frame on the CPU, and hands the resulting
//! [`FramePlan`] to the [`SceneRenderer`] for recording.

pub mod camera;
pub mod error;
pub mod frame;
pub mod orchestrator;
pub mod renderer;
pub mod window;

pub use camera::FlyCamera;
pub use error::AppError;
pub use frame::{FrameState, FrameTimer, MAX_FRAME_TIME};
pub use orchestrator::{DrawCommand, DrawSubject, FrameInput, FramePlan, Orchestrator};
pub use renderer::{FrameStatus, SceneRenderer};
pub use window::{OrreryApp, run};
