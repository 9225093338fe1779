//! Mutable per-run state threaded through every frame, and the wall-clock
//! timer that produces each frame's delta time.

use std::time::{Duration, Instant};

use orrery_config::Config;
use orrery_input::{Action, ActionState};
use orrery_scene::SimulationClock;
use tracing::{debug, info};

use crate::camera::FlyCamera;

/// Longest frame delta accepted; longer stalls are clamped.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Camera, simulation clock and viewport size.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub camera: FlyCamera,
    pub clock: SimulationClock,
    width: u32,
    height: u32,
    exit_requested: bool,
}

impl FrameState {
    pub fn new(camera: FlyCamera, clock: SimulationClock, width: u32, height: u32) -> Self {
        Self {
            camera,
            clock,
            width: width.max(1),
            height: height.max(1),
            exit_requested: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut clock = SimulationClock::new(config.simulation.days_per_second)
            .starting_at(config.simulation.start_day);
        clock.set_paused(config.simulation.paused);
        Self::new(
            FlyCamera::from_config(&config.camera, &config.input),
            clock,
            config.window.width,
            config.window.height,
        )
    }

    /// Record a new surface size. Zero sizes clamp to 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Route one frame of resolved actions: exit, pause and camera motion.
    pub fn apply_actions(&mut self, actions: &ActionState, dt: f32) {
        if actions.is_active(Action::Exit) {
            self.request_exit();
        }
        if actions.just_triggered(Action::TogglePause) {
            let paused = self.clock.toggle_pause();
            info!(paused, day = self.clock.day(), "Simulation pause toggled");
        }
        self.camera.apply_actions(actions, dt);
    }

    pub fn request_exit(&mut self) {
        if !self.exit_requested {
            debug!("Exit requested");
        }
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

/// Measures the time between consecutive frames.
#[derive(Debug)]
pub struct FrameTimer {
    previous: Instant,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            previous: start,
            frame_count: 0,
        }
    }

    /// Seconds since the previous call, clamped to [`MAX_FRAME_TIME`].
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.previous);
        self.previous = now;
        self.frame_count += 1;
        clamp_frame_time(elapsed)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

fn clamp_frame_time(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > MAX_FRAME_TIME {
        debug!(
            "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
            secs * 1000.0,
            MAX_FRAME_TIME * 1000.0
        );
        return MAX_FRAME_TIME;
    }
    secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_input::{InputMap, KeyboardState, RawKeyEvent};
    use winit::event::ElementState;
    use winit::keyboard::{KeyCode, PhysicalKey};

    fn press(keyboard: &mut KeyboardState, code: KeyCode) {
        keyboard.process_raw(RawKeyEvent {
            key: PhysicalKey::Code(code),
            state: ElementState::Pressed,
            repeat: false,
        });
    }

    #[test]
    fn test_from_default_config() {
        let state = FrameState::from_config(&Config::default());
        assert_eq!(state.viewport(), (1024, 1024));
        assert_eq!(state.aspect_ratio(), 1.0);
        assert_eq!(state.clock.days_per_second(), 10.0);
        assert_eq!(state.clock.day(), 0.0);
        assert!(!state.exit_requested());
    }

    #[test]
    fn test_resize_clamps_zero() {
        let mut state = FrameState::from_config(&Config::default());
        state.resize(1600, 0);
        assert_eq!(state.viewport(), (1600, 1));
        state.resize(1600, 800);
        assert_eq!(state.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_escape_requests_exit() {
        let mut state = FrameState::from_config(&Config::default());
        let mut keyboard = KeyboardState::new();
        press(&mut keyboard, KeyCode::Escape);
        state.apply_actions(&InputMap::fly_camera().resolve(&keyboard), 0.016);
        assert!(state.exit_requested());
    }

    #[test]
    fn test_pause_toggles_once_per_press() {
        let mut state = FrameState::from_config(&Config::default());
        let map = InputMap::fly_camera();
        let mut keyboard = KeyboardState::new();
        press(&mut keyboard, KeyCode::KeyP);

        state.apply_actions(&map.resolve(&keyboard), 0.016);
        assert!(state.clock.is_paused());

        // Still held next frame: no second toggle.
        keyboard.clear_transients();
        state.apply_actions(&map.resolve(&keyboard), 0.016);
        assert!(state.clock.is_paused());
    }

    #[test]
    fn test_timer_clamps_stalls() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start);
        let dt = timer.tick_at(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-9);
        let dt = timer.tick_at(start + Duration::from_secs(5));
        assert_eq!(dt, MAX_FRAME_TIME);
        assert_eq!(timer.frame_count(), 2);
    }

    #[test]
    fn test_timer_never_negative() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut timer = FrameTimer::starting_at(start);
        assert_eq!(timer.tick_at(start - Duration::from_millis(10)), 0.0);
    }
}
