//! Mouse-look delta accumulation.
//!
//! Deltas arrive either as absolute cursor positions (`CursorMoved`) or as
//! raw device motion while the cursor is captured. Both are folded into one
//! per-frame delta in screen space: +x right, +y down.

use glam::Vec2;

/// Accumulated mouse motion for the current frame.
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    last_position: Option<Vec2>,
    delta: Vec2,
    captured: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a `CursorMoved` event.
    ///
    /// The first sample only records the position, so the camera does not
    /// jump when the cursor enters the window.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if !self.captured
            && let Some(last) = self.last_position
        {
            self.delta += new_pos - last;
        }
        self.last_position = Some(new_pos);
    }

    /// Process a `DeviceEvent::MouseMotion` delta. Only counted while captured.
    pub fn on_raw_motion(&mut self, dx: f64, dy: f64) {
        if self.captured {
            self.delta += Vec2::new(dx as f32, dy as f32);
        }
    }

    /// Forget the last cursor position (cursor left the window).
    pub fn on_cursor_left(&mut self) {
        self.last_position = None;
    }

    /// Grab and hide the cursor, switching to raw motion deltas.
    ///
    /// When neither a locked nor a confined grab is granted the cursor stays
    /// visible and look input keeps coming from cursor positions.
    pub fn set_captured(&mut self, window: &winit::window::Window, captured: bool) {
        use winit::window::CursorGrabMode;
        if !captured {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
            self.record_grab(false);
            return;
        }

        let grab = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match &grab {
            Ok(()) => window.set_cursor_visible(false),
            Err(err) => tracing::warn!("cursor grab unavailable, using cursor deltas: {err}"),
        }
        self.record_grab(grab.is_ok());
    }

    fn record_grab(&mut self, grabbed: bool) {
        self.captured = grabbed;
    }

    /// Movement since the last [`clear_transients`](Self::clear_transients).
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
    }
}
