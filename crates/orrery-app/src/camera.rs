//! Free-fly viewer camera driven by mouse look and keyboard actions.
//!
//! Angles are kept in degrees. Yaw starts at -90° so the camera initially
//! looks down -Z towards the origin.

use glam::{Mat4, Vec2, Vec3};
use orrery_config::{CameraConfig, InputConfig};
use orrery_input::{Action, ActionState};

pub const MIN_FOV_DEGREES: f32 = 1.0;
pub const MAX_FOV_DEGREES: f32 = 90.0;
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    /// Units per second.
    pub move_speed: f32,
    /// Degrees of fov per unit of travel.
    pub zoom_rate: f32,
    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), &InputConfig::default())
    }
}

impl FlyCamera {
    pub fn from_config(camera: &CameraConfig, input: &InputConfig) -> Self {
        let mut cam = Self {
            position: Vec3::from(camera.position),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: camera
                .fov_degrees
                .clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES),
            move_speed: camera.move_speed,
            zoom_rate: camera.zoom_rate,
            mouse_sensitivity: input.mouse_sensitivity,
            invert_y: input.invert_y,
        };
        cam.update_front();
        cam
    }

    /// Apply a mouse delta in screen space (+y down).
    pub fn look(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        let dy = if self.invert_y { -delta.y } else { delta.y };
        self.yaw += delta.x * self.mouse_sensitivity;
        self.pitch = (self.pitch - dy * self.mouse_sensitivity)
            .clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        self.update_front();
    }

    /// Move and zoom according to the held actions over `dt` seconds.
    pub fn apply_actions(&mut self, actions: &ActionState, dt: f32) {
        let step = self.move_speed * dt;
        let right = self.front.cross(self.up).normalize_or_zero();

        self.position += self.front * step * actions.axis(Action::MoveForward, Action::MoveBack);
        self.position += right * step * actions.axis(Action::MoveRight, Action::MoveLeft);
        self.position += self.up * step * actions.axis(Action::MoveUp, Action::MoveDown);

        let zoom = actions.axis(Action::ZoomIn, Action::ZoomOut);
        if zoom != 0.0 {
            self.fov = (self.fov - zoom * step * self.zoom_rate)
                .clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES);
        }
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Reverse-Z perspective: `near` maps to depth 1, `far` to 0.
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, far, near)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }
}
