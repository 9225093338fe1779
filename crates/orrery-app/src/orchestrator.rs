//! Per-frame planning: camera update, view/projection, the ordered list of
//! draws and the clock advance.
//!
//! Planning never touches the GPU. [`Orchestrator::run_frame`] turns the
//! current [`FrameState`] and [`Scene`] into a [`FramePlan`] that the
//! renderer records verbatim, so draw order and uniforms can be checked in
//! plain unit tests.

use glam::{Mat4, Vec2};
use orrery_config::RenderConfig;
use orrery_input::ActionState;
use orrery_render::{DrawPass, DrawUniform, FrameUniform, PointLight};
use orrery_scene::{BodyId, GeometryId, Scene};

use crate::frame::FrameState;

/// Input gathered since the previous frame.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub actions: ActionState,
    /// Mouse motion in screen space (+y down).
    pub mouse_delta: Vec2,
}

/// What a draw shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSubject {
    Backdrop,
    Body(BodyId),
}

/// One sphere to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub subject: DrawSubject,
    pub geometry: GeometryId,
    /// Texture file name, relative to the texture directory.
    pub texture: String,
    pub uniform: DrawUniform,
    pub pass: DrawPass,
}

/// Everything the renderer needs for one frame, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: wgpu::Color,
    pub view: Mat4,
    pub projection: Mat4,
    pub frame_uniform: FrameUniform,
    pub draws: Vec<DrawCommand>,
    /// Simulation day the transforms were computed for.
    pub simulation_day: f64,
}

/// Projection and lighting settings shared by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Orchestrator {
    clear_color: wgpu::Color,
    near: f32,
    far: f32,
    light: PointLight,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl Orchestrator {
    pub fn from_config(render: &RenderConfig) -> Self {
        let [r, g, b] = render.clear_color;
        Self {
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
            near: render.near,
            far: render.far,
            light: PointLight::default(),
        }
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = light;
        self
    }

    /// Apply `input`, plan the frame at the current day, then advance the
    /// clock by `dt` seconds.
    pub fn run_frame(
        &self,
        state: &mut FrameState,
        scene: &Scene,
        input: &FrameInput,
        dt: f64,
    ) -> FramePlan {
        state.camera.look(input.mouse_delta);
        state.apply_actions(&input.actions, dt as f32);

        let plan = self.plan(state, scene);
        state.clock.advance(dt);
        plan
    }

    /// Build the draw list for the current state without mutating it.
    pub fn plan(&self, state: &FrameState, scene: &Scene) -> FramePlan {
        let camera = &state.camera;
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(state.aspect_ratio(), self.near, self.far);
        let frame_uniform = FrameUniform::new(view, projection, camera.position(), &self.light);
        let day = state.clock.day();

        let mut draws = Vec::with_capacity(scene.bodies().len() + 1);

        if let Some(backdrop) = scene.backdrop() {
            draws.push(DrawCommand {
                subject: DrawSubject::Backdrop,
                geometry: backdrop.geometry,
                texture: backdrop.texture.clone(),
                uniform: DrawUniform::unlit(Mat4::from_translation(camera.position())),
                pass: DrawPass::Background,
            });
        }

        let transforms = scene.compute_transforms(day);
        draws.extend(scene.draw_order().iter().map(|&id| {
            let body = scene.body(id);
            DrawCommand {
                subject: DrawSubject::Body(id),
                geometry: body.geometry,
                texture: body.texture.clone(),
                uniform: DrawUniform::new(transforms[id.0], &body.material, body.shading),
                pass: DrawPass::Body,
            }
        }));

        FramePlan {
            clear_color: self.clear_color,
            view,
            projection,
            frame_uniform,
            draws,
            simulation_day: day,
        }
    }
}
