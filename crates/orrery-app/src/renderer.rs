//! Records a [`FramePlan`] into a single render pass.
//!
//! Meshes and textures are created the first time a draw needs them and
//! kept for the rest of the run.

use std::path::PathBuf;
use std::sync::Arc;

use orrery_config::Config;
use orrery_render::{
    BODY_SHADER_FILE, BODY_SHADER_SOURCE, BodyPipelines, BufferAllocator, DepthBuffer,
    FrameEncoder, ManagedTexture, MeshBuffer, MeshCache, RenderContext, RenderPassBuilder,
    ShaderLibrary, SurfaceError, TextureManager, UniformSlots,
};
use orrery_scene::Scene;
use tracing::{info, warn};

use crate::error::AppError;
use crate::orchestrator::FramePlan;

/// Outcome of [`SceneRenderer::render`] that is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The surface timed out; nothing was drawn.
    Skipped,
}

/// GPU resources for drawing the scene.
pub struct SceneRenderer {
    pipelines: BodyPipelines,
    uniforms: UniformSlots,
    meshes: MeshCache<MeshBuffer>,
    textures: TextureManager,
    depth: DepthBuffer,
    texture_dir: PathBuf,
}

impl SceneRenderer {
    /// Compile the shader and build pipelines. Fails if the shader does not compile.
    pub fn new(gpu: &RenderContext, scene: &Scene, config: &Config) -> Result<Self, AppError> {
        let mut shaders = ShaderLibrary::new().with_shader_dir(&config.assets.shader_dir);
        let shader =
            shaders.load_or_embedded(&gpu.device, "body", BODY_SHADER_FILE, BODY_SHADER_SOURCE)?;

        let textures = TextureManager::new(&gpu.device, &gpu.queue);
        let pipelines = BodyPipelines::new(
            &gpu.device,
            &shader,
            gpu.surface_format,
            textures.bind_group_layout(),
        );
        let uniforms = UniformSlots::new(&gpu.device, &pipelines);
        let (width, height) = gpu.size();
        let depth = DepthBuffer::new(&gpu.device, width, height);
        let meshes = MeshCache::new(
            scene.geometries(),
            config.render.sphere_sectors,
            config.render.sphere_stacks,
        );

        info!(
            geometries = scene.geometries().len(),
            bodies = scene.bodies().len(),
            "Scene renderer ready"
        );

        Ok(Self {
            pipelines,
            uniforms,
            meshes,
            textures,
            depth,
            texture_dir: config.assets.texture_dir.clone(),
        })
    }

    pub fn resize(&mut self, gpu: &RenderContext) {
        let (width, height) = gpu.size();
        self.depth.resize(&gpu.device, width, height);
    }

    /// Draw `plan` and present it.
    pub fn render(
        &mut self,
        gpu: &RenderContext,
        plan: &FramePlan,
    ) -> Result<FrameStatus, AppError> {
        let surface_texture = match gpu.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(err) => return Err(err.into()),
        };

        let resources = self.prepare(gpu, plan)?;

        self.uniforms.write_frame(&gpu.queue, &plan.frame_uniform);
        self.uniforms
            .reserve(&gpu.device, &self.pipelines, plan.draws.len());

        let mut encoder = FrameEncoder::new(&gpu.device, Arc::clone(&gpu.queue), surface_texture);
        let builder = RenderPassBuilder::new()
            .clear_color(plan.clear_color)
            .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("scene-pass");

        if let Some(mut pass) = encoder.begin_render_pass(&builder) {
            pass.set_bind_group(0, self.uniforms.frame_bind_group(), &[]);
            let draws = plan.draws.iter().zip(&resources);
            for (index, (draw, (mesh, texture))) in draws.enumerate() {
                let Some(draw_group) = self.uniforms.write_draw(&gpu.queue, index, &draw.uniform)
                else {
                    continue;
                };
                pass.set_pipeline(self.pipelines.pipeline(draw.pass));
                pass.set_bind_group(1, draw_group, &[]);
                pass.set_bind_group(2, &texture.bind_group, &[]);
                mesh.bind(&mut pass);
                mesh.draw(&mut pass);
            }
        }

        encoder.submit();
        Ok(FrameStatus::Presented)
    }

    /// Mesh and texture for every draw, uploading what is missing.
    fn prepare(
        &mut self,
        gpu: &RenderContext,
        plan: &FramePlan,
    ) -> Result<Vec<(Arc<MeshBuffer>, Arc<ManagedTexture>)>, AppError> {
        let mut allocator = BufferAllocator::new(&gpu.device);
        plan.draws
            .iter()
            .map(|draw| -> Result<_, AppError> {
                let mesh = self.meshes.get_or_create(draw.geometry, &mut allocator)?;
                let texture = self.textures.load_or_placeholder(
                    &gpu.device,
                    &gpu.queue,
                    &self.texture_dir,
                    &draw.texture,
                );
                Ok((mesh, texture))
            })
            .collect()
    }
}
