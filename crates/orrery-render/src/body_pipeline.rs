//! Pipelines and uniforms for textured spheres.
//!
//! Two pipelines share one shader: the background pipeline consumes
//! [`SkyVertex`](orrery_scene::SkyVertex) data and never writes depth, the
//! body pipeline consumes [`BodyVertex`](orrery_scene::BodyVertex) data with
//! depth writes on. Bind groups: frame uniforms at group 0, draw uniforms at
//! group 1, the surface texture at group 2.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use orrery_scene::{Material, Shading};

use crate::buffer::{body_vertex_layout, sky_vertex_layout};
use crate::depth::DepthBuffer;

/// Embedded copy of `body.wgsl`.
pub const BODY_SHADER_SOURCE: &str = include_str!("shaders/body.wgsl");

/// File name looked up in the shader directory.
pub const BODY_SHADER_FILE: &str = "body.wgsl";

/// Which pipeline a draw goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPass {
    /// Background sphere: sky layout, no depth writes.
    Background,
    /// Star and planets: body layout, depth tested and written.
    Body,
}

/// The scene's single point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for PointLight {
    /// White light at the origin.
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
        }
    }
}

/// Group 0 uniform: camera matrices and the light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub light_position: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub light_specular: [f32; 4],
}

impl FrameUniform {
    pub fn new(view: Mat4, projection: Mat4, view_position: Vec3, light: &PointLight) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            view_position: view_position.extend(1.0).to_array(),
            light_position: light.position.extend(1.0).to_array(),
            light_ambient: light.ambient.extend(0.0).to_array(),
            light_diffuse: light.diffuse.extend(0.0).to_array(),
            light_specular: light.specular.extend(0.0).to_array(),
        }
    }
}

/// Group 1 uniform: model transform and material of one draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub diffuse: [f32; 4],
    pub specular_shininess: [f32; 4],
    /// x: emission, y: 1.0 when unlit.
    pub params: [f32; 4],
}

impl DrawUniform {
    pub fn new(model: Mat4, material: &Material, shading: Shading) -> Self {
        let unlit = match shading {
            Shading::Lit => 0.0,
            Shading::Unlit => 1.0,
        };
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix(model).to_cols_array_2d(),
            diffuse: material.diffuse.extend(1.0).to_array(),
            specular_shininess: material.specular.extend(material.shininess).to_array(),
            params: [material.emission, unlit, 0.0, 0.0],
        }
    }

    /// Texture passthrough at `model`.
    pub fn unlit(model: Mat4) -> Self {
        Self::new(model, &Material::default(), Shading::Unlit)
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    pub fn is_unlit(&self) -> bool {
        self.params[1] > 0.5
    }
}

/// Inverse-transpose of `model`, falling back to `model` when singular.
fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() <= f32::EPSILON {
        return model;
    }
    model.inverse().transpose()
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size as u64),
            },
            count: None,
        }],
    })
}

/// Background and body pipelines plus their uniform layouts.
pub struct BodyPipelines {
    pub background: wgpu::RenderPipeline,
    pub body: wgpu::RenderPipeline,
    pub frame_layout: wgpu::BindGroupLayout,
    pub draw_layout: wgpu::BindGroupLayout,
}

impl BodyPipelines {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let frame_layout = uniform_layout(
            device,
            "frame-uniform-bgl",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            std::mem::size_of::<FrameUniform>(),
        );
        let draw_layout = uniform_layout(
            device,
            "draw-uniform-bgl",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            std::mem::size_of::<DrawUniform>(),
        );

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("body-pipeline-layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, texture_layout],
            immediate_size: 0,
        });

        let background = create_pipeline(
            device,
            "background-pipeline",
            &layout,
            shader,
            surface_format,
            sky_vertex_layout(),
            false,
        );
        let body = create_pipeline(
            device,
            "body-pipeline",
            &layout,
            shader,
            surface_format,
            body_vertex_layout(),
            true,
        );

        Self {
            background,
            body,
            frame_layout,
            draw_layout,
        }
    }

    pub fn pipeline(&self, pass: DrawPass) -> &wgpu::RenderPipeline {
        match pass {
            DrawPass::Background => &self.background,
            DrawPass::Body => &self.body,
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        // Sphere faces are seen from both sides (the camera sits inside the
        // background sphere), so nothing is culled.
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(DepthBuffer::stencil_state(depth_write)),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// A uniform buffer and the bind group exposing it.
pub struct UniformSlot {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        size: usize,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// Frame uniform plus a growable set of per-draw uniform slots.
///
/// All writes for a frame land before the single submit, so every draw in a
/// frame needs its own slot.
pub struct UniformSlots {
    frame: UniformSlot,
    draws: Vec<UniformSlot>,
}

impl UniformSlots {
    pub fn new(device: &wgpu::Device, pipelines: &BodyPipelines) -> Self {
        Self {
            frame: UniformSlot::new(
                device,
                &pipelines.frame_layout,
                "frame-uniform",
                std::mem::size_of::<FrameUniform>(),
            ),
            draws: Vec::new(),
        }
    }

    pub fn write_frame(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.frame.buffer, 0, bytemuck::bytes_of(uniform));
    }

    pub fn frame_bind_group(&self) -> &wgpu::BindGroup {
        &self.frame.bind_group
    }

    /// Make sure at least `count` draw slots exist.
    pub fn reserve(&mut self, device: &wgpu::Device, pipelines: &BodyPipelines, count: usize) {
        while self.draws.len() < count {
            let label = format!("draw-uniform-{}", self.draws.len());
            self.draws.push(UniformSlot::new(
                device,
                &pipelines.draw_layout,
                &label,
                std::mem::size_of::<DrawUniform>(),
            ));
        }
    }

    /// Write `uniform` into slot `index`. Returns `None` if the slot was not reserved.
    pub fn write_draw(
        &self,
        queue: &wgpu::Queue,
        index: usize,
        uniform: &DrawUniform,
    ) -> Option<&wgpu::BindGroup> {
        let slot = self.draws.get(index)?;
        queue.write_buffer(&slot.buffer, 0, bytemuck::bytes_of(uniform));
        Some(&slot.bind_group)
    }

    pub fn draw_slot_count(&self) -> usize {
        self.draws.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device;
    use crate::texture::TextureManager;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 208);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 176);
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<DrawUniform>() % 16, 0);
    }

    #[test]
    fn test_default_light() {
        let light = PointLight::default();
        assert_eq!(light.position, Vec3::ZERO);
        assert_eq!(light.ambient, Vec3::splat(0.2));
        assert_eq!(light.diffuse, Vec3::splat(0.8));
        assert_eq!(light.specular, Vec3::ONE);

        let uniform = FrameUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::Y, &light);
        assert_eq!(uniform.light_position, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.view_position, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_draw_uniform_packs_material() {
        let material = Material::new(Vec3::splat(0.1), 0.5, 32.0).with_emission(0.25);
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let uniform = DrawUniform::new(model, &material, Shading::Lit);

        assert_eq!(uniform.model(), model);
        assert_eq!(uniform.specular_shininess, [0.5, 0.5, 0.5, 32.0]);
        assert_eq!(uniform.params[0], 0.25);
        assert!(!uniform.is_unlit());
        assert!(DrawUniform::unlit(model).is_unlit());
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(model);
        assert!((n.x_axis.x - 0.5).abs() < 1e-6);
        assert_eq!(normal_matrix(Mat4::ZERO), Mat4::ZERO);
    }

    #[test]
    fn test_pipelines_and_slots_create() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("body"),
            source: wgpu::ShaderSource::Wgsl(BODY_SHADER_SOURCE.into()),
        });
        let textures = TextureManager::new(&device, &queue);
        let pipelines = BodyPipelines::new(
            &device,
            &shader,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            textures.bind_group_layout(),
        );

        let mut slots = UniformSlots::new(&device, &pipelines);
        slots.reserve(&device, &pipelines, 11);
        slots.reserve(&device, &pipelines, 4);
        assert_eq!(slots.draw_slot_count(), 11);
        assert!(
            slots
                .write_draw(&queue, 10, &DrawUniform::unlit(Mat4::IDENTITY))
                .is_some()
        );
        assert!(
            slots
                .write_draw(&queue, 11, &DrawUniform::unlit(Mat4::IDENTITY))
                .is_none()
        );
    }
}
