//! Vertex and index buffers for sphere meshes.

use orrery_scene::{BodyVertex, SkyVertex, UvMode};
use wgpu::util::DeviceExt;

/// Shader locations shared by both sphere layouts.
pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const UV_LOCATION: u32 = 2;

/// Vertex and index buffers of one uploaded mesh.
#[derive(Debug)]
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub uv_mode: UvMode,
}

impl MeshBuffer {
    /// Bind vertex and index buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Draw the entire mesh using indexed rendering.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Creates vertex and index buffers on a device.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Upload raw vertex bytes and `u32` indices as one mesh.
    pub fn create_mesh(
        &self,
        label: &str,
        vertices: &[u8],
        indices: &[u32],
        uv_mode: UvMode,
    ) -> MeshBuffer {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-vertices")),
                contents: vertices,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            uv_mode,
        }
    }
}

const BODY_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: POSITION_LOCATION,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: UV_LOCATION,
        format: wgpu::VertexFormat::Float32x2,
    },
    wgpu::VertexAttribute {
        offset: 20,
        shader_location: NORMAL_LOCATION,
        format: wgpu::VertexFormat::Float32x3,
    },
];

const SKY_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: POSITION_LOCATION,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: NORMAL_LOCATION,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 24,
        shader_location: UV_LOCATION,
        format: wgpu::VertexFormat::Float32x2,
    },
];

/// Layout of [`BodyVertex`]: position, uv, normal.
pub fn body_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<BodyVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &BODY_ATTRIBUTES,
    }
}

/// Layout of [`SkyVertex`]: position, normal, uv.
pub fn sky_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SkyVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &SKY_ATTRIBUTES,
    }
}

/// Vertex layout matching meshes generated with `uv_mode`.
pub fn vertex_layout(uv_mode: UvMode) -> wgpu::VertexBufferLayout<'static> {
    match uv_mode {
        UvMode::Body => body_vertex_layout(),
        UvMode::Sky => sky_vertex_layout(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device;
    use orrery_scene::generate_sphere;
    use std::mem::offset_of;

    #[test]
    fn test_body_layout_matches_struct() {
        let layout = body_vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[0].offset, offset_of!(BodyVertex, position) as u64);
        assert_eq!(layout.attributes[1].offset, offset_of!(BodyVertex, uv) as u64);
        assert_eq!(layout.attributes[2].offset, offset_of!(BodyVertex, normal) as u64);
    }

    #[test]
    fn test_sky_layout_matches_struct() {
        let layout = sky_vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[1].offset, offset_of!(SkyVertex, normal) as u64);
        assert_eq!(layout.attributes[2].offset, offset_of!(SkyVertex, uv) as u64);
    }

    #[test]
    fn test_layouts_share_shader_locations() {
        for mode in [UvMode::Body, UvMode::Sky] {
            let mut locations: Vec<u32> = vertex_layout(mode)
                .attributes
                .iter()
                .map(|a| a.shader_location)
                .collect();
            locations.sort_unstable();
            assert_eq!(locations, [POSITION_LOCATION, NORMAL_LOCATION, UV_LOCATION]);
        }
    }

    #[test]
    fn test_sphere_upload() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mesh = generate_sphere(1.0, 36, 18, UvMode::Body).unwrap();
        let buffer = BufferAllocator::new(&device).create_mesh(
            "sphere",
            mesh.vertex_bytes(),
            &mesh.indices,
            mesh.uv_mode(),
        );
        assert_eq!(buffer.index_count, 6 * 36 * 17);
        assert_eq!(buffer.vertex_buffer.size(), (37 * 19 * 32) as u64);
        assert_eq!(buffer.index_buffer.size(), (6 * 36 * 17 * 4) as u64);
    }
}
