//! Stack-and-sector sphere generation.
//!
//! Latitude rings run from the north pole (`+90°`) to the south pole
//! (`-90°`); each ring carries `sectors + 1` samples so the seam column is
//! duplicated and can take its own texture coordinate. Two vertex layouts are
//! produced depending on [`UvMode`]: body spheres and the background sphere
//! differ both in attribute order and in how `(s, t)` is derived.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::GeometryError;

/// Which texture-coordinate convention (and vertex layout) to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UvMode {
    /// `(s, t)` from ring/sector index fractions; [`BodyVertex`] layout.
    Body,
    /// `(s, t)` from the raw angles normalized to `[0, 1]`; [`SkyVertex`] layout.
    Sky,
}

/// Body sphere vertex: position, uv, normal (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BodyVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// Background sphere vertex: position, normal, uv (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkyVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertices in whichever layout was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum SphereVertices {
    Body(Vec<BodyVertex>),
    Sky(Vec<SkyVertex>),
}

/// CPU-side sphere mesh ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    pub vertices: SphereVertices,
    /// Triangle list.
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn uv_mode(&self) -> UvMode {
        match self.vertices {
            SphereVertices::Body(_) => UvMode::Body,
            SphereVertices::Sky(_) => UvMode::Sky,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match &self.vertices {
            SphereVertices::Body(v) => v.len(),
            SphereVertices::Sky(v) => v.len(),
        }
    }

    /// Raw vertex bytes for a GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        match &self.vertices {
            SphereVertices::Body(v) => bytemuck::cast_slice(v),
            SphereVertices::Sky(v) => bytemuck::cast_slice(v),
        }
    }

    /// Vertex positions regardless of layout.
    pub fn positions(&self) -> Vec<Vec3> {
        match &self.vertices {
            SphereVertices::Body(v) => v.iter().map(|v| Vec3::from(v.position)).collect(),
            SphereVertices::Sky(v) => v.iter().map(|v| Vec3::from(v.position)).collect(),
        }
    }
}

/// Number of vertices [`generate_sphere`] emits.
pub fn sphere_vertex_count(sectors: u32, stacks: u32) -> usize {
    (stacks as usize + 1) * (sectors as usize + 1)
}

/// Number of indices [`generate_sphere`] emits. Each pole row contributes one
/// triangle per sector, every other row two.
pub fn sphere_index_count(sectors: u32, stacks: u32) -> usize {
    6 * sectors as usize * (stacks as usize).saturating_sub(1)
}

/// Generate a sphere of `radius` with `sectors` longitude and `stacks`
/// latitude subdivisions.
///
/// Pure function: the same inputs always yield bit-identical output.
pub fn generate_sphere(
    radius: f32,
    sectors: u32,
    stacks: u32,
    uv_mode: UvMode,
) -> Result<SphereMesh, GeometryError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(GeometryError::InvalidRadius(radius));
    }
    if sectors < 3 {
        return Err(GeometryError::TooFewSectors(sectors));
    }
    if stacks < 2 {
        return Err(GeometryError::TooFewStacks(stacks));
    }
    if (u64::from(stacks) + 1) * (u64::from(sectors) + 1) > u64::from(u32::MAX) {
        return Err(GeometryError::TooManyVertices { sectors, stacks });
    }

    let sector_step = TAU / sectors as f32;
    let stack_step = PI / stacks as f32;
    let inv_radius = 1.0 / radius;

    let count = sphere_vertex_count(sectors, stacks);
    let mut body = Vec::new();
    let mut sky = Vec::new();
    match uv_mode {
        UvMode::Body => body.reserve_exact(count),
        UvMode::Sky => sky.reserve_exact(count),
    }

    for i in 0..=stacks {
        let stack_angle = FRAC_PI_2 - i as f32 * stack_step;
        let xz = radius * stack_angle.cos();
        let y = radius * stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = j as f32 * sector_step;
            let position = [xz * sector_angle.cos(), y, xz * sector_angle.sin()];
            let normal = position.map(|c| c * inv_radius);

            match uv_mode {
                UvMode::Body => body.push(BodyVertex {
                    position,
                    uv: [j as f32 / sectors as f32, i as f32 / stacks as f32],
                    normal,
                }),
                UvMode::Sky => sky.push(SkyVertex {
                    position,
                    normal,
                    uv: [sector_angle / TAU, stack_angle / PI + 0.5],
                }),
            }
        }
    }

    let mut indices = Vec::with_capacity(sphere_index_count(sectors, stacks));
    for i in 0..stacks {
        let mut k1 = i * (sectors + 1);
        let mut k2 = k1 + sectors + 1;

        for _ in 0..sectors {
            if i != 0 {
                indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            if i != stacks - 1 {
                indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }
            k1 += 1;
            k2 += 1;
        }
    }

    let vertices = match uv_mode {
        UvMode::Body => SphereVertices::Body(body),
        UvMode::Sky => SphereVertices::Sky(sky),
    };

    Ok(SphereMesh { vertices, indices })
}
