//! Celestial body records and their surface materials.

use glam::{Mat4, Vec3};

use crate::orbit::{OrbitalParams, compute_world_transform};
use crate::scene::GeometryId;

/// Index of a body inside its [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

/// Phong surface parameters. Colors are linear RGB in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Specular exponent.
    pub shininess: f32,
    /// Scale of the texture colour added regardless of lighting.
    pub emission: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::ONE,
            specular: Vec3::splat(0.5),
            shininess: 32.0,
            emission: 0.0,
        }
    }
}

impl Material {
    /// Material with a grey specular term of intensity `specular`.
    pub fn new(ambient: Vec3, specular: f32, shininess: f32) -> Self {
        Self {
            ambient,
            specular: Vec3::splat(specular),
            shininess,
            ..Default::default()
        }
    }

    pub fn with_emission(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    pub fn is_emissive(&self) -> bool {
        self.emission > 0.0
    }
}

/// How a body is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// Ambient, diffuse and specular from the point light plus emission.
    #[default]
    Lit,
    /// Texture colour at full brightness, independent of the light.
    Unlit,
}

/// Declarative description of one body, as listed in a body table.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub name: String,
    /// Name of the parent body; `None` for a root.
    pub parent: Option<String>,
    pub orbit: OrbitalParams,
    /// Mean radius in scene units.
    pub radius: f32,
    pub material: Material,
    /// Texture file name, relative to the texture directory.
    pub texture: String,
    pub shading: Shading,
}

impl BodySpec {
    pub fn new(name: impl Into<String>, radius: f32, texture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            orbit: OrbitalParams::default(),
            radius,
            material: Material::default(),
            texture: texture.into(),
            shading: Shading::Lit,
        }
    }

    pub fn orbiting(mut self, parent: impl Into<String>, orbit: OrbitalParams) -> Self {
        self.parent = Some(parent.into());
        self.orbit = orbit;
        self
    }

    pub fn with_orbit(mut self, orbit: OrbitalParams) -> Self {
        self.orbit = orbit;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }
}

/// A validated body owned by a [`Scene`](crate::Scene).
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub name: String,
    pub orbit: OrbitalParams,
    pub radius: f32,
    pub material: Material,
    pub texture: String,
    pub shading: Shading,
    pub parent: Option<BodyId>,
    /// Sphere mesh this body is drawn with; shared by bodies of equal radius.
    pub geometry: GeometryId,
}

impl CelestialBody {
    /// This body's world transform given its parent's world transform.
    pub fn world_transform(&self, simulation_day: f64, parent_transform: Mat4) -> Mat4 {
        compute_world_transform(&self.orbit, simulation_day, parent_transform)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
