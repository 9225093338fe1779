//! Scene model for the orrery: sphere geometry, orbital transforms, the body
//! table and the simulation clock.
//!
//! Nothing here touches the GPU. The renderer consumes [`SphereMesh`] data
//! and the per-frame transforms produced by [`Scene::compute_transforms`].

pub mod body;
pub mod clock;
pub mod error;
pub mod orbit;
pub mod scene;
pub mod sphere;

pub use body::{BodyId, BodySpec, CelestialBody, Material, Shading};
pub use clock::SimulationClock;
pub use error::{GeometryError, SceneError};
pub use orbit::{OrbitalParams, RotationDirection, compute_world_transform};
pub use scene::{
    BACKDROP_TEXTURE, Backdrop, GeometryId, GeometrySpec, Scene, solar_system_bodies,
};
pub use sphere::{
    BodyVertex, SkyVertex, SphereMesh, SphereVertices, UvMode, generate_sphere,
    sphere_index_count, sphere_vertex_count,
};
