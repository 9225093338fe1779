//! Sphere meshes uploaded once per geometry id and shared between bodies.

use std::collections::HashMap;
use std::sync::Arc;

use orrery_scene::{GeometryError, GeometryId, GeometrySpec, SphereMesh, generate_sphere};

use crate::buffer::{BufferAllocator, MeshBuffer};

/// Errors from [`MeshCache::get_or_create`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshCacheError {
    /// The id was never registered with the cache.
    #[error("geometry {0:?} is not registered")]
    UnknownGeometry(GeometryId),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Turns a generated sphere into whatever the renderer draws with.
pub trait MeshUploader {
    type Mesh;

    fn upload(&mut self, label: &str, mesh: &SphereMesh) -> Self::Mesh;
}

impl MeshUploader for BufferAllocator<'_> {
    type Mesh = MeshBuffer;

    fn upload(&mut self, label: &str, mesh: &SphereMesh) -> MeshBuffer {
        self.create_mesh(label, mesh.vertex_bytes(), &mesh.indices, mesh.uv_mode())
    }
}

/// Lazily populated map from [`GeometryId`] to an uploaded mesh.
///
/// Entries are never evicted. Every body sharing an id receives the same
/// `Arc`.
pub struct MeshCache<M> {
    specs: HashMap<GeometryId, GeometrySpec>,
    entries: HashMap<GeometryId, Arc<M>>,
    sectors: u32,
    stacks: u32,
    generations: usize,
}

impl<M> MeshCache<M> {
    /// Cache for `geometries`, tessellated with `sectors` x `stacks`.
    pub fn new(geometries: &[GeometrySpec], sectors: u32, stacks: u32) -> Self {
        Self {
            specs: geometries.iter().map(|g| (g.id, *g)).collect(),
            entries: HashMap::new(),
            sectors,
            stacks,
            generations: 0,
        }
    }

    /// Return the mesh for `id`, generating and uploading it on first use.
    pub fn get_or_create<U>(
        &mut self,
        id: GeometryId,
        uploader: &mut U,
    ) -> Result<Arc<M>, MeshCacheError>
    where
        U: MeshUploader<Mesh = M>,
    {
        if let Some(entry) = self.entries.get(&id) {
            return Ok(Arc::clone(entry));
        }

        let spec = self
            .specs
            .get(&id)
            .ok_or(MeshCacheError::UnknownGeometry(id))?;
        let mesh = generate_sphere(spec.radius, self.sectors, self.stacks, spec.uv_mode)?;
        let label = format!("sphere-{}", id.0);
        let entry = Arc::new(uploader.upload(&label, &mesh));
        self.generations += 1;
        log::debug!(
            "Uploaded {label}: radius {}, {} vertices, {} indices",
            spec.radius,
            mesh.vertex_count(),
            mesh.indices.len()
        );

        self.entries.insert(id, Arc::clone(&entry));
        Ok(entry)
    }

    /// Already-uploaded mesh for `id`, if any.
    pub fn get(&self, id: GeometryId) -> Option<&Arc<M>> {
        self.entries.get(&id)
    }

    /// Number of meshes generated so far.
    pub fn generation_count(&self) -> usize {
        self.generations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_scene::{BodySpec, OrbitalParams, Scene, UvMode};

    /// Records uploads instead of touching a GPU.
    #[derive(Default)]
    struct CountingUploader {
        uploads: Vec<String>,
    }

    impl MeshUploader for CountingUploader {
        type Mesh = (usize, usize);

        fn upload(&mut self, label: &str, mesh: &SphereMesh) -> Self::Mesh {
            self.uploads.push(label.to_string());
            (mesh.vertex_count(), mesh.indices.len())
        }
    }

    fn twin_scene() -> Scene {
        Scene::from_bodies(vec![
            BodySpec::new("star", 1.0, "s.png"),
            BodySpec::new("a", 0.5, "a.png").orbiting("star", OrbitalParams::default()),
            BodySpec::new("b", 0.5, "b.png").orbiting("star", OrbitalParams::default()),
            BodySpec::new("c", 0.25, "c.png").orbiting("star", OrbitalParams::default()),
        ])
        .unwrap()
    }

    #[test]
    fn test_equal_radii_share_entry() {
        let scene = twin_scene();
        let mut cache = MeshCache::new(scene.geometries(), 36, 18);
        let mut uploader = CountingUploader::default();

        let geometry = |name| scene.body(scene.find(name).unwrap()).geometry;
        let a = cache.get_or_create(geometry("a"), &mut uploader).unwrap();
        let b = cache.get_or_create(geometry("b"), &mut uploader).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.generation_count(), 1);

        let c = cache.get_or_create(geometry("c"), &mut uploader).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.generation_count(), 2);
        assert_eq!(uploader.uploads.len(), 2);
    }

    #[test]
    fn test_repeat_lookups_do_not_regenerate() {
        let scene = twin_scene();
        let mut cache = MeshCache::new(scene.geometries(), 8, 4);
        let mut uploader = CountingUploader::default();
        let star = scene.body(scene.root()).geometry;
        for _ in 0..100 {
            cache.get_or_create(star, &mut uploader).unwrap();
        }
        assert_eq!(cache.generation_count(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(**cache.get(star).unwrap(), (9 * 5, 6 * 8 * 3));
    }

    #[test]
    fn test_unknown_geometry_is_an_error() {
        let mut cache: MeshCache<(usize, usize)> = MeshCache::new(&[], 36, 18);
        let mut uploader = CountingUploader::default();
        assert_eq!(
            cache.get_or_create(GeometryId(7), &mut uploader),
            Err(MeshCacheError::UnknownGeometry(GeometryId(7)))
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bad_tessellation_surfaces_geometry_error() {
        let specs = [GeometrySpec {
            id: GeometryId(0),
            radius: 1.0,
            uv_mode: UvMode::Sky,
        }];
        let mut cache = MeshCache::new(&specs, 2, 18);
        let mut uploader = CountingUploader::default();
        assert_eq!(
            cache.get_or_create(GeometryId(0), &mut uploader),
            Err(MeshCacheError::Geometry(GeometryError::TooFewSectors(2)))
        );
        assert_eq!(cache.generation_count(), 0);
    }
}
