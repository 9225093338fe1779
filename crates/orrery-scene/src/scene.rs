//! The body tree and the built-in solar system table.
//!
//! Bodies are stored flat and reference their parent by [`BodyId`]. A parent
//! must be declared before its children, which makes cycles impossible and
//! lets [`Scene::draw_order`] be computed once at construction.

use std::collections::{HashMap, VecDeque};

use glam::{Mat4, Vec3};

use crate::body::{BodyId, BodySpec, CelestialBody, Material, Shading};
use crate::error::SceneError;
use crate::orbit::{OrbitalParams, RotationDirection};
use crate::sphere::UvMode;

/// Identifier of one sphere geometry, assigned at scene construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

/// Parameters of a registered sphere geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySpec {
    pub id: GeometryId,
    pub radius: f32,
    pub uv_mode: UvMode,
}

/// Textured sphere surrounding the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub radius: f32,
    pub texture: String,
    pub geometry: GeometryId,
}

/// Default background texture.
pub const BACKDROP_TEXTURE: &str = "bg.jpeg";

/// Immutable set of bodies and their parent/child relation.
#[derive(Debug, Clone)]
pub struct Scene {
    bodies: Vec<CelestialBody>,
    children: Vec<Vec<BodyId>>,
    draw_order: Vec<BodyId>,
    geometries: Vec<GeometrySpec>,
    backdrop: Option<Backdrop>,
}

impl Scene {
    /// Validate `specs` and build the tree.
    ///
    /// Every parent must name a body listed earlier. Bodies whose radii are
    /// bit-identical share one [`GeometryId`].
    pub fn from_bodies(specs: Vec<BodySpec>) -> Result<Self, SceneError> {
        if specs.is_empty() {
            return Err(SceneError::Empty);
        }

        let mut by_name: HashMap<String, BodyId> = HashMap::with_capacity(specs.len());
        let mut bodies = Vec::with_capacity(specs.len());
        let mut children = vec![Vec::new(); specs.len()];
        let mut geometries = Vec::new();

        for (index, spec) in specs.into_iter().enumerate() {
            let id = BodyId(index);
            if !spec.radius.is_finite() || spec.radius <= 0.0 {
                return Err(SceneError::InvalidRadius {
                    body: spec.name,
                    radius: spec.radius,
                });
            }
            if by_name.contains_key(&spec.name) {
                return Err(SceneError::DuplicateBody(spec.name));
            }

            let parent = match spec.parent {
                Some(parent_name) => match by_name.get(&parent_name) {
                    Some(&parent_id) => {
                        children[parent_id.0].push(id);
                        Some(parent_id)
                    }
                    None => {
                        return Err(SceneError::UnknownParent {
                            body: spec.name,
                            parent: parent_name,
                        });
                    }
                },
                None => None,
            };

            let geometry = register_geometry(&mut geometries, spec.radius, UvMode::Body);
            by_name.insert(spec.name.clone(), id);
            bodies.push(CelestialBody {
                name: spec.name,
                orbit: spec.orbit,
                radius: spec.radius,
                material: spec.material,
                texture: spec.texture,
                shading: spec.shading,
                parent,
                geometry,
            });
        }

        let draw_order = breadth_first(&bodies, &children);
        log::debug!(
            "Scene built: {} bodies, {} geometries",
            bodies.len(),
            geometries.len()
        );

        Ok(Self {
            bodies,
            children,
            draw_order,
            geometries,
            backdrop: None,
        })
    }

    /// Add a background sphere of `radius` textured with `texture`.
    pub fn with_backdrop(
        mut self,
        radius: f32,
        texture: impl Into<String>,
    ) -> Result<Self, SceneError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SceneError::InvalidRadius {
                body: "backdrop".to_string(),
                radius,
            });
        }
        let geometry = register_geometry(&mut self.geometries, radius, UvMode::Sky);
        self.backdrop = Some(Backdrop {
            radius,
            texture: texture.into(),
            geometry,
        });
        Ok(self)
    }

    /// The sun, eight planets and the moon, with a background sphere of
    /// `sky_radius`.
    pub fn solar_system(sky_radius: f32) -> Result<Self, SceneError> {
        Self::from_bodies(solar_system_bodies())?.with_backdrop(sky_radius, BACKDROP_TEXTURE)
    }

    pub fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> &CelestialBody {
        &self.bodies[id.0]
    }

    /// Look a body up by name.
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .position(|b| b.name == name)
            .map(BodyId)
    }

    /// First root body (the star).
    pub fn root(&self) -> BodyId {
        self.draw_order[0]
    }

    pub fn children(&self, id: BodyId) -> &[BodyId] {
        &self.children[id.0]
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: BodyId) -> usize {
        let mut depth = 0;
        let mut current = self.bodies[id.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.bodies[parent.0].parent;
        }
        depth
    }

    /// Roots first, then every body of depth 1, then depth 2 and so on.
    /// A parent always precedes its children.
    pub fn draw_order(&self) -> &[BodyId] {
        &self.draw_order
    }

    pub fn geometries(&self) -> &[GeometrySpec] {
        &self.geometries
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometrySpec> {
        self.geometries.iter().find(|g| g.id == id)
    }

    pub fn backdrop(&self) -> Option<&Backdrop> {
        self.backdrop.as_ref()
    }

    /// Every body's world transform at `simulation_day`, indexed by
    /// [`BodyId`]. Each transform is computed once, parent first.
    pub fn compute_transforms(&self, simulation_day: f64) -> Vec<Mat4> {
        let mut transforms = vec![Mat4::IDENTITY; self.bodies.len()];
        for &id in &self.draw_order {
            let body = &self.bodies[id.0];
            let parent = body.parent.map_or(Mat4::IDENTITY, |p| transforms[p.0]);
            transforms[id.0] = body.world_transform(simulation_day, parent);
        }
        transforms
    }
}

fn register_geometry(
    geometries: &mut Vec<GeometrySpec>,
    radius: f32,
    uv_mode: UvMode,
) -> GeometryId {
    if let Some(existing) = geometries
        .iter()
        .find(|g| g.uv_mode == uv_mode && g.radius.to_bits() == radius.to_bits())
    {
        return existing.id;
    }
    let id = GeometryId(geometries.len() as u32);
    geometries.push(GeometrySpec {
        id,
        radius,
        uv_mode,
    });
    id
}

fn breadth_first(bodies: &[CelestialBody], children: &[Vec<BodyId>]) -> Vec<BodyId> {
    let mut order = Vec::with_capacity(bodies.len());
    let mut queue: VecDeque<BodyId> = bodies
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_root())
        .map(|(i, _)| BodyId(i))
        .collect();
    while let Some(id) = queue.pop_front() {
        order.push(id);
        queue.extend(children[id.0].iter().copied());
    }
    order
}

fn orbit(
    orbit_radius: f32,
    orbit_speed: f32,
    rotation_speed: f32,
    rotation_direction: RotationDirection,
    axis_tilt: f32,
) -> OrbitalParams {
    OrbitalParams {
        orbit_radius,
        orbit_speed,
        rotation_speed,
        rotation_direction,
        axis_tilt,
    }
}

fn planet(
    name: &str,
    radius: f32,
    texture: &str,
    params: OrbitalParams,
    material: Material,
) -> BodySpec {
    BodySpec::new(name, radius, texture)
        .orbiting("sun", params)
        .with_material(material)
}

/// The built-in body table, in scene units and degrees per simulated day.
pub fn solar_system_bodies() -> Vec<BodySpec> {
    use RotationDirection::{Prograde, Retrograde};

    vec![
        BodySpec::new("sun", 0.15, "sun.jpg")
            .with_orbit(orbit(0.0, 0.0, 10.0, Prograde, 0.0))
            .with_material(Material::new(Vec3::splat(0.7), 1.0, 20.0).with_emission(1.0))
            .with_shading(Shading::Unlit),
        planet(
            "mercury",
            0.024397,
            "mercury.jpg",
            orbit(0.579, 23.9, 8.8, Prograde, 0.034),
            Material::new(Vec3::splat(0.2), 0.1, 8.0),
        ),
        planet(
            "venus",
            0.060518,
            "venus.jpg",
            orbit(0.7, 18.0, 22.5, Retrograde, 177.4),
            Material::new(Vec3::new(0.8, 0.8, 0.7), 0.4, 50.0),
        ),
        planet(
            "earth",
            0.063710,
            "terra.jpg",
            orbit(1.0, 15.8, 36.5, Prograde, 23.44),
            Material::new(Vec3::splat(0.1), 0.5, 32.0),
        ),
        BodySpec::new("moon", 0.027, "moon.jpg")
            .orbiting("earth", orbit(0.3, 13.0, 0.0, Prograde, 6.68))
            .with_material(Material::new(Vec3::splat(0.2), 0.1, 8.0)),
        planet(
            "mars",
            0.033895,
            "mars.jpg",
            orbit(1.5, 12.1, 68.7, Prograde, 25.19),
            Material::new(Vec3::new(0.3, 0.1, 0.1), 0.2, 16.0),
        ),
        planet(
            "jupiter",
            0.69911,
            "jupiter.jpg",
            orbit(3.0, 7.1, 1.6, Prograde, 3.13),
            Material::new(Vec3::new(0.6, 0.4, 0.3), 0.2, 20.0),
        ),
        planet(
            "saturn",
            0.58232,
            "saturn.jpg",
            orbit(5.0, 5.7, 3.9, Prograde, 26.7),
            Material::new(Vec3::new(0.7, 0.6, 0.5), 0.3, 23.0),
        ),
        planet(
            "uranus",
            0.25362,
            "uranus.jpg",
            orbit(7.0, 3.8, 11.2, Prograde, 97.77),
            Material::new(Vec3::new(0.1, 0.3, 0.8), 0.2, 28.0),
        ),
        planet(
            "neptune",
            0.24622,
            "neptun.jpg",
            orbit(8.0, 3.4, 6.0, Prograde, 28.32),
            Material::new(Vec3::splat(0.1), 0.5, 32.0),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(scene: &Scene, ids: &[BodyId]) -> Vec<String> {
        ids.iter().map(|&id| scene.body(id).name.clone()).collect()
    }

    #[test]
    fn test_solar_system_structure() {
        let scene = Scene::solar_system(20.0).unwrap();
        assert_eq!(scene.bodies().len(), 10);

        let sun = scene.root();
        assert_eq!(scene.body(sun).name, "sun");
        assert_eq!(scene.body(sun).shading, Shading::Unlit);
        assert_eq!(scene.children(sun).len(), 8);

        let earth = scene.find("earth").unwrap();
        let moon = scene.find("moon").unwrap();
        assert_eq!(scene.body(moon).parent, Some(earth));
        assert_eq!(scene.depth(moon), 2);
        assert_eq!(scene.depth(earth), 1);
    }

    #[test]
    fn test_draw_order_is_breadth_first() {
        let scene = Scene::solar_system(20.0).unwrap();
        let order = names(&scene, scene.draw_order());
        assert_eq!(order.first().map(String::as_str), Some("sun"));
        assert_eq!(order.last().map(String::as_str), Some("moon"));
        assert_eq!(order.len(), 10);
        let earth_pos = order.iter().position(|n| n == "earth").unwrap();
        let moon_pos = order.iter().position(|n| n == "moon").unwrap();
        assert!(earth_pos < moon_pos);
    }

    #[test]
    fn test_every_parent_drawn_before_children() {
        let scene = Scene::solar_system(20.0).unwrap();
        let order = scene.draw_order();
        for (pos, &id) in order.iter().enumerate() {
            if let Some(parent) = scene.body(id).parent {
                let parent_pos = order.iter().position(|&p| p == parent).unwrap();
                assert!(parent_pos < pos);
            }
        }
    }

    #[test]
    fn test_transforms_compose_through_tree() {
        let scene = Scene::solar_system(20.0).unwrap();
        let day = 36.0;
        let transforms = scene.compute_transforms(day);

        let sun = scene.root();
        let earth = scene.find("earth").unwrap();
        let moon = scene.find("moon").unwrap();

        let sun_m = scene.body(sun).world_transform(day, Mat4::IDENTITY);
        let earth_m = scene.body(earth).world_transform(day, sun_m);
        let moon_m = scene.body(moon).world_transform(day, earth_m);

        assert!(transforms[sun.0].abs_diff_eq(sun_m, 1e-6));
        assert!(transforms[earth.0].abs_diff_eq(earth_m, 1e-6));
        assert!(transforms[moon.0].abs_diff_eq(moon_m, 1e-6));
    }

    #[test]
    fn test_earth_distance_preserved_at_day_36() {
        let scene = Scene::solar_system(20.0).unwrap();
        let transforms = scene.compute_transforms(36.0);
        let earth = scene.find("earth").unwrap();
        let distance = transforms[earth.0].w_axis.truncate().length();
        assert!((distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_planets_inherit_star_spin() {
        let scene = Scene::solar_system(20.0).unwrap();
        let transforms = scene.compute_transforms(12.0);
        let earth = scene.find("earth").unwrap();
        let position = transforms[earth.0].w_axis.truncate();

        // Star spin 120 degrees plus earth orbit 189.6 degrees about +Y.
        let angle = (120.0_f32 + 189.6).to_radians();
        let expected = Vec3::new(angle.cos(), 0.0, -angle.sin());
        assert!((position - expected).length() < 1e-4);
        assert!((position - Vec3::new(0.637, 0.0, 0.771)).length() < 1e-3);
    }

    #[test]
    fn test_arbitrary_depth() {
        let ring = |name: &str, parent: &str| {
            BodySpec::new(name, 0.1, "x.png").orbiting(
                parent,
                OrbitalParams {
                    orbit_radius: 1.0,
                    orbit_speed: 10.0,
                    ..Default::default()
                },
            )
        };
        let specs = vec![
            BodySpec::new("a", 1.0, "a.png"),
            ring("b", "a"),
            ring("c", "b"),
            ring("d", "c"),
        ];
        let scene = Scene::from_bodies(specs).unwrap();
        let d = scene.find("d").unwrap();
        assert_eq!(scene.depth(d), 3);
        assert_eq!(names(&scene, scene.draw_order()), ["a", "b", "c", "d"]);

        // At day 0 every rotation is zero, so offsets add up along X.
        let transforms = scene.compute_transforms(0.0);
        assert!(
            transforms[d.0]
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6)
        );
    }

    #[test]
    fn test_equal_radii_share_geometry() {
        let specs = vec![
            BodySpec::new("star", 1.0, "s.png"),
            BodySpec::new("twin_a", 0.5, "a.png").orbiting("star", OrbitalParams::default()),
            BodySpec::new("twin_b", 0.5, "b.png").orbiting("star", OrbitalParams::default()),
            BodySpec::new("odd", 0.25, "c.png").orbiting("star", OrbitalParams::default()),
        ];
        let scene = Scene::from_bodies(specs).unwrap();
        let geometry = |name| scene.body(scene.find(name).unwrap()).geometry;
        assert_eq!(geometry("twin_a"), geometry("twin_b"));
        assert_ne!(geometry("twin_a"), geometry("odd"));
        assert_ne!(geometry("star"), geometry("odd"));
        assert_eq!(scene.geometries().len(), 3);
    }

    #[test]
    fn test_backdrop_gets_its_own_geometry() {
        let scene = Scene::from_bodies(vec![BodySpec::new("star", 20.0, "s.png")])
            .unwrap()
            .with_backdrop(20.0, BACKDROP_TEXTURE)
            .unwrap();
        let backdrop = scene.backdrop().unwrap();
        let star = scene.body(scene.root()).geometry;
        assert_ne!(backdrop.geometry, star);
        assert_eq!(scene.geometry(backdrop.geometry).unwrap().uv_mode, UvMode::Sky);
    }

    #[test]
    fn test_solar_system_geometry_ids() {
        let scene = Scene::solar_system(20.0).unwrap();
        // Ten distinct body radii plus the backdrop.
        assert_eq!(scene.geometries().len(), 11);
        assert_eq!(scene.backdrop().unwrap().texture, "bg.jpeg");
    }

    #[test]
    fn test_rejects_unknown_parent() {
        let specs = vec![
            BodySpec::new("sun", 1.0, "s.png"),
            BodySpec::new("moon", 0.1, "m.png").orbiting("earth", OrbitalParams::default()),
        ];
        assert_eq!(
            Scene::from_bodies(specs).unwrap_err(),
            SceneError::UnknownParent {
                body: "moon".to_string(),
                parent: "earth".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_forward_and_self_references() {
        let forward = vec![
            BodySpec::new("moon", 0.1, "m.png").orbiting("earth", OrbitalParams::default()),
            BodySpec::new("earth", 0.5, "e.png"),
        ];
        assert!(matches!(
            Scene::from_bodies(forward),
            Err(SceneError::UnknownParent { .. })
        ));

        let own =
            vec![BodySpec::new("loop", 0.1, "l.png").orbiting("loop", OrbitalParams::default())];
        assert!(matches!(
            Scene::from_bodies(own),
            Err(SceneError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_radius() {
        let dup = vec![
            BodySpec::new("sun", 1.0, "s.png"),
            BodySpec::new("sun", 2.0, "t.png"),
        ];
        assert_eq!(
            Scene::from_bodies(dup).unwrap_err(),
            SceneError::DuplicateBody("sun".to_string())
        );

        let bad = vec![BodySpec::new("dust", 0.0, "d.png")];
        assert!(matches!(
            Scene::from_bodies(bad),
            Err(SceneError::InvalidRadius { .. })
        ));
        assert_eq!(Scene::from_bodies(Vec::new()).unwrap_err(), SceneError::Empty);
    }
}
