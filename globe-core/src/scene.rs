//! Scene builder: the three fixed meshes and the camera that frames them.

use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::geometry::Mesh;
use crate::material::{Color, Material};
use crate::projection::Camera;
use crate::transform::{Axis, Transform};

/// Identity of each renderable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectId {
    Cube,
    Sphere,
    SphereShell,
}

/// A mesh placed in the scene. Only `transform` changes after construction.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub transform: Transform,
    mesh: Mesh,
    material: Material,
    /// Wireframe lines, empty for filled materials
    edges: Vec<[u32; 2]>,
}

impl SceneObject {
    pub fn new(id: ObjectId, mesh: Mesh, material: Material, transform: Transform) -> Self {
        let edges = if material.wireframe {
            mesh.edges()
        } else {
            Vec::new()
        };
        Self {
            id,
            transform,
            mesh,
            material,
            edges,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }
}

/// Meshes plus the background they are drawn over
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            objects: Vec::new(),
        }
    }

    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }
}

/// Construction parameters for [`build_scene`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: Color,

    pub cube_size: f32,
    pub cube_color: Color,

    pub sphere_radius: f32,
    pub sphere_segments: u32,
    /// Name of the equirectangular map wrapped around the sphere
    pub texture: String,

    /// Shell radius relative to the sphere
    pub shell_scale: f32,
    pub shell_segments: u32,
    pub shell_color: Color,
    pub shell_opacity: f32,

    /// Axial tilt about the view-depth axis, radians
    pub tilt: f32,
    /// Initial spin about the horizontal axis, radians
    pub initial_spin: f32,

    /// Vertical field of view, degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            cube_size: 2.0,
            cube_color: Color::from_hex(0x00ff00),
            sphere_radius: 6.0,
            sphere_segments: 64,
            texture: "assets/textures/8k_earth_nightmap.ppm".to_string(),
            shell_scale: 1.12,
            shell_segments: 16,
            shell_color: Color::from_hex(0x14bdeb),
            shell_opacity: 0.5,
            tilt: 0.235,
            initial_spin: 0.5,
            fov: 2.0,
            near: 1.0,
            far: 1000.0,
            camera_position: [-8.0, 2.0, 300.0],
        }
    }
}

/// Build the cube, sphere and shell plus a camera for a surface of the
/// given aspect ratio.
pub fn build_scene(surface_aspect_ratio: f32, config: &SceneConfig) -> (Scene, Camera) {
    let mut scene = Scene::new(config.background);

    scene.add(SceneObject::new(
        ObjectId::Cube,
        Mesh::cube(config.cube_size),
        Material::wireframe(config.cube_color),
        Transform::identity(),
    ));

    // Both spheres share the same tilted frame so their surfaces line up
    let mut tilted = Transform::identity();
    tilted.orient(Axis::X, config.initial_spin);
    tilted.orient(Axis::Z, config.tilt);

    scene.add(SceneObject::new(
        ObjectId::Sphere,
        Mesh::sphere(
            config.sphere_radius,
            config.sphere_segments,
            config.sphere_segments,
        ),
        Material::textured(config.texture.clone()),
        tilted,
    ));

    scene.add(SceneObject::new(
        ObjectId::SphereShell,
        Mesh::sphere(
            config.sphere_radius * config.shell_scale,
            config.shell_segments,
            config.shell_segments,
        ),
        Material::wireframe(config.shell_color).with_opacity(config.shell_opacity),
        tilted,
    ));

    let [x, y, z] = config.camera_position;
    let camera = Camera::perspective(config.fov, surface_aspect_ratio, config.near, config.far)
        .with_position(Point3::new(x, y, z));

    debug!(
        "built scene: {} objects, camera fov={}deg aspect={:.3}",
        scene.objects().len(),
        config.fov,
        surface_aspect_ratio
    );

    (scene, camera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_three_objects() {
        let (scene, _) = build_scene(1.5, &SceneConfig::default());
        let ids: Vec<_> = scene.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, [ObjectId::Cube, ObjectId::Sphere, ObjectId::SphereShell]);
        assert_eq!(scene.background, Color::WHITE);
    }

    #[test]
    fn test_wireframes_precompute_edges() {
        let (scene, _) = build_scene(1.0, &SceneConfig::default());

        let cube = scene.object(ObjectId::Cube).unwrap();
        assert_eq!(cube.edges(), cube.mesh().edges().as_slice());

        let shell = scene.object(ObjectId::SphereShell).unwrap();
        assert_eq!(shell.edges().len(), shell.mesh().edges().len());

        let sphere = scene.object(ObjectId::Sphere).unwrap();
        assert!(sphere.edges().is_empty());
    }

    #[test]
    fn test_materials() {
        let (scene, _) = build_scene(1.0, &SceneConfig::default());

        let cube = scene.object(ObjectId::Cube).unwrap();
        assert!(cube.material().wireframe);
        assert_eq!(cube.material().color, Color::from_hex(0x00ff00));

        let sphere = scene.object(ObjectId::Sphere).unwrap();
        assert!(!sphere.material().wireframe);
        assert!(sphere.material().map.is_some());

        let shell = scene.object(ObjectId::SphereShell).unwrap();
        assert!(shell.material().wireframe && shell.material().transparent);
        assert_eq!(shell.material().opacity, 0.5);
    }

    #[test]
    fn test_shell_is_larger_and_coarser() {
        let (scene, _) = build_scene(1.0, &SceneConfig::default());
        let sphere = scene.object(ObjectId::Sphere).unwrap();
        let shell = scene.object(ObjectId::SphereShell).unwrap();

        let radius = |o: &SceneObject| o.mesh().vertices[0].position.coords.norm();
        assert!((radius(shell) / radius(sphere) - 1.12).abs() < 1e-4);
        assert!(shell.mesh().faces.len() < sphere.mesh().faces.len());
    }

    #[test]
    fn test_spheres_share_static_tilt() {
        let (scene, _) = build_scene(1.0, &SceneConfig::default());
        let sphere = scene.object(ObjectId::Sphere).unwrap();
        let shell = scene.object(ObjectId::SphereShell).unwrap();
        let cube = scene.object(ObjectId::Cube).unwrap();

        assert_eq!(sphere.transform, shell.transform);
        assert!(sphere.transform.base.angle() > 0.5);
        assert_eq!(cube.transform, Transform::identity());
    }

    #[test]
    fn test_camera_parameters() {
        let (_, camera) = build_scene(1.25, &SceneConfig::default());
        assert!((camera.fov_degrees() - 2.0).abs() < 1e-4);
        assert_eq!(camera.near(), 1.0);
        assert_eq!(camera.far(), 1000.0);
        assert_eq!(camera.aspect(), 1.25);
        assert_eq!(camera.position, Point3::new(-8.0, 2.0, 300.0));
    }
}
