/// CPU rasterizer shared by the terminal and canvas hosts
use nalgebra::{Matrix4, Vector2};

use crate::geometry::Mesh;
use crate::material::{Color, Material};
use crate::projection::{Camera, ScreenPoint};
use crate::scene::{Scene, SceneObject};
use crate::texture::{Texture, TextureStore};

/// RGBA color buffer with a per-pixel depth buffer
#[derive(Debug, Clone, Default)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            rgba: vec![0; size * 4],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self, color: Color) {
        for px in self.rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Packed RGBA bytes, row-major from the top-left
    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let i = self.index(x, y) * 4;
        Color::new(self.rgba[i], self.rgba[i + 1], self.rgba[i + 2])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Depth-tested write of one fragment
    fn plot(&mut self, x: i32, y: i32, depth: f32, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        if depth >= self.depth[idx] {
            return;
        }
        self.depth[idx] = depth;

        let out = if alpha < 1.0 {
            color.blend_over(self.pixel(x as u32, y as u32), alpha)
        } else {
            color
        };
        self.rgba[idx * 4..idx * 4 + 3].copy_from_slice(&[out.r, out.g, out.b]);
    }

    /// DDA line with linearly interpolated depth
    fn draw_line(&mut self, p0: ScreenPoint, p1: ScreenPoint, color: Color, alpha: f32) {
        // Skip lines entirely off one side of the surface
        let (w, h) = (self.width as f32, self.height as f32);
        if (p0.x < 0.0 && p1.x < 0.0)
            || (p0.y < 0.0 && p1.y < 0.0)
            || (p0.x >= w && p1.x >= w)
            || (p0.y >= h && p1.y >= h)
        {
            return;
        }

        let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
        for i in 0..=steps as u32 {
            let t = i as f32 / steps;
            let x = (p0.x + dx * t).floor() as i32;
            let y = (p0.y + dy * t).floor() as i32;
            let depth = p0.depth + (p1.depth - p0.depth) * t;
            self.plot(x, y, depth, color, alpha);
        }
    }

    fn fill_triangle<F>(&mut self, points: [ScreenPoint; 3], uvs: [Vector2<f32>; 3], shade: F, alpha: f32)
    where
        F: Fn(Vector2<f32>) -> Color,
    {
        let [v0, v1, v2] = points;
        let (a, b, c) = ((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y));
        if barycentric(a, b, c, a).is_none() {
            return;
        }

        // Bounding box, clipped to screen bounds
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(self.width as f32 - 1.0) as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil().min(self.height as f32 - 1.0) as i32;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric(a, b, c, p) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Affine interpolation; the narrow field of view keeps
                // perspective distortion negligible
                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let uv = uvs[0] * w0 + uvs[1] * w1 + uvs[2] * w2;
                self.plot(x, y, depth, shade(uv), alpha);
            }
        }
    }
}

/// Draws scenes into a [`Framebuffer`] with unlit materials.
///
/// Opaque objects are drawn first, then transparent ones in scene order.
/// Filled faces are back-face culled; wireframe edges never are.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    framebuffer: Framebuffer,
    textures: TextureStore,
}

impl Rasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer: Framebuffer::new(width, height),
            textures: TextureStore::new(),
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureStore {
        &mut self.textures
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.framebuffer.resize(width, height);
    }

    pub fn clear(&mut self, color: Color) {
        self.framebuffer.clear(color);
    }

    pub fn draw_scene(&mut self, scene: &Scene, camera: &Camera) {
        self.framebuffer.clear(scene.background);
        let view_projection = camera.view_projection();

        let opaque = scene.objects().iter().filter(|o| !o.material().transparent);
        let transparent = scene.objects().iter().filter(|o| o.material().transparent);
        for object in opaque.chain(transparent) {
            self.draw_object(object, &view_projection);
        }
    }

    fn draw_object(&mut self, object: &SceneObject, view_projection: &Matrix4<f32>) {
        let mvp = view_projection * object.transform.model_matrix();
        let (width, height) = (self.framebuffer.width, self.framebuffer.height);

        let projected: Vec<Option<ScreenPoint>> = object
            .mesh()
            .vertices
            .iter()
            .map(|v| Camera::project_to_screen(&v.position, &mvp, width, height))
            .collect();

        if object.material().wireframe {
            draw_edges(&mut self.framebuffer, object.edges(), &projected, object.material());
        } else {
            let texture = object
                .material()
                .map
                .as_deref()
                .and_then(|name| self.textures.get(name));
            fill_faces(&mut self.framebuffer, object.mesh(), &projected, object.material(), texture);
        }
    }
}

fn draw_edges(
    framebuffer: &mut Framebuffer,
    edges: &[[u32; 2]],
    projected: &[Option<ScreenPoint>],
    material: &Material,
) {
    let alpha = material.alpha();
    for &[a, b] in edges {
        if let (Some(p0), Some(p1)) = (projected[a as usize], projected[b as usize]) {
            framebuffer.draw_line(p0, p1, material.color, alpha);
        }
    }
}

fn fill_faces(
    framebuffer: &mut Framebuffer,
    mesh: &Mesh,
    projected: &[Option<ScreenPoint>],
    material: &Material,
    texture: Option<&Texture>,
) {
    let alpha = material.alpha();
    let shade = |uv: Vector2<f32>| match texture {
        Some(texture) => texture.sample(uv).modulate(material.color),
        None => material.color,
    };

    for face in &mesh.faces {
        let [a, b, c] = face.map(|i| i as usize);
        let (Some(p0), Some(p1), Some(p2)) = (projected[a], projected[b], projected[c]) else {
            continue;
        };

        // Counter-clockwise on screen (y down) means facing the camera
        let area = (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y);
        if area >= 0.0 {
            continue;
        }

        let uvs = [mesh.vertices[a].uv, mesh.vertices[b].uv, mesh.vertices[c].uv];
        framebuffer.fill_triangle([p0, p1, p2], uvs, &shade, alpha);
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{build_scene, ObjectId, SceneConfig};

    fn rendered(config: &SceneConfig, textures: Option<(&str, Texture)>) -> Rasterizer {
        let (scene, camera) = build_scene(1.0, config);
        let mut raster = Rasterizer::new(64, 64);
        if let Some((name, texture)) = textures {
            raster.textures_mut().insert(name, texture);
        }
        raster.draw_scene(&scene, &camera);
        raster
    }

    /// Camera centered on the globe and pulled back far enough to see all of it
    fn framed() -> SceneConfig {
        SceneConfig {
            camera_position: [0.0, 0.0, 300.0],
            fov: 4.0,
            ..SceneConfig::default()
        }
    }

    #[test]
    fn test_barycentric_center() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!((w0 - 1.0 / 3.0).abs() < 1e-5);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_clear_fills_background() {
        let mut raster = Rasterizer::new(4, 2);
        raster.clear(Color::from_hex(0x102030));
        assert_eq!(raster.framebuffer().pixel(3, 1), Color::from_hex(0x102030));
        assert_eq!(raster.framebuffer().as_rgba()[3], 255);
    }

    #[test]
    fn test_background_around_globe() {
        let raster = rendered(&framed(), None);
        assert_eq!(raster.framebuffer().pixel(0, 0), Color::WHITE);
        assert_eq!(raster.framebuffer().pixel(63, 63), Color::WHITE);
    }

    #[test]
    fn test_untextured_sphere_uses_material_color() {
        // Missing texture: flat white sphere, only the shell lines show
        let raster = rendered(&framed(), None);
        let center = raster.framebuffer().pixel(32, 32);
        // White sphere, possibly under a translucent shell line
        assert!(center.b > 200 && center.g > 150, "{center:?}");
    }

    #[test]
    fn test_textured_sphere() {
        let black = Texture::new(1, 1, vec![Color::BLACK]).unwrap();
        let config = SceneConfig {
            shell_opacity: 0.0,
            ..framed()
        };
        let texture = config.texture.clone();
        let raster = rendered(&config, Some((&texture, black)));
        assert_eq!(raster.framebuffer().pixel(32, 32), Color::BLACK);
        assert_eq!(raster.framebuffer().pixel(0, 0), Color::WHITE);
    }

    #[test]
    fn test_shell_blends_over_sphere() {
        let black = Texture::new(1, 1, vec![Color::BLACK]).unwrap();
        let config = framed();
        let texture = config.texture.clone();
        let raster = rendered(&config, Some((&texture, black)));

        let shell = Color::from_hex(0x14bdeb).blend_over(Color::BLACK, 0.5);
        let fb = raster.framebuffer();
        let blended = (0..64)
            .flat_map(|y| (0..64).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y) == shell)
            .count();
        assert!(blended > 0);
    }

    #[test]
    fn test_wireframe_cube_alone() {
        let (full, _) = build_scene(1.0, &SceneConfig::default());
        let camera = Camera::perspective(45.0, 1.0, 0.1, 100.0)
            .with_position(nalgebra::Point3::new(0.0, 0.0, 5.0));
        let mut scene = Scene::new(full.background);
        scene.add(full.object(ObjectId::Cube).unwrap().clone());

        let mut raster = Rasterizer::new(32, 32);
        raster.draw_scene(&scene, &camera);
        let fb = raster.framebuffer();
        let green = Color::from_hex(0x00ff00);
        let lit = (0..32)
            .flat_map(|y| (0..32).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y) == green)
            .count();
        assert!(lit > 0);
        // Wireframe: the face interiors away from the diagonals stay background
        assert_eq!(fb.pixel(20, 13), Color::WHITE);
    }

    #[test]
    fn test_resize_reallocates() {
        let mut raster = Rasterizer::new(2, 2);
        raster.resize(5, 3);
        assert_eq!(raster.framebuffer().as_rgba().len(), 5 * 3 * 4);
        raster.resize(0, 3);
        assert!(raster.framebuffer().as_rgba().is_empty());
    }
}
