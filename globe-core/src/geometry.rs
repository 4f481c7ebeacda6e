/// Geometry primitives for 3D rendering
use std::collections::HashSet;
use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Vector2, Vector3};

/// A 3D vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_face(&mut self, a: u32, b: u32, c: u32) {
        self.faces.push([a, b, c]);
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(move |&[a, b, c]| {
            Triangle::new(
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            )
        })
    }

    /// Unique triangle edges as vertex index pairs, in first-seen order.
    ///
    /// This is what a wireframe material draws. Uniqueness is by index, so
    /// coincident vertices of different faces give overlapping lines.
    pub fn edges(&self) -> Vec<[u32; 2]> {
        let mut seen = HashSet::with_capacity(self.faces.len() * 3 / 2);
        let mut edges = Vec::with_capacity(self.faces.len() * 3 / 2);
        for face in &self.faces {
            for (i, j) in [(0, 1), (1, 2), (2, 0)] {
                let (a, b) = (face[i], face[j]);
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.push([a, b]);
                }
            }
        }
        edges
    }

    /// Axis-aligned cube centered at the origin, two triangles per face
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(24, 12);

        // (normal, u direction, v direction) per face; u x v == normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        for (n, u, v) in faces {
            let normal = Vector3::from(n);
            let u = Vector3::from(u);
            let v = Vector3::from(v);
            let center = Point3::origin() + normal * half;

            let corner = |su: f32, sv: f32| {
                Vertex::new(
                    center + u * (su * half) + v * (sv * half),
                    normal,
                    Vector2::new((su + 1.0) / 2.0, (sv + 1.0) / 2.0),
                )
            };

            let a = mesh.add_vertex(corner(-1.0, -1.0));
            let b = mesh.add_vertex(corner(1.0, -1.0));
            let c = mesh.add_vertex(corner(1.0, 1.0));
            let d = mesh.add_vertex(corner(-1.0, 1.0));
            mesh.add_face(a, b, c);
            mesh.add_face(a, c, d);
        }

        mesh
    }

    /// UV sphere centered at the origin.
    ///
    /// Vertices form a `(width_segments + 1) x (height_segments + 1)` grid;
    /// the seam and pole vertices are duplicated so every face has its own
    /// continuous texture coordinates. `v` runs from 1 at the north pole to
    /// 0 at the south pole, `u` from 0 to 1 around the equator.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let columns = width_segments + 1;

        let mut mesh = Self::with_capacity(
            (columns * (height_segments + 1)) as usize,
            (width_segments * height_segments * 2) as usize,
        );

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let direction = Vector3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                mesh.add_vertex(Vertex::new(
                    Point3::from(direction * radius),
                    direction,
                    Vector2::new(u, 1.0 - v),
                ));
            }
        }

        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * columns + ix + 1;
                let b = iy * columns + ix;
                let c = (iy + 1) * columns + ix;
                let d = (iy + 1) * columns + ix + 1;

                // The pole rows collapse to a single triangle per segment
                if iy != 0 {
                    mesh.add_face(a, b, d);
                }
                if iy != height_segments - 1 {
                    mesh.add_face(b, c, d);
                }
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.faces.len(), 12);
        // Faces don't share vertices, so each box edge appears once per
        // adjoining face: 6 faces x (4 sides + 1 diagonal)
        assert_eq!(cube.edges().len(), 30);
    }

    #[test]
    fn test_cube_extent() {
        let cube = Mesh::cube(2.0);
        for vertex in &cube.vertices {
            for coord in vertex.position.iter() {
                assert!((coord.abs() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = Mesh::cube(2.0);
        for triangle in cube.triangles() {
            let [v0, v1, v2] = triangle.vertices;
            let normal = (v1.position - v0.position).cross(&(v2.position - v0.position));
            assert!(normal.dot(&v0.normal) > 0.0);
        }
    }

    #[test]
    fn test_sphere_counts() {
        let sphere = Mesh::sphere(6.0, 64, 64);
        assert_eq!(sphere.vertices.len(), 65 * 65);
        // Two triangles per quad, minus one per segment in each pole row
        assert_eq!(sphere.faces.len(), 64 * 64 * 2 - 2 * 64);

        let shell = Mesh::sphere(6.72, 16, 16);
        assert_eq!(shell.vertices.len(), 17 * 17);
        assert_eq!(shell.faces.len(), 16 * 16 * 2 - 2 * 16);
    }

    #[test]
    fn test_sphere_radius_and_uv() {
        let sphere = Mesh::sphere(6.0, 16, 8);
        for vertex in &sphere.vertices {
            assert!((vertex.position.coords.norm() - 6.0).abs() < 1e-4);
            assert!((0.0..=1.0).contains(&vertex.uv.x));
            assert!((0.0..=1.0).contains(&vertex.uv.y));
        }
        // First row is the north pole at v = 1
        assert!((sphere.vertices[0].position.y - 6.0).abs() < 1e-4);
        assert_eq!(sphere.vertices[0].uv.y, 1.0);
    }

    #[test]
    fn test_sphere_faces_wind_outward() {
        let sphere = Mesh::sphere(1.0, 12, 6);
        for triangle in sphere.triangles() {
            let [v0, v1, v2] = triangle.vertices;
            let normal = (v1.position - v0.position).cross(&(v2.position - v0.position));
            let centroid = (v0.position.coords + v1.position.coords + v2.position.coords) / 3.0;
            assert!(normal.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_edges_are_unique() {
        let sphere = Mesh::sphere(1.0, 8, 4);
        let edges = sphere.edges();
        let mut keys: Vec<_> = edges.iter().map(|[a, b]| (*a.min(b), *a.max(b))).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), edges.len());
    }
}
