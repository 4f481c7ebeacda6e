/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// A vertex after projection to the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Pixels from the left edge
    pub x: f32,
    /// Pixels from the top edge
    pub y: f32,
    /// Distance along the view axis (smaller is closer)
    pub depth: f32,
}

/// Perspective camera looking down its local -Z axis.
///
/// The projection matrix is cached: changing `aspect` through
/// [`Camera::set_aspect_ratio`] has no effect on rendering until
/// [`Camera::update_projection_matrix`] is called.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Vertical field of view in radians
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn with_position(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Rebuild the cached projection from the current parameters
    pub fn update_projection_matrix(&mut self) {
        self.projection = Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position - Vector3::z();
        Matrix4::look_at_rh(&self.position, &target, &Vector3::y())
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Project a point through `mvp` onto a `width x height` surface.
    ///
    /// Points outside the visible rectangle are still returned so that
    /// primitives straddling the edge can be clipped per pixel; only
    /// points at or behind the eye are rejected.
    pub fn project_to_screen(
        point: &Point3<f32>,
        mvp: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<ScreenPoint> {
        let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);

        // Prevent division by near-zero depth values
        if clip.w < 1e-6 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;

        Some(ScreenPoint {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth: clip.w,
        })
    }
}
