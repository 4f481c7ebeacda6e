/// Object orientation: static base orientation plus accumulated Euler rotation
use std::f32::consts::TAU;

use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3};

/// Principal axes in object space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal
    X,
    /// Vertical
    Y,
    /// View depth
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// Wrap an angle into `[0, 2π)`
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Rotation state around three axes (in radians, wrapped to `[0, 2π)`)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: wrap_angle(x),
            y: wrap_angle(y),
            z: wrap_angle(z),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x = wrap_angle(self.x + dx);
        self.y = wrap_angle(self.y + dy);
        self.z = wrap_angle(self.z + dz);
    }

    pub fn angle(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Rotation matrix in XYZ order (X applied last in world space)
    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));

        rx * ry * rz
    }
}

/// Orientation of a scene object.
///
/// `base` holds one-time setup rotations (an axial tilt, say) and never
/// changes once the scene is built. Per-frame animation goes through
/// [`Transform::rotate`], which accumulates into `rotation`. The model
/// matrix is `base * rotation`, so animated rotations happen about the
/// object's tilted local axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub base: UnitQuaternion<f32>,
    pub rotation: RotationState,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            base: UnitQuaternion::identity(),
            rotation: RotationState::zero(),
        }
    }

    /// Apply a static rotation about a local axis
    pub fn orient(&mut self, axis: Axis, angle: f32) {
        self.base *= UnitQuaternion::from_axis_angle(&axis.unit(), angle);
    }

    /// Advance the animated rotation about `axis` by `angle` radians
    pub fn rotate(&mut self, axis: Axis, angle: f32) {
        match axis {
            Axis::X => self.rotation.rotate(angle, 0.0, 0.0),
            Axis::Y => self.rotation.rotate(0.0, angle, 0.0),
            Axis::Z => self.rotation.rotate(0.0, 0.0, angle),
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.base.to_homogeneous() * self.rotation.matrix()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut state = RotationState::zero();
        state.rotate(-0.1, TAU + 0.5, 0.0);
        assert!((state.x - (TAU - 0.1)).abs() < 1e-5);
        assert!((state.y - 0.5).abs() < 1e-5);
        assert!(wrap_angle(-1e-9) < TAU);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::identity().model_matrix();
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_rotate_accumulates_on_axis() {
        let mut transform = Transform::identity();
        transform.rotate(Axis::Y, 0.25);
        transform.rotate(Axis::Y, 0.25);
        transform.rotate(Axis::X, 0.1);
        assert!((transform.rotation.angle(Axis::Y) - 0.5).abs() < 1e-6);
        assert!((transform.rotation.angle(Axis::X) - 0.1).abs() < 1e-6);
        assert_eq!(transform.rotation.z, 0.0);
    }

    #[test]
    fn test_orient_does_not_touch_animated_rotation() {
        let mut transform = Transform::identity();
        transform.orient(Axis::X, 0.5);
        transform.orient(Axis::Z, 0.235);
        assert_eq!(transform.rotation, RotationState::zero());

        // Spin about the tilted local Y keeps the tilted pole fixed
        let pole = Point3::new(0.0, 1.0, 0.0);
        let before = transform.model_matrix().transform_point(&pole);
        transform.rotate(Axis::Y, 1.0);
        let after = transform.model_matrix().transform_point(&pole);
        assert!((before - after).norm() < 1e-5);
    }
}
