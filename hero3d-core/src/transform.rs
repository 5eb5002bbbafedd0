/// Two-axis rotation state and the rotation matrices built from it
use nalgebra::{Matrix3, Point3};

/// Current and target rotation angles (in radians).
///
/// `current_*` eases towards `target_*` once per frame; input only ever
/// moves the targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub current_x: f64,
    pub current_y: f64,
    pub target_x: f64,
    pub target_y: f64,
}

impl RotationState {
    /// Start at rest with `current == target`
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            current_x: x,
            current_y: y,
            target_x: x,
            target_y: y,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Move the targets by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.target_x += dx;
        self.target_y += dy;
    }

    /// Cover `damping` of the remaining distance to the target
    pub fn step(&mut self, damping: f64) {
        self.current_x += (self.target_x - self.current_x) * damping;
        self.current_y += (self.target_y - self.current_y) * damping;
    }

    /// Largest remaining distance between current and target
    pub fn remaining(&self) -> f64 {
        (self.target_x - self.current_x)
            .abs()
            .max((self.target_y - self.current_y).abs())
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for the scene rotation
pub struct Transform;

impl Transform {
    /// Rotation about the vertical axis acting on the (x, z) pair
    pub fn yaw_matrix(angle: f64) -> Matrix3<f64> {
        let (s, c) = angle.sin_cos();
        Matrix3::new(
            c, 0.0, -s, //
            0.0, 1.0, 0.0, //
            s, 0.0, c,
        )
    }

    /// Rotation about the horizontal axis acting on the (y, z) pair
    pub fn pitch_matrix(angle: f64) -> Matrix3<f64> {
        let (s, c) = angle.sin_cos();
        Matrix3::new(
            1.0, 0.0, 0.0, //
            0.0, c, -s, //
            0.0, s, c,
        )
    }

    /// Yaw by `current_y` first, then pitch by `current_x`
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix3<f64> {
        Self::pitch_matrix(rotation.current_x) * Self::yaw_matrix(rotation.current_y)
    }

    pub fn rotate_point(matrix: &Matrix3<f64>, point: &Point3<f64>) -> Point3<f64> {
        matrix * point
    }
}
