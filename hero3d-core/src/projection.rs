/// Perspective projection from rotated scene space to screen pixels
use nalgebra::{Matrix3, Point3};

use crate::transform::{RotationState, Transform};

/// Drawing surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Screen position plus the rotated (pre-divide) depth of one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedVertex {
    pub screen_x: f64,
    pub screen_y: f64,
    pub view_z: f64,
}

/// Fixed-distance perspective camera looking down +z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub perspective_distance: f64,
}

impl Projector {
    pub fn new(perspective_distance: f64) -> Self {
        Self {
            perspective_distance,
        }
    }

    /// Rotate `vertex` by the current angles and project it onto `viewport`
    pub fn project(
        &self,
        vertex: &Point3<f64>,
        rotation: &RotationState,
        viewport: &Viewport,
    ) -> ProjectedVertex {
        let matrix = Transform::rotation_matrix(rotation);
        self.project_rotated(&Transform::rotate_point(&matrix, vertex), viewport)
    }

    /// Same as [`Projector::project`] with a rotation matrix built once per frame
    pub fn project_with(
        &self,
        vertex: &Point3<f64>,
        matrix: &Matrix3<f64>,
        viewport: &Viewport,
    ) -> ProjectedVertex {
        self.project_rotated(&Transform::rotate_point(matrix, vertex), viewport)
    }

    /// Perspective divide of an already rotated point. `z` is not clamped.
    pub fn project_rotated(&self, rotated: &Point3<f64>, viewport: &Viewport) -> ProjectedVertex {
        self.project_rotated_scaled(rotated, viewport, 1.0)
    }

    /// Divide in scene units, then magnify the screen offset by
    /// `pixels_per_unit`. The divide never sees pixel-sized depths.
    pub fn project_rotated_scaled(
        &self,
        rotated: &Point3<f64>,
        viewport: &Viewport,
        pixels_per_unit: f64,
    ) -> ProjectedVertex {
        let d = self.perspective_distance;
        let scale = d / (d + rotated.z) * pixels_per_unit;
        let (cx, cy) = viewport.center();
        ProjectedVertex {
            screen_x: rotated.x * scale + cx,
            screen_y: rotated.y * scale + cy,
            view_z: rotated.z,
        }
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(500.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_center() {
        let viewport = Viewport::new(800.0, 600.0);
        for d in [1.0, 50.0, 500.0, 1e6] {
            let p = Projector::new(d).project(&Point3::origin(), &RotationState::zero(), &viewport);
            assert_eq!((p.screen_x, p.screen_y), (400.0, 300.0));
            assert_eq!(p.view_z, 0.0);
        }
    }

    #[test]
    fn test_farther_points_shrink() {
        let viewport = Viewport::new(200.0, 200.0);
        let projector = Projector::new(500.0);
        let near = projector.project(&Point3::new(100.0, 0.0, -100.0), &RotationState::zero(), &viewport);
        let far = projector.project(&Point3::new(100.0, 0.0, 100.0), &RotationState::zero(), &viewport);
        assert!((near.screen_x - 100.0) > (far.screen_x - 100.0));
        assert!((far.screen_x - (100.0 + 100.0 * 500.0 / 600.0)).abs() < 1e-9);
    }

    #[test]
    fn test_project_with_matches_project() {
        let viewport = Viewport::new(640.0, 480.0);
        let projector = Projector::default();
        let rotation = RotationState::new(0.4, -1.3);
        let point = Point3::new(12.0, -7.0, 30.0);
        let matrix = Transform::rotation_matrix(&rotation);
        assert_eq!(
            projector.project(&point, &rotation, &viewport),
            projector.project_with(&point, &matrix, &viewport)
        );
    }

    #[test]
    fn test_pixel_scale_leaves_divide_alone() {
        let viewport = Viewport::new(1000.0, 1000.0);
        let projector = Projector::new(500.0);
        let point = Point3::new(1.0, -1.0, -1.0);
        let unit = projector.project_rotated(&point, &viewport);
        let scaled = projector.project_rotated_scaled(&point, &viewport, 300.0);
        assert!(((scaled.screen_x - 500.0) - 300.0 * (unit.screen_x - 500.0)).abs() < 1e-9);
        assert!(((scaled.screen_y - 500.0) - 300.0 * (unit.screen_y - 500.0)).abs() < 1e-9);
        assert_eq!(scaled.view_z, -1.0);
    }
}
