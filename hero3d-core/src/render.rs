/// Per-frame conversion of a scene into paint commands
use nalgebra::Point3;

use crate::config::SceneConfig;
use crate::depth::order_faces;
use crate::geometry::{Rgb, Scene};
use crate::paint::{Gradient, PaintCommand, Rgba};
use crate::projection::{Projector, Viewport};
use crate::transform::{RotationState, Transform};

/// Projects, depth-sorts and emits draw commands for a scene
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    projector: Projector,
    stroke_alpha: f64,
    scale_fraction: f64,
    viewport: Viewport,
    /// Pixels per scene unit, derived from the viewport and scene size
    world_scale: f64,
}

impl FrameRenderer {
    pub fn new(config: &SceneConfig, scene: &Scene, viewport: Viewport) -> Self {
        let mut renderer = Self {
            projector: Projector::new(config.perspective_distance),
            stroke_alpha: config.stroke_alpha,
            scale_fraction: config.scale_fraction,
            viewport,
            world_scale: 1.0,
        };
        renderer.resize(scene, viewport);
        renderer
    }

    /// Recompute size-derived constants
    pub fn resize(&mut self, scene: &Scene, viewport: Viewport) {
        self.viewport = viewport;
        let half_extent = scene.largest_extent() / 2.0;
        let target = viewport.min_side() * self.scale_fraction;
        self.world_scale = if half_extent > 0.0 {
            target / half_extent
        } else {
            target
        };
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn world_scale(&self) -> f64 {
        self.world_scale
    }

    /// Clear followed by every face in depth-sorted order
    pub fn frame(&self, scene: &Scene, rotation: &RotationState) -> Vec<PaintCommand> {
        let matrix = Transform::rotation_matrix(rotation);
        // Scene units throughout; pixels only appear after the divide
        let placed: Vec<Vec<Point3<f64>>> = scene
            .meshes
            .iter()
            .map(|mesh| mesh.placed_vertices().collect())
            .collect();

        let order = order_faces(scene, &placed, &matrix);

        let mut commands = Vec::with_capacity(order.len() + 1);
        commands.push(PaintCommand::Clear);
        for drawable in order {
            let face = &scene.meshes[drawable.mesh].faces[drawable.face];
            let vertices = &placed[drawable.mesh];
            let points: Vec<(f64, f64)> = face
                .indices
                .iter()
                .map(|&i| {
                    let rotated = Transform::rotate_point(&matrix, &vertices[i]);
                    let p = self.projector.project_rotated_scaled(
                        &rotated,
                        &self.viewport,
                        self.world_scale,
                    );
                    (p.screen_x, p.screen_y)
                })
                .collect();
            commands.push(PaintCommand::Polygon {
                gradient: Gradient::over(&points, face.color),
                stroke: Rgba::new(Rgb::new(255, 255, 255), self.stroke_alpha),
                points,
            });
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygons(commands: &[PaintCommand]) -> Vec<&Vec<(f64, f64)>> {
        commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Polygon { points, .. } => Some(points),
                PaintCommand::Clear => None,
            })
            .collect()
    }

    #[test]
    fn test_cube_front_face_centred() {
        let config = SceneConfig::default();
        let scene = Scene::single_cube(2.0, &config.palette);
        let renderer = FrameRenderer::new(&config, &scene, Viewport::new(800.0, 600.0));
        let commands = renderer.frame(&scene, &RotationState::zero());

        assert_eq!(commands[0], PaintCommand::Clear);
        let faces = polygons(&commands);
        assert_eq!(faces.len(), 6);

        let front = faces[0];
        let cx = front.iter().map(|p| p.0).sum::<f64>() / front.len() as f64;
        let cy = front.iter().map(|p| p.1).sum::<f64>() / front.len() as f64;
        assert!((cx - 400.0).abs() < 2.0 && (cy - 300.0).abs() < 2.0);
    }

    #[test]
    fn test_world_scale_tracks_viewport() {
        let config = SceneConfig::default();
        let scene = Scene::single_cube(2.0, &[]);
        let mut renderer = FrameRenderer::new(&config, &scene, Viewport::new(800.0, 600.0));
        assert!((renderer.world_scale() - 150.0).abs() < 1e-9);
        renderer.resize(&scene, Viewport::new(400.0, 1000.0));
        assert!((renderer.world_scale() - 100.0).abs() < 1e-9);
        assert_eq!(renderer.viewport(), Viewport::new(400.0, 1000.0));
    }

    #[test]
    fn test_empty_scene_only_clears() {
        let config = SceneConfig::default();
        let scene = Scene::new();
        let renderer = FrameRenderer::new(&config, &scene, Viewport::new(10.0, 10.0));
        assert_eq!(renderer.frame(&scene, &RotationState::zero()), vec![PaintCommand::Clear]);
    }

    #[test]
    fn test_stroke_uses_configured_alpha() {
        let config = SceneConfig {
            stroke_alpha: 0.3,
            ..SceneConfig::default()
        };
        let scene = Scene::single_cube(1.0, &[]);
        let renderer = FrameRenderer::new(&config, &scene, Viewport::new(100.0, 100.0));
        for command in renderer.frame(&scene, &RotationState::new(0.2, 0.4)) {
            if let PaintCommand::Polygon { stroke, .. } = command {
                assert_eq!(stroke.alpha, 0.3);
            }
        }
    }

    #[test]
    fn test_large_viewport_keeps_corner_in_front_of_camera() {
        let config = SceneConfig::default();
        let scene = Scene::single_cube(2.0, &config.palette);
        let viewport = Viewport::new(2560.0, 1440.0);
        let renderer = FrameRenderer::new(&config, &scene, viewport);
        // Looking straight down a cube diagonal
        let rotation = RotationState::new(0.6155, 0.7854);
        let matrix = Transform::rotation_matrix(&rotation);

        let nearest = scene.meshes()[0]
            .placed_vertices()
            .map(|p| Transform::rotate_point(&matrix, &p).z)
            .fold(f64::INFINITY, f64::min);
        assert!(nearest > -config.perspective_distance / 2.0, "z = {nearest}");

        let commands = renderer.frame(&scene, &rotation);
        for points in polygons(&commands) {
            for &(x, y) in points {
                assert!((0.0..=viewport.width).contains(&x), "x = {x}");
                assert!((0.0..=viewport.height).contains(&y), "y = {y}");
            }
        }
    }
}
