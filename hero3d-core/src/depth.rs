/// Painter's-algorithm ordering of faces by average rotated depth.
///
/// The key is the mean rotated (not perspective-divided) z of a face's
/// vertices. Faces are returned ascending by that key; the sort is stable so
/// equal keys keep declaration order.
use std::cmp::Ordering;

use nalgebra::{Matrix3, Point3};

use crate::geometry::{Face, Scene};
use crate::transform::Transform;

/// One face of one mesh together with its depth key for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableFace {
    pub mesh: usize,
    pub face: usize,
    pub depth: f64,
}

/// Average z of `face` after rotating its (already placed) vertices
pub fn depth_key(face: &Face, rotated: &[Point3<f64>]) -> f64 {
    if face.indices.is_empty() {
        return 0.0;
    }
    let sum: f64 = face.indices.iter().map(|&i| rotated[i].z).sum();
    sum / face.indices.len() as f64
}

/// Sort in place, ascending by depth, stable on ties
pub fn sort_drawables(faces: &mut [DrawableFace]) {
    faces.sort_by(|a, b| a.depth.partial_cmp(&b.depth).unwrap_or(Ordering::Equal));
}

/// Collect every face of `scene` in declaration order and sort by depth.
///
/// `placed` holds, per mesh, the vertices after local transform and any
/// frame scale; they are rotated here by `matrix`.
pub fn order_faces(
    scene: &Scene,
    placed: &[Vec<Point3<f64>>],
    matrix: &Matrix3<f64>,
) -> Vec<DrawableFace> {
    let mut drawables = Vec::with_capacity(scene.face_count());
    for (mesh_index, mesh) in scene.meshes.iter().enumerate() {
        let rotated: Vec<Point3<f64>> = placed[mesh_index]
            .iter()
            .map(|p| Transform::rotate_point(matrix, p))
            .collect();
        for (face_index, face) in mesh.faces.iter().enumerate() {
            drawables.push(DrawableFace {
                mesh: mesh_index,
                face: face_index,
                depth: depth_key(face, &rotated),
            });
        }
    }
    sort_drawables(&mut drawables);
    drawables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Rgb};
    use crate::transform::RotationState;
    use nalgebra::Vector3;

    fn placed(scene: &Scene) -> Vec<Vec<Point3<f64>>> {
        scene
            .meshes
            .iter()
            .map(|m| m.placed_vertices().collect())
            .collect()
    }

    #[test]
    fn test_ascending_by_average_z() {
        let scene = Scene::single_cube(2.0, &[]);
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        let order = order_faces(&scene, &placed(&scene), &matrix);
        assert_eq!(order.len(), 6);
        assert!(order.windows(2).all(|w| w[0].depth <= w[1].depth));
        // -z face first, +z face last, the four sides tie at 0 in between
        assert_eq!(order[0].face, 0);
        assert_eq!(order[5].face, 1);
        let middle: Vec<usize> = order[1..5].iter().map(|d| d.face).collect();
        assert_eq!(middle, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_ties_keep_declaration_order_across_meshes() {
        let mut scene = Scene::new();
        for name in ["a", "b", "c"] {
            scene
                .add_mesh(Mesh::cuboid(name, Point3::origin(), Vector3::repeat(1.0), &[Rgb::GREY]))
                .unwrap();
        }
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        let order = order_faces(&scene, &placed(&scene), &matrix);
        let front: Vec<usize> = order.iter().take(3).map(|d| d.mesh).collect();
        assert_eq!(front, vec![0, 1, 2]);
    }

    #[test]
    fn test_sort_is_deterministic() {
        let scene = Scene::building(&[]).unwrap();
        let matrix = Transform::rotation_matrix(&RotationState::new(0.3, 1.1));
        let first = order_faces(&scene, &placed(&scene), &matrix);
        let second = order_faces(&scene, &placed(&scene), &matrix);
        assert_eq!(first, second);

        let mut again = first.clone();
        sort_drawables(&mut again);
        assert_eq!(again, first);
    }

    #[test]
    fn test_depth_key_averages() {
        let face = Face::new(vec![0, 1, 2], Rgb::GREY);
        let rotated = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 6.0),
        ];
        assert!((depth_key(&face, &rotated) - 3.0).abs() < 1e-12);
    }
}
