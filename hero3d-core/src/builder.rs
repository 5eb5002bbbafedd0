/// Compound scenes assembled from primitive meshes.
///
/// Sub-features such as windows and antennas are emitted as extra meshes
/// parented to their host so they follow its local transform.
use nalgebra::{Point3, Vector3};

use crate::error::MeshError;
use crate::geometry::{LocalTransform, Mesh, Rgb, Scene};

/// A rows x columns grid of small panes on the +z face of a host box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGrid {
    pub rows: i32,
    pub columns: i32,
    /// Centre-to-centre distance (horizontal, vertical)
    pub spacing: (f64, f64),
    /// Pane width and height
    pub size: (f64, f64),
    pub color: Rgb,
}

impl WindowGrid {
    /// Panes for a host box of `extents` centred at the local origin.
    ///
    /// Non-positive row or column counts produce no panes.
    pub fn panes(&self, host: &str, extents: Vector3<f64>) -> Vec<Mesh> {
        if self.rows <= 0 || self.columns <= 0 {
            return Vec::new();
        }
        let (rows, columns) = (self.rows as usize, self.columns as usize);
        let (dx, dy) = self.spacing;
        let origin_x = -dx * (columns - 1) as f64 / 2.0;
        let origin_y = -dy * (rows - 1) as f64 / 2.0;
        // Just outside the +z wall. Faces paint in ascending z, so at rest
        // the +z wall is painted after the rest of the box and the panes
        // after that wall.
        let z = extents.z / 2.0 + 0.02;

        let mut panes = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                let center = Point3::new(
                    origin_x + column as f64 * dx,
                    origin_y + row as f64 * dy,
                    z,
                );
                panes.push(Mesh::cuboid(
                    format!("{host}/window-{row}-{column}"),
                    center,
                    Vector3::new(self.size.0, self.size.1, 0.02),
                    &[self.color],
                ));
            }
        }
        panes
    }
}

/// A thin mast standing on top of a host box of height `host_height`
pub fn antenna(host: &str, host_height: f64, height: f64, color: Rgb) -> Mesh {
    Mesh::cuboid(
        format!("{host}/antenna"),
        Point3::new(0.0, -host_height / 2.0 - height / 2.0, 0.0),
        Vector3::new(0.05, height, 0.05),
        &[color],
    )
}

fn pick(palette: &[Rgb], index: usize) -> Rgb {
    if palette.is_empty() {
        Rgb::GREY
    } else {
        palette[index % palette.len()]
    }
}

/// Shades of one base colour for the six faces of a box
fn shaded(base: Rgb) -> [Rgb; 6] {
    [
        base,
        base.darken(0.35),
        base.lighten(0.25),
        base.darken(0.5),
        base.darken(0.15),
        base.darken(0.25),
    ]
}

struct Tower {
    name: &'static str,
    x: f64,
    z: f64,
    width: f64,
    height: f64,
    windows: WindowGrid,
    antenna: bool,
}

impl Scene {
    /// One cube of edge `extent` centred at the origin
    pub fn single_cube(extent: f64, palette: &[Rgb]) -> Self {
        let mut scene = Scene::new();
        // Cuboids are well-formed by construction
        scene.meshes.push(Mesh::cuboid(
            "cube",
            Point3::origin(),
            Vector3::repeat(extent),
            palette,
        ));
        scene
    }

    /// Three towers of different heights on a ground slab
    pub fn building(palette: &[Rgb]) -> Result<Self, MeshError> {
        let ground_y = 1.0;
        let mut scene = Scene::new();
        scene.add_mesh(Mesh::cuboid(
            "ground",
            Point3::new(0.0, ground_y + 0.05, 0.0),
            Vector3::new(4.0, 0.1, 2.6),
            &shaded(pick(palette, 4)),
        ))?;

        let pane = pick(palette, 5);
        let towers = [
            Tower {
                name: "tower-main",
                x: 0.0,
                z: 0.0,
                width: 1.0,
                height: 2.6,
                windows: WindowGrid {
                    rows: 6,
                    columns: 3,
                    spacing: (0.28, 0.38),
                    size: (0.16, 0.22),
                    color: pane,
                },
                antenna: true,
            },
            Tower {
                name: "tower-west",
                x: -1.2,
                z: 0.3,
                width: 0.8,
                height: 1.8,
                windows: WindowGrid {
                    rows: 4,
                    columns: 2,
                    spacing: (0.3, 0.38),
                    size: (0.16, 0.22),
                    color: pane,
                },
                antenna: false,
            },
            Tower {
                name: "tower-east",
                x: 1.15,
                z: 0.2,
                width: 0.7,
                height: 1.3,
                windows: WindowGrid {
                    rows: 3,
                    columns: 2,
                    spacing: (0.26, 0.36),
                    size: (0.14, 0.2),
                    color: pane,
                },
                antenna: true,
            },
        ];

        for (i, tower) in towers.iter().enumerate() {
            let extents = Vector3::new(tower.width, tower.height, tower.width);
            let transform = LocalTransform::new(
                Vector3::new(tower.x, ground_y - tower.height / 2.0, tower.z),
                1.0,
            );
            let host = scene.add_mesh(
                Mesh::cuboid(
                    tower.name,
                    Point3::origin(),
                    extents,
                    &shaded(pick(palette, i)),
                )
                .with_transform(transform),
            )?;
            for pane in tower.windows.panes(tower.name, extents) {
                scene.add_child(host, pane)?;
            }
            if tower.antenna {
                scene.add_child(
                    host,
                    antenna(tower.name, tower.height, tower.height * 0.2, pick(palette, 3)),
                )?;
            }
        }

        Ok(scene)
    }

    /// A box house with a pyramid roof, a door and a pair of windows
    pub fn house(palette: &[Rgb]) -> Result<Self, MeshError> {
        let mut scene = Scene::new();
        let body = Vector3::new(2.0, 1.2, 1.6);
        let host = scene.add_mesh(
            Mesh::cuboid("house", Point3::origin(), body, &shaded(pick(palette, 3)))
                .with_transform(LocalTransform::new(Vector3::new(0.0, 0.3, 0.0), 1.0)),
        )?;

        let roof = Mesh::cone(
            "house/roof",
            Point3::new(0.0, -body.y / 2.0, 0.0),
            1.45,
            0.9,
            4,
            pick(palette, 0),
        );
        scene.add_child(host, roof)?;

        scene.add_child(
            host,
            Mesh::cuboid(
                "house/door",
                Point3::new(0.0, body.y / 2.0 - 0.3, body.z / 2.0 + 0.02),
                Vector3::new(0.35, 0.6, 0.02),
                &[pick(palette, 4)],
            ),
        )?;

        let windows = WindowGrid {
            rows: 1,
            columns: 2,
            spacing: (1.1, 0.0),
            size: (0.35, 0.3),
            color: pick(palette, 5),
        };
        for pane in windows.panes("house", body) {
            scene.add_child(host, pane)?;
        }

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn test_window_grid_count_and_spacing() {
        let grid = WindowGrid {
            rows: 2,
            columns: 3,
            spacing: (0.5, 1.0),
            size: (0.1, 0.1),
            color: Rgb::GREY,
        };
        let panes = grid.panes("t", Vector3::repeat(2.0));
        assert_eq!(panes.len(), 6);
        let first = &panes[0].vertices;
        let centroid_x = first.iter().map(|p| p.x).sum::<f64>() / first.len() as f64;
        assert!((centroid_x + 0.5).abs() < 1e-12);
        assert!(panes.iter().all(|p| p.vertices.iter().all(|v| v.z > 0.99)));
    }

    #[test]
    fn test_window_grid_degenerates_to_nothing() {
        for (rows, columns) in [(0, 3), (3, 0), (-1, 2), (2, -5)] {
            let grid = WindowGrid {
                rows,
                columns,
                spacing: (0.5, 0.5),
                size: (0.1, 0.1),
                color: Rgb::GREY,
            };
            assert!(grid.panes("t", Vector3::repeat(1.0)).is_empty());
        }
    }

    #[test]
    fn test_building_composition() {
        let scene = Scene::building(&SceneConfig::default().palette).unwrap();
        // ground + 3 towers + 18 + 8 + 6 windows + 2 antennas
        assert_eq!(scene.meshes.len(), 1 + 3 + 18 + 8 + 6 + 2);
        let main = scene
            .meshes
            .iter()
            .position(|m| m.name == "tower-main")
            .unwrap();
        let window = scene
            .meshes
            .iter()
            .find(|m| m.name.starts_with("tower-main/window"))
            .unwrap();
        assert_eq!(window.transform, scene.meshes[main].transform);
        assert!(scene.largest_extent() > 3.0);
    }

    #[test]
    fn test_house_composition() {
        let scene = Scene::house(&[]).unwrap();
        let names: Vec<&str> = scene.meshes.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"house/roof"));
        assert!(names.contains(&"house/door"));
        assert_eq!(scene.meshes.len(), 1 + 1 + 1 + 2);
        for mesh in &scene.meshes {
            assert!(mesh.validate().is_ok());
        }
    }

    #[test]
    fn test_antenna_sits_on_top() {
        let mast = antenna("t", 2.0, 0.4, Rgb::GREY);
        let max_y = mast.vertices.iter().map(|v| v.y).fold(f64::MIN, f64::max);
        assert!((max_y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_panes_paint_after_their_tower_at_rest() {
        use crate::depth::order_faces;
        use crate::transform::{RotationState, Transform};

        let scene = Scene::building(&SceneConfig::default().palette).unwrap();
        let placed: Vec<Vec<Point3<f64>>> = scene
            .meshes()
            .iter()
            .map(|m| m.placed_vertices().collect())
            .collect();
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        let order = order_faces(&scene, &placed, &matrix);

        let slots = |pred: &dyn Fn(&str) -> bool| -> Vec<usize> {
            order
                .iter()
                .enumerate()
                .filter(|(_, d)| pred(&scene.meshes()[d.mesh].name))
                .map(|(slot, _)| slot)
                .collect()
        };
        let tower = slots(&|name: &str| name == "tower-main");
        let panes = slots(&|name: &str| name.starts_with("tower-main/window"));
        assert!(!panes.is_empty());
        assert!(panes.iter().min() > tower.iter().max());
    }
}
