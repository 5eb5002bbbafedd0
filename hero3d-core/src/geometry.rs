/// Geometry primitives: vertices, faces, meshes and scenes
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// An 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const GREY: Rgb = Rgb::new(160, 160, 170);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Move each channel `amount` (0..=1) of the way towards white
    pub fn lighten(self, amount: f64) -> Self {
        self.mix(Rgb::new(255, 255, 255), amount)
    }

    /// Move each channel `amount` (0..=1) of the way towards black
    pub fn darken(self, amount: f64) -> Self {
        self.mix(Rgb::new(0, 0, 0), amount)
    }

    fn mix(self, other: Rgb, amount: f64) -> Self {
        let t = amount.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
        }
    }

    /// CSS `rgb(...)` notation
    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A planar polygon referencing 3 or 4 vertices of its mesh by index
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub indices: Vec<usize>,
    pub color: Rgb,
}

impl Face {
    pub fn new(indices: impl Into<Vec<usize>>, color: Rgb) -> Self {
        Self {
            indices: indices.into(),
            color,
        }
    }
}

/// Position offset and uniform scale applied before the shared scene rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub offset: Vector3<f64>,
    pub scale: f64,
}

impl LocalTransform {
    pub fn new(offset: Vector3<f64>, scale: f64) -> Self {
        Self { offset, scale }
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(point.coords * self.scale + self.offset)
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            offset: Vector3::zeros(),
            scale: 1.0,
        }
    }
}

/// A rigid body: vertices in object-local space plus the faces over them
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
    pub transform: LocalTransform,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            faces: Vec::new(),
            transform: LocalTransform::default(),
        }
    }

    pub fn with_transform(mut self, transform: LocalTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.vertices.push(Point3::new(x, y, z));
        self.vertices.len() - 1
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Axis-aligned box centred on `center`.
    ///
    /// Faces are wound counter-clockwise when seen from outside the box.
    /// Colours are assigned in the order -z, +z, +y, -y, +x, -x and cycle
    /// when fewer than six are given.
    pub fn cuboid(
        name: impl Into<String>,
        center: Point3<f64>,
        extents: Vector3<f64>,
        colors: &[Rgb],
    ) -> Self {
        let half = extents / 2.0;
        let mut mesh = Self::new(name);

        for &(sx, sy, sz) in &[
            (-1.0, -1.0, -1.0),
            (1.0, -1.0, -1.0),
            (1.0, 1.0, -1.0),
            (-1.0, 1.0, -1.0),
            (-1.0, -1.0, 1.0),
            (1.0, -1.0, 1.0),
            (1.0, 1.0, 1.0),
            (-1.0, 1.0, 1.0),
        ] {
            mesh.add_vertex(
                center.x + sx * half.x,
                center.y + sy * half.y,
                center.z + sz * half.z,
            );
        }

        let quads: [[usize; 4]; 6] = [
            [0, 3, 2, 1], // -z
            [4, 5, 6, 7], // +z
            [3, 7, 6, 2], // +y
            [0, 1, 5, 4], // -y
            [1, 2, 6, 5], // +x
            [0, 4, 7, 3], // -x
        ];
        for (i, quad) in quads.iter().enumerate() {
            let color = if colors.is_empty() {
                Rgb::GREY
            } else {
                colors[i % colors.len()]
            };
            mesh.add_face(Face::new(quad.to_vec(), color));
        }

        mesh
    }

    /// Cone with an n-gon base lying in the plane `y = base_center.y` and its
    /// apex `height` above it. Scenes use screen orientation, so "above" is -y.
    /// Fewer than three segments yields an empty mesh.
    pub fn cone(
        name: impl Into<String>,
        base_center: Point3<f64>,
        radius: f64,
        height: f64,
        segments: usize,
        color: Rgb,
    ) -> Self {
        let mut mesh = Self::new(name);
        if segments < 3 {
            return mesh;
        }

        let apex = mesh.add_vertex(base_center.x, base_center.y - height, base_center.z);
        let ring: Vec<usize> = (0..segments)
            .map(|i| {
                let theta = i as f64 / segments as f64 * std::f64::consts::TAU;
                mesh.add_vertex(
                    base_center.x + radius * theta.cos(),
                    base_center.y,
                    base_center.z + radius * theta.sin(),
                )
            })
            .collect();

        for i in 0..segments {
            let a = ring[i];
            let b = ring[(i + 1) % segments];
            mesh.add_face(Face::new(vec![a, b, apex], color));
        }

        // Base as a triangle fan so every face stays within 3..=4 indices
        let base_color = color.darken(0.3);
        for i in 1..segments - 1 {
            mesh.add_face(Face::new(vec![ring[0], ring[i + 1], ring[i]], base_color));
        }

        mesh
    }

    /// Check that every face has 3 or 4 indices and each index resolves
    pub fn validate(&self) -> Result<(), MeshError> {
        for (face_index, face) in self.faces.iter().enumerate() {
            let arity = face.indices.len();
            if !(3..=4).contains(&arity) {
                return Err(MeshError::BadArity {
                    mesh: self.name.clone(),
                    face: face_index,
                    arity,
                });
            }
            if let Some(&index) = face.indices.iter().find(|&&i| i >= self.vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    mesh: self.name.clone(),
                    face: face_index,
                    index,
                    vertex_count: self.vertices.len(),
                });
            }
        }
        Ok(())
    }

    /// Vertices after the mesh's local transform
    pub fn placed_vertices(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.vertices.iter().map(|v| self.transform.apply(v))
    }
}

/// An ordered set of meshes; insertion order is the paint order before sorting.
///
/// Every mesh in a scene has passed [`Mesh::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub(crate) meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Add a mesh, returning its index
    pub fn add_mesh(&mut self, mesh: Mesh) -> Result<usize, MeshError> {
        mesh.validate()?;
        self.meshes.push(mesh);
        Ok(self.meshes.len() - 1)
    }

    /// Add a mesh parented to `host`: it inherits the host's local transform
    pub fn add_child(&mut self, host: usize, mesh: Mesh) -> Result<usize, MeshError> {
        let transform = self
            .meshes
            .get(host)
            .map(|m| m.transform)
            .ok_or(MeshError::UnknownHost(host))?;
        self.add_mesh(mesh.with_transform(transform))
    }

    /// Replace the mesh at `index`, keeping its local transform
    pub fn replace_mesh(&mut self, index: usize, mesh: Mesh) -> Result<(), MeshError> {
        mesh.validate()?;
        let slot = self
            .meshes
            .get_mut(index)
            .ok_or(MeshError::UnknownHost(index))?;
        let transform = slot.transform;
        *slot = mesh.with_transform(transform);
        Ok(())
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }

    /// Largest axis-aligned extent over all placed vertices
    pub fn largest_extent(&self) -> f64 {
        let mut min = Vector3::repeat(f64::INFINITY);
        let mut max = Vector3::repeat(f64::NEG_INFINITY);
        let mut any = false;
        for mesh in &self.meshes {
            for p in mesh.placed_vertices() {
                min = min.inf(&p.coords);
                max = max.sup(&p.coords);
                any = true;
            }
        }
        if !any {
            return 0.0;
        }
        (max - min).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_is_centered() {
        let mesh = Mesh::cuboid(
            "box",
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(2.0, 4.0, 6.0),
            &[],
        );
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 6);
        let sum = mesh
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        let centroid = sum / 8.0;
        assert!((centroid - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
        assert!(mesh.validate().is_ok());
    }

    fn assert_outward(mesh: &Mesh, interior: Vector3<f64>) {
        for face in &mesh.faces {
            let a = mesh.vertices[face.indices[0]];
            let b = mesh.vertices[face.indices[1]];
            let c = mesh.vertices[face.indices[2]];
            let normal = (b - a).cross(&(c - a));
            let centroid = face
                .indices
                .iter()
                .fold(Vector3::zeros(), |acc, &i| acc + mesh.vertices[i].coords)
                / face.indices.len() as f64;
            assert!(
                normal.dot(&(centroid - interior)) > 0.0,
                "face {:?} wound inward",
                face.indices
            );
        }
    }

    #[test]
    fn test_cuboid_winding_points_outward() {
        let mesh = Mesh::cuboid("box", Point3::origin(), Vector3::repeat(2.0), &[]);
        assert_outward(&mesh, Vector3::zeros());
    }

    #[test]
    fn test_cuboid_colors_cycle() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let mesh = Mesh::cuboid("box", Point3::origin(), Vector3::repeat(1.0), &[red, blue]);
        let colors: Vec<Rgb> = mesh.faces.iter().map(|f| f.color).collect();
        assert_eq!(colors, vec![red, blue, red, blue, red, blue]);
    }

    #[test]
    fn test_cone_faces() {
        let cone = Mesh::cone("roof", Point3::origin(), 1.0, 2.0, 4, Rgb::GREY);
        assert_eq!(cone.vertices.len(), 5);
        // 4 sides + 2 base triangles
        assert_eq!(cone.faces.len(), 6);
        assert!(cone.validate().is_ok());
        assert_outward(&cone, Vector3::new(0.0, -0.5, 0.0));
        assert!(cone.vertices[0].y < 0.0);

        let degenerate = Mesh::cone("roof", Point3::origin(), 1.0, 2.0, 2, Rgb::GREY);
        assert!(degenerate.faces.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = Mesh::new("broken");
        mesh.add_vertex(0.0, 0.0, 0.0);
        mesh.add_face(Face::new(vec![0, 1, 2], Rgb::GREY));
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange { index: 1, .. })
        ));

        let mut scene = Scene::new();
        assert!(scene.add_mesh(mesh).is_err());
        assert!(scene.meshes.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_arity() {
        let mut mesh = Mesh::new("line");
        mesh.add_vertex(0.0, 0.0, 0.0);
        mesh.add_vertex(1.0, 0.0, 0.0);
        mesh.add_face(Face::new(vec![0, 1], Rgb::GREY));
        assert!(matches!(mesh.validate(), Err(MeshError::BadArity { arity: 2, .. })));
    }

    #[test]
    fn test_child_inherits_host_transform() {
        let mut scene = Scene::new();
        let transform = LocalTransform::new(Vector3::new(5.0, 0.0, 0.0), 2.0);
        let host = scene
            .add_mesh(Mesh::cuboid("tower", Point3::origin(), Vector3::repeat(1.0), &[]).with_transform(transform))
            .unwrap();
        let child = scene
            .add_child(host, Mesh::cuboid("window", Point3::origin(), Vector3::repeat(0.1), &[]))
            .unwrap();
        assert_eq!(scene.meshes[child].transform, transform);
        assert!(scene.add_child(42, Mesh::new("orphan")).is_err());
    }

    #[test]
    fn test_largest_extent_uses_local_transform() {
        let mut scene = Scene::new();
        scene
            .add_mesh(
                Mesh::cuboid("a", Point3::origin(), Vector3::new(2.0, 1.0, 1.0), &[])
                    .with_transform(LocalTransform::new(Vector3::zeros(), 3.0)),
            )
            .unwrap();
        assert!((scene.largest_extent() - 6.0).abs() < 1e-12);
        assert_eq!(Scene::new().largest_extent(), 0.0);
    }

    #[test]
    fn test_color_shading() {
        let c = Rgb::new(100, 100, 100);
        assert_eq!(c.lighten(1.0), Rgb::new(255, 255, 255));
        assert_eq!(c.darken(1.0), Rgb::new(0, 0, 0));
        assert_eq!(c.lighten(0.0), c);
        assert_eq!(c.to_css(), "rgb(100, 100, 100)");
    }

    #[test]
    fn test_scene_only_holds_validated_meshes() {
        let mut scene = Scene::single_cube(2.0, &[]);
        let mut broken = Mesh::new("broken");
        broken.add_vertex(0.0, 0.0, 0.0);
        broken.add_face(Face::new(vec![0, 1, 2], Rgb::GREY));

        assert!(scene.add_mesh(broken.clone()).is_err());
        assert!(scene.replace_mesh(0, broken).is_err());
        assert_eq!(scene.meshes().len(), 1);
        assert!(scene.meshes().iter().all(|m| m.validate().is_ok()));
    }
}
