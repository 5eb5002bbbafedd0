/// STL model loading (binary and ASCII) into an indexed, normalised mesh
use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::many0,
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::LoadError;
use crate::geometry::{Face, Mesh, Rgb};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Collects triangles, merging vertices with identical coordinates
struct MeshAssembler {
    mesh: Mesh,
    lookup: HashMap<[u32; 3], usize>,
    color: Rgb,
}

impl MeshAssembler {
    fn new(name: &str, color: Rgb) -> Self {
        Self {
            mesh: Mesh::new(name),
            lookup: HashMap::new(),
            color,
        }
    }

    fn vertex(&mut self, [x, y, z]: [f32; 3]) -> usize {
        let key = [x.to_bits(), y.to_bits(), z.to_bits()];
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.mesh.add_vertex(x as f64, y as f64, z as f64);
        self.lookup.insert(key, index);
        index
    }

    fn triangle(&mut self, corners: [[f32; 3]; 3]) {
        let indices: Vec<usize> = corners.iter().map(|&c| self.vertex(c)).collect();
        // Skip triangles that collapsed onto a shared vertex
        if indices[0] != indices[1] && indices[1] != indices[2] && indices[0] != indices[2] {
            self.mesh.add_face(Face::new(indices, self.color));
        }
    }

    fn finish(self) -> Result<Mesh, LoadError> {
        if self.mesh.faces.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(self.mesh)
    }
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8], color: Rgb) -> Result<Mesh, LoadError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(LoadError::Parse("file too small to be a valid STL".to_string()));
    }

    let body = &data[HEADER_LEN..];
    let triangle_count = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
    // The count is untrusted; compare against what the body can hold
    let available = (body.len() - 4) / FACET_LEN;
    if triangle_count > available {
        return Err(LoadError::Parse(format!(
            "expected {triangle_count} facets, file ends early"
        )));
    }

    let mut assembler = MeshAssembler::new("model", color);
    for facet in 0..triangle_count {
        // Facet normal (12 bytes) is ignored; winding defines orientation
        let base = 4 + facet * FACET_LEN + 12;
        let mut corners = [[0.0f32; 3]; 3];
        for (i, corner) in corners.iter_mut().enumerate() {
            let at = base + i * 12;
            *corner = [read_f32(body, at), read_f32(body, at + 4), read_f32(body, at + 8)];
        }
        assembler.triangle(corners);
    }

    assembler.finish()
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str, color: Rgb) -> Result<Mesh, LoadError> {
    let (_, corners) = parse_solid(input)
        .map_err(|e| LoadError::Parse(format!("failed to parse ASCII STL: {e:?}")))?;

    let mut assembler = MeshAssembler::new("model", color);
    for triangle in corners {
        assembler.triangle(triangle);
    }
    assembler.finish()
}

fn parse_solid(input: &str) -> IResult<&str, Vec<[[f32; 3]; 3]>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?;
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, [[f32; 3]; 3]> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, (a, b, c)) = tuple((parse_vertex, parse_vertex, parse_vertex))(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, [a, b, c]))
}

fn parse_vertex(input: &str) -> IResult<&str, [f32; 3]> {
    preceded(preceded(multispace0, tag("vertex")), parse_vector3)(input)
}

fn parse_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, [x, y, z]))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8], color: Rgb) -> Result<Mesh, LoadError> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text, color) {
                return Ok(mesh);
            }
        }
    }
    parse_binary_stl(data, color)
}

/// Recentre on the bounding-box centre and scale so the largest extent is 2.
///
/// STL is z-up; the scene is screen-oriented (y down), so z becomes -y.
pub fn normalize(mut mesh: Mesh) -> Mesh {
    if mesh.vertices.is_empty() {
        return mesh;
    }
    let mut min = Vector3::repeat(f64::INFINITY);
    let mut max = Vector3::repeat(f64::NEG_INFINITY);
    for v in &mesh.vertices {
        min = min.inf(&v.coords);
        max = max.sup(&v.coords);
    }
    let center = (min + max) / 2.0;
    let extent = (max - min).max();
    let scale = if extent > 0.0 { 2.0 / extent } else { 1.0 };
    for v in &mut mesh.vertices {
        let c = (v.coords - center) * scale;
        *v = Point3::new(c.x, -c.z, c.y);
    }
    mesh
}

/// Read, parse and normalise an STL file from disk
pub fn load_stl(path: &std::path::Path, color: Rgb) -> Result<Mesh, LoadError> {
    let data = std::fs::read(path)?;
    let mut mesh = normalize(parse_stl(&data, color)?);
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        mesh.name = stem.to_string();
    }
    Ok(mesh)
}
