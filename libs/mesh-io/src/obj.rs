//! Wavefront OBJ reader.
//!
//! Reads `v` and `f` records; everything else (normals, texture
//! coordinates, groups, materials) is skipped. Face corners may use the
//! `v`, `v/vt`, `v/vt/vn` or `v//vn` forms, and negative indices count back
//! from the most recent vertex.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use contact_mesh::Mesh;
use glam::DVec3;

use crate::error::{IoError, IoResult};

/// Loads an OBJ file.
pub fn load_obj(path: &Path) -> IoResult<Mesh> {
    let file = File::open(path)?;
    parse_obj(BufReader::new(file))
}

/// Parses OBJ text.
///
/// # Errors
///
/// [`IoError::NonTriangularFace`] for polygons other than triangles and
/// [`IoError::InvalidContent`] for malformed records or unknown vertices.
///
/// # Example
///
/// ```rust
/// use mesh_io::obj::parse_obj;
///
/// let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
/// let mesh = parse_obj(text.as_bytes()).unwrap();
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
pub fn parse_obj<R: BufRead>(reader: R) -> IoResult<Mesh> {
    let mut vertices: Vec<DVec3> = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or_default().trim();
        let mut parts = content.split_whitespace();

        match parts.next() {
            Some("v") => {
                let coords: Vec<f64> = parts
                    .take(3)
                    .map(str::parse)
                    .collect::<Result<_, _>>()?;
                if coords.len() < 3 {
                    return Err(IoError::invalid_content(format!(
                        "line {}: vertex needs three coordinates",
                        line_number + 1
                    )));
                }
                vertices.push(DVec3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let corners = parts
                    .map(|token| resolve_index(token, vertices.len(), line_number + 1))
                    .collect::<IoResult<Vec<u32>>>()?;
                match corners[..] {
                    [a, b, c] => triangles.push([a, b, c]),
                    _ => {
                        return Err(IoError::NonTriangularFace {
                            face: triangles.len(),
                            corners: corners.len(),
                        })
                    }
                }
            }
            _ => {}
        }
    }

    Ok(Mesh::from_parts(vertices, triangles)?)
}

/// Resolves one face corner to a zero-based vertex index.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> IoResult<u32> {
    let index: i64 = token.split('/').next().unwrap_or_default().parse()?;
    let count = i64::try_from(vertex_count)
        .map_err(|_| IoError::invalid_content("too many vertices"))?;
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => count + i,
        _ => {
            return Err(IoError::invalid_content(format!(
                "line {line}: face index 0 is not valid"
            )))
        }
    };
    if !(0..count).contains(&resolved) {
        return Err(IoError::invalid_content(format!(
            "line {line}: face index {index} refers to a missing vertex"
        )));
    }
    u32::try_from(resolved).map_err(|_| IoError::invalid_content("vertex index exceeds u32"))
}
