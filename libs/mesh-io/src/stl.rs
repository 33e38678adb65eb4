//! STL reader, ASCII and binary.
//!
//! STL stores each facet with its own three corners. Corners with
//! bit-identical coordinates are welded into shared vertices so that
//! adjacency queries see a connected surface.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    header
//! UINT32       triangle count
//! foreach triangle
//!     REAL32[3] normal (ignored)
//!     REAL32[3] vertex 1
//!     REAL32[3] vertex 2
//!     REAL32[3] vertex 3
//!     UINT16    attribute byte count
//! end
//! ```

use std::collections::HashMap;
use std::path::Path;

use contact_mesh::Mesh;
use glam::DVec3;

use crate::error::{IoError, IoResult};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// Loads an STL file, detecting ASCII or binary from its content.
pub fn load_stl(path: &Path) -> IoResult<Mesh> {
    let bytes = std::fs::read(path)?;
    parse_stl(&bytes)
}

/// Parses STL bytes.
///
/// A file whose length matches its binary triangle count is binary even if
/// its header happens to start with `solid`.
pub fn parse_stl(bytes: &[u8]) -> IoResult<Mesh> {
    if is_binary(bytes) {
        return parse_binary(bytes);
    }
    let text = String::from_utf8_lossy(bytes);
    if text.trim_start().starts_with("solid") {
        parse_ascii(&text)
    } else {
        parse_binary(bytes)
    }
}

fn declared_count(bytes: &[u8]) -> Option<u32> {
    let count = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([count[0], count[1], count[2], count[3]]))
}

fn is_binary(bytes: &[u8]) -> bool {
    declared_count(bytes).is_some_and(|count| {
        HEADER_SIZE + 4 + count as usize * TRIANGLE_SIZE == bytes.len()
    })
}

fn parse_binary(bytes: &[u8]) -> IoResult<Mesh> {
    let expected = declared_count(bytes).ok_or_else(|| {
        IoError::invalid_content(format!("file too small for STL: {} bytes", bytes.len()))
    })?;
    let body = &bytes[HEADER_SIZE + 4..];
    let present = body.len() / TRIANGLE_SIZE;
    if present < expected as usize {
        return Err(IoError::TruncatedStl {
            expected,
            got: u32::try_from(present).unwrap_or(u32::MAX),
        });
    }

    let mut welder = Welder::with_capacity(expected as usize);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(expected as usize) {
        // Skip the stored normal.
        let corners = [
            read_vertex(&record[12..24]),
            read_vertex(&record[24..36]),
            read_vertex(&record[36..48]),
        ];
        welder.push_triangle(corners)?;
    }
    welder.finish()
}

fn read_vertex(buf: &[u8]) -> DVec3 {
    let component =
        |i: usize| f64::from(f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]));
    DVec3::new(component(0), component(4), component(8))
}

fn parse_ascii(text: &str) -> IoResult<Mesh> {
    let mut welder = Welder::with_capacity(0);
    let mut corners: Vec<DVec3> = Vec::with_capacity(3);
    let mut in_loop = false;

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let coords: Vec<f64> = parts.take(3).map(str::parse).collect::<Result<_, _>>()?;
                if coords.len() < 3 {
                    return Err(IoError::invalid_content(
                        "vertex needs three coordinates",
                    ));
                }
                corners.push(DVec3::new(coords[0], coords[1], coords[2]));
            }
            "endloop" => {
                in_loop = false;
                match corners[..] {
                    [a, b, c] => welder.push_triangle([a, b, c])?,
                    _ => {
                        return Err(IoError::NonTriangularFace {
                            face: welder.triangle_count(),
                            corners: corners.len(),
                        })
                    }
                }
            }
            "endsolid" => break,
            _ => {}
        }
    }

    welder.finish()
}

/// Shares vertices between facets with identical corner coordinates.
struct Welder {
    index: HashMap<[u64; 3], u32>,
    vertices: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
}

impl Welder {
    fn with_capacity(triangles: usize) -> Self {
        Self {
            index: HashMap::with_capacity(triangles / 2),
            vertices: Vec::with_capacity(triangles / 2),
            triangles: Vec::with_capacity(triangles),
        }
    }

    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn vertex(&mut self, position: DVec3) -> IoResult<u32> {
        // Fold -0.0 into 0.0 so mirrored corners weld.
        let key = (position + DVec3::ZERO).to_array().map(f64::to_bits);
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }
        let id = u32::try_from(self.vertices.len())
            .map_err(|_| IoError::invalid_content("vertex count exceeds u32"))?;
        self.vertices.push(position);
        self.index.insert(key, id);
        Ok(id)
    }

    fn push_triangle(&mut self, [a, b, c]: [DVec3; 3]) -> IoResult<()> {
        let face = [self.vertex(a)?, self.vertex(b)?, self.vertex(c)?];
        self.triangles.push(face);
        Ok(())
    }

    fn finish(self) -> IoResult<Mesh> {
        Ok(Mesh::from_parts(self.vertices, self.triangles)?)
    }
}
