//! VTK XML PolyData (`.vtp`) reader.
//!
//! Only `format="ascii"` data arrays are supported. Each `<Piece>`
//! contributes its `<Points>` and its `<Polys>` connectivity/offsets;
//! vertices, lines and strips are skipped. Every polygon must be a
//! triangle.
//!
//! ```text
//! <VTKFile type="PolyData">
//!   <PolyData>
//!     <Piece NumberOfPoints="3" NumberOfPolys="1">
//!       <Points>
//!         <DataArray NumberOfComponents="3" format="ascii">0 0 0 1 0 0 0 1 0</DataArray>
//!       </Points>
//!       <Polys>
//!         <DataArray Name="connectivity" format="ascii">0 1 2</DataArray>
//!         <DataArray Name="offsets" format="ascii">3</DataArray>
//!       </Polys>
//!     </Piece>
//!   </PolyData>
//! </VTKFile>
//! ```

use std::path::Path;

use contact_mesh::Mesh;
use glam::DVec3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IoError, IoResult};

/// Loads a `.vtp` file.
pub fn load_vtp(path: &Path) -> IoResult<Mesh> {
    let content = std::fs::read_to_string(path)?;
    parse_vtp(&content)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Points,
    Polys,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayTarget {
    Points,
    Connectivity,
    Offsets,
    Ignored,
}

/// Arrays of the piece being read.
#[derive(Debug, Default)]
struct Piece {
    points: Vec<f64>,
    connectivity: Vec<i64>,
    offsets: Vec<i64>,
}

/// Parses VTK PolyData XML.
///
/// # Example
///
/// ```rust
/// use mesh_io::vtp::parse_vtp;
///
/// let xml = r#"<VTKFile type="PolyData"><PolyData>
///   <Piece NumberOfPoints="3" NumberOfPolys="1">
///     <Points><DataArray NumberOfComponents="3" format="ascii">0 0 0 1 0 0 0 1 0</DataArray></Points>
///     <Polys>
///       <DataArray Name="connectivity" format="ascii">0 1 2</DataArray>
///       <DataArray Name="offsets" format="ascii">3</DataArray>
///     </Polys>
///   </Piece>
/// </PolyData></VTKFile>"#;
/// let mesh = parse_vtp(xml).unwrap();
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
pub fn parse_vtp(content: &str) -> IoResult<Mesh> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut vertices: Vec<DVec3> = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();
    let mut piece: Option<Piece> = None;
    let mut section = Section::Other;
    let mut target: Option<ArrayTarget> = None;
    let mut text = String::new();
    let mut saw_root = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"VTKFile" => {
                    check_file_type(e)?;
                    saw_root = true;
                }
                b"Piece" => piece = Some(Piece::default()),
                b"Points" => section = Section::Points,
                b"Polys" => section = Section::Polys,
                b"Verts" | b"Lines" | b"Strips" | b"PointData" | b"CellData" => {
                    section = Section::Other;
                }
                b"DataArray" => {
                    target = Some(array_target(e, section)?);
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"DataArray" {
                    let empty = array_target(e, section)?;
                    if let Some(piece) = piece.as_mut() {
                        store_array(piece, empty, "")?;
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if target.is_some() {
                    let chunk = e
                        .unescape()
                        .map_err(|err| IoError::invalid_content(format!("XML text error: {err}")))?;
                    text.push(' ');
                    text.push_str(&chunk);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"DataArray" => {
                    if let (Some(kind), Some(piece)) = (target.take(), piece.as_mut()) {
                        store_array(piece, kind, &text)?;
                    }
                    text.clear();
                }
                b"Points" | b"Polys" | b"Verts" | b"Lines" | b"Strips" | b"PointData"
                | b"CellData" => section = Section::Other,
                b"Piece" => {
                    if let Some(done) = piece.take() {
                        append_piece(done, &mut vertices, &mut triangles)?;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::invalid_content(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(IoError::invalid_content("missing <VTKFile> element"));
    }
    Ok(Mesh::from_parts(vertices, triangles)?)
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> IoResult<Option<String>> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            let value = std::str::from_utf8(&attr.value).map_err(|e| {
                IoError::invalid_content(format!("invalid UTF-8 in attribute: {e}"))
            })?;
            return Ok(Some(value.to_owned()));
        }
    }
    Ok(None)
}

fn check_file_type(element: &BytesStart<'_>) -> IoResult<()> {
    match attribute(element, b"type")?.as_deref() {
        Some("PolyData") => Ok(()),
        other => Err(IoError::invalid_content(format!(
            "expected VTKFile type PolyData, found {}",
            other.unwrap_or("none")
        ))),
    }
}

fn array_target(element: &BytesStart<'_>, section: Section) -> IoResult<ArrayTarget> {
    let name = attribute(element, b"Name")?;
    let kind = match (section, name.as_deref()) {
        (Section::Points, _) => ArrayTarget::Points,
        (Section::Polys, Some("connectivity")) => ArrayTarget::Connectivity,
        (Section::Polys, Some("offsets")) => ArrayTarget::Offsets,
        _ => ArrayTarget::Ignored,
    };
    if kind != ArrayTarget::Ignored {
        let format = attribute(element, b"format")?;
        if format.as_deref() != Some("ascii") {
            return Err(IoError::invalid_content(format!(
                "unsupported DataArray format {}; only ascii is supported",
                format.as_deref().unwrap_or("none")
            )));
        }
        if kind == ArrayTarget::Points {
            let components = attribute(element, b"NumberOfComponents")?;
            if components.as_deref().is_some_and(|c| c.trim() != "3") {
                return Err(IoError::invalid_content("points must have 3 components"));
            }
        }
    }
    Ok(kind)
}

fn store_array(piece: &mut Piece, kind: ArrayTarget, text: &str) -> IoResult<()> {
    let words = text.split_whitespace();
    match kind {
        ArrayTarget::Points => {
            piece.points = words.map(str::parse).collect::<Result<_, _>>()?;
        }
        ArrayTarget::Connectivity => {
            piece.connectivity = words.map(str::parse).collect::<Result<_, _>>()?;
        }
        ArrayTarget::Offsets => {
            piece.offsets = words.map(str::parse).collect::<Result<_, _>>()?;
        }
        ArrayTarget::Ignored => {}
    }
    Ok(())
}

fn append_piece(
    piece: Piece,
    vertices: &mut Vec<DVec3>,
    triangles: &mut Vec<[u32; 3]>,
) -> IoResult<()> {
    if piece.points.len() % 3 != 0 {
        return Err(IoError::invalid_content(format!(
            "point array length {} is not a multiple of 3",
            piece.points.len()
        )));
    }
    let base = u32::try_from(vertices.len())
        .map_err(|_| IoError::invalid_content("vertex count exceeds u32"))?;
    let piece_vertices = piece.points.len() / 3;
    vertices.extend(
        piece
            .points
            .chunks_exact(3)
            .map(|p| DVec3::new(p[0], p[1], p[2])),
    );

    let corner = |value: i64| -> IoResult<u32> {
        usize::try_from(value)
            .ok()
            .filter(|&v| v < piece_vertices)
            .and_then(|v| u32::try_from(v).ok())
            .map(|v| base + v)
            .ok_or_else(|| {
                IoError::invalid_content(format!("connectivity index {value} out of range"))
            })
    };

    let mut start = 0usize;
    for &offset in &piece.offsets {
        let end = usize::try_from(offset)
            .ok()
            .filter(|&end| end >= start && end <= piece.connectivity.len())
            .ok_or_else(|| IoError::invalid_content(format!("invalid polygon offset {offset}")))?;
        match piece.connectivity[start..end] {
            [a, b, c] => triangles.push([corner(a)?, corner(b)?, corner(c)?]),
            ref other => {
                return Err(IoError::NonTriangularFace {
                    face: triangles.len(),
                    corners: other.len(),
                })
            }
        }
        start = end;
    }
    Ok(())
}
