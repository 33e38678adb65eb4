//! # Mesh Primitives
//!
//! Closed and open surface meshes with counter-clockwise outward winding.
//! Used to build test surfaces and quick-look contact geometry without a
//! mesh file.

use std::f64::consts::PI;

use glam::DVec3;

use crate::error::{ContactMeshError, ContactMeshResult};
use crate::mesh::Mesh;

/// Creates a rectangular box mesh with 8 vertices and 12 triangles.
///
/// With `center` the box is centered on the origin, otherwise its minimum
/// corner sits at the origin.
///
/// # Example
///
/// ```rust
/// use contact_mesh::primitives::create_box;
/// use glam::DVec3;
///
/// let mesh = create_box(DVec3::ONE, true).unwrap();
/// assert_eq!(mesh.triangle_count(), 12);
/// ```
pub fn create_box(size: DVec3, center: bool) -> ContactMeshResult<Mesh> {
    if size.min_element() <= 0.0 {
        return Err(ContactMeshError::invalid_property(format!(
            "box size must be positive: {size:?}"
        )));
    }

    let (min, max) = if center {
        (-size / 2.0, size / 2.0)
    } else {
        (DVec3::ZERO, size)
    };

    let mut mesh = Mesh::with_capacity(8, 12);
    // Corner k takes max on axis i when bit i of k is set.
    for k in 0..8u32 {
        mesh.add_vertex(DVec3::new(
            if k & 1 != 0 { max.x } else { min.x },
            if k & 2 != 0 { max.y } else { min.y },
            if k & 4 != 0 { max.z } else { min.z },
        ));
    }

    let faces: [[u32; 4]; 6] = [
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
    ];
    for [a, b, c, d] in faces {
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
    }

    Ok(mesh)
}

/// Creates a latitude/longitude sphere centered on the origin.
///
/// `segments` is the number of vertices around each ring; the ring count is
/// `(segments + 1) / 2`. The first and last rings are closed with fans.
pub fn create_sphere(radius: f64, segments: u32) -> ContactMeshResult<Mesh> {
    if radius <= 0.0 {
        return Err(ContactMeshError::invalid_property(format!(
            "sphere radius must be positive: {radius}"
        )));
    }
    if segments < 3 {
        return Err(ContactMeshError::invalid_property(format!(
            "sphere needs at least 3 segments: {segments}"
        )));
    }

    let ring_count = (segments + 1) / 2;
    let mut mesh = Mesh::new();

    for i in 0..ring_count {
        let phi = PI * (f64::from(i) + 0.5) / f64::from(ring_count);
        let (ring_radius, z) = (radius * phi.sin(), radius * phi.cos());
        for j in 0..segments {
            let theta = 2.0 * PI * f64::from(j) / f64::from(segments);
            mesh.add_vertex(DVec3::new(
                ring_radius * theta.cos(),
                ring_radius * theta.sin(),
                z,
            ));
        }
    }

    let at = |ring: u32, j: u32| ring * segments + j % segments;

    for j in 1..segments - 1 {
        mesh.add_triangle(at(0, 0), at(0, j), at(0, j + 1));
    }
    for i in 0..ring_count - 1 {
        for j in 0..segments {
            let (a0, a1) = (at(i, j), at(i, j + 1));
            let (b0, b1) = (at(i + 1, j), at(i + 1, j + 1));
            mesh.add_triangle(a0, b0, b1);
            mesh.add_triangle(a0, b1, a1);
        }
    }
    let last = ring_count - 1;
    for j in 1..segments - 1 {
        mesh.add_triangle(at(last, 0), at(last, j + 1), at(last, j));
    }

    Ok(mesh)
}

/// Creates a flat rectangular grid in the plane `z = height`, centered on
/// the z axis, split into `divisions x divisions` quads.
///
/// Normals point along +z when `facing_up`, otherwise along -z.
///
/// # Example
///
/// ```rust
/// use contact_mesh::primitives::create_plate;
///
/// let plate = create_plate(2.0, 2.0, 4, 0.0, true).unwrap();
/// assert_eq!(plate.triangle_count(), 32);
/// ```
pub fn create_plate(
    width: f64,
    depth: f64,
    divisions: u32,
    height: f64,
    facing_up: bool,
) -> ContactMeshResult<Mesh> {
    if width <= 0.0 || depth <= 0.0 {
        return Err(ContactMeshError::invalid_property(format!(
            "plate extents must be positive: {width} x {depth}"
        )));
    }
    if divisions == 0 {
        return Err(ContactMeshError::invalid_property(
            "plate needs at least one division",
        ));
    }

    let n = divisions + 1;
    let mut mesh = Mesh::with_capacity((n * n) as usize, (2 * divisions * divisions) as usize);
    for row in 0..n {
        for col in 0..n {
            let x = width * (f64::from(col) / f64::from(divisions) - 0.5);
            let y = depth * (f64::from(row) / f64::from(divisions) - 0.5);
            mesh.add_vertex(DVec3::new(x, y, height));
        }
    }

    for row in 0..divisions {
        for col in 0..divisions {
            let v00 = row * n + col;
            let v10 = v00 + 1;
            let v01 = v00 + n;
            let v11 = v01 + 1;
            if facing_up {
                mesh.add_triangle(v00, v10, v11);
                mesh.add_triangle(v00, v11, v01);
            } else {
                mesh.add_triangle(v00, v11, v10);
                mesh.add_triangle(v00, v01, v11);
            }
        }
    }

    Ok(mesh)
}
