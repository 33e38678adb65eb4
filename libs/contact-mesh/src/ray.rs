//! # Ray Queries
//!
//! Ray/triangle intersection and nearest-hit traversal of an [`ObbTree`].
//!
//! Distances are signed multiples of the ray direction: a triangle behind
//! the origin reports a negative distance. Boxes are tested against the
//! forward half-ray only, so a backward hit is found only when its leaf box
//! also reaches in front of the origin.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use stacker::maybe_grow;

use crate::mesh::Mesh;
use crate::obb_tree::{NodeId, NodeKind, ObbTree};

/// A ray/surface intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Face index in the mesh.
    pub triangle: usize,
    /// Intersection point.
    pub point: DVec3,
    /// Signed distance along the ray.
    pub distance: f64,
}

/// Tree traversal used for nearest-hit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayTraversal {
    /// [`ObbTree::ray_intersect`].
    #[default]
    Heuristic,
    /// [`ObbTree::ray_intersect_exact`].
    Exact,
}

/// Möller-Trumbore ray/triangle test.
///
/// Returns the intersection point and signed distance, or `None` when the
/// ray is parallel to the triangle plane (`|det| < parallel_epsilon`) or
/// passes outside the triangle.
///
/// # Example
///
/// ```rust
/// use contact_mesh::ray::ray_triangle_intersection;
/// use glam::DVec3;
///
/// let tri = [DVec3::ZERO, DVec3::X, DVec3::Y];
/// let (point, t) =
///     ray_triangle_intersection(DVec3::new(0.25, 0.25, 2.0), DVec3::NEG_Z, tri, 1e-8).unwrap();
/// assert_eq!(t, 2.0);
/// assert_eq!(point, DVec3::new(0.25, 0.25, 0.0));
/// ```
pub fn ray_triangle_intersection(
    origin: DVec3,
    direction: DVec3,
    [v0, v1, v2]: [DVec3; 3],
    parallel_epsilon: f64,
) -> Option<(DVec3, f64)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let h = direction.cross(e2);
    let a = e1.dot(h);
    if a.abs() < parallel_epsilon {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = f * direction.dot(q);
    let w = 1.0 - u - v;
    if v < 0.0 || w < 0.0 {
        return None;
    }

    Some((w * v0 + u * v1 + v * v2, f * e2.dot(q)))
}

/// Ordering key of a hit: any hit in front of the origin ranks before any
/// hit behind it, then by distance from the origin.
fn rank(hit: &RayHit) -> (bool, f64) {
    (hit.distance < 0.0, hit.distance.abs())
}

/// Keeps whichever hit ranks first under [`rank`].
fn nearer(current: Option<RayHit>, candidate: Option<RayHit>) -> Option<RayHit> {
    match (current, candidate) {
        (Some(a), Some(b)) => {
            if rank(&b) < rank(&a) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, None) => a,
        (None, b) => b,
    }
}

/// True if a box entered at `entry` may hold a hit that ranks before `hit`.
fn may_improve(entry: f64, hit: &RayHit) -> bool {
    hit.distance < 0.0 || entry <= hit.distance
}

impl ObbTree {
    /// Nearest hit of the ray against the faces indexed by this tree.
    ///
    /// Descends into the child box with the smaller entry distance first and
    /// visits the other child only if nothing was found or its entry is
    /// closer than the hit found so far. Forward hits rank before hits
    /// behind the origin. A backward hit is only reported when its leaf box
    /// reaches in front of the origin; [`ObbTree::ray_intersect_exact`]
    /// keeps every box that could still improve on the best hit.
    ///
    /// `mesh` must be the mesh the tree was built from.
    pub fn ray_intersect(&self, mesh: &Mesh, origin: DVec3, direction: DVec3) -> Option<RayHit> {
        self.node_bounds_hit(self.root(), origin, direction)?;
        self.intersect_node(mesh, self.root(), origin, direction)
    }

    /// Nearest hit using a best-first traversal ordered by box entry
    /// distance. Stops once the next box starts beyond the best hit.
    pub fn ray_intersect_exact(
        &self,
        mesh: &Mesh,
        origin: DVec3,
        direction: DVec3,
    ) -> Option<RayHit> {
        let mut queue = BinaryHeap::new();
        let entry = self.node_bounds_hit(self.root(), origin, direction)?;
        queue.push(Candidate {
            entry,
            id: self.root(),
        });

        let mut best: Option<RayHit> = None;
        while let Some(Candidate { entry, id }) = queue.pop() {
            if best.is_some_and(|hit| !may_improve(entry, &hit)) {
                break;
            }
            match &self.node(id).kind {
                NodeKind::Leaf { triangles } => {
                    best = nearer(best, self.intersect_leaf(mesh, triangles, origin, direction));
                }
                NodeKind::Internal { children } => {
                    for &child in children {
                        if let Some(entry) = self.node_bounds_hit(child, origin, direction) {
                            if best.map_or(true, |hit| may_improve(entry, &hit)) {
                                queue.push(Candidate { entry, id: child });
                            }
                        }
                    }
                }
            }
        }
        best
    }

    /// Dispatches to the traversal selected by `traversal`.
    pub fn cast(
        &self,
        mesh: &Mesh,
        origin: DVec3,
        direction: DVec3,
        traversal: RayTraversal,
    ) -> Option<RayHit> {
        match traversal {
            RayTraversal::Heuristic => self.ray_intersect(mesh, origin, direction),
            RayTraversal::Exact => self.ray_intersect_exact(mesh, origin, direction),
        }
    }

    fn node_bounds_hit(&self, id: NodeId, origin: DVec3, direction: DVec3) -> Option<f64> {
        self.node(id).bounds.intersects_ray(origin, direction)
    }

    fn intersect_leaf(
        &self,
        mesh: &Mesh,
        triangles: &[usize],
        origin: DVec3,
        direction: DVec3,
    ) -> Option<RayHit> {
        triangles.iter().fold(None, |best, &triangle| {
            let hit = ray_triangle_intersection(
                origin,
                direction,
                mesh.triangle_vertices(triangle),
                self.parallel_epsilon(),
            )
            .map(|(point, distance)| RayHit {
                triangle,
                point,
                distance,
            });
            nearer(best, hit)
        })
    }

    fn intersect_node(
        &self,
        mesh: &Mesh,
        id: NodeId,
        origin: DVec3,
        direction: DVec3,
    ) -> Option<RayHit> {
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            let children = match &self.node(id).kind {
                NodeKind::Leaf { triangles } => {
                    return self.intersect_leaf(mesh, triangles, origin, direction)
                }
                NodeKind::Internal { children } => *children,
            };

            let [a, b] = children;
            match (
                self.node_bounds_hit(a, origin, direction),
                self.node_bounds_hit(b, origin, direction),
            ) {
                (None, None) => None,
                (Some(_), None) => self.intersect_node(mesh, a, origin, direction),
                (None, Some(_)) => self.intersect_node(mesh, b, origin, direction),
                (Some(da), Some(db)) => {
                    let (near, far, far_entry) = if da < db { (a, b, db) } else { (b, a, da) };
                    match self.intersect_node(mesh, near, origin, direction) {
                        None => self.intersect_node(mesh, far, origin, direction),
                        Some(hit) if may_improve(far_entry, &hit) => nearer(
                            Some(hit),
                            self.intersect_node(mesh, far, origin, direction),
                        ),
                        found => found,
                    }
                }
            }
        })
    }
}

/// Heap entry ordered so that the smallest entry distance pops first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    entry: f64,
    id: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .entry
            .total_cmp(&self.entry)
            .then_with(|| other.id.cmp(&self.id))
    }
}
