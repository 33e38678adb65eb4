//! # OBB Tree
//!
//! Binary hierarchy of oriented bounding boxes over the faces of a mesh.
//!
//! ## Construction
//!
//! Each node fits a box to the vertices of its faces. Nodes holding more
//! faces than the configured leaf limit try a median split along their box
//! axes, longest first; the first axis that leaves both halves non-empty
//! produces two children. A node that cannot be split stays a leaf.
//!
//! ## Storage
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`].
//! Children are stored before their parent, so the root is the last node.


use std::collections::BTreeSet;

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use config::index_config::IndexConfig;
use glam::DVec3;
use stacker::maybe_grow;
use tracing::debug;

use crate::error::{ContactMeshError, ContactMeshResult};
use crate::mesh::Mesh;
use crate::obb::OrientedBoundingBox;

/// Handle to a node inside an [`ObbTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Either two children or a non-empty list of faces, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Split node.
    Internal {
        /// The two halves of the split.
        children: [NodeId; 2],
    },
    /// Terminal node.
    Leaf {
        /// Face indices into the mesh.
        triangles: Vec<usize>,
    },
}

/// One box of the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct ObbTreeNode {
    /// Box enclosing every vertex of the node's faces.
    pub bounds: OrientedBoundingBox,
    /// Number of faces below this node.
    pub triangle_count: usize,
    /// Children or faces.
    pub kind: NodeKind,
}

impl ObbTreeNode {
    /// True for terminal nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// Immutable OBB hierarchy over a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ObbTree {
    nodes: Vec<ObbTreeNode>,
    root: NodeId,
    parallel_epsilon: f64,
}

impl ObbTree {
    /// Builds a tree over every face of `mesh`.
    ///
    /// # Errors
    ///
    /// [`ContactMeshError::EmptyInput`] if the mesh has no faces.
    ///
    /// # Example
    ///
    /// ```rust
    /// use config::index_config::IndexConfig;
    /// use contact_mesh::{primitives::create_box, ObbTree};
    /// use glam::DVec3;
    ///
    /// let cube = create_box(DVec3::ONE, true).unwrap();
    /// let tree = ObbTree::build(&cube, &IndexConfig::default()).unwrap();
    /// assert_eq!(tree.covered_triangles(), (0..12).collect::<Vec<_>>());
    /// ```
    pub fn build(mesh: &Mesh, config: &IndexConfig) -> ContactMeshResult<Self> {
        Self::build_from(mesh, (0..mesh.triangle_count()).collect(), config)
    }

    /// Builds a tree over a subset of faces.
    ///
    /// # Errors
    ///
    /// [`ContactMeshError::EmptyInput`] if `faces` is empty and
    /// [`ContactMeshError::IndexOutOfRange`] if a face id is not in the mesh
    /// or a face references a missing vertex.
    pub fn build_from(
        mesh: &Mesh,
        faces: Vec<usize>,
        config: &IndexConfig,
    ) -> ContactMeshResult<Self> {
        mesh.validate()?;
        if faces.is_empty() {
            return Err(ContactMeshError::empty("OBB tree needs at least one face"));
        }
        if let Some(&bad) = faces.iter().find(|&&f| f >= mesh.triangle_count()) {
            return Err(ContactMeshError::out_of_range(
                "triangle",
                bad,
                mesh.triangle_count(),
            ));
        }

        let mut nodes = Vec::new();
        let root = build_node(&mut nodes, mesh, faces, config)?;
        let tree = Self {
            nodes,
            root,
            parallel_epsilon: config.parallel_epsilon,
        };

        debug!(
            nodes = tree.node_count(),
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            triangles = tree.node(root).triangle_count,
            "built OBB tree"
        );
        Ok(tree)
    }

    /// Root handle.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node behind a handle.
    #[inline]
    pub fn node(&self, id: NodeId) -> &ObbTreeNode {
        &self.nodes[id.0]
    }

    /// Ray/triangle parallel rejection threshold captured at build time.
    #[inline]
    pub fn parallel_epsilon(&self) -> f64 {
        self.parallel_epsilon
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[ObbTreeNode] {
        &self.nodes
    }

    /// Children of an internal node.
    pub fn children(&self, id: NodeId) -> Option<[NodeId; 2]> {
        match self.node(id).kind {
            NodeKind::Internal { children } => Some(children),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Faces of a leaf node.
    pub fn leaf_triangles(&self, id: NodeId) -> Option<&[usize]> {
        match &self.node(id).kind {
            NodeKind::Leaf { triangles } => Some(triangles),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of levels; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Some(children) = self.children(id) {
                stack.extend(children.map(|c| (c, level + 1)));
            }
        }
        deepest
    }

    /// Every face stored in a leaf, sorted. Duplicates are kept, so a
    /// well-formed tree returns each input face exactly once.
    pub fn covered_triangles(&self) -> Vec<usize> {
        let mut faces: Vec<usize> = self
            .nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Leaf { triangles } => Some(triangles.iter().copied()),
                NodeKind::Internal { .. } => None,
            })
            .flatten()
            .collect();
        faces.sort_unstable();
        faces
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

fn build_node(
    nodes: &mut Vec<ObbTreeNode>,
    mesh: &Mesh,
    faces: Vec<usize>,
    config: &IndexConfig,
) -> ContactMeshResult<NodeId> {
    maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
        let vertex_ids: BTreeSet<u32> = faces
            .iter()
            .flat_map(|&f| mesh.triangle(f))
            .collect();
        let points: Vec<DVec3> = vertex_ids.iter().map(|&v| mesh.vertex(v)).collect();
        let bounds = OrientedBoundingBox::fit(&points, config)?;
        let triangle_count = faces.len();

        let kind = if triangle_count > config.leaf_triangle_limit {
            match best_split(mesh, &faces, &bounds) {
                Some((first, second)) => {
                    let a = build_node(nodes, mesh, first, config)?;
                    let b = build_node(nodes, mesh, second, config)?;
                    NodeKind::Internal { children: [a, b] }
                }
                None => NodeKind::Leaf { triangles: faces },
            }
        } else {
            NodeKind::Leaf { triangles: faces }
        };

        nodes.push(ObbTreeNode {
            bounds,
            triangle_count,
            kind,
        });
        Ok(NodeId(nodes.len() - 1))
    })
}

/// Tries the box axes from longest to shortest and returns the first
/// split that leaves both halves non-empty.
///
/// Faces are projected onto the node's box axes, so a rotated node splits
/// across its own axis rather than the world axis of the same index.
fn best_split(
    mesh: &Mesh,
    faces: &[usize],
    bounds: &OrientedBoundingBox,
) -> Option<(Vec<usize>, Vec<usize>)> {
    let size = bounds.size();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| size[b].total_cmp(&size[a]));

    order
        .iter()
        .find_map(|&axis| split_along_axis(mesh, faces, bounds.axis(axis)))
}

/// Median split of `faces` along `direction`.
///
/// Each face is projected to an interval `[lo, hi]`; the split value is the
/// mean of the median `lo` and the median `hi`. Faces entirely below go
/// first, faces entirely above go second and straddling faces follow their
/// midpoint. Returns `None` when either side would be empty.
pub fn split_along_axis(
    mesh: &Mesh,
    faces: &[usize],
    direction: DVec3,
) -> Option<(Vec<usize>, Vec<usize>)> {
    if faces.is_empty() {
        return None;
    }

    let extents: Vec<(f64, f64)> = faces
        .iter()
        .map(|&f| {
            let [a, b, c] = mesh.triangle_vertices(f).map(|v| direction.dot(v));
            (a.min(b).min(c), a.max(b).max(c))
        })
        .collect();

    let mut lows: Vec<f64> = extents.iter().map(|e| e.0).collect();
    let mut highs: Vec<f64> = extents.iter().map(|e| e.1).collect();
    let split = (median(&mut lows) + median(&mut highs)) / 2.0;

    let mut first = Vec::new();
    let mut second = Vec::new();
    for (&face, &(lo, hi)) in faces.iter().zip(&extents) {
        if hi <= split {
            first.push(face);
        } else if lo >= split {
            second.push(face);
        } else if (lo + hi) / 2.0 <= split {
            first.push(face);
        } else {
            second.push(face);
        }
    }

    if first.is_empty() || second.is_empty() {
        None
    } else {
        Some((first, second))
    }
}

/// Median of a list; the mean of the middle pair for even lengths and NaN
/// for an empty list. Reorders `values`.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
