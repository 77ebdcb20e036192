// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mesh storage and hierarchy construction.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use glam::Vec3;
use tracing::{debug, warn};

use crate::error::MeshError;
use crate::traverse::NODE_INDEX_MASK;
use crate::types::{Aabb3, Face3, winding_normal};

/// Inverse of the welding lattice step (`1e-4` per axis).
const WELD_SCALE: f32 = 1e4;

/// A welded triangle: three indices into [`TriangleMesh::vertices`] and the
/// unit normal of the input triangle in its winding order.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Triangle {
    /// Welded vertex indices, in input winding order.
    pub indices: [u32; 3],
    /// Normal of the input triangle; zero for degenerate triangles.
    pub normal: Vec3,
}

/// Whether a hierarchy node is a leaf or an internal node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf holding one triangle.
    Leaf {
        /// Index into [`TriangleMesh::triangles`].
        face: u32,
    },
    /// Internal node with two children.
    Internal {
        /// Node index of the first child.
        left: u32,
        /// Node index of the second child.
        right: u32,
    },
}

/// A node of the bounding volume hierarchy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BvhNode {
    /// Bounds of everything below this node.
    pub aabb: Aabb3,
    /// Center of `aabb`.
    pub center: Vec3,
    /// Leaf or internal.
    pub kind: NodeKind,
}

impl BvhNode {
    fn new(aabb: Aabb3, kind: NodeKind) -> Self {
        Self {
            aabb,
            center: aabb.center(),
            kind,
        }
    }

    /// Whether this node references a triangle.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// A static triangle mesh with a bounding volume hierarchy for queries.
///
/// Built from a triangle soup with [`build`](Self::build). Vertices closer
/// than the welding step (`1e-4` on every axis) are merged, triangles keep
/// their input normals, and a median-split hierarchy is laid out so that
/// node `i` is the leaf of triangle `i` for every `i < face_count()`, with
/// internal nodes following and the root stored last.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    pub(crate) vertices: Vec<Vec3>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) nodes: Vec<BvhNode>,
    pub(crate) max_depth: usize,
    valid: bool,
}

impl TriangleMesh {
    /// Create an empty, unbuilt mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from a triangle soup.
    ///
    /// See [`build`](Self::build).
    pub fn from_faces(faces: &[Vec3]) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        mesh.build(faces)?;
        Ok(mesh)
    }

    /// Replace the contents of this mesh with `faces`, three consecutive
    /// vertices per triangle.
    ///
    /// On error the mesh is left empty and [`is_valid`](Self::is_valid)
    /// returns `false`.
    pub fn build(&mut self, faces: &[Vec3]) -> Result<(), MeshError> {
        self.clear();

        let vertex_count = faces.len();
        if vertex_count == 0 || vertex_count % 3 != 0 {
            warn!(vertex_count, "rejecting triangle soup with invalid arity");
            return Err(MeshError::InvalidInput { vertex_count });
        }
        let face_count = vertex_count / 3;
        if face_count > (NODE_INDEX_MASK as usize).div_ceil(2) {
            warn!(face_count, "triangle soup too large for the hierarchy");
            return Err(MeshError::TooManyFaces { faces: face_count });
        }

        // Weld and emit one leaf per triangle.
        let mut weld: BTreeMap<[i64; 3], u32> = BTreeMap::new();
        let mut vertices = Vec::new();
        let mut triangles = Vec::with_capacity(face_count);
        let mut nodes = Vec::with_capacity(2 * face_count - 1);
        for (face, corners) in faces.chunks_exact(3).enumerate() {
            let mut indices = [0_u32; 3];
            let mut aabb = None::<Aabb3>;
            for (index, &corner) in indices.iter_mut().zip(corners) {
                let (key, snapped) = weld_key(corner);
                *index = *weld.entry(key).or_insert_with(|| {
                    vertices.push(snapped);
                    to_u32(vertices.len() - 1)
                });
                let position = vertices[*index as usize];
                match aabb.as_mut() {
                    Some(aabb) => aabb.expand_to(position),
                    None => aabb = Some(Aabb3::from_point(position)),
                }
            }
            triangles.push(Triangle {
                indices,
                normal: winding_normal(corners[0], corners[1], corners[2]),
            });
            nodes.push(BvhNode::new(
                aabb.unwrap_or_default(),
                NodeKind::Leaf { face: to_u32(face) },
            ));
        }

        let mut order: Vec<u32> = (0..to_u32(face_count)).collect();
        let mut max_depth = 0;
        partition(&mut nodes, &mut order, 1, &mut max_depth);

        debug!(
            faces = face_count,
            vertices = vertices.len(),
            nodes = nodes.len(),
            max_depth,
            "built triangle mesh hierarchy"
        );

        self.vertices = vertices;
        self.triangles = triangles;
        self.nodes = nodes;
        self.max_depth = max_depth;
        self.valid = true;
        Ok(())
    }

    /// Drop all geometry; the mesh becomes invalid until the next build.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.nodes.clear();
        self.max_depth = 0;
        self.valid = false;
    }

    /// Whether the mesh holds a successfully built hierarchy.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of triangles.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Welded vertex positions, in first-seen order.
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Welded triangles, in input order.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Hierarchy nodes. Leaves come first, the root is last.
    #[inline]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Deepest level of the hierarchy, counting the root as level 1.
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Index of the root node, if the mesh is built.
    pub fn root(&self) -> Option<u32> {
        self.nodes.len().checked_sub(1).map(to_u32)
    }

    /// Bounds of the whole mesh, if it is built.
    pub fn bounds(&self) -> Option<Aabb3> {
        self.nodes.last().map(|node| node.aabb)
    }

    /// Triangle `face` rebuilt from the welded vertices.
    pub fn face(&self, face: usize) -> Option<Face3> {
        self.triangles.get(face).map(|t| self.corners(t))
    }

    /// All triangles rebuilt from the welded vertices.
    ///
    /// Empty when the mesh is not built.
    pub fn faces(&self) -> Vec<Face3> {
        self.triangles.iter().map(|t| self.corners(t)).collect()
    }

    /// Welded vertex indices, three per triangle.
    pub fn indices(&self) -> Vec<u32> {
        self.triangles.iter().flat_map(|t| t.indices).collect()
    }

    #[inline]
    pub(crate) fn corners(&self, triangle: &Triangle) -> Face3 {
        let [a, b, c] = triangle.indices.map(|i| self.vertices[i as usize]);
        Face3::new(a, b, c)
    }
}

/// Median-split the leaves listed in `order`, appending internal nodes.
///
/// Returns the node index for the range, or `None` when it is empty.
fn partition(
    nodes: &mut Vec<BvhNode>,
    order: &mut [u32],
    depth: usize,
    max_depth: &mut usize,
) -> Option<u32> {
    *max_depth = (*max_depth).max(depth);
    match *order {
        [] => return None,
        [single] => return Some(single),
        _ => {}
    }

    let aabb = order[1..]
        .iter()
        .fold(nodes[order[0] as usize].aabb, |acc, &i| {
            acc.merge(&nodes[i as usize].aabb)
        });
    let axis = aabb.longest_axis();
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        nodes[a as usize].center[axis].total_cmp(&nodes[b as usize].center[axis])
    });

    let (lo, hi) = order.split_at_mut(mid);
    let left = partition(nodes, lo, depth + 1, max_depth);
    let right = partition(nodes, hi, depth + 1, max_depth);
    let (Some(left), Some(right)) = (left, right) else {
        return left.or(right);
    };

    let index = to_u32(nodes.len());
    nodes.push(BvhNode::new(aabb, NodeKind::Internal { left, right }));
    Some(index)
}

/// Lattice key and snapped position of a vertex.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Lattice coordinates are intentionally i64; out-of-range values are saturated."
)]
fn weld_key(v: Vec3) -> ([i64; 3], Vec3) {
    let cell = (v * WELD_SCALE + 0.5).floor();
    ([cell.x as i64, cell.y as i64, cell.z as i64], cell / WELD_SCALE)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Face and node counts are bounded by the node index mask at build time."
)]
#[inline]
fn to_u32(i: usize) -> u32 {
    i as u32
}
