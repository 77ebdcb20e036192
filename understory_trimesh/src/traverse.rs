// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-recursive hierarchy traversal shared by every query.
//!
//! Each stack entry packs a node index in its low [`VISITED_BIT_SHIFT`] bits
//! and the visit state of that node in the bits above. A node starts in
//! [`TEST_AABB`]; once its bounds pass it moves to [`VISIT_LEFT`], then
//! [`VISIT_RIGHT`], then [`VISIT_DONE`], pushing one child on each of the two
//! middle transitions. The stack never grows beyond the hierarchy depth.

use core::ops::ControlFlow;

use smallvec::SmallVec;

use crate::mesh::{NodeKind, Triangle, TriangleMesh};
use crate::types::{Aabb3, Face3};

pub(crate) const VISITED_BIT_SHIFT: u32 = 29;
pub(crate) const NODE_INDEX_MASK: u32 = (1 << VISITED_BIT_SHIFT) - 1;

pub(crate) const TEST_AABB: u32 = 0;
pub(crate) const VISIT_LEFT: u32 = 1;
pub(crate) const VISIT_RIGHT: u32 = 2;
pub(crate) const VISIT_DONE: u32 = 3;

/// Outcome of testing a node's bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum AabbTest {
    /// Skip this node and everything below it.
    Miss,
    /// Run the leaf action, or descend into the children.
    Hit,
    /// Stop the whole traversal.
    Abort,
}

/// Query-specific behaviour plugged into [`traverse`].
pub(crate) trait Predicate {
    fn test_aabb(&mut self, aabb: &Aabb3) -> AabbTest;

    /// Called for each leaf whose bounds passed [`test_aabb`](Self::test_aabb).
    fn visit_leaf(&mut self, face: u32, triangle: &Triangle, corners: &Face3) -> ControlFlow<()>;
}

#[inline]
const fn pack(state: u32, node: u32) -> u32 {
    (state << VISITED_BIT_SHIFT) | node
}

/// Walk the hierarchy of `mesh` with `predicate`.
///
/// Returns `Break` when the predicate aborted or a leaf action broke out,
/// `Continue` when every reachable node was visited. An unbuilt mesh is
/// never visited.
pub(crate) fn traverse<P: Predicate>(mesh: &TriangleMesh, predicate: &mut P) -> ControlFlow<()> {
    let Some(root) = mesh.root() else {
        return ControlFlow::Continue(());
    };
    let nodes = mesh.nodes();

    let mut stack: SmallVec<[u32; 32]> = SmallVec::with_capacity(mesh.max_depth() + 1);
    stack.push(pack(TEST_AABB, root));

    while let Some(top) = stack.last_mut() {
        let index = *top & NODE_INDEX_MASK;
        let node = &nodes[index as usize];
        match *top >> VISITED_BIT_SHIFT {
            TEST_AABB => match predicate.test_aabb(&node.aabb) {
                AabbTest::Abort => return ControlFlow::Break(()),
                AabbTest::Miss => *top = pack(VISIT_DONE, index),
                AabbTest::Hit => match node.kind {
                    NodeKind::Leaf { face } => {
                        *top = pack(VISIT_DONE, index);
                        let triangle = &mesh.triangles()[face as usize];
                        predicate.visit_leaf(face, triangle, &mesh.corners(triangle))?;
                    }
                    NodeKind::Internal { .. } => *top = pack(VISIT_LEFT, index),
                },
            },
            VISIT_LEFT => {
                *top = pack(VISIT_RIGHT, index);
                if let NodeKind::Internal { left, .. } = node.kind {
                    stack.push(pack(TEST_AABB, left));
                }
            }
            VISIT_RIGHT => {
                *top = pack(VISIT_DONE, index);
                if let NodeKind::Internal { right, .. } = node.kind {
                    stack.push(pack(TEST_AABB, right));
                }
            }
            _ => {
                stack.pop();
            }
        }
    }
    ControlFlow::Continue(())
}
