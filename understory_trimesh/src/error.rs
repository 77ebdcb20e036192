// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors produced while building a [`TriangleMesh`](crate::TriangleMesh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeshError {
    /// The vertex soup was empty or its length was not a multiple of three.
    #[error("triangle soup needs a non-zero multiple of three vertices, got {vertex_count}")]
    InvalidInput {
        /// Number of vertices supplied.
        vertex_count: usize,
    },
    /// The hierarchy would need more nodes than the traversal stack can address.
    #[error("{faces} triangles exceed the addressable node range of the hierarchy")]
    TooManyFaces {
        /// Number of triangles supplied.
        faces: usize,
    },
}
