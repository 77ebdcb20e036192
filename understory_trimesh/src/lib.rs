// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Trimesh: a static bounding volume hierarchy over triangle meshes.
//!
//! Build a [`TriangleMesh`] once from a triangle soup and ask it:
//!
//! - where a ray or segment first hits it ([`TriangleMesh::intersect_ray`],
//!   [`TriangleMesh::intersect_segment`]),
//! - whether it touches, or lies entirely within, a convex volume given by
//!   its planes ([`TriangleMesh::intersect_convex`],
//!   [`TriangleMesh::inside_convex`]),
//! - what the average surface normal is inside a box
//!   ([`TriangleMesh::area_normal`]).
//!
//! Construction welds vertices that fall on the same `1e-4` lattice point,
//! keeps each triangle's normal in input winding order, and median-splits the
//! triangles along the longest axis of their bounds. The split is
//! deterministic, so the same soup always yields the same hierarchy.
//!
//! Queries share one non-recursive traversal with a small explicit stack;
//! nothing is allocated on the heap unless the hierarchy is unusually deep.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use understory_trimesh::TriangleMesh;
//!
//! let mesh = TriangleMesh::from_faces(&[Vec3::ZERO, Vec3::X, Vec3::Y]).unwrap();
//!
//! let hit = mesh
//!     .intersect_segment(Vec3::new(0.25, 0.25, -1.0), Vec3::new(0.25, 0.25, 1.0))
//!     .unwrap();
//! assert!((hit.point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-6);
//! // The normal faces back toward the segment start.
//! assert_eq!(hit.normal, Vec3::NEG_Z);
//!
//! assert!(mesh.intersect_ray(Vec3::new(2.0, 2.0, 0.0), Vec3::X).is_none());
//! ```
//!
//! The hierarchy is immutable: moving geometry requires a rebuild.
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `glam` and the logging and
//!   error crates.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for
//!   floating-point math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod mesh;
mod query;
mod traverse;
mod types;

pub use error::MeshError;
pub use mesh::{BvhNode, NodeKind, Triangle, TriangleMesh};
pub use query::RayHit;
pub use types::{Aabb3, Face3, Plane};
