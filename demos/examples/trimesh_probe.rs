// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangle mesh BVH: build a small ramp and probe it.
//!
//! Run:
//! - `cargo run -p understory_demos --example trimesh_probe`

use glam::Vec3;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use understory_trimesh::{Aabb3, Plane, TriangleMesh};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_target(false)
        .without_time()
        .init();

    // A floor quad and a ramp rising along +X. Shared corners are welded.
    let faces = [
        // Floor.
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 4.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 4.0),
        Vec3::new(4.0, 0.0, 4.0),
        // Ramp.
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(4.0, 0.0, 4.0),
        Vec3::new(8.0, 2.0, 0.0),
        Vec3::new(8.0, 2.0, 0.0),
        Vec3::new(4.0, 0.0, 4.0),
        Vec3::new(8.0, 2.0, 4.0),
    ];
    let mesh = match TriangleMesh::from_faces(&faces) {
        Ok(mesh) => mesh,
        Err(err) => {
            warn!(%err, "could not build mesh");
            return;
        }
    };
    info!(
        faces = mesh.face_count(),
        vertices = mesh.vertices().len(),
        depth = mesh.max_depth(),
        "built"
    );

    for x in [1.0, 5.0, 7.5, 9.0] {
        let from = Vec3::new(x, 5.0, 2.0);
        match mesh.intersect_ray(from, Vec3::NEG_Y) {
            Some(hit) => info!(x, point = ?hit.point, normal = ?hit.normal, face = hit.face, "ground"),
            None => info!(x, "no ground"),
        }
    }

    let ramp = Aabb3::from_min_max(Vec3::new(4.5, -1.0, -1.0), Vec3::new(9.0, 3.0, 5.0));
    info!(normal = ?mesh.area_normal(&ramp), "average ramp normal");

    // A unit box sitting on the floor.
    let (min, max) = (Vec3::new(1.0, -0.5, 1.0), Vec3::new(2.0, 0.5, 2.0));
    let planes = [
        Plane::new(Vec3::X, max.x),
        Plane::new(Vec3::NEG_X, -min.x),
        Plane::new(Vec3::Y, max.y),
        Plane::new(Vec3::NEG_Y, -min.y),
        Plane::new(Vec3::Z, max.z),
        Plane::new(Vec3::NEG_Z, -min.z),
    ];
    let corners: Vec<Vec3> = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
        .collect();
    info!(
        touches = mesh.intersect_convex(&planes, &corners),
        "box against floor"
    );
    info!(
        inside = mesh.inside_convex(&planes, &corners, Vec3::ONE),
        "mesh inside box"
    );
}
