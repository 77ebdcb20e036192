// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use understory_trimesh::{Aabb3, Plane, TriangleMesh};

/// A wavy `n × n` height field, two triangles per quad.
fn gen_terrain(n: usize, cell: f32) -> Vec<Vec3> {
    let height = |x: usize, z: usize| ((x as f32) * 0.3).sin() * ((z as f32) * 0.2).cos() * 2.0;
    let point = |x: usize, z: usize| Vec3::new(x as f32 * cell, height(x, z), z as f32 * cell);
    let mut out = Vec::with_capacity(n * n * 6);
    for z in 0..n {
        for x in 0..n {
            let (a, b) = (point(x, z), point(x + 1, z));
            let (c, d) = (point(x, z + 1), point(x + 1, z + 1));
            out.extend([a, c, b, b, c, d]);
        }
    }
    out
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("trimesh_build");
    for &n in &[16usize, 64, 128] {
        let faces = gen_terrain(n, 1.0);
        group.throughput(Throughput::Elements((n * n * 2) as u64));
        group.bench_function(format!("terrain_n{n}"), |b| {
            b.iter(|| black_box(TriangleMesh::from_faces(black_box(&faces)).unwrap()));
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("trimesh_queries");
    let mesh = TriangleMesh::from_faces(&gen_terrain(128, 1.0)).unwrap();

    let rays: Vec<(Vec3, Vec3)> = (0..64)
        .map(|i| {
            let x = 1.5 + i as f32 * 1.9;
            (Vec3::new(x, 10.0, 64.0), Vec3::new(x, -10.0, 64.0 + i as f32))
        })
        .collect();
    group.throughput(Throughput::Elements(rays.len() as u64));
    group.bench_function("segment_down", |b| {
        b.iter(|| {
            for &(from, to) in &rays {
                black_box(mesh.intersect_segment(from, to));
            }
        });
    });
    group.bench_function("ray_down", |b| {
        b.iter(|| {
            for &(from, to) in &rays {
                black_box(mesh.intersect_ray(from, to - from));
            }
        });
    });

    group.throughput(Throughput::Elements(1));
    let region = Aabb3::from_min_max(Vec3::new(40.0, -5.0, 40.0), Vec3::new(60.0, 5.0, 60.0));
    group.bench_function("area_normal", |b| {
        b.iter(|| black_box(mesh.area_normal(black_box(&region))));
    });

    let (min, max) = (Vec3::new(30.0, -1.0, 30.0), Vec3::new(34.0, 1.0, 34.0));
    let planes = [
        Plane::new(Vec3::X, max.x),
        Plane::new(Vec3::NEG_X, -min.x),
        Plane::new(Vec3::Y, max.y),
        Plane::new(Vec3::NEG_Y, -min.y),
        Plane::new(Vec3::Z, max.z),
        Plane::new(Vec3::NEG_Z, -min.z),
    ];
    let points: Vec<Vec3> = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
        .collect();
    group.bench_function("intersect_convex_box", |b| {
        b.iter(|| black_box(mesh.intersect_convex(&planes, &points)));
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
