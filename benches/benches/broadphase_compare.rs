// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use understory_broadphase::{BasicBroadPhase, BroadPhase2D, Handle, HashGrid, HashGridConfig};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, world: f64, size: f64, seed: u64) -> Vec<Rect> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (world - size);
            let y0 = rng.next_f64() * (world - size);
            Rect::new(x0, y0, x0 + size, y0 + size)
        })
        .collect()
}

fn populate<B: BroadPhase2D<u32, ()>>(bp: &mut B, rects: &[Rect]) -> Vec<Handle> {
    rects
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let h = bp.create(i as u32, 0);
            let _ = bp.move_to(h, *r);
            h
        })
        .collect()
}

fn grid() -> HashGrid<u32> {
    HashGrid::with_config(HashGridConfig::default().with_cell_size(32)).unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_update");
    for &n in &[256usize, 1024, 4096] {
        let rects = gen_random_rects(n, 4000.0, 12.0, 0xCAFE_F00D_DEAD_BEEF);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("hash_grid_n{n}"), |b| {
            b.iter_batched(
                grid,
                |mut bp| {
                    populate(&mut bp, &rects);
                    bp.update();
                    black_box(bp.pair_count());
                },
                BatchSize::SmallInput,
            );
        });
        if n <= 1024 {
            group.bench_function(format!("basic_n{n}"), |b| {
                b.iter_batched(
                    BasicBroadPhase::<u32>::new,
                    |mut bp| {
                        populate(&mut bp, &rects);
                        bp.update();
                        black_box(bp.pair_count());
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_motion(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion");
    let n = 2048;
    let rects = gen_random_rects(n, 4000.0, 12.0, 0xBADC_F00D_1234_5678);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let steps: Vec<Vec2> = (0..n)
        .map(|_| Vec2::new(rng.next_f64() * 20.0 - 10.0, rng.next_f64() * 20.0 - 10.0))
        .collect();
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("hash_grid_step_all", |b| {
        let mut bp = grid();
        let handles = populate(&mut bp, &rects);
        let mut current = rects.clone();
        b.iter(|| {
            for ((h, r), step) in handles.iter().zip(&mut current).zip(&steps) {
                *r = *r + *step;
                if r.x0 < 0.0 || r.y0 < 0.0 || r.x1 > 4000.0 || r.y1 > 4000.0 {
                    *r = *r - *step * 2.0;
                }
                let _ = bp.move_to(*h, *r);
            }
            black_box(bp.pair_count());
        });
    });
    group.finish();
}

fn bench_culls(c: &mut Criterion) {
    let mut group = c.benchmark_group("culls");
    let rects = gen_random_rects(4096, 4000.0, 12.0, 0xFACE_FEED_CAFE_BABE);
    let mut bp = grid();
    populate(&mut bp, &rects);
    let mut basic = BasicBroadPhase::<u32>::new();
    populate(&mut basic, &rects);
    let mut out = Vec::with_capacity(1024);

    let query = Rect::new(1800.0, 1800.0, 2200.0, 2200.0);
    group.bench_function("hash_grid_aabb", |b| {
        b.iter(|| black_box(bp.cull_aabb(black_box(query), &mut out, 1024)));
    });
    group.bench_function("basic_aabb", |b| {
        b.iter(|| black_box(basic.cull_aabb(black_box(query), &mut out, 1024)));
    });

    let (from, to) = (Point::new(10.0, 20.0), Point::new(3900.0, 3700.0));
    group.bench_function("hash_grid_segment", |b| {
        b.iter(|| black_box(bp.cull_segment(from, black_box(to), &mut out, 1024)));
    });
    group.bench_function("basic_segment", |b| {
        b.iter(|| black_box(basic.cull_segment(from, black_box(to), &mut out, 1024)));
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_motion, bench_culls);
criterion_main!(benches);
