// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks of hash grid pair bookkeeping against geometry and
//! against the brute-force broad phase.

#![cfg(feature = "hash_grid")]

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Rect};
use proptest::prelude::*;
use understory_broadphase::{
    BasicBroadPhase, BroadPhase2D, CullHit, Handle, HashGrid, HashGridConfig,
};

const LARGE_SURFACE: u32 = 12;

#[derive(Clone, Debug)]
enum Op {
    Create(u32),
    Move(usize, Rect),
    Unplace(usize),
    SetStatic(usize, bool),
    Remove(usize),
}

fn rect() -> impl Strategy<Value = Rect> {
    (-6.0_f64..6.0, -6.0_f64..6.0, 0.05_f64..5.0, 0.05_f64..5.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
}

/// A rectangle near the origin, measured in cells of size `cell`.
fn scaled_rect(cell: f64) -> impl Strategy<Value = Rect> {
    let near = 6.0 * cell;
    (-near..near, -near..near, 0.05 * cell..5.0 * cell, 0.05 * cell..5.0 * cell)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
}

/// A segment passing near the origin with endpoints up to `extent` away.
/// Many are axis-aligned, some within a hair of a row or column boundary.
fn segment(extent: f64, cell: f64) -> impl Strategy<Value = (Point, Point)> {
    let near = 6.0 * cell;
    let far = -extent..extent;
    let nudge = prop::sample::select(vec![-1e-7, 0.0, 1e-7]);
    prop_oneof![
        (far.clone(), far.clone(), -near..near, -near..near)
            .prop_map(|(x, y, jx, jy)| (Point::new(x, y), Point::new(jx - x, jy - y))),
        (far.clone(), far.clone(), -near..near)
            .prop_map(|(x0, x1, y)| (Point::new(x0, y), Point::new(x1, y))),
        (far.clone(), far.clone(), -near..near)
            .prop_map(|(y0, y1, x)| (Point::new(x, y0), Point::new(x, y1))),
        (far.clone(), far.clone(), -6_i32..6, nudge.clone()).prop_map(move |(x0, x1, row, n)| {
            let y = (f64::from(row) + n) * cell;
            (Point::new(x0, y), Point::new(x1, y))
        }),
        (far.clone(), far, -6_i32..6, nudge).prop_map(move |(y0, y1, column, n)| {
            let x = (f64::from(column) + n) * cell;
            (Point::new(x, y0), Point::new(x, y1))
        }),
    ]
}

/// Cell size, entry rectangles, a query rectangle and a segment. Segments
/// may span a few cells or several hundred.
fn cull_scene() -> impl Strategy<Value = (u32, Vec<Rect>, Rect, (Point, Point))> {
    (1_u32..48, 2.0_f64..400.0).prop_flat_map(|(cell, across)| {
        let c = f64::from(cell);
        (
            Just(cell),
            prop::collection::vec(scaled_rect(c), 1..10),
            scaled_rect(c),
            segment(c * across, c),
        )
    })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (0_u32..3).prop_map(Op::Create),
        6 => (any::<prop::sample::Index>(), rect())
            .prop_map(|(i, r)| Op::Move(i.index(usize::MAX), r)),
        1 => any::<prop::sample::Index>().prop_map(|i| Op::Unplace(i.index(usize::MAX))),
        2 => (any::<prop::sample::Index>(), any::<bool>())
            .prop_map(|(i, s)| Op::SetStatic(i.index(usize::MAX), s)),
        1 => any::<prop::sample::Index>().prop_map(|i| Op::Remove(i.index(usize::MAX))),
    ]
}

fn is_large(r: &Rect) -> bool {
    r.width() * r.height() * 1.01239812 > f64::from(LARGE_SURFACE)
}

/// Number of unit cells two rectangles both touch.
fn shared_cells(a: &Rect, b: &Rect) -> u32 {
    let span = |lo_a: f64, hi_a: f64, lo_b: f64, hi_b: f64| {
        let lo = lo_a.floor().max(lo_b.floor());
        let hi = hi_a.floor().min(hi_b.floor());
        if hi >= lo { (hi - lo) as u32 + 1 } else { 0 }
    };
    span(a.x0, a.x1, b.x0, b.x1) * span(a.y0, a.y1, b.y0, b.y1)
}

fn strictly_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

type Counters = (Rc<Cell<i64>>, Rc<Cell<i64>>);

fn count_callbacks<B: BroadPhase2D<u32, ()>>(bp: &mut B) -> Counters {
    let (pairs, unpairs) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let p = Rc::clone(&pairs);
    bp.set_pair_callback(Box::new(move |_, _, _, _| {
        p.set(p.get() + 1);
        None
    }));
    let u = Rc::clone(&unpairs);
    bp.set_unpair_callback(Box::new(move |_, _, _, _, _| u.set(u.get() + 1)));
    (pairs, unpairs)
}

fn apply<B: BroadPhase2D<u32, ()>>(bp: &mut B, live: &mut Vec<Handle>, op: &Op) {
    let pick = |i: usize| live.get(i % live.len().max(1)).copied();
    match *op {
        Op::Create(owner) => {
            let subindex = live.len() as u32;
            live.push(bp.create(owner, subindex));
        }
        Op::Move(i, r) => {
            if let Some(h) = pick(i) {
                bp.move_to(h, r).unwrap();
            }
        }
        Op::Unplace(i) => {
            if let Some(h) = pick(i) {
                bp.move_to(h, Rect::ZERO).unwrap();
            }
        }
        Op::SetStatic(i, s) => {
            if let Some(h) = pick(i) {
                bp.set_static(h, s).unwrap();
            }
        }
        Op::Remove(i) => {
            if let Some(h) = pick(i) {
                bp.remove(h).unwrap();
                live.retain(|&x| x != h);
            }
        }
    }
}

fn sorted(hits: &[CullHit<u32>]) -> Vec<Handle> {
    let mut handles: Vec<_> = hits.iter().map(|hit| hit.handle).collect();
    handles.sort();
    handles
}

proptest! {
    #[test]
    fn pair_records_track_geometry(
        owners in prop::collection::vec(0_u32..3, 2..8),
        ops in prop::collection::vec(op(), 0..60),
    ) {
        let config = HashGridConfig::default()
            .with_cell_size(1)
            .with_hash_table_size(16)
            .with_large_object_min_surface(LARGE_SURFACE);
        let mut grid: HashGrid<u32> = HashGrid::with_config(config).unwrap();
        let mut basic: BasicBroadPhase<u32> = BasicBroadPhase::new();
        let (grid_pairs, grid_unpairs) = count_callbacks(&mut grid);
        let (basic_pairs, basic_unpairs) = count_callbacks(&mut basic);

        let mut live = Vec::new();
        let mut basic_live = Vec::new();
        for owner in &owners {
            apply(&mut grid, &mut live, &Op::Create(*owner));
            apply(&mut basic, &mut basic_live, &Op::Create(*owner));
        }
        for op in &ops {
            apply(&mut grid, &mut live, op);
            apply(&mut basic, &mut basic_live, op);
        }
        basic.update();
        prop_assert_eq!(&live, &basic_live);

        let mut colliding = 0_i64;
        for (i, &a) in live.iter().enumerate() {
            for &b in &live[i + 1..] {
                let (ra, rb) = (grid.aabb(a).unwrap(), grid.aabb(b).unwrap());
                let placed = ra != Rect::ZERO && rb != Rect::ZERO;
                let compatible = placed
                    && grid.object(a) != grid.object(b)
                    && !(grid.is_static(a).unwrap() && grid.is_static(b).unwrap());
                let expected = if !compatible {
                    0
                } else if is_large(&ra) || is_large(&rb) {
                    1
                } else {
                    shared_cells(&ra, &rb)
                };
                prop_assert_eq!(grid.pair_refcount(a, b), expected, "refcount of {} {}", a, b);

                let overlap = compatible && strictly_overlap(&ra, &rb);
                prop_assert_eq!(grid.is_colliding(a, b), overlap);
                prop_assert_eq!(basic.is_colliding(a, b), overlap);
                colliding += i64::from(overlap);
            }
        }
        prop_assert_eq!(grid_pairs.get() - grid_unpairs.get(), colliding);
        prop_assert_eq!(basic_pairs.get() - basic_unpairs.get(), colliding);

        let large = live
            .iter()
            .filter(|&&h| grid.aabb(h).is_some_and(|r| r != Rect::ZERO && is_large(&r)))
            .count();
        prop_assert_eq!(grid.large_element_count(), large);
    }

    #[test]
    fn culls_match_brute_force(
        owners in prop::collection::vec(0_u32..3, 1..10),
        scene in cull_scene(),
    ) {
        let (cell, rects, query, (from, to)) = scene;
        let config = HashGridConfig::default()
            .with_cell_size(cell)
            .with_large_object_min_surface(LARGE_SURFACE);
        let mut grid: HashGrid<u32> = HashGrid::with_config(config).unwrap();
        let mut basic: BasicBroadPhase<u32> = BasicBroadPhase::new();
        for (i, (owner, r)) in owners.iter().zip(&rects).enumerate() {
            let g = grid.create(*owner, i as u32);
            let b = basic.create(*owner, i as u32);
            grid.move_to(g, *r).unwrap();
            basic.move_to(b, *r).unwrap();
        }

        let (mut grid_out, mut basic_out) = (Vec::new(), Vec::new());
        grid.cull_aabb(query, &mut grid_out, usize::MAX);
        basic.cull_aabb(query, &mut basic_out, usize::MAX);
        prop_assert_eq!(sorted(&grid_out), sorted(&basic_out));

        grid.cull_segment(from, to, &mut grid_out, usize::MAX);
        basic.cull_segment(from, to, &mut basic_out, usize::MAX);
        prop_assert_eq!(sorted(&grid_out), sorted(&basic_out), "segment {:?} -> {:?}", from, to);
    }
}
