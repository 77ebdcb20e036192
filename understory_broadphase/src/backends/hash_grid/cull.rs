// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle and segment culls over the grid.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Point, Rect, Vec2};

use super::HashGrid;
use super::cells::{CellKey, cell_coord, cell_span};
use crate::types::{CullHit, Handle, is_placed, rects_overlap, segment_intersects_rect};

impl<O: Copy + PartialEq + Debug, U> HashGrid<O, U> {
    pub(super) fn cull_rect(
        &self,
        rect: Rect,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> usize {
        out.clear();
        if max_results == 0 {
            return 0;
        }
        let pass = self.next_pass();
        let rect = rect.abs();
        let test = |aabb: &Rect| rects_overlap(&rect, aabb);

        let (x0, y0, x1, y1) = cell_span(&rect, self.cell_size);
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if !usize::try_from(span).is_ok_and(|span| span <= self.entries.len()) {
            // More cells than entries: walking the entries is cheaper.
            let handles = self.entries.keys().copied();
            self.cull_handles(handles, pass, &test, out, max_results);
            return out.len();
        }

        'cells: for i in x0..=x1 {
            for j in y0..=y1 {
                if self.cull_cell(CellKey::new(i, j), pass, &test, out, max_results) {
                    break 'cells;
                }
            }
        }
        self.cull_large(pass, &test, out, max_results);
        out.len()
    }

    pub(super) fn cull_line(
        &self,
        from: Point,
        to: Point,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> usize {
        out.clear();
        let delta = to - from;
        if max_results == 0 || delta == Vec2::ZERO || !from.is_finite() || !to.is_finite() {
            return 0;
        }
        let pass = self.next_pass();
        let test = |aabb: &Rect| segment_intersects_rect(aabb, from, to);
        let cell = self.cell_size;

        let dir = delta.normalize();
        let step_x = if delta.x < 0.0 { -1 } else { 1 };
        let step_y = if delta.y < 0.0 { -1 } else { 1 };

        let (mut x, mut y) = (cell_coord(from.x, cell), cell_coord(from.y, cell));
        let (end_x, end_y) = (cell_coord(to.x, cell), cell_coord(to.y, cell));

        // Distance along the segment to the next vertical and horizontal
        // cell boundary. An axis the segment does not move along never has
        // a next boundary.
        let first = |c: i32, origin: f64, d: f64| {
            if d == 0.0 {
                return f64::INFINITY;
            }
            let edge = f64::from(c) + if d > 0.0 { 1.0 } else { 0.0 };
            (edge * cell - origin) / d
        };
        let mut next_x = first(x, from.x, dir.x);
        let mut next_y = first(y, from.y, dir.y);
        let step_len = Vec2::new(cell / dir.x.abs(), cell / dir.y.abs());

        // Every step moves one axis one cell toward the end cell. An axis
        // already at its end column or row is never stepped again.
        let mut full = self.cull_cell(CellKey::new(x, y), pass, &test, out, max_results);
        while !full && (x != end_x || y != end_y) {
            if y == end_y || (x != end_x && next_x < next_y) {
                next_x += step_len.x;
                x += step_x;
            } else {
                next_y += step_len.y;
                y += step_y;
            }
            full = self.cull_cell(CellKey::new(x, y), pass, &test, out, max_results);
        }

        self.cull_large(pass, &test, out, max_results);
        out.len()
    }

    /// Test the members of one cell, dynamic first. Returns `true` once `out`
    /// is full.
    fn cull_cell(
        &self,
        key: CellKey,
        pass: u64,
        test: &impl Fn(&Rect) -> bool,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> bool {
        let Some(bin) = self.cells.get(key) else {
            return out.len() >= max_results;
        };
        let members = bin.dynamic_set.keys().chain(bin.static_set.keys()).copied();
        self.cull_handles(members, pass, test, out, max_results)
    }

    fn cull_large(
        &self,
        pass: u64,
        test: &impl Fn(&Rect) -> bool,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> bool {
        self.cull_handles(self.large.keys().copied(), pass, test, out, max_results)
    }

    fn cull_handles(
        &self,
        handles: impl Iterator<Item = Handle>,
        pass: u64,
        test: &impl Fn(&Rect) -> bool,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> bool {
        for handle in handles {
            if out.len() >= max_results {
                return true;
            }
            let Some(entry) = self.entries.get(&handle) else {
                continue;
            };
            if entry.pass.get() == pass {
                continue;
            }
            entry.pass.set(pass);
            if is_placed(&entry.aabb) && test(&entry.aabb) {
                out.push(CullHit {
                    handle,
                    owner: entry.owner,
                    subindex: entry.subindex,
                });
            }
        }
        out.len() >= max_results
    }
}
