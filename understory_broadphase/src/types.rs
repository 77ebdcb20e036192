// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles, query results, callback types, and rectangle predicates.

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Point, Rect};

/// Identifier of an entry in a broad phase.
///
/// Handles are never reused: each broad phase hands them out in increasing
/// order starting at `1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    #[inline]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One result of a cull query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CullHit<O> {
    /// Entry that matched.
    pub handle: Handle,
    /// Owner the entry was created with.
    pub owner: O,
    /// Sub-index the entry was created with.
    pub subindex: u32,
}

/// Snapshot of one pair record, for inspection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PairInfo {
    /// Lower handle of the pair.
    pub a: Handle,
    /// Higher handle of the pair.
    pub b: Handle,
    /// Number of grid cells (or large-element links) the two entries share.
    pub refcount: u32,
    /// Whether the pair callback has fired without a matching unpair.
    pub colliding: bool,
}

/// Called when two entries start overlapping.
///
/// Receives `(owner_a, subindex_a, owner_b, subindex_b)`; the returned value
/// is stored with the pair and handed back to the [`UnpairCallback`].
pub type PairCallback<O, U> = Box<dyn FnMut(O, u32, O, u32) -> Option<U>>;

/// Called when two overlapping entries separate, or when a colliding pair is
/// dropped.
pub type UnpairCallback<O, U> = Box<dyn FnMut(O, u32, O, u32, Option<U>)>;

/// Whether an entry's rectangle places it in the world.
///
/// `Rect::ZERO` marks an entry that has been created but not moved yet.
#[inline]
pub(crate) fn is_placed(rect: &Rect) -> bool {
    *rect != Rect::ZERO
}

/// Open-interval overlap: rectangles sharing only an edge do not overlap.
#[inline]
pub(crate) fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Whether the segment `from → to` touches `rect` (boundary inclusive).
///
/// Clips the parametric interval `[0, 1]` against both slabs.
pub(crate) fn segment_intersects_rect(rect: &Rect, from: Point, to: Point) -> bool {
    let mut min = 0.0_f64;
    let mut max = 1.0_f64;
    for (seg_from, seg_to, box_begin, box_end) in [
        (from.x, to.x, rect.x0, rect.x1),
        (from.y, to.y, rect.y0, rect.y1),
    ] {
        let length = seg_to - seg_from;
        let (cmin, cmax) = if seg_from < seg_to {
            if seg_from > box_end || seg_to < box_begin {
                return false;
            }
            (
                if seg_from < box_begin {
                    (box_begin - seg_from) / length
                } else {
                    0.0
                },
                if seg_to > box_end {
                    (box_end - seg_from) / length
                } else {
                    1.0
                },
            )
        } else {
            if seg_to > box_end || seg_from < box_begin {
                return false;
            }
            (
                if seg_from > box_end {
                    (box_end - seg_from) / length
                } else {
                    0.0
                },
                if seg_to < box_begin {
                    (box_begin - seg_from) / length
                } else {
                    1.0
                },
            )
        };
        min = min.max(cmin);
        max = max.min(cmax);
        if max < min {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(&a, &Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!rects_overlap(&a, &Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!rects_overlap(&a, &Rect::new(11.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn segment_slab_clip() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(segment_intersects_rect(&r, Point::new(-1.0, 0.5), Point::new(2.0, 0.5)));
        assert!(segment_intersects_rect(&r, Point::new(2.0, 0.5), Point::new(-1.0, 0.5)));
        // Diagonal passing beside the corner.
        assert!(!segment_intersects_rect(&r, Point::new(1.5, 0.0), Point::new(3.0, 1.5)));
        // Stops before reaching the rectangle.
        assert!(!segment_intersects_rect(&r, Point::new(-2.0, 0.5), Point::new(-1.0, 0.5)));
        // Starts inside.
        assert!(segment_intersects_rect(&r, Point::new(0.5, 0.5), Point::new(9.0, 9.0)));
    }

    #[test]
    fn zero_rect_is_unplaced() {
        assert!(!is_placed(&Rect::ZERO));
        assert!(is_placed(&Rect::new(0.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn handles_order_by_value() {
        assert!(Handle::new(1) < Handle::new(2));
        assert_eq!(Handle::new(7).get(), 7);
        assert_eq!(Handle::new(3).to_string(), "#3");
    }
}
