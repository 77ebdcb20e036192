// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell coordinates, cell keys, and the chained cell hash table.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::types::Handle;

/// Map a world coordinate to a cell coordinate along one axis.
///
/// Rounds towards -∞; values outside the `i32` range saturate.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Grid cell indices are intentionally i32; out-of-range values are saturated."
)]
#[inline]
pub(crate) fn cell_coord(value: f64, cell_size: f64) -> i32 {
    debug_assert!(cell_size > 0.0, "grid cell_size must be strictly positive");
    let t = value / cell_size;
    let coord = t as i32;

    // Round towards -∞ (the cast above has already truncated).
    if t < 0.0 && f64::from(coord) > t {
        coord.saturating_sub(1)
    } else {
        coord
    }
}

/// Inclusive cell range `(x0, y0, x1, y1)` covered by `rect`.
#[inline]
pub(crate) fn cell_span(rect: &Rect, cell_size: f64) -> (i32, i32, i32, i32) {
    (
        cell_coord(rect.min_x(), cell_size),
        cell_coord(rect.min_y(), cell_size),
        cell_coord(rect.max_x(), cell_size),
        cell_coord(rect.max_y(), cell_size),
    )
}

/// A cell position packed into 64 bits: `x` low, `y` high.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct CellKey(u64);

impl CellKey {
    #[inline]
    pub(crate) fn new(x: i32, y: i32) -> Self {
        Self(u64::from(x.cast_unsigned()) | (u64::from(y.cast_unsigned()) << 32))
    }

    /// 64-to-32 bit integer mix of the packed key.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "The mix is folded to 32 bits on purpose."
    )]
    pub(crate) fn hash(self) -> u32 {
        let mut k = self.0;
        k = (!k).wrapping_add(k << 18);
        k ^= k >> 31;
        k = k.wrapping_mul(21);
        k ^= k >> 11;
        k = k.wrapping_add(k << 6);
        k ^= k >> 22;
        k as u32
    }
}

/// One occupied cell: refcounted dynamic and static members.
#[derive(Debug)]
pub(crate) struct PosBin {
    key: CellKey,
    next: Option<u32>,
    pub(crate) dynamic_set: BTreeMap<Handle, u32>,
    pub(crate) static_set: BTreeMap<Handle, u32>,
}

impl PosBin {
    fn new(key: CellKey, next: Option<u32>) -> Self {
        Self {
            key,
            next,
            dynamic_set: BTreeMap::new(),
            static_set: BTreeMap::new(),
        }
    }

    /// Members of one kind.
    #[inline]
    pub(crate) fn set_mut(&mut self, is_static: bool) -> &mut BTreeMap<Handle, u32> {
        if is_static {
            &mut self.static_set
        } else {
            &mut self.dynamic_set
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.dynamic_set.is_empty() && self.static_set.is_empty()
    }
}

/// Fixed bucket array of singly linked cell chains.
///
/// Cells live in a slab; freed slots are recycled through a free list.
#[derive(Debug)]
pub(crate) struct CellTable {
    buckets: Vec<Option<u32>>,
    bins: Vec<Option<PosBin>>,
    free: Vec<u32>,
    live: usize,
}

impl CellTable {
    pub(crate) fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![None; bucket_count.max(1)],
            bins: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of occupied cells.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    #[inline]
    fn bucket_of(&self, key: CellKey) -> usize {
        key.hash() as usize % self.buckets.len()
    }

    fn find(&self, key: CellKey) -> Option<u32> {
        let mut cursor = self.buckets[self.bucket_of(key)];
        while let Some(id) = cursor {
            let bin = self.bins.get(id as usize)?.as_ref()?;
            if bin.key == key {
                return Some(id);
            }
            cursor = bin.next;
        }
        None
    }

    pub(crate) fn get(&self, key: CellKey) -> Option<&PosBin> {
        let id = self.find(key)?;
        self.bins[id as usize].as_ref()
    }

    pub(crate) fn get_mut(&mut self, key: CellKey) -> Option<&mut PosBin> {
        let id = self.find(key)?;
        self.bins[id as usize].as_mut()
    }

    /// The cell at `key`, linked in at the head of its chain if missing.
    pub(crate) fn get_or_create(&mut self, key: CellKey) -> &mut PosBin {
        let id = match self.find(key) {
            Some(id) => id,
            None => self.link(key),
        };
        self.bins[id as usize].get_or_insert_with(|| PosBin::new(key, None))
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Cell slots are bounded by the number of distinct cells in use."
    )]
    fn link(&mut self, key: CellKey) -> u32 {
        let bucket = self.bucket_of(key);
        let bin = PosBin::new(key, self.buckets[bucket]);
        let id = match self.free.pop() {
            Some(id) => {
                self.bins[id as usize] = Some(bin);
                id
            }
            None => {
                self.bins.push(Some(bin));
                (self.bins.len() - 1) as u32
            }
        };
        self.buckets[bucket] = Some(id);
        self.live += 1;
        id
    }

    /// Unlink and free the cell at `key`. Returns `false` if it was absent.
    pub(crate) fn remove(&mut self, key: CellKey) -> bool {
        let bucket = self.bucket_of(key);
        let mut prev: Option<u32> = None;
        let mut cursor = self.buckets[bucket];
        while let Some(id) = cursor {
            let Some(bin) = self.bins[id as usize].as_ref() else {
                return false;
            };
            let (bin_key, next) = (bin.key, bin.next);
            if bin_key == key {
                match prev {
                    None => self.buckets[bucket] = next,
                    Some(p) => {
                        if let Some(prev_bin) = self.bins[p as usize].as_mut() {
                            prev_bin.next = next;
                        }
                    }
                }
                self.bins[id as usize] = None;
                self.free.push(id);
                self.live -= 1;
                return true;
            }
            prev = cursor;
            cursor = next;
        }
        false
    }
}
