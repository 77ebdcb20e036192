// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental spatial hash grid broad phase.
//!
//! Entries are bucketed into square cells. Whenever an entry starts or stops
//! occupying a cell, pair records with the other occupants of that cell are
//! created or released, so the pair set is always current without a global
//! sweep. Each pair record counts the cells its two entries share and whether
//! their rectangles actually overlap; the pair and unpair callbacks fire on
//! changes of the latter.
//!
//! Entries covering too many cells bypass the grid and are linked to every
//! other placed entry directly.

mod cells;
mod cull;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt::{self, Debug};

use hashbrown::HashMap;
use hashbrown::hash_map::Entry as MapEntry;
use kurbo::{Point, Rect};
use smallvec::SmallVec;
use tracing::{debug, error, warn};

use self::cells::{CellKey, CellTable, cell_span};
use crate::broad_phase::BroadPhase2D;
use crate::config::HashGridConfig;
use crate::error::BroadPhaseError;
use crate::pairs::{Callbacks, PairKey, Side};
use crate::types::{
    CullHit, Handle, PairCallback, PairInfo, UnpairCallback, is_placed, rects_overlap,
};

/// Hysteresis bias applied to an entry's cell surface before comparing it
/// with the large-object threshold.
const LARGE_ELEMENT_FI: f64 = 1.01239812;

#[derive(Debug)]
struct Entry<O> {
    owner: O,
    subindex: u32,
    aabb: Rect,
    is_static: bool,
    // Tag of the last cull that looked at this entry.
    pass: Cell<u64>,
    paired: BTreeSet<Handle>,
}

#[derive(Debug)]
struct PairState<U> {
    refcount: u32,
    colliding: bool,
    user_data: Option<U>,
}

/// Spatial hash grid broad phase.
///
/// `O` identifies the owner of each entry (entries with the same owner never
/// pair); `U` is the user data attached to a pair by the pair callback.
///
/// Iteration over entries and cell members is ordered by handle, so callback
/// order is reproducible for a given sequence of operations.
pub struct HashGrid<O, U = ()> {
    config: HashGridConfig,
    cell_size: f64,
    entries: BTreeMap<Handle, Entry<O>>,
    cells: CellTable,
    pairs: HashMap<PairKey, PairState<U>>,
    large: BTreeMap<Handle, u32>,
    callbacks: Callbacks<O, U>,
    last_handle: u64,
    pass: Cell<u64>,
}

impl<O, U> Debug for HashGrid<O, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashGrid")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("cells", &self.cells.len())
            .field("pairs", &self.pairs.len())
            .field("large", &self.large.len())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

impl<O: Copy + PartialEq + Debug, U> Default for HashGrid<O, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Copy + PartialEq + Debug, U> HashGrid<O, U> {
    /// Create a grid with the default configuration.
    pub fn new() -> Self {
        Self::build(HashGridConfig::default())
    }

    /// Create a grid with an explicit configuration.
    pub fn with_config(config: HashGridConfig) -> Result<Self, BroadPhaseError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HashGridConfig) -> Self {
        let buckets = config.bucket_count();
        debug!(
            cell_size = config.cell_size,
            buckets,
            large_object_min_surface = config.large_object_min_surface,
            "created hash grid broad phase"
        );
        Self {
            cell_size: f64::from(config.cell_size),
            config,
            entries: BTreeMap::new(),
            cells: CellTable::new(buckets),
            pairs: HashMap::new(),
            large: BTreeMap::new(),
            callbacks: Callbacks::default(),
            last_handle: 0,
            pass: Cell::new(0),
        }
    }

    /// The configuration this grid was built with.
    pub fn config(&self) -> &HashGridConfig {
        &self.config
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of occupied grid cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of pair records.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of entries handled outside the grid.
    pub fn large_element_count(&self) -> usize {
        self.large.len()
    }

    /// Shared-cell count of the pair `{a, b}`; zero when no record exists.
    pub fn pair_refcount(&self, a: Handle, b: Handle) -> u32 {
        self.pairs
            .get(&PairKey::new(a, b))
            .map_or(0, |state| state.refcount)
    }

    /// Whether the pair `{a, b}` is currently reported as colliding.
    pub fn is_colliding(&self, a: Handle, b: Handle) -> bool {
        self.pairs
            .get(&PairKey::new(a, b))
            .is_some_and(|state| state.colliding)
    }

    /// Current rectangle of an entry.
    pub fn aabb(&self, handle: Handle) -> Option<Rect> {
        self.entries.get(&handle).map(|e| e.aabb)
    }

    /// Snapshot of every pair record, in no particular order.
    pub fn pairs(&self) -> impl Iterator<Item = PairInfo> + '_ {
        self.pairs.iter().map(|(key, state)| {
            let (a, b) = key.handles();
            PairInfo {
                a,
                b,
                refcount: state.refcount,
                colliding: state.colliding,
            }
        })
    }

    fn unknown(&self, handle: Handle, op: &'static str) -> BroadPhaseError {
        warn!(%handle, op, "unknown broad phase handle");
        BroadPhaseError::UnknownHandle(handle)
    }

    fn side(&self, handle: Handle) -> Option<Side<O>> {
        self.entries.get(&handle).map(|e| (e.owner, e.subindex))
    }

    fn is_large(&self, rect: &Rect) -> bool {
        let cells = (rect.width().abs() / self.cell_size) * (rect.height().abs() / self.cell_size);
        cells * LARGE_ELEMENT_FI > f64::from(self.config.large_object_min_surface)
    }

    /// Whether `other` may pair with an entry of `owner` and `is_static`.
    fn compatible(other: &Entry<O>, owner: O, is_static: bool) -> bool {
        other.owner != owner && !(other.is_static && is_static)
    }

    /// Placed entries a large entry links to.
    fn large_mates(&self, handle: Handle, owner: O, is_static: bool) -> Vec<Handle> {
        self.entries
            .iter()
            .filter(|&(&h, e)| h != handle && is_placed(&e.aabb) && Self::compatible(e, owner, is_static))
            .map(|(&h, _)| h)
            .collect()
    }

    /// Large entries a grid entry links to.
    fn large_links(&self, handle: Handle, owner: O, is_static: bool) -> SmallVec<[Handle; 4]> {
        self.large
            .keys()
            .copied()
            .filter(|&h| {
                h != handle
                    && self
                        .entries
                        .get(&h)
                        .is_some_and(|e| Self::compatible(e, owner, is_static))
            })
            .collect()
    }

    fn enter_grid(&mut self, handle: Handle, rect: Rect, is_static: bool) {
        let Some(owner) = self.entries.get(&handle).map(|e| e.owner) else {
            return;
        };

        if self.is_large(&rect) {
            for mate in self.large_mates(handle, owner, is_static) {
                self.pair_attempt(handle, mate);
            }
            *self.large.entry(handle).or_insert(0) += 1;
            return;
        }

        let (x0, y0, x1, y1) = cell_span(&rect, self.cell_size);
        for i in x0..=x1 {
            for j in y0..=y1 {
                let bin = self.cells.get_or_create(CellKey::new(i, j));
                let count = bin.set_mut(is_static).entry(handle).or_insert(0);
                *count += 1;
                if *count != 1 {
                    continue;
                }
                let mut mates: SmallVec<[Handle; 8]> = bin.dynamic_set.keys().copied().collect();
                if !is_static {
                    mates.extend(bin.static_set.keys().copied());
                }
                for mate in mates {
                    if self.entries.get(&mate).is_some_and(|e| e.owner != owner) {
                        self.pair_attempt(handle, mate);
                    }
                }
            }
        }

        for large in self.large_links(handle, owner, is_static) {
            self.pair_attempt(large, handle);
        }
    }

    fn exit_grid(&mut self, handle: Handle, rect: Rect, is_static: bool) {
        let Some(owner) = self.entries.get(&handle).map(|e| e.owner) else {
            return;
        };

        if self.is_large(&rect) {
            for mate in self.large_mates(handle, owner, is_static) {
                self.unpair_attempt(handle, mate);
            }
            match self.large.get_mut(&handle) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    self.large.remove(&handle);
                }
                None => error!(%handle, "large entry missing from the large set"),
            }
            return;
        }

        let (x0, y0, x1, y1) = cell_span(&rect, self.cell_size);
        for i in x0..=x1 {
            for j in y0..=y1 {
                let key = CellKey::new(i, j);
                let Some(bin) = self.cells.get_mut(key) else {
                    error!(%handle, x = i, y = j, "exiting a cell that does not exist");
                    continue;
                };
                let set = bin.set_mut(is_static);
                let exited = match set.get_mut(&handle) {
                    Some(count) if *count > 1 => {
                        *count -= 1;
                        false
                    }
                    Some(_) => {
                        set.remove(&handle);
                        true
                    }
                    None => {
                        error!(%handle, x = i, y = j, "entry missing from its cell");
                        false
                    }
                };
                let mut mates: SmallVec<[Handle; 8]> = SmallVec::new();
                if exited {
                    mates.extend(bin.dynamic_set.keys().copied());
                    if !is_static {
                        mates.extend(bin.static_set.keys().copied());
                    }
                }
                if bin.is_empty() {
                    self.cells.remove(key);
                }
                for mate in mates {
                    if self.entries.get(&mate).is_some_and(|e| e.owner != owner) {
                        self.unpair_attempt(handle, mate);
                    }
                }
            }
        }

        for large in self.large_links(handle, owner, is_static) {
            self.unpair_attempt(handle, large);
        }
    }

    fn pair_attempt(&mut self, a: Handle, b: Handle) {
        match self.pairs.entry(PairKey::new(a, b)) {
            MapEntry::Occupied(mut occupied) => occupied.get_mut().refcount += 1,
            MapEntry::Vacant(vacant) => {
                vacant.insert(PairState {
                    refcount: 1,
                    colliding: false,
                    user_data: None,
                });
                for (this, other) in [(a, b), (b, a)] {
                    if let Some(entry) = self.entries.get_mut(&this) {
                        entry.paired.insert(other);
                    }
                }
            }
        }
    }

    fn unpair_attempt(&mut self, a: Handle, b: Handle) {
        let key = PairKey::new(a, b);
        let Some(state) = self.pairs.get_mut(&key) else {
            error!(%a, %b, "releasing a pair that has no record");
            return;
        };
        state.refcount = state.refcount.saturating_sub(1);
        if state.refcount > 0 {
            return;
        }
        let Some(state) = self.pairs.remove(&key) else {
            return;
        };
        for (this, other) in [(a, b), (b, a)] {
            if let Some(entry) = self.entries.get_mut(&this) {
                entry.paired.remove(&other);
            }
        }
        if state.colliding
            && let (Some(side_a), Some(side_b)) = (self.side(a), self.side(b))
        {
            self.callbacks.unpair(side_a, side_b, state.user_data);
        }
    }

    /// Bring the `colliding` flag of every pair of `handle` in line with the
    /// actual rectangle overlap, firing callbacks on changes.
    fn check_motion(&mut self, handle: Handle) {
        let Some(entry) = self.entries.get(&handle) else {
            return;
        };
        let aabb = entry.aabb;
        let this = (entry.owner, entry.subindex);
        let partners: SmallVec<[Handle; 16]> = entry.paired.iter().copied().collect();

        for other in partners {
            let Some(mate) = self.entries.get(&other) else {
                continue;
            };
            let overlap = rects_overlap(&aabb, &mate.aabb);
            let that = (mate.owner, mate.subindex);
            let Some(state) = self.pairs.get_mut(&PairKey::new(handle, other)) else {
                error!(%handle, %other, "paired entry without a pair record");
                continue;
            };
            match (overlap, state.colliding) {
                (true, false) => {
                    state.user_data = self.callbacks.pair(this, that);
                    state.colliding = true;
                }
                (false, true) => {
                    state.colliding = false;
                    let user_data = state.user_data.take();
                    self.callbacks.unpair(this, that, user_data);
                }
                _ => {}
            }
        }
    }

    fn next_pass(&self) -> u64 {
        let pass = self.pass.get().wrapping_add(1);
        self.pass.set(pass);
        pass
    }
}

impl<O: Copy + PartialEq + Debug, U> BroadPhase2D<O, U> for HashGrid<O, U> {
    fn create(&mut self, owner: O, subindex: u32) -> Handle {
        self.last_handle += 1;
        let handle = Handle::new(self.last_handle);
        self.entries.insert(
            handle,
            Entry {
                owner,
                subindex,
                aabb: Rect::ZERO,
                is_static: false,
                pass: Cell::new(0),
                paired: BTreeSet::new(),
            },
        );
        handle
    }

    fn move_to(&mut self, handle: Handle, aabb: Rect) -> Result<(), BroadPhaseError> {
        let Some(entry) = self.entries.get(&handle) else {
            return Err(self.unknown(handle, "move_to"));
        };
        let (old, is_static) = (entry.aabb, entry.is_static);
        let aabb = aabb.abs();

        if aabb != old {
            // Enter first so pairs that survive the move never drop to zero.
            if is_placed(&aabb) {
                self.enter_grid(handle, aabb, is_static);
            }
            if is_placed(&old) {
                self.exit_grid(handle, old, is_static);
            }
            if let Some(entry) = self.entries.get_mut(&handle) {
                entry.aabb = aabb;
            }
        }

        self.check_motion(handle);
        Ok(())
    }

    fn set_static(&mut self, handle: Handle, is_static: bool) -> Result<(), BroadPhaseError> {
        let Some(entry) = self.entries.get(&handle) else {
            return Err(self.unknown(handle, "set_static"));
        };
        if entry.is_static == is_static {
            return Ok(());
        }
        let (aabb, was_static) = (entry.aabb, entry.is_static);

        if is_placed(&aabb) {
            self.exit_grid(handle, aabb, was_static);
        }
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.is_static = is_static;
        }
        if is_placed(&aabb) {
            self.enter_grid(handle, aabb, is_static);
            self.check_motion(handle);
        }
        Ok(())
    }

    fn remove(&mut self, handle: Handle) -> Result<(), BroadPhaseError> {
        let Some(entry) = self.entries.get(&handle) else {
            return Err(self.unknown(handle, "remove"));
        };
        let (aabb, is_static) = (entry.aabb, entry.is_static);
        if is_placed(&aabb) {
            self.exit_grid(handle, aabb, is_static);
        }

        let Some(entry) = self.entries.remove(&handle) else {
            return Ok(());
        };
        for other in entry.paired {
            let Some(state) = self.pairs.remove(&PairKey::new(handle, other)) else {
                continue;
            };
            let Some(mate) = self.entries.get_mut(&other) else {
                continue;
            };
            mate.paired.remove(&handle);
            let that = (mate.owner, mate.subindex);
            if state.colliding {
                self.callbacks
                    .unpair((entry.owner, entry.subindex), that, state.user_data);
            }
        }
        self.large.remove(&handle);
        Ok(())
    }

    fn object(&self, handle: Handle) -> Option<O> {
        self.entries.get(&handle).map(|e| e.owner)
    }

    fn is_static(&self, handle: Handle) -> Option<bool> {
        self.entries.get(&handle).map(|e| e.is_static)
    }

    fn subindex(&self, handle: Handle) -> Option<u32> {
        self.entries.get(&handle).map(|e| e.subindex)
    }

    fn cull_aabb(&self, rect: Rect, out: &mut Vec<CullHit<O>>, max_results: usize) -> usize {
        self.cull_rect(rect, out, max_results)
    }

    fn cull_segment(
        &self,
        from: Point,
        to: Point,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> usize {
        self.cull_line(from, to, out, max_results)
    }

    fn set_pair_callback(&mut self, callback: PairCallback<O, U>) {
        self.callbacks.set_pair(callback);
    }

    fn set_unpair_callback(&mut self, callback: UnpairCallback<O, U>) {
        self.callbacks.set_unpair(callback);
    }

    fn update(&mut self) {}
}
