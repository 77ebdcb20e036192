// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brute-force broad phase: linear culls and a full pair sweep in `update`.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::{self, Debug};

use kurbo::{Point, Rect};
use tracing::warn;

use crate::broad_phase::BroadPhase2D;
use crate::error::BroadPhaseError;
use crate::pairs::{Callbacks, PairKey};
use crate::types::{
    CullHit, Handle, PairCallback, UnpairCallback, is_placed, rects_overlap,
    segment_intersects_rect,
};

#[derive(Clone, Copy, Debug)]
struct BasicEntry<O> {
    owner: O,
    subindex: u32,
    aabb: Rect,
    is_static: bool,
}

impl<O: PartialEq> BasicEntry<O> {
    fn pairs_with(&self, other: &Self) -> bool {
        is_placed(&self.aabb)
            && is_placed(&other.aabb)
            && self.owner != other.owner
            && !(self.is_static && other.is_static)
            && rects_overlap(&self.aabb, &other.aabb)
    }
}

/// Reference broad phase that checks every entry against every other.
///
/// `move_to` and `set_static` only record the new state; pairs are
/// reconciled in [`update`](BroadPhase2D::update), which is `O(n²)`. Culls
/// scan all entries. Useful for small worlds and as an oracle for
/// [`HashGrid`](crate::HashGrid).
pub struct BasicBroadPhase<O, U = ()> {
    entries: BTreeMap<Handle, BasicEntry<O>>,
    pairs: BTreeMap<PairKey, Option<U>>,
    callbacks: Callbacks<O, U>,
    last_handle: u64,
}

impl<O: Debug, U> Debug for BasicBroadPhase<O, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicBroadPhase")
            .field("entries", &self.entries)
            .field("pairs", &self.pairs.len())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

impl<O: Copy + PartialEq, U> Default for BasicBroadPhase<O, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Copy + PartialEq, U> BasicBroadPhase<O, U> {
    /// Create an empty broad phase.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            pairs: BTreeMap::new(),
            callbacks: Callbacks::default(),
            last_handle: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pairs reported as colliding by the last [`update`](BroadPhase2D::update).
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the pair `{a, b}` was colliding as of the last update.
    pub fn is_colliding(&self, a: Handle, b: Handle) -> bool {
        self.pairs.contains_key(&PairKey::new(a, b))
    }

    /// Current rectangle of an entry.
    pub fn aabb(&self, handle: Handle) -> Option<Rect> {
        self.entries.get(&handle).map(|e| e.aabb)
    }

    fn entry_mut(
        &mut self,
        handle: Handle,
        op: &'static str,
    ) -> Result<&mut BasicEntry<O>, BroadPhaseError> {
        self.entries.get_mut(&handle).ok_or_else(|| {
            warn!(%handle, op, "unknown broad phase handle");
            BroadPhaseError::UnknownHandle(handle)
        })
    }

    fn cull(
        &self,
        test: impl Fn(&Rect) -> bool,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> usize {
        out.clear();
        let hits = self
            .entries
            .iter()
            .filter(|(_, e)| is_placed(&e.aabb) && test(&e.aabb))
            .map(|(&handle, e)| CullHit {
                handle,
                owner: e.owner,
                subindex: e.subindex,
            })
            .take(max_results);
        out.extend(hits);
        out.len()
    }
}

impl<O: Copy + PartialEq, U> BroadPhase2D<O, U> for BasicBroadPhase<O, U> {
    fn create(&mut self, owner: O, subindex: u32) -> Handle {
        self.last_handle += 1;
        let handle = Handle::new(self.last_handle);
        self.entries.insert(
            handle,
            BasicEntry {
                owner,
                subindex,
                aabb: Rect::ZERO,
                is_static: false,
            },
        );
        handle
    }

    fn move_to(&mut self, handle: Handle, aabb: Rect) -> Result<(), BroadPhaseError> {
        self.entry_mut(handle, "move_to")?.aabb = aabb.abs();
        Ok(())
    }

    fn set_static(&mut self, handle: Handle, is_static: bool) -> Result<(), BroadPhaseError> {
        self.entry_mut(handle, "set_static")?.is_static = is_static;
        Ok(())
    }

    fn remove(&mut self, handle: Handle) -> Result<(), BroadPhaseError> {
        let entry = *self.entry_mut(handle, "remove")?;
        self.entries.remove(&handle);

        let dropped: Vec<PairKey> = self
            .pairs
            .keys()
            .copied()
            .filter(|key| {
                let (a, b) = key.handles();
                a == handle || b == handle
            })
            .collect();
        for key in dropped {
            let user_data = self.pairs.remove(&key).flatten();
            let (a, b) = key.handles();
            let other = if a == handle { b } else { a };
            if let Some(mate) = self.entries.get(&other) {
                self.callbacks.unpair(
                    (entry.owner, entry.subindex),
                    (mate.owner, mate.subindex),
                    user_data,
                );
            }
        }
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
        let rect = rect.abs();
        self.cull(|aabb| rects_overlap(&rect, aabb), out, max_results)
    }

    fn cull_segment(
        &self,
        from: Point,
        to: Point,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> usize {
        if from == to || !from.is_finite() || !to.is_finite() {
            out.clear();
            return 0;
        }
        self.cull(|aabb| segment_intersects_rect(aabb, from, to), out, max_results)
    }

    fn set_pair_callback(&mut self, callback: PairCallback<O, U>) {
        self.callbacks.set_pair(callback);
    }

    fn set_unpair_callback(&mut self, callback: UnpairCallback<O, U>) {
        self.callbacks.set_unpair(callback);
    }

    fn update(&mut self) {
        let entries: Vec<(Handle, BasicEntry<O>)> =
            self.entries.iter().map(|(&h, &e)| (h, e)).collect();

        for (i, (ha, a)) in entries.iter().enumerate() {
            for (hb, b) in &entries[i + 1..] {
                let key = PairKey::new(*ha, *hb);
                let paired = self.pairs.contains_key(&key);
                match (a.pairs_with(b), paired) {
                    (true, false) => {
                        let user_data = self
                            .callbacks
                            .pair((a.owner, a.subindex), (b.owner, b.subindex));
                        self.pairs.insert(key, user_data);
                    }
                    (false, true) => {
                        let user_data = self.pairs.remove(&key).flatten();
                        self.callbacks.unpair(
                            (a.owner, a.subindex),
                            (b.owner, b.subindex),
                            user_data,
                        );
                    }
                    _ => {}
                }
            }
        }
    }
}
