// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trait shared by the broad phase implementations.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::error::BroadPhaseError;
use crate::types::{CullHit, Handle, PairCallback, UnpairCallback};

/// A 2D broad phase: tracks entries by bounding rectangle, reports candidate
/// pairs through callbacks, and answers rectangle and segment culls.
///
/// `O` is the owner identifier supplied at creation; entries with equal
/// owners never pair. `U` is the user data a pair callback may attach to a
/// pair, handed back on unpair.
pub trait BroadPhase2D<O: Copy + PartialEq, U> {
    /// Register a new, unplaced entry.
    fn create(&mut self, owner: O, subindex: u32) -> Handle;

    /// Set an entry's bounding rectangle.
    ///
    /// Moving to `Rect::ZERO` takes the entry out of the world.
    fn move_to(&mut self, handle: Handle, aabb: Rect) -> Result<(), BroadPhaseError>;

    /// Mark an entry static or dynamic. Static entries never pair with each
    /// other.
    fn set_static(&mut self, handle: Handle, is_static: bool) -> Result<(), BroadPhaseError>;

    /// Remove an entry, dropping its pairs.
    ///
    /// The unpair callback fires for each dropped pair that was colliding.
    fn remove(&mut self, handle: Handle) -> Result<(), BroadPhaseError>;

    /// Owner of an entry.
    fn object(&self, handle: Handle) -> Option<O>;

    /// Whether an entry is static.
    fn is_static(&self, handle: Handle) -> Option<bool>;

    /// Sub-index of an entry.
    fn subindex(&self, handle: Handle) -> Option<u32>;

    /// Collect entries whose rectangle overlaps `rect`.
    ///
    /// `out` is cleared first and receives at most `max_results` hits; the
    /// number of hits is returned.
    fn cull_aabb(&self, rect: Rect, out: &mut Vec<CullHit<O>>, max_results: usize) -> usize;

    /// Collect entries whose rectangle touches the segment `from → to`.
    ///
    /// A zero-length segment matches nothing.
    fn cull_segment(
        &self,
        from: Point,
        to: Point,
        out: &mut Vec<CullHit<O>>,
        max_results: usize,
    ) -> usize;

    /// Install the callback fired when a pair starts colliding.
    fn set_pair_callback(&mut self, callback: PairCallback<O, U>);

    /// Install the callback fired when a colliding pair separates or is dropped.
    fn set_unpair_callback(&mut self, callback: UnpairCallback<O, U>);

    /// Reconcile pairs after a batch of changes.
    ///
    /// Implementations that maintain pairs incrementally do nothing here.
    fn update(&mut self);
}
