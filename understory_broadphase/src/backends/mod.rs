// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad phase implementations.
//!
//! - `basic`: every entry against every other; pairs are reconciled in `update`.
//! - `hash_grid` (feature `hash_grid`): incremental spatial hash grid.
//!
//! Hash grid bookkeeping
//! ---------------------
//! Each occupied cell keeps a refcount per member (an entry overlapping the
//! same cell twice during a move counts twice). A pair record's `refcount` is
//! the number of cells its two entries share, plus one for a link through a
//! large entry. Moves enter the new cell range before leaving the old one, so
//! a pair that persists across a move never reaches zero and never re-fires
//! its callbacks.

pub(crate) mod basic;
#[cfg(feature = "hash_grid")]
pub(crate) mod hash_grid;

pub use basic::BasicBroadPhase;
#[cfg(feature = "hash_grid")]
pub use hash_grid::HashGrid;
