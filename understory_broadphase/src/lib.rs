// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Broadphase: 2D collision broad phases over axis-aligned rectangles.
//!
//! A broad phase keeps track of where every collision shape roughly is and
//! tells its owner which pairs of shapes might be touching.
//!
//! - Create entries with an owner and sub-index, then move them around with
//!   [`BroadPhase2D::move_to`].
//! - Get told when two entries from different owners start or stop
//!   overlapping, through pair and unpair callbacks. The pair callback may
//!   attach user data to the pair; it is handed back on unpair.
//! - Ask which entries overlap a rectangle or touch a segment.
//!
//! Entries can be marked static; two static entries never pair. An entry
//! whose rectangle is [`Rect::ZERO`](kurbo::Rect::ZERO) is out of the world.
//!
//! Two implementations share the [`BroadPhase2D`] trait:
//!
//! - [`HashGrid`] *(feature `hash_grid`)*: an incremental spatial hash grid.
//!   Pairs are updated as entries move, so callbacks fire from inside
//!   `move_to`, `set_static` and `remove`.
//! - [`BasicBroadPhase`]: checks every entry against every other in
//!   [`BroadPhase2D::update`]. Simple, and handy as a reference.
//!
//! ## Features
//!
//! - `hash_grid` *(default)*: enables [`HashGrid`] and [`HashGridConfig`], backed by
//!   `hashbrown` and `smallvec`. Disable this feature to avoid those dependencies.
//! - `std` *(default)*: enables `std` support for `kurbo` and the logging and
//!   error crates.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for
//!   floating-point math.
//!
//! This crate is `no_std` and uses `alloc`.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "hash_grid")]
//! # {
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use kurbo::{Point, Rect};
//! use understory_broadphase::{BroadPhase2D, HashGrid, HashGridConfig};
//!
//! let config = HashGridConfig::default().with_cell_size(1);
//! let mut grid: HashGrid<&str> = HashGrid::with_config(config).unwrap();
//!
//! let contacts = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&contacts);
//! grid.set_pair_callback(Box::new(move |a, _, b, _| {
//!     log.borrow_mut().push((a, b));
//!     None
//! }));
//!
//! let player = grid.create("player", 0);
//! let crate_ = grid.create("crate", 0);
//! grid.move_to(player, Rect::new(0.0, 0.0, 0.5, 0.5)).unwrap();
//! grid.move_to(crate_, Rect::new(2.0, 2.0, 2.5, 2.5)).unwrap();
//! assert!(contacts.borrow().is_empty());
//!
//! grid.move_to(crate_, Rect::new(0.25, 0.25, 0.75, 0.75)).unwrap();
//! assert_eq!(contacts.borrow().len(), 1);
//!
//! let mut hits = Vec::new();
//! let n = grid.cull_segment(Point::new(-1.0, 0.6), Point::new(1.0, 0.6), &mut hits, 8);
//! assert_eq!(n, 1);
//! assert_eq!(hits[0].owner, "crate");
//! # }
//! ```
//!
//! ### Float semantics
//!
//! Rectangles are normalized on entry. Overlap is strict: rectangles that only
//! share an edge do not pair. Segments include the rectangle boundary.

#![no_std]

extern crate alloc;

pub mod backends;
mod broad_phase;
#[cfg(feature = "hash_grid")]
mod config;
mod error;
mod pairs;
mod types;

pub use backends::BasicBroadPhase;
#[cfg(feature = "hash_grid")]
pub use backends::HashGrid;
pub use broad_phase::BroadPhase2D;
#[cfg(feature = "hash_grid")]
pub use config::HashGridConfig;
pub use error::BroadPhaseError;
pub use types::{CullHit, Handle, PairCallback, PairInfo, UnpairCallback};
