// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hash grid broad phase: bodies sliding past a wall, with pair events.
//!
//! This example shows how to:
//! - attach contact bookkeeping to pairs through the pair callback's user data,
//! - keep static geometry from pairing with itself,
//! - cull the grid with a rectangle and a segment.
//!
//! Run:
//! - `cargo run -p understory_demos --example broadphase_pairs`
//! - `RUST_LOG=understory_broadphase=debug cargo run -p understory_demos --example broadphase_pairs`

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Rect, Vec2};
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_broadphase::{BroadPhase2D, HashGrid, HashGridConfig};

/// Who owns a collision shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Body {
    Wall(u8),
    Ball(u8),
}

/// Contact record stored with a pair while it overlaps.
#[derive(Debug)]
struct Contact {
    id: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = HashGridConfig::default().with_cell_size(16);
    let mut grid: HashGrid<Body, Contact> = HashGrid::with_config(config).unwrap();

    let next_id = Rc::new(RefCell::new(0_u32));
    let ids = Rc::clone(&next_id);
    grid.set_pair_callback(Box::new(move |a, _, b, _| {
        let mut id = ids.borrow_mut();
        *id += 1;
        info!(?a, ?b, contact = *id, "begin contact");
        Some(Contact { id: *id })
    }));
    grid.set_unpair_callback(Box::new(|a, _, b, _, contact| {
        let id = contact.map(|c| c.id);
        info!(?a, ?b, contact = ?id, "end contact");
    }));

    // Two wall segments that overlap each other but never pair.
    for (i, rect) in [
        Rect::new(0.0, 60.0, 80.0, 64.0),
        Rect::new(76.0, 0.0, 80.0, 64.0),
    ]
    .into_iter()
    .enumerate()
    {
        let wall = grid.create(Body::Wall(i as u8), 0);
        grid.set_static(wall, true).unwrap();
        grid.move_to(wall, rect).unwrap();
    }

    let mut balls: Vec<_> = (0..3)
        .map(|i| {
            let h = grid.create(Body::Ball(i), 0);
            let origin = Point::new(8.0 + f64::from(i) * 20.0, 8.0);
            (h, origin, Vec2::new(6.0, 7.0 - f64::from(i) * 2.0))
        })
        .collect();

    for step in 0..10 {
        for (h, pos, vel) in &mut balls {
            *pos += *vel;
            let rect = Rect::from_center_size(*pos, (6.0, 6.0));
            grid.move_to(*h, rect).unwrap();
        }
        info!(step, pairs = grid.pair_count(), cells = grid.cell_count(), "stepped");
    }

    let mut hits = Vec::new();
    grid.cull_aabb(Rect::new(60.0, 40.0, 90.0, 70.0), &mut hits, 16);
    info!(hits = ?hits.iter().map(|h| h.owner).collect::<Vec<_>>(), "corner cull");

    grid.cull_segment(Point::new(0.0, 0.0), Point::new(100.0, 100.0), &mut hits, 16);
    info!(hits = ?hits.iter().map(|h| h.owner).collect::<Vec<_>>(), "diagonal cull");

    for (h, _, _) in balls {
        grid.remove(h).unwrap();
    }
    info!(entries = grid.len(), pairs = grid.pair_count(), "balls removed");
}
