// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Queries against a built [`TriangleMesh`].

use core::ops::ControlFlow;

use glam::Vec3;

use crate::mesh::{Triangle, TriangleMesh};
use crate::traverse::{AabbTest, Predicate, traverse};
use crate::types::{Aabb3, Face3, Plane};

/// Closest intersection found by a ray or segment query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// Intersection point.
    pub point: Vec3,
    /// Normal of the hit triangle, oriented against the query direction.
    pub normal: Vec3,
    /// Index of the hit triangle.
    pub face: u32,
}

impl TriangleMesh {
    /// Average of the stored normals of every triangle whose bounds overlap
    /// `aabb`. Zero when none do.
    pub fn area_normal(&self, aabb: &Aabb3) -> Vec3 {
        let mut query = AreaNormal {
            aabb: *aabb,
            sum: Vec3::ZERO,
            count: 0,
        };
        let _ = traverse(self, &mut query);
        if query.count == 0 {
            return Vec3::ZERO;
        }
        #[allow(
            clippy::cast_precision_loss,
            reason = "Averaging weight; exactness beyond 2^24 faces is irrelevant."
        )]
        let count = query.count as f32;
        query.sum / count
    }

    /// Closest triangle hit by the segment `from → to`.
    ///
    /// "Closest" is measured along the segment direction.
    pub fn intersect_segment(&self, from: Vec3, to: Vec3) -> Option<RayHit> {
        let mut query = ClosestHit {
            from,
            to,
            dir: to - from,
            axis: (to - from).normalize_or_zero(),
            bounded: true,
            best: f32::INFINITY,
            hit: None,
        };
        let _ = traverse(self, &mut query);
        query.finish()
    }

    /// Closest triangle hit by the ray from `from` along `dir`.
    ///
    /// `dir` does not need to be normalized; distances are compared by
    /// projection onto it.
    pub fn intersect_ray(&self, from: Vec3, dir: Vec3) -> Option<RayHit> {
        let mut query = ClosestHit {
            from,
            to: from + dir,
            dir,
            axis: dir,
            bounded: false,
            best: f32::INFINITY,
            hit: None,
        };
        let _ = traverse(self, &mut query);
        query.finish()
    }

    /// Whether any triangle touches the convex volume bounded by `planes`.
    ///
    /// `points` are the corners of the volume; they only sharpen the
    /// bounds culling and may be empty.
    pub fn intersect_convex(&self, planes: &[Plane], points: &[Vec3]) -> bool {
        let mut query = ConvexIntersect { planes, points };
        traverse(self, &mut query).is_break()
    }

    /// Whether the whole mesh, scaled by `scale`, lies inside the convex
    /// volume bounded by `planes`.
    ///
    /// An unbuilt mesh is never inside.
    pub fn inside_convex(&self, planes: &[Plane], points: &[Vec3], scale: Vec3) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let mut query = ConvexInside {
            planes,
            points,
            scale,
        };
        traverse(self, &mut query).is_continue()
    }
}

struct AreaNormal {
    aabb: Aabb3,
    sum: Vec3,
    count: usize,
}

impl Predicate for AreaNormal {
    fn test_aabb(&mut self, aabb: &Aabb3) -> AabbTest {
        if aabb.intersects(&self.aabb) {
            AabbTest::Hit
        } else {
            AabbTest::Miss
        }
    }

    fn visit_leaf(&mut self, _: u32, triangle: &Triangle, _: &Face3) -> ControlFlow<()> {
        self.sum += triangle.normal;
        self.count += 1;
        ControlFlow::Continue(())
    }
}

/// Shared by the segment and ray queries; `bounded` selects the segment form.
struct ClosestHit {
    from: Vec3,
    to: Vec3,
    dir: Vec3,
    axis: Vec3,
    bounded: bool,
    best: f32,
    hit: Option<RayHit>,
}

impl ClosestHit {
    fn finish(self) -> Option<RayHit> {
        let mut hit = self.hit?;
        if self.axis.dot(hit.normal) > 0.0 {
            hit.normal = -hit.normal;
        }
        Some(hit)
    }
}

impl Predicate for ClosestHit {
    fn test_aabb(&mut self, aabb: &Aabb3) -> AabbTest {
        let touched = if self.bounded {
            aabb.intersects_segment(self.from, self.to)
        } else {
            aabb.intersects_ray(self.from, self.dir)
        };
        if touched { AabbTest::Hit } else { AabbTest::Miss }
    }

    fn visit_leaf(&mut self, face: u32, triangle: &Triangle, corners: &Face3) -> ControlFlow<()> {
        let point = if self.bounded {
            corners.intersects_segment(self.from, self.to)
        } else {
            corners.intersects_ray(self.from, self.dir)
        };
        if let Some(point) = point {
            let d = self.axis.dot(point);
            if d < self.best {
                self.best = d;
                self.hit = Some(RayHit {
                    point,
                    normal: triangle.normal,
                    face,
                });
            }
        }
        ControlFlow::Continue(())
    }
}

struct ConvexIntersect<'a> {
    planes: &'a [Plane],
    points: &'a [Vec3],
}

impl ConvexIntersect<'_> {
    fn is_inside_except(&self, point: Vec3, skip: usize) -> bool {
        self.planes
            .iter()
            .enumerate()
            .all(|(i, plane)| i == skip || !plane.is_point_over(point))
    }
}

impl Predicate for ConvexIntersect<'_> {
    fn test_aabb(&mut self, aabb: &Aabb3) -> AabbTest {
        if aabb.intersects_convex_shape(self.planes, self.points) {
            AabbTest::Hit
        } else {
            AabbTest::Miss
        }
    }

    fn visit_leaf(&mut self, _: u32, _: &Triangle, corners: &Face3) -> ControlFlow<()> {
        let v = corners.vertices;
        for j in 0..3 {
            let (a, b) = (v[j], v[(j + 1) % 3]);
            for (i, plane) in self.planes.iter().enumerate() {
                if let Some(crossing) = plane.intersects_segment(a, b)
                    && self.is_inside_except(crossing, i)
                {
                    return ControlFlow::Break(());
                }
            }
            if self.planes.iter().all(|plane| !plane.is_point_over(a)) {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

struct ConvexInside<'a> {
    planes: &'a [Plane],
    points: &'a [Vec3],
    scale: Vec3,
}

impl Predicate for ConvexInside<'_> {
    fn test_aabb(&mut self, aabb: &Aabb3) -> AabbTest {
        let scaled = aabb.scaled(self.scale);
        if !scaled.intersects_convex_shape(self.planes, self.points) {
            AabbTest::Abort
        } else if scaled.inside_convex_shape(self.planes) {
            // Everything below is inside too.
            AabbTest::Miss
        } else {
            AabbTest::Hit
        }
    }

    fn visit_leaf(&mut self, _: u32, _: &Triangle, corners: &Face3) -> ControlFlow<()> {
        let outside = corners.vertices.iter().any(|&v| {
            let v = v * self.scale;
            self.planes.iter().any(|plane| plane.is_point_over(v))
        });
        if outside {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}
