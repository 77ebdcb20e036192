// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: boxes, planes, and triangles.

use glam::Vec3;

/// Tolerance used by the plane and triangle intersection tests.
pub(crate) const CMP_EPSILON: f32 = 1e-5;

/// Axis-aligned bounding box in 3D, stored as a corner plus a size.
///
/// The size is expected to be non-negative on every axis. A box with zero
/// size on some axis (for example the bounds of a flat triangle) is still a
/// valid box; it simply has no volume.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub position: Vec3,
    /// Extent along each axis.
    pub size: Vec3,
}

impl Aabb3 {
    /// Create a box from its minimum corner and size.
    #[inline]
    pub const fn new(position: Vec3, size: Vec3) -> Self {
        Self { position, size }
    }

    /// Create a box from its minimum and maximum corners.
    #[inline]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new(min, max - min)
    }

    /// A zero-sized box located at `point`.
    #[inline]
    pub const fn from_point(point: Vec3) -> Self {
        Self::new(point, Vec3::ZERO)
    }

    /// Maximum corner.
    #[inline]
    pub fn end(&self) -> Vec3 {
        self.position + self.size
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.position + self.size * 0.5
    }

    /// Grow the box so that it contains `point`.
    pub fn expand_to(&mut self, point: Vec3) {
        let min = self.position.min(point);
        let max = self.end().max(point);
        *self = Self::from_min_max(min, max);
    }

    /// The smallest box enclosing both boxes.
    pub fn merge(&self, other: &Self) -> Self {
        Self::from_min_max(
            self.position.min(other.position),
            self.end().max(other.end()),
        )
    }

    /// Index of the longest axis (`0` = X, `1` = Y, `2` = Z).
    ///
    /// Ties resolve to the lower axis.
    pub fn longest_axis(&self) -> usize {
        let mut axis = 0;
        let mut longest = self.size.x;
        if self.size.y > longest {
            axis = 1;
            longest = self.size.y;
        }
        if self.size.z > longest {
            axis = 2;
        }
        axis
    }

    /// Whether the two boxes overlap.
    ///
    /// Boxes that only touch along a face are *not* considered overlapping.
    pub fn intersects(&self, other: &Self) -> bool {
        let (a0, a1) = (self.position, self.end());
        let (b0, b1) = (other.position, other.end());
        !(a0.x >= b1.x || a1.x <= b0.x || a0.y >= b1.y || a1.y <= b0.y || a0.z >= b1.z || a1.z <= b0.z)
    }

    /// Whether `other` lies within this box (boundaries inclusive).
    pub fn encloses(&self, other: &Self) -> bool {
        self.position.cmple(other.position).all() && self.end().cmpge(other.end()).all()
    }

    /// Whether the segment `from → to` touches the box.
    ///
    /// Uses a slab clip of the parametric interval `[0, 1]` against each axis.
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let mut min = 0.0_f32;
        let mut max = 1.0_f32;
        for axis in 0..3 {
            let seg_from = from[axis];
            let seg_to = to[axis];
            let box_begin = self.position[axis];
            let box_end = box_begin + self.size[axis];
            let (cmin, cmax);
            if seg_from < seg_to {
                if seg_from > box_end || seg_to < box_begin {
                    return false;
                }
                let length = seg_to - seg_from;
                cmin = if seg_from < box_begin {
                    (box_begin - seg_from) / length
                } else {
                    0.0
                };
                cmax = if seg_to > box_end {
                    (box_end - seg_from) / length
                } else {
                    1.0
                };
            } else {
                if seg_to > box_end || seg_from < box_begin {
                    return false;
                }
                let length = seg_to - seg_from;
                cmin = if seg_from > box_end {
                    (box_end - seg_from) / length
                } else {
                    0.0
                };
                cmax = if seg_to < box_begin {
                    (box_begin - seg_from) / length
                } else {
                    1.0
                };
            }
            min = min.max(cmin);
            max = max.min(cmax);
            if max < min {
                return false;
            }
        }
        true
    }

    /// Whether the ray starting at `from` with direction `dir` touches the box.
    pub fn intersects_ray(&self, from: Vec3, dir: Vec3) -> bool {
        let end = self.end();
        let mut near = -1e20_f32;
        let mut far = 1e20_f32;
        for axis in 0..3 {
            if dir[axis] == 0.0 {
                if from[axis] < self.position[axis] || from[axis] > end[axis] {
                    return false;
                }
                continue;
            }
            let mut c1 = (self.position[axis] - from[axis]) / dir[axis];
            let mut c2 = (end[axis] - from[axis]) / dir[axis];
            if c1 > c2 {
                core::mem::swap(&mut c1, &mut c2);
            }
            near = near.max(c1);
            far = far.min(c2);
            if near > far || far < 0.0 {
                return false;
            }
        }
        true
    }

    /// Conservative test of the box against a convex volume.
    ///
    /// The volume is given by its bounding `planes` (normals pointing out) and,
    /// optionally, its corner `points`. Returns `false` only when the box is
    /// certainly outside.
    pub fn intersects_convex_shape(&self, planes: &[Plane], points: &[Vec3]) -> bool {
        let half = self.size * 0.5;
        let ofs = self.position + half;

        for plane in planes {
            // Corner of the box furthest along the inward direction.
            let corner = Vec3::select(plane.normal.cmpgt(Vec3::ZERO), -half, half) + ofs;
            if plane.is_point_over(corner) {
                return false;
            }
        }

        if points.is_empty() {
            return true;
        }
        let end = ofs + half;
        let begin = ofs - half;
        for axis in 0..3 {
            let above = points.iter().filter(|p| p[axis] > end[axis]).count();
            let below = points.iter().filter(|p| p[axis] < begin[axis]).count();
            if above == points.len() || below == points.len() {
                return false;
            }
        }
        true
    }

    /// Whether the whole box lies on the inner side of every plane.
    pub fn inside_convex_shape(&self, planes: &[Plane]) -> bool {
        let half = self.size * 0.5;
        let ofs = self.position + half;
        planes.iter().all(|plane| {
            let corner = Vec3::select(plane.normal.cmplt(Vec3::ZERO), -half, half) + ofs;
            !plane.is_point_over(corner)
        })
    }

    /// The bounds of this box after scaling every corner by `scale`.
    pub fn scaled(&self, scale: Vec3) -> Self {
        let a = self.position * scale;
        let b = self.end() * scale;
        Self::from_min_max(a.min(b), a.max(b))
    }
}

/// A plane `normal · p = d`. Points with `normal · p > d` are "over" it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Plane {
    /// Unit normal pointing to the outer side.
    pub normal: Vec3,
    /// Distance from the origin along `normal`.
    pub d: f32,
}

impl Plane {
    /// Create a plane from a normal and distance.
    #[inline]
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through `point` with the given `normal`.
    #[inline]
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self::new(normal, normal.dot(point))
    }

    /// Plane through three points, oriented by their winding.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self::from_point_normal(a, winding_normal(a, b, c))
    }

    /// Signed distance from the plane to `point`.
    #[inline]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.d
    }

    /// Whether `point` lies strictly on the outer side.
    #[inline]
    pub fn is_point_over(&self, point: Vec3) -> bool {
        self.normal.dot(point) > self.d
    }

    /// Where the segment `begin → end` crosses the plane, if it does.
    pub fn intersects_segment(&self, begin: Vec3, end: Vec3) -> Option<Vec3> {
        let segment = begin - end;
        let den = self.normal.dot(segment);
        if den.abs() < CMP_EPSILON {
            return None;
        }
        let dist = (self.normal.dot(begin) - self.d) / den;
        if dist < -CMP_EPSILON || dist > 1.0 + CMP_EPSILON {
            return None;
        }
        Some(begin - segment * dist)
    }
}

/// A single triangle by value.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Face3 {
    /// Corners in winding order.
    pub vertices: [Vec3; 3],
}

impl Face3 {
    /// Create a triangle from its corners.
    #[inline]
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Unit normal following the winding order; zero for degenerate triangles.
    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        winding_normal(a, b, c)
    }

    /// Supporting plane of the triangle.
    pub fn plane(&self) -> Plane {
        let [a, b, c] = self.vertices;
        Plane::from_points(a, b, c)
    }

    /// Area of the triangle.
    pub fn area(&self) -> f32 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a).length() * 0.5
    }

    /// Bounds of the three corners.
    pub fn aabb(&self) -> Aabb3 {
        let [a, b, c] = self.vertices;
        Aabb3::from_min_max(a.min(b).min(c), a.max(b).max(c))
    }

    /// Intersection point of the segment `from → to` with the triangle.
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> Option<Vec3> {
        let rel = to - from;
        let t = self.hit_parameter(from, rel)?;
        (t <= 1.0).then(|| from + rel * t)
    }

    /// Intersection point of the ray `from + t·dir` (`t > 0`) with the triangle.
    pub fn intersects_ray(&self, from: Vec3, dir: Vec3) -> Option<Vec3> {
        let t = self.hit_parameter(from, dir)?;
        Some(from + dir * t)
    }

    /// Möller–Trumbore; returns the line parameter of a hit in front of `from`.
    fn hit_parameter(&self, from: Vec3, dir: Vec3) -> Option<f32> {
        let [v0, v1, v2] = self.vertices;
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let h = dir.cross(e2);
        let a = e1.dot(h);
        if a.abs() < CMP_EPSILON {
            return None;
        }
        let f = 1.0 / a;
        let s = from - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = f * dir.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = f * e2.dot(q);
        (t > CMP_EPSILON).then_some(t)
    }
}

#[inline]
pub(crate) fn winding_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}
