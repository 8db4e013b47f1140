// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides geometric primitive shapes for spatial calculations.
//!
//! [`Aabb`] bounds meshes in floating-point tiles, [`IAabb`] bounds sprites and
//! octree regions in integer mini-tiles, and [`IRect`] describes screen-space
//! pixel regions for clipping, dirty tracking and background blocks.

use super::{IVec2, IVec3, Vec3};

/// Represents an Axis-Aligned Bounding Box (AABB) in floating-point space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An invalid `Aabb` where `min` components are positive infinity and `max` are negative infinity.
    ///
    /// Merging any valid `Aabb` or point with `INVALID` results in that box or point.
    pub const INVALID: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Creates a new `Aabb` from two corner points, sorting each component.
    #[inline]
    pub fn from_min_max(min_pt: Vec3, max_pt: Vec3) -> Self {
        Self {
            min: min_pt.min(max_pt),
            max: min_pt.max(max_pt),
        }
    }

    /// Creates an `Aabb` that tightly encloses a given set of points.
    ///
    /// Returns `None` if the input slice is empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bound = Self::from_min_max(*first, *first);
        for point in rest {
            bound = bound.merged_with_point(*point);
        }
        Some(bound)
    }

    /// Calculates the full size (width, height, depth) of the `Aabb`.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Checks if the `Aabb` is valid (i.e., `min` <= `max` on all axes).
    /// Degenerate boxes where `min == max` are considered valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Creates a new `Aabb` that encompasses both this `Aabb` and an additional point.
    #[inline]
    pub fn merged_with_point(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Returns the eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

impl Default for Aabb {
    /// Returns [`Aabb::INVALID`].
    fn default() -> Self {
        Self::INVALID
    }
}

/// An integer axis-aligned box with **inclusive** bounds on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IAabb {
    /// The inclusive lower corner.
    pub min: IVec3,
    /// The inclusive upper corner.
    pub max: IVec3,
}

impl IAabb {
    /// Creates a box from two corners, sorting each component.
    #[inline]
    pub fn from_min_max(a: IVec3, b: IVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Size along each axis (`max - min`).
    #[inline]
    pub fn size(&self) -> IVec3 {
        self.max - self.min
    }

    /// Checks if a point lies inside the box or on its boundary.
    #[inline]
    pub fn contains_point(&self, p: IVec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Checks if the two closed boxes share at least one point.
    #[inline]
    pub fn intersects(&self, other: &IAabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Returns the smallest box containing both boxes.
    #[inline]
    pub fn merge(&self, other: &IAabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the eight corners of the box.
    pub fn corners(&self) -> [IVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            IVec3::new(a.x, a.y, a.z),
            IVec3::new(b.x, a.y, a.z),
            IVec3::new(a.x, b.y, a.z),
            IVec3::new(b.x, b.y, a.z),
            IVec3::new(a.x, a.y, b.z),
            IVec3::new(b.x, a.y, b.z),
            IVec3::new(a.x, b.y, b.z),
            IVec3::new(b.x, b.y, b.z),
        ]
    }
}

/// A screen-space rectangle in pixels.
///
/// `left` and `top` are inclusive, `right()` and `bottom()` are exclusive.
/// Rectangles with a non-positive width or height are empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    /// The first column inside the rectangle.
    pub left: i32,
    /// The first row inside the rectangle.
    pub top: i32,
    /// The number of columns.
    pub width: i32,
    /// The number of rows.
    pub height: i32,
}

impl IRect {
    /// Creates a rectangle from its upper-left corner and dimensions.
    #[inline]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Creates a rectangle from inclusive `left`/`top` and exclusive `right`/`bottom` edges.
    #[inline]
    pub const fn from_bounds(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Creates a rectangle at the origin with the given dimensions.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The exclusive right edge.
    #[inline]
    pub const fn right(&self) -> i32 {
        self.left + self.width
    }

    /// The exclusive bottom edge.
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// The upper-left corner.
    #[inline]
    pub const fn upper_left(&self) -> IVec2 {
        IVec2::new(self.left, self.top)
    }

    /// Returns `true` when the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of covered pixels, zero for empty rectangles.
    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Returns the overlapping region, which may be empty.
    #[inline]
    pub fn intersection(&self, other: &IRect) -> IRect {
        IRect::from_bounds(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Returns the smallest rectangle containing both rectangles.
    ///
    /// An empty operand is ignored.
    #[inline]
    pub fn union(&self, other: &IRect) -> IRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        IRect::from_bounds(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Returns `true` when the interiors share at least one pixel.
    #[inline]
    pub fn overlaps(&self, other: &IRect) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Returns `true` when the closures of two non-empty rectangles meet,
    /// which includes sharing only an edge or a corner.
    #[inline]
    pub fn touches(&self, other: &IRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left <= other.right()
            && other.left <= self.right()
            && self.top <= other.bottom()
            && other.top <= self.bottom()
    }

    /// Returns `true` when the pixel lies inside the rectangle.
    #[inline]
    pub fn contains_point(&self, point: IVec2) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }

    /// Returns `true` when every pixel of `other` lies inside this rectangle.
    #[inline]
    pub fn contains_rect(&self, other: &IRect) -> bool {
        other.is_empty()
            || (other.left >= self.left
                && other.top >= self.top
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Returns the rectangle moved by `offset`.
    #[inline]
    pub fn offset(&self, offset: IVec2) -> IRect {
        IRect::new(self.left + offset.x, self.top + offset.y, self.width, self.height)
    }
}
