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

//! Coalesced set of screen rectangles that need repainting.

use crate::math::IRect;

/// Disjoint, pairwise non-touching rectangles clipped to a viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyRectangles {
    width: i32,
    height: i32,
    rectangles: Vec<IRect>,
}

impl DirtyRectangles {
    /// Creates an empty set for a viewport of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            rectangles: Vec::new(),
        }
    }

    /// The viewport every rectangle is clipped to.
    pub fn viewport(&self) -> IRect {
        IRect::from_size(self.width, self.height)
    }

    /// Resizes the viewport, returning `true` if the size changed.
    ///
    /// Stored rectangles are clipped to the new viewport.
    pub fn set_dimensions(&mut self, width: i32, height: i32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        let viewport = self.viewport();
        self.rectangles = self
            .rectangles
            .iter()
            .map(|rect| rect.intersection(&viewport))
            .filter(|rect| !rect.is_empty())
            .collect();
        true
    }

    /// Adds a rectangle, merging it with everything it touches.
    pub fn insert(&mut self, rect: IRect) {
        let mut merged = rect.intersection(&self.viewport());
        if merged.is_empty() {
            return;
        }
        // Each merge can make the result touch rectangles it missed before.
        while let Some(index) = self.rectangles.iter().position(|r| r.touches(&merged)) {
            let other = self.rectangles.swap_remove(index);
            merged = merged.union(&other);
        }
        self.rectangles.push(merged);
    }

    /// Replaces the content with the whole viewport.
    pub fn mark_all_dirty(&mut self) {
        self.rectangles.clear();
        let viewport = self.viewport();
        if !viewport.is_empty() {
            self.rectangles.push(viewport);
        }
    }

    /// Removes every rectangle.
    pub fn reset(&mut self) {
        self.rectangles.clear();
    }

    /// The stored rectangles.
    pub fn rectangles(&self) -> &[IRect] {
        &self.rectangles
    }

    /// Returns `true` if nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::IVec2;

    fn covered(set: &DirtyRectangles, x: i32, y: i32) -> bool {
        set.rectangles()
            .iter()
            .any(|r| r.contains_point(IVec2::new(x, y)))
    }

    #[test]
    fn test_touching_rectangles_merge() {
        let mut set = DirtyRectangles::new(100, 100);
        set.insert(IRect::new(0, 0, 10, 10));
        set.insert(IRect::new(10, 0, 10, 10));
        assert_eq!(set.rectangles(), &[IRect::new(0, 0, 20, 10)]);
        // Corner contact counts as touching.
        set.insert(IRect::new(20, 10, 5, 5));
        assert_eq!(set.rectangles(), &[IRect::new(0, 0, 25, 15)]);
    }

    #[test]
    fn test_separate_rectangles_stay_apart() {
        let mut set = DirtyRectangles::new(100, 100);
        set.insert(IRect::new(0, 0, 10, 10));
        set.insert(IRect::new(50, 50, 10, 10));
        assert_eq!(set.rectangles().len(), 2);
    }

    #[test]
    fn test_clipped_to_viewport() {
        let mut set = DirtyRectangles::new(50, 40);
        set.insert(IRect::new(-10, -10, 20, 100));
        assert_eq!(set.rectangles(), &[IRect::new(0, 0, 10, 40)]);
        set.insert(IRect::new(60, 0, 10, 10));
        assert_eq!(set.rectangles().len(), 1);
    }

    #[test]
    fn test_chain_merge_leaves_no_touching_pairs() {
        let mut set = DirtyRectangles::new(200, 200);
        let mut inserted = Vec::new();
        let mut seed = 17u32;
        for _ in 0..60 {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let x = (seed >> 8) as i32 % 190;
            let y = (seed >> 16) as i32 % 190;
            let rect = IRect::new(x - 5, y - 5, 4 + (seed % 13) as i32, 3 + (seed % 7) as i32);
            set.insert(rect);
            inserted.push(rect);
        }
        let rects = set.rectangles();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.touches(b), "{a:?} touches {b:?}");
            }
        }
        // Every inserted pixel stays covered.
        let viewport = set.viewport();
        for rect in &inserted {
            let clipped = rect.intersection(&viewport);
            for y in clipped.top..clipped.bottom() {
                for x in clipped.left..clipped.right() {
                    assert!(covered(&set, x, y));
                }
            }
        }
    }

    #[test]
    fn test_dimensions_and_mark_all() {
        let mut set = DirtyRectangles::new(10, 10);
        assert!(!set.set_dimensions(10, 10));
        assert!(set.set_dimensions(20, 10));
        set.mark_all_dirty();
        assert_eq!(set.rectangles(), &[IRect::new(0, 0, 20, 10)]);
        set.reset();
        assert!(set.is_empty());
    }
}
