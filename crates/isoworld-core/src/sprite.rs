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

//! Immutable sprite and model types shared by every instance.

use crate::image::{HeightImage, RgbaImage};
use crate::instance::Transform3D;
use crate::math::{degrees_to_radians, IAabb, IVec2, IVec3, Mat3};
use crate::mesh::{DenseModel, Mesh, ShadowMesh};
use crate::units::{correct_direction, floating_to_mini, DIRECTION_COUNT};

/// Frame index for each camera-relative direction.
///
/// Frames are stored in view index order, so a sprite facing direction 0
/// uses the frame with the same index as the active view.
pub const DIRECTION_TO_FRAME: [usize; 8] = [4, 1, 5, 2, 6, 3, 7, 0];

/// One pre-rendered camera angle of a sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteFrame {
    /// Pixel of the frame that lands on the sprite's origin.
    pub center_point: IVec2,
    /// Diffuse colour with alpha.
    pub color: RgbaImage,
    /// Light-space normals mapped to `0..=255`.
    pub normal: RgbaImage,
    /// Height in tiles above the origin, `-inf` where nothing was drawn.
    pub height: HeightImage,
}

impl SpriteFrame {
    /// Frame dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}

/// A sprite atlas loaded for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteType {
    /// Inclusive lower corner relative to the origin, in mini-tiles.
    pub min_bound_mini: IVec3,
    /// Inclusive upper corner relative to the origin, in mini-tiles.
    pub max_bound_mini: IVec3,
    /// One frame per baked camera angle.
    pub frames: Vec<SpriteFrame>,
    /// Optional shadow caster in tiles relative to the origin.
    pub shadow_model: Option<ShadowMesh>,
}

impl SpriteType {
    /// Selects the frame for a view direction and an instance direction.
    ///
    /// # Panics
    /// Panics if the type has no frames.
    pub fn frame_index(&self, view_direction: i32, instance_direction: i32) -> usize {
        assert!(!self.frames.is_empty(), "Sprite type has no frames");
        DIRECTION_TO_FRAME[correct_direction(view_direction + instance_direction) as usize]
            % self.frames.len()
    }

    /// The frame for a view direction and an instance direction.
    pub fn frame(&self, view_direction: i32, instance_direction: i32) -> &SpriteFrame {
        &self.frames[self.frame_index(view_direction, instance_direction)]
    }

    /// Absolute bounds of an instance at `location` facing `direction`.
    ///
    /// Diagonal or turned instances get the bound of every rotation around Y.
    pub fn instance_bound(&self, location: IVec3, direction: i32) -> IAabb {
        let (min, max) = if correct_direction(direction) == 0 {
            (self.min_bound_mini, self.max_bound_mini)
        } else {
            let radius = [
                self.min_bound_mini.x,
                self.max_bound_mini.x,
                self.min_bound_mini.z,
                self.max_bound_mini.z,
            ]
            .into_iter()
            .map(i32::abs)
            .max()
            .unwrap_or(0);
            // Diagonal corners reach sqrt(2) times further.
            let radius = (radius as f32 * std::f32::consts::SQRT_2).ceil() as i32;
            (
                IVec3::new(-radius, self.min_bound_mini.y, -radius),
                IVec3::new(radius, self.max_bound_mini.y, radius),
            )
        };
        IAabb::from_min_max(location + min, location + max)
    }
}

/// Rotation of a sprite's shadow mesh for an instance direction.
pub fn sprite_direction_rotation(direction: i32) -> Mat3 {
    let steps = correct_direction(direction);
    Mat3::from_rotation_y(-degrees_to_radians((steps * 360 / DIRECTION_COUNT) as f32))
}

/// A dense model loaded for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelType {
    /// Render-ready triangles.
    pub visible: DenseModel,
    /// Shadow caster in model space.
    pub shadow_mesh: Option<ShadowMesh>,
}

impl ModelType {
    /// Flattens the visible mesh, deriving the shadow mesh from it when none is given.
    pub fn new(visible: &Mesh, shadow: Option<ShadowMesh>) -> Self {
        Self {
            visible: DenseModel::from_mesh(visible),
            shadow_mesh: Some(shadow.unwrap_or_else(|| ShadowMesh::from_mesh(visible))),
        }
    }

    /// A model that never casts shadows.
    pub fn without_shadow(visible: &Mesh) -> Self {
        Self {
            visible: DenseModel::from_mesh(visible),
            shadow_mesh: None,
        }
    }

    /// Absolute mini-tile bounds of an instance.
    pub fn instance_bound(&self, transform: &Transform3D) -> IAabb {
        if !self.visible.bound.is_valid() {
            let origin = transform.position;
            let point = IVec3::new(
                floating_to_mini(origin.x),
                floating_to_mini(origin.y),
                floating_to_mini(origin.z),
            );
            return IAabb::from_min_max(point, point);
        }
        let mut min = IVec3::splat(i32::MAX);
        let mut max = IVec3::splat(i32::MIN);
        for corner in self.visible.bound.corners() {
            let p = transform.transform_point(corner);
            let mini = IVec3::new(floating_to_mini(p.x), floating_to_mini(p.y), floating_to_mini(p.z));
            min = min.min(mini);
            max = max.max(mini);
        }
        // One mini-tile of slack for rounding.
        IAabb::from_min_max(min - IVec3::splat(1), max + IVec3::splat(1))
    }
}
