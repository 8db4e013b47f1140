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

//! Placed sprites and models.

use crate::math::{IVec3, Mat3, Vec3};

/// A position and orientation in world tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    /// Translation in tiles.
    pub position: Vec3,
    /// Rotation applied before the translation.
    pub rotation: Mat3,
}

impl Transform3D {
    /// No translation and no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Mat3::IDENTITY,
    };

    /// A translation without rotation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Mat3::IDENTITY,
        }
    }

    /// Replaces the rotation.
    pub fn with_rotation(mut self, rotation: Mat3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Maps a model-space point into world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A sprite placed at an exact mini-tile location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteInstance {
    /// Index of the sprite type in the registry.
    pub type_index: usize,
    /// Rotation in steps of 45 degrees, added to the camera direction.
    pub direction: i32,
    /// Origin in mini-tiles.
    pub mini_location: IVec3,
    /// Whether the sprite's shadow mesh blocks point lights.
    pub shadow_casting: bool,
    /// Free value for the caller, used by removal filters.
    pub user_data: u64,
}

impl SpriteInstance {
    /// A shadow-casting sprite facing direction 0.
    pub fn new(type_index: usize, mini_location: IVec3) -> Self {
        Self {
            type_index,
            direction: 0,
            mini_location,
            shadow_casting: true,
            user_data: 0,
        }
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: i32) -> Self {
        self.direction = direction;
        self
    }

    /// Enables or disables shadow casting.
    pub fn with_shadows(mut self, shadow_casting: bool) -> Self {
        self.shadow_casting = shadow_casting;
        self
    }

    /// Sets the user data.
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }
}

/// A dense model placed with a free transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInstance {
    /// Index of the model type in the registry.
    pub type_index: usize,
    /// Model to world transform.
    pub location: Transform3D,
    /// Whether the model's shadow mesh blocks point lights.
    pub shadow_casting: bool,
    /// Free value for the caller, used by removal filters.
    pub user_data: u64,
}

impl ModelInstance {
    /// A shadow-casting model.
    pub fn new(type_index: usize, location: Transform3D) -> Self {
        Self {
            type_index,
            location,
            shadow_casting: true,
            user_data: 0,
        }
    }

    /// Enables or disables shadow casting.
    pub fn with_shadows(mut self, shadow_casting: bool) -> Self {
        self.shadow_casting = shadow_casting;
        self
    }

    /// Sets the user data.
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }
}
