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

//! Light sources understood by the deferred lighter.
//!
//! Light values are stored as RGBA8 in fixed point where [`LIGHT_ONE`] means
//! an intensity of exactly one. A white light of intensity 1.0 therefore
//! reproduces the diffuse colour unchanged and 255 saturates at roughly twice
//! the diffuse colour.

use crate::math::{Rgb8, Vec3};

/// Fixed-point value of full intensity in a light buffer channel.
pub const LIGHT_ONE: u32 = 128;

/// Converts a colour and intensity into fixed-point light channels.
pub fn light_channels(color: Rgb8, intensity: f32) -> [u32; 3] {
    let scale = intensity.max(0.0) * LIGHT_ONE as f32 / 255.0;
    color
        .to_array()
        .map(|channel| ((channel as f32 * scale).round() as u32).min(255))
}

/// A spherical light with a finite radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Position in world tiles.
    pub position: Vec3,
    /// Distance in tiles where the light fades to zero.
    pub radius: f32,
    /// Multiplier of the colour at the centre.
    pub intensity: f32,
    /// Colour of the light.
    pub color: Rgb8,
    /// Whether the light renders a shadow cube.
    pub shadow_casting: bool,
}

impl PointLight {
    /// A white light without shadows.
    pub fn new(position: Vec3, radius: f32, intensity: f32) -> Self {
        Self {
            position,
            radius,
            intensity,
            color: Rgb8::WHITE,
            shadow_casting: false,
        }
    }

    /// Sets the colour.
    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = color;
        self
    }

    /// Enables or disables shadow casting.
    pub fn with_shadows(mut self, shadow_casting: bool) -> Self {
        self.shadow_casting = shadow_casting;
        self
    }
}

/// A light at infinite distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectedLight {
    /// Direction the light travels in world space.
    pub direction: Vec3,
    /// Multiplier of the colour.
    pub intensity: f32,
    /// Colour of the light.
    pub color: Rgb8,
}

impl DirectedLight {
    /// A white directional light.
    pub fn new(direction: Vec3, intensity: f32) -> Self {
        Self {
            direction,
            intensity,
            color: Rgb8::WHITE,
        }
    }

    /// Sets the colour.
    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = color;
        self
    }
}

/// Constant light applied to every pixel before other lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Multiplier of the colour.
    pub intensity: f32,
    /// Colour of the light.
    pub color: Rgb8,
}

impl AmbientLight {
    /// No ambient light at all.
    pub const NONE: Self = Self {
        intensity: 0.0,
        color: Rgb8::BLACK,
    };

    /// A white ambient light.
    pub fn white(intensity: f32) -> Self {
        Self {
            intensity,
            color: Rgb8::WHITE,
        }
    }

    /// The light buffer pixel this ambient light clears to.
    pub fn pixel(&self) -> [u8; 4] {
        let [r, g, b] = light_channels(self.color, self.intensity);
        [r as u8, g as u8, b as u8, 255]
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::NONE
    }
}
