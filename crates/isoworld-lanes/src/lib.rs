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

//! # Isoworld Lanes
//!
//! Hot-path pixel kernels of the sprite world. Each lane works on plain image
//! buffers and never allocates per pixel:
//! - [`gbuffer`] draws sprites and dense models into a G-buffer with a height test.
//! - [`shadow`] renders reciprocal-depth cube maps around point lights.
//! - [`lighting`] accumulates light from a G-buffer and blends it with the diffuse colour.

#![warn(missing_docs)]

pub mod gbuffer;
pub mod lighting;
pub mod shadow;

pub use gbuffer::{
    draw_dense_model, draw_sprite, HeightTest, Higher, HigherOrEqual, LinearNormals,
    NormalInterpolation, NormalizedNormals,
};
pub use lighting::{blend_light, clear_light, directed_light, point_light, LightWrite};
pub use shadow::{CubeFace, ShadowCube};
