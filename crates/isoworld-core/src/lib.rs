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

//! # Isoworld Core
//!
//! Foundational types of the sprite world: math, pixel buffers, the eight
//! pixel-exact orthogonal projections, the spatial index of the static world,
//! the dirty rectangle set, meshes, lights and the type registry.

#![warn(missing_docs)]

pub mod dirty;
pub mod image;
pub mod instance;
pub mod light;
pub mod math;
pub mod mesh;
pub mod ortho;
pub mod registry;
pub mod spatial;
pub mod sprite;
pub mod units;

pub use dirty::DirtyRectangles;
pub use self::image::GBuffer;
pub use instance::{ModelInstance, SpriteInstance, Transform3D};
pub use light::{AmbientLight, DirectedLight, PointLight, LIGHT_ONE};
pub use ortho::{OrthoError, OrthoSystem, OrthoView};
pub use registry::Registry;
pub use sprite::{ModelType, SpriteFrame, SpriteType};
