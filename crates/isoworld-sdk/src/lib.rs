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

//! # Isoworld SDK
//!
//! The public face of the sprite world. A [`World`] owns the projection, the
//! type registry, every instance and light, and runs the frame pipeline:
//! background blocks, temporaries, deferred lighting and the final blend.

#![warn(missing_docs)]

pub mod background;
pub mod world;

pub use background::{BackgroundBlock, BlockCache, BlockState, BLOCK_SIZE, MAX_DISTANCE};
pub use world::World;

pub use isoworld_core::light::{AmbientLight, DirectedLight, PointLight};
pub use isoworld_core::spatial::OctreeAction;
pub use isoworld_core::{ModelInstance, OrthoSystem, Registry, SpriteInstance, Transform3D};
pub use isoworld_io::{generate_sprite_from_model, BakeOutcome, RegistryLoadExt};
