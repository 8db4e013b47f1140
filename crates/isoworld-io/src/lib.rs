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

//! # Isoworld IO
//!
//! Everything that touches files: the INI reader, projection configs, sprite
//! atlases, OBJ meshes and the bake pipeline that renders meshes into atlases.

#![warn(missing_docs)]

pub mod bake;
pub mod error;
pub mod ini;
pub mod obj;
pub mod ortho_config;
pub mod registry;
pub mod sprite_atlas;

pub use bake::{generate_sprite_from_model, BakeOutcome, BakeReport};
pub use error::{BakeError, IniError, LoadError};
pub use ini::{ini_text_matches, parse_ini, IniDocument};
pub use ortho_config::{load_ortho_config, ortho_from_ini};
pub use registry::RegistryLoadExt;
