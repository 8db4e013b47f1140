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

//! Owned storage of every sprite and model type.

use crate::sprite::{ModelType, SpriteType};

/// Sprite and model types addressed by the index returned when adding them.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    sprite_types: Vec<SpriteType>,
    model_types: Vec<ModelType>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sprite type and returns its index.
    pub fn add_sprite_type(&mut self, sprite_type: SpriteType) -> usize {
        self.sprite_types.push(sprite_type);
        self.sprite_types.len() - 1
    }

    /// Adds a model type and returns its index.
    pub fn add_model_type(&mut self, model_type: ModelType) -> usize {
        self.model_types.push(model_type);
        self.model_types.len() - 1
    }

    /// Returns a sprite type.
    ///
    /// # Panics
    /// Panics if no sprite type has this index.
    pub fn sprite_type(&self, index: usize) -> &SpriteType {
        self.sprite_types.get(index).unwrap_or_else(|| {
            panic!(
                "Sprite type index {index} is out of range, {} types are registered",
                self.sprite_types.len()
            )
        })
    }

    /// Returns a model type.
    ///
    /// # Panics
    /// Panics if no model type has this index.
    pub fn model_type(&self, index: usize) -> &ModelType {
        self.model_types.get(index).unwrap_or_else(|| {
            panic!(
                "Model type index {index} is out of range, {} types are registered",
                self.model_types.len()
            )
        })
    }

    /// Number of sprite types.
    pub fn sprite_type_count(&self) -> usize {
        self.sprite_types.len()
    }

    /// Number of model types.
    pub fn model_type_count(&self) -> usize {
        self.model_types.len()
    }
}
