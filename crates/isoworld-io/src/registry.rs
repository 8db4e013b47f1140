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

//! Loading helpers on top of [`Registry`].

use crate::error::LoadError;
use crate::obj::load_obj_mesh;
use crate::sprite_atlas;
use isoworld_core::mesh::{Mesh, ShadowMesh};
use isoworld_core::{ModelType, Registry};
use std::path::Path;

/// Derives the shadow caster of a model that has no dedicated shadow mesh.
pub fn model_shadow_from_visible(visible: &Mesh) -> ShadowMesh {
    ShadowMesh::from_mesh(visible)
}

/// File and mesh loading for a [`Registry`].
pub trait RegistryLoadExt {
    /// Loads `<stem>.png` and `<stem>.ini` and returns the new sprite type index.
    fn load_sprite_type(&mut self, stem: &Path) -> Result<usize, LoadError>;

    /// Adds a sprite type from in-memory PNG bytes and INI text.
    fn load_sprite_type_from_parts(&mut self, png: &[u8], ini_text: &str)
        -> Result<usize, LoadError>;

    /// Adds a model type from meshes; the shadow caster defaults to the visible mesh.
    fn add_model_type_from_mesh(&mut self, visible: &Mesh, shadow: Option<&Mesh>) -> usize;

    /// Loads a model type from OBJ files.
    fn load_model_type_from_obj(
        &mut self,
        visible: &Path,
        shadow: Option<&Path>,
    ) -> Result<usize, LoadError>;
}

impl RegistryLoadExt for Registry {
    fn load_sprite_type(&mut self, stem: &Path) -> Result<usize, LoadError> {
        let sprite = sprite_atlas::load_sprite_type(stem)?;
        Ok(self.add_sprite_type(sprite))
    }

    fn load_sprite_type_from_parts(
        &mut self,
        png: &[u8],
        ini_text: &str,
    ) -> Result<usize, LoadError> {
        let sprite = sprite_atlas::load_sprite_type_from_parts(png, ini_text)?;
        Ok(self.add_sprite_type(sprite))
    }

    fn add_model_type_from_mesh(&mut self, visible: &Mesh, shadow: Option<&Mesh>) -> usize {
        let shadow = shadow.map_or_else(|| model_shadow_from_visible(visible), ShadowMesh::from_mesh);
        self.add_model_type(ModelType::new(visible, Some(shadow)))
    }

    fn load_model_type_from_obj(
        &mut self,
        visible: &Path,
        shadow: Option<&Path>,
    ) -> Result<usize, LoadError> {
        let visible_mesh = load_obj_mesh(visible)?;
        let shadow_mesh = shadow.map(load_obj_mesh).transpose()?;
        log::debug!(
            "Loaded model {} with {} polygons",
            visible.display(),
            visible_mesh.polygons.len()
        );
        Ok(self.add_model_type_from_mesh(&visible_mesh, shadow_mesh.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoworld_core::math::Vec3;

    fn triangle(y: f32) -> Mesh {
        Mesh::from_triangles(
            vec![Vec3::new(0.0, y, 0.0), Vec3::new(1.0, y, 0.0), Vec3::new(0.0, y, 1.0)],
            &[[0, 2, 1]],
            [1.0; 4],
        )
    }

    #[test]
    fn test_model_shadow_defaults_to_visible() {
        let mut registry = Registry::new();
        let visible = triangle(0.0);
        let index = registry.add_model_type_from_mesh(&visible, None);
        assert_eq!(index, 0);
        let shadow = registry.model_type(0).shadow_mesh.as_ref().expect("derived shadow");
        assert_eq!(shadow.points, visible.points);

        let other = triangle(2.0);
        let index = registry.add_model_type_from_mesh(&visible, Some(&other));
        assert_eq!(index, 1);
        let shadow = registry.model_type(1).shadow_mesh.as_ref().expect("given shadow");
        assert_eq!(shadow.points[0].y, 2.0);
    }

    #[test]
    fn test_load_model_from_obj_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").expect("write obj");
        let mut registry = Registry::new();
        let index = registry.load_model_type_from_obj(&path, None).expect("load obj");
        assert_eq!(registry.model_type_count(), 1);
        assert_eq!(registry.model_type(index).visible.triangles.len(), 1);
        assert!(registry
            .load_model_type_from_obj(&dir.path().join("missing.obj"), None)
            .is_err());
        assert_eq!(registry.model_type_count(), 1);
    }
}
