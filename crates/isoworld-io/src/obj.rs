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

//! OBJ loading into [`Mesh`] values.

use crate::error::LoadError;
use isoworld_core::math::Vec3;
use isoworld_core::mesh::{Mesh, MeshVertex, Polygon};
use std::path::Path;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Parses OBJ text, merging every object into one mesh.
///
/// Material libraries are ignored. Vertex colours written after the position
/// (`v x y z r g b`) are kept, other vertices are white.
pub fn mesh_from_obj_text(text: &str) -> Result<Mesh, LoadError> {
    let (models, _materials) = tobj::load_obj_buf(
        &mut std::io::Cursor::new(text),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )?;

    let mut mesh = Mesh::new();
    for model in &models {
        let source = &model.mesh;
        let first_point = mesh.points.len();
        let has_colors = source.vertex_color.len() == source.positions.len();
        for p in source.positions.chunks_exact(3) {
            mesh.add_point(Vec3::new(p[0], p[1], p[2]));
        }
        let color_of = |index: usize| {
            if has_colors {
                let c = &source.vertex_color[index * 3..index * 3 + 3];
                [c[0], c[1], c[2], 1.0]
            } else {
                WHITE
            }
        };
        for triangle in source.indices.chunks_exact(3) {
            let vertices = triangle
                .iter()
                .map(|&index| MeshVertex {
                    point: first_point + index as usize,
                    color: color_of(index as usize),
                })
                .collect();
            mesh.add_polygon(Polygon { vertices });
        }
    }
    log::debug!(
        "Parsed OBJ with {} objects, {} points and {} triangles",
        models.len(),
        mesh.points.len(),
        mesh.polygons.len()
    );
    Ok(mesh)
}

/// Reads and parses an OBJ file.
pub fn load_obj_mesh(path: &Path) -> Result<Mesh, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    mesh_from_obj_text(&text)
}
