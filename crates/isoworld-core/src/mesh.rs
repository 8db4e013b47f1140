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

//! # Meshes
//!
//! [`Mesh`] is the editable polygon soup produced by loaders and consumed by the
//! bake pipeline. [`DenseModel`] is its flattened, render-ready form with
//! smoothed vertex normals, and [`ShadowMesh`] is the minimal indexed triangle
//! list used for shadow casting.

use crate::math::{Aabb, Vec3};

/// A corner of a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// Index into [`Mesh::points`].
    pub point: usize,
    /// Linear RGBA colour in `0.0..=1.0`.
    pub color: [f32; 4],
}

/// A convex polygon, triangulated as a fan from its first vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    /// Corners in counter-clockwise order seen from the front.
    pub vertices: Vec<MeshVertex>,
}

/// Points shared by polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Point positions in tiles.
    pub points: Vec<Vec3>,
    /// Faces referencing `points`.
    pub polygons: Vec<Polygon>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point and returns its index.
    pub fn add_point(&mut self, position: Vec3) -> usize {
        self.points.push(position);
        self.points.len() - 1
    }

    /// Adds a single-coloured triangle and returns the polygon index.
    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize, color: [f32; 4]) -> usize {
        let vertices = [a, b, c]
            .into_iter()
            .map(|point| MeshVertex { point, color })
            .collect();
        self.add_polygon(Polygon { vertices })
    }

    /// Adds a polygon and returns its index.
    ///
    /// # Panics
    /// Panics if a vertex references a point that does not exist.
    pub fn add_polygon(&mut self, polygon: Polygon) -> usize {
        for vertex in &polygon.vertices {
            assert!(
                vertex.point < self.points.len(),
                "Polygon references point {} but the mesh has {} points",
                vertex.point,
                self.points.len()
            );
        }
        self.polygons.push(polygon);
        self.polygons.len() - 1
    }

    /// Builds a mesh from positions and triangle index triplets.
    pub fn from_triangles(points: Vec<Vec3>, indices: &[[usize; 3]], color: [f32; 4]) -> Self {
        let mut mesh = Self {
            points,
            polygons: Vec::with_capacity(indices.len()),
        };
        for &[a, b, c] in indices {
            mesh.add_triangle(a, b, c, color);
        }
        mesh
    }

    /// Bounding box of every point used by a polygon.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let used: Vec<Vec3> = self
            .polygons
            .iter()
            .flat_map(|polygon| polygon.vertices.iter().map(|v| self.points[v.point]))
            .collect();
        Aabb::from_points(&used)
    }

    /// Iterates over fan triangles as vertex triplets.
    pub fn triangles(&self) -> impl Iterator<Item = [&MeshVertex; 3]> + '_ {
        self.polygons.iter().flat_map(|polygon| {
            let vertices = &polygon.vertices;
            (2..vertices.len()).map(move |i| [&vertices[0], &vertices[i - 1], &vertices[i]])
        })
    }

    /// Area-weighted normal of a polygon, not normalized.
    fn polygon_normal(&self, polygon: &Polygon) -> Vec3 {
        let vertices = &polygon.vertices;
        let mut sum = Vec3::ZERO;
        for i in 2..vertices.len() {
            let a = self.points[vertices[0].point];
            let b = self.points[vertices[i - 1].point];
            let c = self.points[vertices[i].point];
            sum += (b - a).cross(c - a);
        }
        sum
    }
}

/// A triangle list used only for depth rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowMesh {
    /// Positions in tiles relative to the owner's origin.
    pub points: Vec<Vec3>,
    /// Three indices per triangle.
    pub triangle_indices: Vec<u32>,
}

impl ShadowMesh {
    /// Builds a shadow mesh from flat `x, y, z` coordinates and index triplets.
    ///
    /// # Panics
    /// Panics if the coordinate count is not a multiple of three, the index count
    /// is not a multiple of three, or an index is out of range.
    pub fn from_flat_lists(coordinates: &[f32], indices: &[u32]) -> Self {
        assert!(
            coordinates.len() % 3 == 0,
            "Shadow mesh coordinate count {} is not a multiple of three",
            coordinates.len()
        );
        assert!(
            indices.len() % 3 == 0,
            "Shadow mesh index count {} is not a multiple of three",
            indices.len()
        );
        let points: Vec<Vec3> = coordinates
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect();
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= points.len()) {
            panic!(
                "Shadow mesh index {bad} is out of range for {} points",
                points.len()
            );
        }
        Self {
            points,
            triangle_indices: indices.to_vec(),
        }
    }

    /// Triangulates every polygon of a mesh.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let triangle_indices = mesh
            .triangles()
            .flat_map(|corners| corners.map(|v| v.point as u32))
            .collect();
        Self {
            points: mesh.points.clone(),
            triangle_indices,
        }
    }

    /// Flattens the points back into `x, y, z` coordinates.
    pub fn flat_points(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    /// Iterates over triangle corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangle_indices.chunks_exact(3).map(|t| {
            [
                self.points[t[0] as usize],
                self.points[t[1] as usize],
                self.points[t[2] as usize],
            ]
        })
    }
}

/// A vertex of a [`DenseTriangle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseVertex {
    /// RGB colour in `0.0..=255.0`.
    pub color: [f32; 3],
    /// Position in tiles.
    pub position: Vec3,
    /// Smoothed unit normal in model space.
    pub normal: Vec3,
}

/// A self-contained triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseTriangle {
    /// The three corners in counter-clockwise order seen from the front.
    pub vertices: [DenseVertex; 3],
}

/// A flat triangle array ready for the G-buffer rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseModel {
    /// Every triangle of the source mesh.
    pub triangles: Vec<DenseTriangle>,
    /// Bounds of every vertex position.
    pub bound: Aabb,
}

impl DenseModel {
    /// Flattens a mesh, averaging the face normals around every point.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut point_normals = vec![Vec3::ZERO; mesh.points.len()];
        for polygon in &mesh.polygons {
            let face_normal = mesh.polygon_normal(polygon).normalize();
            for vertex in &polygon.vertices {
                point_normals[vertex.point] += face_normal;
            }
        }
        for normal in &mut point_normals {
            *normal = normal.normalize();
        }

        let dense_vertex = |vertex: &MeshVertex| DenseVertex {
            color: [
                vertex.color[0] * 255.0,
                vertex.color[1] * 255.0,
                vertex.color[2] * 255.0,
            ],
            position: mesh.points[vertex.point],
            normal: point_normals[vertex.point],
        };
        let triangles: Vec<DenseTriangle> = mesh
            .triangles()
            .map(|corners| DenseTriangle {
                vertices: corners.map(|vertex| dense_vertex(vertex)),
            })
            .collect();
        let bound = mesh.bounding_box().unwrap_or(Aabb::INVALID);
        Self { triangles, bound }
    }

    /// Returns `true` if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    fn unit_quad() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.add_point(Vec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_point(Vec3::new(1.0, 0.0, 0.0));
        let c = mesh.add_point(Vec3::new(1.0, 1.0, 0.0));
        let d = mesh.add_point(Vec3::new(0.0, 1.0, 0.0));
        mesh.add_polygon(Polygon {
            vertices: [a, b, c, d]
                .into_iter()
                .map(|point| MeshVertex { point, color: WHITE })
                .collect(),
        });
        mesh
    }

    #[test]
    fn test_fan_triangulation() {
        let mesh = unit_quad();
        let triangles: Vec<[usize; 3]> = mesh
            .triangles()
            .map(|t| t.map(|v| v.point))
            .collect();
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
        let shadow = ShadowMesh::from_mesh(&mesh);
        assert_eq!(shadow.triangle_indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(shadow.triangle_count(), 2);
    }

    #[test]
    fn test_dense_model_flat_normals() {
        let model = DenseModel::from_mesh(&unit_quad());
        assert_eq!(model.triangles.len(), 2);
        for triangle in &model.triangles {
            for vertex in &triangle.vertices {
                assert_abs_diff_eq!(vertex.normal.z, 1.0, epsilon = 1e-6);
                assert_eq!(vertex.color, [255.0, 255.0, 255.0]);
            }
        }
        assert_eq!(model.bound.min, Vec3::ZERO);
        assert_eq!(model.bound.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_dense_model_smooths_shared_points() {
        // Two faces meeting at a right angle along the x axis.
        let mut mesh = Mesh::new();
        let a = mesh.add_point(Vec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_point(Vec3::new(1.0, 0.0, 0.0));
        let c = mesh.add_point(Vec3::new(0.0, 1.0, 0.0));
        let d = mesh.add_point(Vec3::new(0.0, 0.0, 1.0));
        mesh.add_triangle(a, b, c, WHITE);
        mesh.add_triangle(a, d, b, WHITE);
        let model = DenseModel::from_mesh(&mesh);
        let shared = model.triangles[0].vertices[0].normal;
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(shared.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(shared.y, half, epsilon = 1e-6);
        assert_abs_diff_eq!(shared.z, half, epsilon = 1e-6);
        let lone = model.triangles[0].vertices[2].normal;
        assert_abs_diff_eq!(lone.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shadow_mesh_from_flat_lists() {
        let shadow = ShadowMesh::from_flat_lists(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2],
        );
        assert_eq!(shadow.points.len(), 3);
        assert_eq!(shadow.flat_points()[3], 1.0);
        let triangle = shadow.triangles().next().expect("one triangle");
        assert_eq!(triangle[2], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "not a multiple of three")]
    fn test_shadow_mesh_rejects_partial_point() {
        ShadowMesh::from_flat_lists(&[0.0, 1.0], &[]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_shadow_mesh_rejects_bad_index() {
        ShadowMesh::from_flat_lists(&[0.0, 0.0, 0.0], &[0, 0, 1]);
    }
}
