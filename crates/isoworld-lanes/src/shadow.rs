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

//! # Shadow Cube Maps
//!
//! A point light's occluders are rendered into six square faces stacked
//! vertically in one `f32` image. Each face is a 90 degree perspective view
//! from the light along one light-space axis. Faces store reciprocal depth,
//! cleared to 0 for "nothing", and the closest surface keeps the largest value.

use isoworld_core::image::{create_height, fill_region, image_bound, HeightImage};
use isoworld_core::math::{Mat3, Vec3};
use isoworld_core::mesh::ShadowMesh;
use image::Luma;

/// Surfaces closer than this to the light, in tiles, are clipped away.
pub const NEAR_PLANE: f32 = 0.01;

/// Relative reciprocal-depth margin before a surface counts as occluded.
pub const SHADOW_BIAS: f32 = 0.04;

/// One face of a shadow cube, named by the light-space axis it looks along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    /// Looking along +X.
    PositiveX,
    /// Looking along -X.
    NegativeX,
    /// Looking along +Y, with +Z as up.
    PositiveY,
    /// Looking along -Y, with -Z as up.
    NegativeY,
    /// Looking along +Z.
    PositiveZ,
    /// Looking along -Z.
    NegativeZ,
}

impl CubeFace {
    /// Every face in storage order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Vertical slot of the face inside the cube image.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Camera basis of the face as `(right, up, forward)`.
    fn basis(self) -> (Vec3, Vec3, Vec3) {
        let (up, forward) = match self {
            CubeFace::PositiveX => (Vec3::Y, Vec3::X),
            CubeFace::NegativeX => (Vec3::Y, -Vec3::X),
            CubeFace::PositiveY => (Vec3::Z, Vec3::Y),
            CubeFace::NegativeY => (-Vec3::Z, -Vec3::Y),
            CubeFace::PositiveZ => (Vec3::Y, Vec3::Z),
            CubeFace::NegativeZ => (Vec3::Y, -Vec3::Z),
        };
        (forward.cross(up), up, forward)
    }

    /// The face whose frustum contains a direction.
    pub fn dominant(direction: Vec3) -> CubeFace {
        let a = direction.abs();
        if a.x >= a.y && a.x >= a.z {
            if direction.x >= 0.0 {
                CubeFace::PositiveX
            } else {
                CubeFace::NegativeX
            }
        } else if a.y >= a.z {
            if direction.y >= 0.0 {
                CubeFace::PositiveY
            } else {
                CubeFace::NegativeY
            }
        } else if direction.z >= 0.0 {
            CubeFace::PositiveZ
        } else {
            CubeFace::NegativeZ
        }
    }
}

/// A point in face camera space: `(right, up, depth)`.
#[inline]
fn to_face_space(basis: &(Vec3, Vec3, Vec3), point: Vec3) -> Vec3 {
    Vec3::new(basis.0.dot(point), basis.1.dot(point), basis.2.dot(point))
}

/// Clips a polygon against `depth >= NEAR_PLANE`.
fn clip_near(polygon: &[Vec3]) -> Vec<Vec3> {
    let mut output = Vec::with_capacity(polygon.len() + 1);
    for (i, &current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let current_inside = current.z >= NEAR_PLANE;
        let next_inside = next.z >= NEAR_PLANE;
        if current_inside {
            output.push(current);
        }
        if current_inside != next_inside {
            let t = (NEAR_PLANE - current.z) / (next.z - current.z);
            output.push(Vec3::lerp(current, next, t));
        }
    }
    output
}

/// Reusable six-face reciprocal-depth buffer.
#[derive(Debug, Clone)]
pub struct ShadowCube {
    resolution: u32,
    depth: HeightImage,
}

impl ShadowCube {
    /// Allocates a cleared cube with square faces of `resolution` pixels.
    ///
    /// # Panics
    /// Panics if `resolution` is zero.
    pub fn new(resolution: u32) -> Self {
        assert!(resolution > 0, "Shadow cube resolution must be positive");
        log::trace!("ShadowCube: allocating six {resolution}x{resolution} faces");
        Self {
            resolution,
            depth: create_height(resolution, resolution * 6, 0.0),
        }
    }

    /// Side length of one face in pixels.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// The stacked faces.
    pub fn depth(&self) -> &HeightImage {
        &self.depth
    }

    /// Resets every face to "no occluder".
    pub fn clear(&mut self) {
        let bound = image_bound(&self.depth);
        fill_region(&mut self.depth, bound, Luma([0.0]));
    }

    /// Renders an occluder into all six faces.
    ///
    /// Mesh points are mapped to light space relative to the light by
    /// `model_to_light * point + offset`.
    pub fn render_caster(&mut self, mesh: &ShadowMesh, model_to_light: Mat3, offset: Vec3) {
        for face in CubeFace::ALL {
            self.render_depth_face(face, mesh, model_to_light, offset);
        }
    }

    /// Renders an occluder into one face.
    pub fn render_depth_face(
        &mut self,
        face: CubeFace,
        mesh: &ShadowMesh,
        model_to_light: Mat3,
        offset: Vec3,
    ) {
        let basis = face.basis();
        let res = self.resolution as f32;
        let row_offset = face.index() * self.resolution as usize;
        for corners in mesh.triangles() {
            let camera = corners.map(|p| to_face_space(&basis, model_to_light * p + offset));
            if camera.iter().all(|p| p.z < NEAR_PLANE) {
                continue;
            }
            // Entirely outside one side plane of the 90 degree frustum.
            if camera.iter().all(|p| p.x > p.z)
                || camera.iter().all(|p| -p.x > p.z)
                || camera.iter().all(|p| p.y > p.z)
                || camera.iter().all(|p| -p.y > p.z)
            {
                continue;
            }
            let clipped = clip_near(&camera);
            // Screen x grows right, y grows down; z holds reciprocal depth.
            let projected: Vec<Vec3> = clipped
                .iter()
                .map(|p| {
                    let w = 1.0 / p.z;
                    Vec3::new((p.x * w * 0.5 + 0.5) * res, (0.5 - p.y * w * 0.5) * res, w)
                })
                .collect();
            for i in 2..projected.len() {
                self.rasterize(row_offset, projected[0], projected[i - 1], projected[i]);
            }
        }
    }

    /// Writes the maximum reciprocal depth of a screen triangle, both windings.
    fn rasterize(&mut self, row_offset: usize, a: Vec3, b: Vec3, c: Vec3) {
        let res = self.resolution as i32;
        let abx = b.x - a.x;
        let aby = b.y - a.y;
        let acx = c.x - a.x;
        let acy = c.y - a.y;
        let det = abx * acy - aby * acx;
        if det == 0.0 || !det.is_finite() {
            return;
        }
        let inv_det = 1.0 / det;
        let left = (a.x.min(b.x).min(c.x).floor() as i32).max(0);
        let top = (a.y.min(b.y).min(c.y).floor() as i32).max(0);
        let right = (a.x.max(b.x).max(c.x).ceil() as i32).min(res);
        let bottom = (a.y.max(b.y).max(c.y).ceil() as i32).min(res);
        let width = self.resolution as usize;
        let data: &mut [f32] = &mut self.depth;
        for y in top..bottom {
            let row = (row_offset + y as usize) * width;
            for x in left..right {
                let px = x as f32 + 0.5 - a.x;
                let py = y as f32 + 0.5 - a.y;
                let wb = (px * acy - py * acx) * inv_det;
                let wc = (abx * py - aby * px) * inv_det;
                let wa = 1.0 - wb - wc;
                if wa < -1e-5 || wb < -1e-5 || wc < -1e-5 {
                    continue;
                }
                let w = a.z * wa + b.z * wb + c.z * wc;
                let stored = &mut data[row + x as usize];
                if w > *stored {
                    *stored = w;
                }
            }
        }
    }

    /// Visibility of a light-space point relative to the light: 1 when lit, 0 when occluded.
    pub fn sample_visibility(&self, point: Vec3) -> f32 {
        let face = CubeFace::dominant(point);
        let camera = to_face_space(&face.basis(), point);
        if camera.z < NEAR_PLANE {
            return 1.0;
        }
        let w = 1.0 / camera.z;
        let res = self.resolution as i32;
        let x = (((camera.x * w * 0.5 + 0.5) * res as f32).floor() as i32).clamp(0, res - 1);
        let y = (((0.5 - camera.y * w * 0.5) * res as f32).floor() as i32).clamp(0, res - 1);
        let row = face.index() as u32 * self.resolution + y as u32;
        let occluder = self.depth.get_pixel(x as u32, row).0[0];
        if occluder > w * (1.0 + SHADOW_BIAS) {
            0.0
        } else {
            1.0
        }
    }
}
