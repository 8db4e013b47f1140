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

//! Defines the `Mat2` and `Mat3` types and associated operations.

use super::{Vec2, Vec3, EPSILON};
use std::ops::{Index, Mul};

// --- Mat2 ---

/// A 2x2 column-major matrix.
///
/// Used where two screen axes must be inverted, such as recovering barycentric
/// weights from a pixel offset or ground-plane positions from a pixel delta.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat2 {
    /// The columns of the matrix.
    pub cols: [Vec2; 2],
}

impl Mat2 {
    /// The 2x2 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
    };

    /// Creates a new matrix from two column vectors.
    #[inline]
    pub fn from_cols(c0: Vec2, c1: Vec2) -> Self {
        Self { cols: [c0, c1] }
    }

    /// Computes the determinant of the matrix.
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.cols[0].x * self.cols[1].y - self.cols[1].x * self.cols[0].y
    }

    /// Computes the inverse of the matrix, or `None` when it is singular.
    ///
    /// Unlike [`Mat3::inverse`] the singularity test is exact, because the
    /// columns are often tiny pixel edges whose determinant is legitimately small.
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self::from_cols(
            Vec2::new(self.cols[1].y * inv_det, -self.cols[0].y * inv_det),
            Vec2::new(-self.cols[1].x * inv_det, self.cols[0].x * inv_det),
        ))
    }
}

impl Default for Mat2 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec2> for Mat2 {
    type Output = Vec2;
    /// Transforms a `Vec2` by this matrix.
    #[inline]
    fn mul(self, v: Vec2) -> Self::Output {
        self.cols[0] * v.x + self.cols[1] * v.y
    }
}

// --- Mat3 ---

/// A 3x3 column-major matrix.
///
/// Used both for rotations (model orientation, light space) and for the
/// affine-free world to screen-depth projection of an orthogonal view.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    /// The 3x3 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    /// A 3x3 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec3::ZERO; 3],
    };

    /// Creates a new matrix from three column vectors.
    #[inline]
    pub fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Returns a row of the matrix as a `Vec3`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec3 {
        Vec3 {
            x: self.cols[0].get(index),
            y: self.cols[1].get(index),
            z: self.cols[2].get(index),
        }
    }

    /// Creates a 3D scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            cols: [
                Vec3::new(scale.x, 0.0, 0.0),
                Vec3::new(0.0, scale.y, 0.0),
                Vec3::new(0.0, 0.0, scale.z),
            ],
        }
    }

    /// Creates a matrix for a right-handed rotation around the Y-axis.
    ///
    /// # Arguments
    ///
    /// * `angle_radians`: The angle of rotation in radians.
    #[inline]
    pub fn from_rotation_y(angle_radians: f32) -> Self {
        let (s, c) = angle_radians.sin_cos();
        Self {
            cols: [
                Vec3::new(c, 0.0, -s),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(s, 0.0, c),
            ],
        }
    }

    /// Creates a rotation matrix from a normalized axis and an angle.
    ///
    /// # Arguments
    ///
    /// * `axis`: The axis of rotation. Must be a unit vector.
    /// * `angle_radians`: The angle of rotation in radians.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let (s, c) = angle_radians.sin_cos();
        let t = 1.0 - c;
        let x = axis.x;
        let y = axis.y;
        let z = axis.z;
        Self {
            cols: [
                Vec3::new(t * x * x + c, t * x * y + s * z, t * x * z - s * y),
                Vec3::new(t * y * x - s * z, t * y * y + c, t * y * z + s * x),
                Vec3::new(t * z * x + s * y, t * z * y - s * x, t * z * z + c),
            ],
        }
    }

    /// Computes the determinant of the matrix.
    #[inline]
    pub fn determinant(&self) -> f32 {
        let c0 = self.cols[0];
        let c1 = self.cols[1];
        let c2 = self.cols[2];
        c0.x * (c1.y * c2.z - c2.y * c1.z) - c1.x * (c0.y * c2.z - c2.y * c0.z)
            + c2.x * (c0.y * c1.z - c1.y * c0.z)
    }

    /// Returns the transpose of the matrix, where rows and columns are swapped.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            Vec3::new(self.cols[0].x, self.cols[1].x, self.cols[2].x),
            Vec3::new(self.cols[0].y, self.cols[1].y, self.cols[2].y),
            Vec3::new(self.cols[0].z, self.cols[1].z, self.cols[2].z),
        )
    }

    /// Computes the inverse of the matrix.
    ///
    /// If the matrix is not invertible (i.e., its determinant is close to zero),
    /// this method returns `None`.
    pub fn inverse(&self) -> Option<Self> {
        let c0 = self.cols[0];
        let c1 = self.cols[1];
        let c2 = self.cols[2];
        let m00 = c1.y * c2.z - c2.y * c1.z;
        let m10 = c2.y * c0.z - c0.y * c2.z;
        let m20 = c0.y * c1.z - c1.y * c0.z;
        let det = c0.x * m00 + c1.x * m10 + c2.x * m20;

        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let m01 = c2.x * c1.z - c1.x * c2.z;
        let m11 = c0.x * c2.z - c2.x * c0.z;
        let m21 = c1.x * c0.z - c0.x * c1.z;
        let m02 = c1.x * c2.y - c2.x * c1.y;
        let m12 = c2.x * c0.y - c0.x * c2.y;
        let m22 = c0.x * c1.y - c1.x * c0.y;

        Some(Self::from_cols(
            Vec3::new(m00, m10, m20) * inv_det,
            Vec3::new(m01, m11, m21) * inv_det,
            Vec3::new(m02, m12, m22) * inv_det,
        ))
    }
}

impl Default for Mat3 {
    /// Returns the 3x3 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat3> for Mat3 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat3`.
    #[inline]
    fn mul(self, rhs: Mat3) -> Self::Output {
        Self::from_cols(self * rhs.cols[0], self * rhs.cols[1], self * rhs.cols[2])
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    /// Transforms a `Vec3` by this matrix.
    #[inline]
    fn mul(self, v: Vec3) -> Self::Output {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }
}

impl Index<usize> for Mat3 {
    type Output = Vec3;
    /// Allows accessing a matrix column by index.
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.cols[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, FRAC_PI_4, PI};

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn mat3_approx_eq(a: Mat3, b: Mat3) -> bool {
        vec3_approx_eq(a.cols[0], b.cols[0])
            && vec3_approx_eq(a.cols[1], b.cols[1])
            && vec3_approx_eq(a.cols[2], b.cols[2])
    }

    #[test]
    fn test_mat2_inverse() {
        let m = Mat2::from_cols(Vec2::new(2.0, 1.0), Vec2::new(-1.0, 3.0));
        let inv = m.inverse().expect("matrix is invertible");
        let v = Vec2::new(0.25, -4.0);
        let back = inv * (m * v);
        assert!(approx_eq(back.x, v.x) && approx_eq(back.y, v.y));
    }

    #[test]
    fn test_mat2_singular() {
        let m = Mat2::from_cols(Vec2::new(1.0, 2.0), Vec2::new(2.0, 4.0));
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_mat3_rotation_y() {
        let m = Mat3::from_rotation_y(PI / 2.0);
        assert!(vec3_approx_eq(m * Vec3::X, -Vec3::Z));
        assert!(vec3_approx_eq(m * Vec3::Z, Vec3::X));
        assert!(vec3_approx_eq(m * Vec3::Y, Vec3::Y));
    }

    #[test]
    fn test_mat3_inverse_and_transpose_of_rotation() {
        let m = Mat3::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), FRAC_PI_4);
        let inv = m.inverse().expect("rotation is invertible");
        assert!(mat3_approx_eq(inv, m.transpose()));
        assert!(mat3_approx_eq(m * inv, Mat3::IDENTITY));
    }

    #[test]
    fn test_mat3_singular() {
        let m = Mat3::from_cols(Vec3::X, Vec3::X, Vec3::Z);
        assert!(m.inverse().is_none());
        assert!(approx_eq(m.determinant(), 0.0));
    }

    #[test]
    fn test_mat3_get_row() {
        let m = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        assert_eq!(m.get_row(0), Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(m.get_row(2), Vec3::new(3.0, 6.0, 9.0));
    }
}
