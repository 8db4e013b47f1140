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

//! Pixel-exact orthogonal projections for the eight fixed camera directions.
//!
//! An [`OrthoSystem`] is built once from a camera tilt and a tile size in
//! pixels. Each of its eight [`OrthoView`]s maps world positions to screen
//! pixels with integer axes, so that moving anything by a whole tile moves
//! its image by exactly the same pixel offset every time.
//!
//! Three spaces are involved:
//! - **World space** in tiles: x and z span the ground plane, y points up.
//! - **Screen-depth space**: pixel x, pixel y (growing downwards) and the world
//!   height in tiles. Along one pixel ray a larger height is closer to the
//!   camera, so the height doubles as the depth test value.
//! - **Light space**: world space rotated with the camera, with x pointing to
//!   screen-right, y up and z towards the viewer. G-buffer normals and light
//!   positions live here.

use crate::math::{degrees_to_radians, IAabb, IRect, IVec2, IVec3, Mat2, Mat3, Vec2, Vec3};
use crate::units::{floating_to_mini, MINI_PER_TILE};
use std::fmt;

/// Number of views in an [`OrthoSystem`].
pub const VIEW_COUNT: usize = 8;

/// Compass angle in degrees of each view, in view index order.
pub const VIEW_DIRECTION_DEGREES: [i32; VIEW_COUNT] = [315, 45, 135, 225, 0, 90, 180, 270];

/// An error raised when projection parameters cannot produce usable views.
#[derive(Debug, Clone, PartialEq)]
pub enum OrthoError {
    /// The tile size in pixels was zero, negative or not finite.
    InvalidPixelsPerTile(f32),
    /// The tilt must look downwards (strictly negative).
    InvalidCameraTilt(f32),
    /// The integer pixel axes of a view are collinear.
    DegenerateAxes {
        /// The index of the failing view.
        view: usize,
        /// The truncated X axis.
        x_axis: IVec2,
        /// The truncated Z axis.
        z_axis: IVec2,
    },
}

impl fmt::Display for OrthoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrthoError::InvalidPixelsPerTile(value) => {
                write!(f, "Pixels per tile must be positive and finite, got {value}")
            }
            OrthoError::InvalidCameraTilt(value) => {
                write!(f, "Camera tilt must be negative to look down, got {value}")
            }
            OrthoError::DegenerateAxes {
                view,
                x_axis,
                z_axis,
            } => write!(
                f,
                "View {view} has collinear pixel axes X {x_axis:?} and Z {z_axis:?}"
            ),
        }
    }
}

impl std::error::Error for OrthoError {}

/// The projection and its inverses for one camera direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoView {
    /// The index of this view inside its system, used to key cached blocks.
    pub id: i32,
    /// The compass direction of the camera as a direction index (`degrees / 45`).
    pub world_direction: i32,
    /// Rotates light-space normals into world space.
    pub normal_to_world_space: Mat3,
    /// Screen offset caused by moving one tile along world X.
    pub pixel_offset_per_tile_x: IVec2,
    /// Screen offset caused by moving one tile along world Z.
    pub pixel_offset_per_tile_z: IVec2,
    /// Screen pixels moved upwards by one tile of world height.
    pub y_pixels_per_tile: f32,
    /// Maps world tiles to screen-depth space relative to the world centre.
    pub world_space_to_screen_depth: Mat3,
    /// Inverse of `world_space_to_screen_depth`.
    pub screen_depth_to_world_space: Mat3,
    /// Maps screen-depth space directly to light space.
    pub screen_depth_to_light_space: Mat3,
    /// Inverse of `screen_depth_to_light_space`.
    pub light_space_to_screen_depth: Mat3,
    ground_pixel_to_tiles: Mat2,
}

impl OrthoView {
    fn new(index: usize, camera_tilt: f32, pixels_per_tile: f32) -> Result<Self, OrthoError> {
        let degrees = VIEW_DIRECTION_DEGREES[index];
        let angle = degrees_to_radians(degrees as f32);
        let (sin_a, cos_a) = angle.sin_cos();
        // Horizontal camera forward and screen-right on the ground plane.
        let forward = Vec3::new(sin_a, 0.0, cos_a);
        let right = forward.cross(Vec3::Y);
        let (sin_pitch, cos_pitch) = if camera_tilt.is_infinite() {
            (1.0, 0.0)
        } else {
            let length = (camera_tilt * camera_tilt + 1.0).sqrt();
            (-camera_tilt / length, 1.0 / length)
        };

        // Provisional floating projection of the ground axes, truncated to whole pixels.
        let project_ground = |axis: Vec3| -> IVec2 {
            let screen_x = pixels_per_tile * right.dot(axis);
            let screen_y = -pixels_per_tile * sin_pitch * forward.dot(axis);
            IVec2::new(screen_x as i32, screen_y as i32)
        };
        let x_axis = project_ground(Vec3::X);
        let z_axis = project_ground(Vec3::Z);
        let y_pixels_per_tile = pixels_per_tile * cos_pitch;

        let ground = Mat2::from_cols(x_axis.as_vec2(), z_axis.as_vec2());
        let ground_pixel_to_tiles = ground.inverse().ok_or(OrthoError::DegenerateAxes {
            view: index,
            x_axis,
            z_axis,
        })?;

        let world_space_to_screen_depth = Mat3::from_cols(
            Vec3::new(x_axis.x as f32, x_axis.y as f32, 0.0),
            Vec3::new(0.0, -y_pixels_per_tile, 1.0),
            Vec3::new(z_axis.x as f32, z_axis.y as f32, 0.0),
        );
        let screen_depth_to_world_space =
            world_space_to_screen_depth
                .inverse()
                .ok_or(OrthoError::DegenerateAxes {
                    view: index,
                    x_axis,
                    z_axis,
                })?;

        // x = screen-right, y = up, z = towards the viewer.
        let normal_to_world_space = Mat3::from_cols(right, Vec3::Y, -forward);
        let world_to_light = normal_to_world_space.transpose();

        Ok(Self {
            id: index as i32,
            world_direction: degrees / 45,
            normal_to_world_space,
            pixel_offset_per_tile_x: x_axis,
            pixel_offset_per_tile_z: z_axis,
            y_pixels_per_tile,
            world_space_to_screen_depth,
            screen_depth_to_world_space,
            screen_depth_to_light_space: world_to_light * screen_depth_to_world_space,
            light_space_to_screen_depth: world_space_to_screen_depth * normal_to_world_space,
            ground_pixel_to_tiles,
        })
    }

    /// Projects a mini-tile offset to a pixel offset.
    ///
    /// The ground axes use exact integer arithmetic, so one tile along X yields
    /// exactly `pixel_offset_per_tile_x`.
    pub fn offset_to_screen_pixel(&self, mini_offset: IVec3) -> IVec2 {
        let x = self.pixel_offset_per_tile_x.x as i64 * mini_offset.x as i64
            + self.pixel_offset_per_tile_z.x as i64 * mini_offset.z as i64;
        let y = self.pixel_offset_per_tile_x.y as i64 * mini_offset.x as i64
            + self.pixel_offset_per_tile_z.y as i64 * mini_offset.z as i64;
        let mini = MINI_PER_TILE as i64;
        let lift = (mini_offset.y as f64 * self.y_pixels_per_tile as f64 / mini as f64).floor() as i64;
        IVec2::new(x.div_euclid(mini) as i32, (y.div_euclid(mini) - lift) as i32)
    }

    /// Projects a mini-tile position to a pixel, given the pixel of the world origin.
    #[inline]
    pub fn position_to_screen_pixel(&self, position: IVec3, world_centre: IVec2) -> IVec2 {
        self.offset_to_screen_pixel(position) + world_centre
    }

    /// Converts a pixel offset into a mini-tile offset on the ground plane (y = 0).
    ///
    /// Only the X and Z axes are inverted, so picking anything above or below the
    /// ground is an approximation.
    pub fn pixel_to_mini_offset(&self, pixel_offset: IVec2) -> IVec3 {
        let tiles = self.ground_pixel_to_tiles * pixel_offset.as_vec2();
        IVec3::new(floating_to_mini(tiles.x), 0, floating_to_mini(tiles.y))
    }

    /// Converts a pixel into a mini-tile ground position, given the pixel of the world origin.
    #[inline]
    pub fn pixel_to_mini_position(&self, pixel: IVec2, world_centre: IVec2) -> IVec3 {
        self.pixel_to_mini_offset(pixel - world_centre)
    }

    /// Projects a world position in tiles to screen-depth space.
    #[inline]
    pub fn tiles_to_screen_depth(&self, position: Vec3, world_centre: IVec2) -> Vec3 {
        self.world_space_to_screen_depth * position
            + Vec3::new(world_centre.x as f32, world_centre.y as f32, 0.0)
    }

    /// Bounding pixel rectangle of the projection of a mini-tile box.
    ///
    /// The rectangle is grown by one pixel on each side to absorb rounding
    /// between integer and floating projections.
    pub fn project_box(&self, bound: &IAabb, world_centre: IVec2) -> IRect {
        let mut min = IVec2::new(i32::MAX, i32::MAX);
        let mut max = IVec2::new(i32::MIN, i32::MIN);
        for corner in bound.corners() {
            let pixel = self.position_to_screen_pixel(corner, world_centre);
            min = IVec2::new(min.x.min(pixel.x), min.y.min(pixel.y));
            max = IVec2::new(max.x.max(pixel.x), max.y.max(pixel.y));
        }
        IRect::from_bounds(min.x - 1, min.y - 1, max.x + 2, max.y + 2)
    }

    /// Rotates a world direction into light space.
    #[inline]
    pub fn world_to_light(&self, direction: Vec3) -> Vec3 {
        self.normal_to_world_space.transpose() * direction
    }

    /// The ground-plane pixel axes as a floating matrix.
    pub fn ground_axes(&self) -> Mat2 {
        Mat2::from_cols(
            Vec2::new(self.pixel_offset_per_tile_x.x as f32, self.pixel_offset_per_tile_x.y as f32),
            Vec2::new(self.pixel_offset_per_tile_z.x as f32, self.pixel_offset_per_tile_z.y as f32),
        )
    }
}

/// The eight fixed-angle orthogonal views sharing one tilt and tile size.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoSystem {
    camera_tilt: f32,
    pixels_per_tile: f32,
    views: Vec<OrthoView>,
}

impl OrthoSystem {
    /// Builds all eight views.
    ///
    /// `camera_tilt` is the slope of the view direction: negative infinity looks
    /// straight down and values close to zero approach a horizontal camera.
    pub fn new(camera_tilt: f32, pixels_per_tile: f32) -> Result<Self, OrthoError> {
        if !(pixels_per_tile.is_finite() && pixels_per_tile > 0.0) {
            return Err(OrthoError::InvalidPixelsPerTile(pixels_per_tile));
        }
        if camera_tilt.is_nan() || camera_tilt >= 0.0 {
            return Err(OrthoError::InvalidCameraTilt(camera_tilt));
        }
        let views = (0..VIEW_COUNT)
            .map(|index| OrthoView::new(index, camera_tilt, pixels_per_tile))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "Built ortho system: tilt {camera_tilt}, {pixels_per_tile} pixels per tile"
        );
        Ok(Self {
            camera_tilt,
            pixels_per_tile,
            views,
        })
    }

    /// The slope the system was built from.
    pub fn camera_tilt(&self) -> f32 {
        self.camera_tilt
    }

    /// The tile size in pixels the system was built from.
    pub fn pixels_per_tile(&self) -> f32 {
        self.pixels_per_tile
    }

    /// Returns a view by index.
    ///
    /// # Panics
    /// Panics if `index` is not in `0..8`.
    pub fn view(&self, index: usize) -> &OrthoView {
        assert!(
            index < VIEW_COUNT,
            "Ortho view index {index} is out of range 0..{VIEW_COUNT}"
        );
        &self.views[index]
    }

    /// Iterates over all views in index order.
    pub fn views(&self) -> impl Iterator<Item = &OrthoView> {
        self.views.iter()
    }

    /// See [`OrthoView::offset_to_screen_pixel`].
    pub fn offset_to_screen_pixel(&self, view: usize, mini_offset: IVec3) -> IVec2 {
        self.view(view).offset_to_screen_pixel(mini_offset)
    }

    /// See [`OrthoView::position_to_screen_pixel`].
    pub fn position_to_screen_pixel(&self, view: usize, position: IVec3, world_centre: IVec2) -> IVec2 {
        self.view(view).position_to_screen_pixel(position, world_centre)
    }

    /// See [`OrthoView::pixel_to_mini_offset`].
    pub fn pixel_to_mini_offset(&self, view: usize, pixel_offset: IVec2) -> IVec3 {
        self.view(view).pixel_to_mini_offset(pixel_offset)
    }

    /// See [`OrthoView::pixel_to_mini_position`].
    pub fn pixel_to_mini_position(&self, view: usize, pixel: IVec2, world_centre: IVec2) -> IVec3 {
        self.view(view).pixel_to_mini_position(pixel, world_centre)
    }
}
