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

//! Pixel buffers backing the G-buffers, background blocks and shadow maps.
//!
//! Colour-like channels use [`RgbaImage`] from the `image` crate and heights
//! use a single-channel `f32` buffer. Views into larger images are expressed as
//! clip rectangles rather than aliasing sub-images, so every kernel receives
//! the owning buffer plus the [`IRect`] it may touch.

use crate::math::IRect;
use ::image::{ImageBuffer, Luma, Pixel};

pub use ::image::{Rgba, RgbaImage};

/// A single-channel `f32` image.
pub type HeightImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Normal-map value of a pixel without any surface.
pub const NEUTRAL_NORMAL: [u8; 4] = [128, 128, 128, 255];

/// Fully transparent black.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Height stored where nothing has been drawn.
pub const NO_HEIGHT: f32 = f32::NEG_INFINITY;

/// Creates a height image filled with `value`.
pub fn create_height(width: u32, height: u32, value: f32) -> HeightImage {
    ImageBuffer::from_pixel(width, height, Luma([value]))
}

/// Returns the full bound of an image as a rectangle.
pub fn image_bound<P: Pixel>(image: &ImageBuffer<P, Vec<P::Subpixel>>) -> IRect {
    IRect::from_size(image.width() as i32, image.height() as i32)
}

/// Fills the part of `rect` inside the image with `value`.
pub fn fill_region<P: Pixel>(image: &mut ImageBuffer<P, Vec<P::Subpixel>>, rect: IRect, value: P) {
    let region = rect.intersection(&image_bound(image));
    if region.is_empty() {
        return;
    }
    let channels = P::CHANNEL_COUNT as usize;
    let stride = image.width() as usize * channels;
    let value = value.channels().to_vec();
    let data: &mut [P::Subpixel] = image;
    for y in region.top..region.bottom() {
        let row_start = y as usize * stride;
        let row = &mut data[row_start + region.left as usize * channels..row_start + region.right() as usize * channels];
        for pixel in row.chunks_exact_mut(channels) {
            pixel.copy_from_slice(&value);
        }
    }
}

/// Copies `source_rect` of `source` so that its upper-left corner lands on
/// `target_x`, `target_y` in `target`. Both sides are clipped.
pub fn copy_region<P: Pixel>(
    target: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    target_x: i32,
    target_y: i32,
    source: &ImageBuffer<P, Vec<P::Subpixel>>,
    source_rect: IRect,
) {
    let source_rect = source_rect.intersection(&image_bound(source));
    let offset_x = target_x - source_rect.left;
    let offset_y = target_y - source_rect.top;
    let target_rect = source_rect
        .offset(crate::math::IVec2::new(offset_x, offset_y))
        .intersection(&image_bound(target));
    if target_rect.is_empty() {
        return;
    }
    let channels = P::CHANNEL_COUNT as usize;
    let source_stride = source.width() as usize * channels;
    let target_stride = target.width() as usize * channels;
    let row_length = target_rect.width as usize * channels;
    let source_data: &[P::Subpixel] = source;
    let target_data: &mut [P::Subpixel] = target;
    for y in target_rect.top..target_rect.bottom() {
        let sx = (target_rect.left - offset_x) as usize;
        let sy = (y - offset_y) as usize;
        let s = sy * source_stride + sx * channels;
        let t = y as usize * target_stride + target_rect.left as usize * channels;
        target_data[t..t + row_length].copy_from_slice(&source_data[s..s + row_length]);
    }
}

/// The triple of deferred shading inputs: diffuse colour, normal and height.
///
/// All three images always share the same dimensions.
#[derive(Debug, Clone)]
pub struct GBuffer {
    /// Diffuse colour with coverage in alpha.
    pub diffuse: RgbaImage,
    /// Light-space normals encoded from `[-1, 1]` to `[0, 255]`.
    pub normal: RgbaImage,
    /// World height in tiles, [`NO_HEIGHT`] where empty.
    pub height: HeightImage,
}

impl GBuffer {
    /// Allocates a cleared G-buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            diffuse: RgbaImage::from_pixel(width, height, Rgba(TRANSPARENT)),
            normal: RgbaImage::from_pixel(width, height, Rgba(NEUTRAL_NORMAL)),
            height: create_height(width, height, NO_HEIGHT),
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.diffuse.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.diffuse.height()
    }

    /// The full bound of the buffers.
    #[inline]
    pub fn bound(&self) -> IRect {
        image_bound(&self.diffuse)
    }

    /// Panics when the three images disagree on their dimensions.
    pub fn assert_consistent(&self) {
        assert!(
            self.normal.dimensions() == self.diffuse.dimensions()
                && self.height.dimensions() == self.diffuse.dimensions(),
            "G-buffer dimension mismatch: diffuse {:?}, normal {:?}, height {:?}",
            self.diffuse.dimensions(),
            self.normal.dimensions(),
            self.height.dimensions()
        );
    }

    /// Resets normal and height, and the diffuse colour when `clear_diffuse` is set.
    ///
    /// Freshly allocated buffers are already transparent, so an initial build may
    /// skip the diffuse clear because kernels only write where their height wins.
    pub fn clear(&mut self, clear_diffuse: bool) {
        let bound = self.bound();
        if clear_diffuse {
            fill_region(&mut self.diffuse, bound, Rgba(TRANSPARENT));
        }
        fill_region(&mut self.normal, bound, Rgba(NEUTRAL_NORMAL));
        fill_region(&mut self.height, bound, Luma([NO_HEIGHT]));
    }

    /// Copies `source_rect` of another G-buffer to `target_x`, `target_y`.
    pub fn copy_region_from(&mut self, target_x: i32, target_y: i32, source: &GBuffer, source_rect: IRect) {
        copy_region(&mut self.diffuse, target_x, target_y, &source.diffuse, source_rect);
        copy_region(&mut self.normal, target_x, target_y, &source.normal, source_rect);
        copy_region(&mut self.height, target_x, target_y, &source.height, source_rect);
    }
}
