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

//! # Sprite Bake
//!
//! Renders a mesh from every camera angle into a sprite atlas and its INI
//! side file. Baking is idempotent: files whose content would not change
//! are left untouched, so repeated bakes do not disturb version control or
//! file timestamps.

use crate::error::BakeError;
use crate::ini::ini_text_matches;
use crate::sprite_atlas::{atlas_paths, path_with_suffix, SpriteAtlasConfig, PROPERTY_COLUMNS};
use image::{ImageFormat, Luma, Rgba};
use isoworld_core::image::{copy_region, fill_region, image_bound, RgbaImage};
use isoworld_core::math::{Aabb, IRect, IVec2};
use isoworld_core::mesh::{DenseModel, Mesh, ShadowMesh};
use isoworld_core::ortho::VIEW_COUNT;
use isoworld_core::{GBuffer, OrthoSystem, Transform3D};
use isoworld_lanes::{draw_dense_model, Higher, NormalizedNormals};
use std::path::{Path, PathBuf};

/// Largest per-channel difference for which an existing atlas counts as unchanged.
pub const PNG_TOLERANCE: u8 = 2;

/// Largest numeric difference for which an existing INI file counts as unchanged.
pub const INI_TOLERANCE: f64 = 0.00002;

/// Height written before drawing, below anything a model can reach.
const HEIGHT_SENTINEL: f32 = -1.0e6;

/// What a successful bake wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeReport {
    /// The atlas path.
    pub png_path: PathBuf,
    /// The side file path.
    pub ini_path: PathBuf,
    /// `false` when the previous atlas was kept.
    pub png_written: bool,
    /// `false` when the previous side file was kept.
    pub ini_written: bool,
    /// Width of one frame after cropping.
    pub frame_width: u32,
    /// Height of one frame after cropping.
    pub frame_height: u32,
    /// Number of camera angles.
    pub frame_rows: u32,
}

/// Result of [`generate_sprite_from_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BakeOutcome {
    /// The atlas exists and matches the model.
    Baked(BakeReport),
    /// Nothing was written, with the reason.
    Skipped(String),
}

/// Image side length that holds the model from any angle, rounded up to even.
fn render_resolution(bound: &Aabb, pixels_per_tile: f32) -> u32 {
    let extent = bound.min.abs().max(bound.max.abs());
    let size = ((extent.x + extent.y + extent.z) * 2.0 * pixels_per_tile + 4.0).ceil() as u32;
    size + size % 2
}

/// Maps a height in `min_y..=max_y` to `0..=255`.
fn encode_height(height: f32, min_y: f32, max_y: f32) -> u8 {
    ((height - min_y) * 255.0 / (max_y - min_y)).round().clamp(0.0, 255.0) as u8
}

/// Bounding rectangle of the pixels with a non-zero alpha.
fn visible_bound(image: &RgbaImage) -> IRect {
    let mut bound = IRect::default();
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[3] != 0 {
            bound = bound.union(&IRect::new(x as i32, y as i32, 1, 1));
        }
    }
    bound
}

/// Renders one uncropped frame per angle.
fn render_frames(model: &DenseModel, ortho: &OrthoSystem, angles: usize, resolution: u32) -> Vec<GBuffer> {
    let centre = IVec2::new(resolution as i32 / 2, resolution as i32 / 2);
    (0..angles)
        .map(|angle| {
            let mut frame = GBuffer::new(resolution, resolution);
            let bound = frame.bound();
            fill_region(&mut frame.height, bound, Luma([HEIGHT_SENTINEL]));
            draw_dense_model::<Higher, NormalizedNormals>(
                &mut frame,
                None,
                ortho.view(angle),
                centre,
                model,
                &Transform3D::IDENTITY,
            );
            frame
        })
        .collect()
}

/// Encodes the height channel as grey with the colour's coverage in alpha.
fn height_image(frame: &GBuffer, min_y: f32, max_y: f32) -> RgbaImage {
    RgbaImage::from_fn(frame.width(), frame.height(), |x, y| {
        let alpha = frame.diffuse.get_pixel(x, y).0[3];
        if alpha == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let value = encode_height(frame.height.get_pixel(x, y).0[0], min_y, max_y);
        Rgba([value, value, value, alpha])
    })
}

/// Packs `crop` of every frame into rows of colour, height and normal.
fn build_atlas(frames: &[GBuffer], crop: IRect, min_y: f32, max_y: f32) -> RgbaImage {
    let (width, height) = (crop.width as u32, crop.height as u32);
    let mut atlas = RgbaImage::new(width * PROPERTY_COLUMNS, height * frames.len() as u32);
    for (row, frame) in frames.iter().enumerate() {
        let top = row as i32 * crop.height;
        let heights = height_image(frame, min_y, max_y);
        copy_region(&mut atlas, 0, top, &frame.diffuse, crop);
        copy_region(&mut atlas, crop.width, top, &heights, crop);
        copy_region(&mut atlas, crop.width * 2, top, &frame.normal, crop);
    }
    atlas
}

/// Returns `true` when an atlas at `path` matches `atlas` within [`PNG_TOLERANCE`].
fn png_matches(path: &Path, atlas: &RgbaImage) -> bool {
    let Ok(previous) = image::open(path) else {
        return false;
    };
    let previous = previous.to_rgba8();
    previous.dimensions() == atlas.dimensions()
        && previous
            .as_raw()
            .iter()
            .zip(atlas.as_raw())
            .all(|(a, b)| a.abs_diff(*b) <= PNG_TOLERANCE)
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> BakeError {
    let path = path.to_path_buf();
    move |source| BakeError::Io { path, source }
}

/// Bakes `visible` into `<target_stem>.png` and `<target_stem>.ini`.
///
/// Frame `i` of the atlas is seen through view `i` of `ortho`, for `angles`
/// views. A dedicated `shadow` mesh is stored in the side file. With `debug`
/// set, the uncropped renders are also written to `<target_stem>.debug.png`.
/// Degenerate input is reported as [`BakeOutcome::Skipped`] without touching
/// any file.
pub fn generate_sprite_from_model(
    visible: &Mesh,
    shadow: Option<&Mesh>,
    ortho: &OrthoSystem,
    target_stem: &Path,
    angles: usize,
    debug: bool,
) -> Result<BakeOutcome, BakeError> {
    let skip = |reason: String| {
        log::warn!("Skipping bake of {}: {reason}", target_stem.display());
        Ok(BakeOutcome::Skipped(reason))
    };
    if !(1..=VIEW_COUNT).contains(&angles) {
        return skip(format!("{angles} angles requested, expected 1 to {VIEW_COUNT}"));
    }
    let model = DenseModel::from_mesh(visible);
    if model.is_empty() {
        return skip("the mesh has no polygons".to_string());
    }
    let bound = model.bound;
    if bound.size().y <= 0.0 {
        return skip("the mesh has no height".to_string());
    }

    let resolution = render_resolution(&bound, ortho.pixels_per_tile());
    let frames = render_frames(&model, ortho, angles, resolution);
    let crop = frames
        .iter()
        .fold(IRect::default(), |crop, frame| crop.union(&visible_bound(&frame.diffuse)));
    if crop.is_empty() {
        return skip("the mesh covers no pixel from any angle".to_string());
    }

    if debug {
        let full = image_bound(&frames[0].diffuse);
        let debug_atlas = build_atlas(&frames, full, bound.min.y, bound.max.y);
        let debug_path = path_with_suffix(target_stem, "debug.png");
        debug_atlas.save_with_format(&debug_path, ImageFormat::Png)?;
        log::info!("Wrote debug render {}", debug_path.display());
    }

    let atlas = build_atlas(&frames, crop, bound.min.y, bound.max.y);
    let half = resolution as i32 / 2;
    let config = SpriteAtlasConfig {
        center: IVec2::new(half - crop.left, half - crop.top),
        frame_rows: angles as u32,
        property_columns: PROPERTY_COLUMNS,
        min_bound: bound.min,
        max_bound: bound.max,
        shadow: shadow.map(ShadowMesh::from_mesh),
    };
    let ini_text = config.to_ini();

    let (png_path, ini_path) = atlas_paths(target_stem);
    if let Some(parent) = png_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error(parent))?;
    }

    let png_written = !png_matches(&png_path, &atlas);
    if png_written {
        atlas.save_with_format(&png_path, ImageFormat::Png)?;
    }
    let ini_written = match std::fs::read_to_string(&ini_path) {
        Ok(previous) => !ini_text_matches(&previous, &ini_text, INI_TOLERANCE),
        Err(_) => true,
    };
    if ini_written {
        std::fs::write(&ini_path, &ini_text).map_err(write_error(&ini_path))?;
    }

    let report = BakeReport {
        png_path,
        ini_path,
        png_written,
        ini_written,
        frame_width: crop.width as u32,
        frame_height: crop.height as u32,
        frame_rows: angles as u32,
    };
    log::info!(
        "Baked {} ({} angles, {}x{} frames): atlas {}, side file {}",
        target_stem.display(),
        angles,
        report.frame_width,
        report.frame_height,
        if png_written { "written" } else { "unchanged" },
        if ini_written { "written" } else { "unchanged" },
    );
    Ok(BakeOutcome::Baked(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoworld_core::math::Vec3;

    #[test]
    fn test_render_resolution_is_even_and_covers_extent() {
        let bound = Aabb::from_min_max(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 1.0, 0.5));
        assert_eq!(render_resolution(&bound, 32.0), 132);
        let odd = Aabb::from_min_max(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(render_resolution(&odd, 1.5), 8);
    }

    #[test]
    fn test_encode_height_range() {
        assert_eq!(encode_height(0.0, 0.0, 2.0), 0);
        assert_eq!(encode_height(2.0, 0.0, 2.0), 255);
        assert_eq!(encode_height(1.0, 0.0, 2.0), 128);
        assert_eq!(encode_height(HEIGHT_SENTINEL, 0.0, 2.0), 0);
    }

    #[test]
    fn test_render_frames_start_at_sentinel_height() {
        let ortho = OrthoSystem::new(-0.5, 32.0).expect("valid ortho");
        let empty = DenseModel::from_mesh(&Mesh::new());
        let frames = render_frames(&empty, &ortho, 3, 8);
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.bound(), IRect::new(0, 0, 8, 8));
            assert!(frame.height.pixels().all(|p| p.0[0] == HEIGHT_SENTINEL));
        }
    }

    #[test]
    fn test_visible_bound() {
        let mut image = RgbaImage::new(8, 8);
        assert!(visible_bound(&image).is_empty());
        image.put_pixel(2, 3, Rgba([1, 2, 3, 255]));
        image.put_pixel(5, 4, Rgba([1, 2, 3, 1]));
        assert_eq!(visible_bound(&image), IRect::from_bounds(2, 3, 6, 5));
    }

    #[test]
    fn test_degenerate_input_is_skipped() {
        let ortho = OrthoSystem::new(-0.5, 32.0).expect("valid ortho");
        let dir = tempfile::tempdir().expect("temp dir");
        let stem = dir.path().join("flat");
        let flat = Mesh::from_triangles(
            vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0)],
            &[[0, 1, 2]],
            [1.0; 4],
        );
        let outcome = generate_sprite_from_model(&flat, None, &ortho, &stem, 8, false).expect("bake");
        assert!(matches!(outcome, BakeOutcome::Skipped(_)));
        let outcome =
            generate_sprite_from_model(&Mesh::new(), None, &ortho, &stem, 8, false).expect("bake");
        assert!(matches!(outcome, BakeOutcome::Skipped(_)));
        assert_eq!(std::fs::read_dir(dir.path()).expect("list").count(), 0);
    }
}
