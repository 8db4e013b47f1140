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

//! # Sprite Atlases
//!
//! A baked sprite is a PNG atlas plus an INI side file sharing its stem. The
//! atlas holds one row per camera angle and three columns per row: colour,
//! height (8-bit in red, validity in alpha) and light-space normal.

use crate::error::LoadError;
use crate::ini::{parse_float_list, parse_int_list, IniDocument};
use image::{imageops, ImageFormat};
use isoworld_core::image::{create_height, RgbaImage, NO_HEIGHT};
use isoworld_core::math::{IVec2, IVec3, Vec3};
use isoworld_core::mesh::ShadowMesh;
use isoworld_core::sprite::{SpriteFrame, SpriteType};
use isoworld_core::units::floating_to_mini;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Number of image columns in each atlas row.
pub const PROPERTY_COLUMNS: u32 = 3;

/// Height column pixels with an alpha at or below this hold no surface.
const HEIGHT_ALPHA_THRESHOLD: u8 = 127;

/// Appends an extension to a stem without replacing dotted parts of its name.
pub fn path_with_suffix(stem: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// The PNG and INI paths of an atlas stem.
pub fn atlas_paths(stem: &Path) -> (PathBuf, PathBuf) {
    (path_with_suffix(stem, "png"), path_with_suffix(stem, "ini"))
}

/// The side file of a sprite atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAtlasConfig {
    /// Pixel of each frame that lands on the sprite's origin.
    pub center: IVec2,
    /// Number of camera angles.
    pub frame_rows: u32,
    /// Number of image columns per row.
    pub property_columns: u32,
    /// Lower bound in tiles.
    pub min_bound: Vec3,
    /// Upper bound in tiles.
    pub max_bound: Vec3,
    /// Optional shadow caster.
    pub shadow: Option<ShadowMesh>,
}

impl SpriteAtlasConfig {
    /// Reads the config keys from a parsed document.
    pub fn from_ini(doc: &IniDocument) -> Result<Self, LoadError> {
        let shadow = match doc.get("Points") {
            Some(points) => Some(parse_shadow(points, doc.get("TriangleIndices").unwrap_or(""))?),
            None => None,
        };
        Ok(Self {
            center: IVec2::new(doc.parse_value("CenterX")?, doc.parse_value("CenterY")?),
            frame_rows: doc.parse_value("FrameRows")?,
            property_columns: doc.parse_value("PropertyColumns")?,
            min_bound: doc.parse_vec3("MinBound")?,
            max_bound: doc.parse_vec3("MaxBound")?,
            shadow,
        })
    }

    /// Formats the config as INI text.
    pub fn to_ini(&self) -> String {
        let join = |values: &[f32]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut text = String::from("; Sprite atlas generated from a model\n");
        text.push_str(&format!("CenterX={}\n", self.center.x));
        text.push_str(&format!("CenterY={}\n", self.center.y));
        text.push_str(&format!("FrameRows={}\n", self.frame_rows));
        text.push_str(&format!("PropertyColumns={}\n", self.property_columns));
        let (min, max) = (self.min_bound, self.max_bound);
        text.push_str(&format!("MinBound={}\n", join(&[min.x, min.y, min.z])));
        text.push_str(&format!("MaxBound={}\n", join(&[max.x, max.y, max.z])));
        if let Some(shadow) = &self.shadow {
            text.push_str(&format!("Points={}\n", join(&shadow.flat_points())));
            let indices: Vec<String> = shadow.triangle_indices.iter().map(u32::to_string).collect();
            text.push_str(&format!("TriangleIndices={}\n", indices.join(",")));
        }
        text
    }
}

/// Validates flat shadow lists before building the mesh.
fn parse_shadow(points: &str, indices: &str) -> Result<ShadowMesh, LoadError> {
    let coordinates = parse_float_list("Points", points)?;
    if coordinates.len() % 3 != 0 {
        return Err(LoadError::MalformedList {
            key: "Points".to_string(),
            count: coordinates.len(),
        });
    }
    let point_count = (coordinates.len() / 3) as i64;
    let raw_indices = parse_int_list("TriangleIndices", indices)?;
    if raw_indices.len() % 3 != 0 || raw_indices.iter().any(|&i| i < 0 || i >= point_count) {
        return Err(LoadError::MalformedList {
            key: "TriangleIndices".to_string(),
            count: raw_indices.len(),
        });
    }
    let indices: Vec<u32> = raw_indices.into_iter().map(|i| i as u32).collect();
    Ok(ShadowMesh::from_flat_lists(&coordinates, &indices))
}

/// Splits an atlas into sprite frames.
pub fn sprite_type_from_atlas(
    atlas: &RgbaImage,
    config: &SpriteAtlasConfig,
) -> Result<SpriteType, LoadError> {
    let (width, height) = atlas.dimensions();
    let layout_error = || LoadError::AtlasLayout {
        width,
        height,
        rows: config.frame_rows,
        columns: config.property_columns,
    };
    if config.frame_rows == 0
        || config.property_columns < PROPERTY_COLUMNS
        || width % config.property_columns != 0
        || height % config.frame_rows != 0
    {
        return Err(layout_error());
    }
    let frame_width = width / config.property_columns;
    let frame_height = height / config.frame_rows;
    if frame_width == 0 || frame_height == 0 {
        return Err(layout_error());
    }

    let min_y = config.min_bound.y;
    let height_scale = (config.max_bound.y - min_y) / 255.0;
    let frames = (0..config.frame_rows)
        .map(|row| {
            let top = row * frame_height;
            let color = imageops::crop_imm(atlas, 0, top, frame_width, frame_height).to_image();
            let normal =
                imageops::crop_imm(atlas, frame_width * 2, top, frame_width, frame_height).to_image();
            let mut heights = create_height(frame_width, frame_height, NO_HEIGHT);
            for (x, y, pixel) in heights.enumerate_pixels_mut() {
                let [value, _, _, alpha] = atlas.get_pixel(frame_width + x, top + y).0;
                if alpha > HEIGHT_ALPHA_THRESHOLD {
                    pixel.0[0] = min_y + value as f32 * height_scale;
                }
            }
            SpriteFrame {
                center_point: config.center,
                color,
                normal,
                height: heights,
            }
        })
        .collect();

    let to_mini = |v: Vec3| IVec3::new(floating_to_mini(v.x), floating_to_mini(v.y), floating_to_mini(v.z));
    Ok(SpriteType {
        min_bound_mini: to_mini(config.min_bound),
        max_bound_mini: to_mini(config.max_bound),
        frames,
        shadow_model: config.shadow.clone(),
    })
}

/// Builds a sprite type from PNG bytes and INI text.
pub fn load_sprite_type_from_parts(png: &[u8], ini_text: &str) -> Result<SpriteType, LoadError> {
    let atlas = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgba8();
    let config = SpriteAtlasConfig::from_ini(&IniDocument::parse(ini_text)?)?;
    sprite_type_from_atlas(&atlas, &config)
}

/// Loads `<stem>.png` and `<stem>.ini`.
pub fn load_sprite_type(stem: &Path) -> Result<SpriteType, LoadError> {
    let (png_path, ini_path) = atlas_paths(stem);
    let read_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LoadError::Io { path, source }
    };
    let png = std::fs::read(&png_path).map_err(read_error(&png_path))?;
    let ini_text = std::fs::read_to_string(&ini_path).map_err(read_error(&ini_path))?;
    let sprite = load_sprite_type_from_parts(&png, &ini_text)?;
    log::debug!(
        "Loaded sprite {} with {} frames",
        stem.display(),
        sprite.frames.len()
    );
    Ok(sprite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn config(rows: u32) -> SpriteAtlasConfig {
        SpriteAtlasConfig {
            center: IVec2::new(1, 1),
            frame_rows: rows,
            property_columns: 3,
            min_bound: Vec3::new(-0.5, 0.0, -0.5),
            max_bound: Vec3::new(0.5, 2.0, 0.5),
            shadow: None,
        }
    }

    /// Two rows of 2x2 frames: red, then green.
    fn atlas() -> RgbaImage {
        let mut atlas = RgbaImage::new(6, 4);
        for y in 0..4 {
            let color = if y < 2 { [255, 0, 0, 255] } else { [0, 255, 0, 255] };
            for x in 0..2 {
                atlas.put_pixel(x, y, Rgba(color));
                atlas.put_pixel(x + 2, y, Rgba([255, 0, 0, if x == 0 { 255 } else { 0 }]));
                atlas.put_pixel(x + 4, y, Rgba([128, 128, 255, 255]));
            }
        }
        atlas
    }

    #[test]
    fn test_frames_from_atlas() {
        let sprite = sprite_type_from_atlas(&atlas(), &config(2)).expect("valid atlas");
        assert_eq!(sprite.frames.len(), 2);
        assert_eq!(sprite.min_bound_mini, IVec3::new(-512, 0, -512));
        assert_eq!(sprite.max_bound_mini, IVec3::new(512, 2048, 512));
        let second = &sprite.frames[1];
        assert_eq!(second.color.get_pixel(1, 1).0, [0, 255, 0, 255]);
        assert_eq!(second.normal.get_pixel(0, 0).0, [128, 128, 255, 255]);
        approx::assert_abs_diff_eq!(second.height.get_pixel(0, 0).0[0], 2.0, epsilon = 1e-5);
        assert_eq!(second.height.get_pixel(1, 0).0[0], NO_HEIGHT);
    }

    #[test]
    fn test_layout_errors() {
        assert!(matches!(
            sprite_type_from_atlas(&atlas(), &config(3)),
            Err(LoadError::AtlasLayout { rows: 3, .. })
        ));
        let mut bad = config(2);
        bad.property_columns = 2;
        assert!(sprite_type_from_atlas(&atlas(), &bad).is_err());
    }

    #[test]
    fn test_config_round_trip_with_shadow() {
        let mut original = config(4);
        original.shadow = Some(ShadowMesh::from_flat_lists(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.5, -0.25],
            &[0, 1, 2],
        ));
        let text = original.to_ini();
        assert!(text.contains("Points=0,0,0,1,0,0,0,1.5,-0.25"));
        let parsed = SpriteAtlasConfig::from_ini(&IniDocument::parse(&text).expect("ini"))
            .expect("config");
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_malformed_shadow_lists() {
        let base = config(1).to_ini();
        let doc = IniDocument::parse(&format!("{base}Points=0,0,0,1\nTriangleIndices=0,0,0\n"))
            .expect("ini");
        assert!(matches!(
            SpriteAtlasConfig::from_ini(&doc),
            Err(LoadError::MalformedList { ref key, count: 4 }) if key == "Points"
        ));
        let doc = IniDocument::parse(&format!("{base}Points=0,0,0\nTriangleIndices=0,0,1\n"))
            .expect("ini");
        assert!(matches!(
            SpriteAtlasConfig::from_ini(&doc),
            Err(LoadError::MalformedList { ref key, count: 3 }) if key == "TriangleIndices"
        ));
    }

    #[test]
    fn test_load_from_parts_and_files() {
        let mut png = Vec::new();
        atlas()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .expect("encode png");
        let ini = config(2).to_ini();
        let sprite = load_sprite_type_from_parts(&png, &ini).expect("load from parts");
        assert_eq!(sprite.frames.len(), 2);

        let dir = tempfile::tempdir().expect("temp dir");
        let stem = dir.path().join("crate.v2");
        let (png_path, ini_path) = atlas_paths(&stem);
        assert!(png_path.ends_with("crate.v2.png"));
        std::fs::write(&png_path, &png).expect("write png");
        std::fs::write(&ini_path, &ini).expect("write ini");
        let loaded = load_sprite_type(&stem).expect("load from files");
        assert_eq!(loaded, sprite);
        assert!(matches!(
            load_sprite_type(&dir.path().join("missing")),
            Err(LoadError::Io { .. })
        ));
    }
}
