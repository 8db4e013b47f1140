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

//! G-buffer rasterization of sprites and dense models.
//!
//! Both kernels compare the incoming height against the stored one and, when
//! the test passes, write height, diffuse colour and normal together. They never
//! read colour back. The height test and the normal interpolation are type
//! parameters so each combination compiles into its own inner loop.

use isoworld_core::image::GBuffer;
use isoworld_core::instance::{SpriteInstance, Transform3D};
use isoworld_core::math::{IRect, IVec2, Mat2, Vec2, Vec3};
use isoworld_core::mesh::DenseModel;
use isoworld_core::ortho::OrthoView;
use isoworld_core::sprite::SpriteType;
use isoworld_core::units::mini_to_floating;

/// Barycentric weights may undershoot by this much at shared edges.
const WEIGHT_TOLERANCE: f32 = -1e-5;

/// Decides whether a new height replaces the stored one.
pub trait HeightTest {
    /// Returns `true` if `source` should overwrite `destination`.
    fn passes(source: f32, destination: f32) -> bool;
}

/// Strictly higher wins; the first of two equal heights stays.
#[derive(Debug, Clone, Copy, Default)]
pub struct Higher;

impl HeightTest for Higher {
    #[inline(always)]
    fn passes(source: f32, destination: f32) -> bool {
        source > destination
    }
}

/// Higher or equal wins; the last of two equal heights stays.
#[derive(Debug, Clone, Copy, Default)]
pub struct HigherOrEqual;

impl HeightTest for HigherOrEqual {
    #[inline(always)]
    fn passes(source: f32, destination: f32) -> bool {
        source >= destination
    }
}

/// How vertex normals are blended across a triangle.
pub trait NormalInterpolation {
    /// Blends three unit normals with barycentric weights.
    fn interpolate(normals: &[Vec3; 3], wa: f32, wb: f32, wc: f32) -> Vec3;
}

/// Plain weighted sum, slightly shorter than unit length between vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearNormals;

impl NormalInterpolation for LinearNormals {
    #[inline(always)]
    fn interpolate(normals: &[Vec3; 3], wa: f32, wb: f32, wc: f32) -> Vec3 {
        normals[0] * wa + normals[1] * wb + normals[2] * wc
    }
}

/// Weighted sum rescaled to unit length.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedNormals;

impl NormalInterpolation for NormalizedNormals {
    #[inline(always)]
    fn interpolate(normals: &[Vec3; 3], wa: f32, wb: f32, wc: f32) -> Vec3 {
        LinearNormals::interpolate(normals, wa, wb, wc).normalize()
    }
}

/// Maps a normal component from `[-1, 1]` to `[0, 255]`, with 0 at 128.
#[inline(always)]
pub fn encode_normal_component(value: f32) -> u8 {
    (value * 127.0 + 128.0).round().clamp(0.0, 255.0) as u8
}

/// Inverse of [`encode_normal_component`].
#[inline(always)]
pub fn decode_normal_component(value: u8) -> f32 {
    (value as f32 - 128.0) * (1.0 / 127.0)
}

/// Draws one sprite instance.
///
/// `world_centre` is the pixel of the world origin in the target, and `clip`
/// optionally restricts the written area further than the target bounds.
/// Returns the touched rectangle, which is empty when nothing overlapped.
pub fn draw_sprite<H: HeightTest>(
    target: &mut GBuffer,
    clip: Option<IRect>,
    view: &OrthoView,
    world_centre: IVec2,
    sprite_type: &SpriteType,
    instance: &SpriteInstance,
) -> IRect {
    debug_assert!(
        target.normal.dimensions() == target.diffuse.dimensions()
            && target.height.dimensions() == target.diffuse.dimensions(),
        "G-buffer dimension mismatch"
    );
    let frame = sprite_type.frame(view.world_direction, instance.direction);
    let (frame_width, frame_height) = frame.dimensions();
    let upper_left =
        view.position_to_screen_pixel(instance.mini_location, world_centre) - frame.center_point;
    let mut region = IRect::new(upper_left.x, upper_left.y, frame_width as i32, frame_height as i32)
        .intersection(&target.bound());
    if let Some(clip) = clip {
        region = region.intersection(&clip);
    }
    if region.is_empty() {
        return IRect::default();
    }

    let height_offset = mini_to_floating(instance.mini_location.y);
    let target_width = target.width() as usize;
    let source_width = frame_width as usize;
    let source_height: &[f32] = &frame.height;
    let source_color: &[u8] = &frame.color;
    let source_normal: &[u8] = &frame.normal;
    let dest_height: &mut [f32] = &mut target.height;
    let dest_color: &mut [u8] = &mut target.diffuse;
    let dest_normal: &mut [u8] = &mut target.normal;

    for y in region.top..region.bottom() {
        let source_row = (y - upper_left.y) as usize * source_width;
        let dest_row = y as usize * target_width;
        for x in region.left..region.right() {
            let s = source_row + (x - upper_left.x) as usize;
            let stored = source_height[s];
            if stored == f32::NEG_INFINITY {
                continue;
            }
            let h = stored + height_offset;
            let d = dest_row + x as usize;
            if H::passes(h, dest_height[d]) {
                dest_height[d] = h;
                dest_color[d * 4..d * 4 + 4].copy_from_slice(&source_color[s * 4..s * 4 + 4]);
                dest_normal[d * 4..d * 4 + 4].copy_from_slice(&source_normal[s * 4..s * 4 + 4]);
            }
        }
    }
    region
}

/// Draws a dense model with a model to world transform.
///
/// Triangles are culled unless they appear clockwise on screen, which is
/// counter-clockwise seen from the front in world space. Normals are written
/// in light space. Returns the union of the clipped bounds of every drawn
/// triangle.
pub fn draw_dense_model<H: HeightTest, N: NormalInterpolation>(
    target: &mut GBuffer,
    clip: Option<IRect>,
    view: &OrthoView,
    world_centre: IVec2,
    model: &DenseModel,
    transform: &Transform3D,
) -> IRect {
    debug_assert!(
        target.normal.dimensions() == target.diffuse.dimensions()
            && target.height.dimensions() == target.diffuse.dimensions(),
        "G-buffer dimension mismatch"
    );
    let mut bound = target.bound();
    if let Some(clip) = clip {
        bound = bound.intersection(&clip);
    }
    if bound.is_empty() {
        return IRect::default();
    }

    let model_to_screen = view.world_space_to_screen_depth * transform.rotation;
    let translation = view.tiles_to_screen_depth(transform.position, world_centre);
    let normal_to_light = view.normal_to_world_space.transpose() * transform.rotation;

    let target_width = target.width() as usize;
    let dest_height: &mut [f32] = &mut target.height;
    let dest_color: &mut [u8] = &mut target.diffuse;
    let dest_normal: &mut [u8] = &mut target.normal;
    let mut touched = IRect::default();

    for triangle in &model.triangles {
        let [va, vb, vc] = &triangle.vertices;
        let a = model_to_screen * va.position + translation;
        let b = model_to_screen * vb.position + translation;
        let c = model_to_screen * vc.position + translation;
        let ab = Vec2::new(b.x - a.x, b.y - a.y);
        let ac = Vec2::new(c.x - a.x, c.y - a.y);
        if ab.perp_dot(ac) >= 0.0 {
            continue;
        }
        let left = a.x.min(b.x).min(c.x).floor() as i32;
        let top = a.y.min(b.y).min(c.y).floor() as i32;
        let right = a.x.max(b.x).max(c.x).ceil() as i32;
        let bottom = a.y.max(b.y).max(c.y).ceil() as i32;
        let region = IRect::from_bounds(left, top, right, bottom).intersection(&bound);
        if region.is_empty() {
            continue;
        }
        let Some(offset_to_weight) = Mat2::from_cols(ab, ac).inverse() else {
            continue;
        };
        let normals = [
            normal_to_light * va.normal,
            normal_to_light * vb.normal,
            normal_to_light * vc.normal,
        ];
        touched = touched.union(&region);

        for y in region.top..region.bottom() {
            let dest_row = y as usize * target_width;
            for x in region.left..region.right() {
                let offset = Vec2::new(x as f32 + 0.5 - a.x, y as f32 + 0.5 - a.y);
                let weights = offset_to_weight * offset;
                let (wb, wc) = (weights.x, weights.y);
                let wa = 1.0 - wb - wc;
                if wa < WEIGHT_TOLERANCE || wb < WEIGHT_TOLERANCE || wc < WEIGHT_TOLERANCE {
                    continue;
                }
                let z = a.z * wa + b.z * wb + c.z * wc;
                let d = dest_row + x as usize;
                if !H::passes(z, dest_height[d]) {
                    continue;
                }
                dest_height[d] = z;
                let pixel = &mut dest_color[d * 4..d * 4 + 4];
                for channel in 0..3 {
                    let value = va.color[channel] * wa + vb.color[channel] * wb + vc.color[channel] * wc;
                    pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
                }
                pixel[3] = 255;
                let n = N::interpolate(&normals, wa, wb, wc);
                let pixel = &mut dest_normal[d * 4..d * 4 + 4];
                pixel[0] = encode_normal_component(n.x);
                pixel[1] = encode_normal_component(n.y);
                pixel[2] = encode_normal_component(n.z);
                pixel[3] = 255;
            }
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use isoworld_core::image::{create_height, RgbaImage, NO_HEIGHT};
    use isoworld_core::math::IVec3;
    use isoworld_core::mesh::Mesh;
    use isoworld_core::ortho::OrthoSystem;
    use isoworld_core::sprite::SpriteFrame;
    use isoworld_core::units::MINI_PER_TILE;
    use image::Rgba;

    fn ortho() -> OrthoSystem {
        OrthoSystem::new(-0.5, 32.0).expect("valid ortho")
    }

    fn solid_sprite(color: [u8; 4], size: u32) -> SpriteType {
        let frame = SpriteFrame {
            center_point: IVec2::new(size as i32 / 2, size as i32 / 2),
            color: RgbaImage::from_pixel(size, size, Rgba(color)),
            normal: RgbaImage::from_pixel(size, size, Rgba([128, 128, 255, 255])),
            height: create_height(size, size, 0.0),
        };
        SpriteType {
            min_bound_mini: IVec3::new(-512, 0, -512),
            max_bound_mini: IVec3::new(512, 0, 512),
            frames: vec![frame],
            shadow_model: None,
        }
    }

    #[test]
    fn test_sprite_draw_writes_and_returns_rect() {
        let ortho = ortho();
        let mut target = GBuffer::new(16, 16);
        let sprite = solid_sprite([255, 0, 0, 255], 4);
        let rect = draw_sprite::<Higher>(
            &mut target,
            None,
            ortho.view(0),
            IVec2::new(8, 8),
            &sprite,
            &SpriteInstance::new(0, IVec3::ZERO),
        );
        assert_eq!(rect, IRect::new(6, 6, 4, 4));
        assert_eq!(target.diffuse.get_pixel(6, 6).0, [255, 0, 0, 255]);
        assert_eq!(target.normal.get_pixel(9, 9).0, [128, 128, 255, 255]);
        assert_eq!(target.height.get_pixel(9, 9).0[0], 0.0);
        assert_eq!(target.diffuse.get_pixel(10, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_sprite_draw_clips() {
        let ortho = ortho();
        let mut target = GBuffer::new(16, 16);
        let sprite = solid_sprite([255, 0, 0, 255], 4);
        let instance = SpriteInstance::new(0, IVec3::ZERO);
        let rect = draw_sprite::<Higher>(
            &mut target,
            Some(IRect::new(0, 0, 8, 8)),
            ortho.view(0),
            IVec2::new(8, 8),
            &sprite,
            &instance,
        );
        assert_eq!(rect, IRect::new(6, 6, 2, 2));
        assert_eq!(target.diffuse.get_pixel(8, 8).0, [0, 0, 0, 0]);
        let outside = draw_sprite::<Higher>(
            &mut target,
            None,
            ortho.view(0),
            IVec2::new(-100, -100),
            &sprite,
            &instance,
        );
        assert!(outside.is_empty());
    }

    #[test]
    fn test_higher_sprite_wins_in_any_order() {
        let ortho = ortho();
        let view = ortho.view(0);
        let low = SpriteInstance::new(0, IVec3::ZERO);
        let high = SpriteInstance::new(1, IVec3::new(0, MINI_PER_TILE / 2, 0));
        let red = solid_sprite([255, 0, 0, 255], 4);
        let green = solid_sprite([0, 255, 0, 255], 4);
        // Same screen position: draw the high sprite with a centre that cancels its lift.
        let lift = view.offset_to_screen_pixel(high.mini_location);
        let mut green_shifted = green.clone();
        green_shifted.frames[0].center_point = green.frames[0].center_point + lift;

        for order in [[false, true], [true, false]] {
            let mut target = GBuffer::new(16, 16);
            for is_high in order {
                if is_high {
                    draw_sprite::<Higher>(&mut target, None, view, IVec2::new(8, 8), &green_shifted, &high);
                } else {
                    draw_sprite::<Higher>(&mut target, None, view, IVec2::new(8, 8), &red, &low);
                }
            }
            assert_eq!(target.diffuse.get_pixel(7, 7).0, [0, 255, 0, 255]);
            assert_abs_diff_eq!(target.height.get_pixel(7, 7).0[0], 0.5);
        }
    }

    #[test]
    fn test_equal_height_policy() {
        let ortho = ortho();
        let view = ortho.view(0);
        let instance = SpriteInstance::new(0, IVec3::ZERO);
        let red = solid_sprite([255, 0, 0, 255], 4);
        let blue = solid_sprite([0, 0, 255, 255], 4);

        let mut target = GBuffer::new(16, 16);
        draw_sprite::<Higher>(&mut target, None, view, IVec2::new(8, 8), &red, &instance);
        draw_sprite::<Higher>(&mut target, None, view, IVec2::new(8, 8), &blue, &instance);
        assert_eq!(target.diffuse.get_pixel(8, 8).0, [255, 0, 0, 255]);

        draw_sprite::<HigherOrEqual>(&mut target, None, view, IVec2::new(8, 8), &blue, &instance);
        assert_eq!(target.diffuse.get_pixel(8, 8).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_empty_sprite_pixels_never_write() {
        let ortho = ortho();
        let mut sprite = solid_sprite([255, 0, 0, 255], 4);
        sprite.frames[0].height = create_height(4, 4, NO_HEIGHT);
        let mut target = GBuffer::new(16, 16);
        draw_sprite::<HigherOrEqual>(
            &mut target,
            None,
            ortho.view(0),
            IVec2::new(8, 8),
            &sprite,
            &SpriteInstance::new(0, IVec3::ZERO),
        );
        assert_eq!(target.diffuse.get_pixel(8, 8).0, [0, 0, 0, 0]);
        assert_eq!(target.height.get_pixel(8, 8).0[0], NO_HEIGHT);
    }

    /// A one-tile wall in the XY plane facing -Z, seen head-on by view 4.
    fn wall(front_facing: bool) -> DenseModel {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices: &[[usize; 3]] = if front_facing {
            &[[0, 1, 2], [0, 2, 3]]
        } else {
            &[[0, 2, 1], [0, 3, 2]]
        };
        DenseModel::from_mesh(&Mesh::from_triangles(points, indices, [0.0, 1.0, 0.0, 1.0]))
    }

    #[test]
    fn test_dense_model_draw() {
        let ortho = ortho();
        let view = ortho.view(4);
        let mut target = GBuffer::new(64, 64);
        let rect = draw_dense_model::<Higher, NormalizedNormals>(
            &mut target,
            None,
            view,
            IVec2::new(16, 48),
            &wall(true),
            &Transform3D::IDENTITY,
        );
        assert!(rect.contains_point(IVec2::new(32, 34)));
        assert_eq!(target.diffuse.get_pixel(32, 34).0, [0, 255, 0, 255]);
        assert_eq!(target.normal.get_pixel(32, 34).0, [128, 128, 255, 255]);
        let expected_height = (48.0 - 34.5) / view.y_pixels_per_tile;
        assert_abs_diff_eq!(target.height.get_pixel(32, 34).0[0], expected_height, epsilon = 1e-3);
        assert_eq!(target.height.get_pixel(8, 34).0[0], NO_HEIGHT);
    }

    #[test]
    fn test_dense_model_back_faces_culled() {
        let ortho = ortho();
        let mut target = GBuffer::new(64, 64);
        let rect = draw_dense_model::<Higher, LinearNormals>(
            &mut target,
            None,
            ortho.view(4),
            IVec2::new(16, 48),
            &wall(false),
            &Transform3D::IDENTITY,
        );
        assert!(rect.is_empty());
        assert_eq!(target.diffuse.get_pixel(32, 34).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_normal_encoding() {
        assert_eq!(encode_normal_component(0.0), 128);
        assert_eq!(encode_normal_component(1.0), 255);
        assert_eq!(encode_normal_component(-1.0), 1);
        assert_abs_diff_eq!(decode_normal_component(255), 1.0);
        assert_abs_diff_eq!(decode_normal_component(128), 0.0);
    }
}
