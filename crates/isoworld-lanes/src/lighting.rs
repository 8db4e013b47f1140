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

//! # Deferred Lighting
//!
//! Light is accumulated per pixel into an RGBA8 buffer in fixed point, where
//! [`LIGHT_ONE`] is an intensity of one, and finally multiplied with the
//! diffuse colour. Normals are read from the G-buffer in light space, so every
//! light direction and position is rotated into light space once per call.

use crate::gbuffer::decode_normal_component;
use crate::shadow::ShadowCube;
use isoworld_core::image::{fill_region, image_bound, HeightImage, Rgba, RgbaImage};
use isoworld_core::light::{light_channels, AmbientLight, DirectedLight, PointLight, LIGHT_ONE};
use isoworld_core::math::{IRect, IVec2, Vec3};
use isoworld_core::ortho::OrthoView;

/// How a directional light combines with the light buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightWrite {
    /// Replace the buffer with the ambient light plus this light.
    Overwrite(AmbientLight),
    /// Add this light to the buffer.
    Add,
}

/// Fills the light buffer with the ambient light.
pub fn clear_light(light_buffer: &mut RgbaImage, ambient: &AmbientLight) {
    let bound = image_bound(light_buffer);
    fill_region(light_buffer, bound, Rgba(ambient.pixel()));
}

#[inline(always)]
fn read_normal(normal: &[u8], index: usize) -> Vec3 {
    Vec3::new(
        decode_normal_component(normal[index]),
        decode_normal_component(normal[index + 1]),
        decode_normal_component(normal[index + 2]),
    )
    .normalize()
}

/// Adds `channels * factor` to a light pixel, `factor` in 1/256 steps.
#[inline(always)]
fn accumulate(pixel: &mut [u8], base: [u32; 3], channels: [u32; 3], factor: u32) {
    for i in 0..3 {
        pixel[i] = (base[i] + ((channels[i] * factor) >> 8)).min(255) as u8;
    }
    pixel[3] = 255;
}

/// Applies a directional light to every pixel.
pub fn directed_light(
    view: &OrthoView,
    normal: &RgbaImage,
    light_buffer: &mut RgbaImage,
    light: &DirectedLight,
    write: LightWrite,
) {
    debug_assert_eq!(normal.dimensions(), light_buffer.dimensions());
    let towards_light = view.world_to_light(-light.direction).normalize();
    let channels = light_channels(light.color, light.intensity);
    let ambient = match write {
        LightWrite::Overwrite(ambient) => {
            let [r, g, b, _] = ambient.pixel();
            Some([r as u32, g as u32, b as u32])
        }
        LightWrite::Add => None,
    };
    let normal_data: &[u8] = normal;
    let light_data: &mut [u8] = light_buffer;
    for (index, pixel) in light_data.chunks_exact_mut(4).enumerate() {
        let n = read_normal(normal_data, index * 4);
        let lambert = n.dot(towards_light).max(0.0);
        let factor = (lambert * 256.0) as u32;
        let base = ambient.unwrap_or([pixel[0] as u32, pixel[1] as u32, pixel[2] as u32]);
        accumulate(pixel, base, channels, factor);
    }
}

/// Screen rectangle that can receive light from a point light.
fn point_light_bound(view: &OrthoView, world_centre: IVec2, light: &PointLight) -> IRect {
    let r = light.radius;
    let mut min = IVec2::new(i32::MAX, i32::MAX);
    let mut max = IVec2::new(i32::MIN, i32::MIN);
    for corner in 0..8 {
        let sign = |bit: i32| if corner & bit != 0 { r } else { -r };
        let p = view.tiles_to_screen_depth(
            light.position + Vec3::new(sign(1), sign(2), sign(4)),
            world_centre,
        );
        min = IVec2::new(min.x.min(p.x.floor() as i32), min.y.min(p.y.floor() as i32));
        max = IVec2::new(max.x.max(p.x.ceil() as i32), max.y.max(p.y.ceil() as i32));
    }
    IRect::from_bounds(min.x - 1, min.y - 1, max.x + 1, max.y + 1)
}

/// Adds a point light, optionally masked by a shadow cube rendered for it.
///
/// Attenuation is `intensity * (1 - (d / r)^2)^2`, which is 1 at the centre,
/// 0 at the radius and falls monotonically in between.
pub fn point_light(
    view: &OrthoView,
    world_centre: IVec2,
    normal: &RgbaImage,
    height: &HeightImage,
    light_buffer: &mut RgbaImage,
    light: &PointLight,
    shadow: Option<&ShadowCube>,
) {
    debug_assert_eq!(normal.dimensions(), light_buffer.dimensions());
    debug_assert_eq!(height.dimensions(), light_buffer.dimensions());
    if light.radius <= 0.0 || light.intensity <= 0.0 {
        return;
    }
    let region = point_light_bound(view, world_centre, light).intersection(&image_bound(light_buffer));
    if region.is_empty() {
        log::trace!("Point light at {:?} is off screen", light.position);
        return;
    }
    let light_position = view.world_to_light(light.position);
    let channels = light_channels(light.color, 1.0);
    let radius_squared = light.radius * light.radius;
    let width = light_buffer.width() as usize;
    let normal_data: &[u8] = normal;
    let height_data: &[f32] = height;
    let light_data: &mut [u8] = light_buffer;

    for y in region.top..region.bottom() {
        for x in region.left..region.right() {
            let index = y as usize * width + x as usize;
            let h = height_data[index];
            if h == f32::NEG_INFINITY {
                continue;
            }
            let screen = Vec3::new(
                x as f32 + 0.5 - world_centre.x as f32,
                y as f32 + 0.5 - world_centre.y as f32,
                h,
            );
            let offset = view.screen_depth_to_light_space * screen - light_position;
            let distance_squared = offset.length_squared();
            if distance_squared > radius_squared {
                continue;
            }
            let falloff = 1.0 - distance_squared / radius_squared;
            let attenuation = light.intensity * falloff * falloff;
            let distance = distance_squared.sqrt();
            let n = read_normal(normal_data, index * 4);
            let lambert = if distance > 1e-6 {
                n.dot(-offset / distance).max(0.0)
            } else {
                1.0
            };
            let visibility = match shadow {
                Some(cube) => cube.sample_visibility(offset),
                None => 1.0,
            };
            let factor = (attenuation * lambert * visibility * 256.0).min(u32::MAX as f32 / 256.0) as u32;
            if factor == 0 {
                continue;
            }
            let pixel = &mut light_data[index * 4..index * 4 + 4];
            let base = [pixel[0] as u32, pixel[1] as u32, pixel[2] as u32];
            accumulate(pixel, base, channels, factor);
        }
    }
}

/// Multiplies diffuse colour with light into an opaque target.
///
/// # Panics
/// Panics if the three images differ in size.
pub fn blend_light(target: &mut RgbaImage, diffuse: &RgbaImage, light: &RgbaImage) {
    assert!(
        target.dimensions() == diffuse.dimensions() && diffuse.dimensions() == light.dimensions(),
        "Blend dimension mismatch: target {:?}, diffuse {:?}, light {:?}",
        target.dimensions(),
        diffuse.dimensions(),
        light.dimensions()
    );
    let diffuse_data: &[u8] = diffuse;
    let light_data: &[u8] = light;
    let target_data: &mut [u8] = target;
    for ((out, d), l) in target_data
        .chunks_exact_mut(4)
        .zip(diffuse_data.chunks_exact(4))
        .zip(light_data.chunks_exact(4))
    {
        for i in 0..3 {
            out[i] = (d[i] as u32 * l[i] as u32 / LIGHT_ONE).min(255) as u8;
        }
        out[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbuffer::encode_normal_component;
    use isoworld_core::image::create_height;
    use isoworld_core::math::Rgb8;
    use isoworld_core::mesh::ShadowMesh;
    use isoworld_core::ortho::OrthoSystem;

    fn ortho() -> OrthoSystem {
        OrthoSystem::new(-0.5, 32.0).expect("valid ortho")
    }

    /// A normal map where every pixel faces `normal` in light space.
    fn flat_normals(width: u32, height: u32, normal: Vec3) -> RgbaImage {
        RgbaImage::from_pixel(
            width,
            height,
            Rgba([
                encode_normal_component(normal.x),
                encode_normal_component(normal.y),
                encode_normal_component(normal.z),
                255,
            ]),
        )
    }

    #[test]
    fn test_clear_and_blend_ambient() {
        let mut light = RgbaImage::new(2, 2);
        clear_light(&mut light, &AmbientLight::white(1.0));
        let diffuse = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 3, 255]));
        let mut target = RgbaImage::new(2, 2);
        blend_light(&mut target, &diffuse, &light);
        assert_eq!(target.get_pixel(1, 1).0, [200, 100, 3, 255]);

        clear_light(&mut light, &AmbientLight::white(4.0));
        blend_light(&mut target, &diffuse, &light);
        assert_eq!(target.get_pixel(0, 0).0, [255, 199, 5, 255]);
    }

    #[test]
    fn test_directed_overwrite_then_add() {
        let ortho = ortho();
        let view = ortho.view(0);
        // Surfaces facing straight up, lit from straight above.
        let normal = flat_normals(2, 2, Vec3::Y);
        let down = DirectedLight::new(Vec3::new(0.0, -1.0, 0.0), 0.5);
        let mut light = RgbaImage::from_pixel(2, 2, Rgba([99, 99, 99, 255]));
        directed_light(view, &normal, &mut light, &down, LightWrite::Overwrite(AmbientLight::NONE));
        let first = light.get_pixel(0, 0).0;
        assert!((63..=64).contains(&first[0]), "{first:?}");
        directed_light(view, &normal, &mut light, &down, LightWrite::Add);
        let second = light.get_pixel(0, 0).0;
        assert_eq!(second[0] as u32, 2 * first[0] as u32);
    }

    #[test]
    fn test_directed_light_ignores_back_faces() {
        let ortho = ortho();
        let normal = flat_normals(1, 1, -Vec3::Y);
        let mut light = RgbaImage::new(1, 1);
        let down = DirectedLight::new(Vec3::new(0.0, -1.0, 0.0), 1.0).with_color(Rgb8::new(255, 0, 0));
        directed_light(ortho.view(3), &normal, &mut light, &down, LightWrite::Overwrite(AmbientLight::white(0.5)));
        assert_eq!(light.get_pixel(0, 0).0, [64, 64, 64, 255]);
    }

    #[test]
    fn test_point_light_falloff() {
        let ortho = ortho();
        let view = ortho.view(0);
        let (width, height) = (64, 64);
        let centre = IVec2::new(32, 32);
        let normal = flat_normals(width, height, Vec3::Y);
        let ground = create_height(width, height, 0.0);
        let mut light = RgbaImage::new(width, height);
        clear_light(&mut light, &AmbientLight::NONE);
        let lamp = PointLight::new(Vec3::new(0.0, 0.5, 0.0), 1.0, 1.0);
        point_light(view, centre, &normal, &ground, &mut light, &lamp, None);

        let at_centre = light.get_pixel(32, 32).0[0];
        assert!(at_centre > 30, "{at_centre}");
        // Far outside the radius nothing is added.
        assert_eq!(light.get_pixel(0, 0).0[0], 0);
        // Brightness falls off along a ray away from the light.
        let near = light.get_pixel(36, 32).0[0];
        let far = light.get_pixel(44, 32).0[0];
        assert!(at_centre >= near && near >= far, "{at_centre} {near} {far}");
    }

    #[test]
    fn test_point_light_skips_empty_pixels() {
        let ortho = ortho();
        let normal = flat_normals(8, 8, Vec3::Y);
        let empty = create_height(8, 8, f32::NEG_INFINITY);
        let mut light = RgbaImage::new(8, 8);
        let lamp = PointLight::new(Vec3::new(0.0, 0.5, 0.0), 10.0, 1.0);
        point_light(ortho.view(0), IVec2::new(4, 4), &normal, &empty, &mut light, &lamp, None);
        assert!(light.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_point_light_shadowed_by_cube() {
        let ortho = ortho();
        let view = ortho.view(0);
        let normal = flat_normals(64, 64, Vec3::Y);
        let ground = create_height(64, 64, 0.0);
        let lamp = PointLight::new(Vec3::new(0.0, 1.0, 0.0), 3.0, 1.0).with_shadows(true);
        // A ceiling just below the light hides the whole ground.
        let ceiling = ShadowMesh::from_flat_lists(
            &[-5.0, 0.0, -5.0, 5.0, 0.0, -5.0, 5.0, 0.0, 5.0, -5.0, 0.0, 5.0],
            &[0, 1, 2, 0, 2, 3],
        );
        let mut cube = ShadowCube::new(32);
        cube.render_caster(&ceiling, view.normal_to_world_space.transpose(), Vec3::new(0.0, -0.5, 0.0));

        let mut lit = RgbaImage::new(64, 64);
        point_light(view, IVec2::new(32, 32), &normal, &ground, &mut lit, &lamp, None);
        let mut shadowed = RgbaImage::new(64, 64);
        point_light(view, IVec2::new(32, 32), &normal, &ground, &mut shadowed, &lamp, Some(&cube));
        assert!(lit.get_pixel(32, 32).0[0] > 0);
        assert_eq!(shadowed.get_pixel(32, 32).0[0], 0);
    }
}
