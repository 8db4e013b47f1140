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

use anyhow::{ensure, Context, Result};
use image::ImageFormat;
use isoworld_core::image::{copy_region, image_bound, RgbaImage};
use isoworld_core::math::IVec3;
use isoworld_io::load_ortho_config;
use isoworld_sdk::{AmbientLight, RegistryLoadExt, SpriteInstance, World};
use std::path::Path;

/// Renders the sprite through each baked angle, side by side.
pub fn run(sprite: &Path, ortho: &Path, out: &Path, size: u32) -> Result<()> {
    ensure!(size > 0, "Preview size must be positive");
    let ortho = load_ortho_config(ortho)
        .with_context(|| format!("Failed to load projection config {}", ortho.display()))?;
    let mut world = World::new(ortho, 1);
    let sprite_type = world
        .registry_mut()
        .load_sprite_type(sprite)
        .with_context(|| format!("Failed to load sprite {}", sprite.display()))?;
    world.add_background_sprite(SpriteInstance::new(sprite_type, IVec3::ZERO));
    world.set_ambient_light(AmbientLight::white(1.0));

    let angles = world.registry().sprite_type(sprite_type).frames.len() as u32;
    let mut strip = RgbaImage::new(size * angles, size);
    let mut frame = RgbaImage::new(size, size);
    for angle in 0..angles {
        world.set_camera_direction_index(angle as i32);
        world.draw(&mut frame);
        copy_region(&mut strip, (angle * size) as i32, 0, &frame, image_bound(&frame));
    }
    strip
        .save_with_format(out, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    log::info!("Wrote preview of {angles} angles to {}", out.display());
    Ok(())
}
