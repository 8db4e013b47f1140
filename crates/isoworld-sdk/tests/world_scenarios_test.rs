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

use image::Rgba;
use isoworld_core::image::{create_height, RgbaImage, NO_HEIGHT};
use isoworld_core::math::{IVec2, IVec3, Vec3};
use isoworld_core::mesh::ShadowMesh;
use isoworld_core::{SpriteFrame, SpriteType};
use isoworld_sdk::{
    AmbientLight, BlockState, DirectedLight, OctreeAction, OrthoSystem, PointLight,
    SpriteInstance, World,
};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const FACING_VIEWER: [u8; 4] = [128, 128, 255, 255];
const FACING_UP: [u8; 4] = [128, 255, 128, 255];

/// Camera index whose X axis points left on screen.
const VIEW_NORTH: i32 = 4;

fn world() -> World {
    let mut world = World::new(OrthoSystem::new(-0.5, 32.0).expect("valid ortho"), 64);
    world.set_camera_direction_index(VIEW_NORTH);
    world
}

/// A flat single-frame sprite of one colour, with a generous bound.
fn solid_sprite(color: [u8; 4], normal: [u8; 4], size: u32, half_extent_mini: i32) -> SpriteType {
    SpriteType {
        min_bound_mini: IVec3::new(-half_extent_mini, 0, -half_extent_mini),
        max_bound_mini: IVec3::new(half_extent_mini, 1024, half_extent_mini),
        frames: vec![SpriteFrame {
            center_point: IVec2::new(size as i32 / 2, size as i32 / 2),
            color: RgbaImage::from_pixel(size, size, Rgba(color)),
            normal: RgbaImage::from_pixel(size, size, Rgba(normal)),
            height: create_height(size, size, 0.0),
        }],
        shadow_model: None,
    }
}

fn pixel(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
    image.get_pixel(x, y).0
}

#[test]
fn test_single_tile_sprite() {
    // --- 1. Setup: one red tile at the origin, lit by a neutral ambient light ---
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 32, 1024));
    world.add_background_sprite(SpriteInstance::new(red, IVec3::ZERO));
    world.set_ambient_light(AmbientLight::white(1.0));

    // --- 2. Draw ---
    let mut target = RgbaImage::new(64, 64);
    world.draw(&mut target);

    // --- 3. Assert: the frame lands centred, one tile wide ---
    let axis = world.ortho().view(VIEW_NORTH as usize).pixel_offset_per_tile_x;
    assert_eq!(axis.x.abs(), 32);
    let red_row: Vec<u32> = (0..64).filter(|&x| pixel(&target, x, 32) == RED).collect();
    assert_eq!(red_row.len() as i32, axis.x.abs());
    assert_eq!(red_row.first(), Some(&16));
    assert_eq!(pixel(&target, 32, 32), RED);
    assert_eq!(pixel(&target, 16, 16), RED);
    assert_eq!(pixel(&target, 15, 15), BLACK);
    assert_eq!(pixel(&target, 48, 48), BLACK);
}

#[test]
fn test_higher_sprite_occludes_lower() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 32, 1024));
    let blue = world
        .registry_mut()
        .add_sprite_type(solid_sprite(BLUE, FACING_VIEWER, 32, 1024));
    // The upper sprite is added first so that only the height test decides.
    world.add_background_sprite(SpriteInstance::new(blue, IVec3::new(-512, 512, 0)));
    world.add_background_sprite(SpriteInstance::new(red, IVec3::ZERO));
    world.set_ambient_light(AmbientLight::white(1.0));

    let mut target = RgbaImage::new(64, 64);
    world.draw(&mut target);

    // Half a tile along -X moves 16 pixels right, half a tile up lifts it.
    let lift = world
        .ortho()
        .offset_to_screen_pixel(VIEW_NORTH as usize, IVec3::new(-512, 512, 0));
    assert_eq!(lift.x, 16);
    assert!(lift.y < -10);
    assert_eq!(pixel(&target, 40, 20), BLUE);
    assert_eq!(pixel(&target, 20, 40), RED);
    assert_eq!(pixel(&target, 56, 10), BLUE);
}

#[test]
fn test_later_temporary_wins_equal_height() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 8, 1024));
    let blue = world
        .registry_mut()
        .add_sprite_type(solid_sprite(BLUE, FACING_VIEWER, 8, 1024));
    world.set_ambient_light(AmbientLight::white(1.0));
    world.add_temporary_sprite(SpriteInstance::new(red, IVec3::ZERO));
    world.add_temporary_sprite(SpriteInstance::new(blue, IVec3::ZERO));

    let mut target = RgbaImage::new(32, 32);
    world.draw(&mut target);
    assert_eq!(pixel(&target, 16, 16), BLUE);

    // Once cleared, the next frame repaints the area from the background.
    world.clear_temporary();
    world.set_ambient_light(AmbientLight::white(1.0));
    world.draw(&mut target);
    assert_eq!(pixel(&target, 16, 16), BLACK);
    assert_eq!(world.screen_buffers().height.get_pixel(16, 16).0[0], NO_HEIGHT);
}

#[test]
fn test_camera_turn_recycles_blocks() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 32, 1024));
    for i in 0..100 {
        let location = IVec3::new((i % 10 - 5) * 1024, 0, (i / 10 - 5) * 1024);
        world.add_background_sprite(SpriteInstance::new(red, location));
    }
    let mut target = RgbaImage::new(320, 240);
    world.draw(&mut target);
    let previous = world.ortho().view(VIEW_NORTH as usize).id;
    assert!(world
        .blocks()
        .iter()
        .any(|block| block.state == BlockState::Ready && block.camera_id == previous));

    world.set_camera_direction_index(VIEW_NORTH + 1);
    world.draw(&mut target);
    let current = world.ortho().view((VIEW_NORTH + 1) as usize).id;
    for block in world.blocks() {
        assert!(!(block.state == BlockState::Ready && block.camera_id == previous));
        if block.state != BlockState::Unused {
            assert_eq!(block.camera_id, current);
        }
    }
}

#[test]
fn test_edit_under_other_camera_reaches_cached_blocks() {
    // --- 1. Setup: cache an empty scene under the north camera ---
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 32, 1024));
    world.set_ambient_light(AmbientLight::white(1.0));
    let mut target = RgbaImage::new(1024, 1024);
    world.draw(&mut target);

    // --- 2. Add a sprite eight tiles along X while another camera is selected ---
    world.set_camera_direction_index(VIEW_NORTH + 2);
    world.add_background_sprite(SpriteInstance::new(red, IVec3::new(8 * 1024, 0, 0)));
    world.set_camera_direction_index(VIEW_NORTH);
    world.draw(&mut target);

    // --- 3. Assert: the cached north blocks were rebuilt with the sprite ---
    let axis = world.ortho().view(VIEW_NORTH as usize).pixel_offset_per_tile_x;
    let expected = IVec2::new(512, 512) + axis * 8;
    assert_eq!(expected, IVec2::new(256, 512));
    assert_eq!(pixel(&target, expected.x as u32, expected.y as u32), RED);
}

#[test]
fn test_camera_round_trip_is_bit_exact() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 24, 1024));
    let blue = world
        .registry_mut()
        .add_sprite_type(solid_sprite(BLUE, FACING_VIEWER, 16, 1024));
    for i in 0..12 {
        let kind = if i % 2 == 0 { red } else { blue };
        world.add_background_sprite(SpriteInstance::new(kind, IVec3::new(i * 700 - 4000, i * 90, i * 300)));
    }
    world.set_ambient_light(AmbientLight::white(1.0));
    let mut before = RgbaImage::new(96, 80);
    world.draw(&mut before);

    let view = world.ortho().view(VIEW_NORTH as usize).clone();
    let step = view.pixel_offset_per_tile_x * 3 + view.pixel_offset_per_tile_z * 2;
    world.move_camera_in_pixels(step);
    assert_eq!(world.camera_location(), IVec3::new(3 * 1024, 0, 2 * 1024));
    let mut moved = RgbaImage::new(96, 80);
    world.draw(&mut moved);
    assert_ne!(moved, before);

    world.move_camera_in_pixels(-step);
    let mut after = RgbaImage::new(96, 80);
    world.draw(&mut after);
    assert_eq!(after, before);
}

#[test]
fn test_second_directed_light_adds() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 16, 1024));
    world.add_background_sprite(SpriteInstance::new(red, IVec3::ZERO));
    // Camera forward of the north view: light travelling with the camera hits
    // surfaces that face the viewer head on.
    let towards_scene = Vec3::new(0.0, 0.0, 1.0);
    let mut target = RgbaImage::new(32, 32);

    world.add_temporary_directed_light(DirectedLight::new(towards_scene, 0.5));
    world.draw(&mut target);
    let single = world.light_buffer().get_pixel(16, 16).0;
    assert_eq!(single[0], 64);

    world.add_temporary_directed_light(DirectedLight::new(towards_scene, 0.5));
    world.draw(&mut target);
    let double = world.light_buffer().get_pixel(16, 16).0;
    assert_eq!(double[0], 128);
    assert_eq!(pixel(&target, 16, 16), RED);

    // The first light replaces the ambient term instead of adding to stale light.
    world.set_ambient_light(AmbientLight::white(0.5));
    world.draw(&mut target);
    assert_eq!(world.light_buffer().get_pixel(16, 16).0[0], 64 + 128);
}

#[test]
fn test_wall_casts_point_light_shadow() {
    // --- 1. Setup: lit ground, an invisible wall at x = 1 and a light near the origin ---
    let mut world = world();
    let ground = world
        .registry_mut()
        .add_sprite_type(solid_sprite([128, 128, 128, 255], FACING_UP, 200, 4096));
    let mut wall = solid_sprite(RED, FACING_VIEWER, 1, 2048);
    wall.frames[0].height = create_height(1, 1, NO_HEIGHT);
    wall.shadow_model = Some(ShadowMesh::from_flat_lists(
        &[1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, -1.0],
        &[0, 1, 2, 0, 2, 3],
    ));
    let wall = world.registry_mut().add_sprite_type(wall);
    world.add_background_sprite(SpriteInstance::new(ground, IVec3::ZERO).with_shadows(false));
    world.add_background_sprite(SpriteInstance::new(wall, IVec3::ZERO));
    world.add_temporary_point_light(
        PointLight::new(Vec3::new(0.0, 0.5, 0.0), 4.0, 1.0).with_shadows(true),
    );

    // --- 2. Draw ---
    let mut target = RgbaImage::new(200, 200);
    world.draw(&mut target);

    // --- 3. Assert: behind the wall is dark, the opposite side is lit ---
    let view = world.ortho().view(VIEW_NORTH as usize);
    let behind = view.position_to_screen_pixel(IVec3::new(2048, 0, 0), IVec2::new(100, 100));
    let open = view.position_to_screen_pixel(IVec3::new(-2048, 0, 0), IVec2::new(100, 100));
    let light = world.light_buffer();
    assert_eq!(light.get_pixel(behind.x as u32, behind.y as u32).0[0], 0);
    assert!(light.get_pixel(open.x as u32, open.y as u32).0[0] > 4);

    // Without shadows both sides are lit alike.
    world.clear_temporary();
    world.add_temporary_point_light(PointLight::new(Vec3::new(0.0, 0.5, 0.0), 4.0, 1.0));
    world.draw(&mut target);
    let light = world.light_buffer();
    assert!(light.get_pixel(behind.x as u32, behind.y as u32).0[0] > 4);
}

#[test]
fn test_remove_background_sprites() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 16, 1024));
    world.add_background_sprite(SpriteInstance::new(red, IVec3::ZERO).with_user_data(1));
    world.add_background_sprite(SpriteInstance::new(red, IVec3::new(8192, 0, 0)).with_user_data(2));
    world.set_ambient_light(AmbientLight::white(1.0));
    let mut target = RgbaImage::new(32, 32);
    world.draw(&mut target);
    assert_eq!(pixel(&target, 16, 16), RED);

    let removed = world.remove_background_sprites(IVec3::splat(-100), IVec3::splat(100), |sprite| {
        if sprite.user_data == 1 {
            OctreeAction::Erase
        } else {
            OctreeAction::None
        }
    });
    assert_eq!(removed, 1);
    assert_eq!(world.background_counts(), (1, 0));
    world.draw(&mut target);
    assert_eq!(pixel(&target, 16, 16), BLACK);
}

#[test]
fn test_debug_octrees_overlay() {
    let mut world = world();
    let red = world
        .registry_mut()
        .add_sprite_type(solid_sprite(RED, FACING_VIEWER, 16, 1024));
    world.add_background_sprite(SpriteInstance::new(red, IVec3::ZERO));
    let mut target = RgbaImage::new(128, 128);
    world.debug_octrees(&mut target);
    assert!(target.pixels().any(|p| p.0[1] > 0 && p.0[3] == 255));
}
