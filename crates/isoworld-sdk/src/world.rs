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

//! The `World` facade: the single owner of every buffer, instance and light
//! of a sprite world, and the per-frame pipeline that turns them into an image.

use crate::background::{BackgroundBlock, BlockCache, PassiveScene};
use image::Rgba;
use isoworld_core::image::RgbaImage;
use isoworld_core::light::{AmbientLight, DirectedLight, PointLight};
use isoworld_core::math::{IAabb, IRect, IVec2, IVec3, Mat3, Vec3};
use isoworld_core::ortho::{OrthoView, VIEW_COUNT};
use isoworld_core::spatial::{Octree, OctreeAction};
use isoworld_core::sprite::sprite_direction_rotation;
use isoworld_core::units::{correct_direction, floating_to_mini, mini_to_floating};
use isoworld_core::{
    DirtyRectangles, GBuffer, ModelInstance, OrthoSystem, Registry, SpriteInstance,
};
use isoworld_lanes::{
    blend_light, clear_light, directed_light, draw_dense_model, draw_sprite, point_light,
    HigherOrEqual, LightWrite, LinearNormals, ShadowCube,
};

/// A sprite world seen through one of eight fixed cameras.
///
/// Passive ("background") instances live in octrees and are cached in
/// screen-aligned blocks. Temporary instances and lights are redrawn every
/// frame until [`World::clear_temporary`].
///
/// # Examples
///
/// ```rust,ignore
/// let mut world = World::new(OrthoSystem::new(-0.5, 32.0)?, 256);
/// let crate_type = world.registry_mut().load_sprite_type(Path::new("assets/crate"))?;
/// world.add_background_sprite(SpriteInstance::new(crate_type, IVec3::ZERO));
/// world.add_temporary_directed_light(DirectedLight::new(Vec3::new(1.0, -2.0, 0.5), 1.0));
/// world.draw(&mut target);
/// ```
pub struct World {
    ortho: OrthoSystem,
    registry: Registry,
    passive_sprites: Octree<SpriteInstance>,
    passive_models: Octree<ModelInstance>,
    temporary_sprites: Vec<SpriteInstance>,
    temporary_models: Vec<ModelInstance>,
    point_lights: Vec<PointLight>,
    directed_lights: Vec<DirectedLight>,
    ambient: AmbientLight,
    camera_index: usize,
    camera_location: IVec3,
    last_drawn_camera: Option<(usize, IVec3)>,
    screen: GBuffer,
    light: RgbaImage,
    blocks: BlockCache,
    dirty: DirtyRectangles,
    shadow_cube: ShadowCube,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Panics
    /// Panics if `shadow_resolution` is zero.
    pub fn new(ortho: OrthoSystem, shadow_resolution: u32) -> Self {
        Self {
            ortho,
            registry: Registry::new(),
            passive_sprites: Octree::new(),
            passive_models: Octree::new(),
            temporary_sprites: Vec::new(),
            temporary_models: Vec::new(),
            point_lights: Vec::new(),
            directed_lights: Vec::new(),
            ambient: AmbientLight::NONE,
            camera_index: 0,
            camera_location: IVec3::ZERO,
            last_drawn_camera: None,
            screen: GBuffer::new(0, 0),
            light: RgbaImage::new(0, 0),
            blocks: BlockCache::new(),
            dirty: DirtyRectangles::new(0, 0),
            shadow_cube: ShadowCube::new(shadow_resolution),
        }
    }

    /// The projection shared by every camera.
    pub fn ortho(&self) -> &OrthoSystem {
        &self.ortho
    }

    /// The sprite and model types.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access for loading types. Types must not change once instances use them.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    fn view(&self) -> &OrthoView {
        self.ortho.view(self.camera_index)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Background
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a passive sprite and repaints the area it covers.
    ///
    /// # Panics
    /// Panics if the sprite type is not registered.
    pub fn add_background_sprite(&mut self, instance: SpriteInstance) {
        let bound = self
            .registry
            .sprite_type(instance.type_index)
            .instance_bound(instance.mini_location, instance.direction);
        self.passive_sprites
            .insert(instance, instance.mini_location, bound.min, bound.max);
        self.update_passive_box(&bound);
    }

    /// Adds a passive model and repaints the area it covers.
    ///
    /// # Panics
    /// Panics if the model type is not registered.
    pub fn add_background_model(&mut self, instance: ModelInstance) {
        let bound = self
            .registry
            .model_type(instance.type_index)
            .instance_bound(&instance.location);
        let p = instance.location.position;
        let origin = IVec3::new(floating_to_mini(p.x), floating_to_mini(p.y), floating_to_mini(p.z));
        self.passive_models.insert(instance, origin, bound.min, bound.max);
        self.update_passive_box(&bound);
    }

    /// Calls `filter` on every passive sprite overlapping the inclusive
    /// mini-tile box and removes those it erases. Returns the removed count.
    pub fn remove_background_sprites<F>(&mut self, min: IVec3, max: IVec3, mut filter: F) -> usize
    where
        F: FnMut(&SpriteInstance) -> OctreeAction,
    {
        let mut removed = Vec::new();
        self.passive_sprites.map_region(min, max, |instance, info| {
            let action = filter(instance);
            if action == OctreeAction::Erase {
                removed.push(info.bound);
            }
            action
        });
        for bound in &removed {
            self.update_passive_box(bound);
        }
        removed.len()
    }

    /// Model counterpart of [`World::remove_background_sprites`].
    pub fn remove_background_models<F>(&mut self, min: IVec3, max: IVec3, mut filter: F) -> usize
    where
        F: FnMut(&ModelInstance) -> OctreeAction,
    {
        let mut removed = Vec::new();
        self.passive_models.map_region(min, max, |instance, info| {
            let action = filter(instance);
            if action == OctreeAction::Erase {
                removed.push(info.bound);
            }
            action
        });
        for bound in &removed {
            self.update_passive_box(bound);
        }
        removed.len()
    }

    /// Number of passive sprites and models.
    pub fn background_counts(&self) -> (usize, usize) {
        (self.passive_sprites.len(), self.passive_models.len())
    }

    /// Rebuilds the current camera's cached blocks overlapping a
    /// camera-independent screen region and repaints the whole screen on the
    /// next draw. Blocks cached for other cameras are rebuilt when next used.
    pub fn update_passive_region(&mut self, region: IRect) {
        let camera_id = self.view().id;
        self.blocks.invalidate_region(region, camera_id);
        self.dirty.mark_all_dirty();
    }

    fn update_passive_box(&mut self, bound: &IAabb) {
        self.blocks.invalidate_box(bound, &self.ortho);
        self.dirty.mark_all_dirty();
    }

    /// Marks the current camera's block containing a camera-independent
    /// screen pixel for rebuilding.
    pub fn invalidate_block_at(&mut self, point: IVec2) {
        let camera_id = self.view().id;
        self.blocks.invalidate_block_at(point, camera_id);
        self.dirty.mark_all_dirty();
    }

    /// Every block slot, for inspection.
    pub fn blocks(&self) -> &[BackgroundBlock] {
        self.blocks.blocks()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Temporaries
    // ─────────────────────────────────────────────────────────────────────

    /// Draws a sprite on top of the background until the next clear.
    pub fn add_temporary_sprite(&mut self, instance: SpriteInstance) {
        self.temporary_sprites.push(instance);
    }

    /// Draws a model on top of the background until the next clear.
    pub fn add_temporary_model(&mut self, instance: ModelInstance) {
        self.temporary_models.push(instance);
    }

    /// Adds a point light until the next clear.
    pub fn add_temporary_point_light(&mut self, light: PointLight) {
        self.point_lights.push(light);
    }

    /// Adds a directional light until the next clear. The first one of a
    /// frame replaces the ambient light, later ones add to it.
    pub fn add_temporary_directed_light(&mut self, light: DirectedLight) {
        self.directed_lights.push(light);
    }

    /// Removes every temporary instance and light.
    pub fn clear_temporary(&mut self) {
        self.temporary_sprites.clear();
        self.temporary_models.clear();
        self.point_lights.clear();
        self.directed_lights.clear();
    }

    /// Sets the light used where no directional light is given.
    pub fn set_ambient_light(&mut self, ambient: AmbientLight) {
        self.ambient = ambient;
    }

    /// The ambient light.
    pub fn ambient_light(&self) -> AmbientLight {
        self.ambient
    }

    // ─────────────────────────────────────────────────────────────────────
    // Camera
    // ─────────────────────────────────────────────────────────────────────

    /// Places the camera on a mini-tile location.
    pub fn set_camera_location(&mut self, location: IVec3) {
        self.camera_location = location;
    }

    /// The camera's mini-tile location.
    pub fn camera_location(&self) -> IVec3 {
        self.camera_location
    }

    /// Moves the camera by a screen offset, converted to a ground-plane
    /// mini-tile offset of the current view.
    pub fn move_camera_in_pixels(&mut self, offset: IVec2) {
        let delta = self.view().pixel_to_mini_offset(offset);
        self.camera_location = self.camera_location + delta;
    }

    /// Selects one of the eight views; any integer wraps around.
    pub fn set_camera_direction_index(&mut self, index: i32) {
        self.camera_index = correct_direction(index) as usize % VIEW_COUNT;
    }

    /// The selected view index.
    pub fn camera_direction_index(&self) -> usize {
        self.camera_index
    }

    /// Pixel of the world origin in a target of the given size.
    pub fn world_centre(&self, width: u32, height: u32) -> IVec2 {
        IVec2::new(width as i32 / 2, height as i32 / 2)
            - self.view().offset_to_screen_pixel(self.camera_location)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame
    // ─────────────────────────────────────────────────────────────────────

    /// The screen G-buffer of the last frame.
    pub fn screen_buffers(&self) -> &GBuffer {
        &self.screen
    }

    /// The light buffer of the last frame.
    pub fn light_buffer(&self) -> &RgbaImage {
        &self.light
    }

    /// Renders a frame into `target`.
    pub fn draw(&mut self, target: &mut RgbaImage) {
        let (width, height) = target.dimensions();
        let world_centre = self.world_centre(width, height);
        let view = self.ortho.view(self.camera_index);

        if self.screen.diffuse.dimensions() != (width, height) {
            self.screen = GBuffer::new(width, height);
            self.light = RgbaImage::new(width, height);
        }
        self.screen.assert_consistent();
        let seen = IRect::new(-world_centre.x, -world_centre.y, width as i32, height as i32);

        if self.dirty.set_dimensions(width as i32, height as i32) {
            self.dirty.mark_all_dirty();
        }
        let camera = (self.camera_index, self.camera_location);
        if self.last_drawn_camera != Some(camera) {
            self.dirty.mark_all_dirty();
            self.last_drawn_camera = Some(camera);
        }

        let scene = PassiveScene {
            sprites: &self.passive_sprites,
            models: &self.passive_models,
            registry: &self.registry,
        };
        self.blocks.cover(seen, view, &scene);
        self.blocks.composite(&mut self.screen, seen, view.id, &self.dirty);
        self.dirty.reset();

        for instance in &self.temporary_sprites {
            let sprite_type = self.registry.sprite_type(instance.type_index);
            let rect = draw_sprite::<HigherOrEqual>(
                &mut self.screen,
                None,
                view,
                world_centre,
                sprite_type,
                instance,
            );
            self.dirty.insert(rect);
        }
        for instance in &self.temporary_models {
            let model_type = self.registry.model_type(instance.type_index);
            let rect = draw_dense_model::<HigherOrEqual, LinearNormals>(
                &mut self.screen,
                None,
                view,
                world_centre,
                &model_type.visible,
                &instance.location,
            );
            self.dirty.insert(rect);
        }

        match self.directed_lights.split_first() {
            Some((first, rest)) => {
                let overwrite = LightWrite::Overwrite(self.ambient);
                directed_light(view, &self.screen.normal, &mut self.light, first, overwrite);
                for light in rest {
                    directed_light(view, &self.screen.normal, &mut self.light, light, LightWrite::Add);
                }
            }
            None => clear_light(&mut self.light, &self.ambient),
        }

        for light in &self.point_lights {
            let shadow = if light.shadow_casting {
                self.shadow_cube.clear();
                render_shadow_casters(
                    &mut self.shadow_cube,
                    view,
                    light,
                    &self.registry,
                    &self.passive_sprites,
                    &self.passive_models,
                    &self.temporary_sprites,
                    &self.temporary_models,
                );
                Some(&self.shadow_cube)
            } else {
                None
            };
            point_light(
                view,
                world_centre,
                &self.screen.normal,
                &self.screen.height,
                &mut self.light,
                light,
                shadow,
            );
        }

        blend_light(target, &self.screen.diffuse, &self.light);
    }

    /// Overlays the octree node bounds of the current view as wireframes.
    ///
    /// Sprite nodes are drawn in green and model nodes in blue, darker with depth.
    pub fn debug_octrees(&self, target: &mut RgbaImage) {
        let (width, height) = target.dimensions();
        let world_centre = self.world_centre(width, height);
        let view = self.view();
        let shade = |depth: usize| 255u8.saturating_sub((depth * 24).min(200) as u8);
        self.passive_sprites.for_each_node_bound(|_, bound, depth| {
            draw_box(target, view, world_centre, bound, Rgba([0, shade(depth), 0, 255]));
        });
        self.passive_models.for_each_node_bound(|_, bound, depth| {
            draw_box(target, view, world_centre, bound, Rgba([0, 0, shade(depth), 255]));
        });
    }
}

/// Renders every shadow caster within reach of `light` into the cube.
#[allow(clippy::too_many_arguments)]
fn render_shadow_casters(
    cube: &mut ShadowCube,
    view: &OrthoView,
    light: &PointLight,
    registry: &Registry,
    passive_sprites: &Octree<SpriteInstance>,
    passive_models: &Octree<ModelInstance>,
    temporary_sprites: &[SpriteInstance],
    temporary_models: &[ModelInstance],
) {
    let world_to_light = view.normal_to_world_space.transpose();
    let centre = IVec3::new(
        floating_to_mini(light.position.x),
        floating_to_mini(light.position.y),
        floating_to_mini(light.position.z),
    );
    let reach = IAabb::from_min_max(
        centre - IVec3::splat(floating_to_mini(light.radius)),
        centre + IVec3::splat(floating_to_mini(light.radius)),
    );
    let mut casters = 0usize;

    let mut cast_sprite = |cube: &mut ShadowCube, instance: &SpriteInstance| {
        if !instance.shadow_casting {
            return;
        }
        let Some(mesh) = &registry.sprite_type(instance.type_index).shadow_model else {
            return;
        };
        let location = instance.mini_location;
        let position = Vec3::new(
            mini_to_floating(location.x),
            mini_to_floating(location.y),
            mini_to_floating(location.z),
        );
        let rotation: Mat3 = world_to_light * sprite_direction_rotation(instance.direction);
        cube.render_caster(mesh, rotation, world_to_light * (position - light.position));
        casters += 1;
    };
    passive_sprites.for_each(|bound| bound.intersects(&reach), |instance, _| cast_sprite(cube, instance));
    for instance in temporary_sprites {
        cast_sprite(cube, instance);
    }

    let mut cast_model = |cube: &mut ShadowCube, instance: &ModelInstance| {
        if !instance.shadow_casting {
            return;
        }
        let Some(mesh) = &registry.model_type(instance.type_index).shadow_mesh else {
            return;
        };
        let location = &instance.location;
        let rotation = world_to_light * location.rotation;
        cube.render_caster(mesh, rotation, world_to_light * (location.position - light.position));
        casters += 1;
    };
    passive_models.for_each(|bound| bound.intersects(&reach), |instance, _| cast_model(cube, instance));
    for instance in temporary_models {
        cast_model(cube, instance);
    }
    log::trace!("Rendered {casters} shadow casters for light at {:?}", light.position);
}

/// Draws the twelve projected edges of a mini-tile box.
fn draw_box(target: &mut RgbaImage, view: &OrthoView, world_centre: IVec2, bound: &IAabb, color: Rgba<u8>) {
    let corners = bound.corners().map(|corner| view.position_to_screen_pixel(corner, world_centre));
    for a in 0..8 {
        for bit in [1, 2, 4] {
            let b = a | bit;
            if b != a {
                draw_line(target, corners[a], corners[b], color);
            }
        }
    }
}

/// Clipped DDA line.
fn draw_line(target: &mut RgbaImage, from: IVec2, to: IVec2, color: Rgba<u8>) {
    let (width, height) = (target.width() as i32, target.height() as i32);
    let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).max(1);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (from.x as f32 + (to.x - from.x) as f32 * t).round() as i32;
        let y = (from.y as f32 + (to.y - from.y) as f32 * t).round() as i32;
        if x >= 0 && y >= 0 && x < width && y < height {
            target.put_pixel(x as u32, y as u32, color);
        }
    }
}
