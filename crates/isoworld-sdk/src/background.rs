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

//! # Background Blocks
//!
//! Passive content is rendered once into square G-buffer blocks aligned to a
//! fixed grid in camera-independent screen space. A frame only composites
//! the blocks it sees and rebuilds the ones that were invalidated.

use isoworld_core::math::{floor_div, IAabb, IRect, IVec2};
use isoworld_core::ortho::OrthoView;
use isoworld_core::spatial::Octree;
use isoworld_core::{DirtyRectangles, GBuffer, ModelInstance, OrthoSystem, Registry, SpriteInstance};
use isoworld_lanes::{draw_dense_model, draw_sprite, Higher, NormalizedNormals};

/// Side length of a block in pixels.
pub const BLOCK_SIZE: i32 = 512;

/// Blocks further than this many pixels outside the visible region are recycled.
pub const MAX_DISTANCE: i32 = 1024;

/// Lifecycle of a cached block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// The slot is free for reuse.
    Unused,
    /// The buffers match the passive world.
    Ready,
    /// The buffers must be rebuilt before the next composite.
    Dirty,
}

/// One cached square of passive content.
#[derive(Debug, Clone)]
pub struct BackgroundBlock {
    /// The covered pixels in camera-independent screen space.
    pub world_region: IRect,
    /// The view the content was rendered for.
    pub camera_id: i32,
    /// Whether the content can be used.
    pub state: BlockState,
    /// Diffuse, normal and height of the passive content.
    pub buffers: GBuffer,
}

/// The passive world a block is rendered from.
#[derive(Clone, Copy)]
pub struct PassiveScene<'a> {
    /// Background sprites keyed by location.
    pub sprites: &'a Octree<SpriteInstance>,
    /// Background models keyed by position.
    pub models: &'a Octree<ModelInstance>,
    /// Types referenced by the instances.
    pub registry: &'a Registry,
}

/// Block list with a free list of recycled slots.
#[derive(Debug, Clone, Default)]
pub struct BlockCache {
    blocks: Vec<BackgroundBlock>,
    free_list: Vec<usize>,
}

impl BlockCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every slot, including unused ones.
    pub fn blocks(&self) -> &[BackgroundBlock] {
        &self.blocks
    }

    /// Number of slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Makes every block of the view covering `seen` ready.
    pub fn cover(&mut self, seen: IRect, view: &OrthoView, scene: &PassiveScene<'_>) {
        if seen.is_empty() {
            return;
        }
        self.recycle_far(seen);

        let align = |value: i32| floor_div(value, BLOCK_SIZE) * BLOCK_SIZE;
        let (left, top) = (align(seen.left), align(seen.top));
        let (right, bottom) = (align(seen.right() - 1), align(seen.bottom() - 1));
        for y in (top..=bottom).step_by(BLOCK_SIZE as usize) {
            for x in (left..=right).step_by(BLOCK_SIZE as usize) {
                let region = IRect::new(x, y, BLOCK_SIZE, BLOCK_SIZE);
                match self.find(region, view.id) {
                    Some(index) => {
                        if self.blocks[index].state == BlockState::Dirty {
                            self.build(index, view, scene, true);
                        }
                    }
                    None => {
                        self.recycle_other_cameras(view.id);
                        let (index, reused) = self.acquire(region, view.id);
                        self.build(index, view, scene, reused);
                    }
                }
            }
        }
    }

    /// Marks ready blocks of the view containing a world-region pixel as dirty.
    pub fn invalidate_block_at(&mut self, point: IVec2, camera_id: i32) {
        for block in &mut self.blocks {
            if block.state == BlockState::Ready
                && block.camera_id == camera_id
                && block.world_region.contains_point(point)
            {
                block.state = BlockState::Dirty;
            }
        }
    }

    /// Marks ready blocks of `camera_id` overlapping a world region as dirty.
    ///
    /// The region says nothing about where the change lands in other views,
    /// so their ready blocks are all marked dirty.
    pub fn invalidate_region(&mut self, region: IRect, camera_id: i32) {
        for block in &mut self.blocks {
            if block.state == BlockState::Ready
                && (block.camera_id != camera_id || block.world_region.overlaps(&region))
            {
                block.state = BlockState::Dirty;
            }
        }
    }

    /// Marks ready blocks showing any part of a mini-tile box as dirty,
    /// projecting the box through each block's own view.
    pub fn invalidate_box(&mut self, bound: &IAabb, ortho: &OrthoSystem) {
        let regions: Vec<IRect> = ortho
            .views()
            .map(|view| view.project_box(bound, IVec2::ZERO))
            .collect();
        for block in &mut self.blocks {
            if block.state != BlockState::Ready {
                continue;
            }
            let touched = usize::try_from(block.camera_id)
                .ok()
                .and_then(|id| regions.get(id))
                .map_or(true, |region| block.world_region.overlaps(region));
            if touched {
                block.state = BlockState::Dirty;
            }
        }
    }

    /// Copies the ready blocks of the view into `target`, restricted to the
    /// dirty rectangles. `seen` places the target in world-region space.
    pub fn composite(&self, target: &mut GBuffer, seen: IRect, camera_id: i32, dirty: &DirtyRectangles) {
        for block in &self.blocks {
            if block.state != BlockState::Ready
                || block.camera_id != camera_id
                || !block.world_region.overlaps(&seen)
            {
                continue;
            }
            let on_screen = block
                .world_region
                .offset(IVec2::new(-seen.left, -seen.top));
            for rect in dirty.rectangles() {
                let part = on_screen.intersection(rect);
                if part.is_empty() {
                    continue;
                }
                let source = part.offset(IVec2::new(-on_screen.left, -on_screen.top));
                target.copy_region_from(part.left, part.top, &block.buffers, source);
            }
        }
    }

    fn find(&self, region: IRect, camera_id: i32) -> Option<usize> {
        self.blocks.iter().position(|block| {
            block.state != BlockState::Unused
                && block.camera_id == camera_id
                && block.world_region == region
        })
    }

    fn recycle(&mut self, index: usize) {
        self.blocks[index].state = BlockState::Unused;
        self.free_list.push(index);
    }

    fn recycle_other_cameras(&mut self, camera_id: i32) {
        for index in 0..self.blocks.len() {
            let block = &self.blocks[index];
            if block.state != BlockState::Unused && block.camera_id != camera_id {
                self.recycle(index);
            }
        }
    }

    fn recycle_far(&mut self, seen: IRect) {
        let near = IRect::from_bounds(
            seen.left - MAX_DISTANCE,
            seen.top - MAX_DISTANCE,
            seen.right() + MAX_DISTANCE,
            seen.bottom() + MAX_DISTANCE,
        );
        for index in 0..self.blocks.len() {
            let block = &self.blocks[index];
            if block.state != BlockState::Unused && !block.world_region.overlaps(&near) {
                self.recycle(index);
            }
        }
    }

    /// Returns a slot for the region, and whether it held older content.
    fn acquire(&mut self, region: IRect, camera_id: i32) -> (usize, bool) {
        if let Some(index) = self.free_list.pop() {
            let block = &mut self.blocks[index];
            block.world_region = region;
            block.camera_id = camera_id;
            block.state = BlockState::Dirty;
            return (index, true);
        }
        self.blocks.push(BackgroundBlock {
            world_region: region,
            camera_id,
            state: BlockState::Dirty,
            buffers: GBuffer::new(BLOCK_SIZE as u32, BLOCK_SIZE as u32),
        });
        (self.blocks.len() - 1, false)
    }

    fn build(&mut self, index: usize, view: &OrthoView, scene: &PassiveScene<'_>, clear: bool) {
        let block = &mut self.blocks[index];
        if clear {
            block.buffers.clear(true);
        }
        let region = block.world_region;
        let world_centre = IVec2::new(-region.left, -region.top);
        let buffers = &mut block.buffers;
        let mut sprites = 0usize;
        let mut models = 0usize;

        scene.sprites.for_each(
            |bound| view.project_box(bound, IVec2::ZERO).overlaps(&region),
            |instance, _| {
                let sprite_type = scene.registry.sprite_type(instance.type_index);
                draw_sprite::<Higher>(buffers, None, view, world_centre, sprite_type, instance);
                sprites += 1;
            },
        );
        scene.models.for_each(
            |bound| view.project_box(bound, IVec2::ZERO).overlaps(&region),
            |instance, _| {
                let model_type = scene.registry.model_type(instance.type_index);
                draw_dense_model::<Higher, NormalizedNormals>(
                    buffers,
                    None,
                    view,
                    world_centre,
                    &model_type.visible,
                    &instance.location,
                );
                models += 1;
            },
        );
        block.state = BlockState::Ready;
        log::debug!(
            "Built block at ({}, {}) for view {}: {sprites} sprites, {models} models",
            region.left,
            region.top,
            view.id
        );
    }
}
