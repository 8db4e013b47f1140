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

//! # Region-Doubling Octree
//!
//! Indexes values by an integer **origin** point while also tracking each
//! value's bounding box. Every node owns a fixed cubic region used to decide
//! where origins belong, and separately keeps the union of all bounding boxes
//! stored beneath it, which is what queries test against.
//!
//! The tree grows upwards: inserting an origin outside the root allocates a
//! new root of twice the size with the old root as one of its children.

use crate::math::{IAabb, IVec3};

const NULL_NODE: u32 = u32::MAX;

/// Number of direct leaves a node may hold before it starts using children.
pub const OCTREE_SPLIT_THRESHOLD: usize = 64;

/// Origins must stay within `±OCTREE_UNIVERSE_LIMIT` on every axis.
pub const OCTREE_UNIVERSE_LIMIT: i32 = 100_000_000;

/// Side length of the first root, in the same units as the origins.
const INITIAL_ROOT_SIZE: i64 = 1 << 14;

/// What to do with a leaf after visiting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctreeAction {
    /// Keep the leaf.
    None,
    /// Remove the leaf from the tree.
    Erase,
}

/// The spatial part of a leaf, passed to traversal callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeLeafInfo {
    /// The point deciding which node owns the leaf.
    pub origin: IVec3,
    /// The inclusive bounding box of the leaf.
    pub bound: IAabb,
}

#[derive(Debug, Clone)]
struct OctreeLeaf<T> {
    value: T,
    info: OctreeLeafInfo,
}

#[derive(Debug, Clone)]
struct OctreeNode<T> {
    /// Lower corner of the owned cube.
    region_min: IVec3,
    /// Side length of the owned cube.
    region_size: i64,
    /// Union of every leaf bound below this node.
    leaf_bound: Option<IAabb>,
    divided: bool,
    children: [u32; 8],
    leaves: Vec<OctreeLeaf<T>>,
}

impl<T> OctreeNode<T> {
    fn new(region_min: IVec3, region_size: i64) -> Self {
        Self {
            region_min,
            region_size,
            leaf_bound: None,
            divided: false,
            children: [NULL_NODE; 8],
            leaves: Vec::new(),
        }
    }

    fn owns(&self, origin: IVec3) -> bool {
        (0..3).all(|axis| {
            let min = self.region_min.get(axis) as i64;
            let value = origin.get(axis) as i64;
            value >= min && value < min + self.region_size
        })
    }

    /// Octant of `origin` within the owned region, one bit per axis.
    fn octant(&self, origin: IVec3) -> usize {
        let half = self.region_size / 2;
        (0..3).fold(0, |octant, axis| {
            let upper = origin.get(axis) as i64 >= self.region_min.get(axis) as i64 + half;
            octant | ((upper as usize) << axis)
        })
    }

    fn child_min(&self, octant: usize) -> IVec3 {
        let half = (self.region_size / 2) as i32;
        let step = |axis: usize| if octant & (1 << axis) != 0 { half } else { 0 };
        self.region_min + IVec3::new(step(0), step(1), step(2))
    }

    /// Leaves may only move into a child when at most a quarter of the owned size.
    ///
    /// Nodes of unit size have no children to move into.
    fn fits_child(&self, bound: &IAabb) -> bool {
        if self.region_size < 2 {
            return false;
        }
        let limit = self.region_size / 4;
        let size = bound.size();
        (0..3).all(|axis| size.get(axis) as i64 <= limit)
    }

    fn region(&self) -> IAabb {
        let extent = (self.region_size - 1) as i32;
        IAabb::from_min_max(self.region_min, self.region_min + IVec3::splat(extent))
    }

    fn grow_bound(&mut self, bound: &IAabb) {
        self.leaf_bound = Some(match &self.leaf_bound {
            Some(current) => current.merge(bound),
            None => *bound,
        });
    }
}

/// An arena-allocated octree of values keyed by origin.
#[derive(Debug, Clone)]
pub struct Octree<T> {
    root: u32,
    nodes: Vec<OctreeNode<T>>,
    len: usize,
}

impl<T> Default for Octree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Octree<T> {
    /// Creates an empty octree.
    pub fn new() -> Self {
        Self {
            root: NULL_NODE,
            nodes: Vec::new(),
            len: 0,
        }
    }

    /// Number of stored leaves.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no leaves are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every leaf and node.
    pub fn clear(&mut self) {
        self.root = NULL_NODE;
        self.nodes.clear();
        self.len = 0;
    }

    /// Inserts a value with its origin and inclusive bounds.
    ///
    /// # Panics
    /// Panics if the origin lies outside `±OCTREE_UNIVERSE_LIMIT`.
    pub fn insert(&mut self, value: T, origin: IVec3, min_bound: IVec3, max_bound: IVec3) {
        assert!(
            (0..3).all(|axis| origin.get(axis).abs() <= OCTREE_UNIVERSE_LIMIT),
            "Octree origin {origin:?} is outside the universe limit of ±{OCTREE_UNIVERSE_LIMIT}"
        );
        let leaf = OctreeLeaf {
            value,
            info: OctreeLeafInfo {
                origin,
                bound: IAabb::from_min_max(min_bound, max_bound),
            },
        };
        if self.root == NULL_NODE {
            self.root = self.allocate(Self::initial_region(origin), INITIAL_ROOT_SIZE);
        }
        self.expand_to(origin);
        self.insert_from(self.root, leaf);
        self.len += 1;
    }

    /// Visits every leaf accepted by `filter`, skipping subtrees whose
    /// combined bound is rejected.
    ///
    /// `filter` is called with node bounds and leaf bounds alike, so it must
    /// accept any box containing a box it would accept.
    pub fn map<F, O>(&mut self, mut filter: F, mut op: O)
    where
        F: FnMut(&IAabb) -> bool,
        O: FnMut(&mut T, &OctreeLeafInfo) -> OctreeAction,
    {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &mut self.nodes[index as usize];
            match &node.leaf_bound {
                Some(bound) if filter(bound) => {}
                _ => continue,
            }
            let mut i = 0;
            while i < node.leaves.len() {
                let leaf = &mut node.leaves[i];
                if filter(&leaf.info.bound) && op(&mut leaf.value, &leaf.info) == OctreeAction::Erase {
                    node.leaves.swap_remove(i);
                    self.len -= 1;
                } else {
                    i += 1;
                }
            }
            stack.extend(node.children.iter().copied().filter(|&c| c != NULL_NODE));
        }
    }

    /// Visits every leaf whose bound overlaps the inclusive search box.
    pub fn map_region<O>(&mut self, search_min: IVec3, search_max: IVec3, op: O)
    where
        O: FnMut(&mut T, &OctreeLeafInfo) -> OctreeAction,
    {
        let search = IAabb::from_min_max(search_min, search_max);
        self.map(|bound| bound.intersects(&search), op);
    }

    /// Read-only traversal with the same filtering rules as [`Octree::map`].
    pub fn for_each<F, O>(&self, mut filter: F, mut op: O)
    where
        F: FnMut(&IAabb) -> bool,
        O: FnMut(&T, &OctreeLeafInfo),
    {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            match &node.leaf_bound {
                Some(bound) if filter(bound) => {}
                _ => continue,
            }
            for leaf in &node.leaves {
                if filter(&leaf.info.bound) {
                    op(&leaf.value, &leaf.info);
                }
            }
            stack.extend(node.children.iter().copied().filter(|&c| c != NULL_NODE));
        }
    }

    /// Calls `op(owned_region, leaf_bound, depth)` for every node holding leaves below it.
    pub fn for_each_node_bound<O>(&self, mut op: O)
    where
        O: FnMut(&IAabb, &IAabb, usize),
    {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = vec![(self.root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = &self.nodes[index as usize];
            if let Some(bound) = &node.leaf_bound {
                op(&node.region(), bound, depth);
            }
            for &child in node.children.iter().filter(|&&c| c != NULL_NODE) {
                stack.push((child, depth + 1));
            }
        }
    }

    fn initial_region(origin: IVec3) -> IVec3 {
        let align = |value: i32| ((value as i64).div_euclid(INITIAL_ROOT_SIZE) * INITIAL_ROOT_SIZE) as i32;
        IVec3::new(align(origin.x), align(origin.y), align(origin.z))
    }

    fn allocate(&mut self, region_min: IVec3, region_size: i64) -> u32 {
        self.nodes.push(OctreeNode::new(region_min, region_size));
        (self.nodes.len() - 1) as u32
    }

    /// Re-roots until the root owns `origin`.
    fn expand_to(&mut self, origin: IVec3) {
        while !self.nodes[self.root as usize].owns(origin) {
            let old = &self.nodes[self.root as usize];
            let size = old.region_size;
            let old_min = old.region_min;
            let old_bound = old.leaf_bound;
            // Extend towards the origin on every axis where it lies below.
            let extend = |axis: usize| {
                let min = old_min.get(axis) as i64;
                if (origin.get(axis) as i64) < min { min - size } else { min }
            };
            let new_min = [extend(0), extend(1), extend(2)];
            assert!(
                new_min.iter().all(|&m| m >= -(i32::MAX as i64) && m + 2 * size <= i32::MAX as i64),
                "Octree cannot grow to cover origin {origin:?}"
            );
            let new_min = IVec3::new(new_min[0] as i32, new_min[1] as i32, new_min[2] as i32);
            let new_root = self.allocate(new_min, size * 2);
            let node = &mut self.nodes[new_root as usize];
            let octant = node.octant(old_min);
            node.children[octant] = self.root;
            node.divided = true;
            node.leaf_bound = old_bound;
            log::debug!("Octree: re-rooted to region {new_min:?} of size {}", size * 2);
            self.root = new_root;
        }
    }

    fn insert_from(&mut self, start: u32, leaf: OctreeLeaf<T>) {
        let mut index = start;
        loop {
            let node = &mut self.nodes[index as usize];
            node.grow_bound(&leaf.info.bound);
            if !(node.divided && node.fits_child(&leaf.info.bound)) {
                node.leaves.push(leaf);
                if !node.divided && node.leaves.len() > OCTREE_SPLIT_THRESHOLD {
                    self.divide(index);
                }
                return;
            }
            index = self.child_for(index, leaf.info.origin);
        }
    }

    /// Returns the child owning `origin`, allocating it if needed.
    fn child_for(&mut self, index: u32, origin: IVec3) -> u32 {
        let node = &self.nodes[index as usize];
        let octant = node.octant(origin);
        let existing = node.children[octant];
        if existing != NULL_NODE {
            return existing;
        }
        let child_min = node.child_min(octant);
        let child_size = node.region_size / 2;
        let child = self.allocate(child_min, child_size);
        self.nodes[index as usize].children[octant] = child;
        child
    }

    /// Marks a node as divided and pushes its small enough leaves down.
    ///
    /// Leaves sharing a single origin stay where they are, since every child
    /// would receive all of them again.
    fn divide(&mut self, index: u32) {
        let node = &mut self.nodes[index as usize];
        node.divided = true;
        let coincident = node
            .leaves
            .split_first()
            .is_some_and(|(first, rest)| rest.iter().all(|l| l.info.origin == first.info.origin));
        if coincident {
            log::trace!("Octree: keeping {} leaves with one origin at a divided node", node.leaves.len());
            return;
        }
        let leaves = std::mem::take(&mut node.leaves);
        for leaf in leaves {
            let node = &mut self.nodes[index as usize];
            if node.fits_child(&leaf.info.bound) {
                let child = self.child_for(index, leaf.info.origin);
                self.insert_from(child, leaf);
            } else {
                node.leaves.push(leaf);
            }
        }
    }
}
