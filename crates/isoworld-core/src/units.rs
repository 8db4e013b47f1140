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

//! World units and direction arithmetic.
//!
//! Positions are stored in integer mini-tiles so that projection to pixels is
//! deterministic. One tile is [`MINI_PER_TILE`] mini-tiles.

/// Number of mini-tile units in one tile.
pub const MINI_PER_TILE: i32 = 1024;

/// Reciprocal of [`MINI_PER_TILE`] for converting mini-tiles to floating tiles.
pub const TILES_PER_MINI: f32 = 1.0 / MINI_PER_TILE as f32;

/// Number of fixed camera and sprite directions.
pub const DIRECTION_COUNT: i32 = 8;

/// Wraps any direction into `0..8`.
///
/// # Examples
///
/// ```
/// use isoworld_core::units::correct_direction;
/// assert_eq!(correct_direction(-1), 7);
/// assert_eq!(correct_direction(17), 1);
/// ```
#[inline]
pub fn correct_direction(direction: i32) -> i32 {
    direction.rem_euclid(DIRECTION_COUNT)
}

/// Converts floating tiles into the nearest mini-tile count.
#[inline]
pub fn floating_to_mini(tiles: f32) -> i32 {
    (tiles * MINI_PER_TILE as f32).round() as i32
}

/// Converts mini-tiles into floating tiles.
#[inline]
pub fn mini_to_floating(mini: i32) -> f32 {
    mini as f32 * TILES_PER_MINI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_direction_is_periodic() {
        for d in -40..40 {
            let c = correct_direction(d);
            assert!((0..DIRECTION_COUNT).contains(&c));
            for k in -5..5 {
                assert_eq!(correct_direction(d + DIRECTION_COUNT * k), c);
            }
        }
    }

    #[test]
    fn test_mini_conversion() {
        assert_eq!(floating_to_mini(1.0), MINI_PER_TILE);
        assert_eq!(floating_to_mini(-0.5), -512);
        assert_eq!(mini_to_floating(512), 0.5);
    }
}
