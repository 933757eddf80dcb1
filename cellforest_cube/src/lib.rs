// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cube (octree) cell geometry: [`CubeKey`] is a Morton code over the
//! cell's index at its own level plus the level itself. Subdivision always
//! produces eight children; the six face neighbors come straight from the
//! Morton codec.

#![no_std]

use cellforest_core::{Aabb3, CellError, Direction, Point3, SpatialKey, World, MAX_LEVEL};

/// SFC key for a cube cell: a Morton code over the cell's per-level index,
/// plus the level.
///
/// Ordering is `(level, morton)`: two keys at different levels never
/// interleave, which keeps range scans within one level contiguous at the
/// cost of not giving a single global Morton order across levels (spec §4.3
/// open question — see `DESIGN.md`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeKey {
    /// Morton code of the cell's index within the `2^level` lattice at this
    /// level (not the absolute world lattice coordinate).
    morton: u64,
    level: u8,
}

impl CubeKey {
    /// Construct directly from a level-relative Morton code. `morton` must
    /// only use the low `3 * level` bits; higher bits are ignored.
    pub const fn from_parts(morton: u64, level: u8) -> Self {
        let mask = if level >= 21 {
            u64::MAX
        } else {
            (1u64 << (3 * level as u32)) - 1
        };
        Self {
            morton: morton & mask,
            level,
        }
    }

    /// The raw level-relative Morton code.
    pub const fn morton(&self) -> u64 {
        self.morton
    }

    /// The cell's index `(x, y, z)` within the `2^level` lattice at this
    /// level.
    pub const fn cell_index(&self) -> (u32, u32, u32) {
        cellforest_morton::decode(self.morton)
    }

    /// The cell's anchor (minimum corner) in world space.
    pub fn anchor(&self, world: &World) -> Point3 {
        let (x, y, z) = self.cell_index();
        let shift = (MAX_LEVEL - self.level) as u32;
        let grid = cellforest_core::UPoint3::new(x << shift, y << shift, z << shift);
        world.from_grid(grid)
    }

    /// The cell's world-space AABB.
    pub fn aabb(&self, world: &World) -> Aabb3 {
        let min = self.anchor(world);
        let len = world.length_at_level(self.level);
        Aabb3::new(min, min + Point3::splat(len))
    }

    /// Locate the cube cell at `level` containing `point`.
    pub fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError> {
        let grid = world.to_grid(point)?;
        let shift = (MAX_LEVEL - level) as u32;
        let morton = cellforest_morton::encode(grid.x >> shift, grid.y >> shift, grid.z >> shift);
        Ok(Self::from_parts(morton, level))
    }

    /// The face neighbor of this cell in `direction`, or `None` at the
    /// world boundary.
    pub fn neighbor(&self, direction: Direction) -> Option<Self> {
        let bound = 1u32 << self.level;
        cellforest_morton::neighbor(self.morton, direction, bound)
            .map(|m| Self::from_parts(m, self.level))
    }

    /// All six face neighbors, `None` where the cell is on the world
    /// boundary in that direction.
    pub fn all_neighbors(&self) -> [Option<Self>; 6] {
        let mut out = [None; 6];
        for (slot, direction) in out.iter_mut().zip(Direction::ALL) {
            *slot = self.neighbor(direction);
        }
        out
    }
}

impl PartialOrd for CubeKey {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CubeKey {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.level.cmp(&other.level).then(self.morton.cmp(&other.morton))
    }
}

impl SpatialKey for CubeKey {
    fn root() -> Self {
        Self::from_parts(0, 0)
    }

    fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError> {
        Self::locate(world, point, level)
    }

    fn level(&self) -> u8 {
        self.level
    }

    fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            None
        } else {
            Some(Self::from_parts(cellforest_morton::parent(self.morton), self.level - 1))
        }
    }

    fn child(&self, child_index: u8) -> Result<Self, CellError> {
        if self.level >= MAX_LEVEL {
            return Err(CellError::MaxLevelExceeded { level: self.level });
        }
        if child_index >= 8 {
            return Err(CellError::InvalidKey);
        }
        Ok(Self::from_parts(
            cellforest_morton::child(self.morton, child_index),
            self.level + 1,
        ))
    }

    fn bounding_aabb(&self, world: &World) -> Aabb3 {
        self.aabb(world)
    }

    fn contains_point(&self, world: &World, point: Point3) -> bool {
        let aabb = self.aabb(world);
        point.x >= aabb.min.x
            && point.y >= aabb.min.y
            && point.z >= aabb.min.z
            && point.x < aabb.max.x
            && point.y < aabb.max.y
            && point.z < aabb.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::GRID_RESOLUTION;
    use proptest::prelude::*;

    #[test]
    fn locate_is_stable_for_points_in_cell() {
        let world = World::default_grid();
        let level = 10;
        let p = Point3::new(123.0, 456.0, 789.0);
        let key = CubeKey::locate(&world, p, level).unwrap();
        assert!(key.contains_point(&world, p));
    }

    #[test]
    fn parent_child_round_trip() {
        let key = CubeKey::from_parts(cellforest_morton::encode(3, 5, 7), 4);
        for i in 0..8u8 {
            let child = key.child(i).unwrap();
            assert_eq!(child.parent().unwrap(), key);
        }
    }

    #[test]
    fn max_level_child_fails() {
        let key = CubeKey::from_parts(0, MAX_LEVEL);
        assert_eq!(
            key.child(0),
            Err(CellError::MaxLevelExceeded { level: MAX_LEVEL })
        );
    }

    #[test]
    fn neighbor_across_world_boundary_is_none() {
        let key = CubeKey::from_parts(cellforest_morton::encode(0, 0, 0), 3);
        assert_eq!(key.neighbor(Direction::MinusX), None);
        assert!(key.neighbor(Direction::PlusX).is_some());
    }

    proptest! {
        #[test]
        fn locate_matches_cell_for_every_sampled_point(
            gx in 0u32..GRID_RESOLUTION,
            gy in 0u32..GRID_RESOLUTION,
            gz in 0u32..GRID_RESOLUTION,
        ) {
            let world = World::default_grid();
            let p = world.from_grid(cellforest_core::UPoint3::new(gx, gy, gz));
            let key = CubeKey::locate(&world, p, 8).unwrap();
            prop_assert!(key.contains_point(&world, p));
        }
    }
}
