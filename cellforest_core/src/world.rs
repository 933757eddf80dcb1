// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-point world bounds and the refinement-level constants all three
//! cell geometries share.

use crate::error::CellError;
use crate::geometry::{Aabb3, Point3};

/// Deepest refinement level, root is level 0.
pub const MAX_LEVEL: u8 = 21;

/// Width, in grid cells, of the level-`MAX_LEVEL` integer lattice along one
/// axis. Every cell geometry anchors and sizes its cells on this lattice
/// regardless of the world's real-valued size; [`World::to_grid`] and
/// [`World::from_grid`] are the fixed-point mapping between the two.
pub const GRID_RESOLUTION: u32 = 1 << MAX_LEVEL;

/// An integer grid coordinate at the finest lattice resolution
/// ([`GRID_RESOLUTION`] cells per axis).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UPoint3 {
    /// x grid index, in `[0, GRID_RESOLUTION)`.
    pub x: u32,
    /// y grid index, in `[0, GRID_RESOLUTION)`.
    pub y: u32,
    /// z grid index, in `[0, GRID_RESOLUTION)`.
    pub z: u32,
}

impl UPoint3 {
    /// Construct a grid point from raw lattice coordinates.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// A single axis-aligned cube `[0, size)^3` that bounds every stored
/// coordinate. World domains are always cubic and positive-coordinate; see
/// spec Non-goals for negative/non-cubic worlds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct World {
    size: f64,
}

impl World {
    /// Construct a world with the given edge length. `size` must be
    /// strictly positive; callers that pass a non-positive size get a world
    /// that rejects every coordinate (rather than panicking), since this
    /// constructor has no `Result` to report through.
    pub const fn new(size: f64) -> Self {
        Self { size }
    }

    /// The conventional default world, `[0, 2^21)^3`, used by the octree and
    /// tetree variants in the worked examples.
    pub const fn default_grid() -> Self {
        Self::new(GRID_RESOLUTION as f64)
    }

    /// The world's edge length.
    pub const fn size(&self) -> f64 {
        self.size
    }

    /// Edge length of a cell at `level`, `size / 2^level`.
    pub fn length_at_level(&self, level: u8) -> f64 {
        self.size / (1u64 << level) as f64
    }

    /// Whether `p` lies within `[0, size)^3`.
    pub fn contains_point(&self, p: Point3) -> bool {
        p.x >= 0.0
            && p.y >= 0.0
            && p.z >= 0.0
            && p.x < self.size
            && p.y < self.size
            && p.z < self.size
    }

    /// Whether `aabb` lies entirely within `[0, size)^3`.
    pub fn contains_aabb(&self, aabb: Aabb3) -> bool {
        self.contains_point(aabb.min) && self.contains_point(aabb.max)
    }

    /// Reject `p` if it falls outside the world, otherwise pass it through.
    ///
    /// Negative coordinates and coordinates `>= size` are both rejected; this
    /// is the single gate every public insertion/query entry point routes
    /// through before doing anything else (spec §4.1).
    pub fn clamp(&self, p: Point3) -> Result<Point3, CellError> {
        if self.contains_point(p) {
            Ok(p)
        } else {
            Err(CellError::CoordinateOutOfWorld {
                x: p.x,
                y: p.y,
                z: p.z,
            })
        }
    }

    /// Map a real-valued coordinate into the finest-resolution integer
    /// lattice used by the cell geometries.
    pub fn to_grid(&self, p: Point3) -> Result<UPoint3, CellError> {
        self.clamp(p)?;
        let scale = GRID_RESOLUTION as f64 / self.size;
        let gx = (p.x * scale) as u32;
        let gy = (p.y * scale) as u32;
        let gz = (p.z * scale) as u32;
        Ok(UPoint3::new(
            gx.min(GRID_RESOLUTION - 1),
            gy.min(GRID_RESOLUTION - 1),
            gz.min(GRID_RESOLUTION - 1),
        ))
    }

    /// Map an integer lattice coordinate back to a real-valued position (the
    /// minimum corner of that lattice cell).
    pub fn from_grid(&self, g: UPoint3) -> Point3 {
        let scale = self.size / GRID_RESOLUTION as f64;
        Point3::new(g.x as f64 * scale, g.y as f64 * scale, g.z as f64 * scale)
    }

    /// Suggest the coarsest level at which a cell is no larger than
    /// `target_extent` along any axis. Clamped to [`MAX_LEVEL`]. A
    /// convenience for bulk-load callers picking a starting resolution for a
    /// dataset's bounding box (not part of the distilled spec's contract,
    /// added as ambient tooling).
    pub fn max_level_for_size(&self, target_extent: f64) -> u8 {
        if target_extent <= 0.0 {
            return MAX_LEVEL;
        }
        let mut level = 0u8;
        while level < MAX_LEVEL && self.length_at_level(level + 1) >= target_extent {
            level += 1;
        }
        level
    }
}

impl Default for World {
    fn default() -> Self {
        Self::default_grid()
    }
}
