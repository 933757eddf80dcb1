// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The 1D linear half of a prism cell.

use cellforest_core::{CellError, GRID_RESOLUTION, MAX_LEVEL};

const fn cell_width(level: u8) -> u32 {
    GRID_RESOLUTION >> level
}

/// SFC key for the linear (depth) component of a prism cell: a binary
/// interval `[z, z+1) * cell_width(level)` on the grid lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineKey {
    index: u32,
    level: u8,
}

impl LineKey {
    /// The root interval, the whole `[0, GRID_RESOLUTION)` axis.
    pub const fn root() -> Self {
        Self { index: 0, level: 0 }
    }

    /// Refinement level.
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// The interval's index within the `2^level` lattice at this level.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Locate the interval at `level` containing grid coordinate `gz`.
    pub const fn locate(gz: u32, level: u8) -> Self {
        Self {
            index: gz >> (MAX_LEVEL - level),
            level,
        }
    }

    /// Whether grid coordinate `gz` lies within this interval.
    pub fn contains_grid_point(&self, gz: u32) -> bool {
        let width = cell_width(self.level);
        let start = self.index * width;
        gz >= start && gz < start + width
    }

    /// Child `i` (`0` or `1`).
    pub fn child(&self, i: u8) -> Result<Self, CellError> {
        if self.level >= MAX_LEVEL {
            return Err(CellError::MaxLevelExceeded { level: self.level });
        }
        if i >= 2 {
            return Err(CellError::InvalidKey);
        }
        Ok(Self {
            index: (self.index << 1) | i as u32,
            level: self.level + 1,
        })
    }

    /// The parent interval, `None` at the root.
    pub const fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            None
        } else {
            Some(Self {
                index: self.index >> 1,
                level: self.level - 1,
            })
        }
    }

    /// The `{-1, +1}` neighbor at the same level, `None` at the axis
    /// boundary.
    pub fn neighbor(&self, delta: i32) -> Option<Self> {
        let bound = 1u32 << self.level;
        let next = self.index as i64 + delta as i64;
        if next < 0 || next >= bound as i64 {
            None
        } else {
            Some(Self {
                index: next as u32,
                level: self.level,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_contains_and_round_trips() {
        let line = LineKey::locate(12345, 8);
        assert!(line.contains_grid_point(12345));
        let parent = line.parent().unwrap();
        assert_eq!(parent.level(), 7);
    }

    #[test]
    fn child_then_parent_is_identity() {
        let root = LineKey::root();
        for i in 0..2u8 {
            let child = root.child(i).unwrap();
            assert_eq!(child.parent().unwrap(), root);
        }
    }

    #[test]
    fn neighbor_respects_axis_boundary() {
        let line = LineKey::locate(0, 3);
        assert_eq!(line.neighbor(-1), None);
        assert!(line.neighbor(1).is_some());
    }
}
