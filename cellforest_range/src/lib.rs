// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LITMAX/BIGMIN SFC range engine: turns an axis-aligned grid box into the
//! minimal list of non-overlapping Morton-code intervals covering it.
//!
//! Only the cube variant consults this directly; the tetrahedral and prism
//! variants use it as a pruning hint over their shared cube-level bounding
//! box before applying their own exact containment tests.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

/// An inclusive axis-aligned box in grid-cell-index space, `[x.0, x.1] x
/// [y.0, y.1] x [z.0, z.1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBox {
    /// Inclusive `(min, max)` bound on x.
    pub x: (u32, u32),
    /// Inclusive `(min, max)` bound on y.
    pub y: (u32, u32),
    /// Inclusive `(min, max)` bound on z.
    pub z: (u32, u32),
}

impl GridBox {
    /// Construct a box from inclusive per-axis bounds.
    pub const fn new(x: (u32, u32), y: (u32, u32), z: (u32, u32)) -> Self {
        Self { x, y, z }
    }

    /// Whether the box is empty (inverted on any axis).
    pub const fn is_empty(&self) -> bool {
        self.x.0 > self.x.1 || self.y.0 > self.y.1 || self.z.0 > self.z.1
    }

    fn contains(&self, x: u32, y: u32, z: u32) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1 && z >= self.z.0 && z <= self.z.1
    }

    fn clamp_to_level(&self, level: u8) -> Self {
        let bound = (1u32 << level).saturating_sub(1);
        Self {
            x: (self.x.0.min(bound), self.x.1.min(bound)),
            y: (self.y.0.min(bound), self.y.1.min(bound)),
            z: (self.z.0.min(bound), self.z.1.min(bound)),
        }
    }
}

/// Minimal list of `(start, end)` Morton-key intervals (inclusive) covering
/// every cell of `box_` at `level`, in ascending order.
///
/// Implements the scan-and-jump algorithm: walk the SFC from the minimum
/// corner code, extending a run while contiguous codes stay inside the box,
/// and otherwise jumping forward via BIGMIN — raising any axis that fell
/// below the box back to its minimum, or stepping past one that overshot
/// the box's maximum.
pub fn covering_intervals(level: u8, box_: GridBox) -> Vec<(u64, u64)> {
    let mut intervals = Vec::new();
    if box_.is_empty() {
        return intervals;
    }
    let box_ = box_.clamp_to_level(level);
    let lattice_max = cellforest_morton::encode(
        (1u32 << level) - 1,
        (1u32 << level) - 1,
        (1u32 << level) - 1,
    );
    let corners = [
        (box_.x.0, box_.y.0, box_.z.0),
        (box_.x.1, box_.y.0, box_.z.0),
        (box_.x.0, box_.y.1, box_.z.0),
        (box_.x.1, box_.y.1, box_.z.0),
        (box_.x.0, box_.y.0, box_.z.1),
        (box_.x.1, box_.y.0, box_.z.1),
        (box_.x.0, box_.y.1, box_.z.1),
        (box_.x.1, box_.y.1, box_.z.1),
    ];
    let mut current = corners
        .iter()
        .map(|&(x, y, z)| cellforest_morton::encode(x, y, z))
        .min()
        .expect("eight corners");

    while current <= lattice_max {
        let (x, y, z) = cellforest_morton::decode(current);
        if box_.contains(x, y, z) {
            let start = current;
            loop {
                if current == lattice_max {
                    break;
                }
                let next = current + 1;
                let (nx, ny, nz) = cellforest_morton::decode(next);
                if box_.contains(nx, ny, nz) {
                    current = next;
                } else {
                    break;
                }
            }
            intervals.push((start, current));
            if current == lattice_max {
                break;
            }
            current += 1;
        } else {
            current = bigmin_jump(current, x, y, z, &box_);
        }
    }
    intervals
}

fn bigmin_jump(current: u64, x: u32, y: u32, z: u32, box_: &GridBox) -> u64 {
    let mut nx = x;
    let mut ny = y;
    let mut nz = z;
    let mut raised = false;
    if nx < box_.x.0 {
        nx = box_.x.0;
        raised = true;
    }
    if ny < box_.y.0 {
        ny = box_.y.0;
        raised = true;
    }
    if nz < box_.z.0 {
        nz = box_.z.0;
        raised = true;
    }
    if nx > box_.x.1 || ny > box_.y.1 || nz > box_.z.1 {
        return current + 1;
    }
    if raised {
        let candidate = cellforest_morton::encode(nx, ny, nz);
        candidate.max(current + 1)
    } else {
        current + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_box_yields_eight_contiguous_keys() {
        // spec E3: x,y,z in [0,1] -> 8 keys, Morton 0..7.
        let intervals = covering_intervals(4, GridBox::new((0, 1), (0, 1), (0, 1)));
        assert_eq!(intervals, alloc::vec![(0, 7)]);
    }

    #[test]
    fn empty_box_yields_no_intervals() {
        let intervals = covering_intervals(4, GridBox::new((5, 2), (0, 1), (0, 1)));
        assert!(intervals.is_empty());
    }

    #[test]
    fn intervals_exactly_cover_the_box() {
        let level = 4;
        let box_ = GridBox::new((1, 3), (2, 5), (0, 2));
        let intervals = covering_intervals(level, box_);

        let mut covered = alloc::collections::BTreeSet::new();
        for (start, end) in &intervals {
            assert!(start <= end);
            for code in *start..=*end {
                let (x, y, z) = cellforest_morton::decode(code);
                assert!(box_.contains(x, y, z), "interval covers a cell outside the box");
                covered.insert(code);
            }
        }
        for x in box_.x.0..=box_.x.1 {
            for y in box_.y.0..=box_.y.1 {
                for z in box_.z.0..=box_.z.1 {
                    let code = cellforest_morton::encode(x, y, z);
                    assert!(covered.contains(&code), "cell ({x},{y},{z}) not covered");
                }
            }
        }

        for pair in intervals.windows(2) {
            assert!(pair[0].1 < pair[1].0, "intervals must not overlap or touch");
        }
    }

    fn brute_force_codes(level: u8, box_: GridBox) -> alloc::collections::BTreeSet<u64> {
        let mut codes = alloc::collections::BTreeSet::new();
        if box_.is_empty() {
            return codes;
        }
        let bound = 1u32 << level;
        let box_ = box_.clamp_to_level(level);
        for x in box_.x.0..bound.min(box_.x.1 + 1) {
            for y in box_.y.0..bound.min(box_.y.1 + 1) {
                for z in box_.z.0..bound.min(box_.z.1 + 1) {
                    codes.insert(cellforest_morton::encode(x, y, z));
                }
            }
        }
        codes
    }

    proptest::proptest! {
        #[test]
        fn covering_intervals_matches_brute_force(
            level in 2u8..5,
            x0 in 0u32..8, x1 in 0u32..8,
            y0 in 0u32..8, y1 in 0u32..8,
            z0 in 0u32..8, z1 in 0u32..8,
        ) {
            let box_ = GridBox::new((x0.min(x1), x0.max(x1)), (y0.min(y1), y0.max(y1)), (z0.min(z1), z0.max(z1)));
            let bound = 1u32 << level;
            if box_.x.0 >= bound || box_.y.0 >= bound || box_.z.0 >= bound {
                return Ok(());
            }
            let intervals = covering_intervals(level, box_);
            let mut got = alloc::collections::BTreeSet::new();
            for (start, end) in &intervals {
                for code in *start..=*end {
                    got.insert(code);
                }
            }
            let want = brute_force_codes(level, box_);
            proptest::prop_assert_eq!(got, want);
            for pair in intervals.windows(2) {
                proptest::prop_assert!(pair[0].1 < pair[1].0);
            }
        }
    }
}
