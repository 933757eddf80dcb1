// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 3D Morton (Z-order) curve codec over the 21-bit-per-axis lattice shared
//! by every cell geometry.
//!
//! This module is deliberately level-agnostic: it only knows how to
//! interleave/deinterleave three 21-bit axis values into a 63-bit code and
//! step one lattice unit along an axis. `cellforest_cube` builds its
//! level-aware cell-index arithmetic on top of [`encode`]/[`decode`].

#![no_std]

use cellforest_core::Direction;

/// Bits of lattice resolution per axis (spec: 21-bit coordinates).
pub const BITS_PER_AXIS: u32 = 21;

/// `2^BITS_PER_AXIS`, the number of lattice cells per axis.
pub const AXIS_RESOLUTION: u32 = 1 << BITS_PER_AXIS;

/// Spread the low 21 bits of `v` so there are two zero bits between each
/// original bit ("magic bits" interleave).
const fn spread_bits(v: u32) -> u64 {
    let mut x = v as u64 & 0x1f_ffff;
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Inverse of [`spread_bits`]: compact every third bit back together.
const fn compact_bits(v: u64) -> u32 {
    let mut x = v & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & 0x1f_ffff;
    x as u32
}

/// Interleave the low 21 bits of `x`, `y`, `z` into a 63-bit Morton code.
/// Bijective on `[0, 2^21)^3 -> [0, 2^63)`.
pub const fn encode(x: u32, y: u32, z: u32) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Inverse of [`encode`].
pub const fn decode(code: u64) -> (u32, u32, u32) {
    (
        compact_bits(code),
        compact_bits(code >> 1),
        compact_bits(code >> 2),
    )
}

/// The Morton code of the parent cell, `code >> 3`.
pub const fn parent(code: u64) -> u64 {
    code >> 3
}

/// The Morton code of child `child_index` (`0..8`), octant bits assigned
/// `(z, y, x)` from high to low.
pub const fn child(code: u64, child_index: u8) -> u64 {
    (code << 3) | (child_index as u64 & 0x7)
}

/// Step one lattice unit along `direction`, bounded to `[0, bound)` on the
/// moving axis. Returns `None` crossing that bound (world or level edge,
/// depending on what `bound` represents for the caller).
pub const fn neighbor(code: u64, direction: Direction, bound: u32) -> Option<u64> {
    let (x, y, z) = decode(code);
    let stepped = match direction {
        Direction::PlusX => match step(x, 1, bound) {
            Some(x) => Some((x, y, z)),
            None => None,
        },
        Direction::MinusX => match step(x, -1, bound) {
            Some(x) => Some((x, y, z)),
            None => None,
        },
        Direction::PlusY => match step(y, 1, bound) {
            Some(y) => Some((x, y, z)),
            None => None,
        },
        Direction::MinusY => match step(y, -1, bound) {
            Some(y) => Some((x, y, z)),
            None => None,
        },
        Direction::PlusZ => match step(z, 1, bound) {
            Some(z) => Some((x, y, z)),
            None => None,
        },
        Direction::MinusZ => match step(z, -1, bound) {
            Some(z) => Some((x, y, z)),
            None => None,
        },
    };
    match stepped {
        Some((nx, ny, nz)) => Some(encode(nx, ny, nz)),
        None => None,
    }
}

const fn step(v: u32, delta: i32, bound: u32) -> Option<u32> {
    let next = v as i64 + delta as i64;
    if next < 0 || next >= bound as i64 {
        None
    } else {
        Some(next as u32)
    }
}
