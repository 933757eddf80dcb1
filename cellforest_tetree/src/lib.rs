// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tetrahedral (tetree) cell geometry: a cube world is split into six
//! congruent Kuhn simplices at the root, each refined 8-way by Bey's rule.
//! [`TetKey`] identifies a tetrahedron by its bounding cube's anchor, its
//! level, and one of six types; [`TmIndex`] packs the whole ancestor path
//! into a single 128-bit value for storage and ordering.

#![no_std]

mod geometry;
mod tables;

pub use geometry::ray_intersect_tet;

use cellforest_core::{Aabb3, CellError, Point3, Ray3D, Spatial, SpatialKey, UPoint3, World, MAX_LEVEL};

type IVec = [i64; 3];

const fn to_ivec(p: UPoint3) -> IVec {
    [p.x as i64, p.y as i64, p.z as i64]
}

fn from_ivec(v: IVec) -> UPoint3 {
    UPoint3::new(v[0] as u32, v[1] as u32, v[2] as u32)
}

/// Edge length, in grid units, of the cube bounding a cell at `level`.
const fn cube_half(level: u8) -> i64 {
    (cellforest_core::GRID_RESOLUTION >> level) as i64
}

/// SFC key for a tetrahedral cell: the anchor of its bounding cube, its
/// refinement level, and its Kuhn-simplex type (`0..6`).
///
/// There are six root tetrahedra (one per type), all sharing level 0 and
/// the world's anchor; [`SpatialKey::root`] returns the canonical type-0
/// root, the other five are reached via [`TetKey::root_of_type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TetKey {
    anchor: UPoint3,
    level: u8,
    ty: u8,
}

impl TetKey {
    /// The root tetrahedron of Kuhn type `ty` (`0..6`).
    pub const fn root_of_type(ty: u8) -> Self {
        Self {
            anchor: UPoint3::new(0, 0, 0),
            level: 0,
            ty: ty % tables::NUM_TYPES,
        }
    }

    /// This cell's Kuhn-simplex type, `0..6`.
    pub const fn tet_type(&self) -> u8 {
        self.ty
    }

    /// This cell's bounding cube anchor (minimum corner) on the
    /// finest-resolution integer lattice.
    pub const fn anchor(&self) -> UPoint3 {
        self.anchor
    }

    /// The four vertices of this tetrahedron, in world space.
    pub fn vertices(&self, world: &World) -> [Point3; 4] {
        let half = cube_half(self.level);
        let a = to_ivec(self.anchor);
        let perm = tables::PERMS[self.ty as usize];
        let mut v1 = a;
        v1[perm[0]] += half;
        let mut v2 = v1;
        v2[perm[1]] += half;
        let v3 = [a[0] + half, a[1] + half, a[2] + half];
        [
            world.from_grid(from_ivec(a)),
            world.from_grid(from_ivec(v1)),
            world.from_grid(from_ivec(v2)),
            world.from_grid(from_ivec(v3)),
        ]
    }

    /// This tetrahedron as a [`Spatial::Tetrahedron`], for use with the
    /// generic query-engine intersectors.
    pub fn spatial(&self, world: &World) -> Spatial {
        Spatial::Tetrahedron(self.vertices(world))
    }

    /// Locate the tetree cell at `level` containing `point`.
    pub fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError> {
        let grid = world.to_grid(point)?;
        let local = to_ivec(grid);
        let root_ty = tables::classify_region(local);
        let mut anchor: IVec = [0, 0, 0];
        let mut ty = root_ty;
        for cur_level in 0..level {
            let half = cube_half(cur_level);
            let cid = tables::cube_id_of(local, anchor, half);
            let bey_id = tables::type_cid_to_bey_id(ty, cid);
            let (child_anchor, child_ty) = tables::child_anchor_and_type(ty, anchor, half, bey_id);
            anchor = child_anchor;
            ty = child_ty;
        }
        Ok(Self {
            anchor: from_ivec(anchor),
            level,
            ty,
        })
    }
}

impl PartialOrd for TetKey {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TetKey {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.level
            .cmp(&other.level)
            .then((self.anchor.x, self.anchor.y, self.anchor.z).cmp(&(
                other.anchor.x,
                other.anchor.y,
                other.anchor.z,
            )))
            .then(self.ty.cmp(&other.ty))
    }
}

impl SpatialKey for TetKey {
    fn root() -> Self {
        Self::root_of_type(0)
    }

    fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError> {
        Self::locate(world, point, level)
    }

    fn level(&self) -> u8 {
        self.level
    }

    fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        let half = cube_half(self.level);
        let parent_half = half * 2;
        let a = to_ivec(self.anchor);
        let parent_anchor = [
            (a[0] / parent_half) * parent_half,
            (a[1] / parent_half) * parent_half,
            (a[2] / parent_half) * parent_half,
        ];
        let cid = tables::cube_id_of(a, parent_anchor, parent_half);
        for parent_ty in 0..tables::NUM_TYPES {
            let bey_id = tables::type_cid_to_bey_id(parent_ty, cid);
            let child_ty = tables::parent_type_to_child_type(parent_ty, bey_id);
            if child_ty == self.ty {
                return Some(Self {
                    anchor: from_ivec(parent_anchor),
                    level: self.level - 1,
                    ty: parent_ty,
                });
            }
        }
        unreachable!("every tet type has exactly one parent type reproducing it")
    }

    fn child(&self, child_index: u8) -> Result<Self, CellError> {
        if self.level >= MAX_LEVEL {
            return Err(CellError::MaxLevelExceeded { level: self.level });
        }
        if child_index >= 8 {
            return Err(CellError::InvalidKey);
        }
        let half = cube_half(self.level);
        let a = to_ivec(self.anchor);
        let (child_anchor, child_ty) = tables::child_anchor_and_type(self.ty, a, half, child_index);
        Ok(Self {
            anchor: from_ivec(child_anchor),
            level: self.level + 1,
            ty: child_ty,
        })
    }

    fn bounding_aabb(&self, world: &World) -> Aabb3 {
        let min = world.from_grid(self.anchor);
        let len = world.length_at_level(self.level);
        Aabb3::new(min, min + Point3::splat(len))
    }

    fn contains_point(&self, world: &World, point: Point3) -> bool {
        let grid = match world.to_grid(point) {
            Ok(g) => g,
            Err(_) => return false,
        };
        let half = cube_half(self.level);
        let a = to_ivec(self.anchor);
        let local = to_ivec(grid);
        let rel = [local[0] - a[0], local[1] - a[1], local[2] - a[2]];
        if rel.iter().any(|&r| r < 0 || r > half) {
            return false;
        }
        let perm = tables::PERMS[self.ty as usize];
        rel[perm[2]] <= rel[perm[1]] && rel[perm[1]] <= rel[perm[0]]
    }

    fn ray_intersect_exact(&self, world: &World, ray: &Ray3D) -> Option<(f64, f64, u8, u8)> {
        geometry::ray_intersect_tet(ray, &self.vertices(world))
    }
}

/// Packed ancestor path of a [`TetKey`]: the root type plus one 3-bit Bey
/// child-index symbol per level, most significant level first. This is the
/// compact, totally-ordered on-disk/in-memory representation; [`TetKey`]
/// itself is the convenient geometric one. `tm_index` and `tetrahedron` are
/// inverses (spec invariant R2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TmIndex {
    level: u8,
    root_type: u8,
    path: u128,
}

impl TmIndex {
    /// Refinement level this index was built at.
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// The root type (`0..6`) this path descends from.
    pub const fn root_type(&self) -> u8 {
        self.root_type
    }

    /// Pack `tet`'s ancestor path (root to `tet`, inclusive of every Bey
    /// child index taken along the way).
    pub fn from_tet(tet: TetKey) -> Self {
        let mut symbols = [0u8; MAX_LEVEL as usize];
        let mut cur = tet;
        let mut depth = tet.level as usize;
        while let Some(parent) = cur.parent() {
            let half = cube_half(parent.level);
            let a = to_ivec(parent.anchor);
            let cid = tables::cube_id_of(to_ivec(cur.anchor), a, half);
            let bey_id = tables::type_cid_to_bey_id(parent.ty, cid);
            depth -= 1;
            symbols[depth] = bey_id;
            cur = parent;
        }
        let mut path: u128 = 0;
        for &symbol in symbols.iter().take(tet.level as usize) {
            path = (path << 3) | symbol as u128;
        }
        Self {
            level: tet.level,
            root_type: cur.ty,
            path,
        }
    }

    /// Unpack back to the [`TetKey`] this index names.
    pub fn to_tet(self) -> TetKey {
        let mut tet = TetKey::root_of_type(self.root_type);
        for depth in (0..self.level).rev() {
            let symbol = ((self.path >> (3 * depth as u32)) & 0x7) as u8;
            tet = tet.child(symbol).expect("packed path only ever descends");
        }
        tet
    }
}

impl From<TetKey> for TmIndex {
    fn from(tet: TetKey) -> Self {
        Self::from_tet(tet)
    }
}

impl From<TmIndex> for TetKey {
    fn from(index: TmIndex) -> Self {
        index.to_tet()
    }
}
