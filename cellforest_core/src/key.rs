// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`SpatialKey`] trait: a single interface over the three cell
//! geometries so the index and query layers are written once, generic over
//! `K: SpatialKey`, instead of duplicated per variant.
//!
//! This is the idiom spec §9 asks for explicitly: "reimplement as a
//! trait/interface over `SpatialKey`... avoid dynamic dispatch in hot paths
//! by parameterizing the tree over the key type."

use core::fmt::Debug;
use core::hash::Hash;

use crate::error::CellError;
use crate::geometry::{Aabb3, Point3, Ray3D};
use crate::world::World;

/// A totally-ordered space-filling-curve key for one cell geometry.
///
/// All three implementors (`cellforest_cube::CubeKey`,
/// `cellforest_tetree::TetKey`, `cellforest_prism::PrismKey`) subdivide into
/// exactly eight children, so [`SpatialKey::children`] has a fixed-size
/// return type across variants.
pub trait SpatialKey: Copy + Eq + Ord + Hash + Debug + 'static {
    /// The key identifying the single root cell (level 0).
    fn root() -> Self;

    /// Locate the cell at `level` containing `point`, rejecting coordinates
    /// outside the world or outside this variant's valid domain (spec E5,
    /// the prism's triangular constraint).
    fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError>;

    /// Refinement level, `0..=MAX_LEVEL`.
    fn level(&self) -> u8;

    /// Whether this is the root cell.
    fn is_root(&self) -> bool {
        self.level() == 0
    }

    /// The key of the cell containing this one at `level - 1`. `None` at the
    /// root.
    fn parent(&self) -> Option<Self>;

    /// The key of child `child_index` (`0..8`). Fails with
    /// [`CellError::MaxLevelExceeded`] at [`crate::MAX_LEVEL`] and with
    /// [`CellError::InvalidKey`] for `child_index >= 8`.
    fn child(&self, child_index: u8) -> Result<Self, CellError>;

    /// All eight children, in child-index order. `None` entries only occur
    /// if `child_index >= 8` was passed to a custom implementation; for the
    /// three shipped variants this is always fully populated unless the
    /// cell is already at [`crate::MAX_LEVEL`], in which case every entry is
    /// `None`.
    fn children(&self) -> [Option<Self>; 8] {
        let mut out = [None; 8];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.child(i as u8).ok();
        }
        out
    }

    /// Conservative world-space bounding box for this cell, used by every
    /// query engine's cheap pre-filter (spec §4.11).
    fn bounding_aabb(&self, world: &World) -> Aabb3;

    /// Exact geometric containment test against this cell's actual shape
    /// (not just its bounding box).
    fn contains_point(&self, world: &World, point: Point3) -> bool;

    /// Exact per-variant ray intersection against this cell's own shape, run
    /// after [`SpatialKey::bounding_aabb`]'s cheap slab pre-filter rejects
    /// nothing (spec §4.11: "tetrahedron: four triangles; prism: two
    /// triangles + three quads; cube: slab test is exact"). Returns
    /// `(t_near, t_far, near_face, far_face)`, where the face indices are
    /// into this variant's own face ordering.
    ///
    /// The cube's shape *is* its bounding box, so the default implementation
    /// delegates to the slab test directly; `TetKey`/`PrismKey` override
    /// this with their triangle/quad tests.
    fn ray_intersect_exact(&self, world: &World, ray: &Ray3D) -> Option<(f64, f64, u8, u8)> {
        let aabb = self.bounding_aabb(world);
        ray.intersect_aabb(&aabb).map(|(t_near, t_far)| (t_near, t_far, 0, 0))
    }
}
