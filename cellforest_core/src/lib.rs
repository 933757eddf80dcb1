// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared coordinate system, error types, and the [`SpatialKey`] trait that
//! every cell geometry (cube, tetrahedral, prism) implements.
//!
//! This crate has no notion of "which decomposition" is in use; it only
//! defines the fixed-point world, the vocabulary queries are expressed in
//! (`Spatial`, `Ray3D`, `Frustum3D`, `Plane3D`), and the external collaborator
//! interfaces the index layer calls out to (entity id generation, neighbor
//! detection, DSOC touch hooks, refinement criteria).
//!
//! `cellforest_cube`, `cellforest_tetree`, and `cellforest_prism` each provide
//! one concrete [`SpatialKey`] implementation; `cellforest_index` and
//! `cellforest_query` are written generically over that trait so the
//! hierarchy traversal and entity bookkeeping code is not duplicated per
//! variant.

#![no_std]

extern crate alloc;

mod collab;
mod error;
mod geometry;
mod key;
mod world;

pub use collab::{
    Direction, DsocHooks, EntityIdGenerator, NeighborDetector, RefinementContext,
    RefinementCriterion, RefinementDecision,
};
pub use error::CellError;
pub use geometry::{Aabb3, Frustum3D, Plane3D, Point3, Ray3D, Spatial, Vector3};
pub use key::SpatialKey;
pub use world::{GRID_RESOLUTION, MAX_LEVEL, UPoint3, World};
