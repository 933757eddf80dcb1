// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![warn(missing_docs)]

//! Point/range/k-NN/ray/frustum/plane query engines and broad-phase
//! collision detection, all generic over `K: SpatialKey` so one
//! implementation serves the cube, tetree, and prism variants (spec
//! §4.11-§4.12).

extern crate alloc;

mod collision;
mod culling;
mod engine;
mod knn;
mod point_range;
mod ray;

pub use collision::{CollisionConfig, CollisionPair, POINT_COLLISION_THRESHOLD};
pub use engine::QueryEngine;
pub use ray::RayHit;
