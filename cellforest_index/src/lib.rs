// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![warn(missing_docs)]

//! Node store, entity manager, and the subdivision/spanning policies that
//! drive insertion, generic over any `K: SpatialKey` (spec §4.7-§4.10).

extern crate alloc;

mod balance;
mod entity;
mod node;
mod spanning;
mod subdivision;
mod tree;

pub use balance::BalanceChecker;
pub use entity::{EntityId, EntityManager, EntityRecord, SequentialIdGenerator};
pub use node::{Node, NodeStore};
pub use spanning::{
    max_span_nodes, AdaptiveSpanningPolicy, PointSpanningPolicy, SpanningContext, SpanningPolicy,
    StandardSpanningPolicy,
};
pub use subdivision::{
    PrismSubdivisionPolicy, StandardSubdivisionPolicy, SubdivisionContext, SubdivisionDecision, SubdivisionPolicy,
};
pub use tree::{IndexStats, Tree};
