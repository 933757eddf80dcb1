// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`QueryEngine`]: borrows a tree's node store and entity manager and
//! exposes the point/range/k-NN/ray/frustum/plane operations of spec §4.11
//! as methods, mirroring the visit/query split the corpus uses for backend
//! traversal (one conceptual step per query kind, no shared mutable state).

use cellforest_core::{SpatialKey, World};
use cellforest_index::{EntityId, EntityManager, NodeStore};

/// Borrowed view over one tree's storage, the basis for every query in this
/// crate. Holding only shared references means independent `QueryEngine`s
/// over the same tree may run concurrently (spec §5: "each per-tree query
/// MUST be independent").
#[derive(Debug)]
pub struct QueryEngine<'a, K, C = ()> {
    pub(crate) world: &'a World,
    pub(crate) nodes: &'a NodeStore<K>,
    pub(crate) entities: &'a EntityManager<K, C>,
}

impl<'a, K: SpatialKey, C> QueryEngine<'a, K, C> {
    /// Borrow a tree's storage for querying.
    pub fn new(world: &'a World, nodes: &'a NodeStore<K>, entities: &'a EntityManager<K, C>) -> Self {
        Self { world, nodes, entities }
    }

    pub(crate) fn node_entities(&self, key: &K) -> &[EntityId] {
        self.nodes.get(key).map_or(&[], |n| n.entity_ids.as_slice())
    }
}
