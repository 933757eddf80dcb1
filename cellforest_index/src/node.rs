// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sparse ordered node store keyed by spatial key (spec §4.7).

use alloc::collections::BTreeMap;
use core::sync::atomic::{AtomicU64, Ordering};

use cellforest_core::SpatialKey;
use smallvec::SmallVec;

use crate::entity::EntityId;

/// Per-node record: the entities directly stored here plus DSOC bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Entities whose span includes this node's key.
    pub entity_ids: SmallVec<[EntityId; 8]>,
    /// Monotonically increasing frame counter for the DSOC collaborator
    /// interface (spec §6 `DsocHooks`); bumped by [`NodeStore::touch`].
    pub last_touch_frame: u64,
}

impl Node {
    fn is_orphan(&self) -> bool {
        self.entity_ids.is_empty()
    }
}

/// Sparse, ordered `Key -> Node` mapping with `O(log n)` lookup, range scan,
/// and ordered iteration (spec §4.7).
///
/// A node exists iff its `entity_ids` is non-empty; [`NodeStore::remove_entity`]
/// reclaims a node the instant it becomes an orphan, so the store never
/// accumulates dead entries that mutation alone can detect.
///
/// `max_depth` and `collision_pairs_last_scan` back [`crate::IndexStats`]'s
/// read-only snapshot counters (spec.md's "statistics counters use atomic
/// integers"); both are updated through a shared reference, so a query
/// engine holding only `&NodeStore<K>` can record a scan result without
/// needing `&mut`.
#[derive(Debug)]
pub struct NodeStore<K> {
    nodes: BTreeMap<K, Node>,
    max_depth: AtomicU64,
    collision_pairs_last_scan: AtomicU64,
}

impl<K> Default for NodeStore<K> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            max_depth: AtomicU64::new(0),
            collision_pairs_last_scan: AtomicU64::new(0),
        }
    }
}

impl<K: Clone> Clone for NodeStore<K> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            max_depth: AtomicU64::new(self.max_depth.load(Ordering::Relaxed)),
            collision_pairs_last_scan: AtomicU64::new(self.collision_pairs_last_scan.load(Ordering::Relaxed)),
        }
    }
}

impl<K: SpatialKey> NodeStore<K> {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deepest level any node has ever reached, via [`NodeStore::add_entity`].
    /// Never decreases, even once the deepest node is removed.
    pub fn max_depth(&self) -> u8 {
        self.max_depth.load(Ordering::Relaxed) as u8
    }

    /// Collision pairs found by the most recent [`crate::NodeStore`]-wide
    /// scan recorded via [`NodeStore::record_collision_scan`]; `0` if no
    /// scan has run yet.
    pub fn collision_pairs_last_scan(&self) -> usize {
        self.collision_pairs_last_scan.load(Ordering::Relaxed) as usize
    }

    /// Record how many pairs a full collision scan just found. Called by
    /// `cellforest_query`'s `find_all_collisions` through a shared `&self`.
    pub fn record_collision_scan(&self, pairs: usize) {
        self.collision_pairs_last_scan.store(pairs as u64, Ordering::Relaxed);
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by key.
    pub fn get(&self, key: &K) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Number of entities directly stored at `key` (0 if the node doesn't
    /// exist).
    pub fn entity_count(&self, key: &K) -> usize {
        self.nodes.get(key).map_or(0, |n| n.entity_ids.len())
    }

    /// Record `id` at `key`, creating the node if it didn't exist.
    pub fn add_entity(&mut self, key: K, id: EntityId) {
        self.max_depth.fetch_max(key.level() as u64, Ordering::Relaxed);
        let node = self.nodes.entry(key).or_default();
        if !node.entity_ids.contains(&id) {
            node.entity_ids.push(id);
        }
    }

    /// Remove `id` from `key`'s node, reclaiming the node if it becomes an
    /// orphan.
    pub fn remove_entity(&mut self, key: &K, id: EntityId) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.entity_ids.retain(|e| *e != id);
            if node.is_orphan() {
                self.nodes.remove(key);
            }
        }
    }

    /// Bump `key`'s DSOC touch counter, creating an (empty) node if needed.
    pub fn touch(&mut self, key: K, frame: u64) {
        self.nodes.entry(key).or_default().last_touch_frame = frame;
    }

    /// Ordered iteration over every live node.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Node)> {
        self.nodes.iter()
    }

    /// Nodes whose key falls in `[lo, hi]`, in ascending key order.
    pub fn range(&self, lo: K, hi: K) -> impl Iterator<Item = (&K, &Node)> {
        self.nodes.range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SequentialIdGenerator;
    use cellforest_core::{EntityIdGenerator, SpatialKey};
    use cellforest_cube::CubeKey;

    fn ids(n: usize) -> alloc::vec::Vec<EntityId> {
        let mut id_gen = SequentialIdGenerator::default();
        (0..n).map(|_| id_gen.generate()).collect()
    }

    #[test]
    fn node_is_reclaimed_once_orphaned() {
        let mut store = NodeStore::<CubeKey>::new();
        let key = CubeKey::root();
        let a = ids(1)[0];
        store.add_entity(key, a);
        assert_eq!(store.len(), 1);
        store.remove_entity(&key, a);
        assert_eq!(store.len(), 0);
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn range_scan_is_ascending_and_bounded() {
        let mut store = NodeStore::<CubeKey>::new();
        let a = CubeKey::from_parts(cellforest_morton::encode(0, 0, 0), 3);
        let b = CubeKey::from_parts(cellforest_morton::encode(1, 0, 0), 3);
        let c = CubeKey::from_parts(cellforest_morton::encode(7, 7, 7), 3);
        let entity_ids = ids(3);
        for (key, id) in [a, b, c].into_iter().zip(entity_ids) {
            store.add_entity(key, id);
        }
        let scanned: alloc::vec::Vec<_> = store.range(a, b).map(|(k, _)| *k).collect();
        assert_eq!(scanned, alloc::vec![a, b]);
    }

    #[test]
    fn max_depth_tracks_the_deepest_node_and_never_drops() {
        let mut store = NodeStore::<CubeKey>::new();
        let shallow = CubeKey::from_parts(cellforest_morton::encode(0, 0, 0), 1);
        let deep = CubeKey::from_parts(cellforest_morton::encode(0, 0, 0), 5);
        let [a, b] = [ids(1)[0], ids(1)[0]];
        store.add_entity(deep, a);
        assert_eq!(store.max_depth(), 5);
        store.add_entity(shallow, b);
        assert_eq!(store.max_depth(), 5);
        store.remove_entity(&deep, a);
        assert_eq!(store.max_depth(), 5, "max depth observed never decreases");
    }

    #[test]
    fn collision_scan_count_is_recorded_through_a_shared_reference() {
        let store = NodeStore::<CubeKey>::new();
        assert_eq!(store.collision_pairs_last_scan(), 0);
        store.record_collision_scan(3);
        assert_eq!(store.collision_pairs_last_scan(), 3);
    }
}
