// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase collision detection (spec §4.12).
//!
//! `find_all_collisions` pairs entities co-located in the same node, plus
//! entities in any other node whose bounding box intersects it — the same
//! cheap node-AABB pre-filter every query in this crate applies before an
//! exact per-entity test, used here in place of the `NeighborDetector`
//! collaborator spec §6 describes as an external plug-in. It's quadratic in
//! the number of live nodes after that filter; a true SFC-adjacency walk
//! would do better but needs the neighbor topology that collaborator
//! supplies.

use alloc::vec::Vec;

use cellforest_core::{Aabb3, SpatialKey};
use cellforest_index::{EntityId, EntityRecord};
use hashbrown::HashSet;

use crate::engine::QueryEngine;

/// Euclidean distance threshold, in world units, below which two point
/// entities (neither carries an AABB) are considered colliding (spec
/// §4.12).
pub const POINT_COLLISION_THRESHOLD: f64 = 0.1;

/// Tunable knobs for collision testing (spec §9 Q4: exposed as
/// configuration rather than hard-coded).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionConfig {
    /// Distance threshold for point-to-point collisions.
    pub point_threshold: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self { point_threshold: POINT_COLLISION_THRESHOLD }
    }
}

/// One confirmed collision between two entities, ordered `a < b` (spec I8:
/// no self-pairs, each unordered pair reported at most once).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionPair {
    /// The lower of the two entity ids.
    pub a: EntityId,
    /// The higher of the two entity ids.
    pub b: EntityId,
    /// How far the two shapes overlap, clamped to non-negative.
    pub penetration_depth: f64,
}

fn canonical(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a < b { (a, b) } else { (b, a) }
}

fn aabb_overlap_depth(a: &Aabb3, b: &Aabb3) -> f64 {
    let overlap = a.intersect(b);
    let extent = overlap.max - overlap.min;
    extent.x.min(extent.y).min(extent.z).max(0.0)
}

fn check_records<C>(
    id_a: EntityId,
    record_a: &EntityRecord<impl SpatialKey, C>,
    id_b: EntityId,
    record_b: &EntityRecord<impl SpatialKey, C>,
    config: &CollisionConfig,
) -> Option<CollisionPair> {
    if id_a == id_b {
        return None;
    }
    let (a, b) = canonical(id_a, id_b);
    let depth = match (record_a.bounds, record_b.bounds) {
        (Some(ba), Some(bb)) => {
            if !ba.intersects(&bb) {
                return None;
            }
            aabb_overlap_depth(&ba, &bb)
        }
        (Some(bounds), None) => {
            if !bounds.contains_point(record_b.position) {
                return None;
            }
            aabb_overlap_depth(&bounds, &Aabb3::from_point(record_b.position))
        }
        (None, Some(bounds)) => {
            if !bounds.contains_point(record_a.position) {
                return None;
            }
            aabb_overlap_depth(&bounds, &Aabb3::from_point(record_a.position))
        }
        (None, None) => {
            let distance = record_a.position.distance(record_b.position);
            if distance > config.point_threshold {
                return None;
            }
            (config.point_threshold - distance).max(0.0)
        }
    };
    Some(CollisionPair { a, b, penetration_depth: depth })
}

impl<K: SpatialKey, C> QueryEngine<'_, K, C> {
    /// Exact test between two specific entities. `None` if either id is
    /// unknown or the two don't overlap (spec §4.12: collision queries
    /// never throw).
    pub fn check_collision(&self, a: EntityId, b: EntityId, config: &CollisionConfig) -> Option<CollisionPair> {
        let record_a = self.entities.get(a)?;
        let record_b = self.entities.get(b)?;
        check_records(a, record_a, b, record_b, config)
    }

    /// Every collision involving `id`: co-located entities plus entities in
    /// any node whose bounds intersect a node `id` occupies. Empty if `id`
    /// is unknown.
    pub fn find_collisions(&self, id: EntityId, config: &CollisionConfig) -> Vec<CollisionPair> {
        let Some(record) = self.entities.get(id) else { return Vec::new() };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &span_key in &record.span {
            let span_aabb = span_key.bounding_aabb(self.world);
            for (key, node) in self.nodes.iter() {
                let node_aabb = key.bounding_aabb(self.world);
                if *key != span_key && !node_aabb.intersects(&span_aabb) {
                    continue;
                }
                for &other in &node.entity_ids {
                    if other == id {
                        continue;
                    }
                    if let Some(pair) = self.check_collision(id, other, config) {
                        if seen.insert((pair.a, pair.b)) {
                            out.push(pair);
                        }
                    }
                }
            }
        }
        out
    }

    /// Every colliding pair in the tree.
    pub fn find_all_collisions(&self, config: &CollisionConfig) -> Vec<CollisionPair> {
        let keys: Vec<K> = self.nodes.iter().map(|(k, _)| *k).collect();
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for (i, &key_i) in keys.iter().enumerate() {
            let node_i = self.node_entities(&key_i);
            for (a_idx, &a) in node_i.iter().enumerate() {
                for &b in &node_i[a_idx + 1..] {
                    if let Some(pair) = self.check_collision(a, b, config) {
                        if seen.insert((pair.a, pair.b)) {
                            out.push(pair);
                        }
                    }
                }
            }
            let aabb_i = key_i.bounding_aabb(self.world);
            for &key_j in &keys[i + 1..] {
                let aabb_j = key_j.bounding_aabb(self.world);
                if !aabb_i.intersects(&aabb_j) {
                    continue;
                }
                for &a in node_i {
                    for &b in self.node_entities(&key_j) {
                        if let Some(pair) = self.check_collision(a, b, config) {
                            if seen.insert((pair.a, pair.b)) {
                                out.push(pair);
                            }
                        }
                    }
                }
            }
        }
        self.nodes.record_collision_scan(out.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::{Point3, World};
    use cellforest_cube::CubeKey;
    use cellforest_index::Tree;

    #[test]
    fn nearby_points_within_threshold_collide() {
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        let a = tree.insert(&world, Point3::new(10.0, 10.0, 10.0), None, ()).unwrap();
        let b = tree.insert(&world, Point3::new(10.01, 10.0, 10.0), None, ()).unwrap();
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let config = CollisionConfig::default();
        let pair = engine.check_collision(a, b, &config).unwrap();
        assert_eq!((pair.a, pair.b), canonical(a, b));
        assert!(pair.penetration_depth >= 0.0);
    }

    #[test]
    fn distant_points_do_not_collide() {
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        let a = tree.insert(&world, Point3::new(10.0, 10.0, 10.0), None, ()).unwrap();
        let b = tree.insert(&world, Point3::new(10_000.0, 10_000.0, 10_000.0), None, ()).unwrap();
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        assert!(engine.check_collision(a, b, &CollisionConfig::default()).is_none());
    }

    #[test]
    fn find_all_collisions_contains_no_self_pairs_and_no_duplicates() {
        // spec I8.
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        for i in 0..5 {
            tree.insert(&world, Point3::new(10.0 + i as f64 * 0.01, 10.0, 10.0), None, ()).unwrap();
        }
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let pairs = engine.find_all_collisions(&CollisionConfig::default());
        let mut seen = HashSet::new();
        for pair in &pairs {
            assert_ne!(pair.a, pair.b);
            assert!(seen.insert((pair.a, pair.b)), "duplicate pair reported");
        }
    }

    #[test]
    fn find_collisions_on_unknown_id_is_empty() {
        let world = World::default_grid();
        let tree: Tree<CubeKey> = Tree::new(8);
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let bogus = {
            let mut scratch: Tree<CubeKey> = Tree::new(8);
            let id = scratch.insert(&world, Point3::splat(0.0), None, ()).unwrap();
            scratch.remove(id).unwrap();
            id
        };
        assert!(engine.find_collisions(bogus, &CollisionConfig::default()).is_empty());
    }
}
