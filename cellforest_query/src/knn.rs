// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! k-nearest-neighbor search: priority-queue BFS over nodes, seeded at the
//! node containing the query point and expanded outward through
//! `SpatialKey::parent`/`children` adjacency rather than the whole store, by
//! each candidate's distance lower bound, stopping once the k-th candidate
//! can't be beaten by any unexpanded node (spec §4.11, spec.md:160).

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::{Ordering, Reverse};

use cellforest_core::{Point3, SpatialKey};
use cellforest_index::EntityId;
use hashbrown::HashSet;

use crate::engine::QueryEngine;

#[derive(Clone, Copy, Debug)]
struct ByDistance<T> {
    dist_sq: f64,
    item: T,
}

impl<T> PartialEq for ByDistance<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist_sq == other.dist_sq
    }
}
impl<T> Eq for ByDistance<T> {}
impl<T> PartialOrd for ByDistance<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for ByDistance<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq.partial_cmp(&other.dist_sq).unwrap_or(Ordering::Equal)
    }
}

impl<K: SpatialKey, C> QueryEngine<'_, K, C> {
    /// The `k` entities closest to `point`, nearest first. `should_continue`
    /// is polled once per expanded node and lets a caller abort a long
    /// search cooperatively (spec §5's `should_continue()` callback).
    pub fn knn(&self, point: Point3, k: usize, mut should_continue: impl FnMut() -> bool) -> Vec<(EntityId, f64)> {
        if k == 0 {
            return Vec::new();
        }

        let mut frontier: BinaryHeap<Reverse<ByDistance<K>>> = BinaryHeap::new();
        let mut visited_nodes = HashSet::new();
        self.seed_frontier_at_point(point, &mut frontier, &mut visited_nodes);

        let mut best: BinaryHeap<ByDistance<EntityId>> = BinaryHeap::new();
        let mut seen = HashSet::new();

        while let Some(Reverse(candidate)) = frontier.pop() {
            if !should_continue() {
                break;
            }
            if best.len() >= k {
                if let Some(worst) = best.peek() {
                    if candidate.dist_sq > worst.dist_sq {
                        break;
                    }
                }
            }
            for &id in self.node_entities(&candidate.item) {
                if !seen.insert(id) {
                    continue;
                }
                let Some(record) = self.entities.get(id) else { continue };
                let dist_sq = record.position.distance_squared(point);
                best.push(ByDistance { dist_sq, item: id });
                if best.len() > k {
                    best.pop();
                }
            }
            self.expand_adjacency(candidate.item, point, &mut frontier, &mut visited_nodes);
        }

        let mut out: Vec<(EntityId, f64)> = best.into_iter().map(|b| (b.item, b.dist_sq.sqrt())).collect();
        out.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        out
    }

    fn push_candidate(
        &self,
        key: K,
        point: Point3,
        frontier: &mut BinaryHeap<Reverse<ByDistance<K>>>,
        visited_nodes: &mut HashSet<K>,
    ) {
        if !visited_nodes.insert(key) {
            return;
        }
        let dist_sq = key.bounding_aabb(self.world).distance_squared(point);
        frontier.push(Reverse(ByDistance { dist_sq, item: key }));
    }

    /// Seeds the frontier at the deepest node on record containing `point`
    /// and every one of its ancestors, instead of every node in the store —
    /// the BFS then fans outward from there via [`Self::expand_adjacency`].
    fn seed_frontier_at_point(
        &self,
        point: Point3,
        frontier: &mut BinaryHeap<Reverse<ByDistance<K>>>,
        visited_nodes: &mut HashSet<K>,
    ) {
        let start_level = self.nodes.max_depth();
        let mut cur = K::locate(self.world, point, start_level).ok().or_else(|| Some(K::root()));
        while let Some(key) = cur {
            self.push_candidate(key, point, frontier, visited_nodes);
            cur = key.parent();
        }
    }

    /// Pushes `key`'s children and siblings (its parent's other children)
    /// onto the frontier, so a BFS driven purely by `SpatialKey::parent`/
    /// `children` eventually reaches every SFC-adjacent node without ever
    /// enumerating the whole store up front.
    fn expand_adjacency(
        &self,
        key: K,
        point: Point3,
        frontier: &mut BinaryHeap<Reverse<ByDistance<K>>>,
        visited_nodes: &mut HashSet<K>,
    ) {
        for child in key.children().into_iter().flatten() {
            self.push_candidate(child, point, frontier, visited_nodes);
        }
        if let Some(parent) = key.parent() {
            self.push_candidate(parent, point, frontier, visited_nodes);
            for sibling in parent.children().into_iter().flatten() {
                self.push_candidate(sibling, point, frontier, visited_nodes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::World;
    use cellforest_cube::CubeKey;
    use cellforest_index::Tree;

    #[test]
    fn knn_returns_closest_entities_in_ascending_distance_order() {
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        let near = tree.insert(&world, Point3::new(10.0, 10.0, 10.0), None, ()).unwrap();
        let mid = tree.insert(&world, Point3::new(50.0, 50.0, 50.0), None, ()).unwrap();
        let _far = tree.insert(&world, Point3::new(500_000.0, 500_000.0, 500_000.0), None, ()).unwrap();

        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let result = engine.knn(Point3::new(9.0, 9.0, 9.0), 2, || true);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, near);
        assert_eq!(result[1].0, mid);
        assert!(result[0].1 <= result[1].1);
    }

    #[test]
    fn knn_with_k_zero_returns_nothing() {
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        tree.insert(&world, Point3::splat(1.0), None, ()).unwrap();
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        assert!(engine.knn(Point3::splat(0.0), 0, || true).is_empty());
    }
}
