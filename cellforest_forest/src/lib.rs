// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![warn(missing_docs)]

//! A forest of `N` independently-stored trees sharing one world and one
//! entity id space, with cross-tree range and k-NN dispatch (spec §4.13).

extern crate alloc;

use alloc::vec::Vec;

use cellforest_core::{Aabb3, CellError, EntityIdGenerator, Point3, Spatial, SpatialKey, World};
use cellforest_index::{
    EntityId, SequentialIdGenerator, SpanningPolicy, StandardSpanningPolicy, StandardSubdivisionPolicy,
    SubdivisionPolicy, Tree,
};
use cellforest_query::QueryEngine;
use hashbrown::HashMap;

/// A forest of trees that share one [`World`] and one [`EntityId`] space.
///
/// Each tree keeps its own node store and entity manager (spec §4.13: "Holds
/// `N` trees, each with its own node store"); the forest only tracks which
/// tree currently owns each entity, so `remove`/`update_position` don't need
/// their caller to remember a tree index.
pub struct Forest<K, C = (), P = StandardSubdivisionPolicy, S = StandardSpanningPolicy> {
    world: World,
    trees: Vec<Tree<K, C, SequentialIdGenerator, P, S>>,
    owner: HashMap<EntityId, u32>,
    id_gen: SequentialIdGenerator,
}

impl<K, C, P, S> Forest<K, C, P, S>
where
    K: SpatialKey,
    P: SubdivisionPolicy<K> + Default,
    S: SpanningPolicy<K> + Default,
{
    /// Build a forest of `tree_count` trees sharing `world`, each with
    /// `max_entities_per_node` as its subdivision threshold.
    pub fn new(world: World, tree_count: usize, max_entities_per_node: usize) -> Self {
        let trees = (0..tree_count.max(1))
            .map(|_| {
                Tree::with_policies(
                    max_entities_per_node,
                    SequentialIdGenerator::default(),
                    P::default(),
                    S::default(),
                )
            })
            .collect();
        Self {
            world,
            trees,
            owner: HashMap::new(),
            id_gen: SequentialIdGenerator::default(),
        }
    }

    /// The shared world every tree in this forest validates coordinates
    /// against.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to one tree by index.
    pub fn tree(&self, index: u32) -> Option<&Tree<K, C, SequentialIdGenerator, P, S>> {
        self.trees.get(index as usize)
    }

    /// How many trees this forest holds.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Which tree currently owns `id`, if it's live.
    pub fn owning_tree(&self, id: EntityId) -> Option<u32> {
        self.owner.get(&id).copied()
    }

    /// Insert a new entity into `tree_index`, returning a forest-wide unique
    /// id (spec I9).
    pub fn insert(
        &mut self,
        tree_index: u32,
        position: Point3,
        bounds: Option<Aabb3>,
        content: C,
    ) -> Result<EntityId, CellError> {
        let tree = self
            .trees
            .get_mut(tree_index as usize)
            .ok_or(CellError::InvalidKey)?;
        let id = self.id_gen.generate();
        tree.insert_with_id(&self.world, id, position, bounds, content, Some(tree_index))?;
        self.owner.insert(id, tree_index);
        Ok(id)
    }

    /// Remove `id` from whichever tree owns it.
    pub fn remove(&mut self, id: EntityId) -> Result<(), CellError> {
        let tree_index = self.owner.remove(&id).ok_or(CellError::EntityNotFound { id: id.raw() })?;
        self.trees[tree_index as usize].remove(id)
    }

    /// Move `id` to `new_position`. If `target_tree` names a different tree
    /// than the one that currently owns `id`, the entity is reassigned
    /// atomically: taken out of the old tree and inserted into the new one
    /// under the same id (spec §4.13). The forest doesn't infer the
    /// destination tree from `new_position` itself — spec.md is silent on a
    /// partitioning scheme, so callers that repartition space pass the tree
    /// they've already decided on.
    pub fn update_position(
        &mut self,
        id: EntityId,
        new_position: Point3,
        target_tree: u32,
    ) -> Result<(), CellError> {
        let current = *self.owner.get(&id).ok_or(CellError::EntityNotFound { id: id.raw() })?;
        if current == target_tree {
            return self.trees[current as usize].update_position(&self.world, id, new_position);
        }
        if target_tree as usize >= self.trees.len() {
            return Err(CellError::InvalidKey);
        }
        let record = self.trees[current as usize].take(id)?;
        self.trees[target_tree as usize].insert_with_id(
            &self.world,
            id,
            new_position,
            record.bounds,
            record.content,
            Some(target_tree),
        )?;
        self.owner.insert(id, target_tree);
        Ok(())
    }

    fn engine(&self, tree_index: usize) -> QueryEngine<'_, K, C> {
        QueryEngine::new(&self.world, self.trees[tree_index].nodes(), self.trees[tree_index].entities())
    }

    /// Range query dispatched to every tree, merged by entity id with
    /// duplicates removed (spec §4.13: "dispatch to each tree, merge by
    /// distance or identity").
    pub fn range(&self, volume: &Spatial) -> Vec<EntityId> {
        let mut out = Vec::new();
        for i in 0..self.trees.len() {
            out.extend(self.engine(i).range(volume));
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// k-NN dispatched to every tree, merged by distance and truncated to
    /// the global best `k` (spec §4.13). Each per-tree query runs against an
    /// independent, read-only view, so no tree's query observes another's
    /// mutable state.
    pub fn knn(&self, point: Point3, k: usize, mut should_continue: impl FnMut() -> bool) -> Vec<(EntityId, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let mut merged = Vec::new();
        for i in 0..self.trees.len() {
            merged.extend(self.engine(i).knn(point, k, &mut should_continue));
        }
        merged.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(core::cmp::Ordering::Equal));
        merged.truncate(k);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::Spatial;
    use cellforest_cube::CubeKey;

    type CubeForest = Forest<CubeKey>;

    #[test]
    fn insert_assigns_a_forest_unique_id_and_tracks_owner() {
        let mut forest = CubeForest::new(World::default_grid(), 2, 4);
        let a = forest.insert(0, Point3::new(1.0, 1.0, 1.0), None, ()).unwrap();
        let b = forest.insert(1, Point3::new(2.0, 2.0, 2.0), None, ()).unwrap();
        assert_ne!(a, b);
        assert_eq!(forest.owning_tree(a), Some(0));
        assert_eq!(forest.owning_tree(b), Some(1));
    }

    #[test]
    fn update_position_across_trees_reassigns_ownership() {
        let mut forest = CubeForest::new(World::default_grid(), 2, 4);
        let id = forest.insert(0, Point3::new(1.0, 1.0, 1.0), None, ()).unwrap();
        forest.update_position(id, Point3::new(5.0, 5.0, 5.0), 1).unwrap();
        assert_eq!(forest.owning_tree(id), Some(1));
        assert!(forest.tree(0).unwrap().entities().get(id).is_none());
        assert!(forest.tree(1).unwrap().entities().get(id).is_some());
    }

    #[test]
    fn range_merges_results_across_trees() {
        let mut forest = CubeForest::new(World::default_grid(), 2, 4);
        let a = forest.insert(0, Point3::new(1.0, 1.0, 1.0), None, ()).unwrap();
        let b = forest.insert(1, Point3::new(2.0, 2.0, 2.0), None, ()).unwrap();
        let volume = Spatial::Aabb(Aabb3::new(Point3::splat(0.0), Point3::splat(100.0)));
        let found = forest.range(&volume);
        assert!(found.contains(&a));
        assert!(found.contains(&b));
    }

    #[test]
    fn remove_unknown_id_is_an_error() {
        let mut forest = CubeForest::new(World::default_grid(), 1, 4);
        let id = forest.insert(0, Point3::splat(0.0), None, ()).unwrap();
        forest.remove(id).unwrap();
        assert_eq!(forest.remove(id), Err(CellError::EntityNotFound { id: id.raw() }));
    }
}
