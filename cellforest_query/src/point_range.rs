// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point lookup and range queries (spec §4.11).

use alloc::vec::Vec;

use cellforest_core::{Point3, Spatial, SpatialKey};
use cellforest_index::EntityId;

use crate::engine::QueryEngine;

impl<K: SpatialKey, C> QueryEngine<'_, K, C> {
    /// `locate(p, level)`: the key of the cell at `level` containing `p`,
    /// without consulting the node store.
    pub fn locate(&self, point: Point3, level: u8) -> Option<K> {
        K::locate(self.world, point, level).ok()
    }

    /// `enclosing(p, level)`: the node at `(p, level)` and the entities
    /// directly stored there, or `None` if no such node exists.
    pub fn enclosing(&self, point: Point3, level: u8) -> Option<(K, &[EntityId])> {
        let key = self.locate(point, level)?;
        let node = self.nodes.get(&key)?;
        Some((key, node.entity_ids.as_slice()))
    }

    /// Every entity whose placement intersects `volume`.
    ///
    /// Filters each node's bounding box against `volume` first (spec
    /// §4.11): nodes the volume doesn't touch are skipped outright, nodes
    /// fully inside the volume contribute every entity they hold without a
    /// per-entity test, and nodes merely straddling the boundary fall back
    /// to testing each entity's own bounds (or position, for point
    /// entities).
    pub fn range(&self, volume: &Spatial) -> Vec<EntityId> {
        let mut out = Vec::new();
        for (key, node) in self.nodes.iter() {
            let node_aabb = key.bounding_aabb(self.world);
            if !volume.intersects_aabb(&node_aabb) {
                continue;
            }
            if volume.contains_aabb(&node_aabb) {
                out.extend(node.entity_ids.iter().copied());
                continue;
            }
            for &id in &node.entity_ids {
                let Some(record) = self.entities.get(id) else { continue };
                let matches = match record.bounds {
                    Some(bounds) => volume.intersects_aabb(&bounds),
                    None => volume.contains_point(record.position),
                };
                if matches {
                    out.push(id);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::{Aabb3, World};
    use cellforest_cube::CubeKey;
    use cellforest_index::Tree;

    #[test]
    fn enclosing_finds_the_node_an_entity_was_inserted_into() {
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        let id = tree.insert(&world, Point3::new(10.0, 10.0, 10.0), None, ()).unwrap();
        let span = tree.entities().get(id).unwrap().span.clone();
        let level = span[0].level();
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let (key, ids) = engine.enclosing(Point3::new(10.0, 10.0, 10.0), level).unwrap();
        assert_eq!(key, span[0]);
        assert!(ids.contains(&id));
    }

    #[test]
    fn range_query_returns_entities_inside_the_volume_in_ascending_id_order() {
        // spec E1: range-query results are returned in ascending id order.
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        let a = tree.insert(&world, Point3::new(5.0, 5.0, 5.0), None, ()).unwrap();
        let b = tree.insert(&world, Point3::new(6.0, 6.0, 6.0), None, ()).unwrap();
        let _far = tree.insert(&world, Point3::new(10_000.0, 10_000.0, 10_000.0), None, ()).unwrap();
        let volume = Spatial::Aabb(Aabb3::new(Point3::splat(0.0), Point3::splat(100.0)));
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let found = engine.range(&volume);
        assert_eq!(found, alloc::vec![a.min(b), a.max(b)]);
    }

    #[test]
    fn range_query_excludes_entities_outside_the_volume() {
        let world = World::default_grid();
        let mut tree: Tree<CubeKey> = Tree::new(8);
        let _inside = tree.insert(&world, Point3::new(1.0, 1.0, 1.0), None, ()).unwrap();
        let outside = tree.insert(&world, Point3::new(100_000.0, 100_000.0, 100_000.0), None, ()).unwrap();
        let volume = Spatial::Sphere { center: Point3::splat(1.0), radius: 10.0 };
        let engine = QueryEngine::new(&world, tree.nodes(), tree.entities());
        let found = engine.range(&volume);
        assert!(!found.contains(&outside));
    }
}
