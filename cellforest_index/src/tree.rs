// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Tree`]: ties the node store, entity manager, and subdivision/spanning
//! policies together into the insert/remove/update_position surface spec
//! §4.7-§4.10 describe in terms of each other.

use alloc::boxed::Box;
use alloc::vec::Vec;

use cellforest_core::{Aabb3, CellError, DsocHooks, EntityIdGenerator, Point3, SpatialKey, World, MAX_LEVEL};
use smallvec::SmallVec;

use crate::entity::{EntityId, EntityManager, EntityRecord, SequentialIdGenerator};
use crate::node::{Node, NodeStore};
use crate::spanning::{SpanningContext, SpanningPolicy, StandardSpanningPolicy};
use crate::subdivision::{SubdivisionContext, SubdivisionDecision, SubdivisionPolicy, StandardSubdivisionPolicy};

/// Point-in-time counters describing a tree's current load, returned by
/// [`Tree::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Live nodes in the store.
    pub node_count: usize,
    /// Live entities in the manager.
    pub entity_count: usize,
    /// Deepest refinement level any node has ever reached.
    pub max_depth: u8,
    /// Collision pairs found by the most recent full collision scan
    /// (`cellforest_query::QueryEngine::find_all_collisions`); `0` if no
    /// scan has run yet.
    pub collision_pairs_last_scan: usize,
}

/// A single spatial tree: one variant's node store plus its entity
/// manager, driven by injectable subdivision and spanning policies (spec
/// §4.7-§4.10).
pub struct Tree<K, C = (), G = SequentialIdGenerator, P = StandardSubdivisionPolicy, S = StandardSpanningPolicy> {
    nodes: NodeStore<K>,
    entities: EntityManager<K, C>,
    id_gen: G,
    subdivision: P,
    spanning: S,
    max_entities_per_node: usize,
    frame: u64,
    dsoc: Option<Box<dyn DsocHooks<K>>>,
}

impl<K, C, G, P, S> Tree<K, C, G, P, S>
where
    K: SpatialKey,
    G: EntityIdGenerator<Id = EntityId>,
    P: SubdivisionPolicy<K>,
    S: SpanningPolicy<K>,
{
    /// Build a tree from explicit policies and id generator.
    pub fn with_policies(max_entities_per_node: usize, id_gen: G, subdivision: P, spanning: S) -> Self {
        Self {
            nodes: NodeStore::new(),
            entities: EntityManager::new(),
            id_gen,
            subdivision,
            spanning,
            max_entities_per_node: max_entities_per_node.max(1),
            frame: 0,
            dsoc: None,
        }
    }

    /// Attach a DSOC (occlusion culling) collaborator. The core calls its
    /// hooks but never interprets what they return (spec §6).
    pub fn set_dsoc_hooks(&mut self, hooks: Box<dyn DsocHooks<K>>) {
        self.dsoc = Some(hooks);
    }

    /// Detach the current DSOC collaborator, if any.
    pub fn clear_dsoc_hooks(&mut self) {
        self.dsoc = None;
    }

    /// The frame counter [`Node::last_touch_frame`] is stamped with.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Start a new frame: notifies the attached DSOC collaborator, if any,
    /// and advances the frame counter mutations will stamp nodes with.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        if let Some(hooks) = &mut self.dsoc {
            hooks.on_frame_begin(self.frame);
        }
    }

    /// End the current frame, notifying the attached DSOC collaborator.
    pub fn end_frame(&mut self) {
        if let Some(hooks) = &mut self.dsoc {
            hooks.on_frame_end(self.frame);
        }
    }

    fn touch(&mut self, key: K) {
        self.nodes.touch(key, self.frame);
        if let Some(hooks) = &mut self.dsoc {
            hooks.on_entity_touched(key);
        }
    }

    /// Read-only access to the node store, e.g. for query engines.
    pub fn nodes(&self) -> &NodeStore<K> {
        &self.nodes
    }

    /// Read-only access to the entity manager.
    pub fn entities(&self) -> &EntityManager<K, C> {
        &self.entities
    }

    /// Current node/entity counts.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            node_count: self.nodes.len(),
            entity_count: self.entities.len(),
            max_depth: self.nodes.max_depth(),
            collision_pairs_last_scan: self.nodes.collision_pairs_last_scan(),
        }
    }

    /// Insert a new entity at `position` with optional `bounds` and
    /// `content`, returning its freshly generated id.
    pub fn insert(
        &mut self,
        world: &World,
        position: Point3,
        bounds: Option<Aabb3>,
        content: C,
    ) -> Result<EntityId, CellError> {
        let id = self.id_gen.generate();
        self.insert_with_id(world, id, position, bounds, content, None)?;
        Ok(id)
    }

    /// Insert under a caller-supplied id rather than this tree's own
    /// generator, and record which forest tree owns the entity. Used by a
    /// forest of trees (spec §4.13), which needs ids unique across every
    /// tree it holds rather than per-tree (spec I9).
    pub fn insert_with_id(
        &mut self,
        world: &World,
        id: EntityId,
        position: Point3,
        bounds: Option<Aabb3>,
        content: C,
        tree_id: Option<u32>,
    ) -> Result<(), CellError> {
        world.clamp(position)?;
        let span = self.compute_span(world, position, bounds, false, 0)?;
        for &key in &span {
            self.nodes.add_entity(key, id);
            self.touch(key);
        }
        self.entities.insert_record(
            id,
            EntityRecord {
                position,
                bounds,
                content,
                span,
                tree_id,
            },
        );
        Ok(())
    }

    /// Remove an entity, detaching it from every node in its span.
    pub fn remove(&mut self, id: EntityId) -> Result<(), CellError> {
        self.take(id).map(|_| ())
    }

    /// Remove an entity and return its record, for callers (a forest
    /// reassigning an entity between trees) that need the content and
    /// bounds to reinsert elsewhere.
    pub fn take(&mut self, id: EntityId) -> Result<EntityRecord<K, C>, CellError> {
        let record = self
            .entities
            .remove_record(id)
            .ok_or(CellError::EntityNotFound { id: id.raw() })?;
        for key in &record.span {
            self.nodes.remove_entity(key, id);
        }
        Ok(record)
    }

    /// Move an entity to `new_position`, applying the minimal set of node
    /// inserts/removes (spec §4.8). A no-op if the position is unchanged
    /// (spec R3).
    pub fn update_position(&mut self, world: &World, id: EntityId, new_position: Point3) -> Result<(), CellError> {
        let record = self.entities.get(id).ok_or(CellError::EntityNotFound { id: id.raw() })?;
        if record.position == new_position {
            return Ok(());
        }
        world.clamp(new_position)?;
        let bounds = record.bounds;
        let old_span = record.span.clone();
        let new_span = self.compute_span(world, new_position, bounds, false, 0)?;

        for &key in &old_span {
            if !new_span.contains(&key) {
                self.nodes.remove_entity(&key, id);
            }
        }
        for &key in &new_span {
            if !old_span.contains(&key) {
                self.nodes.add_entity(key, id);
                self.touch(key);
            }
        }
        if let Some(r) = self.entities.record_mut(id) {
            r.position = new_position;
            r.span = new_span;
        }
        Ok(())
    }

    /// Insert many entities at once, deferring subdivision under the
    /// policy's bulk rules, then forcing a single finalization pass over
    /// any node left critically overloaded once the batch is in.
    pub fn bulk_insert(
        &mut self,
        world: &World,
        entities: impl IntoIterator<Item = (Point3, Option<Aabb3>, C)>,
    ) -> Result<Vec<EntityId>, CellError> {
        let mut ids = Vec::new();
        for (position, bounds, content) in entities {
            world.clamp(position)?;
            let span = self.compute_span(world, position, bounds, true, 0)?;
            let id = self.id_gen.generate();
            for &key in &span {
                self.nodes.add_entity(key, id);
            }
            self.entities.insert_record(
                id,
                EntityRecord {
                    position,
                    bounds,
                    content,
                    span,
                    tree_id: None,
                },
            );
            ids.push(id);
        }
        self.finalize_bulk(world);
        Ok(ids)
    }

    fn finalize_bulk(&mut self, world: &World) {
        let overloaded: Vec<K> = self
            .nodes
            .iter()
            .filter(|(_, node): &(&K, &Node)| node.entity_ids.len() >= 2 * self.max_entities_per_node)
            .map(|(k, _)| *k)
            .collect();
        for key in overloaded {
            self.redistribute_node(world, key);
        }
    }

    fn redistribute_node(&mut self, world: &World, key: K) {
        let Some(node) = self.nodes.get(&key) else { return };
        if key.level() >= MAX_LEVEL {
            return;
        }
        let ids: SmallVec<[EntityId; 16]> = node.entity_ids.iter().copied().collect();
        let next_level = key.level() + 1;
        for id in ids {
            let Some(record) = self.entities.get(id) else { continue };
            let position = record.position;
            let bounds = record.bounds;
            let mut span = record.span.clone();

            self.nodes.remove_entity(&key, id);
            span.retain(|k| *k != key);

            let replacement = self
                .compute_span(world, position, bounds, false, next_level)
                .unwrap_or_else(|_| {
                    let mut fallback = SmallVec::new();
                    fallback.push(key);
                    fallback
                });
            for &k in &replacement {
                self.nodes.add_entity(k, id);
            }
            span.extend(replacement);
            span.sort_unstable();
            span.dedup();
            if let Some(r) = self.entities.record_mut(id) {
                r.span = span;
            }
        }
    }

    /// Drive C9/C10/C11's interplay: locate the candidate cell at
    /// `start_level`, consult the subdivision policy, descend a level at a
    /// time while it says `ForceSubdivision`, then hand off to the
    /// spanning policy once it settles (spec §4 control-flow summary).
    fn compute_span(
        &self,
        world: &World,
        position: Point3,
        bounds: Option<Aabb3>,
        is_bulk: bool,
        start_level: u8,
    ) -> Result<SmallVec<[K; 8]>, CellError> {
        let mut level = start_level;
        let mut key = K::locate(world, position, level)?;
        loop {
            let ctx = SubdivisionContext::new(
                level,
                self.nodes.entity_count(&key),
                self.max_entities_per_node,
                is_bulk,
                bounds,
            );
            match self.subdivision.decide(&ctx, MAX_LEVEL) {
                SubdivisionDecision::InsertInParent(_) | SubdivisionDecision::DeferSubdivision(_) => {
                    let span_ctx = SpanningContext {
                        node_count: self.nodes.len(),
                        entity_count: self.entities.len(),
                    };
                    return Ok(self.spanning.span(world, key, bounds, span_ctx));
                }
                SubdivisionDecision::ForceSubdivision(_) => {
                    if level >= MAX_LEVEL {
                        let span_ctx = SpanningContext {
                            node_count: self.nodes.len(),
                            entity_count: self.entities.len(),
                        };
                        return Ok(self.spanning.span(world, key, bounds, span_ctx));
                    }
                    level += 1;
                    key = K::locate(world, position, level)?;
                }
                SubdivisionDecision::CreateSingleChild(child_key, _) => {
                    let mut out = SmallVec::new();
                    out.push(child_key);
                    return Ok(out);
                }
                SubdivisionDecision::SplitToChildren(keys, _) => return Ok(keys),
            }
        }
    }
}

impl<K, G, P, S> Tree<K, (), G, P, S>
where
    K: SpatialKey,
    G: EntityIdGenerator<Id = EntityId> + Default,
    P: SubdivisionPolicy<K> + Default,
    S: SpanningPolicy<K> + Default,
{
    /// Build a tree with default policies and id generator.
    pub fn new(max_entities_per_node: usize) -> Self {
        Self::with_policies(max_entities_per_node, G::default(), P::default(), S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_cube::CubeKey;

    type CubeTree = Tree<CubeKey>;

    #[test]
    fn insert_and_point_lookup_round_trip() {
        let world = World::default_grid();
        let mut tree = CubeTree::new(4);
        let id = tree.insert(&world, Point3::new(10.0, 10.0, 10.0), None, ()).unwrap();
        assert_eq!(tree.stats().entity_count, 1);
        let record = tree.entities().get(id).unwrap();
        for &key in &record.span {
            assert!(tree.nodes().get(&key).unwrap().entity_ids.contains(&id));
        }
    }

    #[test]
    fn updating_to_current_position_is_a_no_op() {
        // spec R3.
        let world = World::default_grid();
        let mut tree = CubeTree::new(4);
        let pos = Point3::new(5.0, 5.0, 5.0);
        let id = tree.insert(&world, pos, None, ()).unwrap();
        let before = tree.entities().get(id).unwrap().span.clone();
        tree.update_position(&world, id, pos).unwrap();
        let after = tree.entities().get(id).unwrap().span.clone();
        assert_eq!(before, after);
    }

    #[test]
    fn remove_then_reinsert_yields_identical_membership() {
        // spec R4.
        let world = World::default_grid();
        let mut tree = CubeTree::new(4);
        let pos = Point3::new(42.0, 42.0, 42.0);
        let first = tree.insert(&world, pos, None, ()).unwrap();
        let span_before = tree.entities().get(first).unwrap().span.clone();
        tree.remove(first).unwrap();
        let second = tree.insert(&world, pos, None, ()).unwrap();
        let span_after = tree.entities().get(second).unwrap().span.clone();
        assert_eq!(span_before, span_after);
    }

    #[test]
    fn overloaded_node_subdivides_on_next_insert() {
        let world = World::default_grid();
        let mut tree = CubeTree::new(2);
        // Three points close enough together to land in the same coarse cell.
        for i in 0..3 {
            let p = Point3::new(1.0 + i as f64, 1.0, 1.0);
            tree.insert(&world, p, None, ()).unwrap();
        }
        assert_eq!(tree.stats().entity_count, 3);
        // No node should hold all three once the policy has forced a split
        // except at the deepest level, which this test never reaches.
        for (_, node) in tree.nodes().iter() {
            assert!(node.entity_ids.len() <= 3);
        }
    }

    #[test]
    fn unknown_entity_removal_is_an_error() {
        let mut tree = CubeTree::new(4);
        let bogus = {
            let world = World::default_grid();
            let id = tree.insert(&world, Point3::splat(0.0), None, ()).unwrap();
            tree.remove(id).unwrap();
            id
        };
        assert_eq!(tree.remove(bogus), Err(CellError::EntityNotFound { id: bogus.raw() }));
    }

    #[derive(Default)]
    struct RecordingHooksInner {
        begins: Vec<u64>,
        ends: Vec<u64>,
        touched: Vec<CubeKey>,
    }

    struct RecordingHooks(alloc::rc::Rc<core::cell::RefCell<RecordingHooksInner>>);

    impl DsocHooks<CubeKey> for RecordingHooks {
        fn on_frame_begin(&mut self, frame: u64) {
            self.0.borrow_mut().begins.push(frame);
        }
        fn on_frame_end(&mut self, frame: u64) {
            self.0.borrow_mut().ends.push(frame);
        }
        fn on_entity_touched(&mut self, key: CubeKey) {
            self.0.borrow_mut().touched.push(key);
        }
    }

    #[test]
    fn dsoc_hooks_see_frame_boundaries_and_touches() {
        let world = World::default_grid();
        let mut tree = CubeTree::new(4);
        let inner = alloc::rc::Rc::new(core::cell::RefCell::new(RecordingHooksInner::default()));
        tree.set_dsoc_hooks(Box::new(RecordingHooks(inner.clone())));

        assert_eq!(tree.frame(), 0);
        tree.begin_frame();
        assert_eq!(tree.frame(), 1);
        tree.insert(&world, Point3::new(1.0, 1.0, 1.0), None, ()).unwrap();
        tree.end_frame();

        assert_eq!(inner.borrow().begins, alloc::vec![1]);
        assert_eq!(inner.borrow().ends, alloc::vec![1]);
        assert!(!inner.borrow().touched.is_empty());

        let touched_before_detach = inner.borrow().touched.len();
        tree.clear_dsoc_hooks();
        tree.insert(&world, Point3::new(2.0, 2.0, 2.0), None, ()).unwrap();
        // Detached: no new touches recorded past what's already there.
        assert_eq!(inner.borrow().touched.len(), touched_before_detach);
    }

    #[test]
    fn bulk_insert_defers_then_finalizes_critical_overload() {
        let world = World::default_grid();
        let mut tree = CubeTree::new(2);
        let entities: Vec<_> = (0..10)
            .map(|i| (Point3::new(1.0 + i as f64 * 0.001, 1.0, 1.0), None, ()))
            .collect();
        let ids = tree.bulk_insert(&world, entities).unwrap();
        assert_eq!(ids.len(), 10);
        assert_eq!(tree.stats().entity_count, 10);
        for (_, node) in tree.nodes().iter() {
            assert!(node.entity_ids.len() < 4, "finalize_bulk should have split critically overloaded nodes");
        }
    }
}
