// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity identifiers and the entity manager: the single source of truth
//! for `{id -> (position, bounds?, content, span, tree_id?)}` (spec §4.8).

use cellforest_core::{Aabb3, EntityIdGenerator, Point3, SpatialKey};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Stable identifier for an entity, unique within a forest.
///
/// Ordered so entity lists can be sorted deterministically (spec E1: range
/// query results in ascending id order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// The raw numeric value, for display or external correlation.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Monotonic sequential generator, the default [`EntityIdGenerator`].
///
/// Matches spec §4.8's "sequential or UUID; the generator is injected" —
/// callers that need UUIDs implement [`EntityIdGenerator`] themselves.
#[derive(Clone, Debug, Default)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl EntityIdGenerator for SequentialIdGenerator {
    type Id = EntityId;

    fn generate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// An entity's stored state: position, optional bounds, opaque payload, and
/// the set of node keys it currently occupies (its span).
#[derive(Clone, Debug)]
pub struct EntityRecord<K, C = ()> {
    /// Current world-space position.
    pub position: Point3,
    /// Bounds for non-point entities; `None` for point entities.
    pub bounds: Option<Aabb3>,
    /// Opaque caller payload. The core never inspects this.
    pub content: C,
    /// Every node key this entity is currently registered under.
    pub span: SmallVec<[K; 8]>,
    /// Which tree of a forest owns this entity, if part of one.
    pub tree_id: Option<u32>,
}

/// Owns every entity's canonical state for one tree.
#[derive(Debug)]
pub struct EntityManager<K, C = ()> {
    records: HashMap<EntityId, EntityRecord<K, C>>,
}

impl<K: SpatialKey, C> Default for EntityManager<K, C> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<K: SpatialKey, C> EntityManager<K, C> {
    /// An empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the manager holds no entities.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up an entity's record.
    pub fn get(&self, id: EntityId) -> Option<&EntityRecord<K, C>> {
        self.records.get(&id)
    }

    /// Whether `id` currently names a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// All live entity ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records.keys().copied()
    }

    pub(crate) fn insert_record(&mut self, id: EntityId, record: EntityRecord<K, C>) {
        self.records.insert(id, record);
    }

    pub(crate) fn remove_record(&mut self, id: EntityId) -> Option<EntityRecord<K, C>> {
        self.records.remove(&id)
    }

    pub(crate) fn record_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord<K, C>> {
        self.records.get_mut(&id)
    }
}
