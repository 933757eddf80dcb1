// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity spanning policy: for bounded entities, the set of node keys the
//! entity occupies (spec §4.10).

use cellforest_core::{Aabb3, SpatialKey, World};
use smallvec::SmallVec;

/// Load figures a [`SpanningPolicy`] may use to scale its span. Point and
/// standard policies ignore this; [`AdaptiveSpanningPolicy`] doesn't.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpanningContext {
    /// Total live nodes in the tree right now.
    pub node_count: usize,
    /// Total live entities in the tree right now.
    pub entity_count: usize,
}

/// Upper bound on how many cells one entity may span, scaled down as either
/// the entity grows relative to a cell or the tree grows denser, so a
/// single huge entity can't dominate every node's entity list.
pub fn max_span_nodes(entity_size: f64, node_size: f64, node_count: usize) -> usize {
    let ratio = if node_size > 0.0 {
        (entity_size / node_size).max(1.0)
    } else {
        1.0
    };
    let base = (ratio.ceil() as usize).clamp(1, 8);
    if node_count > 10_000 {
        base.min(4)
    } else {
        base
    }
}

/// Returns at least one key, never more than [`max_span_nodes`] for
/// adaptive policies, and is deterministic for identical inputs (spec
/// §4.10 contract).
pub trait SpanningPolicy<K: SpatialKey> {
    /// `node` is the key already located for the entity's position at the
    /// candidate level; `bounds` is the entity's bounds, if any.
    fn span(&self, world: &World, node: K, bounds: Option<Aabb3>, ctx: SpanningContext) -> SmallVec<[K; 8]>;
}

fn singleton<K>(node: K) -> SmallVec<[K; 8]> {
    let mut out = SmallVec::new();
    out.push(node);
    out
}

/// Point entities always span exactly the cell containing their position.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointSpanningPolicy;

impl<K: SpatialKey> SpanningPolicy<K> for PointSpanningPolicy {
    fn span(&self, _world: &World, node: K, _bounds: Option<Aabb3>, _ctx: SpanningContext) -> SmallVec<[K; 8]> {
        singleton(node)
    }
}

/// Standard spanning: a bounded entity occupies every child of `node`
/// whose AABB intersects its bounds. Falls back to `node` itself for point
/// entities or if no child actually overlaps (degenerate bounds).
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSpanningPolicy;

impl<K: SpatialKey> SpanningPolicy<K> for StandardSpanningPolicy {
    fn span(&self, world: &World, node: K, bounds: Option<Aabb3>, _ctx: SpanningContext) -> SmallVec<[K; 8]> {
        let Some(bounds) = bounds else {
            return singleton(node);
        };
        let mut out = SmallVec::new();
        for child in node.children().into_iter().flatten() {
            if child.bounding_aabb(world).intersects(&bounds) {
                out.push(child);
            }
        }
        if out.is_empty() {
            singleton(node)
        } else {
            out
        }
    }
}

/// Adjusts the effective span count from the entity's extent relative to
/// the candidate node's size and the tree's current load (spec §4.10).
#[derive(Clone, Copy, Debug)]
pub struct AdaptiveSpanningPolicy {
    /// Hard ceiling passed to [`max_span_nodes`] regardless of load.
    pub max_span_ceiling: usize,
    /// Entity count above which the policy halves its ceiling further, to
    /// keep per-node entity lists from growing unbounded in a dense tree.
    pub dense_entity_threshold: usize,
}

impl Default for AdaptiveSpanningPolicy {
    fn default() -> Self {
        Self {
            max_span_ceiling: 8,
            dense_entity_threshold: 100_000,
        }
    }
}

impl AdaptiveSpanningPolicy {
    /// Favors a small memory footprint over query speed: a tight span
    /// ceiling and an earlier dense-tree cutoff, so a bounded entity
    /// duplicates its id into as few nodes as possible (spec §4.10:
    /// "memory-optimized / performance-optimized presets tune the
    /// thresholds but obey the same contract").
    pub fn memory_optimized() -> Self {
        Self {
            max_span_ceiling: 2,
            dense_entity_threshold: 10_000,
        }
    }

    /// Favors query speed over memory: a generous span ceiling and a later
    /// dense-tree cutoff, so a range or k-NN query is more likely to find a
    /// bounded entity without visiting extra neighboring nodes, at the cost
    /// of more duplicated references per entity.
    pub fn performance_optimized() -> Self {
        Self {
            max_span_ceiling: 8,
            dense_entity_threshold: 1_000_000,
        }
    }
}

impl<K: SpatialKey> SpanningPolicy<K> for AdaptiveSpanningPolicy {
    fn span(&self, world: &World, node: K, bounds: Option<Aabb3>, ctx: SpanningContext) -> SmallVec<[K; 8]> {
        let Some(bounds) = bounds else {
            return singleton(node);
        };
        let extent = bounds.max - bounds.min;
        let entity_size = extent.x.max(extent.y).max(extent.z);
        let node_size = world.length_at_level(node.level()).max(f64::EPSILON);
        let mut limit = max_span_nodes(entity_size, node_size, ctx.node_count).min(self.max_span_ceiling);
        if ctx.entity_count > self.dense_entity_threshold {
            limit = limit.min(2);
        }
        let mut out = SmallVec::new();
        for child in node.children().into_iter().flatten() {
            if out.len() >= limit {
                break;
            }
            if child.bounding_aabb(world).intersects(&bounds) {
                out.push(child);
            }
        }
        if out.is_empty() {
            singleton(node)
        } else {
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::{Point3, SpatialKey};
    use cellforest_cube::CubeKey;

    #[test]
    fn point_policy_always_returns_one_key() {
        let world = World::default_grid();
        let key = CubeKey::locate(&world, Point3::new(1.0, 1.0, 1.0), 5).unwrap();
        let span = PointSpanningPolicy.span(&world, key, None, SpanningContext::default());
        assert_eq!(span.len(), 1);
        assert_eq!(span[0], key);
    }

    #[test]
    fn standard_policy_spans_intersecting_children_and_never_empty() {
        let world = World::default_grid();
        let key = CubeKey::locate(&world, Point3::splat(0.0), 2).unwrap();
        let bounds = key.bounding_aabb(&world);
        let span = StandardSpanningPolicy.span(&world, key, Some(bounds), SpanningContext::default());
        assert!(!span.is_empty());
        assert!(span.len() <= 8);
    }

    #[test]
    fn adaptive_policy_respects_ceiling() {
        let world = World::default_grid();
        let key = CubeKey::locate(&world, Point3::splat(0.0), 2).unwrap();
        let bounds = key.bounding_aabb(&world);
        let policy = AdaptiveSpanningPolicy { max_span_ceiling: 3, ..AdaptiveSpanningPolicy::default() };
        let span = policy.span(&world, key, Some(bounds), SpanningContext { node_count: 0, entity_count: 0 });
        assert!(!span.is_empty());
        assert!(span.len() <= 3);
    }

    #[test]
    fn memory_optimized_preset_spans_fewer_nodes_than_performance_optimized() {
        let world = World::default_grid();
        let key = CubeKey::locate(&world, Point3::splat(0.0), 2).unwrap();
        let bounds = key.bounding_aabb(&world);
        let ctx = SpanningContext { node_count: 0, entity_count: 0 };
        let memory_span = AdaptiveSpanningPolicy::memory_optimized().span(&world, key, Some(bounds), ctx);
        let perf_span = AdaptiveSpanningPolicy::performance_optimized().span(&world, key, Some(bounds), ctx);
        assert!(memory_span.len() <= perf_span.len());
        assert!(memory_span.len() <= AdaptiveSpanningPolicy::memory_optimized().max_span_ceiling);
    }

    #[test]
    fn dense_entity_threshold_caps_span_regardless_of_ceiling() {
        let world = World::default_grid();
        let key = CubeKey::locate(&world, Point3::splat(0.0), 2).unwrap();
        let bounds = key.bounding_aabb(&world);
        let policy = AdaptiveSpanningPolicy::performance_optimized();
        let dense_ctx = SpanningContext { node_count: 0, entity_count: policy.dense_entity_threshold + 1 };
        let span = policy.span(&world, key, Some(bounds), dense_ctx);
        assert!(span.len() <= 2);
    }
}
