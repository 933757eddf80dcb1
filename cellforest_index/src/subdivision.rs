// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subdivision policy: decides how an insertion changes node structure
//! (spec §4.9).

use cellforest_core::Aabb3;
use smallvec::SmallVec;

/// Inputs to a subdivision decision for one `(node, candidate insertion)`
/// pair.
#[derive(Clone, Copy, Debug)]
pub struct SubdivisionContext {
    /// The candidate node's refinement level.
    pub node_level: u8,
    /// Entities already stored directly at the candidate node.
    pub current_size: usize,
    /// Capacity threshold before a node is considered for subdivision.
    pub max_entities_per_node: usize,
    /// Whether this decision is part of a batched bulk load.
    pub is_bulk: bool,
    /// At least twice over capacity: forces subdivision regardless of
    /// `is_bulk` (spec §4.9 tie-break).
    pub is_critically_overloaded: bool,
    /// Bounds of the entity being inserted, if it isn't a point.
    pub new_entity_bounds: Option<Aabb3>,
}

impl SubdivisionContext {
    /// Build a context, deriving `is_critically_overloaded` from
    /// `current_size` and `max_entities_per_node`.
    pub fn new(
        node_level: u8,
        current_size: usize,
        max_entities_per_node: usize,
        is_bulk: bool,
        new_entity_bounds: Option<Aabb3>,
    ) -> Self {
        Self {
            node_level,
            current_size,
            max_entities_per_node,
            is_bulk,
            is_critically_overloaded: current_size >= 2 * max_entities_per_node,
            new_entity_bounds,
        }
    }
}

/// What a [`SubdivisionPolicy`] decided for one insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubdivisionDecision<K> {
    /// Keep the entity at the candidate node.
    InsertInParent(&'static str),
    /// Keep the entity here for now; only valid during bulk loading when
    /// the node isn't critically overloaded.
    DeferSubdivision(&'static str),
    /// Descend one level and retry placement among the node's children.
    ForceSubdivision(&'static str),
    /// Place the entity directly at a specific child, bypassing a full
    /// redistribution.
    CreateSingleChild(K, &'static str),
    /// Place the entity at several specific children at once (a bounded
    /// entity straddling more than one).
    SplitToChildren(SmallVec<[K; 8]>, &'static str),
}

/// Decides, per insertion, whether a node should split, defer, or simply
/// accept the entity directly.
pub trait SubdivisionPolicy<K> {
    /// Judge one `(node, candidate insertion)` pair. `max_level` is the
    /// geometry's deepest legal level; a node already there must never
    /// subdivide (spec §4.9).
    fn decide(&self, ctx: &SubdivisionContext, max_level: u8) -> SubdivisionDecision<K>;
}

/// Isotropic policy shared by the cube and tetree variants: subdivide once
/// a node exceeds its capacity, unless deferred during bulk load or pinned
/// at the deepest level.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSubdivisionPolicy;

impl<K> SubdivisionPolicy<K> for StandardSubdivisionPolicy {
    fn decide(&self, ctx: &SubdivisionContext, max_level: u8) -> SubdivisionDecision<K> {
        decide_isotropic(ctx, max_level)
    }
}

fn decide_isotropic<K>(ctx: &SubdivisionContext, max_level: u8) -> SubdivisionDecision<K> {
    if ctx.node_level >= max_level {
        return SubdivisionDecision::InsertInParent("node is at the deepest level");
    }
    if ctx.current_size < ctx.max_entities_per_node {
        return SubdivisionDecision::InsertInParent("under capacity");
    }
    if ctx.is_bulk && !ctx.is_critically_overloaded {
        return SubdivisionDecision::DeferSubdivision("bulk load, not critically overloaded");
    }
    SubdivisionDecision::ForceSubdivision("at or over capacity")
}

/// Anisotropic policy for the prism variant: once capacity forces a
/// decision, it scores horizontal (triangular) vs. vertical (linear)
/// refinement from the candidate entity's aspect ratio instead of treating
/// both axes identically (spec §4.9: "directional policy ... driven by
/// entity aspect ratio and configurable thresholds").
#[derive(Clone, Copy, Debug)]
pub struct PrismSubdivisionPolicy {
    /// Horizontal-to-vertical extent ratio above which a flat entity biases
    /// the decision toward triangular (horizontal) refinement.
    pub horizontal_aspect_threshold: f64,
    /// Vertical-to-horizontal extent ratio above which a tall entity biases
    /// the decision toward linear (vertical) refinement.
    pub vertical_aspect_threshold: f64,
}

impl Default for PrismSubdivisionPolicy {
    fn default() -> Self {
        Self {
            horizontal_aspect_threshold: 2.0,
            vertical_aspect_threshold: 2.0,
        }
    }
}

impl PrismSubdivisionPolicy {
    fn aspect_ratio(bounds: &Aabb3) -> f64 {
        let size = bounds.max - bounds.min;
        let horizontal = size.x.max(size.y).max(f64::EPSILON);
        let vertical = size.z.max(f64::EPSILON);
        horizontal / vertical
    }
}

impl<K> SubdivisionPolicy<K> for PrismSubdivisionPolicy {
    fn decide(&self, ctx: &SubdivisionContext, max_level: u8) -> SubdivisionDecision<K> {
        match decide_isotropic(ctx, max_level) {
            SubdivisionDecision::ForceSubdivision(_) => {
                let Some(bounds) = ctx.new_entity_bounds else {
                    return SubdivisionDecision::ForceSubdivision("at or over capacity");
                };
                let ratio = Self::aspect_ratio(&bounds);
                if ratio >= self.horizontal_aspect_threshold {
                    SubdivisionDecision::ForceSubdivision("flat entity, triangular refinement favored")
                } else if ratio <= 1.0 / self.vertical_aspect_threshold {
                    SubdivisionDecision::ForceSubdivision("tall entity, linear refinement favored")
                } else {
                    SubdivisionDecision::ForceSubdivision("at or over capacity, no directional bias")
                }
            }
            other => other,
        }
    }
}
