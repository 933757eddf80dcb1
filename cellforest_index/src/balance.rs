// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`BalanceChecker`] collaborator interface for §7's `AdjacencyViolated`
//! ("the core surfaces this only through the checker's API"). The core ships
//! the trait and nothing that implements it (spec §9 Q3: no automatic 2:1
//! balancing unless a caller supplies one).

use cellforest_core::{CellError, NeighborDetector, SpatialKey};

use crate::node::NodeStore;

/// Judges whether a node store satisfies a 2:1 balance constraint (no two
/// face-adjacent leaves differ by more than one refinement level).
///
/// The core never calls this itself; callers that care about balance run one
/// after a batch of insertions/subdivisions and decide what to do with the
/// result (refine further, reject the batch, log it).
pub trait BalanceChecker<K: SpatialKey> {
    /// Walk `nodes`, consulting `neighbors` for adjacency across any
    /// partition boundary the store itself doesn't know about, and report
    /// the first violation found.
    fn check(&self, nodes: &NodeStore<K>, neighbors: &dyn NeighborDetector<K>) -> Result<(), CellError>;
}
