// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The 2D triangular half of a prism cell.

use cellforest_core::{CellError, GRID_RESOLUTION, MAX_LEVEL};

use crate::triangle_tables::{self, IVec2};

const fn cell_half(level: u8) -> i64 {
    (GRID_RESOLUTION >> level) as i64
}

/// SFC key for the triangular component of a prism cell: a Bey-refined
/// right triangle, `(anchor, level, type)`.
///
/// The triangle world is itself a single right triangle
/// `{x >= 0, y >= 0, x + y < GRID_RESOLUTION}`, not the full square; type 0
/// is the only type reachable at level 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriangleKey {
    anchor: (u32, u32),
    level: u8,
    ty: u8,
}

impl TriangleKey {
    /// The root triangle, covering the entire valid `(x, y)` domain.
    pub const fn root() -> Self {
        Self {
            anchor: (0, 0),
            level: 0,
            ty: 0,
        }
    }

    /// Refinement level.
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Bey type (`0` or `1`).
    pub const fn tri_type(&self) -> u8 {
        self.ty
    }

    /// Anchor (bounding-box minimum corner) on the grid lattice.
    pub const fn anchor(&self) -> (u32, u32) {
        self.anchor
    }

    fn to_ivec(&self) -> IVec2 {
        [self.anchor.0 as i64, self.anchor.1 as i64]
    }

    /// The triangle's three vertices, as grid coordinates.
    pub fn grid_vertices(&self) -> [IVec2; 3] {
        triangle_tables::vertices(self.ty, self.to_ivec(), cell_half(self.level))
    }

    /// Locate the triangle at `level` containing grid point `(gx, gy)`.
    /// Fails with [`CellError::CoordinateOutOfWorld`] if `gx + gy` falls
    /// outside the triangular domain.
    pub fn locate(gx: u32, gy: u32, level: u8) -> Result<Self, CellError> {
        if gx as i64 + gy as i64 >= GRID_RESOLUTION as i64 {
            return Err(CellError::CoordinateOutOfWorld {
                x: gx as f64,
                y: gy as f64,
                z: 0.0,
            });
        }
        let local: IVec2 = [gx as i64, gy as i64];
        let mut anchor: IVec2 = [0, 0];
        let mut ty = 0u8;
        for cur_level in 0..level {
            let half = cell_half(cur_level);
            let children = triangle_tables::bey_children_vertices(ty, anchor, half);
            let verts = children
                .iter()
                .find(|v| triangle_tables::point_in_triangle(**v, local))
                .expect("Bey subdivision covers its parent triangle");
            let (child_anchor, _half, child_ty) = triangle_tables::classify(*verts);
            anchor = child_anchor;
            ty = child_ty;
        }
        Ok(Self {
            anchor: (anchor[0] as u32, anchor[1] as u32),
            level,
            ty,
        })
    }

    /// Whether grid point `(gx, gy)` lies within this triangle.
    pub fn contains_grid_point(&self, gx: u32, gy: u32) -> bool {
        triangle_tables::point_in_triangle(self.grid_vertices(), [gx as i64, gy as i64])
    }

    /// Bey child `bey_id` (`0..4`).
    pub fn child(&self, bey_id: u8) -> Result<Self, CellError> {
        if self.level >= MAX_LEVEL {
            return Err(CellError::MaxLevelExceeded { level: self.level });
        }
        if bey_id >= 4 {
            return Err(CellError::InvalidKey);
        }
        let half = cell_half(self.level);
        let children = triangle_tables::bey_children_vertices(self.ty, self.to_ivec(), half);
        let (child_anchor, _half, child_ty) = triangle_tables::classify(children[bey_id as usize]);
        Ok(Self {
            anchor: (child_anchor[0] as u32, child_anchor[1] as u32),
            level: self.level + 1,
            ty: child_ty,
        })
    }

    /// Edge-neighbor across edge `edge` (`0..3`, opposite vertex `edge` of
    /// [`TriangleKey::grid_vertices`]), at the same level. `None` if the
    /// neighbor would fall outside the triangular domain (spec §4.5:
    /// "Edge-neighbors (3) via table lookup; boundaries return NONE").
    ///
    /// Every same-level triangle of a given type tiles a regular grid of
    /// unit squares of edge `cell_half(level)`, each split along a constant
    /// NW-SE diagonal into a type-0 (lower-left) and type-1 (upper-right)
    /// triangle sharing that diagonal as their hypotenuse. That structure
    /// gives a fixed 3-entry `(anchor delta, new type)` table per type,
    /// mirroring `CubeKey::all_neighbors`/`LineKey::neighbor`'s table-lookup
    /// style.
    pub fn neighbor(&self, edge: u8) -> Option<Self> {
        let half = cell_half(self.level) as i64;
        // (anchor_delta, new_type) for edge `0..3`, indexed by `[ty][edge]`.
        const TABLE: [[(i64, i64, u8); 3]; 2] = [
            // type 0: edge0 = hypotenuse, edge1 = left leg, edge2 = bottom leg.
            [(0, 0, 1), (-1, 0, 1), (0, -1, 1)],
            // type 1: edge0 = top leg, edge1 = right leg, edge2 = hypotenuse.
            [(0, 1, 0), (1, 0, 0), (0, 0, 0)],
        ];
        let (dx, dy, new_ty) = *TABLE.get(self.ty as usize)?.get(edge as usize)?;
        let n_anchor: IVec2 = [self.anchor.0 as i64 + dx * half, self.anchor.1 as i64 + dy * half];
        let bound = GRID_RESOLUTION as i64;
        let verts = triangle_tables::vertices(new_ty, n_anchor, half);
        let in_domain = verts.iter().all(|v| v[0] >= 0 && v[1] >= 0 && v[0] + v[1] <= bound);
        if !in_domain {
            return None;
        }
        Some(Self {
            anchor: (n_anchor[0] as u32, n_anchor[1] as u32),
            level: self.level,
            ty: new_ty,
        })
    }

    /// All three edge-neighbors, in edge order; `None` entries are domain
    /// boundaries.
    pub fn all_neighbors(&self) -> [Option<Self>; 3] {
        [self.neighbor(0), self.neighbor(1), self.neighbor(2)]
    }

    /// The parent triangle, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        let half = cell_half(self.level);
        let parent_half = half * 2;
        let a = self.to_ivec();
        let parent_anchor = [(a[0] / parent_half) * parent_half, (a[1] / parent_half) * parent_half];
        for parent_ty in 0..2u8 {
            let children = triangle_tables::bey_children_vertices(parent_ty, parent_anchor, parent_half);
            for verts in children {
                let (c_anchor, _half, c_ty) = triangle_tables::classify(verts);
                if c_anchor == a && c_ty == self.ty {
                    return Some(Self {
                        anchor: (parent_anchor[0] as u32, parent_anchor[1] as u32),
                        level: self.level - 1,
                        ty: parent_ty,
                    });
                }
            }
        }
        unreachable!("every triangle type has exactly one parent type reproducing it")
    }
}

impl PartialOrd for TriangleKey {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TriangleKey {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.level
            .cmp(&other.level)
            .then(self.anchor.cmp(&other.anchor))
            .then(self.ty.cmp(&other.ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_covers_triangular_domain_only() {
        assert!(TriangleKey::locate(10, 10, 0).is_ok());
        assert!(TriangleKey::locate(GRID_RESOLUTION - 1, GRID_RESOLUTION - 1, 0).is_err());
    }

    #[test]
    fn locate_contains_and_parent_round_trips() {
        let tri = TriangleKey::locate(1000, 2000, 6).unwrap();
        assert!(tri.contains_grid_point(1000, 2000));
        let parent = tri.parent().unwrap();
        assert_eq!(parent.level(), 5);
    }

    #[test]
    fn child_then_parent_is_identity() {
        let root = TriangleKey::root();
        for bey_id in 0..4u8 {
            let child = root.child(bey_id).unwrap();
            assert_eq!(child.parent().unwrap(), root);
        }
    }

    #[test]
    fn root_hypotenuse_neighbor_is_domain_boundary() {
        let root = TriangleKey::root();
        assert_eq!(root.neighbor(0), None, "root's hypotenuse has no type-1 sibling at level 0");
        assert_eq!(root.neighbor(1), None, "root's left leg is the domain boundary");
        assert_eq!(root.neighbor(2), None, "root's bottom leg is the domain boundary");
    }

    #[test]
    fn interior_edge_neighbor_round_trips() {
        let tri = TriangleKey::locate(1000, 2000, 6).unwrap();
        for edge in 0..3u8 {
            if let Some(neighbor) = tri.neighbor(edge) {
                assert_eq!(neighbor.level(), tri.level());
                assert_ne!(neighbor.tri_type(), tri.tri_type(), "crossing an edge always flips type");
                assert_ne!(neighbor, tri);
            }
        }
    }

    #[test]
    fn hypotenuse_neighbor_shares_the_same_anchor() {
        let tri = TriangleKey::locate(1000, 2000, 6).unwrap();
        let hypotenuse_edge = if tri.tri_type() == 0 { 0 } else { 2 };
        let neighbor = tri.neighbor(hypotenuse_edge).expect("hypotenuse neighbor always exists within a square");
        assert_eq!(neighbor.anchor(), tri.anchor());
        assert_ne!(neighbor.tri_type(), tri.tri_type());
    }

    #[test]
    fn max_level_child_fails() {
        let tri = TriangleKey {
            anchor: (0, 0),
            level: MAX_LEVEL,
            ty: 0,
        };
        assert_eq!(tri.child(0), Err(CellError::MaxLevelExceeded { level: MAX_LEVEL }));
    }
}
