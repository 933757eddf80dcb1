// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The triangular-prism cell geometry: a [`PrismKey`] pairs a
//! [`TriangleKey`] (4-way Bey-refined right triangle in the XY plane) with
//! a [`LineKey`] (2-way binary interval on Z), giving 8 children per level.
//! [`geometry`] provides SAT collision and ray intersection against the
//! resulting six-vertex prism.

#![no_std]

mod geometry;
mod line;
mod triangle;
mod triangle_tables;

pub use geometry::{prisms_collide, ray_intersect_prism, ray_intersect_prism_faces};
pub use line::LineKey;
pub use triangle::TriangleKey;

use cellforest_core::{Aabb3, CellError, Point3, Ray3D, SpatialKey, UPoint3, World};

/// SFC key for a triangular-prism cell: `(triangle, line)`, lexicographic
/// in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrismKey {
    triangle: TriangleKey,
    line: LineKey,
}

impl PrismKey {
    /// The triangular (XY) component.
    pub const fn triangle(&self) -> TriangleKey {
        self.triangle
    }

    /// The linear (Z) component.
    pub const fn line(&self) -> LineKey {
        self.line
    }

    /// Locate the prism cell at `level` containing `point`.
    pub fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError> {
        let grid = world.to_grid(point)?;
        let triangle = TriangleKey::locate(grid.x, grid.y, level)?;
        let line = LineKey::locate(grid.z, level);
        Ok(Self { triangle, line })
    }

    /// The six vertices of this prism in world space: the triangle's three
    /// corners at the low Z plane, then the same three at the high Z plane.
    pub fn vertices(&self, world: &World) -> [Point3; 6] {
        let tri = self.triangle.grid_vertices();
        let z_lo = self.line.index() << (cellforest_core::MAX_LEVEL - self.line.level());
        let z_hi = z_lo + (cellforest_core::GRID_RESOLUTION >> self.line.level());
        let mut out = [Point3::ZERO; 6];
        for (i, v) in tri.iter().enumerate() {
            out[i] = world.from_grid(UPoint3::new(v[0] as u32, v[1] as u32, z_lo));
            out[i + 3] = world.from_grid(UPoint3::new(v[0] as u32, v[1] as u32, z_hi));
        }
        out
    }
}

impl SpatialKey for PrismKey {
    fn root() -> Self {
        Self {
            triangle: TriangleKey::root(),
            line: LineKey::root(),
        }
    }

    fn locate(world: &World, point: Point3, level: u8) -> Result<Self, CellError> {
        Self::locate(world, point, level)
    }

    fn level(&self) -> u8 {
        self.triangle.level()
    }

    fn parent(&self) -> Option<Self> {
        Some(Self {
            triangle: self.triangle.parent()?,
            line: self.line.parent()?,
        })
    }

    fn child(&self, child_index: u8) -> Result<Self, CellError> {
        if child_index >= 8 {
            return Err(CellError::InvalidKey);
        }
        let triangle = self.triangle.child(child_index / 2)?;
        let line = self.line.child(child_index % 2)?;
        Ok(Self { triangle, line })
    }

    fn bounding_aabb(&self, world: &World) -> Aabb3 {
        let verts = self.vertices(world);
        let mut min = verts[0];
        let mut max = verts[0];
        for v in &verts[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }
        Aabb3::new(min, max)
    }

    fn contains_point(&self, world: &World, point: Point3) -> bool {
        let grid = match world.to_grid(point) {
            Ok(g) => g,
            Err(_) => return false,
        };
        self.triangle.contains_grid_point(grid.x, grid.y) && self.line.contains_grid_point(grid.z)
    }

    fn ray_intersect_exact(&self, world: &World, ray: &Ray3D) -> Option<(f64, f64, u8, u8)> {
        geometry::ray_intersect_prism_faces(ray, &self.vertices(world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_is_contained_and_world_boundary_is_rejected() {
        // spec E5: world_size = 1.0, (0.1, 0.1, 0.5) valid, (0.6, 0.6, 0.5) invalid.
        let world = World::new(1.0);
        let good = Point3::new(0.1, 0.1, 0.5);
        let key = PrismKey::locate(&world, good, 4).unwrap();
        assert!(key.contains_point(&world, good));

        let bad = Point3::new(0.6, 0.6, 0.5);
        assert!(matches!(
            PrismKey::locate(&world, bad, 4),
            Err(CellError::CoordinateOutOfWorld { .. })
        ));
    }

    #[test]
    fn child_then_parent_round_trips() {
        let root = PrismKey::root();
        for i in 0..8u8 {
            let child = root.child(i).unwrap();
            assert_eq!(child.parent().unwrap(), root);
        }
    }

    #[test]
    fn bounding_aabb_contains_all_vertices() {
        let world = World::default_grid();
        let key = PrismKey::locate(&world, Point3::new(1000.0, 2000.0, 3000.0), 5).unwrap();
        let aabb = key.bounding_aabb(&world);
        for v in key.vertices(&world) {
            assert!(aabb.contains_point(v));
        }
    }
}
