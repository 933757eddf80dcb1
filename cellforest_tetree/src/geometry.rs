// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Möller–Trumbore ray/tetrahedron intersection over the four triangular
//! faces of [`crate::TetKey::vertices`] (spec §4.11: "tetrahedron: four
//! triangles").

use cellforest_core::{Point3, Ray3D};

const EPS: f64 = 1e-9;

fn moller_trumbore(ray: &Ray3D, v0: Point3, v1: Point3, v2: Point3) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPS {
        return None;
    }
    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(q);
    if t < 0.0 {
        None
    } else {
        Some(t)
    }
}

/// Ray/tetrahedron intersection over the four faces, each opposite one
/// vertex of `verts` (face `i` is opposite vertex `i`, matching the
/// face-index convention `ray_intersect_exact` reports). Returns
/// `(t_near, t_far, near_face, far_face)`.
pub fn ray_intersect_tet(ray: &Ray3D, verts: &[Point3; 4]) -> Option<(f64, f64, u8, u8)> {
    let [v0, v1, v2, v3] = *verts;
    let faces = [(v1, v2, v3), (v0, v2, v3), (v0, v1, v3), (v0, v1, v2)];
    let mut near: Option<(f64, u8)> = None;
    let mut far: Option<(f64, u8)> = None;
    for (face, (a, b, c)) in faces.into_iter().enumerate() {
        if let Some(t) = moller_trumbore(ray, a, b, c) {
            let face = face as u8;
            near = Some(match near {
                Some((nt, _)) if nt <= t => near.unwrap(),
                _ => (t, face),
            });
            far = Some(match far {
                Some((ft, _)) if ft >= t => far.unwrap(),
                _ => (t, face),
            });
        }
    }
    match (near, far) {
        (Some((t_near, near_face)), Some((t_far, far_face))) => Some((t_near, t_far, near_face, far_face)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellforest_core::{UPoint3, Vector3, World};
    use crate::TetKey;
    use cellforest_core::SpatialKey;

    #[test]
    fn ray_through_root_tet_hits_two_faces() {
        let world = World::default_grid();
        let tet = TetKey::root_of_type(0);
        let verts = tet.vertices(&world);
        let centroid = Point3::new(
            (verts[0].x + verts[1].x + verts[2].x + verts[3].x) / 4.0,
            (verts[0].y + verts[1].y + verts[2].y + verts[3].y) / 4.0,
            (verts[0].z + verts[1].z + verts[2].z + verts[3].z) / 4.0,
        );
        let outside = Point3::new(centroid.x, centroid.y, -1_000_000.0);
        let ray = Ray3D::new(outside, (centroid - outside).normalize());
        let hit = ray_intersect_tet(&ray, &verts);
        assert!(hit.is_some());
        let (t_near, t_far, _near_face, _far_face) = hit.unwrap();
        assert!(t_near <= t_far);
    }

    #[test]
    fn ray_missing_tet_returns_none() {
        let world = World::default_grid();
        let tet = TetKey::root_of_type(0);
        let verts = tet.vertices(&world);
        let far_away = world.from_grid(UPoint3::new(0, 0, 0)) + Point3::new(-1.0, -1.0, -1.0) * 1_000_000.0;
        let ray = Ray3D::new(far_away, Vector3::Z);
        assert!(ray_intersect_tet(&ray, &verts).is_none());
    }
}
