// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SAT-based prism/prism collision and Möller–Trumbore ray/prism
//! intersection against the six-vertex layout [`crate::PrismKey::vertices`]
//! produces (triangle at low Z, same triangle at high Z).

use cellforest_core::{Point3, Ray3D, Vector3};

const EPS: f64 = 1e-9;

fn edges(verts: &[Point3; 6]) -> [Vector3; 4] {
    [
        verts[1] - verts[0],
        verts[2] - verts[0],
        verts[2] - verts[1],
        Vector3::Z,
    ]
}

fn face_normals(verts: &[Point3; 6]) -> [Vector3; 4] {
    let side = |a: usize, b: usize| (verts[b] - verts[a]).cross(Vector3::Z);
    [
        Vector3::Z,
        side(0, 1),
        side(1, 2),
        side(2, 0),
    ]
}

fn project(verts: &[Point3; 6], axis: Vector3) -> (f64, f64) {
    let mut min = verts[0].dot(axis);
    let mut max = min;
    for v in &verts[1..] {
        let p = v.dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

fn overlaps_on_axis(a: &[Point3; 6], b: &[Point3; 6], axis: Vector3) -> bool {
    if axis.length_squared() < EPS {
        return true;
    }
    let (a_min, a_max) = project(a, axis);
    let (b_min, b_max) = project(b, axis);
    a_min <= b_max && b_min <= a_max
}

/// SAT collision test between two triangular prisms given as six-vertex
/// arrays (low-Z triangle, then high-Z triangle, matching
/// [`crate::PrismKey::vertices`]). Tests both shapes' face normals plus the
/// cross products of their edges — exact for convex polyhedra.
pub fn prisms_collide(a: &[Point3; 6], b: &[Point3; 6]) -> bool {
    for axis in face_normals(a) {
        if !overlaps_on_axis(a, b, axis) {
            return false;
        }
    }
    for axis in face_normals(b) {
        if !overlaps_on_axis(a, b, axis) {
            return false;
        }
    }
    for ea in edges(a) {
        for eb in edges(b) {
            let axis = ea.cross(eb);
            if !overlaps_on_axis(a, b, axis) {
                return false;
            }
        }
    }
    true
}

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

/// Ray/prism intersection via Möller–Trumbore over the five faces (2
/// triangle caps, 3 quad sides split into 2 triangles each). Returns
/// `(t_near, t_far)` when the ray hits the prism.
pub fn ray_intersect_prism(ray: &Ray3D, verts: &[Point3; 6]) -> Option<(f64, f64)> {
    ray_intersect_prism_faces(ray, verts).map(|(t_near, t_far, _, _)| (t_near, t_far))
}

/// Face indices, in `0..5`: `0` = low-Z cap, `1` = high-Z cap, `2..5` = the
/// three quad sides (`v0v1`, `v1v2`, `v2v0`), each split into two triangles
/// internally but reported as a single face.
const FACE_TRIANGLES: [(usize, usize, usize, u8); 8] = [
    (0, 1, 2, 0),
    (3, 5, 4, 1),
    (0, 3, 4, 2),
    (0, 4, 1, 2),
    (1, 4, 5, 3),
    (1, 5, 2, 3),
    (2, 5, 3, 4),
    (2, 3, 0, 4),
];

/// As [`ray_intersect_prism`], but also reports which face (`0..5`) the near
/// and far intersections hit (spec §4.11: "prism: two triangles + three
/// quads", result carries `(t_near, t_far, near_face, far_face)`).
pub fn ray_intersect_prism_faces(ray: &Ray3D, verts: &[Point3; 6]) -> Option<(f64, f64, u8, u8)> {
    let mut near: Option<(f64, u8)> = None;
    let mut far: Option<(f64, u8)> = None;
    for &(ia, ib, ic, face) in &FACE_TRIANGLES {
        if let Some(t) = moller_trumbore(ray, verts[ia], verts[ib], verts[ic]) {
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
