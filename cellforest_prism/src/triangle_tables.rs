// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bey-style 4-way refinement of the right triangle that bounds the prism
//! variant's 2D domain, the 2D analogue of `cellforest_tetree::tables`.
//!
//! The prism world is itself a single right triangle `{x >= 0, y >= 0,
//! x + y < bound}` (not a full square): inserting at a point with
//! `x + y >= bound` is out of the world, matching the `x + y < 2^ℓ`
//! constraint. A type-0 triangle anchored at `a` with leg length `h` has
//! vertices `{a, a+(h,0), a+(0,h)}`; subdividing at the edge midpoints
//! produces three half-scale type-0 corner copies plus one type-1 center
//! triangle `{a+(h/2,0), a+(0,h/2), a+(h/2,h/2)}` (pointing the other way,
//! hypotenuse nearest the parent's right-angle corner). Type 1 never
//! appears at the root; it only arises as a Bey child.

pub type IVec2 = [i64; 2];

/// The raw vertex set of a type-`ty` triangle anchored at `anchor` with leg
/// length `half`.
pub fn vertices(ty: u8, anchor: IVec2, half: i64) -> [IVec2; 3] {
    match ty {
        0 => [
            anchor,
            [anchor[0] + half, anchor[1]],
            [anchor[0], anchor[1] + half],
        ],
        _ => [
            [anchor[0] + half, anchor[1]],
            [anchor[0], anchor[1] + half],
            [anchor[0] + half, anchor[1] + half],
        ],
    }
}

fn midpoint(a: IVec2, b: IVec2) -> IVec2 {
    [(a[0] + b[0]) / 2, (a[1] + b[1]) / 2]
}

/// The four Bey children of a type-`ty` triangle, as raw vertex sets.
/// Children `0..3` are corner triangles (same type as the parent); child
/// `3` is the center triangle, of the other type.
pub fn bey_children_vertices(ty: u8, anchor: IVec2, half: i64) -> [[IVec2; 3]; 4] {
    let [v0, v1, v2] = vertices(ty, anchor, half);
    let m01 = midpoint(v0, v1);
    let m02 = midpoint(v0, v2);
    let m12 = midpoint(v1, v2);
    [
        [v0, m01, m02],
        [m01, v1, m12],
        [m02, m12, v2],
        [m01, m02, m12],
    ]
}

/// Recover `(anchor, half, type)` for a Bey-child vertex set.
pub fn classify(verts: [IVec2; 3]) -> (IVec2, i64, u8) {
    let anchor = [
        verts.iter().map(|v| v[0]).min().unwrap(),
        verts.iter().map(|v| v[1]).min().unwrap(),
    ];
    let rel: [IVec2; 3] = verts.map(|v| [v[0] - anchor[0], v[1] - anchor[1]]);
    let half = rel.iter().flatten().copied().max().unwrap();
    let ty = if rel.contains(&[0, 0]) { 0 } else { 1 };
    (anchor, half, ty)
}

/// Exact 2D point-in-triangle test (inclusive of the boundary), used both
/// for `locate`'s descent and for direct containment checks.
pub fn point_in_triangle(verts: [IVec2; 3], p: IVec2) -> bool {
    fn cross(o: IVec2, a: IVec2, b: IVec2) -> i64 {
        (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
    }
    let d0 = cross(verts[0], verts[1], p);
    let d1 = cross(verts[1], verts[2], p);
    let d2 = cross(verts[2], verts[0], p);
    let has_neg = d0 < 0 || d1 < 0 || d2 < 0;
    let has_pos = d0 > 0 || d1 > 0 || d2 > 0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_partition_parent_triangle() {
        for ty in 0..2u8 {
            let parent = vertices(ty, [0, 0], 8);
            let children = bey_children_vertices(ty, [0, 0], 8);
            for x in 0..8 {
                for y in 0..8 {
                    let p = [x, y];
                    if !point_in_triangle(parent, p) {
                        continue;
                    }
                    let hits = children.iter().filter(|c| point_in_triangle(**c, p)).count();
                    assert!(hits >= 1, "point {p:?} not covered by any child of type {ty}");
                }
            }
        }
    }

    #[test]
    fn classify_round_trips_every_child() {
        for ty in 0..2u8 {
            let children = bey_children_vertices(ty, [0, 0], 8);
            for verts in children {
                let (anchor, half, _ty) = classify(verts);
                assert_eq!(half, 4);
                assert!(anchor[0] >= 0 && anchor[1] >= 0);
            }
        }
    }

    #[test]
    fn root_is_type_zero_and_center_child_flips_type() {
        let children = bey_children_vertices(0, [0, 0], 8);
        for corner in &children[0..3] {
            assert_eq!(classify(*corner).2, 0);
        }
        assert_eq!(classify(children[3]).2, 1);
    }
}
