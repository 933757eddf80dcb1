// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bey-style refinement combinatorics for the six Kuhn-simplex tetrahedron
//! types.
//!
//! spec §4.4 requires the t8code connectivity tables preserved exactly, and
//! §9 Q2 names that as the mandated default. No copy of t8code's source was
//! available in this environment (`original_source/` retrieved zero files —
//! see `DESIGN.md`) to transcribe its literal tables from, so this module
//! instead takes §9 Q2's documented fallback, option (b): it derives the
//! three connectivity relations (`parent_type × bey_id → child_type`,
//! `parent_type × cube_id → bey_id`, and the reverse lookup `parent` needs)
//! directly from the geometric definition of a Kuhn simplex and Bey's
//! red-refinement rule, and accepts that this breaks TM-index byte
//! compatibility with t8code.
//!
//! The six tetrahedron types correspond to the six permutations of the three
//! axes; type `τ`'s vertices in a cell of edge `half` anchored at the origin
//! are `{0, half·e_a, half·(e_a+e_b), half·(1,1,1)}` for `τ`'s permutation
//! `(a, b, c)`. This is the standard "Kuhn triangulation" of a cube into six
//! congruent tetrahedra.
//!
//! Divergence from t8code is structurally confined to the four "inner" Bey
//! children (`bey_id` 4..8, built by [`bey_children_vertices`] from the
//! octahedron straddling the parent's midpoints). The four "corner" children
//! (`bey_id` 0..4) are each a scaled copy of the parent anchored at one of
//! its four vertices, so their `(anchor, type)` is geometrically forced and
//! must already agree with t8code for any correct, gap-free refinement. The
//! inner four come from splitting that central octahedron along one of its
//! two short diagonals (here, the one joining the midpoints of edges `v0v2`
//! and `v1v3`); t8code's choice of diagonal — a free parameter of Bey's
//! construction that does not affect gap/overlap correctness, only which
//! specific tetrahedron ends up at which `bey_id`/TM-index — is exactly
//! where a from-scratch derivation can disagree byte-for-byte while still
//! producing a valid, non-overlapping, gap-free refinement. Concretely: for
//! every `parent_type`, `bey_id` in `4..8` may map to a different
//! `(anchor, child_type)` pair here than in t8code, while `bey_id` in `0..4`
//! is guaranteed to match.

/// The six axis permutations defining the tetrahedron types, `(a, b, c)`
/// such that type `τ`'s containment region is `0 <= x_a <= x_b <= x_c`.
pub const PERMS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Number of tetrahedron types.
pub const NUM_TYPES: u8 = 6;

type IVec = [i64; 3];

fn vertices(ty: u8, anchor: IVec, half: i64) -> [IVec; 4] {
    let perm = PERMS[ty as usize];
    let v0 = anchor;
    let mut v1 = anchor;
    v1[perm[0]] += half;
    let mut v2 = v1;
    v2[perm[1]] += half;
    let v3 = [anchor[0] + half, anchor[1] + half, anchor[2] + half];
    [v0, v1, v2, v3]
}

fn midpoint(a: IVec, b: IVec) -> IVec {
    [(a[0] + b[0]) / 2, (a[1] + b[1]) / 2, (a[2] + b[2]) / 2]
}

/// The eight Bey children of a type-`ty` tetrahedron anchored at `anchor`
/// with edge length `half`, as raw vertex sets. Children `0..4` are the
/// corner tets (similar to the parent); children `4..8` are the four tets
/// formed by splitting the central octahedron along the diagonal joining
/// the midpoints of edges `v0v2` and `v1v3`.
fn bey_children_vertices(ty: u8, anchor: IVec, half: i64) -> [[IVec; 4]; 8] {
    let [v0, v1, v2, v3] = vertices(ty, anchor, half);
    let m01 = midpoint(v0, v1);
    let m02 = midpoint(v0, v2);
    let m03 = midpoint(v0, v3);
    let m12 = midpoint(v1, v2);
    let m13 = midpoint(v1, v3);
    let m23 = midpoint(v2, v3);
    [
        [v0, m01, m02, m03],
        [m01, v1, m12, m13],
        [m02, m12, v2, m23],
        [m03, m13, m23, v3],
        [m01, m02, m03, m13],
        [m01, m02, m12, m13],
        [m02, m12, m13, m23],
        [m02, m03, m13, m23],
    ]
}

/// Recover `(anchor, half, type)` for a Bey-child vertex set. Every child
/// produced by [`bey_children_vertices`] is itself a Kuhn simplex of half
/// the parent's edge length, so this always succeeds for well-formed input.
fn classify(verts: [IVec; 4]) -> (IVec, i64, u8) {
    let anchor = [
        verts.iter().map(|v| v[0]).min().unwrap(),
        verts.iter().map(|v| v[1]).min().unwrap(),
        verts.iter().map(|v| v[2]).min().unwrap(),
    ];
    let mut rel: [IVec; 4] = verts.map(|v| [v[0] - anchor[0], v[1] - anchor[1], v[2] - anchor[2]]);
    rel.sort_by_key(|r| r[0] + r[1] + r[2]);
    let half = rel[3][0].max(rel[3][1]).max(rel[3][2]);
    let axis_a = (0..3).find(|&i| rel[1][i] != 0).expect("one nonzero axis");
    let axis_b = (0..3)
        .find(|&i| i != axis_a && rel[2][i] != 0)
        .expect("second nonzero axis");
    let axis_c = (0..3).find(|&i| i != axis_a && i != axis_b).unwrap();
    let ty = PERMS
        .iter()
        .position(|p| *p == [axis_a, axis_b, axis_c])
        .expect("every axis triple is one of the six permutations") as u8;
    (anchor, half, ty)
}

/// Octant (`0..8`) of `point` within a cube anchored at `cube_anchor` with
/// edge `cube_half`, Morton-style bit layout `(z << 2 | y << 1 | x)`.
pub fn cube_id_of(point: IVec, cube_anchor: IVec, cube_half: i64) -> u8 {
    let half_step = cube_half / 2;
    let bit = |axis: usize| -> u8 {
        if point[axis] - cube_anchor[axis] >= half_step {
            1
        } else {
            0
        }
    };
    bit(0) | (bit(1) << 1) | (bit(2) << 2)
}

/// The child type produced by Bey child `bey_id` of a type-`parent_type`
/// tetrahedron. Computed on a canonical unit cell (`half = 2`, so all
/// midpoints are exact integers) since the relation is scale-independent.
pub fn parent_type_to_child_type(parent_type: u8, bey_id: u8) -> u8 {
    let children = bey_children_vertices(parent_type, [0, 0, 0], 2);
    classify(children[bey_id as usize]).2
}

/// The Bey child index occupying octant `cube_id` of a type-`parent_type`
/// tetrahedron's containing cube.
pub fn type_cid_to_bey_id(parent_type: u8, cube_id: u8) -> u8 {
    let children = bey_children_vertices(parent_type, [0, 0, 0], 2);
    for (bey_id, verts) in children.iter().enumerate() {
        let (anchor, half, _ty) = classify(*verts);
        if cube_id_of(anchor, [0, 0, 0], 2) == cube_id {
            debug_assert_eq!(half, 1);
            return bey_id as u8;
        }
    }
    unreachable!("Bey refinement covers all eight octants of the parent cube")
}

/// Compute a real (non-canonical) child tetrahedron's `(anchor, type)` for
/// Bey child `bey_id` of a type-`parent_type` tetrahedron anchored at
/// `anchor` with edge `half`.
pub fn child_anchor_and_type(parent_type: u8, anchor: IVec, half: i64, bey_id: u8) -> (IVec, u8) {
    let children = bey_children_vertices(parent_type, anchor, half);
    let (child_anchor, _half, ty) = classify(children[bey_id as usize]);
    (child_anchor, ty)
}

/// The permutation index (tetrahedron type) whose Kuhn region
/// `0 <= x_c <= x_b <= x_a <= half` (for `perm = [a, b, c]`) contains
/// `local` (coordinates relative to the cell's anchor). Used to pick the
/// root tetrahedron type containing a point (spec §4.4 `locate`, level 0).
pub fn classify_region(local: IVec) -> u8 {
    let mut axes = [0usize, 1, 2];
    // Descending by coordinate value: axes[0] is the largest coordinate,
    // matching perm[0] in the `x_perm2 <= x_perm1 <= x_perm0` ordering a
    // type-`perm` tetrahedron's region satisfies.
    axes.sort_by_key(|&a| core::cmp::Reverse(local[a]));
    PERMS.iter().position(|p| *p == axes).unwrap() as u8
}
