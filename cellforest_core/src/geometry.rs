// Copyright 2025 the cellforest Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive 3D geometry: points, AABBs, rays, planes, frustums, and the
//! polymorphic [`Spatial`] query-volume sum type from spec §6.

use glam::DVec3;

/// A position in world space.
pub type Point3 = DVec3;
/// A direction or displacement in world space.
pub type Vector3 = DVec3;

/// Axis-aligned bounding box in 3D, `[min, max)` per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Construct from explicit corners. Does not validate `min <= max`;
    /// use [`Aabb3::is_empty`] to check after construction if the corners
    /// came from arithmetic that could invert them.
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Construct from a center and half-extents along each axis.
    pub fn from_center_half_extents(center: Point3, half: Vector3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// A single-point AABB.
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Whether the box has no volume (inverted or degenerate on some axis).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Whether `p` lies within this box (inclusive-min, inclusive-max: used
    /// for geometric containment checks, not cell partitioning).
    pub fn contains_point(&self, p: Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Whether `other` is entirely contained within this box.
    pub fn contains_aabb(&self, other: &Self) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Whether this box and `other` share any volume or boundary.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The overlapping region of two boxes; check [`Aabb3::is_empty`] on the
    /// result before treating it as a real box.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// The closest point on or in this box to `p`, used for AABB-to-sphere
    /// distance tests.
    pub fn closest_point(&self, p: Point3) -> Point3 {
        p.clamp(self.min, self.max)
    }

    /// Squared distance from `p` to the closest point on or in this box.
    pub fn distance_squared(&self, p: Point3) -> f64 {
        self.closest_point(p).distance_squared(p)
    }

    /// The eight corners of the box, in octant-bit order
    /// `(z_hi << 2 | y_hi << 1 | x_hi)`.
    pub fn corners(&self) -> [Point3; 8] {
        let mut out = [Point3::ZERO; 8];
        for (i, slot) in out.iter_mut().enumerate() {
            let x = if i & 1 != 0 { self.max.x } else { self.min.x };
            let y = if i & 2 != 0 { self.max.y } else { self.min.y };
            let z = if i & 4 != 0 { self.max.z } else { self.min.z };
            *slot = Point3::new(x, y, z);
        }
        out
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// A ray in world space. `direction` must be non-zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray3D {
    /// Ray origin.
    pub origin: Point3,
    /// Ray direction. Not required to be normalized.
    pub direction: Vector3,
}

impl Ray3D {
    /// Construct a ray. Panics in debug builds if `direction` is the zero
    /// vector, matching spec §6's "`direction ≠ 0`" precondition.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        debug_assert!(direction != Vector3::ZERO, "ray direction must be non-zero");
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Slab-test intersection against an AABB. Returns `(t_near, t_far)` when
    /// the ray intersects, with `t_near` clamped to `0.0` when the origin is
    /// inside the box (spec B4).
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            let (origin, dir, min, max) = match axis {
                0 => (self.origin.x, self.direction.x, aabb.min.x, aabb.max.x),
                1 => (self.origin.y, self.direction.y, aabb.min.y, aabb.max.y),
                _ => (self.origin.z, self.direction.z, aabb.min.z, aabb.max.z),
            };
            if dir.abs() < f64::EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t0 = (min - origin) * inv;
            let mut t1 = (max - origin) * inv;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        Some((t_near.max(0.0), t_far))
    }
}

/// An infinite plane, `{p : dot(normal, p) + d == 0}`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane3D {
    /// Unit (or near-unit) surface normal.
    pub normal: Vector3,
    /// Signed distance-from-origin term.
    pub d: f64,
}

impl Plane3D {
    /// Construct a plane from a normal and offset term.
    pub const fn new(normal: Vector3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Construct from a point on the plane and its normal.
    pub fn from_point_normal(point: Point3, normal: Vector3) -> Self {
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed distance from `p` to the plane; positive on the side the
    /// normal points toward.
    pub fn distance_to_point(&self, p: Point3) -> f64 {
        self.normal.dot(p) + self.d
    }
}

/// Six-plane convex frustum used for view-culling queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum3D {
    /// Planes in `[left, right, bottom, top, near, far]` order, normals
    /// pointing into the frustum interior.
    pub planes: [Plane3D; 6],
}

impl Frustum3D {
    /// Construct directly from six planes.
    pub const fn new(planes: [Plane3D; 6]) -> Self {
        Self { planes }
    }

    /// Conservative AABB-vs-frustum test: `false` only if some plane has the
    /// entire box on its outside, so this never rejects a box that actually
    /// overlaps the frustum (may accept a few that don't, by design).
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        for plane in &self.planes {
            let positive = Point3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.distance_to_point(positive) < 0.0 {
                return false;
            }
        }
        true
    }

    /// A perspective frustum from the standard camera parameters.
    pub fn perspective(
        eye: Point3,
        forward: Vector3,
        up: Vector3,
        fov_y_radians: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let forward = forward.normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward).normalize();

        let half_height_far = (fov_y_radians * 0.5).tan() * far;
        let half_width_far = half_height_far * aspect;
        let far_center = eye + forward * far;

        let near_plane = Plane3D::from_point_normal(eye + forward * near, forward);
        let far_plane = Plane3D::from_point_normal(far_center, -forward);

        let top_center = far_center + up * half_height_far;
        let top_normal = (top_center - eye).cross(right).normalize();
        let top = Plane3D::from_point_normal(eye, top_normal);

        let bottom_center = far_center - up * half_height_far;
        let bottom_normal = right.cross(bottom_center - eye).normalize();
        let bottom = Plane3D::from_point_normal(eye, bottom_normal);

        let right_center = far_center + right * half_width_far;
        let right_normal = up.cross(right_center - eye).normalize();
        let right_plane = Plane3D::from_point_normal(eye, right_normal);

        let left_center = far_center - right * half_width_far;
        let left_normal = (left_center - eye).cross(up).normalize();
        let left_plane = Plane3D::from_point_normal(eye, left_normal);

        Self {
            planes: [left_plane, right_plane, bottom, top, near_plane, far_plane],
        }
    }

    /// An orthographic (box) frustum, equivalent to an AABB with outward
    /// normals flipped inward.
    pub fn orthographic(aabb: Aabb3) -> Self {
        Self {
            planes: [
                Plane3D::from_point_normal(aabb.min, Vector3::X),
                Plane3D::from_point_normal(aabb.max, -Vector3::X),
                Plane3D::from_point_normal(aabb.min, Vector3::Y),
                Plane3D::from_point_normal(aabb.max, -Vector3::Y),
                Plane3D::from_point_normal(aabb.min, Vector3::Z),
                Plane3D::from_point_normal(aabb.max, -Vector3::Z),
            ],
        }
    }
}

/// Polymorphic query-volume sum type (spec §6).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Spatial {
    /// Axis-aligned cube, expressed as an AABB with equal extents.
    Cube(Aabb3),
    /// Sphere.
    Sphere {
        /// Sphere center.
        center: Point3,
        /// Sphere radius.
        radius: f64,
    },
    /// General axis-aligned box.
    Aabb(Aabb3),
    /// Axis-aligned bounded tetrahedron hint (bounding box of a tetrahedral
    /// query volume; exact containment is delegated to the tetree variant).
    Aabt(Aabb3),
    /// Arbitrary parallelepiped, given by a corner and three edge vectors.
    Parallelepiped {
        /// One corner of the parallelepiped.
        origin: Point3,
        /// Edge vector from `origin`.
        edge_a: Vector3,
        /// Edge vector from `origin`.
        edge_b: Vector3,
        /// Edge vector from `origin`.
        edge_c: Vector3,
    },
    /// Tetrahedron given by its four vertices.
    Tetrahedron([Point3; 4]),
}

impl Spatial {
    /// A conservative AABB bounding this volume, used for the cheap
    /// node-vs-volume pre-filter every query engine applies before exact
    /// containment (spec §4.11).
    pub fn bounding_aabb(&self) -> Aabb3 {
        match self {
            Spatial::Cube(aabb) | Spatial::Aabb(aabb) | Spatial::Aabt(aabb) => *aabb,
            Spatial::Sphere { center, radius } => Aabb3::from_center_half_extents(
                *center,
                Vector3::splat(*radius),
            ),
            Spatial::Parallelepiped {
                origin,
                edge_a,
                edge_b,
                edge_c,
            } => {
                let corners = [
                    *origin,
                    *origin + *edge_a,
                    *origin + *edge_b,
                    *origin + *edge_c,
                    *origin + *edge_a + *edge_b,
                    *origin + *edge_a + *edge_c,
                    *origin + *edge_b + *edge_c,
                    *origin + *edge_a + *edge_b + *edge_c,
                ];
                aabb_of_points(&corners)
            }
            Spatial::Tetrahedron(verts) => aabb_of_points(verts),
        }
    }

    /// Whether `p` lies within this volume.
    pub fn contains_point(&self, p: Point3) -> bool {
        match self {
            Spatial::Cube(aabb) | Spatial::Aabb(aabb) | Spatial::Aabt(aabb) => {
                aabb.contains_point(p)
            }
            Spatial::Sphere { center, radius } => center.distance_squared(p) <= radius * radius,
            Spatial::Parallelepiped {
                origin,
                edge_a,
                edge_b,
                edge_c,
            } => point_in_parallelepiped(*origin, *edge_a, *edge_b, *edge_c, p),
            Spatial::Tetrahedron(verts) => point_in_tetrahedron(verts, p),
        }
    }

    /// Whether `aabb` lies entirely within this volume, tested by checking
    /// every corner. Exact for convex volumes (every `Spatial` variant),
    /// used by range queries to skip the per-entity filter once a whole
    /// node is known to be inside the query volume.
    pub fn contains_aabb(&self, aabb: &Aabb3) -> bool {
        aabb.corners().iter().all(|&c| self.contains_point(c))
    }

    /// Whether this volume intersects `aabb`. Exact for cube/AABB/AABT,
    /// closest-point-based for the sphere, and AABB-overlap-based
    /// (conservative) for parallelepiped/tetrahedron.
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        match self {
            Spatial::Cube(b) | Spatial::Aabb(b) | Spatial::Aabt(b) => b.intersects(aabb),
            Spatial::Sphere { center, radius } => {
                aabb.distance_squared(*center) <= radius * radius
            }
            Spatial::Parallelepiped { .. } | Spatial::Tetrahedron(_) => {
                self.bounding_aabb().intersects(aabb)
            }
        }
    }
}

fn aabb_of_points(points: &[Point3]) -> Aabb3 {
    let mut min = points[0];
    let mut max = points[0];
    for p in &points[1..] {
        min = min.min(*p);
        max = max.max(*p);
    }
    Aabb3::new(min, max)
}

fn point_in_tetrahedron(verts: &[Point3; 4], p: Point3) -> bool {
    fn signed_volume(a: Point3, b: Point3, c: Point3, d: Point3) -> f64 {
        (b - a).cross(c - a).dot(d - a)
    }
    let [a, b, c, d] = *verts;
    let ref_vol = signed_volume(a, b, c, d);
    if ref_vol.abs() < f64::EPSILON {
        return false;
    }
    let v0 = signed_volume(p, b, c, d);
    let v1 = signed_volume(a, p, c, d);
    let v2 = signed_volume(a, b, p, d);
    let v3 = signed_volume(a, b, c, p);
    let same_sign = |v: f64| v * ref_vol >= -f64::EPSILON;
    same_sign(v0) && same_sign(v1) && same_sign(v2) && same_sign(v3)
}

fn point_in_parallelepiped(
    origin: Point3,
    edge_a: Vector3,
    edge_b: Vector3,
    edge_c: Vector3,
    p: Point3,
) -> bool {
    // Solve p - origin = s*a + t*b + u*c via Cramer's rule and check s,t,u in [0,1].
    let rel = p - origin;
    let det = edge_a.dot(edge_b.cross(edge_c));
    if det.abs() < f64::EPSILON {
        return false;
    }
    let s = rel.dot(edge_b.cross(edge_c)) / det;
    let t = edge_a.dot(rel.cross(edge_c)) / det;
    let u = edge_a.dot(edge_b.cross(rel)) / det;
    (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_intersects_aabb_from_inside_has_zero_t_near() {
        let aabb = Aabb3::new(Point3::ZERO, Point3::splat(10.0));
        let ray = Ray3D::new(Point3::splat(5.0), Vector3::X);
        let (t_near, _) = ray.intersect_aabb(&aabb).unwrap();
        assert_eq!(t_near, 0.0);
    }

    #[test]
    fn sphere_contains_center() {
        let sphere = Spatial::Sphere {
            center: Point3::new(1.0, 1.0, 1.0),
            radius: 2.0,
        };
        assert!(sphere.contains_point(Point3::new(1.0, 1.0, 1.0)));
        assert!(!sphere.contains_point(Point3::new(10.0, 10.0, 10.0)));
    }

    #[test]
    fn tetrahedron_contains_centroid() {
        let verts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let centroid = (verts[0] + verts[1] + verts[2] + verts[3]) / 4.0;
        assert!(point_in_tetrahedron(&verts, centroid));
        assert!(!point_in_tetrahedron(&verts, Point3::new(100.0, 100.0, 100.0)));
    }
}
