//! Ray / axis-aligned box hit testing (slab method).
//!
//! For each axis the ray's entry and exit distances through the pair of
//! parallel planes bounding the box are intersected into a running
//! `[t_near, t_far]` interval. The ray hits the box iff the interval is
//! non-empty and does not lie entirely behind the origin.

use crate::geometry::{Aabb, Ray};

/// Direction components with a smaller magnitude are treated as parallel to the slab.
pub const PARALLEL_EPSILON: f32 = 1e-8;

/// Whether `ray` intersects `aabb`. A box containing the origin always counts.
pub fn intersects(ray: &Ray, aabb: &Aabb) -> bool {
    slab_interval(ray, aabb).is_some()
}

/// Distance along the ray to the first point inside `aabb`, or `None` on a miss.
///
/// Zero when the origin is already inside the box.
pub fn entry_distance(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    slab_interval(ray, aabb).map(|(t_near, _)| t_near.max(0.0))
}

fn slab_interval(ray: &Ray, aabb: &Aabb) -> Option<(f32, f32)> {
    debug_assert!(
        ray.direction.is_normalized(),
        "hit test requires a unit ray direction, got {:?}",
        ray.direction
    );

    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if dir.abs() < PARALLEL_EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir;
        let mut t0 = (lo - origin) * inv;
        let mut t1 = (hi - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    (t_far >= 0.0).then_some((t_near, t_far))
}
