use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// A half-line with a unit direction. Rebuilt every frame from the camera pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray. `direction` must already be unit length.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        debug_assert!(
            direction.is_normalized(),
            "ray direction must be a non-zero unit vector, got {direction:?}"
        );
        Self { origin, direction }
    }

    /// Point at parametric distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box in a single coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from two corners. The corners are reordered per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point. `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Re-fit an axis-aligned box around this box's corners after `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        // Eight corners are always present.
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(min, max), p| (min.min(*p), max.max(*p)));
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn center_and_half_extents() {
        let b = Aabb::from_center_half_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(0.5));
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.half_extents(), Vec3::splat(0.5));
        assert!(b.contains_point(Vec3::new(1.25, 2.0, 3.5)));
        assert!(!b.contains_point(Vec3::new(1.75, 2.0, 3.0)));
    }

    #[test]
    fn from_points_fits_all() {
        let b = Aabb::from_points([
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-2.0, 0.0, 4.0),
            Vec3::new(1.0, -3.0, 0.5),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-2.0, -3.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 4.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn transformed_by_translation_and_scale() {
        let unit = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, -2.0)) * Mat4::from_scale(Vec3::splat(0.5));
        let b = unit.transformed(&m);
        assert_eq!(b.min, Vec3::new(9.5, -0.5, -2.5));
        assert_eq!(b.max, Vec3::new(10.5, 0.5, -1.5));
    }

    #[test]
    fn transformed_by_rotation_grows_box() {
        let unit = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        let m = Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let b = unit.transformed(&m);
        let expected = std::f32::consts::SQRT_2;
        assert!((b.max.x - expected).abs() < 1e-5);
        assert!((b.max.z - expected).abs() < 1e-5);
        assert!((b.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_at() {
        let r = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(r.at(5.0), Vec3::ZERO);
    }
}
