//! Traits and structure needed to cast rays.

use crate::math::{Point, Real, Vector, DEFAULT_EPSILON};

/// A ray for ray-casting queries.
///
/// A ray is a half-infinite line starting at `origin` and extending in the direction
/// `dir`. The world queries always use a normalized `dir` so that times of impact are
/// distances in world units.
///
/// # Example
///
/// ```rust
/// use dyntree3d::query::Ray;
/// use nalgebra::{Point3, Vector3};
///
/// let ray = Ray::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0));
/// assert_eq!(ray.point_at(5.0), Point3::new(5.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Ray {
    /// Starting point of the ray.
    pub origin: Point<Real>,
    /// Direction vector of the ray.
    pub dir: Vector<Real>,
}

impl Ray {
    /// Creates a new ray from an origin point and direction vector.
    pub fn new(origin: Point<Real>, dir: Vector<Real>) -> Ray {
        Ray { origin, dir }
    }

    /// Computes a point along the ray at parameter `t`.
    ///
    /// Returns `origin + dir * t`.
    #[inline]
    pub fn point_at(&self, t: Real) -> Point<Real> {
        self.origin + self.dir * t
    }

    /// The component-wise inverse of the direction.
    ///
    /// Components with a magnitude smaller than `DEFAULT_EPSILON` are mapped to
    /// `±1 / DEFAULT_EPSILON` (keeping their sign) so the result never contains
    /// infinities or NaNs.
    #[inline]
    pub fn inv_dir(&self) -> Vector<Real> {
        self.dir.map(|r| {
            if r.abs() < DEFAULT_EPSILON {
                r.signum() / DEFAULT_EPSILON
            } else {
                1.0 / r
            }
        })
    }
}

/// Traits of objects which can be tested for intersection with a ray.
pub trait RayCast {
    /// Computes the time of impact between this object and a ray expressed in its local frame.
    ///
    /// If `solid` is `true`, a ray starting inside of the object hits it at `t = 0`.
    /// Otherwise it hits the object boundary on its way out.
    fn cast_local_ray(&self, ray: &Ray, max_time_of_impact: Real, solid: bool) -> Option<Real>;

    /// Tests whether a ray intersects this object.
    #[inline]
    fn intersects_local_ray(&self, ray: &Ray, max_time_of_impact: Real) -> bool {
        self.cast_local_ray(ray, max_time_of_impact, true).is_some()
    }
}
