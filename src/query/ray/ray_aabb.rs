use core::mem;

use crate::bounding_volume::Aabb;
use crate::math::{Real, DIM};
use crate::query::{Ray, RayCast};

impl RayCast for Aabb {
    fn cast_local_ray(&self, ray: &Ray, max_toi: Real, solid: bool) -> Option<Real> {
        let mut tmin: Real = 0.0;
        let mut tmax: Real = max_toi;

        for i in 0usize..DIM {
            if ray.dir[i] == 0.0 {
                if ray.origin[i] < self.mins[i] || ray.origin[i] > self.maxs[i] {
                    return None;
                }
            } else {
                let denom = 1.0 / ray.dir[i];
                let mut inter_with_near_halfspace = (self.mins[i] - ray.origin[i]) * denom;
                let mut inter_with_far_halfspace = (self.maxs[i] - ray.origin[i]) * denom;

                if inter_with_near_halfspace > inter_with_far_halfspace {
                    mem::swap(
                        &mut inter_with_near_halfspace,
                        &mut inter_with_far_halfspace,
                    )
                }

                tmin = tmin.max(inter_with_near_halfspace);
                tmax = tmax.min(inter_with_far_halfspace);

                if tmin > tmax {
                    // This covers the case where tmax is negative because tmin is
                    // initialized at zero.
                    return None;
                }
            }
        }

        if tmin == 0.0 && !solid {
            Some(tmax)
        } else {
            Some(tmin)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Vector};
    use crate::query::{Ray, RayCast};

    #[test]
    fn slab_entry_distance() {
        let aabb = Aabb::new(Point::new(2.0, -1.0, -1.0), Point::new(4.0, 1.0, 1.0));
        let ray = Ray::new(Point::origin(), Vector::x());
        assert_eq!(aabb.cast_local_ray(&ray, 100.0, true), Some(2.0));
        assert_eq!(aabb.cast_local_ray(&ray, 1.5, true), None);

        let inside = Ray::new(Point::new(3.0, 0.0, 0.0), Vector::x());
        assert_eq!(aabb.cast_local_ray(&inside, 100.0, true), Some(0.0));
        assert_eq!(aabb.cast_local_ray(&inside, 100.0, false), Some(1.0));
    }

    #[test]
    fn parallel_ray_outside_the_slab_misses() {
        let aabb = Aabb::new(Point::new(2.0, -1.0, -1.0), Point::new(4.0, 1.0, 1.0));
        let ray = Ray::new(Point::new(0.0, 2.0, 0.0), Vector::x());
        assert!(!aabb.intersects_local_ray(&ray, 100.0));
    }
}
