use crate::math::{Point, Real};
use crate::query::Ray;

/// Callback invoked on every candidate reached by a ray traversal.
///
/// The traversal only narrows the query down using bounding volumes: the visitor performs
/// the exact intersection test against `item`. It may shrink `max_dist` to the distance of
/// the hit it found so that farther candidates get pruned.
///
/// Returns `true` if `item` was hit. When `stop_at_first` is set, the traversal ends on the
/// first visitor returning `true`.
pub trait RayVisitor<T: ?Sized> {
    /// Tests `item` against `ray`.
    fn visit_ray(&mut self, ray: &Ray, item: &T, max_dist: &mut Real, stop_at_first: bool)
        -> bool;
}

impl<T: ?Sized, F> RayVisitor<T> for F
where
    F: FnMut(&Ray, &T, &mut Real, bool) -> bool,
{
    #[inline]
    fn visit_ray(
        &mut self,
        ray: &Ray,
        item: &T,
        max_dist: &mut Real,
        stop_at_first: bool,
    ) -> bool {
        self(ray, item, max_dist, stop_at_first)
    }
}

/// Callback invoked on every candidate whose bounds may contain a query point.
///
/// Point queries test containment, not distance: visitors usually accumulate the best match
/// among all the candidates they are shown.
pub trait PointVisitor<T: ?Sized> {
    /// Tests `item` against `point`.
    fn visit_point(&mut self, point: &Point<Real>, item: &T);
}

impl<T: ?Sized, F> PointVisitor<T> for F
where
    F: FnMut(&Point<Real>, &T),
{
    #[inline]
    fn visit_point(&mut self, point: &Point<Real>, item: &T) {
        self(point, item)
    }
}
