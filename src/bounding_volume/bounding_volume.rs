use crate::math::{Point, Real};

/// Operations shared by the coarse volumes enclosing models and tree nodes.
pub trait BoundingVolume {
    /// A point inside of this volume, ideally its center.
    fn center(&self) -> Point<Real>;

    /// Do the two volumes overlap? Touching volumes overlap.
    fn intersects(&self, other: &Self) -> bool;

    /// Is `other` entirely inside of this volume?
    fn contains(&self, other: &Self) -> bool;

    /// Grows this volume in-place until it encloses `other`.
    fn merge(&mut self, other: &Self);

    /// The smallest volume enclosing both `self` and `other`.
    fn merged(&self, other: &Self) -> Self;

    /// Grows this volume by `amount` in every direction.
    fn loosen(&mut self, amount: Real);

    /// A copy of this volume grown by `amount` in every direction.
    fn loosened(&self, amount: Real) -> Self;
}
