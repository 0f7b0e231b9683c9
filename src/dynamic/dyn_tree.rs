use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::sync::{Mutex, PoisonError};

use crate::math::{Point, Real};
use crate::partitioning::{
    BihBuildParams, PointVisitor, RayVisitor, RegularGrid2D, SpatialObject,
};
use crate::query::Ray;
use crate::utils::TimeTracker;

/// Default time between two periodic rebalances.
pub const CHECK_TREE_PERIOD: Duration = Duration::from_millis(200);

/// Parameters of a [`DynTree`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DynamicTreeConfig {
    /// Parameters of the trees of every grid cell.
    pub bih: BihBuildParams,
    /// Time between two periodic rebalances.
    pub rebalance_period: Duration,
}

impl Default for DynamicTreeConfig {
    fn default() -> Self {
        Self {
            bih: BihBuildParams::default(),
            rebalance_period: CHECK_TREE_PERIOD,
        }
    }
}

/// A [`RegularGrid2D`] rebalanced periodically.
///
/// Mutations are counted, and [`DynTree::update`] rebuilds the dirty cells once the rebalance
/// period elapsed if anything changed since the last rebalance. Queries still rebuild the
/// cells they visit if needed, so they never miss a completed mutation.
pub struct DynTree<T: SpatialObject> {
    grid: RegularGrid2D<T>,
    rebalance_period: Duration,
    rebalance_timer: Mutex<TimeTracker>,
    unbalanced_times: AtomicU32,
}

impl<T: SpatialObject> Default for DynTree<T> {
    fn default() -> Self {
        Self::new(DynamicTreeConfig::default())
    }
}

impl<T: SpatialObject> DynTree<T> {
    /// An empty tree.
    pub fn new(config: DynamicTreeConfig) -> Self {
        Self {
            grid: RegularGrid2D::new(config.bih),
            rebalance_period: config.rebalance_period,
            rebalance_timer: Mutex::new(TimeTracker::new(config.rebalance_period)),
            unbalanced_times: AtomicU32::new(0),
        }
    }

    /// The underlying grid.
    pub fn grid(&self) -> &RegularGrid2D<T> {
        &self.grid
    }

    /// Inserts `obj` into the grid. Returns `false` if it lies outside of the grid.
    pub fn insert(&self, obj: T) -> bool {
        let inserted = self.grid.insert(obj);
        if inserted {
            self.count_change();
        }
        inserted
    }

    /// Removes the object identified by `key`. Returns `false` if it isn’t in the grid.
    pub fn remove(&self, key: &T::Key) -> bool {
        let removed = self.grid.remove(key);
        if removed {
            self.count_change();
        }
        removed
    }

    // Counted once the grid changed: a rebalance may only overestimate what it sweeps.
    fn count_change(&self) {
        let _ = self.unbalanced_times.fetch_add(1, Ordering::AcqRel);
    }

    /// Resets the change counter, returning the changes it held.
    fn take_changes(&self) -> u32 {
        self.unbalanced_times.swap(0, Ordering::AcqRel)
    }

    /// Does the grid contain the object identified by `key`?
    pub fn contains(&self, key: &T::Key) -> bool {
        self.grid.contains(key)
    }

    /// The number of objects in the grid.
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Is the grid empty?
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// The number of mutations since the last rebalance.
    pub fn unbalanced_times(&self) -> u32 {
        self.unbalanced_times.load(Ordering::Acquire)
    }

    /// Rebuilds every dirty cell.
    ///
    /// Changes made while the cells are swept are counted toward the next rebalance.
    pub fn balance(&self) {
        let _ = self.take_changes();
        self.grid.balance();
    }

    /// Advances the rebalance timer by `diff`, rebalancing if it expired.
    pub fn update(&self, diff: Duration) {
        if self.is_empty() {
            return;
        }

        let mut timer = self
            .rebalance_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        timer.update(diff);

        if timer.passed() {
            timer.reset(self.rebalance_period);
            let changes = self.take_changes();

            if changes > 0 {
                log::trace!("Periodic rebalance after {} changes.", changes);
                self.grid.balance();
            }
        }
    }

    /// See [`RegularGrid2D::intersect_ray`].
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        visitor: &mut impl RayVisitor<T>,
        max_dist: &mut Real,
        end: &Point<Real>,
        stop_at_first: bool,
    ) -> bool {
        self.grid
            .intersect_ray(ray, visitor, max_dist, end, stop_at_first)
    }

    /// See [`RegularGrid2D::intersect_z_aligned_ray`].
    pub fn intersect_z_aligned_ray(
        &self,
        ray: &Ray,
        visitor: &mut impl RayVisitor<T>,
        max_dist: &mut Real,
    ) -> bool {
        self.grid.intersect_z_aligned_ray(ray, visitor, max_dist)
    }

    /// See [`RegularGrid2D::intersect_point`].
    pub fn intersect_point(&self, point: &Point<Real>, visitor: &mut impl PointVisitor<T>) {
        self.grid.intersect_point(point, visitor)
    }
}
