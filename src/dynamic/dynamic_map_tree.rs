use alloc::sync::Arc;
use core::time::Duration;

use super::{
    AreaAndLiquidData, AreaDetails, AreaInfo, DynTree, DynamicTreeAreaInfoCallback,
    DynamicTreeConfig, DynamicTreeIntersectionCallback, DynamicTreeLocationInfoCallback,
    GameObjectModel, LiquidInfo, ModelIgnoreFlags,
};
use crate::math::{Point, Real, Vector, FUZZY_EPSILON};
use crate::query::Ray;

/// Height offset applied to the probe of area and liquid queries.
const PROBE_Z_OFFSET: Real = 0.5;

/// The dynamic collision geometry of one map.
///
/// Models (typically game objects like doors or elevators) are shared through an [`Arc`]
/// and identified by [`GameObjectModel::id`]. Every method takes `&self`: the tree can be
/// queried and mutated from several threads at once.
///
/// ```rust
/// # use std::sync::Arc;
/// # use dyntree3d::bounding_volume::Aabb;
/// # use dyntree3d::dynamic::*;
/// # use dyntree3d::math::{Point, Real, Vector};
/// # use dyntree3d::query::{Ray, RayCast};
/// struct Crate(u64, Aabb);
///
/// impl GameObjectModel for Crate {
///     fn id(&self) -> ModelId { ModelId(self.0) }
///     fn bounds(&self) -> Aabb { self.1 }
///     fn intersect_ray(
///         &self,
///         ray: &Ray,
///         max_dist: &mut Real,
///         _: bool,
///         _: ModelIgnoreFlags,
///     ) -> bool {
///         match self.1.cast_local_ray(ray, *max_dist, true) {
///             Some(toi) => { *max_dist = toi; true }
///             None => false,
///         }
///     }
///     fn intersect_point(&self, _: &Point<Real>) -> Option<AreaInfo> { None }
///     fn location_info(&self, _: &Point<Real>) -> Option<LocationInfo> { None }
///     fn liquid_level(&self, _: &Point<Real>, _: &LocationInfo) -> Option<Real> { None }
///     fn liquid_type(&self) -> u32 { 0 }
///     fn wmo_id(&self) -> u32 { 0 }
///     fn mogp_flags(&self) -> u32 { 0 }
///     fn is_map_object(&self) -> bool { false }
/// }
///
/// let tree = DynamicMapTree::new();
/// let aabb = Aabb::from_half_extents(Point::new(0.0, 0.0, 1.0), Vector::repeat(1.0));
/// assert!(tree.insert(Arc::new(Crate(1, aabb))));
///
/// let (start, end) = (Point::new(-5.0, 0.0, 1.0), Point::new(5.0, 0.0, 1.0));
/// assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
/// assert_eq!(tree.get_height(0.0, 0.0, 10.0, 20.0), 2.0);
/// ```
pub struct DynamicMapTree<M: GameObjectModel + ?Sized> {
    tree: DynTree<Arc<M>>,
}

impl<M: GameObjectModel + ?Sized> Default for DynamicMapTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: GameObjectModel + ?Sized> DynamicMapTree<M> {
    /// An empty tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DynamicTreeConfig::default())
    }

    /// An empty tree.
    pub fn with_config(config: DynamicTreeConfig) -> Self {
        Self {
            tree: DynTree::new(config),
        }
    }

    /// Inserts `model`, replacing any model with the same identity.
    ///
    /// Returns `false` if the model lies outside of the map.
    pub fn insert(&self, model: Arc<M>) -> bool {
        self.tree.insert(model)
    }

    /// Removes `model`. Returns `false` if it wasn’t inserted.
    pub fn remove(&self, model: &M) -> bool {
        self.tree.remove(&model.id())
    }

    /// Is `model` in this tree?
    pub fn contains(&self, model: &M) -> bool {
        self.tree.contains(&model.id())
    }

    /// The number of models in this tree.
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Is this tree empty?
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Rebuilds the parts of the tree changed since the last rebalance.
    pub fn balance(&self) {
        self.tree.balance()
    }

    /// Advances the periodic rebalance by `diff_ms` milliseconds.
    pub fn update(&self, diff_ms: u32) {
        self.tree.update(Duration::from_millis(diff_ms as u64))
    }

    /// Casts `ray` toward `end`, returning the distance to the closest hit within `max_dist`.
    pub fn get_intersection_time(
        &self,
        ray: &Ray,
        end: &Point<Real>,
        max_dist: Real,
    ) -> Option<Real> {
        let mut distance = max_dist;
        let mut callback = DynamicTreeIntersectionCallback::new(ModelIgnoreFlags::NOTHING);
        let _ = self
            .tree
            .intersect_ray(ray, &mut callback, &mut distance, end, false);
        callback.did_hit().then_some(distance)
    }

    /// Casts a segment from `start` to `end`.
    ///
    /// On hit, returns the hit point moved along the segment by `modify_dist` (backward if
    /// negative, without going past `start`) and `true`. Otherwise returns `end` and `false`.
    pub fn get_object_hit_pos(
        &self,
        start: &Point<Real>,
        end: &Point<Real>,
        modify_dist: Real,
    ) -> (Point<Real>, bool) {
        let max_dist = (end - start).norm();

        // Also rejects NaN.
        if !(max_dist >= 1.0e-10) {
            return (*end, false);
        }

        let dir = (end - start) / max_dist;
        let ray = Ray::new(*start, dir);

        let Some(dist) = self.get_intersection_time(&ray, end, max_dist) else {
            return (*end, false);
        };

        let hit = start + dir * dist;
        let result = if modify_dist < 0.0 && dist <= -modify_dist {
            *start
        } else {
            hit + dir * modify_dist
        };

        (result, true)
    }

    /// Is the segment from `start` to `end` free of models not selected by `ignore_flags`?
    ///
    /// Coincident points are always in line of sight.
    pub fn is_in_line_of_sight(
        &self,
        start: &Point<Real>,
        end: &Point<Real>,
        ignore_flags: ModelIgnoreFlags,
    ) -> bool {
        let mut max_dist = (end - start).norm();

        if !(max_dist > FUZZY_EPSILON) {
            return true;
        }

        let ray = Ray::new(*start, (end - start) / max_dist);
        let mut callback = DynamicTreeIntersectionCallback::new(ignore_flags);
        let _ = self
            .tree
            .intersect_ray(&ray, &mut callback, &mut max_dist, end, true);
        !callback.did_hit()
    }

    /// The height of the highest surface below `(x, y, z)` within `max_search_dist`, or
    /// negative infinity if there is none.
    pub fn get_height(&self, x: Real, y: Real, z: Real, max_search_dist: Real) -> Real {
        let ray = Ray::new(Point::new(x, y, z), -Vector::z());
        let mut max_dist = max_search_dist;
        let mut callback = DynamicTreeIntersectionCallback::new(ModelIgnoreFlags::NOTHING);
        let _ = self
            .tree
            .intersect_z_aligned_ray(&ray, &mut callback, &mut max_dist);

        if callback.did_hit() {
            z - max_dist
        } else {
            -Real::INFINITY
        }
    }

    /// The area information of the highest ground below `(x, y, z)`.
    ///
    /// The probe is lifted by half a unit so that a point lying on the ground finds it.
    pub fn get_area_info(&self, x: Real, y: Real, z: Real) -> Option<AreaInfo> {
        let probe = Point::new(x, y, z + PROBE_Z_OFFSET);
        let mut callback = DynamicTreeAreaInfoCallback::new();
        self.tree.intersect_point(&probe, &mut callback);
        callback.area_info().copied()
    }

    /// The area and liquid of the highest ground below `(x, y, z)`.
    ///
    /// The liquid is only looked up if `req_liquid_type` is zero or if the flags returned by
    /// `liquid_flags` for the liquid type of the hit model intersect it.
    pub fn get_area_and_liquid_data(
        &self,
        x: Real,
        y: Real,
        z: Real,
        req_liquid_type: u8,
        liquid_flags: impl Fn(u32) -> u32,
    ) -> AreaAndLiquidData {
        let probe = Point::new(x, y, z + PROBE_Z_OFFSET);
        let mut callback = DynamicTreeLocationInfoCallback::<M>::new();
        self.tree.intersect_point(&probe, &mut callback);

        let mut data = AreaAndLiquidData::default();

        if let Some((model, location)) = callback.into_hit() {
            data.floor_z = location.ground_z;

            let liquid_type = model.liquid_type();
            if req_liquid_type == 0 || liquid_flags(liquid_type) & req_liquid_type as u32 != 0 {
                data.liquid_info = model
                    .liquid_level(&probe, &location)
                    .map(|level| LiquidInfo { liquid_type, level });
            }

            data.area_info = Some(AreaDetails {
                adt_id: 0,
                root_id: location.root_id,
                group_id: model.wmo_id(),
                mogp_flags: model.mogp_flags(),
            });
        }

        data
    }
}
