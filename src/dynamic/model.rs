use alloc::sync::Arc;

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::partitioning::SpatialObject;
use crate::query::Ray;

/// Height reported by area and liquid queries that found no ground.
pub const INVALID_HEIGHT: Real = -200_000.0;

/// The identity of a model inserted into a [`DynamicMapTree`](super::DynamicMapTree).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ModelId(pub u64);

bitflags::bitflags! {
    /// Kinds of models a ray cast should go through.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
    pub struct ModelIgnoreFlags: u32 {
        /// Every model blocks the ray.
        const NOTHING = 0;
        /// Doodads (M2 models, see [`GameObjectModel::is_map_object`]) don’t block the ray.
        const M2 = 1 << 0;
    }
}

/// The ground found below a point by [`GameObjectModel::intersect_point`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct AreaInfo {
    /// World-space height of the ground.
    pub ground_z: Real,
    /// Flags of the hit model group.
    pub flags: u32,
    /// Identifier of the area the ground belongs to.
    pub adt_id: i32,
    /// Identifier of the root model.
    pub root_id: i32,
    /// Identifier of the hit model group.
    pub group_id: i32,
}

/// The ground found below a point by [`GameObjectModel::location_info`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LocationInfo {
    /// Identifier of the root model.
    pub root_id: i32,
    /// World-space height of the ground.
    pub ground_z: Real,
}

/// Area details of the model found by
/// [`DynamicMapTree::get_area_and_liquid_data`](super::DynamicMapTree::get_area_and_liquid_data).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct AreaDetails {
    /// Always `0` for dynamic models.
    pub adt_id: i32,
    /// Identifier of the root model.
    pub root_id: i32,
    /// The WMO identifier of the hit model.
    pub group_id: u32,
    /// The MOGP flags of the hit model.
    pub mogp_flags: u32,
}

/// Liquid found above the ground of a model.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LiquidInfo {
    /// The liquid type of the hit model.
    pub liquid_type: u32,
    /// World-space height of the liquid surface.
    pub level: Real,
}

/// Result of [`DynamicMapTree::get_area_and_liquid_data`](super::DynamicMapTree::get_area_and_liquid_data).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct AreaAndLiquidData {
    /// Height of the ground, or [`INVALID_HEIGHT`] if no model was found.
    pub floor_z: Real,
    /// Area details of the hit model.
    pub area_info: Option<AreaDetails>,
    /// Liquid of the hit model, if any was requested and found.
    pub liquid_info: Option<LiquidInfo>,
}

impl Default for AreaAndLiquidData {
    fn default() -> Self {
        Self {
            floor_z: INVALID_HEIGHT,
            area_info: None,
            liquid_info: None,
        }
    }
}

/// A piece of world geometry that can be inserted into a
/// [`DynamicMapTree`](super::DynamicMapTree).
///
/// The tree only uses [`GameObjectModel::bounds`] to route queries: the precise tests are up
/// to the model.
pub trait GameObjectModel: Send + Sync {
    /// The identity of this model. It must not change while the model is in a tree.
    fn id(&self) -> ModelId;

    /// World-space bounds of this model. They must not change while the model is in a tree.
    fn bounds(&self) -> Aabb;

    /// Casts a world-space ray on this model.
    ///
    /// On hit, `max_dist` is lowered to the hit distance and `true` is returned. If
    /// `stop_at_first` is set, any hit closer than `max_dist` may be reported instead of the
    /// closest one.
    fn intersect_ray(
        &self,
        ray: &Ray,
        max_dist: &mut Real,
        stop_at_first: bool,
        ignore_flags: ModelIgnoreFlags,
    ) -> bool;

    /// The area information of the ground below `point`, if this model has any.
    fn intersect_point(&self, point: &Point<Real>) -> Option<AreaInfo>;

    /// The location of the ground below `point`, if this model has any.
    fn location_info(&self, point: &Point<Real>) -> Option<LocationInfo>;

    /// The height of the liquid at `point`, given the location returned by
    /// [`GameObjectModel::location_info`].
    fn liquid_level(&self, point: &Point<Real>, info: &LocationInfo) -> Option<Real>;

    /// The liquid type of this model.
    fn liquid_type(&self) -> u32;

    /// The WMO identifier of this model.
    fn wmo_id(&self) -> u32;

    /// The MOGP flags of this model.
    fn mogp_flags(&self) -> u32;

    /// Is this model a map object (WMO), as opposed to a doodad?
    fn is_map_object(&self) -> bool;
}

impl<M: GameObjectModel + ?Sized> SpatialObject for Arc<M> {
    type Key = ModelId;

    #[inline]
    fn key(&self) -> ModelId {
        self.id()
    }

    #[inline]
    fn aabb(&self) -> Aabb {
        self.bounds()
    }
}
