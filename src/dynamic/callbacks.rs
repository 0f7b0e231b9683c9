use alloc::sync::Arc;

use super::{AreaInfo, GameObjectModel, LocationInfo, ModelIgnoreFlags};
use crate::math::{Point, Real};
use crate::partitioning::{PointVisitor, RayVisitor};
use crate::query::Ray;

/// Ray visitor forwarding the cast to each candidate model.
///
/// With [`ModelIgnoreFlags::M2`], models that aren’t map objects are skipped.
#[derive(Copy, Clone, Debug, Default)]
pub struct DynamicTreeIntersectionCallback {
    did_hit: bool,
    ignore_flags: ModelIgnoreFlags,
}

impl DynamicTreeIntersectionCallback {
    /// A callback skipping the models selected by `ignore_flags`.
    pub fn new(ignore_flags: ModelIgnoreFlags) -> Self {
        Self {
            did_hit: false,
            ignore_flags,
        }
    }

    /// Did any model report a hit?
    pub fn did_hit(&self) -> bool {
        self.did_hit
    }
}

impl<M: GameObjectModel + ?Sized> RayVisitor<Arc<M>> for DynamicTreeIntersectionCallback {
    fn visit_ray(
        &mut self,
        ray: &Ray,
        model: &Arc<M>,
        max_dist: &mut Real,
        stop_at_first: bool,
    ) -> bool {
        if self.ignore_flags.contains(ModelIgnoreFlags::M2) && !model.is_map_object() {
            return false;
        }

        let hit = model.intersect_ray(ray, max_dist, stop_at_first, self.ignore_flags);
        self.did_hit |= hit;
        hit
    }
}

/// Point visitor keeping the highest ground below the probe.
#[derive(Copy, Clone, Debug, Default)]
pub struct DynamicTreeAreaInfoCallback {
    area_info: Option<AreaInfo>,
}

impl DynamicTreeAreaInfoCallback {
    /// A callback that found nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The best area information found.
    pub fn area_info(&self) -> Option<&AreaInfo> {
        self.area_info.as_ref()
    }
}

impl<M: GameObjectModel + ?Sized> PointVisitor<Arc<M>> for DynamicTreeAreaInfoCallback {
    fn visit_point(&mut self, point: &Point<Real>, model: &Arc<M>) {
        if let Some(info) = model.intersect_point(point) {
            if is_better_ground(info.ground_z, point, self.area_info.map(|i| i.ground_z)) {
                self.area_info = Some(info);
            }
        }
    }
}

/// Point visitor keeping the highest ground below the probe, and the model it belongs to.
pub struct DynamicTreeLocationInfoCallback<M: ?Sized> {
    hit: Option<(Arc<M>, LocationInfo)>,
}

impl<M: ?Sized> Default for DynamicTreeLocationInfoCallback<M> {
    fn default() -> Self {
        Self { hit: None }
    }
}

impl<M: ?Sized> DynamicTreeLocationInfoCallback<M> {
    /// A callback that found nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The best location found.
    pub fn location_info(&self) -> Option<&LocationInfo> {
        self.hit.as_ref().map(|(_, info)| info)
    }

    /// The model the best location belongs to.
    pub fn hit_model(&self) -> Option<&Arc<M>> {
        self.hit.as_ref().map(|(model, _)| model)
    }

    /// Consumes the callback, returning the winning model and its location.
    pub fn into_hit(self) -> Option<(Arc<M>, LocationInfo)> {
        self.hit
    }
}

impl<M: GameObjectModel + ?Sized> PointVisitor<Arc<M>> for DynamicTreeLocationInfoCallback<M> {
    fn visit_point(&mut self, point: &Point<Real>, model: &Arc<M>) {
        if let Some(info) = model.location_info(point) {
            let best = self.location_info().map(|i| i.ground_z);
            if is_better_ground(info.ground_z, point, best) {
                self.hit = Some((model.clone(), info));
            }
        }
    }
}

fn is_better_ground(ground_z: Real, probe: &Point<Real>, best: Option<Real>) -> bool {
    ground_z <= probe.z && best.map_or(true, |best| ground_z > best)
}
