use dyntree3d::bounding_volume::Aabb;
use dyntree3d::dynamic::{
    AreaInfo, GameObjectModel, LocationInfo, ModelId, ModelIgnoreFlags,
};
use dyntree3d::math::{Point, Real, Vector};
use dyntree3d::query::{Ray, RayCast};

/// A solid box whose floor is its bottom face.
#[derive(Clone, Debug)]
pub struct BoxModel {
    pub id: u64,
    pub aabb: Aabb,
    pub is_m2: bool,
    pub root_id: i32,
    pub wmo_id: u32,
    pub mogp_flags: u32,
    pub liquid: Option<(u32, Real)>,
}

impl BoxModel {
    pub fn new(id: u64, mins: Point<Real>, maxs: Point<Real>) -> Self {
        Self {
            id,
            aabb: Aabb::new(mins, maxs),
            is_m2: false,
            root_id: 0,
            wmo_id: 0,
            mogp_flags: 0,
            liquid: None,
        }
    }

    pub fn cube(id: u64, center: Point<Real>, half_extent: Real) -> Self {
        let half = Vector::repeat(half_extent);
        Self::new(id, center - half, center + half)
    }

    pub fn m2(mut self) -> Self {
        self.is_m2 = true;
        self
    }
}

impl GameObjectModel for BoxModel {
    fn id(&self) -> ModelId {
        ModelId(self.id)
    }

    fn bounds(&self) -> Aabb {
        self.aabb
    }

    fn intersect_ray(
        &self,
        ray: &Ray,
        max_dist: &mut Real,
        _stop_at_first: bool,
        _ignore_flags: ModelIgnoreFlags,
    ) -> bool {
        match self.aabb.cast_local_ray(ray, *max_dist, true) {
            Some(toi) => {
                *max_dist = toi;
                true
            }
            None => false,
        }
    }

    fn intersect_point(&self, point: &Point<Real>) -> Option<AreaInfo> {
        self.aabb.contains_local_point(point).then(|| AreaInfo {
            ground_z: self.aabb.mins.z,
            flags: self.mogp_flags,
            adt_id: 0,
            root_id: self.root_id,
            group_id: self.wmo_id as i32,
        })
    }

    fn location_info(&self, point: &Point<Real>) -> Option<LocationInfo> {
        self.aabb.contains_local_point(point).then(|| LocationInfo {
            root_id: self.root_id,
            ground_z: self.aabb.mins.z,
        })
    }

    fn liquid_level(&self, _point: &Point<Real>, _info: &LocationInfo) -> Option<Real> {
        self.liquid.map(|(_, level)| level)
    }

    fn liquid_type(&self) -> u32 {
        self.liquid.map_or(0, |(liquid_type, _)| liquid_type)
    }

    fn wmo_id(&self) -> u32 {
        self.wmo_id
    }

    fn mogp_flags(&self) -> u32 {
        self.mogp_flags
    }

    fn is_map_object(&self) -> bool {
        !self.is_m2
    }
}
