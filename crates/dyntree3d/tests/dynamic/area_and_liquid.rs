use std::sync::Arc;

use dyntree3d::dynamic::{AreaDetails, DynamicMapTree, LiquidInfo, INVALID_HEIGHT};
use dyntree3d::math::Point;

use super::common::BoxModel;

fn building(id: u64, mins: Point<f32>, maxs: Point<f32>) -> BoxModel {
    let mut model = BoxModel::new(id, mins, maxs);
    model.root_id = 7;
    model.wmo_id = 42;
    model.mogp_flags = 0x8;
    model
}

#[test]
fn point_just_inside_or_outside_a_box() {
    let tree = DynamicMapTree::new();
    let model = building(0, Point::new(0.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0));
    assert!(tree.insert(Arc::new(model)));

    assert_eq!(tree.get_area_info(10.01, 5.0, 5.0), None);
    let info = tree.get_area_info(9.99, 5.0, 5.0).unwrap();
    assert_eq!(info.ground_z, 0.0);
    assert_eq!(info.root_id, 7);
    assert_eq!(info.group_id, 42);
}

#[test]
fn highest_ground_below_the_probe_wins() {
    let tree = DynamicMapTree::new();
    let hall = building(0, Point::new(-10.0, -10.0, 0.0), Point::new(10.0, 10.0, 20.0));
    let mut mezzanine = building(1, Point::new(-2.0, -2.0, 5.0), Point::new(2.0, 2.0, 10.0));
    mezzanine.root_id = 8;
    assert!(tree.insert(Arc::new(hall)));
    assert!(tree.insert(Arc::new(mezzanine)));

    assert_eq!(tree.get_area_info(0.0, 0.0, 7.0).unwrap().ground_z, 5.0);
    assert_eq!(tree.get_area_info(0.0, 0.0, 7.0).unwrap().root_id, 8);
    assert_eq!(tree.get_area_info(0.0, 0.0, 12.0).unwrap().ground_z, 0.0);
    assert_eq!(tree.get_area_info(5.0, 5.0, 7.0).unwrap().ground_z, 0.0);

    let data = tree.get_area_and_liquid_data(0.0, 0.0, 7.0, 0, |_| 0);
    assert_eq!(data.floor_z, 5.0);
    assert_eq!(data.area_info.unwrap().root_id, 8);
}

#[test]
fn area_and_liquid_of_a_building() {
    let tree = DynamicMapTree::new();
    let mut pool = building(0, Point::new(0.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0));
    pool.liquid = Some((5, 3.0));
    assert!(tree.insert(Arc::new(pool)));

    let expected_area = AreaDetails {
        adt_id: 0,
        root_id: 7,
        group_id: 42,
        mogp_flags: 0x8,
    };
    let expected_liquid = LiquidInfo {
        liquid_type: 5,
        level: 3.0,
    };
    let liquid_flags = |liquid_type: u32| if liquid_type == 5 { 0b10 } else { 0 };

    let data = tree.get_area_and_liquid_data(5.0, 5.0, 1.0, 0, liquid_flags);
    assert_eq!(data.floor_z, 0.0);
    assert_eq!(data.area_info, Some(expected_area));
    assert_eq!(data.liquid_info, Some(expected_liquid));

    let data = tree.get_area_and_liquid_data(5.0, 5.0, 1.0, 0b10, liquid_flags);
    assert_eq!(data.liquid_info, Some(expected_liquid));

    // Another liquid was requested: the area is still reported.
    let data = tree.get_area_and_liquid_data(5.0, 5.0, 1.0, 0b01, liquid_flags);
    assert_eq!(data.area_info, Some(expected_area));
    assert_eq!(data.liquid_info, None);
}

#[test]
fn nothing_found_outside_of_the_models() {
    let tree = DynamicMapTree::new();
    let model = building(0, Point::new(0.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0));
    assert!(tree.insert(Arc::new(model)));

    let data = tree.get_area_and_liquid_data(20.0, 5.0, 1.0, 0, |_| 0);
    assert_eq!(data.floor_z, INVALID_HEIGHT);
    assert_eq!(data.area_info, None);
    assert_eq!(data.liquid_info, None);
    assert_eq!(tree.get_area_info(20.0, 5.0, 1.0), None);
}
