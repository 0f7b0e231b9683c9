use std::sync::Arc;

use dyntree3d::dynamic::{DynamicMapTree, ModelIgnoreFlags};
use dyntree3d::math::{Point, Vector};
use dyntree3d::query::Ray;

use super::common::BoxModel;

fn wall_tree() -> DynamicMapTree<BoxModel> {
    let tree = DynamicMapTree::new();
    let wall = BoxModel::new(0, Point::new(4.0, -5.0, 0.0), Point::new(6.0, 5.0, 5.0));
    assert!(tree.insert(Arc::new(wall)));
    tree
}

#[test]
fn walls_block_the_line_of_sight() {
    let tree = wall_tree();
    let nothing = ModelIgnoreFlags::NOTHING;

    assert!(!tree.is_in_line_of_sight(&Point::new(0.0, 0.0, 1.0), &Point::new(10.0, 0.0, 1.0), nothing));
    assert!(!tree.is_in_line_of_sight(&Point::new(10.0, 0.0, 1.0), &Point::new(0.0, 0.0, 1.0), nothing));
    // Over the wall, beside it, and short of it.
    assert!(tree.is_in_line_of_sight(&Point::new(0.0, 0.0, 6.0), &Point::new(10.0, 0.0, 6.0), nothing));
    assert!(tree.is_in_line_of_sight(&Point::new(0.0, 8.0, 1.0), &Point::new(10.0, 8.0, 1.0), nothing));
    assert!(tree.is_in_line_of_sight(&Point::new(0.0, 0.0, 1.0), &Point::new(3.0, 0.0, 1.0), nothing));
}

#[test]
fn coincident_points_are_in_line_of_sight() {
    let tree = wall_tree();
    let inside = Point::new(5.0, 0.0, 1.0);
    assert!(tree.is_in_line_of_sight(&inside, &inside, ModelIgnoreFlags::NOTHING));
}

#[test]
fn m2_models_can_be_ignored() {
    let tree = DynamicMapTree::new();
    let doodad = BoxModel::cube(1, Point::new(5.0, 0.0, 1.0), 1.0).m2();
    assert!(tree.insert(Arc::new(doodad)));

    let (start, end) = (Point::new(0.0, 0.0, 1.0), Point::new(10.0, 0.0, 1.0));
    assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
    assert!(tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::M2));
    assert_eq!(tree.get_height(5.0, 0.0, 10.0, 20.0), 2.0);

    // Map objects still block the ray.
    let wall = BoxModel::new(2, Point::new(7.0, -1.0, 0.0), Point::new(8.0, 1.0, 2.0));
    assert!(tree.insert(Arc::new(wall)));
    assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::M2));
}

#[test]
fn line_of_sight_across_grid_cells() {
    let tree = DynamicMapTree::new();
    // Cells are 533.33 units wide: these boxes live in three different columns.
    for (id, x) in [(0, -550.0), (1, 10.0), (2, 600.0)] {
        assert!(tree.insert(Arc::new(BoxModel::cube(id, Point::new(x, 0.0, 0.0), 2.0))));
    }

    let start = Point::new(-1000.0, 0.0, 0.0);
    let end = Point::new(1000.0, 0.0, 0.0);
    assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));

    let offset = Vector::new(0.0, 10.0, 0.0);
    assert!(tree.is_in_line_of_sight(&(start + offset), &(end + offset), ModelIgnoreFlags::NOTHING));

    // The ray toward the last box only.
    let start = Point::new(300.0, 0.0, 0.0);
    assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
    let dist = tree.get_intersection_time(&Ray::new(start, Vector::x()), &end, 700.0);
    assert_relative_eq!(dist.unwrap(), 298.0, epsilon = 1.0e-3);
}

#[test]
fn intersection_time_is_the_closest_hit() {
    let tree = wall_tree();
    assert!(tree.insert(Arc::new(BoxModel::cube(1, Point::new(8.0, 0.0, 1.0), 0.5))));

    let ray = Ray::new(Point::new(0.0, 0.0, 1.0), Vector::x());
    let end = Point::new(10.0, 0.0, 1.0);
    assert_eq!(tree.get_intersection_time(&ray, &end, 10.0), Some(4.0));
    assert_eq!(tree.get_intersection_time(&ray, &end, 3.0), None);

    let ray = Ray::new(Point::new(10.0, 0.0, 1.0), -Vector::x());
    let end = Point::new(0.0, 0.0, 1.0);
    assert_eq!(tree.get_intersection_time(&ray, &end, 10.0), Some(1.5));
}

#[test]
fn object_hit_position() {
    let tree = wall_tree();
    let start = Point::new(0.0, 0.0, 1.0);
    let end = Point::new(10.0, 0.0, 1.0);

    let (pos, hit) = tree.get_object_hit_pos(&start, &end, 0.0);
    assert!(hit);
    assert_relative_eq!(pos, Point::new(4.0, 0.0, 1.0), epsilon = 1.0e-5);

    let (pos, hit) = tree.get_object_hit_pos(&start, &end, -1.0);
    assert!(hit);
    assert_relative_eq!(pos, Point::new(3.0, 0.0, 1.0), epsilon = 1.0e-5);

    let (pos, hit) = tree.get_object_hit_pos(&start, &end, 0.5);
    assert!(hit);
    assert_relative_eq!(pos, Point::new(4.5, 0.0, 1.0), epsilon = 1.0e-5);

    // Pulled back, but never behind the start.
    let (pos, hit) = tree.get_object_hit_pos(&start, &end, -10.0);
    assert!(hit);
    assert_eq!(pos, start);
}

#[test]
fn object_hit_position_without_hit() {
    let tree = wall_tree();
    let start = Point::new(0.0, 0.0, 1.0);
    let end = Point::new(3.0, 0.0, 1.0);
    assert_eq!(tree.get_object_hit_pos(&start, &end, -1.0), (end, false));
    assert_eq!(tree.get_object_hit_pos(&start, &start, 1.0), (start, false));
}
