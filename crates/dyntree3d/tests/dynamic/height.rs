use std::sync::Arc;

use dyntree3d::dynamic::DynamicMapTree;
use dyntree3d::math::{Point, Real};

use super::common::BoxModel;

const SLOTS_X: usize = 40;
const SLOTS_Y: usize = 25;
const SLOT_SIZE: Real = 20.0;

fn slot_origin(i: usize, j: usize) -> Point<Real> {
    Point::new(
        -400.0 + i as Real * SLOT_SIZE,
        -250.0 + j as Real * SLOT_SIZE,
        0.0,
    )
}

/// One random box per slot of a 40×25 lattice, so that no two boxes overlap. The lattice
/// spans several grid cells.
fn random_world(seed: u64) -> (DynamicMapTree<BoxModel>, Vec<BoxModel>) {
    let mut rng = oorandom::Rand32::new(seed);
    let tree = DynamicMapTree::new();
    let mut boxes = vec![];

    for i in 0..SLOTS_X {
        for j in 0..SLOTS_Y {
            let origin = slot_origin(i, j);
            let half = 1.0 + rng.rand_float() * 3.0;
            let span = SLOT_SIZE - 2.0 - 2.0 * half;
            let cx = origin.x + 1.0 + half + rng.rand_float() * span;
            let cy = origin.y + 1.0 + half + rng.rand_float() * span;
            let base = rng.rand_float() * 50.0;
            let top = base + 1.0 + rng.rand_float() * 20.0;

            let model = BoxModel::new(
                boxes.len() as u64,
                Point::new(cx - half, cy - half, base),
                Point::new(cx + half, cy + half, top),
            );
            assert!(tree.insert(Arc::new(model.clone())));
            boxes.push(model);
        }
    }

    (tree, boxes)
}

#[test]
fn height_above_random_boxes() {
    let (tree, boxes) = random_world(42);
    assert_eq!(tree.size(), 1000);
    tree.balance();

    for model in &boxes {
        let center = model.aabb.center();
        let top_z = model.aabb.maxs.z;
        let height = tree.get_height(center.x, center.y, top_z + 10.0, 100.0);
        assert_relative_eq!(height, top_z, epsilon = 1.0e-3);
    }
}

#[test]
fn height_over_empty_space_is_negative_infinity() {
    let (tree, _) = random_world(7);

    for i in 0..SLOTS_X {
        for j in 0..SLOTS_Y {
            let corner = slot_origin(i, j);
            let height = tree.get_height(corner.x + 0.5, corner.y + 0.5, 100.0, 1000.0);
            assert_eq!(height, -Real::INFINITY);
        }
    }

    assert_eq!(tree.get_height(5000.0, 5000.0, 100.0, 1000.0), -Real::INFINITY);
}

#[test]
fn height_is_limited_by_the_search_distance() {
    let tree = DynamicMapTree::new();
    let model = BoxModel::new(0, Point::new(-1.0, -1.0, 0.0), Point::new(1.0, 1.0, 2.0));
    assert!(tree.insert(Arc::new(model)));

    assert_eq!(tree.get_height(0.0, 0.0, 10.0, 5.0), -Real::INFINITY);
    assert_relative_eq!(tree.get_height(0.0, 0.0, 10.0, 8.5), 2.0);
    assert_eq!(tree.get_height(0.0, 0.0, 10.0, Real::NAN), -Real::INFINITY);
    assert_eq!(tree.get_height(0.0, 0.0, 10.0, -1.0), -Real::INFINITY);
}

#[test]
fn height_returns_the_highest_surface_below() {
    let tree = DynamicMapTree::new();
    let floor = BoxModel::new(0, Point::new(-5.0, -5.0, 0.0), Point::new(5.0, 5.0, 1.0));
    let table = BoxModel::new(1, Point::new(-1.0, -1.0, 3.0), Point::new(1.0, 1.0, 4.0));
    assert!(tree.insert(Arc::new(floor)));
    assert!(tree.insert(Arc::new(table)));

    assert_relative_eq!(tree.get_height(0.0, 0.0, 10.0, 50.0), 4.0);
    assert_relative_eq!(tree.get_height(3.0, 3.0, 10.0, 50.0), 1.0);
}
