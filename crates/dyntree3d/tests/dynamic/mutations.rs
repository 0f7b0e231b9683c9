use std::sync::Arc;

use dyntree3d::dynamic::{DynamicMapTree, DynamicTreeConfig, GameObjectModel, ModelIgnoreFlags};
use dyntree3d::math::{Point, Real};

use super::common::BoxModel;

fn segment() -> (Point<Real>, Point<Real>) {
    (Point::new(0.0, 0.0, 1.0), Point::new(10.0, 0.0, 1.0))
}

#[test]
fn inserted_models_are_visible_without_balance() {
    let tree = DynamicMapTree::new();
    let (start, end) = segment();
    assert!(tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));

    let door = Arc::new(BoxModel::cube(3, Point::new(5.0, 0.0, 1.0), 1.0));
    assert!(tree.insert(door.clone()));
    assert!(tree.contains(&door));
    assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));

    assert!(tree.remove(&door));
    assert!(!tree.remove(&door));
    assert!(!tree.contains(&door));
    assert!(tree.is_empty());
    assert!(tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
}

#[test]
fn insert_then_remove_before_any_rebalance() {
    let tree = DynamicMapTree::new();
    let (start, end) = segment();
    let door = Arc::new(BoxModel::cube(3, Point::new(5.0, 0.0, 1.0), 1.0));

    assert!(tree.insert(door.clone()));
    assert!(tree.remove(&door));
    tree.update(1000);
    tree.balance();

    assert_eq!(tree.size(), 0);
    assert!(tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
}

#[test]
fn reinserting_a_model_moves_it() {
    let tree = DynamicMapTree::new();
    let (start, end) = segment();

    assert!(tree.insert(Arc::new(BoxModel::cube(3, Point::new(5.0, 0.0, 1.0), 1.0))));
    tree.balance();
    // Same identity, opened door.
    let opened = Arc::new(BoxModel::cube(3, Point::new(5.0, 4.0, 1.0), 1.0));
    assert!(tree.insert(opened.clone()));

    assert_eq!(tree.size(), 1);
    assert_eq!(opened.id().0, 3);
    assert!(tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
    assert_relative_eq!(tree.get_height(5.0, 4.0, 10.0, 20.0), 2.0);
}

#[test]
fn models_outside_of_the_map_are_rejected() {
    let tree = DynamicMapTree::new();
    let far = BoxModel::cube(0, Point::new(1.0e6, 0.0, 0.0), 1.0);
    assert!(!tree.insert(Arc::new(far)));
    assert!(tree.is_empty());
}

#[test]
fn periodic_updates_keep_queries_consistent() {
    let tree = DynamicMapTree::with_config(DynamicTreeConfig::default());
    let models: Vec<_> = (0..20)
        .map(|i| Arc::new(BoxModel::cube(i, Point::new(5.0, i as Real * 3.0, 1.0), 1.0)))
        .collect();

    for model in &models {
        assert!(tree.insert(model.clone()));
        tree.update(50);
    }

    for model in models.iter().filter(|m| m.id % 2 == 1) {
        assert!(tree.remove(model));
        tree.update(50);
    }

    assert_eq!(tree.size(), 10);
    for model in &models {
        let center = model.aabb.center();
        let height = tree.get_height(center.x, center.y, 10.0, 20.0);
        if model.id % 2 == 1 {
            assert_eq!(height, -Real::INFINITY);
        } else {
            assert_relative_eq!(height, 2.0);
        }
    }
}
