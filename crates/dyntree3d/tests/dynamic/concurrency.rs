use std::sync::Arc;
use std::thread;

use dyntree3d::dynamic::{DynamicMapTree, ModelIgnoreFlags};
use dyntree3d::math::{Point, Real};

use super::common::BoxModel;

#[test]
fn concurrent_queries_and_mutations() {
    let tree = DynamicMapTree::new();
    let wall = BoxModel::new(0, Point::new(4.0, -5.0, 0.0), Point::new(6.0, 5.0, 5.0));
    assert!(tree.insert(Arc::new(wall)));

    thread::scope(|s| {
        // Writers churn doors far from the wall, some in the wall's cell.
        for writer in 0..2u64 {
            let tree = &tree;
            let _ = s.spawn(move || {
                for round in 0..200u64 {
                    let id = 1 + writer * 1000 + round % 10;
                    let x = -20.0 - writer as Real * 700.0 - (round % 10) as Real * 3.0;
                    let door = Arc::new(BoxModel::cube(id, Point::new(x, 0.0, 1.0), 1.0));
                    assert!(tree.insert(door.clone()));
                    if round % 3 == 0 {
                        let _ = tree.remove(&door);
                    }
                    tree.update(10);
                }
            });
        }

        for _ in 0..2 {
            let tree = &tree;
            let _ = s.spawn(move || {
                let start = Point::new(0.0, 0.0, 1.0);
                let end = Point::new(10.0, 0.0, 1.0);
                for _ in 0..500 {
                    assert!(!tree.is_in_line_of_sight(&start, &end, ModelIgnoreFlags::NOTHING));
                    assert_relative_eq!(tree.get_height(5.0, 0.0, 20.0, 30.0), 5.0);
                    assert_eq!(tree.get_area_info(5.0, 0.0, 1.0).unwrap().ground_z, 0.0);
                }
            });
        }
    });

    tree.balance();
    // The wall, plus the 7 doors of each writer's last 10 rounds that weren't removed.
    assert_eq!(tree.size(), 15);
}
