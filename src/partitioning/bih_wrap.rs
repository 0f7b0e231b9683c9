use core::fmt::Debug;
use core::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::partitioning::{Bih, BihBuildParams, PointVisitor, RayVisitor};
use crate::query::Ray;
use crate::utils::hashmap::{HashMap, IndexMap};

/// An object that can be stored in a [`BihWrap`].
///
/// Objects are cheap handles (typically an `Arc`) identified by a key: inserting an object
/// whose key is already present replaces the previous one.
pub trait SpatialObject: Clone {
    /// The identity of the object.
    type Key: Copy + Eq + Hash + Debug;

    /// The identity of this object.
    fn key(&self) -> Self::Key;
    /// The world-space bounds of this object.
    fn aabb(&self) -> Aabb;
}

struct BihWrapState<T: SpatialObject> {
    tree: Bih,
    /// Objects referenced by the tree. Removed objects leave a hole until the next rebuild.
    objects: Vec<Option<T>>,
    obj_to_idx: HashMap<T::Key, u32>,
    /// Objects inserted since the last rebuild, in insertion order.
    pending: IndexMap<T::Key, T>,
    unbalanced_times: u32,
}

impl<T: SpatialObject> BihWrapState<T> {
    fn balance(&mut self, params: &BihBuildParams) {
        if self.unbalanced_times == 0 {
            return;
        }

        let objects: Vec<T> = self
            .objects
            .drain(..)
            .flatten()
            .chain(self.pending.drain(..).map(|(_, obj)| obj))
            .collect();
        let aabbs: Vec<Aabb> = objects.iter().map(|obj| obj.aabb()).collect();

        log::trace!(
            "Rebuilding a BIH over {} objects after {} changes.",
            objects.len(),
            self.unbalanced_times
        );

        self.tree = Bih::build(params, &aabbs);
        self.obj_to_idx = objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (obj.key(), i as u32))
            .collect();
        self.objects = objects.into_iter().map(Some).collect();
        self.unbalanced_times = 0;
    }
}

/// A thread-safe, mutable set of objects indexed by a [`Bih`].
///
/// Insertions and removals are cheap bookkeeping: the tree is only rebuilt by
/// [`BihWrap::balance`], which every query calls first. A query therefore always observes the
/// changes that completed before it.
///
/// All the operations lock the same mutex, including the visitor calls of queries: a visitor
/// must not access the `BihWrap` it is called from.
pub struct BihWrap<T: SpatialObject> {
    params: BihBuildParams,
    state: Mutex<BihWrapState<T>>,
}

impl<T: SpatialObject> Default for BihWrap<T> {
    fn default() -> Self {
        Self::new(BihBuildParams::default())
    }
}

impl<T: SpatialObject> BihWrap<T> {
    /// Creates an empty set whose trees are built with `params`.
    pub fn new(params: BihBuildParams) -> Self {
        Self {
            params,
            state: Mutex::new(BihWrapState {
                tree: Bih::new(),
                objects: vec![],
                obj_to_idx: HashMap::default(),
                pending: IndexMap::default(),
                unbalanced_times: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BihWrapState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules the insertion of `obj`, replacing any object with the same key.
    pub fn insert(&self, obj: T) {
        let mut state = self.lock();
        let key = obj.key();

        if let Some(idx) = state.obj_to_idx.remove(&key) {
            state.objects[idx as usize] = None;
        }

        let _ = state.pending.insert(key, obj);
        state.unbalanced_times += 1;
    }

    /// Schedules the removal of the object identified by `key`.
    ///
    /// Removing an object that was inserted since the last rebuild cancels its insertion.
    /// Returns `false` if no such object exists.
    pub fn remove(&self, key: &T::Key) -> bool {
        let mut state = self.lock();

        let removed = if let Some(idx) = state.obj_to_idx.remove(key) {
            state.objects[idx as usize] = None;
            true
        } else {
            state.pending.shift_remove(key).is_some()
        };

        if removed {
            state.unbalanced_times += 1;
        }

        removed
    }

    /// Rebuilds the tree if objects were inserted or removed since the last rebuild.
    pub fn balance(&self) {
        self.lock().balance(&self.params);
    }

    /// Were objects inserted or removed since the last rebuild?
    pub fn is_dirty(&self) -> bool {
        self.lock().unbalanced_times > 0
    }

    /// Does this set contain an object identified by `key`?
    pub fn contains(&self, key: &T::Key) -> bool {
        let state = self.lock();
        state.obj_to_idx.contains_key(key) || state.pending.contains_key(key)
    }

    /// The number of objects in this set, including the ones not yet in the tree.
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.obj_to_idx.len() + state.pending.len()
    }

    /// Is this set empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Casts a ray on the objects of this set.
    ///
    /// See [`Bih::intersect_ray`].
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        visitor: &mut impl RayVisitor<T>,
        max_dist: &mut Real,
        stop_at_first: bool,
    ) -> bool {
        let mut state = self.lock();
        state.balance(&self.params);

        let BihWrapState { tree, objects, .. } = &*state;
        tree.intersect_ray(
            ray,
            &mut |ray: &Ray, id: &u32, max_dist: &mut Real, stop_at_first: bool| {
                match objects.get(*id as usize) {
                    Some(Some(obj)) => visitor.visit_ray(ray, obj, max_dist, stop_at_first),
                    _ => false,
                }
            },
            max_dist,
            stop_at_first,
        )
    }

    /// Calls `visitor` on every object whose bounds may contain `point`.
    ///
    /// See [`Bih::intersect_point`].
    pub fn intersect_point(&self, point: &Point<Real>, visitor: &mut impl PointVisitor<T>) {
        let mut state = self.lock();
        state.balance(&self.params);

        let BihWrapState { tree, objects, .. } = &*state;
        tree.intersect_point(point, &mut |point: &Point<Real>, id: &u32| {
            if let Some(Some(obj)) = objects.get(*id as usize) {
                visitor.visit_point(point, obj);
            }
        });
    }
}
