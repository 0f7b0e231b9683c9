use super::{Bih, BihNode, MAX_STACK_SIZE};
use crate::math::{Point, Real, DIM, FUZZY_EPSILON};
use crate::partitioning::{PointVisitor, RayVisitor};
use crate::query::Ray;
use arrayvec::ArrayVec;

#[derive(Copy, Clone, Debug)]
struct RayStackEntry {
    node: u32,
    t_near: Real,
    t_far: Real,
}

impl Bih {
    /// Casts a ray on this tree, calling `visitor` on every primitive whose leaf is crossed by
    /// the ray before `max_dist`.
    ///
    /// The visitor receives the index of the primitive and may shrink `max_dist` when it finds
    /// a hit, which prunes the farther parts of the tree. Rays with a zero-length direction,
    /// or that miss the tree bounds before `max_dist`, never reach the visitor.
    ///
    /// Returns `true` if the traversal stopped early because `stop_at_first` is set and the
    /// visitor reported a hit.
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        visitor: &mut impl RayVisitor<u32>,
        max_dist: &mut Real,
        stop_at_first: bool,
    ) -> bool {
        let Some((mut t_min, mut t_max)) = self.clip_ray(ray, *max_dist) else {
            return false;
        };

        let org = ray.origin;
        let inv_dir = ray.inv_dir();
        let mut stack = ArrayVec::<RayStackEntry, MAX_STACK_SIZE>::new();
        let mut node = 0u32;

        loop {
            loop {
                match self.nodes[node as usize] {
                    BihNode::Inner {
                        axis,
                        left,
                        right,
                        clip_left,
                        clip_right,
                    } => {
                        let axis = axis as usize;
                        let (front, back, front_clip, back_clip) =
                            if ray.dir[axis].is_sign_negative() {
                                (right, left, clip_right, clip_left)
                            } else {
                                (left, right, clip_left, clip_right)
                            };
                        let tf = (front_clip - org[axis]) * inv_dir[axis];
                        let tb = (back_clip - org[axis]) * inv_dir[axis];

                        // The ray goes through the gap between both children.
                        if tf < t_min && tb > t_max {
                            break;
                        }

                        // Far child only.
                        if tf < t_min {
                            let Some(back) = back else { break };
                            t_min = tb.max(t_min);
                            node = back;
                            continue;
                        }

                        // Near child only.
                        if tb > t_max {
                            let Some(front) = front else { break };
                            t_max = tf.min(t_max);
                            node = front;
                            continue;
                        }

                        // Both children: the far one is visited later.
                        if let Some(back) = back {
                            let entry = RayStackEntry {
                                node: back,
                                t_near: tb.max(t_min),
                                t_far: t_max,
                            };
                            if stack.try_push(entry).is_err() {
                                log::warn!(
                                    "BIH ray traversal stack overflow: skipping node {}.",
                                    back
                                );
                            }
                        }

                        let Some(front) = front else { break };
                        t_max = tf.min(t_max);
                        node = front;
                    }
                    BihNode::Bvh2Cut { axis, child, lo, hi } => {
                        let axis = axis as usize;
                        let (entry_clip, exit_clip) = if ray.dir[axis].is_sign_negative() {
                            (hi, lo)
                        } else {
                            (lo, hi)
                        };
                        let tf = (entry_clip - org[axis]) * inv_dir[axis];
                        let tb = (exit_clip - org[axis]) * inv_dir[axis];

                        t_min = tf.max(t_min);
                        t_max = tb.min(t_max);
                        if t_min > t_max {
                            break;
                        }
                        node = child;
                    }
                    BihNode::Leaf { first, count } => {
                        for id in self.leaf_objects(first, count) {
                            let hit = visitor.visit_ray(ray, id, max_dist, stop_at_first);
                            if stop_at_first && hit {
                                return true;
                            }
                        }
                        break;
                    }
                }
            }

            // Resume from the closest pending subtree still within reach.
            loop {
                let Some(entry) = stack.pop() else {
                    return false;
                };
                t_min = entry.t_near;
                if *max_dist < t_min {
                    continue;
                }
                node = entry.node;
                t_max = entry.t_far;
                break;
            }
        }
    }

    /// Computes the parametric interval `[t_min, t_max]` of `ray` inside the tree bounds,
    /// clamped to `[0, max_dist]`.
    fn clip_ray(&self, ray: &Ray, max_dist: Real) -> Option<(Real, Real)> {
        // Also rejects NaN.
        if !(max_dist >= 0.0) {
            return None;
        }

        let mut t_min: Real = -1.0;
        let mut t_max: Real = -1.0;
        let mut usable_axis = false;

        for i in 0..DIM {
            if ray.dir[i].abs() > FUZZY_EPSILON {
                usable_axis = true;
                let inv = 1.0 / ray.dir[i];
                let mut t1 = (self.bounds.mins[i] - ray.origin[i]) * inv;
                let mut t2 = (self.bounds.maxs[i] - ray.origin[i]) * inv;
                if t1 > t2 {
                    core::mem::swap(&mut t1, &mut t2);
                }
                if t1 > t_min {
                    t_min = t1;
                }
                if t2 < t_max || t_max < 0.0 {
                    t_max = t2;
                }
                // Later axes can only shrink the interval.
                if t_max <= 0.0 || t_min >= max_dist {
                    return None;
                }
            } else if ray.origin[i] < self.bounds.mins[i] || ray.origin[i] > self.bounds.maxs[i] {
                return None;
            }
        }

        // Also rejects NaN intervals.
        if !usable_axis || !(t_min <= t_max) {
            return None;
        }

        Some((t_min.max(0.0), t_max.min(max_dist)))
    }

    /// Calls `visitor` on every primitive whose leaf contains `point`.
    ///
    /// The visitor is called with candidates only: whether `point` actually lies inside the
    /// primitive is up to the visitor to decide.
    pub fn intersect_point(&self, point: &Point<Real>, visitor: &mut impl PointVisitor<u32>) {
        if !self.bounds.contains_local_point(point) {
            return;
        }

        let mut stack = ArrayVec::<u32, MAX_STACK_SIZE>::new();
        let mut node = 0u32;

        loop {
            loop {
                match self.nodes[node as usize] {
                    BihNode::Inner {
                        axis,
                        left,
                        right,
                        clip_left,
                        clip_right,
                    } => {
                        let p = point[axis as usize];
                        let left = if p <= clip_left { left } else { None };
                        let right = if p >= clip_right { right } else { None };

                        match (left, right) {
                            (Some(left), Some(right)) => {
                                if stack.try_push(right).is_err() {
                                    log::warn!(
                                        "BIH point traversal stack overflow: skipping node {}.",
                                        right
                                    );
                                }
                                node = left;
                            }
                            (Some(child), None) | (None, Some(child)) => node = child,
                            // The point lies between both children.
                            (None, None) => break,
                        }
                    }
                    BihNode::Bvh2Cut { axis, child, lo, hi } => {
                        let p = point[axis as usize];
                        if lo > p || hi < p {
                            break;
                        }
                        node = child;
                    }
                    BihNode::Leaf { first, count } => {
                        for id in self.leaf_objects(first, count) {
                            visitor.visit_point(point, id);
                        }
                        break;
                    }
                }
            }

            match stack.pop() {
                Some(next) => node = next,
                None => return,
            }
        }
    }
}
