use super::{Bih, BihBuildParams, BihBuildStats, BihNode};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, DIM};

/// What to do with a range of primitives that is too large for a leaf.
enum Subdivision {
    /// Give up splitting: the whole range goes into a leaf.
    Leaf,
    /// Narrow the node bounds to `[lo, hi]` along `axis` and try again on the same range.
    Bvh2Cut { axis: usize, lo: Real, hi: Real },
    /// Split the range at `mid`.
    Split {
        axis: usize,
        split: Real,
        mid: usize,
        clip_left: Real,
        clip_right: Real,
        empty_space: Option<EmptySpaceCut>,
    },
}

/// A one-sided node cutting away the empty half of a cell that ended up with all the
/// primitives on the same side of its split plane.
struct EmptySpaceCut {
    axis: usize,
    clip: Real,
    keep_left: bool,
}

struct BihBuilder<'a> {
    leaves: &'a [Aabb],
    indices: Vec<u32>,
    nodes: Vec<BihNode>,
    stats: BihBuildStats,
    max_leaf_size: u32,
    max_depth: u32,
    empty_space_ratio: Real,
}

impl Bih {
    /// Builds a tree over the given primitive AABBs.
    ///
    /// The primitive at `leaves[i]` is identified by the index `i` during queries.
    pub fn build(params: &BihBuildParams, leaves: &[Aabb]) -> Self {
        Self::build_with_stats(params, leaves).0
    }

    /// Builds a tree over the given primitive AABBs and reports statistics about its shape.
    ///
    /// Building twice from the same primitives yields identical trees.
    pub fn build_with_stats(params: &BihBuildParams, leaves: &[Aabb]) -> (Self, BihBuildStats) {
        if leaves.is_empty() {
            return (Self::new(), BihBuildStats::default());
        }

        let bounds = leaves
            .iter()
            .fold(Aabb::new_invalid(), |acc, aabb| acc.merged(aabb));

        let mut builder = BihBuilder {
            leaves,
            indices: (0..leaves.len() as u32).collect(),
            nodes: vec![BihNode::EMPTY_LEAF],
            stats: BihBuildStats::default(),
            max_leaf_size: params.leaf_size(),
            max_depth: params.depth_limit(),
            empty_space_ratio: params.empty_space_ratio,
        };
        builder.subdivide(0, leaves.len(), 0, 1, bounds, bounds);

        let stats = builder.stats;
        log::debug!(
            "BIH built over {} objects: {} inner nodes ({} BVH2), {} leaves, depth {}..{} (avg {:.2}), \
             objects per leaf {}..{} (avg {:.2}), leaf histogram {:?}",
            leaves.len(),
            stats.nodes,
            stats.bvh2,
            stats.leaves,
            stats.min_depth,
            stats.max_depth,
            stats.avg_depth(),
            stats.min_objects,
            stats.max_objects,
            stats.avg_objects(),
            stats.leaf_histogram,
        );

        let bih = Bih {
            bounds,
            nodes: builder.nodes,
            object_index: builder.indices,
        };
        (bih, stats)
    }
}

impl BihBuilder<'_> {
    fn allocate(&mut self, count: usize) -> u32 {
        let first = self.nodes.len();
        self.nodes.resize(first + count, BihNode::EMPTY_LEAF);
        first as u32
    }

    fn make_leaf(&mut self, node_index: u32, start: usize, end: usize, depth: u32) {
        let count = (end - start) as u32;
        self.stats.record_leaf(depth, count);
        self.nodes[node_index as usize] = BihNode::Leaf {
            first: start as u32,
            count,
        };
    }

    fn subdivide(
        &mut self,
        start: usize,
        end: usize,
        mut node_index: u32,
        mut depth: u32,
        mut grid_box: Aabb,
        mut node_box: Aabb,
    ) {
        if (end - start) as u32 <= self.max_leaf_size || depth >= self.max_depth {
            self.make_leaf(node_index, start, end, depth);
            return;
        }

        match self.choose_subdivision(start, end, &mut grid_box, &node_box) {
            Subdivision::Leaf => self.make_leaf(node_index, start, end, depth),
            Subdivision::Bvh2Cut { axis, lo, hi } => {
                self.stats.bvh2 += 1;
                self.stats.nodes += 1;
                let child = self.allocate(1);
                self.nodes[node_index as usize] = BihNode::Bvh2Cut {
                    axis: axis as u8,
                    child,
                    lo,
                    hi,
                };
                node_box.mins[axis] = lo;
                node_box.maxs[axis] = hi;
                self.subdivide(start, end, child, depth + 1, grid_box, node_box);
            }
            Subdivision::Split {
                axis,
                split,
                mid,
                clip_left,
                clip_right,
                empty_space,
            } => {
                if let Some(cut) = empty_space {
                    let next = self.allocate(1);
                    self.stats.nodes += 1;
                    self.nodes[node_index as usize] = if cut.keep_left {
                        BihNode::Inner {
                            axis: cut.axis as u8,
                            left: Some(next),
                            right: None,
                            clip_left: cut.clip,
                            clip_right: Real::INFINITY,
                        }
                    } else {
                        BihNode::Inner {
                            axis: cut.axis as u8,
                            left: None,
                            right: Some(next),
                            clip_left: -Real::INFINITY,
                            clip_right: cut.clip,
                        }
                    };
                    // The cut-off side counts as an empty leaf.
                    depth += 1;
                    self.stats.record_leaf(depth, 0);
                    node_index = next;
                }

                let left = self.allocate(2);
                self.stats.nodes += 1;
                self.nodes[node_index as usize] = BihNode::Inner {
                    axis: axis as u8,
                    left: Some(left),
                    right: Some(left + 1),
                    clip_left,
                    clip_right,
                };

                let (mut grid_left, mut grid_right) = (grid_box, grid_box);
                grid_left.maxs[axis] = split;
                grid_right.mins[axis] = split;
                let (mut node_left, mut node_right) = (node_box, node_box);
                node_left.maxs[axis] = clip_left;
                node_right.mins[axis] = clip_right;

                self.subdivide(start, mid, left, depth + 1, grid_left, node_left);
                self.subdivide(mid, end, left + 1, depth + 1, grid_right, node_right);
            }
        }
    }

    /// Partitions `indices[start..end]` around the middle of `grid_box`, shrinking `grid_box`
    /// until the partition actually separates the primitives.
    fn choose_subdivision(
        &mut self,
        start: usize,
        end: usize,
        grid_box: &mut Aabb,
        node_box: &Aabb,
    ) -> Subdivision {
        let mut prev_split: Option<(usize, Real)> = None;
        let mut empty_space = None;

        loop {
            let extents = grid_box.extents();
            let consistent = extents.iter().all(|e| *e >= 0.0)
                && (0..DIM).all(|i| {
                    node_box.maxs[i] >= grid_box.mins[i] && node_box.mins[i] <= grid_box.maxs[i]
                });
            if !consistent {
                log::warn!(
                    "BIH node bounds {:?} are inconsistent with the grid cell {:?}: \
                     discarding the subdivision of {} objects.",
                    node_box,
                    grid_box,
                    end - start
                );
                return Subdivision::Leaf;
            }

            let axis = grid_box.primary_axis();
            let split = (grid_box.mins[axis] + grid_box.maxs[axis]) * 0.5;

            let mut clip_left = -Real::INFINITY;
            let mut clip_right = Real::INFINITY;
            let mut node_lo = Real::INFINITY;
            let mut node_hi = -Real::INFINITY;

            let mut i = start;
            let mut mid = end;
            while i < mid {
                let aabb = &self.leaves[self.indices[i] as usize];
                let (minb, maxb) = (aabb.mins[axis], aabb.maxs[axis]);

                if (minb + maxb) * 0.5 <= split {
                    i += 1;
                    clip_left = clip_left.max(maxb);
                } else {
                    mid -= 1;
                    self.indices.swap(i, mid);
                    clip_right = clip_right.min(minb);
                }

                node_lo = node_lo.min(minb);
                node_hi = node_hi.max(maxb);
            }

            if node_lo > node_box.mins[axis] && node_hi < node_box.maxs[axis] {
                let node_width = node_box.maxs[axis] - node_box.mins[axis];
                if self.empty_space_ratio * (node_hi - node_lo) < node_width {
                    return Subdivision::Bvh2Cut {
                        axis,
                        lo: node_lo,
                        hi: node_hi,
                    };
                }
            }

            let stuck = prev_split.is_some_and(|(prev_axis, prev)| {
                prev_axis == axis && relative_eq!(prev, split)
            });
            prev_split = Some((axis, split));

            if mid == end {
                // Everything went left.
                if stuck {
                    return Subdivision::Leaf;
                }
                grid_box.maxs[axis] = split;
                empty_space = (clip_left <= split).then_some(EmptySpaceCut {
                    axis,
                    clip: clip_left,
                    keep_left: true,
                });
            } else if mid == start {
                // Everything went right.
                if stuck {
                    return Subdivision::Leaf;
                }
                grid_box.mins[axis] = split;
                empty_space = (clip_right >= split).then_some(EmptySpaceCut {
                    axis,
                    clip: clip_right,
                    keep_left: false,
                });
            } else {
                return Subdivision::Split {
                    axis,
                    split,
                    mid,
                    clip_left,
                    clip_right,
                    empty_space,
                };
            }
        }
    }
}
