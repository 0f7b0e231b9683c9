use super::{Bih, BihIoError, BihNode};
use crate::math::Real;

impl Bih {
    /// Checks the topology of this tree without panicking.
    ///
    /// The tree is valid if every node is reachable from the root exactly once, every child
    /// and leaf range is in bounds, every entry of the object index is covered by exactly one
    /// leaf, and the object index is a permutation of `0..primitive_count()`.
    pub fn validate(&self) -> Result<(), BihIoError> {
        let len = self.nodes.len() as u32;
        let mut visited = vec![false; self.nodes.len()];
        let mut coverage = vec![0u32; self.object_index.len()];
        let mut stack = vec![0u32];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id as usize) else {
                return Err(BihIoError::NodeOutOfRange {
                    node: id,
                    child: id,
                    len,
                });
            };

            if core::mem::replace(&mut visited[id as usize], true) {
                return Err(BihIoError::SharedNode(id));
            }

            if let BihNode::Leaf { first, count } = *node {
                let range = first as usize..first as usize + count as usize;
                let Some(slots) = coverage.get_mut(range) else {
                    return Err(BihIoError::ObjectRangeOutOfBounds {
                        node: id,
                        first,
                        count,
                        len: self.object_index.len() as u32,
                    });
                };
                slots.iter_mut().for_each(|c| *c += 1);
            }

            for child in node.children() {
                if child >= len {
                    return Err(BihIoError::NodeOutOfRange {
                        node: id,
                        child,
                        len,
                    });
                }
                stack.push(child);
            }
        }

        if let Some(id) = visited.iter().position(|v| !v) {
            return Err(BihIoError::UnreachableNode(id as u32));
        }

        if let Some((slot, count)) = coverage.iter().enumerate().find(|(_, c)| **c != 1) {
            return Err(BihIoError::ObjectCoverage(slot as u32, *count));
        }

        let mut seen = vec![false; self.object_index.len()];
        for &obj in &self.object_index {
            match seen.get_mut(obj as usize) {
                Some(seen) if !*seen => *seen = true,
                _ => return Err(BihIoError::NotAPermutation(obj)),
            }
        }

        Ok(())
    }

    /// Panics if the tree isn’t well-formed.
    ///
    /// In addition to the topological checks of [`Bih::validate`], this checks that the
    /// clipping planes of every inner node lie within the tree bounds or are infinite, and that
    /// BVH2 nodes have `lo <= hi`.
    pub fn assert_well_formed(&self) {
        if let Err(e) = self.validate() {
            panic!("Malformed BIH: {}", e);
        }

        for (id, node) in self.nodes.iter().enumerate() {
            match *node {
                BihNode::Inner {
                    axis,
                    left,
                    right,
                    clip_left,
                    clip_right,
                } => {
                    let axis = axis as usize;
                    let (mins, maxs) = (self.bounds.mins[axis], self.bounds.maxs[axis]);
                    let in_bounds = |clip: Real| clip >= mins && clip <= maxs;
                    assert!(left.is_some() || right.is_some(), "Childless node {}.", id);
                    if left.is_some() {
                        assert!(in_bounds(clip_left), "Node {} clips out of bounds.", id);
                    }
                    if right.is_some() {
                        assert!(in_bounds(clip_right), "Node {} clips out of bounds.", id);
                    }
                    if let (Some(l), Some(r)) = (left, right) {
                        assert_eq!(l + 1, r, "Split children of node {} are not adjacent.", id);
                    }
                }
                BihNode::Bvh2Cut { lo, hi, .. } => {
                    assert!(lo <= hi, "Empty BVH2 range at node {}.", id);
                }
                BihNode::Leaf { .. } => {}
            }
        }
    }
}
