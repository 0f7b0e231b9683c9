use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};

/// Size of the explicit stacks used by the traversals.
///
/// This is also the largest depth a build can reach, so a tree built by [`Bih::build`] never
/// overflows a traversal stack.
pub const MAX_STACK_SIZE: usize = 64;

/// Parameters controlling the construction of a [`Bih`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BihBuildParams {
    /// Number of primitives at or under which a node becomes a leaf.
    ///
    /// Values smaller than 1 are treated as 1.
    pub max_leaf_size: u32,
    /// Threshold of the empty-space optimization.
    ///
    /// A bounds-narrowing node is emitted when `empty_space_ratio` times the extent actually
    /// occupied by the primitives is still smaller than the extent of the current node.
    pub empty_space_ratio: Real,
    /// Depth at which a node becomes a leaf regardless of its primitive count.
    ///
    /// Clamped to `1..=MAX_STACK_SIZE`.
    pub max_depth: u32,
}

impl Default for BihBuildParams {
    fn default() -> Self {
        Self {
            max_leaf_size: 3,
            empty_space_ratio: 1.3,
            max_depth: MAX_STACK_SIZE as u32,
        }
    }
}

impl BihBuildParams {
    pub(super) fn leaf_size(&self) -> u32 {
        self.max_leaf_size.max(1)
    }

    pub(super) fn depth_limit(&self) -> u32 {
        self.max_depth.clamp(1, MAX_STACK_SIZE as u32)
    }
}

/// Statistics gathered while building a [`Bih`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BihBuildStats {
    /// Number of inner nodes, including the BVH2 and one-sided nodes.
    pub nodes: u32,
    /// Number of leaves, including the empty branches of one-sided nodes.
    pub leaves: u32,
    /// Total number of primitives referenced by leaves.
    pub objects: u32,
    /// Smallest primitive count of a leaf.
    pub min_objects: u32,
    /// Largest primitive count of a leaf.
    pub max_objects: u32,
    /// Sum of the depths of all leaves.
    pub sum_depth: u32,
    /// Depth of the shallowest leaf.
    pub min_depth: u32,
    /// Depth of the deepest leaf.
    pub max_depth: u32,
    /// Number of BVH2 (bounds-narrowing) nodes.
    pub bvh2: u32,
    /// Number of leaves with 0, 1, 2, 3, 4 and 5-or-more primitives.
    pub leaf_histogram: [u32; 6],
}

impl Default for BihBuildStats {
    fn default() -> Self {
        Self {
            nodes: 0,
            leaves: 0,
            objects: 0,
            min_objects: u32::MAX,
            max_objects: 0,
            sum_depth: 0,
            min_depth: u32::MAX,
            max_depth: 0,
            bvh2: 0,
            leaf_histogram: [0; 6],
        }
    }
}

impl BihBuildStats {
    pub(super) fn record_leaf(&mut self, depth: u32, count: u32) {
        self.leaves += 1;
        self.objects += count;
        self.min_objects = self.min_objects.min(count);
        self.max_objects = self.max_objects.max(count);
        self.sum_depth += depth;
        self.min_depth = self.min_depth.min(depth);
        self.max_depth = self.max_depth.max(depth);
        self.leaf_histogram[(count as usize).min(5)] += 1;
    }

    /// The average depth of the leaves.
    pub fn avg_depth(&self) -> Real {
        if self.leaves == 0 {
            0.0
        } else {
            self.sum_depth as Real / self.leaves as Real
        }
    }

    /// The average number of primitives per leaf.
    pub fn avg_objects(&self) -> Real {
        if self.leaves == 0 {
            0.0
        } else {
            self.objects as Real / self.leaves as Real
        }
    }
}

/// A node of a [`Bih`].
///
/// Nodes are stored contiguously and reference each other by index. The two children of a
/// split are always adjacent: if the left child is at index `i`, the right child is at `i + 1`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum BihNode {
    /// A split along `axis`.
    ///
    /// The left child contains primitives whose extent along `axis` ends at or before
    /// `clip_left`, the right child the ones starting at or after `clip_right`. A node emitted
    /// to cut away empty space has a single child: the missing side is `None` and its
    /// clipping plane is infinite.
    Inner {
        /// The split axis.
        axis: u8,
        /// Index of the left child.
        left: Option<u32>,
        /// Index of the right child.
        right: Option<u32>,
        /// Upper bound of the left child along `axis`.
        clip_left: Real,
        /// Lower bound of the right child along `axis`.
        clip_right: Real,
    },
    /// A node narrowing the bounds of its single child to `[lo, hi]` along `axis`.
    Bvh2Cut {
        /// The narrowed axis.
        axis: u8,
        /// Index of the child.
        child: u32,
        /// Lower bound of the child along `axis`.
        lo: Real,
        /// Upper bound of the child along `axis`.
        hi: Real,
    },
    /// A run of `count` entries of the object index, starting at `first`.
    Leaf {
        /// First entry of the run.
        first: u32,
        /// Number of entries of the run.
        count: u32,
    },
}

impl BihNode {
    pub(super) const EMPTY_LEAF: Self = BihNode::Leaf { first: 0, count: 0 };

    /// Is this node a leaf?
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, BihNode::Leaf { .. })
    }

    /// Iterates through the children of this node.
    pub fn children(&self) -> impl Iterator<Item = u32> {
        let (a, b) = match *self {
            BihNode::Inner { left, right, .. } => (left, right),
            BihNode::Bvh2Cut { child, .. } => (Some(child), None),
            BihNode::Leaf { .. } => (None, None),
        };
        a.into_iter().chain(b)
    }
}

/// A bounding interval hierarchy over a fixed set of primitives.
///
/// Primitives are identified by their position in the slice given to [`Bih::build`]. The tree
/// never stores the primitives themselves: queries hand primitive indices to a visitor which
/// performs the exact test.
///
/// # Example
///
/// ```rust
/// use dyntree3d::bounding_volume::Aabb;
/// use dyntree3d::partitioning::{Bih, BihBuildParams};
/// use dyntree3d::query::{Ray, RayCast};
/// use nalgebra::{Point3, Vector3};
///
/// let boxes: Vec<Aabb> = (0..10)
///     .map(|i| Aabb::from_half_extents(Point3::new(i as f32 * 4.0, 0.0, 0.0), Vector3::repeat(1.0)))
///     .collect();
/// let bih = Bih::build(&BihBuildParams::default(), &boxes);
///
/// let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vector3::x());
/// let mut closest = None;
/// let mut max_dist = 100.0;
/// let _ = bih.intersect_ray(
///     &ray,
///     &mut |ray: &Ray, id: &u32, max_dist: &mut f32, _: bool| {
///         match boxes[*id as usize].cast_local_ray(ray, *max_dist, true) {
///             Some(toi) => {
///                 *max_dist = toi;
///                 closest = Some(*id);
///                 true
///             }
///             None => false,
///         }
///     },
///     &mut max_dist,
///     false,
/// );
/// assert_eq!(closest, Some(0));
/// assert_eq!(max_dist, 9.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Bih {
    pub(super) bounds: Aabb,
    pub(super) nodes: Vec<BihNode>,
    pub(super) object_index: Vec<u32>,
}

impl Default for Bih {
    fn default() -> Self {
        Self::new()
    }
}

impl Bih {
    /// An empty tree: a root leaf with no primitive and zero-sized bounds.
    pub fn new() -> Self {
        Self {
            bounds: Aabb::new(Point::origin(), Point::origin()),
            nodes: vec![BihNode::EMPTY_LEAF],
            object_index: vec![],
        }
    }

    /// The AABB enclosing every primitive of this tree.
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// The number of primitives this tree was built over.
    #[inline]
    pub fn primitive_count(&self) -> usize {
        self.object_index.len()
    }

    /// Does this tree contain no primitive?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.object_index.is_empty()
    }

    /// The nodes of this tree. The root is at index 0.
    #[inline]
    pub fn nodes(&self) -> &[BihNode] {
        &self.nodes
    }

    /// The permutation of primitive indices referenced by the leaf ranges.
    #[inline]
    pub fn object_index(&self) -> &[u32] {
        &self.object_index
    }

    pub(super) fn leaf_objects(&self, first: u32, count: u32) -> &[u32] {
        let first = first as usize;
        self.object_index
            .get(first..first + count as usize)
            .unwrap_or(&[])
    }
}
