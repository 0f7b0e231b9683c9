use std::io::{self, Read, Write};

use super::{Bih, BihNode};
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, DIM};

const LEAF_AXIS: u32 = 3;
const AXIS_SHIFT: u32 = 30;
const BVH2_FLAG: u32 = 1 << 29;
const OFFSET_MASK: u32 = !(7 << 29);
const WORDS_PER_NODE: usize = 3;

/// Error raised while decoding a [`Bih`] from its flat or persisted representation.
#[derive(thiserror::Error, Debug)]
pub enum BihIoError {
    /// The underlying reader failed, or the data ended early.
    #[error("I/O error while reading a BIH: {0}")]
    Io(#[from] io::Error),
    /// The tree bounds are not finite or have `mins > maxs`.
    #[error("the BIH bounds are invalid.")]
    InvalidBounds,
    /// The word count is zero or not a multiple of three.
    #[error("a BIH cannot be made of {0} words.")]
    TruncatedNode(usize),
    /// A child offset does not point to the start of a node.
    #[error("the child offset {0} is not a multiple of three.")]
    MisalignedOffset(u32),
    /// A node references a child past the end of the node array.
    #[error("the node {node} references the child {child} but the tree has only {len} nodes.")]
    NodeOutOfRange {
        /// The referencing node.
        node: u32,
        /// The referenced child.
        child: u32,
        /// The number of nodes of the tree.
        len: u32,
    },
    /// A leaf references entries past the end of the object index.
    #[error("the leaf {node} references objects {first}..{first}+{count} but only {len} exist.")]
    ObjectRangeOutOfBounds {
        /// The referencing leaf.
        node: u32,
        /// First referenced entry.
        first: u32,
        /// Number of referenced entries.
        count: u32,
        /// Length of the object index.
        len: u32,
    },
    /// A BVH2 node has the leaf axis.
    #[error("the node {0} has an invalid axis.")]
    InvalidAxis(u32),
    /// A node is reachable through more than one path.
    #[error("the node {0} is reachable more than once.")]
    SharedNode(u32),
    /// A node cannot be reached from the root.
    #[error("the node {0} is not reachable from the root.")]
    UnreachableNode(u32),
    /// An object index slot is not covered by exactly one leaf.
    #[error("the object slot {0} is covered by {1} leaves.")]
    ObjectCoverage(u32, u32),
    /// The object index is not a permutation of `0..len`.
    #[error("the object index {0} appears twice or is out of range.")]
    NotAPermutation(u32),
}

impl Bih {
    /// Encodes the nodes of this tree into a flat array of words.
    ///
    /// Node `i` occupies the words `3i..3i + 3`:
    /// - word 0: the axis in the two highest bits (`3` for leaves), the BVH2 flag in bit 29, and
    ///   a 29-bit offset: the first word of the left child (split nodes), of the child (BVH2
    ///   nodes), or the first object index entry (leaves). The right child of a split node
    ///   starts three words after its left child.
    /// - words 1 and 2: the bit patterns of the two clipping planes, or the entry count of a
    ///   leaf followed by a zero.
    ///
    /// A one-sided split node has an infinite clipping plane on its missing side.
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(self.nodes.len() * WORDS_PER_NODE);

        for node in &self.nodes {
            let encoded = match *node {
                BihNode::Inner {
                    axis,
                    left,
                    right,
                    clip_left,
                    clip_right,
                } => {
                    let left_slot = match (left, right) {
                        (Some(left), _) => left,
                        (None, Some(right)) => right.saturating_sub(1),
                        (None, None) => 0,
                    };
                    [
                        (axis as u32) << AXIS_SHIFT | encode_offset(left_slot),
                        clip_left.to_bits(),
                        clip_right.to_bits(),
                    ]
                }
                BihNode::Bvh2Cut {
                    axis,
                    child,
                    lo,
                    hi,
                } => [
                    (axis as u32) << AXIS_SHIFT | BVH2_FLAG | encode_offset(child),
                    lo.to_bits(),
                    hi.to_bits(),
                ],
                BihNode::Leaf { first, count } => {
                    [LEAF_AXIS << AXIS_SHIFT | (first & OFFSET_MASK), count, 0]
                }
            };
            words.extend_from_slice(&encoded);
        }

        words
    }

    /// Decodes a tree from its bounds, its flat word encoding (see [`Bih::to_words`]), and its
    /// object index.
    ///
    /// The result is checked with [`Bih::validate`].
    pub fn from_words(
        bounds: Aabb,
        words: &[u32],
        object_index: Vec<u32>,
    ) -> Result<Self, BihIoError> {
        let finite = bounds.mins.iter().chain(bounds.maxs.iter()).all(|e| e.is_finite());
        if !finite || !bounds.is_valid() {
            return Err(BihIoError::InvalidBounds);
        }

        if words.is_empty() || words.len() % WORDS_PER_NODE != 0 {
            return Err(BihIoError::TruncatedNode(words.len()));
        }

        let len = (words.len() / WORDS_PER_NODE) as u32;
        let check_child = |node: u32, child: u32| {
            if child < len {
                Ok(child)
            } else {
                Err(BihIoError::NodeOutOfRange { node, child, len })
            }
        };

        let mut nodes = Vec::with_capacity(len as usize);

        for (id, chunk) in words.chunks_exact(WORDS_PER_NODE).enumerate() {
            let id = id as u32;
            let axis = chunk[0] >> AXIS_SHIFT;
            let offset = chunk[0] & OFFSET_MASK;
            let is_bvh2 = chunk[0] & BVH2_FLAG != 0;

            let node = if axis == LEAF_AXIS {
                if is_bvh2 {
                    return Err(BihIoError::InvalidAxis(id));
                }
                let (first, count) = (offset, chunk[1]);
                if first as u64 + count as u64 > object_index.len() as u64 {
                    return Err(BihIoError::ObjectRangeOutOfBounds {
                        node: id,
                        first,
                        count,
                        len: object_index.len() as u32,
                    });
                }
                BihNode::Leaf { first, count }
            } else {
                if offset as usize % WORDS_PER_NODE != 0 {
                    return Err(BihIoError::MisalignedOffset(offset));
                }
                let slot = offset / WORDS_PER_NODE as u32;
                let lo = Real::from_bits(chunk[1]);
                let hi = Real::from_bits(chunk[2]);

                if is_bvh2 {
                    BihNode::Bvh2Cut {
                        axis: axis as u8,
                        child: check_child(id, slot)?,
                        lo,
                        hi,
                    }
                } else {
                    let left = if lo != -Real::INFINITY {
                        Some(check_child(id, slot)?)
                    } else {
                        None
                    };
                    let right = if hi != Real::INFINITY {
                        Some(check_child(id, slot + 1)?)
                    } else {
                        None
                    };
                    BihNode::Inner {
                        axis: axis as u8,
                        left,
                        right,
                        clip_left: lo,
                        clip_right: hi,
                    }
                }
            };

            nodes.push(node);
        }

        let bih = Bih {
            bounds,
            nodes,
            object_index,
        };
        bih.validate()?;
        Ok(bih)
    }

    /// Writes this tree in its little-endian binary format: the bounds (six `f32`), the word
    /// count and the words of [`Bih::to_words`], then the object count and the object index.
    pub fn write_to(&self, mut writer: impl Write) -> io::Result<()> {
        for coord in self.bounds.mins.iter().chain(self.bounds.maxs.iter()) {
            writer.write_all(&coord.to_le_bytes())?;
        }

        let words = self.to_words();
        write_u32s(&mut writer, &words)?;
        write_u32s(&mut writer, &self.object_index)
    }

    /// Reads a tree written by [`Bih::write_to`].
    ///
    /// Truncated data results in an [`io::ErrorKind::UnexpectedEof`] error; inconsistent data
    /// is rejected by [`Bih::from_words`].
    pub fn read_from(mut reader: impl Read) -> Result<Self, BihIoError> {
        let mut coords = [0.0; 2 * DIM];
        for coord in &mut coords {
            *coord = Real::from_bits(read_u32(&mut reader)?);
        }
        let bounds = Aabb::new(
            Point::new(coords[0], coords[1], coords[2]),
            Point::new(coords[3], coords[4], coords[5]),
        );

        let words = read_u32s(&mut reader)?;
        let object_index = read_u32s(&mut reader)?;
        Self::from_words(bounds, &words, object_index)
    }
}

fn encode_offset(slot: u32) -> u32 {
    debug_assert!(slot as u64 * 3 <= OFFSET_MASK as u64);
    (slot * WORDS_PER_NODE as u32) & OFFSET_MASK
}

fn write_u32s(writer: &mut impl Write, values: &[u32]) -> io::Result<()> {
    writer.write_all(&(values.len() as u32).to_le_bytes())?;
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut bytes = [0; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Reads a length-prefixed array without trusting the length for the allocation size.
fn read_u32s(reader: &mut impl Read) -> io::Result<Vec<u32>> {
    let len = read_u32(reader)? as u64;
    let mut bytes = Vec::new();
    let _ = reader.by_ref().take(len * 4).read_to_end(&mut bytes)?;

    if bytes.len() as u64 != len * 4 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
