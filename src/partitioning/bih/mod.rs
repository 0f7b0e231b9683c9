//! Bounding interval hierarchy.
//!
//! A [`Bih`] is a static kd-tree variant built once over a snapshot of primitive AABBs. Each
//! split node stores the tightened extents of both children on the split axis, which lets
//! queries skip empty space. Mutable sets of primitives are handled one level up, by
//! [`BihWrap`](crate::partitioning::BihWrap), which rebuilds the tree lazily.

pub use bih_io::BihIoError;
pub use bih_tree::{Bih, BihBuildParams, BihBuildStats, BihNode, MAX_STACK_SIZE};

mod bih_build;
mod bih_io;
mod bih_traverse;
mod bih_tree;
mod bih_validation;
