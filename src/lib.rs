/*!
dyntree3d
=========

**dyntree3d** answers ray and point queries against a large, dynamically
changing set of 3D models (buildings, doodads, terrain chunks) for a
real-time simulation.

The structures are layered, leaves first:

* [`bounding_volume::Aabb`]: axis-aligned boxes.
* [`partitioning::Bih`]: a static bounding interval hierarchy built over a
  snapshot of primitive boxes.
* [`partitioning::BihWrap`]: a thread-safe wrapper buffering inserts and
  removals and rebuilding its tree lazily.
* [`partitioning::RegularGrid2D`]: a 64×64 grid of lazily created wrappers
  covering the world.
* [`dynamic::DynTree`]: the grid plus a periodic rebalance timer.
* [`dynamic::DynamicMapTree`]: line-of-sight, height, area and liquid queries
  on top of everything else.

*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)] // This usually makes it way more verbose that it could be.
#![deny(unused_qualifications)]

extern crate alloc;

#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;
#[macro_use]
extern crate approx;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod dynamic;
pub mod partitioning;
pub mod query;
pub mod utils;

mod real {
    /// The scalar type used throughout this crate.
    pub use f32 as Real;
}

/// Aliases for the mathematical types used by this crate.
pub mod math {
    pub use super::real::*;
    pub use na::{Point3, Vector3};

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// Tolerance under which a length or a direction component is treated as zero.
    pub const FUZZY_EPSILON: Real = 1.0e-6;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;
}
