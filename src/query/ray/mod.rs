//! Ray-casting related definitions and implementations.

#[doc(inline)]
pub use self::ray::{Ray, RayCast};

#[doc(hidden)]
pub mod ray;
mod ray_aabb;
