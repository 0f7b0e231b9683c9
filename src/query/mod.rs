//! Non-persistent geometric queries.
//!
//! Only ray-casting lives here: the world trees narrow a query down to a few candidate
//! models, and models use [`RayCast`] (or their own math) for the final test.

pub use self::ray::{Ray, RayCast};

mod ray;
