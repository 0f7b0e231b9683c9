//! Various unsorted utilities.

pub use self::time_tracker::TimeTracker;

pub mod hashmap;
mod time_tracker;
