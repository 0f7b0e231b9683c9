//! Spatial partitioning tools.

pub use self::bih::{Bih, BihBuildParams, BihBuildStats, BihIoError, BihNode};
pub use self::bih_wrap::{BihWrap, SpatialObject};
pub use self::regular_grid::{Cell, RegularGrid2D, CELL_NUMBER, CELL_SIZE, HGRID_MAP_SIZE};
pub use self::visitor::{PointVisitor, RayVisitor};

mod bih;
mod bih_wrap;
mod regular_grid;
mod visitor;
