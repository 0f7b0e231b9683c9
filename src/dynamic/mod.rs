//! Dynamic world geometry: models inserted and removed at runtime, queried for line of sight,
//! ground height, area and liquid.

pub use self::callbacks::{
    DynamicTreeAreaInfoCallback, DynamicTreeIntersectionCallback, DynamicTreeLocationInfoCallback,
};
pub use self::dyn_tree::{DynTree, DynamicTreeConfig, CHECK_TREE_PERIOD};
pub use self::dynamic_map_tree::DynamicMapTree;
pub use self::model::{
    AreaAndLiquidData, AreaDetails, AreaInfo, GameObjectModel, LiquidInfo, LocationInfo,
    ModelId, ModelIgnoreFlags, INVALID_HEIGHT,
};

mod callbacks;
mod dyn_tree;
mod dynamic_map_tree;
mod model;
