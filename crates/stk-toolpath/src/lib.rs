//! Pocketer: depth-map construction and Z-layered
//! concentric pocketing/profiling/facing toolpath generation.

pub mod depth_map;
pub mod error;
pub mod optimize;
pub mod point3;
pub mod pocketer;

pub use depth_map::Region;
pub use error::ToolpathError;
pub use optimize::optimize_rapid_order;
pub use point3::{Point3, Polyline3, ToolMove};
pub use pocketer::{generate, CamConfig, PocketInput};
