//! BooleanEngine and ToolBuilder: the 3D boolean
//! pass that turns a flattened footprint into a per-layer manifold.

pub mod boolean_engine;
pub mod error;
pub mod manifold;
pub mod tiler;
pub mod tool_builder;

pub use boolean_engine::{compute_layer, LayerResult};
pub use error::SolidError;
pub use manifold::Manifold;
pub use tiler::RingPoint;
pub use tool_builder::{build as build_tool_body, TileMode, ToolProfile};
