//! The symbolic footprint data model, snap resolution, and flattening.

pub mod error;
pub mod flatten;
pub mod model;
pub mod snap;

pub use error::ModelError;
pub use flatten::{flatten, FlatKind, FlatShape, ResolvedPoint, MAX_RECURSION_DEPTH};
pub use model::{
    CarveSide, Footprint, FootprintInstance, FootprintLibrary, HandleExpr, LayerAssignment,
    LayerType, Point, ShapeKind, ShapeNode, StackupLayer, TieDown, TABLEAU10,
};
pub use snap::{resolve_point, SnapResult};
