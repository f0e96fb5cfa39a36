pub mod error;
pub mod expr;
pub mod geometry;
pub mod params;
pub mod units;

pub use error::Error;
pub use expr::{eval, EvalError};
pub use geometry::{Point2D, Transform2D, Vector2D};
pub use params::{resolve_parameters, Parameter, ParamError, ResolvedParameter};
pub use units::Unit;
