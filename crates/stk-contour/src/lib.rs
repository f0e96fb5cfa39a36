//! ContourBuilder: turns local-coordinate shape primitives
//! into 2D cross-sections ready for extrusion.

pub mod bezier;
pub mod cross_section;
pub mod error;
pub mod primitive;

pub use bezier::CurvePoint;
pub use cross_section::CrossSection;
pub use error::ContourError;
pub use primitive::{circle, line, polygon, rounded_rect, DEFAULT_RESOLUTION};
