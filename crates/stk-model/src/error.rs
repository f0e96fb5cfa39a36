use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("footprint not found: {0}")]
    FootprintNotFound(String),

    #[error("shape not found: {0}")]
    ShapeNotFound(String),
}
