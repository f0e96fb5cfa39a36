use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContourError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}
