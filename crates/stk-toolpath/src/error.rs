use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolpathError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}
