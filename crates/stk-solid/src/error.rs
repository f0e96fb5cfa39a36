use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolidError {
    #[error("degenerate geometry: {0}")]
    GeometryDegenerate(String),

    #[error("tool build failed for shape {shape}: {reason}")]
    ToolBuildFailure { shape: String, reason: String },

    #[error("cancelled")]
    Cancelled,
}
