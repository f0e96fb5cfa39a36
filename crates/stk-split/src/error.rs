#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("split line requires at least two distinct endpoints")]
    DegenerateLine,
    #[error("kerf cross-section collapsed to nothing: {0}")]
    EmptyKerf(String),
}
