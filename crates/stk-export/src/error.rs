#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("STL export requested but no stl_content was supplied")]
    MissingStlContent,
    #[error("encoding failed: {0}")]
    Encoding(String),
    #[error("exported geometry is degenerate: {0}")]
    Degenerate(String),
}
