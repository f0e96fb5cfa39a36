use thiserror::Error;

/// Per-layer and batch-level failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("layer {layer_id} failed: {source}")]
    Solid { layer_id: String, #[source] source: stk_solid::SolidError },

    #[error("layer {layer_id} toolpath generation failed: {source}")]
    Toolpath { layer_id: String, #[source] source: stk_toolpath::ToolpathError },

    #[error("layer {layer_id} export failed: {source}")]
    Export { layer_id: String, #[source] source: stk_export::ExportError },

    #[error("cancelled")]
    Cancelled,
}
