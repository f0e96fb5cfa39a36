use thiserror::Error;

/// Shared error taxonomy. Per-parameter and per-shape errors
/// are non-fatal and surfaced through the progress stream rather than
/// aborting a whole layer; see `stk-pipeline` for propagation policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("expression error: {0}")]
    Expression(#[from] crate::expr::EvalError),

    #[error("dependency cycle among parameters: {0:?}")]
    Cycle(Vec<String>),

    #[error("broken reference: {0}")]
    Reference(String),

    #[error("geometry degenerate: {0}")]
    GeometryDegenerate(String),

    #[error("tool build failed for {shape}: {reason}")]
    ToolBuildFailure { shape: String, reason: String },

    #[error("cancelled")]
    Cancelled,

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display_lists_members() {
        let err = Error::Cycle(vec!["a".into(), "b".into()]);
        assert!(err.to_string().contains('a'));
    }

    #[test]
    fn tool_build_failure_names_shape() {
        let err = Error::ToolBuildFailure {
            shape: "circle_1".into(),
            reason: "no feasible seam".into(),
        };
        assert!(err.to_string().contains("circle_1"));
    }
}
