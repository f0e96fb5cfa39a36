//! Orchestration: wires ParamResolver, Flattener,
//! BooleanEngine, ToolBuilder, Pocketer, and SplitEngine into one
//! per-layer computation, plus a layer-batch API that dispatches
//! independent layers across worker threads with ordered progress
//! reporting and cooperative cancellation.

pub mod batch;
pub mod cancel;
pub mod error;
pub mod layer;
pub mod progress;
pub mod resolve;

pub use batch::{compute_batch, stack_bottom_zs, LayerJob};
pub use cancel::CancelToken;
pub use error::PipelineError;
pub use layer::{compute_layer, flatten_toolpath_points, LayerComputation};
pub use progress::{FnReporter, NullReporter, ProgressEvent, ProgressReporter};
pub use resolve::resolve_scope;
