//! Progress reporting: a `ProgressReporter` trait plus `NullReporter`
//! rather than a logging framework, since the host-facing contract here
//! is structured data (`{ id, layerIndex, message, percent }`), not text.

/// One progress update. `id` names the computation (e.g. the job or
/// footprint id) so a host driving several batches can demultiplex.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub id: String,
    pub layer_index: usize,
    pub message: String,
    pub percent: f64,
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for callers that don't need progress (library tests,
/// batch jobs run headless).
pub struct NullReporter;
impl ProgressReporter for NullReporter {
    fn report(&self, _event: ProgressEvent) {}
}

/// Reporter that forwards every event through a closure; handy for CLI
/// progress bars or test assertions without a full trait impl.
pub struct FnReporter<F: Fn(ProgressEvent) + Send + Sync>(pub F);
impl<F: Fn(ProgressEvent) + Send + Sync> ProgressReporter for FnReporter<F> {
    fn report(&self, event: ProgressEvent) {
        (self.0)(event);
    }
}
