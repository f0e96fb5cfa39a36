//! The layer-batch API. Each layer's computation is a pure function of the
//! layer plus the shared footprint/library/scope, so batching dispatches
//! one `std::thread::scope` worker per layer and joins in stackup order.

use std::collections::HashMap;

use stk_model::{Footprint, FootprintLibrary, StackupLayer};
use stk_toolpath::CamConfig;

use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::layer::{compute_layer, LayerComputation};
use crate::progress::ProgressReporter;

/// One unit of batch work: a stackup layer computed against a specific
/// target footprint (the board, or any footprint the host wants a layer
/// computed for), placed at `bottom_z` in the global stack.
pub struct LayerJob<'a> {
    pub footprint: &'a Footprint,
    pub layer: &'a StackupLayer,
    pub bottom_z: f64,
}

/// Runs every job in `jobs` to completion, in parallel, and returns
/// results in the same order as `jobs`. A cancelled batch still returns one `Err` per job rather
/// than panicking or short-circuiting others already in flight.
pub fn compute_batch(
    jobs: &[LayerJob],
    library: &FootprintLibrary,
    scope: &HashMap<String, f64>,
    cam_config: CamConfig,
    reporter: &(dyn ProgressReporter),
    job_id: &str,
    cancel: &CancelToken,
) -> Vec<Result<LayerComputation, PipelineError>> {
    std::thread::scope(|scope_handle| {
        let mut handles = Vec::with_capacity(jobs.len());
        for (layer_index, job) in jobs.iter().enumerate() {
            let cc = cam_config; // CamConfig is Copy; give each worker its own value.
            handles.push(scope_handle.spawn(move || {
                compute_layer(job.footprint, library, job.layer, scope, cc, job.bottom_z, reporter, job_id, layer_index, cancel)
            }));
        }

        handles.into_iter().map(|h| h.join().unwrap_or(Err(PipelineError::Cancelled))).collect()
    })
}

/// Computes successive layers' `bottom_z` from their thicknesses, topmost
/// first, stacking
/// downward so layer 0 sits at the top of the assembly and the last
/// layer's bottom face sits at `stack_bottom` (0.0 by default).
pub fn stack_bottom_zs(layers: &[&StackupLayer], scope: &HashMap<String, f64>) -> Vec<f64> {
    let thicknesses: Vec<f64> = layers.iter().map(|l| stk_core::expr::eval(&l.thickness, scope).unwrap_or(0.0)).collect();
    let total: f64 = thicknesses.iter().sum();
    let mut z = total;
    let mut out = Vec::with_capacity(layers.len());
    for t in &thicknesses {
        z -= t;
        out.push(z);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_model::{CarveSide, LayerType};
    use std::collections::HashMap as Map;

    #[test]
    fn stack_bottom_zs_places_topmost_layer_highest() {
        let a = StackupLayer { id: "a".into(), name: "a".into(), layer_type: LayerType::Cut, thickness: "3".into(), color: "#000".into(), carve_side: CarveSide::Top };
        let b = StackupLayer { id: "b".into(), name: "b".into(), layer_type: LayerType::Cut, thickness: "2".into(), color: "#000".into(), carve_side: CarveSide::Top };
        let zs = stack_bottom_zs(&[&a, &b], &Map::new());
        assert_eq!(zs, vec![2.0, 0.0]);
    }

    #[test]
    fn empty_batch_returns_empty_results() {
        let library = FootprintLibrary::new();
        let cancel = CancelToken::new();
        let results = compute_batch(&[], &library, &Map::new(), CamConfig::default(), &crate::progress::NullReporter, "job", &cancel);
        assert!(results.is_empty());
    }
}
