//! Per-layer orchestration: flatten,
//! compute the boolean manifold, subtract split kerfs, split the result
//! into parts, and generate the pocketing/profiling toolpath — all for
//! one stackup layer, with progress reporting and cooperative
//! cancellation.

use std::collections::HashMap;

use stk_core::geometry::Point2D;
use stk_model::{Footprint, FootprintLibrary, ShapeKind, StackupLayer};
use stk_solid::{LayerResult, Manifold};
use stk_split::SplitPart;
use stk_toolpath::{CamConfig, Point3, ToolMove};

use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::progress::{ProgressEvent, ProgressReporter};

fn eval(expr: &str, scope: &HashMap<String, f64>) -> f64 {
    stk_core::expr::eval(expr, scope).unwrap_or(0.0)
}

/// Everything computed for one stackup layer.
pub struct LayerComputation {
    pub layer_id: String,
    pub manifold: Manifold,
    pub signed_volume: f64,
    pub toolpath: Vec<ToolMove>,
    /// Non-empty only when the footprint carries at least one SplitLine
    /// assigned to this layer.
    pub split_parts: Vec<SplitPart>,
}

fn emit(reporter: &dyn ProgressReporter, job_id: &str, layer_index: usize, message: &str, percent: f64) {
    reporter.report(ProgressEvent { id: job_id.to_string(), layer_index, message: message.to_string(), percent });
}

/// Absolute-coordinate board outline points for this layer, used both as
/// BooleanEngine's base extrusion (inside `stk_solid::compute_layer`) and
/// as Pocketer's profile-cut input. Returns `None`
/// when the footprint isn't a board or carries no BoardOutline.
fn board_outline_points(footprint: &Footprint, library: &FootprintLibrary, layer_id: &str, scope: &HashMap<String, f64>) -> Option<Vec<Point2D>> {
    if !footprint.is_board {
        return None;
    }
    let shape = footprint.board_outline_for_layer(layer_id)?;
    let ShapeKind::BoardOutline { x, y, points } = &shape.kind else { return None };
    if points.is_empty() {
        return None;
    }
    let offset = Point2D::new(eval(x, scope), eval(y, scope));
    Some(
        points
            .iter()
            .map(|p| stk_model::resolve_point(p, footprint, library, scope).position + offset)
            .collect(),
    )
}

/// Computes everything for `layer` against `footprint`: the boolean
/// manifold (with split kerfs already subtracted), its post-split parts,
/// and its pocketing toolpath. `bottom_z` places this
/// layer's local Z origin in the global stack for the toolpath; `cancel`
/// is polled between steps.
pub fn compute_layer(
    footprint: &Footprint,
    library: &FootprintLibrary,
    layer: &StackupLayer,
    scope: &HashMap<String, f64>,
    cam_config: CamConfig,
    bottom_z: f64,
    reporter: &dyn ProgressReporter,
    job_id: &str,
    layer_index: usize,
    cancel: &CancelToken,
) -> Result<LayerComputation, PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    emit(reporter, job_id, layer_index, "flattening footprint", 0.0);
    let flat = stk_model::flatten(footprint, library, scope);
    let kerfs = stk_split::kerfs_for_layer(&flat, &layer.id, scope);

    emit(reporter, job_id, layer_index, "composing boolean manifold", 0.2);
    let poll = cancel.as_poll();
    let LayerResult { manifold, signed_volume } =
        stk_solid::compute_layer(footprint, library, layer, flat.clone(), scope, &kerfs, &poll)
            .map_err(|source| match source {
                stk_solid::SolidError::Cancelled => PipelineError::Cancelled,
                other => PipelineError::Solid { layer_id: layer.id.clone(), source: other },
            })?;

    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    emit(reporter, job_id, layer_index, "generating toolpath", 0.6);
    let thickness = eval(&layer.thickness, scope);
    let board_outline = board_outline_points(footprint, library, &layer.id, scope);
    let toolpath_input = stk_toolpath::PocketInput {
        flat: &flat,
        layer_id: layer.id.clone(),
        thickness,
        stock_top: thickness,
        scope: scope.clone(),
        bottom_z,
        config: cam_config,
        board_outline,
    };
    let toolpath = stk_toolpath::generate(&toolpath_input)
        .map_err(|source| PipelineError::Toolpath { layer_id: layer.id.clone(), source })?;

    let has_split_lines = flat.iter().any(|s| {
        matches!(s.kind, stk_model::FlatKind::SplitLine { .. }) && s.assigned_layers.contains_key(&layer.id)
    });
    let split_parts = if has_split_lines {
        emit(reporter, job_id, layer_index, "splitting into parts", 0.85);
        stk_split::decompose_by_volume(&manifold)
    } else {
        Vec::new()
    };

    emit(reporter, job_id, layer_index, "layer complete", 1.0);
    Ok(LayerComputation { layer_id: layer.id.clone(), manifold, signed_volume, toolpath, split_parts })
}

/// Convenience for callers that only need the toolpath's travel-move
/// endpoints (e.g. a preview renderer), flattening every move's points
/// into one sequence without the `Travel`/`Cut` distinction.
pub fn flatten_toolpath_points(moves: &[ToolMove]) -> Vec<Point3> {
    moves
        .iter()
        .flat_map(|m| match m {
            ToolMove::Travel(pts) | ToolMove::Cut(pts) => pts.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_model::{CarveSide, LayerAssignment, LayerType, Point, ShapeNode};
    use std::collections::HashMap as Map;

    fn board_outline_shape(points: &[(f64, f64)]) -> ShapeNode {
        let pts = points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Point { id: format!("o{i}"), x: x.to_string(), y: y.to_string(), handle_in: None, handle_out: None, snap_to: None })
            .collect();
        ShapeNode {
            id: "outline".into(),
            name: "outline".into(),
            locked: false,
            assigned_layers: Map::new(),
            kind: ShapeKind::BoardOutline { x: "0".into(), y: "0".into(), points: pts },
        }
    }

    #[test]
    fn computes_manifold_and_toolpath_for_a_single_through_cut() {
        let mut assigned = Map::new();
        assigned.insert("layer1".to_string(), LayerAssignment { depth: "3".into(), endmill_radius: "0".into(), input_fillet: "0".into() });
        let circle = ShapeNode {
            id: "c1".into(),
            name: "circle".into(),
            locked: false,
            assigned_layers: assigned,
            kind: ShapeKind::Circle { x: "0".into(), y: "0".into(), diameter: "10".into() },
        };
        let footprint = Footprint {
            id: "board".into(),
            name: "board".into(),
            is_board: true,
            board_outline_assignments: Map::new(),
            shapes: vec![board_outline_shape(&[(-20.0, -20.0), (20.0, -20.0), (20.0, 20.0), (-20.0, 20.0)]), circle],
        };
        let layer = StackupLayer {
            id: "layer1".into(),
            name: "layer1".into(),
            layer_type: LayerType::Cut,
            thickness: "3".into(),
            color: "#1f77b4".into(),
            carve_side: CarveSide::Top,
        };
        let library = FootprintLibrary::new();
        let scope = Map::new();
        let cancel = CancelToken::new();

        let result = compute_layer(
            &footprint,
            &library,
            &layer,
            &scope,
            CamConfig::default(),
            0.0,
            &crate::progress::NullReporter,
            "job1",
            0,
            &cancel,
        )
        .unwrap();

        assert!(result.signed_volume > 0.0);
        assert!(!result.toolpath.is_empty());
        assert!(result.split_parts.is_empty());
    }

    #[test]
    fn cancelled_token_aborts_before_work_starts() {
        let footprint = Footprint { id: "f".into(), name: "f".into(), is_board: false, board_outline_assignments: Map::new(), shapes: vec![] };
        let layer = StackupLayer { id: "l".into(), name: "l".into(), layer_type: LayerType::Cut, thickness: "1".into(), color: "#000".into(), carve_side: CarveSide::Top };
        let library = FootprintLibrary::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = compute_layer(&footprint, &library, &layer, &Map::new(), CamConfig::default(), 0.0, &crate::progress::NullReporter, "job1", 0, &cancel);
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
