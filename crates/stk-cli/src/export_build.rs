//! Assembles a `stk_export::LayerExport` request from a computed layer:
//! the board outline, the flattened shape list converted to the
//! exporter's shape-kind enum, and (for STL) the manifold's encoded
//! bytes.

use std::collections::HashMap;

use stk_core::geometry::Point2D;
use stk_export::{CutDirection, ExportShape, FileType, LayerExport, MachiningType, OutlinePoint};
use stk_model::{CarveSide, FlatKind, FlatShape, Footprint, FootprintLibrary, LayerType, ShapeKind, StackupLayer};
use stk_pipeline::LayerComputation;

fn eval(expr: &str, scope: &HashMap<String, f64>) -> f64 {
    stk_core::expr::eval(expr, scope).unwrap_or(0.0)
}

fn outline_points(footprint: &Footprint, library: &FootprintLibrary, layer_id: &str, scope: &HashMap<String, f64>) -> Vec<OutlinePoint> {
    let Some(shape) = footprint.board_outline_for_layer(layer_id) else { return Vec::new() };
    let ShapeKind::BoardOutline { x, y, points } = &shape.kind else { return Vec::new() };
    let offset = Point2D::new(eval(x, scope), eval(y, scope));
    points
        .iter()
        .map(|p| {
            let resolved = stk_model::resolve_point(p, footprint, library, scope);
            OutlinePoint { pos: resolved.position + offset, handle_in: resolved.handle_in, handle_out: resolved.handle_out }
        })
        .collect()
}

/// Converts every flat shape assigned to `layer.id` into the exporter's
/// `ExportShape`, carrying its resolved absolute position and actual cut
/// depth. Text and SplitLine carry no
/// exportable 2D cut geometry and are skipped.
fn export_shapes(flat: &[FlatShape], layer: &StackupLayer, scope: &HashMap<String, f64>) -> Vec<ExportShape> {
    let thickness = eval(&layer.thickness, scope);
    flat.iter()
        .filter_map(|shape| {
            let assignment = shape.assigned_layers.get(&layer.id)?;
            let depth = match layer.layer_type {
                LayerType::Carved => eval(&assignment.depth, scope).min(thickness).max(0.0),
                LayerType::Cut => thickness,
            };
            let (x, y, angle) = (shape.absolute_x, shape.absolute_y, shape.absolute_rotation_deg);
            match &shape.kind {
                FlatKind::Circle { diameter } => Some(ExportShape::Circle { x, y, depth, diameter: *diameter }),
                FlatKind::Rect { width, height, .. } => Some(ExportShape::Rect { x, y, angle, depth, width: *width, height: *height }),
                FlatKind::Polygon { points } => Some(ExportShape::Polygon {
                    x,
                    y,
                    angle,
                    depth,
                    points: points.iter().map(|p| OutlinePoint { pos: p.pos, handle_in: p.handle_in, handle_out: p.handle_out }).collect(),
                }),
                FlatKind::Line { thickness: line_thickness, points } => Some(ExportShape::Line {
                    x,
                    y,
                    angle,
                    depth,
                    thickness: *line_thickness,
                    points: points.iter().map(|p| OutlinePoint { pos: p.pos, handle_in: p.handle_in, handle_out: p.handle_out }).collect(),
                }),
                FlatKind::Text { .. } | FlatKind::SplitLine { .. } => None,
            }
        })
        .collect()
}

/// Builds the export request for one layer/format pair. `flat` is the
/// Flattener output for the whole footprint (same list `compute_layer`
/// was given); recomputing it here avoids threading it back out of
/// `stk-pipeline`'s per-layer computation.
pub fn build_layer_export(
    footprint: &Footprint,
    library: &FootprintLibrary,
    layer: &StackupLayer,
    scope: &HashMap<String, f64>,
    computation: &LayerComputation,
    filepath: String,
    file_type: FileType,
) -> Result<LayerExport, stk_solid::SolidError> {
    let flat = stk_model::flatten(footprint, library, scope);
    let stl_content = match file_type {
        FileType::Stl => Some(computation.manifold.to_stl_binary(&layer.name).map_err(|_| stk_solid::SolidError::GeometryDegenerate(layer.id.clone()))?),
        _ => None,
    };

    Ok(LayerExport {
        filepath,
        file_type,
        machining_type: match layer.layer_type {
            LayerType::Cut => MachiningType::Cut,
            LayerType::Carved => MachiningType::Carved,
        },
        cut_direction: match layer.carve_side {
            CarveSide::Top => CutDirection::Top,
            CarveSide::Bottom => CutDirection::Bottom,
        },
        outline: outline_points(footprint, library, &layer.id, scope),
        shapes: export_shapes(&flat, layer, scope),
        layer_thickness: eval(&layer.thickness, scope),
        stl_content,
    })
}
