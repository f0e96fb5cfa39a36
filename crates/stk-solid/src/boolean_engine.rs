//! BooleanEngine: the per-layer driver that turns a
//! flattened footprint into a single manifold.

use std::collections::HashMap;

use stk_contour::CrossSection;
use stk_core::geometry::{Rect, Transform2D, Vector2D};
use stk_model::{CarveSide, FlatKind, FlatShape, Footprint, FootprintLibrary, LayerType, ShapeKind, StackupLayer};

use crate::error::SolidError;
use crate::manifold::Manifold;
use crate::tool_builder::{self, TileMode, ToolProfile};

const ENDMILL_SAFETY_EPSILON: f64 = 0.05;
const BOARD_OUTLINE_MARGIN: f64 = 10.0;
const DEFAULT_ARC_STEPS: usize = 12;

fn eval(expr: &str, scope: &HashMap<String, f64>) -> f64 {
    stk_core::expr::eval(expr, scope).unwrap_or(0.0)
}

pub struct LayerResult {
    pub manifold: Manifold,
    pub signed_volume: f64,
}

struct ExecutionItem {
    id: String,
    members: Vec<FlatShape>,
}

/// Groups `flat` (in original shape-list order, so list-earlier shapes are
/// processed — and recorded into `processed_cuts` — before list-later ones)
/// into execution items: shapes sharing a `unionId` merge into one item;
/// every other shape is its own item. Processing in list order, rather than
/// reversed, is what lets a list-later, shallower cut see the list-earlier,
/// deeper cut it overlaps as already `processed_cuts`-recorded and heal it
/// via the restorative path instead of being overwritten by it.
fn partition_into_items(flat: Vec<FlatShape>, layer_id: &str) -> Vec<ExecutionItem> {
    let mut order: Vec<String> = Vec::new();
    let mut items: HashMap<String, ExecutionItem> = HashMap::new();

    for shape in flat {
        if !shape.assigned_layers.contains_key(layer_id) {
            continue;
        }
        if matches!(shape.kind, FlatKind::Text { .. } | FlatKind::SplitLine { .. }) {
            continue; // Text carries no cut geometry; SplitLine is handled in step 9.
        }
        let key = shape.union_id.clone().unwrap_or_else(|| shape.shape_id.clone());
        if !items.contains_key(&key) {
            order.push(key.clone());
            items.insert(key.clone(), ExecutionItem { id: key.clone(), members: Vec::new() });
        }
        items.get_mut(&key).unwrap().members.push(shape);
    }

    order.into_iter().map(|k| items.remove(&k).unwrap()).collect()
}

fn local_cross_section(kind: &FlatKind) -> Option<CrossSection> {
    match kind {
        FlatKind::Circle { diameter } => Some(stk_contour::circle(*diameter, stk_contour::DEFAULT_RESOLUTION)),
        FlatKind::Rect { width, height, corner_radius } => {
            Some(stk_contour::rounded_rect(*width, *height, *corner_radius, stk_contour::DEFAULT_RESOLUTION))
        }
        FlatKind::Polygon { points } => {
            let pts: Vec<stk_contour::CurvePoint> =
                points.iter().map(|p| stk_contour::CurvePoint { pos: p.pos, handle_in: p.handle_in, handle_out: p.handle_out }).collect();
            Some(stk_contour::polygon(&pts, stk_contour::DEFAULT_RESOLUTION))
        }
        FlatKind::Line { thickness, points } => {
            let pts: Vec<stk_contour::CurvePoint> =
                points.iter().map(|p| stk_contour::CurvePoint { pos: p.pos, handle_in: p.handle_in, handle_out: p.handle_out }).collect();
            stk_contour::line(*thickness, &pts, stk_contour::DEFAULT_RESOLUTION).ok()
        }
        FlatKind::Text { .. } | FlatKind::SplitLine { .. } => None,
    }
}

fn item_cross_section(item: &ExecutionItem) -> CrossSection {
    let mut merged = CrossSection::empty();
    for shape in &item.members {
        let Some(local) = local_cross_section(&shape.kind) else { continue };
        let transform = Transform2D::new(Vector2D::new(shape.absolute_x, shape.absolute_y), shape.absolute_rotation_deg);
        merged = merged.union(&local.transformed(&transform));
    }
    merged
}

fn board_outline_cross_section(
    footprint: &Footprint,
    library: &FootprintLibrary,
    layer_id: &str,
    scope: &HashMap<String, f64>,
) -> Option<CrossSection> {
    let shape = footprint.board_outline_for_layer(layer_id)?;
    let ShapeKind::BoardOutline { x, y, points } = &shape.kind else { return None };
    if points.is_empty() {
        return None;
    }
    let resolved: Vec<_> = points.iter().map(|p| stk_model::resolve_point(p, footprint, library, scope)).collect();
    let offset = Vector2D::new(eval(x, scope), eval(y, scope));
    let absolute: Vec<_> = resolved.iter().map(|r| r.position + offset).collect();
    Some(CrossSection::from_points(&absolute))
}

fn padded_bbox(flat: &[FlatShape]) -> CrossSection {
    if flat.is_empty() {
        return CrossSection::empty();
    }
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for s in flat {
        min_x = min_x.min(s.absolute_x);
        min_y = min_y.min(s.absolute_y);
        max_x = max_x.max(s.absolute_x);
        max_y = max_y.max(s.absolute_y);
    }
    let rect = Rect::new(stk_core::geometry::Point2D::new(min_x, min_y), max_x - min_x, max_y - min_y).padded(BOARD_OUTLINE_MARGIN);
    CrossSection::from_points(&[
        stk_core::geometry::Point2D::new(rect.min_x(), rect.min_y()),
        stk_core::geometry::Point2D::new(rect.max_x(), rect.min_y()),
        stk_core::geometry::Point2D::new(rect.max_x(), rect.max_y()),
        stk_core::geometry::Point2D::new(rect.min_x(), rect.max_y()),
    ])
}

struct ProcessedCut {
    depth: f64,
    cross_section: CrossSection,
}

/// Computes one stackup layer's manifold. `flat` is the
/// Flattener's output for the whole footprint tree (not yet filtered to
/// this layer); `split_kerfs` are already-placed, full-thickness kerf
/// cross-sections from SplitEngine, subtracted in step 9. `cancel` is
/// polled between boolean steps; it returning `true` aborts with `Cancelled` before the
/// next subtraction starts.
pub fn compute_layer(
    footprint: &Footprint,
    library: &FootprintLibrary,
    layer: &StackupLayer,
    flat: Vec<FlatShape>,
    scope: &HashMap<String, f64>,
    split_kerfs: &[CrossSection],
    cancel: &dyn Fn() -> bool,
) -> Result<LayerResult, SolidError> {
    let thickness = eval(&layer.thickness, scope);
    let half = thickness / 2.0;

    let base_cs = if footprint.is_board {
        board_outline_cross_section(footprint, library, &layer.id, scope).unwrap_or_else(|| padded_bbox(&flat))
    } else {
        padded_bbox(&flat)
    };

    let boundary_mask = Manifold::from_cross_section(&base_cs, -half, half);
    let mut solid = Manifold::from_cross_section(&base_cs, -half, half);

    // Process in original shape-list order: list-earlier (and so far deeper)
    // cuts are applied, and recorded in `processed_cuts`, before list-later
    // ones, so a later shallower cut can detect and heal an earlier deeper
    // one via the restorative path (spec.md §4.6 step 6 / Scenario 3).
    let items = partition_into_items(flat, &layer.id);

    let mut processed_cuts: Vec<ProcessedCut> = Vec::new();

    for item in &items {
        if cancel() {
            return Err(SolidError::Cancelled);
        }
        let assignment = item.members.iter().find_map(|m| m.assigned_layers.get(&layer.id));
        let Some(assignment) = assignment else { continue };

        let actual_depth = match layer.layer_type {
            LayerType::Carved => eval(&assignment.depth, scope).min(thickness).max(0.0),
            LayerType::Cut => thickness,
        };
        let input_fillet = eval(&assignment.input_fillet, scope).max(0.0);
        let raw_endmill = eval(&assignment.endmill_radius, scope).max(0.0);

        let merged_cs = item_cross_section(item);
        let endmill_radius = if item.members.len() > 1 {
            raw_endmill.min(actual_depth)
        } else if let Some((hw, hh)) = merged_cs.half_extents() {
            raw_endmill.min(hw.min(hh) - ENDMILL_SAFETY_EPSILON).max(0.0)
        } else {
            raw_endmill
        };

        for island in merged_cs.decompose() {
            if island.is_empty() {
                continue;
            }
            if cancel() {
                return Err(SolidError::Cancelled);
            }
            let is_partial = actual_depth < thickness - 1e-9;
            let restorative = processed_cuts
                .iter()
                .any(|cut| cut.depth > actual_depth + 1e-9 && !cut.cross_section.intersection(&island).is_empty());

            let before = solid.clone();
            let wants_tool_profile = (endmill_radius > 0.0 && is_partial) || input_fillet > 0.0;

            let candidate = if restorative && is_partial {
                apply_restorative_partial(&solid, &island, layer.carve_side, thickness, actual_depth, input_fillet)
            } else if !wants_tool_profile {
                apply_simple_prism(&solid, &island, layer.carve_side, thickness, actual_depth)
            } else {
                let profile = ToolProfile { top_chamfer: input_fillet, bottom_fillet: endmill_radius, depth: actual_depth, arc_steps: DEFAULT_ARC_STEPS };
                match tool_builder::build(&island, profile, TileMode::Strict, &item.id) {
                    Ok(tool_body) => {
                        let placed = place_tool_body(&tool_body, layer.carve_side, thickness);
                        solid.difference(&placed)
                    }
                    Err(_) => apply_simple_prism(&solid, &island, layer.carve_side, thickness, actual_depth),
                }
            };

            solid = if candidate.is_empty() && !before.is_empty() { before } else { candidate };
            processed_cuts.push(ProcessedCut { depth: actual_depth, cross_section: island });
        }
    }

    solid = solid.intersection(&boundary_mask);

    for kerf in split_kerfs {
        let kerf_solid = Manifold::from_cross_section(kerf, -half, half);
        solid = solid.difference(&kerf_solid);
    }

    solid.require_non_degenerate(&footprint.id)?;
    let signed_volume = solid.signed_volume();
    Ok(LayerResult { manifold: solid, signed_volume })
}

fn apply_simple_prism(solid: &Manifold, island: &CrossSection, carve_side: CarveSide, thickness: f64, actual_depth: f64) -> Manifold {
    let half = thickness / 2.0;
    let (z_bottom, z_top) = match carve_side {
        CarveSide::Top => (half - actual_depth, half),
        CarveSide::Bottom => (-half, -half + actual_depth),
    };
    let cut = Manifold::from_cross_section(island, z_bottom, z_top);
    solid.difference(&cut)
}

fn apply_restorative_partial(
    solid: &Manifold,
    island: &CrossSection,
    carve_side: CarveSide,
    thickness: f64,
    actual_depth: f64,
    input_fillet: f64,
) -> Manifold {
    let half = thickness / 2.0;
    let through = Manifold::from_cross_section(island, -half, half);
    let cut = solid.difference(&through);

    let slab_height = (thickness - actual_depth) + if input_fillet > 0.0 { input_fillet } else { 0.0 };
    let slab_height = slab_height.min(thickness);
    let (z_bottom, z_top) = match carve_side {
        CarveSide::Top => (-half, -half + slab_height),
        CarveSide::Bottom => (half - slab_height, half),
    };
    let slab = Manifold::from_cross_section(island, z_bottom, z_top);
    cut.union(&slab)
}

fn place_tool_body(tool_body: &Manifold, carve_side: CarveSide, thickness: f64) -> Manifold {
    let half = thickness / 2.0;
    match carve_side {
        CarveSide::Top => tool_body.translate(0.0, 0.0, half),
        CarveSide::Bottom => tool_body.mirror_z().translate(0.0, 0.0, -half),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_model::{LayerAssignment, Point, ShapeNode};
    use std::collections::HashMap as Map;

    fn board_outline(points: &[(f64, f64)]) -> ShapeNode {
        let pts = points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Point {
                id: format!("o{i}"),
                x: x.to_string(),
                y: y.to_string(),
                handle_in: None,
                handle_out: None,
                snap_to: None,
            })
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
    fn circle_through_cut_matches_scenario_1_volume() {
        let mut assigned = Map::new();
        assigned.insert(
            "layer1".to_string(),
            LayerAssignment { depth: "3".into(), endmill_radius: "0".into(), input_fillet: "0".into() },
        );
        let circle = ShapeNode {
            id: "c1".into(),
            name: "circle".into(),
            locked: false,
            assigned_layers: assigned,
            kind: ShapeKind::Circle { x: "0".into(), y: "0".into(), diameter: "D".into() },
        };
        let footprint = Footprint {
            id: "board".into(),
            name: "board".into(),
            is_board: true,
            board_outline_assignments: Map::new(),
            shapes: vec![board_outline(&[(-20.0, -20.0), (20.0, -20.0), (20.0, 20.0), (-20.0, 20.0)]), circle],
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
        let mut scope = Map::new();
        scope.insert("D".to_string(), 10.0);

        let flat = stk_model::flatten(&footprint, &library, &scope);
        let result = compute_layer(&footprint, &library, &layer, flat, &scope, &[], &|| false).unwrap();

        let expected = 40.0 * 40.0 * 3.0 - std::f64::consts::PI * 5.0 * 5.0 * 3.0;
        assert!((result.signed_volume - expected).abs() / expected < 0.02);
    }
}
