//! Pocketer: turns a depth map into ordered Z-layered
//! concentric toolpaths — facing, pocket clearing, and profile-cut moat
//! passes — bracketed by travel moves.
//!
//! Coordinate frame: local Z = 0 at this layer's bottom face, local
//! Z = `thickness` at its top (carved) face, matching the center-at-zero
//! convention BooleanEngine uses shifted so 0 is the bottom rather than
//! the midplane. `stock_top` is also in this local frame and may exceed
//! `thickness` when there's raw stock above the final surface to face
//! away first. The caller's `bottom_z` places local zero in the global
//! stack.

use std::collections::HashMap;

use stk_core::geometry::Point2D;
use stk_contour::CrossSection;
use stk_model::FlatShape;

use crate::depth_map::{self, Region};
use crate::error::ToolpathError;
use crate::point3::{Point3, ToolMove};

/// Safe-Z margin above the highest stock surface.
const SAFE_Z_MARGIN: f64 = 5.0;
/// Extra moat depth past full thickness for chuck breakthrough.
const BREAKTHROUGH: f64 = 0.5;
/// Facing/moat bounding-rect margin as a multiple of tool diameter.
const FACING_MARGIN_DIAMETERS: f64 = 2.0;
/// Chuck-clearance moat's outward margin past the chuck radius.
const CHUCK_MOAT_MARGIN: f64 = 2.0;

/// CAM parameters for one pocketing run: tool diameter, step-down,
/// step-over, and chuck-clearance margin.
#[derive(Debug, Clone, Copy)]
pub struct CamConfig {
    pub tool_diameter: f64,
    pub step_down: f64,
    pub step_over: f64,
    /// Radius of the holding fixture the profile-cut moat must clear.
    pub chuck_clearance: f64,
}

impl Default for CamConfig {
    fn default() -> Self {
        CamConfig { tool_diameter: 3.175, step_down: 1.0, step_over: 1.5, chuck_clearance: 0.0 }
    }
}

/// Everything Pocketer needs for one layer.
pub struct PocketInput<'a> {
    pub flat: &'a [FlatShape],
    pub layer_id: String,
    pub thickness: f64,
    pub stock_top: f64,
    pub scope: HashMap<String, f64>,
    pub bottom_z: f64,
    pub config: CamConfig,
    /// Absolute-coordinate board outline, when profiling is requested.
    pub board_outline: Option<Vec<Point2D>>,
}

/// Generates the ordered toolpath for one layer: facing (if stock sits
/// above the final surface), pocket clearing per region, then the
/// profile-cut moat.
pub fn generate(input: &PocketInput) -> Result<Vec<ToolMove>, ToolpathError> {
    let regions = depth_map::build(input.flat, &input.layer_id, input.thickness, &input.scope);
    let safe_local = input.stock_top.max(input.thickness) + SAFE_Z_MARGIN;
    let safe_z = input.bottom_z + safe_local;

    let mut moves = Vec::new();

    if input.stock_top > input.thickness + 1e-9 {
        facing_passes(input, safe_z, &mut moves);
    }

    pocket_passes(input, &regions, safe_z, &mut moves);

    if let Some(outline) = &input.board_outline {
        profile_passes(input, outline, safe_z, &mut moves);
    }

    crate::optimize::optimize_rapid_order(&mut moves);

    Ok(moves)
}

/// `depth_val` samples from 0 up to and including `end`, stepping by
/// `step`.
fn levels(end: f64, step: f64) -> Vec<f64> {
    if end <= 1e-9 {
        return vec![0.0];
    }
    let step = step.max(1e-6);
    let mut v = Vec::new();
    let mut z = step.min(end);
    while z < end - 1e-9 {
        v.push(z);
        z += step;
    }
    v.push(end);
    v
}

fn bounding_cross_section(flat: &[FlatShape], margin: f64) -> Option<CrossSection> {
    if flat.is_empty() {
        return None;
    }
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for s in flat {
        min_x = min_x.min(s.absolute_x);
        min_y = min_y.min(s.absolute_y);
        max_x = max_x.max(s.absolute_x);
        max_y = max_y.max(s.absolute_y);
    }
    Some(CrossSection::from_points(&[
        Point2D::new(min_x - margin, min_y - margin),
        Point2D::new(max_x + margin, min_y - margin),
        Point2D::new(max_x + margin, max_y + margin),
        Point2D::new(min_x - margin, max_y + margin),
    ]))
}

/// Inward concentric passes starting at `start` itself (offset zero) and
/// stepping inward by `step_over` until the contour collapses.
fn concentric_inward(start: &CrossSection, step_over: f64) -> Vec<CrossSection> {
    let mut passes = Vec::new();
    let mut current = start.clone();
    loop {
        if current.is_empty() {
            break;
        }
        passes.push(current.clone());
        match current.offset_rounded(-step_over) {
            Ok(Some(next)) if !next.is_empty() => current = next,
            _ => break,
        }
    }
    passes
}

fn facing_passes(input: &PocketInput, safe_z: f64, moves: &mut Vec<ToolMove>) {
    let Some(bbox) = bounding_cross_section(input.flat, FACING_MARGIN_DIAMETERS * input.config.tool_diameter) else { return };
    let facing_depth = input.stock_top - input.thickness;
    let passes = concentric_inward(&bbox, input.config.step_over);

    for depth_val in levels(facing_depth, input.config.step_down) {
        let local_z = input.stock_top - depth_val;
        for pass in &passes {
            emit_pass(moves, pass, input.bottom_z + local_z, safe_z);
        }
    }
}

fn pocket_passes(input: &PocketInput, regions: &[Region], safe_z: f64, moves: &mut Vec<ToolMove>) {
    struct Plan {
        levels: Vec<f64>,
        passes: Vec<CrossSection>,
    }

    let plans: Vec<Plan> = regions
        .iter()
        .map(|r| {
            let boundary = r.cross_section.offset_rounded(-(input.config.tool_diameter / 2.0)).ok().flatten();
            let passes = boundary.map(|b| concentric_inward(&b, input.config.step_over)).unwrap_or_default();
            Plan { levels: levels(r.depth, input.config.step_down), passes }
        })
        .collect();

    let mut all_depths: Vec<f64> = plans.iter().flat_map(|p| p.levels.iter().copied()).collect();
    all_depths.sort_by(|a, b| a.partial_cmp(b).unwrap());
    all_depths.dedup_by(|a, b| (*a - *b).abs() < 1e-6);

    for &depth_val in &all_depths {
        for plan in &plans {
            if plan.levels.iter().any(|v| (v - depth_val).abs() < 1e-6) {
                let local_z = input.thickness - depth_val;
                for pass in &plan.passes {
                    emit_pass(moves, pass, input.bottom_z + local_z, safe_z);
                }
            }
        }
    }
}

fn profile_passes(input: &PocketInput, outline: &[Point2D], safe_z: f64, moves: &mut Vec<ToolMove>) {
    let outline_cs = CrossSection::from_points(outline);
    if outline_cs.is_empty() {
        return;
    }
    let max_offset = (input.config.tool_diameter / 2.0).max(input.config.chuck_clearance + CHUCK_MOAT_MARGIN);

    let mut passes = Vec::new();
    let mut offset = input.config.tool_diameter / 2.0;
    loop {
        if let Ok(Some(p)) = outline_cs.offset_rounded(offset) {
            passes.push(p);
        }
        if offset >= max_offset - 1e-9 {
            break;
        }
        offset = (offset + input.config.step_over).min(max_offset);
    }

    let moat_depth = input.thickness + BREAKTHROUGH;
    for depth_val in levels(moat_depth, input.config.step_down) {
        let local_z = input.thickness - depth_val;
        for pass in &passes {
            emit_pass(moves, pass, input.bottom_z + local_z, safe_z);
        }
    }
}

/// Emits every ring of `pass` as an entry travel, a closed cut contour,
/// and an exit travel at `safe_z`.
fn emit_pass(moves: &mut Vec<ToolMove>, pass: &CrossSection, cut_z: f64, safe_z: f64) {
    for ring in pass.exterior_rings() {
        if ring.len() < 3 {
            continue;
        }
        let (x0, y0) = (ring[0].x, ring[0].y);
        moves.push(ToolMove::Travel(vec![Point3::new(x0, y0, safe_z), Point3::new(x0, y0, cut_z)]));

        let mut closed: Vec<Point3> = ring.iter().map(|p| Point3::new(p.x, p.y, cut_z)).collect();
        closed.push(Point3::new(x0, y0, cut_z));
        moves.push(ToolMove::Cut(closed));

        moves.push(ToolMove::Travel(vec![Point3::new(x0, y0, cut_z), Point3::new(x0, y0, safe_z)]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_core::geometry::Transform2D;
    use stk_model::{FlatKind, LayerAssignment};
    use std::collections::HashMap as Map;

    fn circle_shape(diameter: f64, depth: &str) -> FlatShape {
        let mut assigned = Map::new();
        assigned.insert("layer1".to_string(), LayerAssignment { depth: depth.into(), endmill_radius: "0".into(), input_fillet: "0".into() });
        FlatShape {
            shape_id: "c".into(),
            name: "c".into(),
            kind: FlatKind::Circle { diameter },
            absolute_x: 0.0,
            absolute_y: 0.0,
            absolute_rotation_deg: 0.0,
            context_footprint: "f".into(),
            union_id: None,
            relative_transform: Transform2D::identity(),
            assigned_layers: assigned,
            locked: false,
        }
    }

    #[test]
    fn circle_pocket_matches_scenario_6_counts() {
        let flat = vec![circle_shape(20.0, "4")];
        let input = PocketInput {
            flat: &flat,
            layer_id: "layer1".into(),
            thickness: 4.0,
            stock_top: 4.0,
            scope: Map::new(),
            bottom_z: 0.0,
            config: CamConfig { tool_diameter: 2.0, step_down: 2.0, step_over: 1.0, chuck_clearance: 0.0 },
            board_outline: None,
        };
        let moves = generate(&input).unwrap();

        let cut_zs: std::collections::BTreeSet<i64> =
            moves.iter().filter_map(|m| if let ToolMove::Cut(pts) = m { Some((pts[0].z * 1000.0).round() as i64) } else { None }).collect();
        assert_eq!(cut_zs.len(), 2, "expected exactly 2 Z-levels");

        let cut_count = moves.iter().filter(|m| matches!(m, ToolMove::Cut(_))).count();
        assert_eq!(cut_count, 2 * 9, "9 concentric passes per level");

        for pair in moves.windows(3) {
            if let ToolMove::Cut(_) = &pair[1] {
                assert!(matches!(pair[0], ToolMove::Travel(_)));
                assert!(matches!(pair[2], ToolMove::Travel(_)));
            }
        }
    }

    #[test]
    fn safe_z_respects_margin_above_stock_top() {
        let flat = vec![circle_shape(10.0, "2")];
        let input = PocketInput {
            flat: &flat,
            layer_id: "layer1".into(),
            thickness: 3.0,
            stock_top: 3.0,
            scope: Map::new(),
            bottom_z: 10.0,
            config: CamConfig::default(),
            board_outline: None,
        };
        let moves = generate(&input).unwrap();
        for m in &moves {
            if let ToolMove::Travel(pts) = m {
                let safe_candidates: Vec<f64> = pts.iter().map(|p| p.z).collect();
                let max_z = safe_candidates.iter().cloned().fold(f64::MIN, f64::max);
                assert!(max_z >= input.bottom_z + input.stock_top + 5.0 - 1e-9);
            }
        }
    }
}
