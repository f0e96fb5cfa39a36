//! Depth-map construction: later shapes carve
//! disjoint regions out of earlier ones, each tagged with the depth the
//! tool must reach there.

use std::collections::HashMap;

use stk_contour::CrossSection;
use stk_core::geometry::{Transform2D, Vector2D};
use stk_model::{FlatKind, FlatShape};

fn eval(expr: &str, scope: &HashMap<String, f64>) -> f64 {
    stk_core::expr::eval(expr, scope).unwrap_or(0.0)
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

/// A disjoint 2D region tagged with the depth the tool must reach there.
pub struct Region {
    pub cross_section: CrossSection,
    pub depth: f64,
}

/// Builds the depth map for `layer_id`: iterate `flat` in shape-list
/// order, each new shape carves itself out of every prior region before
/// being appended as its own region.
pub fn build(flat: &[FlatShape], layer_id: &str, thickness: f64, scope: &HashMap<String, f64>) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();

    for shape in flat {
        let Some(assignment) = shape.assigned_layers.get(layer_id) else { continue };
        let Some(local) = local_cross_section(&shape.kind) else { continue };

        let transform = Transform2D::new(Vector2D::new(shape.absolute_x, shape.absolute_y), shape.absolute_rotation_deg);
        let placed = local.transformed(&transform);
        if placed.is_empty() {
            continue;
        }
        let depth = eval(&assignment.depth, scope).min(thickness).max(0.0);

        for region in &mut regions {
            region.cross_section = region.cross_section.difference(&placed);
        }
        regions.retain(|r| !r.cross_section.is_empty());
        regions.push(Region { cross_section: placed, depth });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_model::LayerAssignment;
    use std::collections::HashMap as Map;

    fn circle_shape(id: &str, depth: &str) -> FlatShape {
        let mut assigned = Map::new();
        assigned.insert("layer1".to_string(), LayerAssignment { depth: depth.into(), endmill_radius: "0".into(), input_fillet: "0".into() });
        FlatShape {
            shape_id: id.into(),
            name: id.into(),
            kind: FlatKind::Circle { diameter: 10.0 },
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
    fn later_shape_overrides_earlier_in_overlap() {
        let flat = vec![circle_shape("a", "1"), circle_shape("b", "2")];
        let regions = build(&flat, "layer1", 3.0, &Map::new());
        // Identical circles fully overlap: the first region is fully
        // carved away, leaving only the second shape's region.
        assert_eq!(regions.len(), 1);
        assert!((regions[0].depth - 2.0).abs() < 1e-9);
    }
}
