//! SplitEngine: dovetailed kerf lines that decompose a
//! finished layer manifold into disjoint parts for multi-piece fabrication.

pub mod dovetail;
pub mod error;
pub mod parts;

pub use dovetail::{dovetail_points, kerf_cross_section};
pub use error::SplitError;
pub use parts::{decompose_by_volume, SplitPart};

use std::collections::HashMap;

use stk_contour::CrossSection;
use stk_model::{FlatKind, FlatShape};

/// Builds the kerf cross-section for every `SplitLine` assigned to
/// `layer_id`, ready to pass as BooleanEngine's `split_kerfs`. Shapes without a matching assignment, or whose
/// kerf collapses, are skipped rather than failing the whole layer.
pub fn kerfs_for_layer(flat: &[FlatShape], layer_id: &str, scope: &HashMap<String, f64>) -> Vec<CrossSection> {
    flat.iter()
        .filter(|s| s.assigned_layers.contains_key(layer_id))
        .filter_map(|s| match &s.kind {
            FlatKind::SplitLine { end, dovetail_positions, dovetail_width, dovetail_height, flip } => {
                let start = stk_core::geometry::Point2D::new(s.absolute_x, s.absolute_y);
                kerf_cross_section(start, *end, dovetail_positions, *dovetail_width, *dovetail_height, *flip, eval_kerf(scope))
                    .ok()
            }
            _ => None,
        })
        .collect()
}

/// The kerf thickness is the tool's own cut width; until a dedicated
/// parameter is threaded through the data model, a conservative default
/// matches a typical small end mill.
fn eval_kerf(scope: &HashMap<String, f64>) -> f64 {
    scope.get("splitKerfWidth").copied().unwrap_or(1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_core::geometry::{Point2D, Transform2D};
    use std::collections::HashMap as Map;

    fn split_line_shape() -> FlatShape {
        let mut assigned = Map::new();
        assigned.insert(
            "layer1".to_string(),
            stk_model::LayerAssignment { depth: "0".into(), endmill_radius: "0".into(), input_fillet: "0".into() },
        );
        FlatShape {
            shape_id: "s1".into(),
            name: "s1".into(),
            kind: FlatKind::SplitLine {
                end: Point2D::new(20.0, 0.0),
                dovetail_positions: vec![0.25, 0.5, 0.75],
                dovetail_width: 3.0,
                dovetail_height: 1.5,
                flip: false,
            },
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
    fn split_line_assigned_to_layer_yields_one_kerf() {
        let flat = vec![split_line_shape()];
        let kerfs = kerfs_for_layer(&flat, "layer1", &Map::new());
        assert_eq!(kerfs.len(), 1);
        assert!(kerfs[0].area() > 0.0);
    }

    #[test]
    fn split_line_not_assigned_to_this_layer_is_skipped() {
        let flat = vec![split_line_shape()];
        let kerfs = kerfs_for_layer(&flat, "other_layer", &Map::new());
        assert!(kerfs.is_empty());
    }
}
