//! Point-reference resolution: resolves a `snapTo` id path
//! into an absolute position, walking FootprintReferences down to a
//! WireGuide.

use std::collections::HashMap;

use stk_core::geometry::{Point2D, Transform2D, Vector2D};

use crate::model::{Footprint, FootprintLibrary, HandleExpr, Point, ShapeKind};

fn eval_or_zero(expr: &str, scope: &HashMap<String, f64>) -> f64 {
    stk_core::expr::eval(expr, scope).unwrap_or(0.0)
}

fn eval_handle(handle: &Option<HandleExpr>, scope: &HashMap<String, f64>) -> Option<Vector2D> {
    handle
        .as_ref()
        .map(|h| Vector2D::new(eval_or_zero(&h.dx, scope), eval_or_zero(&h.dy, scope)))
}

/// The result of resolving a point: an absolute position plus optional
/// handle vectors (already rotated into the accumulated frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub position: Point2D,
    pub handle_in: Option<Vector2D>,
    pub handle_out: Option<Vector2D>,
}

/// Resolve `point` relative to `starting_footprint`, honoring `snap_to` if
/// present. Broken paths (missing shape/footprint, wrong kind at a step)
/// silently fall back to the point's local (x, y) — this is pure and
/// deterministic: equivalent transform chains always produce bit-identical
/// coordinates.
pub fn resolve_point(
    point: &Point,
    starting_footprint: &Footprint,
    library: &FootprintLibrary,
    scope: &HashMap<String, f64>,
) -> SnapResult {
    let local = || SnapResult {
        position: Point2D::new(eval_or_zero(&point.x, scope), eval_or_zero(&point.y, scope)),
        handle_in: eval_handle(&point.handle_in, scope),
        handle_out: eval_handle(&point.handle_out, scope),
    };

    let Some(path) = point.snap_to.as_deref().filter(|p| !p.is_empty()) else {
        return local();
    };

    let ids: Vec<&str> = path.split(':').collect();
    if ids.is_empty() {
        return local();
    }

    let mut transform = Transform2D::identity();
    let mut current = starting_footprint;

    for (i, id) in ids.iter().enumerate() {
        let Some(shape) = current.find_shape(id) else {
            return local();
        };
        let is_last = i == ids.len() - 1;

        if is_last {
            return match &shape.kind {
                ShapeKind::WireGuide { x, y, handle } => {
                    let local_pos = Point2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope));
                    let handle_vec = eval_handle(handle, scope).map(|v| transform.apply_vector(v));
                    SnapResult {
                        position: transform.apply_point(local_pos),
                        handle_in: handle_vec,
                        handle_out: handle_vec,
                    }
                }
                _ => local(),
            };
        }

        match &shape.kind {
            ShapeKind::FootprintReference { x, y, angle, footprint_id } => {
                let step = Transform2D::new(
                    Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)),
                    eval_or_zero(angle, scope),
                );
                transform = transform.then(step);
                let Some(next) = library.get(footprint_id) else {
                    return local();
                };
                current = next;
            }
            _ => return local(),
        }
    }

    local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeNode, TieDown};
    use std::collections::HashMap as Map;

    fn wireguide(id: &str, x: f64, y: f64) -> ShapeNode {
        ShapeNode {
            id: id.into(),
            name: "wg".into(),
            locked: false,
            assigned_layers: Map::new(),
            kind: ShapeKind::WireGuide {
                x: x.to_string(),
                y: y.to_string(),
                handle: None,
            },
        }
    }

    fn footprint_ref(id: &str, x: f64, y: f64, angle: f64, target: &str) -> ShapeNode {
        ShapeNode {
            id: id.into(),
            name: "ref".into(),
            locked: false,
            assigned_layers: Map::new(),
            kind: ShapeKind::FootprintReference {
                x: x.to_string(),
                y: y.to_string(),
                angle: angle.to_string(),
                footprint_id: target.into(),
            },
        }
    }

    #[test]
    fn nested_reference_snap_matches_spec_scenario_4() {
        let child = Footprint {
            id: "C".into(),
            name: "child".into(),
            is_board: false,
            board_outline_assignments: Map::new(),
            shapes: vec![wireguide("G", 5.0, 0.0)],
        };
        let root = Footprint {
            id: "R".into(),
            name: "root".into(),
            is_board: false,
            board_outline_assignments: Map::new(),
            shapes: vec![footprint_ref("refC", 10.0, 0.0, 90.0, "C")],
        };
        let mut library = FootprintLibrary::new();
        library.insert("C".into(), child);

        let p = Point {
            id: "P".into(),
            x: "0".into(),
            y: "0".into(),
            handle_in: None,
            handle_out: None,
            snap_to: Some("refC:G".into()),
        };

        let result = resolve_point(&p, &root, &library, &Map::new());
        assert!((result.position.x - 10.0).abs() < 1e-9);
        assert!((result.position.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn broken_path_falls_back_to_local_xy() {
        let root = Footprint {
            id: "R".into(),
            name: "root".into(),
            is_board: false,
            board_outline_assignments: Map::new(),
            shapes: vec![],
        };
        let library = FootprintLibrary::new();
        let p = Point {
            id: "P".into(),
            x: "3".into(),
            y: "4".into(),
            handle_in: None,
            handle_out: None,
            snap_to: Some("missing:chain".into()),
        };
        let result = resolve_point(&p, &root, &library, &Map::new());
        assert_eq!(result.position, Point2D::new(3.0, 4.0));
    }

    #[test]
    fn no_snap_to_uses_local_coordinates() {
        let root = Footprint {
            id: "R".into(),
            name: "root".into(),
            is_board: false,
            board_outline_assignments: Map::new(),
            shapes: vec![],
        };
        let library = FootprintLibrary::new();
        let p = Point {
            id: "P".into(),
            x: "1".into(),
            y: "2".into(),
            handle_in: None,
            handle_out: None,
            snap_to: None,
        };
        let result = resolve_point(&p, &root, &library, &Map::new());
        assert_eq!(result.position, Point2D::new(1.0, 2.0));
    }

    #[test]
    fn determinism_equivalent_paths_match_bit_for_bit() {
        let child = Footprint {
            id: "C".into(),
            name: "child".into(),
            is_board: false,
            board_outline_assignments: Map::new(),
            shapes: vec![wireguide("G", 1.0, 1.0)],
        };
        let root = Footprint {
            id: "R".into(),
            name: "root".into(),
            is_board: false,
            board_outline_assignments: Map::new(),
            shapes: vec![footprint_ref("refC", 2.0, 3.0, 45.0, "C")],
        };
        let mut library = FootprintLibrary::new();
        library.insert("C".into(), child);
        let p = Point {
            id: "P".into(),
            x: "0".into(),
            y: "0".into(),
            handle_in: None,
            handle_out: None,
            snap_to: Some("refC:G".into()),
        };
        let a = resolve_point(&p, &root, &library, &Map::new());
        let b = resolve_point(&p, &root, &library, &Map::new());
        assert_eq!(a, b);
    }

    #[test]
    #[allow(unused)]
    fn tie_down_struct_round_trips() {
        let _ = TieDown {
            footprint_id: "x".into(),
            distance: "10".into(),
            angle: "0".into(),
        };
    }
}
