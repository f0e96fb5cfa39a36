//! Walks a footprint tree into a flat list of absolute-positioned
//! primitives. Recursive footprint references, unions, and
//! line tie-downs are all resolved here; WireGuide and BoardOutline shapes
//! never appear in the output.

use std::collections::HashMap;

use stk_core::geometry::{Point2D, Transform2D, Vector2D};

use crate::model::{Footprint, FootprintLibrary, LayerAssignment, Point, ShapeKind, ShapeNode};
use crate::snap::resolve_point;

/// Recursion depth bound: a defensive fuse, not a
/// statement of intended nesting depth.
pub const MAX_RECURSION_DEPTH: u32 = 10;

fn eval_or_zero(expr: &str, scope: &HashMap<String, f64>) -> f64 {
    stk_core::expr::eval(expr, scope).unwrap_or(0.0)
}

/// A point after snap/expression resolution, in the owning footprint's
/// local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub pos: Point2D,
    pub handle_in: Option<Vector2D>,
    pub handle_out: Option<Vector2D>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlatKind {
    Circle { diameter: f64 },
    Rect { width: f64, height: f64, corner_radius: f64 },
    Polygon { points: Vec<ResolvedPoint> },
    Line { thickness: f64, points: Vec<ResolvedPoint> },
    Text { text: String, font_size: f64, anchor: String },
    SplitLine {
        end: Point2D,
        dovetail_positions: Vec<f64>,
        dovetail_width: f64,
        dovetail_height: f64,
        flip: bool,
    },
}

/// One flattened primitive, ready for ContourBuilder.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatShape {
    pub shape_id: String,
    pub name: String,
    pub kind: FlatKind,
    pub absolute_x: f64,
    pub absolute_y: f64,
    pub absolute_rotation_deg: f64,
    pub context_footprint: String,
    pub union_id: Option<String>,
    pub relative_transform: Transform2D,
    pub assigned_layers: HashMap<String, LayerAssignment>,
    pub locked: bool,
}

fn resolve_points(
    points: &[Point],
    footprint: &Footprint,
    library: &FootprintLibrary,
    scope: &HashMap<String, f64>,
) -> Vec<ResolvedPoint> {
    points
        .iter()
        .map(|p| {
            let r = resolve_point(p, footprint, library, scope);
            ResolvedPoint {
                pos: r.position,
                handle_in: r.handle_in,
                handle_out: r.handle_out,
            }
        })
        .collect()
}

/// Evaluate a cubic bezier segment between two resolved points at
/// parameter `t` in [0, 1].
fn bezier_point(a: &ResolvedPoint, b: &ResolvedPoint, t: f64) -> Point2D {
    let p0 = a.pos;
    let p1 = a.handle_out.map(|h| p0 + h).unwrap_or(p0);
    let p2 = b.handle_in.map(|h| b.pos + h).unwrap_or(b.pos);
    let p3 = b.pos;
    let mt = 1.0 - t;
    let x = mt.powi(3) * p0.x
        + 3.0 * mt.powi(2) * t * p1.x
        + 3.0 * mt * t.powi(2) * p2.x
        + t.powi(3) * p3.x;
    let y = mt.powi(3) * p0.y
        + 3.0 * mt.powi(2) * t * p1.y
        + 3.0 * mt * t.powi(2) * p2.y
        + t.powi(3) * p3.y;
    Point2D::new(x, y)
}

const TIE_DOWN_SAMPLES_PER_SEGMENT: usize = 16;

/// Walk a polyline (with optional bezier handles) and return the position
/// and tangent at the given arclength. Returns `None` when `distance`
/// exceeds the curve's total length (such
/// tie-downs are silently ignored).
fn point_and_tangent_at_arclength(points: &[ResolvedPoint], distance: f64) -> Option<(Point2D, Vector2D)> {
    if points.len() < 2 || distance < 0.0 {
        return None;
    }
    let mut accumulated = 0.0;
    for w in points.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let mut prev = bezier_point(a, b, 0.0);
        for i in 1..=TIE_DOWN_SAMPLES_PER_SEGMENT {
            let t = i as f64 / TIE_DOWN_SAMPLES_PER_SEGMENT as f64;
            let cur = bezier_point(a, b, t);
            let seg_len = prev.distance_to(cur);
            if accumulated + seg_len >= distance {
                let remaining = distance - accumulated;
                let frac = if seg_len > 1e-12 { remaining / seg_len } else { 0.0 };
                let pos = Point2D::new(
                    prev.x + (cur.x - prev.x) * frac,
                    prev.y + (cur.y - prev.y) * frac,
                );
                let tangent = (cur - prev).normalized();
                return Some((pos, tangent));
            }
            accumulated += seg_len;
            prev = cur;
        }
    }
    None
}

struct Ctx<'a> {
    library: &'a FootprintLibrary,
    scope: &'a HashMap<String, f64>,
    out: Vec<FlatShape>,
}

fn walk(
    footprint: &Footprint,
    ctx: &mut Ctx,
    accum: Transform2D,
    union_id: Option<String>,
    override_layers: Option<HashMap<String, LayerAssignment>>,
    depth: u32,
) {
    if depth > MAX_RECURSION_DEPTH {
        return;
    }

    for shape in &footprint.shapes {
        emit_shape(shape, footprint, ctx, accum, union_id.clone(), override_layers.clone(), depth);
    }
}

fn emit_shape(
    shape: &ShapeNode,
    footprint: &Footprint,
    ctx: &mut Ctx,
    accum: Transform2D,
    union_id: Option<String>,
    override_layers: Option<HashMap<String, LayerAssignment>>,
    depth: u32,
) {
    let scope = ctx.scope;
    let assigned_layers = override_layers.clone().unwrap_or_else(|| shape.assigned_layers.clone());

    match &shape.kind {
        ShapeKind::WireGuide { .. } | ShapeKind::BoardOutline { .. } => {
            // Consumed by SnapResolver / BooleanEngine base-solid selection, never flattened.
        }
        ShapeKind::Circle { x, y, diameter } => {
            let step = Transform2D::new(Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)), 0.0);
            let placed = accum.then(step);
            ctx.out.push(FlatShape {
                shape_id: shape.id.clone(),
                name: shape.name.clone(),
                kind: FlatKind::Circle { diameter: eval_or_zero(diameter, scope) },
                absolute_x: placed.translation.x,
                absolute_y: placed.translation.y,
                absolute_rotation_deg: placed.rotation_deg,
                context_footprint: footprint.id.clone(),
                union_id,
                relative_transform: step,
                assigned_layers,
                locked: shape.locked,
            });
        }
        ShapeKind::Rect { x, y, width, height, angle, corner_radius } => {
            let step = Transform2D::new(
                Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)),
                eval_or_zero(angle, scope),
            );
            let placed = accum.then(step);
            ctx.out.push(FlatShape {
                shape_id: shape.id.clone(),
                name: shape.name.clone(),
                kind: FlatKind::Rect {
                    width: eval_or_zero(width, scope),
                    height: eval_or_zero(height, scope),
                    corner_radius: eval_or_zero(corner_radius, scope),
                },
                absolute_x: placed.translation.x,
                absolute_y: placed.translation.y,
                absolute_rotation_deg: placed.rotation_deg,
                context_footprint: footprint.id.clone(),
                union_id,
                relative_transform: step,
                assigned_layers,
                locked: shape.locked,
            });
        }
        ShapeKind::Polygon { x, y, points } => {
            let step = Transform2D::new(Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)), 0.0);
            let placed = accum.then(step);
            let resolved = resolve_points(points, footprint, ctx.library, scope);
            ctx.out.push(FlatShape {
                shape_id: shape.id.clone(),
                name: shape.name.clone(),
                kind: FlatKind::Polygon { points: resolved },
                absolute_x: placed.translation.x,
                absolute_y: placed.translation.y,
                absolute_rotation_deg: placed.rotation_deg,
                context_footprint: footprint.id.clone(),
                union_id,
                relative_transform: step,
                assigned_layers,
                locked: shape.locked,
            });
        }
        ShapeKind::Line { thickness, points, tie_downs } => {
            let resolved = resolve_points(points, footprint, ctx.library, scope);
            ctx.out.push(FlatShape {
                shape_id: shape.id.clone(),
                name: shape.name.clone(),
                kind: FlatKind::Line { thickness: eval_or_zero(thickness, scope), points: resolved.clone() },
                absolute_x: accum.translation.x,
                absolute_y: accum.translation.y,
                absolute_rotation_deg: accum.rotation_deg,
                context_footprint: footprint.id.clone(),
                union_id: union_id.clone(),
                relative_transform: Transform2D::identity(),
                assigned_layers,
                locked: shape.locked,
            });

            for tie in tie_downs {
                let distance = eval_or_zero(&tie.distance, scope);
                let Some((point, tangent)) = point_and_tangent_at_arclength(&resolved, distance) else {
                    continue; // beyond curve length: silently ignored
                };
                let extra_angle = eval_or_zero(&tie.angle, scope);
                let orientation = tangent.angle_degrees() - 90.0 + extra_angle;
                let step = Transform2D::new(Vector2D::new(point.x, point.y), orientation);
                let placed = accum.then(step);
                if let Some(child) = ctx.library.get(&tie.footprint_id) {
                    walk(child, ctx, placed, union_id.clone(), None, depth + 1);
                }
            }
        }
        ShapeKind::FootprintReference { x, y, angle, footprint_id } => {
            let step = Transform2D::new(
                Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)),
                eval_or_zero(angle, scope),
            );
            let placed = accum.then(step);
            if let Some(child) = ctx.library.get(footprint_id) {
                walk(child, ctx, placed, union_id, override_layers, depth + 1);
            }
        }
        ShapeKind::Union { x, y, angle, shapes, assigned_layers: union_layers } => {
            let step = Transform2D::new(
                Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)),
                eval_or_zero(angle, scope),
            );
            let placed = accum.then(step);
            let child_union_id = union_id.or_else(|| Some(shape.id.clone()));
            let child_override = union_layers.clone().or(override_layers);
            for child in shapes {
                emit_shape(child, footprint, ctx, placed, child_union_id.clone(), child_override.clone(), depth);
            }
        }
        ShapeKind::SplitLine { x, y, end_x, end_y, dovetail_positions, dovetail_width, dovetail_height, flip } => {
            let step = Transform2D::new(Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)), 0.0);
            let placed = accum.then(step);
            // endX/endY share the start point's parent frame, not the start
            // point's own placement, so both ends go through `accum` alone.
            let end_absolute = accum.apply_point(Point2D::new(eval_or_zero(end_x, scope), eval_or_zero(end_y, scope)));
            ctx.out.push(FlatShape {
                shape_id: shape.id.clone(),
                name: shape.name.clone(),
                kind: FlatKind::SplitLine {
                    end: end_absolute,
                    dovetail_positions: dovetail_positions.iter().map(|e| eval_or_zero(e, scope)).collect(),
                    dovetail_width: eval_or_zero(dovetail_width, scope),
                    dovetail_height: eval_or_zero(dovetail_height, scope),
                    flip: *flip,
                },
                absolute_x: placed.translation.x,
                absolute_y: placed.translation.y,
                absolute_rotation_deg: placed.rotation_deg,
                context_footprint: footprint.id.clone(),
                union_id,
                relative_transform: step,
                assigned_layers,
                locked: shape.locked,
            });
        }
        ShapeKind::Text { x, y, angle, text, font_size, anchor } => {
            let step = Transform2D::new(
                Vector2D::new(eval_or_zero(x, scope), eval_or_zero(y, scope)),
                eval_or_zero(angle, scope),
            );
            let placed = accum.then(step);
            ctx.out.push(FlatShape {
                shape_id: shape.id.clone(),
                name: shape.name.clone(),
                kind: FlatKind::Text {
                    text: text.clone(),
                    font_size: eval_or_zero(font_size, scope),
                    anchor: anchor.clone(),
                },
                absolute_x: placed.translation.x,
                absolute_y: placed.translation.y,
                absolute_rotation_deg: placed.rotation_deg,
                context_footprint: footprint.id.clone(),
                union_id,
                relative_transform: step,
                assigned_layers,
                locked: shape.locked,
            });
        }
    }
}

/// Flatten `root` (plus anything it transitively references) into a flat
/// sequence of absolute-positioned primitives.
pub fn flatten(root: &Footprint, library: &FootprintLibrary, scope: &HashMap<String, f64>) -> Vec<FlatShape> {
    let mut ctx = Ctx { library, scope, out: Vec::new() };
    walk(root, &mut ctx, Transform2D::identity(), None, None, 0);
    ctx.out
}
