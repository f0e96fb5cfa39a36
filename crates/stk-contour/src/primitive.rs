//! Per-primitive cross-section builders.

use stk_core::geometry::{Point2D, Vector2D};

use crate::bezier::{sample_closed, sample_open, CurvePoint};
use crate::cross_section::CrossSection;
use crate::error::ContourError;

/// Circle tesselation resolution.
pub const DEFAULT_RESOLUTION: usize = 32;

pub fn circle(diameter: f64, resolution: usize) -> CrossSection {
    let r = diameter / 2.0;
    let n = resolution.max(3);
    let points: Vec<Point2D> = (0..n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            Point2D::new(r * theta.cos(), r * theta.sin())
        })
        .collect();
    CrossSection::from_points(&points)
}

/// Sharp if `corner_radius <= 0`; otherwise round corners honoring
/// `corner_radius <= min(w, h) / 2` (clamped). Built analytically by
/// sampling a quarter-circle arc at each corner rather than via an
/// offset-in/offset-out recipe: the two constructions are geometrically
/// equivalent for a convex rectangle, and arc sampling keeps vertex
/// counts predictable for downstream triangulation.
pub fn rounded_rect(width: f64, height: f64, corner_radius: f64, resolution: usize) -> CrossSection {
    let cr = corner_radius.min(width.min(height) / 2.0).max(0.0);
    if cr <= 1e-9 {
        return CrossSection::from_points(&[
            Point2D::new(-width / 2.0, -height / 2.0),
            Point2D::new(width / 2.0, -height / 2.0),
            Point2D::new(width / 2.0, height / 2.0),
            Point2D::new(-width / 2.0, height / 2.0),
        ]);
    }
    let hw = width / 2.0;
    let hh = height / 2.0;
    let arc_steps = (resolution / 4).max(2);
    let corners = [
        (hw - cr, hh - cr, 0.0),
        (-hw + cr, hh - cr, 90.0f64.to_radians()),
        (-hw + cr, -hh + cr, 180.0f64.to_radians()),
        (hw - cr, -hh + cr, 270.0f64.to_radians()),
    ];
    let mut points = Vec::with_capacity(corners.len() * (arc_steps + 1));
    for (cx, cy, start) in corners {
        for i in 0..=arc_steps {
            let theta = start + (std::f64::consts::FRAC_PI_2) * (i as f64 / arc_steps as f64);
            points.push(Point2D::new(cx + cr * theta.cos(), cy + cr * theta.sin()));
        }
    }
    CrossSection::from_points(&points)
}

/// Discretize `points` (cubic-bezier segments where handles are present)
/// into a closed CCW ring.
pub fn polygon(points: &[CurvePoint], resolution: usize) -> CrossSection {
    let divisions = (resolution / 8).max(2);
    let sampled = sample_closed(points, divisions);
    CrossSection::from_points(&sampled)
}

/// Strokes an open polyline (with bezier handles) by `thickness`, with
/// half-circle end caps. Self-intersections are not
/// repaired.
pub fn line(thickness: f64, points: &[CurvePoint], resolution: usize) -> Result<CrossSection, ContourError> {
    if points.len() < 2 {
        return Err(ContourError::Degenerate("line requires at least two points".into()));
    }
    let divisions = (resolution / 2).max(2);
    let centerline = sample_open(points, divisions);
    if centerline.len() < 2 {
        return Err(ContourError::Degenerate("line sampled to fewer than two points".into()));
    }
    let half = thickness / 2.0;
    let cap_steps = (resolution / 4).max(2);

    let tangents = vertex_tangents(&centerline);
    let mut left = Vec::with_capacity(centerline.len());
    let mut right = Vec::with_capacity(centerline.len());
    for (p, t) in centerline.iter().zip(tangents.iter()) {
        let normal = Vector2D::new(-t.y, t.x);
        left.push(*p + normal.normalized() * half);
        right.push(*p + normal.normalized() * -half);
    }

    let start_cap = half_circle_cap(centerline[0], tangents[0], half, cap_steps, true);
    let end_idx = centerline.len() - 1;
    let end_cap = half_circle_cap(centerline[end_idx], tangents[end_idx], half, cap_steps, false);

    let mut ring = Vec::with_capacity(left.len() + right.len() + start_cap.len() + end_cap.len());
    ring.extend(left.iter().copied());
    ring.extend(end_cap);
    ring.extend(right.iter().rev().copied());
    ring.extend(start_cap);

    Ok(CrossSection::from_points(&ring))
}

fn vertex_tangents(points: &[Point2D]) -> Vec<Vector2D> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let prev = if i == 0 { points[i] } else { points[i - 1] };
            let next = if i == n - 1 { points[i] } else { points[i + 1] };
            (next - prev).normalized()
        })
        .collect()
}

fn half_circle_cap(center: Point2D, tangent: Vector2D, radius: f64, steps: usize, start: bool) -> Vec<Point2D> {
    let base = tangent.angle_degrees();
    // At the start cap, sweep from +90 (left) through 180 to -90 (right),
    // continuing the outward direction of travel; at the end cap, sweep
    // from -90 (right) through 0 to +90 (left).
    let (from, to) = if start { (base + 90.0, base + 270.0) } else { (base - 90.0, base + 90.0) };
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let angle = (from + (to - from) * t).to_radians();
            Point2D::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_area_matches_disk_formula() {
        let cs = circle(10.0, 128);
        let expected = std::f64::consts::PI * 5.0 * 5.0;
        assert!((cs.area() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn sharp_rect_is_exact() {
        let cs = rounded_rect(10.0, 4.0, 0.0, 32);
        assert!((cs.area() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn rounded_rect_clamps_radius_and_loses_area_vs_sharp() {
        let sharp = rounded_rect(10.0, 10.0, 0.0, 32);
        let rounded = rounded_rect(10.0, 10.0, 50.0, 32); // clamped to 5.0
        assert!(rounded.area() < sharp.area());
        assert!(rounded.area() > 0.0);
    }

    #[test]
    fn straight_line_strokes_to_expected_rectangle_area() {
        let points = vec![CurvePoint::straight(Point2D::new(0.0, 0.0)), CurvePoint::straight(Point2D::new(10.0, 0.0))];
        let cs = line(2.0, &points, 32).unwrap();
        // rectangle 10 x 2 plus two half-circle caps of radius 1 = one full circle of area pi.
        let expected = 10.0 * 2.0 + std::f64::consts::PI * 1.0;
        assert!((cs.area() - expected).abs() / expected < 0.05);
    }

    #[test]
    fn line_requires_two_points() {
        let points = vec![CurvePoint::straight(Point2D::new(0.0, 0.0))];
        assert!(line(1.0, &points, 32).is_err());
    }
}
