//! SplitEngine: a dovetailed kerf polyline between two
//! endpoints, stroked into a cross-section and subtracted from a layer
//! manifold to key two halves together after separation.

use stk_core::geometry::{Point2D, Vector2D};
use stk_contour::{CrossSection, CurvePoint};

use crate::error::SplitError;

/// How much wider a tooth's tip is than its neck, as a fraction of `width`.
const DOVETAIL_FLARE_RATIO: f64 = 0.3;

/// Traces the kerf centerline from `start` to `end`: straight, except at
/// each fractional `positions` entry where it bulges into a trapezoidal
/// tooth of neck-width `width` and depth `height`, flared outward (away
/// from the line) if `flip` is false, inward otherwise.
pub fn dovetail_points(start: Point2D, end: Point2D, positions: &[f64], width: f64, height: f64, flip: bool) -> Vec<Point2D> {
    let length = start.distance_to(end);
    if length < 1e-9 {
        return vec![start, end];
    }
    let dir = (end - start).normalized();
    let normal = Vector2D::new(-dir.y, dir.x);
    let side = if flip { -1.0 } else { 1.0 };

    let mut sorted: Vec<f64> = positions.iter().copied().filter(|p| *p > 0.0 && *p < 1.0).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let neck_half = (width / 2.0).max(0.0);
    let tip_half = neck_half * (1.0 + DOVETAIL_FLARE_RATIO);

    let mut points = Vec::with_capacity(2 + sorted.len() * 4);
    points.push(start);
    for frac in sorted {
        let center = start + dir * (frac * length);
        let bulge = normal * (side * height);
        points.push(center + dir * (-neck_half));
        points.push(center + dir * (-tip_half) + bulge);
        points.push(center + dir * tip_half + bulge);
        points.push(center + dir * neck_half);
    }
    points.push(end);
    points
}

/// Builds the kerf cross-section for one `SplitLine`: the
/// dovetailed polyline stroked by `kerf_thickness`, ready to subtract from
/// the layer manifold at full thickness.
pub fn kerf_cross_section(
    start: Point2D,
    end: Point2D,
    positions: &[f64],
    dovetail_width: f64,
    dovetail_height: f64,
    flip: bool,
    kerf_thickness: f64,
) -> Result<CrossSection, SplitError> {
    if start.distance_to(end) < 1e-9 {
        return Err(SplitError::DegenerateLine);
    }
    let path = dovetail_points(start, end, positions, dovetail_width, dovetail_height, flip);
    let curve: Vec<CurvePoint> = path.into_iter().map(CurvePoint::straight).collect();
    let cs = stk_contour::line(kerf_thickness, &curve, stk_contour::DEFAULT_RESOLUTION)
        .map_err(|e| SplitError::EmptyKerf(e.to_string()))?;
    if cs.is_empty() {
        return Err(SplitError::EmptyKerf("split line".to_string()));
    }
    Ok(cs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_run_with_no_teeth_is_just_the_endpoints() {
        let points = dovetail_points(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0), &[], 1.0, 1.0, false);
        assert_eq!(points, vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)]);
    }

    #[test]
    fn one_tooth_bulges_away_from_the_baseline() {
        let points = dovetail_points(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0), &[0.5], 2.0, 1.0, false);
        // start, base_left, tip_left, tip_right, base_right, end
        assert_eq!(points.len(), 6);
        let tip_left = points[2];
        assert!((tip_left.y - 1.0).abs() < 1e-9, "tooth should bulge by `height` off the baseline");
    }

    #[test]
    fn flip_reverses_the_bulge_direction() {
        let points = dovetail_points(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0), &[0.5], 2.0, 1.0, true);
        assert!(points[2].y < 0.0);
    }

    #[test]
    fn kerf_cross_section_is_nonempty_for_a_simple_line() {
        let cs = kerf_cross_section(Point2D::new(0.0, 0.0), Point2D::new(20.0, 0.0), &[0.3, 0.6], 3.0, 1.5, false, 0.5).unwrap();
        assert!(!cs.is_empty());
        assert!(cs.area() > 20.0 * 0.5 * 0.5); // at least roughly the straight kerf strip
    }

    #[test]
    fn coincident_endpoints_are_rejected() {
        let result = kerf_cross_section(Point2D::new(1.0, 1.0), Point2D::new(1.0, 1.0), &[], 1.0, 1.0, false, 0.5);
        assert!(result.is_err());
    }
}
