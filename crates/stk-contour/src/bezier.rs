//! Cubic-bezier polyline sampling shared by Line and Polygon construction.

use stk_core::geometry::{Point2D, Vector2D};

/// An authored curve vertex: a position plus optional incoming/outgoing
/// bezier handle offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub pos: Point2D,
    pub handle_in: Option<Vector2D>,
    pub handle_out: Option<Vector2D>,
}

impl CurvePoint {
    pub fn straight(pos: Point2D) -> Self {
        CurvePoint { pos, handle_in: None, handle_out: None }
    }
}

fn cubic(p0: Point2D, p1: Point2D, p2: Point2D, p3: Point2D, t: f64) -> Point2D {
    let mt = 1.0 - t;
    let x = mt.powi(3) * p0.x + 3.0 * mt.powi(2) * t * p1.x + 3.0 * mt * t.powi(2) * p2.x + t.powi(3) * p3.x;
    let y = mt.powi(3) * p0.y + 3.0 * mt.powi(2) * t * p1.y + 3.0 * mt * t.powi(2) * p2.y + t.powi(3) * p3.y;
    Point2D::new(x, y)
}

/// Sample `points` (open polyline, cubic-bezier segments where handles are
/// present) into a discrete point list. `divisions` controls samples per
/// segment; straight segments (no handles on either endpoint) are emitted
/// as a single segment regardless, since a line needs no subdivision.
pub fn sample_open(points: &[CurvePoint], divisions: usize) -> Vec<Point2D> {
    sample(points, divisions, false)
}

/// Like [`sample_open`] but treats `points` as a closed ring, sampling the
/// closing segment from the last point back to the first.
pub fn sample_closed(points: &[CurvePoint], divisions: usize) -> Vec<Point2D> {
    sample(points, divisions, true)
}

fn sample(points: &[CurvePoint], divisions: usize, closed: bool) -> Vec<Point2D> {
    if points.is_empty() {
        return Vec::new();
    }
    if points.len() == 1 {
        return vec![points[0].pos];
    }
    let divisions = divisions.max(1);
    let mut out = Vec::with_capacity(points.len() * divisions);
    let segment_count = if closed { points.len() } else { points.len() - 1 };

    for seg in 0..segment_count {
        let a = &points[seg];
        let b = &points[(seg + 1) % points.len()];
        let straight = a.handle_out.is_none() && b.handle_in.is_none();
        let p0 = a.pos;
        let p1 = a.handle_out.map(|h| p0 + h).unwrap_or(p0);
        let p2 = b.handle_in.map(|h| b.pos + h).unwrap_or(b.pos);
        let p3 = b.pos;

        out.push(p0);
        if !straight {
            let steps = divisions;
            for i in 1..steps {
                let t = i as f64 / steps as f64;
                out.push(cubic(p0, p1, p2, p3, t));
            }
        }
    }
    if !closed {
        out.push(points[points.len() - 1].pos);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_segment_is_not_subdivided() {
        let points = vec![CurvePoint::straight(Point2D::new(0.0, 0.0)), CurvePoint::straight(Point2D::new(10.0, 0.0))];
        let sampled = sample_open(&points, 8);
        assert_eq!(sampled, vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)]);
    }

    #[test]
    fn bezier_segment_passes_through_endpoints() {
        let points = vec![
            CurvePoint { pos: Point2D::new(0.0, 0.0), handle_in: None, handle_out: Some(Vector2D::new(1.0, 1.0)) },
            CurvePoint { pos: Point2D::new(10.0, 0.0), handle_in: Some(Vector2D::new(-1.0, 1.0)), handle_out: None },
        ];
        let sampled = sample_open(&points, 8);
        assert_eq!(*sampled.first().unwrap(), Point2D::new(0.0, 0.0));
        assert_eq!(*sampled.last().unwrap(), Point2D::new(10.0, 0.0));
        assert!(sampled.len() > 2);
    }

    #[test]
    fn closed_ring_samples_the_wrap_segment() {
        let points = vec![
            CurvePoint::straight(Point2D::new(0.0, 0.0)),
            CurvePoint::straight(Point2D::new(10.0, 0.0)),
            CurvePoint::straight(Point2D::new(10.0, 10.0)),
        ];
        let sampled = sample_closed(&points, 4);
        // 3 straight segments, each contributing its start point only.
        assert_eq!(sampled.len(), 3);
    }
}
