//! `CrossSection`: a 2D set of simple polygons under even-odd fill
//!, with outer boundaries CCW and holes CW.

use geo::{BooleanOps, LineString, MapCoords, MultiPolygon, Orient, Polygon as GeoPolygon};
use geo::orient::Direction;

use crate::error::ContourError;
use stk_core::geometry::{Point2D, Transform2D};

/// A 2D cross-section. Invariant: outer rings wind CCW, hole rings wind CW.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection(pub MultiPolygon<f64>);

impl CrossSection {
    pub fn empty() -> Self {
        CrossSection(MultiPolygon::new(Vec::new()))
    }

    pub fn from_points(points: &[Point2D]) -> Self {
        if points.len() < 3 {
            return Self::empty();
        }
        let ring = close_ring(points);
        let poly = GeoPolygon::new(ring, vec![]).orient(Direction::Default);
        CrossSection(MultiPolygon(vec![poly]))
    }

    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty() || self.area().abs() < 1e-9
    }

    /// The exterior ring of every outer polygon, as a closed point loop
    /// (last point omitted since it duplicates the first). Used by
    /// Pocketer to trace a single concentric pass.
    pub fn exterior_rings(&self) -> Vec<Vec<Point2D>> {
        self.0
            .0
            .iter()
            .map(|poly| {
                let coords = poly.exterior().coords();
                let mut pts: Vec<Point2D> = coords.map(|c| Point2D::new(c.x, c.y)).collect();
                if pts.first() == pts.last() {
                    pts.pop();
                }
                pts
            })
            .collect()
    }

    pub fn area(&self) -> f64 {
        use geo::Area;
        self.0.unsigned_area()
    }

    pub fn union(&self, other: &CrossSection) -> CrossSection {
        CrossSection(self.0.union(&other.0))
    }

    pub fn difference(&self, other: &CrossSection) -> CrossSection {
        CrossSection(self.0.difference(&other.0))
    }

    pub fn intersection(&self, other: &CrossSection) -> CrossSection {
        CrossSection(self.0.intersection(&other.0))
    }

    /// Splits this cross-section into disjoint connected components, one
    /// per outer polygon.
    pub fn decompose(&self) -> Vec<CrossSection> {
        self.0
            .0
            .iter()
            .map(|poly| CrossSection(MultiPolygon(vec![poly.clone()])))
            .collect()
    }

    /// Maps every coordinate through a rigid-body transform, used to place
    /// a locally-built primitive at its flattened absolute position.
    pub fn transformed(&self, transform: &Transform2D) -> CrossSection {
        let mapped = self.0.map_coords(|c| {
            let p = transform.apply_point(Point2D::new(c.x, c.y));
            geo::Coord { x: p.x, y: p.y }
        });
        CrossSection(mapped)
    }

    /// The axis-aligned bounding rect's half-width and half-height, used
    /// to clamp endmill radii.
    pub fn half_extents(&self) -> Option<(f64, f64)> {
        use geo::BoundingRect;
        self.0.bounding_rect().map(|r| {
            let w = r.max().x - r.min().x;
            let h = r.max().y - r.min().y;
            (w / 2.0, h / 2.0)
        })
    }

    /// A Minkowski offset by `distance` with round joins. A negative offset that collapses the
    /// contour to nothing yields `Ok(None)` — callers skip that sample
    /// rather than treating it as an error.
    pub fn offset_rounded(&self, distance: f64) -> Result<Option<CrossSection>, ContourError> {
        if self.0.0.is_empty() {
            return Ok(None);
        }
        let sketch: csgrs::sketch::Sketch<()> =
            csgrs::sketch::Sketch::from_geo(geo::GeometryCollection(vec![geo::Geometry::MultiPolygon(self.0.clone())]), None);
        let offset = sketch.offset_rounded(distance);
        let result = CrossSection(offset.to_multipolygon());
        if result.is_empty() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }
}

fn close_ring(points: &[Point2D]) -> LineString<f64> {
    let mut coords: Vec<geo::Coord<f64>> = points.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect();
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    LineString::new(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_cross_section_has_expected_area() {
        let pts = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
        ];
        let cs = CrossSection::from_points(&pts);
        assert!((cs.area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn difference_of_identical_squares_is_empty() {
        let pts = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
        ];
        let cs = CrossSection::from_points(&pts);
        let diff = cs.difference(&cs);
        assert!(diff.is_empty());
    }

    #[test]
    fn decompose_splits_disjoint_squares() {
        let a = CrossSection::from_points(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ]);
        let b = CrossSection::from_points(&[
            Point2D::new(5.0, 5.0),
            Point2D::new(6.0, 5.0),
            Point2D::new(6.0, 6.0),
            Point2D::new(5.0, 6.0),
        ]);
        let merged = a.union(&b);
        assert_eq!(merged.decompose().len(), 2);
    }
}
