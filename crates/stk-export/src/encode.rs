//! Byte encoders for the three layer-export file types.
//! SVG and DXF serialize the flat 2D shape list; STL is handed through
//! as already-encoded bytes from the layer's 3D manifold.

use csgrs::io::svg::ToSVG;
use csgrs::sketch::Sketch;
use geo::{Geometry, GeometryCollection};

use stk_contour::{CrossSection, CurvePoint};
use stk_core::geometry::{Point2D, Transform2D, Vector2D};
use stk_solid::Manifold;

use crate::error::ExportError;
use crate::request::{ExportShape, LayerExport, OutlinePoint};

/// A hairline extrusion height for DXF export.
const DXF_EXTRUSION_HEIGHT: f64 = 0.01;

fn to_curve_points(points: &[OutlinePoint]) -> Vec<CurvePoint> {
    points.iter().map(|p| CurvePoint { pos: p.pos, handle_in: p.handle_in, handle_out: p.handle_out }).collect()
}

fn shape_cross_section(shape: &ExportShape) -> Option<CrossSection> {
    let (local, x, y, angle) = match shape {
        ExportShape::Circle { x, y, diameter, .. } => (stk_contour::circle(*diameter, stk_contour::DEFAULT_RESOLUTION), *x, *y, 0.0),
        ExportShape::Rect { x, y, angle, width, height, .. } => {
            (stk_contour::rounded_rect(*width, *height, 0.0, stk_contour::DEFAULT_RESOLUTION), *x, *y, *angle)
        }
        ExportShape::Polygon { x, y, angle, points, .. } => {
            (stk_contour::polygon(&to_curve_points(points), stk_contour::DEFAULT_RESOLUTION), *x, *y, *angle)
        }
        ExportShape::Line { x, y, angle, thickness, points, .. } => {
            let cs = stk_contour::line(*thickness, &to_curve_points(points), stk_contour::DEFAULT_RESOLUTION).ok()?;
            (cs, *x, *y, *angle)
        }
    };
    let transform = Transform2D::new(Vector2D::new(x, y), angle);
    Some(local.transformed(&transform))
}

/// Unions the outline and every shape's placed cross-section into one
/// `CrossSection`, the common input both SVG and DXF encoding share.
pub fn build_cross_section(layer: &LayerExport) -> CrossSection {
    let mut merged = if layer.outline.len() >= 3 {
        let pts: Vec<Point2D> = layer.outline.iter().map(|p| p.pos).collect();
        CrossSection::from_points(&pts)
    } else {
        CrossSection::empty()
    };
    for shape in &layer.shapes {
        if let Some(cs) = shape_cross_section(shape) {
            merged = merged.union(&cs);
        }
    }
    merged
}

pub fn to_svg(layer: &LayerExport) -> Result<String, ExportError> {
    let cs = build_cross_section(layer);
    if cs.is_empty() {
        return Err(ExportError::Degenerate("layer has no exportable 2D geometry".to_string()));
    }
    let sketch: Sketch<()> = Sketch::from_geo(GeometryCollection(vec![Geometry::MultiPolygon(cs.0)]), None);
    Ok(sketch.to_svg())
}

pub fn to_dxf(layer: &LayerExport) -> Result<Vec<u8>, ExportError> {
    let cs = build_cross_section(layer);
    if cs.is_empty() {
        return Err(ExportError::Degenerate("layer has no exportable 2D geometry".to_string()));
    }
    let slab = Manifold::from_cross_section(&cs, 0.0, DXF_EXTRUSION_HEIGHT);
    slab.0.to_dxf().map_err(|e| ExportError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{CutDirection, FileType, MachiningType};

    fn layer(shapes: Vec<ExportShape>) -> LayerExport {
        LayerExport {
            filepath: "out".into(),
            file_type: FileType::Svg,
            machining_type: MachiningType::Cut,
            cut_direction: CutDirection::Top,
            outline: vec![
                OutlinePoint { pos: Point2D::new(-20.0, -20.0), handle_in: None, handle_out: None },
                OutlinePoint { pos: Point2D::new(20.0, -20.0), handle_in: None, handle_out: None },
                OutlinePoint { pos: Point2D::new(20.0, 20.0), handle_in: None, handle_out: None },
                OutlinePoint { pos: Point2D::new(-20.0, 20.0), handle_in: None, handle_out: None },
            ],
            shapes,
            layer_thickness: 3.0,
            stl_content: None,
        }
    }

    #[test]
    fn svg_contains_path_markup() {
        let l = layer(vec![ExportShape::Circle { x: 0.0, y: 0.0, depth: 3.0, diameter: 10.0 }]);
        let svg = to_svg(&l).unwrap();
        assert!(svg.contains("path") || svg.contains("<g"));
    }

    #[test]
    fn dxf_produces_nonempty_bytes() {
        let l = layer(vec![ExportShape::Rect { x: 0.0, y: 0.0, angle: 0.0, depth: 2.0, width: 5.0, height: 5.0 }]);
        let bytes = to_dxf(&l).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn empty_layer_is_degenerate() {
        let l = LayerExport {
            filepath: "out".into(),
            file_type: FileType::Svg,
            machining_type: MachiningType::Cut,
            cut_direction: CutDirection::Top,
            outline: vec![],
            shapes: vec![],
            layer_thickness: 3.0,
            stl_content: None,
        };
        assert!(to_svg(&l).is_err());
    }
}
