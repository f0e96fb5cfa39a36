//! The layer-export contract: everything
//! needed to produce one SVG, DXF, or STL file for a finished layer.

use stk_core::geometry::{Point2D, Vector2D};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Svg,
    Dxf,
    Stl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachiningType {
    Cut,
    Carved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutDirection {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy)]
pub struct OutlinePoint {
    pub pos: Point2D,
    pub handle_in: Option<Vector2D>,
    pub handle_out: Option<Vector2D>,
}

#[derive(Debug, Clone)]
pub enum ExportShape {
    Circle { x: f64, y: f64, depth: f64, diameter: f64 },
    Rect { x: f64, y: f64, angle: f64, depth: f64, width: f64, height: f64 },
    Polygon { x: f64, y: f64, angle: f64, depth: f64, points: Vec<OutlinePoint> },
    Line { x: f64, y: f64, angle: f64, depth: f64, thickness: f64, points: Vec<OutlinePoint> },
}

/// One finished layer, ready to hand to an exporter.
pub struct LayerExport {
    pub filepath: String,
    pub file_type: FileType,
    pub machining_type: MachiningType,
    pub cut_direction: CutDirection,
    pub outline: Vec<OutlinePoint>,
    pub shapes: Vec<ExportShape>,
    pub layer_thickness: f64,
    /// Pre-encoded binary STL bytes, required when `file_type`
    /// is `Stl`. Built upstream from the layer's `Manifold` via the
    /// geometry kernel's own STL writer.
    pub stl_content: Option<Vec<u8>>,
}
