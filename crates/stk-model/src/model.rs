//! The symbolic footprint data model. All numeric fields carry
//! expression text rather than evaluated floats — evaluation happens
//! against a resolved parameter scope in `snap` / `flatten` / downstream
//! crates, matching the external project-file contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A 2D handle (bezier control offset) expressed as expression text.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HandleExpr {
    pub dx: String,
    pub dy: String,
}

/// A single authored point: either explicit coordinates or a snap-to path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: String,
    #[serde(default)]
    pub x: String,
    #[serde(default)]
    pub y: String,
    #[serde(default)]
    pub handle_in: Option<HandleExpr>,
    #[serde(default)]
    pub handle_out: Option<HandleExpr>,
    /// A colon-separated id path `id1:id2:...:idN`. Overrides x/y when present.
    #[serde(default)]
    pub snap_to: Option<String>,
}

/// Per-(shape, layer) cut parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayerAssignment {
    #[serde(default)]
    pub depth: String,
    #[serde(default)]
    pub endmill_radius: String,
    #[serde(default)]
    pub input_fillet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarveSide {
    Top,
    Bottom,
}

impl Default for CarveSide {
    fn default() -> Self {
        CarveSide::Top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Cut,
    Carved,
}

/// A single sheet in the stackup. Index 0 is
/// topmost; ordering within the containing `Vec` is the stackup order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackupLayer {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub thickness: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub carve_side: CarveSide,
}

fn default_color() -> String {
    "#1f77b4".to_string() // tableau10[0], per the loader back-compat rule
}

/// Tableau10, used by the loader when `color` is missing.
pub const TABLEAU10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// An editor-authored shape plus its per-layer cut assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub assigned_layers: HashMap<String, LayerAssignment>,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieDown {
    pub footprint_id: String,
    /// Arclength along the line, in mm, as an expression.
    pub distance: String,
    /// Extra rotation applied on top of perpendicular-to-curve, as an expression.
    pub angle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Circle {
        x: String,
        y: String,
        diameter: String,
    },
    Rect {
        x: String,
        y: String,
        width: String,
        height: String,
        #[serde(default = "zero_expr")]
        angle: String,
        #[serde(default = "zero_expr")]
        corner_radius: String,
    },
    Polygon {
        x: String,
        y: String,
        points: Vec<Point>,
    },
    Line {
        thickness: String,
        points: Vec<Point>,
        #[serde(default)]
        tie_downs: Vec<TieDown>,
    },
    WireGuide {
        x: String,
        y: String,
        #[serde(default)]
        handle: Option<HandleExpr>,
    },
    BoardOutline {
        x: String,
        y: String,
        points: Vec<Point>,
    },
    FootprintReference {
        x: String,
        y: String,
        #[serde(default = "zero_expr")]
        angle: String,
        footprint_id: String,
    },
    Union {
        x: String,
        y: String,
        #[serde(default = "zero_expr")]
        angle: String,
        shapes: Vec<ShapeNode>,
        #[serde(default)]
        assigned_layers: Option<HashMap<String, LayerAssignment>>,
    },
    SplitLine {
        x: String,
        y: String,
        end_x: String,
        end_y: String,
        #[serde(default)]
        dovetail_positions: Vec<String>,
        dovetail_width: String,
        dovetail_height: String,
        #[serde(default)]
        flip: bool,
    },
    Text {
        x: String,
        y: String,
        #[serde(default = "zero_expr")]
        angle: String,
        text: String,
        font_size: String,
        anchor: String,
    },
}

fn zero_expr() -> String {
    "0".to_string()
}

/// A parametric 2D definition of shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footprint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_board: bool,
    pub shapes: Vec<ShapeNode>,
    /// Maps stackup layer id -> the BoardOutline shape id used as that
    /// layer's base extrusion.
    #[serde(default)]
    pub board_outline_assignments: HashMap<String, String>,
}

impl Footprint {
    pub fn find_shape<'a>(&'a self, id: &str) -> Option<&'a ShapeNode> {
        fn search<'a>(shapes: &'a [ShapeNode], id: &str) -> Option<&'a ShapeNode> {
            for s in shapes {
                if s.id == id {
                    return Some(s);
                }
                if let ShapeKind::Union { shapes: children, .. } = &s.kind {
                    if let Some(found) = search(children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        search(&self.shapes, id)
    }

    /// The BoardOutline assigned to `layer_id`, falling back to the first
    /// BoardOutline shape in the footprint.
    pub fn board_outline_for_layer<'a>(&'a self, layer_id: &str) -> Option<&'a ShapeNode> {
        if let Some(shape_id) = self.board_outline_assignments.get(layer_id) {
            if let Some(shape) = self.find_shape(shape_id) {
                if matches!(shape.kind, ShapeKind::BoardOutline { .. }) {
                    return Some(shape);
                }
            }
        }
        self.shapes
            .iter()
            .find(|s| matches!(s.kind, ShapeKind::BoardOutline { .. }))
    }
}

/// A named collection of footprints, indexed by id, for reference resolution.
pub type FootprintLibrary = HashMap<String, Footprint>;

/// A placed instance of a footprint at the layout level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintInstance {
    pub id: String,
    pub footprint_id: String,
    pub name: String,
    pub x: String,
    pub y: String,
    #[serde(default = "zero_expr")]
    pub angle: String,
}
