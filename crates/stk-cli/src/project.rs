//! In-memory project tree loader. Project persistence itself
//! (schema migration, incremental save) is an external collaborator and
//! out of scope; this is the minimal JSON shape this workspace's own
//! CLI/test harness uses to hand the engine a root, following the same
//! `#[serde(default = ...)]` back-compat pattern the data model types
//! already carry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stk_core::Parameter;
use stk_model::{Footprint, FootprintInstance, StackupLayer};

/// Root project tree: `{ params[], stackup[], footprints[],
/// layout[], fabPlans[], meshAssets[] }`. `fab_plans` and `mesh_assets`
/// are opaque to the geometry core so they round-trip as raw JSON rather
/// than typed fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectFile {
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub stackup: Vec<StackupLayer>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub layout: Vec<FootprintInstance>,
    #[serde(default)]
    pub fab_plans: Vec<serde_json::Value>,
    #[serde(default)]
    pub mesh_assets: Vec<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no board footprint found (none of the {0} footprints has isBoard = true)")]
    NoBoardFootprint(usize),
    #[error("footprint '{0}' not found")]
    FootprintNotFound(String),
}

impl ProjectFile {
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Indexes `footprints` by id for Flattener/SnapResolver traversal.
    pub fn library(&self) -> HashMap<String, Footprint> {
        self.footprints.iter().cloned().map(|f| (f.id.clone(), f)).collect()
    }

    /// The footprint the CLI computes layers against: an explicit id, or
    /// the project's sole board footprint.
    pub fn board_footprint(&self, explicit_id: Option<&str>) -> Result<&Footprint, ProjectError> {
        if let Some(id) = explicit_id {
            return self.footprints.iter().find(|f| f.id == id).ok_or_else(|| ProjectError::FootprintNotFound(id.to_string()));
        }
        self.footprints.iter().find(|f| f.is_board).ok_or(ProjectError::NoBoardFootprint(self.footprints.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "params": [{"id": "p1", "key": "D", "expression": "10"}],
        "stackup": [{"id": "l1", "name": "Layer 1", "type": "cut", "thickness": "3"}],
        "footprints": [{
            "id": "board", "name": "Board", "isBoard": true,
            "shapes": [
                {"type": "board_outline", "id": "o1", "name": "outline", "x": "0", "y": "0",
                 "points": [
                    {"id": "p0", "x": "-20", "y": "-20"},
                    {"id": "p1", "x": "20", "y": "-20"},
                    {"id": "p2", "x": "20", "y": "20"},
                    {"id": "p3", "x": "-20", "y": "20"}
                 ]},
                {"type": "circle", "id": "c1", "name": "hole", "x": "0", "y": "0", "diameter": "D",
                 "assignedLayers": {"l1": {"depth": "3", "endmillRadius": "0", "inputFillet": "0"}}}
            ]
        }]
    }"#;

    #[test]
    fn loads_params_stackup_and_footprints_with_defaults_applied() {
        let project = ProjectFile::from_json(MINIMAL).unwrap();
        assert_eq!(project.params.len(), 1);
        assert_eq!(project.stackup.len(), 1);
        assert_eq!(project.stackup[0].carve_side, stk_model::CarveSide::Top);
        assert_eq!(project.footprints.len(), 1);
    }

    #[test]
    fn board_footprint_resolves_by_is_board_flag() {
        let project = ProjectFile::from_json(MINIMAL).unwrap();
        let board = project.board_footprint(None).unwrap();
        assert_eq!(board.id, "board");
    }

    #[test]
    fn missing_board_footprint_is_reported() {
        let project = ProjectFile { footprints: vec![], ..Default::default() };
        assert!(matches!(project.board_footprint(None), Err(ProjectError::NoBoardFootprint(0))));
    }
}
