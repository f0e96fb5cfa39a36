//! CAM profile configuration: a named, TOML-loadable bundle of tool
//! diameter, step-down, step-over, and chuck-clearance settings.

use serde::{Deserialize, Serialize};
use stk_toolpath::CamConfig;

/// A named, TOML-loadable CAM profile: tool diameter, step-down,
/// step-over, and chuck clearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CamProfile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_tool_diameter")]
    pub tool_diameter: f64,
    #[serde(default = "default_step_down")]
    pub step_down: f64,
    #[serde(default = "default_step_over")]
    pub step_over: f64,
    #[serde(default)]
    pub chuck_clearance: f64,
}

fn default_name() -> String {
    "default".to_string()
}
fn default_tool_diameter() -> f64 {
    3.175
}
fn default_step_down() -> f64 {
    1.0
}
fn default_step_over() -> f64 {
    1.5
}

impl Default for CamProfile {
    fn default() -> Self {
        CamProfile {
            name: default_name(),
            tool_diameter: default_tool_diameter(),
            step_down: default_step_down(),
            step_over: default_step_over(),
            chuck_clearance: 0.0,
        }
    }
}

impl CamProfile {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_cam_config(&self) -> CamConfig {
        CamConfig {
            tool_diameter: self.tool_diameter,
            step_down: self.step_down,
            step_over: self.step_over,
            chuck_clearance: self.chuck_clearance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let profile = CamProfile::from_toml("name = \"quarter_inch\"\ntool_diameter = 6.35\n").unwrap();
        assert_eq!(profile.name, "quarter_inch");
        assert_eq!(profile.tool_diameter, 6.35);
        assert_eq!(profile.step_down, 1.0);
    }

    #[test]
    fn default_profile_matches_a_small_endmill() {
        let profile = CamProfile::default();
        let config = profile.to_cam_config();
        assert_eq!(config.tool_diameter, 3.175);
    }
}
