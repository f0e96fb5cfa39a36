use serde::{Deserialize, Serialize};

/// Unit a parameter or point was authored in. Internal computation always
/// happens in millimetres; this only matters at the editor/expression
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "in")]
    Inches,
}

impl Default for Unit {
    fn default() -> Self {
        Unit::Millimeters
    }
}

impl Unit {
    /// Convert a value expressed in `self` into millimetres.
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Unit::Millimeters => value,
            Unit::Inches => value * 25.4,
        }
    }

    /// Convert a value in millimetres into `self`.
    pub fn from_mm(self, value_mm: f64) -> f64 {
        match self {
            Unit::Millimeters => value_mm,
            Unit::Inches => value_mm / 25.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inch_round_trip() {
        let mm = Unit::Inches.to_mm(1.0);
        assert!((mm - 25.4).abs() < 1e-10);
        let back = Unit::Inches.from_mm(mm);
        assert!((back - 1.0).abs() < 1e-10);
    }

    #[test]
    fn mm_is_identity() {
        assert!((Unit::Millimeters.to_mm(5.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn default_is_mm() {
        assert_eq!(Unit::default(), Unit::Millimeters);
    }
}
