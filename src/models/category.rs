use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity bucket for an AQI value, ordered from cleanest to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Satisfactory,
        AqiCategory::Moderate,
        AqiCategory::Poor,
        AqiCategory::VeryPoor,
        AqiCategory::Severe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Inclusive upper AQI bound of the bucket. `Severe` is open-ended.
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            AqiCategory::Good => Some(50.0),
            AqiCategory::Satisfactory => Some(100.0),
            AqiCategory::Moderate => Some(200.0),
            AqiCategory::Poor => Some(300.0),
            AqiCategory::VeryPoor => Some(400.0),
            AqiCategory::Severe => None,
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ordering() {
        assert!(AqiCategory::Good < AqiCategory::Satisfactory);
        assert!(AqiCategory::VeryPoor < AqiCategory::Severe);
    }

    #[test]
    fn test_parse_uses_display_names() {
        assert_eq!(AqiCategory::parse("Very Poor"), Some(AqiCategory::VeryPoor));
        assert_eq!(AqiCategory::parse("VeryPoor"), None);
        assert_eq!(AqiCategory::VeryPoor.to_string(), "Very Poor");
    }
}
