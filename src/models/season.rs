use serde::{Deserialize, Serialize};
use std::fmt;

/// Indian meteorological seasons used for the seasonal rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Summer,
    Monsoon,
    Autumn,
    /// Fallback for a month outside 1..=12
    Unknown,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Summer,
            6..=9 => Season::Monsoon,
            10 | 11 => Season::Autumn,
            _ => Season::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Summer => "Summer",
            Season::Monsoon => "Monsoon",
            Season::Autumn => "Autumn",
            Season::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_to_season() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Summer);
        assert_eq!(Season::from_month(5), Season::Summer);
        assert_eq!(Season::from_month(6), Season::Monsoon);
        assert_eq!(Season::from_month(9), Season::Monsoon);
        assert_eq!(Season::from_month(10), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
    }

    #[test]
    fn test_out_of_range_month_falls_back() {
        assert_eq!(Season::from_month(0), Season::Unknown);
        assert_eq!(Season::from_month(13), Season::Unknown);
    }
}
