use crate::error::{ProcessingError, Result};
use crate::models::Pollutant;
use crate::utils::constants::AQI_CEILING;

/// A concentration range mapped linearly onto an AQI range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub conc_low: f64,
    pub conc_high: f64,
    pub index_low: f64,
    pub index_high: f64,
}

impl Bracket {
    pub const fn new(conc_low: f64, conc_high: f64, index_low: f64, index_high: f64) -> Self {
        Self {
            conc_low,
            conc_high,
            index_low,
            index_high,
        }
    }

    /// Inclusive at both ends. NaN never matches.
    pub fn contains(&self, concentration: f64) -> bool {
        self.conc_low <= concentration && concentration <= self.conc_high
    }

    pub fn interpolate(&self, concentration: f64) -> f64 {
        // Multiplying before dividing keeps both endpoints exact.
        self.index_low
            + (self.index_high - self.index_low) * (concentration - self.conc_low)
                / (self.conc_high - self.conc_low)
    }
}

const PM25_BRACKETS: [Bracket; 6] = [
    Bracket::new(0.0, 30.0, 0.0, 50.0),
    Bracket::new(30.0, 60.0, 51.0, 100.0),
    Bracket::new(60.0, 90.0, 101.0, 200.0),
    Bracket::new(90.0, 120.0, 201.0, 300.0),
    Bracket::new(120.0, 250.0, 301.0, 400.0),
    Bracket::new(250.0, 380.0, 401.0, 500.0),
];

const PM10_BRACKETS: [Bracket; 6] = [
    Bracket::new(0.0, 50.0, 0.0, 50.0),
    Bracket::new(50.0, 100.0, 51.0, 100.0),
    Bracket::new(100.0, 250.0, 101.0, 200.0),
    Bracket::new(250.0, 350.0, 201.0, 300.0),
    Bracket::new(350.0, 430.0, 301.0, 400.0),
    Bracket::new(430.0, 510.0, 401.0, 500.0),
];

/// Result of looking a concentration up in a pollutant's brackets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubIndex {
    Interpolated(f64),
    /// No bracket matched; the value is pinned to the table ceiling
    Ceiling,
}

impl SubIndex {
    pub fn value(&self) -> f64 {
        match self {
            SubIndex::Interpolated(value) => *value,
            SubIndex::Ceiling => AQI_CEILING,
        }
    }

    pub fn is_ceiling(&self) -> bool {
        matches!(self, SubIndex::Ceiling)
    }
}

/// Immutable per-pollutant breakpoint brackets, ascending by concentration.
#[derive(Debug, Clone, Copy)]
pub struct BreakpointTable {
    pm25: &'static [Bracket],
    pm10: &'static [Bracket],
}

/// CPCB National AQI breakpoints for PM2.5 and PM10 (24-hour averages).
pub static CPCB_BREAKPOINTS: BreakpointTable = BreakpointTable {
    pm25: &PM25_BRACKETS,
    pm10: &PM10_BRACKETS,
};

impl BreakpointTable {
    pub fn cpcb() -> &'static BreakpointTable {
        &CPCB_BREAKPOINTS
    }

    pub fn brackets(&self, pollutant: Pollutant) -> &'static [Bracket] {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
        }
    }

    /// Upper concentration limit covered by the table.
    pub fn max_concentration(&self, pollutant: Pollutant) -> f64 {
        self.brackets(pollutant)
            .last()
            .map(|b| b.conc_high)
            .unwrap_or(0.0)
    }

    pub fn sub_index(&self, pollutant: Pollutant, concentration: f64) -> SubIndex {
        match find_bracket(concentration, self.brackets(pollutant)) {
            Some(bracket) => SubIndex::Interpolated(bracket.interpolate(concentration)),
            None => SubIndex::Ceiling,
        }
    }

    /// Check that every pollutant's brackets start at zero, ascend, and are contiguous.
    pub fn validate(&self) -> Result<()> {
        for pollutant in Pollutant::ALL {
            let brackets = self.brackets(pollutant);

            let first = brackets.first().ok_or_else(|| {
                ProcessingError::Config(format!("No breakpoints defined for {}", pollutant))
            })?;
            if first.conc_low != 0.0 {
                return Err(ProcessingError::Config(format!(
                    "{} breakpoints start at {} instead of 0",
                    pollutant, first.conc_low
                )));
            }

            for bracket in brackets {
                if bracket.conc_low >= bracket.conc_high || bracket.index_low > bracket.index_high {
                    return Err(ProcessingError::Config(format!(
                        "{} bracket {:?} is not ascending",
                        pollutant, bracket
                    )));
                }
            }

            for window in brackets.windows(2) {
                if window[0].conc_high != window[1].conc_low {
                    return Err(ProcessingError::Config(format!(
                        "{} brackets are not contiguous at {} / {}",
                        pollutant, window[0].conc_high, window[1].conc_low
                    )));
                }
                if window[0].index_high > window[1].index_low {
                    return Err(ProcessingError::Config(format!(
                        "{} index ranges overlap at concentration {}",
                        pollutant, window[0].conc_high
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        CPCB_BREAKPOINTS
    }
}

/// First bracket containing the concentration, scanning in ascending order.
pub fn find_bracket(concentration: f64, brackets: &[Bracket]) -> Option<&Bracket> {
    brackets.iter().find(|b| b.contains(concentration))
}

/// Sub-index for a concentration, or [`AQI_CEILING`] when no bracket matches
/// (above the table or not a number).
pub fn interpolate(concentration: f64, brackets: &[Bracket]) -> f64 {
    find_bracket(concentration, brackets)
        .map(|b| b.interpolate(concentration))
        .unwrap_or(AQI_CEILING)
}
