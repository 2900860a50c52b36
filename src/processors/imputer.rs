use serde::Serialize;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::models::{AirQualityRecord, Pollutant};
use crate::processors::breakpoints::{BreakpointTable, SubIndex};

/// What `impute` did to a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imputation {
    /// The record already carried an AQI
    Unchanged,
    Imputed { aqi: f64, ceiling_hit: bool },
}

/// Fills a missing AQI from the record's PM2.5/PM10 concentrations.
///
/// The AQI is the worst (largest) sub-index among the particulates that are
/// actually present. An absent concentration contributes nothing.
pub struct AqiImputer {
    table: &'static BreakpointTable,
}

impl AqiImputer {
    pub fn new() -> Self {
        Self {
            table: BreakpointTable::cpcb(),
        }
    }

    /// Sub-indices for every particulate present on the record.
    pub fn sub_indices(&self, record: &AirQualityRecord) -> Vec<(Pollutant, SubIndex)> {
        Pollutant::ALL
            .into_iter()
            .filter_map(|pollutant| {
                record
                    .concentration(pollutant)
                    .map(|c| (pollutant, self.table.sub_index(pollutant, c)))
            })
            .collect()
    }

    /// Fill `record.aqi` when it is missing.
    pub fn impute(&self, record: &mut AirQualityRecord) -> Result<Imputation> {
        let outcome = self.assess(record)?;
        if let Imputation::Imputed { aqi, .. } = outcome {
            record.aqi = Some(aqi);
        }
        Ok(outcome)
    }

    /// Work out what `impute` would do without touching the record.
    pub fn assess(&self, record: &AirQualityRecord) -> Result<Imputation> {
        if record.aqi.is_some() {
            return Ok(Imputation::Unchanged);
        }

        let sub_indices = self.sub_indices(record);
        if sub_indices.is_empty() {
            return Err(ProcessingError::MissingInput {
                city: record.city.clone(),
                date: record.date,
            });
        }

        let mut aqi = f64::NEG_INFINITY;
        let mut ceiling_hit = false;

        for (pollutant, sub_index) in &sub_indices {
            if sub_index.is_ceiling() {
                ceiling_hit = true;
                warn!(
                    city = %record.city,
                    date = %record.date,
                    pollutant = %pollutant,
                    concentration = ?record.concentration(*pollutant),
                    limit = self.table.max_concentration(*pollutant),
                    "Concentration outside breakpoint table, using AQI ceiling"
                );
            }
            aqi = aqi.max(sub_index.value());
        }

        Ok(Imputation::Imputed { aqi, ceiling_hit })
    }
}

impl Default for AqiImputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters collected while enriching a record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImputationStats {
    pub total_records: usize,
    pub source_aqi: usize,
    pub imputed: usize,
    /// Imputed records where at least one particulate exceeded the table
    pub ceiling_hits: usize,
}

impl ImputationStats {
    pub fn record(&mut self, outcome: &Imputation) {
        self.total_records += 1;
        match outcome {
            Imputation::Unchanged => self.source_aqi += 1,
            Imputation::Imputed { ceiling_hit, .. } => {
                self.imputed += 1;
                if *ceiling_hit {
                    self.ceiling_hits += 1;
                }
            }
        }
    }

    pub fn merge(mut self, other: ImputationStats) -> Self {
        self.total_records += other.total_records;
        self.source_aqi += other.source_aqi;
        self.imputed += other.imputed;
        self.ceiling_hits += other.ceiling_hits;
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "AQI Enrichment:\n\
            - Records: {}\n\
            - Source AQI kept: {}\n\
            - AQI imputed from PM2.5/PM10: {}\n\
            - Concentrations beyond breakpoint table: {}",
            self.total_records, self.source_aqi, self.imputed, self.ceiling_hits
        )
    }
}
