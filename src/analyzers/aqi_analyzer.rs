use crate::error::{ProcessingError, Result};
use crate::models::{AirQualityRecord, AqiCategory};
use crate::writers::ParquetWriter;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub unique_cities: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub aqi_stats: AqiStats,
    pub category_counts: BTreeMap<AqiCategory, usize>,
    pub coverage: Coverage,
}

#[derive(Debug, Serialize)]
pub struct AqiStats {
    pub min_aqi: Option<f64>,
    pub max_aqi: Option<f64>,
    pub mean_aqi: Option<f64>,
    pub cleanest: Option<String>,
    pub worst: Option<String>,
}

/// How many records carry each particulate.
#[derive(Debug, Serialize)]
pub struct Coverage {
    pub total_records: usize,
    pub with_pm25: usize,
    pub with_pm10: usize,
    pub with_aqi: usize,
}

impl Coverage {
    fn percentage(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        (count as f64 / self.total_records as f64) * 100.0
    }

    pub fn pm25_percentage(&self) -> f64 {
        self.percentage(self.with_pm25)
    }

    pub fn pm10_percentage(&self) -> f64 {
        self.percentage(self.with_pm10)
    }

    pub fn aqi_percentage(&self) -> f64 {
        self.percentage(self.with_aqi)
    }
}

pub struct AqiAnalyzer;

impl AqiAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze up to `limit` records of a records Parquet file (0 = all).
    pub fn analyze_parquet_with_limit(
        &self,
        path: &Path,
        limit: usize,
    ) -> Result<DatasetStatistics> {
        let writer = ParquetWriter::new();

        let total_rows = writer.get_file_info(path)?.total_rows.max(0) as usize;
        let records_to_read = if limit == 0 {
            total_rows
        } else {
            limit.min(total_rows)
        };

        let records = writer.read_sample_records(path, records_to_read)?;
        self.analyze_records(&records)
    }

    pub fn analyze_records(&self, records: &[AirQualityRecord]) -> Result<DatasetStatistics> {
        let first = records
            .first()
            .ok_or_else(|| ProcessingError::MissingData("No records to analyze".to_string()))?;

        let mut cities = HashSet::new();
        let mut min_date = first.date;
        let mut max_date = first.date;

        let mut min_aqi: Option<(f64, &AirQualityRecord)> = None;
        let mut max_aqi: Option<(f64, &AirQualityRecord)> = None;
        let mut aqi_sum = 0.0;

        let mut category_counts: BTreeMap<AqiCategory, usize> =
            AqiCategory::ALL.into_iter().map(|c| (c, 0)).collect();
        let mut coverage = Coverage {
            total_records: records.len(),
            with_pm25: 0,
            with_pm10: 0,
            with_aqi: 0,
        };

        for record in records {
            cities.insert(record.city.as_str());
            min_date = min_date.min(record.date);
            max_date = max_date.max(record.date);

            if record.pm25.is_some() {
                coverage.with_pm25 += 1;
            }
            if record.pm10.is_some() {
                coverage.with_pm10 += 1;
            }

            if let Some(aqi) = record.aqi {
                coverage.with_aqi += 1;
                aqi_sum += aqi;

                if min_aqi.map_or(true, |(m, _)| aqi < m) {
                    min_aqi = Some((aqi, record));
                }
                if max_aqi.map_or(true, |(m, _)| aqi > m) {
                    max_aqi = Some((aqi, record));
                }
            }

            if let Some(category) = record.aqi_category {
                *category_counts.entry(category).or_default() += 1;
            }
        }

        let location = |r: &AirQualityRecord| format!("{} ({})", r.city, r.date);

        Ok(DatasetStatistics {
            total_records: records.len(),
            unique_cities: cities.len(),
            date_range: (min_date, max_date),
            aqi_stats: AqiStats {
                min_aqi: min_aqi.map(|(v, _)| v),
                max_aqi: max_aqi.map(|(v, _)| v),
                mean_aqi: (coverage.with_aqi > 0).then(|| aqi_sum / coverage.with_aqi as f64),
                cleanest: min_aqi.map(|(_, r)| location(r)),
                worst: max_aqi.map(|(_, r)| location(r)),
            },
            category_counts,
            coverage,
        })
    }
}

impl Default for AqiAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStatistics {
    pub fn summary(&self) -> String {
        let aqi_range = match (self.aqi_stats.min_aqi, self.aqi_stats.max_aqi) {
            (Some(min), Some(max)) => format!("{:.1} to {:.1}", min, max),
            _ => "No AQI values".to_string(),
        };

        format!(
            "Cities: {}\n\
            Date Range: {} to {}\n\
            Records: {} total\n\
            Coverage: {:.1}% PM2.5, {:.1}% PM10, {:.1}% AQI\n\
            AQI Range: {}",
            self.unique_cities,
            self.date_range.0,
            self.date_range.1,
            self.total_records,
            self.coverage.pm25_percentage(),
            self.coverage.pm10_percentage(),
            self.coverage.aqi_percentage(),
            aqi_range
        )
    }

    pub fn detailed_summary(&self) -> String {
        let extreme = |value: Option<f64>, location: &Option<String>| match (value, location) {
            (Some(v), Some(loc)) => format!("{:.1} at {}", v, loc),
            _ => "No AQI values".to_string(),
        };

        let mut out = format!(
            "{}\n\n\
            Extremes:\n\
            - Cleanest: {}\n\
            - Worst: {}\n\
            - Mean AQI: {}\n\n\
            Category Distribution:",
            self.summary(),
            extreme(self.aqi_stats.min_aqi, &self.aqi_stats.cleanest),
            extreme(self.aqi_stats.max_aqi, &self.aqi_stats.worst),
            self.aqi_stats
                .mean_aqi
                .map_or("No AQI values".to_string(), |m| format!("{:.1}", m)),
        );

        for (category, count) in &self.category_counts {
            let share = if self.total_records > 0 {
                (*count as f64 / self.total_records as f64) * 100.0
            } else {
                0.0
            };
            out.push_str(&format!("\n- {:<13} {:>8} ({:.1}%)", category.as_str(), count, share));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AirQualityRecordBuilder;
    use crate::processors::Aggregator;

    fn enriched(rows: &[(&str, (i32, u32, u32), f64)]) -> Vec<AirQualityRecord> {
        let mut records: Vec<AirQualityRecord> = rows
            .iter()
            .map(|(city, (y, m, d), pm25)| {
                AirQualityRecordBuilder::new()
                    .city(*city)
                    .date(NaiveDate::from_ymd_opt(*y, *m, *d).unwrap())
                    .pm25(*pm25)
                    .build()
                    .unwrap()
            })
            .collect();
        Aggregator::new().enrich(&mut records).unwrap();
        records
    }

    #[test]
    fn test_analyze_records() -> Result<()> {
        let records = enriched(&[
            ("Delhi", (2019, 11, 5), 300.0),
            ("Aizawl", (2019, 8, 1), 6.0),
            ("Delhi", (2018, 1, 1), 45.0),
        ]);

        let stats = AqiAnalyzer::new().analyze_records(&records)?;

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.unique_cities, 2);
        assert_eq!(stats.date_range.0, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(stats.aqi_stats.min_aqi, Some(10.0));
        assert_eq!(stats.aqi_stats.cleanest.as_deref(), Some("Aizawl (2019-08-01)"));
        assert_eq!(stats.category_counts[&AqiCategory::Good], 1);
        assert_eq!(stats.category_counts[&AqiCategory::Satisfactory], 1);
        assert_eq!(stats.category_counts[&AqiCategory::Severe], 1);
        assert_eq!(stats.category_counts[&AqiCategory::Poor], 0);
        assert_eq!(stats.coverage.pm10_percentage(), 0.0);
        assert!(stats.detailed_summary().contains("Very Poor"));
        Ok(())
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(AqiAnalyzer::new().analyze_records(&[]).is_err());
    }
}
