use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{
    AirQualityRecord, AqiCategory, AqiSummaries, CitySummary, DailySummary, Season,
    SeasonalSummary, YearlySummary,
};
use crate::processors::classifier::classify;
use crate::processors::imputer::{AqiImputer, Imputation, ImputationStats};

/// Missing-aware mean/min/max for one metric.
///
/// Values are kept and summed in sorted order, so the mean does not depend
/// on the order records arrive in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricAccumulator {
    values: Vec<f64>,
}

impl MetricAccumulator {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.values.push(value);
        }
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }

        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().min_by(f64::total_cmp)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().max_by(f64::total_cmp)
    }
}

/// Everything a summary row may need from one group.
#[derive(Debug, Clone, Default)]
pub struct GroupStats {
    pub count: usize,
    pub aqi: MetricAccumulator,
    pub pm25: MetricAccumulator,
    pub pm10: MetricAccumulator,
}

impl GroupStats {
    fn push(&mut self, record: &AirQualityRecord) {
        self.count += 1;
        self.aqi.push(record.aqi);
        self.pm25.push(record.pm25);
        self.pm10.push(record.pm10);
    }
}

/// A rollup row: how records are keyed and which metrics the row keeps.
pub trait SummaryRow: Sized {
    type Key: Ord;

    fn key(record: &AirQualityRecord) -> Self::Key;
    fn from_group(key: Self::Key, stats: &GroupStats) -> Self;
}

impl SummaryRow for DailySummary {
    type Key = NaiveDate;

    fn key(record: &AirQualityRecord) -> Self::Key {
        record.date
    }

    fn from_group(date: NaiveDate, stats: &GroupStats) -> Self {
        Self {
            date,
            count: stats.count,
            avg_aqi: stats.aqi.mean(),
            min_aqi: stats.aqi.min(),
            max_aqi: stats.aqi.max(),
            avg_pm25: stats.pm25.mean(),
            avg_pm10: stats.pm10.mean(),
        }
    }
}

impl SummaryRow for CitySummary {
    type Key = String;

    fn key(record: &AirQualityRecord) -> Self::Key {
        record.city.clone()
    }

    fn from_group(city: String, stats: &GroupStats) -> Self {
        Self {
            city,
            count: stats.count,
            avg_aqi: stats.aqi.mean(),
            min_aqi: stats.aqi.min(),
            max_aqi: stats.aqi.max(),
            avg_pm25: stats.pm25.mean(),
            avg_pm10: stats.pm10.mean(),
        }
    }
}

impl SummaryRow for YearlySummary {
    type Key = (i32, String);

    fn key(record: &AirQualityRecord) -> Self::Key {
        (record.year, record.city.clone())
    }

    fn from_group((year, city): (i32, String), stats: &GroupStats) -> Self {
        Self {
            year,
            city,
            count: stats.count,
            avg_aqi: stats.aqi.mean(),
        }
    }
}

impl SummaryRow for SeasonalSummary {
    type Key = (Season, String);

    fn key(record: &AirQualityRecord) -> Self::Key {
        (record.season, record.city.clone())
    }

    fn from_group((season, city): (Season, String), stats: &GroupStats) -> Self {
        Self {
            season,
            city,
            count: stats.count,
            avg_aqi: stats.aqi.mean(),
        }
    }
}

/// Group records by `R::key` and reduce each group into a row, in key order.
pub fn group_and_reduce<R: SummaryRow>(records: &[AirQualityRecord]) -> Vec<R> {
    let mut groups: BTreeMap<R::Key, GroupStats> = BTreeMap::new();

    for record in records {
        groups.entry(R::key(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, stats)| R::from_group(key, &stats))
        .collect()
}

/// Drives imputation, classification and the four rollups.
pub struct Aggregator {
    imputer: AqiImputer,
    parallel: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            imputer: AqiImputer::new(),
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Impute and classify every record, then build the four rollups.
    pub fn summarize(&self, records: &mut [AirQualityRecord]) -> Result<AqiSummaries> {
        self.enrich(records)?;
        Ok(self.rollup(records))
    }

    /// Fill missing AQIs, then assign a category to every record.
    ///
    /// Records are only written once every one of them has been imputed and
    /// classified. On error the slice is left exactly as it was passed in.
    pub fn enrich(&self, records: &mut [AirQualityRecord]) -> Result<ImputationStats> {
        let outcomes: Vec<Imputation> = if self.parallel {
            records
                .par_iter()
                .map(|record| self.imputer.assess(record))
                .collect::<Result<_>>()?
        } else {
            records
                .iter()
                .map(|record| self.imputer.assess(record))
                .collect::<Result<_>>()?
        };

        // Classification only starts once every record has an AQI
        let categories: Vec<AqiCategory> = if self.parallel {
            records
                .par_iter()
                .zip(outcomes.par_iter())
                .map(|(record, outcome)| categorize(record, outcome))
                .collect::<Result<_>>()?
        } else {
            records
                .iter()
                .zip(outcomes.iter())
                .map(|(record, outcome)| categorize(record, outcome))
                .collect::<Result<_>>()?
        };

        let mut stats = ImputationStats::default();
        for ((record, outcome), category) in records.iter_mut().zip(&outcomes).zip(categories) {
            if let Imputation::Imputed { aqi, .. } = outcome {
                record.aqi = Some(*aqi);
            }
            record.aqi_category = Some(category);
            stats.record(outcome);
        }

        info!(
            records = stats.total_records,
            imputed = stats.imputed,
            ceiling_hits = stats.ceiling_hits,
            "Enriched air quality records"
        );

        Ok(stats)
    }

    /// Build the four rollups from already enriched records.
    pub fn rollup(&self, records: &[AirQualityRecord]) -> AqiSummaries {
        let ((daily, city), (yearly, seasonal)) = if self.parallel {
            rayon::join(
                || {
                    rayon::join(
                        || group_and_reduce::<DailySummary>(records),
                        || group_and_reduce::<CitySummary>(records),
                    )
                },
                || {
                    rayon::join(
                        || group_and_reduce::<YearlySummary>(records),
                        || group_and_reduce::<SeasonalSummary>(records),
                    )
                },
            )
        } else {
            (
                (
                    group_and_reduce::<DailySummary>(records),
                    group_and_reduce::<CitySummary>(records),
                ),
                (
                    group_and_reduce::<YearlySummary>(records),
                    group_and_reduce::<SeasonalSummary>(records),
                ),
            )
        };

        debug!(
            daily = daily.len(),
            city = city.len(),
            yearly = yearly.len(),
            seasonal = seasonal.len(),
            "Built summary tables"
        );

        AqiSummaries {
            daily,
            city,
            yearly,
            seasonal,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn categorize(record: &AirQualityRecord, outcome: &Imputation) -> Result<AqiCategory> {
    let aqi = match outcome {
        Imputation::Imputed { aqi, .. } => *aqi,
        Imputation::Unchanged => record.aqi.ok_or_else(|| ProcessingError::MissingInput {
            city: record.city.clone(),
            date: record.date,
        })?,
    };
    classify(aqi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AirQualityRecordBuilder, AqiCategory};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        city: &str,
        date: NaiveDate,
        pm25: Option<f64>,
        pm10: Option<f64>,
        aqi: Option<f64>,
    ) -> AirQualityRecord {
        AirQualityRecordBuilder::new()
            .city(city)
            .date(date)
            .particulates(pm25, pm10)
            .aqi(aqi)
            .build()
            .unwrap()
    }

    fn sample_records() -> Vec<AirQualityRecord> {
        vec![
            record("Delhi", date(2019, 1, 1), Some(45.0), Some(80.0), None),
            record("Delhi", date(2019, 1, 2), Some(250.0), None, Some(410.0)),
            record("Delhi", date(2020, 7, 1), None, Some(40.0), Some(38.0)),
            record("Chennai", date(2019, 1, 1), Some(20.0), None, Some(60.0)),
            record("Chennai", date(2019, 10, 5), None, Some(120.0), None),
        ]
    }

    #[test]
    fn test_metric_accumulator_ignores_missing() {
        let mut acc = MetricAccumulator::default();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.min(), None);

        acc.push(Some(30.0));
        acc.push(None);
        acc.push(Some(10.0));

        assert_eq!(acc.count(), 2);
        assert_eq!(acc.mean(), Some(20.0));
        assert_eq!(acc.min(), Some(10.0));
        assert_eq!(acc.max(), Some(30.0));
    }

    #[test]
    fn test_summarize_enriches_every_record() {
        let mut records = sample_records();
        let summaries = Aggregator::new().summarize(&mut records).unwrap();

        assert!(records.iter().all(|r| r.is_enriched()));
        assert!((records[0].aqi.unwrap() - 80.4).abs() < 1e-9);
        assert_eq!(records[0].aqi_category, Some(AqiCategory::Satisfactory));
        assert_eq!(records[1].aqi_category, Some(AqiCategory::Severe));
        assert_eq!(records[2].aqi_category, Some(AqiCategory::Good));
        assert_eq!(summaries.total_records(), records.len());
    }

    #[test]
    fn test_daily_and_city_metrics() {
        let mut records = sample_records();
        let summaries = Aggregator::new().summarize(&mut records).unwrap();

        let new_year = summaries.find_daily(date(2019, 1, 1)).unwrap();
        assert_eq!(new_year.count, 2);
        assert!((new_year.avg_aqi.unwrap() - (80.4 + 60.0) / 2.0).abs() < 1e-9);
        assert_eq!(new_year.min_aqi, Some(60.0));
        assert!((new_year.max_aqi.unwrap() - 80.4).abs() < 1e-9);
        assert_eq!(new_year.avg_pm25, Some(32.5));
        assert_eq!(new_year.avg_pm10, Some(80.0));

        let delhi = summaries.find_city("Delhi").unwrap();
        assert_eq!(delhi.count, 3);
        assert_eq!(delhi.min_aqi, Some(38.0));
        assert_eq!(delhi.max_aqi, Some(410.0));
        assert_eq!(delhi.avg_pm25, Some(147.5));
        assert_eq!(delhi.avg_pm10, Some(60.0));
    }

    #[test]
    fn test_missing_metric_is_undefined_not_zero() {
        let mut records = sample_records();
        let summaries = Aggregator::new().summarize(&mut records).unwrap();

        // Only Delhi reported on 2019-01-02, and only PM2.5
        let day = summaries.find_daily(date(2019, 1, 2)).unwrap();
        assert_eq!(day.count, 1);
        assert_eq!(day.avg_pm25, Some(250.0));
        assert_eq!(day.avg_pm10, None);
    }

    #[test]
    fn test_yearly_and_seasonal_groups() {
        let mut records = sample_records();
        let summaries = Aggregator::new().summarize(&mut records).unwrap();

        assert_eq!(summaries.yearly.len(), 3);
        let delhi_2019 = summaries.find_yearly(2019, "Delhi").unwrap();
        assert_eq!(delhi_2019.count, 2);
        assert!((delhi_2019.avg_aqi.unwrap() - (80.4 + 410.0) / 2.0).abs() < 1e-9);

        let chennai_autumn = summaries
            .find_seasonal(Season::Autumn, "Chennai")
            .unwrap();
        assert_eq!(chennai_autumn.count, 1);
        // PM10 120 falls in (100, 250) -> 101 + 99 * 20 / 150
        assert!((chennai_autumn.avg_aqi.unwrap() - 114.2).abs() < 1e-9);

        assert!(summaries.find_seasonal(Season::Monsoon, "Delhi").is_some());
        assert!(summaries.find_seasonal(Season::Summer, "Delhi").is_none());
    }

    #[test]
    fn test_city_counts_cover_all_records() {
        let mut records = sample_records();
        let summaries = Aggregator::new().summarize(&mut records).unwrap();

        let total: usize = summaries.city.iter().map(|row| row.count).sum();
        assert_eq!(total, records.len());
        let total: usize = summaries.seasonal.iter().map(|row| row.count).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn test_summaries_independent_of_input_order() {
        let mut forward = sample_records();
        let mut reversed = sample_records();
        reversed.reverse();

        let a = Aggregator::new().summarize(&mut forward).unwrap();
        let b = Aggregator::new()
            .with_parallel(false)
            .summarize(&mut reversed)
            .unwrap();

        for row in &a.city {
            let other = b.find_city(&row.city).unwrap();
            assert_eq!(row.count, other.count);
            assert!((row.avg_aqi.unwrap() - other.avg_aqi.unwrap()).abs() < 1e-9);
            assert_eq!(row.min_aqi, other.min_aqi);
            assert_eq!(row.max_aqi, other.max_aqi);
        }
        for row in &a.daily {
            let other = b.find_daily(row.date).unwrap();
            assert_eq!(row.count, other.count);
            assert_eq!(row.max_aqi, other.max_aqi);
        }
        assert_eq!(a.yearly.len(), b.yearly.len());
        assert_eq!(a.seasonal.len(), b.seasonal.len());
    }

    #[test]
    fn test_record_without_particulates_or_aqi_fails() {
        let mut records = sample_records();
        records.push(AirQualityRecord::new("Agra".to_string(), date(2019, 3, 3)));

        let result = Aggregator::new().summarize(&mut records);
        assert!(matches!(result, Err(ProcessingError::MissingInput { .. })));
    }

    #[test]
    fn test_failed_enrich_leaves_records_untouched() {
        let mut records = sample_records();
        records.push(AirQualityRecord::new("Agra".to_string(), date(2019, 3, 3)));
        let before = records.clone();

        for parallel in [true, false] {
            let result = Aggregator::new()
                .with_parallel(parallel)
                .enrich(&mut records);

            assert!(result.is_err());
            assert_eq!(records, before);
        }
    }

    #[test]
    fn test_mean_is_exact_under_reordering() {
        let build = |values: &[f64]| -> Vec<AirQualityRecord> {
            values
                .iter()
                .enumerate()
                .map(|(i, aqi)| {
                    let day = date(2019, 1, 1 + i as u32);
                    record("Delhi", day, None, None, Some(*aqi))
                })
                .collect()
        };

        let mut forward = build(&[0.1, 0.2, 0.3]);
        let mut reversed = build(&[0.3, 0.2, 0.1]);
        let mut rotated = build(&[0.2, 0.3, 0.1]);

        let aggregator = Aggregator::new().with_parallel(false);
        let a = aggregator.summarize(&mut forward).unwrap();
        let b = aggregator.summarize(&mut reversed).unwrap();
        let c = aggregator.summarize(&mut rotated).unwrap();

        assert_eq!(a.city, b.city);
        assert_eq!(a.city, c.city);
        assert_eq!(a.yearly, b.yearly);
        assert_eq!(a.seasonal, c.seasonal);
    }

    #[test]
    fn test_empty_input_gives_empty_tables() {
        let mut records: Vec<AirQualityRecord> = Vec::new();
        let summaries = Aggregator::new().summarize(&mut records).unwrap();

        assert_eq!(summaries, AqiSummaries::default());
    }
}
