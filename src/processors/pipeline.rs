use crate::error::Result;
use crate::models::{AirQualityRecord, AqiSummaries};
use crate::processors::{Aggregator, ImputationStats};
use crate::readers::{ConcurrentReader, LoadReport};
use crate::utils::progress::ProgressReporter;
use crate::utils::text::normalize_city;
use std::path::Path;
use tracing::info;

/// Everything produced by one run over an input path.
#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<AirQualityRecord>,
    pub summaries: AqiSummaries,
    pub load_report: LoadReport,
    pub imputation: ImputationStats,
}

/// Load, enrich and summarize CPCB data.
pub struct AqiPipeline {
    max_workers: usize,
    use_mmap: bool,
    city: Option<String>,
}

impl AqiPipeline {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            use_mmap: false,
            city: None,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Restrict the run to one city (matched after normalization).
    pub fn with_city_filter(mut self, city: Option<String>) -> Self {
        self.city = city.map(|c| normalize_city(&c));
        self
    }

    pub async fn process_path(
        &self,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        if let Some(p) = progress {
            p.set_message("Reading air quality data...");
        }

        let reader = ConcurrentReader::new(self.max_workers).with_mmap(self.use_mmap);
        let (records, load_report) = reader.read_path(path).await?;

        if let Some(p) = progress {
            p.set_message(&format!("Enriching {} records...", records.len()));
        }

        let output = self.process_records(records, load_report)?;

        if let Some(p) = progress {
            p.finish_with_message("Processing complete");
        }

        Ok(output)
    }

    /// Filter, enrich and summarize records that are already loaded.
    pub fn process_records(
        &self,
        mut records: Vec<AirQualityRecord>,
        load_report: LoadReport,
    ) -> Result<PipelineOutput> {
        if let Some(city) = &self.city {
            records.retain(|r| &r.city == city);
            info!(%city, records = records.len(), "Filtered to a single city");
        }

        let aggregator = Aggregator::new();
        let imputation = aggregator.enrich(&mut records)?;
        let summaries = aggregator.rollup(&records);

        Ok(PipelineOutput {
            records,
            summaries,
            load_report,
            imputation,
        })
    }
}

impl Default for AqiPipeline {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AirQualityRecordBuilder;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn records() -> Vec<AirQualityRecord> {
        let date = NaiveDate::from_ymd_opt(2020, 2, 2).unwrap();
        vec![
            AirQualityRecordBuilder::new()
                .city("Jaipur")
                .date(date)
                .pm25(70.0)
                .build()
                .unwrap(),
            AirQualityRecordBuilder::new()
                .city("Kochi")
                .date(date)
                .pm10(30.0)
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_city_filter_is_normalized() -> Result<()> {
        let pipeline = AqiPipeline::new(1).with_city_filter(Some("  jaipur ".to_string()));
        let output = pipeline.process_records(records(), LoadReport::default())?;

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.summaries.city.len(), 1);
        assert_eq!(output.imputation.imputed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_process_path_end_to_end() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("city_day.csv"),
            "City,Date,PM2.5,PM10,AQI,AQI_Bucket\n\
            Delhi,01-12-2019,300,,,\n\
            Delhi,02-12-2019,45,80,,\n\
            Delhi,03-12-2019,,,,\n",
        )?;

        let output = AqiPipeline::new(2).process_path(dir.path(), None).await?;

        assert_eq!(output.load_report.loaded, 2);
        assert_eq!(output.load_report.missing_particulates, 1);
        assert_eq!(output.imputation.imputed, 2);
        assert_eq!(output.summaries.total_records(), 2);
        assert!(output.records.iter().all(|r| r.is_enriched()));
        Ok(())
    }
}
