use crate::error::{ProcessingError, Result};
use crate::models::{
    AirQualityRecord, AqiCategory, AqiSummaries, CitySummary, DailySummary, SeasonalSummary,
    YearlySummary,
};
use crate::utils::constants::{
    CITY_FILE, DAILY_FILE, DEFAULT_ROW_GROUP_SIZE, RECORDS_FILE, SEASONAL_FILE, YEARLY_FILE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Which table a Parquet file holds, judged from its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Records,
    Daily,
    City,
    Yearly,
    Seasonal,
    Unknown,
}

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn writer_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    fn write_batch(&self, batch: RecordBatch, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer =
            ArrowWriter::try_new(file, batch.schema(), Some(self.writer_properties()))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    /// Write enriched records to a Parquet file
    pub fn write_records(&self, records: &[AirQualityRecord], path: &Path) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let batch = self.records_to_batch(records, records_schema())?;
        self.write_batch(batch, path)
    }

    /// Write records in batches for memory efficiency
    pub fn write_records_batched(
        &self,
        records: &[AirQualityRecord],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let schema = records_schema();
        let file = File::create(path)?;
        let mut writer =
            ArrowWriter::try_new(file, schema.clone(), Some(self.writer_properties()))?;

        for chunk in records.chunks(batch_size.max(1)) {
            let batch = self.records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    fn records_to_batch(
        &self,
        records: &[AirQualityRecord],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
        let dates: Vec<i32> = records.iter().map(|r| date_to_days(r.date)).collect();
        let years: Vec<i32> = records.iter().map(|r| r.year).collect();
        let months: Vec<u32> = records.iter().map(|r| r.month).collect();
        let days: Vec<u32> = records.iter().map(|r| r.day).collect();
        let weekdays: Vec<u32> = records.iter().map(|r| r.weekday).collect();
        let seasons: Vec<&str> = records.iter().map(|r| r.season.as_str()).collect();
        let categories: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.aqi_category.as_ref().map(|c| c.as_str()))
            .collect();

        let measure = |f: fn(&AirQualityRecord) -> Option<f64>| -> ArrayRef {
            Arc::new(Float64Array::from(
                records.iter().map(f).collect::<Vec<Option<f64>>>(),
            ))
        };

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(cities)),
                Arc::new(Date32Array::from(dates)),
                Arc::new(Int32Array::from(years)),
                Arc::new(UInt32Array::from(months)),
                Arc::new(UInt32Array::from(days)),
                Arc::new(UInt32Array::from(weekdays)),
                Arc::new(StringArray::from(seasons)),
                measure(|r| r.pm25),
                measure(|r| r.pm10),
                measure(|r| r.no),
                measure(|r| r.no2),
                measure(|r| r.nh3),
                measure(|r| r.co),
                measure(|r| r.so2),
                measure(|r| r.o3),
                measure(|r| r.benzene),
                measure(|r| r.toluene),
                measure(|r| r.xylene),
                measure(|r| r.aqi),
                Arc::new(StringArray::from(categories)),
            ],
        )?;

        Ok(batch)
    }

    pub fn write_daily(&self, rows: &[DailySummary], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("count", DataType::UInt64, false),
            Field::new("avg_aqi", DataType::Float64, true),
            Field::new("min_aqi", DataType::Float64, true),
            Field::new("max_aqi", DataType::Float64, true),
            Field::new("avg_pm25", DataType::Float64, true),
            Field::new("avg_pm10", DataType::Float64, true),
        ]));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Date32Array::from(
                    rows.iter().map(|r| date_to_days(r.date)).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_aqi).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.min_aqi).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.max_aqi).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_pm25).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_pm10).collect::<Vec<_>>())),
            ],
        )?;

        self.write_batch(batch, path)
    }

    pub fn write_city(&self, rows: &[CitySummary], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("city", DataType::Utf8, false),
            Field::new("count", DataType::UInt64, false),
            Field::new("avg_aqi", DataType::Float64, true),
            Field::new("min_aqi", DataType::Float64, true),
            Field::new("max_aqi", DataType::Float64, true),
            Field::new("avg_pm25", DataType::Float64, true),
            Field::new("avg_pm10", DataType::Float64, true),
        ]));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_aqi).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.min_aqi).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.max_aqi).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_pm25).collect::<Vec<_>>())),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_pm10).collect::<Vec<_>>())),
            ],
        )?;

        self.write_batch(batch, path)
    }

    pub fn write_yearly(&self, rows: &[YearlySummary], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("city", DataType::Utf8, false),
            Field::new("count", DataType::UInt64, false),
            Field::new("avg_aqi", DataType::Float64, true),
        ]));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_aqi).collect::<Vec<_>>())),
            ],
        )?;

        self.write_batch(batch, path)
    }

    pub fn write_seasonal(&self, rows: &[SeasonalSummary], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("season", DataType::Utf8, false),
            Field::new("city", DataType::Utf8, false),
            Field::new("count", DataType::UInt64, false),
            Field::new("avg_aqi", DataType::Float64, true),
        ]));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.season.as_str()).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from(
                    rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(rows.iter().map(|r| r.avg_aqi).collect::<Vec<_>>())),
            ],
        )?;

        self.write_batch(batch, path)
    }

    /// Write the enriched records and all four summary tables into `dir`.
    /// Returns the paths written, records first.
    pub fn write_all(
        &self,
        records: &[AirQualityRecord],
        summaries: &AqiSummaries,
        dir: &Path,
        batch_size: usize,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let records_path = dir.join(RECORDS_FILE);
        let daily_path = dir.join(DAILY_FILE);
        let city_path = dir.join(CITY_FILE);
        let yearly_path = dir.join(YEARLY_FILE);
        let seasonal_path = dir.join(SEASONAL_FILE);

        self.write_records_batched(records, &records_path, batch_size)?;
        self.write_daily(&summaries.daily, &daily_path)?;
        self.write_city(&summaries.city, &city_path)?;
        self.write_yearly(&summaries.yearly, &yearly_path)?;
        self.write_seasonal(&summaries.seasonal, &seasonal_path)?;

        info!(dir = %dir.display(), records = records.len(), "Wrote Parquet output");

        Ok(vec![
            records_path,
            daily_path,
            city_path,
            yearly_path,
            seasonal_path,
        ])
    }

    /// Read up to `limit` records back from a records file
    pub fn read_sample_records(&self, path: &Path, limit: usize) -> Result<Vec<AirQualityRecord>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            if records.len() >= limit {
                break;
            }
            let batch = batch_result?;

            let cities = column::<StringArray>(&batch, "city")?;
            let dates = column::<Date32Array>(&batch, "date")?;
            let categories = column::<StringArray>(&batch, "aqi_category")?;
            let pm25 = column::<Float64Array>(&batch, "pm25")?;
            let pm10 = column::<Float64Array>(&batch, "pm10")?;
            let no = column::<Float64Array>(&batch, "no")?;
            let no2 = column::<Float64Array>(&batch, "no2")?;
            let nh3 = column::<Float64Array>(&batch, "nh3")?;
            let co = column::<Float64Array>(&batch, "co")?;
            let so2 = column::<Float64Array>(&batch, "so2")?;
            let o3 = column::<Float64Array>(&batch, "o3")?;
            let benzene = column::<Float64Array>(&batch, "benzene")?;
            let toluene = column::<Float64Array>(&batch, "toluene")?;
            let xylene = column::<Float64Array>(&batch, "xylene")?;
            let aqi = column::<Float64Array>(&batch, "aqi")?;

            let to_read = batch.num_rows().min(limit - records.len());

            for i in 0..to_read {
                let date = days_to_date(dates.value(i)).ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string())
                })?;

                let mut record = AirQualityRecord::new(cities.value(i).to_string(), date);
                record.pm25 = optional(pm25, i);
                record.pm10 = optional(pm10, i);
                record.no = optional(no, i);
                record.no2 = optional(no2, i);
                record.nh3 = optional(nh3, i);
                record.co = optional(co, i);
                record.so2 = optional(so2, i);
                record.o3 = optional(o3, i);
                record.benzene = optional(benzene, i);
                record.toluene = optional(toluene, i);
                record.xylene = optional(xylene, i);
                record.aqi = optional(aqi, i);
                record.aqi_category = categories
                    .is_valid(i)
                    .then(|| AqiCategory::parse(categories.value(i)))
                    .flatten();

                records.push(record);
            }
        }

        Ok(records)
    }

    /// Identify the table stored in a Parquet file from its column names
    pub fn detect_table(&self, path: &Path) -> Result<TableKind> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema();
        let has = |name: &str| schema.field_with_name(name).is_ok();

        let kind = if has("aqi_category") && has("pm25") {
            TableKind::Records
        } else if has("date") && has("min_aqi") {
            TableKind::Daily
        } else if has("city") && has("min_aqi") {
            TableKind::City
        } else if has("year") && has("avg_aqi") {
            TableKind::Yearly
        } else if has("season") && has("avg_aqi") {
            TableKind::Seasonal
        } else {
            TableKind::Unknown
        };

        Ok(kind)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn records_schema() -> Arc<Schema> {
    let mut fields = vec![
        Field::new("city", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::UInt32, false),
        Field::new("day", DataType::UInt32, false),
        Field::new("weekday", DataType::UInt32, false),
        Field::new("season", DataType::Utf8, false),
    ];

    for name in [
        "pm25", "pm10", "no", "no2", "nh3", "co", "so2", "o3", "benzene", "toluene", "xylene",
        "aqi",
    ] {
        fields.push(Field::new(name, DataType::Float64, true));
    }
    fields.push(Field::new("aqi_category", DataType::Utf8, true));

    Arc::new(Schema::new(fields))
}

/// Days since 1970-01-01, as Arrow's Date32 expects
fn date_to_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(days as i64))
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column", name)))
}

fn optional(array: &Float64Array, i: usize) -> Option<f64> {
    array.is_valid(i).then(|| array.value(i))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AirQualityRecordBuilder;
    use crate::processors::Aggregator;
    use tempfile::{NamedTempFile, TempDir};

    fn enriched_records() -> Vec<AirQualityRecord> {
        let mut records = vec![
            AirQualityRecordBuilder::new()
                .city("Delhi")
                .date(NaiveDate::from_ymd_opt(2019, 11, 1).unwrap())
                .particulates(Some(320.0), Some(480.0))
                .gases(Some(2.1), None, Some(40.0))
                .build()
                .unwrap(),
            AirQualityRecordBuilder::new()
                .city("Shillong")
                .date(NaiveDate::from_ymd_opt(2019, 7, 14).unwrap())
                .pm10(22.0)
                .aqi(Some(21.0))
                .build()
                .unwrap(),
        ];
        Aggregator::new().enrich(&mut records).unwrap();
        records
    }

    #[test]
    fn test_write_empty_records() {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();

        let result = writer.write_records(&[], temp_file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_records_read_back() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let records = enriched_records();

        writer.write_records(&records, temp_file.path())?;
        let read = writer.read_sample_records(temp_file.path(), 10)?;

        assert_eq!(read, records);
        assert_eq!(writer.detect_table(temp_file.path())?, TableKind::Records);

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 2);
        Ok(())
    }

    #[test]
    fn test_sample_limit_is_respected() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_records_batched(&enriched_records(), temp_file.path(), 1)?;
        let read = writer.read_sample_records(temp_file.path(), 1)?;

        assert_eq!(read.len(), 1);
        assert_eq!(read[0].city, "Delhi");
        Ok(())
    }

    #[test]
    fn test_write_all_tables() -> Result<()> {
        let dir = TempDir::new()?;
        let mut records = enriched_records();
        let summaries = Aggregator::new().summarize(&mut records)?;

        let writer = ParquetWriter::new();
        let paths = writer.write_all(&records, &summaries, dir.path(), 100)?;

        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|p| p.exists()));

        let kinds: Vec<TableKind> = paths
            .iter()
            .map(|p| writer.detect_table(p))
            .collect::<Result<_>>()?;
        assert_eq!(
            kinds,
            vec![
                TableKind::Records,
                TableKind::Daily,
                TableKind::City,
                TableKind::Yearly,
                TableKind::Seasonal
            ]
        );

        let city_info = writer.get_file_info(&dir.path().join(CITY_FILE))?;
        assert_eq!(city_info.total_rows, 2);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_records(&enriched_records(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-ish").is_err());
        Ok(())
    }

    #[test]
    fn test_date_conversion() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        assert_eq!(date_to_days(NaiveDate::default()), 0);
        assert_eq!(days_to_date(date_to_days(date)), Some(date));
    }
}
