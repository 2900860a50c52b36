use crate::error::{ProcessingError, Result};
use crate::models::AirQualityRecord;
use crate::utils::constants::{DATETIME_FORMAT, DATE_FORMATS, DEFAULT_BUFFER_SIZE};
use crate::utils::text::normalize_city;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use encoding_rs::{UTF_8, WINDOWS_1252};
use memmap2::Mmap;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use validator::Validate;

/// Source columns understood by the reader. `AQI_Bucket` is deliberately absent:
/// categories are always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    City,
    Date,
    Pm25,
    Pm10,
    No,
    No2,
    Nh3,
    Co,
    So2,
    O3,
    Benzene,
    Toluene,
    Xylene,
    Aqi,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_ascii_lowercase().as_str() {
            "city" => Some(Column::City),
            "date" => Some(Column::Date),
            "pm2.5" | "pm25" => Some(Column::Pm25),
            "pm10" => Some(Column::Pm10),
            "no" => Some(Column::No),
            "no2" => Some(Column::No2),
            "nh3" => Some(Column::Nh3),
            "co" => Some(Column::Co),
            "so2" => Some(Column::So2),
            "o3" => Some(Column::O3),
            "benzene" => Some(Column::Benzene),
            "toluene" => Some(Column::Toluene),
            "xylene" => Some(Column::Xylene),
            "aqi" => Some(Column::Aqi),
            _ => None,
        }
    }
}

struct ColumnMap {
    indices: HashMap<Column, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut indices = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                indices.entry(column).or_insert(i);
            }
        }

        for required in [Column::City, Column::Date] {
            if !indices.contains_key(&required) {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Missing required column {:?} in header: {:?}",
                    required, headers
                )));
            }
        }

        Ok(Self { indices })
    }

    fn get<'r>(&self, row: &'r StringRecord, column: Column) -> Option<&'r str> {
        self.indices.get(&column).and_then(|&i| row.get(i))
    }

    fn number(&self, row: &StringRecord, column: Column) -> Option<f64> {
        self.get(row, column).and_then(parse_concentration)
    }
}

/// Row counts for one or more loaded files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub files: usize,
    pub total_rows: usize,
    pub loaded: usize,
    pub invalid_dates: usize,
    /// Rows with neither PM2.5 nor PM10
    pub missing_particulates: usize,
    pub invalid_rows: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.invalid_dates + self.missing_particulates + self.invalid_rows
    }

    pub fn merge(mut self, other: LoadReport) -> Self {
        self.files += other.files;
        self.total_rows += other.total_rows;
        self.loaded += other.loaded;
        self.invalid_dates += other.invalid_dates;
        self.missing_particulates += other.missing_particulates;
        self.invalid_rows += other.invalid_rows;
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "Load Report:\n\
            - Files: {}\n\
            - Rows read: {}\n\
            - Records loaded: {}\n\
            - Dropped (unparseable date): {}\n\
            - Dropped (no PM2.5/PM10): {}\n\
            - Dropped (invalid row): {}",
            self.files,
            self.total_rows,
            self.loaded,
            self.invalid_dates,
            self.missing_particulates,
            self.invalid_rows
        )
    }
}

enum RowRejection {
    InvalidDate,
    MissingParticulates,
    Invalid(String),
}

/// Reader for CPCB city-day CSV exports.
pub struct CpcbReader {
    use_mmap: bool,
}

impl CpcbReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Read and clean one CSV file.
    pub fn read_file(&self, path: &Path) -> Result<(Vec<AirQualityRecord>, LoadReport)> {
        let mut file = File::open(path)?;

        let (records, report) = if self.use_mmap {
            let mmap = unsafe { Mmap::map(&file)? };
            self.read_bytes(&mmap)?
        } else {
            let mut bytes = Vec::with_capacity(DEFAULT_BUFFER_SIZE);
            file.read_to_end(&mut bytes)?;
            self.read_bytes(&bytes)?
        };

        debug!(
            file = %path.display(),
            rows = report.total_rows,
            loaded = report.loaded,
            dropped = report.dropped(),
            "Read CPCB file"
        );

        Ok((records, report))
    }

    /// Read and clean CSV content held in memory.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<(Vec<AirQualityRecord>, LoadReport)> {
        let text = decode(bytes);
        self.read_from(text.as_bytes())
    }

    fn read_from<R: Read>(&self, source: R) -> Result<(Vec<AirQualityRecord>, LoadReport)> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .buffer_capacity(DEFAULT_BUFFER_SIZE)
            .from_reader(source);

        let columns = ColumnMap::from_headers(reader.headers()?)?;
        let mut records = Vec::new();
        let mut report = LoadReport {
            files: 1,
            ..LoadReport::default()
        };

        for (line, row_result) in reader.records().enumerate() {
            report.total_rows += 1;

            let row = match row_result {
                Ok(row) => row,
                Err(e) => {
                    warn!(line = line + 2, error = %e, "Skipping malformed CSV row");
                    report.invalid_rows += 1;
                    continue;
                }
            };

            match self.parse_row(&row, &columns) {
                Ok(record) => {
                    records.push(record);
                    report.loaded += 1;
                }
                Err(RowRejection::InvalidDate) => report.invalid_dates += 1,
                Err(RowRejection::MissingParticulates) => report.missing_particulates += 1,
                Err(RowRejection::Invalid(reason)) => {
                    debug!(line = line + 2, %reason, "Rejected row");
                    report.invalid_rows += 1;
                }
            }
        }

        if report.dropped() > 0 {
            warn!(
                dropped = report.dropped(),
                invalid_dates = report.invalid_dates,
                missing_particulates = report.missing_particulates,
                invalid_rows = report.invalid_rows,
                "Dropped rows while loading"
            );
        }

        Ok((records, report))
    }

    fn parse_row(
        &self,
        row: &StringRecord,
        columns: &ColumnMap,
    ) -> std::result::Result<AirQualityRecord, RowRejection> {
        let date = columns
            .get(row, Column::Date)
            .and_then(parse_date)
            .ok_or(RowRejection::InvalidDate)?;

        let pm25 = columns.number(row, Column::Pm25);
        let pm10 = columns.number(row, Column::Pm10);
        if pm25.is_none() && pm10.is_none() {
            return Err(RowRejection::MissingParticulates);
        }

        let city = normalize_city(columns.get(row, Column::City).unwrap_or_default());
        let mut record = AirQualityRecord::new(city, date);
        record.pm25 = pm25;
        record.pm10 = pm10;
        record.no = columns.number(row, Column::No);
        record.no2 = columns.number(row, Column::No2);
        record.nh3 = columns.number(row, Column::Nh3);
        record.co = columns.number(row, Column::Co);
        record.so2 = columns.number(row, Column::So2);
        record.o3 = columns.number(row, Column::O3);
        record.benzene = columns.number(row, Column::Benzene);
        record.toluene = columns.number(row, Column::Toluene);
        record.xylene = columns.number(row, Column::Xylene);
        record.aqi = columns.number(row, Column::Aqi);

        record
            .validate()
            .map_err(|e| RowRejection::Invalid(e.to_string()))?;

        Ok(record)
    }
}

impl Default for CpcbReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode as UTF-8 (BOM stripped), falling back to Windows-1252.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text,
        None => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

/// Parse a numeric cell. `#` padding is stripped; anything unparseable,
/// non-finite or negative is treated as missing.
pub fn parse_concentration(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '#').collect();
    let value = cleaned.trim().parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parse a date cell, trying day-first first.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}
