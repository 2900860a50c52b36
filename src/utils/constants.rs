/// AQI returned for a concentration beyond the last breakpoint
pub const AQI_CEILING: f64 = 500.0;

/// Source date formats, tried in order
pub const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y"];
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Input files
pub const CSV_EXTENSION: &str = "csv";
pub const CONFIG_FILE: &str = "aqi-processor";
pub const ENV_PREFIX: &str = "AQI";

/// Output file names
pub const RECORDS_FILE: &str = "records.parquet";
pub const DAILY_FILE: &str = "daily.parquet";
pub const CITY_FILE: &str = "city.parquet";
pub const YEARLY_FILE: &str = "yearly.parquet";
pub const SEASONAL_FILE: &str = "seasonal.parquet";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
