use crate::error::{ProcessingError, Result};
use crate::models::AirQualityRecord;
use crate::readers::{CpcbReader, LoadReport};
use crate::utils::constants::CSV_EXTENSION;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Loads a single CSV file or every CSV file in a directory.
pub struct ConcurrentReader {
    max_workers: usize,
    use_mmap: bool,
}

impl ConcurrentReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read all records under `path` without blocking the async runtime.
    pub async fn read_path(&self, path: &Path) -> Result<(Vec<AirQualityRecord>, LoadReport)> {
        let files = Self::discover_files(path)?;
        if files.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "No CSV files found in {}",
                path.display()
            )));
        }

        info!(files = files.len(), path = %path.display(), "Loading air quality data");

        let max_workers = self.max_workers;
        let use_mmap = self.use_mmap;
        tokio::task::spawn_blocking(move || Self::read_files(&files, max_workers, use_mmap))
            .await?
    }

    /// A file is returned as-is; a directory yields its `*.csv` files, sorted.
    pub fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        if !path.is_dir() {
            return Err(ProcessingError::MissingData(format!(
                "Input path does not exist: {}",
                path.display()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
            })
            .collect();

        files.sort();
        Ok(files)
    }

    /// Parse files on a bounded rayon pool and concatenate them in file order.
    pub fn read_files(
        files: &[PathBuf],
        max_workers: usize,
        use_mmap: bool,
    ) -> Result<(Vec<AirQualityRecord>, LoadReport)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers.max(1))
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let per_file: Vec<(Vec<AirQualityRecord>, LoadReport)> = pool.install(|| {
            files
                .par_iter()
                .map(|file| CpcbReader::with_mmap(use_mmap).read_file(file))
                .collect::<Result<_>>()
        })?;

        let mut records = Vec::with_capacity(per_file.iter().map(|(r, _)| r.len()).sum());
        let mut report = LoadReport::default();
        for (file_records, file_report) in per_file {
            records.extend(file_records);
            report = report.merge(file_report);
        }

        Ok((records, report))
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, rows: &[&str]) {
        let mut content = String::from("City,Date,PM2.5,PM10,AQI\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_discover_only_csv_files() -> Result<()> {
        let dir = TempDir::new()?;
        write_csv(dir.path(), "b.csv", &[]);
        write_csv(dir.path(), "a.CSV", &[]);
        fs::write(dir.path().join("notes.txt"), "ignore me")?;

        let files = ConcurrentReader::discover_files(dir.path())?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.CSV", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let result = ConcurrentReader::discover_files(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(ProcessingError::MissingData(_))));
    }

    #[tokio::test]
    async fn test_read_directory_merges_reports() -> Result<()> {
        let dir = TempDir::new()?;
        write_csv(dir.path(), "2019.csv", &["Delhi,01-01-2019,100,200,", "Delhi,02-01-2019,,,"]);
        write_csv(dir.path(), "2020.csv", &["Pune,01-01-2020,30,,", "Pune,bad,30,,"]);

        let reader = ConcurrentReader::new(2);
        let (records, report) = reader.read_path(dir.path()).await?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].city, "Delhi");
        assert_eq!(records[1].city, "Pune");
        assert_eq!(report.files, 2);
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.missing_particulates, 1);
        assert_eq!(report.invalid_dates, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_directory_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let result = ConcurrentReader::new(1).read_path(dir.path()).await;

        assert!(result.is_err());
        Ok(())
    }
}
