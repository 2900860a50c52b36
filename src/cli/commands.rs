use crate::analyzers::{AqiAnalyzer, DatasetStatistics};
use crate::cli::args::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::Result;
use crate::processors::{AqiPipeline, ImputationStats};
use crate::readers::LoadReport;
use crate::utils::filename::generate_default_output_dir;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ParquetWriter, TableKind};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
struct ValidationReport {
    load: LoadReport,
    imputation: ImputationStats,
    statistics: Option<DatasetStatistics>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    info!(?config, "Loaded configuration");

    match cli.command {
        Commands::Process {
            input,
            output_dir,
            compression,
            city,
            validate_only,
            max_workers,
            chunk_size,
            mmap,
        } => {
            let max_workers = max_workers.unwrap_or(config.max_workers);
            let chunk_size = chunk_size.unwrap_or(config.chunk_size);
            let compression = compression.unwrap_or_else(|| config.compression.clone());
            let output_dir =
                output_dir.unwrap_or_else(|| generate_default_output_dir(&config.output_dir));

            // Fail on a bad compression name before doing any work
            let writer = ParquetWriter::new()
                .with_compression(&compression)?
                .with_row_group_size(config.row_group_size);

            println!("Processing air quality data...");
            println!("Input: {}", input.display());
            println!("Workers: {}, Chunk size: {}", max_workers, chunk_size);

            let progress = ProgressReporter::new_spinner("Processing data...", false);
            let pipeline = AqiPipeline::new(max_workers)
                .with_mmap(mmap || config.use_mmap)
                .with_city_filter(city);

            let output = pipeline.process_path(&input, Some(&progress)).await?;

            println!("\n{}", output.load_report.summary());
            println!("\n{}", output.imputation.summary());

            if output.records.is_empty() {
                println!("No records to write");
                return Ok(());
            }

            println!("\n{}", output.summaries.summary());

            if validate_only {
                println!("Validation complete - no output files written");
                return Ok(());
            }

            println!("\nWriting Parquet files to {}...", output_dir.display());
            let paths = writer.write_all(
                &output.records,
                &output.summaries,
                &output_dir,
                chunk_size,
            )?;

            for path in &paths {
                if path.exists() {
                    let info = writer.get_file_info(path)?;
                    println!("- {} ({} rows)", path.display(), info.total_rows);
                }
            }

            println!("Processing complete!");
        }

        Commands::Validate {
            input,
            max_workers,
            json,
        } => {
            let max_workers = max_workers.unwrap_or(config.max_workers);
            let progress = ProgressReporter::new_spinner("Validating data...", json);

            let output = AqiPipeline::new(max_workers)
                .with_mmap(config.use_mmap)
                .process_path(&input, Some(&progress))
                .await?;

            let statistics = if output.records.is_empty() {
                None
            } else {
                Some(AqiAnalyzer::new().analyze_records(&output.records)?)
            };

            if json {
                let report = ValidationReport {
                    load: output.load_report,
                    imputation: output.imputation,
                    statistics,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("\n{}", output.load_report.summary());
            println!("\n{}", output.imputation.summary());
            if let Some(stats) = &statistics {
                println!("\n{}", stats.detailed_summary());
            }

            if output.load_report.dropped() == 0 && output.imputation.ceiling_hits == 0 {
                println!("\nAll rows loaded and scored within the breakpoint tables");
            } else {
                println!(
                    "\nDropped {} rows; {} records exceeded the breakpoint tables",
                    output.load_report.dropped(),
                    output.imputation.ceiling_hits
                );
            }
        }

        Commands::Info {
            file,
            sample,
            analysis_limit,
        } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            let kind = writer.detect_table(&file)?;

            println!("Table: {:?}", kind);

            if kind == TableKind::Records {
                let stats = AqiAnalyzer::new().analyze_parquet_with_limit(&file, analysis_limit)?;
                println!("\n{}", stats.detailed_summary());
            }

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if kind == TableKind::Records && sample > 0 {
                println!("\nSample Records (showing {} records):", sample);
                match writer.read_sample_records(&file, sample) {
                    Ok(records) => {
                        for (i, record) in records.iter().enumerate() {
                            println!(
                                "{}. {} on {}: pm25={}, pm10={}, aqi={} ({})",
                                i + 1,
                                record.city,
                                record.date,
                                format_value(record.pm25),
                                format_value(record.pm10),
                                format_value(record.aqi),
                                record
                                    .aqi_category
                                    .map_or("unclassified", |c| c.as_str())
                            );
                        }
                    }
                    Err(e) => warn!(error = %e, "Error reading sample data"),
                }
            }
        }
    }

    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map_or("-".to_string(), |v| format!("{:.1}", v))
}
