use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aqi-processor")]
#[command(about = "AQI imputation, classification and summaries for CPCB air quality data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Configuration file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute AQI summaries and write them as Parquet files
    Process {
        #[arg(short, long, help = "Input CSV file or directory of CSV files")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Output directory [default: {output_dir}/aqi-summary-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(short, long, help = "Parquet compression: snappy, gzip, lz4, zstd, none")]
        compression: Option<String>,

        #[arg(long, help = "Only process records for this city")]
        city: Option<String>,

        #[arg(long, default_value = "false")]
        validate_only: bool,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long)]
        chunk_size: Option<usize>,

        #[arg(long, default_value = "false", help = "Memory-map input files")]
        mmap: bool,
    },

    /// Load and enrich data without writing output
    Validate {
        #[arg(short, long, help = "Input CSV file or directory of CSV files")]
        input: PathBuf,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, default_value = "false", help = "Print the report as JSON")]
        json: bool,
    },

    /// Display information about a Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,

        #[arg(
            long,
            default_value = "0",
            help = "Maximum records to analyze (0 = all records)"
        )]
        analysis_limit: usize,
    },
}
