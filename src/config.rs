use crate::error::Result;
use crate::utils::constants::{
    COMPRESSION_SNAPPY, CONFIG_FILE, DEFAULT_CHUNK_SIZE, DEFAULT_OUTPUT_DIR,
    DEFAULT_ROW_GROUP_SIZE, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Runtime settings. Sources, lowest precedence first: built-in defaults,
/// `aqi-processor.{toml,yaml,json}` in the working directory, an explicit
/// `--config` file, then `AQI_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,

    #[validate(range(min = 1))]
    pub chunk_size: usize,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    pub use_mmap: bool,
}

impl AppConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("compression", COMPRESSION_SNAPPY)?
            .set_default("row_group_size", DEFAULT_ROW_GROUP_SIZE as i64)?
            .set_default("chunk_size", DEFAULT_CHUNK_SIZE as i64)?
            .set_default("max_workers", num_cpus::get() as i64)?
            .set_default("use_mmap", false)?
            .add_source(File::with_name(CONFIG_FILE).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compression: COMPRESSION_SNAPPY.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: num_cpus::get(),
            use_mmap: false,
        }
    }
}
