use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Default run directory under `base`: aqi-summary-{YYMMDD}
pub fn generate_default_output_dir(base: &Path) -> PathBuf {
    let now = Local::now();
    let dirname = format!(
        "aqi-summary-{:02}{:02}{:02}",
        now.year() % 100,
        now.month(),
        now.day()
    );
    base.join(dirname)
}
