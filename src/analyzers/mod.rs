pub mod aqi_analyzer;

pub use aqi_analyzer::{AqiAnalyzer, AqiStats, Coverage, DatasetStatistics};
