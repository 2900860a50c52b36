pub mod category;
pub mod pollutant;
pub mod record;
pub mod season;
pub mod summary;

pub use category::AqiCategory;
pub use pollutant::Pollutant;
pub use record::{AirQualityRecord, AirQualityRecordBuilder};
pub use season::Season;
pub use summary::{AqiSummaries, CitySummary, DailySummary, SeasonalSummary, YearlySummary};
