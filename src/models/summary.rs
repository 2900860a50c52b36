use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Season;

/// Per-date rollup across all cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub count: usize,
    pub avg_aqi: Option<f64>,
    pub min_aqi: Option<f64>,
    pub max_aqi: Option<f64>,
    pub avg_pm25: Option<f64>,
    pub avg_pm10: Option<f64>,
}

/// Per-city rollup across the whole period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySummary {
    pub city: String,
    pub count: usize,
    pub avg_aqi: Option<f64>,
    pub min_aqi: Option<f64>,
    pub max_aqi: Option<f64>,
    pub avg_pm25: Option<f64>,
    pub avg_pm10: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub year: i32,
    pub city: String,
    pub count: usize,
    pub avg_aqi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalSummary {
    pub season: Season,
    pub city: String,
    pub count: usize,
    pub avg_aqi: Option<f64>,
}

/// The four rollups produced by one summarization run.
///
/// Rows are emitted in ascending key order, but callers should look rows up
/// by key rather than by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AqiSummaries {
    pub daily: Vec<DailySummary>,
    pub city: Vec<CitySummary>,
    pub yearly: Vec<YearlySummary>,
    pub seasonal: Vec<SeasonalSummary>,
}

impl AqiSummaries {
    pub fn find_daily(&self, date: NaiveDate) -> Option<&DailySummary> {
        self.daily.iter().find(|row| row.date == date)
    }

    pub fn find_city(&self, city: &str) -> Option<&CitySummary> {
        self.city.iter().find(|row| row.city == city)
    }

    pub fn find_yearly(&self, year: i32, city: &str) -> Option<&YearlySummary> {
        self.yearly
            .iter()
            .find(|row| row.year == year && row.city == city)
    }

    pub fn find_seasonal(&self, season: Season, city: &str) -> Option<&SeasonalSummary> {
        self.seasonal
            .iter()
            .find(|row| row.season == season && row.city == city)
    }

    /// Total records covered, counted through the city rollup.
    pub fn total_records(&self) -> usize {
        self.city.iter().map(|row| row.count).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Summary Tables:\n\
            - Daily: {} dates\n\
            - City: {} cities\n\
            - Yearly: {} city-years\n\
            - Seasonal: {} city-seasons",
            self.daily.len(),
            self.city.len(),
            self.yearly.len(),
            self.seasonal.len()
        )
    }
}
