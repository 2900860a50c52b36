use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::{AqiCategory, Pollutant, Season};

/// One city-day air quality observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AirQualityRecord {
    #[validate(length(min = 1))]
    pub city: String,
    pub date: NaiveDate,

    // Calendar fields derived from `date`
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Day of week with Monday = 0
    pub weekday: u32,
    pub season: Season,

    // Pollutant concentrations (µg/m³, CO in mg/m³)
    #[validate(range(min = 0.0))]
    pub pm25: Option<f64>,
    #[validate(range(min = 0.0))]
    pub pm10: Option<f64>,
    #[validate(range(min = 0.0))]
    pub no: Option<f64>,
    #[validate(range(min = 0.0))]
    pub no2: Option<f64>,
    #[validate(range(min = 0.0))]
    pub nh3: Option<f64>,
    #[validate(range(min = 0.0))]
    pub co: Option<f64>,
    #[validate(range(min = 0.0))]
    pub so2: Option<f64>,
    #[validate(range(min = 0.0))]
    pub o3: Option<f64>,
    #[validate(range(min = 0.0))]
    pub benzene: Option<f64>,
    #[validate(range(min = 0.0))]
    pub toluene: Option<f64>,
    #[validate(range(min = 0.0))]
    pub xylene: Option<f64>,

    #[validate(range(min = 0.0))]
    pub aqi: Option<f64>,
    pub aqi_category: Option<AqiCategory>,
}

impl AirQualityRecord {
    /// Create a record with no measurements; calendar fields are derived from `date`.
    pub fn new(city: String, date: NaiveDate) -> Self {
        Self {
            city,
            date,
            year: date.year(),
            month: date.month(),
            day: date.day(),
            weekday: date.weekday().num_days_from_monday(),
            season: Season::from_month(date.month()),
            pm25: None,
            pm10: None,
            no: None,
            no2: None,
            nh3: None,
            co: None,
            so2: None,
            o3: None,
            benzene: None,
            toluene: None,
            xylene: None,
            aqi: None,
            aqi_category: None,
        }
    }

    pub fn concentration(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
        }
    }

    pub fn has_particulates(&self) -> bool {
        self.pm25.is_some() || self.pm10.is_some()
    }

    /// True once both AQI and category are filled in.
    pub fn is_enriched(&self) -> bool {
        self.aqi.is_some() && self.aqi_category.is_some()
    }
}

pub struct AirQualityRecordBuilder {
    city: Option<String>,
    date: Option<NaiveDate>,
    pm25: Option<f64>,
    pm10: Option<f64>,
    no: Option<f64>,
    no2: Option<f64>,
    nh3: Option<f64>,
    co: Option<f64>,
    so2: Option<f64>,
    o3: Option<f64>,
    benzene: Option<f64>,
    toluene: Option<f64>,
    xylene: Option<f64>,
    aqi: Option<f64>,
}

impl Default for AirQualityRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AirQualityRecordBuilder {
    pub fn new() -> Self {
        Self {
            city: None,
            date: None,
            pm25: None,
            pm10: None,
            no: None,
            no2: None,
            nh3: None,
            co: None,
            so2: None,
            o3: None,
            benzene: None,
            toluene: None,
            xylene: None,
            aqi: None,
        }
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn particulates(mut self, pm25: Option<f64>, pm10: Option<f64>) -> Self {
        self.pm25 = pm25;
        self.pm10 = pm10;
        self
    }

    pub fn pm25(mut self, value: f64) -> Self {
        self.pm25 = Some(value);
        self
    }

    pub fn pm10(mut self, value: f64) -> Self {
        self.pm10 = Some(value);
        self
    }

    pub fn nitrogen(mut self, no: Option<f64>, no2: Option<f64>, nh3: Option<f64>) -> Self {
        self.no = no;
        self.no2 = no2;
        self.nh3 = nh3;
        self
    }

    pub fn gases(mut self, co: Option<f64>, so2: Option<f64>, o3: Option<f64>) -> Self {
        self.co = co;
        self.so2 = so2;
        self.o3 = o3;
        self
    }

    pub fn aromatics(
        mut self,
        benzene: Option<f64>,
        toluene: Option<f64>,
        xylene: Option<f64>,
    ) -> Self {
        self.benzene = benzene;
        self.toluene = toluene;
        self.xylene = xylene;
        self
    }

    pub fn aqi(mut self, aqi: Option<f64>) -> Self {
        self.aqi = aqi;
        self
    }

    pub fn build(self) -> Result<AirQualityRecord> {
        let mut record = AirQualityRecord::new(
            self.city
                .ok_or_else(|| ProcessingError::MissingData("city".to_string()))?,
            self.date
                .ok_or_else(|| ProcessingError::MissingData("date".to_string()))?,
        );

        record.pm25 = self.pm25;
        record.pm10 = self.pm10;
        record.no = self.no;
        record.no2 = self.no2;
        record.nh3 = self.nh3;
        record.co = self.co;
        record.so2 = self.so2;
        record.o3 = self.o3;
        record.benzene = self.benzene;
        record.toluene = self.toluene;
        record.xylene = self.xylene;
        record.aqi = self.aqi;

        record.validate()?;
        Ok(record)
    }
}
