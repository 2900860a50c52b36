use crate::error::{ProcessingError, Result};
use crate::models::AqiCategory;

/// Maps an AQI value to its severity bucket.
///
/// | AQI        | Category     |
/// |------------|--------------|
/// | <= 50      | Good         |
/// | <= 100     | Satisfactory |
/// | <= 200     | Moderate     |
/// | <= 300     | Poor         |
/// | <= 400     | Very Poor    |
/// | > 400      | Severe       |
///
/// Negative or non-finite values are rejected rather than bucketed.
pub fn classify(aqi: f64) -> Result<AqiCategory> {
    if !aqi.is_finite() || aqi < 0.0 {
        return Err(ProcessingError::InvalidCategoryInput(aqi));
    }

    let category = AqiCategory::ALL
        .into_iter()
        .find(|category| category.upper_bound().is_some_and(|bound| aqi <= bound))
        .unwrap_or(AqiCategory::Severe);

    Ok(category)
}
