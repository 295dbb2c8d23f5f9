use crate::{EstimatorError, Result};
use serde::{Deserialize, Serialize};

/// Attributes sent to the inference service.
///
/// Serializes to the service's field names: `{area, bedroom, wc, district}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Floor area in square meters
    pub area: f64,
    #[serde(rename = "bedroom")]
    pub bedrooms: u32,
    #[serde(rename = "wc")]
    pub bathrooms: u32,
    pub district: String,
}

impl PredictionInput {
    pub fn new(area: f64, bedrooms: u32, bathrooms: u32, district: impl Into<String>) -> Self {
        Self {
            area,
            bedrooms,
            bathrooms,
            district: district.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.area.is_finite() || self.area <= 0.0 {
            return Err(EstimatorError::Validation(format!(
                "area must be a positive number, got {}",
                self.area
            )));
        }
        if self.district.trim().is_empty() {
            return Err(EstimatorError::Validation(
                "district must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
