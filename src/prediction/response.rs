//! Inference service responses and the display model they normalize to.
//!
//! Deployments of the service answer in one of two shapes: a single
//! estimate with an `info` block, or an XGBoost / neural network comparison
//! with a `debug` block. [`InferenceResponse::parse`] tries the single shape
//! first, then the comparison, and fails with both parse errors if neither
//! fits.

use super::request::PredictionInput;
use crate::{EstimatorError, Result};
use serde::{Deserialize, Serialize};

/// Unit the service reports prices in when it does not say ("tỷ", billions
/// of VND)
pub const DEFAULT_UNIT: &str = "tỷ";

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResponseInfo {
    #[serde(default)]
    pub input_district: Option<String>,
    #[serde(default)]
    pub recognized_district: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResponseDebug {
    #[serde(default)]
    pub district_code_used: Option<i64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SingleEstimate {
    pub result: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DualEstimate {
    pub xgboost: f64,
    pub deep_learning: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

/// Shape A
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SingleModelResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub info: Option<ResponseInfo>,
    pub result: SingleEstimate,
}

/// Shape B
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DualModelResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub debug: Option<ResponseDebug>,
    #[serde(default)]
    pub info: Option<ResponseInfo>,
    pub result: DualEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResponse {
    Single(SingleModelResponse),
    Dual(DualModelResponse),
}

impl InferenceResponse {
    pub fn parse(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)?;

        let single_err = match serde_json::from_value::<SingleModelResponse>(value.clone()) {
            Ok(single) => return Ok(Self::Single(single)),
            Err(e) => e,
        };
        let dual_err = match serde_json::from_value::<DualModelResponse>(value) {
            Ok(dual) => return Ok(Self::Dual(dual)),
            Err(e) => e,
        };

        Err(EstimatorError::ResponseShape(format!(
            "not a single-model response ({}) nor a two-model response ({})",
            single_err, dual_err
        )))
    }

    fn success(&self) -> Option<bool> {
        match self {
            Self::Single(single) => single.success,
            Self::Dual(dual) => dual.success,
        }
    }

    /// Folds the response and the submitted input into the display model.
    pub fn into_result(self, input: PredictionInput) -> Result<PredictionResult> {
        if self.success() == Some(false) {
            return Err(EstimatorError::Network(
                "inference service reported an unsuccessful prediction".to_string(),
            ));
        }

        let result = match self {
            Self::Single(single) => {
                let info = single.info.unwrap_or_default();
                PredictionResult {
                    input,
                    estimates: Estimates::Single(single.result.result),
                    unit: single.result.unit,
                    recognized_district: info.recognized_district,
                    district_code: None,
                    distance_km: info.distance_km,
                }
            }
            Self::Dual(dual) => {
                let debug = dual.debug.unwrap_or_default();
                let info = dual.info.unwrap_or_default();
                PredictionResult {
                    input,
                    estimates: Estimates::Comparison {
                        xgboost: dual.result.xgboost,
                        deep_learning: dual.result.deep_learning,
                    },
                    unit: dual.result.unit,
                    recognized_district: info.recognized_district,
                    district_code: debug.district_code_used,
                    distance_km: debug.distance_km.or(info.distance_km),
                }
            }
        };
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Estimates {
    Single(f64),
    Comparison { xgboost: f64, deep_learning: f64 },
}

/// One model's price, for presenting estimates uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelEstimate {
    pub model: &'static str,
    pub price: f64,
}

impl Estimates {
    pub fn models(&self) -> Vec<ModelEstimate> {
        match *self {
            Self::Single(price) => vec![ModelEstimate {
                model: "Estimate",
                price,
            }],
            Self::Comparison {
                xgboost,
                deep_learning,
            } => vec![
                ModelEstimate {
                    model: "XGBoost",
                    price: xgboost,
                },
                ModelEstimate {
                    model: "Deep Learning (Neural Network)",
                    price: deep_learning,
                },
            ],
        }
    }

    pub fn prices(&self) -> Vec<f64> {
        self.models().into_iter().map(|m| m.price).collect()
    }

    /// Absolute gap between the two models, for comparisons
    pub fn difference(&self) -> Option<f64> {
        match *self {
            Self::Single(_) => None,
            Self::Comparison {
                xgboost,
                deep_learning,
            } => Some((xgboost - deep_learning).abs()),
        }
    }
}

/// Display model handed to the results presenter and the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub input: PredictionInput,
    pub estimates: Estimates,
    pub unit: String,
    pub recognized_district: Option<String>,
    pub district_code: Option<i64>,
    pub distance_km: Option<f64>,
}

impl PredictionResult {
    /// District to show and highlight. The service may have corrected the
    /// user's label, so its recognized name wins.
    pub fn district(&self) -> &str {
        self.recognized_district
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.input.district.as_str())
    }
}
