//! Prediction requests, the inference service client and result display.

pub mod display;
pub mod gateway;
pub mod request;
pub mod response;

pub use display::{format_vnd, render};
pub use gateway::{normalize_response, PredictionGateway, Predictor};
pub use request::PredictionInput;
pub use response::{Estimates, InferenceResponse, ModelEstimate, PredictionResult};
