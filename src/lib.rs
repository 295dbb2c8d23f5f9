//! # danang-estimator
//!
//! Client-side core of a real estate price estimator for Da Nang.
//!
//! The crate collects property attributes through a form model, forwards
//! them to an external inference service, and keeps an interactive map in
//! sync with the district the service recognized. Map rendering is done by
//! a third-party SDK reached through the [`map::MapLibrary`] seam.

pub mod core;
pub mod district;
pub mod estimator;
pub mod form;
pub mod map;
pub mod prediction;
pub mod prelude;
pub mod runtime;
pub use crate::core::constants;

// Re-export public API
pub use core::{config::EstimatorConfig, geo::Coordinate};

pub use district::{canonical_key, resolve, District};

pub use map::{
    events::SessionEvent,
    library::{MapInstance, MapLibrary},
    loader::LibraryLoader,
    session::{MapSession, SessionState},
    token::{HttpTokenSource, TokenSource},
};

pub use prediction::{
    gateway::{PredictionGateway, Predictor},
    request::PredictionInput,
    response::{Estimates, PredictionResult},
};

pub use estimator::Estimator;
pub use form::FormState;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Common error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    /// The map credential is missing. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The map library did not attach within the wait budget.
    #[error("Map library failed to load after {attempts} attempts")]
    LibraryLoad { attempts: u32 },

    /// The prediction request failed or returned a non-2xx status.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Map error: {0}")]
    Map(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Map session has been disposed")]
    Disposed,
}

impl From<reqwest::Error> for EstimatorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for EstimatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl EstimatorError {
    /// Whether the user can recover by resubmitting the form.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::ResponseShape(_) | Self::Validation(_)
        )
    }
}

/// Error type alias for convenience
pub type Error = EstimatorError;
