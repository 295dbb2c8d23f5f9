//! HTTP client for the inference service.

use super::request::PredictionInput;
use super::response::{InferenceResponse, PredictionResult};
use crate::core::config::EstimatorConfig;
use crate::{EstimatorError, Result};
use async_trait::async_trait;

/// Anything that can turn form input into a prediction.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, input: &PredictionInput) -> Result<PredictionResult>;
}

/// POSTs prediction input to the inference service's `/predict` endpoint.
pub struct PredictionGateway {
    client: reqwest::Client,
    url: String,
}

impl PredictionGateway {
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self::with_client(client, config.endpoints.predict_url()))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Predictor for PredictionGateway {
    async fn predict(&self, input: &PredictionInput) -> Result<PredictionResult> {
        input.validate()?;
        log::debug!("POST {} {:?}", self.url, input);

        let response = self.client.post(&self.url).json(input).send().await?;
        let status = response.status();
        let body = response.text().await?;

        normalize_response(input.clone(), status.as_u16(), &body)
    }
}

/// Turns a raw HTTP answer into a [`PredictionResult`]. Non-2xx statuses
/// become network errors carrying the status and the body text.
pub fn normalize_response(
    input: PredictionInput,
    status: u16,
    body: &str,
) -> Result<PredictionResult> {
    if !(200..300).contains(&status) {
        log::warn!("inference service answered {}", status);
        return Err(EstimatorError::Network(format!(
            "API error: {} - {}",
            status,
            body.trim()
        )));
    }

    InferenceResponse::parse(body)?.into_result(input)
}
