//! Ties the form, the inference service and the map together.

use crate::core::config::EstimatorConfig;
use crate::form::FormState;
use crate::map::{
    library::MapLibrary,
    loader::LibraryLoader,
    session::{HighlightOutcome, MapSession},
    token::{HttpTokenSource, StaticTokenSource, TokenSource},
};
use crate::prediction::{
    gateway::{PredictionGateway, Predictor},
    response::PredictionResult,
};
use crate::{EstimatorError, Result};
use std::sync::Arc;

/// One estimator page: a form, the last answer, and the map.
pub struct Estimator {
    predictor: Arc<dyn Predictor>,
    session: MapSession,
    form: FormState,
    last_result: Option<PredictionResult>,
    last_error: Option<EstimatorError>,
}

impl Estimator {
    pub fn new(predictor: Arc<dyn Predictor>, session: MapSession) -> Self {
        Self {
            predictor,
            session,
            form: FormState::default(),
            last_result: None,
            last_error: None,
        }
    }

    /// Wires the HTTP gateway and a map session on the process-wide
    /// loader. A configured public key is used as the map token, otherwise
    /// the token route is asked for one.
    pub fn connect(config: &EstimatorConfig, library: Arc<dyn MapLibrary>) -> Result<Self> {
        let predictor = Arc::new(PredictionGateway::new(config)?);
        let loader = LibraryLoader::shared(
            library,
            config.map.assets.clone(),
            config.map.library_wait,
        );

        let tokens: Arc<dyn TokenSource> = match &config.public_map_key {
            Some(key) => Arc::new(StaticTokenSource::new(key.clone())),
            None => {
                let client = reqwest::Client::builder()
                    .timeout(config.http_timeout())
                    .build()?;
                Arc::new(HttpTokenSource::from_config(client, config))
            }
        };

        let session = MapSession::new(loader, tokens, config.map.clone());
        Ok(Self::new(predictor, session))
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn session(&self) -> &MapSession {
        &self.session
    }

    pub fn last_result(&self) -> Option<&PredictionResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&EstimatorError> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.form.is_loading()
    }

    /// Submits the form and, on success, highlights the district the
    /// service recognized.
    ///
    /// The form is locked while the request is in flight, and unlocked
    /// again even if this future is dropped before the answer arrives. The
    /// previous result is cleared up front, so a failure never leaves a
    /// stale answer on display.
    pub async fn submit(&mut self) -> Result<&PredictionResult> {
        self.last_result = None;
        self.last_error = None;

        let input = match self.form.begin_submit() {
            Ok(input) => input,
            Err(e) => {
                self.last_error = Some(e.clone());
                return Err(e);
            }
        };

        let outcome = {
            let _unlock = SubmitLock(&mut self.form);
            self.predictor.predict(&input).await
        };

        match outcome {
            Ok(result) => {
                let district = result.district().to_string();
                match self.session.highlight(&district) {
                    HighlightOutcome::Unresolved => {
                        log::debug!("no map location for '{}'", district)
                    }
                    HighlightOutcome::Ignored => {
                        log::debug!("map unavailable, '{}' not highlighted", district)
                    }
                    _ => {}
                }
                Ok(&*self.last_result.insert(result))
            }
            Err(e) => {
                log::warn!("prediction failed: {}", e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

/// Unlocks the form when a submission ends, however it ends.
struct SubmitLock<'a>(&'a mut FormState);

impl Drop for SubmitLock<'_> {
    fn drop(&mut self) {
        self.0.finish_submit();
    }
}
