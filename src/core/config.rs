//! Configuration for the estimator
//!
//! Settings are grouped the same way the components are: endpoints used by
//! the gateway and the token source, and everything the map session needs
//! to load the SDK and move the camera. Defaults mirror the deployed
//! application; [`EstimatorConfig::from_env`] lets a deployment override
//! the parts that differ between environments.

use crate::core::{constants, geo::Coordinate};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    pub endpoints: EndpointConfig,
    pub map: MapSessionConfig,
    /// Public map key baked in at build time, if any.
    pub public_map_key: Option<String>,
    pub http_timeout_ms: u64,
}

impl EstimatorConfig {
    /// Defaults overridden by `ESTIMATOR_*` environment variables.
    ///
    /// Values that are present but unparsable are ignored rather than
    /// rejected.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origin) = std::env::var("ESTIMATOR_APP_ORIGIN") {
            config.endpoints.app_origin = origin;
        }
        if let Ok(url) = std::env::var("ESTIMATOR_INFERENCE_URL") {
            config.endpoints.inference_base = url;
        }
        if let Ok(route) = std::env::var("ESTIMATOR_TOKEN_ROUTE") {
            config.endpoints.token_route = route;
        }
        if let Some(style) = std::env::var("ESTIMATOR_MAP_STYLE")
            .ok()
            .and_then(|v| MapStyle::parse(&v))
        {
            config.map.style = style;
        }
        if let Some(timeout) = std::env::var("ESTIMATOR_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.http_timeout_ms = timeout;
        }
        config.public_map_key = std::env::var("GOONG_ACCESS_TOKEN")
            .ok()
            .filter(|key| !key.trim().is_empty());

        config
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            map: MapSessionConfig::default(),
            public_map_key: None,
            http_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Origin serving the token route.
    pub app_origin: String,
    pub token_route: String,
    /// Base URL of the inference service; `/predict` is appended.
    pub inference_base: String,
}

impl EndpointConfig {
    pub fn token_url(&self) -> String {
        join_url(&self.app_origin, &self.token_route)
    }

    pub fn predict_url(&self) -> String {
        join_url(&self.inference_base, "/predict")
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            app_origin: "http://localhost:3000".to_string(),
            token_route: constants::TOKEN_ROUTE.to_string(),
            inference_base: "http://localhost:8000".to_string(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSessionConfig {
    pub style: MapStyle,
    pub assets: LibraryAssets,
    pub center: Coordinate,
    pub zoom: f64,
    pub highlight: CameraTransitionConfig,
    pub reset: CameraTransitionConfig,
    pub library_wait: LibraryWaitConfig,
    pub marker_color: String,
}

impl Default for MapSessionConfig {
    fn default() -> Self {
        Self {
            style: MapStyle::default(),
            assets: LibraryAssets::default(),
            center: constants::CITY_CENTER,
            zoom: constants::DEFAULT_ZOOM,
            highlight: CameraTransitionConfig {
                zoom: constants::HIGHLIGHT_ZOOM,
                duration_ms: constants::HIGHLIGHT_DURATION_MS,
            },
            reset: CameraTransitionConfig {
                zoom: constants::RESET_ZOOM,
                duration_ms: constants::RESET_DURATION_MS,
            },
            library_wait: LibraryWaitConfig::default(),
            marker_color: constants::MARKER_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransitionConfig {
    pub zoom: f64,
    pub duration_ms: u64,
}

impl CameraTransitionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Bounded wait for the SDK to attach itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LibraryWaitConfig {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

impl LibraryWaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Total time the wait may take before giving up.
    pub fn budget(&self) -> Duration {
        self.poll_interval() * self.max_attempts
    }
}

impl Default for LibraryWaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::LIBRARY_POLL_INTERVAL_MS,
            max_attempts: constants::LIBRARY_MAX_ATTEMPTS,
        }
    }
}

/// Script and style sheet the SDK is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryAssets {
    pub script_url: String,
    pub stylesheet_url: String,
}

impl Default for LibraryAssets {
    fn default() -> Self {
        Self {
            script_url: constants::LIBRARY_SCRIPT_URL.to_string(),
            stylesheet_url: constants::LIBRARY_STYLESHEET_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStyle {
    #[default]
    Light,
    Dark,
}

impl MapStyle {
    pub fn url(&self) -> &'static str {
        match self {
            Self::Light => constants::LIGHT_STYLE_URL,
            Self::Dark => constants::DARK_STYLE_URL,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" | "web" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}
