//! Map session controller.
//!
//! Owns the map instance from credential fetch to teardown:
//!
//! ```text
//! Uninitialized -> LoadingToken -> LoadingLibrary -> Ready -> Highlighting
//!                        \               \            \          |
//!                         +-> LoadFailed  +-> LoadFailed +--------+-> Disposed
//! ```
//!
//! The credential is fetched before the SDK is requested, so a missing token
//! never costs a script download. Highlight requests made before the map is
//! ready are remembered (latest wins) and applied once it is. At most one
//! highlight marker exists at any time.

use super::events::{EventManager, SessionEvent};
use super::library::{
    ControlPosition, FlyToOptions, MapControl, MapInstance, MapViewOptions, MarkerId,
    MarkerOptions, PopupContent,
};
use super::loader::LibraryLoader;
use super::lock;
use super::token::TokenSource;
use crate::core::{
    config::{MapSessionConfig, MapStyle},
    constants,
    geo::Coordinate,
};
use crate::district;
use crate::runtime::{self, AsyncHandle};
use crate::{EstimatorError, Result};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    LoadingToken,
    LoadingLibrary,
    Ready,
    /// Ready, with a district marker on the map
    Highlighting,
    LoadFailed(EstimatorError),
    Disposed,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready | Self::Highlighting)
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::Uninitialized | Self::LoadingToken | Self::LoadingLibrary
        )
    }
}

/// What a highlight request ended up doing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HighlightOutcome {
    Highlighted(Coordinate),
    /// Map not ready yet; applied once it is
    Deferred,
    /// Label is not a known district; map untouched
    Unresolved,
    /// Session failed or was disposed
    Ignored,
}

/// The marker currently shown on the map
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveHighlight {
    pub marker: MarkerId,
    pub label: String,
    pub coordinate: Coordinate,
}

struct SessionInner {
    state: SessionState,
    map: Option<Box<dyn MapInstance>>,
    highlight: Option<ActiveHighlight>,
    pending_highlight: Option<String>,
    style: MapStyle,
    init_task: Option<Box<dyn AsyncHandle>>,
}

struct SessionShared {
    inner: Mutex<SessionInner>,
    events: Mutex<EventManager>,
    loader: Arc<LibraryLoader>,
    tokens: Arc<dyn TokenSource>,
    config: MapSessionConfig,
}

/// Handle to a map session. Clones share the same session.
#[derive(Clone)]
pub struct MapSession {
    shared: Arc<SessionShared>,
}

/// Map created by an initialization that has not been handed to the
/// session yet. Released if the initialization is dropped midway.
struct PendingMap(Option<Box<dyn MapInstance>>);

impl PendingMap {
    fn as_mut(&mut self) -> Option<&mut Box<dyn MapInstance>> {
        self.0.as_mut()
    }

    fn into_inner(mut self) -> Option<Box<dyn MapInstance>> {
        self.0.take()
    }
}

impl Drop for PendingMap {
    fn drop(&mut self) {
        if let Some(mut map) = self.0.take() {
            log::debug!("releasing map from an abandoned initialization");
            map.remove();
        }
    }
}

impl MapSession {
    pub fn new(
        loader: Arc<LibraryLoader>,
        tokens: Arc<dyn TokenSource>,
        config: MapSessionConfig,
    ) -> Self {
        let style = config.style;
        Self {
            shared: Arc::new(SessionShared {
                inner: Mutex::new(SessionInner {
                    state: SessionState::Uninitialized,
                    map: None,
                    highlight: None,
                    pending_highlight: None,
                    style,
                    init_task: None,
                }),
                events: Mutex::new(EventManager::new()),
                loader,
                tokens,
                config,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared.inner).state.clone()
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.shared.inner).state.is_ready()
    }

    /// Plain-text message to show in place of the map, if the session failed
    pub fn error_message(&self) -> Option<String> {
        match &lock(&self.shared.inner).state {
            SessionState::LoadFailed(error) => Some(error.to_string()),
            _ => None,
        }
    }

    pub fn active_highlight(&self) -> Option<ActiveHighlight> {
        lock(&self.shared.inner).highlight.clone()
    }

    pub fn style(&self) -> MapStyle {
        lock(&self.shared.inner).style
    }

    /// Register an event listener, see [`SessionEvent::event_type`]
    pub fn on<F>(&self, event_type: &str, callback: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        lock(&self.shared.events).on(event_type, callback);
    }

    /// Runs [`MapSession::initialize`] in the background. The task is
    /// aborted if the session is disposed first. Does nothing once the
    /// session has been started.
    pub fn start(&self) {
        let mut inner = lock(&self.shared.inner);
        if inner.state != SessionState::Uninitialized || inner.init_task.is_some() {
            return;
        }

        // The task blocks on this lock until the handle is stored.
        let session = self.clone();
        inner.init_task = Some(runtime::spawn(async move {
            // Failures are recorded in the session state.
            let _ = session.initialize().await;
        }));
    }

    /// Fetches the credential, loads the SDK and creates the map.
    ///
    /// Only the first call on a session does anything; later calls return
    /// the outcome of the current state.
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut inner = lock(&self.shared.inner);
            match inner.state.clone() {
                SessionState::Uninitialized => inner.state = SessionState::LoadingToken,
                SessionState::Disposed => return Err(EstimatorError::Disposed),
                SessionState::LoadFailed(error) => return Err(error),
                _ => return Ok(()),
            }
        }
        log::debug!("map session: fetching access token");

        let token = match self.shared.tokens.fetch_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return self.fail(EstimatorError::Configuration(
                    "Token not configured. Please add GOONG_ACCESS_TOKEN to environment variables."
                        .to_string(),
                ))
            }
            Err(error) => return self.fail(error),
        };

        self.advance(SessionState::LoadingToken, SessionState::LoadingLibrary)?;
        log::debug!("map session: loading map library");

        if let Err(error) = self.shared.loader.ensure_loaded().await {
            return self.fail(error);
        }
        self.ensure_state(&SessionState::LoadingLibrary)?;

        let library = self.shared.loader.library();
        library.set_access_token(&token);

        let config = &self.shared.config;
        let options = MapViewOptions {
            style_url: self.style().url().to_string(),
            center: config.center,
            zoom: config.zoom,
        };
        let mut map = match library.create_map(&options) {
            Ok(map) => PendingMap(Some(map)),
            Err(error) => return self.fail(error),
        };

        let loaded = match map.as_mut() {
            Some(instance) => {
                instance.add_control(MapControl::Navigation, ControlPosition::TopRight);
                instance.wait_loaded().await
            }
            None => Ok(()),
        };
        if let Err(error) = loaded {
            drop(map);
            return self.fail(error);
        }

        // The deferred highlight is applied in the same critical section
        // that publishes `Ready`, so any highlight issued afterwards (a
        // ready listener included) replaces it.
        let deferred = {
            let mut guard = lock(&self.shared.inner);
            let inner = &mut *guard;
            if inner.state != SessionState::LoadingLibrary {
                let error = interrupted(&inner.state);
                drop(guard);
                drop(map);
                return Err(error);
            }
            inner.map = map.into_inner();
            inner.state = SessionState::Ready;
            inner.init_task = None;
            inner.pending_highlight.take().map(|label| {
                let outcome = apply_highlight_locked(&self.shared.config, inner, &label);
                (label, outcome)
            })
        };

        log::info!("map session ready");
        self.emit(SessionEvent::Ready);

        if let Some((label, outcome)) = deferred {
            if let Some(event) = highlight_event(label, outcome) {
                self.emit(event);
            }
        }
        Ok(())
    }

    /// Flies to the district named by `label` and marks it, replacing the
    /// previous marker.
    pub fn highlight(&self, label: &str) -> HighlightOutcome {
        let outcome = {
            let mut guard = lock(&self.shared.inner);
            let inner = &mut *guard;
            if inner.state.is_loading() {
                log::debug!("map not ready, deferring highlight of {:?}", label);
                inner.pending_highlight = Some(label.to_string());
                HighlightOutcome::Deferred
            } else {
                apply_highlight_locked(&self.shared.config, inner, label)
            }
        };

        if let Some(event) = highlight_event(label.to_string(), outcome) {
            self.emit(event);
        }
        outcome
    }

    /// Flies back to the home position. Markers stay in place.
    pub fn reset_view(&self) -> bool {
        let center = constants::HOME_CENTER;
        {
            let mut inner = lock(&self.shared.inner);
            if !inner.state.is_ready() {
                return false;
            }
            let reset = self.shared.config.reset;
            if let Some(map) = inner.map.as_mut() {
                map.fly_to(&FlyToOptions {
                    center,
                    zoom: reset.zoom,
                    duration: reset.duration(),
                });
            }
        }
        self.emit(SessionEvent::ViewReset { center });
        true
    }

    /// Switches between the light and dark style documents.
    pub fn toggle_style(&self) -> Option<MapStyle> {
        let style = {
            let mut inner = lock(&self.shared.inner);
            if !inner.state.is_ready() {
                return None;
            }
            let style = inner.style.toggled();
            inner.style = style;
            if let Some(map) = inner.map.as_mut() {
                map.set_style(style.url());
            }
            style
        };
        self.emit(SessionEvent::StyleChanged { style });
        Some(style)
    }

    /// Reports an error raised by the SDK, during loading or after. The
    /// session fails with the SDK's message, a running initialization is
    /// aborted and the map is released.
    pub fn report_map_error(&self, message: &str) {
        log::error!("map error: {}", message);
        let error = EstimatorError::Map(message.to_string());
        let (task, map) = {
            let mut inner = lock(&self.shared.inner);
            if matches!(inner.state, SessionState::Disposed | SessionState::LoadFailed(_)) {
                return;
            }
            inner.state = SessionState::LoadFailed(error.clone());
            inner.highlight = None;
            inner.pending_highlight = None;
            (inner.init_task.take(), inner.map.take())
        };

        if let Some(task) = task {
            task.cancel();
        }
        if let Some(mut map) = map {
            map.remove();
        }
        self.emit(SessionEvent::Failed {
            message: error.to_string(),
        });
    }

    /// Tears the session down: aborts a running initialization and releases
    /// the marker and the map. Idempotent.
    pub fn dispose(&self) {
        let (task, map, highlight) = {
            let mut inner = lock(&self.shared.inner);
            if inner.state == SessionState::Disposed {
                return;
            }
            inner.state = SessionState::Disposed;
            inner.pending_highlight = None;
            (inner.init_task.take(), inner.map.take(), inner.highlight.take())
        };

        if let Some(task) = task {
            task.cancel();
        }
        if let Some(mut map) = map {
            if let Some(highlight) = highlight {
                map.remove_marker(highlight.marker);
            }
            map.remove();
        }

        log::debug!("map session disposed");
        self.emit(SessionEvent::Disposed);
    }

    /// Moves from `expected` to `next`. Fails if the session was disposed
    /// or failed while initialization was suspended.
    fn advance(&self, expected: SessionState, next: SessionState) -> Result<()> {
        let mut inner = lock(&self.shared.inner);
        if inner.state != expected {
            return Err(interrupted(&inner.state));
        }
        inner.state = next;
        Ok(())
    }

    fn ensure_state(&self, expected: &SessionState) -> Result<()> {
        let inner = lock(&self.shared.inner);
        if inner.state != *expected {
            return Err(interrupted(&inner.state));
        }
        Ok(())
    }

    /// Moves to `LoadFailed` unless the session was disposed or had already
    /// failed meanwhile, in which case the late result is dropped.
    fn fail(&self, error: EstimatorError) -> Result<()> {
        {
            let mut inner = lock(&self.shared.inner);
            if matches!(inner.state, SessionState::Disposed | SessionState::LoadFailed(_)) {
                return Err(interrupted(&inner.state));
            }
            inner.state = SessionState::LoadFailed(error.clone());
            inner.pending_highlight = None;
            inner.init_task = None;
        }

        log::error!("map session failed: {}", error);
        self.emit(SessionEvent::Failed {
            message: error.to_string(),
        });
        Err(error)
    }

    fn emit(&self, event: SessionEvent) {
        let dispatches = {
            let mut events = lock(&self.shared.events);
            events.emit(event);
            events.take_dispatches()
        };
        for dispatch in dispatches {
            dispatch.run();
        }
    }
}

/// Error for an initialization that found the session no longer loading
fn interrupted(state: &SessionState) -> EstimatorError {
    match state {
        SessionState::LoadFailed(error) => error.clone(),
        _ => EstimatorError::Disposed,
    }
}

fn highlight_event(label: String, outcome: HighlightOutcome) -> Option<SessionEvent> {
    match outcome {
        HighlightOutcome::Highlighted(coordinate) => {
            Some(SessionEvent::Highlighted { label, coordinate })
        }
        HighlightOutcome::Deferred => Some(SessionEvent::HighlightDeferred { label }),
        HighlightOutcome::Unresolved => Some(SessionEvent::HighlightSkipped { label }),
        HighlightOutcome::Ignored => None,
    }
}

/// Moves the camera and the single marker to `label`. The caller holds the
/// session lock.
fn apply_highlight_locked(
    config: &MapSessionConfig,
    inner: &mut SessionInner,
    label: &str,
) -> HighlightOutcome {
    if !inner.state.is_ready() {
        return HighlightOutcome::Ignored;
    }
    let Some(coordinate) = district::resolve(label) else {
        return HighlightOutcome::Unresolved;
    };
    let Some(map) = inner.map.as_mut() else {
        return HighlightOutcome::Ignored;
    };

    map.fly_to(&FlyToOptions {
        center: coordinate,
        zoom: config.highlight.zoom,
        duration: config.highlight.duration(),
    });

    if let Some(previous) = inner.highlight.take() {
        map.remove_marker(previous.marker);
    }

    let marker = map.add_marker(&MarkerOptions {
        position: coordinate,
        color: config.marker_color.clone(),
        popup: Some(PopupContent {
            title: label.to_string(),
            subtitle: "Selected District".to_string(),
            offset: constants::POPUP_OFFSET,
        }),
    });

    inner.highlight = Some(ActiveHighlight {
        marker,
        label: label.to_string(),
        coordinate,
    });
    inner.state = SessionState::Highlighting;

    log::info!("highlighting district {:?} at {}", label, coordinate);
    HighlightOutcome::Highlighted(coordinate)
}

impl Drop for SessionShared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(mut map) = inner.map.take() {
            map.remove();
        }
    }
}
