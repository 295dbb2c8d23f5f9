//! In-memory map SDK.
//!
//! Records what a real SDK would draw: camera flights, markers, controls and
//! style changes. Used by the command-line app and by tests, and handy for
//! running the session controller without a browser.

use super::library::{
    ControlPosition, FlyToOptions, MapControl, MapInstance, MapLibrary, MapViewOptions, MarkerId,
    MarkerOptions,
};
use super::lock;
use crate::core::{config::LibraryAssets, geo::Coordinate};
use crate::{EstimatorError, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// How the simulated SDK attaches itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadBehavior {
    /// Already attached before anyone asks.
    Preloaded,
    /// Attaches this long after its script is injected.
    AfterDelay(Duration),
    /// The script never finishes loading.
    Never,
}

/// Snapshot of one headless map.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMapState {
    pub center: Coordinate,
    pub zoom: f64,
    pub style_url: String,
    pub controls: Vec<(MapControl, ControlPosition)>,
    pub flights: Vec<FlyToOptions>,
    pub markers: BTreeMap<MarkerId, MarkerOptions>,
    pub removed_markers: Vec<MarkerId>,
    pub removed: bool,
}

impl HeadlessMapState {
    fn new(options: &MapViewOptions) -> Self {
        Self {
            center: options.center,
            zoom: options.zoom,
            style_url: options.style_url.clone(),
            controls: Vec::new(),
            flights: Vec::new(),
            markers: BTreeMap::new(),
            removed_markers: Vec::new(),
            removed: false,
        }
    }
}

struct LibraryShared {
    behavior: LoadBehavior,
    signal: bool,
    attached: watch::Sender<bool>,
    injections: AtomicU32,
    checks: AtomicU32,
    access_token: Mutex<Option<String>>,
    maps: Mutex<Vec<Arc<Mutex<HeadlessMapState>>>>,
    map_load_delay: Mutex<Option<Duration>>,
    map_load_error: Mutex<Option<String>>,
}

#[derive(Clone)]
pub struct HeadlessLibrary {
    shared: Arc<LibraryShared>,
}

impl HeadlessLibrary {
    pub fn new(behavior: LoadBehavior) -> Self {
        let (attached, _) = watch::channel(behavior == LoadBehavior::Preloaded);
        Self {
            shared: Arc::new(LibraryShared {
                behavior,
                signal: false,
                attached,
                injections: AtomicU32::new(0),
                checks: AtomicU32::new(0),
                access_token: Mutex::new(None),
                maps: Mutex::new(Vec::new()),
                map_load_delay: Mutex::new(None),
                map_load_error: Mutex::new(None),
            }),
        }
    }

    /// Offers an explicit load-completion signal instead of relying on
    /// polling. Must be called before the library is shared.
    pub fn with_load_signal(mut self) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.signal = true;
        }
        self
    }

    /// Maps created from now on take this long to fire their load event.
    pub fn set_map_load_delay(&self, delay: Duration) {
        *lock(&self.shared.map_load_delay) = Some(delay);
    }

    /// Maps created from now on report this error instead of loading.
    pub fn fail_map_load(&self, message: impl Into<String>) {
        *lock(&self.shared.map_load_error) = Some(message.into());
    }

    pub fn injections(&self) -> u32 {
        self.shared.injections.load(Ordering::SeqCst)
    }

    /// How many times anyone asked whether the SDK is attached.
    pub fn availability_checks(&self) -> u32 {
        self.shared.checks.load(Ordering::SeqCst)
    }

    pub fn access_token(&self) -> Option<String> {
        lock(&self.shared.access_token).clone()
    }

    pub fn maps_created(&self) -> usize {
        lock(&self.shared.maps).len()
    }

    /// Snapshot of the most recently created map.
    pub fn last_map(&self) -> Option<HeadlessMapState> {
        lock(&self.shared.maps)
            .last()
            .map(|state| lock(state).clone())
    }
}

impl MapLibrary for HeadlessLibrary {
    fn is_attached(&self) -> bool {
        self.shared.checks.fetch_add(1, Ordering::SeqCst);
        *self.shared.attached.borrow()
    }

    fn inject(&self, assets: &LibraryAssets) {
        self.shared.injections.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "headless library injected ({}, {})",
            assets.script_url,
            assets.stylesheet_url
        );

        if let LoadBehavior::AfterDelay(delay) = self.shared.behavior {
            let shared = self.shared.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                shared.attached.send_replace(true);
            });
        }
    }

    fn load_signal(&self) -> Option<BoxFuture<'static, ()>> {
        if !self.shared.signal {
            return None;
        }

        let mut rx = self.shared.attached.subscribe();
        Some(Box::pin(async move {
            loop {
                let attached = *rx.borrow_and_update();
                if attached {
                    return;
                }
                if rx.changed().await.is_err() {
                    futures::future::pending::<()>().await;
                }
            }
        }))
    }

    fn set_access_token(&self, token: &str) {
        *lock(&self.shared.access_token) = Some(token.to_string());
    }

    fn create_map(&self, options: &MapViewOptions) -> Result<Box<dyn MapInstance>> {
        if !*self.shared.attached.borrow() {
            return Err(EstimatorError::Map(
                "map library is not loaded".to_string(),
            ));
        }

        let state = Arc::new(Mutex::new(HeadlessMapState::new(options)));
        lock(&self.shared.maps).push(state.clone());

        Ok(Box::new(HeadlessMap {
            state,
            next_marker: 0,
            load_delay: *lock(&self.shared.map_load_delay),
            load_error: lock(&self.shared.map_load_error).clone(),
        }))
    }
}

struct HeadlessMap {
    state: Arc<Mutex<HeadlessMapState>>,
    next_marker: u64,
    load_delay: Option<Duration>,
    load_error: Option<String>,
}

#[async_trait]
impl MapInstance for HeadlessMap {
    async fn wait_loaded(&mut self) -> Result<()> {
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.load_error {
            Some(message) => Err(EstimatorError::Map(message.clone())),
            None => Ok(()),
        }
    }

    fn add_control(&mut self, control: MapControl, position: ControlPosition) {
        lock(&self.state).controls.push((control, position));
    }

    fn fly_to(&mut self, options: &FlyToOptions) {
        let mut state = lock(&self.state);
        state.flights.push(*options);
        state.center = options.center;
        state.zoom = options.zoom;
    }

    fn add_marker(&mut self, options: &MarkerOptions) -> MarkerId {
        self.next_marker += 1;
        let id = MarkerId(self.next_marker);
        lock(&self.state).markers.insert(id, options.clone());
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        let mut state = lock(&self.state);
        if state.markers.remove(&id).is_some() {
            state.removed_markers.push(id);
        }
    }

    fn set_style(&mut self, style_url: &str) {
        lock(&self.state).style_url = style_url.to_string();
    }

    fn remove(&mut self) {
        let mut state = lock(&self.state);
        state.markers.clear();
        state.removed = true;
    }
}
