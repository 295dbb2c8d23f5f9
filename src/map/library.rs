//! Seam between the session controller and the third-party map SDK.
//!
//! The SDK attaches itself to a shared global namespace once its script has
//! loaded; [`MapLibrary`] models that namespace and [`MapInstance`] one map
//! created from it.

use crate::core::{config::LibraryAssets, geo::Coordinate};
use crate::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::Duration;

/// Options a map instance is constructed with
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewOptions {
    pub style_url: String,
    pub center: Coordinate,
    pub zoom: f64,
}

/// Animated camera transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToOptions {
    pub center: Coordinate,
    pub zoom: f64,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub subtitle: String,
    /// Pixel offset above the marker
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: Coordinate,
    pub color: String,
    pub popup: Option<PopupContent>,
}

/// Identifier handed out by [`MapInstance::add_marker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapControl {
    Navigation,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// The SDK's global namespace.
pub trait MapLibrary: Send + Sync {
    /// Whether the SDK has attached itself and can construct maps.
    fn is_attached(&self) -> bool;

    /// Adds the SDK's script and style sheet to the page.
    fn inject(&self, assets: &LibraryAssets);

    /// Explicit load-completion signal, for environments that provide one.
    /// Resolves once the SDK is attached. Without it the loader polls
    /// [`MapLibrary::is_attached`].
    fn load_signal(&self) -> Option<BoxFuture<'static, ()>> {
        None
    }

    fn set_access_token(&self, token: &str);

    fn create_map(&self, options: &MapViewOptions) -> Result<Box<dyn MapInstance>>;
}

/// A live map created by the SDK.
#[async_trait]
pub trait MapInstance: Send {
    /// Resolves on the map's load event, or fails with the SDK's error.
    async fn wait_loaded(&mut self) -> Result<()>;

    fn add_control(&mut self, control: MapControl, position: ControlPosition);

    fn fly_to(&mut self, options: &FlyToOptions);

    fn add_marker(&mut self, options: &MarkerOptions) -> MarkerId;

    fn remove_marker(&mut self, id: MarkerId);

    fn set_style(&mut self, style_url: &str);

    /// Releases the rendering context. The instance is unusable afterwards.
    fn remove(&mut self);
}
