//! Fixed values of the estimator: map camera defaults, SDK asset locations
//! and the library wait budget. Keeping them in a single place makes it
//! easier to tweak the magic numbers.

use crate::core::geo::Coordinate;

/// City center used when the map is first created.
pub const CITY_CENTER: Coordinate = Coordinate::new(108.2017, 16.0544);

/// Home position used by "reset view".
pub const HOME_CENTER: Coordinate = Coordinate::new(108.15009, 16.07446);

/// Zoom of a freshly created map.
pub const DEFAULT_ZOOM: f64 = 11.0;

/// Zoom reached when flying to a highlighted district.
pub const HIGHLIGHT_ZOOM: f64 = 13.0;

/// Duration of the highlight fly-to, in milliseconds.
pub const HIGHLIGHT_DURATION_MS: u64 = 1500;

/// Zoom and duration of the fly back home.
pub const RESET_ZOOM: f64 = 15.0;
pub const RESET_DURATION_MS: u64 = 1000;

/// Library wait: poll interval and attempt ceiling.
pub const LIBRARY_POLL_INTERVAL_MS: u64 = 100;
pub const LIBRARY_MAX_ATTEMPTS: u32 = 50;

/// Style documents served by the tile provider.
pub const LIGHT_STYLE_URL: &str = "https://tiles.goong.io/assets/goong_map_web.json";
pub const DARK_STYLE_URL: &str = "https://tiles.goong.io/assets/goong_map_dark.json";

/// Map SDK assets on the CDN.
pub const LIBRARY_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/@goongmaps/goong-js@1.0.9/dist/goong-js.js";
pub const LIBRARY_STYLESHEET_URL: &str =
    "https://cdn.jsdelivr.net/npm/@goongmaps/goong-js@1.0.9/dist/goong-js.css";

/// Same-origin route that hands out the map access token.
pub const TOKEN_ROUTE: &str = "/api/goong-token";

/// Highlight marker colour.
pub const MARKER_COLOR: &str = "#3b82f6";

/// Popup offset in pixels above the marker.
pub const POPUP_OFFSET: u32 = 25;

/// One unit of the service's price scale ("tỷ") in VND.
pub const VND_PER_BILLION: f64 = 1_000_000_000.0;
