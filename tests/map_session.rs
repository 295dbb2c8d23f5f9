use danang_estimator::constants::{CITY_CENTER, HOME_CENTER};
use danang_estimator::map::headless::{HeadlessLibrary, LoadBehavior};
use danang_estimator::map::session::{HighlightOutcome, SessionState};
use danang_estimator::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn loader_for(library: &HeadlessLibrary) -> Arc<LibraryLoader> {
    Arc::new(LibraryLoader::new(
        Arc::new(library.clone()),
        LibraryAssets::default(),
        LibraryWaitConfig::default(),
    ))
}

fn session_with(library: &HeadlessLibrary, token: Option<&str>) -> MapSession {
    let _ = env_logger::builder().is_test(true).try_init();
    MapSession::new(
        loader_for(library),
        Arc::new(StaticTokenSource(token.map(String::from))),
        MapSessionConfig::default(),
    )
}

fn hai_chau() -> Coordinate {
    Coordinate::new(108.2158, 16.0733)
}

#[tokio::test]
async fn test_ready_session_is_centered_on_the_city() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));

    session.initialize().await.unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(library.access_token().as_deref(), Some("pk.test"));
    assert_eq!(library.injections(), 0);

    let map = library.last_map().unwrap();
    assert_eq!(map.center, CITY_CENTER);
    assert_eq!(map.zoom, 11.0);
    assert_eq!(map.style_url, MapStyle::Light.url());
    assert_eq!(
        map.controls,
        vec![(MapControl::Navigation, ControlPosition::TopRight)]
    );
    assert!(map.markers.is_empty());
}

#[tokio::test]
async fn test_highlight_flies_and_places_one_marker() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    session.initialize().await.unwrap();

    let outcome = session.highlight("Quận Hải Châu");
    assert_eq!(outcome, HighlightOutcome::Highlighted(hai_chau()));
    assert_eq!(session.state(), SessionState::Highlighting);

    let map = library.last_map().unwrap();
    assert_eq!(map.flights.len(), 1);
    assert_eq!(map.flights[0].center, hai_chau());
    assert_eq!(map.flights[0].zoom, 13.0);
    assert_eq!(map.flights[0].duration, Duration::from_millis(1500));

    assert_eq!(map.markers.len(), 1);
    let marker = map.markers.values().next().unwrap();
    assert_eq!(marker.position, hai_chau());
    let popup = marker.popup.as_ref().unwrap();
    assert_eq!(popup.title, "Quận Hải Châu");
    assert_eq!(popup.subtitle, "Selected District");
}

#[tokio::test]
async fn test_second_highlight_replaces_marker() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    session.initialize().await.unwrap();

    session.highlight("Hải Châu");
    let first = session.active_highlight().unwrap();
    session.highlight("Sơn Trà");

    let map = library.last_map().unwrap();
    assert_eq!(map.markers.len(), 1);
    let marker = map.markers.values().next().unwrap();
    assert_eq!(marker.position, District::SonTra.coordinate());
    assert_eq!(map.removed_markers, vec![first.marker]);

    let active = session.active_highlight().unwrap();
    assert_eq!(active.label, "Sơn Trà");
    assert_eq!(active.coordinate, District::SonTra.coordinate());
}

#[tokio::test]
async fn test_rapid_highlights_never_leak_markers() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    session.initialize().await.unwrap();

    for _ in 0..3 {
        for district in District::ALL {
            session.highlight(district.name());
            assert_eq!(library.last_map().unwrap().markers.len(), 1);
        }
    }

    let map = library.last_map().unwrap();
    assert_eq!(map.flights.len(), District::ALL.len() * 3);
    assert_eq!(map.removed_markers.len(), District::ALL.len() * 3 - 1);
}

#[tokio::test]
async fn test_unresolved_label_leaves_map_untouched() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    session.initialize().await.unwrap();
    session.highlight("Hải Châu");
    let before = library.last_map().unwrap();

    let outcome = session.highlight("Nonexistent District");

    assert_eq!(outcome, HighlightOutcome::Unresolved);
    assert_eq!(library.last_map().unwrap(), before);
    assert_eq!(session.active_highlight().unwrap().label, "Hải Châu");
    assert_eq!(session.state(), SessionState::Highlighting);
}

#[tokio::test]
async fn test_highlight_before_ready_is_applied_on_ready() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));

    assert_eq!(session.highlight("Thanh Khê"), HighlightOutcome::Deferred);
    assert_eq!(session.highlight("hai chau"), HighlightOutcome::Deferred);
    session.initialize().await.unwrap();

    let map = library.last_map().unwrap();
    assert_eq!(map.flights.len(), 1);
    assert_eq!(map.markers.len(), 1);
    assert_eq!(session.active_highlight().unwrap().coordinate, hai_chau());
}

#[tokio::test(start_paused = true)]
async fn test_missing_token_fails_without_loading_library() {
    let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_millis(100)));
    let session = session_with(&library, None);

    let err = session.initialize().await.unwrap_err();

    assert!(matches!(err, EstimatorError::Configuration(_)));
    assert!(matches!(
        session.state(),
        SessionState::LoadFailed(EstimatorError::Configuration(_))
    ));
    assert_eq!(library.injections(), 0);
    assert_eq!(library.availability_checks(), 0);
    assert_eq!(library.maps_created(), 0);
    assert!(session.error_message().unwrap().contains("Token not configured"));

    // Not retried.
    assert!(session.initialize().await.is_err());
    assert_eq!(library.injections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_library_that_never_attaches_fails_the_session() {
    let library = HeadlessLibrary::new(LoadBehavior::Never);
    let session = session_with(&library, Some("pk.test"));

    let err = session.initialize().await.unwrap_err();

    assert_eq!(err, EstimatorError::LibraryLoad { attempts: 50 });
    assert_eq!(
        session.state(),
        SessionState::LoadFailed(EstimatorError::LibraryLoad { attempts: 50 })
    );
    assert_eq!(library.maps_created(), 0);
    assert_eq!(
        session.error_message().as_deref(),
        Some("Map library failed to load after 50 attempts")
    );
    assert_eq!(session.highlight("Hải Châu"), HighlightOutcome::Ignored);
}

#[tokio::test(start_paused = true)]
async fn test_late_library_attach_reaches_ready() {
    let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_millis(750)));
    let session = session_with(&library, Some("pk.test"));

    session.initialize().await.unwrap();

    assert!(session.is_ready());
    assert_eq!(library.injections(), 1);
    assert_eq!(library.maps_created(), 1);
}

#[tokio::test]
async fn test_map_load_error_fails_and_releases_map() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    library.fail_map_load("Unauthorized style request");
    let session = session_with(&library, Some("pk.bad"));

    let err = session.initialize().await.unwrap_err();

    assert_eq!(err, EstimatorError::Map("Unauthorized style request".to_string()));
    assert!(library.last_map().unwrap().removed);
    assert_eq!(
        session.error_message().as_deref(),
        Some("Map error: Unauthorized style request")
    );
}

#[tokio::test]
async fn test_dispose_releases_marker_and_map() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    session.initialize().await.unwrap();
    session.highlight("Liên Chiểu");

    session.dispose();
    session.dispose();

    let map = library.last_map().unwrap();
    assert!(map.removed);
    assert!(map.markers.is_empty());
    assert_eq!(session.state(), SessionState::Disposed);
    assert_eq!(session.active_highlight(), None);
    assert_eq!(session.highlight("Hải Châu"), HighlightOutcome::Ignored);
    assert_eq!(session.initialize().await, Err(EstimatorError::Disposed));
}

#[tokio::test(start_paused = true)]
async fn test_dispose_during_library_wait_cancels_initialization() {
    let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_secs(1)));
    let session = session_with(&library, Some("pk.test"));

    session.start();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.state(), SessionState::LoadingLibrary);

    session.dispose();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(session.state(), SessionState::Disposed);
    assert_eq!(library.maps_created(), 0);
    assert_eq!(library.injections(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_map_created_by_stale_initialization_is_released() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    library.set_map_load_delay(Duration::from_millis(500));
    let session = session_with(&library, Some("pk.test"));

    session.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(library.maps_created(), 1);

    session.dispose();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(library.last_map().unwrap().removed);
    assert_eq!(session.state(), SessionState::Disposed);
}

#[tokio::test(start_paused = true)]
async fn test_sessions_sharing_a_loader_inject_once() {
    let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_millis(250)));
    let loader = loader_for(&library);
    let tokens: Arc<dyn TokenSource> = Arc::new(StaticTokenSource::new("pk.test"));
    let first = MapSession::new(loader.clone(), tokens.clone(), MapSessionConfig::default());
    let second = MapSession::new(loader, tokens, MapSessionConfig::default());

    let (a, b) = tokio::join!(first.initialize(), second.initialize());

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(library.injections(), 1);
    assert_eq!(library.maps_created(), 2);
}

#[tokio::test]
async fn test_reset_view_and_style_toggle() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));

    assert!(!session.reset_view());
    assert_eq!(session.toggle_style(), None);

    session.initialize().await.unwrap();
    session.highlight("Ngũ Hành Sơn");

    assert!(session.reset_view());
    assert_eq!(session.toggle_style(), Some(MapStyle::Dark));

    let map = library.last_map().unwrap();
    assert_eq!(HOME_CENTER, Coordinate::new(108.15009, 16.07446));
    assert_eq!(map.center, HOME_CENTER);
    assert_eq!(map.zoom, 15.0);
    assert_eq!(map.style_url, MapStyle::Dark.url());
    assert_eq!(map.markers.len(), 1);

    assert_eq!(session.toggle_style(), Some(MapStyle::Light));
}

#[tokio::test]
async fn test_runtime_map_error_fails_session() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    session.initialize().await.unwrap();
    session.highlight("Cẩm Lệ");

    session.report_map_error("WebGL context lost");

    assert!(library.last_map().unwrap().removed);
    assert_eq!(
        session.error_message().as_deref(),
        Some("Map error: WebGL context lost")
    );
    assert_eq!(session.highlight("Cẩm Lệ"), HighlightOutcome::Ignored);
}

#[tokio::test]
async fn test_listeners_see_session_events_in_order() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    session.on("*", move |event| sink.lock().unwrap().push(event.clone()));

    session.highlight("Sơn Trà");
    session.initialize().await.unwrap();
    session.highlight("Atlantis");
    session.dispose();

    let events = seen.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            SessionEvent::HighlightDeferred {
                label: "Sơn Trà".to_string()
            },
            SessionEvent::Ready,
            SessionEvent::Highlighted {
                label: "Sơn Trà".to_string(),
                coordinate: District::SonTra.coordinate(),
            },
            SessionEvent::HighlightSkipped {
                label: "Atlantis".to_string()
            },
            SessionEvent::Disposed,
        ]
    );
}

#[tokio::test]
async fn test_ready_listener_may_call_back_into_session() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));

    let handle = session.clone();
    session.on("ready", move |_| {
        handle.highlight("Hòa Vang");
    });
    session.initialize().await.unwrap();

    assert_eq!(
        session.active_highlight().unwrap().coordinate,
        District::HoaVang.coordinate()
    );
}

#[tokio::test]
async fn test_highlight_from_ready_listener_beats_deferred_one() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));

    let handle = session.clone();
    session.on("ready", move |_| {
        handle.highlight("Hòa Vang");
    });

    assert_eq!(session.highlight("Sơn Trà"), HighlightOutcome::Deferred);
    session.initialize().await.unwrap();

    let active = session.active_highlight().unwrap();
    assert_eq!(active.label, "Hòa Vang");
    assert_eq!(active.coordinate, District::HoaVang.coordinate());

    let map = library.last_map().unwrap();
    assert_eq!(map.markers.len(), 1);
    assert_eq!(map.center, District::HoaVang.coordinate());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_start_leaves_one_cancellable_wait() {
    let library = HeadlessLibrary::new(LoadBehavior::Never);
    let session = session_with(&library, Some("pk.test"));

    session.start();
    session.start();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.state(), SessionState::LoadingLibrary);

    session.dispose();
    let checks_at_dispose = library.availability_checks();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(library.availability_checks(), checks_at_dispose);
    assert_eq!(library.injections(), 1);
    assert_eq!(session.state(), SessionState::Disposed);
}

#[tokio::test(start_paused = true)]
async fn test_map_error_during_loading_keeps_session_failed() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    library.set_map_load_delay(Duration::from_millis(500));
    let session = session_with(&library, Some("pk.test"));

    session.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.report_map_error("style 401");
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        session.state(),
        SessionState::LoadFailed(EstimatorError::Map("style 401".to_string()))
    );
    assert_eq!(session.error_message().as_deref(), Some("Map error: style 401"));
    assert!(library.last_map().unwrap().removed);
    assert_eq!(session.highlight("Hải Châu"), HighlightOutcome::Ignored);
}

#[tokio::test]
async fn test_map_error_before_initialize_is_not_overwritten() {
    let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
    let session = session_with(&library, Some("pk.test"));

    session.report_map_error("container missing");

    assert_eq!(
        session.initialize().await,
        Err(EstimatorError::Map("container missing".to_string()))
    );
    assert_eq!(library.maps_created(), 0);
}
