//! One-shot loading of the map SDK shared by every session.

use super::library::MapLibrary;
use crate::core::config::{LibraryAssets, LibraryWaitConfig};
use crate::runtime::async_delay;
use crate::{EstimatorError, Result};
use once_cell::sync::OnceCell as SyncOnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Process-wide loader, set by the first session that asks for one.
static SHARED_LOADER: SyncOnceCell<Arc<LibraryLoader>> = SyncOnceCell::new();

/// One-shot loader for the map SDK.
///
/// Every caller awaits the same load. The script is injected at most once
/// per loader, and not at all when the SDK is already attached. The outcome
/// is cached: a failed load stays failed until the process restarts.
pub struct LibraryLoader {
    library: Arc<dyn MapLibrary>,
    assets: LibraryAssets,
    wait: LibraryWaitConfig,
    injected: AtomicBool,
    outcome: OnceCell<Result<()>>,
}

impl LibraryLoader {
    pub fn new(library: Arc<dyn MapLibrary>, assets: LibraryAssets, wait: LibraryWaitConfig) -> Self {
        Self {
            library,
            assets,
            wait,
            injected: AtomicBool::new(false),
            outcome: OnceCell::new(),
        }
    }

    /// Returns the process-wide loader, creating it from the given parts
    /// the first time. Later calls ignore their arguments.
    pub fn shared(
        library: Arc<dyn MapLibrary>,
        assets: LibraryAssets,
        wait: LibraryWaitConfig,
    ) -> Arc<LibraryLoader> {
        SHARED_LOADER
            .get_or_init(|| Arc::new(LibraryLoader::new(library, assets, wait)))
            .clone()
    }

    pub fn library(&self) -> &Arc<dyn MapLibrary> {
        &self.library
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome.get(), Some(Ok(())))
    }

    pub fn was_injected(&self) -> bool {
        self.injected.load(Ordering::SeqCst)
    }

    /// Loads the SDK if needed and waits for it to attach.
    ///
    /// If the caller driving the load is dropped, the next caller picks it
    /// up without injecting the script again.
    pub async fn ensure_loaded(&self) -> Result<()> {
        self.outcome.get_or_init(|| self.load()).await.clone()
    }

    async fn load(&self) -> Result<()> {
        if self.library.is_attached() {
            log::debug!("map library already attached, skipping injection");
            return Ok(());
        }

        if !self.injected.swap(true, Ordering::SeqCst) {
            log::debug!("injecting map library from {}", self.assets.script_url);
            self.library.inject(&self.assets);
        }

        let result = self.wait_for_library().await;
        match &result {
            Ok(()) => log::info!("map library attached"),
            Err(e) => log::error!("{}", e),
        }
        result
    }

    async fn wait_for_library(&self) -> Result<()> {
        let failure = EstimatorError::LibraryLoad {
            attempts: self.wait.max_attempts,
        };

        if let Some(signal) = self.library.load_signal() {
            return match tokio::time::timeout(self.wait.budget(), signal).await {
                Ok(()) if self.library.is_attached() => Ok(()),
                _ => Err(failure),
            };
        }

        for attempt in 1..=self.wait.max_attempts {
            async_delay(self.wait.poll_interval()).await;
            if self.library.is_attached() {
                log::debug!("map library attached after {} polls", attempt);
                return Ok(());
            }
        }

        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::headless::{HeadlessLibrary, LoadBehavior};
    use std::time::Duration;

    fn loader_for(library: &HeadlessLibrary) -> LibraryLoader {
        LibraryLoader::new(
            Arc::new(library.clone()),
            LibraryAssets::default(),
            LibraryWaitConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloaded_library_is_not_injected() {
        let library = HeadlessLibrary::new(LoadBehavior::Preloaded);
        let loader = loader_for(&library);

        loader.ensure_loaded().await.unwrap();
        assert!(loader.is_loaded());
        assert!(!loader.was_injected());
        assert_eq!(library.injections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_waits_for_late_attach() {
        let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_millis(350)));
        let loader = loader_for(&library);

        loader.ensure_loaded().await.unwrap();
        assert_eq!(library.injections(), 1);
        assert!(library.availability_checks() >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_fails() {
        let library = HeadlessLibrary::new(LoadBehavior::Never);
        let loader = loader_for(&library);

        let started = tokio::time::Instant::now();
        let err = loader.ensure_loaded().await.unwrap_err();
        assert_eq!(err, EstimatorError::LibraryLoad { attempts: 50 });
        assert_eq!(started.elapsed(), Duration::from_millis(5000));
        // One check up front, then one per attempt.
        assert_eq!(library.availability_checks(), 51);

        // The failure is cached, nothing is retried.
        assert!(loader.ensure_loaded().await.is_err());
        assert_eq!(library.injections(), 1);
        assert_eq!(library.availability_checks(), 51);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_load() {
        let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_millis(200)));
        let loader = Arc::new(loader_for(&library));

        let (a, b) = tokio::join!(loader.ensure_loaded(), loader.ensure_loaded());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(library.injections(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_signal_replaces_polling() {
        let library = HeadlessLibrary::new(LoadBehavior::AfterDelay(Duration::from_millis(120)))
            .with_load_signal();
        let loader = loader_for(&library);

        let started = tokio::time::Instant::now();
        loader.ensure_loaded().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(120));
        // Only the up-front check and the confirmation after the signal.
        assert_eq!(library.availability_checks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_signal_still_bounded() {
        let library = HeadlessLibrary::new(LoadBehavior::Never).with_load_signal();
        let loader = loader_for(&library);

        let err = loader.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, EstimatorError::LibraryLoad { .. }));
    }
}
