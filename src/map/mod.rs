//! Map session: SDK loading, camera control and the district highlight.

pub mod events;
pub mod headless;
pub mod library;
pub mod loader;
pub mod session;
pub mod token;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
