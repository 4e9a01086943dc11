//! Mosaic - dashboard tile server with callback routing, fragment
//! caching, and sanitized rendering.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod refresh;
pub mod registry;
pub mod render;
pub mod sanitize;
pub mod source;
pub mod validate;

/// Serializes tests that read or mutate `MOSAIC_*` environment variables.
/// Process environment is shared across the parallel test runner.
#[cfg(test)]
pub(crate) fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    match LOCK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
