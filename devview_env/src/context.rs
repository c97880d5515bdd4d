//! Core environment context trait for the playback loop.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// The clock the playback loop runs against.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Testing**: `VirtualContext` (in `devview_player`) - a manually
///   advanced clock where `sleep` returns immediately
#[async_trait]
pub trait PlaybackContext: Send + Sync + 'static {
    /// Returns the monotonic time elapsed since context creation.
    ///
    /// In a virtual context this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time, used for log stamps.
    fn system_time(&self) -> SystemTime;

    /// Suspends the caller for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In a virtual context: advances the virtual clock
    async fn sleep(&self, duration: Duration);
}
