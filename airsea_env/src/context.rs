//! Core environment context trait for AirSea ingest.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// The central interface for clock interaction.
///
/// This trait abstracts the "real world" clock so that the ingest runtime
/// runs unchanged in production (tokio) and in deterministic simulation.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and the system clock
/// - **Simulation**: `SimContext` - virtual clock advanced by the harness
#[async_trait]
pub trait IngestContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;
    
    /// Returns the wall-clock time.
    ///
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;
    
    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);
    
    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
    
    /// Wall-clock time as whole Unix seconds, the unit the broker uses.
    fn unix_secs(&self) -> u64 {
        self.system_time()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
