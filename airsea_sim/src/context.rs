//! Simulation context implementing IngestContext for deterministic testing.

use async_trait::async_trait;
use airsea_env::IngestContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a virtual clock.
///
/// Time only moves when the harness calls [`SimContext::advance_time`] or
/// something awaits [`IngestContext::sleep`].
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,
    
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<AtomicU64>,
    
    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }
    
    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }
    
    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
    
    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            epoch: self.epoch,
        }
    }
}

#[async_trait]
impl IngestContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }
    
    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }
    
    async fn sleep(&self, duration: Duration) {
        // Virtual sleep: jump the clock, then let other tasks run
        self.advance_time(duration);
        tokio::task::yield_now().await;
    }
    
    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_virtual_time_advance() {
        let ctx = SimContext::new(42);
        assert_eq!(ctx.now(), Duration::ZERO);
        
        ctx.advance_time(Duration::from_secs(5));
        assert_eq!(ctx.now(), Duration::from_secs(5));
        assert_eq!(ctx.unix_secs(), 1704067205);
    }
    
    #[test]
    fn test_clones_share_clock() {
        let ctx = SimContext::new(7);
        let other = ctx.clone();
        
        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(other.now(), Duration::from_secs(1));
        assert_eq!(other.seed(), 7);
    }
    
    #[tokio::test]
    async fn test_sleep_advances_clock() {
        let ctx = SimContext::new(0);
        ctx.sleep(Duration::from_millis(250)).await;
        assert_eq!(ctx.now(), Duration::from_millis(250));
    }
}
