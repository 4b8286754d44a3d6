//! Production clock for the ingest runtime.

use crate::IngestContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;

/// Clock backed by the tokio timer.
///
/// Wall time is the system clock read once at construction plus the
/// monotonic time elapsed since, so stamps taken through this context never
/// step backwards when the host clock is corrected.
pub struct TokioContext {
    started: Instant,
    started_wall: SystemTime,
}

impl TokioContext {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_wall: SystemTime::now(),
        }
    }
    
    /// Shared handle, the form `IngestRuntime::new` takes.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
    
    /// Wall-clock reading this context is anchored to.
    pub fn started_at(&self) -> SystemTime {
        self.started_wall
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestContext for TokioContext {
    fn now(&self) -> Duration {
        self.started.elapsed()
    }
    
    fn system_time(&self) -> SystemTime {
        self.started_wall + self.now()
    }
    
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
    
    fn seed(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[tokio::test(start_paused = true)]
    async fn test_sleep_moves_both_clocks() {
        let ctx = TokioContext::new();
        ctx.sleep(Duration::from_secs(90)).await;
        
        assert_eq!(ctx.now(), Duration::from_secs(90));
        assert_eq!(ctx.system_time(), ctx.started_at() + Duration::from_secs(90));
    }
    
    #[tokio::test(start_paused = true)]
    async fn test_wall_time_is_monotonic() {
        let ctx = TokioContext::new();
        let mut last = ctx.unix_secs();
        
        for _ in 0..5 {
            ctx.sleep(Duration::from_secs(1)).await;
            let now = ctx.unix_secs();
            assert!(now > last);
            last = now;
        }
    }
    
    #[test]
    fn test_unix_secs_after_2024() {
        let ctx = TokioContext::new();
        assert!(ctx.unix_secs() >= 1_704_067_200);
        assert_eq!(ctx.seed(), 0);
    }
}
