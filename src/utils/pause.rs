// src/utils/pause.rs

//! Injectable delays for request pacing and retry backoff.

use std::time::Duration;

use async_trait::async_trait;

/// Voluntary suspension between requests.
///
/// Production code uses [`TokioPause`]; tests substitute [`NoPause`] so that
/// rate limiting and retry backoff cost no wall-clock time.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, _duration: Duration) {}
}
