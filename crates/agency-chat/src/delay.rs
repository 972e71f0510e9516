//! Artificial pauses before the welcome turn and each reply.

use std::time::Duration;

use async_trait::async_trait;

/// Injectable pause so sessions can run without real waiting in tests.
#[async_trait]
pub trait ReplyDelay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioDelay;

#[async_trait]
impl ReplyDelay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelay;

#[async_trait]
impl ReplyDelay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}
