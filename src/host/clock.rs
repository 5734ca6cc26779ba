use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::traits::Clock;

/// Clock backed by tokio's timer. Follows paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
