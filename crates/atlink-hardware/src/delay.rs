//! Tokio-backed [`Delay`].

use crate::traits::Delay;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps on the tokio timer; [`Delay::stop`] cancels every pending sleep.
///
/// Sleeps started after a `stop` run normally.
#[derive(Debug, Default)]
pub struct TokioDelay {
    stop: Mutex<CancellationToken>,
}

impl TokioDelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> CancellationToken {
        self.stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Delay for TokioDelay {
    async fn delay_ms(&self, ms: u64) -> bool {
        let stop = self.current();
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(ms)) => true,
            _ = stop.cancelled() => false,
        }
    }

    fn stop(&self) {
        let mut guard = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        let stopped = std::mem::take(&mut *guard);
        stopped.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapses() {
        let delay = TokioDelay::new();
        let start = Instant::now();
        assert!(delay.delay_ms(200).await);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_sleep() {
        let delay = Arc::new(TokioDelay::new());
        let sleeper = {
            let delay = Arc::clone(&delay);
            tokio::spawn(async move { delay.delay_ms(10_000).await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        delay.stop();

        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_after_stop_runs_normally() {
        let delay = TokioDelay::new();
        delay.stop();
        assert!(delay.delay_ms(1).await);
    }
}
