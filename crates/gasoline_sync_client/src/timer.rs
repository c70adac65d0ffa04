//! Cancellable inter-cycle timer.

use std::time::Duration;
use tokio::sync::Notify;

/// How a [`PollTimer::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// Someone called [`PollTimer::wake`] first.
    Woken,
}

/// A sleep that can be cut short.
///
/// The sync loop parks here between cycles; `wake` ends the wait early
/// (flush, queued result, stop). A wake issued while no wait is in
/// progress is remembered and consumes the next wait immediately, so a
/// result queued mid-cycle still triggers a prompt follow-up cycle.
#[derive(Default)]
pub struct PollTimer {
    wake: Notify,
}

impl PollTimer {
    /// Creates an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for `duration`, or until woken.
    pub async fn wait(&self, duration: Duration) -> WaitOutcome {
        tokio::select! {
            _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
            _ = self.wake.notified() => WaitOutcome::Woken,
        }
    }

    /// Ends the current wait early, or the next one if none is active.
    pub fn wake(&self) {
        self.wake.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn elapses_without_wake() {
        let timer = PollTimer::new();
        let outcome = timer.wait(Duration::from_millis(100)).await;
        assert_eq!(outcome, WaitOutcome::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn wake_cuts_wait_short() {
        let timer = Arc::new(PollTimer::new());
        let waker = Arc::clone(&timer);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waker.wake();
        });

        let started = tokio::time::Instant::now();
        let outcome = timer.wait(Duration::from_secs(3600)).await;
        assert_eq!(outcome, WaitOutcome::Woken);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn early_wake_is_remembered() {
        let timer = PollTimer::new();
        timer.wake();
        let started = tokio::time::Instant::now();
        let outcome = timer.wait(Duration::from_secs(3600)).await;
        assert_eq!(outcome, WaitOutcome::Woken);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
