use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};

/// Trailing-edge debounce: every `schedule` restarts the delay, and
/// [`Debounce::fired`] resolves once it elapses without another call.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    timer: Option<Pin<Box<Sleep>>>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self) {
        let deadline = Instant::now() + self.delay;
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(sleep_until(deadline))),
        }
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Wait for the scheduled deadline. Never resolves while nothing is
    /// scheduled, so it can sit in a `select!` arm.
    pub async fn fired(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut debounce = Debounce::new(Duration::from_millis(20));
        debounce.schedule();
        let start = Instant::now();
        debounce.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(!debounce.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_restarts_delay() {
        let mut debounce = Debounce::new(Duration::from_millis(20));
        let start = Instant::now();
        debounce.schedule();
        tokio::time::advance(Duration::from_millis(15)).await;
        debounce.schedule();
        debounce.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_never_fires() {
        let mut debounce = Debounce::new(Duration::from_millis(20));
        debounce.schedule();
        debounce.cancel();
        let fired = tokio::time::timeout(Duration::from_millis(100), debounce.fired()).await;
        assert!(fired.is_err());
    }
}
