//! Periodic energy regeneration.
//!
//! A [`RegenTimer`] runs a callback on a fixed interval inside a Tokio
//! task for as long as the handle lives. The first tick fires one full
//! interval after start. Dropping the handle (or calling
//! [`RegenTimer::stop`]) aborts the task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to a running regeneration task.
#[derive(Debug)]
pub struct RegenTimer {
    handle: JoinHandle<()>,
}

impl RegenTimer {
    /// Spawn a task that calls `on_tick` every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
            let mut ticker = tokio::time::interval_at(first, period);
            // Missed ticks are not replayed.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        tracing::debug!(period_ms = period.as_millis(), "Regeneration timer started");
        Self { handle }
    }

    /// Abort the task. Further ticks never fire.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Whether the task is still scheduled.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RegenTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counting_timer(period: Duration) -> (RegenTimer, Arc<AtomicU32>) {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);
        let timer = RegenTimer::start(period, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_interval() {
        let (_timer, ticks) = counting_timer(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval() {
        let (_timer, ticks) = counting_timer(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let (timer, ticks) = counting_timer(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        drop(timer);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_task() {
        let (timer, ticks) = counting_timer(Duration::from_secs(10));
        timer.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        assert!(!timer.is_running());
    }
}
