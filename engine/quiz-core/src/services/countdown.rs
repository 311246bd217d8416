use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Recurring tick task bound to one quiz session.
///
/// Dropping the handle aborts the task, so whoever owns the session owns
/// the timer's lifetime as well.
pub struct Countdown {
    session_id: Uuid,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Calls `on_tick` every `period` (first call one period from now) until
    /// it returns `ControlFlow::Break` or the countdown is dropped.
    pub fn spawn<F, Fut>(session_id: Uuid, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if on_tick().await.is_break() {
                    break;
                }
            }

            tracing::debug!("Countdown loop ended for session {}", session_id);
        });

        tracing::debug!(
            "Countdown started for session {} (period {}ms)",
            session_id,
            period.as_millis()
        );

        Self {
            session_id,
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Stops the task. Takes effect before the caller's next await point.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Countdown cancelled for session {}", self.session_id);
        }
    }

    /// Drops the handle without aborting; used by the tick callback when the
    /// loop is about to end on its own.
    pub fn release(mut self) {
        self.handle.take();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
