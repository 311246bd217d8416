use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch, Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{QuizError, QuizResult};
use crate::metrics::TIMER_TICKS_TOTAL;
use crate::models::timer::{TimeExpired, TimerTick};
use crate::models::{
    AnswerInput, Question, QuizReview, QuizSnapshot, QuizState, QuizSummary,
    SubmitAnswerResponse, TickOutcome, TimerEvent,
};

use super::countdown::Countdown;
use super::quiz_session::{Navigation, QuizSession};

const TIMER_EVENT_CAPACITY: usize = 64;

/// Shortest countdown period accepted by the service.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

struct Guarded {
    session: QuizSession,
    countdown: Option<Countdown>,
}

struct ServiceInner {
    questions: Arc<[Question]>,
    tick_interval: Duration,
    guarded: Mutex<Guarded>,
    snapshots: watch::Sender<QuizSnapshot>,
    timer_events: broadcast::Sender<TimerEvent>,
}

/// Async owner of a quiz session and its countdown.
///
/// Every command runs under one lock together with the countdown handle, so
/// the timer is always cancelled before the session leaves `InProgress`.
#[derive(Clone)]
pub struct QuizService {
    inner: Arc<ServiceInner>,
}

impl QuizService {
    pub fn new(
        questions: impl Into<Arc<[Question]>>,
        duration_seconds: u32,
        tick_interval: Duration,
    ) -> QuizResult<Self> {
        let session = QuizSession::new(questions, duration_seconds)?;
        Self::from_session(session, tick_interval)
    }

    pub fn from_config(config: &Config, questions: impl Into<Arc<[Question]>>) -> QuizResult<Self> {
        let session = QuizSession::new(questions, config.duration_seconds)?
            .with_time_low_threshold(config.time_low_threshold_seconds);
        Self::from_session(session, config.tick_interval())
    }

    fn from_session(session: QuizSession, tick_interval: Duration) -> QuizResult<Self> {
        if tick_interval < MIN_TICK_INTERVAL {
            return Err(QuizError::InvalidInput(format!(
                "tick interval must be at least {}ms (got {}ms)",
                MIN_TICK_INTERVAL.as_millis(),
                tick_interval.as_millis()
            )));
        }

        let (snapshots, _) = watch::channel(session.snapshot());
        let (timer_events, _) = broadcast::channel(TIMER_EVENT_CAPACITY);
        let questions = session.question_set();

        Ok(Self {
            inner: Arc::new(ServiceInner {
                questions,
                tick_interval,
                guarded: Mutex::new(Guarded {
                    session,
                    countdown: None,
                }),
                snapshots,
                timer_events,
            }),
        })
    }

    pub fn questions(&self) -> Arc<[Question]> {
        Arc::clone(&self.inner.questions)
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.inner.questions.get(index)
    }

    /// Push channel for repaints; the receiver always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<QuizSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn subscribe_timer(&self) -> broadcast::Receiver<TimerEvent> {
        self.inner.timer_events.subscribe()
    }

    pub async fn snapshot(&self) -> QuizSnapshot {
        self.inner.guarded.lock().await.session.snapshot()
    }

    pub async fn is_countdown_running(&self) -> bool {
        self.inner
            .guarded
            .lock()
            .await
            .countdown
            .as_ref()
            .is_some_and(|countdown| !countdown.is_finished())
    }

    pub async fn start(&self) -> QuizSnapshot {
        let mut guard = self.inner.guarded.lock().await;
        if let Some(previous) = guard.countdown.take() {
            previous.cancel();
        }

        let session_id = guard.session.start();
        guard.countdown = Some(self.spawn_countdown(session_id));
        self.inner.publish(&guard)
    }

    pub async fn go_to(&self, index: usize) -> QuizResult<QuizSnapshot> {
        let mut guard = self.inner.guarded.lock().await;
        guard.session.go_to(index)?;
        Ok(self.inner.publish(&guard))
    }

    pub async fn next(&self) -> QuizResult<Navigation> {
        let mut guard = self.inner.guarded.lock().await;
        if guard.session.state() == QuizState::InProgress && guard.session.is_last_question() {
            ServiceInner::stop_countdown(&mut guard);
        }
        let navigation = guard.session.next()?;
        self.inner.publish(&guard);
        Ok(navigation)
    }

    pub async fn previous(&self) -> QuizResult<usize> {
        let mut guard = self.inner.guarded.lock().await;
        let index = guard.session.previous()?;
        self.inner.publish(&guard);
        Ok(index)
    }

    pub async fn submit_answer(
        &self,
        index: usize,
        input: &AnswerInput,
    ) -> QuizResult<SubmitAnswerResponse> {
        let mut guard = self.inner.guarded.lock().await;
        let response = guard.session.submit_answer(index, input)?;
        self.inner.publish(&guard);
        Ok(response)
    }

    pub async fn finish(&self) -> QuizResult<QuizSummary> {
        let mut guard = self.inner.guarded.lock().await;
        if guard.session.state() == QuizState::InProgress {
            ServiceInner::stop_countdown(&mut guard);
        }
        guard.session.finish()?;
        self.inner.publish(&guard);
        guard.session.summary()
    }

    pub async fn restart(&self) -> QuizSnapshot {
        let mut guard = self.inner.guarded.lock().await;
        ServiceInner::stop_countdown(&mut guard);
        guard.session.restart();
        self.inner.publish(&guard)
    }

    pub async fn build_review(&self) -> QuizResult<QuizReview> {
        self.inner.guarded.lock().await.session.build_review()
    }

    pub async fn summary(&self) -> QuizResult<QuizSummary> {
        self.inner.guarded.lock().await.session.summary()
    }

    fn spawn_countdown(&self, session_id: Uuid) -> Countdown {
        let weak = Arc::downgrade(&self.inner);
        Countdown::spawn(session_id, self.inner.tick_interval, move || {
            let weak = weak.clone();
            async move { ServiceInner::on_tick(weak, session_id).await }
        })
    }
}

impl ServiceInner {
    fn publish(&self, guard: &MutexGuard<'_, Guarded>) -> QuizSnapshot {
        let snapshot = guard.session.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn stop_countdown(guard: &mut MutexGuard<'_, Guarded>) {
        if let Some(countdown) = guard.countdown.take() {
            countdown.cancel();
        }
    }

    async fn on_tick(weak: Weak<ServiceInner>, session_id: Uuid) -> ControlFlow<()> {
        let Some(inner) = weak.upgrade() else {
            return ControlFlow::Break(());
        };
        let mut guard = inner.guarded.lock().await;

        if guard.session.session_id() != Some(session_id)
            || guard.session.state() != QuizState::InProgress
        {
            tracing::debug!("Ignoring stale countdown tick for session {}", session_id);
            return ControlFlow::Break(());
        }

        match guard.session.tick() {
            Ok(TickOutcome::Running { remaining }) => {
                TIMER_TICKS_TOTAL.inc();
                let snapshot = inner.publish(&guard);
                let total = guard.session.duration_seconds();
                let _ = inner.timer_events.send(TimerEvent::TimerTick(TimerTick {
                    session_id,
                    remaining_seconds: remaining,
                    elapsed_seconds: total.saturating_sub(remaining),
                    total_seconds: total,
                    time_low: snapshot.time_low,
                    timestamp: Utc::now(),
                }));
                ControlFlow::Continue(())
            }
            Ok(TickOutcome::Expired) => {
                TIMER_TICKS_TOTAL.inc();
                if let Some(countdown) = guard.countdown.take() {
                    countdown.release();
                }
                inner.publish(&guard);
                let _ = inner.timer_events.send(TimerEvent::TimeExpired(TimeExpired {
                    session_id,
                    timestamp: Utc::now(),
                    message: "Time limit exceeded".to_string(),
                }));
                ControlFlow::Break(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Countdown tick rejected for session {}", session_id);
                ControlFlow::Break(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tick_without_service_breaks_loop() {
        let outcome = ServiceInner::on_tick(Weak::new(), Uuid::new_v4()).await;
        assert!(outcome.is_break());
    }

    #[tokio::test]
    async fn test_tick_for_other_session_is_ignored() {
        let questions = vec![Question::true_false("Q?", true, None)];
        let service = QuizService::new(questions, 30, Duration::from_secs(1)).unwrap();
        service.start().await;

        let weak = Arc::downgrade(&service.inner);
        let outcome = ServiceInner::on_tick(weak, Uuid::new_v4()).await;
        assert!(outcome.is_break());
        assert_eq!(service.snapshot().await.time_remaining, 30);

        service.restart().await;
    }
}
