use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{QuizError, QuizResult};
use crate::metrics::{record_answer, record_session_event, QUIZ_SESSIONS_ACTIVE};
use crate::models::review::COMPLETION_MESSAGE;
use crate::models::{
    AnswerInput, AnswerRecord, Question, QuizReview, QuizSnapshot, QuizState, QuizSummary,
    ReviewEntry, SubmitAnswerResponse, TickOutcome, UserAnswer,
};
use crate::utils::time::{elapsed_seconds, format_clock, is_time_low};

/// Where navigation ended up after `next()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(usize),
    Finished,
}

/// One quiz attempt and the rules that move it between states.
///
/// All operations are synchronous and validate before they mutate, so the
/// score always equals the number of slots whose current record is correct.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Arc<[Question]>,
    duration_seconds: u32,
    time_low_threshold: u32,
    state: QuizState,
    session_id: Option<Uuid>,
    current_index: usize,
    answers: Vec<Option<AnswerRecord>>,
    score: u32,
    time_remaining: u32,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(questions: impl Into<Arc<[Question]>>, duration_seconds: u32) -> QuizResult<Self> {
        let questions = questions.into();
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestionSet);
        }

        let count = questions.len();
        Ok(Self {
            questions,
            duration_seconds,
            time_low_threshold: 60,
            state: QuizState::NotStarted,
            session_id: None,
            current_index: 0,
            answers: vec![None; count],
            score: 0,
            time_remaining: duration_seconds,
            started_at: None,
            ended_at: None,
        })
    }

    pub fn with_time_low_threshold(mut self, threshold_seconds: u32) -> Self {
        self.time_low_threshold = threshold_seconds;
        self
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_set(&self) -> Arc<[Question]> {
        Arc::clone(&self.questions)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn answer(&self, index: usize) -> Option<&AnswerRecord> {
        self.answers.get(index).and_then(Option::as_ref)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn start(&mut self) -> Uuid {
        self.start_at(Utc::now())
    }

    /// Begins a fresh attempt from any state and returns its id.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Uuid {
        if self.state != QuizState::InProgress {
            QUIZ_SESSIONS_ACTIVE.inc();
        }

        let session_id = Uuid::new_v4();
        self.reset();
        self.session_id = Some(session_id);
        self.time_remaining = self.duration_seconds;
        self.started_at = Some(now);
        self.state = QuizState::InProgress;

        record_session_event("started");
        tracing::info!(
            "Quiz session started: {} ({} questions, {}s)",
            session_id,
            self.questions.len(),
            self.duration_seconds
        );

        session_id
    }

    pub fn go_to(&mut self, index: usize) -> QuizResult<()> {
        self.ensure_in_progress("go_to")?;
        self.check_index(index)?;
        self.current_index = index;
        Ok(())
    }

    /// Advances the cursor, finishing the attempt when already on the last
    /// question.
    pub fn next(&mut self) -> QuizResult<Navigation> {
        self.ensure_in_progress("next")?;
        if self.is_last_question() {
            self.finish()?;
            return Ok(Navigation::Finished);
        }
        self.current_index += 1;
        Ok(Navigation::Moved(self.current_index))
    }

    pub fn previous(&mut self) -> QuizResult<usize> {
        self.ensure_in_progress("previous")?;
        let index = self
            .current_index
            .checked_sub(1)
            .ok_or(QuizError::OutOfRangeIndex {
                index: 0,
                count: self.questions.len(),
            })?;
        self.current_index = index;
        Ok(index)
    }

    pub fn submit_answer(
        &mut self,
        index: usize,
        input: &AnswerInput,
    ) -> QuizResult<SubmitAnswerResponse> {
        self.ensure_in_progress("submit_answer")?;
        self.check_index(index)?;

        let question = &self.questions[index];
        let evaluation = question.evaluate(input)?;
        let record = AnswerRecord {
            question_index: index,
            question: question.prompt().to_string(),
            user_answer: evaluation.user_answer_text,
            correct: evaluation.correct,
            correct_answer: question.correct_answer_text(),
            explanation: question.explanation().map(str::to_string),
        };

        let previously_correct = self.answers[index].as_ref().map(|prior| prior.correct);
        match (previously_correct, record.correct) {
            (None, true) | (Some(false), true) => self.score += 1,
            (Some(true), false) => self.score -= 1,
            _ => {}
        }
        self.answers[index] = Some(record);
        debug_assert_eq!(self.score as usize, self.correct_count());

        record_answer(evaluation.correct);
        tracing::debug!(
            "Answer submitted: question={}, correct={}, previously_correct={:?}, score={}",
            index,
            evaluation.correct,
            previously_correct,
            self.score
        );

        Ok(SubmitAnswerResponse {
            correct: evaluation.correct,
            previously_correct,
            total_score: self.score,
        })
    }

    pub fn tick(&mut self) -> QuizResult<TickOutcome> {
        self.tick_at(Utc::now())
    }

    /// One countdown step; reaching zero finishes the attempt.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> QuizResult<TickOutcome> {
        self.ensure_in_progress("tick")?;
        self.time_remaining = self.time_remaining.saturating_sub(1);

        if self.time_remaining == 0 {
            tracing::info!(
                "Quiz time expired: {}",
                self.session_id.unwrap_or_default()
            );
            record_session_event("expired");
            self.finish_at(now)?;
            return Ok(TickOutcome::Expired);
        }

        Ok(TickOutcome::Running {
            remaining: self.time_remaining,
        })
    }

    pub fn finish(&mut self) -> QuizResult<()> {
        self.finish_at(Utc::now())
    }

    /// Ends the attempt. Finishing twice is a no-op.
    pub fn finish_at(&mut self, now: DateTime<Utc>) -> QuizResult<()> {
        match self.state {
            QuizState::Finished => return Ok(()),
            QuizState::NotStarted => {
                return Err(QuizError::InvalidStateTransition {
                    operation: "finish",
                    state: self.state,
                })
            }
            QuizState::InProgress => {}
        }

        self.ended_at = Some(now);
        self.state = QuizState::Finished;
        QUIZ_SESSIONS_ACTIVE.dec();
        record_session_event("finished");

        tracing::info!(
            "Quiz session finished: {} (score {}/{}, {}s)",
            self.session_id.unwrap_or_default(),
            self.score,
            self.questions.len(),
            self.elapsed_seconds()
        );

        Ok(())
    }

    /// Discards the attempt from any state.
    pub fn restart(&mut self) {
        if self.state == QuizState::InProgress {
            QUIZ_SESSIONS_ACTIVE.dec();
        }
        if let Some(session_id) = self.session_id {
            tracing::info!("Quiz session discarded: {}", session_id);
        }
        self.reset();
        record_session_event("restarted");
    }

    pub fn elapsed_seconds(&self) -> u64 {
        match self.ended_at {
            Some(ended_at) => elapsed_seconds(self.started_at, ended_at),
            None => 0,
        }
    }

    pub fn build_review(&self) -> QuizResult<QuizReview> {
        self.ensure_finished("build_review")?;

        let entries = self
            .questions
            .iter()
            .zip(&self.answers)
            .enumerate()
            .map(|(index, (question, slot))| ReviewEntry {
                number: index + 1,
                question: question.prompt().to_string(),
                kind: question.kind_label().to_string(),
                user_answer: slot
                    .as_ref()
                    .map(|record| UserAnswer::Answered(record.user_answer.clone()))
                    .unwrap_or(UserAnswer::NotAnswered),
                correct_answer: question.correct_answer_text(),
                explanation: question.explanation().map(str::to_string),
                correct: slot.as_ref().is_some_and(|record| record.correct),
            })
            .collect();

        Ok(QuizReview {
            answered_count: self.answered_count(),
            score: self.score,
            entries,
        })
    }

    pub fn summary(&self) -> QuizResult<QuizSummary> {
        self.ensure_finished("summary")?;
        let elapsed = self.elapsed_seconds();
        Ok(QuizSummary {
            score: self.score,
            question_count: self.questions.len(),
            elapsed_seconds: elapsed,
            elapsed_display: format_clock(elapsed),
            message: COMPLETION_MESSAGE.to_string(),
        })
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            session_id: self.session_id,
            state: self.state,
            current_index: self.current_index,
            question_count: self.questions.len(),
            time_remaining: self.time_remaining,
            time_low: is_time_low(self.time_remaining, self.time_low_threshold),
            score: self.score,
            answered_count: self.answered_count(),
            current_answer: self.answer(self.current_index).cloned(),
        }
    }

    fn reset(&mut self) {
        self.state = QuizState::NotStarted;
        self.session_id = None;
        self.current_index = 0;
        self.answers = vec![None; self.questions.len()];
        self.score = 0;
        self.time_remaining = self.duration_seconds;
        self.started_at = None;
        self.ended_at = None;
    }

    fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .flatten()
            .filter(|record| record.correct)
            .count()
    }

    fn check_index(&self, index: usize) -> QuizResult<()> {
        if index >= self.questions.len() {
            return Err(QuizError::OutOfRangeIndex {
                index,
                count: self.questions.len(),
            });
        }
        Ok(())
    }

    fn ensure_in_progress(&self, operation: &'static str) -> QuizResult<()> {
        self.ensure_state(QuizState::InProgress, operation)
    }

    fn ensure_finished(&self, operation: &'static str) -> QuizResult<()> {
        self.ensure_state(QuizState::Finished, operation)
    }

    fn ensure_state(&self, expected: QuizState, operation: &'static str) -> QuizResult<()> {
        if self.state != expected {
            return Err(QuizError::InvalidStateTransition {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}
