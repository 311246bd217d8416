use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod answer;
pub mod question;
pub mod review;
pub mod timer;

pub use answer::{AnswerInput, AnswerRecord, SubmitAnswerResponse};
pub use question::{ChoiceOption, Question};
pub use review::{QuizReview, QuizSummary, ReviewEntry, UserAnswer};
pub use timer::{TickOutcome, TimerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    NotStarted,
    InProgress,
    Finished,
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizState::NotStarted => "not started",
            QuizState::InProgress => "in progress",
            QuizState::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// What a renderer needs to repaint after any state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub session_id: Option<Uuid>,
    pub state: QuizState,
    pub current_index: usize,
    pub question_count: usize,
    pub time_remaining: u32,
    pub time_low: bool,
    pub score: u32,
    pub answered_count: usize,
    pub current_answer: Option<AnswerRecord>,
}
