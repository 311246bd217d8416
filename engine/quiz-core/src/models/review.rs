use std::fmt;

use serde::{Deserialize, Serialize};

pub const NOT_ANSWERED: &str = "Not answered";
pub const COMPLETION_MESSAGE: &str = "Thank you for completing the quiz!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum UserAnswer {
    Answered(String),
    NotAnswered,
}

impl UserAnswer {
    pub fn is_answered(&self) -> bool {
        matches!(self, UserAnswer::Answered(_))
    }
}

impl fmt::Display for UserAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAnswer::Answered(text) => f.write_str(text),
            UserAnswer::NotAnswered => f.write_str(NOT_ANSWERED),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// 1-based position in the question set.
    pub number: usize,
    pub question: String,
    pub kind: String,
    pub user_answer: UserAnswer,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReview {
    pub answered_count: usize,
    pub score: u32,
    pub entries: Vec<ReviewEntry>,
}

/// Results screen data for a finished attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub score: u32,
    pub question_count: usize,
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
    pub message: String,
}
