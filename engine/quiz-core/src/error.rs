use thiserror::Error;

use crate::models::QuizState;

/// Errors returned by quiz operations. Every variant is raised before the
/// session is touched, so a rejected call never leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Operation '{operation}' is not allowed while the quiz is {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: QuizState,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Question index {index} is out of range (question count: {count})")]
    OutOfRangeIndex { index: usize, count: usize },

    #[error("Question set is empty")]
    EmptyQuestionSet,

    #[error("Question {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    #[error("Question bank error: {0}")]
    QuestionBank(String),
}

pub type QuizResult<T> = Result<T, QuizError>;
