use serde::{Deserialize, Serialize};

/// Raw input submitted for a question slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerInput {
    /// Index into a multiple-choice option list.
    Choice(usize),
    Boolean(bool),
    Text(String),
}

impl AnswerInput {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnswerInput::Choice(_) => "choice",
            AnswerInput::Boolean(_) => "boolean",
            AnswerInput::Text(_) => "text",
        }
    }
}

/// The current answer held by a slot. Resubmitting replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub question: String,
    pub user_answer: String,
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// Returned from a submission so the renderer can repaint the slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub previously_correct: Option<bool>,
    pub total_score: u32,
}
