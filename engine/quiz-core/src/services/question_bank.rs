use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{QuizError, QuizResult};
use crate::models::Question;

const BUILTIN_BANK: &str = include_str!("../../data/questions.json");

/// On-disk question bank: a title plus the ordered question list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionBankFile {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[validate(length(min = 1, message = "Question bank must contain at least one question"))]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    title: String,
    questions: Arc<[Question]>,
}

impl QuestionBank {
    /// The Internet Technology bank shipped with the crate.
    pub fn builtin() -> QuizResult<Self> {
        Self::from_json(BUILTIN_BANK)
    }

    pub fn from_json(json: &str) -> QuizResult<Self> {
        let file: QuestionBankFile = serde_json::from_str(json)
            .map_err(|e| QuizError::QuestionBank(format!("Malformed question bank: {}", e)))?;
        Self::from_file(file)
    }

    pub fn load(path: impl AsRef<Path>) -> QuizResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            QuizError::QuestionBank(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let bank = Self::from_json(&json)?;
        tracing::info!(
            "Loaded question bank '{}' from {} ({} questions)",
            bank.title,
            path.display(),
            bank.len()
        );
        Ok(bank)
    }

    /// Uses the file at `path` when given, the built-in bank otherwise.
    pub fn load_or_builtin(path: Option<&str>) -> QuizResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn from_file(file: QuestionBankFile) -> QuizResult<Self> {
        if file.questions.is_empty() {
            return Err(QuizError::EmptyQuestionSet);
        }
        file.validate()
            .map_err(|e| QuizError::QuestionBank(e.to_string()))?;

        for (index, question) in file.questions.iter().enumerate() {
            question.validate_definition(index)?;
        }

        Ok(Self {
            title: file.title,
            questions: file.questions.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> Arc<[Question]> {
        Arc::clone(&self.questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_is_valid() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(bank.title(), "Internet Technology Quiz");
        assert_eq!(bank.len(), 20);

        let kinds = bank.questions();
        let text = kinds
            .iter()
            .filter(|q| matches!(q, Question::FreeText { .. }))
            .count();
        let true_false = kinds
            .iter()
            .filter(|q| matches!(q, Question::TrueFalse { .. }))
            .count();
        assert_eq!(text, 3);
        assert_eq!(true_false, 4);
    }

    #[test]
    fn test_empty_bank_rejected() {
        let err = QuestionBank::from_json(r#"{"title": "Empty", "questions": []}"#).unwrap_err();
        assert_eq!(err, QuizError::EmptyQuestionSet);
    }

    #[test]
    fn test_blank_title_rejected() {
        let json = r#"{
            "title": "",
            "questions": [{"type": "true-false", "question": "Q?", "answer": true}]
        }"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(QuizError::QuestionBank(_))
        ));
    }

    #[test]
    fn test_invalid_question_reports_index() {
        let json = r#"{
            "title": "Broken",
            "questions": [
                {"type": "true-false", "question": "Q?", "answer": true},
                {"type": "text", "question": "Q2?", "answer": "  "}
            ]
        }"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(QuizError::InvalidQuestion { index: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_question_type_is_malformed() {
        let json = r#"{
            "title": "Odd",
            "questions": [{"type": "essay", "question": "Q?"}]
        }"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(QuizError::QuestionBank(_))
        ));
    }
}
