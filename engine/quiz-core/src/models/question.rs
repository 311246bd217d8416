use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};
use crate::models::answer::AnswerInput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub correct: bool,
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            text: text.into(),
            correct,
        }
    }
}

/// A quiz question. The serialized shape uses a `type` tag of `mcq`,
/// `true-false` or `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Question {
    #[serde(rename = "mcq")]
    MultipleChoice {
        question: String,
        answers: Vec<ChoiceOption>,
    },
    #[serde(rename = "true-false")]
    TrueFalse {
        question: String,
        answer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    #[serde(rename = "text")]
    FreeText {
        question: String,
        answer: String,
        #[serde(default, rename = "acceptableAnswers")]
        acceptable_answers: Vec<String>,
    },
}

/// Outcome of checking one input against a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub correct: bool,
    pub user_answer_text: String,
}

impl Question {
    pub fn multiple_choice(question: impl Into<String>, answers: Vec<ChoiceOption>) -> Self {
        Question::MultipleChoice {
            question: question.into(),
            answers,
        }
    }

    pub fn true_false(
        question: impl Into<String>,
        answer: bool,
        explanation: Option<String>,
    ) -> Self {
        Question::TrueFalse {
            question: question.into(),
            answer,
            explanation,
        }
    }

    pub fn free_text(
        question: impl Into<String>,
        answer: impl Into<String>,
        acceptable_answers: Vec<String>,
    ) -> Self {
        Question::FreeText {
            question: question.into(),
            answer: answer.into(),
            acceptable_answers,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            Question::MultipleChoice { question, .. }
            | Question::TrueFalse { question, .. }
            | Question::FreeText { question, .. } => question,
        }
    }

    /// Label shown in the review, derived from the serialized tag.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Question::MultipleChoice { .. } => "Mcq",
            Question::TrueFalse { .. } => "True False",
            Question::FreeText { .. } => "Text",
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            Question::TrueFalse { explanation, .. } => explanation.as_deref(),
            _ => None,
        }
    }

    pub fn correct_answer_text(&self) -> String {
        match self {
            Question::MultipleChoice { answers, .. } => answers
                .iter()
                .find(|option| option.correct)
                .map(|option| option.text.clone())
                .unwrap_or_default(),
            Question::TrueFalse { answer, .. } => bool_label(*answer).to_string(),
            Question::FreeText { answer, .. } => answer.clone(),
        }
    }

    /// Checks `input` against this question's answer rule.
    ///
    /// Returns `InvalidInput` when the input kind does not fit the question,
    /// when a choice index is outside the option list, or when free text is
    /// blank.
    pub fn evaluate(&self, input: &AnswerInput) -> QuizResult<Evaluation> {
        match (self, input) {
            (Question::MultipleChoice { answers, .. }, AnswerInput::Choice(index)) => {
                let option = answers.get(*index).ok_or_else(|| {
                    QuizError::InvalidInput(format!(
                        "choice {} does not exist (options: {})",
                        index,
                        answers.len()
                    ))
                })?;
                Ok(Evaluation {
                    correct: option.correct,
                    user_answer_text: option.text.clone(),
                })
            }
            (Question::TrueFalse { answer, .. }, AnswerInput::Boolean(value)) => Ok(Evaluation {
                correct: value == answer,
                user_answer_text: bool_label(*value).to_string(),
            }),
            (
                Question::FreeText {
                    answer,
                    acceptable_answers,
                    ..
                },
                AnswerInput::Text(raw),
            ) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(QuizError::InvalidInput(
                        "free-text answer must not be blank".to_string(),
                    ));
                }
                let cleaned = normalize_text(trimmed);
                let correct = std::iter::once(answer)
                    .chain(acceptable_answers.iter())
                    .any(|candidate| normalize_text(candidate) == cleaned);
                Ok(Evaluation {
                    correct,
                    user_answer_text: trimmed.to_string(),
                })
            }
            (question, input) => Err(QuizError::InvalidInput(format!(
                "{} answer does not fit a {} question",
                input.kind_name(),
                question.kind_label()
            ))),
        }
    }

    /// Structural checks run when a question bank is loaded.
    pub fn validate_definition(&self, index: usize) -> QuizResult<()> {
        let invalid = |reason: &str| QuizError::InvalidQuestion {
            index,
            reason: reason.to_string(),
        };

        if self.prompt().trim().is_empty() {
            return Err(invalid("prompt is blank"));
        }

        match self {
            Question::MultipleChoice { answers, .. } => {
                if answers.iter().any(|option| option.text.trim().is_empty()) {
                    return Err(invalid("option text is blank"));
                }
                let correct = answers.iter().filter(|option| option.correct).count();
                if correct != 1 {
                    return Err(invalid(&format!(
                        "expected exactly one correct option, found {}",
                        correct
                    )));
                }
            }
            Question::TrueFalse { .. } => {}
            Question::FreeText { answer, .. } => {
                if answer.trim().is_empty() {
                    return Err(invalid("canonical answer is blank"));
                }
            }
        }

        Ok(())
    }
}

fn bool_label(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Free-text comparison form: surrounding whitespace removed, lowercased.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dns_question(alternatives: Vec<String>) -> Question {
        Question::free_text("What does DNS stand for?", "Domain Name System", alternatives)
    }

    #[test]
    fn test_free_text_ignores_case_and_surrounding_whitespace() {
        let question = dns_question(vec![]);
        for input in ["domain name system", "  Domain Name System  ", "DOMAIN NAME SYSTEM"] {
            let evaluation = question
                .evaluate(&AnswerInput::Text(input.to_string()))
                .unwrap();
            assert!(evaluation.correct, "expected '{}' to be accepted", input);
        }
    }

    #[test]
    fn test_free_text_abbreviation_needs_alternative() {
        let question = dns_question(vec![]);
        let evaluation = question
            .evaluate(&AnswerInput::Text("DNS".to_string()))
            .unwrap();
        assert!(!evaluation.correct);

        let question = dns_question(vec!["dns".to_string()]);
        let evaluation = question
            .evaluate(&AnswerInput::Text("DNS".to_string()))
            .unwrap();
        assert!(evaluation.correct);
    }

    #[test]
    fn test_free_text_keeps_trimmed_user_text() {
        let question = dns_question(vec![]);
        let evaluation = question
            .evaluate(&AnswerInput::Text("  Domain Name Service ".to_string()))
            .unwrap();
        assert!(!evaluation.correct);
        assert_eq!(evaluation.user_answer_text, "Domain Name Service");
    }

    #[test]
    fn test_free_text_blank_is_rejected() {
        let question = dns_question(vec![]);
        let err = question
            .evaluate(&AnswerInput::Text("   ".to_string()))
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
    }

    #[test]
    fn test_multiple_choice_uses_option_flag() {
        let question = Question::multiple_choice(
            "Which protocol is used for secure web browsing?",
            vec![
                ChoiceOption::new("HTTP", false),
                ChoiceOption::new("HTTPS", true),
            ],
        );

        let wrong = question.evaluate(&AnswerInput::Choice(0)).unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.user_answer_text, "HTTP");

        let right = question.evaluate(&AnswerInput::Choice(1)).unwrap();
        assert!(right.correct);
        assert_eq!(question.correct_answer_text(), "HTTPS");

        assert!(matches!(
            question.evaluate(&AnswerInput::Choice(2)),
            Err(QuizError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_true_false_labels() {
        let question = Question::true_false("TCP is a connectionless protocol.", false, None);
        let evaluation = question.evaluate(&AnswerInput::Boolean(false)).unwrap();
        assert!(evaluation.correct);
        assert_eq!(evaluation.user_answer_text, "False");
        assert_eq!(question.correct_answer_text(), "False");
        assert_eq!(question.kind_label(), "True False");
    }

    #[test]
    fn test_mismatched_input_kind_is_rejected() {
        let question = Question::true_false("IPv4 addresses are 128 bits long.", false, None);
        let err = question
            .evaluate(&AnswerInput::Text("false".to_string()))
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_definition_requires_single_correct_option() {
        let question = Question::multiple_choice(
            "Pick one",
            vec![ChoiceOption::new("a", true), ChoiceOption::new("b", true)],
        );
        assert!(matches!(
            question.validate_definition(3),
            Err(QuizError::InvalidQuestion { index: 3, .. })
        ));
    }

    #[test]
    fn test_deserialize_tagged_question() {
        let json = r#"{
            "type": "text",
            "question": "What port number does HTTP typically use?",
            "answer": "80",
            "acceptableAnswers": ["80", "port 80"]
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        match question {
            Question::FreeText {
                acceptable_answers, ..
            } => assert_eq!(acceptable_answers.len(), 2),
            other => panic!("unexpected question kind: {:?}", other),
        }
    }
}
