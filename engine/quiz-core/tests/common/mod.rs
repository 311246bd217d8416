#![allow(dead_code)]

use quiz_core::models::{ChoiceOption, Question};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Five questions covering every kind; question 3 (index 2) is free text.
pub fn sample_questions() -> Vec<Question> {
    vec![
        Question::multiple_choice(
            "What does HTTP stand for?",
            vec![
                ChoiceOption::new("Hypertext Transfer Protocol", true),
                ChoiceOption::new("Hypertext Transfer Process", false),
                ChoiceOption::new("Hypertext Technical Protocol", false),
            ],
        ),
        Question::true_false(
            "HTTPS is more secure than HTTP because it uses encryption.",
            true,
            Some("HTTPS uses SSL/TLS encryption.".to_string()),
        ),
        Question::free_text(
            "What does DNS stand for?",
            "Domain Name System",
            vec!["Domain Name Service".to_string()],
        ),
        Question::multiple_choice(
            "Which protocol is used for sending emails?",
            vec![
                ChoiceOption::new("HTTP", false),
                ChoiceOption::new("SMTP", true),
            ],
        ),
        Question::true_false("TCP is a connectionless protocol.", false, None),
    ]
}
