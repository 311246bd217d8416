use quiz_core::config::{DEFAULT_DURATION_SECONDS, DEFAULT_TICK_INTERVAL_MS};
use quiz_core::{Config, QuestionBank};
use serial_test::serial;

const QUIZ_VARS: [&str; 4] = [
    "QUIZ_DURATION_SECONDS",
    "QUIZ_TICK_INTERVAL_MS",
    "QUIZ_TIME_LOW_SECONDS",
    "QUIZ_QUESTION_BANK",
];

fn clear_quiz_env() {
    for key in QUIZ_VARS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_overrides() {
    clear_quiz_env();

    let config = Config::load().unwrap();
    assert_eq!(config.duration_seconds, DEFAULT_DURATION_SECONDS);
    assert_eq!(config.duration_seconds, 900);
    assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    assert_eq!(config.time_low_threshold_seconds, 60);
    assert!(config.question_bank_path.is_none());
}

#[test]
#[serial]
fn test_env_overrides_duration_and_interval() {
    clear_quiz_env();
    std::env::set_var("QUIZ_DURATION_SECONDS", "120");
    std::env::set_var("QUIZ_TICK_INTERVAL_MS", "250");
    std::env::set_var("QUIZ_TIME_LOW_SECONDS", "10");

    let config = Config::load().unwrap();
    clear_quiz_env();

    assert_eq!(config.duration_seconds, 120);
    assert_eq!(config.tick_interval_ms, 250);
    assert_eq!(config.tick_interval(), std::time::Duration::from_millis(250));
    assert_eq!(config.time_low_threshold_seconds, 10);
}

#[test]
#[serial]
fn test_zero_duration_is_rejected() {
    clear_quiz_env();
    std::env::set_var("QUIZ_DURATION_SECONDS", "0");

    let result = Config::load();
    clear_quiz_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_negative_duration_is_rejected() {
    clear_quiz_env();
    std::env::set_var("QUIZ_DURATION_SECONDS", "-5");

    let result = Config::load();
    clear_quiz_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_non_numeric_values_are_rejected() {
    for key in [
        "QUIZ_DURATION_SECONDS",
        "QUIZ_TICK_INTERVAL_MS",
        "QUIZ_TIME_LOW_SECONDS",
    ] {
        clear_quiz_env();
        std::env::set_var(key, "abc");

        let result = Config::load();
        clear_quiz_env();

        let err = result.unwrap_err();
        assert!(err.to_string().contains(key), "{} not named in '{}'", key, err);
    }
}

#[test]
#[serial]
fn test_question_bank_path_loads_file() {
    clear_quiz_env();
    let path = std::env::temp_dir().join(format!("quiz-bank-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"{
            "title": "Networking Basics",
            "questions": [
                {"type": "true-false", "question": "UDP is connectionless.", "answer": true}
            ]
        }"#,
    )
    .unwrap();
    std::env::set_var("QUIZ_QUESTION_BANK", path.to_string_lossy().to_string());

    let config = Config::load().unwrap();
    clear_quiz_env();

    let bank = QuestionBank::load_or_builtin(config.question_bank_path.as_deref()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(bank.title(), "Networking Basics");
    assert_eq!(bank.len(), 1);
}

#[test]
fn test_missing_bank_file_is_reported() {
    let result = QuestionBank::load("/definitely/not/here/questions.json");
    assert!(matches!(
        result,
        Err(quiz_core::QuizError::QuestionBank(_))
    ));
}
