use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_core::{
    config::Config,
    metrics::render_metrics,
    models::{AnswerInput, Question, QuizSnapshot, QuizState, TimerEvent},
    services::{Navigation, QuestionBank, QuizService},
    utils::time::format_clock,
    QuizError,
};

const HELP: &str = "\
Commands:
  start              begin a new attempt
  show               print the current question
  next | prev        move between questions (next on the last question finishes)
  goto <n>           jump to question n
  answer <value>     option number, true/false, or free text
  finish             end the attempt
  review             list every question with your answer
  restart            back to the welcome screen
  status             print the current snapshot
  metrics            print Prometheus metrics
  quit               exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "quiz_core=info".into()),
    );
    if json_logs_requested(std::env::var("QUIZ_LOG_FORMAT").ok().as_deref()) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let bank = QuestionBank::load_or_builtin(config.question_bank_path.as_deref())
        .context("Failed to load question bank")?;
    let service = QuizService::from_config(&config, bank.questions())?;

    println!("{}", bank.title());
    println!(
        "{} questions, {} on the clock. Type 'start' to begin or 'help' for commands.",
        bank.len(),
        format_clock(u64::from(config.duration_seconds))
    );

    let mut timer_events = service.subscribe_timer();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !handle_command(&service, line.trim()).await? {
                    break;
                }
            }
            event = timer_events.recv() => match event {
                Ok(event) => render_timer_event(&service, &event).await?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Renderer skipped {} timer events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    service.restart().await;
    Ok(())
}

fn json_logs_requested(format: Option<&str>) -> bool {
    format.is_some_and(|value| value.trim().eq_ignore_ascii_case("json"))
}

/// Returns `false` when the user asked to quit.
async fn handle_command(service: &QuizService, line: &str) -> anyhow::Result<bool> {
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    let outcome: Result<(), QuizError> = match command.to_lowercase().as_str() {
        "" => Ok(()),
        "help" => {
            println!("{}", HELP);
            Ok(())
        }
        "quit" | "exit" => return Ok(false),
        "start" => {
            service.start().await;
            render_question(service).await;
            Ok(())
        }
        "show" => {
            render_question(service).await;
            Ok(())
        }
        "status" => {
            render_snapshot(&service.snapshot().await);
            Ok(())
        }
        "next" => match service.next().await {
            Ok(Navigation::Moved(_)) => {
                render_question(service).await;
                Ok(())
            }
            Ok(Navigation::Finished) => render_summary(service).await,
            Err(err) => Err(err),
        },
        "prev" => match service.previous().await {
            Ok(_) => {
                render_question(service).await;
                Ok(())
            }
            Err(err) => Err(err),
        },
        "goto" => match argument.parse::<usize>() {
            Ok(number) if number >= 1 => match service.go_to(number - 1).await {
                Ok(_) => {
                    render_question(service).await;
                    Ok(())
                }
                Err(err) => Err(err),
            },
            _ => Err(QuizError::InvalidInput(format!(
                "'{}' is not a question number",
                argument
            ))),
        },
        "answer" => submit(service, argument).await,
        "finish" => match service.finish().await {
            Ok(_) => render_summary(service).await,
            Err(err) => Err(err),
        },
        "review" => render_review(service).await,
        "restart" => {
            service.restart().await;
            println!("Back at the start. Type 'start' to try again.");
            Ok(())
        }
        "metrics" => {
            match render_metrics() {
                Ok(text) => println!("{}", text),
                Err(err) => tracing::warn!(error = %err, "Failed to render metrics"),
            }
            Ok(())
        }
        other => {
            println!("Unknown command '{}'. Type 'help' for commands.", other);
            Ok(())
        }
    };

    if let Err(err) = outcome {
        println!("! {}", err);
    }
    Ok(true)
}

async fn submit(service: &QuizService, argument: &str) -> Result<(), QuizError> {
    let snapshot = service.snapshot().await;
    if snapshot.state != QuizState::InProgress {
        return Err(QuizError::InvalidStateTransition {
            operation: "submit_answer",
            state: snapshot.state,
        });
    }

    let index = snapshot.current_index;
    let question = service
        .question(index)
        .ok_or(QuizError::OutOfRangeIndex {
            index,
            count: snapshot.question_count,
        })?;
    let input = parse_answer(question, argument)?;
    let response = service.submit_answer(index, &input).await?;
    println!(
        "Answer saved for question {} (score {}/{}).",
        index + 1,
        response.total_score,
        snapshot.question_count
    );
    Ok(())
}

fn parse_answer(question: &Question, raw: &str) -> Result<AnswerInput, QuizError> {
    match question {
        Question::MultipleChoice { answers, .. } => match raw.trim().parse::<usize>() {
            Ok(number) if (1..=answers.len()).contains(&number) => {
                Ok(AnswerInput::Choice(number - 1))
            }
            _ => Err(QuizError::InvalidInput(format!(
                "choose an option between 1 and {}",
                answers.len()
            ))),
        },
        Question::TrueFalse { .. } => match raw.trim().to_lowercase().as_str() {
            "true" | "t" => Ok(AnswerInput::Boolean(true)),
            "false" | "f" => Ok(AnswerInput::Boolean(false)),
            _ => Err(QuizError::InvalidInput(
                "answer 'true' or 'false'".to_string(),
            )),
        },
        Question::FreeText { .. } => Ok(AnswerInput::Text(raw.to_string())),
    }
}

async fn render_question(service: &QuizService) {
    let snapshot = service.snapshot().await;
    if snapshot.state != QuizState::InProgress {
        render_snapshot(&snapshot);
        return;
    }
    let Some(question) = service.question(snapshot.current_index) else {
        return;
    };

    println!();
    println!(
        "Question {}/{}  [{}]",
        snapshot.current_index + 1,
        snapshot.question_count,
        format_clock(u64::from(snapshot.time_remaining))
    );
    println!("{}", question.prompt());
    match question {
        Question::MultipleChoice { answers, .. } => {
            for (number, option) in answers.iter().enumerate() {
                println!("  {}. {}", number + 1, option.text);
            }
        }
        Question::TrueFalse { .. } => println!("  true / false"),
        Question::FreeText { .. } => println!("  (type your answer)"),
    }
    if let Some(answer) = &snapshot.current_answer {
        println!("  Your answer: {}", answer.user_answer);
    }
}

fn render_snapshot(snapshot: &QuizSnapshot) {
    match snapshot.state {
        QuizState::NotStarted => println!("Quiz not started."),
        QuizState::InProgress => println!(
            "Question {}/{}, {} answered, {} left{}",
            snapshot.current_index + 1,
            snapshot.question_count,
            snapshot.answered_count,
            format_clock(u64::from(snapshot.time_remaining)),
            if snapshot.time_low { " (hurry!)" } else { "" }
        ),
        QuizState::Finished => println!(
            "Quiz finished: {}/{} correct.",
            snapshot.score, snapshot.question_count
        ),
    }
}

async fn render_summary(service: &QuizService) -> Result<(), QuizError> {
    let summary = service.summary().await?;
    println!();
    println!("Score: {}/{}", summary.score, summary.question_count);
    println!("Time taken: {}", summary.elapsed_display);
    println!("{}", summary.message);
    println!("Type 'review' to see your answers or 'restart' to go again.");
    Ok(())
}

async fn render_review(service: &QuizService) -> Result<(), QuizError> {
    let review = service.build_review().await?;
    println!();
    println!("{} questions answered", review.answered_count);
    for entry in &review.entries {
        let mark = if entry.correct {
            "correct"
        } else if entry.user_answer.is_answered() {
            "wrong"
        } else {
            "skipped"
        };
        println!("{}. {} ({})", entry.number, entry.question, entry.kind);
        println!("   Your answer: {} [{}]", entry.user_answer, mark);
        println!("   Correct answer: {}", entry.correct_answer);
        if let Some(explanation) = &entry.explanation {
            println!("   Note: {}", explanation);
        }
    }
    Ok(())
}

async fn render_timer_event(service: &QuizService, event: &TimerEvent) -> anyhow::Result<()> {
    match event {
        TimerEvent::TimerTick(tick) => {
            if tick.time_low && tick.remaining_seconds % 15 == 0 {
                println!(
                    "[{}] {} remaining",
                    event.event_name(),
                    format_clock(u64::from(tick.remaining_seconds))
                );
            }
        }
        TimerEvent::TimeExpired(expired) => {
            println!("[{}] {}", event.event_name(), expired.message);
            if let Err(err) = render_summary(service).await {
                tracing::warn!(error = %err, "Failed to render summary after expiry");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::models::ChoiceOption;

    #[test]
    fn test_parse_answer_maps_option_numbers() {
        let question = Question::multiple_choice(
            "Pick",
            vec![ChoiceOption::new("a", false), ChoiceOption::new("b", true)],
        );
        assert_eq!(
            parse_answer(&question, "2").unwrap(),
            AnswerInput::Choice(1)
        );
        assert!(parse_answer(&question, "0").is_err());
        assert!(parse_answer(&question, "3").is_err());
    }

    #[test]
    fn test_json_logs_only_for_json_format() {
        assert!(json_logs_requested(Some("json")));
        assert!(json_logs_requested(Some(" JSON ")));
        assert!(!json_logs_requested(Some("pretty")));
        assert!(!json_logs_requested(None));
    }

    #[test]
    fn test_parse_answer_true_false_words() {
        let question = Question::true_false("Q?", true, None);
        assert_eq!(
            parse_answer(&question, " T ").unwrap(),
            AnswerInput::Boolean(true)
        );
        assert_eq!(
            parse_answer(&question, "false").unwrap(),
            AnswerInput::Boolean(false)
        );
        assert!(parse_answer(&question, "maybe").is_err());
    }
}
