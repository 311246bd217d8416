use serde::Deserialize;
use std::env;
use validator::Validate;

pub const DEFAULT_DURATION_SECONDS: u32 = 15 * 60;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_TIME_LOW_SECONDS: u32 = 60;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    /// Countdown start value for every attempt.
    #[validate(range(
        min = 1,
        max = 86400,
        message = "Quiz duration must be between 1 and 86400 seconds"
    ))]
    pub duration_seconds: u32,

    #[validate(range(
        min = 10,
        max = 60000,
        message = "Tick interval must be between 10 and 60000 milliseconds"
    ))]
    pub tick_interval_ms: u64,

    pub time_low_threshold_seconds: u32,

    /// JSON question bank; the built-in bank is used when unset.
    pub question_bank_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_DURATION_SECONDS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            time_low_threshold_seconds: DEFAULT_TIME_LOW_SECONDS,
            question_bank_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let duration_seconds = settings
            .get_int("quiz.duration_seconds")
            .ok()
            .map_or_else(|| parse_env("QUIZ_DURATION_SECONDS"), |v| Ok(Some(v)))?
            .map(|v| to_u32("quiz.duration_seconds", v))
            .transpose()?
            .unwrap_or(DEFAULT_DURATION_SECONDS);

        let tick_interval_ms = settings
            .get_int("quiz.tick_interval_ms")
            .ok()
            .map_or_else(|| parse_env("QUIZ_TICK_INTERVAL_MS"), |v| Ok(Some(v)))?
            .map(|v| {
                u64::try_from(v).map_err(|_| {
                    config::ConfigError::Message(format!(
                        "quiz.tick_interval_ms must not be negative (got {})",
                        v
                    ))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_TICK_INTERVAL_MS);

        let time_low_threshold_seconds = settings
            .get_int("quiz.time_low_threshold_seconds")
            .ok()
            .map_or_else(|| parse_env("QUIZ_TIME_LOW_SECONDS"), |v| Ok(Some(v)))?
            .map(|v| to_u32("quiz.time_low_threshold_seconds", v))
            .transpose()?
            .unwrap_or(DEFAULT_TIME_LOW_SECONDS);

        let question_bank_path = settings
            .get_string("quiz.question_bank_path")
            .or_else(|_| env::var("QUIZ_QUESTION_BANK"))
            .ok()
            .filter(|path| !path.trim().is_empty());

        let config = Config {
            duration_seconds,
            tick_interval_ms,
            time_low_threshold_seconds,
            question_bank_path,
        };

        config
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(config)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

fn parse_env(key: &str) -> Result<Option<i64>, config::ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
            config::ConfigError::Message(format!("{} must be an integer (got {:?})", key, raw))
        }),
        Err(_) => Ok(None),
    }
}

fn to_u32(key: &str, value: i64) -> Result<u32, config::ConfigError> {
    u32::try_from(value).map_err(|_| {
        config::ConfigError::Message(format!("{} is out of range (got {})", key, value))
    })
}
