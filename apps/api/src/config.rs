use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Speech-to-text key. Without it every transcription degrades to silence.
    pub groq_api_key: Option<String>,
    /// Text-to-speech key. Without it every synthesis degrades to "no audio".
    pub google_tts_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub provider_timeout: Duration,
    pub silence_threshold_bytes: usize,
    pub primary_locale: String,
    pub fallback_locale: String,
    pub generate_stories: bool,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            groq_api_key: optional_env("GROQ_API_KEY"),
            google_tts_api_key: optional_env("GOOGLE_TTS_API_KEY"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider_timeout: Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", 30)?),
            silence_threshold_bytes: parse_env("SILENCE_THRESHOLD_BYTES", 5_000)?,
            primary_locale: std::env::var("PRIMARY_LOCALE").unwrap_or_else(|_| "en-ZA".to_string()),
            fallback_locale: std::env::var("FALLBACK_LOCALE")
                .unwrap_or_else(|_| "en-US".to_string()),
            generate_stories: parse_env("GENERATE_STORIES", true)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its keys; tests run in parallel against one process env.

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        std::env::remove_var("INTERVIEW_TEST_UNSET_PORT");
        let port: u16 = parse_env("INTERVIEW_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_env_trims_valid_values() {
        std::env::set_var("INTERVIEW_TEST_TRIMMED_SECS", "  45 ");
        std::env::set_var("INTERVIEW_TEST_TRIMMED_FLAG", "false");
        let secs: u64 = parse_env("INTERVIEW_TEST_TRIMMED_SECS", 30).unwrap();
        let flag: bool = parse_env("INTERVIEW_TEST_TRIMMED_FLAG", true).unwrap();
        assert_eq!(secs, 45);
        assert!(!flag);
    }

    #[test]
    fn test_parse_env_rejects_malformed_values_naming_the_key() {
        std::env::set_var("INTERVIEW_TEST_BAD_BYTES", "abc");
        std::env::set_var("INTERVIEW_TEST_BAD_FLAG", "maybe");

        let err = parse_env::<usize>("INTERVIEW_TEST_BAD_BYTES", 5_000).unwrap_err();
        assert!(err.to_string().contains("INTERVIEW_TEST_BAD_BYTES"));
        assert!(err.to_string().contains("abc"));

        let err = parse_env::<bool>("INTERVIEW_TEST_BAD_FLAG", true).unwrap_err();
        assert!(err.to_string().contains("INTERVIEW_TEST_BAD_FLAG"));
    }

    #[test]
    fn test_blank_optional_env_is_none() {
        std::env::set_var("INTERVIEW_TEST_BLANK_KEY", "   ");
        assert!(optional_env("INTERVIEW_TEST_BLANK_KEY").is_none());
        std::env::set_var("INTERVIEW_TEST_SET_KEY", "gsk_123");
        assert_eq!(
            optional_env("INTERVIEW_TEST_SET_KEY").as_deref(),
            Some("gsk_123")
        );
    }

    #[test]
    fn test_require_env_reports_missing_key() {
        std::env::remove_var("INTERVIEW_TEST_REQUIRED_KEY");
        let err = require_env("INTERVIEW_TEST_REQUIRED_KEY").unwrap_err();
        assert!(err.to_string().contains("INTERVIEW_TEST_REQUIRED_KEY"));
    }
}
