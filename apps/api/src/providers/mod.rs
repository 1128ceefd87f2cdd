//! External collaborators: content generation (LLM) and speech (STT/TTS).
//!
//! The interview core only sees the `ContentGenerator` and `SpeechServices`
//! traits. Every call goes through `with_timeout` so a wedged provider can
//! never stall a session.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::llm_client::LlmError;

pub mod content;
pub mod prompts;
pub mod speech;

pub use content::{ContentGenerator, LlmContentGenerator, RawMetrics, RawReport};
pub use speech::{HttpSpeechServices, SpeechServices};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    Unconfigured(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unparseable provider output: {0}")]
    Parse(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("provider returned empty content")]
    Empty,
}

impl ProviderError {
    /// True when a second attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True when the provider answered but its payload could not be used.
    pub fn is_unparseable(&self) -> bool {
        matches!(
            self,
            ProviderError::Parse(_)
                | ProviderError::Empty
                | ProviderError::Llm(LlmError::Parse(_))
                | ProviderError::Llm(LlmError::EmptyContent)
        )
    }
}

/// Runs one provider call under a deadline.
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    }
}

/// Truncates prompt input on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
