//! Tagged results for provider-backed stages.
//!
//! A stage either produced its real output (`Fresh`) or fell back to a
//! documented default (`Fallback`). Fallbacks carry a `Degradation` so callers
//! and clients can see exactly what was degraded and why.

use serde::Serialize;
use tracing::warn;

use crate::providers::ProviderError;

/// The provider-backed step that degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Questions,
    Stories,
    IntroSpeech,
    QuestionSpeech,
    Transcription,
    Analysis,
    FeedbackSpeech,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    Timeout,
    ProviderError,
    Unparseable,
    OutOfRange,
    Unconfigured,
}

impl From<&ProviderError> for DegradeReason {
    fn from(error: &ProviderError) -> Self {
        match error {
            ProviderError::Timeout(_) => DegradeReason::Timeout,
            ProviderError::Unconfigured(_) => DegradeReason::Unconfigured,
            e if e.is_unparseable() => DegradeReason::Unparseable,
            _ => DegradeReason::ProviderError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub stage: Stage,
    pub reason: DegradeReason,
    pub detail: String,
}

impl Degradation {
    pub fn new(stage: Stage, reason: DegradeReason, detail: impl Into<String>) -> Self {
        let degradation = Self {
            stage,
            reason,
            detail: detail.into(),
        };
        warn!(
            stage = ?degradation.stage,
            reason = ?degradation.reason,
            "Provider degraded: {}",
            degradation.detail
        );
        degradation
    }

    pub fn from_error(stage: Stage, error: &ProviderError) -> Self {
        Self::new(stage, DegradeReason::from(error), error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fresh(T),
    Fallback { value: T, degradation: Degradation },
}

impl<T> Outcome<T> {
    /// Keeps `Ok` values, replacing errors with `fallback()` tagged for `stage`.
    pub fn from_result(
        stage: Stage,
        result: Result<T, ProviderError>,
        fallback: impl FnOnce() -> T,
    ) -> Self {
        match result {
            Ok(value) => Outcome::Fresh(value),
            Err(error) => Outcome::Fallback {
                value: fallback(),
                degradation: Degradation::from_error(stage, &error),
            },
        }
    }

    #[cfg(test)]
    pub fn value(&self) -> &T {
        match self {
            Outcome::Fresh(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    #[cfg(test)]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    /// Splits into the value and, if degraded, the reason, appending it to `sink`.
    pub fn collect_into(self, sink: &mut Vec<Degradation>) -> T {
        match self {
            Outcome::Fresh(value) => value,
            Outcome::Fallback { value, degradation } => {
                sink.push(degradation);
                value
            }
        }
    }
}
