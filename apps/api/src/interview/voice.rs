use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::interview::outcome::{Degradation, Outcome, Stage};
use crate::providers::{with_timeout, SpeechServices};

/// Speech synthesis with a deadline per call and one retry in a fallback locale.
#[derive(Clone)]
pub struct Voice {
    speech: Arc<dyn SpeechServices>,
    timeout: Duration,
    primary_locale: String,
    fallback_locale: String,
}

impl Voice {
    pub fn new(
        speech: Arc<dyn SpeechServices>,
        timeout: Duration,
        primary_locale: String,
        fallback_locale: String,
    ) -> Self {
        Self {
            speech,
            timeout,
            primary_locale,
            fallback_locale,
        }
    }

    /// Returns `None` audio (tagged as degraded) when both locales fail.
    pub async fn speak(&self, stage: Stage, text: &str) -> Outcome<Option<Vec<u8>>> {
        let primary = with_timeout(
            self.timeout,
            self.speech.synthesize(text, &self.primary_locale),
        )
        .await;
        let primary_error = match primary {
            Ok(audio) => return Outcome::Fresh(Some(audio)),
            Err(e) => e,
        };

        warn!(
            "Synthesis in {} failed ({primary_error}), retrying in {}",
            self.primary_locale, self.fallback_locale
        );
        match with_timeout(
            self.timeout,
            self.speech.synthesize(text, &self.fallback_locale),
        )
        .await
        {
            Ok(audio) => Outcome::Fresh(Some(audio)),
            Err(e) => Outcome::Fallback {
                value: None,
                degradation: Degradation::from_error(stage, &e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::interview::outcome::DegradeReason;
    use crate::interview::testing::{FakeSpeech, Script};

    fn voice(speech: Arc<FakeSpeech>) -> Voice {
        Voice::new(
            speech,
            Duration::from_secs(2),
            "en-ZA".to_string(),
            "en-US".to_string(),
        )
    }

    #[tokio::test]
    async fn test_primary_locale_success_skips_fallback() {
        let speech = Arc::new(FakeSpeech::default());
        let outcome = voice(Arc::clone(&speech))
            .speak(Stage::QuestionSpeech, "Hello")
            .await;
        assert!(!outcome.is_fallback());
        assert!(outcome.value().is_some());
        assert_eq!(speech.locales(), vec!["en-ZA"]);
    }

    #[tokio::test]
    async fn test_fallback_locale_used_when_primary_fails() {
        let speech = Arc::new(FakeSpeech {
            primary_audio: Script::Fail,
            ..FakeSpeech::default()
        });
        let outcome = voice(Arc::clone(&speech))
            .speak(Stage::QuestionSpeech, "Hello")
            .await;
        assert!(outcome.value().is_some());
        assert_eq!(speech.locales(), vec!["en-ZA", "en-US"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_locales_failing_yields_no_audio() {
        let speech = Arc::new(FakeSpeech {
            primary_audio: Script::Hang,
            fallback_audio: Script::Fail,
            ..FakeSpeech::default()
        });
        let outcome = voice(Arc::clone(&speech))
            .speak(Stage::FeedbackSpeech, "Hello")
            .await;
        assert_eq!(speech.synthesize_calls.load(Ordering::SeqCst), 2);
        match outcome {
            Outcome::Fallback { value, degradation } => {
                assert!(value.is_none());
                assert_eq!(degradation.stage, Stage::FeedbackSpeech);
                assert_eq!(degradation.reason, DegradeReason::ProviderError);
            }
            Outcome::Fresh(_) => panic!("expected degraded synthesis"),
        }
    }
}
