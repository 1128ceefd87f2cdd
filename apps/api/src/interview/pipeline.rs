//! Answer Pipeline — turns one recorded answer into a transcript, a critique,
//! and spoken feedback.
//!
//! Flow: silence guard → transcription → transcript guard → analysis → feedback speech.
//!
//! The pipeline never fails. Every stage either produces its real output or a
//! documented default tagged with a `Degradation`, and a failed stage never
//! prevents the later stages from producing a well-formed result.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::interview::models::{base64_audio, Analysis};
use crate::interview::outcome::{Degradation, Outcome, Stage};
use crate::interview::voice::Voice;
use crate::providers::{with_timeout, ContentGenerator, ProviderError, SpeechServices};

/// Transient transcription failures are retried at most once.
const TRANSCRIPTION_ATTEMPTS: u32 = 2;
/// Transcripts shorter than this are treated as silence.
const MIN_TRANSCRIPT_CHARS: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub transcript: String,
    pub analysis: Analysis,
    #[serde(rename = "feedback_audio_base64", serialize_with = "base64_audio")]
    pub feedback_audio: Option<Vec<u8>>,
    /// False when the recording was empty or inaudible. Unheard answers are not recorded.
    pub heard: bool,
    pub degraded: Vec<Degradation>,
}

impl AnswerResult {
    fn unheard(degraded: Vec<Degradation>) -> Self {
        Self {
            transcript: String::new(),
            analysis: Analysis::unheard(),
            feedback_audio: None,
            heard: false,
            degraded,
        }
    }
}

#[derive(Clone)]
pub struct AnswerPipeline {
    content: Arc<dyn ContentGenerator>,
    speech: Arc<dyn SpeechServices>,
    voice: Voice,
    timeout: Duration,
    silence_threshold_bytes: usize,
}

impl AnswerPipeline {
    pub fn new(
        content: Arc<dyn ContentGenerator>,
        speech: Arc<dyn SpeechServices>,
        voice: Voice,
        timeout: Duration,
        silence_threshold_bytes: usize,
    ) -> Self {
        Self {
            content,
            speech,
            voice,
            timeout,
            silence_threshold_bytes,
        }
    }

    pub async fn run(&self, audio: Bytes, question: &str) -> AnswerResult {
        // Stage 1: silence guard
        if audio.len() < self.silence_threshold_bytes {
            info!(
                "Answer payload of {} bytes is below the {} byte threshold; treating as silence",
                audio.len(),
                self.silence_threshold_bytes
            );
            return AnswerResult::unheard(Vec::new());
        }

        let mut degraded = Vec::new();

        // Stage 2: transcription
        let transcript = Outcome::from_result(
            Stage::Transcription,
            self.transcribe(audio).await,
            String::new,
        )
        .collect_into(&mut degraded);

        // Stage 3: transcript guard
        if transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
            debug!("Transcript too short to analyse: {transcript:?}");
            return AnswerResult::unheard(degraded);
        }

        // Stage 4: analysis
        let analysis = Outcome::from_result(
            Stage::Analysis,
            self.analyze(question, &transcript).await,
            Analysis::fallback,
        )
        .collect_into(&mut degraded);

        // Stage 5: feedback speech
        let feedback_audio = self
            .voice
            .speak(Stage::FeedbackSpeech, &analysis.spoken_feedback())
            .await
            .collect_into(&mut degraded);

        AnswerResult {
            transcript,
            analysis,
            feedback_audio,
            heard: true,
            degraded,
        }
    }

    async fn transcribe(&self, audio: Bytes) -> Result<String, ProviderError> {
        let mut attempt = 1;
        loop {
            // `Bytes` clones share the buffer; it is freed when the last handle drops.
            match with_timeout(self.timeout, self.speech.transcribe(audio.clone())).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < TRANSCRIPTION_ATTEMPTS => {
                    warn!("Transcription attempt {attempt} failed ({e}), retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn analyze(&self, question: &str, transcript: &str) -> Result<Analysis, ProviderError> {
        let analysis = with_timeout(self.timeout, self.content.analyze(question, transcript)).await?;
        if analysis.feedback_text.trim().is_empty() {
            return Err(ProviderError::Parse(
                "analysis is missing feedback_text".to_string(),
            ));
        }
        Ok(analysis)
    }
}
