//! Test doubles for the content and speech providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::interview::models::{Analysis, QnaRecord, StoryIdea};
use crate::interview::orchestrator::{InterviewSettings, SessionOrchestrator};
use crate::interview::pipeline::AnswerPipeline;
use crate::interview::store::InMemorySessionStore;
use crate::interview::voice::Voice;
use crate::providers::{ContentGenerator, ProviderError, RawMetrics, RawReport, SpeechServices};

/// What a fake provider call does.
#[derive(Debug, Clone)]
pub enum Script<T> {
    Reply(T),
    /// A transient provider failure (503).
    Fail,
    /// A reply that cannot be used; retrying will not help.
    Garbled,
    /// Never completes; only the caller's timeout ends it.
    Hang,
}

impl<T: Clone> Script<T> {
    async fn play(&self) -> Result<T, ProviderError> {
        match self {
            Script::Reply(value) => Ok(value.clone()),
            Script::Fail => Err(ProviderError::Status {
                status: 503,
                message: "provider unavailable".to_string(),
            }),
            Script::Garbled => Err(ProviderError::Parse("unexpected payload".to_string())),
            Script::Hang => std::future::pending().await,
        }
    }
}

pub struct FakeContent {
    pub questions: Script<Vec<String>>,
    pub stories: Script<Vec<StoryIdea>>,
    pub analysis: Script<Analysis>,
    pub report: Script<RawReport>,
    pub question_calls: AtomicUsize,
    pub story_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub summarize_calls: AtomicUsize,
}

impl FakeContent {
    pub fn questions() -> Vec<String> {
        vec![
            "Walk me through a backend service you designed.".to_string(),
            "How do you approach debugging a slow database query?".to_string(),
            "Tell me about a disagreement with a teammate.".to_string(),
        ]
    }

    pub fn analysis() -> Analysis {
        Analysis {
            feedback_text: "Good use of a concrete example.".to_string(),
            improvement_tip: "State the measurable result.".to_string(),
            better_answer_example: "I cut p99 latency from 800ms to 120ms by...".to_string(),
        }
    }

    pub fn story() -> StoryIdea {
        StoryIdea {
            title: "Scaling the order API".to_string(),
            situation: "Traffic tripled before a sale".to_string(),
            task: "Keep checkout under 200ms".to_string(),
            action: "Added caching and load tests".to_string(),
            result: "No downtime during the sale".to_string(),
        }
    }
}

impl Default for FakeContent {
    fn default() -> Self {
        Self {
            questions: Script::Reply(Self::questions()),
            stories: Script::Reply(vec![Self::story()]),
            analysis: Script::Reply(Self::analysis()),
            report: Script::Reply(RawReport {
                overall_score: json!(72),
                summary: Some("Clear communicator with solid technical depth.".to_string()),
                strengths: vec!["Concrete examples".to_string()],
                areas_for_improvement: vec!["Quantify outcomes".to_string()],
                metrics: RawMetrics {
                    clarity: json!(8),
                    relevance: json!(7),
                    confidence: json!(6),
                },
            }),
            question_calls: AtomicUsize::new(0),
            story_calls: AtomicUsize::new(0),
            analyze_calls: AtomicUsize::new(0),
            summarize_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentGenerator for FakeContent {
    async fn generate_questions(
        &self,
        _cv_text: &str,
        _job_description: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        self.questions.play().await
    }

    async fn generate_stories(
        &self,
        _cv_text: &str,
        _job_description: &str,
    ) -> Result<Vec<StoryIdea>, ProviderError> {
        self.story_calls.fetch_add(1, Ordering::SeqCst);
        self.stories.play().await
    }

    async fn analyze(&self, _question: &str, _answer: &str) -> Result<Analysis, ProviderError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.play().await
    }

    async fn summarize(&self, _history: &[QnaRecord]) -> Result<RawReport, ProviderError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        self.report.play().await
    }
}

pub struct FakeSpeech {
    pub transcript: Script<String>,
    /// Used for the `en-ZA` locale.
    pub primary_audio: Script<Vec<u8>>,
    /// Used for every other locale.
    pub fallback_audio: Script<Vec<u8>>,
    pub transcribe_calls: AtomicUsize,
    pub synthesize_calls: AtomicUsize,
    pub locales: Mutex<Vec<String>>,
}

impl FakeSpeech {
    pub const TRANSCRIPT: &'static str =
        "I led the migration of our payments service to Rust and cut incidents in half.";

    pub fn locales(&self) -> Vec<String> {
        self.locales.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Default for FakeSpeech {
    fn default() -> Self {
        Self {
            transcript: Script::Reply(Self::TRANSCRIPT.to_string()),
            primary_audio: Script::Reply(b"primary-mp3".to_vec()),
            fallback_audio: Script::Reply(b"fallback-mp3".to_vec()),
            transcribe_calls: AtomicUsize::new(0),
            synthesize_calls: AtomicUsize::new(0),
            locales: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechServices for FakeSpeech {
    async fn transcribe(&self, _audio: Bytes) -> Result<String, ProviderError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        self.transcript.play().await
    }

    async fn synthesize(&self, _text: &str, locale: &str) -> Result<Vec<u8>, ProviderError> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut locales) = self.locales.lock() {
            locales.push(locale.to_string());
        }
        if locale == "en-ZA" {
            self.primary_audio.play().await
        } else {
            self.fallback_audio.play().await
        }
    }
}

pub fn settings() -> InterviewSettings {
    InterviewSettings {
        provider_timeout: Duration::from_secs(2),
        silence_threshold_bytes: 5_000,
        primary_locale: "en-ZA".to_string(),
        fallback_locale: "en-US".to_string(),
        generate_stories: true,
    }
}

pub fn audio_of(len: usize) -> Bytes {
    Bytes::from(vec![7u8; len])
}

pub fn pipeline(content: &Arc<FakeContent>, speech: &Arc<FakeSpeech>) -> AnswerPipeline {
    let settings = settings();
    let voice = Voice::new(
        speech.clone(),
        settings.provider_timeout,
        settings.primary_locale,
        settings.fallback_locale,
    );
    AnswerPipeline::new(
        content.clone(),
        speech.clone(),
        voice,
        settings.provider_timeout,
        settings.silence_threshold_bytes,
    )
}

pub fn orchestrator(content: &Arc<FakeContent>, speech: &Arc<FakeSpeech>) -> SessionOrchestrator {
    SessionOrchestrator::new(
        Arc::new(InMemorySessionStore::new()),
        content.clone(),
        speech.clone(),
        settings(),
    )
}
