//! Session Orchestrator — owns question navigation and composes the store,
//! the content generator, the answer pipeline, and the report aggregator.
//!
//! State machine: `Created → InProgress → Completed`.
//! - `set_question` (random access) and `advance_question` (sequential) share one pointer.
//! - Only `advance_question` past the last index completes a session.
//! - `set_question` from `Completed` reopens the session.
//!
//! Only `NotFound` and `InvalidArgument` escape. Provider failures become
//! degraded defaults listed in each response's `degraded` field.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::interview::models::{
    base64_audio, QnaRecord, Session, SessionId, SessionPhase, StoryIdea, COMPLETION_MESSAGE,
};
use crate::interview::outcome::{Degradation, Outcome, Stage};
use crate::interview::pipeline::{AnswerPipeline, AnswerResult};
use crate::interview::report::{ReportAggregator, ReportOutcome};
use crate::interview::store::{SessionGuard, SessionStore};
use crate::interview::voice::Voice;
use crate::providers::content::FALLBACK_QUESTIONS;
use crate::providers::{with_timeout, ContentGenerator, ProviderError, SpeechServices};

/// Substituted when the candidate supplies no CV at all.
pub const MISSING_CV_PLACEHOLDER: &str = "No CV content provided.";

/// Tunables shared by the orchestrator and its collaborators.
#[derive(Debug, Clone)]
pub struct InterviewSettings {
    pub provider_timeout: Duration,
    pub silence_threshold_bytes: usize,
    pub primary_locale: String,
    pub fallback_locale: String,
    pub generate_stories: bool,
}

impl InterviewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider_timeout: config.provider_timeout,
            silence_threshold_bytes: config.silence_threshold_bytes,
            primary_locale: config.primary_locale.clone(),
            fallback_locale: config.fallback_locale.clone(),
            generate_stories: config.generate_stories,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Responses
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<Vec<StoryIdea>>,
    pub current_index: usize,
    #[serde(rename = "intro_audio_base64", serialize_with = "base64_audio")]
    pub intro_audio: Option<Vec<u8>>,
    pub degraded: Vec<Degradation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionSelected {
    pub index: usize,
    pub question: String,
    #[serde(rename = "audio_base64", serialize_with = "base64_audio")]
    pub audio: Option<Vec<u8>>,
    pub degraded: Vec<Degradation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionAdvanced {
    pub is_finished: bool,
    pub next_question: String,
    #[serde(rename = "audio_base64", serialize_with = "base64_audio")]
    pub audio: Option<Vec<u8>>,
    pub progress: String,
    pub degraded: Vec<Degradation>,
}

/// Read-only snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<Vec<StoryIdea>>,
    pub current_index: usize,
    pub phase: SessionPhase,
    pub progress: String,
    pub answered: Vec<usize>,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct SessionOrchestrator {
    store: Arc<dyn SessionStore>,
    content: Arc<dyn ContentGenerator>,
    voice: Voice,
    pipeline: AnswerPipeline,
    reports: ReportAggregator,
    settings: InterviewSettings,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        content: Arc<dyn ContentGenerator>,
        speech: Arc<dyn SpeechServices>,
        settings: InterviewSettings,
    ) -> Self {
        let voice = Voice::new(
            Arc::clone(&speech),
            settings.provider_timeout,
            settings.primary_locale.clone(),
            settings.fallback_locale.clone(),
        );
        let pipeline = AnswerPipeline::new(
            Arc::clone(&content),
            speech,
            voice.clone(),
            settings.provider_timeout,
            settings.silence_threshold_bytes,
        );
        let reports = ReportAggregator::new(Arc::clone(&content), settings.provider_timeout);
        Self {
            store,
            content,
            voice,
            pipeline,
            reports,
            settings,
        }
    }

    /// Creates a session: questions (+ optional STAR stories) and a spoken intro.
    pub async fn create_session(
        &self,
        cv_text: Option<&str>,
        job_description: &str,
    ) -> Result<SessionCreated, AppError> {
        let job_description = job_description.trim();
        if job_description.is_empty() {
            return Err(AppError::InvalidArgument(
                "job_description cannot be empty".to_string(),
            ));
        }
        let cv_text = cv_text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(MISSING_CV_PLACEHOLDER);

        let mut degraded = Vec::new();

        let (questions, stories) = tokio::join!(
            self.generate_questions(cv_text, job_description),
            self.generate_stories(cv_text, job_description),
        );
        let questions = questions.collect_into(&mut degraded);
        let stories = stories.map(|s| s.collect_into(&mut degraded));

        let intro = format!(
            "Hi, I'm your interview coach. I've prepared {} questions for you. Let's begin with: {}",
            questions.len(),
            questions.first().map(String::as_str).unwrap_or_default()
        );
        let intro_audio = self
            .voice
            .speak(Stage::IntroSpeech, &intro)
            .await
            .collect_into(&mut degraded);

        let session = Session::new(questions.clone(), stories.clone());
        let session_id = session.id;
        self.store.insert(session).await;
        info!(
            "Session {session_id} created with {} questions ({} degraded stages)",
            questions.len(),
            degraded.len()
        );

        Ok(SessionCreated {
            session_id,
            questions,
            stories,
            current_index: 0,
            intro_audio,
            degraded,
        })
    }

    /// Random-access navigation. The pointer is untouched when `index` is invalid.
    pub async fn set_question(
        &self,
        session_id: SessionId,
        index: i64,
    ) -> Result<QuestionSelected, AppError> {
        let mut session = self.checkout(session_id).await?;
        let total = session.questions().len();
        let question = usize::try_from(index)
            .ok()
            .and_then(|i| session.jump_to(i).map(str::to_string))
            .ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "index {index} is outside 0..{total} for session {session_id}"
                ))
            })?;
        let index = session.pointer();
        drop(session);

        let mut degraded = Vec::new();
        let audio = self
            .voice
            .speak(Stage::QuestionSpeech, &question)
            .await
            .collect_into(&mut degraded);

        Ok(QuestionSelected {
            index,
            question,
            audio,
            degraded,
        })
    }

    /// Sequential navigation. Once past the last question, every call reports completion.
    pub async fn advance_question(
        &self,
        session_id: SessionId,
    ) -> Result<QuestionAdvanced, AppError> {
        let mut session = self.checkout(session_id).await?;
        let was_completed = session.phase() == SessionPhase::Completed;
        let next = session.advance().map(str::to_string);
        let progress = session.progress_label();
        drop(session);

        let Some(next_question) = next else {
            if !was_completed {
                info!("Session {session_id} completed");
            }
            return Ok(QuestionAdvanced {
                is_finished: true,
                next_question: COMPLETION_MESSAGE.to_string(),
                audio: None,
                progress,
                degraded: Vec::new(),
            });
        };

        let mut degraded = Vec::new();
        let audio = self
            .voice
            .speak(Stage::QuestionSpeech, &next_question)
            .await
            .collect_into(&mut degraded);

        Ok(QuestionAdvanced {
            is_finished: false,
            next_question,
            audio,
            progress,
            degraded,
        })
    }

    /// Runs the answer pipeline against the active question and records heard answers.
    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        audio: Bytes,
    ) -> Result<AnswerResult, AppError> {
        let (index, question) = {
            let mut session = self.checkout(session_id).await?;
            let index = session.pointer();
            let question = session
                .current_question()
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::InvalidArgument(
                        "the interview is complete; select a question before answering"
                            .to_string(),
                    )
                })?;
            session.mark_started();
            (index, question)
        };

        let result = self.pipeline.run(audio, &question).await;

        if result.heard {
            match self.store.checkout(session_id).await {
                Some(mut session) => session.record_answer(
                    index,
                    QnaRecord {
                        question,
                        answer: result.transcript.clone(),
                        analysis: result.analysis.clone(),
                    },
                ),
                None => warn!("Session {session_id} disappeared before its answer was recorded"),
            }
        }

        Ok(result)
    }

    pub async fn generate_report(&self, session_id: SessionId) -> Result<ReportOutcome, AppError> {
        let session = self.snapshot(session_id).await?;
        let history = session.ordered_history();
        Ok(self.reports.aggregate(&history).await)
    }

    pub async fn session_view(&self, session_id: SessionId) -> Result<SessionView, AppError> {
        let session = self.snapshot(session_id).await?;
        Ok(SessionView {
            session_id,
            questions: session.questions().to_vec(),
            stories: session.stories().map(<[StoryIdea]>::to_vec),
            current_index: session.pointer(),
            phase: session.phase(),
            progress: session.progress_label(),
            answered: session.answered_indices(),
            created_at: session.created_at,
        })
    }

    /// Fails with `NotFound` unless the session exists.
    pub async fn require_session(&self, session_id: SessionId) -> Result<(), AppError> {
        self.snapshot(session_id).await.map(|_| ())
    }

    async fn checkout(&self, session_id: SessionId) -> Result<SessionGuard, AppError> {
        self.store
            .checkout(session_id)
            .await
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn snapshot(&self, session_id: SessionId) -> Result<Session, AppError> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn generate_questions(&self, cv_text: &str, job_description: &str) -> Outcome<Vec<String>> {
        let result = with_timeout(
            self.settings.provider_timeout,
            self.content.generate_questions(cv_text, job_description),
        )
        .await
        .and_then(|questions| {
            let questions: Vec<String> = questions
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect();
            if questions.is_empty() {
                Err(ProviderError::Empty)
            } else {
                Ok(questions)
            }
        });
        Outcome::from_result(Stage::Questions, result, || {
            FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
        })
    }

    async fn generate_stories(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Option<Outcome<Vec<StoryIdea>>> {
        if !self.settings.generate_stories {
            return None;
        }
        let result = with_timeout(
            self.settings.provider_timeout,
            self.content.generate_stories(cv_text, job_description),
        )
        .await;
        Some(Outcome::from_result(Stage::Stories, result, Vec::new))
    }
}

fn session_not_found(session_id: SessionId) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}
