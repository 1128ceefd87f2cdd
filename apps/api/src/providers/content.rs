//! Content generation — questions, STAR stories, answer critiques, and report summaries.
//!
//! `ContentGenerator` is the seam the interview core depends on.
//! Default backend: `LlmContentGenerator` (Claude via `LlmClient`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::interview::models::{Analysis, QnaRecord, StoryIdea};
use crate::llm_client::prompts::{COACH_PERSONA, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;
use crate::providers::prompts::{
    ANALYSIS_PROMPT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE, REPORT_PROMPT_TEMPLATE,
    STORIES_PROMPT_TEMPLATE,
};
use crate::providers::{truncate_chars, ProviderError};

/// Max characters of CV / job description forwarded to the model.
const MAX_PROMPT_INPUT_CHARS: usize = 3_000;
/// CVs shorter than this are treated as missing when writing questions.
const MIN_USEFUL_CV_CHARS: usize = 50;
const THIN_CV_PLACEHOLDER: &str = "Candidate did not provide a detailed CV.";

/// Deterministic question list used whenever question generation fails.
pub const FALLBACK_QUESTIONS: [&str; 5] = [
    "Tell me about yourself.",
    "What are your strengths?",
    "Describe a challenge you faced.",
    "Why do you want this job?",
    "Where do you see yourself in 5 years?",
];

/// Report exactly as the provider returned it. Scores stay untyped so the
/// report aggregator can clamp or default them instead of rejecting the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReport {
    #[serde(default)]
    pub overall_score: Value,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub metrics: RawMetrics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetrics {
    #[serde(default)]
    pub clarity: Value,
    #[serde(default)]
    pub relevance: Value,
    #[serde(default)]
    pub confidence: Value,
}

/// The content generator trait. Implement this to swap backends without
/// touching the orchestrator, pipeline, or report aggregator.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_questions(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<Vec<String>, ProviderError>;

    async fn generate_stories(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<Vec<StoryIdea>, ProviderError>;

    async fn analyze(&self, question: &str, answer: &str) -> Result<Analysis, ProviderError>;

    async fn summarize(&self, history: &[QnaRecord]) -> Result<RawReport, ProviderError>;
}

/// Claude-backed content generator.
pub struct LlmContentGenerator {
    llm: LlmClient,
    system: String,
}

impl LlmContentGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            system: format!("{COACH_PERSONA} {JSON_ONLY_SYSTEM}"),
        }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate_questions(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let cv_text = if cv_text.trim().chars().count() < MIN_USEFUL_CV_CHARS {
            THIN_CV_PLACEHOLDER
        } else {
            cv_text
        };
        let prompt = fill_cv_template(QUESTIONS_PROMPT_TEMPLATE, cv_text, job_description);
        Ok(self.llm.call_json::<Vec<String>>(&prompt, &self.system).await?)
    }

    async fn generate_stories(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<Vec<StoryIdea>, ProviderError> {
        let prompt = fill_cv_template(STORIES_PROMPT_TEMPLATE, cv_text, job_description);
        Ok(self.llm.call_json::<Vec<StoryIdea>>(&prompt, &self.system).await?)
    }

    async fn analyze(&self, question: &str, answer: &str) -> Result<Analysis, ProviderError> {
        let prompt = ANALYSIS_PROMPT_TEMPLATE
            .replace("{question}", question)
            .replace("{answer}", truncate_chars(answer, MAX_PROMPT_INPUT_CHARS));
        Ok(self.llm.call_json::<Analysis>(&prompt, &self.system).await?)
    }

    async fn summarize(&self, history: &[QnaRecord]) -> Result<RawReport, ProviderError> {
        let session_data =
            serde_json::to_string(history).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let prompt = REPORT_PROMPT_TEMPLATE.replace("{session_data}", &session_data);
        Ok(self.llm.call_json::<RawReport>(&prompt, &self.system).await?)
    }
}

fn fill_cv_template(template: &str, cv_text: &str, job_description: &str) -> String {
    template
        .replace("{cv_text}", truncate_chars(cv_text, MAX_PROMPT_INPUT_CHARS))
        .replace(
            "{job_description}",
            truncate_chars(job_description, MAX_PROMPT_INPUT_CHARS),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_cv_template_truncates_long_inputs() {
        let long_cv = "a".repeat(5_000);
        let prompt = fill_cv_template("{cv_text}|{job_description}", &long_cv, "Backend role");
        let (cv_part, jd_part) = prompt.split_once('|').unwrap();
        assert_eq!(cv_part.len(), MAX_PROMPT_INPUT_CHARS);
        assert_eq!(jd_part, "Backend role");
    }

    #[test]
    fn test_raw_report_tolerates_missing_and_non_numeric_fields() {
        let raw: RawReport = serde_json::from_str(
            r#"{"overall_score": "high", "summary": "Solid", "metrics": {"clarity": 15}}"#,
        )
        .unwrap();
        assert!(raw.overall_score.is_string());
        assert_eq!(raw.metrics.clarity, Value::from(15));
        assert!(raw.metrics.relevance.is_null());
        assert!(raw.strengths.is_empty());
    }

    #[test]
    fn test_raw_report_rejects_non_object_payload() {
        assert!(serde_json::from_str::<RawReport>(r#"["not", "a", "report"]"#).is_err());
    }

    #[test]
    fn test_analysis_requires_all_fields() {
        let partial = r#"{"feedback_text": "Nice"}"#;
        assert!(serde_json::from_str::<Analysis>(partial).is_err());
    }

    #[test]
    fn test_story_idea_deserializes() {
        let story: StoryIdea = serde_json::from_str(
            r#"{
                "title": "Migrating the billing service",
                "situation": "Legacy monolith with weekly outages",
                "task": "Split billing out safely",
                "action": "Designed a strangler-fig migration",
                "result": "Zero-downtime cutover"
            }"#,
        )
        .unwrap();
        assert_eq!(story.title, "Migrating the billing service");
    }

    #[test]
    fn test_fallback_questions_are_nonempty() {
        assert!(FALLBACK_QUESTIONS.iter().all(|q| !q.trim().is_empty()));
    }
}
