//! Interview data model: sessions, answers, critiques, and the final report.

use std::collections::HashMap;

use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Message returned by `advance_question` once the last question has been passed.
pub const COMPLETION_MESSAGE: &str = "Interview Complete!";

/// Serializes optional audio bytes as a base64 string, or `null` when absent.
pub fn base64_audio<S: Serializer>(
    audio: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match audio {
        Some(bytes) => serializer.serialize_some(&general_purpose::STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Lifecycle of one interview attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Created,
    InProgress,
    Completed,
}

/// A Situation/Task/Action/Result story the candidate could tell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryIdea {
    pub title: String,
    pub situation: String,
    pub task: String,
    pub action: String,
    pub result: String,
}

/// Critique of one spoken answer. All three fields are always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub feedback_text: String,
    pub improvement_tip: String,
    pub better_answer_example: String,
}

impl Analysis {
    /// Canned response for empty or inaudible recordings.
    pub fn unheard() -> Self {
        Self {
            feedback_text: "I couldn't hear you clearly.".to_string(),
            improvement_tip:
                "Please hold the record button while you speak, and speak clearly into the mic."
                    .to_string(),
            better_answer_example: "N/A".to_string(),
        }
    }

    /// Generic encouragement used when the analysis provider is unavailable.
    pub fn fallback() -> Self {
        Self {
            feedback_text: "Good attempt.".to_string(),
            improvement_tip: "Be more specific.".to_string(),
            better_answer_example: "...".to_string(),
        }
    }

    /// Text spoken back to the candidate after an answer.
    pub fn spoken_feedback(&self) -> String {
        let tip = self.improvement_tip.trim();
        if tip.is_empty() {
            self.feedback_text.clone()
        } else {
            format!("{} Tip: {}", self.feedback_text.trim(), tip)
        }
    }
}

/// One answered question. The question text is copied so it survives pointer moves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QnaRecord {
    pub question: String,
    pub answer: String,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub clarity: u8,
    pub relevance: u8,
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub overall_score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub metrics: Metrics,
}

impl Report {
    /// Zero-valued sentinel returned when the summary provider fails.
    /// Metrics of 0 sit outside the valid 1–10 range, which is what marks it.
    pub fn unavailable() -> Self {
        Self {
            overall_score: 0,
            summary: "Could not generate report.".to_string(),
            strengths: Vec::new(),
            areas_for_improvement: Vec::new(),
            metrics: Metrics {
                clarity: 0,
                relevance: 0,
                confidence: 0,
            },
        }
    }
}

/// One interview attempt. Owned exclusively by the session store.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    questions: Vec<String>,
    stories: Option<Vec<StoryIdea>>,
    pointer: usize,
    phase: SessionPhase,
    history: HashMap<usize, QnaRecord>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// `questions` must be non-empty; callers substitute the fallback list first.
    pub fn new(questions: Vec<String>, stories: Option<Vec<StoryIdea>>) -> Self {
        debug_assert!(!questions.is_empty());
        Self {
            id: Uuid::new_v4(),
            questions,
            stories,
            pointer: 0,
            phase: SessionPhase::Created,
            history: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn stories(&self) -> Option<&[StoryIdea]> {
        self.stories.as_deref()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.pointer >= self.questions.len()
    }

    /// The active question, or `None` once sequential advance has run past the end.
    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.pointer).map(String::as_str)
    }

    /// Random-access navigation. Leaves the pointer untouched on a bad index.
    pub fn jump_to(&mut self, index: usize) -> Option<&str> {
        if index >= self.questions.len() {
            return None;
        }
        self.pointer = index;
        self.phase = SessionPhase::InProgress;
        self.questions.get(index).map(String::as_str)
    }

    /// Sequential navigation. The pointer is never clamped back into range.
    pub fn advance(&mut self) -> Option<&str> {
        self.pointer = self.pointer.saturating_add(1);
        if self.is_finished() {
            self.phase = SessionPhase::Completed;
            None
        } else {
            self.phase = SessionPhase::InProgress;
            self.questions.get(self.pointer).map(String::as_str)
        }
    }

    /// `"<position>/<total>"` with the position capped at the total for display.
    pub fn progress_label(&self) -> String {
        let total = self.questions.len();
        let position = self.pointer.saturating_add(1).min(total);
        format!("{position}/{total}")
    }

    /// Marks the session as started by an answer submission.
    pub fn mark_started(&mut self) {
        if self.phase == SessionPhase::Created {
            self.phase = SessionPhase::InProgress;
        }
    }

    /// Stores (or replaces) the answer for `index`.
    pub fn record_answer(&mut self, index: usize, record: QnaRecord) {
        if index < self.questions.len() {
            self.history.insert(index, record);
        }
    }

    pub fn answered_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.history.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// History ordered by question index.
    pub fn ordered_history(&self) -> Vec<QnaRecord> {
        self.answered_indices()
            .into_iter()
            .filter_map(|i| self.history.get(&i).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_question_session() -> Session {
        Session::new(
            vec![
                "Tell me about yourself.".to_string(),
                "Describe a production incident you handled.".to_string(),
                "Why this team?".to_string(),
            ],
            None,
        )
    }

    fn record(question: &str) -> QnaRecord {
        QnaRecord {
            question: question.to_string(),
            answer: "An answer".to_string(),
            analysis: Analysis::fallback(),
        }
    }

    #[test]
    fn test_new_session_starts_at_zero_in_created_phase() {
        let session = three_question_session();
        assert_eq!(session.pointer(), 0);
        assert_eq!(session.phase(), SessionPhase::Created);
        assert_eq!(session.current_question(), Some("Tell me about yourself."));
    }

    #[test]
    fn test_jump_out_of_range_leaves_pointer() {
        let mut session = three_question_session();
        session.jump_to(1);
        assert!(session.jump_to(3).is_none());
        assert_eq!(session.pointer(), 1);
    }

    #[test]
    fn test_advance_past_end_keeps_finished() {
        let mut session = three_question_session();
        assert!(session.advance().is_some());
        assert!(session.advance().is_some());
        assert!(session.advance().is_none());
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert!(session.advance().is_none());
        assert_eq!(session.pointer(), 4);
        assert!(session.is_finished());
    }

    #[test]
    fn test_progress_label_is_capped_for_display() {
        let mut session = three_question_session();
        assert_eq!(session.progress_label(), "1/3");
        for _ in 0..5 {
            session.advance();
        }
        assert_eq!(session.progress_label(), "3/3");
    }

    #[test]
    fn test_jump_reopens_completed_session() {
        let mut session = three_question_session();
        for _ in 0..3 {
            session.advance();
        }
        assert_eq!(session.phase(), SessionPhase::Completed);
        session.jump_to(0);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.pointer(), 0);
    }

    #[test]
    fn test_history_is_ordered_by_index_and_replaced_on_resubmit() {
        let mut session = three_question_session();
        session.record_answer(2, record("Why this team?"));
        session.record_answer(0, record("Tell me about yourself."));
        session.record_answer(2, record("Why this team? (again)"));

        let history = session.ordered_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "Tell me about yourself.");
        assert_eq!(history[1].question, "Why this team? (again)");
    }

    #[test]
    fn test_record_answer_ignores_invalid_index() {
        let mut session = three_question_session();
        session.record_answer(7, record("Ghost"));
        assert!(session.answered_indices().is_empty());
    }

    #[test]
    fn test_spoken_feedback_appends_tip() {
        let analysis = Analysis {
            feedback_text: "Clear structure.".to_string(),
            improvement_tip: "Quantify the outcome.".to_string(),
            better_answer_example: "...".to_string(),
        };
        assert_eq!(
            analysis.spoken_feedback(),
            "Clear structure. Tip: Quantify the outcome."
        );
    }

    #[test]
    fn test_audio_serializes_as_base64_or_null() {
        #[derive(Serialize)]
        struct Payload {
            #[serde(serialize_with = "base64_audio")]
            audio: Option<Vec<u8>>,
        }
        let some = serde_json::to_value(Payload {
            audio: Some(b"mp3".to_vec()),
        })
        .unwrap();
        assert_eq!(some["audio"], "bXAz");
        let none = serde_json::to_value(Payload { audio: None }).unwrap();
        assert!(none["audio"].is_null());
    }

    #[test]
    fn test_unavailable_report_is_zero_sentinel() {
        let report = Report::unavailable();
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.metrics.clarity, 0);
        assert!(report.strengths.is_empty());
    }
}
