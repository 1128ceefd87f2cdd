//! Report aggregation — folds a session's answers into a scored report.
//!
//! Provider output is never trusted as-is: scores are coerced to integers and
//! clamped into range (`overall_score` 0–100, metrics 1–10), and any failure
//! falls back to the zero-valued `Report::unavailable()` sentinel.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::interview::models::{Metrics, QnaRecord, Report};
use crate::interview::outcome::{DegradeReason, Degradation, Outcome, Stage};
use crate::providers::{with_timeout, ContentGenerator, RawMetrics, RawReport};

pub const NO_ANSWERS_MESSAGE: &str = "No answers recorded yet.";

const SCORE_RANGE: (i64, i64) = (0, 100);
const METRIC_RANGE: (i64, i64) = (1, 10);
const MISSING_SUMMARY: &str = "No summary was provided.";

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportOutcome {
    /// Nothing to assess yet; the provider is not called.
    NoAnswers { error: &'static str },
    Ready {
        #[serde(flatten)]
        report: Report,
        degraded: Vec<Degradation>,
    },
}

impl ReportOutcome {
    pub fn no_answers() -> Self {
        ReportOutcome::NoAnswers {
            error: NO_ANSWERS_MESSAGE,
        }
    }
}

#[derive(Clone)]
pub struct ReportAggregator {
    content: Arc<dyn ContentGenerator>,
    timeout: Duration,
}

impl ReportAggregator {
    pub fn new(content: Arc<dyn ContentGenerator>, timeout: Duration) -> Self {
        Self { content, timeout }
    }

    /// `history` must already be ordered by question index.
    pub async fn aggregate(&self, history: &[QnaRecord]) -> ReportOutcome {
        if history.is_empty() {
            return ReportOutcome::no_answers();
        }

        let raw = with_timeout(self.timeout, self.content.summarize(history)).await;
        let mut degraded = Vec::new();
        let report = match Outcome::from_result(Stage::Report, raw.map(Some), || None)
            .collect_into(&mut degraded)
        {
            Some(raw) => validate_report(raw, &mut degraded),
            None => Report::unavailable(),
        };

        ReportOutcome::Ready { report, degraded }
    }
}

fn validate_report(raw: RawReport, degraded: &mut Vec<Degradation>) -> Report {
    let RawMetrics {
        clarity,
        relevance,
        confidence,
    } = raw.metrics;

    let summary = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| MISSING_SUMMARY.to_string());

    Report {
        overall_score: bounded_score("overall_score", &raw.overall_score, SCORE_RANGE, degraded),
        summary,
        strengths: non_blank(raw.strengths),
        areas_for_improvement: non_blank(raw.areas_for_improvement),
        metrics: Metrics {
            clarity: bounded_score("clarity", &clarity, METRIC_RANGE, degraded),
            relevance: bounded_score("relevance", &relevance, METRIC_RANGE, degraded),
            confidence: bounded_score("confidence", &confidence, METRIC_RANGE, degraded),
        },
    }
}

/// Coerces a provider score to an integer within `(min, max)`.
/// Out-of-range values are clamped; non-numeric values default to `min`.
fn bounded_score(
    field: &str,
    value: &Value,
    (min, max): (i64, i64),
    degraded: &mut Vec<Degradation>,
) -> u8 {
    let score = match as_integer(value) {
        Some(n) if (min..=max).contains(&n) => n,
        Some(n) => {
            let clamped = n.clamp(min, max);
            degraded.push(Degradation::new(
                Stage::Report,
                DegradeReason::OutOfRange,
                format!("{field}={n} clamped to {clamped}"),
            ));
            clamped
        }
        None => {
            degraded.push(Degradation::new(
                Stage::Report,
                DegradeReason::OutOfRange,
                format!("{field}={value} is not numeric, defaulted to {min}"),
            ));
            min
        }
    };
    // Both ranges fit in u8.
    u8::try_from(score).unwrap_or(0)
}

fn as_integer(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
