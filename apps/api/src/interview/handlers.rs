//! Axum route handlers for the Interview API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::documents::extract_cv_text;
use crate::errors::AppError;
use crate::interview::models::SessionId;
use crate::interview::orchestrator::{
    QuestionAdvanced, QuestionSelected, SessionCreated, SessionView,
};
use crate::interview::pipeline::AnswerResult;
use crate::interview::report::ReportOutcome;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetQuestionRequest {
    pub index: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Multipart fields: `job_description` (required), `cv_file` or `cv_text` (optional).
/// An uploaded file takes precedence over pasted text.
pub async fn handle_create_session(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SessionCreated>, AppError> {
    let mut multipart =
        multipart.map_err(|rejection| AppError::InvalidArgument(rejection.body_text()))?;
    let mut job_description = None;
    let mut cv_text = None;
    let mut cv_file = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("job_description") => {
                job_description = Some(field.text().await.map_err(bad_multipart)?);
            }
            Some("cv_text") => cv_text = Some(field.text().await.map_err(bad_multipart)?),
            Some("cv_file") => {
                let filename = field.file_name().unwrap_or("cv.txt").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    cv_file = Some((filename, bytes));
                }
            }
            _ => {}
        }
    }

    let job_description = job_description
        .ok_or_else(|| AppError::InvalidArgument("job_description is required".to_string()))?;

    let cv_text = match cv_file {
        Some((filename, bytes)) => Some(extract_cv_text(bytes.to_vec(), &filename).await),
        None => cv_text,
    };

    let created = state
        .orchestrator
        .create_session(cv_text.as_deref(), &job_description)
        .await?;
    Ok(Json(created))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(state.orchestrator.session_view(session_id).await?))
}

/// POST /api/v1/sessions/:id/question
///
/// Jumps to an arbitrary question and returns its audio.
pub async fn handle_set_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Result<Json<SetQuestionRequest>, JsonRejection>,
) -> Result<Json<QuestionSelected>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return Err(reject_body(&state, session_id, rejection.body_text()).await);
        }
    };
    let selected = state
        .orchestrator
        .set_question(session_id, request.index)
        .await?;
    Ok(Json(selected))
}

/// POST /api/v1/sessions/:id/advance
pub async fn handle_advance_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<QuestionAdvanced>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(state.orchestrator.advance_question(session_id).await?))
}

/// POST /api/v1/sessions/:id/answers
///
/// Multipart field `audio_file` carries the recorded answer.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnswerResult>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            return Err(reject_body(&state, session_id, rejection.body_text()).await);
        }
    };

    let mut audio: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("audio_file") {
            // Held in memory only; the buffer is released when the request completes.
            audio = Some(field.bytes().await.map_err(bad_multipart)?);
        }
    }
    let audio =
        audio.ok_or_else(|| AppError::InvalidArgument("audio_file is required".to_string()))?;

    Ok(Json(state.orchestrator.submit_answer(session_id, audio).await?))
}

/// POST /api/v1/sessions/:id/report
///
/// Returns `{"error": "No answers recorded yet."}` (HTTP 200) when nothing was answered.
pub async fn handle_generate_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ReportOutcome>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    Ok(Json(state.orchestrator.generate_report(session_id).await?))
}

/// Session ids are opaque to clients; anything unparseable simply does not exist.
fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Session {raw} not found")))
}

/// An unknown session wins over a malformed body.
async fn reject_body(state: &AppState, session_id: SessionId, message: String) -> AppError {
    match state.orchestrator.require_session(session_id).await {
        Ok(()) => AppError::InvalidArgument(message),
        Err(e) => e,
    }
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::InvalidArgument(format!("Malformed multipart body: {e}"))
}
