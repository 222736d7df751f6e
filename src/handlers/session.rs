// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqlitePool, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    engine::{ActiveSession, EngineError},
    error::AppError,
    handlers::quiz::load_quiz,
    models::{
        quiz::{PublicQuestion, PublicQuiz, Quiz},
        session::{
            SessionDetail, SessionResult, SessionSummary, StartSessionRequest,
            SubmitAnswersRequest, SubmitResponse,
        },
    },
    state::SessionHub,
};

/// Starts a session from a library quiz.
///
/// * Snapshots the quiz so later library edits don't affect the session.
/// * Replaces the running session, discarding its participant views and roster.
pub async fn start_session(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(hub): State<SessionHub>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_quiz(&pool, &req.quiz_id).await?;
    let session_id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO quiz_sessions (id, quiz_id, quiz, session_date) VALUES (?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(&quiz.id)
    .bind(SqlJson(&quiz))
    .bind(Utc::now())
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store session: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("Quiz session started: {} (Session ID: {})", quiz.name, session_id);
    hub.start(ActiveSession::new(session_id.clone(), quiz, config.rng_seed))
        .await;

    Ok(Json(serde_json::json!({
        "sessionId": session_id,
        "message": "Quiz session started successfully"
    })))
}

/// Lists stored sessions, newest first.
pub async fn list_sessions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<(String, SqlJson<Quiz>, DateTime<Utc>, i64)> = sqlx::query_as(
        r#"
        SELECT s.id, s.quiz, s.session_date, COUNT(r.id)
        FROM quiz_sessions s
        LEFT JOIN session_results r ON r.session_id = s.id
        GROUP BY s.id
        ORDER BY s.session_date DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let sessions: Vec<SessionSummary> = rows
        .into_iter()
        .map(|(session_id, quiz, session_date, participant_count)| SessionSummary {
            session_id,
            quiz_name: quiz.0.name,
            session_date,
            participant_count,
        })
        .collect();

    Ok(Json(sessions))
}

/// Retrieves a session's quiz snapshot and all of its results.
pub async fn get_session(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (quiz, session_date): (SqlJson<Quiz>, DateTime<Utc>) =
        sqlx::query_as("SELECT quiz, session_date FROM quiz_sessions WHERE id = ?")
            .bind(&id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Session not found".to_string()))?;

    let results: Vec<(SqlJson<SessionResult>,)> =
        sqlx::query_as("SELECT data FROM session_results WHERE session_id = ? ORDER BY id")
            .bind(&id)
            .fetch_all(&pool)
            .await?;

    Ok(Json(SessionDetail {
        session_id: id,
        session_date,
        quiz: quiz.0,
        results: results.into_iter().map(|(r,)| r.0).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuizParams {
    pub student_id: Option<String>,
}

/// Returns the running quiz as the given participant sees it.
///
/// The first request for a participant fixes their question order, pool and
/// option labels for the rest of the session. Answer keys are never included.
pub async fn current_quiz(
    State(hub): State<SessionHub>,
    Query(params): Query<CurrentQuizParams>,
) -> Result<impl IntoResponse, AppError> {
    let session = hub.current().await.map_err(|e| match e {
        EngineError::NoActiveSession => AppError::NotFound("No quiz session started yet".to_string()),
        other => AppError::from(other),
    })?;

    let questions: Vec<PublicQuestion> = match params.student_id.as_deref().filter(|id| !id.is_empty()) {
        Some(student_id) => {
            let view = session.participant_view(student_id).await?;
            view.questions.iter().map(PublicQuestion::from).collect()
        }
        None => session.quiz.questions.iter().map(PublicQuestion::from).collect(),
    };

    let quiz = &session.quiz;
    Ok(Json(PublicQuiz {
        session_id: session.session_id.clone(),
        id: quiz.id.clone(),
        name: quiz.name.clone(),
        description: quiz.description.clone(),
        total_time_limit: quiz.total_time_limit,
        questions,
    }))
}

/// Grades a participant's submission and appends it to the session's results.
///
/// * Translates display-order answers back to the canonical quiz.
/// * Stores both the canonical and the raw answers.
pub async fn submit_answers(
    State(pool): State<SqlitePool>,
    State(hub): State<SessionHub>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = hub.current().await?;
    let submission = session
        .submit_answers(&req.participant_id, &req.answers)
        .await?;

    let participant_name = hub
        .participant_name(&req.participant_id)
        .await
        .unwrap_or_else(|| "Unknown".to_string());

    let report = submission.report;
    let total_questions = session.quiz.questions.len();
    let result = SessionResult {
        participant_id: req.participant_id,
        participant_name,
        score: report.score,
        total_questions,
        total_gradeable: report.total_gradeable,
        pending_manual_grading: report.pending_manual_grading,
        submitted_at: Utc::now(),
        answers: submission.answers,
        original_answers: req.answers,
        detailed_results: report.detailed_results,
        time_spent: req.time_spent.unwrap_or(0),
        auto_submitted: req.auto_submitted.unwrap_or(false),
        timeout_reason: req.timeout_reason,
        time_limit: session.quiz.total_time_limit,
        was_randomized: submission.was_randomized,
        question_mapping: submission.question_mapping,
    };

    sqlx::query(
        "INSERT INTO session_results (session_id, participant_id, data, submitted_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.session_id)
    .bind(&result.participant_id)
    .bind(SqlJson(&result))
    .bind(result.submitted_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store submission: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.pending_manual_grading > 0 {
        tracing::info!(
            "{} submitted quiz - Score: {}/{} ({} pending manual grading)",
            result.participant_name,
            result.score,
            result.total_gradeable,
            result.pending_manual_grading
        );
    } else {
        tracing::info!(
            "{} submitted quiz - Score: {}/{}",
            result.participant_name,
            result.score,
            result.total_gradeable
        );
    }

    Ok(Json(SubmitResponse {
        score: result.score,
        total_questions,
        total_gradeable: result.total_gradeable,
        pending_manual_grading: result.pending_manual_grading,
    }))
}
