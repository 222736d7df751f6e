// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    engine::grading::GradedResult,
    models::quiz::{Answer, Quiz},
};

/// DTO for starting a session from a library quiz.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub quiz_id: String,
}

/// Row of the session list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub quiz_name: String,
    pub session_date: DateTime<Utc>,
    pub participant_count: i64,
}

/// A stored session: the quiz snapshot it ran plus every submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session_id: String,
    pub session_date: DateTime<Utc>,
    #[serde(flatten)]
    pub quiz: Quiz,
    pub results: Vec<SessionResult>,
}

/// DTO for a participant's submission. `answers` is in display order.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersRequest {
    #[validate(length(min = 1, max = 100))]
    pub participant_id: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub answers: Vec<Option<Answer>>,
    pub time_spent: Option<u64>,
    pub auto_submitted: Option<bool>,
    #[validate(length(max = 200))]
    pub timeout_reason: Option<String>,
}

/// Score summary returned to the participant.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub score: usize,
    pub total_questions: usize,
    pub total_gradeable: usize,
    pub pending_manual_grading: usize,
}

/// One entry of a session's result log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub participant_id: String,
    pub participant_name: String,
    pub score: usize,
    pub total_questions: usize,
    pub total_gradeable: usize,
    pub pending_manual_grading: usize,
    pub submitted_at: DateTime<Utc>,
    /// Answers in canonical question order.
    pub answers: Vec<Option<Answer>>,
    /// Answers exactly as submitted, in display order.
    pub original_answers: Vec<Option<Answer>>,
    pub detailed_results: Vec<GradedResult>,
    pub time_spent: u64,
    pub auto_submitted: bool,
    pub timeout_reason: Option<String>,
    pub time_limit: Option<u32>,
    pub was_randomized: bool,
    pub question_mapping: Option<Vec<usize>>,
}
