// src/handlers/participant.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::participant::JoinRequest,
    state::SessionHub,
    utils::html::clean_html,
};

/// Registers a participant and hands back their opaque id.
pub async fn join(
    State(hub): State<SessionHub>,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let participant = hub.join(clean_html(payload.name.trim())).await;
    tracing::info!("New participant: {} (ID: {})", participant.name, participant.id);

    Ok(Json(serde_json::json!({
        "message": "Joined successfully!",
        "id": participant.id
    })))
}

/// Lists everyone who joined since the current session started.
pub async fn list_participants(State(hub): State<SessionHub>) -> impl IntoResponse {
    Json(hub.participants().await)
}
