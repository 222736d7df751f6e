// src/routes.rs

use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{participant, quiz, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (participants, live session, quiz library, session history).
/// * Serves the static pages from the configured public directory.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    // Participant-facing endpoints of the running session
    let live_routes = Router::new()
        .route("/api/join", post(participant::join))
        .route("/api/participants", get(participant::list_participants))
        .route("/api/currentQuiz", get(session::current_quiz))
        .route("/api/submit", post(session::submit_answers));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route("/start", post(session::start_session))
        .route("/duplicate", post(quiz::duplicate_quiz))
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/{id}/archive", put(quiz::archive_quiz))
        .route("/{id}/unarchive", put(quiz::unarchive_quiz))
        .route("/{id}/template", put(quiz::mark_template));

    let session_routes = Router::new()
        .route("/", get(session::list_sessions))
        .route("/{id}", get(session::get_session));

    let public_dir = Path::new(&state.config.public_dir);
    let admin_page = ServeFile::new(public_dir.join("admin.html"));
    let static_pages = ServeDir::new(public_dir);

    Router::new()
        .merge(live_routes)
        .nest("/api/quizzes", quiz_routes)
        .route("/api/question-bank", get(quiz::question_bank))
        .nest("/api/sessions", session_routes)
        .route_service("/admin", admin_page)
        .fallback_service(static_pages)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
