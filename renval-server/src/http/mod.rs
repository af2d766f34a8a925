//! HTTP routes and handlers

mod assessments;
mod evaluations;
mod events;
mod extract;
mod files;
mod health;
mod participants;
mod people;
mod response;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use extract::{Acting, Body, Form, PERSON_HEADER, Params, ROLE_HEADER};
pub use files::UPLOAD_BODY_LIMIT;
pub use health::HealthResponse;
pub use response::ApiResponse;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/people", get(people::list).post(people::create))
        .route("/api/people/:id", get(people::get))
        .route(
            "/api/assessments",
            get(assessments::list).post(assessments::create),
        )
        .route(
            "/api/assessments/:id",
            get(assessments::get)
                .put(assessments::update)
                .delete(assessments::delete),
        )
        .route("/api/assessments/:id/status", patch(assessments::transition))
        .route(
            "/api/assessments/:id/invitation",
            post(assessments::send_invitation),
        )
        .route("/api/assessments/:id/start", post(assessments::start_evaluation))
        .route("/api/assessments/:id/reset", post(assessments::reset))
        .route(
            "/api/assessments/:id/submission",
            put(files::record_submission).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/assessments/:id/files/:kind",
            get(files::download)
                .put(files::upload)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/assessments/:id/conflicts", get(participants::conflicts))
        .route("/api/assessments/:id/participants", post(participants::add))
        .route(
            "/api/assessments/:id/participants/:link_id",
            delete(participants::remove),
        )
        .route(
            "/api/assessments/:id/participants/:link_id/status",
            patch(participants::update_status),
        )
        .route(
            "/api/assessments/:id/participants/:link_id/schedule",
            patch(participants::update_schedule),
        )
        .route(
            "/api/evaluations",
            get(evaluations::list).post(evaluations::create),
        )
        .route(
            "/api/evaluations/:id",
            get(evaluations::get)
                .put(evaluations::update)
                .delete(evaluations::delete),
        )
        .route("/api/evaluations/:id/file", get(files::evaluation_sheet))
        .route("/api/events", get(events::stream))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
