//! Evaluation endpoints; mutations act as the person named in the request
//! headers

use std::sync::Arc;

use axum::extract::{Path, State};
use renval_core::model::{
    Evaluation, EvaluationPatch, EvaluationQuery, EvaluationStatus, EvaluationUpdate,
    NewEvaluation,
};
use serde::Deserialize;

use super::{Acting, ApiResponse, Body, Params};
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<EvaluationStatus>,
    pub assessment_id: Option<String>,
    pub evaluator_id: Option<String>,
}

/// Body of `POST /api/evaluations`; the evaluator is the acting person
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub assessment_id: String,
    #[serde(flatten)]
    pub evaluation: NewEvaluation,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Params(params): Params<ListParams>,
) -> Result<ApiResponse<Vec<Evaluation>>, ApiError> {
    let evaluations = state.renval.evaluations.list(&EvaluationQuery {
        status: params.status,
        assessment_id: params.assessment_id,
        evaluator_id: params.evaluator_id,
    })?;
    Ok(ApiResponse::ok("Evaluations retrieved successfully", evaluations))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Evaluation>, ApiError> {
    let evaluation = state.renval.evaluations.get(&id)?;
    Ok(ApiResponse::ok("Evaluation retrieved successfully", evaluation))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Acting(actor): Acting,
    Body(request): Body<CreateRequest>,
) -> Result<ApiResponse<Evaluation>, ApiError> {
    let evaluation = state
        .renval
        .evaluations
        .create(&request.assessment_id, &actor.person_id, request.evaluation)
        .await?;
    Ok(ApiResponse::created("Evaluation created successfully", evaluation))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Acting(actor): Acting,
    Body(patch): Body<EvaluationPatch>,
) -> Result<ApiResponse<EvaluationUpdate>, ApiError> {
    let update = state.renval.evaluations.update(&id, &actor, patch).await?;
    let message = if update.artifact_error.is_some() {
        "Evaluation updated, but the evaluation sheet could not be generated"
    } else {
        "Evaluation updated successfully"
    };
    Ok(ApiResponse::ok(message, update))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Acting(actor): Acting,
) -> Result<ApiResponse<()>, ApiError> {
    state.renval.evaluations.delete(&id, &actor).await?;
    Ok(ApiResponse::ok("Evaluation deleted successfully", ()))
}
