//! Assessment endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use renval_core::model::{
    AssessmentDetail, AssessmentPatch, AssessmentQuery, AssessmentStatus, BatchCreated,
    DeliveryMethod, NewAssessmentBatch,
};
use serde::Deserialize;

use super::{ApiResponse, Body, Params};
use crate::{ApiError, AppState};

/// Query string of `GET /api/assessments`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<AssessmentStatus>,
    pub method: Option<DeliveryMethod>,
    pub participant_id: Option<String>,
    pub evaluator_id: Option<String>,
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ListParams> for AssessmentQuery {
    fn from(params: ListParams) -> Self {
        let defaults = AssessmentQuery::new();
        Self {
            status: params.status,
            method: params.method,
            participant_id: params.participant_id,
            evaluator_id: params.evaluator_id,
            search: params.search.filter(|s| !s.trim().is_empty()),
            include_inactive: params.include_inactive.unwrap_or(false),
            page: params.page.unwrap_or(defaults.page),
            limit: params.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: AssessmentStatus,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Body(batch): Body<NewAssessmentBatch>,
) -> Result<ApiResponse<BatchCreated>, ApiError> {
    let created = state.renval.participants.create_batch(batch).await?;
    let message = format!("{} assessments created successfully", created.created_count);
    Ok(ApiResponse::created(message, created))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Params(params): Params<ListParams>,
) -> Result<ApiResponse<Vec<AssessmentDetail>>, ApiError> {
    let page = state.renval.assessments.list(&params.into())?;
    Ok(ApiResponse::ok("Assessments retrieved successfully", page.items)
        .with_metadata(page.metadata))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let detail = state.renval.assessments.get(&id)?;
    Ok(ApiResponse::ok("Assessment retrieved successfully", detail))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Body(patch): Body<AssessmentPatch>,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let detail = state.renval.assessments.update(&id, patch).await?;
    Ok(ApiResponse::ok("Assessment updated successfully", detail))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.renval.assessments.delete(&id).await?;
    Ok(ApiResponse::ok("Assessment deleted successfully", ()))
}

pub async fn transition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Body(request): Body<StatusRequest>,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let detail = state
        .renval
        .assessments
        .request_transition(&id, request.status)
        .await?;
    Ok(ApiResponse::ok("Assessment status updated successfully", detail))
}

pub async fn send_invitation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let detail = state.renval.assessments.send_invitation(&id).await?;
    Ok(ApiResponse::ok("Invitation sent successfully", detail))
}

pub async fn start_evaluation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let detail = state.renval.assessments.start_evaluation(&id).await?;
    Ok(ApiResponse::ok("Assessment started successfully", detail))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let detail = state.renval.assessments.reset_to_scheduled(&id).await?;
    Ok(ApiResponse::ok("Assessment reset to scheduled", detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_default_to_first_page() {
        let query = AssessmentQuery::from(ListParams::default());
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert!(!query.include_inactive);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = AssessmentQuery::from(ListParams {
            search: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(query.search, None);
    }
}
