//! Participant links and schedule conflicts

use std::sync::Arc;

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use renval_core::model::{NewParticipant, ParticipantLink, ParticipantView, ScheduleConflict};
use serde::Deserialize;

use super::assessments::StatusRequest;
use super::{ApiResponse, Body, Params};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub schedule: DateTime<Utc>,
}

/// Query string of the conflict check
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictParams {
    #[serde(alias = "person_id")]
    pub person_id: String,
    pub schedule: DateTime<Utc>,
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Body(input): Body<NewParticipant>,
) -> Result<ApiResponse<ParticipantView>, ApiError> {
    let view = state.renval.participants.add(&id, input)?;
    Ok(ApiResponse::created("Participant added successfully", view))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path((id, link_id)): Path<(String, String)>,
) -> Result<ApiResponse<()>, ApiError> {
    state.renval.participants.remove(&id, &link_id)?;
    Ok(ApiResponse::ok("Participant removed successfully", ()))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path((id, link_id)): Path<(String, String)>,
    Body(request): Body<StatusRequest>,
) -> Result<ApiResponse<ParticipantLink>, ApiError> {
    let link = state
        .renval
        .participants
        .update_status(&id, &link_id, request.status)?;
    Ok(ApiResponse::ok("Participant status updated successfully", link))
}

pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path((id, link_id)): Path<(String, String)>,
    Body(request): Body<ScheduleRequest>,
) -> Result<ApiResponse<ParticipantLink>, ApiError> {
    let link = state
        .renval
        .participants
        .update_schedule(&id, &link_id, request.schedule)?;
    Ok(ApiResponse::ok("Participant schedule updated successfully", link))
}

/// Advisory check; the assessment in the path is excluded from the result
pub async fn conflicts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Params(params): Params<ConflictParams>,
) -> Result<ApiResponse<Vec<ScheduleConflict>>, ApiError> {
    let conflicts = state.renval.participants.check_schedule_conflicts(
        &params.person_id,
        params.schedule,
        Some(&id),
    )?;
    let message = if conflicts.is_empty() {
        "No schedule conflicts".to_string()
    } else {
        format!("{} conflicting assessments", conflicts.len())
    };
    Ok(ApiResponse::ok(message, conflicts))
}
