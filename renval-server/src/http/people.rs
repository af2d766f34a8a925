//! People directory

use std::sync::Arc;

use axum::extract::{Path, State};
use renval_core::model::{NewPerson, Person};

use super::{ApiResponse, Body};
use crate::{ApiError, AppState};

pub async fn create(
    State(state): State<Arc<AppState>>,
    Body(input): Body<NewPerson>,
) -> Result<ApiResponse<Person>, ApiError> {
    let person = state.renval.store().insert_person(input)?;
    tracing::info!(person_id = %person.id, "Person created");
    Ok(ApiResponse::created("Person created successfully", person))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<Person>>, ApiError> {
    let people = state.renval.store().list_people()?;
    Ok(ApiResponse::ok("People retrieved successfully", people))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Person>, ApiError> {
    let person = state.renval.store().get_person(&id)?;
    Ok(ApiResponse::ok("Person retrieved successfully", person))
}
