//! File uploads and downloads
//!
//! Clients send file bytes only. Where a file is stored is decided by the
//! core, so a request can never point an assessment at someone else's file.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use renval_core::model::{AssessmentDetail, AssessmentFile, StoredFile, Submission, Upload};

use super::{ApiResponse, Form};
use crate::{ApiError, AppState};

/// Upper bound on a multipart request body; the core enforces the per-file
/// limits
pub const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// A multipart form split into text fields and file fields by name
#[derive(Debug, Default)]
struct FormParts {
    text: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormParts {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut parts = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    if let Some(upload) = read_file(field, file_name).await? {
                        parts.files.insert(name, upload);
                    }
                }
                None => {
                    parts.text.insert(name, field.text().await?);
                }
            }
        }
        Ok(parts)
    }

    fn flag(&self, name: &str) -> Result<bool, ApiError> {
        match self.text.get(name).map(|v| v.trim()) {
            None | Some("") | Some("false") | Some("0") => Ok(false),
            Some("true") | Some("1") => Ok(true),
            Some(other) => Err(ApiError::BadRequest(format!(
                "{name} must be true or false, got {other}"
            ))),
        }
    }

    fn into_submission(mut self) -> Result<Submission, ApiError> {
        let attendance_confirmed = self.flag("attendanceConfirmed")?;
        let questionnaire_responses = match self.text.get("questionnaireResponses") {
            Some(raw) if !raw.trim().is_empty() => Some(serde_json::from_str(raw).map_err(|e| {
                ApiError::BadRequest(format!("questionnaireResponses is not a JSON object: {e}"))
            })?),
            _ => None,
        };
        Ok(Submission {
            attendance_confirmed,
            presentation: self.files.remove("presentation"),
            questionnaire_responses,
        })
    }
}

/// Browsers send an empty part when no file was chosen
async fn read_file(field: Field<'_>, file_name: String) -> Result<Option<Upload>, ApiError> {
    let bytes = field.bytes().await?;
    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Upload::new(file_name, bytes.to_vec())))
}

/// Stored file sent back as an attachment
pub struct Download(StoredFile);

impl Download {
    fn content_type(&self) -> &'static str {
        let name = self.0.artifact.file_name();
        let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => "application/pdf",
            "ppt" => "application/vnd.ms-powerpoint",
            "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "json" => "application/json",
            _ => "application/octet-stream",
        }
    }
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        let disposition = format!("attachment; filename=\"{}\"", self.0.artifact.file_name());
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.0.bytes,
        )
            .into_response()
    }
}

fn file_kind(kind: &str) -> Result<AssessmentFile, ApiError> {
    AssessmentFile::parse(kind).ok_or_else(|| {
        renval_core::Error::NotFound(format!("Unknown file kind: {kind}")).into()
    })
}

/// `PUT /api/assessments/:id/submission` with fields `attendanceConfirmed`,
/// `questionnaireResponses` (JSON text) and a `presentation` file
pub async fn record_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(multipart): Form,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let submission = FormParts::read(multipart).await?.into_submission()?;
    let detail = state
        .renval
        .submissions
        .record_submission(&id, submission)
        .await?;
    Ok(ApiResponse::ok("Requirements submitted successfully", detail))
}

/// `PUT /api/assessments/:id/files/:kind` with a single `file` field; only
/// the memo is uploaded this way
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path((id, kind)): Path<(String, String)>,
    Form(multipart): Form,
) -> Result<ApiResponse<AssessmentDetail>, ApiError> {
    let kind = file_kind(&kind)?;
    if kind != AssessmentFile::NotaDinas {
        return Err(ApiError::BadRequest(format!(
            "{kind} files are uploaded with a submission"
        )));
    }
    let mut parts = FormParts::read(multipart).await?;
    let upload = parts
        .files
        .remove("file")
        .ok_or_else(|| ApiError::BadRequest("Missing file field".into()))?;
    let detail = state.renval.assessments.attach_memo(&id, upload).await?;
    Ok(ApiResponse::ok("Nota dinas uploaded successfully", detail))
}

/// `GET /api/assessments/:id/files/:kind`
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Download, ApiError> {
    let kind = file_kind(&kind)?;
    Ok(Download(state.renval.assessments.file(&id, kind).await?))
}

/// `GET /api/evaluations/:id/file`
pub async fn evaluation_sheet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Download, ApiError> {
    Ok(Download(state.renval.evaluations.sheet(&id).await?))
}
