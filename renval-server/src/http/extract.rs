//! Request extractors

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::request::Parts;
use renval_core::model::{Actor, SystemRole};

use crate::ApiError;

/// Header carrying the acting person's id
pub const PERSON_HEADER: &str = "x-person-id";

/// Header carrying the acting person's system role
pub const ROLE_HEADER: &str = "x-system-role";

/// JSON body whose rejection uses the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// Query string whose rejection uses the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Params<T>(pub T);

/// Multipart body whose rejection uses the error envelope
pub struct Form(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for Form
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Multipart::from_request(req, state).await?))
    }
}

/// The person performing the request, read from [`PERSON_HEADER`] and
/// [`ROLE_HEADER`]. A missing role means `USER`.
pub struct Acting(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for Acting
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let person_id = header(parts, PERSON_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {PERSON_HEADER} header")))?;
        let role = match header(parts, ROLE_HEADER) {
            Some(role) => SystemRole::parse(&role.to_ascii_uppercase())
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown system role: {role}")))?,
            None => SystemRole::User,
        };
        Ok(Self(Actor::new(person_id, role)))
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
