//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;
use crate::db::repos::{DbError, User, UserRepo};
use crate::models::{Role, ValidationError};

/// Header carrying the caller's user id.
///
/// Identity is resolved upstream; this service only trusts the header.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}

/// The calling user, loaded from the `X-User-Id` header
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Fail with 403 unless the caller has one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<&User, ApiError> {
        if allowed.contains(&self.0.role) {
            Ok(&self.0)
        } else {
            tracing::debug!(user_id = %self.0.id, role = %self.0.role, "role rejected");
            Err(ApiError::Forbidden {
                reason: format!("role '{}' may not access this resource", self.0.role),
            })
        }
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(ApiError::Unauthorized)?;

        match UserRepo::new(&state.pool).get(id).await {
            Ok(user) => Ok(Self(user)),
            Err(DbError::NotFound { .. }) => Err(ApiError::Unauthorized),
            Err(e) => Err(e.into()),
        }
    }
}
