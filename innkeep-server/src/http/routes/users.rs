//! User administration endpoints (admin only)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{NewUser, User, UserFilter, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;
use crate::models::{Email, Pagination, PaginationParams, Role, ValidationError};

/// Create user request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// User search query
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchParams {
    pub email: Option<String>,
    pub name: Option<String>,
    pub contact_phone: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// User response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub contact_phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            contact_phone: u.contact_phone,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// Validate a create request into repository input.
fn new_user(req: CreateUserRequest) -> Result<NewUser, ValidationError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }

    Ok(NewUser {
        email: Email::new(&req.email)?,
        name: name.to_owned(),
        contact_phone: req
            .contact_phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty()),
        role: req.role,
    })
}

/// POST /api/admin/users
async fn create_user(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    caller.require(&[Role::Admin])?;
    let user = UserRepo::new(&state.pool).create(new_user(req)?).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/admin/users
async fn search_users(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    caller.require(&[Role::Admin])?;

    let page = Pagination::from(PaginationParams {
        limit: params.limit,
        offset: params.offset,
    });
    let filter = UserFilter {
        email: params.email,
        name: params.name,
        contact_phone: params.contact_phone,
    };
    let users = UserRepo::new(&state.pool).search(&filter, page).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/users", get(search_users).post(create_user))
}
