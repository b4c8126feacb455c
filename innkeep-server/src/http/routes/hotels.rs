//! Hotel endpoints (admin only)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{Hotel, HotelRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Pagination, PaginationParams, Role, Title};

/// Create or update hotel request
#[derive(Deserialize)]
pub struct HotelRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Hotel search query
#[derive(Deserialize, Default)]
pub struct HotelSearchParams {
    pub title: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Hotel response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Hotel> for HotelResponse {
    fn from(h: Hotel) -> Self {
        Self {
            id: h.id,
            title: h.title,
            description: h.description,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

/// POST /api/admin/hotels
async fn create_hotel(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<HotelRequest>,
) -> Result<(StatusCode, Json<HotelResponse>), ApiError> {
    caller.require(&[Role::Admin])?;
    let title = Title::new(&req.title)?;

    let hotel = HotelRepo::new(&state.pool).create(title, req.description).await?;
    tracing::info!(hotel_id = %hotel.id, "hotel created");

    Ok((StatusCode::CREATED, Json(HotelResponse::from(hotel))))
}

/// GET /api/admin/hotels
async fn search_hotels(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<HotelSearchParams>,
) -> Result<Json<Vec<HotelResponse>>, ApiError> {
    caller.require(&[Role::Admin])?;

    let page = Pagination::from(PaginationParams {
        limit: params.limit,
        offset: params.offset,
    });
    let title = params.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let hotels = HotelRepo::new(&state.pool).search(title, page).await?;

    Ok(Json(hotels.into_iter().map(HotelResponse::from).collect()))
}

/// PUT /api/admin/hotels/{id}
async fn update_hotel(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    Json(req): Json<HotelRequest>,
) -> Result<Json<HotelResponse>, ApiError> {
    caller.require(&[Role::Admin])?;
    let title = Title::new(&req.title)?;

    let hotel = HotelRepo::new(&state.pool)
        .update(id, title, req.description)
        .await?;

    Ok(Json(HotelResponse::from(hotel)))
}

/// Hotel routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/hotels", get(search_hotels).post(create_hotel))
        .route("/api/admin/hotels/{id}", put(update_hotel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_uses_camel_case() {
        let now = Utc::now();
        let json = serde_json::to_value(HotelResponse {
            id: Uuid::nil(),
            title: "Inn".into(),
            description: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json["description"].is_null());
    }
}
