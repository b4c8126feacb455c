//! Hotel room endpoints
//!
//! Public listing and lookup live under `/api/common`; creating and editing
//! rooms takes a multipart form with up to 20 `images` file parts and is
//! admin only.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{NewRoom, RoomRepo, RoomSearch, RoomUpdate, RoomWithHotel};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Pagination, PaginationParams, Role, Title, ValidationError};
use crate::uploads::{ImageStore, UploadError, MAX_IMAGES_PER_REQUEST};

/// Public room search query
#[derive(Deserialize, Default)]
pub struct RoomSearchParams {
    pub hotel: Option<Uuid>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Hotel summary embedded in room responses
#[derive(Serialize)]
pub struct RoomHotel {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Room response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_enabled: bool,
    pub hotel: RoomHotel,
}

impl From<RoomWithHotel> for RoomResponse {
    fn from(r: RoomWithHotel) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            images: r.images,
            is_enabled: r.is_enabled,
            hotel: RoomHotel {
                id: r.hotel_id,
                title: r.hotel_title,
                description: r.hotel_description,
            },
        }
    }
}

/// A file part waiting to be written
struct PendingUpload {
    file_name: String,
    bytes: Bytes,
}

/// Raw multipart room form
#[derive(Default)]
struct RoomForm {
    hotel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    is_enabled: Option<String>,
    /// Text `images` parts: paths of images already stored
    kept_images: Vec<String>,
    uploads: Vec<PendingUpload>,
}

impl RoomForm {
    fn hotel_id(&self) -> Result<Option<Uuid>, ValidationError> {
        non_blank(&self.hotel_id)
            .map(|s| {
                Uuid::parse_str(s).map_err(|_| ValidationError::InvalidFormat {
                    field: "hotelId",
                    reason: "invalid UUID format",
                })
            })
            .transpose()
    }

    fn title(&self) -> Result<Option<Title>, ValidationError> {
        self.title.as_deref().map(Title::new).transpose()
    }

    fn is_enabled(&self) -> Result<Option<bool>, ValidationError> {
        non_blank(&self.is_enabled).map(parse_flag).transpose()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_flag(value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidVariant {
            field: "isEnabled",
            value: value.to_owned(),
        }),
    }
}

/// How text `images` parts are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageParts {
    /// Only uploaded files count; text parts are dropped
    UploadsOnly,
    /// Text parts name stored images to keep, ahead of new uploads
    KeepExisting,
}

/// Drain the multipart body, checking file names before anything is written.
async fn read_room_form(mut multipart: Multipart, images: ImageParts) -> Result<RoomForm, ApiError> {
    let mut form = RoomForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);

        match (name.as_str(), file_name) {
            ("images", Some(file_name)) => {
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if form.uploads.len() == MAX_IMAGES_PER_REQUEST {
                    return Err(UploadError::TooManyFiles {
                        max: MAX_IMAGES_PER_REQUEST,
                    }
                    .into());
                }
                ImageStore::check(&file_name)?;
                form.uploads.push(PendingUpload { file_name, bytes });
            }
            ("images", None) => {
                let path = field.text().await?;
                if path.trim().is_empty() {
                    continue;
                }
                match images {
                    ImageParts::KeepExisting => form.kept_images.push(path),
                    ImageParts::UploadsOnly => {
                        tracing::debug!(path = %path, "ignoring image path on create")
                    }
                }
            }
            ("title", _) => form.title = Some(field.text().await?),
            ("description", _) => form.description = Some(field.text().await?),
            ("hotelId", _) => form.hotel_id = Some(field.text().await?),
            ("isEnabled", _) => form.is_enabled = Some(field.text().await?),
            (other, _) => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Write pending uploads; on failure, remove whatever was already written.
async fn store_uploads(store: &ImageStore, uploads: &[PendingUpload]) -> Result<Vec<String>, ApiError> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match store.save(&upload.file_name, &upload.bytes).await {
            Ok(path) => stored.push(path),
            Err(e) => {
                store.discard(&stored).await;
                return Err(e.into());
            }
        }
    }
    Ok(stored)
}

/// GET /api/common/hotel-rooms
///
/// Public listing only ever shows enabled rooms.
async fn search_rooms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoomSearchParams>,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        limit: params.limit,
        offset: params.offset,
    });
    let filter = RoomSearch {
        hotel_id: params.hotel,
        is_enabled: Some(true),
    };
    let rooms = RoomRepo::new(&state.pool).search(filter, page).await?;

    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// GET /api/common/hotel-rooms/{id}
async fn get_room(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<RoomResponse>, ApiError> {
    let room = RoomRepo::new(&state.pool).get(id).await?;
    Ok(Json(RoomResponse::from(room)))
}

/// POST /api/admin/hotel-rooms
async fn create_room(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    caller.require(&[Role::Admin])?;
    let form = read_room_form(multipart, ImageParts::UploadsOnly).await?;

    let hotel_id = form.hotel_id()?.ok_or(ValidationError::Missing { field: "hotelId" })?;
    let title = form.title()?.ok_or(ValidationError::Missing { field: "title" })?;
    let is_enabled = form.is_enabled()?.unwrap_or(true);

    let uploaded = store_uploads(&state.images, &form.uploads).await?;

    let room = NewRoom {
        hotel_id,
        title,
        description: form.description,
        images: uploaded.clone(),
        is_enabled,
    };
    let created = match RoomRepo::new(&state.pool).create(room).await {
        Ok(room) => room,
        Err(e) => {
            state.images.discard(&uploaded).await;
            return Err(e.into());
        }
    };

    tracing::info!(room_id = %created.id, images = created.images.len(), "room created");
    Ok((StatusCode::CREATED, Json(RoomResponse::from(created))))
}

/// PUT /api/admin/hotel-rooms/{id}
///
/// The stored image list becomes the text `images` parts followed by the
/// newly uploaded files.
async fn update_room(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    multipart: Multipart,
) -> Result<Json<RoomResponse>, ApiError> {
    caller.require(&[Role::Admin])?;
    let form = read_room_form(multipart, ImageParts::KeepExisting).await?;

    let hotel_id = form.hotel_id()?;
    let title = form.title()?;
    let is_enabled = form.is_enabled()?;

    let mut images = form.kept_images.clone();
    let uploaded = store_uploads(&state.images, &form.uploads).await?;
    images.extend(uploaded.iter().cloned());

    let update = RoomUpdate {
        hotel_id,
        title,
        description: form.description,
        images,
        is_enabled,
    };
    match RoomRepo::new(&state.pool).update(id, update).await {
        Ok(room) => Ok(Json(RoomResponse::from(room))),
        Err(e) => {
            state.images.discard(&uploaded).await;
            Err(e.into())
        }
    }
}

/// Room routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/common/hotel-rooms", get(search_rooms))
        .route("/api/common/hotel-rooms/{id}", get(get_room))
        .route("/api/admin/hotel-rooms", post(create_room))
        .route("/api/admin/hotel-rooms/{id}", put(update_room))
}
