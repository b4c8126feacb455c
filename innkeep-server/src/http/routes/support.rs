//! Support chat endpoints
//!
//! Clients open requests and talk to managers inside them. A client only
//! ever sees its own requests; someone else's request looks like a missing
//! one. New messages are pushed to event-stream subscribers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{
    ClientRequestSummary, ManagerRequestSummary, MessageWithAuthor, ReaderSide, SupportRepo,
    SupportRequest, User,
};
use crate::events::ChatEvent;
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{MessageText, Pagination, PaginationParams, Role};

/// Roles that take part in a conversation
const PARTICIPANTS: &[Role] = &[Role::Client, Role::Manager];

/// Body for opening a request or sending a message
#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Body for marking messages read
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub created_before: DateTime<Utc>,
}

/// Listing query
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SupportListParams {
    pub is_active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SupportListParams {
    fn page(&self) -> Pagination {
        Pagination::from(PaginationParams {
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Request summary for clients
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub has_new_messages: bool,
}

impl From<ClientRequestSummary> for RequestResponse {
    fn from(r: ClientRequestSummary) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            is_active: r.is_active,
            has_new_messages: r.has_new_messages,
        }
    }
}

/// Client block in manager listings
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestClient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_phone: Option<String>,
}

/// Request summary for managers
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerRequestResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub has_new_messages: bool,
    pub client: RequestClient,
}

impl From<ManagerRequestSummary> for ManagerRequestResponse {
    fn from(r: ManagerRequestSummary) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            is_active: r.is_active,
            has_new_messages: r.has_new_messages,
            client: RequestClient {
                id: r.client_id,
                name: r.client_name,
                email: r.client_email,
                contact_phone: r.client_contact_phone,
            },
        }
    }
}

/// Message author
#[derive(Serialize)]
pub struct MessageAuthor {
    pub id: Uuid,
    pub name: String,
}

/// Message response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub read_at: Option<DateTime<Utc>>,
    pub author: MessageAuthor,
}

impl From<MessageWithAuthor> for MessageResponse {
    fn from(m: MessageWithAuthor) -> Self {
        Self {
            id: m.id,
            created_at: m.sent_at,
            text: m.text,
            read_at: m.read_at,
            author: MessageAuthor {
                id: m.author_id,
                name: m.author_name,
            },
        }
    }
}

/// Success acknowledgement
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn reader_side(role: Role) -> ReaderSide {
    match role {
        Role::Client => ReaderSide::Client,
        Role::Manager | Role::Admin => ReaderSide::Staff,
    }
}

/// Whether `user` may see `request`: staff see all, clients their own.
fn can_view(user: &User, request: &SupportRequest) -> bool {
    user.role != Role::Client || request.user_id == user.id
}

/// Load a request the caller is allowed to see.
async fn visible_request(state: &AppState, user: &User, id: Uuid) -> Result<SupportRequest, ApiError> {
    let request = SupportRepo::new(&state.pool).get_request(id).await?;
    if !can_view(user, &request) {
        tracing::debug!(request_id = %id, user_id = %user.id, "request hidden from client");
        return Err(ApiError::NotFound {
            resource: "support request",
            id: id.to_string(),
        });
    }
    Ok(request)
}

/// POST /api/client/support-requests
async fn create_request(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<MessageRequest>,
) -> Result<(StatusCode, Json<RequestResponse>), ApiError> {
    let user = caller.require(&[Role::Client])?;
    let text = MessageText::new(&req.text)?;

    let summary = SupportRepo::new(&state.pool).create_request(user.id, text).await?;
    tracing::info!(request_id = %summary.id, user_id = %user.id, "support request opened");

    Ok((StatusCode::CREATED, Json(RequestResponse::from(summary))))
}

/// GET /api/client/support-requests
async fn list_client_requests(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SupportListParams>,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let user = caller.require(&[Role::Client])?;
    let requests = SupportRepo::new(&state.pool)
        .list_for_client(user.id, params.is_active, params.page())
        .await?;

    Ok(Json(requests.into_iter().map(RequestResponse::from).collect()))
}

/// GET /api/manager/support-requests
async fn list_manager_requests(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SupportListParams>,
) -> Result<Json<Vec<ManagerRequestResponse>>, ApiError> {
    caller.require(&[Role::Manager])?;
    let requests = SupportRepo::new(&state.pool)
        .list_for_manager(params.is_active, params.page())
        .await?;

    Ok(Json(
        requests.into_iter().map(ManagerRequestResponse::from).collect(),
    ))
}

/// POST /api/manager/support-requests/{id}/close
async fn close_request(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<SuccessResponse>, ApiError> {
    let user = caller.require(&[Role::Manager])?;
    SupportRepo::new(&state.pool).close(id).await?;

    tracing::info!(request_id = %id, manager_id = %user.id, "support request closed");
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/common/support-requests/{id}/messages
async fn list_messages(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let user = caller.require(PARTICIPANTS)?;
    visible_request(&state, user, id).await?;

    let messages = SupportRepo::new(&state.pool).list_messages(id).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// POST /api/common/support-requests/{id}/messages
async fn send_message(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    Json(req): Json<MessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = caller.require(PARTICIPANTS)?;
    let text = MessageText::new(&req.text)?;

    visible_request(&state, user, id).await?;

    // Closed requests surface as DbError::Closed -> 400
    let message = SupportRepo::new(&state.pool)
        .add_message(id, user.id, text)
        .await?;

    let delivered = state.events.publish(ChatEvent {
        request_id: id,
        message: message.clone(),
    });
    tracing::debug!(request_id = %id, message_id = %message.id, delivered, "message sent");

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// POST /api/common/support-requests/{id}/messages/read
async fn mark_messages_read(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let user = caller.require(PARTICIPANTS)?;
    visible_request(&state, user, id).await?;

    let marked = SupportRepo::new(&state.pool)
        .mark_read(id, reader_side(user.role), req.created_before)
        .await?;
    tracing::debug!(request_id = %id, marked, "messages marked read");

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/common/support-requests/{id}/events
///
/// Server-sent events, one `message` event per new message.
async fn message_events(
    caller: CurrentUser,
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let user = caller.require(PARTICIPANTS)?;
    visible_request(&state, user, id).await?;

    tracing::debug!(request_id = %id, user_id = %user.id, "chat subscriber connected");
    let stream = state.events.subscribe(id).map(|event| {
        Event::default()
            .event("message")
            .json_data(MessageResponse::from(event.message.clone()))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Support routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/client/support-requests",
            get(list_client_requests).post(create_request),
        )
        .route("/api/manager/support-requests", get(list_manager_requests))
        .route("/api/manager/support-requests/{id}/close", post(close_request))
        .route(
            "/api/common/support-requests/{id}/messages",
            get(list_messages).post(send_message),
        )
        .route(
            "/api/common/support-requests/{id}/messages/read",
            post(mark_messages_read),
        )
        .route("/api/common/support-requests/{id}/events", get(message_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    use crate::db::repos::testing;
    use crate::http::server::ServerConfig;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "u@example.com".into(),
            name: "U".into(),
            contact_phone: None,
            role,
            created_at: Utc::now(),
        }
    }

    fn request_of(owner: &User) -> SupportRequest {
        SupportRequest {
            id: Uuid::new_v4(),
            user_id: owner.id,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn clients_see_only_their_requests() {
        let owner = user(Role::Client);
        let stranger = user(Role::Client);
        let manager = user(Role::Manager);
        let request = request_of(&owner);

        assert!(can_view(&owner, &request));
        assert!(!can_view(&stranger, &request));
        assert!(can_view(&manager, &request));
    }

    #[test]
    fn reader_sides() {
        assert_eq!(reader_side(Role::Client), ReaderSide::Client);
        assert_eq!(reader_side(Role::Manager), ReaderSide::Staff);
    }

    #[test]
    fn message_response_shape() {
        let now = Utc::now();
        let json = serde_json::to_value(MessageResponse::from(MessageWithAuthor {
            id: Uuid::nil(),
            support_request_id: Uuid::nil(),
            text: "hello".into(),
            sent_at: now,
            read_at: None,
            author_id: Uuid::nil(),
            author_name: "Ann".into(),
        }))
        .unwrap();

        assert_eq!(json["text"], "hello");
        assert!(json["readAt"].is_null());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["author"]["name"], "Ann");
    }

    #[test]
    fn list_params_accept_is_active() {
        let params: SupportListParams =
            serde_json::from_str(r#"{"isActive":false,"limit":5}"#).unwrap();
        assert_eq!(params.is_active, Some(false));
        assert_eq!(params.page().limit, 5);
        assert_eq!(params.page().offset, 0);
    }

    async fn db_state() -> Arc<AppState> {
        let pool = testing::pool().await;
        Arc::new(AppState::new(pool, &ServerConfig::default()))
    }

    fn body(text: &str) -> Json<MessageRequest> {
        Json(MessageRequest { text: text.into() })
    }

    async fn open_request(state: &Arc<AppState>, client: &User) -> Uuid {
        let (status, Json(created)) = create_request(
            CurrentUser(client.clone()),
            State(state.clone()),
            body("the shower is cold"),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        created.id
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn sending_to_closed_request_is_rejected() {
        let state = db_state().await;
        let client = testing::user(&state.pool, Role::Client).await;
        let manager = testing::user(&state.pool, Role::Manager).await;
        let id = open_request(&state, &client).await;

        close_request(CurrentUser(manager.clone()), State(state.clone()), ValidUuid(id))
            .await
            .unwrap();

        for sender in [client, manager] {
            let result = send_message(
                CurrentUser(sender),
                State(state.clone()),
                ValidUuid(id),
                body("still there?"),
            )
            .await;
            match result {
                Err(err @ ApiError::BadRequest { .. }) => {
                    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST)
                }
                Err(other) => panic!("expected bad request, got {:?}", other),
                Ok(_) => panic!("message accepted on a closed request"),
            }
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn other_clients_request_looks_missing() {
        let state = db_state().await;
        let owner = testing::user(&state.pool, Role::Client).await;
        let stranger = testing::user(&state.pool, Role::Client).await;
        let id = open_request(&state, &owner).await;
        let who = || CurrentUser(stranger.clone());

        let sent = send_message(who(), State(state.clone()), ValidUuid(id), body("hi")).await;
        assert!(matches!(sent, Err(ApiError::NotFound { resource: "support request", .. })));

        let listed = list_messages(who(), State(state.clone()), ValidUuid(id)).await;
        assert!(matches!(listed, Err(ApiError::NotFound { .. })));

        let read = mark_messages_read(
            who(),
            State(state.clone()),
            ValidUuid(id),
            Json(MarkReadRequest {
                created_before: Utc::now(),
            }),
        )
        .await;
        assert!(matches!(read, Err(ApiError::NotFound { .. })));

        let events = message_events(who(), State(state.clone()), ValidUuid(id)).await;
        assert!(matches!(events, Err(ApiError::NotFound { .. })));

        // Nothing leaked into the owner's conversation
        let Json(messages) =
            list_messages(CurrentUser(owner), State(state.clone()), ValidUuid(id))
                .await
                .unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn manager_reading_clears_new_flag() {
        let state = db_state().await;
        let client = testing::user(&state.pool, Role::Client).await;
        let manager = testing::user(&state.pool, Role::Manager).await;
        let id = open_request(&state, &client).await;

        let flag = |rows: Vec<ManagerRequestResponse>| {
            rows.into_iter()
                .find(|r| r.id == id)
                .map(|r| r.has_new_messages)
                .expect("request listed")
        };
        let params = || {
            Query(SupportListParams {
                is_active: Some(true),
                limit: Some(500),
                offset: None,
            })
        };

        let Json(before) =
            list_manager_requests(CurrentUser(manager.clone()), State(state.clone()), params())
                .await
                .unwrap();
        assert!(flag(before));

        mark_messages_read(
            CurrentUser(manager.clone()),
            State(state.clone()),
            ValidUuid(id),
            Json(MarkReadRequest {
                created_before: Utc::now(),
            }),
        )
        .await
        .unwrap();

        let Json(after) = list_manager_requests(CurrentUser(manager), State(state.clone()), params())
            .await
            .unwrap();
        assert!(!flag(after));
    }

    #[test]
    fn mark_read_parses_timestamp() {
        let req: MarkReadRequest =
            serde_json::from_str(r#"{"createdBefore":"2024-05-01T10:00:00Z"}"#).unwrap();
        assert_eq!(req.created_before.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }
}
