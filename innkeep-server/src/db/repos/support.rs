//! Support request repository
//!
//! A support request belongs to one client and carries an ordered list of
//! messages written by the client or by managers. Listing queries compute
//! `has_new_messages` per request instead of a second pass over messages.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;
use crate::models::{MessageText, Pagination};

/// Support request record
#[derive(Debug, Clone, FromRow)]
pub struct SupportRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request summary as the owning client sees it
#[derive(Debug, Clone, FromRow)]
pub struct ClientRequestSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub has_new_messages: bool,
}

/// Request summary as a manager sees it, client joined in
#[derive(Debug, Clone, FromRow)]
pub struct ManagerRequestSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub has_new_messages: bool,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_contact_phone: Option<String>,
}

/// Message joined with its author's name
#[derive(Debug, Clone, FromRow)]
pub struct MessageWithAuthor {
    pub id: Uuid,
    pub support_request_id: Uuid,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub author_name: String,
}

/// Which side of the conversation is reading.
///
/// Each side only marks the *other* side's messages as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderSide {
    /// The client who opened the request
    Client,
    /// Support staff
    Staff,
}

impl ReaderSide {
    /// Whether the messages this side reads were written by the client.
    fn reads_client_messages(self) -> bool {
        matches!(self, Self::Staff)
    }
}

const MESSAGE_COLUMNS: &str = r#"
    m.id, m.support_request_id, m.text, m.sent_at, m.read_at,
    u.id AS author_id, u.name AS author_name
"#;

/// Support repository
pub struct SupportRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SupportRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Open a request with its first message (atomic).
    pub async fn create_request(
        &self,
        user_id: Uuid,
        text: MessageText,
    ) -> Result<ClientRequestSummary, DbError> {
        let mut tx = self.pool.begin().await?;

        let request: SupportRequest = sqlx::query_as(
            r#"
            INSERT INTO support_requests (user_id)
            VALUES ($1)
            RETURNING id, user_id, is_active, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO support_messages (support_request_id, author_id, text)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(request.id)
        .bind(user_id)
        .bind(text.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(request_id = %request.id, %user_id, "support request opened");

        Ok(ClientRequestSummary {
            id: request.id,
            created_at: request.created_at,
            is_active: request.is_active,
            has_new_messages: false,
        })
    }

    pub async fn get_request(&self, id: Uuid) -> Result<SupportRequest, DbError> {
        sqlx::query_as::<_, SupportRequest>(
            "SELECT id, user_id, is_active, created_at FROM support_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "support request",
            id: id.to_string(),
        })
    }

    /// Requests opened by one client, newest first.
    ///
    /// `has_new_messages` is set when staff wrote something the client has not read.
    pub async fn list_for_client(
        &self,
        user_id: Uuid,
        is_active: Option<bool>,
        page: Pagination,
    ) -> Result<Vec<ClientRequestSummary>, DbError> {
        let rows = sqlx::query_as::<_, ClientRequestSummary>(
            r#"
            SELECT
                r.id,
                r.created_at,
                r.is_active,
                EXISTS (
                    SELECT 1 FROM support_messages m
                    WHERE m.support_request_id = r.id
                      AND m.read_at IS NULL
                      AND m.author_id <> r.user_id
                ) AS has_new_messages
            FROM support_requests r
            WHERE r.user_id = $1
              AND ($2::bool IS NULL OR r.is_active = $2)
            ORDER BY r.created_at DESC, r.id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// All requests with their client, newest first.
    ///
    /// `has_new_messages` is set when the client wrote something staff has not read.
    pub async fn list_for_manager(
        &self,
        is_active: Option<bool>,
        page: Pagination,
    ) -> Result<Vec<ManagerRequestSummary>, DbError> {
        let rows = sqlx::query_as::<_, ManagerRequestSummary>(
            r#"
            SELECT
                r.id,
                r.created_at,
                r.is_active,
                EXISTS (
                    SELECT 1 FROM support_messages m
                    WHERE m.support_request_id = r.id
                      AND m.read_at IS NULL
                      AND m.author_id = r.user_id
                ) AS has_new_messages,
                u.id AS client_id,
                u.name AS client_name,
                u.email AS client_email,
                u.contact_phone AS client_contact_phone
            FROM support_requests r
            JOIN users u ON u.id = r.user_id
            WHERE ($1::bool IS NULL OR r.is_active = $1)
            ORDER BY r.created_at DESC, r.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(is_active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Append a message to an active request and return it with the author's name.
    ///
    /// The active check and the insert are one statement, so a concurrent
    /// close either lands first (`DbError::Closed`) or after the message.
    pub async fn add_message(
        &self,
        request_id: Uuid,
        author_id: Uuid,
        text: MessageText,
    ) -> Result<MessageWithAuthor, DbError> {
        let query = format!(
            r#"
            WITH m AS (
                INSERT INTO support_messages (support_request_id, author_id, text)
                SELECT r.id, $2::uuid, $3::text
                FROM support_requests r
                WHERE r.id = $1 AND r.is_active
                RETURNING *
            )
            SELECT {MESSAGE_COLUMNS}
            FROM m
            JOIN users u ON u.id = m.author_id
            "#
        );
        sqlx::query_as::<_, MessageWithAuthor>(&query)
            .bind(request_id)
            .bind(author_id)
            .bind(text.as_str())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::Closed {
                resource: "support request",
                id: request_id.to_string(),
            })
    }

    /// Every message of a request in the order it was sent.
    pub async fn list_messages(&self, request_id: Uuid) -> Result<Vec<MessageWithAuthor>, DbError> {
        let query = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM support_messages m
            JOIN users u ON u.id = m.author_id
            WHERE m.support_request_id = $1
            ORDER BY m.sent_at ASC, m.id ASC
            "#
        );
        let messages = sqlx::query_as::<_, MessageWithAuthor>(&query)
            .bind(request_id)
            .fetch_all(self.pool)
            .await?;

        Ok(messages)
    }

    /// Mark the other side's unread messages sent up to `created_before` as read.
    ///
    /// Returns the number of messages marked.
    pub async fn mark_read(
        &self,
        request_id: Uuid,
        reader: ReaderSide,
        created_before: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE support_messages m
            SET read_at = NOW()
            FROM support_requests r
            WHERE r.id = m.support_request_id
              AND m.support_request_id = $1
              AND m.read_at IS NULL
              AND m.sent_at <= $3
              AND (m.author_id = r.user_id) = $2
            "#,
        )
        .bind(request_id)
        .bind(reader.reads_client_messages())
        .bind(created_before)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Close a request; closing twice is harmless.
    pub async fn close(&self, request_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE support_requests SET is_active = FALSE WHERE id = $1")
            .bind(request_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "support request",
                id: request_id.to_string(),
            });
        }
        Ok(())
    }
}
