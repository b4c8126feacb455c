//! Hotel repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{contains_pattern, DbError};
use crate::models::{Pagination, Title};

/// Hotel record from database
#[derive(Debug, Clone, FromRow)]
pub struct Hotel {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hotel repository
pub struct HotelRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> HotelRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, title: Title, description: Option<String>) -> Result<Hotel, DbError> {
        let hotel = sqlx::query_as::<_, Hotel>(
            r#"
            INSERT INTO hotels (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(title.as_str())
        .bind(description.as_deref())
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(hotel_id = %hotel.id, "hotel created");
        Ok(hotel)
    }

    /// List hotels in creation order, optionally filtered by title substring.
    pub async fn search(&self, title: Option<&str>, page: Pagination) -> Result<Vec<Hotel>, DbError> {
        let hotels = sqlx::query_as::<_, Hotel>(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM hotels
            WHERE ($1::text IS NULL OR title ILIKE $1)
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(title.map(contains_pattern))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(hotels)
    }

    /// Replace title and description.
    pub async fn update(
        &self,
        id: Uuid,
        title: Title,
        description: Option<String>,
    ) -> Result<Hotel, DbError> {
        sqlx::query_as::<_, Hotel>(
            r#"
            UPDATE hotels
            SET title = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title.as_str())
        .bind(description.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "hotel",
            id: id.to_string(),
        })
    }
}
