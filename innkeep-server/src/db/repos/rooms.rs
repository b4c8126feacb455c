//! Hotel room repository
//!
//! Every read returns the room joined with its hotel, so handlers never
//! issue a second lookup.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::DbError;
use crate::models::{Pagination, Title};

/// Room record joined with its hotel
#[derive(Debug, Clone, FromRow)]
pub struct RoomWithHotel {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub hotel_id: Uuid,
    pub hotel_title: String,
    pub hotel_description: Option<String>,
}

/// Fields for a new room
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub hotel_id: Uuid,
    pub title: Title,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_enabled: bool,
}

/// Room changes; `None` keeps the stored value, `images` always replaces.
#[derive(Debug, Clone)]
pub struct RoomUpdate {
    pub hotel_id: Option<Uuid>,
    pub title: Option<Title>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub is_enabled: Option<bool>,
}

/// Room search filters
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomSearch {
    pub hotel_id: Option<Uuid>,
    pub is_enabled: Option<bool>,
}

const ROOM_COLUMNS: &str = r#"
    r.id, r.title, r.description, r.images, r.is_enabled, r.created_at, r.updated_at,
    h.id AS hotel_id, h.title AS hotel_title, h.description AS hotel_description
"#;

/// Room repository
pub struct RoomRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> RoomRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a room under an existing hotel.
    pub async fn create(&self, room: NewRoom) -> Result<RoomWithHotel, DbError> {
        let mut tx = self.pool.begin().await?;
        ensure_hotel(&mut tx, room.hotel_id).await?;

        let query = format!(
            r#"
            WITH r AS (
                INSERT INTO hotel_rooms (hotel_id, title, description, images, is_enabled)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {ROOM_COLUMNS}
            FROM r
            JOIN hotels h ON h.id = r.hotel_id
            "#
        );
        let created = sqlx::query_as::<_, RoomWithHotel>(&query)
            .bind(room.hotel_id)
            .bind(room.title.as_str())
            .bind(room.description.as_deref())
            .bind(&room.images)
            .bind(room.is_enabled)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(room_id = %created.id, hotel_id = %created.hotel_id, "room created");
        Ok(created)
    }

    /// Apply an update and return the joined room.
    pub async fn update(&self, id: Uuid, update: RoomUpdate) -> Result<RoomWithHotel, DbError> {
        let mut tx = self.pool.begin().await?;
        if let Some(hotel_id) = update.hotel_id {
            ensure_hotel(&mut tx, hotel_id).await?;
        }

        let query = format!(
            r#"
            WITH r AS (
                UPDATE hotel_rooms
                SET hotel_id = COALESCE($2, hotel_id),
                    title = COALESCE($3, title),
                    description = COALESCE($4, description),
                    images = $5,
                    is_enabled = COALESCE($6, is_enabled),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {ROOM_COLUMNS}
            FROM r
            JOIN hotels h ON h.id = r.hotel_id
            "#
        );
        let updated = sqlx::query_as::<_, RoomWithHotel>(&query)
            .bind(id)
            .bind(update.hotel_id)
            .bind(update.title.as_ref().map(Title::as_str))
            .bind(update.description.as_deref())
            .bind(&update.images)
            .bind(update.is_enabled)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "hotel room",
                id: id.to_string(),
            })?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn get(&self, id: Uuid) -> Result<RoomWithHotel, DbError> {
        let query = format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM hotel_rooms r
            JOIN hotels h ON h.id = r.hotel_id
            WHERE r.id = $1
            "#
        );
        sqlx::query_as::<_, RoomWithHotel>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "hotel room",
                id: id.to_string(),
            })
    }

    /// List rooms in creation order.
    pub async fn search(&self, filter: RoomSearch, page: Pagination) -> Result<Vec<RoomWithHotel>, DbError> {
        let query = format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM hotel_rooms r
            JOIN hotels h ON h.id = r.hotel_id
            WHERE ($1::uuid IS NULL OR r.hotel_id = $1)
              AND ($2::bool IS NULL OR r.is_enabled = $2)
            ORDER BY r.created_at ASC, r.id ASC
            LIMIT $3 OFFSET $4
            "#
        );
        let rooms = sqlx::query_as::<_, RoomWithHotel>(&query)
            .bind(filter.hotel_id)
            .bind(filter.is_enabled)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(rooms)
    }
}

async fn ensure_hotel(tx: &mut Transaction<'_, Postgres>, hotel_id: Uuid) -> Result<(), DbError> {
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM hotels WHERE id = $1)")
        .bind(hotel_id)
        .fetch_one(&mut **tx)
        .await?;

    if !exists.0 {
        return Err(DbError::NotFound {
            resource: "hotel",
            id: hotel_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{testing, HotelRepo};

    async fn hotel(pool: &PgPool) -> Uuid {
        HotelRepo::new(pool)
            .create(Title::new("Room Test Hotel").unwrap(), None)
            .await
            .unwrap()
            .id
    }

    fn new_room(hotel_id: Uuid, title: &str, is_enabled: bool) -> NewRoom {
        NewRoom {
            hotel_id,
            title: Title::new(title).unwrap(),
            description: None,
            images: vec!["rooms-imgs/a-0f0f.jpg".into()],
            is_enabled,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_joins_hotel() {
        let pool = testing::pool().await;
        let hotel_id = hotel(&pool).await;

        let room = RoomRepo::new(&pool)
            .create(new_room(hotel_id, "Suite", true))
            .await
            .unwrap();

        assert_eq!(room.hotel_id, hotel_id);
        assert_eq!(room.hotel_title, "Room Test Hotel");
        assert_eq!(room.images, vec!["rooms-imgs/a-0f0f.jpg".to_string()]);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_under_missing_hotel() {
        let pool = testing::pool().await;
        let err = RoomRepo::new(&pool)
            .create(new_room(Uuid::new_v4(), "Orphan", true))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "hotel", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn search_hides_disabled_rooms() {
        let pool = testing::pool().await;
        let hotel_id = hotel(&pool).await;
        let repo = RoomRepo::new(&pool);
        let shown = repo.create(new_room(hotel_id, "Shown", true)).await.unwrap();
        repo.create(new_room(hotel_id, "Hidden", false)).await.unwrap();

        let rooms = repo
            .search(
                RoomSearch {
                    hotel_id: Some(hotel_id),
                    is_enabled: Some(true),
                },
                Pagination::default(),
            )
            .await
            .unwrap();

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, shown.id);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_replaces_images_and_keeps_title() {
        let pool = testing::pool().await;
        let hotel_id = hotel(&pool).await;
        let repo = RoomRepo::new(&pool);
        let room = repo.create(new_room(hotel_id, "Twin", true)).await.unwrap();

        let updated = repo
            .update(
                room.id,
                RoomUpdate {
                    hotel_id: None,
                    title: None,
                    description: Some("sea view".into()),
                    images: vec!["rooms-imgs/b-1234.png".into()],
                    is_enabled: Some(false),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Twin");
        assert_eq!(updated.description.as_deref(), Some("sea view"));
        assert_eq!(updated.images, vec!["rooms-imgs/b-1234.png".to_string()]);
        assert!(!updated.is_enabled);
    }
}
