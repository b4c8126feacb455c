//! User repository
//!
//! Users are the authors of support messages and the owners of support
//! requests; the HTTP layer also resolves the caller's role through here.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::{contains_pattern, DbError};
use crate::models::{Email, Pagination, Role, ValidationError};

/// User record from database
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub contact_phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse::<Role>()
            .map_err(|e: ValidationError| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            contact_phone: row.try_get("contact_phone")?,
            role,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Fields for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub contact_phone: Option<String>,
    pub role: Role,
}

/// Substring filters for user search; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub email: Option<String>,
    pub name: Option<String>,
    pub contact_phone: Option<String>,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user. A taken email yields `DbError::Conflict`.
    pub async fn create(&self, user: NewUser) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, contact_phone, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, contact_phone, role, created_at
            "#,
        )
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(user.contact_phone.as_deref())
        .bind(user.role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            DbError::conflict_on_unique(e, format!("email '{}' is already registered", user.email.as_str()))
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, contact_phone, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "user",
            id: id.to_string(),
        })
    }

    /// Search users; all filters are case-insensitive substring matches.
    pub async fn search(&self, filter: &UserFilter, page: Pagination) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, contact_phone, role, created_at
            FROM users
            WHERE ($1::text IS NULL OR email ILIKE $1)
              AND ($2::text IS NULL OR name ILIKE $2)
              AND ($3::text IS NULL OR contact_phone ILIKE $3)
            ORDER BY created_at ASC, id ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.email.as_deref().map(contains_pattern))
        .bind(filter.name.as_deref().map(contains_pattern))
        .bind(filter.contact_phone.as_deref().map(contains_pattern))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }
}
