//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows the same patterns:
//! - JOINs assemble response shapes in one query
//! - Unique violations surface as `DbError::Conflict`
//! - Multi-step writes run in a transaction

pub mod users;
pub mod hotels;
pub mod rooms;
pub mod support;

pub use users::{NewUser, User, UserFilter, UserRepo};
pub use hotels::{Hotel, HotelRepo};
pub use rooms::{NewRoom, RoomRepo, RoomSearch, RoomUpdate, RoomWithHotel};
pub use support::{
    ClientRequestSummary, ManagerRequestSummary, MessageWithAuthor, ReaderSide,
    SupportRepo, SupportRequest,
};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{resource} '{id}' is closed")]
    Closed { resource: &'static str, id: String },
}

impl DbError {
    /// Map a unique-constraint violation to `Conflict`, pass everything else through.
    pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(message.into()),
            _ => Self::Sqlx(err),
        }
    }
}

/// Build a case-insensitive substring pattern for ILIKE, escaping wildcards.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
