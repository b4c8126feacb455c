//! Database layer - connection pool, migrations and repositories
//!
//! - Connection pool, no Arc<Mutex<Connection>>
//! - Response shapes are assembled with JOINs, not per-row lookups
//! - Rely on DB constraints, map unique violations to conflicts
//! - Transactions for multi-step writes

pub mod pool;
pub mod migrations;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
pub use sqlx::PgPool;
