//! Command implementations for the innkeep CLI

pub mod migrate;
pub mod serve;
pub mod user;

pub use migrate::run_migrate;
pub use serve::run_serve;
pub use user::run_user;

use anyhow::{Context, Result};
use clap::Args;
use innkeep_server::db::create_pool_with_options;
use innkeep_server::db::PgPool;

/// Database connection flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "INNKEEP_DB_MAX_CONNECTIONS", default_value_t = innkeep_server::db::pool::DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    /// Connect, failing with a hint when no URL was configured.
    pub async fn connect(&self) -> Result<PgPool> {
        let url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        create_pool_with_options(url, self.max_connections)
            .await
            .context("Failed to create database pool")
    }
}
