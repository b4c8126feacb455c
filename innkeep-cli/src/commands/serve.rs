//! HTTP server command

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use innkeep_server::db::migrations;
use innkeep_server::http::{run_server, ServerConfig};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Address to bind to
    #[arg(long, short = 'b', env = "INNKEEP_BIND", default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long, env = "INNKEEP_CORS_PERMISSIVE")]
    pub cors_permissive: bool,

    /// Directory room images are stored in
    #[arg(long, env = "INNKEEP_UPLOAD_DIR", default_value = "./rooms-imgs")]
    pub upload_dir: PathBuf,

    /// Maximum request body size in MiB (covers image uploads)
    #[arg(long, env = "INNKEEP_BODY_LIMIT_MB", default_value_t = 50)]
    pub body_limit_mb: usize,

    /// Skip applying migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: self.cors_permissive,
            upload_dir: self.upload_dir.clone(),
            body_limit: self.body_limit_mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Run the HTTP server (blocks until shutdown)
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    tracing::info!("Starting innkeep server on {}", args.bind);

    let pool = args.db.connect().await?;
    if args.skip_migrations {
        tracing::info!("Skipping migrations");
    } else {
        migrations::run(&pool)
            .await
            .context("Failed to apply migrations")?;
    }

    run_server(pool, args.server_config())
        .await
        .context("Server error")?;

    Ok(())
}
