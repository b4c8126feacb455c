//! innkeep CLI - hotel booking backend
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create or update the database schema
//! - `user`: manage accounts without going through the API (e.g. the first admin)

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "innkeep",
    author,
    version,
    about = "Hotel catalog and customer support API",
    long_about = "Serve the innkeep HTTP API (hotels, rooms, room images, support chat) \
                  and administer its PostgreSQL database."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply database migrations and exit
    Migrate(commands::migrate::MigrateArgs),
    /// Manage user accounts
    User(commands::user::UserArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::User(args) => commands::run_user(args).await?,
    }
    Ok(())
}
