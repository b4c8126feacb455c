//! User management command
//!
//! `innkeep user add --role admin` is how the first admin account is made;
//! after that, admins can create users over HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use innkeep_server::db::repos::{NewUser, UserFilter, UserRepo};
use innkeep_server::models::{Email, Pagination, Role};

use super::DatabaseArgs;

/// Arguments for the user command
#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user account
    Add {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Email address (unique)
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Contact phone number
        #[arg(long)]
        phone: Option<String>,

        /// Role: client, manager or admin
        #[arg(long, default_value = "client")]
        role: Role,
    },
    /// List user accounts
    List {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Only users whose email contains this text
        #[arg(long)]
        email: Option<String>,

        /// Maximum number of users to show
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
}

pub async fn run_user(args: UserArgs) -> Result<()> {
    match args.command {
        UserCommand::Add {
            db,
            email,
            name,
            phone,
            role,
        } => {
            let email = Email::new(&email).context("Invalid email")?;
            anyhow::ensure!(!name.trim().is_empty(), "Name cannot be empty");

            let pool = db.connect().await?;
            let user = UserRepo::new(&pool)
                .create(NewUser {
                    email,
                    name: name.trim().to_owned(),
                    contact_phone: phone,
                    role,
                })
                .await
                .context("Failed to create user")?;

            tracing::info!(user_id = %user.id, "user created");
            println!("{}\t{}\t{}", user.id, user.role, user.email);
        }
        UserCommand::List { db, email, limit } => {
            let pool = db.connect().await?;
            let filter = UserFilter {
                email,
                ..UserFilter::default()
            };
            let users = UserRepo::new(&pool)
                .search(&filter, Pagination::new(limit, 0))
                .await
                .context("Failed to list users")?;

            for user in users {
                println!("{}\t{}\t{}\t{}", user.id, user.role, user.email, user.name);
            }
        }
    }
    Ok(())
}
