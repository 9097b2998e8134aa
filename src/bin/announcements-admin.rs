/// Operator tasks that have no HTTP endpoint: managing teacher accounts and
/// purging expired announcements.
///
/// Usage:
///   announcements-admin add-teacher USERNAME [--display-name NAME]
///   announcements-admin remove-teacher USERNAME
///   announcements-admin purge-expired [--dry-run]
///
/// Reads DATABASE_URL from the environment (or .env).

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use announcements_api::{
    config::required,
    db::{self, PgStore},
    services::announcements::AnnouncementService,
};

#[derive(Parser)]
#[command(name = "announcements-admin", about = "Administer the announcements database")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a teacher account, or update its display name
    AddTeacher {
        username: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Remove a teacher account; their announcements are kept
    RemoveTeacher { username: String },
    /// Delete announcements whose expiration date has passed
    PurgeExpired {
        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = required("DATABASE_URL")?;
    let pool = db::create_pool(&database_url, 5)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool));

    match args.command {
        Command::AddTeacher {
            username,
            display_name,
        } => {
            anyhow::ensure!(!username.is_empty(), "username must not be empty");
            let teacher = store
                .upsert_teacher(&username, display_name.as_deref())
                .await?;
            tracing::info!("Teacher {} saved", teacher.username);
        }
        Command::RemoveTeacher { username } => {
            if store.remove_teacher(&username).await? {
                tracing::info!("Teacher {} removed", username);
            } else {
                tracing::warn!("No teacher named {}", username);
            }
        }
        Command::PurgeExpired { dry_run } => {
            let service = AnnouncementService::new(store.clone(), store);
            let ids = service.purge_expired(Utc::now(), dry_run).await?;
            let verb = if dry_run { "Would delete" } else { "Deleted" };
            for id in &ids {
                tracing::info!("{verb} expired announcement {id}");
            }
            tracing::info!("Purge completed: {} announcement(s)", ids.len());
        }
    }

    Ok(())
}
