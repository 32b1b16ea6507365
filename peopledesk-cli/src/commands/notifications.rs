use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use client::{ApiClient, CredentialStore, NotificationStore};
use shared::models::NotificationCategory;

use super::session;

#[derive(Args, Debug)]
#[command(about = "Show unread notification counters")]
pub struct NotificationArgs {
    /// Mark every category read after displaying
    #[arg(long)]
    pub mark_read: bool,

    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// PeopleDesk server base URL (default: <http://localhost:8080>)
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,
}

pub async fn run(args: NotificationArgs) -> Result<()> {
    let config = session::load_config(args.config, &args.server)?;

    let credentials = CredentialStore::new();
    credentials.store(
        session::load_session()
            .context("no active session found; run `peopledesk session login` first")?,
    );
    let client = ApiClient::new(&config, credentials)?;

    let store = NotificationStore::new();
    let counts = store
        .refresh(&client)
        .await
        .context("failed to fetch notification counters")?;

    for category in NotificationCategory::ALL {
        println!("{:<14} {}", category.to_string(), counts.get(category));
    }
    println!("{:<14} {}", "total", counts.total());

    if args.mark_read {
        store
            .sync_mark_all_read(&client)
            .await
            .context("failed to mark notifications read")?;
        println!("All notifications marked read.");
    }

    Ok(())
}
