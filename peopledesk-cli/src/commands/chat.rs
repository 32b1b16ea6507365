use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use client::{
    ApiClient, AuthEvent, ChannelOptions, ChatStore, CredentialStore, MonitorOptions,
    RealtimeChannel, SessionMonitor,
};
use shared::config::Config;
use shared::models::{ChatMessage, Timestamp};
use tokio::io::AsyncBufReadExt;

use super::session;

#[derive(Args, Debug)]
#[command(about = "Show conversation history and follow live messages")]
pub struct ChatArgs {
    /// Counterpart user id to open the conversation with
    #[arg(long, alias = "user")]
    pub with: i64,

    /// Maximum number of history messages to display
    #[arg(long)]
    pub limit: Option<usize>,

    /// Keep the conversation open and follow live messages
    #[arg(long)]
    pub follow: bool,

    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// PeopleDesk server base URL (default: <http://localhost:8080>)
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,
}

pub async fn run(args: ChatArgs) -> Result<()> {
    let config = session::load_config(args.config.clone(), &args.server)?;

    let credentials = CredentialStore::new();
    let stored =
        session::load_session().context("no active session found; run `peopledesk session login` first")?;
    credentials.store(stored);
    let local_id = credentials
        .local_user_id()
        .ok_or_else(|| anyhow!("stored session has no user"))?;
    let client = ApiClient::new(&config, credentials.clone())?;

    let store = ChatStore::new();
    store.set_local_user(local_id);

    let history = client
        .history(args.with)
        .await
        .context("failed to fetch history")?;
    for message in history {
        store.add_message(message);
    }
    render_history(&store.conversation(args.with), args.limit, local_id);

    match client.mark_read(args.with).await {
        Ok(marked) if marked.updated > 0 => {
            println!("({} messages marked read)", marked.updated);
        }
        Ok(_) => {}
        Err(err) => eprintln!("warning: failed to mark conversation read: {err}"),
    }

    if !args.follow {
        return Ok(());
    }
    follow(args.with, local_id, &config, &credentials, &client, &store).await
}

/// Keep the conversation open: live messages stream in over the realtime
/// channel while stdin lines go out through the store's registered sender.
async fn follow(
    counterpart: i64,
    local_id: i64,
    config: &Config,
    credentials: &CredentialStore,
    client: &ApiClient,
    store: &ChatStore,
) -> Result<()> {
    let mut monitor = SessionMonitor::spawn(
        client.clone(),
        MonitorOptions {
            enabled: true,
            poll_interval: Duration::from_millis(config.session_poll_interval_ms),
        },
    );

    let token = credentials
        .token()
        .ok_or_else(|| anyhow!("stored session has no token"))?;
    let channel = RealtimeChannel::connect(
        &config.realtime_url,
        &token,
        ChannelOptions {
            heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
        },
    )
    .await
    .context("realtime connection failed")?;

    let inbound_store = store.clone();
    channel.set_handler(move |value| match serde_json::from_value::<ChatMessage>(value) {
        Ok(message) => {
            if message.counterpart(local_id) == counterpart {
                println!("{}", render_line(&message, local_id));
            }
            inbound_store.add_message(message);
        }
        Err(err) => tracing::debug!(error = %err, "ignoring unrecognized realtime payload"),
    });

    let sender = channel.sender();
    store.register_sender(move |message| sender.send_message(message));

    println!("Connected. Type a message and press Enter to send (Ctrl+D to stop).");

    let mut events = credentials.subscribe();
    let mut state = channel.state_watch();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(AuthEvent::SessionExpired | AuthEvent::ForcedLogout) => {
                        eprintln!("session expired; signing out");
                        break;
                    }
                    Ok(AuthEvent::LoggedOut) | Err(_) => break,
                }
            }
            changed = state.changed() => {
                if changed.is_err() || !channel.is_open() {
                    eprintln!("realtime connection closed; run the command again to reconnect");
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                let message = ChatMessage {
                    id: None,
                    sender_id: local_id,
                    receiver_id: counterpart,
                    content: text.to_string(),
                    timestamp: Timestamp(chrono::Utc::now()),
                };
                // No optimistic echo: the line shows up when the server
                // pushes the message back on the inbound path.
                if let Err(err) = store.send(&message) {
                    eprintln!("warning: message not sent: {err}");
                }
            }
        }
    }

    channel.close();
    monitor.shutdown();
    Ok(())
}

fn render_line(message: &ChatMessage, local_id: i64) -> String {
    let who = if message.sender_id == local_id {
        "me".to_string()
    } else {
        format!("user {}", message.sender_id)
    };
    format!(
        "[{}] {}: {}",
        message.timestamp.0.format("%Y-%m-%d %H:%M:%S"),
        who,
        message.content
    )
}

fn render_history(messages: &[ChatMessage], limit: Option<usize>, local_id: i64) {
    if messages.is_empty() {
        println!("No messages yet.");
        return;
    }

    let start = limit.map_or(0, |limit| messages.len().saturating_sub(limit));
    for message in &messages[start..] {
        println!("{}", render_line(message, local_id));
    }
}
