//! Main entry point for the PeopleDesk command-line client.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::error::Error;

mod commands;

/// PeopleDesk CLI
#[derive(Parser)]
#[command(name = "PeopleDesk CLI")]
#[command(about = "Command-line client for the PeopleDesk HR platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the PeopleDesk CLI
#[derive(Subcommand)]
enum Commands {
    /// Manage the authenticated session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Show conversation history and follow live messages
    Chat(commands::chat::ChatArgs),

    /// Show or reset notification counters
    Notifications(commands::notifications::NotificationArgs),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: String,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },
}

/// Session management subcommands
#[derive(Subcommand)]
enum SessionCommands {
    /// Sign in and store the session token
    Login(commands::session::LoginArgs),
    /// Validate the stored session and show the signed-in user
    Me(commands::session::MeArgs),
    /// Sign out and remove the stored token
    Logout(commands::session::LogoutArgs),
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Session { command } => match command {
            SessionCommands::Login(args) => commands::session::login(args).await?,
            SessionCommands::Me(args) => commands::session::me(args).await?,
            SessionCommands::Logout(args) => commands::session::logout(args).await?,
        },
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Notifications(args) => commands::notifications::run(args).await?,
        Commands::Completion { shell } => {
            let shell = shell
                .parse::<clap_complete::Shell>()
                .expect("Invalid shell type provided");
            commands::completion::generate_completion(shell);
        }
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            commands::config::generate_config(&format)?;
        }
    }

    Ok(())
}
