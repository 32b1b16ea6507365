use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use client::{ApiClient, CredentialStore, Session};
use directories::BaseDirs;
use rpassword::prompt_password;
use shared::{
    config::Config,
    models::{AuthenticatedUser, LoginRequest},
};
use url::Url;

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// PeopleDesk server base URL (default: <http://localhost:8080>)
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,
}

#[derive(Args, Debug)]
pub struct MeArgs {
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// PeopleDesk server base URL (default: <http://localhost:8080>)
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// PeopleDesk server base URL (default: <http://localhost:8080>)
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let config = load_config(args.config, &args.server)?;
    ensure_parent(&token_path())?;

    let email = prompt("Email: ")?;
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let credentials = CredentialStore::new();
    let client = ApiClient::new(&config, credentials.clone())?;
    let user = client
        .login(&LoginRequest { email, password })
        .await
        .context("login failed")?;

    let token = credentials
        .token()
        .ok_or_else(|| anyhow!("login did not produce a token"))?;
    persist_session(&token, &user)?;
    print_session_summary(&user);
    Ok(())
}

pub async fn me(args: MeArgs) -> Result<()> {
    let config = load_config(args.config, &args.server)?;

    let credentials = CredentialStore::new();
    let session =
        load_session().context("no active session found; run `peopledesk session login` first")?;
    let token = session.token.clone();
    credentials.store(session);
    let client = ApiClient::new(&config, credentials)?;

    client.session_status().await.map_err(|err| {
        if err.is_unauthorized() {
            anyhow!("session expired. run `peopledesk session login` to sign in again")
        } else {
            anyhow!(err).context("session check failed")
        }
    })?;

    let user = client.profile().await.context("profile fetch failed")?;
    persist_session(&token, &user)?;
    print_session_summary(&user);
    Ok(())
}

pub async fn logout(args: LogoutArgs) -> Result<()> {
    let config = load_config(args.config, &args.server)?;

    match load_session() {
        Ok(session) => {
            let credentials = CredentialStore::new();
            credentials.store(session);
            let client = ApiClient::new(&config, credentials)?;
            if let Err(err) = client.logout().await {
                eprintln!("warning: logout request failed: {err}");
            }
        }
        Err(err) => {
            eprintln!("warning: {err}");
        }
    }

    clear_session_files()?;
    Ok(())
}

/// Resolve configuration with the `--server` argument overriding both the
/// REST base and the derived realtime endpoint.
pub fn load_config(config_path: Option<PathBuf>, server: &str) -> Result<Config> {
    let server_url = Url::parse(server).context("invalid server URL")?;
    Ok(Config::load_config(config_path, Some(server_url))?)
}

fn session_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("peopledesk"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn token_path() -> PathBuf {
    session_dir().join("session.token")
}

pub fn user_path() -> PathBuf {
    session_dir().join("session.user")
}

/// Rebuild the stored session from the token and cached-user files.
pub fn load_session() -> Result<Session> {
    let token_path = token_path();
    if !token_path.exists() {
        bail!("session token not found at {}", token_path.display());
    }

    let token = fs::read_to_string(&token_path)
        .with_context(|| format!("failed to read session token {}", token_path.display()))?
        .trim()
        .to_string();
    let user_raw = fs::read_to_string(user_path())
        .with_context(|| format!("failed to read cached user {}", user_path().display()))?;
    let user: AuthenticatedUser =
        serde_json::from_str(&user_raw).context("cached session user is corrupt")?;

    Ok(Session { token, user })
}

/// Write the token and cached-user files, the CLI's stand-in for the web
/// client's tab storage.
pub fn persist_session(token: &str, user: &AuthenticatedUser) -> Result<()> {
    let token_path = token_path();
    ensure_parent(&token_path)?;
    fs::write(&token_path, token.as_bytes())
        .with_context(|| format!("failed to write session token at {}", token_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&token_path, fs::Permissions::from_mode(0o600))
            .context("failed to set session token permissions")?;
    }

    let user_path = user_path();
    fs::write(&user_path, serde_json::to_string_pretty(user)?)
        .with_context(|| format!("failed to write cached user at {}", user_path.display()))?;
    Ok(())
}

/// Remove both session files; missing files are fine.
pub fn clear_session_files() -> Result<()> {
    for path in [token_path(), user_path()] {
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            println!("Removed {}", path.display());
        }
    }
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create session directory {}", parent.display()))?;
    }
    Ok(())
}

fn print_session_summary(user: &AuthenticatedUser) {
    println!("Logged in as {}", user.email);
    println!("username: {}", user.username);
    println!("role: {}", user.role);
    println!("token stored at {}", token_path().display());
}
