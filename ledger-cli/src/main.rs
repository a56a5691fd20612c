//! # ledger-cli
//!
//! CLI tool for exercising the ledgerlink API client.
//!
//! ## Commands
//!
//! - `login` / `logout`: credential lifecycle
//! - `status`: credentials, queue, and cache state
//! - `sync`: replay queued mutations and refresh the cache
//! - `tx add` / `tx list`: record and inspect transactions
//!
//! ## Example
//!
//! ```bash
//! # Sign in against a local dev server
//! ledger-cli login --email pat@example.com
//!
//! # Record an expense while offline; it lands in the queue
//! ledger-cli tx add 12.50 --note "coffee" --offline
//!
//! # Replay the queue and refresh the cache
//! ledger-cli sync
//!
//! # No server handy? Use the canned in-process backend
//! ledger-cli --mock tx list
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_client::{
    ApiClient, BuildMode, ClientConfig, ConfigFile, FileStore, HttpTransport, ReqwestTransport,
    SecretStore, SyncOptions, SyncService, TokenStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod commands;
mod mock;

use commands::{login, logout, status, sync, tx};

/// CLI tool for exercising the ledgerlink API client.
#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for credentials, queue, and cache
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a canned in-process backend instead of the network
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store credentials
    Login {
        /// Account email address
        #[arg(long, short)]
        email: String,

        /// Account password (prompted without echo when omitted)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Sign out and clear stored credentials
    Logout,

    /// Show credentials, queue, and cache state
    Status,

    /// Replay queued mutations and refresh the cache
    Sync,

    /// Work with transactions
    Tx {
        #[command(subcommand)]
        command: tx::TxCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let store: Arc<dyn SecretStore> = Arc::new(FileStore::new(data_dir.join("secrets.json")));
    let tokens = TokenStore::new(Arc::clone(&store));

    if cli.mock {
        let config = ClientConfig::with_base_url(mock::BASE_URL)?;
        let client = Arc::new(ApiClient::new(config, mock::transport(), tokens));
        dispatch(cli.command, client, store).await
    } else {
        let config = load_config(&data_dir)?;
        let transport = ReqwestTransport::new()
            .map_err(|e| anyhow::anyhow!("failed to initialize HTTP transport: {e}"))?;
        let client = Arc::new(ApiClient::new(config, transport, tokens));
        dispatch(cli.command, client, store).await
    }
}

async fn dispatch<T: HttpTransport + 'static>(
    command: Commands,
    client: Arc<ApiClient<T>>,
    store: Arc<dyn SecretStore>,
) -> Result<()> {
    let service = SyncService::new(Arc::clone(&client), store, SyncOptions::default()).await;

    match command {
        Commands::Login { email, password } => login::run(&client, &email, password).await,
        Commands::Logout => logout::run(&client).await,
        Commands::Status => status::run(&client, &service).await,
        Commands::Sync => sync::run(&service).await,
        Commands::Tx { command } => tx::run(&client, &service, command).await,
    }
}

/// Resolve the client config: `config.toml` in the data dir when present,
/// otherwise the environment.
fn load_config(data_dir: &Path) -> Result<ClientConfig> {
    let path = data_dir.join("config.toml");
    let config = if path.exists() {
        ConfigFile::from_file(&path)?.client_config(BuildMode::current())?
    } else {
        ClientConfig::resolve()?
    };
    Ok(config)
}

/// Get the default data directory for ledger-cli.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "ledgerlink", "ledger-cli")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
