//! Clap argument parser plus the helpers shared by every command.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{KeepSyncError, Result};
use crate::store::StoreBackend;
use crate::sync::{HttpRemote, TokenHolder};
use crate::vault::{SecretId, SecretKind};

/// File under the state dir holding the session token between runs.
const SESSION_FILE: &str = "session";

/// keepsync CLI: personal secret vault with server sync.
#[derive(Parser)]
#[command(
    name = "keepsync",
    about = "Personal secret vault with server sync",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory holding .keepsync.toml (default: current dir)
    #[arg(long, default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Owner to act as, overriding the config file
    #[arg(long, global = true)]
    pub owner: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a fresh encryption passphrase
    Passphrase,

    /// Create an account on the sync server
    Register {
        /// Account name (becomes the owner id)
        login: String,
    },

    /// Log in to the sync server and remember the session
    Login {
        /// Account name
        login: String,
    },

    /// Add a secret
    Add {
        /// Secret type: login_password, bank_cards, text or binary
        kind: SecretKind,
        /// Free-text description shown in listings
        description: String,
        /// Text value (omit for interactive prompt or stdin)
        value: Option<String>,
        /// Read a binary payload from this file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List secrets
    List {
        /// Include deleted secrets
        #[arg(short, long)]
        all: bool,
    },

    /// Decrypt and print a secret
    Show {
        /// Secret id
        id: SecretId,
        /// Write a binary payload to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Change a secret's description
    Describe {
        /// Secret id
        id: SecretId,
        /// New description
        description: String,
    },

    /// Delete a secret (synced as a tombstone)
    Delete {
        /// Secret id
        id: SecretId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Run one sync cycle against the server
    Sync,

    /// Keep syncing in the background until Ctrl-C
    Watch,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the encryption passphrase, trying in order:
/// 1. `KEEPSYNC_PASSPHRASE` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    prompt_secret("KEEPSYNC_PASSPHRASE", "Enter encryption passphrase")
}

/// Get the server account password (`KEEPSYNC_ACCOUNT_PASSWORD` or prompt).
pub fn prompt_account_password() -> Result<Zeroizing<String>> {
    prompt_secret("KEEPSYNC_ACCOUNT_PASSWORD", "Enter account password")
}

fn prompt_secret(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(Zeroizing::new(value));
        }
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| KeepSyncError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Load `.keepsync.toml`, applying the `--owner` override.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&cli.project_dir)?;
    if let Some(owner) = &cli.owner {
        settings.owner = Some(owner.clone());
    }
    Ok(settings)
}

/// Open the configured store backend.
pub async fn open_store(cli: &Cli, settings: &Settings) -> Result<Arc<StoreBackend>> {
    let store = StoreBackend::open(&settings.backend, &cli.project_dir).await?;
    Ok(Arc::new(store))
}

/// HTTP client for the configured server, primed with the saved session.
pub fn connect_remote(cli: &Cli, settings: &Settings) -> Result<HttpRemote> {
    let tokens = match load_session(&cli.project_dir)? {
        Some(token) => TokenHolder::with_token(token),
        None => TokenHolder::new(),
    };
    HttpRemote::new(&settings.server_address, tokens)
}

/// Directory for local state (`<project>/.keepsync`).
pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(".keepsync")
}

fn load_session(project_dir: &Path) -> Result<Option<String>> {
    let path = state_dir(project_dir).join(SESSION_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let token = std::fs::read_to_string(path)?;
    let token = token.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

/// Persist the current session token so the next run can reuse it.
pub fn save_session(project_dir: &Path, tokens: &TokenHolder) -> Result<()> {
    let Some(token) = tokens.get() else {
        return Ok(());
    };

    let dir = state_dir(project_dir);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(SESSION_FILE);
    std::fs::write(&path, token)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
